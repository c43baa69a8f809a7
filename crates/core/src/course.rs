//! Course catalogue offered to applicants.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Programmes an applicant can register for.
///
/// Serialized using the display names the admissions office publishes, which
/// are also the values stored in the `applicants.course` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Course {
    #[serde(rename = "BBA (Girls Only)")]
    BbaGirls,
    #[serde(rename = "BCA (Girls Only)")]
    BcaGirls,
    #[serde(rename = "B.Com (Girls Only)")]
    BcomGirls,
    #[serde(rename = "B.Com (H) (Girls Only)")]
    BcomHonsGirls,
    #[serde(rename = "M.Com (Girls Only)")]
    McomGirls,
    #[serde(rename = "BBA (Co-Ed)")]
    BbaCoEd,
    #[serde(rename = "BCA (Co-Ed)")]
    BcaCoEd,
    #[serde(rename = "MCA (Co-Ed)")]
    McaCoEd,
    #[serde(rename = "MBA (Co-Ed)")]
    MbaCoEd,
}

/// Every course, in catalogue order.
pub const ALL_COURSES: [Course; 9] = [
    Course::BbaGirls,
    Course::BcaGirls,
    Course::BcomGirls,
    Course::BcomHonsGirls,
    Course::McomGirls,
    Course::BbaCoEd,
    Course::BcaCoEd,
    Course::McaCoEd,
    Course::MbaCoEd,
];

impl Course {
    /// Display name, also used as the stored value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BbaGirls => "BBA (Girls Only)",
            Self::BcaGirls => "BCA (Girls Only)",
            Self::BcomGirls => "B.Com (Girls Only)",
            Self::BcomHonsGirls => "B.Com (H) (Girls Only)",
            Self::McomGirls => "M.Com (Girls Only)",
            Self::BbaCoEd => "BBA (Co-Ed)",
            Self::BcaCoEd => "BCA (Co-Ed)",
            Self::McaCoEd => "MCA (Co-Ed)",
            Self::MbaCoEd => "MBA (Co-Ed)",
        }
    }

    /// Parse a course from its display name.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let trimmed = s.trim();
        ALL_COURSES
            .into_iter()
            .find(|c| c.as_str() == trimmed)
            .ok_or_else(|| CoreError::Validation(format!("Unknown course '{trimmed}'")))
    }
}

impl std::fmt::Display for Course {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
