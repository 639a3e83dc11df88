//! Policy categories
//!
//! Commission rules are keyed by category, and the calculator switches its
//! premium handling on whether the category is motor.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CommissionError;

/// Line of business a policy belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyCategory {
    Health,
    Life,
    Motor,
    Term,
    Travel,
    Property,
}

impl PolicyCategory {
    /// All categories, in code order
    pub const ALL: [PolicyCategory; 6] = [
        PolicyCategory::Health,
        PolicyCategory::Life,
        PolicyCategory::Motor,
        PolicyCategory::Term,
        PolicyCategory::Travel,
        PolicyCategory::Property,
    ];

    /// Motor policies carry an OD/TP/net premium breakdown
    pub fn is_motor(&self) -> bool {
        matches!(self, PolicyCategory::Motor)
    }

    /// Storage code
    pub fn code(&self) -> &'static str {
        match self {
            PolicyCategory::Health => "health",
            PolicyCategory::Life => "life",
            PolicyCategory::Motor => "motor",
            PolicyCategory::Term => "term",
            PolicyCategory::Travel => "travel",
            PolicyCategory::Property => "property",
        }
    }
}

impl fmt::Display for PolicyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for PolicyCategory {
    type Err = CommissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        PolicyCategory::ALL
            .into_iter()
            .find(|c| c.code() == wanted)
            .ok_or_else(|| CommissionError::UnknownCategory(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trips_through_from_str() {
        for category in PolicyCategory::ALL {
            assert_eq!(category.code().parse::<PolicyCategory>().unwrap(), category);
        }
        assert_eq!("MOTOR".parse::<PolicyCategory>().unwrap(), PolicyCategory::Motor);
        assert!("marine".parse::<PolicyCategory>().is_err());
    }

    #[test]
    fn test_only_motor_is_motor() {
        let motor: Vec<_> = PolicyCategory::ALL.into_iter().filter(|c| c.is_motor()).collect();
        assert_eq!(motor, vec![PolicyCategory::Motor]);
    }
}
