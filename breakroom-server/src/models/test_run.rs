//! Test-run reporting types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Platform a test run was executed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Web,
    Android,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Android => "android",
        }
    }

    /// Parse a required platform field.
    pub fn require(value: Option<&str>) -> Result<Self, ValidationError> {
        value.unwrap_or_default().parse()
    }
}

impl FromStr for Platform {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "web" => Ok(Self::Web),
            "android" => Ok(Self::Android),
            _ => Err(ValidationError::InvalidVariant {
                field: "Platform",
                value: s.to_owned(),
                expected: "\"web\" or \"android\"",
            }),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case counts for a suite or run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub total: i32,
    pub passed: i32,
    pub failed: i32,
    pub skipped: i32,
}

impl Tally {
    /// Count case statuses. Statuses other than passed/failed/skipped
    /// only add to the total.
    pub fn from_statuses<'a, I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        statuses.into_iter().fold(Self::default(), |mut t, status| {
            t.total += 1;
            match status {
                "passed" => t.passed += 1,
                "failed" => t.failed += 1,
                "skipped" => t.skipped += 1,
                _ => {}
            }
            t
        })
    }

    pub fn suite_status(&self) -> &'static str {
        if self.failed > 0 {
            "failed"
        } else {
            "passed"
        }
    }

    pub fn run_status(&self) -> &'static str {
        if self.failed > 0 {
            "failed"
        } else {
            "completed"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_must_be_known() {
        assert_eq!(Platform::require(Some("web")).unwrap(), Platform::Web);
        assert_eq!(Platform::require(Some("android")).unwrap(), Platform::Android);
        let err = Platform::require(None).unwrap_err();
        assert_eq!(err.to_string(), "Platform must be \"web\" or \"android\"");
        assert!(Platform::require(Some("ios")).is_err());
    }

    #[test]
    fn tally_counts_statuses() {
        let tally = Tally::from_statuses(["passed", "failed", "skipped", "pending", "passed"]);
        assert_eq!(
            tally,
            Tally {
                total: 5,
                passed: 2,
                failed: 1,
                skipped: 1
            }
        );
        assert_eq!(tally.suite_status(), "failed");
        assert_eq!(tally.run_status(), "failed");
    }

    #[test]
    fn clean_tally_statuses() {
        let tally = Tally::from_statuses(["passed", "skipped"]);
        assert_eq!(tally.suite_status(), "passed");
        assert_eq!(tally.run_status(), "completed");
        assert_eq!(Tally::default().run_status(), "completed");
    }
}
