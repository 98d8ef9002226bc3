//! Breakpoint tiers - name to column count mapping

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// Responsive column-count tier
///
/// Ordered widest first, which is also the order layouts are built in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    Lg,
    Md,
    Sm,
    Xs,
    Xxs,
}

impl Breakpoint {
    /// All breakpoints, widest first
    pub const ALL: [Breakpoint; 5] = [
        Breakpoint::Lg,
        Breakpoint::Md,
        Breakpoint::Sm,
        Breakpoint::Xs,
        Breakpoint::Xxs,
    ];

    /// Fixed column count for this tier
    pub fn columns(self) -> u32 {
        match self {
            Self::Lg => 5,
            Self::Md => 4,
            Self::Sm => 3,
            Self::Xs => 2,
            Self::Xxs => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lg => "lg",
            Self::Md => "md",
            Self::Sm => "sm",
            Self::Xs => "xs",
            Self::Xxs => "xxs",
        }
    }

    /// Look up the tier that owns a column count.
    pub fn from_columns(columns: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|bp| bp.columns() == columns)
    }

    /// Like [`Breakpoint::from_columns`], as a `Result`.
    pub fn require_columns(columns: u32) -> Result<Self, LayoutError> {
        Self::from_columns(columns).ok_or(LayoutError::UnsupportedColumns(columns))
    }
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Breakpoint {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|bp| bp.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| LayoutError::UnknownBreakpoint(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_counts() {
        let cols: Vec<u32> = Breakpoint::ALL.iter().map(|bp| bp.columns()).collect();
        assert_eq!(cols, vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn round_trips_columns() {
        for bp in Breakpoint::ALL {
            assert_eq!(Breakpoint::from_columns(bp.columns()), Some(bp));
        }
        assert_eq!(Breakpoint::from_columns(0), None);
        assert_eq!(Breakpoint::from_columns(6), None);
    }

    #[test]
    fn parses_names() {
        assert_eq!("md".parse::<Breakpoint>().unwrap(), Breakpoint::Md);
        assert_eq!("XXS".parse::<Breakpoint>().unwrap(), Breakpoint::Xxs);
        assert!(matches!(
            "xl".parse::<Breakpoint>(),
            Err(LayoutError::UnknownBreakpoint(_))
        ));
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Breakpoint::Sm).unwrap(), "\"sm\"");
    }
}
