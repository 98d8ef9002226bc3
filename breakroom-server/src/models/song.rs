//! Song access roles
//!
//! A viewer's role on a song is decided in order:
//! owner of the song, then collaborator role, then `viewer` when the song
//! is public. Anything else has no access.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Role of the requesting user on a song
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SongRole {
    Owner,
    Editor,
    Viewer,
}

impl SongRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }

    /// Owners and editors may change the song and its lyrics.
    pub fn can_edit(&self) -> bool {
        matches!(self, Self::Owner | Self::Editor)
    }

    pub fn is_owner(&self) -> bool {
        matches!(self, Self::Owner)
    }
}

impl fmt::Display for SongRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role granted when inviting a collaborator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollaboratorRole {
    #[default]
    Editor,
    Viewer,
}

impl CollaboratorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }

    /// Parse optional input, defaulting to editor.
    pub fn parse_or_default(value: Option<&str>) -> Result<Self, ValidationError> {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            None => Ok(Self::default()),
            Some(v) => v.parse(),
        }
    }
}

impl FromStr for CollaboratorRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "editor" => Ok(Self::Editor),
            "viewer" => Ok(Self::Viewer),
            _ => Err(ValidationError::InvalidVariant {
                field: "Role",
                value: s.to_owned(),
                expected: "\"editor\" or \"viewer\"",
            }),
        }
    }
}

impl From<CollaboratorRole> for SongRole {
    fn from(role: CollaboratorRole) -> Self {
        match role {
            CollaboratorRole::Editor => Self::Editor,
            CollaboratorRole::Viewer => Self::Viewer,
        }
    }
}

/// Song visibility
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Public,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Public => "public",
        }
    }

    pub fn parse_or_default(value: Option<&str>) -> Result<Self, ValidationError> {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            None => Ok(Self::default()),
            Some(v) => v.parse(),
        }
    }
}

impl FromStr for Visibility {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "private" => Ok(Self::Private),
            "public" => Ok(Self::Public),
            _ => Err(ValidationError::InvalidVariant {
                field: "Visibility",
                value: s.to_owned(),
                expected: "\"private\" or \"public\"",
            }),
        }
    }
}

/// Resolve the requesting user's role on a song.
///
/// `collab_role` is the stored collaborator role for this user, if any.
/// A stored role other than `editor` grants viewer rights only.
pub fn resolve_role(
    owner_id: i64,
    user_id: i64,
    collab_role: Option<&str>,
    visibility: &str,
) -> Option<SongRole> {
    if owner_id == user_id {
        return Some(SongRole::Owner);
    }

    if let Some(role) = collab_role {
        return Some(match role.parse::<CollaboratorRole>() {
            Ok(r) => r.into(),
            Err(_) => {
                tracing::warn!(role, "unknown collaborator role, treating as viewer");
                SongRole::Viewer
            }
        });
    }

    if visibility.eq_ignore_ascii_case(Visibility::Public.as_str()) {
        return Some(SongRole::Viewer);
    }

    None
}
