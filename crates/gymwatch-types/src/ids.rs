//! Identifier wrapper for gyms.
//!
//! Gym identifiers are issued by the upstream scanner and are opaque to
//! Gymwatch. The newtype keeps them from being mixed up with other strings
//! (team names, period keys) at compile time.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Opaque identifier of a gym, as stored in the scanner's `gym` table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct GymId(pub String);

impl GymId {
    /// Wrap a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for GymId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for GymId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for GymId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_plain_string() {
        let id = GymId::new("a1b2.16");
        let json = serde_json::to_string(&id).ok();
        assert_eq!(json.as_deref(), Some("\"a1b2.16\""));
    }

    #[test]
    fn display_matches_inner() {
        let id = GymId::from("gym-7");
        assert_eq!(id.to_string(), "gym-7");
        assert_eq!(id.as_str(), "gym-7");
    }
}
