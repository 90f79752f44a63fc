//! Enumeration types for Gymwatch.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

/// The faction controlling a gym.
///
/// The scanner stores teams as small integers: `0` for an uncontrolled gym,
/// `1`-`3` for the three factions. [`Team::Neutral`] is the "no owner"
/// sentinel; a `NULL` column and an unknown id both normalize to it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Team {
    /// No faction holds the gym.
    #[default]
    Neutral,
    /// Team Mystic (blue).
    Mystic,
    /// Team Valor (red).
    Valor,
    /// Team Instinct (yellow).
    Instinct,
}

impl Team {
    /// The three controlling factions, in scanner id order.
    pub const FACTIONS: [Self; 3] = [Self::Mystic, Self::Valor, Self::Instinct];

    /// Map a scanner team id to a [`Team`], returning `None` for unknown ids.
    pub const fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(Self::Neutral),
            1 => Some(Self::Mystic),
            2 => Some(Self::Valor),
            3 => Some(Self::Instinct),
            _ => None,
        }
    }

    /// Decode a nullable team column. `NULL` and unknown ids become
    /// [`Team::Neutral`].
    pub fn from_db(id: Option<i16>) -> Self {
        id.and_then(Self::from_id).unwrap_or_default()
    }

    /// The scanner team id.
    pub const fn id(self) -> i16 {
        match self {
            Self::Neutral => 0,
            Self::Mystic => 1,
            Self::Valor => 2,
            Self::Instinct => 3,
        }
    }

    /// Lowercase display name, matching the serialized form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Mystic => "mystic",
            Self::Valor => "valor",
            Self::Instinct => "instinct",
        }
    }

    /// Whether one of the three factions holds the gym.
    pub const fn is_faction(self) -> bool {
        !matches!(self, Self::Neutral)
    }
}

impl core::fmt::Display for Team {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Chart periods
// ---------------------------------------------------------------------------

/// Time window of the history chart.
///
/// Each period fixes a lookback duration and the bucket width samples are
/// averaged over. Unknown keys fall back to [`Period::Day`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Period {
    /// Last 6 hours, 5 minute buckets.
    #[serde(rename = "6h")]
    SixHours,
    /// Last 12 hours, 5 minute buckets.
    #[serde(rename = "12h")]
    TwelveHours,
    /// Last 24 hours, 5 minute buckets.
    #[default]
    #[serde(rename = "24h")]
    Day,
    /// Last 48 hours, 15 minute buckets.
    #[serde(rename = "48h")]
    TwoDays,
    /// Last 7 days, 1 hour buckets.
    #[serde(rename = "7d")]
    Week,
}

impl Period {
    /// Parse a period key. Unrecognized keys normalize to [`Period::Day`];
    /// this is never an error.
    pub fn parse(key: &str) -> Self {
        match key.trim() {
            "6h" => Self::SixHours,
            "12h" => Self::TwelveHours,
            "48h" => Self::TwoDays,
            "7d" => Self::Week,
            _ => Self::Day,
        }
    }

    /// The key this period is requested and serialized with.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SixHours => "6h",
            Self::TwelveHours => "12h",
            Self::Day => "24h",
            Self::TwoDays => "48h",
            Self::Week => "7d",
        }
    }

    /// Lookback window in seconds.
    pub const fn duration_secs(self) -> i64 {
        match self {
            Self::SixHours => 21_600,
            Self::TwelveHours => 43_200,
            Self::Day => 86_400,
            Self::TwoDays => 172_800,
            Self::Week => 604_800,
        }
    }

    /// Bucket width in seconds.
    pub const fn bucket_secs(self) -> i64 {
        match self {
            Self::SixHours | Self::TwelveHours | Self::Day => 300,
            Self::TwoDays => 900,
            Self::Week => 3_600,
        }
    }
}

impl core::fmt::Display for Period {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_ids_roundtrip() {
        for team in [Team::Neutral, Team::Mystic, Team::Valor, Team::Instinct] {
            assert_eq!(Team::from_id(team.id()), Some(team));
        }
    }

    #[test]
    fn null_and_unknown_team_are_neutral() {
        assert_eq!(Team::from_db(None), Team::Neutral);
        assert_eq!(Team::from_db(Some(9)), Team::Neutral);
        assert_eq!(Team::from_db(Some(2)), Team::Valor);
    }

    #[test]
    fn team_serializes_lowercase() {
        let json = serde_json::to_string(&Team::Instinct).ok();
        assert_eq!(json.as_deref(), Some("\"instinct\""));
    }

    #[test]
    fn period_table() {
        let expected = [
            ("6h", 21_600, 300),
            ("12h", 43_200, 300),
            ("24h", 86_400, 300),
            ("48h", 172_800, 900),
            ("7d", 604_800, 3_600),
        ];
        for (key, duration, bucket) in expected {
            let period = Period::parse(key);
            assert_eq!(period.as_str(), key);
            assert_eq!(period.duration_secs(), duration);
            assert_eq!(period.bucket_secs(), bucket);
        }
    }

    #[test]
    fn unknown_period_falls_back_to_day() {
        assert_eq!(Period::parse("30d"), Period::Day);
        assert_eq!(Period::parse(""), Period::Day);
        assert_eq!(Period::parse("7D"), Period::Day);
    }

    #[test]
    fn period_serializes_as_key() {
        let json = serde_json::to_string(&Period::TwoDays).ok();
        assert_eq!(json.as_deref(), Some("\"48h\""));
    }
}
