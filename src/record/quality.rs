//! Media quality tiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Quality tier of a media URL.
///
/// `Sd` is the record's primary URL. `Hd` and `Low` are stored on the record as
/// compact variants relative to the primary URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Quality {
    /// High definition variant.
    Hd,
    /// Standard definition (primary URL).
    Sd,
    /// Small/low-bandwidth variant.
    Low,
}

impl Quality {
    /// Returns the canonical label used in config files and on the command line.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hd => "HD",
            Self::Sd => "SD",
            Self::Low => "LOW",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HD" => Ok(Self::Hd),
            "SD" => Ok(Self::Sd),
            "LOW" => Ok(Self::Low),
            _ => Err(format!("invalid quality: {s} (expected HD, SD or LOW)")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_from_str_is_case_insensitive() {
        assert_eq!("hd".parse::<Quality>().unwrap(), Quality::Hd);
        assert_eq!("Sd".parse::<Quality>().unwrap(), Quality::Sd);
        assert_eq!("LOW".parse::<Quality>().unwrap(), Quality::Low);
    }

    #[test]
    fn test_quality_from_str_invalid() {
        let result = "4k".parse::<Quality>();
        assert!(result.unwrap_err().contains("invalid quality"));
    }

    #[test]
    fn test_quality_serde_uses_labels() {
        assert_eq!(serde_json::to_string(&Quality::Hd).unwrap(), "\"HD\"");
        let parsed: Quality = serde_json::from_str("\"LOW\"").unwrap();
        assert_eq!(parsed, Quality::Low);
    }
}
