use std::str::FromStr;

use thiserror::Error;

/// Max entries Safari loads from one content blocker before version 15.
pub const RULES_LIMIT_LEGACY: usize = 50_000;
/// Max entries Safari loads from one content blocker since version 15.
pub const RULES_LIMIT: usize = 150_000;

/// Target Safari version. Decides how many entries one content blocker may hold.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SafariVersion {
    #[default]
    Safari13,
    Safari14,
    Safari15,
    Safari16,
    Safari16_4,
    /// Anything newer than the versions above
    Newer,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported Safari version: {0}")]
pub struct UnsupportedVersion(pub String);

impl SafariVersion {
    pub fn from_f64(version: f64) -> Result<Self, UnsupportedVersion> {
        if !version.is_finite() || version < 13.0 {
            return Err(UnsupportedVersion(version.to_string()));
        }
        let version = if version < 14.0 {
            SafariVersion::Safari13
        } else if version < 15.0 {
            SafariVersion::Safari14
        } else if version < 16.0 {
            SafariVersion::Safari15
        } else if version < 16.4 {
            SafariVersion::Safari16
        } else if version < 17.0 {
            SafariVersion::Safari16_4
        } else {
            SafariVersion::Newer
        };
        Ok(version)
    }

    pub fn rules_limit(self) -> usize {
        if self >= SafariVersion::Safari15 {
            RULES_LIMIT
        } else {
            RULES_LIMIT_LEGACY
        }
    }
}

impl FromStr for SafariVersion {
    type Err = UnsupportedVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let version: f64 = s.trim().parse().map_err(|_| UnsupportedVersion(s.to_string()))?;
        SafariVersion::from_f64(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_by_version() {
        assert_eq!(SafariVersion::Safari13.rules_limit(), 50_000);
        assert_eq!(SafariVersion::Safari14.rules_limit(), 50_000);
        assert_eq!(SafariVersion::Safari15.rules_limit(), 150_000);
        assert_eq!(SafariVersion::Newer.rules_limit(), 150_000);
        assert_eq!(SafariVersion::default(), SafariVersion::Safari13);
    }

    #[test]
    fn parses_versions() {
        assert_eq!("13".parse::<SafariVersion>(), Ok(SafariVersion::Safari13));
        assert_eq!("14.1".parse::<SafariVersion>(), Ok(SafariVersion::Safari14));
        assert_eq!("16.4".parse::<SafariVersion>(), Ok(SafariVersion::Safari16_4));
        assert_eq!("16.2".parse::<SafariVersion>(), Ok(SafariVersion::Safari16));
        assert_eq!("18".parse::<SafariVersion>(), Ok(SafariVersion::Newer));
        assert!("12".parse::<SafariVersion>().is_err());
        assert!("latest".parse::<SafariVersion>().is_err());
        assert!(SafariVersion::from_f64(f64::NAN).is_err());
    }
}
