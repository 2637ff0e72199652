//! Simulated durations with exact two-decimal resolution.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, RangeInclusive};

/// Sector times in the ring, in hundredths of a second (12.00s ..= 35.99s).
pub const SECTOR_TIME_RANGE: RangeInclusive<u32> = 1200..=3599;

/// Trial times in a parallel run, in hundredths of a second (75.00s ..= 95.99s).
pub const TRIAL_TIME_RANGE: RangeInclusive<u32> = 7500..=9599;

/// A simulated duration stored as whole hundredths of a second.
///
/// Keeping the value integral means two-decimal precision holds by
/// construction and comparisons never suffer float ties or rounding.
/// On the wire it is a JSON number of seconds (`83.27`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LapTime(u32);

impl LapTime {
    /// Zero duration.
    pub const ZERO: Self = LapTime(0);

    /// Create from whole hundredths of a second.
    pub const fn from_hundredths(hundredths: u32) -> Self {
        LapTime(hundredths)
    }

    /// Raw value in hundredths of a second.
    pub const fn hundredths(self) -> u32 {
        self.0
    }

    /// Value in seconds.
    pub fn as_secs_f64(self) -> f64 {
        f64::from(self.0) / 100.0
    }

    /// Whether the value lies in `range` (hundredths, inclusive).
    pub fn within(self, range: &RangeInclusive<u32>) -> bool {
        range.contains(&self.0)
    }
}

impl Add for LapTime {
    type Output = LapTime;

    fn add(self, rhs: LapTime) -> LapTime {
        LapTime(self.0.saturating_add(rhs.0))
    }
}

impl fmt::Display for LapTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for LapTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_secs_f64())
    }
}

impl<'de> Deserialize<'de> for LapTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() || secs < 0.0 || secs * 100.0 > f64::from(u32::MAX) {
            return Err(serde::de::Error::custom(format!(
                "lap time out of range: {secs}"
            )));
        }
        Ok(LapTime((secs * 100.0).round() as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pads_hundredths() {
        assert_eq!(LapTime::from_hundredths(1200).to_string(), "12.00");
        assert_eq!(LapTime::from_hundredths(3599).to_string(), "35.99");
        assert_eq!(LapTime::from_hundredths(7505).to_string(), "75.05");
    }

    #[test]
    fn test_ranges_match_documented_bounds() {
        assert_eq!(*SECTOR_TIME_RANGE.start(), 1200);
        assert_eq!(*SECTOR_TIME_RANGE.end(), 3599);
        assert_eq!(*TRIAL_TIME_RANGE.start(), 7500);
        assert_eq!(*TRIAL_TIME_RANGE.end(), 9599);
        assert!(LapTime::from_hundredths(3599).within(&SECTOR_TIME_RANGE));
        assert!(!LapTime::from_hundredths(3600).within(&SECTOR_TIME_RANGE));
    }

    #[test]
    fn test_serializes_as_seconds() {
        let json = serde_json::to_string(&LapTime::from_hundredths(8327)).unwrap();
        assert_eq!(json, "83.27");

        let back: LapTime = serde_json::from_str("83.27").unwrap();
        assert_eq!(back, LapTime::from_hundredths(8327));
    }

    #[test]
    fn test_rejects_negative_seconds() {
        assert!(serde_json::from_str::<LapTime>("-1.0").is_err());
    }

    #[test]
    fn test_add_accumulates() {
        let total = LapTime::from_hundredths(1250) + LapTime::from_hundredths(2375);
        assert_eq!(total, LapTime::from_hundredths(3625));
    }
}
