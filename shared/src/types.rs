//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Forecast lookahead window. Only 30, 60 and 90 day horizons are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Horizon {
    Short,
    Medium,
    Long,
}

impl Horizon {
    pub fn days(&self) -> i32 {
        match self {
            Horizon::Short => 30,
            Horizon::Medium => 60,
            Horizon::Long => 90,
        }
    }

    pub const ALL: [Horizon; 3] = [Horizon::Short, Horizon::Medium, Horizon::Long];
}

impl TryFrom<i32> for Horizon {
    type Error = String;

    fn try_from(days: i32) -> Result<Self, Self::Error> {
        match days {
            30 => Ok(Horizon::Short),
            60 => Ok(Horizon::Medium),
            90 => Ok(Horizon::Long),
            other => Err(format!("unsupported horizon: {} days (expected 30, 60 or 90)", other)),
        }
    }
}

impl From<Horizon> for i32 {
    fn from(h: Horizon) -> i32 {
        h.days()
    }
}

impl std::fmt::Display for Horizon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}d", self.days())
    }
}

/// Stockout risk classification for a SKU over a forecast horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Critical => "critical",
            RiskLevel::High => "high",
            RiskLevel::Medium => "medium",
            RiskLevel::Low => "low",
        }
    }
}

/// Urgency tier for reorder recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    High,
    Medium,
}

/// Confidence bucket derived from forecast accuracy (MAPE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBucket {
    High,
    Medium,
    Low,
}

impl ConfidenceBucket {
    /// Bucket a MAPE percentage: below 20 is high confidence, below 35 medium,
    /// anything above that low.
    pub fn from_mape(mape: f64) -> Self {
        if mape < 20.0 {
            ConfidenceBucket::High
        } else if mape < 35.0 {
            ConfidenceBucket::Medium
        } else {
            ConfidenceBucket::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizon_round_trip() {
        for h in Horizon::ALL {
            assert_eq!(Horizon::try_from(h.days()).unwrap(), h);
        }
    }

    #[test]
    fn horizon_rejects_unknown_windows() {
        assert!(Horizon::try_from(45).is_err());
        assert!(Horizon::try_from(0).is_err());
        assert!(Horizon::try_from(-30).is_err());
    }

    #[test]
    fn mape_buckets() {
        assert_eq!(ConfidenceBucket::from_mape(16.7), ConfidenceBucket::High);
        assert_eq!(ConfidenceBucket::from_mape(20.0), ConfidenceBucket::Medium);
        assert_eq!(ConfidenceBucket::from_mape(34.9), ConfidenceBucket::Medium);
        assert_eq!(ConfidenceBucket::from_mape(35.0), ConfidenceBucket::Low);
    }
}
