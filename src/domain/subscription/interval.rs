//! Billing interval definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{Timestamp, ValidationError};

/// Length of one paid period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingInterval {
    #[default]
    Monthly,
    Annual,
}

impl BillingInterval {
    /// Period length in days (30-day months, 365-day years).
    pub fn days(&self) -> i64 {
        match self {
            BillingInterval::Monthly => 30,
            BillingInterval::Annual => 365,
        }
    }

    /// End of a period that starts at `from`.
    pub fn advance(&self, from: Timestamp) -> Timestamp {
        from.add_days(self.days())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BillingInterval::Monthly => "monthly",
            BillingInterval::Annual => "annual",
        }
    }
}

impl fmt::Display for BillingInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingInterval {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monthly" => Ok(BillingInterval::Monthly),
            "annual" | "yearly" => Ok(BillingInterval::Annual),
            other => Err(ValidationError::invalid_format(
                "billing_interval",
                format!("unknown billing interval '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_adds_interval_length() {
        let start = Timestamp::parse_rfc3339("2026-01-01T00:00:00Z").unwrap();
        assert_eq!(BillingInterval::Monthly.advance(start), start.add_days(30));
        assert_eq!(BillingInterval::Annual.advance(start), start.add_days(365));
    }

    #[test]
    fn parses_aliases() {
        assert_eq!("yearly".parse(), Ok(BillingInterval::Annual));
        assert_eq!("Monthly".parse(), Ok(BillingInterval::Monthly));
        assert!("weekly".parse::<BillingInterval>().is_err());
    }
}
