use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::interest::{MonthCountConvention, SimpleInterestEngine};
use crate::schedule::SETTLEMENT_TOLERANCE;

/// mode of payment recorded when neither the caller nor the row supplies one
pub const DEFAULT_MODE_OF_PAYMENT: &str = "Cash";

/// engine configuration
///
/// Every field has a default, so a partial JSON document such as
/// `{"default_mode_of_payment": "UPI"}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// how elapsed months are counted when pricing a loan
    pub month_count_convention: MonthCountConvention,
    pub default_mode_of_payment: String,
    /// pending balances at or below this count as settled
    pub settlement_tolerance: Money,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            month_count_convention: MonthCountConvention::default(),
            default_mode_of_payment: DEFAULT_MODE_OF_PAYMENT.to_string(),
            settlement_tolerance: SETTLEMENT_TOLERANCE,
        }
    }
}

impl LedgerConfig {
    /// parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LedgerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_mode_of_payment.trim().is_empty() {
            return Err(LedgerError::InvalidConfiguration {
                message: "default mode of payment must not be empty".to_string(),
            });
        }

        if self.settlement_tolerance.is_negative() || self.settlement_tolerance >= Money::CENT {
            return Err(LedgerError::InvalidConfiguration {
                message: format!(
                    "settlement tolerance {} must be in [0, 0.01)",
                    self.settlement_tolerance
                ),
            });
        }

        Ok(())
    }

    /// interest engine honouring the configured month-count convention
    pub fn interest_engine(&self) -> SimpleInterestEngine {
        SimpleInterestEngine::new(self.month_count_convention)
    }
}
