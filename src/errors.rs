use chrono::NaiveDate;
use thiserror::Error;

use crate::decimal::Money;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("invalid range: end date {end} precedes start date {start}")]
    InvalidRange {
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("invalid frequency: {value:?} (expected daily, weekly or monthly)")]
    InvalidFrequency {
        value: String,
    },

    #[error("invalid loan term type: {value:?} (expected normal or monthly)")]
    InvalidTermType {
        value: String,
    },

    #[error("invalid amount: {amount} must be positive")]
    InvalidAmount {
        amount: Money,
    },

    #[error("invalid installment count: {count}")]
    InvalidInstallmentCount {
        count: u32,
    },

    #[error("payment of {amount} exceeds pending {pending} on installment {index}")]
    PaymentExceedsPending {
        index: u32,
        amount: Money,
        pending: Money,
    },

    #[error("installment not found: {index}")]
    InstallmentNotFound {
        index: u32,
    },

    #[error("invalid state: current {current}, expected {expected}")]
    InvalidState {
        current: String,
        expected: String,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("calculation error: {message}")]
    CalculationError {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LedgerError {
    pub(crate) fn invalid_state(current: impl ToString, expected: impl ToString) -> Self {
        LedgerError::InvalidState {
            current: current.to_string(),
            expected: expected.to_string(),
        }
    }

    pub(crate) fn calculation(message: impl Into<String>) -> Self {
        LedgerError::CalculationError {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
