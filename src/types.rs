use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::LedgerError;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// collection cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            _ => Err(LedgerError::InvalidFrequency {
                value: s.to_string(),
            }),
        }
    }
}

/// loan variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoanTermType {
    /// fixed amortizing schedule built once at issuance
    #[default]
    Normal,
    /// revolving loan, one installment at a time; interest-only payments
    /// roll the principal into a new next-month installment
    Monthly,
}

impl LoanTermType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanTermType::Normal => "normal",
            LoanTermType::Monthly => "monthly",
        }
    }
}

impl fmt::Display for LoanTermType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanTermType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(LoanTermType::Normal),
            "monthly" => Ok(LoanTermType::Monthly),
            _ => Err(LedgerError::InvalidTermType {
                value: s.to_string(),
            }),
        }
    }
}

/// installment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstallmentStatus {
    /// nothing paid yet
    Due,
    /// partially paid
    Pending,
    /// fully paid
    Paid,
}

impl InstallmentStatus {
    /// still expecting money
    pub fn is_open(&self) -> bool {
        matches!(self, InstallmentStatus::Due | InstallmentStatus::Pending)
    }
}

impl fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstallmentStatus::Due => "Due",
            InstallmentStatus::Pending => "Pending",
            InstallmentStatus::Paid => "Paid",
        };
        f.write_str(s)
    }
}

/// loan lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    /// collecting payments
    #[default]
    Active,
    /// closed by the lender
    Settled,
    /// closed because a new finance replaced it
    Refinanced,
}

impl LoanStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, LoanStatus::Active)
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoanStatus::Active => "active",
            LoanStatus::Settled => "settled",
            LoanStatus::Refinanced => "refinanced",
        };
        f.write_str(s)
    }
}
