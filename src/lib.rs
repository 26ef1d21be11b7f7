pub mod calendar;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod interest;
pub mod loan;
pub mod payments;
pub mod portfolio;
pub mod schedule;
pub mod serialization;
pub mod types;

// re-export key types
pub use calendar::{add_months_preserve_anchor, count_anchor_months, count_whole_anchor_months};
pub use config::LedgerConfig;
pub use decimal::{Money, Rate};
pub use errors::{LedgerError, Result};
pub use events::{Event, EventStore};
pub use interest::{
    calculate_total_interest, calculate_total_interest_by_term, one_month_interest,
    InterestCalculation, InterestCalculator, MonthCountConvention, SimpleInterestEngine,
};
pub use loan::{generate_loan_schedule, Loan, LoanBuilder, LoanSummary, LoanTerms};
pub use payments::{
    pay_full, pay_interest_only, record_payment, undo_payment, ExtensionOutcome,
    InterestOnlyOutcome, PaymentLedger,
};
pub use portfolio::{
    collection_queue, customer_totals, portfolio_stats, profit_by_period, profit_series,
    CollectionItem, CollectionQueue, CustomerTotals, PortfolioStats, ProfitEntry, ProfitPeriod,
};
pub use schedule::{
    calculate_installments, compute_end_date_from_installments,
    generate_schedule_with_installment_amount, generate_simple_interest_schedule, Installment,
    Schedule,
};
pub use serialization::{parse_date_flexible, InstallmentRecord, LoanRecord, ScheduleTotals};
pub use types::{Frequency, InstallmentStatus, LoanId, LoanStatus, LoanTermType};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
