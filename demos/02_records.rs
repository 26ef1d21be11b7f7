/// records - read a stored loan, pay it, write it back with portfolio figures
use chrono::NaiveDate;
use loan_ledger_rs::{
    collection_queue, portfolio_stats, LedgerConfig, LoanRecord, SafeTimeProvider,
    ScheduleTotals, TimeSource,
};

const STORED: &str = r#"{
    "customer": "Meena Stores",
    "principal": 12000,
    "interestRate": 4,
    "loanGivenDate": "01-01-2024",
    "firstCollectionDate": "08-01-2024",
    "loanEndDate": "2024-03-25",
    "frequency": "weekly"
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::System);
    let config = LedgerConfig::from_json(r#"{"default_mode_of_payment": "UPI"}"#)?;

    // no stored schedule yet, so one is generated
    let loan = LoanRecord::from_json(STORED)?.to_loan(config)?;
    let loan = loan.pay_full(1, None, &time)?.pay_full(2, None, &time)?;

    let totals = ScheduleTotals::for_loan(&loan);
    println!("{}", serde_json::to_string_pretty(&totals)?);

    let as_of = NaiveDate::from_ymd_opt(2024, 1, 30).ok_or("bad date")?;
    let loans = vec![loan];
    let stats = portfolio_stats(&loans);
    let queue = collection_queue(&loans, as_of);
    println!("active loans: {}, outstanding: {}", stats.active_loans, stats.total_outstanding);
    for item in &queue.overdue {
        println!("overdue: {} #{} due {} ({})", item.customer, item.installment, item.due_date, item.pending_amount);
    }

    println!("{}", LoanRecord::from_loan(&loans[0]).to_json_pretty()?);

    Ok(())
}
