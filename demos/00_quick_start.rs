/// quick start - originate a loan, take a payment, print the schedule
use chrono::NaiveDate;
use loan_ledger_rs::{Frequency, Loan, Money, Rate, SafeTimeProvider, TimeSource};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::System);

    // 50,000 at 10% per month, collected monthly from Feb to Jul
    let loan = Loan::builder()
        .customer("Asha Traders")
        .principal(Money::from_major(50_000))
        .monthly_rate(Rate::from_percentage(10))
        .loan_given_date(NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("bad date")?)
        .frequency(Frequency::Monthly)
        .first_collection_date(NaiveDate::from_ymd_opt(2024, 2, 1).ok_or("bad date")?)
        .loan_end_date(NaiveDate::from_ymd_opt(2024, 7, 1).ok_or("bad date")?)
        .build(&time)?;

    // pay the first installment and part of the second
    let loan = loan.pay_full(1, Some("UPI"), &time)?;
    let loan = loan.record_payment(2, Money::from_major(5_000), None, &time)?;

    for row in loan.schedule.iter() {
        println!(
            "#{:<2} due {}  amount {:>10}  paid {:>10}  pending {:>10}  {}",
            row.index,
            row.due_date.map(|d| d.to_string()).unwrap_or_default(),
            row.amount_due,
            row.amount_paid,
            row.pending_amount,
            row.status,
        );
    }

    let summary = loan.summary();
    println!("\ntotal interest:  {}", summary.total_interest);
    println!("total repayable: {}", summary.total_repayable);
    println!("outstanding:     {}", summary.outstanding);

    Ok(())
}
