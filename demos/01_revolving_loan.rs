/// revolving loan - interest-only payments roll the principal into next month
use chrono::{Duration, TimeZone, Utc};
use loan_ledger_rs::{
    ExtensionOutcome, LoanTermType, Loan, Money, Rate, SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== revolving loan example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 31, 9, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();

    // given today, due one month later
    let mut loan = Loan::builder()
        .customer("Ravi Kumar")
        .principal(Money::from_major(10_000))
        .monthly_rate(Rate::from_percentage(5))
        .term_type(LoanTermType::Monthly)
        .build(&time)?;

    println!(
        "loan given {} due {} for {}",
        loan.terms.loan_given_date,
        loan.terms.loan_end_date,
        loan.outstanding()
    );

    // three months of interest-only payments
    for _ in 0..3 {
        controller.advance(Duration::days(29));
        let index = loan.schedule.len() as u32;
        let (next, extension) = loan.pay_interest_only(index, Some("Cash"), &time)?;

        match extension {
            ExtensionOutcome::Appended { index, due_date, amount_due, .. } => {
                println!("interest paid on #{}; #{index} of {amount_due} due {due_date}", index - 1);
            }
            ExtensionOutcome::NotRequired => println!("nothing left to roll over"),
            ExtensionOutcome::Failed(err) => println!("interest recorded, extension failed: {err}"),
        }
        loan = next;
    }

    // close it out
    let index = loan.schedule.len() as u32;
    let mut loan = loan.pay_full(index, None, &time)?;
    println!("\nclosed; outstanding {}", loan.outstanding());
    println!("interest collected: {}", loan.interest_collected().round_currency());

    for event in loan.take_events() {
        println!("{event:?}");
    }

    Ok(())
}
