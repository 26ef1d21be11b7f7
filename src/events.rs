use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::{Frequency, LoanId, LoanStatus, LoanTermType};

/// all events that can be emitted by a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // lifecycle events
    LoanOriginated {
        loan_id: LoanId,
        customer: String,
        finance_number: u32,
        principal: Money,
        monthly_rate: Rate,
        term_type: LoanTermType,
        timestamp: DateTime<Utc>,
    },
    ScheduleGenerated {
        loan_id: LoanId,
        installments: u32,
        frequency: Frequency,
        total_interest: Money,
        total_repayable: Money,
        first_due_date: Option<NaiveDate>,
        loan_end_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },
    LoanRescheduled {
        loan_id: LoanId,
        old_installments: u32,
        new_installments: u32,
        timestamp: DateTime<Utc>,
    },
    LoanRefinanced {
        loan_id: LoanId,
        new_loan_id: LoanId,
        new_finance_number: u32,
        timestamp: DateTime<Utc>,
    },

    // payment events
    PaymentRecorded {
        loan_id: LoanId,
        installment: u32,
        amount: Money,
        pending_amount: Money,
        mode_of_payment: String,
        timestamp: DateTime<Utc>,
    },
    InstallmentPaid {
        loan_id: LoanId,
        installment: u32,
        amount_due: Money,
        timestamp: DateTime<Utc>,
    },
    PaymentUndone {
        loan_id: LoanId,
        installment: u32,
        reversed_amount: Money,
        timestamp: DateTime<Utc>,
    },

    // revolving events
    InterestOnlyPaid {
        loan_id: LoanId,
        installment: u32,
        interest: Money,
        timestamp: DateTime<Utc>,
    },
    InstallmentAppended {
        loan_id: LoanId,
        installment: u32,
        amount_due: Money,
        due_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },
    LoanEndDateExtended {
        loan_id: LoanId,
        old_end_date: NaiveDate,
        new_end_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },
    ExtensionFailed {
        loan_id: LoanId,
        installment: u32,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    // status change events
    StatusChanged {
        loan_id: LoanId,
        old_status: LoanStatus,
        new_status: LoanStatus,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl Event {
    pub fn loan_id(&self) -> LoanId {
        match self {
            Event::LoanOriginated { loan_id, .. }
            | Event::ScheduleGenerated { loan_id, .. }
            | Event::LoanRescheduled { loan_id, .. }
            | Event::LoanRefinanced { loan_id, .. }
            | Event::PaymentRecorded { loan_id, .. }
            | Event::InstallmentPaid { loan_id, .. }
            | Event::PaymentUndone { loan_id, .. }
            | Event::InterestOnlyPaid { loan_id, .. }
            | Event::InstallmentAppended { loan_id, .. }
            | Event::LoanEndDateExtended { loan_id, .. }
            | Event::ExtensionFailed { loan_id, .. }
            | Event::StatusChanged { loan_id, .. } => *loan_id,
        }
    }
}

/// event store for collecting events during operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    #[test]
    fn test_emit_and_take() {
        let loan_id = Uuid::new_v4();
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let mut store = EventStore::new();
        store.emit(Event::StatusChanged {
            loan_id,
            old_status: LoanStatus::Active,
            new_status: LoanStatus::Settled,
            reason: "settled by lender".to_string(),
            timestamp,
        });

        assert_eq!(store.len(), 1);
        assert_eq!(store.events()[0].loan_id(), loan_id);

        let taken = store.take_events();
        assert_eq!(taken.len(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_events_serialize() {
        let event = Event::PaymentUndone {
            loan_id: Uuid::nil(),
            installment: 2,
            reversed_amount: Money::from_major(500),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap(),
        };

        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
