use payment_db_entity::db::transaction_record::{Model, TransactionStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A user-facing proof submission before it becomes a stored record.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ProofSubmission {
    pub item_label: String,
    pub amount: Decimal,
    /// Raw bytes of the attached proof screenshot, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Vec<u8>>,
}

impl ProofSubmission {
    pub fn new(item_label: String, amount: Decimal, image: Option<Vec<u8>>) -> Self {
        Self {
            item_label,
            amount,
            image,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct QueueCounts {
    pub pending: usize,
    pub registered: usize,
    pub hold: usize,
    pub bnk_verified: usize,
}

impl QueueCounts {
    pub fn tally(records: &[Model]) -> QueueCounts {
        let mut counts = QueueCounts::default();
        for record in records {
            match record.status {
                TransactionStatus::Pending => counts.pending += 1,
                TransactionStatus::Registered => counts.registered += 1,
                TransactionStatus::Hold => counts.hold += 1,
                TransactionStatus::BnkVerified => counts.bnk_verified += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.pending + self.registered + self.hold + self.bnk_verified
    }
}
