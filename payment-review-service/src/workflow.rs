use crate::error::ReviewError;
use chrono::{DateTime, Utc};
use payment_db_entity::db::transaction_record::TransactionStatus;

/// Checks a requested status edge against the moderation flow.
///
/// Forward movement along the happy path (approval, then bank verification)
/// plus the review detours through hold and back are the only legal edges;
/// everything else, self-edges included, is rejected without touching the
/// record.
pub fn validate_transition(
    from: TransactionStatus,
    to: TransactionStatus,
) -> Result<(), ReviewError> {
    use TransactionStatus::*;
    match (from, to) {
        (Pending, Registered)
        | (Pending, Hold)
        | (Registered, BnkVerified)
        | (Registered, Pending)
        | (Registered, Hold)
        | (Hold, Registered)
        | (Hold, Pending)
        | (BnkVerified, Registered) => Ok(()),
        _ => Err(ReviewError::Transition { from, to }),
    }
}

/// Whether an edge calls for a reviewer comment. Only the two forward
/// happy-path edges are exempt; any backward movement or move to hold
/// should carry a reason for the audit trail. The comment stays optional
/// input: this gates when one is asked for, not whether the edge proceeds.
pub fn comment_required(from: TransactionStatus, to: TransactionStatus) -> bool {
    use TransactionStatus::*;
    !matches!((from, to), (Pending, Registered) | (Registered, BnkVerified))
}

/// Appends a timestamped note to the accumulated comments, never replacing
/// prior content.
pub fn append_comment(existing: &str, note: &str, at: DateTime<Utc>) -> String {
    let stamped = format!("{} - {}", at.format("%d %b %H:%M"), note);
    if existing.is_empty() {
        stamped
    } else {
        format!("{}\n{}", existing, stamped)
    }
}
