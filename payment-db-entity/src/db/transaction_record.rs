use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Moderation lifecycle of a submitted transaction record.
///
/// The wire strings are exactly `PENDING`, `REGISTERED`, `HOLD` and
/// `BNK_VERIFIED`; any other value is a deserialization error, not a
/// fallback.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Registered,
    Hold,
    BnkVerified,
}

impl Default for TransactionStatus {
    fn default() -> Self {
        Self::Pending
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Assigned by the store on first save; empty before that.
    #[serde(default)]
    pub id: String,
    pub item_label: String,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub status: TransactionStatus,
    /// Raw multi-line text from the proof scan; empty means no scan attached.
    #[serde(default)]
    pub recognized_text: String,
    pub parsed_amount: Option<String>,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub has_image: bool,
}
