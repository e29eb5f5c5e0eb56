use serde::{Deserialize, Serialize};

/// Compressed proof image, stored as its own document so the record stays
/// well under the per-document size ceiling. `id` equals the owning
/// transaction record's id; the payload is written once and only removed
/// together with its record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub id: String,
    pub encoded_bytes: String,
}
