use crate::error::ReviewError;
use async_trait::async_trait;
use regex::Regex;

/// Fields pre-filled from a proof scan. Extraction is a best-effort hint;
/// a reviewer always makes the final call, so absent fields are normal and
/// `raw_text` keeps the full scan for manual reading.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedProof {
    pub reference_id: Option<String>,
    pub amount: Option<String>,
    pub raw_text: String,
}

/// Produces the raw text for a proof image. The recognition backend is an
/// external collaborator; a failure here never blocks a submission.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, image_bytes: &[u8]) -> Result<String, ReviewError>;
}

pub struct ProofParser {
    reference: Regex,
    amount: Regex,
}

impl Default for ProofParser {
    fn default() -> Self {
        Self {
            // bank reference numbers are 12 consecutive digits
            reference: Regex::new(r"\b\d{12}\b").expect("Error parsing reference pattern"),
            amount: Regex::new(r"[₹Rs.]?\s?([\d,]+\.?\d*)").expect("Error parsing amount pattern"),
        }
    }
}

impl ProofParser {
    /// Line-by-line scan of recognized text. The first 12-digit match wins
    /// as the reference id. The amount is only taken from a line carrying a
    /// currency marker; bare numbers elsewhere are ignored since reference
    /// numbers and dates would otherwise match. First qualifying line wins
    /// for each field.
    pub fn parse(&self, raw: &str) -> ParsedProof {
        let mut reference_id = None;
        let mut amount = None;

        for line in raw.lines() {
            if reference_id.is_none() {
                if let Some(found) = self.reference.find(line) {
                    reference_id = Some(found.as_str().to_owned());
                }
            }

            if amount.is_none() && (line.contains('₹') || line.contains("Rs")) {
                if let Some(group) = self.amount.captures(line).and_then(|c| c.get(1)) {
                    let cleaned = group.as_str().replace(',', "");
                    if !cleaned.is_empty() && cleaned.parse::<f64>().is_ok() {
                        amount = Some(cleaned);
                    }
                }
            }
        }

        ParsedProof {
            reference_id,
            amount,
            raw_text: raw.to_owned(),
        }
    }
}
