use crate::dto::ProofSubmission;
use crate::error::ReviewError;
use crate::image_utils;
use crate::ocr::{ProofParser, TextRecognizer};
use crate::store::{RecordChanges, RecordFilter, RecordSubscription, SyncGateway};
use crate::workflow;
use chrono::Utc;
use payment_db_entity::db::{
    image_payload,
    transaction_record::{Model, TransactionStatus},
};
use std::sync::Arc;
use tracing::{info, warn};

/// Orchestrates the review pipeline over the store gateway: submission
/// with scan and compression, moderation updates, cascading deletes and
/// the verified purge.
pub struct PaymentRepository {
    gateway: Arc<dyn SyncGateway>,
    recognizer: Arc<dyn TextRecognizer>,
    parser: ProofParser,
}

impl PaymentRepository {
    pub fn new(gateway: Arc<dyn SyncGateway>, recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            gateway,
            recognizer,
            parser: ProofParser::default(),
        }
    }

    /// Records a new submission. A failed text scan never blocks the
    /// submission; the record keeps an explanatory placeholder so a
    /// reviewer can still process it manually.
    pub async fn submit(&self, submission: ProofSubmission) -> Result<Model, ReviewError> {
        let ProofSubmission {
            item_label,
            amount,
            image,
        } = submission;

        let mut recognized_text = String::new();
        let mut parsed_amount = None;
        let mut encoded_image = None;
        if let Some(ref bytes) = image {
            match self.recognizer.recognize(bytes).await {
                Ok(text) => {
                    let parsed = self.parser.parse(&text);
                    if let Some(ref reference_id) = parsed.reference_id {
                        info!("Detected reference id {}", reference_id);
                    }
                    if let Some(ref detected) = parsed.amount {
                        info!("Detected amount {}", detected);
                    }
                    recognized_text = parsed.raw_text;
                    parsed_amount = parsed.amount;
                }
                Err(error) => {
                    warn!("Text scan failed, keeping record for manual review: {}", error);
                    recognized_text = format!("Text scan failed: {}", error);
                }
            }
            encoded_image = Some(image_utils::compress_to_base64(bytes)?);
        }

        let record = Model {
            id: String::new(),
            item_label,
            amount,
            created_at: Utc::now(),
            status: TransactionStatus::Pending,
            recognized_text,
            parsed_amount,
            comments: String::new(),
            has_image: encoded_image.is_some(),
        };
        let id = self.gateway.create(record).await?;

        if let Some(encoded_bytes) = encoded_image {
            let payload = image_payload::Model {
                id: id.clone(),
                encoded_bytes,
            };
            if let Err(error) = self.gateway.put_payload(payload).await {
                // has_image must never point at a missing payload
                if let Err(cleanup) = self.gateway.delete(&id).await {
                    warn!(
                        "Could not remove record {} after payload failure: {}",
                        id, cleanup
                    );
                }
                return Err(error);
            }
        }

        info!("Transaction {} submitted, pending approval", id);
        self.gateway.get_one(&id).await
    }

    /// Applies a moderation edge. An illegal edge is rejected before any
    /// write. A supplied comment is appended to the audit trail with a
    /// timestamp; without one the comments stay untouched.
    pub async fn update_status(
        &self,
        id: &str,
        new_status: TransactionStatus,
        comment: Option<&str>,
    ) -> Result<Model, ReviewError> {
        let record = self.gateway.get_one(id).await?;
        workflow::validate_transition(record.status, new_status)?;

        let comments = match comment {
            Some(note) if !note.trim().is_empty() => Some(workflow::append_comment(
                &record.comments,
                note,
                Utc::now(),
            )),
            _ => None,
        };

        self.gateway
            .update(
                id,
                RecordChanges {
                    status: Some(new_status),
                    comments,
                },
            )
            .await?;
        info!("Transaction {} moved {} -> {}", id, record.status, new_status);
        self.gateway.get_one(id).await
    }

    /// Removes a record and, when present, its image payload.
    pub async fn delete(&self, id: &str) -> Result<(), ReviewError> {
        match self.gateway.get_one(id).await {
            Ok(record) => {
                if record.has_image {
                    self.gateway.delete_payload(id).await?;
                }
                self.gateway.delete(id).await
            }
            // record deletion is idempotent; nothing to cascade
            Err(ReviewError::NotFound(_)) => self.gateway.delete(id).await,
            Err(error) => Err(error),
        }
    }

    /// Deletes every bank-verified record in one atomic batch and returns
    /// how many were removed. An empty verified set performs no write.
    pub async fn purge_verified(&self) -> Result<usize, ReviewError> {
        let verified = self
            .gateway
            .subscribe(Some(RecordFilter::status(TransactionStatus::BnkVerified)))
            .current();
        if verified.is_empty() {
            return Ok(0);
        }

        let ids: Vec<String> = verified.iter().map(|record| record.id.clone()).collect();
        self.gateway.delete_batch(&ids).await?;

        for record in verified.iter().filter(|record| record.has_image) {
            if let Err(error) = self.gateway.delete_payload(&record.id).await {
                warn!("Orphaned payload {} left behind: {}", record.id, error);
            }
        }

        info!("Deleted {} verified transactions", ids.len());
        Ok(ids.len())
    }

    /// Fetches the stored proof image on demand. Misses, including a
    /// record that never had an image, surface as not-found.
    pub async fn image(&self, id: &str) -> Result<String, ReviewError> {
        let record = self.gateway.get_one(id).await?;
        if !record.has_image {
            return Err(ReviewError::NotFound(id.to_owned()));
        }
        let payload = self.gateway.get_payload(id).await?;
        Ok(payload.encoded_bytes)
    }

    pub fn transactions(&self, filter: Option<RecordFilter>) -> RecordSubscription {
        self.gateway.subscribe(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryGateway;
    use async_trait::async_trait;
    use image::{Rgb, RgbImage};
    use rust_decimal::Decimal;
    use std::io::Cursor;

    struct FixedRecognizer(&'static str);

    #[async_trait]
    impl TextRecognizer for FixedRecognizer {
        async fn recognize(&self, _image_bytes: &[u8]) -> Result<String, ReviewError> {
            Ok(self.0.to_owned())
        }
    }

    struct FailingRecognizer;

    #[async_trait]
    impl TextRecognizer for FailingRecognizer {
        async fn recognize(&self, _image_bytes: &[u8]) -> Result<String, ReviewError> {
            Err(ReviewError::Recognition("scanner offline".to_owned()))
        }
    }

    fn repository(recognizer: Arc<dyn TextRecognizer>) -> (Arc<MemoryGateway>, PaymentRepository) {
        let gateway = Arc::new(MemoryGateway::new());
        let repository = PaymentRepository::new(gateway.clone(), recognizer);
        (gateway, repository)
    }

    fn screenshot() -> Vec<u8> {
        let bitmap = RgbImage::from_fn(96, 96, |x, y| Rgb([x as u8, y as u8, 128]));
        let mut buffer = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(bitmap)
            .write_to(&mut buffer, image::ImageOutputFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    fn submission(image: Option<Vec<u8>>) -> ProofSubmission {
        ProofSubmission::new("Morning Program".to_owned(), Decimal::new(50000, 2), image)
    }

    #[tokio::test]
    async fn submit_without_image_has_no_payload() {
        let (_, repository) = repository(Arc::new(FailingRecognizer));
        let record = repository.submit(submission(None)).await.unwrap();

        assert!(!record.id.is_empty());
        assert_eq!(record.status, TransactionStatus::Pending);
        assert!(!record.has_image);
        assert!(record.recognized_text.is_empty());
        assert_eq!(record.parsed_amount, None);

        let result = repository.image(&record.id).await;
        assert!(matches!(result, Err(ReviewError::NotFound(_))));
    }

    #[tokio::test]
    async fn submit_with_image_stores_payload_and_hint() {
        let recognizer = FixedRecognizer("UTR 123456789012\nPaid ₹1,250.00 via UPI");
        let (gateway, repository) = repository(Arc::new(recognizer));

        let record = repository.submit(submission(Some(screenshot()))).await.unwrap();
        assert!(record.has_image);
        assert_eq!(record.parsed_amount.as_deref(), Some("1250.00"));
        assert_eq!(
            record.recognized_text,
            "UTR 123456789012\nPaid ₹1,250.00 via UPI"
        );

        let encoded = repository.image(&record.id).await.unwrap();
        assert!(image_utils::decode_base64(&encoded).is_ok());
        assert!(gateway.get_payload(&record.id).await.is_ok());
    }

    #[tokio::test]
    async fn failed_scan_degrades_to_a_placeholder() {
        let (_, repository) = repository(Arc::new(FailingRecognizer));

        let record = repository.submit(submission(Some(screenshot()))).await.unwrap();
        assert!(record.recognized_text.contains("scanner offline"));
        assert_eq!(record.parsed_amount, None);
        // the compressed image is still attached for manual review
        assert!(record.has_image);
    }

    #[tokio::test]
    async fn undecodable_image_rejects_the_submission() {
        let (gateway, repository) = repository(Arc::new(FixedRecognizer("Paid ₹10")));

        let result = repository
            .submit(submission(Some(b"not an image".to_vec())))
            .await;
        assert!(matches!(result, Err(ReviewError::Decode(_))));
        assert!(gateway.subscribe(None).current().is_empty());
    }

    #[tokio::test]
    async fn update_status_appends_a_stamped_comment() {
        let (_, repository) = repository(Arc::new(FailingRecognizer));
        let record = repository.submit(submission(None)).await.unwrap();

        let held = repository
            .update_status(&record.id, TransactionStatus::Hold, Some("Awaiting bank slip"))
            .await
            .unwrap();
        assert_eq!(held.status, TransactionStatus::Hold);
        assert!(held.comments.ends_with("- Awaiting bank slip"));
    }

    #[tokio::test]
    async fn omitted_comment_leaves_the_trail_untouched() {
        let (_, repository) = repository(Arc::new(FailingRecognizer));
        let record = repository.submit(submission(None)).await.unwrap();

        // comment-required edge, but the comment is optional input
        let held = repository
            .update_status(&record.id, TransactionStatus::Hold, None)
            .await
            .unwrap();
        assert_eq!(held.status, TransactionStatus::Hold);
        assert!(held.comments.is_empty());

        let blank = repository
            .update_status(&held.id, TransactionStatus::Registered, Some("   "))
            .await
            .unwrap();
        assert!(blank.comments.is_empty());
    }

    #[tokio::test]
    async fn illegal_edge_is_rejected_without_a_write() {
        let (_, repository) = repository(Arc::new(FailingRecognizer));
        let record = repository.submit(submission(None)).await.unwrap();

        let result = repository
            .update_status(&record.id, TransactionStatus::BnkVerified, None)
            .await;
        assert!(matches!(result, Err(ReviewError::Transition { .. })));

        let unchanged = repository.gateway.get_one(&record.id).await.unwrap();
        assert_eq!(unchanged.status, TransactionStatus::Pending);
    }

    #[tokio::test]
    async fn update_of_unknown_record_is_not_found() {
        let (_, repository) = repository(Arc::new(FailingRecognizer));
        let result = repository
            .update_status("absent", TransactionStatus::Registered, None)
            .await;
        assert!(matches!(result, Err(ReviewError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_cascades_to_the_payload() {
        let (gateway, repository) = repository(Arc::new(FixedRecognizer("Paid ₹10")));
        let record = repository.submit(submission(Some(screenshot()))).await.unwrap();

        repository.delete(&record.id).await.unwrap();
        assert!(matches!(
            gateway.get_one(&record.id).await,
            Err(ReviewError::NotFound(_))
        ));
        assert!(matches!(
            gateway.get_payload(&record.id).await,
            Err(ReviewError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn purge_of_empty_verified_set_is_a_no_op() {
        let (_, repository) = repository(Arc::new(FailingRecognizer));
        repository.submit(submission(None)).await.unwrap();

        assert_eq!(repository.purge_verified().await.unwrap(), 0);
        assert_eq!(repository.transactions(None).current().len(), 1);
    }

    #[tokio::test]
    async fn purge_removes_every_verified_record_and_payload() {
        let recognizer = FixedRecognizer("Paid ₹10");
        let (gateway, repository) = repository(Arc::new(recognizer));

        let first = repository.submit(submission(Some(screenshot()))).await.unwrap();
        let second = repository.submit(submission(None)).await.unwrap();
        let kept = repository.submit(submission(None)).await.unwrap();

        for id in [&first.id, &second.id] {
            repository
                .update_status(id, TransactionStatus::Registered, None)
                .await
                .unwrap();
            repository
                .update_status(id, TransactionStatus::BnkVerified, None)
                .await
                .unwrap();
        }

        assert_eq!(repository.purge_verified().await.unwrap(), 2);
        assert!(matches!(
            gateway.get_payload(&first.id).await,
            Err(ReviewError::NotFound(_))
        ));

        let remaining = repository.transactions(None).current();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, kept.id);
    }
}
