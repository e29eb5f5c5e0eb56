use crate::error::ReviewError;
use async_trait::async_trait;
use payment_db_entity::db::{
    image_payload,
    transaction_record::{Model, TransactionStatus},
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use uuid::Uuid;

/// Hard per-document ceiling of the backing store, measured on the JSON
/// encoding. Writes above it fail outright; nothing is truncated.
pub const MAX_DOCUMENT_BYTES: usize = 1024 * 1024;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordFilter {
    pub status: Option<TransactionStatus>,
    pub item_label: Option<String>,
}

impl RecordFilter {
    pub fn status(status: TransactionStatus) -> Self {
        Self {
            status: Some(status),
            item_label: None,
        }
    }

    pub fn matches(&self, record: &Model) -> bool {
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(ref item_label) = self.item_label {
            if record.item_label.ne(item_label) {
                return false;
            }
        }
        true
    }
}

/// Fields the review flow may merge into an existing record. Everything
/// else on a record is immutable after creation.
#[derive(Clone, Debug, Default)]
pub struct RecordChanges {
    pub status: Option<TransactionStatus>,
    pub comments: Option<String>,
}

/// Live view of the record set, sorted by creation time descending. The
/// full current set is re-emitted on every store change. Dropping the
/// subscription, or calling `unsubscribe`, releases the underlying
/// listener.
pub struct RecordSubscription {
    receiver: watch::Receiver<Vec<Model>>,
    filter: Option<RecordFilter>,
}

impl RecordSubscription {
    pub fn current(&self) -> Vec<Model> {
        let records = self.receiver.borrow();
        match self.filter {
            Some(ref filter) => records
                .iter()
                .filter(|record| filter.matches(record))
                .cloned()
                .collect(),
            None => records.clone(),
        }
    }

    /// Waits for the next change of the underlying record set.
    pub async fn changed(&mut self) -> Result<(), ReviewError> {
        self.receiver
            .changed()
            .await
            .map_err(|_| ReviewError::Sync {
                op: "subscribe",
                message: "store closed".to_owned(),
            })
    }

    pub fn unsubscribe(self) {}
}

/// The persistence boundary the review flow depends on. Record documents
/// and image payload documents live in separate buckets of the same store;
/// payloads are keyed by the owning record's id.
#[async_trait]
pub trait SyncGateway: Send + Sync {
    /// Stores a new record and returns the id the store assigned to it.
    /// The incoming record must not carry an id of its own.
    async fn create(&self, record: Model) -> Result<String, ReviewError>;

    /// Merges the named fields into an existing record.
    async fn update(&self, id: &str, changes: RecordChanges) -> Result<(), ReviewError>;

    /// Removes a record. Deleting a missing id is not an error.
    async fn delete(&self, id: &str) -> Result<(), ReviewError>;

    /// Removes a set of records as one atomic operation: either every
    /// listed record is gone afterwards or none are.
    async fn delete_batch(&self, ids: &[String]) -> Result<(), ReviewError>;

    async fn get_one(&self, id: &str) -> Result<Model, ReviewError>;

    /// Stores an image payload. A payload is written at most once per id
    /// and never mutated afterwards.
    async fn put_payload(&self, payload: image_payload::Model) -> Result<(), ReviewError>;

    async fn get_payload(&self, id: &str) -> Result<image_payload::Model, ReviewError>;

    /// Removes a payload. Deleting a missing id is not an error.
    async fn delete_payload(&self, id: &str) -> Result<(), ReviewError>;

    fn subscribe(&self, filter: Option<RecordFilter>) -> RecordSubscription;
}

#[derive(Debug, Default)]
struct Documents {
    records: HashMap<String, Model>,
    payloads: HashMap<String, image_payload::Model>,
}

/// In-process gateway used by the service shell and the test suite. A
/// remote document store adapter satisfies the same contract in a real
/// deployment.
pub struct MemoryGateway {
    documents: Arc<RwLock<Documents>>,
    publisher: watch::Sender<Vec<Model>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        let (publisher, _) = watch::channel(Vec::new());
        Self {
            documents: Arc::new(RwLock::new(Documents::default())),
            publisher,
        }
    }

    fn publish(&self, documents: &Documents) {
        let mut snapshot: Vec<Model> = documents.records.values().cloned().collect();
        snapshot.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.publisher.send_replace(snapshot);
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

fn check_document_size<T: serde::Serialize>(
    op: &'static str,
    document: &T,
) -> Result<(), ReviewError> {
    let encoded = serde_json::to_vec(document).map_err(|error| ReviewError::Sync {
        op,
        message: error.to_string(),
    })?;
    if encoded.len() > MAX_DOCUMENT_BYTES {
        return Err(ReviewError::Sync {
            op,
            message: format!(
                "document of {} bytes exceeds the {} byte ceiling",
                encoded.len(),
                MAX_DOCUMENT_BYTES
            ),
        });
    }
    Ok(())
}

#[async_trait]
impl SyncGateway for MemoryGateway {
    async fn create(&self, mut record: Model) -> Result<String, ReviewError> {
        if !record.id.is_empty() {
            return Err(ReviewError::Sync {
                op: "create",
                message: "id is assigned by the store".to_owned(),
            });
        }
        record.id = Uuid::new_v4().to_string();
        check_document_size("create", &record)?;

        let mut documents = self.documents.write().expect("document store lock poisoned");
        let id = record.id.clone();
        documents.records.insert(id.clone(), record);
        self.publish(&documents);
        Ok(id)
    }

    async fn update(&self, id: &str, changes: RecordChanges) -> Result<(), ReviewError> {
        let mut documents = self.documents.write().expect("document store lock poisoned");
        let existing = documents
            .records
            .get(id)
            .ok_or_else(|| ReviewError::NotFound(id.to_owned()))?;

        let mut updated = existing.clone();
        if let Some(status) = changes.status {
            updated.status = status;
        }
        if let Some(comments) = changes.comments {
            updated.comments = comments;
        }
        check_document_size("update", &updated)?;

        documents.records.insert(id.to_owned(), updated);
        self.publish(&documents);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), ReviewError> {
        let mut documents = self.documents.write().expect("document store lock poisoned");
        if documents.records.remove(id).is_some() {
            self.publish(&documents);
        }
        Ok(())
    }

    async fn delete_batch(&self, ids: &[String]) -> Result<(), ReviewError> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut documents = self.documents.write().expect("document store lock poisoned");
        let mut removed = false;
        for id in ids {
            removed |= documents.records.remove(id).is_some();
        }
        if removed {
            self.publish(&documents);
        }
        Ok(())
    }

    async fn get_one(&self, id: &str) -> Result<Model, ReviewError> {
        let documents = self.documents.read().expect("document store lock poisoned");
        documents
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| ReviewError::NotFound(id.to_owned()))
    }

    async fn put_payload(&self, payload: image_payload::Model) -> Result<(), ReviewError> {
        check_document_size("put_payload", &payload)?;
        let mut documents = self.documents.write().expect("document store lock poisoned");
        if documents.payloads.contains_key(&payload.id) {
            return Err(ReviewError::Sync {
                op: "put_payload",
                message: format!("payload for {} already written", payload.id),
            });
        }
        documents.payloads.insert(payload.id.clone(), payload);
        Ok(())
    }

    async fn get_payload(&self, id: &str) -> Result<image_payload::Model, ReviewError> {
        let documents = self.documents.read().expect("document store lock poisoned");
        documents
            .payloads
            .get(id)
            .cloned()
            .ok_or_else(|| ReviewError::NotFound(id.to_owned()))
    }

    async fn delete_payload(&self, id: &str) -> Result<(), ReviewError> {
        let mut documents = self.documents.write().expect("document store lock poisoned");
        documents.payloads.remove(id);
        Ok(())
    }

    fn subscribe(&self, filter: Option<RecordFilter>) -> RecordSubscription {
        RecordSubscription {
            receiver: self.publisher.subscribe(),
            filter,
        }
    }
}
