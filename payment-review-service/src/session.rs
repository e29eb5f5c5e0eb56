use std::sync::Mutex;

/// Hand-off slot for a proof image arriving from outside the normal
/// submission flow, e.g. shared into the service by another application.
/// One producer offers the bytes; the single consumer claims them, which
/// clears the slot.
#[derive(Debug, Default)]
pub struct SharedImage {
    pending: Mutex<Option<Vec<u8>>>,
}

impl SharedImage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a pending image, replacing any unclaimed one.
    pub fn offer(&self, bytes: Vec<u8>) {
        *self.pending.lock().expect("shared image lock poisoned") = Some(bytes);
    }

    /// Takes the pending image, leaving the slot empty.
    pub fn claim(&self) -> Option<Vec<u8>> {
        self.pending
            .lock()
            .expect("shared image lock poisoned")
            .take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .expect("shared image lock poisoned")
            .is_some()
    }
}
