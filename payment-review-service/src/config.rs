use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub rust_log: String,
    pub review_service_log: String,
    /// Seconds between moderation queue heartbeat logs.
    pub queue_refresh_secs: Option<u64>,
}
