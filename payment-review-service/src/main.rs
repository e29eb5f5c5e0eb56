use figment::{
    providers::{Format, Toml},
    Figment,
};
use payment_review_service::config;
use payment_review_service::dto::QueueCounts;
use payment_review_service::store::{MemoryGateway, SyncGateway};
use std::error::Error;
use std::time::Duration;
use tokio::{signal, time::sleep};
use tracing::{info, warn};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config: config::Config = Figment::new().merge(Toml::file("App.toml")).extract()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", &config.rust_log);
    }
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                format!("payment_review_service={}", &config.review_service_log)
                    .parse()
                    .expect("Error parsing directive"),
            ),
        )
        .with_span_events(FmtSpan::FULL)
        .init();

    let queue_refresh_secs = match config.queue_refresh_secs {
        Some(v) => v,
        None => 60,
    };

    // In-process store; a remote document store adapter plugs in here.
    let gateway = MemoryGateway::new();
    let mut subscription = gateway.subscribe(None);

    info!("payment review service started");
    loop {
        tokio::select! {
            changed = subscription.changed() => {
                match changed {
                    Ok(()) => {
                        let counts = QueueCounts::tally(&subscription.current());
                        info!("Moderation queue changed: {:?}", counts);
                    }
                    Err(error) => {
                        warn!("Record subscription ended: {}", error);
                        break;
                    }
                }
            }
            _ = sleep(Duration::from_secs(queue_refresh_secs)) => {
                let counts = QueueCounts::tally(&subscription.current());
                info!(
                    "Moderation queue: {} total, {} pending",
                    counts.total(),
                    counts.pending
                );
            }
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}
