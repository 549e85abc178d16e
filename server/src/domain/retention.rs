//! Automatic age-based pruning

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::core::config::RetentionConfig;
use crate::core::constants::RETENTION_INTERVAL_SECS;
use crate::data::ReadingRepository;

/// Start the periodic prune task; `None` when retention is disabled
pub fn start_retention_task(
    store: Arc<dyn ReadingRepository>,
    config: &RetentionConfig,
    shutdown_rx: watch::Receiver<bool>,
) -> Option<JoinHandle<()>> {
    let Some(max_age_days) = config.max_age_days else {
        tracing::debug!("Retention disabled (no max age configured)");
        return None;
    };

    tracing::debug!(max_age_days, "Starting retention task");
    Some(spawn_retention_loop(
        store,
        max_age_days,
        Duration::from_secs(RETENTION_INTERVAL_SECS),
        shutdown_rx,
    ))
}

fn spawn_retention_loop(
    store: Arc<dyn ReadingRepository>,
    max_age_days: u32,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::debug!("Retention task shutting down");
                        break;
                    }
                }
                _ = interval.tick() => {
                    match store.prune_older_than(max_age_days).await {
                        Ok(0) => {}
                        Ok(deleted) => {
                            tracing::info!(deleted, max_age_days, "Pruned old readings");
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, max_age_days, "Retention prune failed");
                        }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{NewReading, SqliteService};
    use chrono::{Duration as ChronoDuration, Utc};

    #[tokio::test]
    async fn test_disabled_without_max_age() {
        let store: Arc<dyn ReadingRepository> =
            Arc::new(SqliteService::open_in_memory().await.unwrap());
        let (_tx, rx) = watch::channel(false);
        assert!(start_retention_task(store, &RetentionConfig::default(), rx).is_none());
    }

    #[tokio::test]
    async fn test_first_tick_prunes_then_stops_on_shutdown() {
        let sqlite = Arc::new(SqliteService::open_in_memory().await.unwrap());
        let now = Utc::now();
        sqlite
            .insert(&NewReading::new(1.0, 1.0, 1.0).at(now - ChronoDuration::days(10)))
            .await
            .unwrap();
        sqlite
            .insert(&NewReading::new(2.0, 2.0, 2.0).at(now))
            .await
            .unwrap();

        let (tx, rx) = watch::channel(false);
        let store: Arc<dyn ReadingRepository> = sqlite.clone();
        let handle = spawn_retention_loop(store, 7, Duration::from_secs(3600), rx);

        // Interval fires immediately on the first tick
        for _ in 0..50 {
            if sqlite.recent(10).await.unwrap().len() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(sqlite.recent(10).await.unwrap().len(), 1);

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
