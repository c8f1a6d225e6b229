//! Cron-style job scheduler using tokio-cron-scheduler.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use conduit_core::services::SocialGraph;

/// Every ten minutes, on the minute.
const DEFAULT_RECONCILE_CRON: &str = "0 */10 * * * *";

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Enable scheduler.
    pub enabled: bool,
    /// Schedule (with seconds) for favorites counter reconciliation.
    pub reconcile_cron: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reconcile_cron: DEFAULT_RECONCILE_CRON.to_string(),
        }
    }
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: std::env::var("SCHEDULER_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            reconcile_cron: std::env::var("RECONCILE_CRON")
                .unwrap_or_else(|_| DEFAULT_RECONCILE_CRON.to_string()),
        }
    }
}

/// Cron job scheduler wrapper.
pub struct Scheduler {
    inner: JobScheduler,
    config: SchedulerConfig,
}

impl Scheduler {
    pub async fn new(config: SchedulerConfig) -> Result<Self, JobSchedulerError> {
        let inner = JobScheduler::new().await?;
        Ok(Self { inner, config })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Add a cron job.
    pub async fn add_cron<F, Fut>(
        &self,
        schedule: &str,
        task: F,
    ) -> Result<uuid::Uuid, JobSchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let job = Job::new_async(schedule, move |_uuid, _lock| {
            let task = task.clone();
            Box::pin(async move {
                task().await;
            })
        })?;

        let id = self.inner.add(job).await?;
        tracing::info!(schedule = %schedule, job_id = %id, "Cron job registered");
        Ok(id)
    }

    pub async fn start(&self) -> Result<(), JobSchedulerError> {
        if !self.config.enabled {
            tracing::info!("Scheduler disabled");
            return Ok(());
        }

        self.inner.start().await?;
        tracing::info!("Scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), JobSchedulerError> {
        self.inner.shutdown().await?;
        tracing::info!("Scheduler stopped");
        Ok(())
    }
}

/// Build a scheduler that periodically recomputes every article's cached
/// favorites counter from the membership records.
pub async fn start_reconciliation(
    graph: Arc<SocialGraph>,
    config: &SchedulerConfig,
) -> Result<Scheduler, JobSchedulerError> {
    let scheduler = Scheduler::new(config.clone()).await?;

    scheduler
        .add_cron(&config.reconcile_cron, move || {
            let graph = graph.clone();
            async move {
                match graph.reconcile_all().await {
                    Ok(report) => tracing::info!(
                        checked = report.checked,
                        corrected = report.corrected,
                        failed = report.failed,
                        "Favorites counters reconciled"
                    ),
                    Err(e) => tracing::error!(error = %e, "Favorites reconciliation failed"),
                }
            }
        })
        .await?;

    scheduler.start().await?;
    Ok(scheduler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule_has_seconds_field() {
        let config = SchedulerConfig::default();
        assert!(config.enabled);
        assert_eq!(config.reconcile_cron.split_whitespace().count(), 6);
    }

    #[tokio::test]
    async fn test_disabled_scheduler_starts_as_noop() {
        let config = SchedulerConfig {
            enabled: false,
            ..SchedulerConfig::default()
        };
        let scheduler = Scheduler::new(config).await.unwrap();

        scheduler.start().await.unwrap();
        assert!(!scheduler.config().enabled);
    }

    #[tokio::test]
    async fn test_rejects_malformed_schedule() {
        let scheduler = Scheduler::new(SchedulerConfig::default()).await.unwrap();
        let result = scheduler.add_cron("not a schedule", || async {}).await;
        assert!(result.is_err());
    }
}
