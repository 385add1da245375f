//! Scrape cycle: reset, run the script, decode, project.
//!
//! Cycles are single-flight. A request that arrives while one is running
//! waits for it and serves its result rather than starting another remote
//! round trip. The exposition is rendered under the same lock so readers
//! never see a half-reset registry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Result, ScrapeError};
use crate::metrics::ExporterMetrics;
use crate::parser::parse_output;
use crate::projector::project;
use crate::remote::{RemoteExecutor, RemoteOutput};

pub struct Scraper {
    metrics: ExporterMetrics,
    executor: Arc<dyn RemoteExecutor>,
    script: Arc<str>,
    timeout: Duration,
    flight: Mutex<()>,
    cycles: AtomicU64,
}

impl Scraper {
    pub fn new(
        metrics: ExporterMetrics,
        executor: Arc<dyn RemoteExecutor>,
        script: impl Into<Arc<str>>,
        timeout: Duration,
    ) -> Self {
        Self {
            metrics,
            executor,
            script: script.into(),
            timeout,
            flight: Mutex::new(()),
            cycles: AtomicU64::new(0),
        }
    }

    pub fn metrics(&self) -> &ExporterMetrics {
        &self.metrics
    }

    /// Number of cycles run so far, aborted ones included.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Acquire)
    }

    /// Runs one cycle unconditionally. Returns the number of fields that
    /// could not be parsed, or the error that aborted the cycle.
    pub async fn scrape(&self) -> Result<usize> {
        let _flight = self.flight.lock().await;
        self.run_cycle().await
    }

    /// Runs (or joins) a cycle, then renders the registry.
    /// Scrape failures are logged only; the caller always gets the exposition.
    pub async fn scrape_and_encode(&self) -> prometheus::Result<(String, Vec<u8>)> {
        let seen = self.cycles();
        let _flight = self.flight.lock().await;
        if self.cycles() == seen {
            let _ = self.run_cycle().await;
        } else {
            debug!("served result of concurrent scrape");
        }
        self.metrics.encode()
    }

    async fn run_cycle(&self) -> Result<usize> {
        info!("scraping metrics");
        let res = self.sample().await;
        self.cycles.fetch_add(1, Ordering::AcqRel);
        match &res {
            Ok(0) => info!("scrape complete"),
            Ok(n) => warn!(failed_fields = n, "scrape complete with unparsable fields"),
            Err(e) => warn!("scrape aborted: {e}"),
        }
        res
    }

    async fn sample(&self) -> Result<usize> {
        self.metrics.reset();
        let output = self.execute().await?;
        if !output.stderr.is_empty() {
            debug!(stderr = %output.stderr.trim(), "remote script wrote to stderr");
        }
        let records = parse_output(&output.stdout)?;
        debug!(
            system_fields = records.system.len(),
            pon_fields = records.device.len(),
            memory_fields = records.memory.len(),
            "decoded script output"
        );
        Ok(project(&records, &self.metrics))
    }

    async fn execute(&self) -> Result<RemoteOutput> {
        let executor = Arc::clone(&self.executor);
        let script = Arc::clone(&self.script);
        let job = tokio::task::spawn_blocking(move || executor.execute(&script));
        match tokio::time::timeout(self.timeout, job).await {
            Ok(Ok(res)) => res,
            Ok(Err(e)) => Err(ScrapeError::Worker(e.to_string())),
            Err(_) => Err(ScrapeError::Timeout(self.timeout)),
        }
    }
}
