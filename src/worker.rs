use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::task::JoinSet;

use crate::client::{build_request, HttpClient};
use crate::collector::{self, Collector};
use crate::config::RequestConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::limiter::Limiter;
use crate::stats::{Outcome, Summary};

/// Performs one request attempt and turns every exit path into an outcome.
///
/// The limiter slot is held only around the network call and is released
/// when the permit goes out of scope, whichever branch returns.
pub async fn run_request(
    config: &RequestConfig,
    client: &dyn HttpClient,
    limiter: &Limiter,
    diagnostics: &dyn Diagnostics,
) -> Outcome {
    let request = match build_request(config) {
        Ok(request) => request,
        Err(e) => {
            diagnostics.report(Diagnostic::Construction(e.to_string()));
            return Outcome::failed(Duration::ZERO);
        }
    };

    let permit = limiter.acquire().await;

    let start = Instant::now();
    let result = client.execute(request).await;
    let duration = start.elapsed();
    drop(permit);

    match result {
        Ok(status) => Outcome::new(status.as_u16(), duration),
        Err(e) => {
            diagnostics.report(Diagnostic::Transport(format!("{:#}", e)));
            Outcome::failed(duration)
        }
    }
}

pub struct Dispatcher {
    config: Arc<RequestConfig>,
    client: Arc<dyn HttpClient>,
    diagnostics: Arc<dyn Diagnostics>,
    limiter: Limiter,
}

impl Dispatcher {
    pub fn new(
        config: RequestConfig,
        client: Arc<dyn HttpClient>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Result<Self> {
        config.validate()?;
        let limiter = Limiter::new(config.concurrency)?;

        Ok(Dispatcher {
            config: Arc::new(config),
            client,
            diagnostics,
            limiter,
        })
    }

    pub fn limiter(&self) -> &Limiter {
        &self.limiter
    }

    /// Spawns one task per configured request and returns the stream their
    /// outcomes arrive on. Must be called from within a tokio runtime.
    ///
    /// A watcher task owns the original sender and drops it only after every
    /// request task has been joined, so the stream ends exactly once all
    /// outcomes are in. A task that dies without emitting is accounted for by
    /// the watcher with a failed outcome.
    pub fn dispatch(&self) -> Collector {
        let (tx, collector) = collector::channel();
        let mut tasks = JoinSet::new();

        for _ in 0..self.config.requests {
            let config = Arc::clone(&self.config);
            let client = Arc::clone(&self.client);
            let diagnostics = Arc::clone(&self.diagnostics);
            let limiter = self.limiter.clone();
            let tx = tx.clone();

            tasks.spawn(async move {
                let outcome =
                    run_request(&config, client.as_ref(), &limiter, diagnostics.as_ref()).await;
                // Only fails if the consumer went away.
                let _ = tx.send(outcome);
            });
        }

        let diagnostics = Arc::clone(&self.diagnostics);
        tokio::spawn(async move {
            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    diagnostics.report(Diagnostic::Aborted(e.to_string()));
                    let _ = tx.send(Outcome::failed(Duration::ZERO));
                }
            }
            tracing::debug!("all request tasks finished, closing outcome stream");
            drop(tx);
        });

        collector
    }

    pub async fn run(&self) -> Result<Summary> {
        tracing::info!(
            url = %self.config.url,
            method = %self.config.method,
            requests = self.config.requests,
            concurrency = self.limiter.capacity(),
            "dispatching requests"
        );
        let started = Instant::now();
        let collector = self.dispatch();
        let summary = Summary::collect(collector, started).await?;
        tracing::info!(
            total = summary.total,
            success = summary.success,
            elapsed = ?summary.elapsed,
            "run complete"
        );
        Ok(summary)
    }
}
