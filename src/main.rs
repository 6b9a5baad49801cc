use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use url::Url;

use rustload::client::HyperHttpClient;
use rustload::config::{parse_headers, RequestConfig};
use rustload::diagnostics::TracingDiagnostics;
use rustload::worker::Dispatcher;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Target URL
    #[arg(short = 'u', long)]
    url: String,

    /// Total number of requests
    #[arg(short = 'n', long, default_value_t = 100)]
    requests: usize,

    /// Maximum number of requests in flight
    #[arg(short = 'c', long, default_value_t = 10)]
    concurrency: usize,

    /// HTTP method
    #[arg(short = 'm', long, default_value = "GET")]
    method: String,

    /// Headers as 'Key:Value,Key:Value'
    #[arg(short = 'H', long, default_value = "")]
    headers: String,

    /// Request body, sent as-is
    #[arg(short = 'b', long, default_value = "")]
    body: String,

    /// Number of runtime worker threads
    #[arg(short = 't', long, default_value_t = num_cpus::get())]
    threads: usize,

    /// Per-request timeout in seconds
    #[arg(short = 'T', long)]
    timeout: Option<u64>,

    /// File that request errors are logged to
    #[arg(long, default_value = "client.log")]
    log_file: String,
}

impl Args {
    fn request_config(&self) -> RequestConfig {
        RequestConfig {
            url: self.url.clone(),
            method: self.method.clone(),
            headers: parse_headers(&self.headers),
            body: self.body.clone(),
            requests: self.requests,
            concurrency: self.concurrency,
        }
    }
}

fn init_logging(path: &str) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file '{}'", path))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = args.request_config();
    config.validate()?;

    init_logging(&args.log_file)?;
    if let Err(e) = Url::parse(&config.url) {
        tracing::warn!(url = %config.url, "target URL does not parse, requests will fail: {}", e);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(args.threads.max(1))
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    runtime.block_on(async move {
        println!(
            "Running {} requests @ {} ({} concurrent)",
            config.requests, config.url, config.concurrency
        );
        println!();

        let client = Arc::new(HyperHttpClient::new(args.timeout.map(Duration::from_secs)));
        let dispatcher = Dispatcher::new(config, client, Arc::new(TracingDiagnostics))?;
        let summary = dispatcher.run().await?;

        print!("{}", summary);
        Ok::<(), anyhow::Error>(())
    })
}
