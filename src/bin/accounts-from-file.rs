use clap::Parser;
use twaccounts::{
    config::Credentials,
    consumer::Outcome,
    fetcher::Fetcher,
    input,
    lookup::TwitterLookup,
    output::Sink,
    pipeline,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let opts: Opts = Opts::parse();
    twaccounts::cli::init_logging(opts.verbose)?;

    let credentials = Credentials::from_env()?;
    let account_ids = input::read_account_ids(&opts.input)?;
    log::info!("Read {} account IDs from {}", account_ids.len(), opts.input);

    let lookup = TwitterLookup::new(&credentials).wait_on_rate_limit(!opts.no_rate_limit_wait);
    let fetcher = Fetcher::new(lookup);
    let mut sink = match &opts.output {
        Some(path) => Sink::gzip(path)?,
        None => Sink::stdout(),
    };

    let shutdown = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            log::error!("Unable to listen for Ctrl+C: {}", error);
            futures::future::pending::<()>().await;
        }
    };

    let report = pipeline::run(fetcher, account_ids, &mut sink, shutdown).await?;
    sink.finish()?;

    if report.consumer.outcome == Outcome::Interrupted {
        eprintln!("\nCtrl+C detected. Shutting down...");
    }

    log::info!(
        "Wrote {} accounts ({} write errors)",
        report.consumer.record_count,
        report.consumer.write_error_count
    );

    if let Some(summary) = report.fetcher {
        log::info!(
            "Looked up {} batches ({} failed)",
            summary.batch_count,
            summary.failed_batch_count
        );
    }

    Ok(())
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Configuration error")]
    Config(#[from] twaccounts::config::Error),
    #[error("Input error")]
    Input(#[from] twaccounts::input::Error),
    #[error("Pipeline error")]
    Pipeline(#[from] twaccounts::pipeline::Error),
    #[error("I/O error")]
    Io(#[from] std::io::Error),
    #[error("Log initialization error")]
    LogInitialization(#[from] log::SetLoggerError),
}

#[derive(Debug, Parser)]
#[clap(name = "accounts-from-file", version, author)]
struct Opts {
    /// Level of verbosity
    #[clap(short, long, parse(from_occurrences))]
    verbose: i32,
    /// Write gzipped NDJSON to this path instead of stdout
    #[clap(short, long)]
    output: Option<String>,
    /// Fail the batch instead of sleeping when the rate limit is reached
    #[clap(long)]
    no_rate_limit_wait: bool,
    /// JSON file with an `account_ids` list
    input: String,
}
