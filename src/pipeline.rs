use super::{
    config::QUEUE_CAPACITY,
    consumer::{self, Outcome},
    fetcher::{self, Fetcher},
    input::AccountId,
    lookup::AccountLookup,
};
use std::future::Future;
use std::io::Write;
use tokio::sync::mpsc;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Fetcher task failed")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Report {
    pub consumer: consumer::Report,
    /// Absent when the fetcher was aborted before finishing.
    pub fetcher: Option<fetcher::Summary>,
}

/// Run the fetcher in its own task and write its accounts until it finishes or `shutdown` fires.
///
/// On shutdown the fetcher task is aborted and joined before returning.
pub async fn run<L, W, S>(
    fetcher: Fetcher<L>,
    account_ids: Vec<AccountId>,
    writer: &mut W,
    shutdown: S,
) -> Result<Report, Error>
where
    L: AccountLookup + 'static,
    W: Write,
    S: Future<Output = ()>,
{
    let (sender, mut receiver) = mpsc::channel(QUEUE_CAPACITY);
    let handle = fetcher.spawn(account_ids, sender);

    let consumer = consumer::consume(&mut receiver, writer, shutdown).await;

    let fetcher = match consumer.outcome {
        Outcome::Drained => Some(handle.await?),
        Outcome::Interrupted => {
            handle.abort();
            match handle.await {
                Ok(summary) => Some(summary),
                Err(error) if error.is_cancelled() => None,
                Err(error) => return Err(error.into()),
            }
        }
    };

    Ok(Report { consumer, fetcher })
}
