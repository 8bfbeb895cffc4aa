use super::config::CHECKIN_THRESHOLD;
use serde_json::Value;
use std::future::Future;
use std::io::Write;
use tokio::sync::mpsc::Receiver;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// The queue was closed and every queued account was handled.
    Drained,
    /// The shutdown signal fired first.
    Interrupted,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Report {
    pub outcome: Outcome,
    pub record_count: u64,
    pub write_error_count: u64,
}

/// Write accounts from the queue as JSON lines until it closes or `shutdown` completes.
///
/// Write failures are logged and the account is dropped.
pub async fn consume<W: Write, S: Future<Output = ()>>(
    receiver: &mut Receiver<Value>,
    writer: &mut W,
    shutdown: S,
) -> Report {
    tokio::pin!(shutdown);

    let mut record_count = 0;
    let mut write_error_count = 0;

    let outcome = loop {
        tokio::select! {
            _ = &mut shutdown => {
                break Outcome::Interrupted;
            }
            next = receiver.recv() => {
                match next {
                    Some(account) => match writeln!(writer, "{}", account) {
                        Ok(()) => {
                            record_count += 1;
                            if record_count % CHECKIN_THRESHOLD == 0 {
                                log::info!("Accounts discovered: {}", record_count);
                            }
                        }
                        Err(error) => {
                            write_error_count += 1;
                            log::error!("Error writing account: {}", error);
                        }
                    },
                    None => {
                        break Outcome::Drained;
                    }
                }
            }
        }
    };

    if let Err(error) = writer.flush() {
        log::error!("Error flushing output: {}", error);
    }

    Report {
        outcome,
        record_count,
        write_error_count,
    }
}
