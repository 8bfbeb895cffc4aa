use super::{
    config::{BATCH_SIZE, PROVENANCE_FROM_FILE, PROVENANCE_KEY},
    input::AccountId,
    lookup::AccountLookup,
};
use serde_json::Value;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Unexpected user JSON object")]
    UnexpectedUserJsonObject(Value),
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Summary {
    pub batch_count: usize,
    pub failed_batch_count: usize,
    pub record_count: usize,
}

pub struct Fetcher<L> {
    lookup: L,
    batch_size: usize,
}

impl<L: AccountLookup> Fetcher<L> {
    pub fn new(lookup: L) -> Self {
        Self::with_batch_size(lookup, BATCH_SIZE)
    }

    pub fn with_batch_size(lookup: L, batch_size: usize) -> Self {
        Self {
            lookup,
            batch_size: batch_size.max(1),
        }
    }

    /// Look up every batch of IDs in order and send the tagged results.
    ///
    /// A failed lookup skips its batch. Returns early if the receiver is closed.
    pub async fn run(&self, account_ids: &[AccountId], sender: &Sender<Value>) -> Summary {
        log::info!("Account fetching from file started");
        let mut summary = Summary::default();

        for batch in batches(account_ids, self.batch_size) {
            summary.batch_count += 1;

            let results = match self.lookup.lookup(batch).await {
                Ok(results) => results,
                Err(error) => {
                    summary.failed_batch_count += 1;
                    log::error!(
                        "Lookup failed for batch {} ({} IDs): {:?}",
                        summary.batch_count,
                        batch.len(),
                        error
                    );
                    continue;
                }
            };

            let result_count = results.len();

            for mut value in results {
                if let Err(error) = tag_provenance(&mut value) {
                    log::error!("Skipping lookup result: {:?}", error);
                    continue;
                }

                if sender.send(value).await.is_err() {
                    log::warn!("Account queue closed, stopping fetch");
                    return summary;
                }

                summary.record_count += 1;
            }

            if let Some(last) = batch.last() {
                log::debug!(
                    "{} results found. Last account requested: {}",
                    result_count,
                    last
                );
            }
        }

        log::info!(
            "Account fetching from file finished: {} accounts from {} batches ({} failed)",
            summary.record_count,
            summary.batch_count,
            summary.failed_batch_count
        );

        summary
    }
}

impl<L: AccountLookup + 'static> Fetcher<L> {
    pub fn spawn(self, account_ids: Vec<AccountId>, sender: Sender<Value>) -> JoinHandle<Summary> {
        tokio::spawn(async move { self.run(&account_ids, &sender).await })
    }
}

/// Sequential, non-overlapping windows of at most `size` IDs.
pub fn batches<T>(ids: &[T], size: usize) -> std::slice::Chunks<'_, T> {
    ids.chunks(size.max(1))
}

pub fn tag_provenance(value: &mut Value) -> Result<(), Error> {
    if let Some(fields) = value.as_object_mut() {
        fields.insert(
            PROVENANCE_KEY.to_string(),
            Value::String(PROVENANCE_FROM_FILE.to_string()),
        );
        Ok(())
    } else {
        Err(Error::UnexpectedUserJsonObject(value.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup;
    use futures::future::{BoxFuture, FutureExt};
    use proptest::prelude::*;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    #[derive(Clone, Default)]
    struct FakeLookup {
        calls: Arc<Mutex<Vec<Vec<AccountId>>>>,
        failing_calls: HashSet<usize>,
        missing: HashSet<AccountId>,
    }

    impl FakeLookup {
        fn calls(&self) -> Vec<Vec<AccountId>> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl AccountLookup for FakeLookup {
        fn lookup<'a>(
            &'a self,
            ids: &'a [AccountId],
        ) -> BoxFuture<'a, Result<Vec<Value>, lookup::Error>> {
            let call_index = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(ids.to_vec());
                calls.len() - 1
            };

            let result = if self.failing_calls.contains(&call_index) {
                Err(lookup::Error::EggMode(egg_mode::error::Error::RateLimit(0)))
            } else {
                Ok(ids
                    .iter()
                    .filter(|id| !self.missing.contains(*id))
                    .map(|id| json!({"id_str": id.to_string(), "screen_name": format!("user{}", id)}))
                    .collect::<Vec<_>>())
            };

            futures::future::ready(result).boxed()
        }
    }

    fn ids(count: u64) -> Vec<AccountId> {
        (0..count).map(AccountId::from).collect()
    }

    async fn run_collect(fetcher: &Fetcher<FakeLookup>, ids: &[AccountId]) -> (Summary, Vec<Value>) {
        let (sender, mut receiver) = mpsc::channel(ids.len().max(1));
        let summary = fetcher.run(ids, &sender).await;
        drop(sender);

        let mut values = vec![];
        while let Some(value) = receiver.recv().await {
            values.push(value);
        }

        (summary, values)
    }

    #[tokio::test]
    async fn one_hundred_fifty_ids_make_two_batches() {
        let lookup = FakeLookup::default();
        let fetcher = Fetcher::new(lookup.clone());
        let input = ids(150);

        let (summary, values) = run_collect(&fetcher, &input).await;
        let calls = lookup.calls();

        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], input[0..100].to_vec());
        assert_eq!(calls[1], input[100..150].to_vec());
        assert_eq!(summary.batch_count, 2);
        assert_eq!(summary.record_count, 150);
        assert_eq!(values.len(), 150);
    }

    #[tokio::test]
    async fn empty_input_makes_no_calls() {
        let lookup = FakeLookup::default();
        let fetcher = Fetcher::new(lookup.clone());

        let (summary, values) = run_collect(&fetcher, &[]).await;

        assert!(lookup.calls().is_empty());
        assert_eq!(summary, Summary::default());
        assert!(values.is_empty());
    }

    #[tokio::test]
    async fn records_carry_provenance() {
        let lookup = FakeLookup::default();
        let fetcher = Fetcher::new(lookup);

        let (_, values) = run_collect(&fetcher, &ids(5)).await;

        assert_eq!(values.len(), 5);
        for value in values {
            assert_eq!(value[PROVENANCE_KEY], json!(PROVENANCE_FROM_FILE));
        }
    }

    #[tokio::test]
    async fn failed_batch_is_skipped() {
        let lookup = FakeLookup {
            failing_calls: vec![1].into_iter().collect(),
            ..FakeLookup::default()
        };
        let fetcher = Fetcher::with_batch_size(lookup.clone(), 10);

        let (summary, values) = run_collect(&fetcher, &ids(30)).await;
        let seen = values
            .iter()
            .map(|value| value["id_str"].as_str().unwrap().parse::<u64>().unwrap())
            .collect::<Vec<_>>();

        assert_eq!(lookup.calls().len(), 3);
        assert_eq!(summary.failed_batch_count, 1);
        assert_eq!(summary.record_count, 20);
        assert_eq!(seen, (0..10).chain(20..30).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn missing_accounts_are_omitted() {
        let lookup = FakeLookup {
            missing: vec![AccountId::from(1), AccountId::from(3)]
                .into_iter()
                .collect(),
            ..FakeLookup::default()
        };
        let fetcher = Fetcher::new(lookup);

        let (summary, values) = run_collect(&fetcher, &ids(5)).await;

        assert_eq!(summary.record_count, 3);
        assert_eq!(values.len(), 3);
    }

    #[tokio::test]
    async fn closed_queue_stops_fetching() {
        let lookup = FakeLookup::default();
        let fetcher = Fetcher::with_batch_size(lookup.clone(), 10);
        let (sender, receiver) = mpsc::channel(1);
        drop(receiver);

        let summary = fetcher.run(&ids(50), &sender).await;

        assert_eq!(lookup.calls().len(), 1);
        assert_eq!(summary.record_count, 0);
    }

    #[test]
    fn tag_provenance_overwrites_existing_value() {
        let mut value = json!({"id": 1});
        value[PROVENANCE_KEY] = json!("stream");
        tag_provenance(&mut value).unwrap();

        assert_eq!(value[PROVENANCE_KEY], json!(PROVENANCE_FROM_FILE));
    }

    #[test]
    fn tag_provenance_rejects_non_objects() {
        assert!(tag_provenance(&mut json!([1, 2])).is_err());
    }

    proptest! {
        #[test]
        fn batches_partition_input(input in prop::collection::vec(any::<u64>(), 0..1000), size in 1usize..250) {
            let windows = batches(&input, size).collect::<Vec<_>>();

            prop_assert_eq!(windows.len(), (input.len() + size - 1) / size);
            prop_assert!(windows.iter().all(|window| !window.is_empty() && window.len() <= size));
            prop_assert_eq!(windows.concat(), input);
        }
    }
}
