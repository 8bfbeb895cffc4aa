use super::{config::Credentials, input::AccountId};
use chrono::{DateTime, Utc};
use egg_mode::{
    raw::{self, ParamList},
    Token,
};
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::time::Duration;

const USERS_LOOKUP_URL: &str = "https://api.twitter.com/1.1/users/lookup.json";

// Returned when none of the requested users exist (or all are suspended).
const NO_USER_MATCHES_CODE: i32 = 17;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("egg-mode error")]
    EggMode(#[from] egg_mode::error::Error),
}

/// Bulk account lookup: resolves a batch of IDs into user JSON objects.
///
/// Accounts that cannot be found are omitted from the result.
pub trait AccountLookup: Send + Sync {
    fn lookup<'a>(&'a self, ids: &'a [AccountId]) -> BoxFuture<'a, Result<Vec<Value>, Error>>;
}

pub struct TwitterLookup {
    token: Token,
    wait_on_rate_limit: bool,
}

impl TwitterLookup {
    pub fn new(credentials: &Credentials) -> Self {
        Self {
            token: credentials.token(),
            wait_on_rate_limit: true,
        }
    }

    pub fn wait_on_rate_limit(mut self, wait: bool) -> Self {
        self.wait_on_rate_limit = wait;
        self
    }

    async fn lookup_once(&self, ids: &[AccountId]) -> Result<Vec<Value>, egg_mode::error::Error> {
        let params = ParamList::new()
            .add_param("user_id", join_ids(ids))
            .add_param("include_entities", "true");

        let request = raw::request_post(USERS_LOOKUP_URL, &self.token, Some(&params));
        let response = raw::response_json::<Vec<Value>>(request).await?;

        Ok(response.response)
    }
}

impl AccountLookup for TwitterLookup {
    fn lookup<'a>(&'a self, ids: &'a [AccountId]) -> BoxFuture<'a, Result<Vec<Value>, Error>> {
        async move {
            loop {
                let result = self.lookup_once(ids).await;

                match next_step(result, self.wait_on_rate_limit, Utc::now()) {
                    Step::Retry(delay) => {
                        log::warn!("Rate limit reached, sleeping for {} seconds", delay.as_secs());
                        tokio::time::sleep(delay).await;
                    }
                    Step::Done(result) => {
                        return result;
                    }
                }
            }
        }
        .boxed()
    }
}

#[derive(Debug)]
enum Step {
    Retry(Duration),
    Done(Result<Vec<Value>, Error>),
}

/// Decide what to do with the outcome of a single lookup call.
fn next_step(
    result: Result<Vec<Value>, egg_mode::error::Error>,
    wait_on_rate_limit: bool,
    now: DateTime<Utc>,
) -> Step {
    match result {
        Err(egg_mode::error::Error::RateLimit(reset)) if wait_on_rate_limit => {
            Step::Retry(rate_limit_delay(reset, now))
        }
        Err(error) if is_no_matches(&error) => Step::Done(Ok(vec![])),
        result => Step::Done(result.map_err(Error::from)),
    }
}

fn join_ids(ids: &[AccountId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn is_no_matches(error: &egg_mode::error::Error) -> bool {
    match error {
        egg_mode::error::Error::TwitterError(.., errors) => errors
            .errors
            .iter()
            .any(|error| error.code == NO_USER_MATCHES_CODE),
        _ => false,
    }
}

/// Time to wait until the rate limit window resets (with one second of slack).
fn rate_limit_delay(reset: i32, now: DateTime<Utc>) -> Duration {
    let remaining = (i64::from(reset) - now.timestamp()).max(0) as u64;

    Duration::from_secs(remaining + 1)
}
