use egg_mode::{KeyPair, Token};
use std::fmt;

/// Maximum number of IDs accepted by a single `users/lookup` call.
pub const BATCH_SIZE: usize = 100;
/// Capacity of the queue between the fetcher and the consumer.
pub const QUEUE_CAPACITY: usize = 1024;
/// Number of written accounts between progress log lines.
pub const CHECKIN_THRESHOLD: u64 = 1000;

/// Field added to every account object to record how it was found.
pub const PROVENANCE_KEY: &str = "_tbsource";
/// Provenance value for accounts enumerated from an input file.
pub const PROVENANCE_FROM_FILE: &str = "enum";

pub const CONSUMER_KEY_VAR: &str = "TWITTER_CONSUMER_KEY";
pub const CONSUMER_SECRET_VAR: &str = "TWITTER_CONSUMER_SECRET";
pub const ACCESS_TOKEN_VAR: &str = "TWITTER_ACCESS_TOKEN";
pub const ACCESS_TOKEN_SECRET_VAR: &str = "TWITTER_ACCESS_TOKEN_SECRET";

#[derive(thiserror::Error, Debug, Eq, PartialEq)]
pub enum Error {
    #[error("Missing OAuth configuration: {0} is not set")]
    MissingVar(&'static str),
}

/// OAuth 1.0a user credentials.
#[derive(Clone, Eq, PartialEq)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl Credentials {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build credentials from an arbitrary variable source (empty values count as missing).
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, Error> {
        let get = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or(Error::MissingVar(name))
        };

        Ok(Self {
            consumer_key: get(CONSUMER_KEY_VAR)?,
            consumer_secret: get(CONSUMER_SECRET_VAR)?,
            access_token: get(ACCESS_TOKEN_VAR)?,
            access_token_secret: get(ACCESS_TOKEN_SECRET_VAR)?,
        })
    }

    pub fn token(&self) -> Token {
        Token::Access {
            consumer: KeyPair::new(self.consumer_key.clone(), self.consumer_secret.clone()),
            access: KeyPair::new(self.access_token.clone(), self.access_token_secret.clone()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}
