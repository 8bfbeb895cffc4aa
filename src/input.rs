use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("I/O error")]
    Io(#[from] std::io::Error),
    #[error("JSON error")]
    Json(#[from] serde_json::Error),
    #[error("Invalid account ID at index {index}: {value:?}")]
    InvalidAccountId { index: usize, value: String },
}

/// A Twitter account ID as given in the input file (either a JSON number or string).
#[derive(Clone, Debug, Eq, Hash, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AccountId {
    Numeric(u64),
    Text(String),
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(value) => write!(f, "{}", value),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl AccountId {
    /// Text IDs must be non-empty decimal digit strings.
    fn is_valid(&self) -> bool {
        match self {
            Self::Numeric(_) => true,
            Self::Text(value) => {
                !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit())
            }
        }
    }
}

impl From<u64> for AccountId {
    fn from(value: u64) -> Self {
        Self::Numeric(value)
    }
}

#[derive(Deserialize)]
struct AccountProvision {
    account_ids: Vec<AccountId>,
}

pub fn read_account_ids<P: AsRef<Path>>(path: P) -> Result<Vec<AccountId>, Error> {
    parse_account_ids(BufReader::new(File::open(path)?))
}

pub fn parse_account_ids<R: Read>(reader: R) -> Result<Vec<AccountId>, Error> {
    let provision: AccountProvision = serde_json::from_reader(reader)?;

    if let Some((index, id)) = provision
        .account_ids
        .iter()
        .enumerate()
        .find(|(_, id)| !id.is_valid())
    {
        return Err(Error::InvalidAccountId {
            index,
            value: id.to_string(),
        });
    }

    Ok(provision.account_ids)
}
