use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const MAX_LEN: usize = 128;

/// Name of a collection.
///
/// The id is used verbatim as a single directory name under the storage root,
/// so construction rejects anything that could escape it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionId(String);

impl CollectionId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::Validation("collection id is required".to_string()));
        }
        if id.chars().count() > MAX_LEN {
            return Err(Error::Validation(format!(
                "collection id must be at most {MAX_LEN} characters"
            )));
        }
        if id.starts_with('.') {
            return Err(Error::Validation(format!(
                "collection id '{id}' must not start with '.'"
            )));
        }
        if let Some(c) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(Error::Validation(format!(
                "collection id '{id}' contains invalid character '{c}'"
            )));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CollectionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CollectionId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CollectionId> for String {
    fn from(value: CollectionId) -> Self {
        value.0
    }
}
