use rusty_ulid::Ulid;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::str::FromStr;
use std::{fmt::Display, ops::Deref};

/// A run key: a ULID string by default, or whatever the caller chose.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct RunId(String);

impl Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RunId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(RunId(s.to_string()))
    }
}

impl Deref for RunId {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&str> for RunId {
    fn from(fr: &str) -> Self {
        RunId(fr.to_string())
    }
}

impl From<String> for RunId {
    fn from(fr: String) -> Self {
        RunId(fr)
    }
}

impl From<RunId> for String {
    fn from(fr: RunId) -> Self {
        fr.0
    }
}

impl RunId {
    #[inline]
    pub fn new() -> RunId {
        RunId(Ulid::generate().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}
