//! Named, string-encoded command parameters.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use crate::error::{AdminError, AdminResult};

/// Parameters passed to a command by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Parameters(BTreeMap<String, String>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn require(&self, name: &str) -> AdminResult<&str> {
        self.get(name)
            .ok_or_else(|| AdminError::invalid_parameter(name, "missing required parameter"))
    }

    /// Parse a required parameter.
    pub fn parse<T>(&self, name: &str) -> AdminResult<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.require(name)?;
        raw.trim()
            .parse()
            .map_err(|e: T::Err| AdminError::invalid_parameter(name, format!("{:?}: {}", raw, e)))
    }
}
