//! Injected environment snapshot.
//!
//! The sandbox never reads `std::env` while running a test: the caller captures
//! the process environment once and hands the snapshot in, so tests can supply
//! a fabricated environment without touching real process state.

use std::collections::BTreeMap;

use super::env_keys;

/// Ordered, owned copy of a set of environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment. Non UTF-8 entries are converted lossily.
    pub fn capture() -> Self {
        let vars = std::env::vars_os()
            .map(|(k, v)| {
                (
                    k.to_string_lossy().to_string(),
                    v.to_string_lossy().to_string(),
                )
            })
            .collect();
        Self { vars }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Name under which the search path is stored.
    ///
    /// Windows environments are case-insensitive and commonly spell it `Path`;
    /// the existing spelling is reused so the variable is extended, never duplicated.
    pub fn path_key(&self) -> String {
        if cfg!(windows) {
            if let Some(key) = self
                .vars
                .keys()
                .find(|k| k.eq_ignore_ascii_case(env_keys::PATH))
            {
                return key.clone();
            }
        }
        env_keys::PATH.to_string()
    }

    pub fn path(&self) -> Option<&str> {
        self.get(&self.path_key())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
