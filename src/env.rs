//! Explicit environment snapshot handed to toolchain processes.
//!
//! Child processes never inherit the parent's environment implicitly. The
//! runner captures an [`Environment`] once and every spawn receives exactly
//! that set of variables.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};

/// Ordered map of environment variables passed to child processes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<OsString, OsString>,
}

impl Environment {
    /// Snapshot the environment of the current process.
    #[must_use]
    pub fn capture() -> Self {
        Self::from_pairs(std::env::vars_os())
    }

    /// Build an environment from key/value pairs. Later duplicates win.
    ///
    /// # Examples
    /// ```
    /// use relbin::Environment;
    /// let env = Environment::from_pairs([("PATH", "/usr/bin")]);
    /// assert_eq!(env.get("PATH").and_then(|v| v.to_str()), Some("/usr/bin"));
    /// ```
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Look up a variable.
    pub fn get(&self, key: impl AsRef<OsStr>) -> Option<&OsStr> {
        self.vars.get(key.as_ref()).map(OsString::as_os_str)
    }

    /// Insert or replace a variable.
    pub fn set(&mut self, key: impl Into<OsString>, value: impl Into<OsString>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Return a copy with `flag` appended to the space separated list held in
    /// `key`. The variable is created when absent.
    #[must_use]
    pub fn with_appended_flag(&self, key: &str, flag: &str) -> Self {
        let mut value = self.get(key).map(OsStr::to_os_string).unwrap_or_default();
        if !value.is_empty() {
            value.push(" ");
        }
        value.push(flag);

        let mut env = self.clone();
        env.set(key, value);
        env
    }

    /// Iterate over the variables in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars
            .iter()
            .map(|(key, value)| (key.as_os_str(), value.as_os_str()))
    }

    /// Number of variables in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the snapshot holds no variables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
