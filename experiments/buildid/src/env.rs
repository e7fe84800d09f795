use std::collections::BTreeMap;

use crate::placeholder;

/// Read-only view of the environment, captured once at the call boundary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment.
    /// Variables whose name or value is not valid UTF-8 are skipped.
    #[must_use]
    pub fn capture() -> Self {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// The trimmed value of `key` if it is set, non-blank and not a placeholder
    #[must_use]
    pub fn usable(&self, key: &str) -> Option<&str> {
        let value = self.get(key)?.trim();
        if value.is_empty() || placeholder::is_placeholder(value) {
            None
        } else {
            Some(value)
        }
    }

    /// First usable variable among `keys`, returned as `(name, value)`
    #[must_use]
    pub fn first_usable<'a, 'k>(&'a self, keys: &'k [String]) -> Option<(&'k str, &'a str)> {
        keys.iter()
            .find_map(|key| self.usable(key).map(|value| (key.as_str(), value)))
    }
}

impl<K, V> FromIterator<(K, V)> for EnvSnapshot
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
