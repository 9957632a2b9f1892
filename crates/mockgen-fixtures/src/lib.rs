//! Trait contracts with generated mocks, and the tests that drive them.
//!
//! `build.rs` runs the generator over this file; the output is included as
//! [`mocks`].

use std::collections::BTreeMap;

pub trait Named {
    fn name(&self) -> String;
}

/// A byte store keyed by strings.
pub trait Store: Named + Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn put(&mut self, key: String, value: Vec<u8>) -> Result<(), String>;

    /// Counts keys under `prefix`; the flag is set when any key carries one
    /// of `tags` as a suffix.
    fn scan(&self, prefix: &str, tags: &[&str]) -> (usize, bool);
}

pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

pub trait Notifier: Send + Sync {
    fn notify(&self, topic: &str, payload: &[u8]);
}

/// An in-memory [`Store`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Vec<u8>>,
}

impl Named for MemoryStore {
    fn name(&self) -> String {
        "memory".to_string()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let value = self.entries.get(key)?;
        String::from_utf8(value.clone()).ok()
    }

    fn put(&mut self, key: String, value: Vec<u8>) -> Result<(), String> {
        if key.is_empty() {
            return Err("empty key".to_string());
        }
        self.entries.insert(key, value);
        Ok(())
    }

    fn scan(&self, prefix: &str, tags: &[&str]) -> (usize, bool) {
        let keys: Vec<&String> = self.entries.keys().filter(|k| k.starts_with(prefix)).collect();
        let tagged = keys.iter().any(|k| tags.iter().any(|t| k.ends_with(t)));
        (keys.len(), tagged)
    }
}

pub mod mocks {
    include!(concat!(env!("OUT_DIR"), "/mocks.rs"));
}
