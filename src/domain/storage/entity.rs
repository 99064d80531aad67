//! Key and entity traits for the key-value store

use std::fmt::Debug;

use serde::{de::DeserializeOwned, Serialize};

/// A key addressing one value in a key-value backend
pub trait StorageKey: Clone + Debug + Send + Sync + Eq + std::hash::Hash {
    /// The key rendered as the string the backend stores it under
    fn as_str(&self) -> &str;
}

/// A value that can be persisted as JSON under its own key
pub trait StorageEntity: Clone + Debug + Send + Sync + Serialize + DeserializeOwned {
    type Key: StorageKey;

    fn key(&self) -> &Self::Key;
}
