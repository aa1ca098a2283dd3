//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Pluggable serialization for request arguments and reply values.
//!
//! Motan peers agree on a serialization format per message: each wire header
//! carries a one-byte serialization number, and both sides look the number
//! up in a registry of named serializers. This module defines the
//! [`Serialization`] trait, the [`SerializationRegistry`] used by the async
//! reply path as its extension factory, and the [`JsonSerialization`]
//! default.
//!
//! The trait is object-safe on purpose: the reader task dispatches on a wire
//! byte at runtime, so serializers are handled as `Arc<dyn Serialization>`
//! and values cross the boundary as [`serde_json::Value`].

mod json;

pub use json::JsonSerialization;

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors produced while serializing or deserializing values.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// A value could not be serialized to bytes.
    #[error("serialize failed: {reason}")]
    Serialize {
        /// Description of the failure.
        reason: String,
    },

    /// Bytes could not be deserialized back into a value.
    #[error("deserialize failed: {reason}")]
    Deserialize {
        /// Description of the failure.
        reason: String,
    },
}

/// A named serializer identified by a one-byte wire number.
///
/// Implementations must be thread-safe: the same serializer instance is
/// shared between callers and the per-channel reader tasks.
pub trait Serialization: Send + Sync {
    /// The serializer's wire number, written into every outbound header.
    fn number(&self) -> u8;

    /// The serializer's stable name, used for registration and logging.
    fn name(&self) -> &'static str;

    /// Serializes a value to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SerializationError::Serialize`] if the value cannot be
    /// encoded.
    fn serialize(&self, value: &Value) -> Result<Vec<u8>, SerializationError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    ///
    /// Returns [`SerializationError::Deserialize`] if the bytes are not a
    /// valid encoding.
    fn deserialize(&self, bytes: &[u8]) -> Result<Value, SerializationError>;
}

/// Registry of serializers keyed by wire number.
///
/// This is the "extension factory" the reader task consults when completing
/// an asynchronous call: the reply header names the serialization byte and
/// the registry resolves it to a serializer.
///
/// # Example
///
/// ```rust
/// use motan_endpoint::serialization::{JsonSerialization, SerializationRegistry};
///
/// let registry = SerializationRegistry::default();
/// let json = registry.get(JsonSerialization::NUMBER).unwrap();
/// assert_eq!(json.name(), "json");
/// ```
pub struct SerializationRegistry {
    serializers: RwLock<HashMap<u8, Arc<dyn Serialization>>>,
}

impl SerializationRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            serializers: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a serializer under its wire number, replacing any previous
    /// registration for that number.
    pub fn register(&self, serialization: Arc<dyn Serialization>) {
        self.serializers
            .write()
            .insert(serialization.number(), serialization);
    }

    /// Resolves a serializer by wire number.
    #[must_use]
    pub fn get(&self, number: u8) -> Option<Arc<dyn Serialization>> {
        self.serializers.read().get(&number).cloned()
    }
}

impl Default for SerializationRegistry {
    /// A registry with the JSON serializer pre-registered.
    fn default() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(JsonSerialization));
        registry
    }
}

impl std::fmt::Debug for SerializationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let numbers: Vec<u8> = self.serializers.read().keys().copied().collect();
        f.debug_struct("SerializationRegistry")
            .field("numbers", &numbers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_has_json() {
        let registry = SerializationRegistry::default();
        assert!(registry.get(JsonSerialization::NUMBER).is_some());
        assert!(registry.get(0xFF).is_none());
    }

    #[test]
    fn test_register_replaces() {
        let registry = SerializationRegistry::new();
        registry.register(Arc::new(JsonSerialization));
        registry.register(Arc::new(JsonSerialization));
        assert_eq!(
            registry.get(JsonSerialization::NUMBER).unwrap().name(),
            "json"
        );
    }
}

// Made with Bob
