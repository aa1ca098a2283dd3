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

//! JSON serialization backed by `serde_json`.

use super::{Serialization, SerializationError};
use serde_json::Value;

/// JSON serializer, the crate default.
///
/// Human-readable and interoperable with any motan peer configured for
/// JSON payloads.
///
/// # Example
///
/// ```rust
/// use motan_endpoint::serialization::{JsonSerialization, Serialization};
///
/// let json = JsonSerialization;
/// let bytes = json.serialize(&serde_json::json!({"a": 1})).unwrap();
/// let value = json.deserialize(&bytes).unwrap();
/// assert_eq!(value["a"], 1);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerialization;

impl JsonSerialization {
    /// Wire number for JSON payloads.
    pub const NUMBER: u8 = 5;
}

impl Serialization for JsonSerialization {
    fn number(&self) -> u8 {
        Self::NUMBER
    }

    fn name(&self) -> &'static str {
        "json"
    }

    fn serialize(&self, value: &Value) -> Result<Vec<u8>, SerializationError> {
        serde_json::to_vec(value).map_err(|e| SerializationError::Serialize {
            reason: e.to_string(),
        })
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Value, SerializationError> {
        serde_json::from_slice(bytes).map_err(|e| SerializationError::Deserialize {
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let json = JsonSerialization;
        let value = serde_json::json!(["hello", 42, {"nested": true}]);
        let bytes = json.serialize(&value).unwrap();
        assert_eq!(json.deserialize(&bytes).unwrap(), value);
    }

    #[test]
    fn test_deserialize_garbage() {
        let json = JsonSerialization;
        assert!(json.deserialize(b"not json at all {{").is_err());
    }
}
