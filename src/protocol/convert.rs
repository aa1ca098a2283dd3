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

//! Conversions between RPC data types and wire messages.

use super::message::{Header, Message, STATUS_EXCEPTION};
use super::{ProtocolError, METHOD_KEY, PATH_KEY};
use crate::rpc::{Exception, Request, Response};
use crate::serialization::Serialization;
use serde_json::Value;

/// Encodes a request into an outbound wire message.
///
/// The request's attachments become frame metadata, joined by the service
/// path and method under their reserved keys; the arguments are serialized
/// as a single array value.
///
/// # Errors
///
/// Returns [`ProtocolError::Serialization`] if the arguments cannot be
/// serialized.
pub fn message_from_request(
    request: &Request,
    serialization: &dyn Serialization,
) -> Result<Message, ProtocolError> {
    let mut message = Message::new(Header::request(
        serialization.number(),
        request.request_id,
    ));
    message.metadata.extend(
        request
            .attachments
            .iter()
            .map(|(k, v)| (k.clone(), v.clone())),
    );
    message
        .metadata
        .insert(PATH_KEY.to_string(), request.service.clone());
    message
        .metadata
        .insert(METHOD_KEY.to_string(), request.method.clone());
    if !request.arguments.is_empty() {
        message.body = serialization.serialize(&Value::Array(request.arguments.clone()))?;
    }
    Ok(message)
}

/// Decodes an inbound wire message into a response.
///
/// Exception frames (status byte `STATUS_EXCEPTION`) carry a JSON-encoded
/// [`Exception`] body regardless of the negotiated body serializer, so a
/// failure report never depends on the serializer that may itself be the
/// problem. Successful frames have their body decoded with `serialization`.
///
/// # Errors
///
/// Returns [`ProtocolError::Corrupt`] if an exception body is malformed and
/// [`ProtocolError::Serialization`] if a reply body cannot be decoded.
pub fn response_from_message(
    message: Message,
    serialization: &dyn Serialization,
) -> Result<Response, ProtocolError> {
    let mut response = Response::new(message.header.request_id);
    response.attachments = message.metadata;

    if message.header.status == STATUS_EXCEPTION {
        let exception: Exception =
            serde_json::from_slice(&message.body).map_err(|e| ProtocolError::Corrupt {
                reason: format!("exception body: {e}"),
            })?;
        response.exception = Some(exception);
    } else if !message.body.is_empty() {
        response.value = Some(serialization.deserialize(&message.body)?);
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::STATUS_OK;
    use crate::serialization::JsonSerialization;

    #[test]
    fn test_request_to_message() {
        let request = Request::new("com.example.Foo", "bar")
            .with_request_id(11)
            .with_argument(serde_json::json!("a"))
            .with_attachment("M_g", "g1");
        let message = message_from_request(&request, &JsonSerialization).unwrap();

        assert_eq!(message.header.request_id, 11);
        assert_eq!(message.header.serialization, JsonSerialization::NUMBER);
        assert_eq!(message.metadata.get(PATH_KEY).unwrap(), "com.example.Foo");
        assert_eq!(message.metadata.get(METHOD_KEY).unwrap(), "bar");
        assert_eq!(message.metadata.get("M_g").unwrap(), "g1");
        assert_eq!(message.body, br#"["a"]"#);
    }

    #[test]
    fn test_message_to_response_ok() {
        let mut message = Message::new(Header::request(JsonSerialization::NUMBER, 3));
        message.header.status = STATUS_OK;
        message.body = br#"{"x":1}"#.to_vec();
        let response = response_from_message(message, &JsonSerialization).unwrap();
        assert_eq!(response.request_id, 3);
        assert_eq!(response.value, Some(serde_json::json!({"x": 1})));
        assert!(response.exception.is_none());
    }

    #[test]
    fn test_message_to_response_exception() {
        let mut message = Message::new(Header::request(JsonSerialization::NUMBER, 4));
        message.header.status = STATUS_EXCEPTION;
        message.body = serde_json::to_vec(&Exception::service(503, "down")).unwrap();
        let response = response_from_message(message, &JsonSerialization).unwrap();
        let exception = response.exception.unwrap();
        assert_eq!(exception.code, 503);
        assert_eq!(exception.message, "down");
    }

    #[test]
    fn test_bad_reply_body() {
        let mut message = Message::new(Header::request(JsonSerialization::NUMBER, 5));
        message.body = b"not json".to_vec();
        assert!(matches!(
            response_from_message(message, &JsonSerialization),
            Err(ProtocolError::Serialization(_))
        ));
    }
}

// Made with Bob
