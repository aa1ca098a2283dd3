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

//! Framed wire messages.
//!
//! Every motan2 frame is a fixed header followed by two length-prefixed
//! sections:
//!
//! ```text
//! +-------+---------+-------+--------+-----------+------------+
//! | magic | version | flags | status | serialize | request id |
//! | u16   | u8      | u8    | u8     | u8        | u64        |
//! +-------+---------+-------+--------+-----------+------------+
//! | metadata length (u32) | metadata (`key \n value \n` pairs) |
//! +-----------------------+-----------------------------------+
//! | body length (u32)     | body                              |
//! +-----------------------+-----------------------------------+
//! ```
//!
//! All integers are big-endian. Metadata keys and values must not contain
//! `\n`. The core reads only the heartbeat bit, the proxy bit, the
//! serialization byte, and the request id; everything else passes through.

use super::ProtocolError;
use std::collections::HashMap;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Magic bytes every frame starts with.
pub const MAGIC: u16 = 0xF1F1;

/// Current protocol version.
pub const VERSION: u8 = 1;

/// Fixed header size in bytes.
pub const HEADER_SIZE: usize = 14;

/// Maximum size of a metadata or body section (16 MB).
///
/// A peer declaring a larger section is corrupt or hostile; the connection
/// is torn down rather than buffering the section.
pub const MAX_SECTION_SIZE: usize = 16 * 1024 * 1024;

/// Flag bit: the message is a response (unset means request).
pub const FLAG_RESPONSE: u8 = 0x01;
/// Flag bit: the message travels through a proxy unmodified.
pub const FLAG_PROXY: u8 = 0x02;
/// Flag bit: the body is gzip-compressed.
pub const FLAG_GZIP: u8 = 0x04;
/// Flag bit: the message is a liveness heartbeat.
pub const FLAG_HEARTBEAT: u8 = 0x08;

/// Status byte: the call succeeded.
pub const STATUS_OK: u8 = 0;
/// Status byte: the body carries a serialized exception.
pub const STATUS_EXCEPTION: u8 = 1;

/// The fixed message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Protocol version.
    pub version: u8,
    /// Flag bits; see the `FLAG_*` constants.
    pub flags: u8,
    /// Status byte; see the `STATUS_*` constants.
    pub status: u8,
    /// Wire number of the serializer used for the body.
    pub serialization: u8,
    /// Request identifier correlating requests with replies.
    pub request_id: u64,
}

impl Header {
    /// Creates a request header with the given serialization number and id.
    #[must_use]
    pub fn request(serialization: u8, request_id: u64) -> Self {
        Self {
            version: VERSION,
            flags: 0,
            status: STATUS_OK,
            serialization,
            request_id,
        }
    }

    /// Whether the heartbeat bit is set.
    #[must_use]
    pub const fn is_heartbeat(&self) -> bool {
        self.flags & FLAG_HEARTBEAT != 0
    }

    /// Sets or clears the heartbeat bit.
    pub fn set_heartbeat(&mut self, heartbeat: bool) {
        if heartbeat {
            self.flags |= FLAG_HEARTBEAT;
        } else {
            self.flags &= !FLAG_HEARTBEAT;
        }
    }

    /// Whether the proxy bit is set.
    #[must_use]
    pub const fn is_proxy(&self) -> bool {
        self.flags & FLAG_PROXY != 0
    }

    /// Sets or clears the proxy bit.
    pub fn set_proxy(&mut self, proxy: bool) {
        if proxy {
            self.flags |= FLAG_PROXY;
        } else {
            self.flags &= !FLAG_PROXY;
        }
    }

    /// Whether the message is a response.
    #[must_use]
    pub const fn is_response(&self) -> bool {
        self.flags & FLAG_RESPONSE != 0
    }

    /// Sets or clears the response bit.
    pub fn set_response(&mut self, response: bool) {
        if response {
            self.flags |= FLAG_RESPONSE;
        } else {
            self.flags &= !FLAG_RESPONSE;
        }
    }
}

/// A complete wire message: header, metadata, and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The fixed header.
    pub header: Header,
    /// String metadata (attachments) carried alongside the body.
    pub metadata: HashMap<String, String>,
    /// The serialized payload.
    pub body: Vec<u8>,
}

impl Message {
    /// Creates a message with empty metadata and body.
    #[must_use]
    pub fn new(header: Header) -> Self {
        Self {
            header,
            metadata: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Encodes the message using the header's own request id.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        self.encode_with_request_id(self.header.request_id)
    }

    /// Encodes the message, writing `request_id` on the wire in place of the
    /// header's in-memory id.
    ///
    /// Streams use this to stamp the locally-assigned id without touching
    /// the header the caller still observes.
    #[must_use]
    pub fn encode_with_request_id(&self, request_id: u64) -> Vec<u8> {
        let meta = self.encode_metadata();
        let mut buf =
            Vec::with_capacity(HEADER_SIZE + 4 + meta.len() + 4 + self.body.len());
        buf.extend_from_slice(&MAGIC.to_be_bytes());
        buf.push(self.header.version);
        buf.push(self.header.flags);
        buf.push(self.header.status);
        buf.push(self.header.serialization);
        buf.extend_from_slice(&request_id.to_be_bytes());
        buf.extend_from_slice(&(meta.len() as u32).to_be_bytes());
        buf.extend_from_slice(&meta);
        buf.extend_from_slice(&(self.body.len() as u32).to_be_bytes());
        buf.extend_from_slice(&self.body);
        buf
    }

    fn encode_metadata(&self) -> Vec<u8> {
        let mut meta = Vec::new();
        for (key, value) in &self.metadata {
            meta.extend_from_slice(key.as_bytes());
            meta.push(b'\n');
            meta.extend_from_slice(value.as_bytes());
            meta.push(b'\n');
        }
        meta
    }

    /// Decodes one framed message from an async reader.
    ///
    /// Blocks until a full frame is available. A clean EOF between frames
    /// surfaces as [`ProtocolError::Io`] with `UnexpectedEof`, which the
    /// reader task treats like any other transport failure.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::BadMagic`] on a magic mismatch,
    /// [`ProtocolError::FrameTooLarge`] if a section length exceeds
    /// [`MAX_SECTION_SIZE`], [`ProtocolError::Corrupt`] on malformed
    /// metadata, and [`ProtocolError::Io`] on stream failure.
    pub async fn decode<R>(reader: &mut R) -> Result<Self, ProtocolError>
    where
        R: AsyncRead + Unpin,
    {
        let mut fixed = [0u8; HEADER_SIZE];
        reader.read_exact(&mut fixed).await?;

        let magic = u16::from_be_bytes([fixed[0], fixed[1]]);
        if magic != MAGIC {
            return Err(ProtocolError::BadMagic {
                expected: MAGIC,
                found: magic,
            });
        }
        let header = Header {
            version: fixed[2],
            flags: fixed[3],
            status: fixed[4],
            serialization: fixed[5],
            request_id: u64::from_be_bytes([
                fixed[6], fixed[7], fixed[8], fixed[9], fixed[10], fixed[11], fixed[12],
                fixed[13],
            ]),
        };

        let metadata = Self::decode_metadata(&read_section(reader).await?)?;
        let body = read_section(reader).await?;

        Ok(Self {
            header,
            metadata,
            body,
        })
    }

    fn decode_metadata(bytes: &[u8]) -> Result<HashMap<String, String>, ProtocolError> {
        let mut metadata = HashMap::new();
        if bytes.is_empty() {
            return Ok(metadata);
        }
        let text = std::str::from_utf8(bytes).map_err(|_| ProtocolError::Corrupt {
            reason: "metadata is not valid UTF-8".to_string(),
        })?;
        let mut tokens = text.split_terminator('\n');
        while let Some(key) = tokens.next() {
            let value = tokens.next().ok_or_else(|| ProtocolError::Corrupt {
                reason: format!("metadata key {key:?} has no value"),
            })?;
            metadata.insert(key.to_string(), value.to_string());
        }
        Ok(metadata)
    }
}

/// Reads one `u32`-length-prefixed section.
async fn read_section<R>(reader: &mut R) -> Result<Vec<u8>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes).await?;
    let len = u32::from_be_bytes(len_bytes) as usize;
    if len > MAX_SECTION_SIZE {
        return Err(ProtocolError::FrameTooLarge {
            length: len,
            limit: MAX_SECTION_SIZE,
        });
    }
    let mut section = vec![0u8; len];
    reader.read_exact(&mut section).await?;
    Ok(section)
}

/// Builds a heartbeat request message with the given request id.
///
/// Heartbeats carry no metadata or body; only the header matters.
#[must_use]
pub fn build_heartbeat(request_id: u64) -> Message {
    let mut header = Header::request(0, request_id);
    header.set_heartbeat(true);
    Message::new(header)
}


// Made with Bob
