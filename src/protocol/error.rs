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

//! Wire codec error types.

use crate::serialization::SerializationError;
use std::io;
use thiserror::Error;

/// Errors produced while encoding or decoding wire messages.
///
/// Decode errors observed by a channel's reader task are terminal for that
/// channel; encode errors surface to the caller as code-500 exception
/// responses without counting against the endpoint's error threshold.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The frame did not start with the motan2 magic bytes.
    ///
    /// The stream is out of sync or the peer is not speaking this protocol;
    /// there is no way to resynchronize, so the connection is torn down.
    #[error("bad magic: expected 0x{expected:04X}, found 0x{found:04X}")]
    BadMagic {
        /// The expected magic value.
        expected: u16,
        /// The value actually read.
        found: u16,
    },

    /// A declared section length exceeds the frame cap.
    #[error("frame section of {length} bytes exceeds maximum allowed size {limit}")]
    FrameTooLarge {
        /// The declared length.
        length: usize,
        /// The configured cap.
        limit: usize,
    },

    /// The frame structure was malformed (e.g. a dangling metadata key).
    #[error("corrupt frame: {reason}")]
    Corrupt {
        /// Description of the malformation.
        reason: String,
    },

    /// Payload serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// The underlying byte stream failed or reached end of file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
