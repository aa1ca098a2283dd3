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

//! Process-wide request-id generation.
//!
//! Wire ids must be unique among all in-flight calls in this process, since
//! every channel correlates replies by id. Ids pack the current Unix time in
//! milliseconds with a 20-bit atomic counter, giving up to 2^20 distinct ids
//! per millisecond without locking. A caller that exceeds that rate within a
//! single millisecond can observe a wrap-around collision.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Bits reserved for the per-millisecond counter.
const OFFSET_BITS: u32 = 20;

/// Mask extracting the counter portion of an id.
const OFFSET_MASK: u64 = (1 << OFFSET_BITS) - 1;

/// Process-wide counter; wraps within the 20-bit window.
static NEXT_OFFSET: AtomicU64 = AtomicU64::new(0);

/// Generates a wire request id unique within this process.
///
/// The id is `(unix_millis << 20) | counter`, so ids from different
/// milliseconds can never collide and ids within one millisecond differ in
/// the counter bits.
///
/// # Example
///
/// ```rust
/// use motan_endpoint::channel::generate_request_id;
///
/// let a = generate_request_id();
/// let b = generate_request_id();
/// assert_ne!(a, b);
/// assert_ne!(a, 0);
/// ```
#[must_use]
pub fn generate_request_id() -> u64 {
    let ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    let offset = NEXT_OFFSET.fetch_add(1, Ordering::Relaxed) & OFFSET_MASK;
    (ms << OFFSET_BITS) | offset
}


// Made with Bob
