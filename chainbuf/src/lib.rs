// Copyright 2023 Strixpyrr
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! ## How it works
//!
//! Data is written to and read from reusable blocks of memory called *segments*.
//! When a segment is consumed, it's returned to a *pool*. To write data, segments
//! are taken from this pool, and allocated when the pool has none left. The pool
//! is shared between threads: it's split into shards claimed with atomic swaps
//! rather than locks, each thread mostly using its own. A small first tier of
//! shards serves the common case, and a larger second tier absorbs bursts. When
//! every cache is full, recycled segments are simply dropped, so pooled memory
//! stays bounded.
//!
//! ### Segments
//!
//! A segment is a window of readable bytes over a fixed-size block. Blocks are
//! either owned by one segment or shared between an owner and read-only copies,
//! avoiding expensive mem-copy operations as much as possible. Only the owner
//! appends to a block, and only past the bytes its copies can see. A count of
//! live copies decides when a block may return to the pool.
//!
//! ### Buffers
//!
//! A [`Buffer`] is a queue of segments, read from the front and written at the
//! back. Moving bytes between buffers relinks whole segments from one queue to
//! the other. Where a transfer ends mid-segment, the segment is split; splits
//! under a set threshold (1024B by default) are copied instead of shared, as a
//! tradeoff between memory use and speed. Segments small enough to fit in the
//! destination's tail are merged into it, so buffers don't accumulate near-empty
//! segments.
//!
//! Segment size and share threshold can be set per pool and per buffer, or for
//! the defaults through the `CHAINBUF_SEGMENT_SIZE`, `CHAINBUF_SHARE_THRESHOLD`
//! and `CHAINBUF_POOL_SHARDS` environment variables.

mod buffer;
mod error;
pub mod pool;
mod segment;
mod std_io;
pub mod streams;
mod util;

pub use buffer::*;
pub use error::*;
pub use segment::Segment;
pub use std_io::*;
pub use util::{POOL_SHARDS_VAR, SEGMENT_SIZE_VAR, SHARE_THRESHOLD_VAR};

/// The default segment size, in bytes.
pub const DEFAULT_SEGMENT_SIZE: usize = 16709;
/// The default minimum span shared rather than copied when splitting a segment.
pub const DEFAULT_SHARE_THRESHOLD: usize = 1024;
