// SPDX-License-Identifier: Apache-2.0

use std::num::NonZeroUsize;
use std::thread;
use crate::DEFAULT_SEGMENT_SIZE;
use crate::util::{env_or, POOL_SHARDS_VAR, SEGMENT_SIZE_VAR};

/// Options for constructing a [`SegmentPool`](super::SegmentPool).
///
/// # Segment size
///
/// The capacity of every segment the pool hands out. Defaults to `16709B`. Larger
/// segments mean fewer segments per byte of content, at the cost of more memory
/// held by partially filled tails.
///
/// # Shard count
///
/// The number of first-tier shards, rounded up to a power of two. Defaults to the
/// available parallelism. Threads are spread across shards to reduce contention;
/// the second tier has half as many shards, at least one.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct PoolOptions {
	pub segment_size: usize,
	pub shard_count: usize,
}

impl Default for PoolOptions {
	fn default() -> Self { Self::new() }
}

impl PoolOptions {
	/// The most first-tier shards a pool is built with.
	pub const MAX_SHARD_COUNT: usize = 1 << 16;

	/// Creates a new set of pool options, sized to the host's parallelism.
	pub fn new() -> Self {
		let shard_count = thread::available_parallelism()
			.map_or(1, NonZeroUsize::get);
		Self {
			segment_size: DEFAULT_SEGMENT_SIZE,
			shard_count,
		}
	}

	/// Creates pool options from the `CHAINBUF_SEGMENT_SIZE` and
	/// `CHAINBUF_POOL_SHARDS` environment variables, falling back to defaults.
	pub fn from_env() -> Self {
		let Self { segment_size, shard_count } = Self::new();
		Self {
			segment_size: env_or(SEGMENT_SIZE_VAR, segment_size),
			shard_count: env_or(POOL_SHARDS_VAR, shard_count),
		}
	}

	/// Returns the segment size.
	#[inline]
	pub const fn segment_size(&self) -> usize { self.segment_size }

	/// Returns the first-tier shard count, rounded up to a power of two and
	/// capped at [`MAX_SHARD_COUNT`](Self::MAX_SHARD_COUNT).
	#[inline]
	pub fn shard_count(&self) -> usize {
		self.shard_count.clamp(1, Self::MAX_SHARD_COUNT).next_power_of_two()
	}

	/// Returns the second-tier shard count.
	#[inline]
	pub fn second_tier_shard_count(&self) -> usize {
		(self.shard_count() / 2).max(1)
	}

	/// Sets the segment size.
	#[inline]
	pub fn set_segment_size(&mut self, value: usize) {
		self.segment_size = value;
	}

	/// Sets the first-tier shard count.
	#[inline]
	pub fn set_shard_count(&mut self, value: usize) {
		self.shard_count = value;
	}

	/// Sets the segment size.
	///
	/// # Panics
	///
	/// Panics if `value` is zero.
	#[inline]
	pub const fn with_segment_size(mut self, value: usize) -> Self {
		assert!(value > 0, "segment size must be non-zero");
		self.segment_size = value;
		self
	}

	/// Sets the first-tier shard count.
	#[inline]
	pub const fn with_shard_count(mut self, value: usize) -> Self {
		self.shard_count = value;
		self
	}
}
