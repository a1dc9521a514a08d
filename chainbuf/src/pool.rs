// SPDX-License-Identifier: Apache-2.0

mod options;
mod shard;
mod stats;

use std::fmt;
use std::sync::Arc;
use once_cell::sync::Lazy;
use tracing::{debug, trace};
use crate::segment::{Released, Segment};
use shard::{shard_key, Shard, FIRST_TIER_LEN, SECOND_TIER_LEN};
use stats::PoolMetrics;
pub use options::PoolOptions;
pub use stats::PoolStats;

/// A source of empty segments, and a sink for drained ones.
pub trait Pool: Clone {
	/// Returns the capacity of segments taken from the pool.
	fn segment_size(&self) -> usize;

	/// Takes an empty, owning segment from the pool, allocating one if none are
	/// cached.
	fn take(&self) -> Segment;

	/// Returns a segment to the pool. Its block is only reused once every copy
	/// sharing it has been recycled.
	fn recycle(&self, segment: Segment);

	/// Returns many segments to the pool.
	fn recycle_all(&self, segments: impl IntoIterator<Item = Segment>) {
		for segment in segments {
			self.recycle(segment)
		}
	}
}

/// The global segment pool, configured from the environment on first use.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct DefaultPool;

static POOL: Lazy<SegmentPool> = Lazy::new(|| SegmentPool::new(PoolOptions::from_env()));

/// Returns the global segment pool.
#[inline]
pub fn pool() -> &'static SegmentPool { &POOL }

impl Pool for DefaultPool {
	#[inline]
	fn segment_size(&self) -> usize { pool().segment_size() }

	#[inline]
	fn take(&self) -> Segment { pool().take() }

	#[inline]
	fn recycle(&self, segment: Segment) { pool().recycle(segment) }
}

impl Pool for Arc<SegmentPool> {
	#[inline]
	fn segment_size(&self) -> usize { SegmentPool::segment_size(self) }

	#[inline]
	fn take(&self) -> Segment { SegmentPool::take(self) }

	#[inline]
	fn recycle(&self, segment: Segment) { SegmentPool::recycle(self, segment) }
}

/// A lock-free, two-tier segment pool.
///
/// The first tier has one small cache per shard, each thread using the shard its
/// key maps to. The second tier has fewer, larger caches, probed in turn when the
/// first tier misses or overflows. When every cache is full, recycled blocks are
/// dropped; when every cache is empty, blocks are allocated. Caches are claimed
/// with an atomic state swap, and a contended cache is skipped rather than waited
/// on.
pub struct SegmentPool {
	segment_size: usize,
	first: Box<[Shard<FIRST_TIER_LEN>]>,
	second: Box<[Shard<SECOND_TIER_LEN>]>,
	metrics: PoolMetrics,
}

impl Default for SegmentPool {
	fn default() -> Self { Self::new(PoolOptions::new()) }
}

impl SegmentPool {
	/// Creates a new pool.
	///
	/// # Panics
	///
	/// Panics if the segment size is zero.
	pub fn new(options: PoolOptions) -> Self {
		let segment_size = options.segment_size();
		assert!(segment_size > 0, "segment size must be non-zero");

		let first_shards = options.shard_count();
		let second_shards = options.second_tier_shard_count();
		debug!(segment_size, first_shards, second_shards, "creating segment pool");
		Self {
			segment_size,
			first: (0..first_shards).map(|_| Shard::default()).collect(),
			second: (0..second_shards).map(|_| Shard::default()).collect(),
			metrics: PoolMetrics::default(),
		}
	}

	/// Creates a new pool of `size`-byte segments with default sharding.
	pub fn with_segment_size(size: usize) -> Self {
		Self::new(PoolOptions::new().with_segment_size(size))
	}

	/// Returns the capacity of segments taken from the pool.
	#[inline]
	pub fn segment_size(&self) -> usize { self.segment_size }

	/// Returns the maximum number of blocks the pool caches across both tiers.
	pub fn bound(&self) -> usize {
		self.first.len() * FIRST_TIER_LEN + self.second.len() * SECOND_TIER_LEN
	}

	/// Returns a snapshot of the pool counters.
	pub fn stats(&self) -> PoolStats { self.metrics.snapshot() }

	/// Takes an empty, owning segment, reusing a cached block if one is found in
	/// the thread's first-tier shard or any second-tier shard.
	pub fn take(&self) -> Segment {
		let cached = self.first_shard()
			.pop()
			.or_else(|| self.second_tier().find_map(Shard::pop));

		if let Some(block) = cached {
			self.metrics.pooled.decrement();
			self.metrics.reused.increment();
			debug_assert_eq!(Arc::strong_count(&block), 1, "pooled block still referenced");
			return Segment::from_block(block)
		}

		self.metrics.allocated.increment();
		trace!(segment_size = self.segment_size, "segment pool miss, allocating");
		Segment::new(self.segment_size)
	}

	/// Recycles a segment. Blocks still shared with other segments are left to
	/// the last of them; blocks of a foreign size, or that don't fit in any
	/// cache, are dropped.
	pub fn recycle(&self, segment: Segment) {
		let block = match segment.release() {
			Released::Shared => return,
			Released::Contended => return self.discard("released concurrently"),
			Released::Last(block) => block
		};

		if block.capacity() != self.segment_size {
			return self.discard("foreign segment size")
		}

		self.metrics.pooled.increment();
		let Err(mut block) = self.first_shard().push(block) else {
			self.metrics.recycled.increment();
			return
		};

		for shard in self.second_tier() {
			match shard.push(block) {
				Ok(()) => {
					self.metrics.recycled.increment();
					return
				}
				Err(rejected) => block = rejected
			}
		}

		self.metrics.pooled.decrement();
		drop(block);
		self.discard("caches full")
	}

	/// Drops every cached block.
	pub fn shed(&self) {
		let count = self.first.iter().map(Shard::clear).sum::<usize>() +
					self.second.iter().map(Shard::clear).sum::<usize>();
		self.metrics.pooled.sub(count);
		self.metrics.discarded.add(count as u64);
		debug!(count, "shed pooled segments");
	}

	fn discard(&self, reason: &'static str) {
		self.metrics.discarded.increment();
		trace!(reason, "segment pool discarding block");
	}

	fn first_shard(&self) -> &Shard<FIRST_TIER_LEN> {
		&self.first[shard_key() & (self.first.len() - 1)]
	}

	/// Iterates over second-tier shards, starting from the thread's own.
	fn second_tier(&self) -> impl Iterator<Item = &Shard<SECOND_TIER_LEN>> {
		let start = shard_key() % self.second.len();
		let (before, after) = self.second.split_at(start);
		after.iter().chain(before)
	}
}

impl fmt::Debug for SegmentPool {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SegmentPool")
			.field("segment_size", &self.segment_size)
			.field("first_shards", &self.first.len())
			.field("second_shards", &self.second.len())
			.field("stats", &self.stats())
			.finish()
	}
}
