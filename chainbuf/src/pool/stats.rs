// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicU64, AtomicUsize};
use std::sync::atomic::Ordering::Relaxed;

/// Monotonically increasing counter.
#[derive(Debug, Default)]
pub(crate) struct Counter(AtomicU64);

impl Counter {
	pub fn increment(&self) { self.add(1) }

	pub fn add(&self, value: u64) {
		self.0.fetch_add(value, Relaxed);
	}

	pub fn value(&self) -> u64 { self.0.load(Relaxed) }
}

/// Count that can increase or decrease.
#[derive(Debug, Default)]
pub(crate) struct Gauge(AtomicUsize);

impl Gauge {
	pub fn increment(&self) {
		self.0.fetch_add(1, Relaxed);
	}

	pub fn decrement(&self) {
		self.0.fetch_sub(1, Relaxed);
	}

	pub fn sub(&self, value: usize) {
		self.0.fetch_sub(value, Relaxed);
	}

	pub fn value(&self) -> usize { self.0.load(Relaxed) }
}

/// Live pool counters.
#[derive(Debug, Default)]
pub(crate) struct PoolMetrics {
	pub allocated: Counter,
	pub reused: Counter,
	pub recycled: Counter,
	pub discarded: Counter,
	pub pooled: Gauge,
}

impl PoolMetrics {
	pub fn snapshot(&self) -> PoolStats {
		PoolStats {
			allocated: self.allocated.value(),
			reused: self.reused.value(),
			recycled: self.recycled.value(),
			discarded: self.discarded.value(),
			pooled: self.pooled.value(),
		}
	}
}

/// A snapshot of segment pool activity. Counters are read independently, so a
/// snapshot taken while other threads use the pool may be slightly skewed.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct PoolStats {
	/// Blocks allocated because every cache searched was empty.
	pub allocated: u64,
	/// Segments handed out from a cache.
	pub reused: u64,
	/// Blocks returned into a cache.
	pub recycled: u64,
	/// Blocks dropped by the pool instead of cached.
	pub discarded: u64,
	/// Blocks currently cached.
	pub pooled: usize,
}

impl PoolStats {
	/// Returns the number of blocks allocated by the pool that are neither
	/// cached nor discarded, which are the blocks held by live segments.
	pub fn outstanding(&self) -> u64 {
		self.allocated
			.saturating_sub(self.pooled as u64)
			.saturating_sub(self.discarded)
	}
}
