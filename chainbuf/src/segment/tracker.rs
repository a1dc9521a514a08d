// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::AtomicIsize;
use std::sync::atomic::Ordering::{AcqRel, Acquire, Release};

/// Retired: every instance sharing the block has been released.
const RETIRED: isize = -1;

/// Counts the shared copies of one block. Each [`add_copy`] is matched by one
/// [`remove_copy`]; the release after those, made by the last standing segment,
/// retires the tracker and frees the block for recycling.
///
/// [`add_copy`]: Self::add_copy
/// [`remove_copy`]: Self::remove_copy
#[derive(Debug, Default)]
pub(crate) struct CopyTracker {
	copies: AtomicIsize,
}

impl CopyTracker {
	/// Returns `true` while at least one copy is outstanding.
	pub fn is_shared(&self) -> bool {
		self.copies.load(Acquire) > 0
	}

	/// Returns the number of outstanding copies.
	pub fn copies(&self) -> usize {
		self.copies.load(Acquire).max(0) as usize
	}

	/// Records a new shared copy.
	///
	/// # Panics
	///
	/// Panics if the tracker was already retired.
	pub fn add_copy(&self) {
		let prev = self.copies.fetch_add(1, AcqRel);
		assert!(prev >= 0, "copy made of a segment whose block was already released");
	}

	/// Records the release of one instance sharing the block, returning `true`
	/// if other instances remain. A `false` return means the caller held the
	/// last reference and the tracker is now retired.
	///
	/// # Panics
	///
	/// Panics on a release past retirement; there were more releases than
	/// instances.
	pub fn remove_copy(&self) -> bool {
		let mut current = self.copies.load(Acquire);
		loop {
			assert!(
				current > RETIRED,
				"segment released more times than it was shared"
			);

			match self.copies.compare_exchange_weak(current, current - 1, AcqRel, Acquire) {
				Ok(_) => return current > 0,
				Err(actual) => current = actual
			}
		}
	}

	/// Returns a retired tracker to the unshared state for reuse.
	pub fn reset(&self) {
		self.copies.store(0, Release);
	}
}
