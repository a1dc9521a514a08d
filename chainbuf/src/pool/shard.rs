// SPDX-License-Identifier: Apache-2.0

use std::cell::UnsafeCell;
use std::hint::spin_loop;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicUsize};
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};
use arrayvec::ArrayVec;
use crate::segment::Block;

/// Segments cached per first-tier shard.
pub const FIRST_TIER_LEN: usize = 8;
/// Segments cached per second-tier shard.
pub const SECOND_TIER_LEN: usize = 256;

/// Attempts made to claim a contended shard before giving up on it.
const CLAIM_ATTEMPTS: usize = 32;

#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Slot {
	/// The cache holds no blocks.
	Empty = 0,
	/// The cache holds at least one block.
	Holding = 1,
	/// A thread has exclusive access to the cache.
	Claimed = 2,
}

impl Slot {
	const fn from_u8(value: u8) -> Self {
		match value {
			0 => Self::Empty,
			1 => Self::Holding,
			_ => Self::Claimed
		}
	}
}

/// A bounded cache of free blocks, guarded by an atomic slot state instead of a
/// lock. Threads claim the shard by swapping its state to `Claimed`, and release
/// it by publishing `Empty` or `Holding`.
pub(crate) struct Shard<const N: usize> {
	state: AtomicU8,
	cache: UnsafeCell<ArrayVec<Arc<Block>, N>>,
}

// SAFETY: the cache is only accessed through a Claim, of which at most one
// exists at a time per shard.
unsafe impl<const N: usize> Sync for Shard<N> { }

impl<const N: usize> Default for Shard<N> {
	fn default() -> Self {
		Self {
			state: AtomicU8::new(Slot::Empty as u8),
			cache: UnsafeCell::default(),
		}
	}
}

impl<const N: usize> Shard<N> {
	/// Claims exclusive access to the cache, retrying a bounded number of times
	/// while another thread holds it. Returns `None` on contention, or if the
	/// cache is empty and `skip_empty` is set.
	fn claim(&self, skip_empty: bool) -> Option<Claim<'_, N>> {
		for _ in 0..CLAIM_ATTEMPTS {
			let current = self.state.load(Acquire);
			match Slot::from_u8(current) {
				Slot::Empty if skip_empty => return None,
				Slot::Claimed => spin_loop(),
				_ => if self.state
					.compare_exchange_weak(current, Slot::Claimed as u8, Acquire, Relaxed)
					.is_ok() {
					return Some(Claim { shard: self })
				}
			}
		}
		None
	}

	/// Takes a block from the cache.
	pub fn pop(&self) -> Option<Arc<Block>> {
		self.claim(true)?.pop()
	}

	/// Offers a block to the cache, handing it back if the cache is full or
	/// contended.
	pub fn push(&self, block: Arc<Block>) -> Result<(), Arc<Block>> {
		let Some(mut cache) = self.claim(false) else {
			return Err(block)
		};
		cache.try_push(block).map_err(|err| err.element())
	}

	/// Drops every cached block, returning the count dropped.
	pub fn clear(&self) -> usize {
		let Some(mut cache) = self.claim(true) else { return 0 };
		let count = cache.len();
		cache.clear();
		count
	}
}

/// Exclusive access to a shard's cache, released on drop.
struct Claim<'a, const N: usize> {
	shard: &'a Shard<N>,
}

impl<const N: usize> Deref for Claim<'_, N> {
	type Target = ArrayVec<Arc<Block>, N>;

	fn deref(&self) -> &Self::Target {
		// SAFETY: the shard state is Claimed for the lifetime of this guard.
		unsafe { &*self.shard.cache.get() }
	}
}

impl<const N: usize> DerefMut for Claim<'_, N> {
	fn deref_mut(&mut self) -> &mut Self::Target {
		// SAFETY: the shard state is Claimed for the lifetime of this guard.
		unsafe { &mut *self.shard.cache.get() }
	}
}

impl<const N: usize> Drop for Claim<'_, N> {
	fn drop(&mut self) {
		let state = if self.is_empty() { Slot::Empty } else { Slot::Holding };
		self.shard.state.store(state as u8, Release);
	}
}

/// Returns a key for the current thread, used to spread threads across shards.
pub(crate) fn shard_key() -> usize {
	static NEXT_KEY: AtomicUsize = AtomicUsize::new(0);

	thread_local! {
		static KEY: usize = NEXT_KEY.fetch_add(1, Relaxed);
	}

	KEY.with(|key| *key)
}

#[cfg(test)]
mod test {
	use std::sync::Arc;
	use std::sync::atomic::Ordering::Acquire;
	use crate::segment::Block;
	use super::{Shard, Slot};

	#[test]
	fn push_until_full() {
		let shard = Shard::<2>::default();
		assert!(shard.pop().is_none());
		assert!(shard.push(Arc::new(Block::new(4))).is_ok());
		assert!(shard.push(Arc::new(Block::new(4))).is_ok());
		assert!(shard.push(Arc::new(Block::new(4))).is_err());
		assert!(shard.pop().is_some());
		assert!(shard.pop().is_some());
		assert!(shard.pop().is_none());
	}

	#[test]
	fn state_follows_contents() {
		let shard = Shard::<2>::default();
		assert!(shard.push(Arc::new(Block::new(4))).is_ok());
		assert_eq!(Slot::from_u8(shard.state.load(Acquire)), Slot::Holding);
		assert_eq!(shard.clear(), 1);
		assert_eq!(Slot::from_u8(shard.state.load(Acquire)), Slot::Empty);
	}

	#[test]
	fn claimed_shard_is_skipped() {
		let shard = Shard::<2>::default();
		let claim = shard.claim(false).expect("uncontended claim");
		assert!(shard.push(Arc::new(Block::new(4))).is_err());
		drop(claim);
		assert!(shard.push(Arc::new(Block::new(4))).is_ok());
	}
}
