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

mod memory;
mod tracker;

use std::fmt;
use std::mem::ManuallyDrop;
use std::ptr;
use std::sync::Arc;
use all_asserts::assert_le;
use crate::pool::Pool;
pub(crate) use memory::Block;
pub(crate) use tracker::CopyTracker;

/// A window of readable bytes `pos..limit` over a fixed-size block of memory.
///
/// Blocks are shared between one *owning* segment and any number of read-only
/// copies. The owner may append past its limit, and may move its bytes back to
/// the start of the block while no copies exist. Copies never write.
pub struct Segment {
	block: Arc<Block>,
	pos: usize,
	limit: usize,
	owner: bool,
}

impl Segment {
	/// Allocates a new, empty owning segment.
	pub fn new(capacity: usize) -> Self {
		Self::from_block(Arc::new(Block::new(capacity)))
	}

	/// Wraps a block with no live references as an empty owning segment.
	pub(crate) fn from_block(block: Arc<Block>) -> Self {
		block.tracker.reset();
		Self {
			block,
			pos: 0,
			limit: 0,
			owner: true,
		}
	}

	/// Returns the number of readable bytes.
	pub fn len(&self) -> usize { self.limit - self.pos }

	/// Returns `true` if the segment has no readable bytes.
	pub fn is_empty(&self) -> bool { self.pos == self.limit }

	/// Returns the index of the first readable byte.
	pub fn pos(&self) -> usize { self.pos }

	/// Returns the index past the last readable byte.
	pub fn limit(&self) -> usize { self.limit }

	/// Returns the size of the underlying block.
	pub fn capacity(&self) -> usize { self.block.capacity() }

	/// Returns `true` if this segment may write to its block.
	pub fn is_owner(&self) -> bool { self.owner }

	/// Returns `true` if any copies of the block are alive.
	pub fn is_shared(&self) -> bool { self.block.tracker.is_shared() }

	/// Returns an identifier for the underlying block, equal between a segment
	/// and its shared copies.
	pub fn storage_id(&self) -> usize { self.block.addr() }

	/// Returns the readable bytes.
	pub fn as_slice(&self) -> &[u8] {
		// SAFETY: bytes below the limit are only written by the owner through
		// compaction, which requires both &mut self and an unshared block.
		unsafe { self.block.slice(self.pos..self.limit) }
	}

	/// Returns the number of bytes that can be appended without moving data.
	pub(crate) fn writable(&self) -> usize {
		if self.owner {
			self.capacity() - self.limit
		} else {
			0
		}
	}

	/// Returns the number of bytes that can be appended, counting space before
	/// `pos` reclaimable by compacting an unshared block.
	pub(crate) fn appendable(&self) -> usize {
		if !self.owner {
			return 0
		}

		let reclaimable = if self.is_shared() { 0 } else { self.pos };
		self.writable() + reclaimable
	}

	/// Returns the writable space past the limit. Empty for copies.
	pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
		if !self.owner {
			return &mut []
		}

		let range = self.limit..self.capacity();
		// SAFETY: only the owner writes, through &mut self, and copies never read
		// past the limit they were created with.
		unsafe { self.block.slice_mut(range) }
	}

	/// Marks `count` bytes written into [`as_mut_slice`](Self::as_mut_slice)
	/// as readable.
	pub(crate) fn grow(&mut self, count: usize) {
		assert_le!(count, self.writable());
		self.limit += count;
	}

	/// Consumes `count` bytes from the front.
	pub(crate) fn consume(&mut self, count: usize) {
		assert_le!(count, self.len());
		self.pos += count;
	}

	/// Shortens a copy to `len` readable bytes.
	pub(crate) fn truncate(&mut self, len: usize) {
		debug_assert!(!self.owner, "truncating an owned segment discards data");
		assert_le!(len, self.len());
		self.limit = self.pos + len;
	}

	/// Creates a read-only copy sharing this segment's block and window.
	pub(crate) fn shared_copy(&self) -> Self {
		self.block.tracker.add_copy();
		Self {
			block: self.block.clone(),
			pos: self.pos,
			limit: self.limit,
			owner: false,
		}
	}

	/// Splits the first `count` bytes into a new segment, leaving the rest in
	/// this one. Prefixes of at least `share_threshold` bytes are shared copies;
	/// smaller prefixes are copied into a segment from `pool`.
	///
	/// # Panics
	///
	/// Panics if `count` is zero or greater than the length.
	pub(crate) fn split_head(&mut self, count: usize, share_threshold: usize, pool: &impl Pool) -> Self {
		assert!(count > 0 && count <= self.len(), "split count {count} outside 1..={}", self.len());

		let prefix = if count >= share_threshold || count > pool.segment_size() {
			let mut prefix = self.shared_copy();
			prefix.limit = prefix.pos + count;
			prefix
		} else {
			let mut prefix = pool.take();
			prefix.as_mut_slice()[..count].copy_from_slice(&self.as_slice()[..count]);
			prefix.grow(count);
			prefix
		};

		self.pos += count;
		prefix
	}

	/// Moves `count` bytes from the front of this segment to the end of `target`,
	/// compacting `target` first if its free space is split around its data.
	///
	/// # Panics
	///
	/// Panics if `target` is not an owner or cannot fit `count` more bytes.
	pub(crate) fn write_to(&mut self, target: &mut Segment, count: usize) {
		assert!(target.owner, "only owning segments may be written to");
		assert_le!(count, self.len());

		if count > target.writable() {
			assert!(!target.is_shared(), "cannot compact a shared segment");
			assert_le!(count, target.appendable());
			target.compact();
		}

		let src = self.as_slice()[..count].as_ptr();
		let dst = target.as_mut_slice()[..count].as_mut_ptr();
		// SAFETY: the destination lies past the target's limit, while the source
		// lies below this segment's limit. When both share a block, this segment
		// is a copy made when the owner's limit was no greater than it is now, so
		// the ranges never overlap.
		unsafe { ptr::copy_nonoverlapping(src, dst, count) }
		target.limit += count;
		self.pos += count;
	}

	/// Moves readable bytes to the start of an unshared block.
	fn compact(&mut self) {
		debug_assert!(self.owner && !self.is_shared());
		if self.pos == 0 {
			return
		}

		let len = self.len();
		// SAFETY: the block is unshared and borrowed mutably through self.
		let data = unsafe { self.block.slice_mut(0..self.limit) };
		data.copy_within(self.pos.., 0);
		self.pos = 0;
		self.limit = len;
	}

	/// Releases the segment's reference to its block, returning the block if
	/// this was the last one.
	pub(crate) fn release(self) -> Released {
		let this = ManuallyDrop::new(self);
		// SAFETY: the segment is never touched again, so its Drop can't run on
		// the moved-out block.
		let mut block = unsafe { ptr::read(&this.block) };

		if block.tracker.remove_copy() {
			return Released::Shared
		}

		// Another thread may have released its tracker reference but not yet
		// dropped its handle.
		if Arc::get_mut(&mut block).is_none() {
			return Released::Contended
		}

		Released::Last(block)
	}
}

/// The outcome of [`Segment::release`].
#[derive(Debug)]
pub(crate) enum Released {
	/// Other segments still reference the block.
	Shared,
	/// The block has no other references and may be reused.
	Last(Arc<Block>),
	/// The tracker was retired, but another handle to the block is still being
	/// dropped.
	Contended,
}

impl Drop for Segment {
	fn drop(&mut self) {
		self.block.tracker.remove_copy();
	}
}

impl fmt::Debug for Segment {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Segment")
			.field("pos", &self.pos)
			.field("limit", &self.limit)
			.field("capacity", &self.capacity())
			.field("owner", &self.owner)
			.field("copies", &self.block.tracker.copies())
			.finish()
	}
}
