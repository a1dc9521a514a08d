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

use std::cell::UnsafeCell;
use std::fmt;
use std::ops::Range;
use std::slice;
use super::CopyTracker;

/// A fixed-size block of heap memory, shared between an owning segment and its
/// read-only copies.
///
/// The owning segment appends past its limit while copies read below it, so the
/// bytes sit in [`UnsafeCell`]s and slices are only ever created over disjoint
/// ranges.
pub(crate) struct Block {
	data: Box<[UnsafeCell<u8>]>,
	/// Counts the copies sharing this block.
	pub tracker: CopyTracker,
}

// SAFETY: mutable slices are only handed out to the owning segment, over bytes
// at or past its limit, or over the whole block while no copies exist. Copies
// only read bytes below the limit the owner had when they were made.
unsafe impl Sync for Block { }

impl Block {
	pub fn new(size: usize) -> Self {
		let data = vec![0u8; size].into_boxed_slice();
		// SAFETY: UnsafeCell<u8> is repr(transparent) over u8, so the slice has
		// the same layout and length.
		let data = unsafe {
			Box::from_raw(Box::into_raw(data) as *mut [UnsafeCell<u8>])
		};
		Self { data, tracker: CopyTracker::default() }
	}

	pub fn capacity(&self) -> usize { self.data.len() }

	/// Returns the address of the first byte, which identifies the block.
	pub fn addr(&self) -> usize { self.ptr() as usize }

	fn ptr(&self) -> *mut u8 {
		UnsafeCell::raw_get(self.data.as_ptr())
	}

	/// Borrows a range of bytes.
	///
	/// # Safety
	///
	/// No mutable slice may overlap `range` while the returned slice is alive.
	pub unsafe fn slice(&self, range: Range<usize>) -> &[u8] {
		debug_assert!(range.start <= range.end && range.end <= self.capacity());
		slice::from_raw_parts(self.ptr().add(range.start), range.len())
	}

	/// Mutably borrows a range of bytes.
	///
	/// # Safety
	///
	/// The caller must have exclusive access to `range` for the lifetime of the
	/// returned slice.
	#[allow(clippy::mut_from_ref)]
	pub unsafe fn slice_mut(&self, range: Range<usize>) -> &mut [u8] {
		debug_assert!(range.start <= range.end && range.end <= self.capacity());
		slice::from_raw_parts_mut(self.ptr().add(range.start), range.len())
	}
}

impl fmt::Debug for Block {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Block")
			.field("capacity", &self.capacity())
			.field("copies", &self.tracker.copies())
			.finish_non_exhaustive()
	}
}
