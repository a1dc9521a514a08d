// SPDX-License-Identifier: Apache-2.0

use std::collections::{vec_deque, VecDeque};
use crate::pool::Pool;
use crate::segment::Segment;

/// The segments holding a buffer's content, read from the front and written at
/// the back. Every segment in the queue has at least one readable byte.
///
/// The byte count is kept in step with every change rather than recomputed, and
/// a running total of bytes consumed from the front identifies the head position
/// for peek cursors.
#[derive(Debug, Default)]
pub(crate) struct SegmentQueue {
	segments: VecDeque<Segment>,
	size: usize,
	consumed: u64,
}

impl SegmentQueue {
	/// Returns the number of readable bytes.
	#[inline]
	pub fn size(&self) -> usize { self.size }

	/// Returns the total number of bytes ever consumed from the front.
	#[inline]
	pub fn consumed(&self) -> u64 { self.consumed }

	#[inline]
	pub fn is_empty(&self) -> bool { self.segments.is_empty() }

	/// Returns the number of segments.
	#[inline]
	pub fn len(&self) -> usize { self.segments.len() }

	pub fn head(&self) -> Option<&Segment> { self.segments.front() }

	pub fn head_mut(&mut self) -> Option<&mut Segment> { self.segments.front_mut() }

	pub fn tail_mut(&mut self) -> Option<&mut Segment> { self.segments.back_mut() }

	pub fn iter(&self) -> vec_deque::Iter<'_, Segment> { self.segments.iter() }

	/// Links a non-empty segment at the back.
	pub fn push(&mut self, segment: Segment) {
		assert!(!segment.is_empty(), "empty segments can't be queued");
		self.size += segment.len();
		self.segments.push_back(segment);
	}

	/// Unlinks the head segment.
	pub fn pop(&mut self) -> Option<Segment> {
		let segment = self.segments.pop_front()?;
		self.shrink(segment.len());
		Some(segment)
	}

	/// Splits `count` bytes from the head into a new segment. See
	/// [`Segment::split_head`].
	pub fn split_head(&mut self, count: usize, share_threshold: usize, pool: &impl Pool) -> Option<Segment> {
		let prefix = self.head_mut()?.split_head(count, share_threshold, pool);
		self.shrink(count);
		Some(prefix)
	}

	/// Consumes `count` bytes from the head, returning the head if it was drained.
	///
	/// # Panics
	///
	/// Panics if the head has fewer than `count` bytes.
	pub fn consume(&mut self, count: usize) -> Option<Segment> {
		let head = self.segments.front_mut()?;
		head.consume(count);
		let drained = head.is_empty();
		self.shrink(count);
		if drained {
			self.segments.pop_front()
		} else {
			None
		}
	}

	/// Records `count` bytes appended to the tail in place.
	pub fn grow(&mut self, count: usize) {
		self.size += count;
	}

	/// Records `count` bytes removed from the head in place.
	pub fn shrink(&mut self, count: usize) {
		assert!(count <= self.size, "queue size underflow: {count} > {}", self.size);
		self.size -= count;
		self.consumed += count as u64;
	}

	/// Unlinks every segment.
	pub fn drain(&mut self) -> vec_deque::Drain<'_, Segment> {
		let size = self.size;
		self.shrink(size);
		self.segments.drain(..)
	}

	/// Checks the byte count against the segments, for debugging.
	pub fn check_size(&self) {
		debug_assert_eq!(
			self.size,
			self.segments.iter().map(Segment::len).sum::<usize>(),
			"queue size out of step with its segments"
		);
	}
}
