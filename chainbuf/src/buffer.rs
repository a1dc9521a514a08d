// SPDX-License-Identifier: Apache-2.0

mod options;
mod peek;
mod queue;
mod read;
mod splice;
mod write;

pub use options::*;
pub use peek::Peek;

use std::cmp::min;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::ops::Index;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering::Relaxed;
use itertools::Itertools;
use tracing::trace;
use crate::error::{BufferError, BufferOp, Result};
use crate::pool::{DefaultPool, Pool};
use crate::segment::Segment;
use queue::SegmentQueue;

/// The most bytes printed by [`Buffer`]'s `Debug` implementation.
const DEBUG_PREFIX_LEN: usize = 64;

/// A growable byte buffer holding its content in a queue of pooled segments.
///
/// Bytes are written at the back and read from the front. Moving bytes between
/// buffers relinks whole segments instead of copying where possible; see
/// [`write_from`](Self::write_from).
pub struct Buffer<P: Pool = DefaultPool> {
	queue: SegmentQueue,
	pool: P,
	share_threshold: usize,
	id: u64,
	closed: bool,
}

impl<P: Pool + Default> Default for Buffer<P> {
	fn default() -> Self { BufferOptions::default().into() }
}

impl<P: Pool + Default> From<BufferOptions> for Buffer<P> {
	fn from(options: BufferOptions) -> Self {
		Self::new(P::default(), options)
	}
}

impl Buffer {
	/// Creates a new "lean" buffer. See [`BufferOptions::lean`] for details.
	pub fn lean() -> Self { BufferOptions::lean().into() }

	/// Creates a new buffer holding a copy of `value`.
	pub fn from_slice(value: impl AsRef<[u8]>) -> Result<Self> {
		let mut buf = Self::default();
		buf.write_from_slice(value.as_ref())?;
		Ok(buf)
	}
}

impl<P: Pool> Buffer<P> {
	/// Creates a new buffer.
	pub fn new(
		pool: P,
		BufferOptions {
			share_threshold,
		}: BufferOptions
	) -> Self {
		static NEXT_ID: AtomicU64 = AtomicU64::new(0);

		Self {
			queue: SegmentQueue::default(),
			pool,
			share_threshold,
			id: NEXT_ID.fetch_add(1, Relaxed),
			closed: false,
		}
	}

	/// Creates a new buffer with default options, taking segments from `pool`.
	pub fn with_pool(pool: P) -> Self {
		Self::new(pool, BufferOptions::default())
	}

	/// Returns the options used to create the buffer.
	pub fn options(&self) -> BufferOptions {
		BufferOptions::new().with_share_threshold(self.share_threshold)
	}

	/// Returns the segment pool.
	pub fn pool(&self) -> &P { &self.pool }

	/// Returns the number of bytes in the buffer.
	#[inline]
	pub fn count(&self) -> usize { self.queue.size() }

	/// Returns `true` if the buffer is empty.
	#[inline]
	pub fn is_empty(&self) -> bool { self.queue.is_empty() }

	/// Returns the number of segments holding the buffer's content.
	#[inline]
	pub fn segment_count(&self) -> usize { self.queue.len() }

	/// Iterates over the segments holding the buffer's content, front to back.
	pub fn segments(&self) -> impl Iterator<Item = &Segment> + '_ {
		self.queue.iter()
	}

	/// Returns `true` if the buffer holds at least `count` bytes.
	#[inline]
	pub fn request(&self, count: usize) -> bool { self.count() >= count }

	/// Returns an "insufficient data" error if the buffer holds less than `count`
	/// bytes.
	pub fn require(&self, count: usize) -> Result {
		if self.request(count) {
			Ok(())
		} else {
			Err(BufferError::insufficient_data(BufferOp::Read, count, self.count()))
		}
	}

	/// Returns the byte at position `pos`, or `None` if `pos` is out of bounds.
	/// Scans segments from the front.
	pub fn get(&self, mut pos: usize) -> Option<u8> {
		if pos >= self.count() { return None }

		for seg in self.queue.iter() {
			if pos < seg.len() {
				return Some(seg.as_slice()[pos])
			}
			pos -= seg.len();
		}

		None
	}

	/// Returns the byte at position `pos`, or an "out of bounds" error.
	pub fn byte_at(&self, pos: usize) -> Result<u8> {
		self.get(pos).ok_or_else(||
			BufferError::out_of_bounds(BufferOp::Read, self.count(), pos, 1)
		)
	}

	/// Clears data from the buffer, returning its segments to the pool.
	pub fn clear(&mut self) {
		let Self { queue, pool, .. } = self;
		let count = queue.size();
		pool.recycle_all(queue.drain());
		if count > 0 {
			trace!(count, "cleared buffer");
		}
	}

	/// Clears and closes the buffer. Subsequent reads and writes fail. Closing is
	/// idempotent.
	pub fn close(&mut self) {
		self.clear();
		self.closed = true;
	}

	/// Returns `true` if the buffer is closed.
	#[inline]
	pub fn is_closed(&self) -> bool { self.closed }

	/// Skips `count` bytes, returning drained segments to the pool. Fails without
	/// skipping if fewer than `count` bytes are buffered.
	pub fn skip(&mut self, count: usize) -> Result {
		self.check_open(BufferOp::Skip)?;
		let available = self.count();
		if count > available {
			return Err(BufferError::insufficient_data(BufferOp::Skip, count, available))
		}

		self.skip_buffered(count);
		trace!(count, "skipped buffer bytes");
		Ok(())
	}

	/// Copies `count` bytes starting at `offset` into `sink` without consuming
	/// them. Segments are shared rather than copied, so no bytes move; the copies
	/// stay valid regardless of what happens to this buffer afterward.
	pub fn copy_to(&self, sink: &mut Buffer<impl Pool>, mut offset: usize, count: usize) -> Result {
		self.check_open(BufferOp::Copy)?;
		sink.check_open(BufferOp::Copy)?;
		let size = self.count();
		if offset > size || count > size - offset {
			return Err(BufferError::out_of_bounds(BufferOp::Copy, size, offset, count))
		}

		let mut remaining = count;
		for seg in self.queue.iter() {
			if remaining == 0 { break }
			if offset >= seg.len() {
				offset -= seg.len();
				continue
			}

			let mut copy = seg.shared_copy();
			copy.consume(offset);
			offset = 0;
			let len = min(copy.len(), remaining);
			copy.truncate(len);
			sink.queue.push(copy);
			remaining -= len;
		}

		trace!(count, "copied buffer range");
		Ok(())
	}

	/// Copies every byte into `sink` without consuming them.
	#[inline]
	pub fn copy_all_to(&self, sink: &mut Buffer<impl Pool>) -> Result {
		self.copy_to(sink, 0, self.count())
	}

	/// Creates a cursor reading ahead from the current front of the buffer
	/// without consuming it. See [`Peek`].
	pub fn peek(&self) -> Peek {
		Peek::new(self.id, (!self.is_empty()).then(|| self.consumed()))
	}

	pub(crate) fn id(&self) -> u64 { self.id }

	pub(crate) fn consumed(&self) -> u64 { self.queue.consumed() }

	pub(crate) fn check_open(&self, op: BufferOp) -> Result {
		if self.closed {
			Err(BufferError::closed(op))
		} else {
			Ok(())
		}
	}

	/// Skips `count` buffered bytes.
	fn skip_buffered(&mut self, mut count: usize) {
		let Self { queue, pool, .. } = self;
		while count > 0 {
			let Some(head) = queue.head() else { break };
			let n = min(head.len(), count);
			if let Some(drained) = queue.consume(n) {
				pool.recycle(drained);
			}
			count -= n;
		}
		queue.check_size();
	}
}

impl<P: Pool> Drop for Buffer<P> {
	fn drop(&mut self) {
		self.close();
	}
}

impl<P: Pool> Debug for Buffer<P> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let prefix = self.queue
			.iter()
			.flat_map(|seg| seg.as_slice())
			.take(DEBUG_PREFIX_LEN)
			.copied()
			.collect_vec();
		let hex = base16ct::lower::encode_string(&prefix);
		let ellipsis = if self.count() > DEBUG_PREFIX_LEN { "..." } else { "" };

		f.debug_struct("Buffer")
			.field("count", &self.count())
			.field("segments", &self.segment_count())
			.field("data", &format_args!("{hex}{ellipsis}"))
			.field("closed", &self.closed)
			.finish_non_exhaustive()
	}
}

impl<Pa: Pool, Pb: Pool> PartialEq<Buffer<Pb>> for Buffer<Pa> {
	fn eq(&self, other: &Buffer<Pb>) -> bool {
		self.count() == other.count() &&
		self.queue.iter().flat_map(Segment::as_slice).eq(
			other.queue.iter().flat_map(Segment::as_slice)
		)
	}
}

impl<P: Pool> PartialEq<[u8]> for Buffer<P> {
	fn eq(&self, mut other: &[u8]) -> bool {
		if self.count() != other.len() {
			return false
		}

		self.queue.iter().all(move |seg| {
			let (cur, rest) = other.split_at(seg.len());
			other = rest;
			seg.as_slice() == cur
		})
	}
}

impl<P: Pool, const N: usize> PartialEq<[u8; N]> for Buffer<P> {
	fn eq(&self, other: &[u8; N]) -> bool {
		self == other.as_slice()
	}
}

impl<P: Pool> PartialEq<Vec<u8>> for Buffer<P> {
	fn eq(&self, other: &Vec<u8>) -> bool {
		self == other.as_slice()
	}
}

impl<P: Pool> PartialEq<&[u8]> for Buffer<P> {
	fn eq(&self, other: &&[u8]) -> bool {
		self == *other
	}
}

impl<P: Pool> Index<usize> for Buffer<P> {
	type Output = u8;

	#[inline]
	fn index(&self, index: usize) -> &u8 {
		let mut pos = index;
		for seg in self.queue.iter() {
			if pos < seg.len() {
				return &seg.as_slice()[pos]
			}
			pos -= seg.len();
		}
		index_out_of_bounds(index, self.count())
	}
}

#[cold]
#[inline(never)]
#[track_caller]
fn index_out_of_bounds(index: usize, count: usize) -> ! {
	panic!("byte index {index} is out of bounds on buffer of byte count {count}")
}
