// SPDX-License-Identifier: Apache-2.0

use std::cmp::min;
use crate::error::{BufferError, BufferOp, Result};
use crate::pool::Pool;
use super::Buffer;

/// A read-ahead cursor over a buffer's content, created by [`Buffer::peek`].
///
/// Reading through the cursor copies bytes into a sink by sharing segments,
/// leaving the upstream buffer untouched, so the same bytes can be peeked more
/// than once. The cursor holds no borrow: the upstream buffer is passed to each
/// read, and may keep receiving writes between reads. Once the upstream buffer
/// is read from or closed, the cursor is permanently invalidated.
///
/// The cursor only sees bytes already buffered upstream. It never pulls more
/// data; reading past the end returns `None`.
#[derive(Clone, Debug)]
pub struct Peek {
	upstream: u64,
	/// The upstream consumed-byte total when the cursor was created, or when it
	/// first saw data if the upstream was empty then.
	mark: Option<u64>,
	pos: usize,
	state: State,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum State {
	Valid,
	Invalidated,
	Closed,
}

impl Peek {
	/// Creates a cursor over the buffer `upstream`, marked at `mark` if it holds
	/// data, or at the first data it sees otherwise.
	pub(super) fn new(upstream: u64, mark: Option<u64>) -> Self {
		Self {
			upstream,
			mark,
			pos: 0,
			state: State::Valid,
		}
	}

	/// Returns the number of bytes read through the cursor.
	pub fn position(&self) -> usize { self.pos }

	/// Returns `true` if the cursor can still read.
	pub fn is_valid(&self) -> bool { self.state == State::Valid }

	/// Closes the cursor. Subsequent reads fail with a "closed" error.
	pub fn close(&mut self) {
		self.state = State::Closed;
	}

	/// Copies up to `count` bytes following the cursor's position in `upstream`
	/// into `sink`, returning the number of bytes copied, or `None` if no more
	/// bytes are buffered.
	///
	/// Fails with an "invalidated" error if `upstream` isn't the buffer the cursor
	/// was created from, or it was read from or closed since the cursor was
	/// created, or since it first saw data if `upstream` was empty then.
	pub fn read_at_most_to(
		&mut self,
		upstream: &Buffer<impl Pool>,
		sink: &mut Buffer<impl Pool>,
		count: usize
	) -> Result<Option<usize>> {
		self.validate(upstream)?;

		let available = upstream.count() - self.pos;
		if available == 0 {
			return Ok(None)
		}

		let count = min(count, available);
		upstream.copy_to(sink, self.pos, count)?;
		self.pos += count;
		Ok(Some(count))
	}

	/// Copies up to `dst.len()` bytes following the cursor's position into
	/// `dst`, returning the number of bytes copied, or `None` if no more bytes are
	/// buffered.
	pub fn read_into_slice(&mut self, upstream: &Buffer<impl Pool>, dst: &mut [u8]) -> Result<Option<usize>> {
		self.validate(upstream)?;

		let mut skip = self.pos;
		let mut read = 0;
		for seg in upstream.segments() {
			if read == dst.len() { break }
			let src = seg.as_slice();
			if skip >= src.len() {
				skip -= src.len();
				continue
			}

			let src = &src[skip..];
			skip = 0;
			let n = min(src.len(), dst.len() - read);
			dst[read..read + n].copy_from_slice(&src[..n]);
			read += n;
		}

		if read == 0 && !dst.is_empty() {
			return Ok(None)
		}

		self.pos += read;
		Ok(Some(read))
	}

	fn validate(&mut self, upstream: &Buffer<impl Pool>) -> Result {
		match self.state {
			State::Closed => return Err(BufferError::closed(BufferOp::Peek)),
			State::Invalidated => return Err(BufferError::invalidated(BufferOp::Peek)),
			State::Valid => { }
		}

		let consumed = upstream.consumed();
		let valid = upstream.id() == self.upstream &&
					!upstream.is_closed() &&
					self.mark.map_or(true, |mark| mark == consumed);
		if !valid {
			self.state = State::Invalidated;
			return Err(BufferError::invalidated(BufferOp::Peek))
		}

		if self.mark.is_none() && !upstream.is_empty() {
			self.mark = Some(consumed);
		}
		Ok(())
	}
}

#[cfg(test)]
mod test {
	use std::sync::Arc;
	use pretty_assertions::assert_eq;
	use crate::error::BufferErrorKind;
	use crate::pool::SegmentPool;
	use crate::Buffer;

	fn buffer(pool: &Arc<SegmentPool>) -> Buffer<Arc<SegmentPool>> {
		Buffer::with_pool(pool.clone())
	}

	#[test]
	fn lazy_mark() {
		let pool = Arc::new(SegmentPool::with_segment_size(16));
		let mut upstream = buffer(&pool);
		let mut sink = buffer(&pool);
		let mut peek = upstream.peek();

		assert_eq!(peek.read_at_most_to(&upstream, &mut sink, 4).unwrap(), None);
		upstream.write_from_slice(b"abcdef").unwrap();
		assert_eq!(peek.read_at_most_to(&upstream, &mut sink, 4).unwrap(), Some(4));
		assert_eq!(sink, *b"abcd");
		assert_eq!(upstream.count(), 6);
	}

	#[test]
	fn sees_appended_bytes() {
		let pool = Arc::new(SegmentPool::with_segment_size(16));
		let mut upstream = buffer(&pool);
		upstream.write_from_slice(b"abc").unwrap();
		let mut peek = upstream.peek();

		let mut dst = [0; 8];
		assert_eq!(peek.read_into_slice(&upstream, &mut dst).unwrap(), Some(3));
		assert_eq!(peek.read_into_slice(&upstream, &mut dst).unwrap(), None);
		upstream.write_from_slice(b"de").unwrap();
		assert_eq!(peek.read_into_slice(&upstream, &mut dst).unwrap(), Some(2));
		assert_eq!(&dst[..2], b"de");
		assert_eq!(peek.position(), 5);
	}

	#[test]
	fn marked_at_creation() {
		let pool = Arc::new(SegmentPool::with_segment_size(16));
		let mut upstream = buffer(&pool);
		upstream.write_from_slice(b"abcdef").unwrap();
		let mut peek = upstream.peek();
		upstream.skip(2).unwrap();
		let error = peek.read_into_slice(&upstream, &mut [0; 4]).unwrap_err();
		assert_eq!(error.kind(), BufferErrorKind::Invalidated);
	}

	#[test]
	fn wrong_upstream() {
		let pool = Arc::new(SegmentPool::with_segment_size(16));
		let a = buffer(&pool);
		let mut b = buffer(&pool);
		b.write_from_slice(b"abc").unwrap();
		let mut peek = a.peek();
		let mut dst = [0; 3];
		let error = peek.read_into_slice(&b, &mut dst).unwrap_err();
		assert_eq!(error.kind(), BufferErrorKind::Invalidated);
		assert!(!peek.is_valid());
	}

	#[test]
	fn closed_cursor() {
		let pool = Arc::new(SegmentPool::with_segment_size(16));
		let upstream = buffer(&pool);
		let mut peek = upstream.peek();
		peek.close();
		let error = peek.read_into_slice(&upstream, &mut [0; 1]).unwrap_err();
		assert_eq!(error.kind(), BufferErrorKind::Closed);
	}
}
