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

use std::cmp::min;
use std::convert::Infallible;
use all_asserts::assert_le;
use crate::error::{BufferError, BufferOp, Result, ResultSetContext};
use crate::pool::Pool;
use crate::streams::{Sink, Source};
use super::Buffer;

impl<P: Pool> Buffer<P> {
	/// Writes bytes into the back of the buffer through `write`, which receives
	/// a slice of at least `min_capacity` writable bytes and returns the number of
	/// bytes it wrote. The current tail is reused if it has room, otherwise a new
	/// segment is taken from the pool and linked if any bytes were written.
	///
	/// Fails with an "out of bounds" error if `min_capacity` is zero or greater
	/// than the segment size.
	///
	/// # Panics
	///
	/// Panics if `write` returns a count greater than the slice length.
	pub fn append_writable<E: From<BufferError>>(
		&mut self,
		min_capacity: usize,
		write: impl FnOnce(&mut [u8]) -> std::result::Result<usize, E>
	) -> std::result::Result<usize, E> {
		self.check_open(BufferOp::Write)?;
		let segment_size = self.pool.segment_size();
		if min_capacity == 0 || min_capacity > segment_size {
			return Err(BufferError::out_of_bounds(BufferOp::Write, segment_size, 0, min_capacity).into())
		}

		self.append_unchecked(min_capacity, write)
	}

	fn append_unchecked<E>(
		&mut self,
		min_capacity: usize,
		write: impl FnOnce(&mut [u8]) -> std::result::Result<usize, E>
	) -> std::result::Result<usize, E> {
		if let Some(tail) = self.queue.tail_mut().filter(|tail| tail.writable() >= min_capacity) {
			let data = tail.as_mut_slice();
			let len = data.len();
			let written = write(data)?;
			assert_le!(written, len);
			tail.grow(written);
			self.queue.grow(written);
			return Ok(written)
		}

		let mut segment = self.pool.take();
		let data = segment.as_mut_slice();
		let len = data.len();
		let written = match write(data) {
			Ok(written) => written,
			Err(error) => {
				self.pool.recycle(segment);
				return Err(error)
			}
		};
		assert_le!(written, len);

		if written > 0 {
			segment.grow(written);
			self.queue.push(segment);
		} else {
			self.pool.recycle(segment);
		}
		Ok(written)
	}

	/// Writes a copy of `value` into the buffer.
	pub fn write_from_slice(&mut self, mut value: &[u8]) -> Result {
		self.check_open(BufferOp::Write)?;
		while !value.is_empty() {
			let written = self.append_unchecked(1, |data| {
				let n = min(data.len(), value.len());
				data[..n].copy_from_slice(&value[..n]);
				Ok::<_, Infallible>(n)
			});
			let written = match written {
				Ok(written) => written,
				Err(never) => match never { }
			};
			value = &value[written..];
		}
		Ok(())
	}

	/// Fills the buffer from `source` until it ends, returning the number of bytes
	/// read.
	pub fn transfer_from(&mut self, source: &mut impl Source) -> Result<usize> {
		self.check_open(BufferOp::Fill)?;
		let mut total = 0;
		let count = self.pool.segment_size();
		while let Some(read) = source.fill(self, count).set_context(BufferOp::Fill)? {
			total += read;
		}
		Ok(total)
	}

	/// Drains the whole buffer into `sink`, returning the number of bytes written.
	pub fn transfer_to(&mut self, sink: &mut impl Sink) -> Result<usize> {
		let count = self.count();
		sink.drain(self, count).set_context(BufferOp::Drain)?;
		Ok(count)
	}
}
