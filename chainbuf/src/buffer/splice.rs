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
use tracing::trace;
use crate::error::{BufferError, BufferOp, Result, ResultSetContext};
use crate::pool::Pool;
use crate::segment::Segment;
use super::Buffer;

impl<P: Pool> Buffer<P> {
	/// Moves exactly `count` bytes from the front of `source` to the back of this
	/// buffer. Fails without moving anything if `source` holds fewer than `count`
	/// bytes.
	///
	/// Whole segments are relinked rather than copied. Only a segment split at
	/// the end of the range may be copied, when the split is smaller than the
	/// share threshold. An incoming segment small enough to fit in the space left
	/// in this buffer's tail is merged into it instead, so buffers built from many
	/// small transfers don't accumulate near-empty segments.
	pub fn write_from(&mut self, source: &mut Buffer<impl Pool>, count: usize) -> Result {
		self.check_open(BufferOp::Splice)?;
		source.check_open(BufferOp::Splice)?;
		let available = source.count();
		if count > available {
			return Err(BufferError::insufficient_data(BufferOp::Splice, count, available))
		}

		let mut remaining = count;
		while remaining > 0 {
			let Some(head) = source.queue.head_mut() else { break };
			let head_len = head.len();

			let moved = if remaining < head_len {
				// Only a prefix of the head is wanted. Write it straight into the
				// tail if there's room.
				if let Some(tail) = self.queue.tail_mut().filter(|tail| tail.appendable() >= remaining) {
					head.write_to(tail, remaining);
					source.queue.shrink(remaining);
					self.queue.grow(remaining);
					break
				}

				let Some(prefix) = source.queue.split_head(remaining, self.share_threshold, &self.pool) else { break };
				prefix
			} else {
				let Some(head) = source.queue.pop() else { break };
				head
			};

			remaining -= moved.len();
			self.push_or_merge(moved);
		}

		source.queue.check_size();
		self.queue.check_size();
		trace!(count, "spliced segments");
		Ok(())
	}

	/// Moves up to `count` bytes into `sink`, returning the number of bytes moved,
	/// or `None` if this buffer is empty.
	pub fn read_at_most_to(&mut self, sink: &mut Buffer<impl Pool>, count: usize) -> Result<Option<usize>> {
		self.check_open(BufferOp::Read)?;
		if self.is_empty() {
			return Ok(None)
		}

		let count = min(count, self.count());
		sink.write_from(self, count).set_context(BufferOp::Read)?;
		Ok(Some(count))
	}

	/// Links an incoming segment at the back, or copies its bytes into the tail
	/// and recycles it if the tail can absorb them.
	fn push_or_merge(&mut self, mut segment: Segment) {
		let len = segment.len();
		if let Some(tail) = self.queue.tail_mut().filter(|tail| tail.appendable() >= len) {
			segment.write_to(tail, len);
			self.queue.grow(len);
			self.pool.recycle(segment);
		} else {
			self.queue.push(segment);
		}
	}
}
