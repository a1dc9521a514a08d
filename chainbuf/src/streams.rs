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

use crate::Buffer;
use crate::error::{BufferOp, Result, ResultSetContext};
use crate::pool::Pool;

/// A data stream, either [`Source`] or [`Sink`].
pub trait Stream {
	/// Returns `true` if the stream is closed.
	fn is_closed(&self) -> bool;

	/// Closes the stream. All default streams close automatically when dropped.
	/// Closing is idempotent, [`close`](Self::close) may be called more than once
	/// with no effect.
	fn close(&mut self) -> Result { Ok(()) }
}

/// A raw source of bytes, filling buffers from some outside producer.
pub trait Source: Stream {
	/// Pulls up to `count` bytes into the back of `sink`, returning the number of
	/// bytes pulled, or `None` at the end of the data. May block.
	fn fill(&mut self, sink: &mut Buffer<impl Pool>, count: usize) -> Result<Option<usize>>;

	/// Pulls every byte into `sink` until the end of the data, returning the
	/// number of bytes pulled.
	fn fill_all(&mut self, sink: &mut Buffer<impl Pool>) -> Result<usize> where Self: Sized {
		sink.transfer_from(self)
	}
}

/// A raw sink of bytes, draining buffers into some outside consumer.
pub trait Sink: Stream {
	/// Accepts exactly `count` bytes from the front of `source`.
	fn drain(&mut self, source: &mut Buffer<impl Pool>, count: usize) -> Result;

	/// Accepts every byte in `source`, returning the number of bytes drained.
	fn drain_all(&mut self, source: &mut Buffer<impl Pool>) -> Result<usize> {
		let count = source.count();
		self.drain(source, count)?;
		Ok(count)
	}

	/// Writes any data held by the sink to its destination.
	fn flush(&mut self) -> Result { Ok(()) }
}

impl<P: Pool> Stream for Buffer<P> {
	#[inline]
	fn is_closed(&self) -> bool { Buffer::is_closed(self) }

	/// Clears and closes the buffer.
	#[inline]
	fn close(&mut self) -> Result {
		Buffer::close(self);
		Ok(())
	}
}

impl<P: Pool> Source for Buffer<P> {
	/// Moves up to `count` bytes into `sink`. See [`Buffer::read_at_most_to`].
	fn fill(&mut self, sink: &mut Buffer<impl Pool>, count: usize) -> Result<Option<usize>> {
		self.read_at_most_to(sink, count).set_context(BufferOp::Fill)
	}
}

impl<P: Pool> Sink for Buffer<P> {
	/// Moves exactly `count` bytes from `source`. See [`Buffer::write_from`].
	fn drain(&mut self, source: &mut Buffer<impl Pool>, count: usize) -> Result {
		self.write_from(source, count).set_context(BufferOp::Drain)
	}
}
