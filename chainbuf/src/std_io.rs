// SPDX-License-Identifier: Apache-2.0

use std::cmp::min;
use std::io;
use std::io::{Read, Write};
use tracing::trace;
use crate::Buffer;
use crate::error::{BufferError, BufferOp, Result, ResultContext};
use crate::pool::Pool;
use crate::streams::{Sink, Source, Stream};

/// A [`Source`] reading from a wrapped [`Read`]er.
pub struct ReaderSource<R: Read> {
	reader: Option<R>,
	is_eos: bool,
}

/// A [`Sink`] writing to a wrapped [`Write`]r.
pub struct WriterSink<W: Write> {
	writer: Option<W>,
}

impl<R: Read> From<R> for ReaderSource<R> {
	fn from(reader: R) -> Self {
		Self {
			reader: Some(reader),
			is_eos: false,
		}
	}
}

impl<W: Write> From<W> for WriterSink<W> {
	fn from(writer: W) -> Self {
		Self { writer: Some(writer) }
	}
}

impl<R: Read> ReaderSource<R> {
	/// Returns `true` if the reader has reached its end.
	pub fn is_eos(&self) -> bool { self.is_eos }

	/// Unwraps the reader, or `None` if the source is closed.
	pub fn into_inner(mut self) -> Option<R> { self.reader.take() }
}

impl<W: Write> WriterSink<W> {
	/// Unwraps the writer without flushing, or `None` if the sink is closed.
	pub fn into_inner(mut self) -> Option<W> { self.writer.take() }
}

impl<R: Read> Stream for ReaderSource<R> {
	fn is_closed(&self) -> bool {
		self.reader.is_none()
	}

	/// Closes the underlying reader by letting it fall out of scope. Subsequent
	/// reads will fail.
	fn close(&mut self) -> Result {
		self.reader.take();
		Ok(())
	}
}

impl<R: Read> Source for ReaderSource<R> {
	/// Reads up to `count` bytes, at most one segment's worth, into the back of
	/// `sink`.
	fn fill(&mut self, sink: &mut Buffer<impl Pool>, count: usize) -> Result<Option<usize>> {
		let reader = self.reader
			.as_mut()
			.ok_or_else(|| BufferError::closed(BufferOp::Fill))?;
		if self.is_eos { return Ok(None) }
		if count == 0 { return Ok(Some(0)) }

		let read = sink.append_writable(1, |data| {
			let len = min(data.len(), count);
			loop {
				match reader.read(&mut data[..len]) {
					Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
					result => break result.context(BufferOp::Fill)
				}
			}
		})?;

		if read == 0 {
			trace!("reader source reached end of data");
			self.is_eos = true;
			Ok(None)
		} else {
			Ok(Some(read))
		}
	}
}

impl<W: Write> Stream for WriterSink<W> {
	fn is_closed(&self) -> bool {
		self.writer.is_none()
	}

	/// Flushes, then closes the underlying writer by letting it fall out of scope.
	/// Subsequent writes will fail.
	fn close(&mut self) -> Result {
		let Some(mut writer) = self.writer.take() else { return Ok(()) };
		writer.flush().context(BufferOp::Close)
	}
}

impl<W: Write> Sink for WriterSink<W> {
	/// Writes exactly `count` bytes from the front of `source`, segment by
	/// segment. Fails without writing if `source` holds fewer than `count` bytes.
	fn drain(&mut self, source: &mut Buffer<impl Pool>, count: usize) -> Result {
		let writer = self.writer
			.as_mut()
			.ok_or_else(|| BufferError::closed(BufferOp::Drain))?;
		source.check_open(BufferOp::Drain)?;
		let available = source.count();
		if count > available {
			return Err(BufferError::insufficient_data(BufferOp::Drain, count, available))
		}

		let mut remaining = count;
		while remaining > 0 {
			let n = {
				let Some(head) = source.segments().next() else { break };
				let data = head.as_slice();
				let n = min(data.len(), remaining);
				writer.write_all(&data[..n]).context(BufferOp::Drain)?;
				n
			};
			source.skip(n)?;
			remaining -= n;
		}
		Ok(())
	}

	fn flush(&mut self) -> Result {
		self.writer
			.as_mut()
			.ok_or_else(|| BufferError::closed(BufferOp::Flush))?
			.flush()
			.context(BufferOp::Flush)
	}
}

impl<W: Write> Drop for WriterSink<W> {
	fn drop(&mut self) {
		let _ = self.close();
	}
}
