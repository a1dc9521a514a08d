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

use std::{fmt, io, result};
use std::error::Error as StdError;
use std::fmt::{Debug, Display, Formatter};
use amplify_derive::Display;

pub type ErrorBox = Box<dyn StdError + Send + Sync>;

pub trait OperationKind: Copy + Debug + Display {
	fn unknown() -> Self;
}

pub trait ErrorKind: Copy + Debug + Display {
	fn other(message: &'static str) -> Self;
}

#[derive(Debug)]
pub struct Error<O: OperationKind, E: ErrorKind> {
	op: O,
	kind: E,
	source: Option<ErrorBox>,
}

impl<O: OperationKind, E: ErrorKind> Display for Error<O, E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let Self { op, kind, source } = self;
		if let Some(source) = source {
			write!(f, "{op} failed; {kind} ({source})")
		} else {
			write!(f, "{op} failed; {kind}")
		}
	}
}

impl<O: OperationKind, E: ErrorKind> StdError for Error<O, E> {
	fn source(&self) -> Option<&(dyn StdError + 'static)> {
		if let Some(ref source) = self.source {
			Some(source.as_ref())
		} else {
			None
		}
	}
}

impl<O: OperationKind, K: ErrorKind> Error<O, K> {
	pub(crate) fn new(
		op: O,
		kind: K,
		source: Option<ErrorBox>
	) -> Self {
		Self { op, kind, source }
	}

	/// Creates a new error with a custom message.
	pub fn other(
		op: O,
		message: &'static str,
		source: Option<ErrorBox>
	) -> Self {
		Self::new(op, K::other(message), source)
	}

	/// Returns the operation kind.
	pub fn operation(&self) -> O { self.op }

	/// Sets the operation kind.
	pub fn with_operation(mut self, op: O) -> Self {
		self.op = op;
		self
	}

	/// Returns the error kind.
	pub fn kind(&self) -> K { self.kind }
}

impl<O: OperationKind, K: ErrorKind> From<&'static str> for Error<O, K> {
	fn from(value: &'static str) -> Self {
		Self::other(O::unknown(), value, None)
	}
}

/// The buffer operation an error was raised from.
#[derive(Copy, Clone, Debug, Default, Display, Eq, PartialEq)]
pub enum BufferOp {
	#[default]
	#[display("unknown operation")]
	Unknown,
	#[display("write to buffer")]
	Write,
	#[display("read from buffer")]
	Read,
	#[display("skip buffer bytes")]
	Skip,
	#[display("splice buffers")]
	Splice,
	#[display("copy buffer range")]
	Copy,
	#[display("peek buffer")]
	Peek,
	#[display("fill buffer from source")]
	Fill,
	#[display("drain buffer into sink")]
	Drain,
	#[display("flush sink")]
	Flush,
	#[display("close stream")]
	Close,
}

impl OperationKind for BufferOp {
	fn unknown() -> Self { Self::Unknown }
}

#[derive(Copy, Clone, Debug, Display, Eq, PartialEq)]
pub enum BufferErrorKind {
	/// An offset, length, or index lies outside the buffered content.
	#[display("index or range out of bounds")]
	OutOfBounds,
	/// More bytes were requested than are currently buffered. Unlike
	/// [`OutOfBounds`](Self::OutOfBounds), this may succeed once more data
	/// arrives.
	#[display("insufficient data buffered")]
	InsufficientData,
	#[display("stream closed")]
	Closed,
	/// A peek cursor's upstream buffer was read from or closed.
	#[display("peek cursor invalidated by an upstream read")]
	Invalidated,
	#[display("IO error")]
	Io,
	#[display("{0}")]
	Other(&'static str),
}

impl ErrorKind for BufferErrorKind {
	fn other(message: &'static str) -> Self { Self::Other(message) }
}

impl BufferErrorKind {
	/// Returns `true` for errors caused by using a closed or invalidated stream.
	pub fn is_state(&self) -> bool {
		matches!(self, Self::Closed | Self::Invalidated)
	}
}

/// Detail for [`BufferErrorKind::OutOfBounds`] errors.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("size={size} offset={offset} count={count}")]
pub struct RangeError {
	pub size: usize,
	pub offset: usize,
	pub count: usize,
}

/// Detail for [`BufferErrorKind::InsufficientData`] errors.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("requested {requested} bytes, {available} available")]
pub struct ShortError {
	pub requested: usize,
	pub available: usize,
}

pub type BufferError = Error<BufferOp, BufferErrorKind>;
pub type Result<T = ()> = result::Result<T, BufferError>;

impl From<io::Error> for BufferError {
	fn from(value: io::Error) -> Self {
		Self::io(BufferOp::Unknown, value)
	}
}

impl BufferError {
	/// Creates a new "out of bounds" error.
	pub fn out_of_bounds(op: BufferOp, size: usize, offset: usize, count: usize) -> Self {
		let detail = RangeError { size, offset, count };
		Self::new(op, BufferErrorKind::OutOfBounds, Some(detail.into()))
	}

	/// Creates a new "insufficient data" error.
	pub fn insufficient_data(op: BufferOp, requested: usize, available: usize) -> Self {
		let detail = ShortError { requested, available };
		Self::new(op, BufferErrorKind::InsufficientData, Some(detail.into()))
	}

	/// Creates a new "closed" error.
	pub fn closed(op: BufferOp) -> Self {
		Self::new(op, BufferErrorKind::Closed, None)
	}

	/// Creates a new "invalidated" error.
	pub fn invalidated(op: BufferOp) -> Self {
		Self::new(op, BufferErrorKind::Invalidated, None)
	}

	/// Creates a new IO error.
	pub fn io(op: BufferOp, error: io::Error) -> Self {
		Self::new(op, BufferErrorKind::Io, Some(error.into()))
	}

	/// Returns the source downcast into an IO Error, if possible.
	pub fn io_source(&self) -> Option<&io::Error> {
		self.source()?.downcast_ref()
	}
}

/// Attaches an operation to IO results.
pub trait ResultContext<T> {
	/// Wraps an IO error into a [`BufferError`] raised from `op`.
	fn context(self, op: BufferOp) -> Result<T>;
}

impl<T> ResultContext<T> for io::Result<T> {
	fn context(self, op: BufferOp) -> Result<T> {
		self.map_err(|error| BufferError::io(op, error))
	}
}

/// Replaces the operation of buffer results.
pub trait ResultSetContext<T> {
	/// Sets the operation of an error to `op`.
	fn set_context(self, op: BufferOp) -> Result<T>;
}

impl<T> ResultSetContext<T> for Result<T> {
	fn set_context(self, op: BufferOp) -> Result<T> {
		self.map_err(|error| error.with_operation(op))
	}
}
