// SPDX-License-Identifier: Apache-2.0

use std::cmp::min;
use tracing::trace;
use crate::error::{BufferOp, Result, ResultSetContext};
use crate::pool::Pool;
use super::Buffer;

impl<P: Pool> Buffer<P> {
	/// Reads up to `dst.len()` bytes into `dst`, returning the number of bytes
	/// read.
	pub fn read_into_slice(&mut self, dst: &mut [u8]) -> Result<usize> {
		self.check_open(BufferOp::Read)?;

		let Self { queue, pool, .. } = self;
		let mut read = 0;
		while read < dst.len() {
			let Some(head) = queue.head() else { break };
			let src = head.as_slice();
			let n = min(src.len(), dst.len() - read);
			dst[read..read + n].copy_from_slice(&src[..n]);
			read += n;

			if let Some(drained) = queue.consume(n) {
				pool.recycle(drained);
			}
		}

		queue.check_size();
		trace!(read, "read buffer bytes into slice");
		Ok(read)
	}

	/// Reads exactly `dst.len()` bytes into `dst`, failing without reading if
	/// fewer are buffered.
	pub fn read_exact_into(&mut self, dst: &mut [u8]) -> Result {
		self.check_open(BufferOp::Read)?;
		self.require(dst.len()).set_context(BufferOp::Read)?;
		self.read_into_slice(dst)?;
		Ok(())
	}

	/// Reads every buffered byte into a new vector.
	pub fn read_to_vec(&mut self) -> Result<Vec<u8>> {
		let mut vec = vec![0; self.count()];
		self.read_exact_into(&mut vec)?;
		Ok(vec)
	}
}
