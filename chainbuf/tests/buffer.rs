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

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use pretty_assertions::assert_eq;
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;
use chainbuf::{Buffer, BufferErrorKind, DEFAULT_SEGMENT_SIZE, Segment};
use chainbuf::pool::{Pool, PoolOptions, SegmentPool};

#[macro_use]
mod common;

/// A pool counting segments handed out and not yet returned.
#[derive(Clone, Default)]
struct CountingPool {
	outstanding: Rc<Cell<isize>>,
}

impl CountingPool {
	const SEGMENT_SIZE: usize = 64;

	fn outstanding(&self) -> isize { self.outstanding.get() }
}

impl Pool for CountingPool {
	fn segment_size(&self) -> usize { Self::SEGMENT_SIZE }

	fn take(&self) -> Segment {
		self.outstanding.set(self.outstanding.get() + 1);
		Segment::new(Self::SEGMENT_SIZE)
	}

	fn recycle(&self, segment: Segment) {
		self.outstanding.set(self.outstanding.get() - 1);
		drop(segment);
	}
}

#[quickcheck]
fn count(data: Vec<u8>) -> TestResult {
	let mut buffer = Buffer::with_pool(common::small_pool(32));
	if let Err(error) = buffer.write_from_slice(&data) {
		return TestResult::error(error.to_string())
	}
	common::assert_consistent(&buffer);
	qc_assert_eq!(buffer.count(), data.len())
}

#[quickcheck]
fn read_back(data: Vec<u8>) -> TestResult {
	let mut buffer = Buffer::with_pool(common::small_pool(32));
	buffer.write_from_slice(&data).unwrap();
	qc_assert_eq!(buffer.read_to_vec().unwrap(), data)
}

#[test]
fn round_trip_segment_edges() {
	let pool: std::sync::Arc<SegmentPool> = SegmentPool::new(
		PoolOptions::new().with_segment_size(DEFAULT_SEGMENT_SIZE)
	).into();
	let s = DEFAULT_SEGMENT_SIZE;
	for len in [0, 1, s - 1, s, s + 1, 3 * s] {
		let data = common::pattern(len);
		let mut buffer = Buffer::with_pool(pool.clone());
		buffer.write_from_slice(&data).unwrap();
		assert_eq!(buffer.count(), len);
		assert_eq!(buffer.segment_count(), (len + s - 1) / s);
		common::assert_consistent(&buffer);

		let mut read = vec![0; len];
		buffer.read_exact_into(&mut read).unwrap();
		assert!(read == data, "round trip of {len} bytes differs");
		assert!(buffer.is_empty());
	}
}

#[test]
fn clear_returns_every_segment() {
	let pool = CountingPool::default();
	let mut buffer = Buffer::with_pool(pool.clone());
	buffer.write_from_slice(&common::pattern(1000)).unwrap();
	assert_eq!(pool.outstanding(), buffer.segment_count() as isize);

	buffer.clear();
	assert_eq!(buffer.count(), 0);
	assert_eq!(buffer.segment_count(), 0);
	assert_eq!(pool.outstanding(), 0);
}

#[test]
fn drop_returns_every_segment() {
	let pool = CountingPool::default();
	{
		let mut buffer = Buffer::with_pool(pool.clone());
		buffer.write_from_slice(&common::pattern(500)).unwrap();
		buffer.skip(100).unwrap();
	}
	assert_eq!(pool.outstanding(), 0);
}

#[test]
fn skip_is_atomic() {
	let pool = CountingPool::default();
	let mut buffer = Buffer::with_pool(pool.clone());
	let data = common::pattern(200);
	buffer.write_from_slice(&data).unwrap();

	let error = buffer.skip(201).unwrap_err();
	assert_eq!(error.kind(), BufferErrorKind::InsufficientData);
	assert_eq!(buffer, data);

	buffer.skip(150).unwrap();
	assert_eq!(buffer, &data[150..]);
	assert_eq!(pool.outstanding(), 2);
}

#[test]
fn get_matches_index() {
	let mut buffer = Buffer::with_pool(common::small_pool(16));
	let data = common::pattern(100);
	buffer.write_from_slice(&data).unwrap();
	for (i, &byte) in data.iter().enumerate() {
		assert_eq!(buffer.get(i), Some(byte));
		assert_eq!(buffer[i], byte);
	}
	assert_eq!(buffer.get(100), None);
	assert_eq!(buffer.byte_at(100).unwrap_err().kind(), BufferErrorKind::OutOfBounds);
}

/// Runs a random sequence of writes, skips, splices and clears against a pair
/// of buffers, checking both against a plain byte queue after every step.
#[quickcheck]
fn operations_match_model(ops: Vec<(u8, u16)>) -> TestResult {
	let pool = common::small_pool(32);
	let mut a = Buffer::with_pool(pool.clone());
	let mut b = Buffer::with_pool(pool.clone());
	let mut model_a = VecDeque::new();
	let mut model_b = VecDeque::new();

	for (op, n) in ops {
		let n = n as usize % 200;
		match op % 5 {
			0 => {
				let data = common::pattern(n);
				a.write_from_slice(&data).unwrap();
				model_a.extend(data);
			}
			1 => {
				let n = n.min(a.count());
				a.skip(n).unwrap();
				model_a.drain(..n);
			}
			2 => {
				let n = n.min(a.count());
				b.write_from(&mut a, n).unwrap();
				model_b.extend(model_a.drain(..n));
			}
			3 => {
				let n = n.min(b.count());
				a.write_from(&mut b, n).unwrap();
				model_a.extend(model_b.drain(..n));
			}
			_ => {
				b.clear();
				model_b.clear();
			}
		}

		common::assert_consistent(&a);
		common::assert_consistent(&b);
		if a != model_a.make_contiguous()[..] || b != model_b.make_contiguous()[..] {
			return TestResult::error(format!("buffers diverged from model: {a:?}, {b:?}"))
		}
	}

	drop((a, b));
	qc_assert_eq!(pool.stats().outstanding(), 0)
}
