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

use std::fmt::{Arguments, Debug};

macro_rules! qc_assert_eq {
	($left:expr,$right:expr) => {{
		let left = $left;
		let right = $right;
		if left == right {
			TestResult::passed()
		} else {
			TestResult::error(
				common::format_qc_assert_error(&left, &right, None)
			)
		}
	}};
    ($left:expr,$right:expr,$($arg:tt)+) => {{
		let left = $left;
		let right = $right;
		if left == right {
			TestResult::passed()
		} else {
			TestResult::error(
				common::format_qc_assert_error(&left, &right, Some(format_args!($($arg)+)))
			)
		}
	}};
}

pub fn format_qc_assert_error<L: Debug, R: Debug>(left: &L, right: &R, msg: Option<Arguments>) -> String {
	if let Some(msg) = msg {
		format!(
			"assertion failed `(left == right)`: {msg}\n \
			left: `{left:?}`,\nright: `{right:?}`",
		)
	} else {
		format!(
			"assertion failed `(left == right)`:\n \
			left: `{left:?}`,\nright: `{right:?}`",
		)
	}
}

/// Creates a pool of small segments, so short inputs still span several.
#[allow(dead_code)]
pub fn small_pool(segment_size: usize) -> std::sync::Arc<chainbuf::pool::SegmentPool> {
	chainbuf::pool::SegmentPool::with_segment_size(segment_size).into()
}

/// Generates `len` bytes of a repeating, non-uniform pattern.
#[allow(dead_code)]
pub fn pattern(len: usize) -> Vec<u8> {
	(0..len).map(|i| (i * 31 % 251) as u8).collect()
}

/// Asserts the buffer's byte count equals the sum of its segment lengths, and
/// that no empty segment is linked.
#[allow(dead_code)]
pub fn assert_consistent<P: chainbuf::pool::Pool>(buffer: &chainbuf::Buffer<P>) {
	let mut total = 0;
	for seg in buffer.segments() {
		assert!(!seg.is_empty(), "empty segment linked");
		total += seg.len();
	}
	assert_eq!(buffer.count(), total, "count differs from segment traversal");
}
