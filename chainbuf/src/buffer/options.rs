// SPDX-License-Identifier: Apache-2.0

use once_cell::sync::Lazy;
use crate::DEFAULT_SHARE_THRESHOLD;
use crate::util::{env_or, SHARE_THRESHOLD_VAR};

static ENV_OPTIONS: Lazy<BufferOptions> = Lazy::new(BufferOptions::from_env);

/// Options for tuning [`Buffer`](super::Buffer)'s behavior and performance.
///
/// # Share threshold
///
/// The minimum size for segment data to be shared rather than copied to another
/// segment when a transfer splits a segment. Defaults to `1024B`. With a value
/// more than the segment size, split segments are never shared.
///
/// Sharing is significantly faster than copying for large spans, O(1) vs O(n)
/// complexity. The tradeoffs may not be worth it for small spans, however: shared
/// segments are read-only, so a buffer holding many small shared segments can't
/// append to or compact them, and reading walks more segments.
///
/// The default options read the threshold from the `CHAINBUF_SHARE_THRESHOLD`
/// environment variable once, on first use.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct BufferOptions {
	pub share_threshold: usize,
}

impl Default for BufferOptions {
	fn default() -> Self { *ENV_OPTIONS }
}

impl BufferOptions {
	/// Creates a new set of buffer options, ignoring the environment.
	pub const fn new() -> Self {
		Self {
			share_threshold: DEFAULT_SHARE_THRESHOLD,
		}
	}

	/// Creates buffer options from the environment, falling back to defaults.
	pub fn from_env() -> Self {
		Self {
			share_threshold: env_or(SHARE_THRESHOLD_VAR, DEFAULT_SHARE_THRESHOLD),
		}
	}

	/// Presets the options to create a "lean" buffer, disabling data sharing on
	/// splits. The buffer always copies split segment data to owned segments.
	#[inline]
	pub const fn lean() -> Self {
		Self {
			share_threshold: usize::MAX,
		}
	}

	/// Returns the segment share threshold.
	#[inline]
	pub const fn share_threshold(&self) -> usize { self.share_threshold }

	/// Sets the segment share threshold.
	#[inline]
	pub fn set_share_threshold(&mut self, value: usize) {
		self.share_threshold = value;
	}

	/// Sets the segment share threshold.
	#[inline]
	pub const fn with_share_threshold(mut self, value: usize) -> Self {
		self.share_threshold = value;
		self
	}
}
