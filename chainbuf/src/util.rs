// SPDX-License-Identifier: Apache-2.0

use std::env::{self, VarError};
use std::num::ParseIntError;
use tracing::warn;

/// Environment variable overriding the default segment size.
pub const SEGMENT_SIZE_VAR: &str = "CHAINBUF_SEGMENT_SIZE";
/// Environment variable overriding the default share threshold.
pub const SHARE_THRESHOLD_VAR: &str = "CHAINBUF_SHARE_THRESHOLD";
/// Environment variable overriding the default pool's first-tier shard count.
pub const POOL_SHARDS_VAR: &str = "CHAINBUF_POOL_SHARDS";

#[derive(Debug, thiserror::Error)]
pub(crate) enum EnvError {
	#[error("{var} is not valid unicode")]
	NotUnicode { var: &'static str },
	#[error("{var}={value:?} is not an integer")]
	Invalid {
		var: &'static str,
		value: String,
		#[source]
		source: ParseIntError,
	},
	#[error("{var} must be greater than zero")]
	Zero { var: &'static str },
}

/// Reads a positive integer from an environment variable, returning `None` if
/// the variable is not set.
pub(crate) fn env_usize(var: &'static str) -> Result<Option<usize>, EnvError> {
	let value = match env::var(var) {
		Ok(value) => value,
		Err(VarError::NotPresent) => return Ok(None),
		Err(VarError::NotUnicode(_)) => return Err(EnvError::NotUnicode { var })
	};

	match value.trim().parse() {
		Ok(0) => Err(EnvError::Zero { var }),
		Ok(n) => Ok(Some(n)),
		Err(source) => Err(EnvError::Invalid { var, value, source })
	}
}

/// Reads a positive integer from an environment variable, falling back to
/// `default` if it's unset or invalid.
pub(crate) fn env_or(var: &'static str, default: usize) -> usize {
	match env_usize(var) {
		Ok(value) => value.unwrap_or(default),
		Err(error) => {
			warn!(%error, default, "ignoring invalid environment override");
			default
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	// Each test uses its own variable, since tests run in parallel.

	#[test]
	fn unset() {
		assert!(matches!(env_usize("CHAINBUF_TEST_UNSET"), Ok(None)));
		assert_eq!(env_or("CHAINBUF_TEST_UNSET", 7), 7);
	}

	#[test]
	fn valid() {
		env::set_var("CHAINBUF_TEST_VALID", " 4096 ");
		assert_eq!(env_or("CHAINBUF_TEST_VALID", 7), 4096);
	}

	#[test]
	fn invalid() {
		env::set_var("CHAINBUF_TEST_INVALID", "lots");
		assert!(matches!(env_usize("CHAINBUF_TEST_INVALID"), Err(EnvError::Invalid { .. })));
		assert_eq!(env_or("CHAINBUF_TEST_INVALID", 7), 7);
	}

	#[test]
	fn zero() {
		env::set_var("CHAINBUF_TEST_ZERO", "0");
		assert!(matches!(env_usize("CHAINBUF_TEST_ZERO"), Err(EnvError::Zero { .. })));
		assert_eq!(env_or("CHAINBUF_TEST_ZERO", 7), 7);
	}
}
