use std::env;

/// Arena size used when nothing else is configured: 5 MiB.
pub const DEFAULT_POOL_SIZE: usize = 5 * 1024 * 1024;

/// Environment variable read by [`PoolConfig::from_env`].
pub const POOL_SIZE_VAR: &str = "TAGPOOL_SIZE";

/// Settings for a [`crate::Pool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
  /// Requested arena size in bytes. Rounded up to a word multiple and to at
  /// least [`crate::align::MIN_BLOCK_SIZE`] when the pool is reserved.
  pub pool_size: usize,
}

impl PoolConfig {
  pub const fn new(pool_size: usize) -> Self {
    Self { pool_size }
  }

  /// Reads the arena size from `TAGPOOL_SIZE`, falling back to
  /// [`DEFAULT_POOL_SIZE`] when the variable is missing or not a number.
  pub fn from_env() -> Self {
    match env::var(POOL_SIZE_VAR) {
      Ok(value) => Self::parse(&value),
      Err(_) => Self::default(),
    }
  }

  fn parse(value: &str) -> Self {
    match value.trim().parse::<usize>() {
      Ok(pool_size) => Self::new(pool_size),
      Err(err) => {
        log::warn!(
          "ignoring {}={:?} ({}), using {} bytes",
          POOL_SIZE_VAR,
          value,
          err,
          DEFAULT_POOL_SIZE
        );
        Self::default()
      }
    }
  }
}

impl Default for PoolConfig {
  fn default() -> Self {
    Self::new(DEFAULT_POOL_SIZE)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_size() {
    assert_eq!(PoolConfig::default().pool_size, DEFAULT_POOL_SIZE);
  }

  #[test]
  fn test_parse() {
    assert_eq!(PoolConfig::parse("4096"), PoolConfig::new(4096));
    assert_eq!(PoolConfig::parse(" 128\n"), PoolConfig::new(128));
    assert_eq!(PoolConfig::parse("lots"), PoolConfig::default());
    assert_eq!(PoolConfig::parse("-1"), PoolConfig::default());
  }
}
