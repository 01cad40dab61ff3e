use std::num::NonZeroUsize;

/// Host core count at build time, written by `build.rs`.
pub const DEFAULT_WORKERS: usize =
    u64::from_le_bytes(*include_bytes!(concat!(env!("OUT_DIR"), "/default_workers"))) as usize;

/// Longest key accepted, in bytes.
pub const MAX_KEY_LEN: usize = 100;

/// Longest reading accepted, in bytes (`-99.9`).
pub const MAX_VALUE_LEN: usize = 5;

/// Hard bounds on row shape. They size the planner's probe window and are
/// enforced again while tokenizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_key_len: usize,
    pub max_value_len: usize,
}

impl Limits {
    pub const DEFAULT: Limits = Limits {
        max_key_len: MAX_KEY_LEN,
        max_value_len: MAX_VALUE_LEN,
    };

    /// Longest possible row: key, `;`, value, `\n`.
    pub const fn probe_window(&self) -> usize {
        self.max_key_len + 1 + self.max_value_len + 1
    }
}

impl Default for Limits {
    fn default() -> Self {
        Limits::DEFAULT
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub workers: NonZeroUsize,
    pub limits: Limits,
    /// Capacity of each worker's read buffer.
    pub read_buffer: usize,
}

impl Config {
    pub fn with_workers(workers: NonZeroUsize) -> Self {
        Config {
            workers,
            ..Config::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            workers: NonZeroUsize::new(DEFAULT_WORKERS).unwrap_or(NonZeroUsize::MIN),
            limits: Limits::DEFAULT,
            read_buffer: 1 << 16,
        }
    }
}
