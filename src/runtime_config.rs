//! # Runtime Configuration Module
//!
//! Environment-driven tuning of the `may` coroutine runtime the HTTP adapter runs on.
//!
//! ## Environment Variables
//!
//! ### `ROUTEBIND_STACK_SIZE`
//!
//! Stack size for connection coroutines, in decimal (`32768`) or hex (`0x8000`).
//! Default: `0x8000` (32 KB). Invalid values fall back to the default.
//!
//! ```rust
//! use routebind::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! assert!(config.stack_size > 0);
//! ```
//!
//! Total virtual memory is roughly `stack_size × concurrent connections`; deeply nested
//! schemas validate recursively, so raise the stack before raising concurrency.

use std::env;
use tracing::{info, warn};

pub const STACK_SIZE_ENV: &str = "ROUTEBIND_STACK_SIZE";
pub const DEFAULT_STACK_SIZE: usize = 0x8000;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes
    pub stack_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        match env::var(STACK_SIZE_ENV) {
            Ok(val) => Self {
                stack_size: parse_stack_size(&val).unwrap_or_else(|| {
                    warn!(value = %val, "Invalid {STACK_SIZE_ENV}; using default");
                    DEFAULT_STACK_SIZE
                }),
            },
            Err(_) => Self::default(),
        }
    }

    /// Apply to the global `may` configuration. Call before starting the server.
    pub fn apply(&self) {
        may::config().set_stack_size(self.stack_size);
        info!(stack_size = self.stack_size, "Coroutine runtime configured");
    }
}

fn parse_stack_size(val: &str) -> Option<usize> {
    let val = val.trim();
    let parsed = match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    };
    parsed.filter(|&n| n > 0)
}
