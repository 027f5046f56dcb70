//! # CLI Module
//!
//! Command-line entry points of the `routebind` binary, which serves the demo
//! application.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! ```bash
//! routebind serve --config routebind.yaml --bind 127.0.0.1:8080
//! ```
//!
//! - `--config <FILE>` - YAML configuration (optional; defaults apply without it)
//! - `--bind <ADDR>` - overrides `http.bind` from the configuration
//!
//! ### `routes`
//!
//! Print the routing table, one `METHOD /template -> handler` line per route:
//!
//! ```bash
//! routebind routes
//! ```

mod commands;


pub use commands::{run, run_cli, Cli, Commands};
