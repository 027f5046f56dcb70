//! # Server Module
//!
//! Thin HTTP adapter running a [`Dispatcher`](crate::Dispatcher) on `may_minihttp`.
//!
//! [`request`] turns wire requests into [`RawRequest`](crate::RawRequest)s, [`response`]
//! writes [`HandlerResponse`](crate::HandlerResponse)s back, [`AppService`] glues both to the
//! dispatcher and [`serve`] binds it to a socket. Each connection is served on its own
//! `may` coroutine.
//!
//! ```rust,no_run
//! use routebind::server::serve;
//! use routebind::App;
//!
//! let dispatcher = App::new().build().expect("empty app builds");
//! let handle = serve(dispatcher, "127.0.0.1:8080").expect("bind");
//! handle.wait_ready().expect("ready");
//! handle.stop();
//! ```

pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{serve, HttpServer, ServerHandle};
pub use request::parse_request;
pub use service::{health_endpoint, AppService};
