use super::request::parse_request;
use super::response::{preload_header_lines, write_handler_response};
use crate::dispatcher::{Dispatcher, HandlerResponse};
use may_minihttp::{HttpService, Request, Response};
use serde_json::json;
use std::io;

/// `may_minihttp` service serving one [`Dispatcher`].
///
/// Apart from `GET /health` every request goes through the dispatcher
/// unchanged; the service holds no routing or validation logic of its own.
#[derive(Clone, Debug)]
pub struct AppService {
    pub dispatcher: Dispatcher,
}

impl AppService {
    /// Wraps `dispatcher` and interns the header lines its routes can emit.
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        preload_header_lines(dispatcher.router());
        Self { dispatcher }
    }
}

/// Basic health check endpoint returning `{ "status": "ok" }`.
pub fn health_endpoint(res: &mut Response) -> io::Result<()> {
    write_handler_response(res, HandlerResponse::json(200, json!({ "status": "ok" })));
    Ok(())
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let raw = parse_request(req);
        if raw.method == "GET" && raw.target == "/health" {
            return health_endpoint(res);
        }
        let outcome = self.dispatcher.dispatch(raw);
        write_handler_response(res, outcome.response);
        Ok(())
    }
}
