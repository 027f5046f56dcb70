#![allow(dead_code)]

use routebind::{App, DispatchOutcome, Dispatcher, RawRequest};
use serde_json::Value;

/// Build a dispatcher from a closure that registers routes and providers.
pub fn dispatcher(setup: impl FnOnce(&mut App)) -> Dispatcher {
    let mut app = App::new();
    setup(&mut app);
    app.build().unwrap()
}

pub fn get(dispatcher: &Dispatcher, target: &str) -> DispatchOutcome {
    dispatcher.dispatch(RawRequest::new("GET", target))
}

pub fn send_json(dispatcher: &Dispatcher, method: &str, target: &str, body: &Value) -> DispatchOutcome {
    dispatcher.dispatch(RawRequest::new(method, target).json_body(body))
}

/// `field` of every issue in a 422 body.
pub fn error_fields(outcome: &DispatchOutcome) -> Vec<String> {
    outcome.response.body["detail"]
        .as_array()
        .map(|issues| {
            issues
                .iter()
                .filter_map(|i| i["field"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub mod test_server {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpListener, TcpStream};
    use std::sync::Once;
    use std::time::Duration;

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }

    pub fn free_addr() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr
    }

    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req.as_bytes()).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(200)))
            .unwrap();
        let mut buf = Vec::new();
        loop {
            let mut tmp = [0u8; 1024];
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => panic!("read error: {e:?}"),
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Status, lowercased header lines and JSON body of a raw HTTP response.
    pub fn parse_response(resp: &str) -> (u16, Vec<String>, serde_json::Value) {
        let (head, body) = resp.split_once("\r\n\r\n").unwrap_or((resp, ""));
        let mut lines = head.lines();
        let status = lines
            .next()
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let headers = lines.map(str::to_ascii_lowercase).collect();
        let json = serde_json::from_str(body).unwrap_or_default();
        (status, headers, json)
    }
}
