use super::service::AppService;
use crate::dispatcher::Dispatcher;
use may::coroutine::JoinHandle;
use may_minihttp::HttpService;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(5);
const DEFAULT_READY_TIMEOUT: Duration = Duration::from_millis(250);

/// Binds any `may_minihttp` service to a socket; see [`serve`] for the usual case.
pub struct HttpServer<T>(pub T);

/// A listening server and the coroutine accepting its connections.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// [`wait_ready_for`](Self::wait_ready_for) with a 250ms budget.
    ///
    /// # Errors
    ///
    /// `TimedOut` if nothing accepts connections in time.
    pub fn wait_ready(&self) -> io::Result<()> {
        self.wait_ready_for(DEFAULT_READY_TIMEOUT)
    }

    /// Poll the listening address until a TCP connect succeeds or `timeout` passes.
    ///
    /// # Errors
    ///
    /// `TimedOut` if nothing accepts connections in time.
    pub fn wait_ready_for(&self, timeout: Duration) -> io::Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("server on {} not ready after {timeout:?}", self.addr),
                ));
            }
            thread::sleep(READY_POLL_INTERVAL);
        }
    }

    /// Cancel the accept coroutine and wait for it to finish.
    ///
    /// In-flight requests on other coroutines are not drained.
    pub fn stop(self) {
        // SAFETY: the handle is owned here and consumed; cancelling the accept
        // loop leaves no shared state behind.
        #[allow(unsafe_code)]
        unsafe {
            self.handle.coroutine().cancel();
        }
        if self.handle.join().is_err() {
            info!(addr = %self.addr, "Server coroutine ended by cancellation");
        }
    }

    /// Block until the accept coroutine ends.
    ///
    /// # Errors
    ///
    /// Returns the panic payload if the coroutine panicked.
    pub fn join(self) -> std::thread::Result<()> {
        self.handle.join()
    }
}

impl<T: HttpService + Clone + Send + Sync + 'static> HttpServer<T> {
    /// Start accepting on the first address `addr` resolves to.
    ///
    /// # Errors
    ///
    /// Fails if `addr` does not resolve or cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "address did not resolve"))?;
        let handle = may_minihttp::HttpServer(self.0).start(addr)?;
        Ok(ServerHandle { addr, handle })
    }
}

/// Serve `dispatcher` on `addr` through an [`AppService`].
///
/// # Errors
///
/// See [`HttpServer::start`].
pub fn serve<A: ToSocketAddrs>(dispatcher: Dispatcher, addr: A) -> io::Result<ServerHandle> {
    let routes = dispatcher.router().len();
    let handle = HttpServer(AppService::new(dispatcher)).start(addr)?;
    info!(addr = %handle.addr(), routes, "HTTP server listening");
    Ok(handle)
}
