//! Asynchronous notification correlation.
//!
//! A CSE answers subscriptions by POSTing `m2m:sgn` notifications to the
//! AE's point of access. The [`NotificationListener`] serves those requests on
//! a dedicated worker thread and routes each one, by its subscription
//! reference (`sur`), to a handler registered in the [`HandlerRegistry`].
//!
//! ```text
//!  caller threads                         listener thread
//! ┌────────────────┐   register()    ┌──────────────────────────┐
//! │ Cse / app code │ ──────────────► │ HandlerRegistry (DashMap)│
//! └────────────────┘                 └────────────┬─────────────┘
//!                                                 │ take(sur)
//!  CSE ── POST /notify {"m2m:sgn":…} ──► axum ────┘──► handler ──► HTTP reply
//! ```
//!
//! Lifecycle: `Stopped → Starting → Listening → Stopping → Stopped`. Dropping
//! the last handle stops the worker.
//!
//! # Example
//!
//! ```ignore
//! use onem2m::listener::{ListenerSupervisor, NotificationReply};
//! use onem2m::config::ListenerConfig;
//!
//! let supervisor = ListenerSupervisor::new();
//! let listener = supervisor.get_or_init(&ListenerConfig::default());
//! listener.register("/PN_CSE/sub1", |cb| {
//!     println!("{cb:?}");
//!     Ok(NotificationReply::ok())
//! });
//! listener.start()?;
//! listener.wait_ready(std::time::Duration::from_secs(5))?;
//! ```

mod registry;
mod server;

pub use registry::{
    Callback, Handler, HandlerPolicy, HandlerRegistry, Notification, NotificationEvent,
    NotificationReply, NOTIFICATION_SHORT_NAME,
};

use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::ListenerConfig;
use crate::error::{OneM2MError, Result};
use crate::primitive::OneM2MResponse;
use crate::transport::TcpServer;

/// Listener lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// No worker running
    Stopped,
    /// Worker spawned, socket not bound yet
    Starting,
    /// Accepting notifications
    Listening,
    /// Shutdown requested
    Stopping,
}

impl fmt::Display for ListenerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Listening => "listening",
            Self::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
struct Status {
    state: ListenerState,
    local_addr: Option<SocketAddr>,
    error: Option<String>,
}

/// State shared with the worker thread.
#[derive(Debug)]
struct StatusCell {
    status: Mutex<Status>,
    changed: Condvar,
}

impl StatusCell {
    fn new() -> Self {
        Self {
            status: Mutex::new(Status {
                state: ListenerState::Stopped,
                local_addr: None,
                error: None,
            }),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Status> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, f: impl FnOnce(&mut Status)) {
        f(&mut self.lock());
        self.changed.notify_all();
    }
}

struct Worker {
    token: CancellationToken,
    thread: JoinHandle<()>,
}

struct Inner {
    config: ListenerConfig,
    registry: HandlerRegistry,
    status: Arc<StatusCell>,
    worker: Mutex<Option<Worker>>,
}

impl Inner {
    fn worker(&self) -> MutexGuard<'_, Option<Worker>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn shutdown(&self, worker: Worker) -> Result<()> {
        self.status.update(|s| s.state = ListenerState::Stopping);
        worker.token.cancel();
        let joined = worker.thread.join();
        self.status.update(|s| {
            s.state = ListenerState::Stopped;
            s.local_addr = None;
        });
        tracing::info!("Notification listener stopped");
        joined.map_err(|_| OneM2MError::Listener("Listener thread panicked".to_string()))
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let worker = self
            .worker
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            if let Err(e) = self.shutdown(worker) {
                tracing::warn!(error = %e, "Listener shutdown on drop failed");
            }
        }
    }
}

/// HTTP server that correlates inbound notifications with registered handlers.
///
/// Cloning yields another handle to the same listener.
#[derive(Clone)]
pub struct NotificationListener {
    inner: Arc<Inner>,
}

impl NotificationListener {
    /// Create a stopped listener
    pub fn new(config: ListenerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                registry: HandlerRegistry::new(),
                status: Arc::new(StatusCell::new()),
                worker: Mutex::new(None),
            }),
        }
    }

    /// Listener configuration
    pub fn config(&self) -> &ListenerConfig {
        &self.inner.config
    }

    /// Handler registry
    pub fn registry(&self) -> &HandlerRegistry {
        &self.inner.registry
    }

    /// Current lifecycle state
    pub fn state(&self) -> ListenerState {
        self.inner.status.lock().state
    }

    /// Bound address while listening
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.inner.status.lock().local_addr
    }

    /// Do two handles refer to the same listener?
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Spawn the worker thread. Fails unless the listener is stopped.
    pub fn start(&self) -> Result<()> {
        let mut worker = self.inner.worker();
        {
            let status = self.inner.status.lock();
            if status.state != ListenerState::Stopped {
                return Err(OneM2MError::Listener(format!(
                    "Cannot start listener while {}",
                    status.state
                )));
            }
        }
        // A worker that died on its own (e.g. bind failure) is reaped here.
        if let Some(old) = worker.take() {
            let _ = old.thread.join();
        }

        let addr = self.inner.config.listen_addr()?;
        let router = server::create_router(
            self.inner.registry.clone(),
            &self.inner.config.paths,
            self.inner.config.max_body_size,
        );
        let token = CancellationToken::new();
        let status = Arc::clone(&self.inner.status);
        status.update(|s| {
            s.state = ListenerState::Starting;
            s.local_addr = None;
            s.error = None;
        });

        let thread_token = token.clone();
        let thread_status = Arc::clone(&status);
        let spawned = std::thread::Builder::new()
            .name("onem2m-listener".to_string())
            .spawn(move || run_worker(addr, router, thread_token, &thread_status));

        match spawned {
            Ok(thread) => {
                *worker = Some(Worker { token, thread });
                Ok(())
            },
            Err(e) => {
                status.update(|s| s.state = ListenerState::Stopped);
                Err(OneM2MError::Listener(format!("Failed to spawn listener thread: {e}")))
            },
        }
    }

    /// Block until the socket is bound and return its address.
    pub fn wait_ready(&self, timeout: Duration) -> Result<SocketAddr> {
        let cell = &self.inner.status;
        let (status, _) = cell
            .changed
            .wait_timeout_while(cell.lock(), timeout, |s| s.state == ListenerState::Starting)
            .unwrap_or_else(PoisonError::into_inner);

        match (status.state, status.local_addr) {
            (ListenerState::Listening, Some(addr)) => Ok(addr),
            (ListenerState::Starting, _) => Err(OneM2MError::Listener(format!(
                "Listener not ready after {timeout:?}"
            ))),
            (state, _) => Err(OneM2MError::Listener(
                status
                    .error
                    .clone()
                    .unwrap_or_else(|| format!("Listener is {state}")),
            )),
        }
    }

    /// `start` followed by `wait_ready` with the configured timeout
    pub fn start_and_wait(&self) -> Result<SocketAddr> {
        self.start()?;
        self.wait_ready(self.inner.config.ready_timeout())
    }

    /// Shut down gracefully and join the worker. A stopped listener is left as is.
    pub fn stop(&self) -> Result<()> {
        let worker = self.inner.worker().take();
        match worker {
            Some(worker) => self.inner.shutdown(worker),
            None => Ok(()),
        }
    }

    /// Register a persistent handler for `id`
    pub fn register<F>(&self, id: impl fmt::Display, handler: F)
    where
        F: Fn(Callback) -> Result<NotificationReply> + Send + Sync + 'static,
    {
        self.inner.registry.register(id, handler);
    }

    /// Register a handler evicted after its first dispatch
    pub fn register_once<F>(&self, id: impl fmt::Display, handler: F)
    where
        F: Fn(Callback) -> Result<NotificationReply> + Send + Sync + 'static,
    {
        self.inner.registry.register_once(id, handler);
    }

    /// Remove the handler for `id`
    pub fn deregister(&self, id: impl fmt::Display) -> bool {
        self.inner.registry.deregister(id)
    }

    /// Invoke the handler for `id` directly; see [`HandlerRegistry::dispatch`]
    pub fn dispatch(
        &self,
        id: impl fmt::Display,
        payload: Option<Value>,
    ) -> Result<Option<NotificationReply>> {
        self.inner.registry.dispatch(id, payload)
    }

    /// Invoke the handler for `id` with a response envelope
    pub fn dispatch_response(
        &self,
        id: impl fmt::Display,
        response: OneM2MResponse,
    ) -> Result<Option<NotificationReply>> {
        self.inner.registry.dispatch_response(id, response)
    }
}

impl fmt::Debug for NotificationListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationListener")
            .field("config", &self.inner.config)
            .field("state", &self.state())
            .field("registry", &self.inner.registry)
            .finish()
    }
}

fn run_worker(
    addr: SocketAddr,
    router: axum::Router,
    token: CancellationToken,
    status: &StatusCell,
) {
    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(OneM2MError::from)
        .and_then(|runtime| {
            runtime.block_on(async {
                let listener = TcpServer::new(addr).bind().await?;
                let local = listener.local_addr()?;
                status.update(|s| {
                    s.state = ListenerState::Listening;
                    s.local_addr = Some(local);
                });
                tracing::info!(%local, "Notification listener ready");
                TcpServer::serve(listener, router, token).await
            })
        });

    if let Err(e) = &result {
        tracing::warn!(error = %e, "Notification listener exited with error");
    }
    status.update(|s| {
        if let Err(e) = result {
            s.error = Some(e.to_string());
        }
        if s.state != ListenerState::Stopping {
            s.state = ListenerState::Stopped;
        }
        s.local_addr = None;
    });
}

/// Lazily constructs one shared listener.
///
/// The first `get_or_init` decides the configuration; later calls get the same
/// instance whatever config they pass.
#[derive(Debug, Default)]
pub struct ListenerSupervisor {
    instance: OnceLock<NotificationListener>,
}

impl ListenerSupervisor {
    /// Create an empty supervisor
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared listener, constructing it from `config` on first use
    pub fn get_or_init(&self, config: &ListenerConfig) -> NotificationListener {
        let listener = self
            .instance
            .get_or_init(|| NotificationListener::new(config.clone()));
        if listener.config() != config {
            tracing::warn!(
                requested = ?config,
                active = ?listener.config(),
                "Listener already constructed; ignoring differing config"
            );
        }
        listener.clone()
    }

    /// The shared listener, if constructed
    pub fn get(&self) -> Option<NotificationListener> {
        self.instance.get().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supervisor_identity() {
        let supervisor = ListenerSupervisor::new();
        assert!(supervisor.get().is_none());

        let a = supervisor.get_or_init(&ListenerConfig::localhost(0));
        let b = supervisor.get_or_init(&ListenerConfig::localhost(9999));
        assert!(NotificationListener::ptr_eq(&a, &b));
        assert_eq!(b.config().port, 0);

        a.register("x", |_| Ok(NotificationReply::ok()));
        assert!(b.registry().contains("x"));
    }

    #[test]
    fn test_start_wait_stop_restart() {
        let listener = NotificationListener::new(ListenerConfig::localhost(0));
        assert_eq!(listener.state(), ListenerState::Stopped);

        let addr = listener.start_and_wait().unwrap();
        assert_ne!(addr.port(), 0);
        assert_eq!(listener.state(), ListenerState::Listening);
        assert_eq!(listener.local_addr(), Some(addr));

        let err = listener.start().unwrap_err();
        assert!(matches!(err, OneM2MError::Listener(_)));

        listener.stop().unwrap();
        assert_eq!(listener.state(), ListenerState::Stopped);
        assert!(listener.local_addr().is_none());

        listener.start_and_wait().unwrap();
        listener.stop().unwrap();
    }

    #[test]
    fn test_bind_failure_surfaces() {
        let first = NotificationListener::new(ListenerConfig::localhost(0));
        let addr = first.start_and_wait().unwrap();

        let second = NotificationListener::new(ListenerConfig::localhost(addr.port()));
        second.start().unwrap();
        let err = second.wait_ready(Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, OneM2MError::Listener(msg) if msg.contains("bind")));
        assert_eq!(second.state(), ListenerState::Stopped);

        first.stop().unwrap();
    }

    #[test]
    fn test_stop_when_stopped_is_noop() {
        let listener = NotificationListener::new(ListenerConfig::localhost(0));
        listener.stop().unwrap();
        assert_eq!(listener.state(), ListenerState::Stopped);
    }
}
