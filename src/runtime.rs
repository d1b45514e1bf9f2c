//! Edge runtime: executor thread for debounce tasks.
//!
//! GPIO edge callbacks arrive on the backend's interrupt context and must
//! return immediately.  Each callback spawns a debounce task here instead;
//! the task sleeps on an `async-io-mini` reactor timer, so any number of
//! pending debounces (across both sensors) share one thread without one
//! sensor's wait delaying the other.
//!
//! ```text
//!  ┌──────────────┐  spawn   ┌──────────────────────────────────────┐
//!  │ GPIO edge    │────────▶│  edge-runtime thread                  │
//!  │ callback     │         │  futures_lite::future::block_on       │
//!  └──────────────┘         │  ┌──────────────────────────────────┐ │
//!  ┌──────────────┐  drop   │  │ edge_executor::Executor          │ │
//!  │ disarm()     │────────▶│  │  debounce ⏱  debounce ⏱  ...     │ │
//!  └──────────────┘ (cancel)│  └──────────────────────────────────┘ │
//!                           └──────────────────────────────────────┘
//! ```
//!
//! Dropping a returned [`Task`] cancels it at its next suspension point.

use std::sync::Arc;
use std::thread;

use edge_executor::{Executor, Task};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::info;

use crate::error::{Error, Result};

/// Depth of the executor's run queue.  Power of two.
pub const RUN_QUEUE_DEPTH: usize = 64;

type SharedExecutor = Arc<Executor<'static, RUN_QUEUE_DEPTH>>;
type StopSignal = Arc<Signal<CriticalSectionRawMutex, ()>>;

struct Shared {
    executor: SharedExecutor,
    stop: StopSignal,
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.stop.signal(());
    }
}

/// Handle to the executor thread.  Cheap to clone; the thread exits when
/// the last handle is dropped.
#[derive(Clone)]
pub struct EdgeRuntime {
    shared: Arc<Shared>,
}

impl EdgeRuntime {
    /// Spawn the executor thread.
    pub fn start() -> Result<Self> {
        let executor: SharedExecutor = Arc::new(Executor::new());
        let stop: StopSignal = Arc::new(Signal::new());

        let worker = Arc::clone(&executor);
        let worker_stop = Arc::clone(&stop);
        thread::Builder::new()
            .name("edge-runtime".into())
            .spawn(move || {
                futures_lite::future::block_on(worker.run(async move {
                    worker_stop.wait().await;
                }));
                info!("edge runtime stopped");
            })
            .map_err(|_| Error::Runtime("failed to spawn edge runtime thread"))?;

        info!("edge runtime started (run queue depth {})", RUN_QUEUE_DEPTH);
        Ok(Self {
            shared: Arc::new(Shared { executor, stop }),
        })
    }

    /// Schedule `fut` on the executor thread.
    pub fn spawn<F>(&self, fut: F) -> Task<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.shared.executor.spawn(fut)
    }
}
