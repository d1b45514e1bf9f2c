//! Simulated GPIO backend.
//!
//! Implements [`GpioPort`] in memory so the daemon and tests run on any host.
//! Behaves like the Raspberry Pi GPIO library it stands in for:
//!
//! - reading or watching a pin that was never configured is an error;
//! - installing edge detection on a pin that already has it is an error
//!   (callers unregister first);
//! - edges arriving within the bounce interval of the last delivered edge
//!   are swallowed.
//!
//! [`SimGpio::set_level`] drives a pin and fires the matching callback on the
//! calling thread, the way an interrupt thread would.

use core::time::Duration;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_hal::digital::PinState;
use log::debug;

use crate::app::ports::{EdgeCallback, GpioError, GpioPort};
use crate::pins::{Edge, PinNumbering, Pull};

type SharedCallback = Arc<dyn Fn(i32) + Send + Sync + 'static>;

struct EdgeWatch {
    edge: Edge,
    bounce: Duration,
    callback: SharedCallback,
    last_delivered: Option<Instant>,
}

impl EdgeWatch {
    fn matches(&self, from: PinState, to: PinState) -> bool {
        match self.edge {
            Edge::Both => from != to,
            Edge::Rising => from == PinState::Low && to == PinState::High,
            Edge::Falling => from == PinState::High && to == PinState::Low,
        }
    }
}

struct SimPin {
    level: PinState,
    watch: Option<EdgeWatch>,
}

#[derive(Default)]
struct SimState {
    numbering: Option<PinNumbering>,
    pins: BTreeMap<i32, SimPin>,
}

/// In-memory GPIO bank.
pub struct SimGpio {
    state: Mutex<CriticalSectionRawMutex, RefCell<SimState>>,
}

impl Default for SimGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl SimGpio {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(SimState::default())),
        }
    }

    /// Drive `pin` to `level`.  Fires the edge callback (if any, and if not
    /// inside the bounce window) on the calling thread.  Returns whether a
    /// callback fired.
    pub fn set_level(&self, pin: i32, level: PinState) -> bool {
        let callback = self.state.lock(|s| {
            let mut s = s.borrow_mut();
            let sim = s.pins.get_mut(&pin)?;
            let previous = core::mem::replace(&mut sim.level, level);
            let watch = sim.watch.as_mut()?;
            if !watch.matches(previous, level) {
                return None;
            }
            let now = Instant::now();
            if let Some(last) = watch.last_delivered {
                if now.duration_since(last) < watch.bounce {
                    debug!("sim gpio: edge on pin {} within bounce window", pin);
                    return None;
                }
            }
            watch.last_delivered = Some(now);
            Some(Arc::clone(&watch.callback))
        });

        match callback {
            Some(callback) => {
                callback(pin);
                true
            }
            None => false,
        }
    }

    /// Current numbering scheme, if one was selected.
    pub fn numbering(&self) -> Option<PinNumbering> {
        self.state.lock(|s| s.borrow().numbering)
    }

    /// Whether `pin` currently has edge detection installed.
    pub fn is_watched(&self, pin: i32) -> bool {
        self.state
            .lock(|s| s.borrow().pins.get(&pin).is_some_and(|p| p.watch.is_some()))
    }
}

impl GpioPort for SimGpio {
    fn set_numbering(&self, mode: PinNumbering) -> Result<(), GpioError> {
        self.state.lock(|s| s.borrow_mut().numbering = Some(mode));
        Ok(())
    }

    fn configure_input(&self, pin: i32, pull: Pull) -> Result<(), GpioError> {
        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            if s.numbering.is_none() {
                return Err(GpioError::SetupFailed(pin));
            }
            let idle = match pull {
                Pull::Down => PinState::Low,
                Pull::Up | Pull::None => PinState::High,
            };
            s.pins
                .entry(pin)
                .or_insert(SimPin { level: idle, watch: None });
            Ok(())
        })
    }

    fn read(&self, pin: i32) -> Result<PinState, GpioError> {
        self.state.lock(|s| {
            s.borrow()
                .pins
                .get(&pin)
                .map(|p| p.level)
                .ok_or(GpioError::ReadFailed(pin))
        })
    }

    fn register_edge_callback(
        &self,
        pin: i32,
        edge: Edge,
        bounce: Duration,
        callback: EdgeCallback,
    ) -> Result<(), GpioError> {
        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            let sim = s.pins.get_mut(&pin).ok_or(GpioError::EdgeDetectFailed(pin))?;
            if sim.watch.is_some() {
                return Err(GpioError::EdgeDetectFailed(pin));
            }
            sim.watch = Some(EdgeWatch {
                edge,
                bounce,
                callback: Arc::from(callback),
                last_delivered: None,
            });
            Ok(())
        })
    }

    fn unregister_edge_callback(&self, pin: i32) {
        let removed = self.state.lock(|s| {
            s.borrow_mut()
                .pins
                .get_mut(&pin)
                .and_then(|p| p.watch.take())
        });
        // Callbacks hold monitor handles; release them outside the lock.
        drop(removed);
    }
}
