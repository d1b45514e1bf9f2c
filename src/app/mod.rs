//! Application core: lifecycle coordination and the port boundary.
//!
//! The [`coordinator`] reacts to host print-lifecycle events by arming and
//! disarming the sensor monitors.  All interaction with hardware and the
//! printer happens through **port traits** defined in [`ports`], keeping
//! this layer testable without real peripherals.

pub mod coordinator;
pub mod events;
pub mod ports;
