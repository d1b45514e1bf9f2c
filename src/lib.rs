//! Filament sensor monitor library.
//!
//! Debounced watching of two filament switches ("nonuniform" and
//! "overfill") during a print job.  The hardware, the printer channel and
//! the settings store sit behind the port traits in [`app::ports`]; the
//! binary wires in the host adapters from [`adapters`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod pins;
pub mod runtime;
pub mod sensors;
