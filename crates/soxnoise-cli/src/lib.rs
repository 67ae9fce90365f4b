//! sox-noise controller library.
//!
//! Connects the parameter model to the process supervisor: front-end events
//! go through the [`coalescer::UpdateCoalescer`], whose directives the
//! [`controller::Controller`] carries out. The binary drives a headless
//! session over stdin.

pub mod cli_args;
pub mod coalescer;
pub mod controller;
pub mod events;
pub mod input;
pub mod keymap;
pub mod session;
pub mod settings;
pub mod signals;

pub use coalescer::{Directive, UpdateCoalescer};
pub use controller::{Controller, ControllerConfig, Notice};
pub use events::{Command, DiscreteAction, Event, FilePurpose, FileRequest};
