//! Session application services.
//!
//! This module contains the session manager and the two primitives it is
//! built on: deadline-guarded remote calls and a single-flight gate.

mod config;
mod deadline;
mod manager;
mod single_flight;

pub use config::SessionConfig;
pub use deadline::with_deadline;
pub use manager::SessionManager;
pub use single_flight::{FlightRole, SingleFlight};
