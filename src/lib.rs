//! Client protocol layer for the PgQ transactional queue
//!
//! [`queue`] holds the protocol itself, [`core`] the shared infrastructure
//! (logging, error reporting, validation, build metadata) and [`app`] the
//! `pgqctl` command-line front end.

pub mod app;
pub mod core;
pub mod queue;
