//! `pgqctl` application layer

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
#[cfg(feature = "postgres")]
pub mod startup;
