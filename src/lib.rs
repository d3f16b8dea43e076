//! SoberGuard interlock library.
//!
//! Exposes the domain core and the host adapters for the binary and for
//! integration testing.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod link;
pub mod runtime;
pub mod scheduler;
pub mod sensors;
pub mod shutdown;
pub mod vision;
