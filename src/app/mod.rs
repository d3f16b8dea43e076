//! Application core: domain orchestration behind port traits.
//!
//! This module contains the business rules of the interlock: driving the
//! control FSM, performing captures for it, and enforcing the relay
//! safety rule before any command leaves the process.  All interaction
//! with devices happens through **port traits** defined in [`ports`],
//! keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
