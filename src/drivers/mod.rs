//! Device-facing drivers: the camera capture contract and the relay link.

pub mod camera;
pub mod relay;
