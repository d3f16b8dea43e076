//! Serial link plumbing shared by the sensor input and the relay output.
//!
//! ```text
//!  ┌───────────┐  bytes  ┌─────────────┐  lines  ┌───────────────┐
//!  │ Transport │───────▶│ LineDecoder │───────▶│ SensorChannel │
//!  │  (trait)  │◀───────┤             │        └───────────────┘
//!  └───────────┘  bytes  └─────────────┘
//!        ▲
//!        └──────────── ActuatorLink (newline-terminated commands)
//! ```

pub mod codec;
pub mod transport;
