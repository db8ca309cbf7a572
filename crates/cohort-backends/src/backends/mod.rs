//! Team handle implementations
//!
//! - `cpu` - thread-backed teams driven by [`CpuLauncher`]
//! - `serial` - a team of one, for serial callers and tests

pub mod cpu;
pub mod serial;

pub use cpu::{CpuLauncher, CpuTeamMember};
pub use serial::SerialTeam;
