//! Execution backends for cohort team kernels
//!
//! This crate provides:
//! - **Device profiles**: what kind of hardware a league runs on and how many
//!   execution units it can keep in flight
//! - **Team policies**: the `(league_size, team_size)` shape of a launch
//! - **Team handles**: the [`TeamMember`] trait (rank, barrier, broadcast,
//!   gather) and its thread-backed and serial implementations
//! - **CPU launcher**: runs a league of teams on host threads
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │   cohort-core (policy factory, slot           │
//! │   allocator, team reducer)                    │
//! └──────────────────────┬───────────────────────┘
//!                        │ TeamMember + DeviceProfile
//!                        ▼
//! ┌──────────────────────────────────────────────┐
//! │                cohort-backends                │
//! │   CpuLauncher ── CpuTeamMember   SerialTeam   │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust
//! use cohort_backends::{CpuLauncher, DeviceProfile, TeamMember, TeamPolicy};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let launcher = CpuLauncher::new(DeviceProfile::threads(2));
//! let policy = TeamPolicy::new(4, 2)?;
//! launcher.parallel_for(&policy, |member| {
//!     let leader_rank = member.broadcast_from(0, || member.team_rank());
//!     assert_eq!(leader_rank, 0);
//! })?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod backends;
pub mod device;
pub mod error;

pub use backend::{split_range, TeamMember, TeamPolicy};
pub use backends::{CpuLauncher, CpuTeamMember, SerialTeam};
pub use device::{DeviceKind, DeviceProfile, DEFAULT_MAX_TEAM_SIZE};
pub use error::{BackendError, Result};
