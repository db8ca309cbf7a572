//! # cohort-core - Team workspaces and team reductions
//!
//! Building blocks for hierarchical parallel kernels, where a league of teams
//! is launched and each team of cooperating execution units works on one
//! outer index.
//!
//! ## What it provides
//!
//! - [`TeamPolicyFactory`]: picks the team size for a workload shape and
//!   device
//! - [`WorkspaceSlotAllocator`]: lets a league share a pool of scratch
//!   regions sized from the device's concurrency instead of the league size
//! - [`TeamReducer`]: team-wide sums, either bit-reproducible
//!   ([`ReductionMode::Ordered`]) or pairwise ([`ReductionMode::Tree`]), over
//!   scalars or SIMD [`Pack`]s with boundary lanes masked
//!
//! ## Architecture
//!
//! ```text
//! TeamPolicyFactory ──► TeamPolicy ──► WorkspaceSlotAllocator
//!                           │
//!                           ▼
//!                 CpuLauncher::parallel_for
//!                           │  per team:
//!                           ├── claim(team)   → slot
//!                           ├── TeamReducer::reduce(team, ...)
//!                           └── release(team, slot)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use cohort_backends::{CpuLauncher, DeviceProfile, TeamMember};
//! use cohort_core::{ReductionMode, TeamPolicyFactory, TeamReducer, WorkspaceSlotAllocator};
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let device = DeviceProfile::threads(4).with_mimic_simt(true);
//! let policy = TeamPolicyFactory::new(device.clone()).forced_policy(16, 2)?;
//! let slots = WorkspaceSlotAllocator::new(&policy, &device)?;
//! let reducer = TeamReducer::new(ReductionMode::Ordered);
//!
//! let total = AtomicU64::new(0);
//! CpuLauncher::new(device).parallel_for(&policy, |team| {
//!     slots.with_slot(team, |_slot| {
//!         let sum: u64 = reducer.reduce(team, 0..10, 0, |k| k as u64);
//!         team.single(|| {
//!             total.fetch_add(sum, Ordering::Relaxed);
//!         });
//!     });
//! })?;
//! assert_eq!(total.into_inner(), 16 * 45);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod pack;
pub mod policy;
pub mod reduce;
pub mod view;
pub mod workspace;

// Re-export primary types
pub use error::{Error, Result};
pub use pack::{cast_packs, npack, pack_scalars, Pack, Scalar};
pub use policy::{TeamPolicyFactory, MIMIC_SIMT_MAX_TEAM_SIZE};
pub use reduce::{ReductionMode, TeamReducer};
pub use view::{MemoryTraits, View};
pub use workspace::WorkspaceSlotAllocator;
