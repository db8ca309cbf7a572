//! Team policy sizing
//!
//! Chooses how many execution units form a team for a given workload shape.
//!
//! - **Wide-SIMT devices**: the smallest power of two covering the inner
//!   work (counted in packs), capped at the device's maximum team size.
//!   With the default cap of 128, 42 inner items give teams of 64 while
//!   122, 128 and 255 all give 128.
//! - **Other devices**: teams of one, unless the device profile asks to
//!   mimic SIMT sizing, in which case teams take up to
//!   [`MIMIC_SIMT_MAX_TEAM_SIZE`] host threads.

use crate::error::Result;
use cohort_backends::{DeviceProfile, TeamPolicy};

/// Team size cap used when a host device mimics SIMT sizing
pub const MIMIC_SIMT_MAX_TEAM_SIZE: usize = 7;

/// Builds [`TeamPolicy`] values for one device
///
/// # Example
///
/// ```rust
/// use cohort_backends::DeviceProfile;
/// use cohort_core::TeamPolicyFactory;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let factory = TeamPolicyFactory::new(DeviceProfile::simt(80 * 2048));
/// assert_eq!(factory.default_policy(1000, 42)?.team_size(), 64);
/// assert_eq!(factory.default_policy(1000, 128)?.team_size(), 128);
/// assert_eq!(factory.forced_policy(1000, 3)?.team_size(), 3);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TeamPolicyFactory {
    device: DeviceProfile,
}

impl TeamPolicyFactory {
    pub fn new(device: DeviceProfile) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &DeviceProfile {
        &self.device
    }

    /// Heuristic policy for `num_teams` teams each covering
    /// `inner_work_items` scalars of inner work
    pub fn default_policy(&self, num_teams: usize, inner_work_items: usize) -> Result<TeamPolicy> {
        let team_size = self.default_team_size(inner_work_items);
        let policy = TeamPolicy::new(num_teams, team_size)?;
        tracing::debug!(
            device = %self.device,
            inner_work_items,
            policy = %policy,
            "default team policy"
        );
        Ok(policy)
    }

    /// Policy with exactly `team_size` units per team, bypassing heuristics
    pub fn forced_policy(&self, num_teams: usize, team_size: usize) -> Result<TeamPolicy> {
        let policy = TeamPolicy::new(num_teams, team_size)?;
        tracing::debug!(device = %self.device, policy = %policy, "forced team policy");
        Ok(policy)
    }

    /// Team size [`Self::default_policy`] picks for `inner_work_items`
    pub fn default_team_size(&self, inner_work_items: usize) -> usize {
        let device = &self.device;
        if device.is_wide_simt() {
            let cap = device.max_team_size();
            let lanes = inner_work_items.div_ceil(device.pack_width()).clamp(1, cap);
            lanes.checked_next_power_of_two().unwrap_or(cap).min(cap)
        } else if device.mimic_simt() {
            device.concurrency().min(MIMIC_SIMT_MAX_TEAM_SIZE)
        } else {
            1
        }
    }
}
