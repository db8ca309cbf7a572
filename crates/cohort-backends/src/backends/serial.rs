//! Single-member team
//!
//! A team of exactly one execution unit. Collective calls degenerate to
//! plain function calls, which makes it the handle of choice for serial
//! callers and for unit tests of team algorithms.

use crate::backend::TeamMember;
use crate::device::DeviceProfile;

/// Team handle for a team of one
#[derive(Debug, Clone)]
pub struct SerialTeam {
    league_rank: usize,
    league_size: usize,
    device: DeviceProfile,
}

impl SerialTeam {
    /// The only team of a one-team league
    pub fn new() -> Self {
        Self::with_rank(0, 1)
    }

    /// Team `league_rank` of a league of `league_size` teams
    pub fn with_rank(league_rank: usize, league_size: usize) -> Self {
        debug_assert!(league_rank < league_size);
        Self {
            league_rank,
            league_size,
            device: DeviceProfile::serial(),
        }
    }
}

impl Default for SerialTeam {
    fn default() -> Self {
        Self::new()
    }
}

impl TeamMember for SerialTeam {
    fn league_rank(&self) -> usize {
        self.league_rank
    }

    fn league_size(&self) -> usize {
        self.league_size
    }

    fn team_rank(&self) -> usize {
        0
    }

    fn team_size(&self) -> usize {
        1
    }

    fn device(&self) -> &DeviceProfile {
        &self.device
    }

    fn barrier(&self) {}

    fn broadcast_from<T, F>(&self, root: usize, f: F) -> T
    where
        T: Clone + Send + 'static,
        F: FnOnce() -> T,
    {
        debug_assert_eq!(root, 0, "a serial team has a single member");
        f()
    }

    fn all_gather<T>(&self, value: T) -> Vec<T>
    where
        T: Clone + Send + 'static,
    {
        vec![value]
    }
}
