//! Launch shape types

use crate::error::{BackendError, Result};
use std::fmt;

/// Shape of a league launch: how many teams, and how many execution units
/// cooperate inside each team.
///
/// Immutable once built; both dimensions are at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TeamPolicy {
    league_size: usize,
    team_size: usize,
}

impl TeamPolicy {
    /// Create a policy, rejecting zero dimensions
    ///
    /// # Example
    ///
    /// ```rust
    /// use cohort_backends::TeamPolicy;
    ///
    /// let policy = TeamPolicy::new(1000, 64).unwrap();
    /// assert_eq!(policy.total_units(), 64_000);
    /// assert!(TeamPolicy::new(0, 64).is_err());
    /// ```
    pub fn new(league_size: usize, team_size: usize) -> Result<Self> {
        if league_size == 0 || team_size == 0 {
            return Err(BackendError::InvalidTeamPolicy {
                league_size,
                team_size,
            });
        }
        Ok(Self {
            league_size,
            team_size,
        })
    }

    /// Number of teams in the league
    pub const fn league_size(&self) -> usize {
        self.league_size
    }

    /// Execution units per team
    pub const fn team_size(&self) -> usize {
        self.team_size
    }

    /// Execution units across the whole league
    pub const fn total_units(&self) -> usize {
        self.league_size * self.team_size
    }
}

impl fmt::Display for TeamPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "league={}, team={}", self.league_size, self.team_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_policy() {
        let policy = TeamPolicy::new(12, 4).unwrap();
        assert_eq!(policy.league_size(), 12);
        assert_eq!(policy.team_size(), 4);
        assert_eq!(policy.total_units(), 48);
        assert_eq!(policy.to_string(), "league=12, team=4");
    }

    #[test]
    fn test_team_policy_rejects_zero() {
        assert!(matches!(
            TeamPolicy::new(0, 1),
            Err(BackendError::InvalidTeamPolicy {
                league_size: 0,
                team_size: 1
            })
        ));
        assert!(TeamPolicy::new(1, 0).is_err());
    }
}
