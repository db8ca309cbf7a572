//! Team handle trait
//!
//! Everything above this crate (slot allocation, team reductions) talks to a
//! running team only through [`TeamMember`]. A launcher hands one handle to
//! every execution unit of every team.
//!
//! # Collective calls
//!
//! [`TeamMember::barrier`], [`TeamMember::broadcast_from`] and
//! [`TeamMember::all_gather`] are collective: every member of the team must
//! make the same sequence of collective calls. Skipping one, or calling them
//! in a different order on different members, is a contract violation. It may
//! deadlock the team, and thread-backed implementations panic when they can
//! detect the mismatch.
//!
//! ```text
//!   member 0        member 1        member 2
//!      │               │               │
//!   f() ─┐             │               │        broadcast_from(0, f)
//!      ──┴──── barrier ┴────── barrier ┴──
//!      v               v               v        every member reads v
//! ```

use crate::device::DeviceProfile;

/// Handle one execution unit holds on its team
pub trait TeamMember {
    /// Rank of this team within the league, in `[0, league_size)`
    fn league_rank(&self) -> usize;

    /// Number of teams in the league
    fn league_size(&self) -> usize;

    /// Rank of this execution unit within its team, in `[0, team_size)`
    fn team_rank(&self) -> usize;

    /// Number of execution units in the team
    fn team_size(&self) -> usize;

    /// Profile of the device the league runs on
    fn device(&self) -> &DeviceProfile;

    /// Block until every member of the team has arrived
    fn barrier(&self);

    /// Member `root` computes a value with `f`; every member returns it.
    ///
    /// `f` runs only on `root`. The call ends with a barrier, so no member
    /// leaves before the value is visible to all.
    fn broadcast_from<T, F>(&self, root: usize, f: F) -> T
    where
        T: Clone + Send + 'static,
        F: FnOnce() -> T;

    /// Every member contributes `value`; every member returns all
    /// contributions ordered by team rank.
    fn all_gather<T>(&self, value: T) -> Vec<T>
    where
        T: Clone + Send + 'static;

    /// Run `f` on member 0 only. Not collective; no barrier.
    fn single<F: FnOnce()>(&self, f: F) {
        if self.team_rank() == 0 {
            f();
        }
    }

    /// True on the member that runs [`TeamMember::single`] bodies
    fn is_leader(&self) -> bool {
        self.team_rank() == 0
    }
}

/// Contiguous share of `[begin, end)` owned by `rank` out of `parts`.
///
/// Shares are ordered by rank and differ in length by at most one, with the
/// longer shares first. Concatenating the shares of ranks `0..parts`
/// reproduces the whole range.
///
/// ```rust
/// use cohort_backends::backend::split_range;
///
/// assert_eq!(split_range(0, 10, 0, 3), 0..4);
/// assert_eq!(split_range(0, 10, 1, 3), 4..7);
/// assert_eq!(split_range(0, 10, 2, 3), 7..10);
/// ```
pub fn split_range(begin: usize, end: usize, rank: usize, parts: usize) -> std::ops::Range<usize> {
    debug_assert!(parts >= 1 && rank < parts);
    let len = end.saturating_sub(begin);
    let base = len / parts;
    let extra = len % parts;
    let start = begin + rank * base + rank.min(extra);
    let stop = start + base + usize::from(rank < extra);
    start..stop
}
