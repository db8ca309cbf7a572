//! Team-wide reductions
//!
//! [`TeamReducer`] sums per-index contributions over a half-open range, with
//! every member of a team taking a share of the work and every member
//! receiving the same total.
//!
//! # Modes
//!
//! - [`ReductionMode::Ordered`]: members evaluate contributions for
//!   contiguous shares of the range, the values are gathered, and the total is
//!   folded into `init` in ascending index order. The result is bit-identical
//!   to `init + x[begin] + x[begin + 1] + ...` evaluated left to right, for any
//!   team size.
//! - [`ReductionMode::Tree`]: members fold their share into a local partial
//!   and the partials are combined pairwise. Faster, but the association
//!   order is unspecified, so floating point results can differ from the
//!   ordered sum in the last bits.
//!
//! # Packed sources
//!
//! [`TeamReducer::reduce_packs`] and [`TeamReducer::reduce_view`] read
//! [`Pack`]s while the range stays in scalar indices. Lanes of the first and
//! last pack that fall outside the range are replaced by zero before any
//! arithmetic, so the sentinel values in partial packs never reach the sum.

use crate::error::Error;
use crate::pack::{npack, pairwise_sum, Pack, Scalar};
use crate::view::View;
use cohort_backends::{split_range, TeamMember};
use cohort_tracing::performance::record_reduction;
use num_traits::Zero;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use std::time::Instant;

/// How a team combines contributions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReductionMode {
    /// Strict ascending order, reproducible across team sizes
    #[default]
    Ordered,
    /// Pairwise tree, order unspecified
    Tree,
}

impl ReductionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReductionMode::Ordered => "ordered",
            ReductionMode::Tree => "tree",
        }
    }
}

impl fmt::Display for ReductionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReductionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ordered" | "serial" => Ok(ReductionMode::Ordered),
            "tree" | "fast" => Ok(ReductionMode::Tree),
            _ => Err(Error::InvalidReductionMode(s.to_string())),
        }
    }
}

/// Team-wide sum over an index range
///
/// Every operation is collective: all members of the team call it with the
/// same arguments and all receive the same result.
///
/// # Example
///
/// ```rust
/// use cohort_backends::SerialTeam;
/// use cohort_core::{ReductionMode, TeamReducer};
///
/// let team = SerialTeam::new();
/// let reducer = TeamReducer::new(ReductionMode::Ordered);
/// let sum = reducer.reduce(&team, 0..4, 10, |k| k as i64);
/// assert_eq!(sum, 16);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TeamReducer {
    mode: ReductionMode,
}

impl TeamReducer {
    pub fn new(mode: ReductionMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ReductionMode {
        self.mode
    }

    /// `init` plus `f(k)` for every `k` in `range`
    pub fn reduce<M, T, F>(&self, team: &M, range: Range<usize>, init: T, f: F) -> T
    where
        M: TeamMember,
        T: Scalar,
        F: Fn(usize) -> T,
    {
        debug_assert!(range.start <= range.end, "malformed range {range:?}");
        if range.is_empty() {
            return init;
        }

        let start = Instant::now();
        let share = split_range(range.start, range.end, team.team_rank(), team.team_size());
        let total = match self.mode {
            ReductionMode::Ordered => {
                let values: Vec<T> = share.map(&f).collect();
                team.all_gather(values)
                    .into_iter()
                    .flatten()
                    .fold(init, |acc, value| acc + value)
            }
            ReductionMode::Tree => {
                let partial = share.fold(T::zero(), |acc, k| acc + f(k));
                init + pairwise_sum(&team.all_gather(partial))
            }
        };
        self.record(team, range.len(), start);
        total
    }

    /// `init` plus every scalar lane in `range`, read from packs
    ///
    /// `range` is in scalar indices; `f` is called with pack indices
    /// `range.start / N .. ceil(range.end / N)`.
    pub fn reduce_packs<M, T, const N: usize, F>(&self, team: &M, range: Range<usize>, init: T, f: F) -> T
    where
        M: TeamMember,
        T: Scalar,
        F: Fn(usize) -> Pack<T, N>,
    {
        debug_assert!(range.start <= range.end, "malformed range {range:?}");
        if range.is_empty() {
            return init;
        }

        let start = Instant::now();
        let packs = range.start / N..npack(range.end, N);
        let share = split_range(packs.start, packs.end, team.team_rank(), team.team_size());
        let masked = |p: usize| f(p).masked(lane_window::<N>(p, &range));

        let total = match self.mode {
            ReductionMode::Ordered => {
                let values: Vec<Pack<T, N>> = share.map(masked).collect();
                team.all_gather(values)
                    .iter()
                    .flatten()
                    .zip(packs)
                    .fold(init, |acc, (pack, p)| pack.fold_lanes(lane_window::<N>(p, &range), acc))
            }
            ReductionMode::Tree => {
                let partial = share.fold(Pack::<T, N>::zero(), |acc, p| acc + masked(p));
                init + pairwise_sum(&team.all_gather(partial)).reduce_sum()
            }
        };
        self.record(team, range.len(), start);
        total
    }

    /// [`Self::reduce_packs`] over the packs of `view`
    pub fn reduce_view<M, T, const N: usize>(
        &self,
        team: &M,
        range: Range<usize>,
        init: T,
        view: &View<'_, Pack<T, N>>,
    ) -> T
    where
        M: TeamMember,
        T: Scalar,
    {
        debug_assert!(
            npack(range.end, N) <= view.len(),
            "range {range:?} exceeds a view of {} packs",
            view.len()
        );
        self.reduce_packs(team, range, init, |p| view[p])
    }

    fn record<M: TeamMember>(&self, team: &M, elements: usize, start: Instant) {
        team.single(|| {
            record_reduction(
                self.mode.as_str(),
                elements,
                team.team_size(),
                start.elapsed().as_micros() as u64,
            )
        });
    }
}

/// Lanes of pack `p` whose scalar index lies in `range`
fn lane_window<const N: usize>(p: usize, range: &Range<usize>) -> Range<usize> {
    let first = p * N;
    range.start.saturating_sub(first)..range.end.saturating_sub(first).min(N)
}
