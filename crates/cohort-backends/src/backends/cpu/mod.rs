//! CPU league launcher
//!
//! Runs a league of teams on host threads.
//!
//! # Architecture
//!
//! ```text
//! CpuLauncher::parallel_for(policy, body)
//! └── rayon pool, one worker per crew (W = concurrent teams)
//!     └── crew w: team_size member threads (std::thread::scope)
//!         └── teams w, w + W, w + 2W, ... run back to back,
//!             separated by a team barrier
//! ```
//!
//! Each crew keeps its member threads alive across the teams it runs, so a
//! launch spawns `W * team_size` threads no matter how large the league is.
//! Crews pick teams round-robin, which bounds the number of teams any single
//! crew runs at `ceil(league_size / W)`.
//!
//! # Usage
//!
//! ```rust
//! use cohort_backends::{CpuLauncher, DeviceProfile, TeamMember, TeamPolicy};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let launcher = CpuLauncher::new(DeviceProfile::threads(4));
//! let policy = TeamPolicy::new(16, 2)?;
//!
//! let visits = AtomicUsize::new(0);
//! launcher.parallel_for(&policy, |member| {
//!     member.single(|| {
//!         visits.fetch_add(1, Ordering::Relaxed);
//!     });
//! })?;
//! assert_eq!(visits.into_inner(), 16);
//! # Ok(())
//! # }
//! ```

mod team;

pub use team::CpuTeamMember;

use crate::backend::TeamPolicy;
use crate::device::DeviceProfile;
use crate::error::{BackendError, Result};
use cohort_tracing::perf_span;
use cohort_tracing::performance::record_launch;
use rayon::prelude::*;
use std::time::Instant;
use team::{PoisonOnPanic, TeamShared};

/// Launches leagues of thread-backed teams
#[derive(Debug, Clone)]
pub struct CpuLauncher {
    device: DeviceProfile,
}

impl CpuLauncher {
    /// Create a launcher for `device`
    pub fn new(device: DeviceProfile) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &DeviceProfile {
        &self.device
    }

    /// Number of teams this launcher keeps in flight for `policy`
    ///
    /// `concurrency / team_size`, at least one, never more than the league.
    pub fn concurrent_teams(&self, policy: &TeamPolicy) -> usize {
        (self.device.concurrency() / policy.team_size())
            .max(1)
            .min(policy.league_size())
    }

    /// Run `body` once on every member of every team in the league
    ///
    /// Returns after every team has completed.
    pub fn parallel_for<F>(&self, policy: &TeamPolicy, body: F) -> Result<()>
    where
        F: Fn(&CpuTeamMember<'_>) + Sync,
    {
        let crews = self.concurrent_teams(policy);
        let _span = perf_span!(
            "cpu_parallel_for",
            league_size = policy.league_size(),
            team_size = policy.team_size(),
            crews = crews
        );
        let start = Instant::now();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(crews)
            .thread_name(|index| format!("cohort-crew-{index}"))
            .build()
            .map_err(|err| BackendError::ThreadPool(err.to_string()))?;

        pool.install(|| {
            (0..crews)
                .into_par_iter()
                .for_each(|crew| self.run_crew(crew, crews, policy, &body));
        });

        record_launch(
            policy.league_size(),
            policy.team_size(),
            crews,
            start.elapsed().as_micros() as u64,
        );
        Ok(())
    }

    fn run_crew<F>(&self, crew: usize, crews: usize, policy: &TeamPolicy, body: &F)
    where
        F: Fn(&CpuTeamMember<'_>) + Sync,
    {
        let league_size = policy.league_size();
        let team_size = policy.team_size();
        let shared = TeamShared::new(team_size);

        let run_member = |team_rank: usize| {
            let _poison = PoisonOnPanic(&shared);
            for league_rank in (crew..league_size).step_by(crews) {
                let member = CpuTeamMember::new(league_rank, league_size, team_rank, team_size, &shared, &self.device);
                body(&member);
                shared.barrier.wait();
            }
        };

        if team_size == 1 {
            run_member(0);
            return;
        }

        std::thread::scope(|scope| {
            let run_member = &run_member;
            for team_rank in 1..team_size {
                scope.spawn(move || run_member(team_rank));
            }
            run_member(0);
        });
    }
}

impl Default for CpuLauncher {
    fn default() -> Self {
        Self::new(DeviceProfile::detect())
    }
}
