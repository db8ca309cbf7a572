//! Thread-backed team handles
//!
//! Every member of a CPU team is an OS thread. Members of one team share a
//! [`TeamShared`] block holding the barrier and the exchange cells used by
//! broadcast and gather. The block is reused by every team a crew runs.

use crate::backend::TeamMember;
use crate::device::DeviceProfile;
use parking_lot::{Condvar, Mutex};
use std::any::Any;

type Cell = Option<Box<dyn Any + Send>>;

const COLLECTIVE_MISMATCH: &str = "team members disagree on the sequence of collective calls";

struct BarrierState {
    arrived: usize,
    generation: u64,
    poisoned: bool,
}

/// Reusable generation-counting barrier
pub(crate) struct TeamBarrier {
    size: usize,
    state: Mutex<BarrierState>,
    cvar: Condvar,
}

impl TeamBarrier {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            size,
            state: Mutex::new(BarrierState {
                arrived: 0,
                generation: 0,
                poisoned: false,
            }),
            cvar: Condvar::new(),
        }
    }

    pub(crate) fn wait(&self) {
        if self.size == 1 {
            return;
        }

        let mut state = self.state.lock();
        if state.poisoned {
            drop(state);
            panic!("team barrier poisoned: a team member panicked");
        }

        let generation = state.generation;
        state.arrived += 1;
        if state.arrived == self.size {
            state.arrived = 0;
            state.generation = state.generation.wrapping_add(1);
            self.cvar.notify_all();
            return;
        }

        while state.generation == generation && !state.poisoned {
            self.cvar.wait(&mut state);
        }
        if state.generation == generation {
            drop(state);
            panic!("team barrier poisoned: a team member panicked");
        }
    }

    /// Release every waiter with a panic so a failing member cannot hang its team
    pub(crate) fn poison(&self) {
        self.state.lock().poisoned = true;
        self.cvar.notify_all();
    }
}

/// State shared by the members of one team
pub(crate) struct TeamShared {
    pub(crate) barrier: TeamBarrier,
    broadcast: Mutex<Cell>,
    gather: Mutex<Vec<Cell>>,
}

impl TeamShared {
    pub(crate) fn new(team_size: usize) -> Self {
        Self {
            barrier: TeamBarrier::new(team_size),
            broadcast: Mutex::new(None),
            gather: Mutex::new((0..team_size).map(|_| None).collect()),
        }
    }
}

/// Poisons the team barrier if the owning member thread unwinds
pub(crate) struct PoisonOnPanic<'a>(pub(crate) &'a TeamShared);

impl Drop for PoisonOnPanic<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.barrier.poison();
        }
    }
}

/// Handle held by one member thread of a CPU team
pub struct CpuTeamMember<'a> {
    league_rank: usize,
    league_size: usize,
    team_rank: usize,
    team_size: usize,
    shared: &'a TeamShared,
    device: &'a DeviceProfile,
}

impl<'a> CpuTeamMember<'a> {
    pub(crate) fn new(
        league_rank: usize,
        league_size: usize,
        team_rank: usize,
        team_size: usize,
        shared: &'a TeamShared,
        device: &'a DeviceProfile,
    ) -> Self {
        Self {
            league_rank,
            league_size,
            team_rank,
            team_size,
            shared,
            device,
        }
    }
}

impl TeamMember for CpuTeamMember<'_> {
    fn league_rank(&self) -> usize {
        self.league_rank
    }

    fn league_size(&self) -> usize {
        self.league_size
    }

    fn team_rank(&self) -> usize {
        self.team_rank
    }

    fn team_size(&self) -> usize {
        self.team_size
    }

    fn device(&self) -> &DeviceProfile {
        self.device
    }

    fn barrier(&self) {
        self.shared.barrier.wait();
    }

    fn broadcast_from<T, F>(&self, root: usize, f: F) -> T
    where
        T: Clone + Send + 'static,
        F: FnOnce() -> T,
    {
        debug_assert!(root < self.team_size);
        if self.team_size == 1 {
            return f();
        }

        if self.team_rank == root {
            let value = f();
            *self.shared.broadcast.lock() = Some(Box::new(value));
        }
        self.shared.barrier.wait();

        let value = self
            .shared
            .broadcast
            .lock()
            .as_ref()
            .and_then(|cell| cell.downcast_ref::<T>())
            .cloned();
        // The cell is left filled: the next root may already be writing to it.
        self.shared.barrier.wait();

        match value {
            Some(value) => value,
            None => panic!("broadcast_from: {COLLECTIVE_MISMATCH}"),
        }
    }

    fn all_gather<T>(&self, value: T) -> Vec<T>
    where
        T: Clone + Send + 'static,
    {
        if self.team_size == 1 {
            return vec![value];
        }

        self.shared.gather.lock()[self.team_rank] = Some(Box::new(value));
        self.shared.barrier.wait();

        let gathered: Option<Vec<T>> = self
            .shared
            .gather
            .lock()
            .iter()
            .map(|cell| cell.as_ref().and_then(|c| c.downcast_ref::<T>()).cloned())
            .collect();
        self.shared.barrier.wait();

        self.shared.gather.lock()[self.team_rank] = None;

        match gathered {
            Some(values) => values,
            None => panic!("all_gather: {COLLECTIVE_MISMATCH}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn run_team<F>(team_size: usize, body: F)
    where
        F: Fn(&CpuTeamMember<'_>) + Sync,
    {
        let shared = TeamShared::new(team_size);
        let device = DeviceProfile::threads(team_size);
        std::thread::scope(|s| {
            for rank in 0..team_size {
                let shared = &shared;
                let device = &device;
                let body = &body;
                s.spawn(move || {
                    let _poison = PoisonOnPanic(shared);
                    body(&CpuTeamMember::new(0, 1, rank, team_size, shared, device));
                });
            }
        });
    }

    #[test]
    fn test_barrier_orders_phases() {
        let arrived = AtomicUsize::new(0);
        run_team(4, |member| {
            arrived.fetch_add(1, Ordering::SeqCst);
            member.barrier();
            assert_eq!(arrived.load(Ordering::SeqCst), 4);
            member.barrier();
        });
    }

    #[test]
    fn test_broadcast_reaches_every_member() {
        let calls = AtomicUsize::new(0);
        run_team(5, |member| {
            for round in 0..10usize {
                let root = round % member.team_size();
                let value = member.broadcast_from(root, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    round * 100 + member.team_rank()
                });
                assert_eq!(value, round * 100 + root);
            }
        });
        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_all_gather_orders_by_rank() {
        run_team(3, |member| {
            let values = member.all_gather(member.team_rank() as f64 * 0.5);
            assert_eq!(values, vec![0.0, 0.5, 1.0]);
            let names = member.all_gather(format!("m{}", member.team_rank()));
            assert_eq!(names, vec!["m0", "m1", "m2"]);
        });
    }

    #[test]
    #[should_panic]
    fn test_panicking_member_poisons_barrier() {
        run_team(2, |member| {
            if member.team_rank() == 1 {
                panic!("boom");
            }
            member.barrier();
        });
    }
}
