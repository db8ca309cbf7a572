//! Workspace slot allocation
//!
//! A league may launch far more teams than the device can run at once. Each
//! running team needs scratch memory, but reserving one region per team would
//! waste memory proportional to the league. [`WorkspaceSlotAllocator`] sizes a
//! small pool of slot indices from the device's concurrency estimate and hands
//! them out to teams as they start, so callers only keep `num_slots` regions.
//!
//! # Protocol
//!
//! ```text
//! let slot = allocator.claim(&team);   // collective, may spin
//! ... use workspace region `slot` ...
//! allocator.release(&team, slot);      // collective
//! ```
//!
//! Every member of a team calls both operations and receives the same slot.
//! Claiming twice without releasing, releasing a slot the team does not hold,
//! or skipping the release are caller errors. They are checked only by debug
//! assertions. [`WorkspaceSlotAllocator::with_slot`] pairs the two calls and
//! also frees the slot if the team panics while holding it.

use crate::error::{Error, Result};
use cohort_backends::{DeviceProfile, TeamMember, TeamPolicy};
use std::sync::atomic::{AtomicBool, Ordering};

/// Fixed pool of workspace slot indices shared by the teams of one league
#[derive(Debug)]
pub struct WorkspaceSlotAllocator {
    policy: TeamPolicy,
    max_concurrent_teams: usize,
    occupied: Box<[AtomicBool]>,
}

impl WorkspaceSlotAllocator {
    /// Pool sized for `policy` on `device` with no overprovisioning
    pub fn new(policy: &TeamPolicy, device: &DeviceProfile) -> Result<Self> {
        Self::with_overprovision(policy, device, 1.0)
    }

    /// Pool of `round(max_concurrent_teams * factor)` slots, kept within
    /// `[1, league_size]`
    ///
    /// Factors above 1 trade memory for shorter claim scans. Factors below 1
    /// are accepted but can make teams wait for a slot.
    pub fn with_overprovision(policy: &TeamPolicy, device: &DeviceProfile, factor: f64) -> Result<Self> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(Error::InvalidOverprovision(factor));
        }
        if factor < 1.0 {
            tracing::warn!(
                factor,
                "overprovision factor below 1.0; teams may wait for a workspace slot"
            );
        }

        let max_concurrent_teams = (device.concurrency() / policy.team_size()).max(1);
        let num_slots = ((max_concurrent_teams as f64 * factor).round() as usize).clamp(1, policy.league_size());

        tracing::debug!(
            device = %device,
            policy = %policy,
            max_concurrent_teams,
            factor,
            num_slots,
            "workspace slot pool created"
        );

        Ok(Self {
            policy: *policy,
            max_concurrent_teams,
            occupied: (0..num_slots).map(|_| AtomicBool::new(false)).collect(),
        })
    }

    pub fn num_slots(&self) -> usize {
        self.occupied.len()
    }

    /// Teams the device can run at once for this policy, at least one
    pub fn max_concurrent_teams(&self) -> usize {
        self.max_concurrent_teams
    }

    pub fn policy(&self) -> &TeamPolicy {
        &self.policy
    }

    /// Slots currently held. Racy while teams are running.
    pub fn occupied(&self) -> usize {
        self.occupied.iter().filter(|flag| flag.load(Ordering::Relaxed)).count()
    }

    /// Reserve a free slot for `team`
    ///
    /// Collective: every member must call it and all receive the same index
    /// in `[0, num_slots)`. Spins until a slot frees up; never fails.
    pub fn claim<M: TeamMember>(&self, team: &M) -> usize {
        let slot = team.broadcast_from(0, || self.acquire(team.league_rank()));
        tracing::trace!(league_rank = team.league_rank(), slot, "workspace slot claimed");
        slot
    }

    /// Return `slot` to the pool
    ///
    /// Collective. Returns once the slot is free again; no member touches the
    /// slot's workspace after this call.
    pub fn release<M: TeamMember>(&self, team: &M, slot: usize) {
        debug_assert!(slot < self.num_slots(), "slot {slot} out of range");
        self.release_held(team, SlotGuard::new(self, slot, team.is_leader()));
    }

    /// Claim a slot, run `f` with it, then release it
    ///
    /// If the team unwinds while holding the slot, the leader frees it on
    /// the way out so teams waiting in [`Self::claim`] can proceed.
    pub fn with_slot<M, R, F>(&self, team: &M, f: F) -> R
    where
        M: TeamMember,
        F: FnOnce(usize) -> R,
    {
        let slot = self.claim(team);
        let guard = SlotGuard::new(self, slot, team.is_leader());
        let result = f(slot);
        self.release_held(team, guard);
        result
    }

    fn release_held<M: TeamMember>(&self, team: &M, mut guard: SlotGuard<'_>) {
        let slot = guard.slot;
        team.barrier();
        guard.free();
        team.barrier();
        tracing::trace!(league_rank = team.league_rank(), slot, "workspace slot released");
    }

    fn acquire(&self, league_rank: usize) -> usize {
        let num_slots = self.num_slots();
        let start = league_rank % num_slots;
        loop {
            for offset in 0..num_slots {
                let slot = (start + offset) % num_slots;
                if self.occupied[slot]
                    .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
                    .is_ok()
                {
                    return slot;
                }
                std::hint::spin_loop();
            }
            std::thread::yield_now();
        }
    }
}

/// Occupancy flag held by a team leader
///
/// Cleared by [`SlotGuard::free`], or on drop while unwinding.
struct SlotGuard<'a> {
    flag: &'a AtomicBool,
    slot: usize,
    armed: bool,
}

impl<'a> SlotGuard<'a> {
    fn new(alloc: &'a WorkspaceSlotAllocator, slot: usize, leader: bool) -> Self {
        Self {
            flag: &alloc.occupied[slot],
            slot,
            armed: leader,
        }
    }

    fn free(&mut self) {
        if std::mem::take(&mut self.armed) {
            let was_occupied = self.flag.swap(false, Ordering::Release);
            debug_assert!(was_occupied, "released slot {} that was not claimed", self.slot);
        }
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        if self.armed && std::thread::panicking() {
            tracing::warn!(slot = self.slot, "freeing workspace slot held by a panicking team");
            self.flag.store(false, Ordering::Release);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cohort_backends::SerialTeam;

    fn policy(league_size: usize, team_size: usize) -> TeamPolicy {
        TeamPolicy::new(league_size, team_size).unwrap()
    }

    #[test]
    fn test_pool_size_follows_concurrency() {
        let device = DeviceProfile::threads(8);
        let alloc = WorkspaceSlotAllocator::new(&policy(100, 2), &device).unwrap();
        assert_eq!(alloc.max_concurrent_teams(), 4);
        assert_eq!(alloc.num_slots(), 4);

        let alloc = WorkspaceSlotAllocator::with_overprovision(&policy(100, 2), &device, 1.5).unwrap();
        assert_eq!(alloc.num_slots(), 6);

        let alloc = WorkspaceSlotAllocator::with_overprovision(&policy(100, 2), &device, 0.5).unwrap();
        assert_eq!(alloc.num_slots(), 2);
    }

    #[test]
    fn test_pool_size_is_clamped() {
        let device = DeviceProfile::threads(64);
        let alloc = WorkspaceSlotAllocator::with_overprovision(&policy(5, 1), &device, 2.0).unwrap();
        assert_eq!(alloc.num_slots(), 5);

        let alloc = WorkspaceSlotAllocator::with_overprovision(&policy(5, 128), &device, 0.1).unwrap();
        assert_eq!(alloc.max_concurrent_teams(), 1);
        assert_eq!(alloc.num_slots(), 1);
    }

    #[test]
    fn test_invalid_overprovision_rejected() {
        let device = DeviceProfile::threads(4);
        for factor in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = WorkspaceSlotAllocator::with_overprovision(&policy(10, 1), &device, factor);
            assert!(matches!(result, Err(Error::InvalidOverprovision(_))), "factor={factor}");
        }
    }

    #[test]
    fn test_claim_prefers_rank_slot_and_release_frees_it() {
        let device = DeviceProfile::threads(4);
        let alloc = WorkspaceSlotAllocator::new(&policy(10, 1), &device).unwrap();

        let team = SerialTeam::with_rank(6, 10);
        let slot = alloc.claim(&team);
        assert_eq!(slot, 2);
        assert_eq!(alloc.occupied(), 1);

        let other = SerialTeam::with_rank(2, 10);
        assert_eq!(alloc.claim(&other), 3);
        assert_eq!(alloc.occupied(), 2);

        alloc.release(&team, slot);
        alloc.release(&other, 3);
        assert_eq!(alloc.occupied(), 0);
    }

    #[test]
    fn test_with_slot_releases() {
        let alloc = WorkspaceSlotAllocator::new(&policy(3, 1), &DeviceProfile::threads(3)).unwrap();
        let team = SerialTeam::with_rank(1, 3);
        let seen = alloc.with_slot(&team, |slot| {
            assert_eq!(alloc.occupied(), 1);
            slot
        });
        assert_eq!(seen, 1);
        assert_eq!(alloc.occupied(), 0);
    }

    #[test]
    fn test_with_slot_frees_slot_on_panic() {
        let alloc = WorkspaceSlotAllocator::new(&policy(4, 1), &DeviceProfile::threads(1)).unwrap();
        assert_eq!(alloc.num_slots(), 1);
        let team = SerialTeam::with_rank(0, 4);

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            alloc.with_slot(&team, |_slot| panic!("team failed"))
        }));
        assert!(outcome.is_err());
        assert_eq!(alloc.occupied(), 0);

        let next = SerialTeam::with_rank(1, 4);
        assert_eq!(alloc.with_slot(&next, |slot| slot), 0);
    }
}
