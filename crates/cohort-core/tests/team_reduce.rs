//! Integration tests for team reductions on thread-backed teams

use cohort_backends::{CpuLauncher, DeviceProfile, TeamMember, TeamPolicy};
use cohort_core::{pack_scalars, Pack, ReductionMode, TeamReducer, View};
use parking_lot::Mutex;
use std::ops::Range;

fn harmonic(n: usize) -> Vec<f64> {
    (0..n).map(|k| 1.0 / (k as f64 + 1.0)).collect()
}

fn serial_sum(values: &[f64], init: f64) -> f64 {
    values.iter().fold(init, |acc, &v| acc + v)
}

fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() <= 10.0 * f64::EPSILON
}

/// Run `body` on every member of `league_size` teams and collect what each
/// member returned
fn launch<F>(team_size: usize, league_size: usize, body: F) -> Vec<f64>
where
    F: Fn(&cohort_backends::CpuTeamMember<'_>) -> f64 + Sync,
{
    let launcher = CpuLauncher::new(DeviceProfile::threads(8));
    let policy = TeamPolicy::new(league_size, team_size).unwrap();
    let results = Mutex::new(Vec::new());
    launcher
        .parallel_for(&policy, |team| {
            let value = body(team);
            results.lock().push(value);
        })
        .unwrap();
    results.into_inner()
}

#[test]
fn test_ordered_reduce_is_bit_identical_for_any_team_size() {
    let values = harmonic(15);
    let expected = serial_sum(&values, 0.0);

    for team_size in 1..=6 {
        let reducer = TeamReducer::new(ReductionMode::Ordered);
        let results = launch(team_size, 4, |team| reducer.reduce(team, 0..15, 0.0, |k| values[k]));

        assert_eq!(results.len(), 4 * team_size);
        for result in results {
            assert_eq!(result.to_bits(), expected.to_bits(), "team_size={team_size}");
        }
    }
}

#[test]
fn test_ordered_reduce_with_offset_range_and_init() {
    let values = harmonic(40);
    let expected = serial_sum(&values[7..33], -2.0);

    let reducer = TeamReducer::new(ReductionMode::Ordered);
    let results = launch(3, 5, |team| reducer.reduce(team, 7..33, -2.0, |k| values[k]));
    assert!(results.iter().all(|r| r.to_bits() == expected.to_bits()));
}

#[test]
fn test_tree_reduce_is_close_and_agreed() {
    let values = harmonic(15);
    let expected = serial_sum(&values, 0.0);

    for team_size in [1, 2, 4, 7] {
        let reducer = TeamReducer::new(ReductionMode::Tree);
        let results = launch(team_size, 3, |team| {
            let sum = reducer.reduce(team, 0..15, 0.0, |k| values[k]);
            let all = team.all_gather(sum);
            assert!(all.iter().all(|s| s.to_bits() == sum.to_bits()));
            sum
        });

        for result in results {
            assert!(close(result, expected), "team_size={team_size}: {result} vs {expected}");
        }
    }
}

#[test]
fn test_empty_range_returns_init_on_every_member() {
    for mode in [ReductionMode::Ordered, ReductionMode::Tree] {
        let reducer = TeamReducer::new(mode);
        let results = launch(3, 2, |team| reducer.reduce(team, 4..4, 3.5, |_| f64::NAN));
        assert!(results.iter().all(|&r| r == 3.5));
    }
}

fn check_packed<const N: usize>(n: usize, range: Range<usize>, init: f64, scalars: &[f64]) {
    let packs: Vec<Pack<f64, N>> = pack_scalars(&scalars[..n]);
    let expected = serial_sum(&scalars[range.clone()], init);

    for team_size in [1, 2, 3, 5] {
        let view = View::new(&packs);

        let ordered = TeamReducer::new(ReductionMode::Ordered);
        let results = launch(team_size, 2, |team| ordered.reduce_view(team, range.clone(), init, &view));
        for result in results {
            assert_eq!(
                result.to_bits(),
                expected.to_bits(),
                "ordered n={n} width={N} range={range:?} team_size={team_size}"
            );
        }

        let tree = TeamReducer::new(ReductionMode::Tree);
        let results = launch(team_size, 2, |team| tree.reduce_view(team, range.clone(), init, &view));
        for result in results {
            assert!(result.is_finite(), "tree leaked a sentinel lane");
            assert!(
                close(result, expected),
                "tree n={n} width={N} range={range:?} team_size={team_size}"
            );
        }
    }
}

#[test]
fn test_packed_reductions() {
    let values = harmonic(16);
    check_packed::<1>(8, 0..8, 0.0, &values);
    check_packed::<4>(8, 0..8, 0.0, &values);
    check_packed::<4>(7, 0..7, 0.0, &values);
    check_packed::<4>(3, 0..3, 0.0, &values);
    check_packed::<3>(16, 0..16, 0.0, &values);
}

#[test]
fn test_packed_subset_ranges_with_start_value() {
    let values = harmonic(16);
    let a = 1.0 / 3.0;
    check_packed::<1>(8, 2..5, a, &values);
    check_packed::<4>(8, 2..5, a, &values);
    check_packed::<3>(16, 2..11, a, &values);
}

#[test]
fn test_reduce_packs_calls_only_covered_packs() {
    let reducer = TeamReducer::new(ReductionMode::Ordered);
    let touched = Mutex::new(Vec::new());

    let results = launch(2, 1, |team| {
        reducer.reduce_packs(team, 5..14, 0.0, |p| {
            touched.lock().push(p);
            Pack::<f64, 4>::splat(1.0)
        })
    });
    assert!(results.iter().all(|&r| r == 9.0));

    let mut touched = touched.into_inner();
    touched.sort_unstable();
    assert_eq!(touched, vec![1, 2, 3]);
}
