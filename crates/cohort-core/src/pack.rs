//! Fixed-width SIMD packs
//!
//! A [`Pack<T, N>`] bundles `N` scalars that are stored and processed
//! together. Sequences whose length is not a multiple of `N` end in a partial
//! pack; its unused trailing lanes hold [`Scalar::invalid`] so that any code
//! that forgets to mask them produces an obviously wrong result.
//!
//! This is deliberately minimal: lane access, lane-wise addition, masking,
//! and horizontal sums. It is the storage format the team reducer consumes.

use crate::error::{Error, Result};
use bytemuck::{Pod, Zeroable};
use num_traits::Zero;
use std::fmt::Debug;
use std::ops::{Add, AddAssign, Index, IndexMut, Range};

/// Scalar types that can be reduced by a team
pub trait Scalar: Copy + Debug + PartialEq + Send + Sync + Zero + Add<Output = Self> + AddAssign + 'static {
    /// Sentinel written into unused pack lanes
    fn invalid() -> Self;
}

macro_rules! impl_scalar_float {
    ($($ty:ty),*) => {
        $(impl Scalar for $ty {
            fn invalid() -> Self {
                <$ty>::NAN
            }
        })*
    };
}

macro_rules! impl_scalar_int {
    ($($ty:ty),*) => {
        $(impl Scalar for $ty {
            fn invalid() -> Self {
                <$ty>::MAX
            }
        })*
    };
}

impl_scalar_float!(f32, f64);
impl_scalar_int!(i32, i64, u32, u64, usize);

/// Number of `width`-wide packs needed to hold `len` scalars
pub const fn npack(len: usize, width: usize) -> usize {
    len.div_ceil(width)
}

/// `N` scalars stored and processed together
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(transparent)]
pub struct Pack<T, const N: usize> {
    lanes: [T; N],
}

// SAFETY: `Pack` is `repr(transparent)` over `[T; N]`, which is `Pod` when `T` is.
unsafe impl<T: Pod, const N: usize> Zeroable for Pack<T, N> {}
unsafe impl<T: Pod, const N: usize> Pod for Pack<T, N> {}

impl<T: Scalar, const N: usize> Pack<T, N> {
    pub const WIDTH: usize = N;

    pub const fn new(lanes: [T; N]) -> Self {
        Self { lanes }
    }

    /// Every lane set to `value`
    pub fn splat(value: T) -> Self {
        Self { lanes: [value; N] }
    }

    /// Every lane set to the invalid sentinel
    pub fn invalid() -> Self {
        Self::splat(T::invalid())
    }

    pub fn lanes(&self) -> &[T; N] {
        &self.lanes
    }

    /// Lanes outside `keep` replaced by zero. Replacement, not multiplication,
    /// so NaN sentinels never reach the result.
    pub fn masked(&self, keep: Range<usize>) -> Self {
        let mut out = Self::zero();
        for lane in keep.start.min(N)..keep.end.min(N) {
            out.lanes[lane] = self.lanes[lane];
        }
        out
    }

    /// Sum of all lanes, combined pairwise
    pub fn reduce_sum(&self) -> T {
        pairwise_sum(&self.lanes)
    }

    /// Sum of lanes in `keep`, accumulated in ascending lane order onto `acc`
    pub fn fold_lanes(&self, keep: Range<usize>, acc: T) -> T {
        self.lanes[keep.start.min(N)..keep.end.min(N)]
            .iter()
            .fold(acc, |acc, &value| acc + value)
    }
}

impl<T: Scalar, const N: usize> Zero for Pack<T, N> {
    fn zero() -> Self {
        Self::splat(T::zero())
    }

    fn is_zero(&self) -> bool {
        self.lanes.iter().all(Zero::is_zero)
    }
}

impl<T: Scalar, const N: usize> Default for Pack<T, N> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<T: Scalar, const N: usize> Add for Pack<T, N> {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl<T: Scalar, const N: usize> AddAssign for Pack<T, N> {
    fn add_assign(&mut self, rhs: Self) {
        for (lhs, rhs) in self.lanes.iter_mut().zip(rhs.lanes) {
            *lhs += rhs;
        }
    }
}

impl<T, const N: usize> Index<usize> for Pack<T, N> {
    type Output = T;

    fn index(&self, lane: usize) -> &T {
        &self.lanes[lane]
    }
}

impl<T, const N: usize> IndexMut<usize> for Pack<T, N> {
    fn index_mut(&mut self, lane: usize) -> &mut T {
        &mut self.lanes[lane]
    }
}

impl<T: Scalar, const N: usize> From<[T; N]> for Pack<T, N> {
    fn from(lanes: [T; N]) -> Self {
        Self::new(lanes)
    }
}

/// Copy `values` into packs, filling the tail of the last pack with the
/// invalid sentinel
pub fn pack_scalars<T: Scalar, const N: usize>(values: &[T]) -> Vec<Pack<T, N>> {
    values
        .chunks(N)
        .map(|chunk| {
            let mut pack = Pack::invalid();
            for (lane, &value) in chunk.iter().enumerate() {
                pack[lane] = value;
            }
            pack
        })
        .collect()
}

/// Reinterpret scalar storage as packs without copying
///
/// Fails when the length is not a multiple of `N` or the storage is not
/// aligned for `Pack<T, N>`.
pub fn cast_packs<T: Scalar + Pod, const N: usize>(values: &[T]) -> Result<&[Pack<T, N>]> {
    bytemuck::try_cast_slice(values).map_err(|err| Error::PackCast {
        len: values.len(),
        width: N,
        reason: err.to_string(),
    })
}

/// Pairwise (log-depth) sum of `values`; zero when empty
pub(crate) fn pairwise_sum<T>(values: &[T]) -> T
where
    T: Copy + Zero + Add<Output = T>,
{
    match values.len() {
        0 => T::zero(),
        1 => values[0],
        len => {
            let (left, right) = values.split_at(len / 2);
            pairwise_sum(left) + pairwise_sum(right)
        }
    }
}
