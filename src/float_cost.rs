//! Real-valued costs for maps measured in fractional units.
use derive_more::Display;
use num_traits::One;
use num_traits::SaturatingAdd;
use num_traits::Zero;
use num_traits::bounds::UpperBounded;
use ordered_float::OrderedFloat;

use crate::cost::Cost;

/// A totally ordered `f64` cost.
///
/// `NaN` sorts above every other value (as in [`OrderedFloat`]), and infinity
/// is the upper bound used for unreachable estimates.
#[derive(Copy, Clone, Default, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
#[display("{_0}")]
pub struct FloatCost(pub OrderedFloat<f64>);

impl FloatCost {
    pub fn new(f: f64) -> Self {
        Self(OrderedFloat(f))
    }

    #[inline(always)]
    pub fn get(&self) -> f64 {
        self.0.into_inner()
    }

    #[inline(always)]
    pub fn infinity() -> Self {
        Self(OrderedFloat(f64::INFINITY))
    }
}

impl Cost for FloatCost {
    /// Neither `NaN` nor an infinity.
    #[inline(always)]
    fn valid(&self) -> bool {
        self.get().is_finite()
    }
}

impl std::ops::Add for FloatCost {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}
impl std::ops::Sub for FloatCost {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}
impl std::ops::Mul for FloatCost {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        Self(self.0 * rhs.0)
    }
}
impl std::ops::AddAssign for FloatCost {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}
/// Float addition already saturates at infinity.
impl SaturatingAdd for FloatCost {
    fn saturating_add(&self, rhs: &Self) -> Self {
        *self + *rhs
    }
}

impl Zero for FloatCost {
    #[inline(always)]
    fn zero() -> Self {
        Self::new(0.0)
    }
    #[inline(always)]
    fn is_zero(&self) -> bool {
        self.get() == 0.0
    }
}
impl One for FloatCost {
    #[inline(always)]
    fn one() -> Self {
        Self::new(1.0)
    }
}
impl UpperBounded for FloatCost {
    fn max_value() -> Self {
        Self::infinity()
    }
}

impl From<f64> for FloatCost {
    fn from(f: f64) -> Self {
        Self::new(f)
    }
}
