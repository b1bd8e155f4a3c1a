use num_traits::{Float, FromPrimitive, Num, NumCast, One, ToPrimitive, Zero};
use std::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, RemAssign, Sub, SubAssign,
};

/// Simple Dual Number for Forward Mode AD
/// val: real part
/// eps: infinitesimal part
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Dual {
    pub val: f64,
    pub eps: f64,
}

impl Dual {
    pub fn new(val: f64, eps: f64) -> Self {
        Self { val, eps }
    }

    pub fn constant(val: f64) -> Self {
        Self::new(val, 0.0)
    }

    /// Lifts `point` into dual numbers differentiating along variable `direction`.
    pub fn seed(point: &[f64], direction: usize) -> Vec<Self> {
        point
            .iter()
            .enumerate()
            .map(|(i, &v)| Self::new(v, if i == direction { 1.0 } else { 0.0 }))
            .collect()
    }

    fn is_constant(&self) -> bool {
        self.eps == 0.0
    }

    /// Applies a scalar function given its value and first two derivatives at `val`.
    fn chain(self, f0: f64, f1: f64, _f2: f64) -> Self {
        Self::new(f0, f1 * self.eps)
    }
}

/// Hyper-dual number carrying two independent infinitesimals and their
/// cross term, so one evaluation yields d/da, d/db and d2/(da db).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct HyperDual {
    pub val: f64,
    pub eps1: f64,
    pub eps2: f64,
    pub eps12: f64,
}

impl HyperDual {
    pub fn new(val: f64, eps1: f64, eps2: f64, eps12: f64) -> Self {
        Self {
            val,
            eps1,
            eps2,
            eps12,
        }
    }

    pub fn constant(val: f64) -> Self {
        Self::new(val, 0.0, 0.0, 0.0)
    }

    /// Seeds `eps1` along variable `first` and `eps2` along variable `second`.
    pub fn seed(point: &[f64], first: usize, second: usize) -> Vec<Self> {
        point
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                Self::new(
                    v,
                    if i == first { 1.0 } else { 0.0 },
                    if i == second { 1.0 } else { 0.0 },
                    0.0,
                )
            })
            .collect()
    }

    fn is_constant(&self) -> bool {
        self.eps1 == 0.0 && self.eps2 == 0.0 && self.eps12 == 0.0
    }

    fn chain(self, f0: f64, f1: f64, f2: f64) -> Self {
        Self::new(
            f0,
            f1 * self.eps1,
            f1 * self.eps2,
            f1 * self.eps12 + f2 * self.eps1 * self.eps2,
        )
    }
}

impl Add for Dual {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.val + rhs.val, self.eps + rhs.eps)
    }
}

impl Sub for Dual {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.val - rhs.val, self.eps - rhs.eps)
    }
}

impl Mul for Dual {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(self.val * rhs.val, self.val * rhs.eps + self.eps * rhs.val)
    }
}

impl Div for Dual {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        let denom = rhs.val * rhs.val;
        Self::new(
            self.val / rhs.val,
            (self.eps * rhs.val - self.val * rhs.eps) / denom,
        )
    }
}

impl Neg for Dual {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.val, -self.eps)
    }
}

impl Add for HyperDual {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.val + rhs.val,
            self.eps1 + rhs.eps1,
            self.eps2 + rhs.eps2,
            self.eps12 + rhs.eps12,
        )
    }
}

impl Sub for HyperDual {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(
            self.val - rhs.val,
            self.eps1 - rhs.eps1,
            self.eps2 - rhs.eps2,
            self.eps12 - rhs.eps12,
        )
    }
}

impl Mul for HyperDual {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.val * rhs.val,
            self.val * rhs.eps1 + self.eps1 * rhs.val,
            self.val * rhs.eps2 + self.eps2 * rhs.val,
            self.val * rhs.eps12
                + self.eps1 * rhs.eps2
                + self.eps2 * rhs.eps1
                + self.eps12 * rhs.val,
        )
    }
}

impl Div for HyperDual {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        self * rhs.recip()
    }
}

impl Neg for HyperDual {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.val, -self.eps1, -self.eps2, -self.eps12)
    }
}

// Everything below is shared by both number types: it only needs
// `constant`, `chain`, `is_constant` and the arithmetic operators above.
macro_rules! impl_dual_scalar {
    ($t:ty) => {
        impl Zero for $t {
            fn zero() -> Self {
                Self::constant(0.0)
            }
            fn is_zero(&self) -> bool {
                self.val == 0.0 && self.is_constant()
            }
        }

        impl One for $t {
            fn one() -> Self {
                Self::constant(1.0)
            }
        }

        impl Rem for $t {
            type Output = Self;
            fn rem(self, rhs: Self) -> Self {
                // d(a % b)/da = 1 away from the jumps
                self.chain(self.val % rhs.val, 1.0, 0.0)
            }
        }

        impl AddAssign for $t {
            fn add_assign(&mut self, rhs: Self) {
                *self = *self + rhs;
            }
        }
        impl SubAssign for $t {
            fn sub_assign(&mut self, rhs: Self) {
                *self = *self - rhs;
            }
        }
        impl MulAssign for $t {
            fn mul_assign(&mut self, rhs: Self) {
                *self = *self * rhs;
            }
        }
        impl DivAssign for $t {
            fn div_assign(&mut self, rhs: Self) {
                *self = *self / rhs;
            }
        }
        impl RemAssign for $t {
            fn rem_assign(&mut self, rhs: Self) {
                *self = *self % rhs;
            }
        }

        impl Num for $t {
            type FromStrRadixErr = ();
            fn from_str_radix(str: &str, radix: u32) -> Result<Self, Self::FromStrRadixErr> {
                f64::from_str_radix(str, radix)
                    .map(Self::constant)
                    .map_err(|_| ())
            }
        }

        impl ToPrimitive for $t {
            fn to_i64(&self) -> Option<i64> {
                self.val.to_i64()
            }
            fn to_u64(&self) -> Option<u64> {
                self.val.to_u64()
            }
            fn to_f64(&self) -> Option<f64> {
                Some(self.val)
            }
        }

        impl FromPrimitive for $t {
            fn from_i64(n: i64) -> Option<Self> {
                Some(Self::constant(n as f64))
            }
            fn from_u64(n: u64) -> Option<Self> {
                Some(Self::constant(n as f64))
            }
            fn from_f64(n: f64) -> Option<Self> {
                Some(Self::constant(n))
            }
        }

        impl NumCast for $t {
            fn from<T: ToPrimitive>(n: T) -> Option<Self> {
                n.to_f64().map(Self::constant)
            }
        }

        impl Float for $t {
            fn nan() -> Self {
                Self::constant(f64::NAN)
            }
            fn infinity() -> Self {
                Self::constant(f64::INFINITY)
            }
            fn neg_infinity() -> Self {
                Self::constant(f64::NEG_INFINITY)
            }
            fn neg_zero() -> Self {
                Self::constant(-0.0)
            }
            fn min_value() -> Self {
                Self::constant(f64::MIN)
            }
            fn min_positive_value() -> Self {
                Self::constant(f64::MIN_POSITIVE)
            }
            fn max_value() -> Self {
                Self::constant(f64::MAX)
            }
            fn is_nan(self) -> bool {
                self.val.is_nan()
            }
            fn is_infinite(self) -> bool {
                self.val.is_infinite()
            }
            fn is_finite(self) -> bool {
                self.val.is_finite()
            }
            fn is_normal(self) -> bool {
                self.val.is_normal()
            }
            fn classify(self) -> std::num::FpCategory {
                self.val.classify()
            }
            fn floor(self) -> Self {
                self.chain(self.val.floor(), 0.0, 0.0)
            }
            fn ceil(self) -> Self {
                self.chain(self.val.ceil(), 0.0, 0.0)
            }
            fn round(self) -> Self {
                self.chain(self.val.round(), 0.0, 0.0)
            }
            fn trunc(self) -> Self {
                self.chain(self.val.trunc(), 0.0, 0.0)
            }
            fn fract(self) -> Self {
                self.chain(self.val.fract(), 1.0, 0.0)
            }
            fn abs(self) -> Self {
                if self.val >= 0.0 {
                    self
                } else {
                    -self
                }
            }
            fn signum(self) -> Self {
                self.chain(self.val.signum(), 0.0, 0.0)
            }
            fn is_sign_positive(self) -> bool {
                self.val.is_sign_positive()
            }
            fn is_sign_negative(self) -> bool {
                self.val.is_sign_negative()
            }
            fn mul_add(self, a: Self, b: Self) -> Self {
                self * a + b
            }
            fn recip(self) -> Self {
                let r = 1.0 / self.val;
                self.chain(r, -r * r, 2.0 * r * r * r)
            }

            fn powi(self, n: i32) -> Self {
                self.powf(Self::constant(n as f64))
            }

            fn powf(self, n: Self) -> Self {
                if n.is_constant() {
                    // power rule; valid for negative bases with integral exponents
                    let p = n.val;
                    let v = self.val;
                    let d1 = if p == 0.0 { 0.0 } else { p * v.powf(p - 1.0) };
                    let d2 = if p == 0.0 || p == 1.0 {
                        0.0
                    } else {
                        p * (p - 1.0) * v.powf(p - 2.0)
                    };
                    self.chain(v.powf(p), d1, d2)
                } else {
                    // x^y = exp(y * ln(x))
                    let mut result = (n * self.ln()).exp();
                    result.val = self.val.powf(n.val);
                    result
                }
            }

            fn sqrt(self) -> Self {
                let s = self.val.sqrt();
                self.chain(s, 0.5 / s, -0.25 / (s * self.val))
            }

            fn exp(self) -> Self {
                let e = self.val.exp();
                self.chain(e, e, e)
            }

            fn exp2(self) -> Self {
                let e = self.val.exp2();
                let ln2 = std::f64::consts::LN_2;
                self.chain(e, e * ln2, e * ln2 * ln2)
            }
            fn ln(self) -> Self {
                let v = self.val;
                self.chain(v.ln(), 1.0 / v, -1.0 / (v * v))
            }
            fn log(self, base: Self) -> Self {
                self.ln() / base.ln()
            }
            fn log2(self) -> Self {
                self.ln() / Self::constant(std::f64::consts::LN_2)
            }
            fn log10(self) -> Self {
                self.ln() / Self::constant(std::f64::consts::LN_10)
            }

            fn max(self, other: Self) -> Self {
                if self.val > other.val {
                    self
                } else {
                    other
                }
            }
            fn min(self, other: Self) -> Self {
                if self.val < other.val {
                    self
                } else {
                    other
                }
            }

            fn abs_sub(self, other: Self) -> Self {
                if self.val > other.val {
                    self - other
                } else {
                    Self::zero()
                }
            }

            fn cbrt(self) -> Self {
                let c = self.val.cbrt();
                let c2 = c * c;
                self.chain(c, 1.0 / (3.0 * c2), -2.0 / (9.0 * c2 * c2 * c))
            }
            fn hypot(self, other: Self) -> Self {
                let mut result = (self * self + other * other).sqrt();
                result.val = self.val.hypot(other.val);
                result
            }

            fn sin(self) -> Self {
                let (s, c) = self.val.sin_cos();
                self.chain(s, c, -s)
            }
            fn cos(self) -> Self {
                let (s, c) = self.val.sin_cos();
                self.chain(c, -s, -c)
            }
            fn tan(self) -> Self {
                let t = self.val.tan();
                let sec2 = 1.0 + t * t;
                self.chain(t, sec2, 2.0 * t * sec2)
            }
            fn asin(self) -> Self {
                let v = self.val;
                let q = 1.0 - v * v;
                self.chain(v.asin(), 1.0 / q.sqrt(), v / (q * q.sqrt()))
            }
            fn acos(self) -> Self {
                let v = self.val;
                let q = 1.0 - v * v;
                self.chain(v.acos(), -1.0 / q.sqrt(), -v / (q * q.sqrt()))
            }
            fn atan(self) -> Self {
                let v = self.val;
                let q = 1.0 + v * v;
                self.chain(v.atan(), 1.0 / q, -2.0 * v / (q * q))
            }
            fn atan2(self, other: Self) -> Self {
                // atan2(y, x) = 2 atan(y / (hypot(x, y) + x)) off the negative x axis
                let two = Self::constant(2.0);
                let mut result = (self / (self.hypot(other) + other)).atan() * two;
                result.val = self.val.atan2(other.val);
                result
            }
            fn sin_cos(self) -> (Self, Self) {
                (self.sin(), self.cos())
            }

            fn exp_m1(self) -> Self {
                let e = self.val.exp();
                self.chain(self.val.exp_m1(), e, e)
            }
            fn ln_1p(self) -> Self {
                let q = 1.0 + self.val;
                self.chain(self.val.ln_1p(), 1.0 / q, -1.0 / (q * q))
            }
            fn sinh(self) -> Self {
                let (s, c) = (self.val.sinh(), self.val.cosh());
                self.chain(s, c, s)
            }
            fn cosh(self) -> Self {
                let (s, c) = (self.val.sinh(), self.val.cosh());
                self.chain(c, s, c)
            }
            fn tanh(self) -> Self {
                let t = self.val.tanh();
                let sech2 = 1.0 - t * t;
                self.chain(t, sech2, -2.0 * t * sech2)
            }
            fn asinh(self) -> Self {
                let v = self.val;
                let q = v * v + 1.0;
                self.chain(v.asinh(), 1.0 / q.sqrt(), -v / (q * q.sqrt()))
            }
            fn acosh(self) -> Self {
                let v = self.val;
                let q = v * v - 1.0;
                self.chain(v.acosh(), 1.0 / q.sqrt(), -v / (q * q.sqrt()))
            }
            fn atanh(self) -> Self {
                let v = self.val;
                let q = 1.0 - v * v;
                self.chain(v.atanh(), 1.0 / q, 2.0 * v / (q * q))
            }

            fn integer_decode(self) -> (u64, i16, i8) {
                self.val.integer_decode()
            }
        }
    };
}

impl_dual_scalar!(Dual);
impl_dual_scalar!(HyperDual);
