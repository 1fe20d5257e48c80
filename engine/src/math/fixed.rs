use core::fmt;
use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Signed fixed point number with 12 fractional bits.
///
/// This is the precision the engine uses for angles, scales and interpolated
/// values. Conversions to the 8 fractional bits of the affine registers
/// happen in [`AffineMatAttributes`](crate::affine_mats::AffineMatAttributes).
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed(i32);

impl Fixed {
    pub const PRECISION: u32 = 12;
    pub const SCALE: i32 = 1 << Self::PRECISION;

    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(Self::SCALE);

    #[inline]
    pub const fn from_int(value: i32) -> Self {
        Self(value << Self::PRECISION)
    }

    #[inline]
    pub const fn from_data(data: i32) -> Self {
        Self(data)
    }

    /// Fixed point value of `value`, truncated toward zero.
    #[inline]
    pub fn from_f32(value: f32) -> Self {
        Self((value * Self::SCALE as f32) as i32)
    }

    #[inline]
    pub const fn data(self) -> i32 {
        self.0
    }

    /// Integer part, rounded toward negative infinity.
    #[inline]
    pub const fn integer(self) -> i32 {
        self.0 >> Self::PRECISION
    }

    /// Raw value with 8 fractional bits.
    #[inline]
    pub const fn data_8(self) -> i32 {
        self.0 >> (Self::PRECISION - 8)
    }
}

impl From<i32> for Fixed {
    #[inline]
    fn from(value: i32) -> Self {
        Self::from_int(value)
    }
}

impl Add for Fixed {
    type Output = Fixed;

    #[inline]
    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 + rhs.0)
    }
}

impl AddAssign for Fixed {
    #[inline]
    fn add_assign(&mut self, rhs: Fixed) {
        self.0 += rhs.0;
    }
}

impl Sub for Fixed {
    type Output = Fixed;

    #[inline]
    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 - rhs.0)
    }
}

impl SubAssign for Fixed {
    #[inline]
    fn sub_assign(&mut self, rhs: Fixed) {
        self.0 -= rhs.0;
    }
}

impl Neg for Fixed {
    type Output = Fixed;

    #[inline]
    fn neg(self) -> Fixed {
        Fixed(-self.0)
    }
}

impl Mul for Fixed {
    type Output = Fixed;

    #[inline]
    fn mul(self, rhs: Fixed) -> Fixed {
        Fixed(((self.0 as i64 * rhs.0 as i64) >> Self::PRECISION) as i32)
    }
}

impl Mul<i32> for Fixed {
    type Output = Fixed;

    #[inline]
    fn mul(self, rhs: i32) -> Fixed {
        Fixed(self.0 * rhs)
    }
}

impl Div<i32> for Fixed {
    type Output = Fixed;

    #[inline]
    fn div(self, rhs: i32) -> Fixed {
        Fixed(self.0 / rhs)
    }
}

impl fmt::Debug for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let fraction = ((abs & (Self::SCALE as u32 - 1)) as u64 * 10_000) >> Self::PRECISION;
        write!(f, "{}{}.{:04}", sign, abs >> Self::PRECISION, fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_round_trip() {
        assert_eq!(Fixed::from_int(7).integer(), 7);
        assert_eq!(Fixed::from_int(-3).integer(), -3);
    }

    #[test]
    fn multiply_keeps_precision() {
        let half = Fixed::from_data(Fixed::SCALE / 2);
        assert_eq!(Fixed::from_int(6) * half, Fixed::from_int(3));
    }

    #[test]
    fn precision_8_drops_low_bits() {
        assert_eq!(Fixed::ONE.data_8(), 256);
        assert_eq!(Fixed::from_f32(0.5).data_8(), 128);
    }

    #[test]
    fn display_shows_four_decimals() {
        assert_eq!(format!("{}", Fixed::from_f32(1.5)), "1.5000");
        assert_eq!(format!("{}", Fixed::from_int(-2)), "-2.0000");
    }
}
