use fixed::types::I32F32;

/// A length in PDF points, stored as fixed point so layout is reproducible
/// across platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Pt(I32F32);

impl Pt {
    pub const ZERO: Pt = Pt(I32F32::from_bits(0));

    pub fn from_f32(value: f32) -> Pt {
        if !value.is_finite() {
            return Pt::ZERO;
        }
        let milli = (f64::from(value) * 1000.0).round();
        Pt::from_milli(milli.clamp(i64::MIN as f64, i64::MAX as f64) as i64)
    }

    pub fn from_i32(value: i32) -> Pt {
        Pt::from_milli(i64::from(value) * 1000)
    }

    pub fn to_f32(self) -> f32 {
        self.0.to_num()
    }

    pub fn to_milli(self) -> i64 {
        let bits = i128::from(self.0.to_bits());
        let denom = 1i128 << 32;
        let scaled = bits * 1000;
        let adj = if scaled >= 0 { denom / 2 } else { -denom / 2 };
        ((scaled + adj) / denom).clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }

    pub fn from_milli(milli: i64) -> Pt {
        let denom = 1i128 << 32;
        let milli = i128::from(milli);
        let adj = if milli >= 0 { 500 } else { -500 };
        let bits = (milli * denom + adj) / 1000;
        Pt(I32F32::from_bits(
            bits.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64,
        ))
    }

    pub fn max(self, other: Pt) -> Pt {
        if self >= other { self } else { other }
    }

    pub fn min(self, other: Pt) -> Pt {
        if self <= other { self } else { other }
    }

    /// Multiplies by `num / denom`, rounding half away from zero.
    pub fn mul_ratio(self, num: i32, denom: i32) -> Pt {
        if denom == 0 {
            return Pt::ZERO;
        }
        let scaled = i128::from(self.to_milli()) * i128::from(num);
        let denom = i128::from(denom);
        let half = denom.abs() / 2;
        let value = if scaled >= 0 {
            (scaled + half) / denom
        } else {
            -((-scaled + half) / denom)
        };
        Pt::from_milli(value.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64)
    }
}

impl std::ops::Add for Pt {
    type Output = Pt;
    fn add(self, rhs: Pt) -> Pt {
        Pt::from_milli(self.to_milli().saturating_add(rhs.to_milli()))
    }
}

impl std::ops::AddAssign for Pt {
    fn add_assign(&mut self, rhs: Pt) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for Pt {
    type Output = Pt;
    fn sub(self, rhs: Pt) -> Pt {
        Pt::from_milli(self.to_milli().saturating_sub(rhs.to_milli()))
    }
}

impl std::ops::SubAssign for Pt {
    fn sub_assign(&mut self, rhs: Pt) {
        *self = *self - rhs;
    }
}

impl std::ops::Mul<i32> for Pt {
    type Output = Pt;
    fn mul(self, rhs: i32) -> Pt {
        Pt::from_milli(self.to_milli().saturating_mul(i64::from(rhs)))
    }
}

impl std::ops::Div<i32> for Pt {
    type Output = Pt;
    fn div(self, rhs: i32) -> Pt {
        self.mul_ratio(1, rhs)
    }
}

impl std::ops::Mul<f32> for Pt {
    type Output = Pt;
    fn mul(self, rhs: f32) -> Pt {
        if !rhs.is_finite() {
            return Pt::ZERO;
        }
        Pt::from_f32(self.to_f32() * rhs)
    }
}

impl std::ops::Neg for Pt {
    type Output = Pt;
    fn neg(self) -> Pt {
        Pt::from_milli(-self.to_milli())
    }
}

impl std::iter::Sum for Pt {
    fn sum<I: Iterator<Item = Pt>>(iter: I) -> Pt {
        iter.fold(Pt::ZERO, |acc, v| acc + v)
    }
}

impl<'a> std::iter::Sum<&'a Pt> for Pt {
    fn sum<I: Iterator<Item = &'a Pt>>(iter: I) -> Pt {
        iter.fold(Pt::ZERO, |acc, v| acc + *v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: Pt,
    pub height: Pt,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: Pt::from_f32(width),
            height: Pt::from_f32(height),
        }
    }

    pub fn a4() -> Self {
        Self::new(595.28, 841.89)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: Pt,
    pub y: Pt,
    pub width: Pt,
    pub height: Pt,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: Pt,
    pub right: Pt,
    pub bottom: Pt,
    pub left: Pt,
}

impl Margins {
    pub fn all(value: f32) -> Self {
        let v = Pt::from_f32(value);
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top: Pt::from_f32(top),
            right: Pt::from_f32(right),
            bottom: Pt::from_f32(bottom),
            left: Pt::from_f32(left),
        }
    }

    /// The content rectangle left over on a page of `page_size`.
    pub fn content_rect(&self, page_size: Size) -> Rect {
        Rect {
            x: self.left,
            y: self.top,
            width: (page_size.width - self.left - self.right).max(Pt::ZERO),
            height: (page_size.height - self.top - self.bottom).max(Pt::ZERO),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };
    pub const GREY: Color = Color {
        r: 0.502,
        g: 0.502,
        b: 0.502,
    };
    pub const WHITESMOKE: Color = Color {
        r: 0.961,
        g: 0.961,
        b: 0.961,
    };
    pub const BEIGE: Color = Color {
        r: 0.961,
        g: 0.961,
        b: 0.863,
    };

    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn milli_round_trip_is_exact() {
        let v = Pt::from_f32(595.28);
        assert_eq!(v.to_milli(), 595_280);
        assert_eq!(Pt::from_milli(v.to_milli()), v);
    }

    #[test]
    fn arithmetic_keeps_milli_precision() {
        let a = Pt::from_f32(0.1);
        let b = Pt::from_f32(0.2);
        assert_eq!((a + b).to_milli(), 300);
        assert_eq!((b - a).to_milli(), 100);
        assert_eq!((Pt::from_i32(10) / 3).to_milli(), 3333);
        assert_eq!(Pt::from_i32(7).mul_ratio(1, 2).to_milli(), 3500);
    }

    #[test]
    fn content_rect_subtracts_margins() {
        let rect = Margins::new(310.0, 50.0, 50.0, 0.0).content_rect(Size::new(4000.0, 2250.0));
        assert_eq!(rect.x, Pt::ZERO);
        assert_eq!(rect.y, Pt::from_i32(310));
        assert_eq!(rect.width, Pt::from_i32(3950));
        assert_eq!(rect.height, Pt::from_i32(1890));
    }
}
