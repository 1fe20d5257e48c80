use crate::math::{degrees_sin_and_cos, Fixed};

/// Register image of one affine matrix, 8 fractional bits.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AffineMatRegisters {
    pub pa: i16,
    pub pb: i16,
    pub pc: i16,
    pub pd: i16,
}

impl AffineMatRegisters {
    pub const IDENTITY: AffineMatRegisters = AffineMatRegisters {
        pa: 256,
        pb: 0,
        pc: 0,
        pd: 256,
    };
}

impl Default for AffineMatRegisters {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Rotation, scale, shear and flips of an affine matrix.
///
/// Setters panic on out of range input: angles must be in `[0, 360]` and
/// scales greater than zero.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AffineMatAttributes {
    rotation_angle: Fixed,
    horizontal_scale: Fixed,
    vertical_scale: Fixed,
    horizontal_shear: Fixed,
    vertical_shear: Fixed,
    hflip: i32,
    vflip: i32,
    sin: i32,
    cos: i32,
    sx: i32,
    sy: i32,
}

/// Scales at or below `1 / MIN_INV_SCALE` are clamped.
const MIN_INV_SCALE: i32 = 128;

/// Reciprocal of `scale` with 8 fractional bits.
fn output_scale(scale: Fixed) -> i32 {
    let scale_8 = scale.data_8();

    if scale_8 * MIN_INV_SCALE <= 256 {
        MIN_INV_SCALE << 8
    } else {
        (1 << 16) / scale_8
    }
}

impl AffineMatAttributes {
    pub const IDENTITY: AffineMatAttributes = AffineMatAttributes {
        rotation_angle: Fixed::ZERO,
        horizontal_scale: Fixed::ONE,
        vertical_scale: Fixed::ONE,
        horizontal_shear: Fixed::ZERO,
        vertical_shear: Fixed::ZERO,
        hflip: 1,
        vflip: 1,
        sin: 0,
        cos: Fixed::SCALE,
        sx: 256,
        sy: 256,
    };

    pub fn new(rotation_angle: Fixed, horizontal_scale: Fixed, vertical_scale: Fixed) -> Self {
        let mut result = Self::IDENTITY;
        result.set_rotation_angle(rotation_angle);
        result.set_scale_xy(horizontal_scale, vertical_scale);
        result
    }

    pub fn rotation_angle(&self) -> Fixed {
        self.rotation_angle
    }

    pub fn set_rotation_angle(&mut self, rotation_angle: Fixed) {
        let (sin, cos) = degrees_sin_and_cos(rotation_angle);
        self.rotation_angle = rotation_angle;
        self.sin = sin.data();
        self.cos = cos.data();
    }

    pub fn horizontal_scale(&self) -> Fixed {
        self.horizontal_scale
    }

    pub fn set_horizontal_scale(&mut self, horizontal_scale: Fixed) {
        assert!(horizontal_scale > Fixed::ZERO, "Invalid horizontal scale: {}", horizontal_scale);

        self.horizontal_scale = horizontal_scale;
        self.sx = output_scale(horizontal_scale);
    }

    pub fn vertical_scale(&self) -> Fixed {
        self.vertical_scale
    }

    pub fn set_vertical_scale(&mut self, vertical_scale: Fixed) {
        assert!(vertical_scale > Fixed::ZERO, "Invalid vertical scale: {}", vertical_scale);

        self.vertical_scale = vertical_scale;
        self.sy = output_scale(vertical_scale);
    }

    pub fn set_scale(&mut self, scale: Fixed) {
        self.set_scale_xy(scale, scale);
    }

    pub fn set_scale_xy(&mut self, horizontal_scale: Fixed, vertical_scale: Fixed) {
        self.set_horizontal_scale(horizontal_scale);
        self.set_vertical_scale(vertical_scale);
    }

    pub fn horizontal_shear(&self) -> Fixed {
        self.horizontal_shear
    }

    pub fn set_horizontal_shear(&mut self, horizontal_shear: Fixed) {
        self.horizontal_shear = horizontal_shear;
    }

    pub fn vertical_shear(&self) -> Fixed {
        self.vertical_shear
    }

    pub fn set_vertical_shear(&mut self, vertical_shear: Fixed) {
        self.vertical_shear = vertical_shear;
    }

    pub fn set_shear(&mut self, shear: Fixed) {
        self.horizontal_shear = shear;
        self.vertical_shear = shear;
    }

    pub fn set_shear_xy(&mut self, horizontal_shear: Fixed, vertical_shear: Fixed) {
        self.horizontal_shear = horizontal_shear;
        self.vertical_shear = vertical_shear;
    }

    pub fn horizontal_flip(&self) -> bool {
        self.hflip < 0
    }

    pub fn set_horizontal_flip(&mut self, horizontal_flip: bool) {
        self.hflip = if horizontal_flip { -1 } else { 1 };
    }

    pub fn vertical_flip(&self) -> bool {
        self.vflip < 0
    }

    pub fn set_vertical_flip(&mut self, vertical_flip: bool) {
        self.vflip = if vertical_flip { -1 } else { 1 };
    }

    #[inline]
    pub fn pa(&self) -> i16 {
        ((self.cos * self.sx * self.hflip) >> 12) as i16
    }

    #[inline]
    pub fn pb(&self) -> i16 {
        let rot_scale = (-self.sin * self.sx * self.hflip) >> 12;
        (rot_scale + (self.horizontal_shear.data() >> 4)) as i16
    }

    #[inline]
    pub fn pc(&self) -> i16 {
        let rot_scale = (self.sin * self.sy * self.vflip) >> 12;
        (rot_scale + (self.vertical_shear.data() >> 4)) as i16
    }

    #[inline]
    pub fn pd(&self) -> i16 {
        ((self.cos * self.sy * self.vflip) >> 12) as i16
    }

    pub fn registers(&self) -> AffineMatRegisters {
        AffineMatRegisters {
            pa: self.pa(),
            pb: self.pb(),
            pc: self.pc(),
            pd: self.pd(),
        }
    }

    /// Identity once flips are ignored.
    pub fn flipped_identity(&self) -> bool {
        let registers = self.registers();

        self.rotation_angle == Fixed::ZERO
            && self.horizontal_scale == Fixed::ONE
            && self.vertical_scale == Fixed::ONE
            && self.horizontal_shear == Fixed::ZERO
            && self.vertical_shear == Fixed::ZERO
            && registers.pa.abs() == 256
            && registers.pb == 0
            && registers.pc == 0
            && registers.pd.abs() == 256
    }

    pub fn identity(&self) -> bool {
        self.flipped_identity() && self.hflip > 0 && self.vflip > 0
    }
}

impl Default for AffineMatAttributes {
    fn default() -> Self {
        Self::IDENTITY
    }
}
