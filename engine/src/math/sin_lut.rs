use super::Fixed;

/// First quadrant of a 512 steps per turn sine wave, 12 fractional bits.
const QUARTER_SIN_LUT: [i16; 129] = [
    0, 50, 101, 151, 201, 251, 301, 351,
    401, 451, 501, 551, 601, 651, 700, 750,
    799, 848, 897, 946, 995, 1044, 1092, 1141,
    1189, 1237, 1285, 1332, 1380, 1427, 1474, 1521,
    1567, 1614, 1660, 1706, 1751, 1797, 1842, 1886,
    1931, 1975, 2019, 2062, 2106, 2149, 2191, 2234,
    2276, 2317, 2359, 2399, 2440, 2480, 2520, 2559,
    2598, 2637, 2675, 2713, 2751, 2788, 2824, 2861,
    2896, 2932, 2967, 3001, 3035, 3068, 3102, 3134,
    3166, 3198, 3229, 3260, 3290, 3320, 3349, 3378,
    3406, 3433, 3461, 3487, 3513, 3539, 3564, 3588,
    3612, 3636, 3659, 3681, 3703, 3724, 3745, 3765,
    3784, 3803, 3822, 3839, 3857, 3873, 3889, 3905,
    3920, 3934, 3948, 3961, 3973, 3985, 3996, 4007,
    4017, 4027, 4036, 4044, 4052, 4059, 4065, 4071,
    4076, 4081, 4085, 4088, 4091, 4093, 4095, 4096,
    4096,
];

/// Sine of a LUT angle in the range `[0, 512]`.
pub fn lut_sin(lut_angle: usize) -> Fixed {
    assert!(lut_angle <= 512, "LUT angle out of range: {}", lut_angle);

    let value = match lut_angle {
        0..=128 => QUARTER_SIN_LUT[lut_angle],
        129..=256 => QUARTER_SIN_LUT[256 - lut_angle],
        257..=384 => -QUARTER_SIN_LUT[lut_angle - 256],
        _ => -QUARTER_SIN_LUT[512 - lut_angle],
    };
    Fixed::from_data(value as i32)
}

/// Cosine of a LUT angle in the range `[0, 512]`.
pub fn lut_cos(lut_angle: usize) -> Fixed {
    assert!(lut_angle <= 512, "LUT angle out of range: {}", lut_angle);

    lut_sin((lut_angle + 128) & 0x1FF)
}

/// Sine and cosine of an angle in degrees in the range `[0, 360]`.
///
/// The angle is quantized to 512 steps per turn, so close angles share the
/// same result.
pub fn degrees_sin_and_cos(degrees: Fixed) -> (Fixed, Fixed) {
    assert!(
        degrees >= Fixed::ZERO && degrees <= Fixed::from_int(360),
        "Angle must be in the range [0, 360]: {}",
        degrees
    );

    let lut_angle = ((degrees.data() as i64 * 512 / 360) >> Fixed::PRECISION) as usize;
    (lut_sin(lut_angle), lut_cos(lut_angle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadrants_are_symmetric() {
        assert_eq!(lut_sin(0), Fixed::ZERO);
        assert_eq!(lut_sin(128), Fixed::ONE);
        assert_eq!(lut_sin(256), Fixed::ZERO);
        assert_eq!(lut_sin(384), -Fixed::ONE);
        assert_eq!(lut_sin(64), -lut_sin(320));
    }

    #[test]
    fn cosine_is_shifted_sine() {
        assert_eq!(lut_cos(0), Fixed::ONE);
        assert_eq!(lut_cos(128), Fixed::ZERO);
        assert_eq!(lut_cos(512), Fixed::ONE);
    }

    #[test]
    fn degrees_are_quantized() {
        assert_eq!(degrees_sin_and_cos(Fixed::from_int(90)), (Fixed::ONE, Fixed::ZERO));
        assert_eq!(
            degrees_sin_and_cos(Fixed::from_int(1)),
            degrees_sin_and_cos(Fixed::from_f32(1.2))
        );
    }
}
