//! # Engine limits
//!
//! Every pool in the engine has a fixed size decided at compile time. Running
//! out of a pool is a programming error for the `create` family of functions
//! and a `None` for the `create_optional` family.
//!
//! | Constant                    | Default | Constraint                     |
//! |-----------------------------|---------|--------------------------------|
//! | `HBLANK_EFFECTS_MAX_ITEMS`  | 8       | `1..=8`                        |
//! | `MAX_ACTIONS`               | 32      | power of two                   |
//! | `AFFINE_MATS_COUNT`         | 32      | fits an `i8` index             |
//! | `LINK_MAX_MISSED_TICKS`     | 3       | frames without a serial IRQ    |

/// Visible scanlines.
pub const DISPLAY_HEIGHT: usize = 160;

/// Total scanlines per frame, blanking band included.
pub const SCANLINES: usize = 228;

/// Maximum number of simultaneously active H-Blank effects.
pub const HBLANK_EFFECTS_MAX_ITEMS: usize = 8;

/// Maximum number of running actions.
pub const MAX_ACTIONS: usize = 32;

/// Number of affine matrices in OAM.
pub const AFFINE_MATS_COUNT: usize = 32;

/// Number of sprites in OAM.
pub const SPRITES_COUNT: usize = 128;

/// Frames the link manager tolerates without a serial interrupt before
/// resetting the connection.
pub const LINK_MAX_MISSED_TICKS: u32 = 3;

const _: () = assert!(HBLANK_EFFECTS_MAX_ITEMS > 0 && HBLANK_EFFECTS_MAX_ITEMS <= 8);
const _: () = assert!(MAX_ACTIONS.is_power_of_two());
const _: () = assert!(AFFINE_MATS_COUNT <= i8::MAX as usize);
const _: () = assert!(SPRITES_COUNT % AFFINE_MATS_COUNT == 0);
