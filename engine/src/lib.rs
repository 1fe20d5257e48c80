//! # GBA engine core
//!
//! Hardware effects and resource managers for Game Boy Advance games, built
//! around one rule: game code mutates state whenever it wants, and the engine
//! pushes the result to hardware at a known synchronization point.
//!
//! ## The Frame
//!
//! ```ignore
//! loop {
//!     // 1. Game logic: move things, start actions, change effects
//!     game.update(&mut engine);
//!
//!     // 2. Run actions and stage what changed
//!     engine.update();
//!
//!     // 3. V-Blank: publish H-Blank effects, upload affine matrices
//!     wait_for_vblank();
//!     if let Some(range) = engine.commit() {
//!         oam.commit_affine_mats(range, engine.affine_mats.registers());
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! | Module              | What it does                                         |
//! |---------------------|------------------------------------------------------|
//! | [`irq`]             | Interrupt handler table, enabling and dispatch       |
//! | [`hblank_effects`]  | Per-scanline register writes from H-Blank            |
//! | [`affine_mats`]     | Shared sprite affine matrices and their dirty range  |
//! | [`actions`]         | Per-frame tasks such as value interpolators          |
//! | [`link`]            | Multiplayer link cable connection                    |
//! | [`gpio`]            | Cartridge RTC and rumble                             |
//! | [`audio`]           | Playback state over an external player               |
//! | [`engine`]          | The managers wired into a frame loop                 |
//! | [`hw`]              | Memory map, register layouts and MMIO blocks         |
//!
//! Nothing here installs a logger. Diagnostics go through the [`log`] macros,
//! so a debug build can route them to an emulator console.

#![cfg_attr(not(test), no_std)]

pub mod actions;
pub mod affine_mats;
pub mod audio;
pub mod config;
pub mod engine;
pub mod gpio;
pub mod hblank_effects;
pub mod hw;
pub mod irq;
pub mod link;
pub mod math;

#[cfg(test)]
mod test_support;

pub use engine::Engine;
pub use math::Fixed;
