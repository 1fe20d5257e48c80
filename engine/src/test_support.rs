//! Host side fakes of the hardware traits.

use std::vec::Vec;

use crate::affine_mats::{AffineMatId, AffineMatSprites, SpriteId};
use crate::audio::AudioPlayer;
use crate::gpio::{DateTime, GpioPins, GpioPort, RtcDevice, RtcError};
use crate::hw::flags::{Rcnt, SioControl};
use crate::irq::IrqRegisters;
use crate::link::{LINK_DISCONNECTED, SerialPort};

/// IO registers as plain memory.
pub struct FakeIo {
    registers: [u16; 0x110],
    pub bios_if: u16,
}

impl Default for FakeIo {
    fn default() -> Self {
        Self {
            registers: [0; 0x110],
            bios_if: 0,
        }
    }
}

impl IrqRegisters for FakeIo {
    fn read(&self, offset: u16) -> u16 {
        self.registers[offset as usize / 2]
    }

    fn write(&mut self, offset: u16, value: u16) {
        self.registers[offset as usize / 2] = value;
    }

    fn acknowledge_bios(&mut self, flags: u16) {
        self.bios_if |= flags;
    }
}

/// Link port. Writes to `control` keep the bits only hardware can change.
pub struct FakeSerial {
    pub control: SioControl,
    pub multi: [u16; 4],
    pub sent: Vec<u16>,
    pub rcnt: Rcnt,
}

impl FakeSerial {
    const HARDWARE_BITS: SioControl = SioControl::SLAVE
        .union(SioControl::READY)
        .union(SioControl::PLAYER_ID)
        .union(SioControl::ERROR);
}

impl Default for FakeSerial {
    fn default() -> Self {
        Self {
            control: SioControl::empty(),
            multi: [LINK_DISCONNECTED; 4],
            sent: Vec::new(),
            rcnt: Rcnt::empty(),
        }
    }
}

impl SerialPort for FakeSerial {
    fn control(&self) -> SioControl {
        self.control
    }

    fn set_control(&mut self, value: SioControl) {
        self.control = (value - Self::HARDWARE_BITS) | (self.control & Self::HARDWARE_BITS);
    }

    fn multi(&self, player: usize) -> u16 {
        self.multi[player]
    }

    fn set_send(&mut self, value: u16) {
        self.sent.push(value);
    }

    fn set_rcnt(&mut self, value: Rcnt) {
        self.rcnt = value;
    }
}

#[derive(Default)]
pub struct FakeGpio {
    pub data: u16,
    pub direction: u16,
    pub readable: bool,
}

impl GpioPort for FakeGpio {
    fn data(&self) -> u16 {
        self.data
    }

    fn set_data(&mut self, value: u16) {
        self.data = value;
    }

    fn set_direction(&mut self, value: u16) {
        self.direction = value;
    }

    fn set_readable(&mut self, readable: bool) {
        self.readable = readable;
    }
}

/// What [`FakeRtc`] writes to its pins on every call.
#[derive(Copy, Clone)]
pub struct RtcPinWrites {
    pub direction: u16,
    pub data: u16,
}

pub struct FakeRtc {
    init_result: Result<(), RtcError>,
    date_time: Option<DateTime>,
    pub pins: Option<RtcPinWrites>,
    pub init_calls: u32,
}

impl FakeRtc {
    pub fn new(init_result: Result<(), RtcError>, date_time: Option<DateTime>) -> Self {
        Self {
            init_result,
            date_time,
            pins: None,
            init_calls: 0,
        }
    }

    fn drive<G: GpioPort>(&self, pins: &mut GpioPins<'_, G>) {
        if let Some(writes) = self.pins {
            pins.set_direction(writes.direction);
            pins.set_data(writes.data);
        }
    }
}

impl RtcDevice for FakeRtc {
    fn init<G: GpioPort>(&mut self, pins: &mut GpioPins<'_, G>) -> Result<(), RtcError> {
        self.init_calls += 1;
        self.drive(pins);
        self.init_result
    }

    fn date_time<G: GpioPort>(&mut self, pins: &mut GpioPins<'_, G>) -> Option<DateTime> {
        self.drive(pins);
        self.date_time
    }
}

/// Records what the affine manager asks of its sprites.
#[derive(Default)]
pub struct FakeSprites {
    pub double_size_updates: Vec<(SpriteId, AffineMatId)>,
    pub removal_queries: Vec<(SpriteId, AffineMatId)>,
    /// Sprites answering that they don't need an identity matrix.
    pub not_needing: Vec<SpriteId>,
}

impl AffineMatSprites for FakeSprites {
    fn update_double_size(&mut self, sprite: SpriteId, mat: AffineMatId) {
        self.double_size_updates.push((sprite, mat));
    }

    fn remove_identity_mat_if_not_needed(&mut self, sprite: SpriteId, mat: AffineMatId) -> bool {
        self.removal_queries.push((sprite, mat));
        self.not_needing.contains(&sprite)
    }
}

#[derive(Default)]
pub struct FakePlayer {
    pub calls: Vec<&'static str>,
    offset: usize,
}

impl AudioPlayer for FakePlayer {
    fn play(&mut self, _data: &'static [u8], _looped: bool) {
        self.calls.push("play");
    }

    fn stop(&mut self) {
        self.calls.push("stop");
    }

    fn pause(&mut self) {
        self.calls.push("pause");
    }

    fn resume(&mut self) {
        self.calls.push("resume");
    }

    fn offset(&self) -> usize {
        self.offset
    }

    fn set_offset(&mut self, offset: usize) {
        self.offset = offset;
    }
}
