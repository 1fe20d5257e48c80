//! # Serial port
//!
//! Multiplayer mode registers. Unused gaps between `SIOMLT_SEND` and `RCNT`
//! belong to the keypad and are left alone.

use volatile_register::{RO, RW};

use crate::link::SerialPort;

use super::flags::{Rcnt, SioControl};

#[repr(C)]
pub struct SioRegisters {
    /// Received words, one per player (`$4000120-$4000126`).
    pub multi: [RO<u16>; 4],
    pub control: RW<u16>,
    pub send: RW<u16>,
    _keypad: [u16; 4],
    pub rcnt: RW<u16>,
}

impl SioRegisters {
    /// Every register is accessed through `&self`, so shared references
    /// are enough.
    #[inline(always)]
    pub unsafe fn new() -> &'static SioRegisters {
        unsafe { &*(0x0400_0120 as *const SioRegisters) }
    }
}

/// [`SerialPort`] backed by the real link port.
#[derive(Copy, Clone)]
pub struct GbaSerial {
    regs: &'static SioRegisters,
}

impl GbaSerial {
    /// # Safety
    ///
    /// Only valid on hardware.
    pub unsafe fn new() -> Self {
        Self {
            regs: unsafe { SioRegisters::new() },
        }
    }
}

impl SerialPort for GbaSerial {
    #[inline(always)]
    fn control(&self) -> SioControl {
        SioControl::from_bits_retain(self.regs.control.read())
    }

    #[inline(always)]
    fn set_control(&mut self, value: SioControl) {
        unsafe { self.regs.control.write(value.bits()) }
    }

    #[inline(always)]
    fn multi(&self, player: usize) -> u16 {
        self.regs.multi[player].read()
    }

    #[inline(always)]
    fn set_send(&mut self, value: u16) {
        unsafe { self.regs.send.write(value) }
    }

    #[inline(always)]
    fn set_rcnt(&mut self, value: Rcnt) {
        unsafe { self.regs.rcnt.write(value.bits()) }
    }
}
