//! Plain 16-bit IO register access, used by the interrupt dispatcher and the
//! H-Blank handlers, plus the BIOS interrupt words at the top of IWRAM.

use core::ptr::{read_volatile, write_volatile};

use crate::irq::IrqRegisters;

use super::IO_BASE;

const VCOUNT: *const u16 = (IO_BASE + 0x0006) as *const u16;
const BIOS_IF: *mut u16 = 0x0300_7FF8 as *mut u16;
const IRQ_VECTOR: *mut usize = 0x0300_7FFC as *mut usize;

/// The IO register block at `$4000000`.
#[derive(Copy, Clone, Debug, Default)]
pub struct Mmio;

impl IrqRegisters for Mmio {
    #[inline(always)]
    fn read(&self, offset: u16) -> u16 {
        unsafe { read_volatile((IO_BASE + offset as usize) as *const u16) }
    }

    #[inline(always)]
    fn write(&mut self, offset: u16, value: u16) {
        unsafe { write_volatile((IO_BASE + offset as usize) as *mut u16, value) }
    }

    #[inline(always)]
    fn acknowledge_bios(&mut self, flags: u16) {
        unsafe { write_volatile(BIOS_IF, read_volatile(BIOS_IF) | flags) }
    }
}

/// Sets the address the BIOS jumps to on every interrupt.
///
/// # Safety
///
/// Only on hardware. `handler` must be ARM code.
#[inline(always)]
pub unsafe fn set_irq_vector(handler: extern "C" fn()) {
    unsafe { write_volatile(IRQ_VECTOR, handler as usize) }
}

/// Current scanline.
///
/// # Safety
///
/// Only meaningful on hardware.
#[inline(always)]
pub unsafe fn vcount() -> u16 {
    unsafe { read_volatile(VCOUNT) }
}
