//! Cartridge GPIO port at `$80000C4`, shared by the RTC and the rumble motor.

use volatile_register::{RW, WO};

use crate::gpio::GpioPort;

#[repr(C)]
pub struct GpioRegisters {
    pub data: RW<u16>,
    pub direction: WO<u16>,
    /// Bit 0 makes the port readable.
    pub control: WO<u16>,
}

impl GpioRegisters {
    #[inline(always)]
    pub unsafe fn new() -> &'static mut GpioRegisters {
        unsafe { &mut *(0x0800_00C4 as *mut GpioRegisters) }
    }
}

/// [`GpioPort`] backed by the cartridge port.
pub struct GbaGpio {
    regs: &'static mut GpioRegisters,
}

impl GbaGpio {
    /// # Safety
    ///
    /// Only one instance may exist, and only on hardware.
    pub unsafe fn new() -> Self {
        Self {
            regs: unsafe { GpioRegisters::new() },
        }
    }
}

impl GpioPort for GbaGpio {
    fn data(&self) -> u16 {
        self.regs.data.read()
    }

    fn set_data(&mut self, value: u16) {
        unsafe { self.regs.data.write(value) }
    }

    fn set_direction(&mut self, value: u16) {
        unsafe { self.regs.direction.write(value) }
    }

    fn set_readable(&mut self, readable: bool) {
        unsafe { self.regs.control.write(readable as u16) }
    }
}
