//! # Hardware access
//!
//! Everything that touches the real memory map lives here. The rest of the
//! engine talks to hardware through small traits ([`IrqRegisters`],
//! [`SerialPort`], [`GpioPort`]) so it can run on the host in tests.
//!
//! ## Memory map
//!
//! | Address      | Name          | Used by                                  |
//! |--------------|---------------|------------------------------------------|
//! | `$3007FF8`   | BIOS IF       | [`irq`](crate::irq) acknowledgement       |
//! | `$3007FFC`   | IRQ vector    | [`irq`](crate::irq) master handler        |
//! | `$4000004`   | DISPSTAT      | [`irq`](crate::irq) sender flags          |
//! | `$4000006`   | VCOUNT        | H-Blank handlers                          |
//! | `$4000010+`  | BGxHOFS/VOFS  | H-Blank effect destinations               |
//! | `$4000120`   | SIOMULTI0-3   | [`link`](crate::link)                     |
//! | `$4000128`   | SIOCNT        | [`link`](crate::link)                     |
//! | `$400012A`   | SIOMLT_SEND   | [`link`](crate::link)                     |
//! | `$4000134`   | RCNT          | [`link`](crate::link)                     |
//! | `$4000200`   | IE / IF / IME | [`irq`](crate::irq)                       |
//! | `$7000000`   | OAM           | affine matrix upload                      |
//! | `$80000C4`   | GPIO          | [`gpio`](crate::gpio) rumble and RTC      |
//!
//! [`IrqRegisters`]: crate::irq::IrqRegisters
//! [`SerialPort`]: crate::link::SerialPort
//! [`GpioPort`]: crate::gpio::GpioPort

pub mod flags;
pub mod gpio;
pub mod mmio;
pub mod oam;
pub mod serial;

/// Base address of the IO registers.
pub const IO_BASE: usize = 0x0400_0000;
