//! # Register bit layouts
//!
//! ## IrqFlags (`IE` at `$4000200`, `IF` at `$4000202`)
//!
//! One bit per interrupt source, in the same order as [`IrqId`](crate::irq::IrqId).
//!
//! ## DispStat (`$4000004`)
//!
//! | Flag          | Effect                                  |
//! |---------------|-----------------------------------------|
//! | `VBLANK_IRQ`  | Raise an interrupt at V-Blank start     |
//! | `HBLANK_IRQ`  | Raise an interrupt at every H-Blank     |
//! | `VCOUNT_IRQ`  | Raise an interrupt on a VCOUNT match    |
//!
//! ## SioControl (`SIOCNT` at `$4000128`, multiplayer mode)
//!
//! | Bits  | Meaning                                   |
//! |-------|-------------------------------------------|
//! | 0-1   | Baud rate (9600, 38400, 57600, 115200)    |
//! | 2     | Slave (set when this unit is not parent)  |
//! | 3     | All units ready                           |
//! | 4-5   | Player id                                 |
//! | 6     | Communication error                       |
//! | 7     | Start / busy                              |
//! | 12-13 | Mode (`MULTIPLAYER` selects 16-bit multi) |
//! | 14    | IRQ on transfer completion                |
//!
//! ## Rcnt (`RCNT` at `$4000134`)
//!
//! Bits 14-15 switch the link port between serial and general purpose modes.

bitflags::bitflags! {
    /// Interrupt enable / request bits.
    ///
    /// Writing a set bit to `IF` acknowledges that request.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct IrqFlags: u16 {
        /// V-Blank started (line 160).
        const VBLANK  = 1 << 0;
        /// H-Blank started, on every line including the blanking ones.
        const HBLANK  = 1 << 1;
        /// VCOUNT reached the line set in DISPSTAT.
        const VCOUNT  = 1 << 2;
        /// Timer 0 overflowed.
        const TIMER0  = 1 << 3;
        /// Timer 1 overflowed.
        const TIMER1  = 1 << 4;
        /// Timer 2 overflowed.
        const TIMER2  = 1 << 5;
        /// Timer 3 overflowed.
        const TIMER3  = 1 << 6;
        /// Serial transfer finished. Drives the link mailbox.
        const SERIAL  = 1 << 7;
        /// DMA 0 finished.
        const DMA0    = 1 << 8;
        /// DMA 1 finished.
        const DMA1    = 1 << 9;
        /// DMA 2 finished.
        const DMA2    = 1 << 10;
        /// DMA 3 finished.
        const DMA3    = 1 << 11;
        /// Key combination set in KEYCNT pressed.
        const KEYPAD  = 1 << 12;
        /// Cartridge removed.
        const GAMEPAK = 1 << 13;
    }

    /// Display status flags at `$4000004`.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct DispStat: u16 {
        /// Read only. Set during lines 160-226.
        const IN_VBLANK    = 1 << 0;
        /// Read only. Set during the H-Blank of every line.
        const IN_HBLANK    = 1 << 1;
        /// Read only. VCOUNT equals the configured line.
        const VCOUNT_MATCH = 1 << 2;
        /// Let V-Blank raise [`IrqFlags::VBLANK`].
        const VBLANK_IRQ   = 1 << 3;
        /// Let H-Blank raise [`IrqFlags::HBLANK`]. The H-Blank effects need it.
        const HBLANK_IRQ   = 1 << 4;
        /// Let a VCOUNT match raise [`IrqFlags::VCOUNT`].
        const VCOUNT_IRQ   = 1 << 5;
    }

    /// Serial control flags at `$4000128` in multiplayer mode.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct SioControl: u16 {
        /// Baud rate, encoded as [`BaudRate`](crate::link::BaudRate).
        const BAUD_RATE   = 0b0000_0000_0000_0011;
        /// Read only. Set on every unit but the parent.
        const SLAVE       = 1 << 2;
        /// Read only. Every connected unit is in multiplayer mode.
        const READY       = 1 << 3;
        /// Read only. This unit's position in the chain, 0 for the parent.
        const PLAYER_ID   = 0b0000_0000_0011_0000;
        /// Read only. The last transfer failed.
        const ERROR       = 1 << 6;
        /// Parent: start a transfer. Children: a transfer is in progress.
        const START       = 1 << 7;
        /// 16-bit multiplayer mode.
        const MULTIPLAYER = 1 << 13;
        /// Raise [`IrqFlags::SERIAL`] when a transfer finishes.
        const IRQ         = 1 << 14;
    }

    /// Link port mode flags at `$4000134`.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct Rcnt: u16 {
        /// General purpose mode when set together with bit 15.
        const GENERAL_PURPOSE_LOW  = 1 << 14;
        /// Takes the port out of serial mode. Clear to hand it back to SIOCNT.
        const GENERAL_PURPOSE_HIGH = 1 << 15;
    }
}

impl SioControl {
    /// First bit of [`SioControl::PLAYER_ID`].
    pub const BITS_PLAYER_ID: usize = 4;
}
