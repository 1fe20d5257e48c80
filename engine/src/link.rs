//! # Link cable
//!
//! Up to four units exchange one 16-bit word per transfer in multiplayer
//! mode. The serial interrupt latches what the hardware received into a
//! [`LinkMailbox`], and [`LinkManager::tick`] reconciles it once per frame:
//!
//! ```ignore
//! static LINK_MAILBOX: LinkMailbox = LinkMailbox::new();
//!
//! fn serial_isr() {
//!     LINK_MAILBOX.publish(&unsafe { GbaSerial::new() });
//! }
//!
//! let mut link = LinkManager::new(BaudRate::Bps115200);
//! link.activate(&mut serial, &LINK_MAILBOX);
//!
//! loop {
//!     if let Some(state) = link.tick(&mut serial, &LINK_MAILBOX, keys) {
//!         // state.data[player] holds what each player sent this frame
//!     }
//!     wait_for_vblank();
//! }
//! ```
//!
//! ## Word layout
//!
//! | Bits  | Meaning                                       |
//! |-------|-----------------------------------------------|
//! | 0-14  | Payload                                       |
//! | 15    | Heartbeat, toggled by the sender every frame  |
//!
//! `0xFFFF` is what the hardware reports for an absent unit. A word whose
//! heartbeat didn't toggle since the last one is stale and reported as
//! [`LINK_NO_DATA`], so payloads stay in `1..0x7FFF`.

use core::cell::UnsafeCell;
use core::ptr;
use core::sync::atomic::{AtomicU32, Ordering};

use bit_field::BitField;
use log::{debug, warn};

use crate::config::LINK_MAX_MISSED_TICKS;
use crate::hw::flags::{Rcnt, SioControl};

pub const LINK_MAX_PLAYERS: usize = 4;

/// Word received from an absent unit.
pub const LINK_DISCONNECTED: u16 = 0xFFFF;

/// Word reported for a connected unit that sent nothing new.
pub const LINK_NO_DATA: u16 = 0;

const HEARTBEAT_BIT: usize = 15;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[repr(u16)]
pub enum BaudRate {
    Bps9600 = 0,
    Bps38400 = 1,
    Bps57600 = 2,
    #[default]
    Bps115200 = 3,
}

/// The multiplayer registers of the link port.
pub trait SerialPort {
    fn control(&self) -> SioControl;

    fn set_control(&mut self, value: SioControl);

    /// Word received from `player` in the last transfer.
    fn multi(&self, player: usize) -> u16;

    fn set_send(&mut self, value: u16);

    fn set_rcnt(&mut self, value: Rcnt);
}

/// Registers latched by the serial interrupt.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LinkSnapshot {
    pub control: SioControl,
    pub data: [u16; LINK_MAX_PLAYERS],
}

impl LinkSnapshot {
    pub const EMPTY: LinkSnapshot = LinkSnapshot {
        control: SioControl::empty(),
        data: [LINK_DISCONNECTED; LINK_MAX_PLAYERS],
    };

    pub fn player_id(&self) -> u8 {
        self.control.bits().get_bits(SioControl::BITS_PLAYER_ID..SioControl::BITS_PLAYER_ID + 2) as u8
    }
}

/// Single slot channel from the serial interrupt to the frame loop.
///
/// The interrupt overwrites the slot and bumps a generation counter. The
/// reader copies the slot and retries if the generation moved meanwhile.
pub struct LinkMailbox {
    snapshot: UnsafeCell<LinkSnapshot>,
    generation: AtomicU32,
}

// One writer (the interrupt) and one reader guarded by the generation.
unsafe impl Sync for LinkMailbox {}

impl LinkMailbox {
    pub const fn new() -> Self {
        Self {
            snapshot: UnsafeCell::new(LinkSnapshot::EMPTY),
            generation: AtomicU32::new(0),
        }
    }

    /// Latches the port registers. Call from the serial interrupt only.
    pub fn publish(&self, port: &impl SerialPort) {
        let snapshot = LinkSnapshot {
            control: port.control(),
            data: core::array::from_fn(|player| port.multi(player)),
        };

        unsafe { ptr::write_volatile(self.snapshot.get(), snapshot) };

        // no read-modify-write atomics on ARMv4T; there is a single writer
        let generation = self.generation.load(Ordering::Relaxed);
        self.generation.store(generation.wrapping_add(1), Ordering::Release);
    }

    pub fn generation(&self) -> u32 {
        self.generation.load(Ordering::Acquire)
    }

    /// Latest snapshot if it's newer than `last_generation`, which is then
    /// updated.
    pub fn take(&self, last_generation: &mut u32) -> Option<LinkSnapshot> {
        loop {
            let generation = self.generation.load(Ordering::Acquire);

            if generation == *last_generation {
                return None;
            }

            let snapshot = unsafe { ptr::read_volatile(self.snapshot.get()) };

            if self.generation.load(Ordering::Acquire) == generation {
                *last_generation = generation;
                return Some(snapshot);
            }
        }
    }
}

impl Default for LinkMailbox {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LinkState {
    pub player_count: u8,
    pub current_player_id: u8,
    /// Payload of each player, [`LINK_NO_DATA`] or [`LINK_DISCONNECTED`].
    pub data: [u16; LINK_MAX_PLAYERS],
}

impl LinkState {
    const RESET: LinkState = LinkState {
        player_count: 0,
        current_player_id: 0,
        data: [LINK_DISCONNECTED; LINK_MAX_PLAYERS],
    };

    pub fn is_connected(&self) -> bool {
        self.player_count > 1 && self.current_player_id < self.player_count
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ResetReason {
    NotReady,
    Error,
    SerialTimeout,
    PlayerIdOutOfRange,
}

pub struct LinkManager {
    baud_rate: BaudRate,
    max_missed_ticks: u32,
    active: bool,
    state: LinkState,
    heartbeats: [Option<bool>; LINK_MAX_PLAYERS],
    heartbeat: bool,
    local_tick: u32,
    last_serial_tick: u32,
    last_generation: u32,
}

impl LinkManager {
    pub const fn new(baud_rate: BaudRate) -> Self {
        Self::with_timeout(baud_rate, LINK_MAX_MISSED_TICKS)
    }

    /// Manager resetting the connection after `max_missed_ticks` frames
    /// without a serial interrupt.
    pub const fn with_timeout(baud_rate: BaudRate, max_missed_ticks: u32) -> Self {
        Self {
            baud_rate,
            max_missed_ticks,
            active: false,
            state: LinkState::RESET,
            heartbeats: [None; LINK_MAX_PLAYERS],
            heartbeat: false,
            local_tick: 0,
            last_serial_tick: 0,
            last_generation: 0,
        }
    }

    pub fn baud_rate(&self) -> BaudRate {
        self.baud_rate
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn state(&self) -> &LinkState {
        &self.state
    }

    /// Starts the link. Snapshots `mailbox` latched before this call are
    /// dropped.
    pub fn activate(&mut self, port: &mut impl SerialPort, mailbox: &LinkMailbox) {
        self.active = true;
        self.reset(port, mailbox);
        debug!(target: "link", "activated at {:?}", self.baud_rate);
    }

    pub fn deactivate(&mut self, port: &mut impl SerialPort) {
        self.active = false;
        self.reset_state();
        Self::stop(port);
        debug!(target: "link", "deactivated");
    }

    /// Reconciles the last transfer and queues `data` for the next one.
    ///
    /// Returns `None` while not connected, which is an expected state rather
    /// than an error: poll again next frame.
    pub fn tick(&mut self, port: &mut impl SerialPort, mailbox: &LinkMailbox, data: u16) -> Option<LinkState> {
        assert!(data != LINK_NO_DATA && data < 0x7FFF, "Invalid link data: {:#x}", data);

        if !self.active {
            return None;
        }

        self.local_tick = self.local_tick.wrapping_add(1);

        let reconciled = match mailbox.take(&mut self.last_generation) {
            Some(snapshot) => {
                self.last_serial_tick = self.local_tick;
                self.reconcile(&snapshot);
                true
            }
            None => {
                self.mark_stale();
                false
            }
        };

        if let Some(reason) = self.reset_reason(port.control(), reconciled) {
            warn!(target: "link", "reset: {:?}", reason);
            self.reset(port, mailbox);
            return None;
        }

        let control = port.control();
        port.set_send(data | (self.heartbeat as u16) << HEARTBEAT_BIT);
        self.heartbeat = !self.heartbeat;

        if !control.contains(SioControl::SLAVE) {
            port.set_control(control | SioControl::START);
        }

        self.state.is_connected().then_some(self.state)
    }

    fn reconcile(&mut self, snapshot: &LinkSnapshot) {
        self.state.player_count = 0;
        self.state.current_player_id = snapshot.player_id();

        for (player, &word) in snapshot.data.iter().enumerate() {
            if word == LINK_DISCONNECTED {
                self.heartbeats[player] = None;
                self.state.data[player] = LINK_DISCONNECTED;
                continue;
            }

            let heartbeat = word.get_bit(HEARTBEAT_BIT);
            let alive = self.heartbeats[player].is_none_or(|previous| previous != heartbeat);
            self.heartbeats[player] = Some(heartbeat);
            self.state.player_count += 1;
            self.state.data[player] = if alive {
                word & !(1 << HEARTBEAT_BIT)
            } else {
                LINK_NO_DATA
            };
        }
    }

    fn mark_stale(&mut self) {
        for value in self.state.data.iter_mut() {
            if *value != LINK_DISCONNECTED {
                *value = LINK_NO_DATA;
            }
        }
    }

    fn reset_reason(&self, control: SioControl, reconciled: bool) -> Option<ResetReason> {
        if !control.contains(SioControl::READY) {
            Some(ResetReason::NotReady)
        } else if control.contains(SioControl::ERROR) {
            Some(ResetReason::Error)
        } else if self.local_tick.wrapping_sub(self.last_serial_tick) > self.max_missed_ticks {
            Some(ResetReason::SerialTimeout)
        } else if reconciled && self.state.current_player_id >= self.state.player_count {
            Some(ResetReason::PlayerIdOutOfRange)
        } else {
            None
        }
    }

    fn reset_state(&mut self) {
        self.state = LinkState::RESET;
        self.heartbeats = [None; LINK_MAX_PLAYERS];
        self.heartbeat = false;
        self.local_tick = 0;
        self.last_serial_tick = 0;
    }

    fn reset(&mut self, port: &mut impl SerialPort, mailbox: &LinkMailbox) {
        self.reset_state();
        Self::stop(port);
        // transfers from before the reset belong to the old connection
        self.last_generation = mailbox.generation();
        self.start(port);
    }

    fn stop(port: &mut impl SerialPort) {
        port.set_rcnt(Rcnt::GENERAL_PURPOSE_HIGH);
    }

    fn start(&self, port: &mut impl SerialPort) {
        port.set_rcnt(Rcnt::empty());
        port.set_control(SioControl::from_bits_retain(self.baud_rate as u16));
        port.set_send(0);
        port.set_control(port.control() | SioControl::MULTIPLAYER | SioControl::IRQ);
    }
}
