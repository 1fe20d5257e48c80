//! # H-Blank handlers
//!
//! The H-Blank interrupt fires up to 228 times per frame and has a very short
//! window to finish its register writes. The handler is picked per entry
//! count: [`write_entries`] takes the count as a const generic, so every
//! variant is unrolled at compile time and has no loop bound to check.
//!
//! Effects apply one line ahead of `VCOUNT`, since the H-Blank that follows
//! line `n` is the last chance to change what line `n + 1` shows:
//!
//! | `VCOUNT`     | Row written |
//! |--------------|-------------|
//! | `0..=158`    | `VCOUNT + 1`|
//! | `226`        | `0`         |
//! | anything else| nothing     |

use core::cell::{Cell, UnsafeCell};
use core::ptr;

use crate::config::HBLANK_EFFECTS_MAX_ITEMS;

/// Source row and destination register of one active effect.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HblankEntry {
    pub src: *const u16,
    pub dest: *mut u16,
}

impl HblankEntry {
    pub const EMPTY: HblankEntry = HblankEntry {
        src: ptr::null(),
        dest: ptr::null_mut(),
    };
}

pub type HblankEntries = [HblankEntry; HBLANK_EFFECTS_MAX_ITEMS];

/// Handler variant for a fixed number of entries.
pub type EntriesHandler = unsafe fn(&HblankEntries, u16);

#[inline(always)]
pub const fn row_for_vcount(vcount: u16) -> Option<usize> {
    match vcount {
        0..=158 => Some(vcount as usize + 1),
        226 => Some(0),
        _ => None,
    }
}

/// Copies row `row_for_vcount(vcount)` of the first `N` entries into their
/// destinations.
///
/// # Safety
///
/// The first `N` entries must point to live 160-value sources and writable
/// registers.
#[inline(always)]
pub unsafe fn write_entries<const N: usize>(entries: &HblankEntries, vcount: u16) {
    let Some(row) = row_for_vcount(vcount) else {
        return;
    };

    for entry in &entries[..N] {
        unsafe { entry.dest.write_volatile(*entry.src.add(row)) }
    }
}

const HANDLERS: [EntriesHandler; 9] = [
    write_entries::<0>,
    write_entries::<1>,
    write_entries::<2>,
    write_entries::<3>,
    write_entries::<4>,
    write_entries::<5>,
    write_entries::<6>,
    write_entries::<7>,
    write_entries::<8>,
];

pub fn handler_for_count(count: usize) -> EntriesHandler {
    assert!(count <= HBLANK_EFFECTS_MAX_ITEMS, "Invalid entries count: {}", count);

    HANDLERS[count]
}

/// Live data read by the H-Blank interrupt.
///
/// Entries are double buffered: the manager stages into the inactive array
/// while the interrupt reads the active one, and the arrays swap at commit.
pub struct HblankIsrData {
    entries_a: UnsafeCell<HblankEntries>,
    entries_b: UnsafeCell<HblankEntries>,
    b_active: Cell<bool>,
    count: Cell<usize>,
    handler: Cell<EntriesHandler>,
}

// Single core: the interrupt only reads, and every write happens with IME
// cleared or to the inactive array.
unsafe impl Sync for HblankIsrData {}

impl HblankIsrData {
    pub const fn new() -> Self {
        Self {
            entries_a: UnsafeCell::new([HblankEntry::EMPTY; HBLANK_EFFECTS_MAX_ITEMS]),
            entries_b: UnsafeCell::new([HblankEntry::EMPTY; HBLANK_EFFECTS_MAX_ITEMS]),
            b_active: Cell::new(false),
            count: Cell::new(0),
            handler: Cell::new(write_entries::<0>),
        }
    }

    pub fn count(&self) -> usize {
        self.count.get()
    }

    /// Array not being read by the interrupt.
    ///
    /// # Safety
    ///
    /// No other reference to the inactive array may be alive.
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn staging(&self) -> &mut HblankEntries {
        let cell = if self.b_active.get() { &self.entries_a } else { &self.entries_b };
        unsafe { &mut *cell.get() }
    }

    pub(crate) fn swap_entries(&self) {
        self.b_active.set(!self.b_active.get());
    }

    pub(crate) fn set_count(&self, count: usize) {
        self.handler.set(handler_for_count(count));
        self.count.set(count);
    }

    pub fn clear(&self) {
        self.set_count(0);
    }

    /// What the H-Blank interrupt does: runs the handler selected for the
    /// committed count on the active entries.
    ///
    /// # Safety
    ///
    /// The committed entries must still be owned by a live manager.
    #[inline(always)]
    pub unsafe fn service(&self, vcount: u16) {
        let cell = if self.b_active.get() { &self.entries_b } else { &self.entries_a };

        unsafe { (self.handler.get())(&*cell.get(), vcount) }
    }
}

impl Default for HblankIsrData {
    fn default() -> Self {
        Self::new()
    }
}

/// Interrupt data of the effects running on hardware.
pub static HBLANK_ISR_DATA: HblankIsrData = HblankIsrData::new();

/// H-Blank interrupt handler for [`HBLANK_ISR_DATA`].
pub fn hblank_isr() {
    unsafe { HBLANK_ISR_DATA.service(crate::hw::mmio::vcount()) }
}
