//! # H-Blank effects
//!
//! An H-Blank effect writes one value per visible scanline into a display
//! register, which is how per-line scrolling, wavy windows and similar
//! tricks are done.
//!
//! ```ignore
//! static WAVE: [u16; 160] = build_wave();
//!
//! let id = hblank.create(&WAVE, Register::BG1_HOFS);
//!
//! loop {
//!     hblank.update();
//!     wait_for_vblank();
//!     hblank.commit(&mut irq);
//! }
//! ```
//!
//! Mutations only mark the manager dirty. [`update`](HblankEffectsManager::update)
//! stages the visible entries into the array the interrupt is not reading,
//! and [`commit`](HblankEffectsManager::commit) swaps the arrays at V-Blank.
//! The interrupt handler is only reinstalled when the number of entries
//! changes, because the handler is specialized per count.

pub mod isr;

use core::cell::Cell;
use core::marker::PhantomData;

use heapless::Vec;
use log::{debug, trace};

use crate::config::{DISPLAY_HEIGHT, HBLANK_EFFECTS_MAX_ITEMS};
use crate::irq::{Handler, InterruptDispatcher, IrqId, IrqRegisters};

use isr::{HblankEntry, HblankIsrData};

/// One value per visible scanline.
pub type HblankValues = [u16; DISPLAY_HEIGHT];

/// Destination register of an effect.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Register<'a> {
    ptr: *mut u16,
    _marker: PhantomData<&'a Cell<u16>>,
}

impl Register<'static> {
    pub const GREEN_SWAP: Self = unsafe { Self::new(0x0400_0002) };
    pub const BG0_HOFS: Self = unsafe { Self::new(0x0400_0010) };
    pub const BG0_VOFS: Self = unsafe { Self::new(0x0400_0012) };
    pub const BG1_HOFS: Self = unsafe { Self::new(0x0400_0014) };
    pub const BG1_VOFS: Self = unsafe { Self::new(0x0400_0016) };
    pub const BG2_HOFS: Self = unsafe { Self::new(0x0400_0018) };
    pub const BG2_VOFS: Self = unsafe { Self::new(0x0400_001A) };
    pub const BG3_HOFS: Self = unsafe { Self::new(0x0400_001C) };
    pub const BG3_VOFS: Self = unsafe { Self::new(0x0400_001E) };
    pub const WIN0_H: Self = unsafe { Self::new(0x0400_0040) };
    pub const WIN1_H: Self = unsafe { Self::new(0x0400_0042) };
    pub const WIN0_V: Self = unsafe { Self::new(0x0400_0044) };
    pub const WIN1_V: Self = unsafe { Self::new(0x0400_0046) };
    pub const WININ: Self = unsafe { Self::new(0x0400_0048) };
    pub const WINOUT: Self = unsafe { Self::new(0x0400_004A) };
    pub const MOSAIC: Self = unsafe { Self::new(0x0400_004C) };
    pub const BLDCNT: Self = unsafe { Self::new(0x0400_0050) };
    pub const BLDALPHA: Self = unsafe { Self::new(0x0400_0052) };
    pub const BLDY: Self = unsafe { Self::new(0x0400_0054) };
}

impl<'a> Register<'a> {
    /// # Safety
    ///
    /// `address` must be a writable 16-bit register.
    pub const unsafe fn new(address: usize) -> Self {
        Self {
            ptr: address as *mut u16,
            _marker: PhantomData,
        }
    }

    /// Register backed by plain memory, for capturing writes.
    pub fn from_cell(cell: &'a Cell<u16>) -> Self {
        Self {
            ptr: cell.as_ptr(),
            _marker: PhantomData,
        }
    }

    pub fn address(self) -> usize {
        self.ptr as usize
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct HblankEffectId(u8);

impl HblankEffectId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

struct Item<'a> {
    values: &'a HblankValues,
    register: Register<'a>,
    usages: u16,
    visible: bool,
}

pub struct HblankEffectsManager<'a> {
    items: [Option<Item<'a>>; HBLANK_EFFECTS_MAX_ITEMS],
    free_indexes: Vec<u8, HBLANK_EFFECTS_MAX_ITEMS>,
    isr: &'a HblankIsrData,
    isr_handler: Handler,
    staged_count: usize,
    committed_count: usize,
    update: bool,
    commit: bool,
    enabled: bool,
}

impl<'a> HblankEffectsManager<'a> {
    /// Manager publishing to `isr`. `isr_handler` is the interrupt handler
    /// that services `isr`, installed for the H-Blank source while any entry
    /// is committed.
    pub fn new(isr: &'a HblankIsrData, isr_handler: Handler) -> Self {
        let mut free_indexes = Vec::new();
        for index in (0..HBLANK_EFFECTS_MAX_ITEMS as u8).rev() {
            let _ = free_indexes.push(index);
        }

        isr.clear();

        Self {
            items: [const { None }; HBLANK_EFFECTS_MAX_ITEMS],
            free_indexes,
            isr,
            isr_handler,
            staged_count: 0,
            committed_count: 0,
            update: false,
            commit: false,
            enabled: true,
        }
    }

    pub fn used_count(&self) -> usize {
        HBLANK_EFFECTS_MAX_ITEMS - self.free_indexes.len()
    }

    pub fn available_count(&self) -> usize {
        self.free_indexes.len()
    }

    /// Visible effect writing `values` into `register`, with one usage.
    ///
    /// Panics when every slot is taken.
    pub fn create(&mut self, values: &'a HblankValues, register: Register<'a>) -> HblankEffectId {
        match self.create_optional(values, register) {
            Some(id) => id,
            None => panic!("No more HBlank effects available"),
        }
    }

    pub fn create_optional(
        &mut self,
        values: &'a HblankValues,
        register: Register<'a>,
    ) -> Option<HblankEffectId> {
        let index = self.free_indexes.pop()?;

        self.items[index as usize] = Some(Item {
            values,
            register,
            usages: 1,
            visible: true,
        });
        self.update = true;
        debug!(target: "hblank", "created effect {} for register {:#x}", index, register.address());
        Some(HblankEffectId(index))
    }

    fn item(&self, id: HblankEffectId) -> &Item<'a> {
        match &self.items[id.index()] {
            Some(item) => item,
            None => panic!("Invalid HBlank effect: {}", id.0),
        }
    }

    fn item_mut(&mut self, id: HblankEffectId) -> &mut Item<'a> {
        match &mut self.items[id.index()] {
            Some(item) => item,
            None => panic!("Invalid HBlank effect: {}", id.0),
        }
    }

    pub fn usages(&self, id: HblankEffectId) -> u16 {
        self.item(id).usages
    }

    pub fn increase_usages(&mut self, id: HblankEffectId) {
        self.item_mut(id).usages += 1;
    }

    /// Frees the slot when the last usage goes away.
    pub fn decrease_usages(&mut self, id: HblankEffectId) {
        let item = self.item_mut(id);
        item.usages -= 1;

        if item.usages == 0 {
            if item.visible {
                self.update = true;
            }

            self.items[id.index()] = None;
            let _ = self.free_indexes.push(id.0);
            debug!(target: "hblank", "released effect {}", id.0);
        }
    }

    pub fn values_ref(&self, id: HblankEffectId) -> &'a HblankValues {
        self.item(id).values
    }

    pub fn set_values_ref(&mut self, id: HblankEffectId, values: &'a HblankValues) {
        let item = self.item_mut(id);

        if !core::ptr::eq(item.values, values) {
            item.values = values;

            if item.visible {
                self.update = true;
            }
        }
    }

    /// Restages the effect after its values were rewritten in place.
    pub fn reload_values_ref(&mut self, id: HblankEffectId) {
        if self.item(id).visible {
            self.update = true;
        }
    }

    pub fn register(&self, id: HblankEffectId) -> Register<'a> {
        self.item(id).register
    }

    pub fn set_register(&mut self, id: HblankEffectId, register: Register<'a>) {
        let item = self.item_mut(id);

        if item.register != register {
            item.register = register;

            if item.visible {
                self.update = true;
            }
        }
    }

    pub fn visible(&self, id: HblankEffectId) -> bool {
        self.item(id).visible
    }

    pub fn set_visible(&mut self, id: HblankEffectId, visible: bool) {
        let item = self.item_mut(id);

        if item.visible != visible {
            item.visible = visible;
            self.update = true;
        }
    }

    /// Stages the visible entries for the next commit if anything changed.
    pub fn update(&mut self) {
        if !self.update {
            return;
        }

        self.update = false;

        let staging = unsafe { self.isr.staging() };
        let mut count = 0;

        for item in self.items.iter().flatten().filter(|item| item.visible) {
            staging[count] = HblankEntry {
                src: item.values.as_ptr(),
                dest: item.register.ptr,
            };
            count += 1;
        }

        self.staged_count = count;
        self.commit = true;
        trace!(target: "hblank", "staged {} entries", count);
    }

    /// Publishes the staged entries. Must run once per V-Blank.
    pub fn commit<R: IrqRegisters>(&mut self, irq: &mut InterruptDispatcher<'_, R>) {
        if !self.commit {
            return;
        }

        self.commit = false;

        let count = self.staged_count;
        let count_changed = count != self.committed_count;
        let isr = self.isr;

        irq.free(|_| {
            isr.swap_entries();

            if count_changed {
                isr.set_count(count);
            }
        });

        if count_changed {
            self.committed_count = count;
            debug!(target: "hblank", "committed entries count: {}", count);

            if self.enabled {
                self.install(irq);
            }
        }
    }

    fn install<R: IrqRegisters>(&self, irq: &mut InterruptDispatcher<'_, R>) {
        if self.committed_count > 0 {
            irq.replace_or_push_back(IrqId::HBlank, self.isr_handler);
            irq.enable(IrqId::HBlank);
        } else {
            irq.remove(IrqId::HBlank);
        }
    }

    pub fn committed_count(&self) -> usize {
        self.committed_count
    }

    /// Turns the H-Blank interrupt off without forgetting the committed
    /// entries.
    pub fn disable<R: IrqRegisters>(&mut self, irq: &mut InterruptDispatcher<'_, R>) {
        if self.enabled {
            self.enabled = false;
            irq.disable(IrqId::HBlank);
        }
    }

    pub fn enable<R: IrqRegisters>(&mut self, irq: &mut InterruptDispatcher<'_, R>) {
        if !self.enabled {
            self.enabled = true;
            self.install(irq);
        }
    }
}

impl Drop for HblankEffectsManager<'_> {
    fn drop(&mut self) {
        self.isr.clear();
    }
}
