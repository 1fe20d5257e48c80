//! # Interrupt dispatch
//!
//! The GBA has a single interrupt vector. [`InterruptDispatcher`] keeps a
//! table of per-source handlers and runs the ones whose request bit is set.
//!
//! Installing a handler and enabling its source are separate steps:
//!
//! ```ignore
//! let mut irq = InterruptDispatcher::new(Mmio, &IRQ_TABLE);
//! irq.init();
//! unsafe { install_master_handler() };
//!
//! irq.replace_or_push_back(IrqId::VBlank, on_vblank);
//! irq.enable(IrqId::VBlank);
//! ```
//!
//! The BIOS jumps through the vector at `$3007FFC` on every interrupt.
//! [`install_master_handler`] points it at [`irq_master_handler`], which runs
//! the handlers of [`IRQ_TABLE`]. The dispatcher only edits the table with
//! `IME` cleared, so the master handler never sees a half written entry.
//!
//! Enabling a source means setting its flag in the peripheral that raises it
//! (the *sender*, e.g. `DISPSTAT` for the display interrupts) and its bit in
//! `IE`. Both writes happen with `IME` cleared, and `IME` is restored to its
//! previous value afterwards.

use core::cell::Cell;

use log::{debug, trace};

use crate::hw::flags::IrqFlags;
use crate::hw::mmio::{self, Mmio};

/// Interrupt service routine.
pub type Handler = fn();

/// Offset of `IE` from the IO register base.
pub const IE_OFFSET: u16 = 0x200;
/// Offset of `IF` from the IO register base.
pub const IF_OFFSET: u16 = 0x202;
/// Offset of `IME` from the IO register base.
pub const IME_OFFSET: u16 = 0x208;

/// Access to the 16-bit IO registers, addressed by offset from `$4000000`.
pub trait IrqRegisters {
    fn read(&self, offset: u16) -> u16;

    fn write(&mut self, offset: u16, value: u16);

    /// Sets `flags` in the BIOS copy of `IF` at `$3007FF8`, which the
    /// `IntrWait` calls poll.
    fn acknowledge_bios(&mut self, flags: u16);
}

/// Interrupt sources, in `IE` bit order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IrqId {
    VBlank,
    HBlank,
    VCount,
    Timer0,
    Timer1,
    Timer2,
    Timer3,
    Serial,
    Dma0,
    Dma1,
    Dma2,
    Dma3,
    Keypad,
    GamePak,
}

/// Peripheral register that must allow a source to raise its interrupt.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IrqSender {
    pub offset: u16,
    pub flag: u16,
}

impl IrqId {
    pub const COUNT: usize = 14;

    pub const ALL: [IrqId; Self::COUNT] = [
        IrqId::VBlank,
        IrqId::HBlank,
        IrqId::VCount,
        IrqId::Timer0,
        IrqId::Timer1,
        IrqId::Timer2,
        IrqId::Timer3,
        IrqId::Serial,
        IrqId::Dma0,
        IrqId::Dma1,
        IrqId::Dma2,
        IrqId::Dma3,
        IrqId::Keypad,
        IrqId::GamePak,
    ];

    #[inline(always)]
    pub const fn flag(self) -> IrqFlags {
        IrqFlags::from_bits_truncate(1 << self as u16)
    }

    /// Sender register and flag, or `None` for the game pak interrupt.
    pub const fn sender(self) -> Option<IrqSender> {
        let (offset, flag) = match self {
            IrqId::VBlank => (0x0004, 0x0008),
            IrqId::HBlank => (0x0004, 0x0010),
            IrqId::VCount => (0x0004, 0x0020),
            IrqId::Timer0 => (0x0102, 0x0040),
            IrqId::Timer1 => (0x0106, 0x0040),
            IrqId::Timer2 => (0x010A, 0x0040),
            IrqId::Timer3 => (0x010E, 0x0040),
            IrqId::Serial => (0x0128, 0x4000),
            IrqId::Dma0 => (0x00BA, 0x4000),
            IrqId::Dma1 => (0x00C6, 0x4000),
            IrqId::Dma2 => (0x00D2, 0x4000),
            IrqId::Dma3 => (0x00DE, 0x4000),
            IrqId::Keypad => (0x0132, 0x4000),
            IrqId::GamePak => return None,
        };
        Some(IrqSender { offset, flag })
    }
}

type Entry = Option<(IrqId, Handler)>;

/// Installed handlers in installation order, readable from the interrupt.
pub struct IrqTable {
    entries: [Cell<Entry>; IrqId::COUNT],
    len: Cell<usize>,
}

// Single core: the dispatcher only writes with IME cleared.
unsafe impl Sync for IrqTable {}

impl IrqTable {
    pub const fn new() -> Self {
        Self {
            entries: [const { Cell::new(None) }; IrqId::COUNT],
            len: Cell::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.len.get()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn iter(&self) -> impl Iterator<Item = (IrqId, Handler)> + '_ {
        self.entries[..self.len()].iter().filter_map(Cell::get)
    }

    fn position(&self, id: IrqId) -> Option<usize> {
        self.iter().position(|(entry_id, _)| entry_id == id)
    }

    pub fn handler(&self, id: IrqId) -> Option<Handler> {
        self.iter().find(|(entry_id, _)| *entry_id == id).map(|(_, handler)| handler)
    }

    fn clear(&self) {
        for entry in &self.entries {
            entry.set(None);
        }

        self.len.set(0);
    }

    fn replace_or_push_back(&self, id: IrqId, handler: Handler) -> Option<Handler> {
        if let Some(index) = self.position(id) {
            let previous = self.entries[index].replace(Some((id, handler)));
            return previous.map(|(_, handler)| handler);
        }

        // one entry per source, so there's always room
        let len = self.len();
        self.entries[len].set(Some((id, handler)));
        self.len.set(len + 1);
        None
    }

    fn remove(&self, id: IrqId) -> Option<Handler> {
        let index = self.position(id)?;
        let len = self.len();
        let removed = self.entries[index].get();

        for next in index + 1..len {
            self.entries[next - 1].set(self.entries[next].get());
        }

        self.entries[len - 1].set(None);
        self.len.set(len - 1);
        removed.map(|(_, handler)| handler)
    }

    /// Runs the handlers of the sources in `active`, in table order.
    fn run(&self, active: IrqFlags) {
        for (id, handler) in self.iter() {
            if active.contains(id.flag()) {
                handler();
            }
        }
    }
}

impl Default for IrqTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Acknowledges the enabled sources in `pending`, in `IF` and in the BIOS
/// mirror, then runs their handlers.
pub fn dispatch_pending(regs: &mut impl IrqRegisters, table: &IrqTable, pending: IrqFlags) {
    let active = pending & IrqFlags::from_bits_truncate(regs.read(IE_OFFSET));

    regs.write(IF_OFFSET, active.bits());
    regs.acknowledge_bios(active.bits());
    table.run(active);
}

/// Handlers run on hardware.
pub static IRQ_TABLE: IrqTable = IrqTable::new();

/// Interrupt handler the BIOS calls, in ARM state, with [`IRQ_TABLE`].
#[cfg_attr(target_arch = "arm", instruction_set(arm::a32))]
pub extern "C" fn irq_master_handler() {
    let mut regs = Mmio;
    let pending = IrqFlags::from_bits_truncate(regs.read(IF_OFFSET));
    dispatch_pending(&mut regs, &IRQ_TABLE, pending);
}

/// Points the BIOS interrupt vector at [`irq_master_handler`].
///
/// # Safety
///
/// Only on hardware.
pub unsafe fn install_master_handler() {
    unsafe { mmio::set_irq_vector(irq_master_handler) }
    debug!(target: "irq", "master handler installed");
}

/// Dispatcher editing a handler table and the registers enabling its
/// sources.
pub struct InterruptDispatcher<'t, R: IrqRegisters> {
    regs: R,
    table: &'t IrqTable,
}

impl<'t, R: IrqRegisters> InterruptDispatcher<'t, R> {
    pub const fn new(regs: R, table: &'t IrqTable) -> Self {
        Self { regs, table }
    }

    /// Clears the handler table, disables and acknowledges every source and
    /// turns on the interrupt master enable.
    pub fn init(&mut self) {
        self.regs.write(IME_OFFSET, 0);
        self.table.clear();
        self.regs.write(IE_OFFSET, 0);
        self.regs.write(IF_OFFSET, IrqFlags::all().bits());
        self.regs.write(IME_OFFSET, 1);
        debug!(target: "irq", "interrupt table initialized");
    }

    /// Runs `f` with `IME` cleared, restoring its previous value afterwards.
    pub fn free<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let ime = self.regs.read(IME_OFFSET);
        self.regs.write(IME_OFFSET, 0);
        let result = f(self);
        self.regs.write(IME_OFFSET, ime);
        result
    }

    pub fn enable(&mut self, id: IrqId) {
        self.free(|irq| {
            if let Some(sender) = id.sender() {
                let value = irq.regs.read(sender.offset);
                irq.regs.write(sender.offset, value | sender.flag);
            }

            let ie = irq.regs.read(IE_OFFSET);
            irq.regs.write(IE_OFFSET, ie | id.flag().bits());
        });
        trace!(target: "irq", "enabled {:?}", id);
    }

    pub fn disable(&mut self, id: IrqId) {
        self.free(|irq| {
            if let Some(sender) = id.sender() {
                let value = irq.regs.read(sender.offset);
                irq.regs.write(sender.offset, value & !sender.flag);
            }

            let ie = irq.regs.read(IE_OFFSET);
            irq.regs.write(IE_OFFSET, ie & !id.flag().bits());
        });
        trace!(target: "irq", "disabled {:?}", id);
    }

    pub fn is_enabled(&self, id: IrqId) -> bool {
        IrqFlags::from_bits_truncate(self.regs.read(IE_OFFSET)).contains(id.flag())
    }

    pub fn handler(&self, id: IrqId) -> Option<Handler> {
        self.table.handler(id)
    }

    /// Replaces the handler of `id` if there's one, otherwise appends it to
    /// the back of the table. Returns the replaced handler.
    ///
    /// The enabled state of the source is left untouched.
    pub fn replace_or_push_back(&mut self, id: IrqId, handler: Handler) -> Option<Handler> {
        self.free(|irq| irq.table.replace_or_push_back(id, handler))
    }

    /// Disables `id` and removes its handler. The order of the remaining
    /// handlers is preserved.
    pub fn remove(&mut self, id: IrqId) -> Option<Handler> {
        self.disable(id);
        self.free(|irq| irq.table.remove(id))
    }

    /// Runs the handlers of the enabled sources in `pending`, in table order,
    /// and acknowledges them.
    pub fn dispatch(&mut self, pending: IrqFlags) {
        dispatch_pending(&mut self.regs, self.table, pending);
    }

    /// Reads `IF` and dispatches it.
    pub fn service(&mut self) {
        let pending = IrqFlags::from_bits_truncate(self.regs.read(IF_OFFSET));
        self.dispatch(pending);
    }

    pub fn table(&self) -> &'t IrqTable {
        self.table
    }

    pub fn regs(&self) -> &R {
        &self.regs
    }

    pub fn regs_mut(&mut self) -> &mut R {
        &mut self.regs
    }
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::test_support::FakeIo;

    static VBLANK_CALLS: AtomicU32 = AtomicU32::new(0);
    static SERIAL_CALLS: AtomicU32 = AtomicU32::new(0);
    static TIMER_CALLS: AtomicU32 = AtomicU32::new(0);

    fn on_vblank() {
        VBLANK_CALLS.fetch_add(1, Ordering::Relaxed);
    }

    fn on_serial() {
        SERIAL_CALLS.fetch_add(1, Ordering::Relaxed);
    }

    fn on_timer() {
        TIMER_CALLS.fetch_add(1, Ordering::Relaxed);
    }

    fn noop() {}

    fn dispatcher() -> InterruptDispatcher<'static, FakeIo> {
        let table = Box::leak(Box::new(IrqTable::new()));
        let mut irq = InterruptDispatcher::new(FakeIo::default(), table);
        irq.init();
        irq
    }

    #[test]
    fn sender_table_matches_hardware() {
        assert_eq!(IrqId::HBlank.sender(), Some(IrqSender { offset: 0x0004, flag: 0x0010 }));
        assert_eq!(IrqId::Serial.sender(), Some(IrqSender { offset: 0x0128, flag: 0x4000 }));
        assert_eq!(IrqId::Dma3.sender(), Some(IrqSender { offset: 0x00DE, flag: 0x4000 }));
        assert_eq!(IrqId::GamePak.sender(), None);
        assert_eq!(IrqId::Keypad.flag(), IrqFlags::KEYPAD);
    }

    #[test]
    fn enable_sets_sender_and_ie_and_restores_ime() {
        let mut irq = dispatcher();
        irq.enable(IrqId::HBlank);

        assert!(irq.is_enabled(IrqId::HBlank));
        assert_eq!(irq.regs().read(0x0004) & 0x0010, 0x0010);
        assert_eq!(irq.regs().read(IME_OFFSET), 1);

        irq.disable(IrqId::HBlank);
        assert!(!irq.is_enabled(IrqId::HBlank));
        assert_eq!(irq.regs().read(0x0004) & 0x0010, 0);
    }

    #[test]
    fn ime_is_cleared_inside_critical_sections() {
        let mut irq = dispatcher();
        let ime_inside = irq.free(|irq| irq.regs().read(IME_OFFSET));

        assert_eq!(ime_inside, 0);
        assert_eq!(irq.regs().read(IME_OFFSET), 1);
    }

    #[test]
    fn replace_returns_previous_handler() {
        let mut irq = dispatcher();

        assert!(irq.replace_or_push_back(IrqId::Serial, noop).is_none());
        let previous = irq.replace_or_push_back(IrqId::Serial, on_serial);
        assert!(previous.is_some());
        assert!(!irq.is_enabled(IrqId::Serial));
    }

    #[test]
    fn dispatch_runs_only_enabled_sources() {
        let mut irq = dispatcher();
        irq.replace_or_push_back(IrqId::VBlank, on_vblank);
        irq.replace_or_push_back(IrqId::Serial, on_serial);
        irq.enable(IrqId::VBlank);

        let vblank_before = VBLANK_CALLS.load(Ordering::Relaxed);
        let serial_before = SERIAL_CALLS.load(Ordering::Relaxed);
        irq.dispatch(IrqFlags::VBLANK | IrqFlags::SERIAL);

        assert_eq!(VBLANK_CALLS.load(Ordering::Relaxed), vblank_before + 1);
        assert_eq!(SERIAL_CALLS.load(Ordering::Relaxed), serial_before);
        assert_eq!(irq.regs().read(IF_OFFSET), IrqFlags::VBLANK.bits());
        assert_eq!(irq.regs().bios_if, IrqFlags::VBLANK.bits());
    }

    #[test]
    fn enabled_source_without_handler_is_acknowledged_only() {
        let mut irq = dispatcher();
        irq.replace_or_push_back(IrqId::Timer0, on_timer);
        irq.enable(IrqId::Keypad);

        let timer_before = TIMER_CALLS.load(Ordering::Relaxed);
        irq.dispatch(IrqFlags::KEYPAD);

        assert_eq!(TIMER_CALLS.load(Ordering::Relaxed), timer_before);
        assert_eq!(irq.regs().read(IF_OFFSET), IrqFlags::KEYPAD.bits());
        assert_eq!(irq.regs().bios_if, IrqFlags::KEYPAD.bits());
    }

    #[test]
    fn table_is_shared_with_the_interrupt_side() {
        let table = IrqTable::new();
        let mut irq = InterruptDispatcher::new(FakeIo::default(), &table);
        irq.init();
        irq.replace_or_push_back(IrqId::VBlank, on_vblank);
        irq.enable(IrqId::VBlank);

        let mut regs = FakeIo::default();
        regs.write(IE_OFFSET, IrqFlags::VBLANK.bits());
        regs.bios_if = IrqFlags::TIMER0.bits();

        let vblank_before = VBLANK_CALLS.load(Ordering::Relaxed);
        dispatch_pending(&mut regs, &table, IrqFlags::VBLANK);

        assert_eq!(VBLANK_CALLS.load(Ordering::Relaxed), vblank_before + 1);
        assert_eq!(regs.bios_if, (IrqFlags::VBLANK | IrqFlags::TIMER0).bits());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn remove_disables_and_keeps_order() {
        let mut irq = dispatcher();
        irq.replace_or_push_back(IrqId::VBlank, noop);
        irq.replace_or_push_back(IrqId::HBlank, noop);
        irq.replace_or_push_back(IrqId::Serial, noop);
        irq.enable(IrqId::HBlank);

        assert!(irq.remove(IrqId::HBlank).is_some());
        assert!(irq.remove(IrqId::HBlank).is_none());
        assert!(!irq.is_enabled(IrqId::HBlank));
        assert!(irq.handler(IrqId::VBlank).is_some());
        assert!(irq.handler(IrqId::Serial).is_some());

        let order: std::vec::Vec<IrqId> = irq.table().iter().map(|(id, _)| id).collect();
        assert_eq!(order, [IrqId::VBlank, IrqId::Serial]);
    }
}
