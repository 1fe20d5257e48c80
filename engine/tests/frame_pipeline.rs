//! A whole frame of H-Blank effects, from `create` to the interrupt writing
//! registers, with the interrupt simulated by dispatching `HBLANK` once per
//! scanline.

use std::cell::Cell;
use std::sync::atomic::{AtomicU16, Ordering};

use gba_engine::config::{DISPLAY_HEIGHT, SCANLINES};
use gba_engine::hblank_effects::isr::HblankIsrData;
use gba_engine::hblank_effects::{HblankEffectsManager, HblankValues, Register};
use gba_engine::hw::flags::IrqFlags;
use gba_engine::irq::{InterruptDispatcher, IrqId, IrqRegisters, IrqTable};

struct Io {
    registers: [u16; 0x110],
    bios_if: u16,
}

impl Io {
    fn new() -> Self {
        Self {
            registers: [0; 0x110],
            bios_if: 0,
        }
    }
}

impl IrqRegisters for Io {
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

static HBLANK_DATA: HblankIsrData = HblankIsrData::new();
static VCOUNT: AtomicU16 = AtomicU16::new(0);

fn hblank_isr() {
    unsafe { HBLANK_DATA.service(VCOUNT.load(Ordering::Relaxed)) }
}

fn ramp() -> HblankValues {
    std::array::from_fn(|row| row as u16)
}

#[test]
fn three_effects_follow_the_scanlines() {
    let sources = [ramp(), ramp(), ramp()];
    let destinations = [Cell::new(0xFFFF), Cell::new(0xFFFF), Cell::new(0xFFFF)];
    let table = IrqTable::new();
    let mut irq = InterruptDispatcher::new(Io::new(), &table);
    irq.init();

    let mut effects = HblankEffectsManager::new(&HBLANK_DATA, hblank_isr);
    for (source, destination) in sources.iter().zip(&destinations) {
        effects.create(source, Register::from_cell(destination));
    }

    effects.update();
    effects.commit(&mut irq);
    assert!(irq.is_enabled(IrqId::HBlank));
    assert_eq!(HBLANK_DATA.count(), 3);

    let mut received: [Vec<u16>; 3] = Default::default();

    for vcount in 0..SCANLINES as u16 {
        VCOUNT.store(vcount, Ordering::Relaxed);
        for destination in &destinations {
            destination.set(0xFFFF);
        }

        irq.dispatch(IrqFlags::HBLANK);

        for (log, destination) in received.iter_mut().zip(&destinations) {
            if destination.get() != 0xFFFF {
                log.push(destination.get());
            }
        }
    }

    assert_eq!(irq.regs().bios_if, IrqFlags::HBLANK.bits());

    // one line ahead, then line 0 preloaded at the end of the blanking band
    let mut expected: Vec<u16> = (1..DISPLAY_HEIGHT as u16).collect();
    expected.push(0);

    for log in &received {
        assert_eq!(*log, expected);
    }

    // hiding an effect takes a new commit to reach the interrupt
    let hidden = effects.create(&sources[0], Register::from_cell(&destinations[0]));
    effects.set_visible(hidden, false);
    effects.update();
    effects.commit(&mut irq);
    assert_eq!(HBLANK_DATA.count(), 3);
}

#[test]
fn staged_entries_wait_for_commit() {
    let old_values = [1u16; DISPLAY_HEIGHT];
    let new_values = [2u16; DISPLAY_HEIGHT];
    let destination = Cell::new(0);
    let data = HblankIsrData::new();
    let table = IrqTable::new();
    let mut irq = InterruptDispatcher::new(Io::new(), &table);
    irq.init();

    let mut effects = HblankEffectsManager::new(&data, || {});
    let id = effects.create(&old_values, Register::from_cell(&destination));
    effects.update();
    effects.commit(&mut irq);

    effects.set_values_ref(id, &new_values);
    effects.update();

    unsafe { data.service(10) };
    assert_eq!(destination.get(), 1);

    effects.commit(&mut irq);

    unsafe { data.service(10) };
    assert_eq!(destination.get(), 2);
}
