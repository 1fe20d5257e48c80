//! # Frame loop
//!
//! [`Engine`] ties the managers to the two synchronization points of a
//! frame: [`update`](Engine::update) while the frame is drawn, and
//! [`commit`](Engine::commit) right after V-Blank starts.
//!
//! ```ignore
//! let mut engine = Engine::new(
//!     Mmio,
//!     &IRQ_TABLE,
//!     &HBLANK_ISR_DATA,
//!     hblank_isr,
//!     sprites,
//!     unsafe { GbaGpio::new() },
//!     rtc,
//!     player,
//! );
//! unsafe { install_master_handler() };
//!
//! loop {
//!     game.update(&mut engine);
//!     engine.update();
//!
//!     wait_for_vblank();
//!
//!     if let Some(range) = engine.commit() {
//!         oam.commit_affine_mats(range, engine.affine_mats.registers());
//!     }
//! }
//! ```

use log::debug;

use crate::actions::ActionsManager;
use crate::affine_mats::{AffineCommitRange, AffineMatSprites, AffineMatsManager};
use crate::audio::{AudioChannel, AudioPlayer};
use crate::config::MAX_ACTIONS;
use crate::gpio::{GpioManager, GpioPort, RtcDevice};
use crate::hblank_effects::HblankEffectsManager;
use crate::hblank_effects::isr::HblankIsrData;
use crate::irq::{Handler, InterruptDispatcher, IrqRegisters, IrqTable};

pub struct Engine<'a, R, S, G, T, P>
where
    R: IrqRegisters,
    S: AffineMatSprites,
    G: GpioPort,
    T: RtcDevice,
    P: AudioPlayer,
{
    pub irq: InterruptDispatcher<'a, R>,
    pub hblank_effects: HblankEffectsManager<'a>,
    pub affine_mats: AffineMatsManager<S>,
    pub actions: ActionsManager<'a, MAX_ACTIONS>,
    pub gpio: GpioManager<G, T>,
    pub audio: AudioChannel<P>,
    sleeping: bool,
}

impl<'a, R, S, G, T, P> Engine<'a, R, S, G, T, P>
where
    R: IrqRegisters,
    S: AffineMatSprites,
    G: GpioPort,
    T: RtcDevice,
    P: AudioPlayer,
{
    /// Initializes the interrupt table and every manager.
    ///
    /// `irq_table` must be the table the master interrupt handler runs, and
    /// `hblank_isr` the handler servicing `hblank_data`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        irq_registers: R,
        irq_table: &'a IrqTable,
        hblank_data: &'a HblankIsrData,
        hblank_isr: Handler,
        sprites: S,
        gpio_port: G,
        rtc: T,
        player: P,
    ) -> Self {
        let mut irq = InterruptDispatcher::new(irq_registers, irq_table);
        irq.init();

        Self {
            irq,
            hblank_effects: HblankEffectsManager::new(hblank_data, hblank_isr),
            affine_mats: AffineMatsManager::new(sprites),
            actions: ActionsManager::new(),
            gpio: GpioManager::new(gpio_port, rtc),
            audio: AudioChannel::new(player),
            sleeping: false,
        }
    }

    /// Runs the actions, then stages what they changed.
    pub fn update(&mut self) {
        self.actions.update();
        self.affine_mats.update();
        self.hblank_effects.update();
    }

    /// Publishes the staged H-Blank effects and returns the affine matrices
    /// to upload to OAM. Must run during V-Blank.
    pub fn commit(&mut self) -> Option<AffineCommitRange> {
        self.hblank_effects.commit(&mut self.irq);
        self.affine_mats.retrieve_commit_data()
    }

    pub fn sleeping(&self) -> bool {
        self.sleeping
    }

    /// Silences everything that would keep running while the console
    /// sleeps.
    pub fn sleep(&mut self) {
        if self.sleeping {
            return;
        }

        self.hblank_effects.disable(&mut self.irq);
        self.gpio.sleep();
        self.audio.sleep();
        self.sleeping = true;
        debug!(target: "engine", "sleeping");
    }

    pub fn wake_up(&mut self) {
        if !self.sleeping {
            return;
        }

        self.audio.wake_up();
        self.gpio.wake_up();
        self.hblank_effects.enable(&mut self.irq);
        self.sleeping = false;
        debug!(target: "engine", "awake");
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;
    use crate::actions::ToValueAction;
    use crate::hblank_effects::Register;
    use crate::irq::IrqId;
    use crate::math::Fixed;
    use crate::test_support::{FakeGpio, FakeIo, FakePlayer, FakeRtc, FakeSprites};

    type TestEngine<'a> = Engine<'a, FakeIo, FakeSprites, FakeGpio, FakeRtc, FakePlayer>;

    fn noop() {}

    fn engine(data: &HblankIsrData) -> TestEngine<'_> {
        Engine::new(
            FakeIo::default(),
            Box::leak(Box::new(IrqTable::new())),
            data,
            noop,
            FakeSprites::default(),
            FakeGpio::default(),
            FakeRtc::new(Ok(()), None),
            FakePlayer::default(),
        )
    }

    static TUNE: [u8; 2] = [0, 1];

    #[test]
    fn commit_returns_affine_range() {
        let data = HblankIsrData::new();
        let mut engine = engine(&data);

        assert_eq!(engine.commit(), None);

        let id = engine.affine_mats.create();
        engine.update();
        assert_eq!(engine.commit(), Some(AffineCommitRange { offset: id.index(), count: 1 }));
    }

    #[test]
    fn update_runs_actions_before_staging() {
        let values = [1u16; 160];
        let destination = Cell::new(0);
        let value = Cell::new(Fixed::ZERO);
        let action = ToValueAction::new(&value, 1, Fixed::ONE);
        let data = HblankIsrData::new();
        let mut engine = engine(&data);

        engine.actions.run(&action);
        engine.hblank_effects.create(&values, Register::from_cell(&destination));
        engine.update();
        engine.commit();

        assert_eq!(value.get(), Fixed::ONE);
        assert_eq!(data.count(), 1);
        assert!(engine.irq.is_enabled(IrqId::HBlank));
    }

    #[test]
    fn sleep_and_wake_up() {
        let values = [1u16; 160];
        let destination = Cell::new(0);
        let data = HblankIsrData::new();
        let mut engine = engine(&data);

        engine.hblank_effects.create(&values, Register::from_cell(&destination));
        engine.update();
        engine.commit();
        engine.gpio.set_rumble_enabled(true);
        engine.audio.play(&TUNE, true);

        engine.sleep();
        assert!(engine.sleeping());
        assert!(!engine.irq.is_enabled(IrqId::HBlank));
        assert!(!engine.gpio.rumble_enabled());
        assert!(!engine.audio.playing());

        engine.wake_up();
        assert!(engine.irq.is_enabled(IrqId::HBlank));
        assert!(engine.gpio.rumble_enabled());
        assert!(engine.audio.playing());
    }
}
