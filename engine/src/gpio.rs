//! # Cartridge GPIO
//!
//! Some cartridges wire a real time clock and a rumble motor to the GPIO
//! port. The RTC is only initialized the first time it's queried, so games
//! that never ask for the time don't pay for it.
//!
//! Rumble is turned off while the console sleeps and restored on wake up.
//!
//! The manager is the only owner of the port. The RTC driver gets a
//! [`GpioPins`] view for the duration of each call: its direction writes go
//! through the manager's shadow of the write-only direction register, and
//! neither its data nor its direction writes can touch the rumble pin.

use core::fmt;

use bit_field::BitField;
use log::{debug, warn};

const RUMBLE_BIT: usize = 3;
const RUMBLE_MASK: u16 = 1 << RUMBLE_BIT;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RtcError {
    /// No clock answered on the GPIO port.
    NoRtc,
    /// The clock lost power and its date is meaningless.
    PowerFailure,
}

impl fmt::Display for RtcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RtcError::NoRtc => write!(f, "RTC not present"),
            RtcError::PowerFailure => write!(f, "RTC power failure"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Date {
    pub year: u16,
    pub month: u8,
    pub month_day: u8,
    pub week_day: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Time {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DateTime {
    pub date: Date,
    pub time: Time,
}

/// Clock chip behind the GPIO port. The wire protocol is up to the
/// implementation.
pub trait RtcDevice {
    fn init<G: GpioPort>(&mut self, pins: &mut GpioPins<'_, G>) -> Result<(), RtcError>;

    fn date_time<G: GpioPort>(&mut self, pins: &mut GpioPins<'_, G>) -> Option<DateTime>;
}

/// The three GPIO registers.
pub trait GpioPort {
    fn data(&self) -> u16;

    fn set_data(&mut self, value: u16);

    fn set_direction(&mut self, value: u16);

    fn set_readable(&mut self, readable: bool);
}

/// The port pins other than the rumble one, lent to the RTC driver.
pub struct GpioPins<'a, G: GpioPort> {
    port: &'a mut G,
    direction: &'a mut u16,
    rumble_enabled: bool,
}

impl<G: GpioPort> GpioPins<'_, G> {
    pub fn data(&self) -> u16 {
        self.port.data() & !RUMBLE_MASK
    }

    pub fn set_data(&mut self, value: u16) {
        let mut data = value;
        data.set_bit(RUMBLE_BIT, self.rumble_enabled);
        self.port.set_data(data);
    }

    /// Last value written to the direction register.
    pub fn direction(&self) -> u16 {
        *self.direction
    }

    pub fn set_direction(&mut self, value: u16) {
        let mut direction = value;
        direction.set_bit(RUMBLE_BIT, self.direction.get_bit(RUMBLE_BIT));
        *self.direction = direction;
        self.port.set_direction(direction);
    }

    pub fn set_readable(&mut self, readable: bool) {
        self.port.set_readable(readable);
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum RtcState {
    Uninitialized,
    Active,
    Failed(RtcError),
}

pub struct GpioManager<G: GpioPort, R: RtcDevice> {
    port: G,
    rtc: R,
    rtc_state: RtcState,
    direction: u16,
    rumble_enabled: bool,
    rumble_before_sleep: bool,
}

impl<G: GpioPort, R: RtcDevice> GpioManager<G, R> {
    pub fn new(port: G, rtc: R) -> Self {
        Self {
            port,
            rtc,
            rtc_state: RtcState::Uninitialized,
            direction: 0,
            rumble_enabled: false,
            rumble_before_sleep: false,
        }
    }

    pub fn port(&self) -> &G {
        &self.port
    }

    pub fn rtc(&self) -> &R {
        &self.rtc
    }

    fn rtc_and_pins(&mut self) -> (&mut R, GpioPins<'_, G>) {
        let pins = GpioPins {
            port: &mut self.port,
            direction: &mut self.direction,
            rumble_enabled: self.rumble_enabled,
        };

        (&mut self.rtc, pins)
    }

    fn init_rtc(&mut self) {
        if self.rtc_state != RtcState::Uninitialized {
            return;
        }

        let (rtc, mut pins) = self.rtc_and_pins();
        let result = rtc.init(&mut pins);

        self.rtc_state = match result {
            Ok(()) => {
                debug!(target: "gpio", "RTC initialized");
                RtcState::Active
            }
            Err(error) => {
                warn!(target: "gpio", "RTC init failed: {}", error);
                RtcState::Failed(error)
            }
        };
    }

    pub fn rtc_active(&mut self) -> bool {
        self.init_rtc();
        self.rtc_state == RtcState::Active
    }

    /// Why the RTC isn't active, once it has been queried.
    pub fn rtc_error(&self) -> Option<RtcError> {
        match self.rtc_state {
            RtcState::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn date_time(&mut self) -> Option<DateTime> {
        if self.rtc_active() {
            let (rtc, mut pins) = self.rtc_and_pins();
            rtc.date_time(&mut pins)
        } else {
            None
        }
    }

    pub fn date(&mut self) -> Option<Date> {
        self.date_time().map(|date_time| date_time.date)
    }

    pub fn time(&mut self) -> Option<Time> {
        self.date_time().map(|date_time| date_time.time)
    }

    pub fn rumble_enabled(&self) -> bool {
        self.rumble_enabled
    }

    pub fn set_rumble_enabled(&mut self, enabled: bool) {
        if !self.direction.get_bit(RUMBLE_BIT) {
            self.direction.set_bit(RUMBLE_BIT, true);
            self.port.set_readable(true);
            self.port.set_direction(self.direction);
        }

        let mut data = self.port.data();
        data.set_bit(RUMBLE_BIT, enabled);
        self.port.set_data(data);
        self.rumble_enabled = enabled;
    }

    pub fn sleep(&mut self) {
        self.rumble_before_sleep = self.rumble_enabled;

        if self.rumble_enabled {
            self.set_rumble_enabled(false);
        }
    }

    pub fn wake_up(&mut self) {
        if self.rumble_before_sleep {
            self.set_rumble_enabled(true);
        }
    }
}
