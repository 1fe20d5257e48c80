//! Playback state on top of an external audio player.
//!
//! The mixer itself lives outside the engine. [`AudioChannel`] only tracks
//! whether something is playing, so sleeping can pause exactly what was
//! playing and waking up can resume it.

use log::debug;

/// The external player driving the sound hardware.
pub trait AudioPlayer {
    fn play(&mut self, data: &'static [u8], looped: bool);

    fn stop(&mut self);

    fn pause(&mut self);

    fn resume(&mut self);

    /// Playback position in bytes.
    fn offset(&self) -> usize;

    fn set_offset(&mut self, offset: usize);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

pub struct AudioChannel<P: AudioPlayer> {
    player: P,
    state: PlaybackState,
    paused_by_sleep: bool,
}

impl<P: AudioPlayer> AudioChannel<P> {
    pub fn new(player: P) -> Self {
        Self {
            player,
            state: PlaybackState::Stopped,
            paused_by_sleep: false,
        }
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn play(&mut self, data: &'static [u8], looped: bool) {
        self.player.play(data, looped);
        self.state = PlaybackState::Playing;
        self.paused_by_sleep = false;
    }

    pub fn stop(&mut self) {
        if self.state != PlaybackState::Stopped {
            self.player.stop();
            self.state = PlaybackState::Stopped;
            self.paused_by_sleep = false;
        }
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.player.pause();
            self.state = PlaybackState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == PlaybackState::Paused {
            self.player.resume();
            self.state = PlaybackState::Playing;
            self.paused_by_sleep = false;
        }
    }

    pub fn offset(&self) -> usize {
        self.player.offset()
    }

    pub fn set_offset(&mut self, offset: usize) {
        self.player.set_offset(offset);
    }

    pub fn sleep(&mut self) {
        if self.playing() {
            self.pause();
            self.paused_by_sleep = true;
            debug!(target: "audio", "paused for sleep");
        }
    }

    pub fn wake_up(&mut self) {
        if self.paused_by_sleep {
            self.resume();
        }
    }
}
