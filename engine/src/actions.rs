//! # Actions
//!
//! An action is a small task updated once per frame until it's done, usually
//! to animate a value:
//!
//! ```ignore
//! let scroll = Cell::new(Fixed::ZERO);
//! let slide = ToValueAction::new(&scroll, 60, Fixed::from_int(120));
//!
//! actions.run(&slide);
//!
//! loop {
//!     actions.update(); // slide is dropped from the set after 60 frames
//!     wait_for_vblank();
//! }
//! ```
//!
//! The manager doesn't own actions: it keeps references in a fixed capacity
//! hashed set keyed by address, so running the same action twice is a no-op.
//! Iteration follows hash order; actions must not depend on each other's
//! update order within a frame.

use core::cell::Cell;

use heapless::{FnvIndexMap, Vec};
use log::trace;

use crate::math::Fixed;

pub trait Action {
    fn update(&self);

    fn done(&self) -> bool;

    /// Set while the action is registered in a manager.
    fn running(&self) -> &Cell<bool>;
}

#[inline(always)]
fn key(action: &dyn Action) -> usize {
    action as *const dyn Action as *const () as usize
}

/// Running actions. `N` must be a power of two.
pub struct ActionsManager<'a, const N: usize> {
    actions: FnvIndexMap<usize, &'a dyn Action, N>,
}

impl<'a, const N: usize> ActionsManager<'a, N> {
    pub fn new() -> Self {
        Self {
            actions: FnvIndexMap::new(),
        }
    }

    pub fn running_count(&self) -> usize {
        self.actions.len()
    }

    pub fn available_count(&self) -> usize {
        N - self.actions.len()
    }

    pub fn contains(&self, action: &dyn Action) -> bool {
        self.actions.contains_key(&key(action))
    }

    /// Panics when `N` actions are already running.
    pub fn run(&mut self, action: &'a dyn Action) {
        let key = key(action);

        if self.actions.contains_key(&key) {
            return;
        }

        if self.actions.insert(key, action).is_err() {
            panic!("No more actions available");
        }

        action.running().set(true);
        trace!(target: "actions", "running {:#x}", key);
    }

    pub fn stop(&mut self, action: &dyn Action) {
        if self.actions.remove(&key(action)).is_some() {
            action.running().set(false);
        }
    }

    pub fn stop_all(&mut self) {
        for action in self.actions.values() {
            action.running().set(false);
        }

        self.actions.clear();
    }

    /// Updates every running action once. Actions reporting `done` are
    /// removed instead of updated.
    pub fn update(&mut self) {
        let mut finished: Vec<usize, N> = Vec::new();

        for (key, action) in self.actions.iter() {
            if action.done() {
                let _ = finished.push(*key);
            } else {
                action.update();
            }
        }

        for key in finished {
            if let Some(action) = self.actions.remove(&key) {
                action.running().set(false);
                trace!(target: "actions", "finished {:#x}", key);
            }
        }
    }
}

impl<const N: usize> Default for ActionsManager<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Moves a value to `final_value` in a fixed number of updates.
pub struct ToValueAction<'a> {
    target: &'a Cell<Fixed>,
    final_value: Fixed,
    delta: Fixed,
    duration_updates: u16,
    current_update: Cell<u16>,
    running: Cell<bool>,
}

impl<'a> ToValueAction<'a> {
    pub fn new(target: &'a Cell<Fixed>, duration_updates: u16, final_value: Fixed) -> Self {
        assert!(duration_updates > 0, "Invalid duration updates: {}", duration_updates);

        Self {
            target,
            final_value,
            delta: (final_value - target.get()) / duration_updates as i32,
            duration_updates,
            current_update: Cell::new(0),
            running: Cell::new(false),
        }
    }

    pub fn final_value(&self) -> Fixed {
        self.final_value
    }

    pub fn duration_updates(&self) -> u16 {
        self.duration_updates
    }
}

impl Action for ToValueAction<'_> {
    fn update(&self) {
        assert!(!self.done(), "Action is done");

        let update = self.current_update.get() + 1;
        self.current_update.set(update);

        // the last step lands exactly, whatever the rounding of delta
        if update == self.duration_updates {
            self.target.set(self.final_value);
        } else {
            self.target.set(self.target.get() + self.delta);
        }
    }

    fn done(&self) -> bool {
        self.current_update.get() == self.duration_updates
    }

    fn running(&self) -> &Cell<bool> {
        &self.running
    }
}

/// Adds `delta` to a value every update. Never done.
pub struct ByValueAction<'a> {
    target: &'a Cell<Fixed>,
    delta: Fixed,
    running: Cell<bool>,
}

impl<'a> ByValueAction<'a> {
    pub fn new(target: &'a Cell<Fixed>, delta: Fixed) -> Self {
        Self {
            target,
            delta,
            running: Cell::new(false),
        }
    }

    pub fn delta(&self) -> Fixed {
        self.delta
    }
}

impl Action for ByValueAction<'_> {
    fn update(&self) {
        self.target.set(self.target.get() + self.delta);
    }

    fn done(&self) -> bool {
        false
    }

    fn running(&self) -> &Cell<bool> {
        &self.running
    }
}

/// Moves a value back and forth between its initial value and
/// `final_value`. Never done.
pub struct LoopValueAction<'a> {
    target: &'a Cell<Fixed>,
    initial_value: Fixed,
    final_value: Fixed,
    delta: Fixed,
    duration_updates: u16,
    current_update: Cell<u16>,
    reverse: Cell<bool>,
    running: Cell<bool>,
}

impl<'a> LoopValueAction<'a> {
    pub fn new(target: &'a Cell<Fixed>, duration_updates: u16, final_value: Fixed) -> Self {
        assert!(duration_updates > 0, "Invalid duration updates: {}", duration_updates);

        let initial_value = target.get();

        Self {
            target,
            initial_value,
            final_value,
            delta: (final_value - initial_value) / duration_updates as i32,
            duration_updates,
            current_update: Cell::new(0),
            reverse: Cell::new(false),
            running: Cell::new(false),
        }
    }
}

impl Action for LoopValueAction<'_> {
    fn update(&self) {
        let update = self.current_update.get() + 1;
        let reverse = self.reverse.get();

        if update == self.duration_updates {
            self.current_update.set(0);
            self.reverse.set(!reverse);
            self.target.set(if reverse { self.initial_value } else { self.final_value });
        } else {
            self.current_update.set(update);
            let step = if reverse { -self.delta } else { self.delta };
            self.target.set(self.target.get() + step);
        }
    }

    fn done(&self) -> bool {
        false
    }

    fn running(&self) -> &Cell<bool> {
        &self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Countdown {
        remaining: Cell<u32>,
        updates: Cell<u32>,
        running: Cell<bool>,
    }

    impl Countdown {
        fn new(remaining: u32) -> Self {
            let result = Self::default();
            result.remaining.set(remaining);
            result
        }
    }

    impl Action for Countdown {
        fn update(&self) {
            self.updates.set(self.updates.get() + 1);
            self.remaining.set(self.remaining.get() - 1);
        }

        fn done(&self) -> bool {
            self.remaining.get() == 0
        }

        fn running(&self) -> &Cell<bool> {
            &self.running
        }
    }

    #[test]
    fn running_twice_is_a_no_op() {
        let action = Countdown::new(5);
        let mut actions = ActionsManager::<4>::new();

        actions.run(&action);
        actions.run(&action);

        assert_eq!(actions.running_count(), 1);
        assert!(action.running.get());
    }

    #[test]
    fn done_actions_are_removed_without_updating() {
        let action = Countdown::new(2);
        let mut actions = ActionsManager::<4>::new();
        actions.run(&action);

        actions.update();
        actions.update();
        assert_eq!(action.updates.get(), 2);
        assert_eq!(actions.running_count(), 1);

        actions.update();
        assert_eq!(action.updates.get(), 2);
        assert_eq!(actions.running_count(), 0);
        assert!(!action.running.get());
    }

    #[test]
    #[should_panic(expected = "No more actions available")]
    fn run_panics_when_full() {
        let pool: [Countdown; 3] = core::array::from_fn(|_| Countdown::new(1));
        let mut actions = ActionsManager::<2>::new();

        for action in &pool {
            actions.run(action);
        }
    }

    #[test]
    fn stop_and_stop_all() {
        let first = Countdown::new(3);
        let second = Countdown::new(3);
        let mut actions = ActionsManager::<4>::new();
        actions.run(&first);
        actions.run(&second);

        actions.stop(&first);
        assert!(!first.running.get());
        assert!(!actions.contains(&first));

        actions.stop_all();
        assert_eq!(actions.running_count(), 0);
        assert!(!second.running.get());
    }

    #[test]
    fn to_value_lands_on_final_value() {
        let value = Cell::new(Fixed::ZERO);
        let action = ToValueAction::new(&value, 3, Fixed::from_int(1));
        let mut actions = ActionsManager::<4>::new();
        actions.run(&action);

        actions.update();
        assert_eq!(value.get(), Fixed::from_data(Fixed::SCALE / 3));

        actions.update();
        actions.update();
        assert_eq!(value.get(), Fixed::ONE);
        assert!(action.done());

        actions.update();
        assert_eq!(actions.running_count(), 0);
    }

    #[test]
    fn by_value_never_ends() {
        let value = Cell::new(Fixed::from_int(10));
        let action = ByValueAction::new(&value, -Fixed::ONE);
        let mut actions = ActionsManager::<4>::new();
        actions.run(&action);

        for _ in 0..20 {
            actions.update();
        }

        assert_eq!(value.get(), Fixed::from_int(-10));
        assert_eq!(actions.running_count(), 1);
    }

    #[test]
    fn loop_value_goes_back_and_forth() {
        let value = Cell::new(Fixed::ZERO);
        let action = LoopValueAction::new(&value, 2, Fixed::from_int(4));

        action.update();
        assert_eq!(value.get(), Fixed::from_int(2));
        action.update();
        assert_eq!(value.get(), Fixed::from_int(4));
        action.update();
        assert_eq!(value.get(), Fixed::from_int(2));
        action.update();
        assert_eq!(value.get(), Fixed::ZERO);
        assert!(!action.done());
    }
}
