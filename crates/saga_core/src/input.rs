//! Input events and key state.
//!
//! The director consumes input two ways each tick:
//!
//! - **Events** (`poll_events`): the OS queue drained exactly once. An event
//!   handed out by one call is never returned again, so a click that skips a
//!   cutscene cannot leak into the following game tick.
//!
//! - **Key state** (`key_state`): a level-triggered snapshot of the keys held
//!   down at sampling time. Used by stages for continuous movement.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    LShift,
    Escape,
    A,
    D,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseBtn {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    Quit,
    PointerPressed { button: MouseBtn, x: f64, y: f64 },
    KeyPressed(Key),
    KeyReleased(Key),
}

/// Source of input for the game and cutscene loops.
pub trait EventSource {
    /// Drain every event queued since the previous call.
    fn poll_events(&mut self) -> Vec<GameEvent>;

    /// Snapshot of the keys currently held down.
    fn key_state(&self) -> KeyState;
}

/// Keys held down at the moment the snapshot was taken.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyState {
    held: HashSet<Key>,
}

impl KeyState {
    pub fn is_down(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

impl FromIterator<Key> for KeyState {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        Self {
            held: iter.into_iter().collect(),
        }
    }
}

/// Tracks held and edge-triggered state for keys and mouse buttons as raw
/// platform events arrive.
pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,
    just_released: HashSet<Key>,

    mouse_held: HashSet<MouseBtn>,
    mouse_just_pressed: HashSet<MouseBtn>,

    pub pointer_position: (f64, f64),
}

impl InputState {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
            mouse_held: HashSet::new(),
            mouse_just_pressed: HashSet::new(),
            pointer_position: (0.0, 0.0),
        }
    }

    /// Returns true on the transition from released to held. OS key repeat
    /// produces no second edge.
    pub fn key_down(&mut self, key: Key) -> bool {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
            true
        } else {
            false
        }
    }

    pub fn key_up(&mut self, key: Key) -> bool {
        if self.held.remove(&key) {
            self.just_released.insert(key);
            true
        } else {
            false
        }
    }

    pub fn mouse_down(&mut self, btn: MouseBtn) -> bool {
        if self.mouse_held.insert(btn) {
            self.mouse_just_pressed.insert(btn);
            true
        } else {
            false
        }
    }

    pub fn mouse_up(&mut self, btn: MouseBtn) {
        self.mouse_held.remove(&btn);
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.just_released.contains(&key)
    }

    pub fn is_mouse_held(&self, btn: MouseBtn) -> bool {
        self.mouse_held.contains(&btn)
    }

    pub fn is_mouse_just_pressed(&self, btn: MouseBtn) -> bool {
        self.mouse_just_pressed.contains(&btn)
    }

    pub fn key_state(&self) -> KeyState {
        self.held.iter().copied().collect()
    }

    /// Forget everything held. Called when the window loses focus, since the
    /// matching release events will never arrive.
    pub fn release_all(&mut self) {
        self.held.clear();
        self.mouse_held.clear();
        self.end_frame();
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
        self.mouse_just_pressed.clear();
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}
