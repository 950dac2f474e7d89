//! Keyboard snapshots and the adapter turning them into events.
//!
//! The window layer polls the keyboard however it likes and hands a
//! [`Keyboard`](struct.Keyboard.html) snapshot to every tick; the adapter
//! diffs it against the previous snapshot and emits one `KeyPress` or
//! `KeyRelease` per transition, stamped at the tick's real time.

use cgmath::BaseFloat;

use events::Event;

/// The keys the kernel can bind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum KeyCode {
    /// Escape key.
    Escape,
    /// Space bar.
    Space,
    /// Letter A.
    A,
    /// Letter D.
    D,
    /// Letter P.
    P,
    /// Letter Q.
    Q,
    /// Letter R.
    R,
    /// Letter S.
    S,
    /// Letter W.
    W,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
}

impl KeyCode {
    /// Number of known keys.
    pub const COUNT: usize = 13;

    /// All known keys, in snapshot index order.
    pub const ALL: [KeyCode; KeyCode::COUNT] = [
        KeyCode::Escape,
        KeyCode::Space,
        KeyCode::A,
        KeyCode::D,
        KeyCode::P,
        KeyCode::Q,
        KeyCode::R,
        KeyCode::S,
        KeyCode::W,
        KeyCode::Up,
        KeyCode::Down,
        KeyCode::Left,
        KeyCode::Right,
    ];

    /// Position of this key in a snapshot.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Parse a symbolic key name, as found in keybinding files.
    pub fn from_name(name: &str) -> Option<KeyCode> {
        match name {
            "escape" => Some(KeyCode::Escape),
            "space" => Some(KeyCode::Space),
            "a" => Some(KeyCode::A),
            "d" => Some(KeyCode::D),
            "p" => Some(KeyCode::P),
            "q" => Some(KeyCode::Q),
            "r" => Some(KeyCode::R),
            "s" => Some(KeyCode::S),
            "w" => Some(KeyCode::W),
            "up" => Some(KeyCode::Up),
            "down" => Some(KeyCode::Down),
            "left" => Some(KeyCode::Left),
            "right" => Some(KeyCode::Right),
            _ => None,
        }
    }
}

/// Boolean snapshot of the keyboard, indexed by [`KeyCode`](enum.KeyCode.html).
#[derive(Clone, Debug, Default)]
pub struct Keyboard {
    pressed: [bool; KeyCode::COUNT],
}

impl Keyboard {
    /// All keys up.
    pub fn new() -> Self {
        Keyboard::default()
    }

    /// Mark a key as held down.
    pub fn press(&mut self, key: KeyCode) {
        self.pressed[key.index()] = true;
    }

    /// Mark a key as released.
    pub fn release(&mut self, key: KeyCode) {
        self.pressed[key.index()] = false;
    }

    /// Set a key's state from a polled value.
    pub fn set(&mut self, key: KeyCode, down: bool) {
        self.pressed[key.index()] = down;
    }

    /// Whether a key is currently down.
    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.pressed[key.index()]
    }
}

/// Diffs keyboard snapshots into key events.
#[derive(Debug, Default)]
pub struct InputAdapter {
    previous: Keyboard,
}

impl InputAdapter {
    /// Create an adapter with no keys held.
    pub fn new() -> Self {
        InputAdapter::default()
    }

    /// Compare the current snapshot against the previous one, emitting one
    /// event per key transition, stamped at real time `at`.
    pub fn poll<S>(&mut self, current: &Keyboard, at: S) -> Vec<(S, Event<S>)>
    where
        S: BaseFloat,
    {
        let mut events = Vec::new();
        for &key in &KeyCode::ALL {
            let was = self.previous.is_pressed(key);
            let is = current.is_pressed(key);
            if is && !was {
                events.push((at, Event::KeyPress(key)));
            }
            if was && !is {
                events.push((at, Event::KeyRelease(key)));
            }
        }
        self.previous = current.clone();
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_emit_events() {
        let mut adapter = InputAdapter::new();
        let mut keys = Keyboard::new();
        keys.press(KeyCode::W);

        let events = adapter.poll(&keys, 0.5f64);
        assert_eq!(events, vec![(0.5, Event::KeyPress(KeyCode::W))]);

        // held key stays silent
        assert!(adapter.poll(&keys, 0.6f64).is_empty());

        keys.release(KeyCode::W);
        keys.press(KeyCode::Space);
        let events = adapter.poll(&keys, 0.7f64);
        assert!(events.contains(&(0.7, Event::KeyPress(KeyCode::Space))));
        assert!(events.contains(&(0.7, Event::KeyRelease(KeyCode::W))));
    }

    #[test]
    fn test_key_names() {
        assert_eq!(KeyCode::from_name("escape"), Some(KeyCode::Escape));
        assert_eq!(KeyCode::from_name("up"), Some(KeyCode::Up));
        assert_eq!(KeyCode::from_name("bogus"), None);
        for &key in &KeyCode::ALL {
            assert_eq!(KeyCode::ALL[key.index()], key);
        }
    }
}
