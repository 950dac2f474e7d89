//! Logical actions and the key bindings that trigger them.

use std::collections::HashMap;

use input::KeyCode;

/// Logical game actions a key can be bound to.
///
/// The quit, pause, reset and regenerate actions fire once on key press.
/// The jetpack actions are held: pressing adds a thrust vector to the
/// player's acceleration, releasing removes it again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum Action {
    /// Leave the game.
    Quit,
    /// Toggle the pause state.
    Pause,
    /// Put the player back at the level's starting position and velocity.
    Reset,
    /// Re-roll the level's generated terrain.
    Regenerate,
    /// Thrust upward while held.
    JetpackUp,
    /// Thrust to the left while held.
    JetpackLeft,
    /// Thrust to the right while held.
    JetpackRight,
}

impl Action {
    /// Parse a logical action name, as found in keybinding files.
    pub fn from_name(name: &str) -> Option<Action> {
        match name {
            "quit" => Some(Action::Quit),
            "pause" => Some(Action::Pause),
            "reset" => Some(Action::Reset),
            "regenerate" => Some(Action::Regenerate),
            "jetpack_up" => Some(Action::JetpackUp),
            "jetpack_left" => Some(Action::JetpackLeft),
            "jetpack_right" => Some(Action::JetpackRight),
            _ => None,
        }
    }
}

/// Raised when a keybinding entry cannot be resolved.
#[derive(Debug, Fail)]
pub enum BindingError {
    /// A symbolic key name was not recognised.
    #[fail(display = "unknown key name: {}", _0)]
    UnknownKey(String),
    /// A logical action name was not recognised.
    #[fail(display = "unknown action name: {}", _0)]
    UnknownAction(String),
}

/// Map from keys to the actions they trigger.
#[derive(Clone, Debug)]
pub struct Bindings {
    map: HashMap<KeyCode, Vec<Action>>,
}

impl Bindings {
    /// An empty map, binding nothing.
    pub fn new() -> Self {
        Bindings {
            map: HashMap::new(),
        }
    }

    /// Bind an action to a list of symbolic key names.
    pub fn bind(&mut self, action: Action, keys: &[&str]) -> Result<(), BindingError> {
        for name in keys {
            let key = KeyCode::from_name(name)
                .ok_or_else(|| BindingError::UnknownKey((*name).to_string()))?;
            self.map.entry(key).or_insert_with(Vec::new).push(action);
        }
        Ok(())
    }

    /// Bind an action given by name, for callers working from config text.
    pub fn bind_named(&mut self, action: &str, keys: &[&str]) -> Result<(), BindingError> {
        let action =
            Action::from_name(action).ok_or_else(|| BindingError::UnknownAction(action.to_string()))?;
        self.bind(action, keys)
    }

    /// The actions bound to a key, in binding order.
    pub fn actions(&self, key: KeyCode) -> &[Action] {
        self.map.get(&key).map(|actions| &actions[..]).unwrap_or(&[])
    }
}

impl Default for Bindings {
    /// The standard keymap: escape or q to quit, p to pause, space to reset
    /// the player, r to re-roll the terrain, and w/a/d or the arrows for the
    /// jetpack.
    fn default() -> Self {
        let mut bindings = Bindings::new();
        let defaults: [(Action, &[&str]); 7] = [
            (Action::Quit, &["escape", "q"]),
            (Action::Pause, &["p"]),
            (Action::Reset, &["space"]),
            (Action::Regenerate, &["r"]),
            (Action::JetpackUp, &["w", "up"]),
            (Action::JetpackLeft, &["a", "left"]),
            (Action::JetpackRight, &["d", "right"]),
        ];
        for &(action, keys) in &defaults {
            bindings
                .bind(action, keys)
                .expect("standard keymap uses known keys");
        }
        bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_keymap() {
        let bindings = Bindings::default();
        assert_eq!(bindings.actions(KeyCode::Escape), &[Action::Quit]);
        assert_eq!(bindings.actions(KeyCode::Q), &[Action::Quit]);
        assert_eq!(bindings.actions(KeyCode::W), &[Action::JetpackUp]);
        assert_eq!(bindings.actions(KeyCode::Down), &[]);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut bindings = Bindings::new();
        match bindings.bind(Action::Quit, &["escape", "hyperspace"]) {
            Err(BindingError::UnknownKey(name)) => assert_eq!(name, "hyperspace"),
            other => panic!("expected an unknown key error, got {:?}", other),
        }
    }

    #[test]
    fn test_bind_by_name() {
        let mut bindings = Bindings::new();
        bindings.bind_named("pause", &["p"]).unwrap();
        assert_eq!(bindings.actions(KeyCode::P), &[Action::Pause]);
        match bindings.bind_named("dance", &["p"]) {
            Err(BindingError::UnknownAction(name)) => assert_eq!(name, "dance"),
            other => panic!("expected an unknown action error, got {:?}", other),
        }
    }

    #[test]
    fn test_multiple_actions_per_key() {
        let mut bindings = Bindings::new();
        bindings.bind(Action::Pause, &["p"]).unwrap();
        bindings.bind(Action::Reset, &["p"]).unwrap();
        assert_eq!(bindings.actions(KeyCode::P), &[Action::Pause, Action::Reset]);
    }
}
