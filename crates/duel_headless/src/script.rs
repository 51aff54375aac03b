//! Timed key-event scripts.
//!
//! A script is a RON list of key events stamped with match time in
//! milliseconds. [`ScriptedKeyboard`] feeds them into a
//! [`KeyboardInput`] as the match clock reaches them, so a headless run
//! exercises the same key handling as a live keyboard.

use std::path::Path;
use std::time::Duration;

use duel_core::input::{FrameInput, InputSource, KeyBindings, KeyboardInput, Side};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for script operations.
#[derive(Error, Debug)]
pub enum ScriptError {
    /// File not found.
    #[error("Script file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read script file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse script: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// A key no fighter is bound to.
    #[error("Script event at {at_ms} ms uses unbound key {key:?}")]
    UnboundKey {
        /// Event time.
        at_ms: u64,
        /// The key.
        key: String,
    },
}

/// Press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyMotion {
    /// Key pressed.
    Down,
    /// Key released.
    Up,
}

/// One scripted key event: `(at_ms, key, down|up)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent(pub u64, pub String, pub KeyMotion);

impl KeyEvent {
    /// Match time the event fires at.
    #[must_use]
    pub const fn at(&self) -> Duration {
        Duration::from_millis(self.0)
    }
}

/// A named list of key events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputScript {
    /// Script name, used as the recording label.
    pub name: String,
    /// Events. Sorted by time on load; ties keep file order.
    pub events: Vec<KeyEvent>,
}

impl Default for InputScript {
    fn default() -> Self {
        Self::idle()
    }
}

impl InputScript {
    /// No input at all. The match runs out the clock.
    #[must_use]
    pub fn idle() -> Self {
        Self {
            name: "idle".to_string(),
            events: Vec::new(),
        }
    }

    /// Player walks into range and attacks until the enemy falls.
    #[must_use]
    pub fn rush() -> Self {
        let mut events = vec![KeyEvent(0, "d".to_string(), KeyMotion::Down)];
        events.push(KeyEvent(1_200, "d".to_string(), KeyMotion::Up));
        for i in 0..12 {
            let at = 1_300 + i * 250;
            events.push(KeyEvent(at, " ".to_string(), KeyMotion::Down));
            events.push(KeyEvent(at + 50, " ".to_string(), KeyMotion::Up));
        }
        Self {
            name: "rush".to_string(),
            events,
        }
    }

    /// Load a script from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScriptError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScriptError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Parse a script from a RON string.
    pub fn from_ron_str(text: &str) -> Result<Self, ScriptError> {
        let mut script: Self = ron::from_str(text)?;
        script.events.sort_by_key(|e| e.0);
        Ok(script)
    }

    /// Reject events on keys neither fighter is bound to.
    pub fn check_keys(&self, player: &KeyBindings, enemy: &KeyBindings) -> Result<(), ScriptError> {
        for KeyEvent(at_ms, key, _) in &self.events {
            if player.action_for(key).is_none() && enemy.action_for(key).is_none() {
                return Err(ScriptError::UnboundKey {
                    at_ms: *at_ms,
                    key: key.clone(),
                });
            }
        }
        Ok(())
    }

    /// Time of the last event.
    #[must_use]
    pub fn last_event(&self) -> Duration {
        self.events.last().map_or(Duration::ZERO, KeyEvent::at)
    }
}

/// Keyboard driven by a script instead of a person.
#[derive(Debug, Clone)]
pub struct ScriptedKeyboard {
    keyboard: KeyboardInput,
    events: Vec<KeyEvent>,
    cursor: usize,
}

impl ScriptedKeyboard {
    /// Wrap a keyboard with the given bindings.
    #[must_use]
    pub fn new(script: &InputScript, player: KeyBindings, enemy: KeyBindings) -> Self {
        Self {
            keyboard: KeyboardInput::new(player, enemy),
            events: script.events.clone(),
            cursor: 0,
        }
    }

    /// Deliver every event due at or before `now`. Returns how many fired.
    pub fn feed(&mut self, now: Duration) -> usize {
        let start = self.cursor;
        while let Some(KeyEvent(at_ms, key, motion)) = self.events.get(self.cursor) {
            if Duration::from_millis(*at_ms) > now {
                break;
            }
            match motion {
                KeyMotion::Down => self.keyboard.key_down(key),
                KeyMotion::Up => self.keyboard.key_up(key),
            }
            self.cursor += 1;
        }
        self.cursor - start
    }

    /// Events not yet delivered.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.events.len() - self.cursor
    }

    /// The wrapped keyboard.
    #[must_use]
    pub const fn keyboard(&self) -> &KeyboardInput {
        &self.keyboard
    }
}

impl InputSource for ScriptedKeyboard {
    fn poll(&mut self, side: Side) -> FrameInput {
        self.keyboard.poll(side)
    }

    fn shutdown(&mut self) {
        self.keyboard.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyboard(script: &InputScript) -> ScriptedKeyboard {
        ScriptedKeyboard::new(
            script,
            KeyBindings::player_default(),
            KeyBindings::enemy_default(),
        )
    }

    #[test]
    fn test_parse_sorts_events() {
        let script = InputScript::from_ron_str(
            r#"(
                name: "walk",
                events: [
                    (500, "d", up),
                    (0, "d", down),
                    (0, "ArrowLeft", down),
                ],
            )"#,
        )
        .unwrap();
        let times: Vec<_> = script.events.iter().map(|e| e.0).collect();
        assert_eq!(times, vec![0, 0, 500]);
        assert_eq!(script.events[0].1, "d");
        assert_eq!(script.last_event(), Duration::from_millis(500));
    }

    #[test]
    fn test_bad_motion_is_parse_error() {
        let result = InputScript::from_ron_str(r#"(name: "x", events: [(0, "d", sideways)])"#);
        assert!(matches!(result, Err(ScriptError::ParseError(_))));
    }

    #[test]
    fn test_unbound_key_rejected() {
        let script = InputScript::from_ron_str(r#"(name: "x", events: [(40, "q", down)])"#).unwrap();
        let err = script
            .check_keys(&KeyBindings::player_default(), &KeyBindings::enemy_default())
            .unwrap_err();
        assert!(matches!(err, ScriptError::UnboundKey { at_ms: 40, .. }));
    }

    #[test]
    fn test_feed_delivers_due_events_only() {
        let script = InputScript::from_ron_str(
            r#"(name: "x", events: [(0, "d", down), (100, "d", up)])"#,
        )
        .unwrap();
        let mut kb = keyboard(&script);

        assert_eq!(kb.feed(Duration::ZERO), 1);
        assert!(kb.poll(Side::Player).keys.right);
        assert_eq!(kb.feed(Duration::from_millis(99)), 0);
        assert!(kb.poll(Side::Player).keys.right);
        assert_eq!(kb.feed(Duration::from_millis(100)), 1);
        assert!(!kb.poll(Side::Player).keys.right);
        assert_eq!(kb.remaining(), 0);
    }

    #[test]
    fn test_tap_within_one_frame_still_attacks() {
        let script = InputScript::from_ron_str(
            r#"(name: "x", events: [(5, "Enter", down), (6, "Enter", up)])"#,
        )
        .unwrap();
        let mut kb = keyboard(&script);
        kb.feed(Duration::from_millis(16));
        assert!(kb.poll(Side::Enemy).attack);
        assert!(!kb.poll(Side::Enemy).attack);
        assert!(!kb.poll(Side::Player).attack);
    }

    #[test]
    fn test_builtin_scripts_use_bound_keys() {
        let player = KeyBindings::player_default();
        let enemy = KeyBindings::enemy_default();
        assert!(InputScript::idle().check_keys(&player, &enemy).is_ok());
        assert!(InputScript::rush().check_keys(&player, &enemy).is_ok());
    }
}
