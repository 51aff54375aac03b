//! Input mapping from physical keys to per-fighter control snapshots.
//!
//! The simulation never sees key events. Each frame the match controller
//! polls an [`InputSource`] once per fighter and gets an immutable
//! [`FrameInput`] back; what produced it (a keyboard, a script, a
//! recording) is the collaborator's business.

use serde::{Deserialize, Serialize};

/// Which of the two fighters an input, task or result refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// The first fighter (left side of the keyboard by default).
    Player,
    /// The second locally-controlled fighter.
    Enemy,
}

impl Side {
    /// Both sides in evaluation order.
    pub const ALL: [Side; 2] = [Side::Player, Side::Enemy];

    /// Stable index for per-side arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Side::Player => 0,
            Side::Enemy => 1,
        }
    }

    /// Lowercase name for logs and error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Side::Player => "player",
            Side::Enemy => "enemy",
        }
    }
}

/// Held-key state for one fighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct InputState {
    /// Move-left key is held.
    pub left: bool,
    /// Move-right key is held.
    pub right: bool,
    /// Jump key is held.
    pub jump: bool,
}

impl InputState {
    /// True when exactly one horizontal direction is held.
    #[must_use]
    pub const fn has_horizontal(&self) -> bool {
        self.left != self.right
    }
}

/// Everything a fighter needs from the input layer for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FrameInput {
    /// Held movement keys.
    pub keys: InputState,
    /// The attack key went down since the previous poll.
    pub attack: bool,
}

impl FrameInput {
    /// No keys held, no attack.
    pub const NEUTRAL: Self = Self {
        keys: InputState {
            left: false,
            right: false,
            jump: false,
        },
        attack: false,
    };
}

/// Source of per-frame input snapshots.
pub trait InputSource {
    /// Take this frame's snapshot for `side`.
    ///
    /// Called exactly once per side per frame. Edge-triggered state such
    /// as an attack press is consumed by the call.
    fn poll(&mut self, side: Side) -> FrameInput;

    /// Stop delivering input. Subsequent polls return neutral input.
    fn shutdown(&mut self);
}

/// Logical action a key can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyAction {
    /// Move left.
    Left,
    /// Move right.
    Right,
    /// Jump.
    Jump,
    /// Start an attack.
    Attack,
}

impl KeyAction {
    /// Lowercase name for messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            KeyAction::Left => "left",
            KeyAction::Right => "right",
            KeyAction::Jump => "jump",
            KeyAction::Attack => "attack",
        }
    }
}

/// Physical key identifiers for one fighter's four actions.
///
/// Identifiers are opaque strings compared verbatim (`"a"`, `"ArrowLeft"`,
/// `" "` for space).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyBindings {
    /// Key for moving left.
    pub left: String,
    /// Key for moving right.
    pub right: String,
    /// Key for jumping.
    pub jump: String,
    /// Key for attacking.
    pub attack: String,
}

impl KeyBindings {
    /// Default bindings for the player: `a`/`d`/`w`, space to attack.
    #[must_use]
    pub fn player_default() -> Self {
        Self {
            left: "a".to_string(),
            right: "d".to_string(),
            jump: "w".to_string(),
            attack: " ".to_string(),
        }
    }

    /// Default bindings for the enemy: arrow keys, enter to attack.
    #[must_use]
    pub fn enemy_default() -> Self {
        Self {
            left: "ArrowLeft".to_string(),
            right: "ArrowRight".to_string(),
            jump: "ArrowUp".to_string(),
            attack: "Enter".to_string(),
        }
    }

    /// All bindings paired with their action.
    #[must_use]
    pub fn entries(&self) -> [(KeyAction, &str); 4] {
        [
            (KeyAction::Left, self.left.as_str()),
            (KeyAction::Right, self.right.as_str()),
            (KeyAction::Jump, self.jump.as_str()),
            (KeyAction::Attack, self.attack.as_str()),
        ]
    }

    /// The action bound to `key`, if any.
    #[must_use]
    pub fn action_for(&self, key: &str) -> Option<KeyAction> {
        self.entries()
            .into_iter()
            .find(|(_, bound)| *bound == key)
            .map(|(action, _)| action)
    }
}

/// Keyboard-backed input source.
///
/// Key-down/key-up events update held flags for whichever fighter owns the
/// key. An attack fires on key-down only and is latched until the next
/// poll, so a tap shorter than a frame still registers. After
/// [`shutdown`](InputSource::shutdown) all events are ignored.
#[derive(Debug, Clone)]
pub struct KeyboardInput {
    bindings: [KeyBindings; 2],
    held: [InputState; 2],
    attack_latched: [bool; 2],
    attached: bool,
}

impl KeyboardInput {
    /// Create a keyboard mapping for the two fighters.
    #[must_use]
    pub fn new(player: KeyBindings, enemy: KeyBindings) -> Self {
        Self {
            bindings: [player, enemy],
            held: [InputState::default(); 2],
            attack_latched: [false; 2],
            attached: true,
        }
    }

    /// Whether events are still being accepted.
    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.attached
    }

    /// Current held state for a fighter (without consuming anything).
    #[must_use]
    pub fn held(&self, side: Side) -> InputState {
        self.held[side.index()]
    }

    /// Handle a key-down event.
    pub fn key_down(&mut self, key: &str) {
        self.apply(key, true);
    }

    /// Handle a key-up event.
    pub fn key_up(&mut self, key: &str) {
        self.apply(key, false);
    }

    fn apply(&mut self, key: &str, pressed: bool) {
        if !self.attached {
            return;
        }
        for side in Side::ALL {
            let Some(action) = self.bindings[side.index()].action_for(key) else {
                continue;
            };
            let held = &mut self.held[side.index()];
            match action {
                KeyAction::Left => held.left = pressed,
                KeyAction::Right => held.right = pressed,
                KeyAction::Jump => held.jump = pressed,
                KeyAction::Attack => {
                    if pressed {
                        self.attack_latched[side.index()] = true;
                    }
                }
            }
        }
    }
}

impl InputSource for KeyboardInput {
    fn poll(&mut self, side: Side) -> FrameInput {
        if !self.attached {
            return FrameInput::NEUTRAL;
        }
        let attack = std::mem::take(&mut self.attack_latched[side.index()]);
        FrameInput {
            keys: self.held[side.index()],
            attack,
        }
    }

    fn shutdown(&mut self) {
        self.attached = false;
        self.held = [InputState::default(); 2];
        self.attack_latched = [false; 2];
    }
}

/// Input source that hands out a fixed pair of snapshots.
///
/// Used when the inputs for a frame are already known, e.g. when playing
/// back a recording.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedInput {
    inputs: [FrameInput; 2],
    attached: bool,
}

impl FixedInput {
    /// Create a source returning `player` and `enemy` on every poll.
    #[must_use]
    pub const fn new(player: FrameInput, enemy: FrameInput) -> Self {
        Self {
            inputs: [player, enemy],
            attached: true,
        }
    }

    /// Create a source that always reports no input.
    #[must_use]
    pub const fn neutral() -> Self {
        Self::new(FrameInput::NEUTRAL, FrameInput::NEUTRAL)
    }

    /// Replace the snapshots returned by subsequent polls.
    pub fn set(&mut self, player: FrameInput, enemy: FrameInput) {
        self.inputs = [player, enemy];
    }
}

impl InputSource for FixedInput {
    fn poll(&mut self, side: Side) -> FrameInput {
        if self.attached {
            self.inputs[side.index()]
        } else {
            FrameInput::NEUTRAL
        }
    }

    fn shutdown(&mut self) {
        self.attached = false;
    }
}
