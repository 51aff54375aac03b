//! Match configuration.
//!
//! A [`MatchConfig`] is assembled once, validated, and handed to the match
//! controller. Everything tunable lives here: physics constants, arena
//! geometry, both fighters' key bindings and sprites, and the scenery.
//! Files are RON; numbers are written as decimals and converted to
//! fixed-point on load.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::animation::{Clip, ClipDef, ClipSet};
use crate::error::{DuelError, Result};
use crate::fighter::Facing;
use crate::input::{KeyBindings, Side};
use crate::math::{coords_decimal, fixed_decimal, Coords, Fixed, POSITION_LIMIT};
use crate::render::Colour;

/// Render frames each sprite frame is held for unless configured.
pub const DEFAULT_HELD_FRAMES: u32 = 5;

/// Global physics constants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Added to vertical velocity every airborne frame.
    #[serde(with = "fixed_decimal")]
    pub gravity: Fixed,
    /// Horizontal speed while a direction is held.
    #[serde(with = "fixed_decimal")]
    pub move_speed: Fixed,
    /// Initial upward speed of a jump.
    #[serde(with = "fixed_decimal")]
    pub jump_height: Fixed,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Fixed::from_num(7) / Fixed::from_num(10),
            move_speed: Fixed::from_num(5),
            jump_height: Fixed::from_num(20),
        }
    }
}

/// Arena geometry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Viewport width.
    #[serde(with = "fixed_decimal")]
    pub width: Fixed,
    /// Viewport height.
    #[serde(with = "fixed_decimal")]
    pub height: Fixed,
    /// Distance from the bottom edge to the floor line.
    #[serde(with = "fixed_decimal")]
    pub ground_offset: Fixed,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: Fixed::from_num(1024),
            height: Fixed::from_num(576),
            ground_offset: Fixed::from_num(96),
        }
    }
}

impl ArenaConfig {
    /// Y coordinate of the floor.
    #[must_use]
    pub fn ground_y(&self) -> Fixed {
        self.height - self.ground_offset
    }
}

/// Body and attack-box sizes shared by both fighters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyDimensions {
    /// Body width.
    #[serde(with = "fixed_decimal")]
    pub width: Fixed,
    /// Body height.
    #[serde(with = "fixed_decimal")]
    pub height: Fixed,
    /// Attack box width.
    #[serde(with = "fixed_decimal")]
    pub attack_width: Fixed,
    /// Attack box height.
    #[serde(with = "fixed_decimal")]
    pub attack_height: Fixed,
}

impl Default for BodyDimensions {
    fn default() -> Self {
        Self {
            width: Fixed::from_num(50),
            height: Fixed::from_num(150),
            attack_width: Fixed::from_num(100),
            attack_height: Fixed::from_num(50),
        }
    }
}

/// Health, damage and attack timing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Health each fighter starts with.
    pub starting_health: i32,
    /// Damage dealt per landed attack.
    pub attack_damage: i32,
    /// How long an attack can land after it starts, in milliseconds.
    pub attack_window_ms: u64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            starting_health: 100,
            attack_damage: 10,
            attack_window_ms: 100,
        }
    }
}

impl CombatConfig {
    /// Attack window as a duration.
    #[must_use]
    pub const fn attack_window(&self) -> Duration {
        Duration::from_millis(self.attack_window_ms)
    }
}

/// Per-fighter settings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FighterConfig {
    /// Display name.
    pub name: String,
    /// Spawn position.
    #[serde(with = "coords_decimal")]
    pub start: Coords,
    /// Spawn velocity.
    #[serde(with = "coords_decimal", default)]
    pub velocity: Coords,
    /// Initial facing.
    pub facing: Facing,
    /// Key bindings.
    pub key_bindings: KeyBindings,
    /// Sprite strips.
    pub clips: ClipSet,
    /// Sprite scale.
    #[serde(with = "fixed_decimal")]
    pub scale: Fixed,
    /// Sprite draw offset relative to the body's top-left corner.
    #[serde(with = "coords_decimal")]
    pub sprite_offset: Coords,
    /// Debug rectangle colour.
    #[serde(default)]
    pub colour: Colour,
    /// Render frames per sprite frame.
    #[serde(default = "default_held_frames")]
    pub held_frames: u32,
}

fn default_held_frames() -> u32 {
    DEFAULT_HELD_FRAMES
}

fn clip_set(dir: &str, counts: [u32; 5]) -> ClipSet {
    let def = |name: &str, frames| ClipDef::new(format!("assets/img/{dir}/{name}.png"), frames);
    ClipSet {
        idle: def("idle", counts[0]),
        run: def("run", counts[1]),
        jump: def("jump", counts[2]),
        fall: def("fall", counts[3]),
        attack: def("attack", counts[4]),
    }
}

impl FighterConfig {
    /// Canonical left-hand fighter.
    #[must_use]
    pub fn player_default() -> Self {
        Self {
            name: "Samurai Mack".to_string(),
            start: Coords::ZERO,
            velocity: Coords::ZERO,
            facing: Facing::Right,
            key_bindings: KeyBindings::player_default(),
            clips: clip_set("samurai-mack", [8, 8, 2, 2, 6]),
            scale: Fixed::from_num(5) / Fixed::from_num(2),
            sprite_offset: Coords::from_int(215, 157),
            colour: Colour::Red,
            held_frames: DEFAULT_HELD_FRAMES,
        }
    }

    /// Canonical right-hand fighter.
    #[must_use]
    pub fn enemy_default() -> Self {
        Self {
            name: "Kenji".to_string(),
            start: Coords::from_int(400, 100),
            velocity: Coords::ZERO,
            facing: Facing::Left,
            key_bindings: KeyBindings::enemy_default(),
            clips: clip_set("kenji", [4, 8, 2, 2, 4]),
            scale: Fixed::from_num(5) / Fixed::from_num(2),
            sprite_offset: Coords::from_int(215, 172),
            colour: Colour::Green,
            held_frames: DEFAULT_HELD_FRAMES,
        }
    }
}

/// A decorative animated sprite.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropConfig {
    /// Name for logs.
    pub name: String,
    /// Image identifier.
    pub image: String,
    /// Top-left position.
    #[serde(with = "coords_decimal")]
    pub position: Coords,
    /// Draw scale.
    #[serde(with = "fixed_decimal")]
    pub scale: Fixed,
    /// Frames in the strip.
    pub total_frames: u32,
    /// Render frames per sprite frame.
    #[serde(default = "default_held_frames")]
    pub held_frames: u32,
}

impl PropConfig {
    /// Full-viewport background.
    #[must_use]
    pub fn background() -> Self {
        Self {
            name: "background".to_string(),
            image: "assets/img/background.png".to_string(),
            position: Coords::ZERO,
            scale: Fixed::ONE,
            total_frames: 1,
            held_frames: DEFAULT_HELD_FRAMES,
        }
    }

    /// Animated shop.
    #[must_use]
    pub fn shop() -> Self {
        Self {
            name: "shop".to_string(),
            image: "assets/img/shop.png".to_string(),
            position: Coords::from_int(600, 128),
            scale: Fixed::from_num(11) / Fixed::from_num(4),
            total_frames: 6,
            held_frames: DEFAULT_HELD_FRAMES,
        }
    }
}

/// Everything needed to build a match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Physics constants.
    pub physics: PhysicsConfig,
    /// Arena geometry.
    pub arena: ArenaConfig,
    /// Fighter body sizes.
    pub body: BodyDimensions,
    /// Combat tuning.
    pub combat: CombatConfig,
    /// Countdown start value in seconds.
    pub match_duration_secs: u32,
    /// Left-hand fighter.
    pub player: FighterConfig,
    /// Right-hand fighter.
    pub enemy: FighterConfig,
    /// Background props, drawn in order before the fighters.
    pub scenery: Vec<PropConfig>,
    /// Draw body and attack rectangles.
    pub show_hitboxes: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            arena: ArenaConfig::default(),
            body: BodyDimensions::default(),
            combat: CombatConfig::default(),
            match_duration_secs: 10,
            player: FighterConfig::player_default(),
            enemy: FighterConfig::enemy_default(),
            scenery: vec![PropConfig::background(), PropConfig::shop()],
            show_hitboxes: false,
        }
    }
}

impl MatchConfig {
    /// Load and validate a config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DuelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text, &path.display().to_string())
    }

    /// Parse and validate a config from a RON string.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        Self::parse(text, "<inline>")
    }

    fn parse(text: &str, origin: &str) -> Result<Self> {
        let config: Self = ron::from_str(text).map_err(|e| DuelError::ConfigParse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Render as pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| DuelError::Serialization(e.to_string()))
    }

    /// Settings for one side.
    #[must_use]
    pub fn fighter(&self, side: Side) -> &FighterConfig {
        match side {
            Side::Player => &self.player,
            Side::Enemy => &self.enemy,
        }
    }

    /// Check every setup-time constraint.
    ///
    /// Rejects missing or duplicate key bindings (within a fighter or
    /// across both), unplayable clips, non-positive sizes, and any
    /// dimension, speed or position larger than [`POSITION_LIMIT`].
    pub fn validate(&self) -> Result<()> {
        self.validate_bindings()?;
        self.validate_magnitudes()?;

        positive("arena.width", self.arena.width)?;
        positive("arena.height", self.arena.height)?;
        if self.arena.ground_offset < Fixed::ZERO || self.arena.ground_offset >= self.arena.height
        {
            return Err(invalid(
                "arena.ground_offset",
                "must lie within the arena height",
            ));
        }
        positive("body.width", self.body.width)?;
        positive("body.height", self.body.height)?;
        positive("body.attack_width", self.body.attack_width)?;
        positive("body.attack_height", self.body.attack_height)?;
        non_negative("physics.gravity", self.physics.gravity)?;
        non_negative("physics.move_speed", self.physics.move_speed)?;
        non_negative("physics.jump_height", self.physics.jump_height)?;

        if self.combat.starting_health <= 0 {
            return Err(invalid("combat.starting_health", "must be positive"));
        }
        if self.combat.attack_damage < 0 {
            return Err(invalid("combat.attack_damage", "must not be negative"));
        }
        if self.combat.attack_window_ms == 0 {
            return Err(invalid("combat.attack_window_ms", "must be positive"));
        }
        if self.match_duration_secs == 0 {
            return Err(invalid("match_duration_secs", "must be positive"));
        }

        for side in Side::ALL {
            let fighter = self.fighter(side);
            positive(&format!("{}.scale", side.name()), fighter.scale)?;
            if fighter.held_frames == 0 {
                return Err(invalid(
                    &format!("{}.held_frames", side.name()),
                    "must be positive",
                ));
            }
            for clip in Clip::ALL {
                check_clip(&fighter.name, clip.name(), fighter.clips.get(clip))?;
            }
        }

        for prop in &self.scenery {
            positive(&format!("scenery.{}.scale", prop.name), prop.scale)?;
            if prop.held_frames == 0 {
                return Err(invalid(
                    &format!("scenery.{}.held_frames", prop.name),
                    "must be positive",
                ));
            }
            check_clip(
                &prop.name,
                "strip",
                &ClipDef::new(prop.image.clone(), prop.total_frames),
            )?;
        }

        Ok(())
    }

    fn validate_magnitudes(&self) -> Result<()> {
        within_limit("arena.width", self.arena.width)?;
        within_limit("arena.height", self.arena.height)?;
        within_limit("arena.ground_offset", self.arena.ground_offset)?;
        within_limit("body.width", self.body.width)?;
        within_limit("body.height", self.body.height)?;
        within_limit("body.attack_width", self.body.attack_width)?;
        within_limit("body.attack_height", self.body.attack_height)?;
        within_limit("physics.gravity", self.physics.gravity)?;
        within_limit("physics.move_speed", self.physics.move_speed)?;
        within_limit("physics.jump_height", self.physics.jump_height)?;

        for side in Side::ALL {
            let fighter = self.fighter(side);
            let name = side.name();
            coords_within_limit(&format!("{name}.start"), fighter.start)?;
            coords_within_limit(&format!("{name}.velocity"), fighter.velocity)?;
            coords_within_limit(&format!("{name}.sprite_offset"), fighter.sprite_offset)?;
            within_limit(&format!("{name}.scale"), fighter.scale)?;
        }
        for prop in &self.scenery {
            coords_within_limit(&format!("scenery.{}.position", prop.name), prop.position)?;
            within_limit(&format!("scenery.{}.scale", prop.name), prop.scale)?;
        }
        Ok(())
    }

    fn validate_bindings(&self) -> Result<()> {
        let mut seen: HashMap<&str, String> = HashMap::new();
        for side in Side::ALL {
            let fighter = self.fighter(side);
            for (action, key) in fighter.key_bindings.entries() {
                let label = format!("{} {}", side.name(), action.name());
                if key.is_empty() {
                    return Err(DuelError::MissingKeyBinding {
                        fighter: fighter.name.clone(),
                        action: action.name(),
                    });
                }
                if let Some(first) = seen.insert(key, label.clone()) {
                    return Err(DuelError::DuplicateKeyBinding {
                        key: key.to_string(),
                        first,
                        second: label,
                    });
                }
            }
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> DuelError {
    DuelError::InvalidConfig {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(field: &str, value: Fixed) -> Result<()> {
    if value > Fixed::ZERO {
        Ok(())
    } else {
        Err(invalid(field, "must be positive"))
    }
}

fn within_limit(field: &str, value: Fixed) -> Result<()> {
    let limit = Fixed::from_num(POSITION_LIMIT);
    if (-limit..=limit).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, "is out of range"))
    }
}

fn coords_within_limit(field: &str, value: Coords) -> Result<()> {
    within_limit(field, value.x)?;
    within_limit(field, value.y)
}

fn non_negative(field: &str, value: Fixed) -> Result<()> {
    if value >= Fixed::ZERO {
        Ok(())
    } else {
        Err(invalid(field, "must not be negative"))
    }
}

fn check_clip(owner: &str, clip: &str, def: &ClipDef) -> Result<()> {
    let reason = if def.image.is_empty() {
        "image is empty"
    } else if def.total_frames == 0 {
        "strip has no frames"
    } else {
        return Ok(());
    };
    Err(DuelError::InvalidClip {
        owner: owner.to_string(),
        clip: clip.to_string(),
        reason: reason.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = MatchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.arena.ground_y(), Fixed::from_num(480));
        assert_eq!(config.match_duration_secs, 10);
        assert_eq!(config.combat.attack_window(), Duration::from_millis(100));
    }

    #[test]
    fn test_ron_round_trip() {
        let config = MatchConfig::default();
        let text = config.to_ron_string().unwrap();
        let parsed = MatchConfig::from_ron_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed =
            MatchConfig::from_ron_str("(match_duration_secs: 3, show_hitboxes: true)").unwrap();
        assert_eq!(parsed.match_duration_secs, 3);
        assert!(parsed.show_hitboxes);
        assert_eq!(parsed.physics, PhysicsConfig::default());
    }

    #[test]
    fn test_decimal_physics() {
        let parsed = MatchConfig::from_ron_str(
            "(physics: (gravity: 0.5, move_speed: 4.0, jump_height: 12.5))",
        )
        .unwrap();
        assert_eq!(parsed.physics.gravity, Fixed::from_num(0.5));
        assert_eq!(parsed.physics.jump_height, Fixed::from_num(12.5));
    }

    #[test]
    fn test_parse_error_reported() {
        let err = MatchConfig::from_ron_str("(match_duration_secs: \"ten\")").unwrap_err();
        assert!(matches!(err, DuelError::ConfigParse { .. }));
    }

    #[test]
    fn test_missing_binding_rejected() {
        let mut config = MatchConfig::default();
        config.player.key_bindings.jump = String::new();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, DuelError::MissingKeyBinding { action: "jump", .. }));
    }

    #[test]
    fn test_duplicate_binding_within_fighter_rejected() {
        let mut config = MatchConfig::default();
        config.player.key_bindings.attack = "a".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, DuelError::DuplicateKeyBinding { ref key, .. } if key == "a"));
    }

    #[test]
    fn test_duplicate_binding_across_fighters_rejected() {
        let mut config = MatchConfig::default();
        config.enemy.key_bindings.left = "d".to_string();
        match config.validate().unwrap_err() {
            DuelError::DuplicateKeyBinding { first, second, .. } => {
                assert_eq!(first, "player right");
                assert_eq!(second, "enemy left");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_frame_clip_rejected() {
        let mut config = MatchConfig::default();
        config.enemy.clips.attack.total_frames = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, DuelError::InvalidClip { ref clip, .. } if clip == "attack"));
    }

    #[test]
    fn test_empty_prop_image_rejected() {
        let mut config = MatchConfig::default();
        config.scenery[1].image = String::new();
        assert!(matches!(
            config.validate().unwrap_err(),
            DuelError::InvalidClip { .. }
        ));
    }

    #[test]
    fn test_non_positive_dimensions_rejected() {
        let mut config = MatchConfig::default();
        config.body.width = Fixed::ZERO;
        assert!(matches!(
            config.validate().unwrap_err(),
            DuelError::InvalidConfig { ref field, .. } if field == "body.width"
        ));

        let mut config = MatchConfig::default();
        config.arena.ground_offset = Fixed::from_num(600);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_out_of_range_jump_height_rejected() {
        let mut config = MatchConfig::default();
        config.physics.jump_height = Fixed::from_num(1_500_000_000);
        assert!(matches!(
            config.validate().unwrap_err(),
            DuelError::InvalidConfig { ref field, .. } if field == "physics.jump_height"
        ));
    }

    #[test]
    fn test_magnitude_limit_is_inclusive() {
        let limit = Fixed::from_num(POSITION_LIMIT);
        let mut config = MatchConfig::default();
        config.physics.move_speed = limit;
        config.player.velocity = Coords::new(-limit, Fixed::ZERO);
        config.validate().unwrap();

        config.enemy.start.y = limit + Fixed::ONE;
        assert!(matches!(
            config.validate().unwrap_err(),
            DuelError::InvalidConfig { ref field, .. } if field == "enemy.start"
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = MatchConfig::load("/nonexistent/duel.ron").unwrap_err();
        assert!(matches!(err, DuelError::Io { .. }));
    }
}
