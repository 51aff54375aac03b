//! Pairwise resolution between the two fighters and the arena walls.

use crate::fighter::{Facing, Fighter};
use crate::math::{Coords, Fixed};

/// Outcome of one attack check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    /// Damage applied to the defender.
    pub damage: i32,
    /// Defender health after the hit.
    pub defender_health: i32,
}

/// Test whether `attacker` lands a hit on `defender` this frame.
///
/// A hit needs an open attack window and an attack box that overlaps the
/// defender's body on both axes, edges inclusive. On a hit the defender
/// takes the attacker's damage and the attacker's window closes, so one
/// attack lands at most once.
pub fn resolve_attack(attacker: &mut Fighter, defender: &mut Fighter) -> Option<Hit> {
    if !attacker.is_attacking() || !attacker.attack_box().overlaps(&defender.body_rect()) {
        return None;
    }
    let damage = attacker.attack_damage();
    defender.apply_damage(damage);
    attacker.close_attack_window();
    tracing::info!(
        attacker = attacker.side().name(),
        defender = defender.side().name(),
        health = defender.health(),
        "hit"
    );
    Some(Hit {
        damage,
        defender_health: defender.health(),
    })
}

/// Stop a fighter from walking through either arena edge.
///
/// Only horizontal velocity towards the wall is cleared; applying this
/// twice has the same effect as once.
pub fn resolve_wall_collision(fighter: &mut Fighter, arena_width: Fixed) {
    let position = fighter.position();
    let velocity = fighter.velocity();
    let width = fighter.body_rect().width;

    let at_left = position.x <= Fixed::ZERO && velocity.x < Fixed::ZERO;
    let at_right = position.x + width >= arena_width && velocity.x > Fixed::ZERO;
    if at_left || at_right {
        fighter.set_velocity(Coords::new(Fixed::ZERO, velocity.y));
    }
}

/// Turn the fighters towards each other.
///
/// The one with the smaller x faces right. On a tie `a` faces left and `b`
/// faces right.
pub fn resolve_facing(a: &mut Fighter, b: &mut Fighter) {
    if a.position().x < b.position().x {
        a.set_facing(Facing::Right);
        b.set_facing(Facing::Left);
    } else {
        a.set_facing(Facing::Left);
        b.set_facing(Facing::Right);
    }
}
