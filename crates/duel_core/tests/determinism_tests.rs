//! Determinism, snapshot and recording properties.

use duel_core::combat::resolve_wall_collision;
use duel_core::config::MatchConfig;
use duel_core::fighter::{Facing, Fighter, FighterSnapshot};
use duel_core::input::{FixedInput, FrameInput, InputState, Side};
use duel_core::math::{Coords, Fixed};
use duel_core::recording::{InputRecording, Playback};
use duel_core::render::{NullHud, NullSurface};
use duel_core::simulation::Match;
use duel_test_utils::collaborators::RecordingSurface;
use duel_test_utils::determinism::strategies::{
    arb_arena_position, arb_damage, arb_script, arb_speed,
};
use duel_test_utils::determinism::{
    find_first_divergence, run_parallel_matches, verify_match_determinism,
    verify_snapshot_resume,
};
use duel_test_utils::fixtures::{canonical_config, face_off_config, fixed, MatchDriver};
use proptest::prelude::*;

fn expected_attack_box_x(fighter: &Fighter, config: &MatchConfig) -> Fixed {
    match fighter.facing() {
        Facing::Right => fighter.position().x,
        Facing::Left => fighter.position().x + config.body.width - config.body.attack_width,
    }
}

#[test]
fn scripted_match_is_deterministic() {
    let script: Vec<[FrameInput; 2]> = (0..600)
        .map(|i| {
            let player = FrameInput {
                keys: InputState {
                    left: false,
                    right: i % 90 < 45,
                    jump: i % 120 == 0,
                },
                attack: i % 37 == 0,
            };
            let enemy = FrameInput {
                keys: InputState {
                    left: i % 70 < 35,
                    right: false,
                    jump: i % 150 == 10,
                },
                attack: i % 41 == 0,
            };
            [player, enemy]
        })
        .collect();

    verify_match_determinism(&canonical_config(), &script, 3).assert_deterministic();
    assert_eq!(find_first_divergence(&canonical_config(), &script), None);
    run_parallel_matches(&face_off_config(300, 60), &script, 4).assert_deterministic();
}

#[test]
fn snapshot_resume_matches_uninterrupted_run() {
    let script: Vec<[FrameInput; 2]> = (0..300)
        .map(|i| {
            let attack = FrameInput {
                keys: InputState::default(),
                attack: i % 25 == 0,
            };
            [attack, FrameInput::NEUTRAL]
        })
        .collect();

    // Split mid attack window, right after the hit frame.
    assert!(verify_snapshot_resume(&face_off_config(300, 40), &script, 1));
    assert!(verify_snapshot_resume(&face_off_config(300, 40), &script, 3));
    assert!(verify_snapshot_resume(&canonical_config(), &script, 150));
}

#[test]
fn recording_plays_back_to_recorded_hash() {
    let config = face_off_config(200, 100);
    let mut recording = InputRecording::new("integration", &config).unwrap();
    let mut driver = MatchDriver::new(config);

    for i in 0..400u64 {
        let player = FrameInput {
            keys: InputState {
                right: i % 50 < 20,
                ..InputState::default()
            },
            attack: i % 30 == 0,
        };
        let status = driver.step_recorded(player, FrameInput::NEUTRAL, &mut recording);
        if !status.is_running() {
            break;
        }
    }
    recording.finalize(&driver.game);

    let mut playback = Playback::new(recording).unwrap();
    playback.run_to_end(&mut RecordingSurface::default(), &mut NullHud);
    assert!(playback.matches_recording());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_attack_box_invariant_holds(script in arb_script(90)) {
        let config = face_off_config(300, 80);
        let mut driver = MatchDriver::new(config.clone());
        for [player, enemy] in script {
            driver.step(player, enemy);
            for side in Side::ALL {
                let fighter = driver.game.fighter(side);
                let attack_box = fighter.attack_box();
                prop_assert_eq!(attack_box.position.x, expected_attack_box_x(fighter, &config));
                prop_assert_eq!(attack_box.position.y, fighter.position().y);
                prop_assert_eq!(attack_box.width, config.body.attack_width);
                prop_assert_eq!(attack_box.height, config.body.attack_height);
            }
        }
    }

    #[test]
    fn prop_random_scripts_are_deterministic(script in arb_script(120)) {
        let result = verify_match_determinism(&face_off_config(300, 60), &script, 2);
        prop_assert!(result.is_deterministic);
    }

    #[test]
    fn prop_snapshot_resume_is_bit_identical(script in arb_script(120), split in 0usize..120) {
        prop_assert!(verify_snapshot_resume(&face_off_config(300, 60), &script, split));
    }

    #[test]
    fn prop_apply_damage_is_exact(damage in arb_damage()) {
        let mut fighter = Fighter::new(Side::Player, &canonical_config());
        let before = fighter.health();
        fighter.apply_damage(damage);
        prop_assert_eq!(fighter.health(), before - damage);
    }

    #[test]
    fn prop_wall_collision_is_idempotent(position in arb_arena_position(), vx in arb_speed()) {
        let mut fighter = Fighter::new(Side::Enemy, &canonical_config());
        fighter.restore(&FighterSnapshot {
            position,
            velocity: Coords::new(vx, fixed(0)),
            ..fighter.snapshot()
        });
        resolve_wall_collision(&mut fighter, fixed(1024));
        let once = fighter.snapshot();
        resolve_wall_collision(&mut fighter, fixed(1024));
        prop_assert_eq!(fighter.snapshot(), once);
    }
}

#[test]
fn null_collaborators_do_not_affect_state() {
    let config = face_off_config(300, 40);
    let mut with_log = MatchDriver::new(config.clone());
    let mut game = Match::new(config).unwrap();
    let mut input = FixedInput::neutral();
    let mut surface = NullSurface::new(fixed(1024), fixed(576));

    for _ in 0..60 {
        let now = with_log.now();
        with_log.step_neutral();
        game.frame(now, &mut input, &mut surface, &mut NullHud);
    }
    assert_eq!(game.state_hash(), with_log.game.state_hash());
}
