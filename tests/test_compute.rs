use approx::assert_relative_eq;

use sky_strike::compute::*;
use sky_strike::config::Tuning;
use sky_strike::entities::*;
use sky_strike::random::ScriptedRandom;

/// A running session with default tuning: 480x640 playfield, player at (220, 570).
fn make_state() -> GameState {
    start_game(&init_state(Tuning::default()))
}

/// Draws that never drop a power-up and never pick anything but a fighter.
fn no_drops() -> ScriptedRandom {
    ScriptedRandom::new([0.5])
}

fn step(state: &GameState, now: u64) -> Step {
    tick(state, Controls::default(), now, &mut no_drops())
}

// ── init_state ────────────────────────────────────────────────────────────────

#[test]
fn init_state_waits_in_menu() {
    let s = init_state(Tuning::default());
    assert_eq!(s.status, GameStatus::Menu);
    assert_eq!(s.lives, 3);
    assert_eq!(s.level, 1);
    assert_eq!(s.score, 0);
    assert_eq!(s.spawn_interval_ms, 1000);
    assert_relative_eq!(s.speed_multiplier, 1.0);
}

#[test]
fn init_state_player_position() {
    let s = init_state(Tuning::default());
    assert_relative_eq!(s.player.x, 220.0); // centered
    assert_relative_eq!(s.player.y, 570.0); // 20px above the bottom edge
    assert_eq!(s.player.bomb.charges, 3);
    assert_eq!(s.player.laser.charges, 2);
}

#[test]
fn tick_outside_playing_changes_nothing() {
    let menu = init_state(Tuning::default());
    let out = tick(&menu, Controls { left: true, right: false }, 5000, &mut no_drops());
    assert_eq!(out.state.frame, 0);
    assert!(out.events.is_empty());
    assert!(out.state.enemies.is_empty());
    assert_relative_eq!(out.state.player.x, menu.player.x);
}

// ── movement ──────────────────────────────────────────────────────────────────

#[test]
fn move_left_normal() {
    let s2 = move_player_left(&make_state());
    assert_relative_eq!(s2.player.x, 215.0);
}

#[test]
fn move_left_clamps_at_edge() {
    let mut s = make_state();
    s.player.x = 2.0;
    assert_relative_eq!(move_player_left(&s).player.x, 0.0);
}

#[test]
fn move_right_clamps_at_edge() {
    let mut s = make_state();
    s.player.x = 438.0;
    assert_relative_eq!(move_player_right(&s).player.x, 440.0); // 480 - 40
    s.player.x = 440.0;
    assert_relative_eq!(move_player_right(&s).player.x, 440.0);
}

#[test]
fn reversed_speed_still_stays_on_screen() {
    let mut s = make_state();
    s.player.speed = -5.0;
    for _ in 0..100 {
        s = move_player_left(&s);
    }
    assert_relative_eq!(s.player.x, 440.0);
    for _ in 0..100 {
        s = move_player_right(&s);
    }
    assert_relative_eq!(s.player.x, 0.0);
}

#[test]
fn move_does_not_mutate_original() {
    let s = make_state();
    let _ = move_player_left(&s);
    let _ = move_player_right(&s);
    assert_relative_eq!(s.player.x, 220.0);
}

#[test]
fn tick_applies_held_direction() {
    let s = make_state();
    let left = tick(&s, Controls { left: true, right: false }, 10, &mut no_drops());
    assert_relative_eq!(left.state.player.x, 215.0);
    let both = tick(&s, Controls { left: true, right: true }, 10, &mut no_drops());
    assert_relative_eq!(both.state.player.x, 220.0);
}

// ── spawning ──────────────────────────────────────────────────────────────────

#[test]
fn spawn_after_interval_elapses() {
    let s = make_state();
    // First draw picks the tier, second the horizontal offset.
    let out = tick(&s, Controls::default(), 1001, &mut ScriptedRandom::new([0.0, 0.5]));
    assert_eq!(out.state.enemies.len(), 1);
    let e = &out.state.enemies[0];
    assert_eq!(e.tier, EnemyTier::Fighter);
    assert_relative_eq!(e.x, 225.0); // 0.5 * (480 - 30)
    assert_relative_eq!(e.y, -27.0); // spawned at -30, then fell 3
    assert_eq!(e.hit_points, 1);
    assert_eq!(out.state.last_spawn, 1001);
}

#[test]
fn no_spawn_until_interval_exceeded() {
    let out = step(&make_state(), 1000);
    assert!(out.state.enemies.is_empty());
    assert_eq!(out.state.last_spawn, 0);
}

#[test]
fn spawn_uses_current_interval() {
    let mut s = make_state();
    s.last_spawn = 5000;
    s.spawn_interval_ms = 500;
    assert!(step(&s, 5500).state.enemies.is_empty());
    assert_eq!(step(&s, 5501).state.enemies.len(), 1);
}

#[test]
fn high_roll_spawns_mothership() {
    let out = tick(&make_state(), Controls::default(), 2000, &mut ScriptedRandom::new([0.95, 0.0]));
    assert_eq!(out.state.enemies[0].tier, EnemyTier::Mothership);
    assert_eq!(out.state.enemies[0].hit_points, 5);
}

// ── shooting ──────────────────────────────────────────────────────────────────

#[test]
fn shoot_fires_one_bullet_from_the_nose() {
    let out = player_shoot(&make_state(), 100);
    assert_eq!(out.state.bullets.len(), 1);
    assert_relative_eq!(out.state.bullets[0].x, 238.0); // center 240 - half width
    assert_relative_eq!(out.state.bullets[0].y, 570.0);
    assert_eq!(out.events, vec![GameEvent::Fired { bullets: 1 }]);
}

#[test]
fn rapid_fire_shoots_three() {
    let s = collect_power_up(&make_state(), PowerUpKind::RapidFire, 0);
    let out = player_shoot(&s, 100);
    let xs: Vec<f32> = out.state.bullets.iter().map(|b| b.x).collect();
    assert_eq!(xs, vec![238.0, 228.0, 248.0]);
    assert_eq!(out.events, vec![GameEvent::Fired { bullets: 3 }]);
}

#[test]
fn rapid_fire_ends_exactly_at_expiry() {
    let s = collect_power_up(&make_state(), PowerUpKind::RapidFire, 0);
    assert_eq!(player_shoot(&s, 4999).state.bullets.len(), 3);
    assert_eq!(player_shoot(&s, 5000).state.bullets.len(), 1);
}

#[test]
fn shoot_ignored_while_paused() {
    let paused = toggle_pause(&make_state());
    let out = player_shoot(&paused, 100);
    assert!(out.state.bullets.is_empty());
    assert!(out.events.is_empty());
}

// ── bullets ───────────────────────────────────────────────────────────────────

#[test]
fn bullet_moves_up() {
    let mut s = make_state();
    s.bullets.push(Bullet { x: 50.0, y: 100.0 });
    let out = step(&s, 10);
    assert_relative_eq!(out.state.bullets[0].y, 93.0);
}

#[test]
fn bullet_culled_above_top() {
    let mut s = make_state();
    s.bullets.push(Bullet { x: 50.0, y: 7.0 }); // lands on 0, kept
    s.bullets.push(Bullet { x: 80.0, y: 5.0 }); // lands on -2, gone
    let out = step(&s, 10);
    assert_eq!(out.state.bullets.len(), 1);
    assert_relative_eq!(out.state.bullets[0].y, 0.0);
}

#[test]
fn bullet_destroys_fighter() {
    let mut s = make_state();
    s.enemies.push(Enemy::new(EnemyTier::Fighter, 100.0, 100.0));
    s.bullets.push(Bullet { x: 110.0, y: 120.0 }); // moves to 113, inside the box
    let out = step(&s, 10);
    assert!(out.state.enemies.is_empty());
    assert!(out.state.bullets.is_empty());
    assert_eq!(out.state.score, 100);
    assert_eq!(out.state.explosions.len(), 1);
    assert_relative_eq!(out.state.explosions[0].x, 115.0);
    assert_relative_eq!(out.state.explosions[0].y, 115.0);
    assert!(out.events.contains(&GameEvent::EnemyDestroyed {
        tier: EnemyTier::Fighter,
        reward: 100
    }));
    assert_eq!(out.state.achievements.kills(EnemyTier::Fighter), 1);
}

#[test]
fn bullet_misses_outside_box() {
    let mut s = make_state();
    s.enemies.push(Enemy::new(EnemyTier::Fighter, 100.0, 100.0));
    s.bullets.push(Bullet { x: 130.0, y: 120.0 }); // touches the right edge only
    let out = step(&s, 10);
    assert_eq!(out.state.enemies.len(), 1);
    assert_eq!(out.state.bullets.len(), 1);
}

#[test]
fn one_bullet_damages_one_enemy() {
    let mut s = make_state();
    s.enemies.push(Enemy::new(EnemyTier::Fighter, 100.0, 100.0));
    s.enemies.push(Enemy::new(EnemyTier::Fighter, 100.0, 100.0));
    s.bullets.push(Bullet { x: 110.0, y: 120.0 });
    let out = step(&s, 10);
    assert_eq!(out.state.enemies.len(), 1);
    assert_eq!(out.state.score, 100);
}

#[test]
fn several_bullets_wear_down_a_mothership_in_one_tick() {
    let mut s = make_state();
    s.enemies.push(Enemy::new(EnemyTier::Mothership, 100.0, 100.0));
    for _ in 0..3 {
        s.bullets.push(Bullet { x: 120.0, y: 140.0 });
    }
    let out = step(&s, 10);
    assert_eq!(out.state.enemies.len(), 1);
    assert_eq!(out.state.enemies[0].hit_points, 2);
    assert!(out.state.bullets.is_empty());
    assert_eq!(out.state.score, 0);
}

#[test]
fn hit_points_count_down_then_destroy_exactly_once() {
    let mut s = make_state();
    s.enemies.push(Enemy::new(EnemyTier::Mothership, 200.0, 200.0));

    for hit in 1..=7u32 {
        if let Some(e) = s.enemies.first() {
            s.bullets.push(Bullet { x: e.x + 28.0, y: e.y + 40.0 });
        }
        let out = tick(&s, Controls::default(), 10 + hit as u64, &mut no_drops());
        let destroyed = out
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::EnemyDestroyed { .. }))
            .count();

        let expected_hp = 5u32.saturating_sub(hit);
        if expected_hp > 0 {
            assert_eq!(out.state.enemies[0].hit_points, expected_hp);
            assert_eq!(destroyed, 0);
        } else if hit == 5 {
            assert!(out.state.enemies.is_empty());
            assert_eq!(destroyed, 1);
        } else {
            assert_eq!(destroyed, 0);
        }
        s = out.state;
    }
    assert_eq!(s.score, 500);
}

#[test]
fn destroyed_enemy_can_drop_power_up() {
    let mut s = make_state();
    s.enemies.push(Enemy::new(EnemyTier::Fighter, 100.0, 100.0));
    s.bullets.push(Bullet { x: 110.0, y: 120.0 });
    // drop roll 0.1 < 0.2, kind roll 0.9 → third kind
    let out = tick(&s, Controls::default(), 10, &mut ScriptedRandom::new([0.1, 0.9]));
    assert_eq!(out.state.power_ups.len(), 1);
    let p = &out.state.power_ups[0];
    assert_eq!(p.kind, PowerUpKind::Shield);
    assert_relative_eq!(p.x, 100.0);
    assert_relative_eq!(p.y, 102.0); // dropped at 100, fell 2
    assert!(out.events.contains(&GameEvent::PowerUpDropped(PowerUpKind::Shield)));
}

// ── enemies & explosions ──────────────────────────────────────────────────────

#[test]
fn enemy_fall_scales_with_multiplier() {
    let mut s = make_state();
    s.speed_multiplier = 1.5;
    s.enemies.push(Enemy::new(EnemyTier::Bomber, 0.0, 100.0));
    let out = step(&s, 10);
    assert_relative_eq!(out.state.enemies[0].y, 103.0);
}

#[test]
fn enemy_culled_below_screen() {
    let mut s = make_state();
    s.enemies.push(Enemy::new(EnemyTier::Fighter, 0.0, 639.0)); // → 642
    s.enemies.push(Enemy::new(EnemyTier::Fighter, 0.0, 636.0)); // → 639
    let out = step(&s, 10);
    assert_eq!(out.state.enemies.len(), 1);
    assert_relative_eq!(out.state.enemies[0].y, 639.0);
}

#[test]
fn explosion_expires_at_max_frame() {
    let mut s = make_state();
    s.explosions.push(Explosion { x: 0.0, y: 0.0, frame: 8, max_frame: 10 });
    s.explosions.push(Explosion { x: 0.0, y: 0.0, frame: 9, max_frame: 10 });
    let out = step(&s, 10);
    assert_eq!(out.state.explosions.len(), 1);
    assert_eq!(out.state.explosions[0].frame, 9);
}

// ── player damage ─────────────────────────────────────────────────────────────

fn with_enemy_on_player(mut s: GameState) -> GameState {
    s.enemies.push(Enemy::new(EnemyTier::Fighter, 220.0, 560.0));
    s
}

#[test]
fn contact_costs_a_life_and_grants_invulnerability() {
    let s = with_enemy_on_player(make_state());
    let out = step(&s, 100);
    assert_eq!(out.state.lives, 2);
    assert_eq!(out.state.player.invulnerable_until, 2100);
    assert_eq!(out.state.enemies.len(), 1); // the enemy survives the ram
    assert!(out.events.contains(&GameEvent::PlayerHit { lives_left: 2 }));
}

#[test]
fn invulnerable_player_takes_no_damage() {
    let mut s = with_enemy_on_player(make_state());
    s.player.invulnerable_until = 600;
    assert_eq!(step(&s, 100).state.lives, 3);
    // window over
    assert_eq!(step(&s, 600).state.lives, 2);
}

#[test]
fn shield_blocks_contact() {
    let s = collect_power_up(&with_enemy_on_player(make_state()), PowerUpKind::Shield, 0);
    let out = step(&s, 100);
    assert_eq!(out.state.lives, 3);
    assert!(out.events.is_empty());
}

#[test]
fn last_life_ends_the_game() {
    let mut s = with_enemy_on_player(make_state());
    s.lives = 1;
    let out = step(&s, 100);
    assert_eq!(out.state.lives, 0);
    assert_eq!(out.state.status, GameStatus::GameOver);
    assert!(out.events.contains(&GameEvent::GameOver { score: 0 }));
}

#[test]
fn simultaneous_contacts_cost_one_life() {
    let mut s = with_enemy_on_player(make_state());
    s.enemies.push(Enemy::new(EnemyTier::Bomber, 230.0, 560.0));
    let out = step(&s, 100);
    assert_eq!(out.state.lives, 2);
}

#[test]
fn simultaneous_contacts_on_last_life_stop_at_zero() {
    let mut s = with_enemy_on_player(make_state());
    s.enemies.push(Enemy::new(EnemyTier::Bomber, 230.0, 560.0));
    s.lives = 1;
    let out = step(&s, 100);
    assert_eq!(out.state.lives, 0);
    assert_eq!(out.state.status, GameStatus::GameOver);
}

#[test]
fn game_over_state_no_longer_ticks() {
    let mut s = with_enemy_on_player(make_state());
    s.lives = 1;
    let over = step(&s, 100).state;
    let again = step(&over, 200);
    assert_eq!(again.state.frame, over.frame);
    assert_eq!(again.state.lives, 0);
}

// ── power-ups ─────────────────────────────────────────────────────────────────

#[test]
fn touching_power_up_collects_it() {
    let mut s = make_state();
    s.power_ups.push(PowerUp { x: 225.0, y: 570.0, kind: PowerUpKind::Shield });
    let out = step(&s, 1000);
    assert!(out.state.power_ups.is_empty());
    assert_eq!(out.state.player.buffs.shield_until, 9000);
    assert!(out.events.contains(&GameEvent::PowerUpCollected(PowerUpKind::Shield)));
}

#[test]
fn shield_recollection_resets_rather_than_stacks() {
    let t = 1000;
    let s = collect_power_up(&make_state(), PowerUpKind::Shield, t);
    assert_eq!(s.player.buffs.shield_until, t + 8000);
    let s = collect_power_up(&s, PowerUpKind::Shield, t + 1000);
    assert_eq!(s.player.buffs.shield_until, t + 9000);
}

#[test]
fn buff_durations() {
    let s = make_state();
    let s = collect_power_up(&s, PowerUpKind::DoubleScore, 0);
    let s = collect_power_up(&s, PowerUpKind::RapidFire, 0);
    assert_eq!(s.player.buffs.double_score_until, 10_000);
    assert_eq!(s.player.buffs.rapid_fire_until, 5_000);
}

#[test]
fn huge_durations_saturate_instead_of_overflowing() {
    let tuning = Tuning {
        shield_ms: u64::MAX,
        invulnerability_ms: u64::MAX,
        bomb_cooldown_ms: u64::MAX,
        laser_cooldown_ms: u64::MAX,
        ..Tuning::default()
    };
    let s = start_game(&init_state(tuning));

    let shielded = collect_power_up(&s, PowerUpKind::Shield, 5);
    assert_eq!(shielded.player.buffs.shield_until, u64::MAX);

    let bombed = use_bomb(&s, 5).state;
    assert_eq!(bombed.player.bomb.ready_at, u64::MAX);
    let lasered = use_laser(&s, 5).state;
    assert_eq!(lasered.player.laser.ready_at, u64::MAX);

    let hit = step(&with_enemy_on_player(s), 5);
    assert_eq!(hit.state.lives, 2);
    assert_eq!(hit.state.player.invulnerable_until, u64::MAX);
}

#[test]
fn missed_power_up_falls_off_screen() {
    let mut s = make_state();
    s.power_ups.push(PowerUp { x: 0.0, y: 639.0, kind: PowerUpKind::RapidFire });
    s.power_ups.push(PowerUp { x: 0.0, y: 300.0, kind: PowerUpKind::RapidFire });
    let out = step(&s, 10);
    assert_eq!(out.state.power_ups.len(), 1);
    assert_relative_eq!(out.state.power_ups[0].y, 302.0);
}

#[test]
fn double_score_doubles_kill_reward() {
    let mut s = collect_power_up(&make_state(), PowerUpKind::DoubleScore, 0);
    s.enemies.push(Enemy::new(EnemyTier::Bomber, 100.0, 100.0));
    s.enemies[0].hit_points = 1;
    s.bullets.push(Bullet { x: 110.0, y: 120.0 });
    let out = step(&s, 10);
    assert_eq!(out.state.score, 600);
}

// ── difficulty ────────────────────────────────────────────────────────────────

#[test]
fn difficulty_levels_up_once_per_crossing() {
    let mut s = make_state();
    s.score = 2500;
    let first = check_difficulty(&s);
    assert_eq!(first.state.level, 2);
    assert_eq!(first.state.spawn_interval_ms, 950);
    assert_relative_eq!(first.state.speed_multiplier, 1.1, epsilon = 1e-6);
    assert_eq!(first.events, vec![GameEvent::LevelUp { level: 2 }]);

    let second = check_difficulty(&first.state);
    assert_eq!(second.state.level, 2);
    assert_eq!(second.state.spawn_interval_ms, 950);
    assert!(second.events.is_empty());
}

#[test]
fn difficulty_needs_strictly_more_than_threshold() {
    let mut s = make_state();
    s.score = 1000;
    assert_eq!(check_difficulty(&s).state.level, 1);
    s.score = 1001;
    assert_eq!(check_difficulty(&s).state.level, 2);
}

#[test]
fn spawn_interval_floors_at_500() {
    let mut s = make_state();
    s.score = 10_000;
    s.spawn_interval_ms = 520;
    let s = check_difficulty(&s).state;
    assert_eq!(s.spawn_interval_ms, 500);
    let mut s = s;
    s.score = 10_001;
    assert_eq!(check_difficulty(&s).state.spawn_interval_ms, 500);
}

#[test]
fn kill_crossing_threshold_levels_up_and_unlocks_milestone() {
    let mut s = make_state();
    s.score = 950;
    s.enemies.push(Enemy::new(EnemyTier::Fighter, 100.0, 100.0));
    s.bullets.push(Bullet { x: 110.0, y: 120.0 });
    let out = step(&s, 10);
    assert_eq!(out.state.score, 1050);
    assert_eq!(out.state.level, 2);
    assert!(out.events.contains(&GameEvent::LevelUp { level: 2 }));
    assert!(out.events.contains(&GameEvent::MilestoneReached("Rookie")));
}

// ── abilities ─────────────────────────────────────────────────────────────────

#[test]
fn bomb_clears_screen_and_scores_each() {
    let mut s = make_state();
    s.enemies.push(Enemy::new(EnemyTier::Fighter, 0.0, 0.0));
    s.enemies.push(Enemy::new(EnemyTier::Bomber, 100.0, 100.0));
    s.enemies.push(Enemy::new(EnemyTier::Mothership, 200.0, 200.0));
    let out = use_bomb(&s, 1000);
    assert!(out.state.enemies.is_empty());
    assert_eq!(out.state.explosions.len(), 3);
    assert_eq!(out.state.score, 900);
    assert_eq!(out.state.player.bomb.charges, 2);
    assert_eq!(out.state.player.bomb.ready_at, 6000);
    assert!(out.events.contains(&GameEvent::BombDetonated { destroyed: 3 }));
}

#[test]
fn bomb_respects_cooldown_and_charges() {
    let s = use_bomb(&make_state(), 1000).state;
    let cooling = use_bomb(&s, 5999);
    assert_eq!(cooling.state.player.bomb.charges, 2);
    assert!(cooling.events.is_empty());

    let s = use_bomb(&s, 6000).state;
    let s = use_bomb(&s, 11_000).state;
    assert_eq!(s.player.bomb.charges, 0);
    let empty = use_bomb(&s, 100_000);
    assert_eq!(empty.state.player.bomb.charges, 0);
    assert!(empty.events.is_empty());
}

#[test]
fn laser_hits_only_the_column_above() {
    let mut s = make_state();
    s.enemies.push(Enemy::new(EnemyTier::Bomber, 220.0, 100.0)); // above the craft
    s.enemies.push(Enemy::new(EnemyTier::Bomber, 0.0, 100.0)); // off to the side
    let out = use_laser(&s, 500);
    assert_eq!(out.state.enemies.len(), 1);
    assert_relative_eq!(out.state.enemies[0].x, 0.0);
    assert_eq!(out.state.score, 300);
    assert_eq!(out.state.player.laser.charges, 1);
    assert_eq!(out.state.player.laser.ready_at, 5500);
    assert!(out.events.contains(&GameEvent::LaserFired { destroyed: 1 }));
}

// ── lifecycle ─────────────────────────────────────────────────────────────────

#[test]
fn pause_and_resume() {
    let mut s = make_state();
    s.score = 700;
    s.enemies.push(Enemy::new(EnemyTier::Fighter, 0.0, 0.0));
    s.bullets.push(Bullet { x: 0.0, y: 300.0 });

    let paused = toggle_pause(&s);
    assert_eq!(paused.status, GameStatus::Paused);
    assert_eq!(paused.enemies.len(), 1);
    assert_eq!(step(&paused, 5000).state.frame, paused.frame);

    let resumed = toggle_pause(&paused);
    assert_eq!(resumed.status, GameStatus::Playing);
    assert!(resumed.enemies.is_empty());
    assert!(resumed.bullets.is_empty());
    assert_eq!(resumed.score, 700);
}

#[test]
fn illegal_transitions_are_ignored() {
    let menu = init_state(Tuning::default());
    assert_eq!(toggle_pause(&menu).status, GameStatus::Menu);
    assert_eq!(restart_game(&menu).status, GameStatus::Menu);

    let mut playing = make_state();
    playing.score = 300;
    assert_eq!(start_game(&playing).score, 300);
    assert_eq!(restart_game(&playing).score, 300);
}

#[test]
fn restart_from_game_over_resets_everything() {
    let mut s = make_state();
    s.score = 4200;
    s.level = 4;
    s.lives = 0;
    s.status = GameStatus::GameOver;
    s.enemies.push(Enemy::new(EnemyTier::Fighter, 0.0, 0.0));
    s.bullets.push(Bullet { x: 0.0, y: 0.0 });
    s.explosions.push(Explosion::at(0.0, 0.0));
    s.power_ups.push(PowerUp { x: 0.0, y: 0.0, kind: PowerUpKind::Shield });
    s.player.bomb.charges = 0;

    let r = restart_game(&s);
    assert_eq!(r.status, GameStatus::Playing);
    assert_eq!(r.score, 0);
    assert_eq!(r.lives, 3);
    assert_eq!(r.level, 1);
    assert_eq!(r.spawn_interval_ms, 1000);
    assert!(r.enemies.is_empty());
    assert!(r.bullets.is_empty());
    assert!(r.explosions.is_empty());
    assert!(r.power_ups.is_empty());
    assert_eq!(r.player.bomb.charges, 3);
}
