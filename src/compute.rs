//! Pure game-logic functions.
//!
//! Every public function takes an immutable reference to the current
//! `GameState` (plus the clock reading and, where needed, a random source) and
//! returns a brand-new state.  Nothing here renders, sleeps or plays sound;
//! side effects are reported as [`GameEvent`]s in the returned [`Step`].

use crate::achievements::Achievements;
use crate::collision::collides;
use crate::config::Tuning;
use crate::entities::{
    Ability, Buffs, Bullet, Controls, Enemy, EnemyTier, Explosion, GameEvent, GameState,
    GameStatus, Player, PowerUp, PowerUpKind, Step, BULLET_SPEED, POWER_UP_SPEED,
};
use crate::random::RandomSource;

// ── Constructors ─────────────────────────────────────────────────────────────

/// Build the state shown at the title screen.
pub fn init_state(tuning: Tuning) -> GameState {
    GameState {
        status: GameStatus::Menu,
        ..new_session(tuning)
    }
}

fn new_player(tuning: &Tuning) -> Player {
    Player {
        x: tuning.width / 2.0 - tuning.player_width / 2.0,
        y: tuning.height - tuning.player_height - tuning.player_bottom_margin,
        width: tuning.player_width,
        height: tuning.player_height,
        speed: tuning.player_speed,
        buffs: Buffs::default(),
        invulnerable_until: 0,
        bomb: Ability::new(tuning.bomb_charges),
        laser: Ability::new(tuning.laser_charges),
    }
}

/// A freshly reset, already-running session.
fn new_session(tuning: Tuning) -> GameState {
    GameState {
        player: new_player(&tuning),
        enemies: Vec::new(),
        bullets: Vec::new(),
        explosions: Vec::new(),
        power_ups: Vec::new(),
        score: 0,
        lives: tuning.starting_lives,
        level: 1,
        speed_multiplier: 1.0,
        spawn_interval_ms: tuning.spawn_interval_ms,
        last_spawn: 0,
        level_up_score: 0,
        achievements: Achievements::default(),
        status: GameStatus::Playing,
        frame: 0,
        tuning,
    }
}

// ── Session lifecycle ────────────────────────────────────────────────────────

/// Menu → Playing.
pub fn start_game(state: &GameState) -> GameState {
    if state.status != GameStatus::Menu {
        log::debug!("start ignored in {:?}", state.status);
        return state.clone();
    }
    log::info!("session started");
    new_session(state.tuning.clone())
}

/// GameOver → Playing, discarding everything from the previous session.
pub fn restart_game(state: &GameState) -> GameState {
    if state.status != GameStatus::GameOver {
        log::debug!("restart ignored in {:?}", state.status);
        return state.clone();
    }
    log::info!("session restarted (previous score {})", state.score);
    new_session(state.tuning.clone())
}

/// Playing ⇄ Paused.  Resuming clears the entity collections; score, lives
/// and timers carry over.
pub fn toggle_pause(state: &GameState) -> GameState {
    match state.status {
        GameStatus::Playing => GameState {
            status: GameStatus::Paused,
            ..state.clone()
        },
        GameStatus::Paused => GameState {
            status: GameStatus::Playing,
            enemies: Vec::new(),
            bullets: Vec::new(),
            explosions: Vec::new(),
            power_ups: Vec::new(),
            ..state.clone()
        },
        other => {
            log::debug!("pause toggle ignored in {:?}", other);
            state.clone()
        }
    }
}

// ── Input-driven state transitions (pure) ───────────────────────────────────

pub fn move_player_left(state: &GameState) -> GameState {
    let new_x = (state.player.x - state.player.speed).clamp(0.0, max_player_x(state));
    GameState {
        player: Player {
            x: new_x,
            ..state.player.clone()
        },
        ..state.clone()
    }
}

pub fn move_player_right(state: &GameState) -> GameState {
    let new_x = (state.player.x + state.player.speed).clamp(0.0, max_player_x(state));
    GameState {
        player: Player {
            x: new_x,
            ..state.player.clone()
        },
        ..state.clone()
    }
}

fn max_player_x(state: &GameState) -> f32 {
    (state.width() - state.player.width).max(0.0)
}

/// Fire from the nose of the craft: one bullet, or three under rapid-fire.
pub fn player_shoot(state: &GameState, now: u64) -> Step {
    if state.status != GameStatus::Playing {
        return Step::quiet(state.clone());
    }
    let p = &state.player;
    let mut volley = vec![Bullet::centered(p.center_x(), p.y)];
    if p.buffs.is_active(PowerUpKind::RapidFire, now) {
        volley.push(Bullet::centered(p.x + p.width / 4.0, p.y));
        volley.push(Bullet::centered(p.x + p.width * 3.0 / 4.0, p.y));
    }

    let fired = volley.len();
    let mut bullets = state.bullets.clone();
    bullets.extend(volley);
    Step {
        state: GameState {
            bullets,
            ..state.clone()
        },
        events: vec![GameEvent::Fired { bullets: fired }],
    }
}

/// Destroy every enemy on screen.  Needs a charge and an expired cooldown.
pub fn use_bomb(state: &GameState, now: u64) -> Step {
    if state.status != GameStatus::Playing || !state.player.bomb.is_ready(now) {
        return Step::quiet(state.clone());
    }
    let mut next = state.clone();
    let mut events = Vec::new();

    let targets = std::mem::take(&mut next.enemies);
    for enemy in &targets {
        destroy_enemy(&mut next, enemy, now, &mut events);
    }
    next.player.bomb.charges -= 1;
    next.player.bomb.ready_at = now.saturating_add(next.tuning.bomb_cooldown_ms);

    log::debug!(
        "bomb detonated: {} enemies, {} charges left",
        targets.len(),
        next.player.bomb.charges
    );
    events.push(GameEvent::BombDetonated {
        destroyed: targets.len(),
    });
    Step { state: next, events }
}

/// Destroy every enemy in the column above the craft.
pub fn use_laser(state: &GameState, now: u64) -> Step {
    if state.status != GameStatus::Playing || !state.player.laser.is_ready(now) {
        return Step::quiet(state.clone());
    }
    let mut next = state.clone();
    let mut events = Vec::new();

    let (left, right) = (next.player.x, next.player.x + next.player.width);
    let player_y = next.player.y;
    let (hit, missed): (Vec<Enemy>, Vec<Enemy>) = std::mem::take(&mut next.enemies)
        .into_iter()
        .partition(|e| e.x < right && e.x + e.size() > left && e.y < player_y);
    next.enemies = missed;

    for enemy in &hit {
        destroy_enemy(&mut next, enemy, now, &mut events);
    }
    next.player.laser.charges -= 1;
    next.player.laser.ready_at = now.saturating_add(next.tuning.laser_cooldown_ms);

    log::debug!(
        "laser fired: {} enemies, {} charges left",
        hit.len(),
        next.player.laser.charges
    );
    events.push(GameEvent::LaserFired {
        destroyed: hit.len(),
    });
    Step { state: next, events }
}

/// Start (or restart) the buff's timer at `now + duration`.
pub fn collect_power_up(state: &GameState, kind: PowerUpKind, now: u64) -> GameState {
    let mut next = state.clone();
    apply_power_up(&mut next, kind, now);
    next
}

/// Level up at most once if the score has passed the current threshold.
pub fn check_difficulty(state: &GameState) -> Step {
    let mut next = state.clone();
    let mut events = Vec::new();
    raise_difficulty(&mut next, &mut events);
    Step { state: next, events }
}

// ── Per-frame tick (nearly pure — randomness is injected) ───────────────────

/// Advance the simulation by one frame.  All randomness comes through `rng`
/// so callers control determinism.  Outside `Playing` the state is returned
/// untouched.
pub fn tick(
    state: &GameState,
    controls: Controls,
    now: u64,
    rng: &mut impl RandomSource,
) -> Step {
    if state.status != GameStatus::Playing {
        return Step::quiet(state.clone());
    }

    // ── 1. Steer ─────────────────────────────────────────────────────────────
    let mut next = state.clone();
    if controls.left {
        next = move_player_left(&next);
    }
    if controls.right {
        next = move_player_right(&next);
    }
    next.frame += 1;
    let mut events = Vec::new();

    // ── 2. Spawn a new enemy ─────────────────────────────────────────────────
    if now.saturating_sub(next.last_spawn) > next.spawn_interval_ms {
        let tier = EnemyTier::from_roll(rng.next_unit());
        let size = tier.size();
        let x = rng.next_unit() as f32 * (next.width() - size).max(0.0);
        next.enemies.push(Enemy::new(tier, x, -size));
        next.last_spawn = now;
    }

    // ── 3. Bullets: move, cull, hit ──────────────────────────────────────────
    let bullets: Vec<Bullet> = next
        .bullets
        .iter()
        .map(|b| Bullet {
            y: b.y - BULLET_SPEED,
            ..b.clone()
        })
        .filter(|b| b.y >= 0.0)
        .collect();

    // Resolve every hit against a scratch hit-point table first, then rebuild
    // the collections.
    let mut hit_points: Vec<u32> = next.enemies.iter().map(|e| e.hit_points).collect();
    let mut spent = vec![false; bullets.len()];
    for (bi, bullet) in bullets.iter().enumerate() {
        let target = next
            .enemies
            .iter()
            .zip(&hit_points)
            .position(|(enemy, &hp)| hp > 0 && collides(bullet, enemy));
        if let Some(ei) = target {
            spent[bi] = true;
            hit_points[ei] = hit_points[ei].saturating_sub(1);
        }
    }

    next.bullets = bullets
        .into_iter()
        .zip(spent)
        .filter(|(_, used)| !used)
        .map(|(b, _)| b)
        .collect();

    let mut killed = Vec::new();
    let mut survivors = Vec::new();
    for (enemy, hp) in std::mem::take(&mut next.enemies).into_iter().zip(hit_points) {
        if hp == 0 {
            killed.push(enemy);
        } else {
            survivors.push(Enemy {
                hit_points: hp,
                ..enemy
            });
        }
    }
    next.enemies = survivors;

    for enemy in &killed {
        destroy_enemy(&mut next, enemy, now, &mut events);
        if rng.next_unit() < next.tuning.drop_chance {
            let kind = PowerUpKind::from_roll(rng.next_unit());
            next.power_ups.push(PowerUp {
                x: enemy.x,
                y: enemy.y,
                kind,
            });
            events.push(GameEvent::PowerUpDropped(kind));
        }
    }

    // ── 4. Enemies fall; drop the ones below the screen ──────────────────────
    let multiplier = next.speed_multiplier;
    let bottom = next.height();
    next.enemies = next
        .enemies
        .iter()
        .map(|e| Enemy {
            y: e.y + e.tier.speed() * multiplier,
            ..e.clone()
        })
        .filter(|e| e.y <= bottom)
        .collect();

    // ── 5. Explosions ────────────────────────────────────────────────────────
    next.explosions = next
        .explosions
        .iter()
        .map(|blast| Explosion {
            frame: blast.frame + 1,
            ..blast.clone()
        })
        .filter(|blast| blast.frame < blast.max_frame)
        .collect();

    // ── 6. Collision: enemies ↔ player ───────────────────────────────────────
    // One hit per overlapping enemy; the invulnerability window opened by the
    // first absorbs the rest.
    let contacts = next
        .enemies
        .iter()
        .filter(|e| collides(&next.player, *e))
        .count();
    for _ in 0..contacts {
        hit_player(&mut next, now, &mut events);
    }

    // ── 7. Power-ups: fall, collect, cull ────────────────────────────────────
    let falling: Vec<PowerUp> = next
        .power_ups
        .iter()
        .map(|p| PowerUp {
            y: p.y + POWER_UP_SPEED,
            ..p.clone()
        })
        .collect();
    let (collected, remaining): (Vec<PowerUp>, Vec<PowerUp>) = falling
        .into_iter()
        .partition(|p| collides(&next.player, p));
    next.power_ups = remaining.into_iter().filter(|p| p.y <= bottom).collect();
    for power_up in &collected {
        apply_power_up(&mut next, power_up.kind, now);
        events.push(GameEvent::PowerUpCollected(power_up.kind));
    }

    // ── 8. Difficulty & milestones ───────────────────────────────────────────
    raise_difficulty(&mut next, &mut events);
    let score = next.score;
    for name in next.achievements.check_milestones(score) {
        log::info!("milestone reached: {}", name);
        events.push(GameEvent::MilestoneReached(name));
    }

    Step { state: next, events }
}

// ── Shared helpers ───────────────────────────────────────────────────────────

/// Reward for a kill, doubled under the double-score buff.
fn reward_for(state: &GameState, tier: EnemyTier, now: u64) -> u32 {
    if state.player.buffs.is_active(PowerUpKind::DoubleScore, now) {
        tier.reward() * 2
    } else {
        tier.reward()
    }
}

/// Book-keeping shared by every way an enemy can die: explosion, score, tally.
fn destroy_enemy(next: &mut GameState, enemy: &Enemy, now: u64, events: &mut Vec<GameEvent>) {
    let (cx, cy) = enemy.center();
    next.explosions.push(Explosion::at(cx, cy));
    let reward = reward_for(next, enemy.tier, now);
    next.score = next.score.saturating_add(reward);
    next.achievements.record_kill(enemy.tier);
    events.push(GameEvent::EnemyDestroyed {
        tier: enemy.tier,
        reward,
    });
}

fn hit_player(next: &mut GameState, now: u64, events: &mut Vec<GameEvent>) {
    if next.status != GameStatus::Playing {
        return;
    }
    if next.player.is_invulnerable(now) || next.player.buffs.is_active(PowerUpKind::Shield, now)
    {
        return;
    }

    next.lives = next.lives.saturating_sub(1);
    events.push(GameEvent::PlayerHit {
        lives_left: next.lives,
    });
    if next.lives == 0 {
        next.status = GameStatus::GameOver;
        log::info!("game over: score {}, level {}", next.score, next.level);
        events.push(GameEvent::GameOver { score: next.score });
        return;
    }
    next.player.invulnerable_until = now.saturating_add(next.tuning.invulnerability_ms);
}

fn apply_power_up(next: &mut GameState, kind: PowerUpKind, now: u64) {
    let expires = now.saturating_add(kind.duration_ms(&next.tuning));
    let buffs = &mut next.player.buffs;
    match kind {
        PowerUpKind::DoubleScore => buffs.double_score_until = expires,
        PowerUpKind::RapidFire => buffs.rapid_fire_until = expires,
        PowerUpKind::Shield => buffs.shield_until = expires,
    }
    log::debug!("{:?} active until {}", kind, expires);
}

fn raise_difficulty(next: &mut GameState, events: &mut Vec<GameEvent>) {
    let threshold = next.level.saturating_mul(next.tuning.level_score);
    if next.score <= threshold || next.score <= next.level_up_score {
        return;
    }
    next.level += 1;
    next.level_up_score = next.score;
    next.speed_multiplier += next.tuning.speed_multiplier_step;
    next.spawn_interval_ms = next
        .spawn_interval_ms
        .saturating_sub(next.tuning.spawn_interval_step_ms)
        .max(next.tuning.spawn_interval_floor_ms);
    log::info!(
        "level {}: spawn every {}ms, speed x{:.1}",
        next.level,
        next.spawn_interval_ms,
        next.speed_multiplier
    );
    events.push(GameEvent::LevelUp { level: next.level });
}
