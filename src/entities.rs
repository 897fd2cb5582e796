//! All game entity types — pure data, no logic.
//!
//! Positions are in logical playfield pixels with the origin at the top-left
//! corner; `y` grows downward.  Timers are absolute millisecond timestamps on
//! the caller's clock.

use crate::achievements::Achievements;
use crate::config::Tuning;

// ── Enemy tiers ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnemyTier {
    /// Small, fast, one hit.
    Fighter,
    Bomber,
    /// Large, slow and armoured.
    Mothership,
}

impl EnemyTier {
    pub const ALL: [EnemyTier; 3] = [EnemyTier::Fighter, EnemyTier::Bomber, EnemyTier::Mothership];

    /// Side length of the (square) bounding box.
    pub fn size(self) -> f32 {
        match self {
            EnemyTier::Fighter => 30.0,
            EnemyTier::Bomber => 40.0,
            EnemyTier::Mothership => 60.0,
        }
    }

    /// Base fall speed in pixels per tick, before the level multiplier.
    pub fn speed(self) -> f32 {
        match self {
            EnemyTier::Fighter => 3.0,
            EnemyTier::Bomber => 2.0,
            EnemyTier::Mothership => 1.0,
        }
    }

    pub fn hit_points(self) -> u32 {
        match self {
            EnemyTier::Fighter => 1,
            EnemyTier::Bomber => 3,
            EnemyTier::Mothership => 5,
        }
    }

    pub fn reward(self) -> u32 {
        match self {
            EnemyTier::Fighter => 100,
            EnemyTier::Bomber => 300,
            EnemyTier::Mothership => 500,
        }
    }

    /// Weighted pick from a uniform draw in `[0, 1)`: 70% / 20% / 10%.
    pub fn from_roll(roll: f64) -> Self {
        if roll < 0.7 {
            EnemyTier::Fighter
        } else if roll < 0.9 {
            EnemyTier::Bomber
        } else {
            EnemyTier::Mothership
        }
    }
}

// ── Power-ups ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PowerUpKind {
    /// Enemy rewards count double.
    DoubleScore,
    /// Each shot fires three bullets.
    RapidFire,
    /// Enemy contact costs no life.
    Shield,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] =
        [PowerUpKind::DoubleScore, PowerUpKind::RapidFire, PowerUpKind::Shield];

    /// Uniform pick from a draw in `[0, 1)`.
    pub fn from_roll(roll: f64) -> Self {
        let index = ((roll * Self::ALL.len() as f64) as usize).min(Self::ALL.len() - 1);
        Self::ALL[index]
    }

    /// How long the buff lasts once collected.
    pub fn duration_ms(self, tuning: &Tuning) -> u64 {
        match self {
            PowerUpKind::DoubleScore => tuning.double_score_ms,
            PowerUpKind::RapidFire => tuning.rapid_fire_ms,
            PowerUpKind::Shield => tuning.shield_ms,
        }
    }
}

pub const POWER_UP_SIZE: f32 = 20.0;
pub const POWER_UP_SPEED: f32 = 2.0;

#[derive(Clone, Debug, PartialEq)]
pub struct PowerUp {
    pub x: f32,
    pub y: f32,
    pub kind: PowerUpKind,
}

// ── Projectiles & effects ─────────────────────────────────────────────────────

pub const BULLET_WIDTH: f32 = 4.0;
pub const BULLET_HEIGHT: f32 = 12.0;
pub const BULLET_SPEED: f32 = 7.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Bullet {
    pub x: f32,
    pub y: f32,
}

impl Bullet {
    /// A bullet whose horizontal center sits on `center_x`.
    pub fn centered(center_x: f32, y: f32) -> Self {
        Bullet {
            x: center_x - BULLET_WIDTH / 2.0,
            y,
        }
    }
}

pub const EXPLOSION_FRAMES: u32 = 10;

#[derive(Clone, Debug, PartialEq)]
pub struct Explosion {
    /// Center of the blast.
    pub x: f32,
    pub y: f32,
    pub frame: u32,
    pub max_frame: u32,
}

impl Explosion {
    pub fn at(x: f32, y: f32) -> Self {
        Explosion {
            x,
            y,
            frame: 0,
            max_frame: EXPLOSION_FRAMES,
        }
    }
}

// ── Player & enemy ────────────────────────────────────────────────────────────

/// A limited-use special move.
#[derive(Clone, Debug, PartialEq)]
pub struct Ability {
    pub charges: u32,
    /// The ability is cooling down while `now < ready_at`.
    pub ready_at: u64,
}

impl Ability {
    pub fn new(charges: u32) -> Self {
        Ability { charges, ready_at: 0 }
    }

    pub fn is_ready(&self, now: u64) -> bool {
        self.charges > 0 && now >= self.ready_at
    }
}

/// Buff expiry timestamps.  A buff is active exactly while `now < expiry`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Buffs {
    pub double_score_until: u64,
    pub rapid_fire_until: u64,
    pub shield_until: u64,
}

impl Buffs {
    pub fn expiry(&self, kind: PowerUpKind) -> u64 {
        match kind {
            PowerUpKind::DoubleScore => self.double_score_until,
            PowerUpKind::RapidFire => self.rapid_fire_until,
            PowerUpKind::Shield => self.shield_until,
        }
    }

    pub fn is_active(&self, kind: PowerUpKind, now: u64) -> bool {
        now < self.expiry(kind)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub speed: f32,
    pub buffs: Buffs,
    /// Contact damage is ignored while `now < invulnerable_until`.
    pub invulnerable_until: u64,
    pub bomb: Ability,
    pub laser: Ability,
}

impl Player {
    pub fn is_invulnerable(&self, now: u64) -> bool {
        now < self.invulnerable_until
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    pub x: f32,
    pub y: f32,
    pub tier: EnemyTier,
    pub hit_points: u32,
}

impl Enemy {
    pub fn new(tier: EnemyTier, x: f32, y: f32) -> Self {
        Enemy {
            x,
            y,
            tier,
            hit_points: tier.hit_points(),
        }
    }

    pub fn size(&self) -> f32 {
        self.tier.size()
    }

    pub fn center(&self) -> (f32, f32) {
        let half = self.size() / 2.0;
        (self.x + half, self.y + half)
    }
}

// ── Input & events ────────────────────────────────────────────────────────────

/// Held-direction flags for one tick.  Keyboard and touch sources both end up
/// here, so the engine cannot tell them apart.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Controls {
    pub left: bool,
    pub right: bool,
}

/// Side effects produced by a state transition, for the audio/UI layers.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Fired { bullets: usize },
    EnemyDestroyed { tier: EnemyTier, reward: u32 },
    PowerUpDropped(PowerUpKind),
    PowerUpCollected(PowerUpKind),
    PlayerHit { lives_left: u32 },
    LevelUp { level: u32 },
    MilestoneReached(&'static str),
    BombDetonated { destroyed: usize },
    LaserFired { destroyed: usize },
    GameOver { score: u32 },
}

// ── Master game state ─────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Menu,
    Playing,
    Paused,
    GameOver,
}

/// The entire session.  Cloneable so pure update functions can return a new
/// copy without mutating the original.
#[derive(Clone, Debug)]
pub struct GameState {
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub bullets: Vec<Bullet>,
    pub explosions: Vec<Explosion>,
    pub power_ups: Vec<PowerUp>,
    pub score: u32,
    pub lives: u32,
    pub level: u32,
    pub speed_multiplier: f32,
    pub spawn_interval_ms: u64,
    pub last_spawn: u64,
    /// Score at the most recent level-up; a level needs a higher score.
    pub level_up_score: u32,
    pub achievements: Achievements,
    pub status: GameStatus,
    /// Ticks advanced this session.
    pub frame: u64,
    pub tuning: Tuning,
}

impl GameState {
    pub fn width(&self) -> f32 {
        self.tuning.width
    }

    pub fn height(&self) -> f32 {
        self.tuning.height
    }
}

/// A transition result: the next state and what happened along the way.
#[derive(Clone, Debug)]
pub struct Step {
    pub state: GameState,
    pub events: Vec<GameEvent>,
}

impl Step {
    pub fn quiet(state: GameState) -> Self {
        Step {
            state,
            events: Vec::new(),
        }
    }
}
