//! Rendering layer — all terminal I/O lives here.
//!
//! Each function receives a mutable writer and an immutable view of the
//! game state.  No game logic is performed; this module only translates
//! state into terminal commands.  The logical playfield is scaled onto
//! whatever grid the terminal currently offers.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal, QueueableCommand,
};
use sky_strike::entities::{EnemyTier, GameState, GameStatus, PowerUpKind};

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_HUD_SCORE: Color = Color::Yellow;
const C_HUD_LIVES: Color = Color::Red;
const C_HUD_LEVEL: Color = Color::Green;
const C_PLAYER: Color = Color::White;
const C_PLAYER_SHIELDED: Color = Color::Blue;
const C_FIGHTER: Color = Color::Red;
const C_BOMBER: Color = Color::DarkRed;
const C_MOTHERSHIP: Color = Color::Magenta;
const C_BULLET: Color = Color::Yellow;
const C_EXPLOSION: Color = Color::DarkYellow;
const C_HINT: Color = Color::DarkGrey;

/// Maps logical playfield coordinates onto the bordered terminal area.
struct Viewport {
    cols: u16,
    rows: u16,
    sx: f32,
    sy: f32,
}

impl Viewport {
    fn new(state: &GameState, cols: u16, rows: u16) -> Self {
        // Inside the border: columns 1..cols-1, rows 2..rows-2.
        let inner_w = cols.saturating_sub(2).max(1) as f32;
        let inner_h = rows.saturating_sub(4).max(1) as f32;
        Viewport {
            cols,
            rows,
            sx: inner_w / state.width(),
            sy: inner_h / state.height(),
        }
    }

    /// Terminal cell for a logical point, or `None` when it falls outside the
    /// playfield (e.g. enemies still above the top edge).
    fn cell(&self, x: f32, y: f32) -> Option<(u16, u16)> {
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let col = 1 + (x * self.sx) as u16;
        let row = 2 + (y * self.sy) as u16;
        if col >= self.cols.saturating_sub(1) || row >= self.rows.saturating_sub(2) {
            return None;
        }
        Some((col, row))
    }
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame.
pub fn render<W: Write>(
    out: &mut W,
    state: &GameState,
    now: u64,
    best_score: u32,
) -> std::io::Result<()> {
    let (cols, rows) = terminal::size()?;
    let view = Viewport::new(state, cols, rows);

    out.queue(terminal::Clear(terminal::ClearType::All))?;
    draw_border(out, &view)?;
    draw_hud(out, state, &view, now)?;

    match state.status {
        GameStatus::Menu => draw_menu(out, &view, best_score)?,
        _ => {
            draw_entities(out, state, &view)?;
            draw_player(out, state, &view, now)?;
        }
    }
    match state.status {
        GameStatus::Paused => draw_banner(out, &view, &["PAUSED", "P / Esc - resume"], Color::Cyan)?,
        GameStatus::GameOver => draw_game_over(out, state, &view, best_score)?,
        _ => {}
    }
    draw_controls_hint(out, &view)?;

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, rows.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

// ── Border ────────────────────────────────────────────────────────────────────

fn draw_border<W: Write>(out: &mut W, view: &Viewport) -> std::io::Result<()> {
    let w = view.cols as usize;
    let h = view.rows;

    out.queue(style::SetForegroundColor(C_BORDER))?;
    out.queue(cursor::MoveTo(0, 1))?;
    out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;
    out.queue(cursor::MoveTo(0, h.saturating_sub(2)))?;
    out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;
    for row in 2..h.saturating_sub(2) {
        out.queue(cursor::MoveTo(0, row))?;
        out.queue(Print("│"))?;
        out.queue(cursor::MoveTo(view.cols.saturating_sub(1), row))?;
        out.queue(Print("│"))?;
    }
    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(
    out: &mut W,
    state: &GameState,
    view: &Viewport,
    now: u64,
) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_SCORE))?;
    out.queue(Print(format!("Score:{:>7}", state.score)))?;

    out.queue(style::SetForegroundColor(C_HUD_LEVEL))?;
    out.queue(Print(format!("  Lv {}", state.level)))?;

    let p = &state.player;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print(format!("  Bomb:{} Laser:{}", p.bomb.charges, p.laser.charges)))?;

    // Active buffs with whole seconds remaining
    let mut tags = String::new();
    for (kind, label) in [
        (PowerUpKind::DoubleScore, "x2"),
        (PowerUpKind::RapidFire, "RAPID"),
        (PowerUpKind::Shield, "SHIELD"),
    ] {
        if p.buffs.is_active(kind, now) {
            let secs = (p.buffs.expiry(kind) - now).div_ceil(1000);
            tags.push_str(&format!("[{} {}s] ", label, secs));
        }
    }
    let lives_str = format!("Lives:{}", "♥".repeat(state.lives as usize));
    let right_str = format!("{}{}", tags, lives_str);
    let rx = view.cols.saturating_sub(right_str.chars().count() as u16 + 1);
    out.queue(cursor::MoveTo(rx, 0))?;
    if !tags.is_empty() {
        out.queue(style::SetForegroundColor(Color::Cyan))?;
        out.queue(Print(&tags))?;
    }
    out.queue(style::SetForegroundColor(C_HUD_LIVES))?;
    out.queue(Print(&lives_str))?;
    Ok(())
}

// ── Entities ──────────────────────────────────────────────────────────────────

fn put<W: Write>(
    out: &mut W,
    view: &Viewport,
    x: f32,
    y: f32,
    glyph: &str,
    color: Color,
) -> std::io::Result<()> {
    if let Some((col, row)) = view.cell(x, y) {
        out.queue(cursor::MoveTo(col, row))?;
        out.queue(style::SetForegroundColor(color))?;
        out.queue(Print(glyph))?;
    }
    Ok(())
}

fn draw_entities<W: Write>(out: &mut W, state: &GameState, view: &Viewport) -> std::io::Result<()> {
    for enemy in &state.enemies {
        let (cx, cy) = enemy.center();
        let (glyph, color) = match enemy.tier {
            EnemyTier::Fighter => ("▼", C_FIGHTER),
            EnemyTier::Bomber => ("«▼»", C_BOMBER),
            EnemyTier::Mothership => ("◄█►", C_MOTHERSHIP),
        };
        let offset = (glyph.chars().count() / 2) as f32 / view.sx;
        put(out, view, cx - offset, cy, glyph, color)?;
    }
    for power_up in &state.power_ups {
        let (glyph, color) = match power_up.kind {
            PowerUpKind::DoubleScore => ("★", Color::Yellow),
            PowerUpKind::RapidFire => ("!", Color::Red),
            PowerUpKind::Shield => ("◆", Color::Blue),
        };
        put(out, view, power_up.x, power_up.y, glyph, color)?;
    }
    for bullet in &state.bullets {
        put(out, view, bullet.x, bullet.y, "║", C_BULLET)?;
    }
    for blast in &state.explosions {
        let glyph = if blast.frame < blast.max_frame / 2 { "✸" } else { "·" };
        put(out, view, blast.x, blast.y, glyph, C_EXPLOSION)?;
    }
    Ok(())
}

fn draw_player<W: Write>(
    out: &mut W,
    state: &GameState,
    view: &Viewport,
    now: u64,
) -> std::io::Result<()> {
    let p = &state.player;
    // Blink while invulnerable
    if p.is_invulnerable(now) && (now / 100) % 2 == 1 {
        return Ok(());
    }
    let color = if p.buffs.is_active(PowerUpKind::Shield, now) {
        C_PLAYER_SHIELDED
    } else {
        C_PLAYER
    };
    let nose_x = p.center_x();
    put(out, view, nose_x, p.y, "▲", color)?;
    put(out, view, nose_x - 1.0 / view.sx, p.y + p.height * 0.6, "/█\\", color)?;
    Ok(())
}

// ── Overlays ──────────────────────────────────────────────────────────────────

fn draw_banner<W: Write>(
    out: &mut W,
    view: &Viewport,
    lines: &[&str],
    color: Color,
) -> std::io::Result<()> {
    let cx = view.cols / 2;
    let start_row = (view.rows / 2).saturating_sub(lines.len() as u16 / 2);
    out.queue(style::SetForegroundColor(color))?;
    for (i, line) in lines.iter().enumerate() {
        let col = cx.saturating_sub(line.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(col, start_row + i as u16))?;
        out.queue(Print(*line))?;
    }
    Ok(())
}

fn draw_menu<W: Write>(out: &mut W, view: &Viewport, best_score: u32) -> std::io::Result<()> {
    let best = format!("Best this run: {}", best_score);
    let mut lines = vec!["★  SKY  STRIKE  ★", "", "ENTER - start", "Q - quit"];
    if best_score > 0 {
        lines.push("");
        lines.push(&best);
    }
    draw_banner(out, view, &lines, Color::Cyan)
}

fn draw_game_over<W: Write>(
    out: &mut W,
    state: &GameState,
    view: &Viewport,
    best_score: u32,
) -> std::io::Result<()> {
    let score_line = format!("Final Score: {:>7}", state.score);
    let level_line = format!("Level reached: {:>5}", state.level);
    let kills_line = format!("Enemies downed: {:>4}", state.achievements.total_kills());
    let best_line = if state.score >= best_score && state.score > 0 {
        format!("★ NEW BEST: {:>7} ★", state.score)
    } else {
        format!("Best Score:  {:>7}", best_score)
    };
    draw_banner(
        out,
        view,
        &[
            "╔════════════════════╗",
            "║    GAME  OVER      ║",
            "╚════════════════════╝",
            &score_line,
            &level_line,
            &kills_line,
            &best_line,
            "ENTER - Play Again  Q - Quit",
        ],
        Color::Red,
    )
}

// ── Controls hint (last row) ──────────────────────────────────────────────────

fn draw_controls_hint<W: Write>(out: &mut W, view: &Viewport) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(1, view.rows.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print(
        "← → / A D : Move  SPACE : Shoot  B : Bomb  L : Laser  P : Pause  Q : Quit",
    ))?;
    Ok(())
}
