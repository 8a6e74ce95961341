//! Canvas 2D renderer (browser)

use std::f64::consts::TAU;

use web_sys::CanvasRenderingContext2d;

use super::{Drawable, RenderSink};
use crate::sim::entity::{Enemy, Explosion, Player, Powerup, PowerupKind, Projectile};
use crate::sim::state::Star;

const ENEMY_COLORS: [&str; 3] = ["#f87171", "#fb923c", "#a78bfa"];
const PARTICLE_COLORS: [&str; 4] = ["#f97316", "#fbbf24", "#ef4444", "#fff"];
const SHIELD_COLOR: &str = "#60a5fa";

fn powerup_color(kind: PowerupKind) -> &'static str {
    match kind {
        PowerupKind::Shield => "#60a5fa",
        PowerupKind::RapidFire => "#fbbf24",
        PowerupKind::MultiShot => "#a78bfa",
        PowerupKind::Health => "#f87171",
        PowerupKind::Bomb => "#fb923c",
    }
}

/// Draws the field onto a 2D canvas context
pub struct CanvasRenderer {
    ctx: CanvasRenderingContext2d,
    width: f64,
    height: f64,
    /// Shake offset of the current frame, applied to every draw
    shake: (f64, f64),
}

impl CanvasRenderer {
    pub fn new(ctx: CanvasRenderingContext2d, width: f64, height: f64) -> Self {
        Self {
            ctx,
            width,
            height,
            shake: (0.0, 0.0),
        }
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    fn background(&mut self, stars: &[Star]) {
        let ctx = &self.ctx;
        // Translucent fill leaves short motion trails
        ctx.set_fill_style_str("rgba(0, 0, 17, 0.3)");
        ctx.fill_rect(-20.0, -20.0, self.width + 40.0, self.height + 40.0);

        ctx.set_fill_style_str("#fff");
        for star in stars {
            ctx.fill_rect(
                star.pos.x as f64 + self.shake.0,
                star.pos.y as f64 + self.shake.1,
                star.size as f64,
                star.size as f64,
            );
        }
    }

    fn player(&self, player: &Player, shielded: bool) {
        let ctx = &self.ctx;
        let (x, y) = (
            player.pos.x as f64 + self.shake.0,
            player.pos.y as f64 + self.shake.1,
        );
        let (w, h) = (player.size.x as f64, player.size.y as f64);
        let (color, accent) = player.skin.colors();

        if shielded {
            ctx.set_stroke_style_str(SHIELD_COLOR);
            ctx.set_line_width(2.0);
            ctx.set_shadow_color(SHIELD_COLOR);
            ctx.set_shadow_blur(15.0);
            ctx.begin_path();
            let _ = ctx.arc(x + w / 2.0, y + h / 2.0, 38.0, 0.0, TAU);
            ctx.stroke();
            ctx.set_shadow_blur(0.0);
        }

        ctx.set_fill_style_str(color);
        ctx.set_shadow_color(color);
        ctx.set_shadow_blur(10.0);
        ctx.begin_path();
        ctx.move_to(x + w / 2.0, y);
        ctx.line_to(x + w, y + h);
        ctx.line_to(x + w / 2.0, y + h * 0.8);
        ctx.line_to(x, y + h);
        ctx.close_path();
        ctx.fill();
        ctx.set_shadow_blur(0.0);

        ctx.set_fill_style_str(accent);
        ctx.fill_rect(x + w / 2.0 - 5.0, y + h * 0.4, 10.0, 12.0);
    }

    fn projectile(&self, shot: &Projectile) {
        let ctx = &self.ctx;
        let color = if shot.is_enemy() { "#f87171" } else { "#4ade80" };
        let (x, y) = (
            shot.pos.x as f64 + self.shake.0,
            shot.pos.y as f64 + self.shake.1,
        );
        ctx.set_fill_style_str(color);
        ctx.set_shadow_color(color);
        ctx.set_shadow_blur(15.0);
        ctx.fill_rect(x, y, 4.0, 15.0);
        ctx.set_fill_style_str("#fff");
        ctx.fill_rect(x + 1.0, y + 2.0, 2.0, 7.0);
        ctx.set_shadow_blur(0.0);
    }

    fn enemy(&self, enemy: &Enemy) {
        let ctx = &self.ctx;
        let size = enemy.size as f64;
        let (x, y) = (
            enemy.pos.x as f64 + self.shake.0,
            enemy.pos.y as f64 + self.shake.1,
        );
        let (cx, cy) = (x + size / 2.0, y + size / 2.0);

        if enemy.boss {
            ctx.set_fill_style_str("#8b0000");
            ctx.set_shadow_color("#ff0000");
            ctx.set_shadow_blur(30.0);
            ctx.begin_path();
            let _ = ctx.ellipse(cx, cy, size / 2.0, size / 2.5, 0.0, 0.0, TAU);
            ctx.fill();
            ctx.set_shadow_blur(0.0);

            ctx.set_fill_style_str("#ff0000");
            for eye_x in [x + 25.0, x + 55.0] {
                ctx.begin_path();
                let _ = ctx.arc(eye_x, y + 30.0, 6.0, 0.0, TAU);
                ctx.fill();
            }
        } else {
            let color = ENEMY_COLORS[enemy.variant as usize % ENEMY_COLORS.len()];
            ctx.set_fill_style_str(color);
            ctx.set_shadow_color(color);
            ctx.set_shadow_blur(15.0);
            ctx.begin_path();
            let _ = ctx.ellipse(cx, cy, size / 2.0, size / 3.0, 0.0, 0.0, TAU);
            ctx.fill();
            ctx.set_shadow_blur(0.0);

            ctx.set_fill_style_str("#60a5fa");
            ctx.begin_path();
            let _ = ctx.arc(cx, cy - 5.0, 10.0, std::f64::consts::PI, 0.0);
            ctx.fill();
        }

        let fraction = enemy.health_fraction() as f64;
        if fraction < 1.0 {
            ctx.set_fill_style_str("rgba(0, 0, 0, 0.5)");
            ctx.fill_rect(x - 2.0, y - 12.0, size + 4.0, 9.0);
            let bar = if enemy.boss {
                "#ff0000"
            } else if fraction > 0.5 {
                "#4ade80"
            } else if fraction > 0.25 {
                "#fbbf24"
            } else {
                "#f87171"
            };
            ctx.set_fill_style_str(bar);
            ctx.fill_rect(x, y - 10.0, size * fraction, 5.0);
        }
    }

    fn powerup(&self, pickup: &Powerup) {
        let ctx = &self.ctx;
        let half = 15.0;
        let color = powerup_color(pickup.kind);
        ctx.save();
        let _ = ctx.translate(
            pickup.pos.x as f64 + half + self.shake.0,
            pickup.pos.y as f64 + half + self.shake.1,
        );
        let _ = ctx.rotate(pickup.rotation as f64);
        ctx.set_shadow_color(color);
        ctx.set_shadow_blur(15.0);
        ctx.set_fill_style_str(color);
        ctx.fill_rect(-half, -half, half * 2.0, half * 2.0);
        ctx.set_stroke_style_str("#fff");
        ctx.set_line_width(2.0);
        ctx.stroke_rect(-half, -half, half * 2.0, half * 2.0);
        ctx.restore();
    }

    fn explosion(&self, burst: &Explosion) {
        let ctx = &self.ctx;
        for p in &burst.particles {
            let color = PARTICLE_COLORS[p.color as usize % PARTICLE_COLORS.len()];
            ctx.set_global_alpha(p.life as f64 / crate::consts::PARTICLE_LIFE_TICKS as f64);
            ctx.set_fill_style_str(color);
            ctx.begin_path();
            let _ = ctx.arc(
                p.pos.x as f64 + self.shake.0,
                p.pos.y as f64 + self.shake.1,
                p.size as f64,
                0.0,
                TAU,
            );
            ctx.fill();
        }
        ctx.set_global_alpha(1.0);
    }
}

impl RenderSink for CanvasRenderer {
    fn draw(&mut self, item: Drawable<'_>) {
        match item {
            Drawable::Background { stars, shake } => {
                self.shake = (shake.x as f64, shake.y as f64);
                self.background(stars);
            }
            Drawable::Player { player, shielded } => self.player(player, shielded),
            Drawable::Projectile(shot) => self.projectile(shot),
            Drawable::Enemy(enemy) => self.enemy(enemy),
            Drawable::Powerup(pickup) => self.powerup(pickup),
            Drawable::Explosion(burst) => self.explosion(burst),
        }
    }
}
