use serde::{Deserialize, Serialize};

use hopscript_core::geometry::{Push, Rect};
use hopscript_core::input::{InputKey, InputState};

use crate::config::{PhysicsConfig, SimConfig};
use crate::entities::{Coin, Enemy};
use crate::hazards::Body;
use crate::level::LevelWorld;
use crate::platform::Platform;

/// State of the controllable entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub rect: Rect,
    pub vx: f32,
    pub vy: f32,
    pub on_ground: bool,
    pub near_interactable: bool,
    /// Index of the nearest interactable platform, recomputed every step.
    pub nearest: Option<usize>,
    /// Index of the platform the player landed on this step.
    pub standing_on: Option<usize>,
}

impl Player {
    pub fn new(x: f32, y: f32, physics: &PhysicsConfig) -> Self {
        Self {
            rect: Rect::new(x, y, physics.player_width, physics.player_height),
            vx: 0.0,
            vy: 0.0,
            on_ground: false,
            near_interactable: false,
            nearest: None,
            standing_on: None,
        }
    }

    pub fn shift(&mut self, dx: f32, dy: f32) {
        self.rect.translate(dx, dy);
    }
}

impl Body for Player {
    fn rect(&self) -> &Rect {
        &self.rect
    }

    fn rect_mut(&mut self) -> &mut Rect {
        &mut self.rect
    }

    fn on_pushed(&mut self, push: Push) {
        if push.is_vertical() {
            if push.lands() {
                self.on_ground = true;
                if self.vy > 0.0 {
                    self.vy = 0.0;
                }
            } else if self.vy < 0.0 {
                self.vy = 0.0;
            }
        } else {
            self.vx = 0.0;
        }
    }
}

/// What happened to the player during one physics step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerStepReport {
    pub coins_collected: u32,
    pub damage_taken: u32,
    pub enemies_stomped: u32,
    /// Dropped out of a level without a solid floor.
    pub fell_out: bool,
}

/// Advance the player by one step: integrate, collide, read controls, and
/// resolve coins and enemies.
pub fn tick_player(
    level: &mut LevelWorld,
    input: &InputState,
    config: &SimConfig,
) -> PlayerStepReport {
    let physics = &config.physics;
    let mut report = PlayerStepReport::default();
    let player = &mut level.player;

    // Uses last step's grounding, before it is recomputed below.
    if input.just_pressed(InputKey::Jump) && player.on_ground {
        player.vy = physics.jump_velocity;
        player.on_ground = false;
    }

    player.vy += physics.gravity;
    player.rect.x += player.vx;
    player.rect.y += player.vy;

    player.on_ground = false;
    player.near_interactable = false;
    player.nearest = None;
    player.standing_on = None;

    land_on_platforms(player, &level.platforms);
    detect_nearest(player, &mut level.platforms, physics.detect_band);

    for wall in &level.walls {
        wall.resolve(player);
    }

    // Level bounds
    if player.rect.x < 0.0 {
        player.rect.x = 0.0;
    } else if player.rect.right() > level.width {
        player.rect.x = level.width - player.rect.w;
    }
    if config.run.solid_floor {
        if player.rect.bottom() > level.height {
            player.rect.y = level.height - player.rect.h;
            player.vy = 0.0;
            player.on_ground = true;
        }
    } else if player.rect.y > level.height {
        report.fell_out = true;
    }

    player.vx = input.horizontal() * physics.move_speed;

    report.coins_collected = collect_coins(player, &mut level.coins);
    resolve_enemies(player, &mut level.enemies, physics, &mut report);

    report
}

/// Top-only landing: snap onto any solid platform whose vertical span
/// contains the player's feet.
pub(crate) fn land_on_platforms(player: &mut Player, platforms: &[Platform]) {
    for (index, platform) in platforms.iter().enumerate() {
        if !platform.is_solid() {
            continue;
        }
        let top = platform.base.rect;
        let feet = player.rect.bottom();
        if feet > top.y && feet < top.bottom() && player.rect.overlaps_horizontally(&top) {
            player.rect.y = top.y - player.rect.h;
            player.vy = 0.0;
            player.on_ground = true;
            player.standing_on = Some(index);
        }
    }
}

/// Mark the platform nearest to the player, among those whose x-span holds
/// the player's center and whose center lies within `band` vertically.
pub(crate) fn detect_nearest(player: &mut Player, platforms: &mut [Platform], band: f32) {
    let (px, py) = player.rect.center();
    let mut best: Option<(usize, f32)> = None;

    for (index, platform) in platforms.iter_mut().enumerate() {
        platform.base.is_detected = false;
        if !platform.base.visible {
            continue;
        }
        let rect = platform.base.rect;
        let (cx, cy) = rect.center();
        if px < rect.x || px > rect.right() || (py - cy).abs() > band {
            continue;
        }
        let dist = ((px - cx).powi(2) + (py - cy).powi(2)).sqrt();
        if best.is_none_or(|(_, d)| dist < d) {
            best = Some((index, dist));
        }
    }

    if let Some((index, _)) = best {
        platforms[index].base.is_detected = true;
        player.nearest = Some(index);
        player.near_interactable = true;
    }
}

fn collect_coins(player: &Player, coins: &mut Vec<Coin>) -> u32 {
    let before = coins.len();
    coins.retain(|coin| !coin.touches(&player.rect));
    (before - coins.len()) as u32
}

fn resolve_enemies(
    player: &mut Player,
    enemies: &mut Vec<Enemy>,
    physics: &PhysicsConfig,
    report: &mut PlayerStepReport,
) {
    enemies.retain(|enemy| {
        if !player.rect.overlaps(&enemy.rect) {
            return true;
        }
        let previous_feet = player.rect.bottom() - player.vy;
        if player.vy > 0.0 && previous_feet < enemy.rect.y {
            // Landed on it from above
            player.vy = physics.jump_velocity;
            report.enemies_stomped += 1;
            false
        } else {
            report.damage_taken += 1;
            player.vx = if player.rect.x < enemy.rect.x {
                -physics.move_speed
            } else {
                physics.move_speed
            };
            player.vy = physics.jump_velocity / 2.0;
            true
        }
    });
}
