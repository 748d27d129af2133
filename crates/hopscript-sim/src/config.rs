use serde::{Deserialize, Serialize};

/// Gravity added to `vy` every step (units/step², downward).
pub const GRAVITY: f32 = 0.3;
/// Vertical velocity applied by a jump (negative is up).
pub const JUMP_VELOCITY: f32 = -10.0;
/// Horizontal speed while Left or Right is held.
pub const MOVE_SPEED: f32 = 2.0;
/// Player width.
pub const PLAYER_WIDTH: f32 = 50.0;
/// Player height.
pub const PLAYER_HEIGHT: f32 = 50.0;
/// Vertical distance within which a platform counts as nearby.
pub const DETECT_BAND: f32 = 100.0;
/// Grid unit used by LoopMove waypoints and CountdownLoop displacements.
pub const GRID_STEP: f32 = 50.0;

/// Physics parameters for the player and falling platforms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub jump_velocity: f32,
    pub move_speed: f32,
    pub player_width: f32,
    pub player_height: f32,
    pub detect_band: f32,
    /// Horizontal speed imparted by a spike pointing left or right.
    pub spike_knockback: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            jump_velocity: JUMP_VELOCITY,
            move_speed: MOVE_SPEED,
            player_width: PLAYER_WIDTH,
            player_height: PLAYER_HEIGHT,
            detect_band: DETECT_BAND,
            spike_knockback: 6.0,
        }
    }
}

/// Delays for deferred transitions, in simulation steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay between a Falling platform's trigger and the start of its descent.
    pub fall_delay_steps: u64,
    /// Cooldown before a Teleport platform can fire again.
    pub teleport_cooldown_steps: u64,
    /// Delay before each CountdownLoop action.
    pub countdown_delay_steps: u64,
    /// Delay before jump-type CountdownLoop actions.
    pub countdown_jump_delay_steps: u64,
    /// Window during which a spike cannot damage again.
    pub spike_cooldown_steps: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            fall_delay_steps: 20,
            teleport_cooldown_steps: 30,
            countdown_delay_steps: 60,
            countdown_jump_delay_steps: 120,
            spike_cooldown_steps: 60,
        }
    }
}

/// Run-wide rules: lives, death penalty, level floor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub starting_lives: i32,
    /// Coins deducted on every reset, floored at zero.
    pub death_coin_penalty: u32,
    /// Whether the bottom edge of the level is solid ground.
    pub solid_floor: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            starting_lives: 3,
            death_coin_penalty: 5,
            solid_floor: true,
        }
    }
}

/// Level dimensions used when a descriptor does not specify its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

/// Top-level simulation configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub physics: PhysicsConfig,
    pub timing: TimingConfig,
    pub run: RunConfig,
    pub world: WorldConfig,
}

impl SimConfig {
    /// Load config from `HOPSCRIPT_CONFIG` or `config/hopscript.toml`, falling
    /// back to defaults if the file is missing or unparseable.
    pub fn load() -> Self {
        let path = std::env::var("HOPSCRIPT_CONFIG")
            .unwrap_or_else(|_| "config/hopscript.toml".to_string());
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_toml(&content).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse {path}: {e}, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg = SimConfig::from_toml(
            r#"
            [physics]
            gravity = 0.5

            [run]
            starting_lives = 5
            "#,
        )
        .unwrap();
        assert_eq!(cfg.physics.gravity, 0.5);
        assert_eq!(cfg.physics.jump_velocity, JUMP_VELOCITY);
        assert_eq!(cfg.run.starting_lives, 5);
        assert_eq!(cfg.run.death_coin_penalty, 5);
        assert_eq!(cfg.world.width, 800.0);
    }

    #[test]
    fn empty_toml_is_default() {
        let cfg = SimConfig::from_toml("").unwrap();
        assert_eq!(cfg.timing.countdown_delay_steps, 60);
        assert!(cfg.run.solid_floor);
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let cfg = SimConfig::from_toml(include_str!("../../../config/hopscript.toml")).unwrap();
        let defaults = SimConfig::default();
        assert_eq!(cfg.physics.gravity, defaults.physics.gravity);
        assert_eq!(cfg.timing.fall_delay_steps, defaults.timing.fall_delay_steps);
        assert_eq!(cfg.run.starting_lives, defaults.run.starting_lives);
        assert_eq!(cfg.world.height, defaults.world.height);
    }

    #[test]
    fn malformed_toml_is_error() {
        assert!(SimConfig::from_toml("[physics\ngravity = ").is_err());
    }
}
