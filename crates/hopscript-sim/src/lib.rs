pub mod builtin;
pub mod config;
pub mod entities;
pub mod hazards;
pub mod level;
pub mod physics;
pub mod platform;
pub mod schedule;

use serde::{Deserialize, Serialize};

use hopscript_core::input::{InputFrame, InputKey, InputState};
use hopscript_core::sim_trait::{SimEvent, SimMetadata, Simulation};

use config::SimConfig;
use level::{LevelDescriptor, LevelError, LevelWorld, build_level};
use physics::tick_player;
use platform::{Platform, PlatformCtx, PlatformEffect};
use schedule::Scheduler;

/// Counters and flags that outlive a single level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub collected_coins: u32,
    pub lives: i32,
    pub current_level: usize,
    pub paused: bool,
    pub completed: bool,
    /// Bumped on every level load; timers from older generations are dropped.
    pub generation: u64,
}

/// Full serializable world, read by the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldState {
    pub run: RunState,
    pub level: LevelWorld,
    pub input: InputState,
    pub scheduler: Scheduler,
}

/// The platformer engine, implementing `Simulation`.
pub struct Hopscript {
    config: SimConfig,
    levels: Vec<LevelDescriptor>,
    state: WorldState,
    /// Set during a step when lives run out or the player falls out.
    reset_requested: bool,
}

impl Hopscript {
    /// Validate every level up front and start a run on the first one.
    pub fn new(levels: Vec<LevelDescriptor>, config: SimConfig) -> Result<Self, LevelError> {
        if levels.is_empty() {
            return Err(LevelError::NoLevels);
        }
        let mut built = levels
            .iter()
            .enumerate()
            .map(|(i, desc)| build_level(i, desc, &config))
            .collect::<Result<Vec<_>, _>>()?;
        let level = built.swap_remove(0);

        tracing::info!(levels = levels.len(), "Run started");
        Ok(Self {
            state: WorldState {
                run: RunState {
                    collected_coins: 0,
                    lives: config.run.starting_lives,
                    current_level: 0,
                    paused: false,
                    completed: false,
                    generation: 1,
                },
                level,
                input: InputState::default(),
                scheduler: Scheduler::default(),
            },
            config,
            levels,
            reset_requested: false,
        })
    }

    pub fn with_builtin_levels(config: SimConfig) -> Result<Self, LevelError> {
        Self::new(builtin::default_levels(), config)
    }

    pub fn state(&self) -> &WorldState {
        &self.state
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Help snippet of the nearest interactable platform.
    pub fn nearest_help(&self) -> Option<&str> {
        let level = &self.state.level;
        level
            .player
            .nearest
            .and_then(|i| level.platforms.get(i))
            .map(Platform::help_text)
    }

    /// Activate is held while something is near enough to explain.
    pub fn help_visible(&self) -> bool {
        self.state.input.held(InputKey::Activate) && self.nearest_help().is_some()
    }

    /// Replace the live level with a fresh build of level `index`. On error
    /// the current level is left as it was.
    pub fn load_level(&mut self, index: usize) -> Result<(), LevelError> {
        let desc = self.levels.get(index).ok_or(LevelError::LevelOutOfRange {
            index,
            count: self.levels.len(),
        })?;
        let level = build_level(index, desc, &self.config)?;

        self.state.level = level;
        self.state.run.current_level = index;
        self.state.run.generation += 1;
        self.state.scheduler.cancel_all();
        tracing::info!(
            level = index,
            generation = self.state.run.generation,
            "Level loaded"
        );
        Ok(())
    }

    /// Restore lives, charge the coin penalty and reload the current level.
    pub fn reset_level(&mut self) -> Result<(), LevelError> {
        let run = &mut self.state.run;
        run.lives = self.config.run.starting_lives;
        run.collected_coins = run
            .collected_coins
            .saturating_sub(self.config.run.death_coin_penalty);
        tracing::info!(
            level = run.current_level,
            coins = run.collected_coins,
            "Level reset"
        );
        self.load_level(self.state.run.current_level)
    }

    fn advance_level(&mut self, events: &mut Vec<SimEvent>) {
        let next = self.state.run.current_level + 1;
        if next >= self.levels.len() {
            let run = &mut self.state.run;
            run.completed = true;
            run.paused = true;
            self.state.scheduler.cancel_all();
            tracing::info!(coins = run.collected_coins, "Run completed");
            events.push(SimEvent::RunCompleted);
            return;
        }
        match self.load_level(next) {
            Ok(()) => events.push(SimEvent::LevelLoaded { level: next }),
            Err(e) => tracing::error!(error = %e, "Failed to load next level"),
        }
    }

    fn change_lives(&mut self, delta: i32, events: &mut Vec<SimEvent>) {
        let run = &mut self.state.run;
        run.lives += delta;
        if delta < 0 {
            events.push(SimEvent::LifeLost { lives: run.lives });
        }
        if run.lives <= 0 {
            self.reset_requested = true;
        }
    }

    /// Run `f` on platform `index` with a context borrowing the rest of the
    /// level, and return the effects it produced.
    fn with_platform(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut Platform, &mut PlatformCtx<'_>),
    ) -> Vec<PlatformEffect> {
        let WorldState { level, input, .. } = &mut self.state;
        let Some(platform) = level.platforms.get_mut(index) else {
            return Vec::new();
        };
        let mut ctx = PlatformCtx {
            index,
            player: &mut level.player,
            input,
            config: &self.config,
            level_height: level.height,
            walls: &level.walls,
            effects: Vec::new(),
        };
        f(platform, &mut ctx);
        ctx.effects
    }

    fn apply_effects(
        &mut self,
        index: usize,
        effects: Vec<PlatformEffect>,
        events: &mut Vec<SimEvent>,
    ) {
        for effect in effects {
            match effect {
                PlatformEffect::Activate { target } => {
                    if let Some(p) = self.state.level.platforms.get_mut(target) {
                        p.base.is_activated = true;
                    }
                },
                PlatformEffect::DetectByActivate { target } => {
                    if let Some(p) = self.state.level.platforms.get_mut(target) {
                        p.base.is_detected_by_activate = true;
                    }
                },
                PlatformEffect::OpenDoor { door } => {
                    if let Some(d) = self.state.level.doors.get_mut(door)
                        && !d.is_open
                    {
                        d.open();
                        events.push(SimEvent::DoorOpened { index: door });
                    }
                },
                PlatformEffect::LivesDelta(delta) => self.change_lives(delta, events),
                PlatformEffect::Schedule {
                    delay,
                    epoch,
                    action,
                } => {
                    let generation = self.state.run.generation;
                    self.state
                        .scheduler
                        .schedule(delay, index, generation, epoch, action);
                },
                PlatformEffect::Triggered { remote } => {
                    events.push(SimEvent::PlatformTriggered { index, remote });
                },
            }
        }
    }

    fn check_doors(&mut self, events: &mut Vec<SimEvent>) {
        let player = self.state.level.player.rect;
        if self.state.level.doors.iter().any(|d| d.admits(&player)) {
            self.advance_level(events);
        }
    }

    fn step_player(&mut self, events: &mut Vec<SimEvent>) {
        let report = tick_player(&mut self.state.level, &self.state.input, &self.config);

        for _ in 0..report.coins_collected {
            self.state.run.collected_coins += 1;
            events.push(SimEvent::CoinCollected {
                total: self.state.run.collected_coins,
            });
        }
        for _ in 0..report.enemies_stomped {
            events.push(SimEvent::EnemyStomped);
        }
        for _ in 0..report.damage_taken {
            self.change_lives(-1, events);
        }
        if report.fell_out {
            tracing::debug!("Player fell out of the level");
            self.reset_requested = true;
        }
    }

    fn fire_timers(&mut self, events: &mut Vec<SimEvent>) {
        for event in self.state.scheduler.drain_due() {
            let epoch = self
                .state
                .level
                .platforms
                .get(event.owner)
                .map(|p| p.base.epoch);
            if event.generation != self.state.run.generation || epoch != Some(event.epoch) {
                tracing::debug!(
                    owner = event.owner,
                    action = ?event.action,
                    "Dropped stale timer"
                );
                continue;
            }
            let effects = self.with_platform(event.owner, |platform, ctx| {
                platform.on_timer(event.action, ctx);
            });
            self.apply_effects(event.owner, effects, events);
        }
    }

    fn step_platforms(&mut self, events: &mut Vec<SimEvent>) {
        for platform in &mut self.state.level.platforms {
            platform.base.is_detected_by_activate = false;
        }
        for index in 0..self.state.level.platforms.len() {
            let effects = self.with_platform(index, |platform, ctx| platform.update(ctx));
            self.apply_effects(index, effects, events);
        }
    }

    fn step_hazards(&mut self, events: &mut Vec<SimEvent>) {
        let level = &mut self.state.level;
        let width = level.width;
        for enemy in &mut level.enemies {
            enemy.patrol(width);
        }

        let step = self.state.scheduler.step();
        let cooldown = self.config.timing.spike_cooldown_steps;
        let mut hits = 0;
        for spike in &mut level.spikes {
            if spike.try_hit(&level.player.rect, step, cooldown) {
                let knockback = spike.knockback(&self.config.physics);
                if let Some(vx) = knockback.vx {
                    level.player.vx = vx;
                }
                level.player.vy = knockback.vy;
                level.player.on_ground = false;
                hits += 1;
            }
        }
        for _ in 0..hits {
            self.change_lives(-1, events);
        }
    }

    fn check_lifecycle(&mut self, events: &mut Vec<SimEvent>) {
        if !std::mem::take(&mut self.reset_requested) {
            return;
        }
        let level = self.state.run.current_level;
        match self.reset_level() {
            Ok(()) => events.push(SimEvent::LevelReset { level }),
            Err(e) => tracing::error!(error = %e, "Failed to reset level"),
        }
    }
}

impl Simulation for Hopscript {
    fn metadata(&self) -> SimMetadata {
        SimMetadata {
            name: "Hopscript".to_string(),
            description: "Read the code, ride the platforms, reach the door.".to_string(),
            level_count: self.levels.len(),
        }
    }

    fn update(&mut self, input: InputFrame) -> Vec<SimEvent> {
        if self.state.run.paused || self.state.run.completed {
            return Vec::new();
        }

        let mut events = Vec::new();
        self.state.scheduler.advance();
        self.state.input.refresh(input);

        self.check_doors(&mut events);
        if self.state.run.completed {
            return events;
        }

        self.step_player(&mut events);
        self.fire_timers(&mut events);
        self.step_platforms(&mut events);
        self.step_hazards(&mut events);
        self.check_lifecycle(&mut events);

        events
    }

    hopscript_core::simulation_boilerplate!(state_type: WorldState);
}
