use serde::{Deserialize, Serialize};

use hopscript_core::geometry::{Push, Rect};
use hopscript_core::input::{InputKey, InputState};

use crate::config::{GRID_STEP, SimConfig, TimingConfig};
use crate::hazards::{Body, Wall};
use crate::physics::Player;
use crate::schedule::TimedAction;

/// Lifecycle phase shared by every platform kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Idle,
    /// Idle with the player standing on it.
    Armed,
    Triggered,
    InMotion,
    CoolingDown,
}

/// Where an activation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    /// Player standing on the platform pressed Interact.
    Local,
    /// Another platform set `is_activated`.
    Remote,
}

/// Grid direction used by LoopMove paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        [
            ("up", Self::Up),
            ("down", Self::Down),
            ("left", Self::Left),
            ("right", Self::Right),
        ]
        .into_iter()
        .find(|(name, _)| token.eq_ignore_ascii_case(name))
        .map(|(_, dir)| dir)
    }

    fn delta(self) -> (f32, f32) {
        match self {
            Self::Up => (0.0, -GRID_STEP),
            Self::Down => (0.0, GRID_STEP),
            Self::Left => (-GRID_STEP, 0.0),
            Self::Right => (GRID_STEP, 0.0),
        }
    }
}

/// Fold grid directions into absolute waypoints starting from `start`.
pub fn loop_waypoints(start: (f32, f32), directions: &[Direction]) -> Vec<(f32, f32)> {
    directions
        .iter()
        .scan(start, |pos, dir| {
            let (dx, dy) = dir.delta();
            pos.0 += dx;
            pos.1 += dy;
            Some(*pos)
        })
        .collect()
}

/// One step of a CountdownLoop sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CountdownAction {
    /// `+x -x +y -y`. `+y` moves down the screen.
    Shift { dx: f32, dy: f32 },
    /// `+health -health`
    Health(i32),
    /// `jump 1.5jump 2jump`, scale applied to the jump velocity.
    Jump(f32),
    Hide,
    Show,
    /// Open the linked door.
    Open,
    Unknown(String),
}

impl CountdownAction {
    pub fn parse(token: &str) -> Self {
        match token.trim() {
            "+x" => Self::Shift {
                dx: GRID_STEP,
                dy: 0.0,
            },
            "-x" => Self::Shift {
                dx: -GRID_STEP,
                dy: 0.0,
            },
            "+y" => Self::Shift {
                dx: 0.0,
                dy: GRID_STEP,
            },
            "-y" => Self::Shift {
                dx: 0.0,
                dy: -GRID_STEP,
            },
            "+health" => Self::Health(1),
            "-health" => Self::Health(-1),
            "jump" => Self::Jump(1.0),
            "1.5jump" => Self::Jump(1.5),
            "2jump" => Self::Jump(2.0),
            "hide" => Self::Hide,
            "show" => Self::Show,
            "open" => Self::Open,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn is_jump(&self) -> bool {
        matches!(self, Self::Jump(_))
    }

    /// Steps to wait after this action before the next one fires. A jump
    /// waits longer so the player is back on the platform in time.
    pub fn delay_after(&self, timing: &TimingConfig) -> u64 {
        if self.is_jump() {
            timing.countdown_jump_delay_steps
        } else {
            timing.countdown_delay_steps
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FallStage {
    Idle,
    Triggered,
    Falling,
    Resting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallingState {
    /// Landing on the platform triggers it.
    pub trap: bool,
    pub stage: FallStage,
    pub speed: f32,
}

impl FallingState {
    pub fn new(trap: bool, already_falling: bool) -> Self {
        Self {
            trap,
            stage: if already_falling {
                FallStage::Falling
            } else {
                FallStage::Idle
            },
            speed: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveState {
    pub dx: f32,
    pub dy: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopMoveState {
    pub waypoints: Vec<(f32, f32)>,
    pub sequence_index: usize,
    /// Set for a locally started run: the platform carries the player.
    pub carry_player: bool,
}

impl LoopMoveState {
    pub fn new(waypoints: Vec<(f32, f32)>) -> Self {
        Self {
            waypoints,
            sequence_index: 0,
            carry_player: false,
        }
    }

    fn advance(&mut self, base: &mut PlatformBase, standing: bool, ctx: &mut PlatformCtx<'_>) {
        let Some(&(tx, ty)) = self.waypoints.get(self.sequence_index) else {
            self.finish(base);
            return;
        };
        let (x, y) = (base.rect.x, base.rect.y);
        base.rect.x = step_toward(x, tx);
        base.rect.y = step_toward(y, ty);
        if self.carry_player && standing {
            ctx.player.shift(base.rect.x - x, base.rect.y - y);
        }
        if base.rect.x == tx && base.rect.y == ty {
            self.sequence_index += 1;
            if self.sequence_index >= self.waypoints.len() {
                self.finish(base);
            }
        }
    }

    fn finish(&mut self, base: &mut PlatformBase) {
        tracing::debug!("LoopMove path complete");
        self.sequence_index = 0;
        self.carry_player = false;
        base.phase = Phase::Idle;
    }
}

/// Move one unit toward `target`, landing on it exactly when within reach.
fn step_toward(current: f32, target: f32) -> f32 {
    let diff = target - current;
    if diff.abs() <= 1.0 {
        target
    } else {
        current + diff.signum()
    }
}

/// Bring a rect that left the level vertically back in from the other side.
fn wrap_vertical(rect: &mut Rect, height: f32) {
    if rect.y >= height || rect.bottom() <= 0.0 {
        rect.y = rect.y.rem_euclid(height);
        if rect.y >= height {
            rect.y = 0.0;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeleportState {
    pub dx: f32,
    pub dy: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountdownState {
    pub actions: Vec<CountdownAction>,
    /// Next action to fire.
    pub index: usize,
    pub local_run: bool,
    /// Door opened by the `open` action.
    pub door: Option<usize>,
}

impl CountdownState {
    pub fn new(actions: Vec<CountdownAction>, door: Option<usize>) -> Self {
        Self {
            actions,
            index: 0,
            local_run: false,
            door,
        }
    }

    fn fire(&mut self, base: &mut PlatformBase, standing: bool, ctx: &mut PlatformCtx<'_>) {
        if self.local_run && !standing {
            tracing::debug!(
                platform = ctx.index,
                at = self.index,
                "Player left countdown platform, aborting run"
            );
            self.stop(base);
            base.epoch += 1;
            return;
        }
        let Some(action) = self.actions.get(self.index).cloned() else {
            self.stop(base);
            return;
        };
        self.run_action(&action, base, ctx);
        self.index += 1;
        if self.index < self.actions.len() {
            ctx.schedule(
                base.epoch,
                action.delay_after(&ctx.config.timing),
                TimedAction::CountdownStep,
            );
        } else {
            self.stop(base);
        }
    }

    fn run_action(
        &self,
        action: &CountdownAction,
        base: &mut PlatformBase,
        ctx: &mut PlatformCtx<'_>,
    ) {
        match action {
            CountdownAction::Shift { dx, dy } => {
                base.rect.translate(*dx, *dy);
                if self.local_run {
                    ctx.player.shift(*dx, *dy);
                }
            },
            CountdownAction::Health(delta) => ctx.effects.push(PlatformEffect::LivesDelta(*delta)),
            CountdownAction::Jump(scale) => {
                if self.local_run {
                    ctx.player.vy = ctx.config.physics.jump_velocity * scale;
                    ctx.player.on_ground = false;
                }
            },
            CountdownAction::Hide => base.visible = false,
            CountdownAction::Show => base.visible = true,
            CountdownAction::Open => match self.door {
                Some(door) => ctx.effects.push(PlatformEffect::OpenDoor { door }),
                None => tracing::warn!(platform = ctx.index, "open action has no linked door"),
            },
            CountdownAction::Unknown(token) => {
                tracing::warn!(platform = ctx.index, token = %token, "Ignoring unknown countdown action");
            },
        }
    }

    fn stop(&mut self, base: &mut PlatformBase) {
        self.index = 0;
        self.local_run = false;
        base.phase = Phase::Idle;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivateState {
    pub target: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenDoorState {
    pub door: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlatformKind {
    Stable,
    Falling(FallingState),
    Move(MoveState),
    LoopMove(LoopMoveState),
    Teleport(TeleportState),
    CountdownLoop(CountdownState),
    Activate(ActivateState),
    OpenDoor(OpenDoorState),
}

impl PlatformKind {
    /// Code snippet describing what this kind of platform does.
    pub fn default_help(&self) -> &'static str {
        match self {
            Self::Stable => "let platform = Platform::stable();\n// Solid from above. Nothing else happens.",
            Self::Falling(_) => {
                "if interact.just_pressed() && player.on(platform) {\n    wait(fall_delay);\n    while platform.y <= level.height {\n        platform.y += speed;\n        speed += gravity;\n    }\n}"
            },
            Self::Move(_) => {
                "if interact.just_pressed() && player.on(platform) {\n    platform.x += dx;\n    platform.y += dy;\n    player.x += dx;\n    player.y += dy;\n}"
            },
            Self::LoopMove(_) => {
                "for waypoint in path {\n    while platform.pos != waypoint {\n        platform.step_toward(waypoint);\n    }\n}"
            },
            Self::Teleport(_) => {
                "let offset = player.pos - platform.pos;\nplatform.y = (platform.y + dy).rem_euclid(level.height);\nplayer.pos = platform.pos + offset;"
            },
            Self::CountdownLoop(_) => {
                "for action in sequence {\n    wait(delay);\n    if !player.on(platform) {\n        break;\n    }\n    action.run();\n}"
            },
            Self::Activate(_) => {
                "if interact.just_pressed() && player.on(self) {\n    target.is_activated = true;\n}"
            },
            Self::OpenDoor(_) => "if interact.just_pressed() && player.on(platform) {\n    door.open();\n}",
        }
    }
}

/// State shared by every platform kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformBase {
    pub id: Option<String>,
    pub rect: Rect,
    pub color: String,
    /// Overrides the kind's help snippet.
    pub message: Option<String>,
    pub visible: bool,
    pub is_detected: bool,
    /// Remote activation request, consumed on the platform's next update.
    pub is_activated: bool,
    /// An Activate platform targeting this one has the player on it.
    pub is_detected_by_activate: bool,
    pub phase: Phase,
    /// Bumped whenever pending timers for this platform must be discarded.
    pub epoch: u64,
}

impl PlatformBase {
    pub fn new(rect: Rect) -> Self {
        Self {
            id: None,
            rect,
            color: "brown".to_string(),
            message: None,
            visible: true,
            is_detected: false,
            is_activated: false,
            is_detected_by_activate: false,
            phase: Phase::Idle,
            epoch: 0,
        }
    }
}

/// Side effect a platform asks the world to apply after its update, for
/// anything outside the platform itself.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEffect {
    Activate { target: usize },
    DetectByActivate { target: usize },
    OpenDoor { door: usize },
    LivesDelta(i32),
    Schedule {
        delay: u64,
        epoch: u64,
        action: TimedAction,
    },
    Triggered { remote: bool },
}

/// Everything a platform may read or touch while updating.
pub struct PlatformCtx<'a> {
    pub index: usize,
    pub player: &'a mut Player,
    pub input: &'a InputState,
    pub config: &'a SimConfig,
    pub level_height: f32,
    pub walls: &'a [Wall],
    pub effects: Vec<PlatformEffect>,
}

impl PlatformCtx<'_> {
    fn standing_on_self(&self) -> bool {
        self.player.standing_on == Some(self.index)
    }

    fn schedule(&mut self, epoch: u64, delay: u64, action: TimedAction) {
        self.effects.push(PlatformEffect::Schedule {
            delay,
            epoch,
            action,
        });
    }

    fn triggered(&mut self, trigger: Trigger) {
        self.effects.push(PlatformEffect::Triggered {
            remote: trigger == Trigger::Remote,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub base: PlatformBase,
    pub kind: PlatformKind,
}

impl Platform {
    pub fn new(rect: Rect, kind: PlatformKind) -> Self {
        let mut base = PlatformBase::new(rect);
        if matches!(
            &kind,
            PlatformKind::Falling(FallingState {
                stage: FallStage::Falling,
                ..
            })
        ) {
            base.phase = Phase::InMotion;
        }
        Self { base, kind }
    }

    pub fn help_text(&self) -> &str {
        self.base
            .message
            .as_deref()
            .unwrap_or_else(|| self.kind.default_help())
    }

    /// Whether the player can land on it.
    pub fn is_solid(&self) -> bool {
        self.base.visible
            && !matches!(
                &self.kind,
                PlatformKind::Falling(FallingState {
                    stage: FallStage::Falling | FallStage::Resting,
                    ..
                })
            )
    }

    fn is_falling(&self) -> bool {
        matches!(
            &self.kind,
            PlatformKind::Falling(FallingState {
                stage: FallStage::Falling,
                ..
            })
        )
    }

    fn take_trigger(&mut self, standing: bool, input: &InputState) -> Option<Trigger> {
        if std::mem::take(&mut self.base.is_activated) {
            Some(Trigger::Remote)
        } else if standing && input.just_pressed(InputKey::Interact) {
            Some(Trigger::Local)
        } else {
            None
        }
    }

    /// Per-step update, run after player physics.
    pub fn update(&mut self, ctx: &mut PlatformCtx<'_>) {
        let standing = self.base.visible && ctx.standing_on_self();
        let trigger = self.take_trigger(standing, ctx.input);
        let Platform { base, kind } = self;

        match kind {
            PlatformKind::Stable => {},
            PlatformKind::Falling(state) => {
                let landed_on_trap = state.trap && standing;
                if state.stage == FallStage::Idle && (trigger.is_some() || landed_on_trap) {
                    tracing::debug!(platform = ctx.index, "Falling platform triggered");
                    state.stage = FallStage::Triggered;
                    base.phase = Phase::Triggered;
                    ctx.schedule(
                        base.epoch,
                        ctx.config.timing.fall_delay_steps,
                        TimedAction::BeginFall,
                    );
                    ctx.triggered(trigger.unwrap_or(Trigger::Local));
                }
                if state.stage == FallStage::Falling {
                    state.speed += ctx.config.physics.gravity;
                    base.rect.y += state.speed;
                    if base.rect.y > ctx.level_height {
                        state.stage = FallStage::Resting;
                        state.speed = 0.0;
                        base.phase = Phase::Idle;
                    }
                }
            },
            PlatformKind::Move(state) => {
                if let Some(t) = trigger {
                    base.rect.translate(state.dx, state.dy);
                    if t == Trigger::Local {
                        ctx.player.shift(state.dx, state.dy);
                    }
                    ctx.triggered(t);
                }
            },
            PlatformKind::LoopMove(state) => {
                if let Some(t) = trigger
                    && base.phase != Phase::InMotion
                {
                    base.phase = Phase::InMotion;
                    state.sequence_index = 0;
                    state.carry_player = t == Trigger::Local;
                    ctx.triggered(t);
                }
                if base.phase == Phase::InMotion {
                    state.advance(base, standing, ctx);
                }
            },
            PlatformKind::Teleport(state) => {
                if let Some(t) = trigger
                    && base.phase != Phase::CoolingDown
                {
                    let offset = (
                        ctx.player.rect.x - base.rect.x,
                        ctx.player.rect.y - base.rect.y,
                    );
                    base.rect.translate(state.dx, state.dy);
                    wrap_vertical(&mut base.rect, ctx.level_height);
                    if t == Trigger::Local {
                        ctx.player.rect.x = base.rect.x + offset.0;
                        ctx.player.rect.y = base.rect.y + offset.1;
                    }
                    base.phase = Phase::CoolingDown;
                    ctx.schedule(
                        base.epoch,
                        ctx.config.timing.teleport_cooldown_steps,
                        TimedAction::Rearm,
                    );
                    ctx.triggered(t);
                }
            },
            PlatformKind::CountdownLoop(state) => {
                if let Some(t) = trigger
                    && base.phase != Phase::InMotion
                    && !state.actions.is_empty()
                {
                    let delay = ctx.config.timing.countdown_delay_steps;
                    base.phase = Phase::InMotion;
                    state.index = 0;
                    state.local_run = t == Trigger::Local;
                    ctx.schedule(base.epoch, delay, TimedAction::CountdownStep);
                    ctx.triggered(t);
                }
            },
            PlatformKind::Activate(state) => {
                if standing {
                    ctx.effects.push(PlatformEffect::DetectByActivate {
                        target: state.target,
                    });
                }
                if let Some(t) = trigger {
                    ctx.effects.push(PlatformEffect::Activate {
                        target: state.target,
                    });
                    ctx.triggered(t);
                }
            },
            PlatformKind::OpenDoor(state) => {
                if let Some(t) = trigger {
                    ctx.effects.push(PlatformEffect::OpenDoor { door: state.door });
                    ctx.triggered(t);
                }
            },
        }

        if self.is_falling() {
            let walls = ctx.walls;
            for wall in walls {
                wall.resolve(self);
            }
        }

        self.base.phase = match self.base.phase {
            Phase::Idle if standing => Phase::Armed,
            Phase::Armed if !standing => Phase::Idle,
            phase => phase,
        };
    }

    /// Run a scheduled transition. The caller has already checked that the
    /// event belongs to the current generation and epoch.
    pub fn on_timer(&mut self, action: TimedAction, ctx: &mut PlatformCtx<'_>) {
        let standing = self.base.visible && ctx.standing_on_self();
        let Platform { base, kind } = self;

        match (action, kind) {
            (TimedAction::BeginFall, PlatformKind::Falling(state))
                if state.stage == FallStage::Triggered =>
            {
                tracing::debug!(platform = ctx.index, "Platform begins to fall");
                state.stage = FallStage::Falling;
                state.speed = 0.0;
                base.phase = Phase::InMotion;
            },
            (TimedAction::Rearm, PlatformKind::Teleport(_)) if base.phase == Phase::CoolingDown => {
                base.phase = Phase::Idle;
            },
            (TimedAction::CountdownStep, PlatformKind::CountdownLoop(state))
                if base.phase == Phase::InMotion =>
            {
                state.fire(base, standing, ctx);
            },
            (action, _) => {
                tracing::debug!(platform = ctx.index, ?action, "Timer no longer applies");
            },
        }
    }
}

impl Body for Platform {
    fn rect(&self) -> &Rect {
        &self.base.rect
    }

    fn rect_mut(&mut self) -> &mut Rect {
        &mut self.base.rect
    }

    fn on_pushed(&mut self, push: Push) {
        if let PlatformKind::Falling(state) = &mut self.kind
            && state.stage == FallStage::Falling
            && push.lands()
        {
            state.stage = FallStage::Resting;
            state.speed = 0.0;
            self.base.phase = Phase::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;
    use hopscript_core::input::InputFrame;

    struct Harness {
        player: Player,
        input: InputState,
        config: SimConfig,
        walls: Vec<Wall>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                player: Player::new(0.0, 0.0, &PhysicsConfig::default()),
                input: InputState::default(),
                config: SimConfig::default(),
                walls: Vec::new(),
            }
        }

        fn stand_on(&mut self, platform: &Platform, index: usize) {
            let rect = platform.base.rect;
            self.player.rect.x = rect.x;
            self.player.rect.y = rect.y - self.player.rect.h;
            self.player.standing_on = Some(index);
        }

        fn press(&mut self, keys: &[InputKey]) {
            self.input.refresh(InputFrame::from_keys(keys));
        }

        fn update(&mut self, platform: &mut Platform, index: usize) -> Vec<PlatformEffect> {
            let mut ctx = PlatformCtx {
                index,
                player: &mut self.player,
                input: &self.input,
                config: &self.config,
                level_height: 600.0,
                walls: &self.walls,
                effects: Vec::new(),
            };
            platform.update(&mut ctx);
            ctx.effects
        }

        fn timer(
            &mut self,
            platform: &mut Platform,
            index: usize,
            action: TimedAction,
        ) -> Vec<PlatformEffect> {
            let mut ctx = PlatformCtx {
                index,
                player: &mut self.player,
                input: &self.input,
                config: &self.config,
                level_height: 600.0,
                walls: &self.walls,
                effects: Vec::new(),
            };
            platform.on_timer(action, &mut ctx);
            ctx.effects
        }
    }

    fn rect(x: f32, y: f32) -> Rect {
        Rect::new(x, y, 100.0, 20.0)
    }

    #[test]
    fn waypoints_fold_from_start() {
        let dirs = [Direction::Right, Direction::Right, Direction::Up];
        assert_eq!(
            loop_waypoints((0.0, 100.0), &dirs),
            vec![(50.0, 100.0), (100.0, 100.0), (100.0, 50.0)]
        );
        assert!(loop_waypoints((0.0, 0.0), &[]).is_empty());
    }

    #[test]
    fn direction_tokens() {
        assert_eq!(Direction::parse("up"), Some(Direction::Up));
        assert_eq!(Direction::parse(" Right "), Some(Direction::Right));
        assert_eq!(Direction::parse("diagonal"), None);
    }

    #[test]
    fn countdown_vocabulary() {
        assert_eq!(
            CountdownAction::parse("-y"),
            CountdownAction::Shift {
                dx: 0.0,
                dy: -GRID_STEP
            }
        );
        assert_eq!(CountdownAction::parse("-health"), CountdownAction::Health(-1));
        assert_eq!(CountdownAction::parse("1.5jump"), CountdownAction::Jump(1.5));
        assert_eq!(CountdownAction::parse("open"), CountdownAction::Open);
        assert_eq!(
            CountdownAction::parse("dance"),
            CountdownAction::Unknown("dance".into())
        );
        let timing = TimingConfig::default();
        assert_eq!(CountdownAction::Jump(2.0).delay_after(&timing), 120);
        assert_eq!(CountdownAction::Hide.delay_after(&timing), 60);
    }

    #[test]
    fn loop_move_right_right_up_scenario() {
        let mut h = Harness::new();
        let start = (0.0, 100.0);
        let dirs = [Direction::Right, Direction::Right, Direction::Up];
        let mut platform = Platform::new(
            rect(start.0, start.1),
            PlatformKind::LoopMove(LoopMoveState::new(loop_waypoints(start, &dirs))),
        );
        platform.base.is_activated = true;

        let mut steps = 0;
        loop {
            h.update(&mut platform, 0);
            steps += 1;
            if platform.base.phase == Phase::Idle || steps > 1000 {
                break;
            }
        }

        assert_eq!((platform.base.rect.x, platform.base.rect.y), (100.0, 50.0));
        assert_eq!(steps, 150);
        let PlatformKind::LoopMove(state) = &platform.kind else {
            unreachable!()
        };
        assert_eq!(state.sequence_index, 0);
    }

    #[test]
    fn loop_move_carries_player_only_on_local_run() {
        let mut h = Harness::new();
        let waypoints = loop_waypoints((0.0, 300.0), &[Direction::Right]);
        let mut platform = Platform::new(
            rect(0.0, 300.0),
            PlatformKind::LoopMove(LoopMoveState::new(waypoints.clone())),
        );
        h.stand_on(&platform, 0);
        h.press(&[InputKey::Interact]);
        h.update(&mut platform, 0);
        assert_eq!(h.player.rect.x, 1.0);

        let mut h = Harness::new();
        let mut platform = Platform::new(
            rect(0.0, 300.0),
            PlatformKind::LoopMove(LoopMoveState::new(waypoints)),
        );
        h.stand_on(&platform, 0);
        platform.base.is_activated = true;
        h.update(&mut platform, 0);
        assert_eq!(platform.base.rect.x, 1.0);
        assert_eq!(h.player.rect.x, 0.0);
    }

    #[test]
    fn move_displaces_player_only_when_local() {
        let kind = PlatformKind::Move(MoveState { dx: 50.0, dy: -50.0 });

        let mut h = Harness::new();
        let mut platform = Platform::new(rect(200.0, 300.0), kind.clone());
        h.stand_on(&platform, 3);
        h.press(&[InputKey::Interact]);
        let effects = h.update(&mut platform, 3);
        assert_eq!((platform.base.rect.x, platform.base.rect.y), (250.0, 250.0));
        assert_eq!((h.player.rect.x, h.player.rect.y), (250.0, 200.0));
        assert!(effects.contains(&PlatformEffect::Triggered { remote: false }));

        let mut h = Harness::new();
        let mut platform = Platform::new(rect(200.0, 300.0), kind);
        h.stand_on(&platform, 3);
        platform.base.is_activated = true;
        let effects = h.update(&mut platform, 3);
        assert_eq!((platform.base.rect.x, platform.base.rect.y), (250.0, 250.0));
        assert_eq!((h.player.rect.x, h.player.rect.y), (200.0, 250.0));
        assert!(!platform.base.is_activated, "remote flag is consumed");
        assert!(effects.contains(&PlatformEffect::Triggered { remote: true }));
    }

    #[test]
    fn interact_without_standing_does_nothing() {
        let mut h = Harness::new();
        let mut platform = Platform::new(
            rect(200.0, 300.0),
            PlatformKind::Move(MoveState { dx: 50.0, dy: 0.0 }),
        );
        h.press(&[InputKey::Interact]);
        assert!(h.update(&mut platform, 0).is_empty());
        assert_eq!(platform.base.rect.x, 200.0);
    }

    #[test]
    fn teleport_local_keeps_player_offset() {
        let mut h = Harness::new();
        let mut platform = Platform::new(
            rect(200.0, 500.0),
            PlatformKind::Teleport(TeleportState { dx: 0.0, dy: 200.0 }),
        );
        h.stand_on(&platform, 0);
        h.player.rect.x = 230.0;
        h.press(&[InputKey::Interact]);
        let effects = h.update(&mut platform, 0);

        // 700 wraps to 100
        assert_eq!(platform.base.rect.y, 100.0);
        assert_eq!((h.player.rect.x, h.player.rect.y), (230.0, 50.0));
        assert_eq!(platform.base.phase, Phase::CoolingDown);
        assert!(effects.iter().any(|e| matches!(
            e,
            PlatformEffect::Schedule {
                action: TimedAction::Rearm,
                delay: 30,
                ..
            }
        )));

        // Cooling down: a second trigger is ignored until the rearm timer.
        platform.base.is_activated = true;
        h.update(&mut platform, 0);
        assert_eq!(platform.base.rect.y, 100.0);
        h.timer(&mut platform, 0, TimedAction::Rearm);
        assert_eq!(platform.base.phase, Phase::Idle);
    }

    #[test]
    fn teleport_remote_leaves_player() {
        let mut h = Harness::new();
        let mut platform = Platform::new(
            rect(200.0, 300.0),
            PlatformKind::Teleport(TeleportState {
                dx: 0.0,
                dy: -100.0,
            }),
        );
        h.stand_on(&platform, 0);
        platform.base.is_activated = true;
        h.update(&mut platform, 0);
        assert_eq!(platform.base.rect.y, 200.0);
        assert_eq!(h.player.rect.y, 250.0);
    }

    #[test]
    fn falling_platform_lifecycle() {
        let mut h = Harness::new();
        let mut platform = Platform::new(
            rect(100.0, 500.0),
            PlatformKind::Falling(FallingState::new(false, false)),
        );
        h.stand_on(&platform, 0);
        h.press(&[InputKey::Interact]);
        let effects = h.update(&mut platform, 0);
        assert_eq!(platform.base.phase, Phase::Triggered);
        assert!(platform.is_solid());
        assert!(effects.iter().any(|e| matches!(
            e,
            PlatformEffect::Schedule {
                action: TimedAction::BeginFall,
                delay: 20,
                ..
            }
        )));

        h.timer(&mut platform, 0, TimedAction::BeginFall);
        assert!(!platform.is_solid());
        h.press(&[]);
        for _ in 0..200 {
            h.update(&mut platform, 0);
        }
        let PlatformKind::Falling(state) = &platform.kind else {
            unreachable!()
        };
        assert_eq!(state.stage, FallStage::Resting);
        assert!(platform.base.rect.y > 600.0);
    }

    #[test]
    fn trap_triggers_on_landing() {
        let mut h = Harness::new();
        let mut platform = Platform::new(
            rect(100.0, 400.0),
            PlatformKind::Falling(FallingState::new(true, false)),
        );
        h.update(&mut platform, 0);
        assert_eq!(platform.base.phase, Phase::Idle);
        h.stand_on(&platform, 0);
        h.update(&mut platform, 0);
        assert_eq!(platform.base.phase, Phase::Triggered);
    }

    #[test]
    fn wall_stops_falling_platform() {
        let mut h = Harness::new();
        h.walls.push(Wall {
            rect: Rect::new(0.0, 450.0, 800.0, 40.0),
        });
        let mut platform = Platform::new(
            rect(100.0, 400.0),
            PlatformKind::Falling(FallingState::new(false, true)),
        );
        for _ in 0..60 {
            h.update(&mut platform, 0);
        }
        assert!((platform.base.rect.bottom() - 450.0).abs() < 1e-3);
        let PlatformKind::Falling(state) = &platform.kind else {
            unreachable!()
        };
        assert_eq!(state.stage, FallStage::Resting);
    }

    #[test]
    fn activate_flags_target() {
        let mut h = Harness::new();
        let mut platform = Platform::new(
            rect(100.0, 400.0),
            PlatformKind::Activate(ActivateState { target: 4 }),
        );
        h.stand_on(&platform, 1);
        let effects = h.update(&mut platform, 1);
        assert_eq!(effects, vec![PlatformEffect::DetectByActivate { target: 4 }]);

        h.press(&[InputKey::Interact]);
        let effects = h.update(&mut platform, 1);
        assert!(effects.contains(&PlatformEffect::Activate { target: 4 }));
    }

    #[test]
    fn open_door_platform_requests_door() {
        let mut h = Harness::new();
        let mut platform = Platform::new(
            rect(100.0, 400.0),
            PlatformKind::OpenDoor(OpenDoorState { door: 2 }),
        );
        h.stand_on(&platform, 0);
        h.press(&[InputKey::Interact]);
        let effects = h.update(&mut platform, 0);
        assert!(effects.contains(&PlatformEffect::OpenDoor { door: 2 }));
    }

    #[test]
    fn countdown_local_run_aborts_when_player_leaves() {
        let mut h = Harness::new();
        let actions = vec![CountdownAction::parse("+x"), CountdownAction::parse("+x")];
        let mut platform = Platform::new(
            rect(100.0, 400.0),
            PlatformKind::CountdownLoop(CountdownState::new(actions, None)),
        );
        h.stand_on(&platform, 0);
        h.press(&[InputKey::Interact]);
        h.update(&mut platform, 0);
        assert_eq!(platform.base.phase, Phase::InMotion);

        let effects = h.timer(&mut platform, 0, TimedAction::CountdownStep);
        assert_eq!(platform.base.rect.x, 150.0);
        assert_eq!(h.player.rect.x, 150.0);
        assert_eq!(effects.len(), 1, "next step scheduled");

        h.player.standing_on = None;
        let epoch = platform.base.epoch;
        h.timer(&mut platform, 0, TimedAction::CountdownStep);
        assert_eq!(platform.base.rect.x, 150.0);
        assert_eq!(platform.base.phase, Phase::Idle);
        assert_eq!(platform.base.epoch, epoch + 1);
    }

    #[test]
    fn countdown_waits_longer_after_a_jump() {
        let mut h = Harness::new();
        let actions = vec![CountdownAction::parse("jump"), CountdownAction::parse("open")];
        let mut platform = Platform::new(
            rect(100.0, 400.0),
            PlatformKind::CountdownLoop(CountdownState::new(actions, Some(0))),
        );
        h.stand_on(&platform, 0);
        h.press(&[InputKey::Interact]);
        let started = h.update(&mut platform, 0);
        assert!(started.iter().any(|e| matches!(
            e,
            PlatformEffect::Schedule {
                action: TimedAction::CountdownStep,
                delay: 60,
                ..
            }
        )));

        let after_jump = h.timer(&mut platform, 0, TimedAction::CountdownStep);
        assert_eq!(h.player.vy, h.config.physics.jump_velocity);
        assert!(after_jump.iter().any(|e| matches!(
            e,
            PlatformEffect::Schedule {
                action: TimedAction::CountdownStep,
                delay: 120,
                ..
            }
        )));

        // Back on the platform by the time the next action is due.
        h.stand_on(&platform, 0);
        let opened = h.timer(&mut platform, 0, TimedAction::CountdownStep);
        assert_eq!(opened, vec![PlatformEffect::OpenDoor { door: 0 }]);
        assert_eq!(platform.base.phase, Phase::Idle);
    }

    #[test]
    fn platform_built_falling_is_in_motion() {
        let platform = Platform::new(
            rect(100.0, 400.0),
            PlatformKind::Falling(FallingState::new(false, true)),
        );
        assert_eq!(platform.base.phase, Phase::InMotion);
        assert!(!platform.is_solid());
    }

    #[test]
    fn countdown_remote_run_ignores_player() {
        let mut h = Harness::new();
        let actions = ["hide", "+y", "show", "jump"]
            .iter()
            .map(|t| CountdownAction::parse(t))
            .collect();
        let mut platform = Platform::new(
            rect(100.0, 400.0),
            PlatformKind::CountdownLoop(CountdownState::new(actions, None)),
        );
        platform.base.is_activated = true;
        h.update(&mut platform, 0);

        h.timer(&mut platform, 0, TimedAction::CountdownStep);
        assert!(!platform.base.visible);
        assert!(!platform.is_solid());
        h.timer(&mut platform, 0, TimedAction::CountdownStep);
        assert_eq!(platform.base.rect.y, 450.0);
        assert_eq!(h.player.rect.y, 0.0);
        h.timer(&mut platform, 0, TimedAction::CountdownStep);
        assert!(platform.base.visible);
        h.timer(&mut platform, 0, TimedAction::CountdownStep);
        assert_eq!(h.player.vy, 0.0, "remote jump does not launch the player");
        assert_eq!(platform.base.phase, Phase::Idle);
    }

    #[test]
    fn countdown_health_and_open_are_effects() {
        let mut h = Harness::new();
        let actions = vec![CountdownAction::Health(-1), CountdownAction::Open];
        let mut platform = Platform::new(
            rect(100.0, 400.0),
            PlatformKind::CountdownLoop(CountdownState::new(actions, Some(0))),
        );
        platform.base.is_activated = true;
        h.update(&mut platform, 0);
        let first = h.timer(&mut platform, 0, TimedAction::CountdownStep);
        assert!(first.contains(&PlatformEffect::LivesDelta(-1)));
        let second = h.timer(&mut platform, 0, TimedAction::CountdownStep);
        assert_eq!(second, vec![PlatformEffect::OpenDoor { door: 0 }]);
    }

    #[test]
    fn armed_tracks_standing_player() {
        let mut h = Harness::new();
        let mut platform = Platform::new(rect(100.0, 400.0), PlatformKind::Stable);
        h.stand_on(&platform, 0);
        h.update(&mut platform, 0);
        assert_eq!(platform.base.phase, Phase::Armed);
        h.player.standing_on = None;
        h.update(&mut platform, 0);
        assert_eq!(platform.base.phase, Phase::Idle);
    }

    #[test]
    fn help_text_prefers_message() {
        let mut platform = Platform::new(rect(0.0, 0.0), PlatformKind::Stable);
        assert!(platform.help_text().contains("Platform::stable"));
        platform.base.message = Some("Hold on tight".into());
        assert_eq!(platform.help_text(), "Hold on tight");
    }

    // ================================================================
    // Property-based tests (proptest)
    // ================================================================

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn direction() -> impl Strategy<Value = Direction> {
            prop_oneof![
                Just(Direction::Up),
                Just(Direction::Down),
                Just(Direction::Left),
                Just(Direction::Right),
            ]
        }

        proptest! {
            #[test]
            fn loop_move_always_returns_to_idle(
                dirs in proptest::collection::vec(direction(), 1..8),
                x in 0i32..400,
                y in 0i32..400,
            ) {
                let mut h = Harness::new();
                let start = (x as f32, y as f32);
                let waypoints = loop_waypoints(start, &dirs);
                let last = *waypoints.last().unwrap();
                let mut platform = Platform::new(
                    rect(start.0, start.1),
                    PlatformKind::LoopMove(LoopMoveState::new(waypoints)),
                );
                platform.base.is_activated = true;
                for _ in 0..(dirs.len() * 50 + 1) {
                    h.update(&mut platform, 0);
                }
                prop_assert_eq!(platform.base.phase, Phase::Idle);
                prop_assert_eq!((platform.base.rect.x, platform.base.rect.y), last);
                let PlatformKind::LoopMove(state) = &platform.kind else {
                    unreachable!()
                };
                prop_assert_eq!(state.sequence_index, 0);
            }

            #[test]
            fn teleport_stays_within_level_height(dy in -2000.0f32..2000.0, y in 0.0f32..580.0) {
                let mut h = Harness::new();
                let mut platform = Platform::new(
                    rect(0.0, y),
                    PlatformKind::Teleport(TeleportState { dx: 0.0, dy }),
                );
                platform.base.is_activated = true;
                h.update(&mut platform, 0);
                prop_assert!(platform.base.rect.bottom() > 0.0);
                prop_assert!(platform.base.rect.y < 600.0);
            }
        }
    }
}
