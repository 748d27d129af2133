use serde::{Deserialize, Serialize};

use hopscript_core::geometry::{Push, Rect, Triangle};

use crate::config::PhysicsConfig;

/// Anything a [`Wall`] can push out: the player or a platform.
pub trait Body {
    fn rect(&self) -> &Rect;

    fn rect_mut(&mut self) -> &mut Rect;

    /// Hook run after the body has been moved by `push`.
    fn on_pushed(&mut self, _push: Push) {}
}

/// Fully solid rectangle, resolved on all four sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub rect: Rect,
}

impl Wall {
    /// Push `body` out along the axis of least overlap.
    pub fn resolve<B: Body + ?Sized>(&self, body: &mut B) -> Option<Push> {
        let push = body.rect().push_out_of(&self.rect)?;
        body.rect_mut().translate(push.dx, push.dy);
        body.on_pushed(push);
        Some(push)
    }
}

/// Direction a spike points toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpikeDirection {
    Up,
    Right,
    Down,
    Left,
}

impl SpikeDirection {
    /// Map a rotation in degrees (0 = up, clockwise) to a direction. Only
    /// right angles are accepted.
    pub fn from_angle(angle: f32) -> Option<Self> {
        if !angle.is_finite() {
            return None;
        }
        let normalized = angle.rem_euclid(360.0);
        let quarter = (normalized / 90.0).round();
        if (normalized - quarter * 90.0).abs() > 0.01 {
            return None;
        }
        match quarter as u32 % 4 {
            0 => Some(Self::Up),
            1 => Some(Self::Right),
            2 => Some(Self::Down),
            _ => Some(Self::Left),
        }
    }
}

/// Velocity change applied to the player by a spike hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Knockback {
    pub vx: Option<f32>,
    pub vy: f32,
}

/// Triangular hazard. `(x, y)` is the top-left of its bounding box and
/// `width` is the length of its base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spike {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub direction: SpikeDirection,
    /// First step at which the spike may deal damage again.
    pub ready_at: u64,
}

impl Spike {
    pub fn new(x: f32, y: f32, width: f32, direction: SpikeDirection) -> Self {
        Self {
            x,
            y,
            width,
            direction,
            ready_at: 0,
        }
    }

    pub fn height(&self) -> f32 {
        self.width / 2.0
    }

    pub fn triangle(&self) -> Triangle {
        let (x, y, w, h) = (self.x, self.y, self.width, self.height());
        match self.direction {
            SpikeDirection::Up => Triangle::new((x, y + h), (x + w, y + h), (x + w / 2.0, y)),
            SpikeDirection::Down => Triangle::new((x, y), (x + w, y), (x + w / 2.0, y + h)),
            SpikeDirection::Right => Triangle::new((x, y), (x, y + w), (x + h, y + w / 2.0)),
            SpikeDirection::Left => Triangle::new((x + h, y), (x + h, y + w), (x, y + w / 2.0)),
        }
    }

    pub fn knockback(&self, physics: &PhysicsConfig) -> Knockback {
        let lift = physics.jump_velocity / 2.0;
        match self.direction {
            SpikeDirection::Up => Knockback { vx: None, vy: lift },
            SpikeDirection::Down => Knockback {
                vx: None,
                vy: -lift,
            },
            SpikeDirection::Right => Knockback {
                vx: Some(physics.spike_knockback),
                vy: lift,
            },
            SpikeDirection::Left => Knockback {
                vx: Some(-physics.spike_knockback),
                vy: lift,
            },
        }
    }

    /// Register a hit if `target` overlaps the spike and the cooldown has
    /// elapsed. Returns whether damage should be dealt.
    pub fn try_hit(&mut self, target: &Rect, step: u64, cooldown_steps: u64) -> bool {
        if step < self.ready_at || !self.triangle().overlaps_rect(target) {
            return false;
        }
        self.ready_at = step + cooldown_steps;
        true
    }
}
