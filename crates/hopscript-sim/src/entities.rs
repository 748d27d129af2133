use serde::{Deserialize, Serialize};

use hopscript_core::geometry::Rect;

/// Level exit. Once open, overlapping it advances to the next level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Door {
    pub id: Option<String>,
    pub rect: Rect,
    pub is_open: bool,
}

impl Door {
    pub fn open(&mut self) {
        if !self.is_open {
            tracing::debug!(id = ?self.id, "Door opened");
        }
        self.is_open = true;
    }

    /// An open door the player overlaps.
    pub fn admits(&self, player: &Rect) -> bool {
        self.is_open && self.rect.overlaps(player)
    }
}

/// Collectible coin. `(x, y)` is the center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl Coin {
    pub fn touches(&self, rect: &Rect) -> bool {
        rect.overlaps_circle(self.x, self.y, self.radius)
    }
}

/// Patrolling enemy: walks horizontally and turns around at the level edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub rect: Rect,
    pub speed: f32,
    /// +1 moving right, -1 moving left.
    pub direction: f32,
}

impl Enemy {
    pub fn new(rect: Rect, speed: f32) -> Self {
        Self {
            rect,
            speed,
            direction: 1.0,
        }
    }

    pub fn patrol(&mut self, level_width: f32) {
        self.rect.x += self.speed * self.direction;
        if self.rect.x <= 0.0 || self.rect.right() >= level_width {
            self.direction = -self.direction;
        }
    }
}
