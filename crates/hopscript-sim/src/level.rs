use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use hopscript_core::geometry::Rect;

use crate::config::SimConfig;
use crate::entities::{Coin, Door, Enemy};
use crate::hazards::{Spike, SpikeDirection, Wall};
use crate::physics::Player;
use crate::platform::{
    ActivateState, CountdownAction, CountdownState, Direction, FallingState, LoopMoveState,
    MoveState, OpenDoorState, Platform, PlatformKind, TeleportState, loop_waypoints,
};

// ============================================================================
// Descriptors (level JSON)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PointDescriptor {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RectDescriptor {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlatformDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub dx: f32,
    #[serde(default)]
    pub dy: f32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sequence: Vec<String>,
    #[serde(default)]
    pub trap: bool,
    #[serde(default)]
    pub falling: bool,
}

impl PlatformDescriptor {
    /// Bare descriptor of `kind` at the given rectangle.
    pub fn new(kind: &str, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            kind: kind.to_string(),
            x,
            y,
            width,
            height,
            id: None,
            target_id: None,
            color: None,
            message: None,
            dx: 0.0,
            dy: 0.0,
            directions: Vec::new(),
            sequence: Vec::new(),
            trap: false,
            falling: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnemyDescriptor {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default = "default_enemy_speed")]
    pub speed: f32,
}

fn default_enemy_speed() -> f32 {
    2.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoinDescriptor {
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_coin_radius")]
    pub radius: f32,
}

fn default_coin_radius() -> f32 {
    10.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpikeDescriptor {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    #[serde(default)]
    pub angle: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DoorDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub is_open: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LevelDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    pub player: PointDescriptor,
    #[serde(default)]
    pub platforms: Vec<PlatformDescriptor>,
    #[serde(default)]
    pub enemies: Vec<EnemyDescriptor>,
    #[serde(default)]
    pub coins: Vec<CoinDescriptor>,
    #[serde(default)]
    pub spikes: Vec<SpikeDescriptor>,
    #[serde(default)]
    pub doors: Vec<DoorDescriptor>,
    #[serde(default)]
    pub walls: Vec<RectDescriptor>,
}

// ============================================================================
// Errors
// ============================================================================

/// Position of a descriptor entry inside a level, e.g. `platforms[3]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryRef {
    pub collection: &'static str,
    pub index: usize,
}

impl EntryRef {
    fn new(collection: &'static str, index: usize) -> Self {
        Self { collection, index }
    }
}

impl fmt::Display for EntryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.collection, self.index)
    }
}

/// Content errors found while reading or building levels.
#[derive(Debug, Clone, PartialEq)]
pub enum LevelError {
    NoLevels,
    LevelOutOfRange {
        index: usize,
        count: usize,
    },
    UnknownPlatformType {
        level: usize,
        entry: EntryRef,
        kind: String,
    },
    MissingTarget {
        level: usize,
        entry: EntryRef,
        kind: String,
    },
    UnresolvedTarget {
        level: usize,
        entry: EntryRef,
        target: String,
    },
    DuplicateId {
        level: usize,
        entry: EntryRef,
        id: String,
    },
    InvalidDirection {
        level: usize,
        entry: EntryRef,
        token: String,
    },
    InvalidSpikeAngle {
        level: usize,
        entry: EntryRef,
        angle: f32,
    },
    EmptySequence {
        level: usize,
        entry: EntryRef,
    },
    InvalidDimensions {
        level: usize,
        entry: Option<EntryRef>,
    },
    Io {
        path: String,
        reason: String,
    },
    Parse {
        reason: String,
    },
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::NoLevels => write!(f, "no levels defined"),
            LevelError::LevelOutOfRange { index, count } => {
                write!(f, "level {index} out of range (have {count})")
            },
            LevelError::UnknownPlatformType { level, entry, kind } => {
                write!(f, "level {level} {entry}: unknown platform type '{kind}'")
            },
            LevelError::MissingTarget { level, entry, kind } => {
                write!(f, "level {level} {entry}: '{kind}' platform needs a targetId")
            },
            LevelError::UnresolvedTarget {
                level,
                entry,
                target,
            } => write!(f, "level {level} {entry}: no earlier entry with id '{target}'"),
            LevelError::DuplicateId { level, entry, id } => {
                write!(f, "level {level} {entry}: duplicate id '{id}'")
            },
            LevelError::InvalidDirection {
                level,
                entry,
                token,
            } => write!(f, "level {level} {entry}: invalid direction '{token}'"),
            LevelError::InvalidSpikeAngle {
                level,
                entry,
                angle,
            } => write!(f, "level {level} {entry}: spike angle {angle} is not a right angle"),
            LevelError::EmptySequence { level, entry } => {
                write!(f, "level {level} {entry}: sequence is empty")
            },
            LevelError::InvalidDimensions { level, entry } => match entry {
                Some(entry) => write!(f, "level {level} {entry}: size must be positive"),
                None => write!(f, "level {level}: size must be positive"),
            },
            LevelError::Io { path, reason } => write!(f, "cannot read {path}: {reason}"),
            LevelError::Parse { reason } => write!(f, "invalid level JSON: {reason}"),
        }
    }
}

impl std::error::Error for LevelError {}

// ============================================================================
// Live level
// ============================================================================

/// Every live entity of the current level. Indices in platform states refer
/// into these vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelWorld {
    pub width: f32,
    pub height: f32,
    pub player: Player,
    pub platforms: Vec<Platform>,
    pub doors: Vec<Door>,
    pub walls: Vec<Wall>,
    pub spikes: Vec<Spike>,
    pub enemies: Vec<Enemy>,
    pub coins: Vec<Coin>,
}

impl LevelWorld {
    pub fn empty(width: f32, height: f32, player: Player) -> Self {
        Self {
            width,
            height,
            player,
            platforms: Vec::new(),
            doors: Vec::new(),
            walls: Vec::new(),
            spikes: Vec::new(),
            enemies: Vec::new(),
            coins: Vec::new(),
        }
    }
}

/// Parse a JSON array of level descriptors.
pub fn parse_levels(json: &str) -> Result<Vec<LevelDescriptor>, LevelError> {
    let levels: Vec<LevelDescriptor> = serde_json::from_str(json).map_err(|e| LevelError::Parse {
        reason: e.to_string(),
    })?;
    if levels.is_empty() {
        return Err(LevelError::NoLevels);
    }
    Ok(levels)
}

pub fn load_levels_from_file(path: impl AsRef<Path>) -> Result<Vec<LevelDescriptor>, LevelError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| LevelError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_levels(&content)
}

/// Build the live entities for level `level` from its descriptor. Nothing is
/// shared with any existing level, so a failure leaves the caller untouched.
pub fn build_level(
    level: usize,
    desc: &LevelDescriptor,
    config: &SimConfig,
) -> Result<LevelWorld, LevelError> {
    let width = desc.width.unwrap_or(config.world.width);
    let height = desc.height.unwrap_or(config.world.height);
    if !(width > 0.0 && height > 0.0) {
        return Err(LevelError::InvalidDimensions { level, entry: None });
    }

    let player = Player::new(desc.player.x, desc.player.y, &config.physics);
    let mut world = LevelWorld::empty(width, height, player);

    // Doors and walls reference nothing, so they come first.
    let mut door_ids: HashMap<String, usize> = HashMap::new();
    for (i, d) in desc.doors.iter().enumerate() {
        let entry = EntryRef::new("doors", i);
        let rect = sized_rect(level, entry, d.x, d.y, d.width, d.height)?;
        if let Some(id) = &d.id {
            register_id(&mut door_ids, id, i, level, entry)?;
        }
        world.doors.push(Door {
            id: d.id.clone(),
            rect,
            is_open: d.is_open,
        });
    }
    for (i, w) in desc.walls.iter().enumerate() {
        let rect = sized_rect(level, EntryRef::new("walls", i), w.x, w.y, w.width, w.height)?;
        world.walls.push(Wall { rect });
    }

    // Platform ids resolve in descriptor order: only earlier platforms are
    // visible to a targetId.
    let mut platform_ids: HashMap<String, usize> = HashMap::new();
    for (i, pd) in desc.platforms.iter().enumerate() {
        let entry = EntryRef::new("platforms", i);
        let rect = sized_rect(level, entry, pd.x, pd.y, pd.width, pd.height)?;
        let kind = build_kind(level, entry, pd, &platform_ids, &door_ids)?;
        if let Some(id) = &pd.id {
            register_id(&mut platform_ids, id, i, level, entry)?;
        }
        let mut platform = Platform::new(rect, kind);
        platform.base.id = pd.id.clone();
        platform.base.message = pd.message.clone();
        if let Some(color) = &pd.color {
            platform.base.color = color.clone();
        }
        world.platforms.push(platform);
    }

    for (i, e) in desc.enemies.iter().enumerate() {
        let rect = sized_rect(level, EntryRef::new("enemies", i), e.x, e.y, e.width, e.height)?;
        world.enemies.push(Enemy::new(rect, e.speed));
    }
    for c in &desc.coins {
        world.coins.push(Coin {
            x: c.x,
            y: c.y,
            radius: c.radius,
        });
    }
    for (i, s) in desc.spikes.iter().enumerate() {
        let entry = EntryRef::new("spikes", i);
        if !(s.width > 0.0) {
            return Err(LevelError::InvalidDimensions {
                level,
                entry: Some(entry),
            });
        }
        let direction =
            SpikeDirection::from_angle(s.angle).ok_or(LevelError::InvalidSpikeAngle {
                level,
                entry,
                angle: s.angle,
            })?;
        world.spikes.push(Spike::new(s.x, s.y, s.width, direction));
    }

    Ok(world)
}

fn sized_rect(
    level: usize,
    entry: EntryRef,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
) -> Result<Rect, LevelError> {
    if width > 0.0 && height > 0.0 {
        Ok(Rect::new(x, y, width, height))
    } else {
        Err(LevelError::InvalidDimensions {
            level,
            entry: Some(entry),
        })
    }
}

fn register_id(
    ids: &mut HashMap<String, usize>,
    id: &str,
    index: usize,
    level: usize,
    entry: EntryRef,
) -> Result<(), LevelError> {
    if ids.contains_key(id) {
        return Err(LevelError::DuplicateId {
            level,
            entry,
            id: id.to_string(),
        });
    }
    ids.insert(id.to_string(), index);
    Ok(())
}

fn build_kind(
    level: usize,
    entry: EntryRef,
    pd: &PlatformDescriptor,
    platform_ids: &HashMap<String, usize>,
    door_ids: &HashMap<String, usize>,
) -> Result<PlatformKind, LevelError> {
    let resolve = |ids: &HashMap<String, usize>| -> Result<usize, LevelError> {
        let target = pd.target_id.as_ref().ok_or_else(|| LevelError::MissingTarget {
            level,
            entry,
            kind: pd.kind.clone(),
        })?;
        ids.get(target)
            .copied()
            .ok_or_else(|| LevelError::UnresolvedTarget {
                level,
                entry,
                target: target.clone(),
            })
    };

    let kind = match pd.kind.as_str() {
        "stable" => PlatformKind::Stable,
        "falling" => PlatformKind::Falling(FallingState::new(pd.trap, pd.falling)),
        "move" => PlatformKind::Move(MoveState {
            dx: pd.dx,
            dy: pd.dy,
        }),
        "loopMove" => {
            if pd.directions.is_empty() {
                return Err(LevelError::EmptySequence { level, entry });
            }
            let directions = pd
                .directions
                .iter()
                .map(|token| {
                    Direction::parse(token).ok_or_else(|| LevelError::InvalidDirection {
                        level,
                        entry,
                        token: token.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            PlatformKind::LoopMove(LoopMoveState::new(loop_waypoints(
                (pd.x, pd.y),
                &directions,
            )))
        },
        "teleport" => PlatformKind::Teleport(TeleportState {
            dx: pd.dx,
            dy: pd.dy,
        }),
        "countdownLoop" => {
            if pd.sequence.is_empty() {
                return Err(LevelError::EmptySequence { level, entry });
            }
            let actions: Vec<CountdownAction> =
                pd.sequence.iter().map(|t| CountdownAction::parse(t)).collect();
            let door = match pd.target_id {
                Some(_) => Some(resolve(door_ids)?),
                None if actions.contains(&CountdownAction::Open) => {
                    return Err(LevelError::MissingTarget {
                        level,
                        entry,
                        kind: pd.kind.clone(),
                    });
                },
                None => None,
            };
            PlatformKind::CountdownLoop(CountdownState::new(actions, door))
        },
        "activate" => PlatformKind::Activate(ActivateState {
            target: resolve(platform_ids)?,
        }),
        "openDoor" => PlatformKind::OpenDoor(OpenDoorState {
            door: resolve(door_ids)?,
        }),
        other => {
            return Err(LevelError::UnknownPlatformType {
                level,
                entry,
                kind: other.to_string(),
            });
        },
    };
    Ok(kind)
}
