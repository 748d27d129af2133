use crate::level::{LevelDescriptor, parse_levels};

/// Demo levels shipped with the engine, used when no level file is given.
const DEFAULT_LEVELS: &str = r#"[
  {
    "name": "First steps",
    "player": { "x": 40, "y": 440 },
    "platforms": [
      { "type": "stable", "x": 0, "y": 500, "width": 200, "height": 20,
        "message": "Walk with Left/Right, jump with Jump.\nHold Activate near a platform to read its code." },
      { "type": "move", "id": "lift", "x": 240, "y": 460, "width": 100, "height": 20, "dy": -50, "color": "green" },
      { "type": "falling", "x": 390, "y": 420, "width": 100, "height": 20, "trap": true, "color": "red" },
      { "type": "activate", "x": 60, "y": 350, "width": 100, "height": 20, "targetId": "lift", "color": "yellow" },
      { "type": "openDoor", "x": 540, "y": 380, "width": 100, "height": 20, "targetId": "exit", "color": "purple" },
      { "type": "loopMove", "x": 600, "y": 260, "width": 100, "height": 20,
        "directions": ["left", "left", "up", "right", "right", "down"], "color": "blue" }
    ],
    "coins": [
      { "x": 100, "y": 470 },
      { "x": 290, "y": 420 },
      { "x": 440, "y": 390 },
      { "x": 650, "y": 230, "radius": 12 }
    ],
    "spikes": [
      { "x": 210, "y": 580, "width": 40, "angle": 0 },
      { "x": 250, "y": 580, "width": 40, "angle": 0 }
    ],
    "enemies": [
      { "x": 480, "y": 550, "width": 40, "height": 50, "speed": 1 }
    ],
    "doors": [
      { "id": "exit", "x": 740, "y": 480, "width": 50, "height": 120, "isOpen": false }
    ],
    "walls": [
      { "x": 340, "y": 540, "width": 40, "height": 60 }
    ]
  },
  {
    "name": "Countdown",
    "player": { "x": 30, "y": 490 },
    "platforms": [
      { "type": "stable", "x": 0, "y": 550, "width": 150, "height": 20 },
      { "type": "countdownLoop", "x": 150, "y": 500, "width": 100, "height": 20,
        "sequence": ["+x", "+x", "-y", "jump", "open"], "targetId": "gate", "color": "orange" },
      { "type": "teleport", "id": "warp", "x": 420, "y": 450, "width": 100, "height": 20, "dy": -250, "color": "cyan" },
      { "type": "activate", "x": 20, "y": 420, "width": 80, "height": 20, "targetId": "warp", "color": "yellow" },
      { "type": "falling", "x": 560, "y": 200, "width": 100, "height": 20 },
      { "type": "stable", "x": 650, "y": 200, "width": 150, "height": 20,
        "message": "The gate opens when the countdown finishes." }
    ],
    "coins": [
      { "x": 300, "y": 420 },
      { "x": 470, "y": 170 },
      { "x": 700, "y": 170 }
    ],
    "spikes": [
      { "x": 500, "y": 580, "width": 40, "angle": 0 },
      { "x": 780, "y": 300, "width": 40, "angle": 270 }
    ],
    "doors": [
      { "id": "gate", "x": 740, "y": 100, "width": 50, "height": 100, "isOpen": false }
    ],
    "walls": [
      { "x": 330, "y": 300, "width": 20, "height": 300 }
    ]
  }
]"#;

pub fn default_levels() -> Vec<LevelDescriptor> {
    match parse_levels(DEFAULT_LEVELS) {
        Ok(levels) => levels,
        Err(e) => {
            tracing::error!(error = %e, "Built-in levels are invalid");
            Vec::new()
        },
    }
}
