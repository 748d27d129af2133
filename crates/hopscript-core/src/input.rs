use serde::{Deserialize, Serialize};

/// Logical inputs consumed by the simulation. Physical key mapping is the
/// presentation layer's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputKey {
    Left,
    Right,
    /// Edge-triggered: jumps once per press.
    Jump,
    /// Edge-triggered: triggers the platform the player stands on.
    Interact,
    /// Level-triggered: shows the help text of the nearest interactable.
    Activate,
}

impl InputKey {
    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Keys held during one step, as sampled by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFrame {
    held: u8,
}

impl InputFrame {
    pub const fn empty() -> Self {
        Self { held: 0 }
    }

    pub fn from_keys(keys: &[InputKey]) -> Self {
        keys.iter().fold(Self::empty(), |frame, &key| frame.with(key))
    }

    pub const fn with(mut self, key: InputKey) -> Self {
        self.held |= key.bit();
        self
    }

    pub fn set(&mut self, key: InputKey, pressed: bool) {
        if pressed {
            self.held |= key.bit();
        } else {
            self.held &= !key.bit();
        }
    }

    pub const fn is_held(&self, key: InputKey) -> bool {
        self.held & key.bit() != 0
    }
}

/// Input state with rising-edge detection, refreshed once per step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    current: InputFrame,
    previous: InputFrame,
}

impl InputState {
    /// Shift the current frame into history and take `frame` as current.
    pub fn refresh(&mut self, frame: InputFrame) {
        self.previous = self.current;
        self.current = frame;
    }

    pub fn held(&self, key: InputKey) -> bool {
        self.current.is_held(key)
    }

    /// Held this step but not the previous one.
    pub fn just_pressed(&self, key: InputKey) -> bool {
        self.current.is_held(key) && !self.previous.is_held(key)
    }

    /// Horizontal intent: -1 for Left, +1 for Right, 0 otherwise.
    /// Left wins when both are held.
    pub fn horizontal(&self) -> f32 {
        if self.held(InputKey::Left) {
            -1.0
        } else if self.held(InputKey::Right) {
            1.0
        } else {
            0.0
        }
    }
}
