use serde::{Deserialize, Serialize};

use crate::input::InputFrame;

/// Core trait implemented by a step-driven simulation.
///
/// The host samples input, calls `update` once per rendered frame, and reads
/// back a snapshot for drawing. The simulation owns all game rules.
pub trait Simulation: Send {
    /// Descriptive metadata for the host.
    fn metadata(&self) -> SimMetadata;

    /// Advance exactly one step. Returns the events raised during the step.
    fn update(&mut self, input: InputFrame) -> Vec<SimEvent>;

    /// Serialize the full simulation state (MessagePack) for the presentation layer.
    fn serialize_state(&self) -> Vec<u8>;

    /// Restore state previously produced by `serialize_state`.
    fn apply_state(&mut self, state: &[u8]);

    /// Steps per second the simulation was tuned for.
    fn tick_rate(&self) -> f32 {
        60.0
    }

    fn pause(&mut self);

    fn resume(&mut self);

    /// Whether the run has reached its terminal state.
    fn is_complete(&self) -> bool;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimMetadata {
    pub name: String,
    pub description: String,
    pub level_count: usize,
}

/// Events raised during a step, for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    CoinCollected { total: u32 },
    LifeLost { lives: i32 },
    EnemyStomped,
    PlatformTriggered { index: usize, remote: bool },
    DoorOpened { index: usize },
    LevelLoaded { level: usize },
    LevelReset { level: usize },
    RunCompleted,
}

/// Generates the `Simulation` methods shared by every implementation:
/// `serialize_state`, `apply_state`, `pause`, `resume`, `is_complete`.
///
/// Requires the implementing struct to have a `state: $StateType` field, and
/// `$StateType` to have `run.paused` and `run.completed` boolean fields.
#[macro_export]
macro_rules! simulation_boilerplate {
    (state_type: $StateType:ty) => {
        fn serialize_state(&self) -> Vec<u8> {
            rmp_serde::to_vec(&self.state).expect("simulation state serialization must succeed")
        }

        fn apply_state(&mut self, state: &[u8]) {
            match rmp_serde::from_slice::<$StateType>(state) {
                Ok(s) => self.state = s,
                Err(e) => tracing::debug!(error = %e, "Dropped malformed state snapshot"),
            }
        }

        fn pause(&mut self) {
            self.state.run.paused = true;
        }

        fn resume(&mut self) {
            // A completed run stays halted.
            self.state.run.paused = self.state.run.completed;
        }

        fn is_complete(&self) -> bool {
            self.state.run.completed
        }
    };
}
