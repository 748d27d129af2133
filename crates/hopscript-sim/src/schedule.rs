use serde::{Deserialize, Serialize};

/// Deferred platform transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimedAction {
    /// Falling platform leaves its trigger delay and starts to drop.
    BeginFall,
    /// Teleport platform leaves cooldown.
    Rearm,
    /// CountdownLoop executes its next action.
    CountdownStep,
}

/// A transition due at `fire_at`, owned by the platform at index `owner`.
///
/// `generation` is the level generation at scheduling time and `epoch` the
/// owner's epoch; the event is stale if either has moved on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub fire_at: u64,
    pub owner: usize,
    pub generation: u64,
    pub epoch: u64,
    pub action: TimedAction,
}

/// Step clock plus the queue of deferred transitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scheduler {
    step: u64,
    queue: Vec<ScheduledEvent>,
}

impl Scheduler {
    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn advance(&mut self) {
        self.step += 1;
    }

    /// Queue `action` to fire `delay_steps` from now (at least one step).
    pub fn schedule(
        &mut self,
        delay_steps: u64,
        owner: usize,
        generation: u64,
        epoch: u64,
        action: TimedAction,
    ) {
        self.queue.push(ScheduledEvent {
            fire_at: self.step + delay_steps.max(1),
            owner,
            generation,
            epoch,
            action,
        });
    }

    /// Remove and return every event due at the current step, earliest first.
    /// Events due at the same step keep their scheduling order.
    pub fn drain_due(&mut self) -> Vec<ScheduledEvent> {
        let now = self.step;
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.queue.drain(..).partition(|e| e.fire_at <= now);
        self.queue = pending;
        due.sort_by_key(|e| e.fire_at);
        due
    }

    pub fn cancel_all(&mut self) {
        self.queue.clear();
    }

    pub fn pending(&self) -> &[ScheduledEvent] {
        &self.queue
    }
}
