pub mod geometry;
pub mod input;
pub mod sim_trait;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::input::{InputFrame, InputKey};
    use crate::sim_trait::{SimEvent, Simulation};

    /// Build an input frame holding `keys`.
    pub fn frame(keys: &[InputKey]) -> InputFrame {
        InputFrame::from_keys(keys)
    }

    /// Run `n` steps with the same held keys, returning all accumulated events.
    pub fn run_steps(sim: &mut dyn Simulation, n: usize, input: InputFrame) -> Vec<SimEvent> {
        let mut all_events = Vec::new();
        for _ in 0..n {
            all_events.extend(sim.update(input));
        }
        all_events
    }

    /// Press `key` for one step then release it for one step, so the next
    /// press registers as a fresh edge.
    pub fn tap(sim: &mut dyn Simulation, key: InputKey) -> Vec<SimEvent> {
        let mut events = sim.update(frame(&[key]));
        events.extend(sim.update(InputFrame::empty()));
        events
    }

    /// Assert that the simulation's serialized state differs from `before`.
    pub fn assert_state_changed(sim: &dyn Simulation, before: &[u8]) {
        let after = sim.serialize_state();
        assert_ne!(
            before,
            &after[..],
            "Simulation state should have changed after operation"
        );
    }

    // ================================================================
    // Simulation Trait Contract Tests
    // ================================================================
    // Generic checks every Simulation implementation must pass. Simulation
    // crates call them from their own #[cfg(test)] modules.

    /// serialize_state -> apply_state must be stable after one roundtrip.
    pub fn contract_state_roundtrip_preserves(sim: &mut dyn Simulation) {
        let state_a = sim.serialize_state();
        sim.apply_state(&state_a);
        let state_b = sim.serialize_state();
        sim.apply_state(&state_b);
        let state_c = sim.serialize_state();
        assert_eq!(
            state_b, state_c,
            "State must be stable after serialize->apply->serialize roundtrip"
        );
    }

    /// pause() must freeze state, resume() must unfreeze it.
    pub fn contract_pause_stops_updates(sim: &mut dyn Simulation) {
        sim.pause();
        let before = sim.serialize_state();
        sim.update(InputFrame::empty());
        let during_pause = sim.serialize_state();
        assert_eq!(before, during_pause, "State must not change while paused");

        sim.resume();
        sim.update(InputFrame::empty());
        let after_resume = sim.serialize_state();
        assert_ne!(during_pause, after_resume, "State must change after resume");
    }

    /// Garbage passed to apply_state must leave the state untouched.
    pub fn contract_malformed_state_ignored(sim: &mut dyn Simulation) {
        let before = sim.serialize_state();
        sim.apply_state(&[0xc1, 0xff, 0x00]);
        assert_eq!(before, sim.serialize_state());
    }
}
