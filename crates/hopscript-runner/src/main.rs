use tracing_subscriber::EnvFilter;

use hopscript_core::input::{InputFrame, InputKey};
use hopscript_core::sim_trait::{SimEvent, Simulation};
use hopscript_sim::Hopscript;
use hopscript_sim::config::SimConfig;
use hopscript_sim::level::{LevelDescriptor, load_levels_from_file};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let steps = std::env::args()
        .nth(1)
        .and_then(|a| a.strip_prefix("--steps=").map(String::from))
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(3600);

    let config = SimConfig::load();
    let mut sim = match Hopscript::new(levels(), config) {
        Ok(sim) => sim,
        Err(e) => {
            tracing::error!("Cannot start run: {e}");
            std::process::exit(1);
        },
    };

    let meta = sim.metadata();
    tracing::info!(
        "{} ({} levels, {} steps at {} Hz)",
        meta.name,
        meta.level_count,
        steps,
        sim.tick_rate()
    );

    for step in 0..steps {
        for event in sim.update(scripted_input(step)) {
            log_event(step, &event);
        }
        if sim.help_visible()
            && let Some(help) = sim.nearest_help()
        {
            tracing::debug!(step, "Help:\n{help}");
        }
        if sim.is_complete() {
            break;
        }
    }

    let run = &sim.state().run;
    tracing::info!(
        level = run.current_level,
        lives = run.lives,
        coins = run.collected_coins,
        completed = run.completed,
        "Run finished"
    );
}

/// Levels from `HOPSCRIPT_LEVELS`, or the built-in set.
fn levels() -> Vec<LevelDescriptor> {
    let Ok(path) = std::env::var("HOPSCRIPT_LEVELS") else {
        return hopscript_sim::builtin::default_levels();
    };
    match load_levels_from_file(&path) {
        Ok(levels) => levels,
        Err(e) => {
            tracing::warn!("Failed to load {path}: {e}, using built-in levels");
            hopscript_sim::builtin::default_levels()
        },
    }
}

/// Walk right, hopping and poking at platforms on a fixed rhythm.
fn scripted_input(step: u64) -> InputFrame {
    let mut input = InputFrame::from_keys(&[InputKey::Right]);
    input.set(InputKey::Jump, step % 45 == 0);
    input.set(InputKey::Interact, step % 90 == 30);
    input.set(InputKey::Activate, step % 300 < 10);
    input
}

fn log_event(step: u64, event: &SimEvent) {
    match event {
        SimEvent::LevelLoaded { .. } | SimEvent::LevelReset { .. } | SimEvent::RunCompleted => {
            tracing::info!(step, ?event, "Run event");
        },
        _ => tracing::debug!(step, ?event, "Event"),
    }
}
