use skirmish_arena::AgentState;
use skirmish_archive::EpisodeRecord;
use skirmish_harness::{EpisodePresenter, EvalContext};

/// Text presenter for archived episodes: one overlay header per episode,
/// one line per tick.
#[derive(Debug, Default)]
pub(crate) struct ConsolePresenter {
    tick: u32,
}

impl EpisodePresenter for ConsolePresenter {
    fn draw(&mut self, raider: &AgentState, warden: &AgentState, ctx: &EvalContext) {
        println!(
            "g{} p{} t{:4} | raider ({:6.1},{:6.1}) {:5.1}deg hp {:3} {} | warden ({:6.1},{:6.1}) {:5.1}deg hp {:3} {}",
            ctx.generation,
            ctx.population,
            self.tick,
            raider.x,
            raider.y,
            raider.angle,
            raider.health,
            action_marker(raider),
            warden.x,
            warden.y,
            warden.angle,
            warden.health,
            action_marker(warden),
        );
        self.tick += 1;
    }
}

fn action_marker(state: &AgentState) -> String {
    match state.current_action {
        Some(id) => format!("[a{id}:{:2}]", state.action_ticks_left),
        None => "[idle ]".to_owned(),
    }
}

/// Plays one archived episode back through the console presenter, with the
/// generation's aggregate fitness as header context when available.
pub(crate) fn present_record(record: &EpisodeRecord, generation_stats: Option<(f32, f32)>) {
    let trainer = record.trainer;
    println!(
        "=== {} | generation {} population {} | winner: {:?} | {} fitness {:.1}",
        record.recorded_at.format("%Y-%m-%d %H:%M:%S"),
        record.generation,
        record.population,
        record.winner,
        trainer.label(),
        record.fitness_for(trainer),
    );
    if let Some((mean, best)) = generation_stats {
        println!("    generation mean {mean:.1}, generation best {best:.1}");
    }
    let breakdown = match trainer {
        skirmish_arena::Side::Raider => &record.raider_fitness_breakdown,
        skirmish_arena::Side::Warden => &record.warden_fitness_breakdown,
    };
    for (component, value) in breakdown {
        println!("    {component}: {value:.1}");
    }
    if !record.notes.is_empty() {
        println!("    notes: {}", record.notes);
    }

    let ctx = EvalContext {
        trainer,
        generation: record.generation,
        population: record.population,
    };
    let mut presenter = ConsolePresenter::default();
    for tick in &record.ticks {
        presenter.draw(&tick.raider.state, &tick.warden.state, &ctx);
    }
}
