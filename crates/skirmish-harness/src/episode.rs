use skirmish_arena::{
    Arena, GAME_VERSION, RaiderAction, TickOutcome, WardenAction, arbitrate,
    candidates_from_activations, encode_observation,
};
use skirmish_archive::{ArchiveError, EpisodeRecord, EpisodeStore, SideTick, TickRecord, Winner};
use skirmish_evolve::Policy;

use crate::{
    context::EvalContext,
    fitness::{FITNESS_VERSION, FitnessEvaluator},
    render::EpisodePresenter,
};

/// Tick budget per episode; reaching it forces a stalemate. This is the
/// only liveness bound the system has, so it must stay finite.
pub const MAX_TICKS_PER_EPISODE: u32 = 600;

/// Per-match configuration.
#[derive(Debug, Clone)]
pub struct MatchSettings {
    pub max_ticks: u32,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            max_ticks: MAX_TICKS_PER_EPISODE,
        }
    }
}

/// Runs one match between two policies to a terminal outcome.
///
/// Per tick, in fixed order: observe both sides (each sees itself first),
/// activate both policies, threshold and arbitrate the outputs, apply the
/// Raider's actions before the Warden's, advance the simulation, present,
/// and append a tick record. The loop ends at the tick budget (stalemate)
/// or when [`Arena::advance`] reports a defeat.
///
/// On a defeat, the loser's snapshot in the final tick record is recaptured
/// so the archive reflects the true terminal state rather than the
/// pre-death capture. On every completion path the fitness evaluator runs
/// exactly once per side and the finished record is written to the store
/// when one is supplied.
pub fn run_episode(
    raider_policy: &dyn Policy,
    warden_policy: &dyn Policy,
    ctx: EvalContext,
    settings: &MatchSettings,
    fitness: &dyn FitnessEvaluator,
    presenter: &mut dyn EpisodePresenter,
    store: Option<&EpisodeStore>,
) -> Result<EpisodeRecord, ArchiveError> {
    let mut arena = Arena::new();
    let mut record = EpisodeRecord::begin(
        ctx.trainer,
        ctx.generation,
        ctx.population,
        GAME_VERSION,
        FITNESS_VERSION,
    );

    let mut outcome = TickOutcome::Continue;
    for tick in 0..settings.max_ticks {
        let raider_snapshot = arena.raider().clone();
        let warden_snapshot = arena.warden().clone();

        let raider_view = encode_observation(arena.raider(), arena.warden());
        let warden_view = encode_observation(arena.warden(), arena.raider());

        let raider_actions = arbitrate(&candidates_from_activations(
            &raider_policy.activate(&raider_view),
            &RaiderAction::OUTPUT_ORDER,
        ));
        let warden_actions = arbitrate(&candidates_from_activations(
            &warden_policy.activate(&warden_view),
            &WardenAction::OUTPUT_ORDER,
        ));

        // Side A acts first; the ordering is a determinism contract.
        arena.apply_raider_actions(&raider_actions);
        arena.apply_warden_actions(&warden_actions);
        outcome = arena.advance();

        presenter.draw(arena.raider(), arena.warden(), &ctx);

        record.ticks.push(TickRecord {
            tick,
            raider: SideTick {
                state: raider_snapshot,
                actions: raider_actions.to_vec(),
            },
            warden: SideTick {
                state: warden_snapshot,
                actions: warden_actions.to_vec(),
            },
        });

        if !outcome.is_continue() {
            break;
        }
    }

    match outcome {
        TickOutcome::Continue => {
            record.winner = Winner::Draw;
            record.notes = "stalemate".to_owned();
        }
        TickOutcome::RaiderDown => {
            record.winner = Winner::Warden;
            record.notes = format!("raider down on tick {}", record.ticks.len());
            if let Some(last) = record.ticks.last_mut() {
                last.raider.state = arena.raider().clone();
            }
        }
        TickOutcome::WardenDown => {
            record.winner = Winner::Raider;
            record.notes = format!("warden down on tick {}", record.ticks.len());
            if let Some(last) = record.ticks.last_mut() {
                last.warden.state = arena.warden().clone();
            }
        }
    }

    let raider_report = fitness.evaluate(&record, skirmish_arena::Side::Raider);
    record.set_fitness(skirmish_arena::Side::Raider, raider_report);
    let warden_report = fitness.evaluate(&record, skirmish_arena::Side::Warden);
    record.set_fitness(skirmish_arena::Side::Warden, warden_report);

    if let Some(store) = store {
        store.write(&record)?;
    }

    Ok(record)
}
