use std::collections::HashMap;

use ghost_trail_core::{Action, Event, InputSnapshot, InputState, ProgressStore};
use ghost_trail_system_turns::{Game, Phase};
use thiserror::Error;

use crate::config::IDLE_KEY;

/// Upper bound on frames spent waiting for the board to come to rest.
const SETTLE_LIMIT: usize = 10_000;

/// Errors raised while replaying a key script.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ScriptError {
    /// The character is not bound to any action.
    #[error("key {key:?} at offset {offset} is not bound to an action")]
    UnboundKey {
        /// Offending character.
        key: char,
        /// Character offset within the script.
        offset: usize,
    },
}

/// Summary of a replayed script.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ScriptOutcome {
    /// Frames simulated, including settling frames.
    pub(crate) frames: usize,
    /// Turns that settled, automatic ones included.
    pub(crate) turns: usize,
    /// Whether the stage was cleared.
    pub(crate) cleared: bool,
}

/// Replays `script` one key per command, letting the board settle after each.
///
/// Whitespace is skipped and [`IDLE_KEY`] passes a single frame. Progress
/// changes are forwarded to `store` as they happen.
pub(crate) fn run_script(
    game: &mut Game,
    script: &str,
    bindings: &HashMap<char, Action>,
    store: &mut impl ProgressStore,
    events: &mut Vec<Event>,
) -> Result<ScriptOutcome, ScriptError> {
    let commands = script
        .chars()
        .enumerate()
        .filter(|(_, key)| !key.is_whitespace())
        .map(|(offset, key)| {
            if key == IDLE_KEY {
                return Ok(None);
            }
            bindings
                .get(&key)
                .copied()
                .map(Some)
                .ok_or(ScriptError::UnboundKey { key, offset })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut outcome = ScriptOutcome::default();
    let mut runner = Runner {
        game,
        store,
        events,
        outcome: &mut outcome,
    };

    runner.settle();
    for command in commands {
        let input = match command {
            Some(action) => InputSnapshot::new().with(action, InputState::Pressed),
            None => InputSnapshot::new(),
        };
        runner.frame(&input);
        runner.settle();
    }
    let cleared = runner.game.leave();
    outcome.cleared = cleared;
    Ok(outcome)
}

struct Runner<'a, S> {
    game: &'a mut Game,
    store: &'a mut S,
    events: &'a mut Vec<Event>,
    outcome: &'a mut ScriptOutcome,
}

impl<S: ProgressStore> Runner<'_, S> {
    fn frame(&mut self, input: &InputSnapshot) {
        let first_new = self.events.len();
        self.game.update(input, self.events);
        self.outcome.frames += 1;

        for event in &self.events[first_new..] {
            match event {
                Event::ProgressChanged { completed } => self.store.store(completed),
                Event::TurnCompleted { .. } => self.outcome.turns += 1,
                _ => {}
            }
            log::trace!("frame {}: {event:?}", self.outcome.frames);
        }
    }

    /// Runs idle frames until nothing moves, including arrow rides.
    fn settle(&mut self) {
        let idle = InputSnapshot::new();
        for _ in 0..SETTLE_LIMIT {
            let busy = self.game.is_moving()
                || self.game.transform_timer() > 0.0
                || self.game.phase() == Phase::FadingIn;
            self.frame(&idle);
            if !busy && !self.game.is_moving() {
                return;
            }
        }
        log::warn!("board still busy after {SETTLE_LIMIT} frames");
    }
}
