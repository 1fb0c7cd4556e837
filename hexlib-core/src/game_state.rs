//! GameState: the named-phase state machine that drives a turn
//!
//! ## Architecture
//!
//! A phase is a bundle of callbacks keyed by name. Entering a phase runs its
//! `start`, which either waits for outside input (`Transition::Wait`) or
//! names the next phase. `GamePlay::phase` follows those transitions in a
//! loop, so a chain like `EndAction -> EndTurn -> BeginTurn` completes in one
//! call without recursion.
//!
//! The default table:
//!
//! ```text
//! BeginTurn -> ChooseAction -> Move (waits)
//!                                | done
//!                                v
//!              BeginTurn <- EndTurn <- EndAction
//! ```
//!
//! Games add or replace phases with `define_states`. Phase-specific data is
//! persisted through a `StateCodec`.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::error::{GameError, Result};
use crate::game_play::GamePlay;

pub type PhaseFn = Rc<dyn Fn(&mut GamePlay, &[Value]) -> Result<Transition>>;
pub type UndoFn = Rc<dyn Fn(&mut GamePlay)>;

/// What a phase callback asks the machine to do next
#[derive(Clone, Debug, PartialEq)]
pub enum Transition {
    /// Stay in the current phase until `done` or `phase` is called
    Wait,
    /// Enter the named phase with these arguments
    Phase(String, Vec<Value>),
}

impl Transition {
    pub fn to(name: &str) -> Self {
        Transition::Phase(name.to_string(), Vec::new())
    }
}

#[derive(Clone)]
pub struct Phase {
    pub start: PhaseFn,
    pub done: Option<PhaseFn>,
    pub undo: Option<UndoFn>,
    pub next_phase: Option<String>,
}

impl Phase {
    pub fn new<F>(start: F) -> Self
    where
        F: Fn(&mut GamePlay, &[Value]) -> Result<Transition> + 'static,
    {
        Self { start: Rc::new(start), done: None, undo: None, next_phase: None }
    }

    pub fn with_done<F>(mut self, done: F) -> Self
    where
        F: Fn(&mut GamePlay, &[Value]) -> Result<Transition> + 'static,
    {
        self.done = Some(Rc::new(done));
        self
    }

    pub fn with_undo<F>(mut self, undo: F) -> Self
    where
        F: Fn(&mut GamePlay) + 'static,
    {
        self.undo = Some(Rc::new(undo));
        self
    }

    pub fn with_next_phase(mut self, name: &str) -> Self {
        self.next_phase = Some(name.to_string());
        self
    }
}

impl fmt::Debug for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Phase")
            .field("done", &self.done.is_some())
            .field("undo", &self.undo.is_some())
            .field("next_phase", &self.next_phase)
            .finish()
    }
}

/// Which existing phases `define_states` removes before merging
#[derive(Clone, Debug, Default)]
pub enum Purge {
    #[default]
    Nothing,
    All,
    Only(Vec<String>),
}

// ============================================================================
// PERSISTENCE HOOK
// ============================================================================

/// Serializes the phase-specific slice of a saved scenario.
pub trait StateCodec {
    fn save_state(&self, _state: &GameState) -> Vec<Value> {
        Vec::new()
    }

    fn parse_state(&self, _state: &mut GameState, _args: &[Value]) -> Result<()> {
        Ok(())
    }
}

/// Saves nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct NoState;

impl StateCodec for NoState {}

/// Saves the current phase name and the scratch map.
#[derive(Clone, Copy, Debug, Default)]
pub struct PhaseCodec;

impl StateCodec for PhaseCodec {
    fn save_state(&self, state: &GameState) -> Vec<Value> {
        vec![
            Value::String(state.state_name().unwrap_or_default().to_string()),
            Value::Object(state.scratch.clone()),
        ]
    }

    fn parse_state(&self, state: &mut GameState, args: &[Value]) -> Result<()> {
        match args.first() {
            Some(Value::String(name)) if name.is_empty() => state.state = None,
            Some(Value::String(name)) => {
                if !state.states.contains_key(name) {
                    return Err(GameError::Scenario(format!("saved phase {} is not defined", name)));
                }
                state.state = Some(name.clone());
            }
            Some(other) => return Err(GameError::Scenario(format!("expected phase name, got {}", other))),
            None => {}
        }
        if let Some(Value::Object(scratch)) = args.get(1) {
            state.scratch = scratch.clone();
        }
        Ok(())
    }
}

// ============================================================================
// STATE MACHINE
// ============================================================================

pub struct GameState {
    states: BTreeMap<String, Phase>,
    state: Option<String>,
    pub start_phase: String,
    pub start_args: Vec<Value>,
    /// Entered by `done` when the current phase has no `done` of its own
    pub done_phase: String,
    codec: Rc<dyn StateCodec>,
    /// Free-form phase data for games that keep it here
    pub scratch: Map<String, Value>,
}

impl fmt::Debug for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameState")
            .field("states", &self.states.keys().collect::<Vec<_>>())
            .field("state", &self.state)
            .field("start_phase", &self.start_phase)
            .field("done_phase", &self.done_phase)
            .finish()
    }
}

impl Default for GameState {
    fn default() -> Self {
        let mut gs = Self {
            states: BTreeMap::new(),
            state: None,
            start_phase: "BeginTurn".to_string(),
            start_args: Vec::new(),
            done_phase: "EndAction".to_string(),
            codec: Rc::new(NoState),
            scratch: Map::new(),
        };
        gs.define_states(Self::default_states(), Purge::Nothing);
        gs
    }
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The turn cycle every game starts from
    pub fn default_states() -> Vec<(String, Phase)> {
        vec![
            (
                "BeginTurn".to_string(),
                Phase::new(|gp, _| {
                    gp.save_game()?;
                    Ok(Transition::to("ChooseAction"))
                })
                .with_done(|_, _| Ok(Transition::to("ChooseAction"))),
            ),
            ("ChooseAction".to_string(), Phase::new(|_, _| Ok(Transition::to("Move")))),
            (
                "Move".to_string(),
                Phase::new(|_, _| Ok(Transition::Wait)).with_done(|_, _| Ok(Transition::to("EndAction"))),
            ),
            (
                "EndAction".to_string(),
                Phase::new(|gp, _| {
                    gp.game_state.set_next_phase("EndTurn");
                    Ok(Transition::to("EndTurn"))
                })
                .with_done(|gp, _| {
                    let next = gp.game_state.current().and_then(|p| p.next_phase.clone());
                    Ok(Transition::Phase(next.unwrap_or_else(|| "Start".to_string()), Vec::new()))
                })
                .with_next_phase("ChooseAction"),
            ),
            (
                "EndTurn".to_string(),
                Phase::new(|gp, _| {
                    gp.end_turn()?;
                    Ok(Transition::to("BeginTurn"))
                }),
            ),
        ]
    }

    /// Merge `states` into the table, first removing what `purge` names.
    pub fn define_states<I>(&mut self, states: I, purge: Purge)
    where
        I: IntoIterator<Item = (String, Phase)>,
    {
        match purge {
            Purge::Nothing => {}
            Purge::All => self.states.clear(),
            Purge::Only(keys) => keys.iter().for_each(|k| {
                self.states.remove(k);
            }),
        }
        self.states.extend(states);
    }

    pub fn set_codec(&mut self, codec: Rc<dyn StateCodec>) {
        self.codec = codec;
    }

    pub fn get(&self, name: &str) -> Option<&Phase> {
        self.states.get(name)
    }

    pub fn phase_names(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }

    /// Name of the current phase; None before the machine starts
    pub fn state_name(&self) -> Option<&str> {
        self.state.as_deref()
    }

    pub fn current(&self) -> Option<&Phase> {
        self.state.as_deref().and_then(|name| self.states.get(name))
    }

    pub fn is_phase(&self, name: &str) -> bool {
        self.state.as_deref() == Some(name)
    }

    /// Set `next_phase` on the current phase.
    pub fn set_next_phase(&mut self, name: &str) {
        if let Some(phase) = self.state.as_deref().and_then(|s| self.states.get_mut(s)) {
            phase.next_phase = Some(name.to_string());
        }
    }

    /// Make `name` current and hand back its start callback.
    pub(crate) fn enter(&mut self, name: &str) -> Result<PhaseFn> {
        let from = self.state.as_deref().unwrap_or("Initialize");
        let Some(phase) = self.states.get(name) else {
            tracing::error!("phase: {} -> {} (no such phase)", from, name);
            return Err(GameError::UnknownPhase(name.to_string()));
        };
        tracing::info!("phase: {} -> {}", from, name);
        let start = Rc::clone(&phase.start);
        self.state = Some(name.to_string());
        Ok(start)
    }

    /// Phase-specific slice of a saved scenario
    pub fn save_state(&self) -> Vec<Value> {
        let codec = Rc::clone(&self.codec);
        codec.save_state(self)
    }

    pub fn parse_state(&mut self, args: &[Value]) -> Result<()> {
        let codec = Rc::clone(&self.codec);
        codec.parse_state(self, args)
    }
}

// ============================================================================
// DRIVING THE MACHINE
// ============================================================================

impl GamePlay {
    /// Enter `start_phase` with `start_args`.
    pub fn start(&mut self) -> Result<()> {
        let name = self.game_state.start_phase.clone();
        let args = self.game_state.start_args.clone();
        self.phase(&name, args)
    }

    /// Enter `name` and follow transitions until a phase waits.
    /// An unregistered name is a wiring bug and comes back as `UnknownPhase`.
    pub fn phase(&mut self, name: &str, args: Vec<Value>) -> Result<()> {
        self.run_transition(Transition::Phase(name.to_string(), args))
    }

    /// Finish the current phase: its own `done`, else `done_phase`.
    pub fn done(&mut self, args: &[Value]) -> Result<()> {
        let done = self.game_state.current().ok_or(GameError::NotStarted)?.done.clone();
        let trans = match done {
            Some(done) => done(self, args)?,
            None => Transition::Phase(self.game_state.done_phase.clone(), args.to_vec()),
        };
        self.run_transition(trans)
    }

    /// Run the current phase's undo callback, if it has one.
    pub fn undo_action(&mut self) {
        if let Some(undo) = self.game_state.current().and_then(|p| p.undo.clone()) {
            undo(self);
        }
    }

    pub fn is_phase(&self, name: &str) -> bool {
        self.game_state.is_phase(name)
    }

    fn run_transition(&mut self, mut trans: Transition) -> Result<()> {
        while let Transition::Phase(name, args) = trans {
            let start = self.game_state.enter(&name)?;
            trans = start(self, &args)?;
        }
        Ok(())
    }
}
