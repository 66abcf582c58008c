use std::fmt;

use log::{debug, info};
use thiserror::Error;

use crate::{
    catalog::{Catalog, CreatureDefinition},
    farm::{Farm, FarmError, FarmRules, GameState, TapOutcome},
    persistence::{LoadSource, PersistenceError, StateStore},
};

/// Called with the full state after every successful mutation.
pub type ChangeHook = Box<dyn FnMut(&GameState) + Send>;

/// The user-facing actions, one per core operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Select { id: String },
    Tap { index: usize },
    AdvanceDay,
    Save,
    Reset { confirmed: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Selected(CreatureDefinition),
    Tapped(TapOutcome),
    DayAdvanced { day: u32 },
    Saved,
    Reset,
}

impl Outcome {
    pub fn mutates_state(&self) -> bool {
        !matches!(self, Outcome::Saved)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Selected(definition) => {
                write!(f, "Selected {}. Tap a tile to place.", definition.name)
            }
            Outcome::Tapped(outcome) => write!(f, "{outcome}"),
            Outcome::DayAdvanced { .. } => write!(f, "A new day dawns..."),
            Outcome::Saved => write!(f, "Saved!"),
            Outcome::Reset => write!(f, "Reset complete."),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Farm(#[from] FarmError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("Unknown creature '{0}'.")]
    UnknownCreature(String),
    #[error("Reset needs confirmation.")]
    ResetNotConfirmed,
}

pub struct EngineBuilder {
    rules: FarmRules,
    catalog: Catalog,
    store: StateStore,
    hooks: Vec<ChangeHook>,
}

impl EngineBuilder {
    pub fn new(rules: FarmRules, catalog: Catalog, store: StateStore) -> Self {
        Self {
            rules,
            catalog,
            store,
            hooks: Vec::new(),
        }
    }

    pub fn with_hook(mut self, hook: impl FnMut(&GameState) + Send + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Restores the saved farm, falling back to a fresh one.
    pub fn build(self) -> Engine {
        let (state, load_source) = self.store.load_or_initialize(&self.rules);
        let farm = match Farm::from_state(self.rules, state) {
            Ok(farm) => farm,
            Err(_) => Farm::new(self.rules),
        };
        Engine {
            farm,
            catalog: self.catalog,
            store: self.store,
            hooks: self.hooks,
            load_source,
        }
    }
}

/// Single owner of the farm. Boundaries talk to the game only through `apply`.
pub struct Engine {
    farm: Farm,
    catalog: Catalog,
    store: StateStore,
    hooks: Vec<ChangeHook>,
    load_source: LoadSource,
}

impl Engine {
    pub fn apply(&mut self, action: Action) -> Result<Outcome, EngineError> {
        debug!("applying {action:?}");
        let outcome = match action {
            Action::Select { id } => {
                let definition = self
                    .catalog
                    .get(&id)
                    .cloned()
                    .ok_or(EngineError::UnknownCreature(id))?;
                self.farm.select(definition.clone());
                Outcome::Selected(definition)
            }
            Action::Tap { index } => Outcome::Tapped(self.farm.tap_cell(index)?),
            Action::AdvanceDay => Outcome::DayAdvanced {
                day: self.farm.advance_day(),
            },
            Action::Save => {
                self.store.save_state(self.farm.state())?;
                info!("saved farm to '{}'", self.store.key());
                Outcome::Saved
            }
            Action::Reset { confirmed } => {
                if !confirmed {
                    return Err(EngineError::ResetNotConfirmed);
                }
                self.farm.reset();
                info!("farm reset");
                Outcome::Reset
            }
        };

        if outcome.mutates_state() {
            let state = self.farm.state();
            for hook in &mut self.hooks {
                hook(state);
            }
        }
        Ok(outcome)
    }

    pub fn add_hook(&mut self, hook: impl FnMut(&GameState) + Send + 'static) {
        self.hooks.push(Box::new(hook));
    }

    pub fn state(&self) -> &GameState {
        self.farm.state()
    }

    pub fn rules(&self) -> &FarmRules {
        self.farm.rules()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn load_source(&self) -> LoadSource {
        self.load_source
    }
}
