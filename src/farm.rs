use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::CreatureDefinition;

fn default_grid_width() -> usize {
    12
}

fn default_grid_height() -> usize {
    10
}

fn default_place_cost() -> u32 {
    10
}

fn default_feed_cost() -> u32 {
    2
}

fn default_harvest_reward() -> u32 {
    15
}

fn default_starting_bits() -> u32 {
    30
}

fn default_max_stage() -> u8 {
    3
}

/// Largest grid a config may ask for.
pub const MAX_GRID_CELLS: usize = 10_000;

/// Costs, rewards and grid dimensions. Every value can be overridden from config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmRules {
    #[serde(default = "default_grid_width")]
    pub grid_width: usize,
    #[serde(default = "default_grid_height")]
    pub grid_height: usize,
    #[serde(default = "default_place_cost")]
    pub place_cost: u32,
    #[serde(default = "default_feed_cost")]
    pub feed_cost: u32,
    #[serde(default = "default_harvest_reward")]
    pub harvest_reward: u32,
    #[serde(default = "default_starting_bits")]
    pub starting_bits: u32,
    #[serde(default = "default_max_stage")]
    pub max_stage: u8,
}

impl Default for FarmRules {
    fn default() -> Self {
        Self {
            grid_width: default_grid_width(),
            grid_height: default_grid_height(),
            place_cost: default_place_cost(),
            feed_cost: default_feed_cost(),
            harvest_reward: default_harvest_reward(),
            starting_bits: default_starting_bits(),
            max_stage: default_max_stage(),
        }
    }
}

impl FarmRules {
    pub fn with_grid(mut self, width: usize, height: usize) -> Self {
        self.grid_width = width;
        self.grid_height = height;
        self
    }

    pub fn cell_count(&self) -> usize {
        self.grid_width.saturating_mul(self.grid_height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedCreature {
    pub id: String,
    pub name: String,
    pub stage: u8,
}

impl PlacedCreature {
    fn from_definition(definition: &CreatureDefinition) -> Self {
        Self {
            id: definition.id.clone(),
            name: definition.name.clone(),
            stage: 0,
        }
    }

    /// One-based level shown to the player.
    pub fn level(&self) -> u8 {
        self.stage.saturating_add(1)
    }
}

/// Everything that gets persisted: counters, grid and the current selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub day: u32,
    pub bits: u32,
    pub grid: Vec<Option<PlacedCreature>>,
    pub selected: Option<CreatureDefinition>,
}

impl GameState {
    pub fn initialize(rules: &FarmRules) -> Self {
        Self {
            day: 1,
            bits: rules.starting_bits,
            grid: vec![None; rules.cell_count()],
            selected: None,
        }
    }

    pub fn occupied(&self) -> usize {
        self.grid.iter().filter(|cell| cell.is_some()).count()
    }

    pub fn validate(&self, rules: &FarmRules) -> Result<(), StateViolation> {
        if self.day == 0 {
            return Err(StateViolation::ZeroDay);
        }
        if self.grid.len() != rules.cell_count() {
            return Err(StateViolation::GridLength {
                expected: rules.cell_count(),
                found: self.grid.len(),
            });
        }
        for (index, cell) in self.grid.iter().enumerate() {
            if let Some(creature) = cell {
                if creature.stage > rules.max_stage {
                    return Err(StateViolation::StageOutOfRange {
                        index,
                        stage: creature.stage,
                        max: rules.max_stage,
                    });
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateViolation {
    #[error("day counter must start at 1")]
    ZeroDay,
    #[error("grid has {found} tiles, expected {expected}")]
    GridLength { expected: usize, found: usize },
    #[error("tile {index} has stage {stage}, above the maximum of {max}")]
    StageOutOfRange { index: usize, stage: u8, max: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spend {
    Place,
    Feed,
}

impl fmt::Display for Spend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Spend::Place => write!(f, "place"),
            Spend::Feed => write!(f, "feed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FarmError {
    #[error("Not enough Bits to {action}.")]
    InsufficientFunds {
        action: Spend,
        needed: u32,
        available: u32,
    },
    #[error("Select a Digimon first.")]
    NoSelection,
    #[error("Tile {index} is outside the {len}-tile farm.")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapOutcome {
    Placed { index: usize, name: String },
    Fed { index: usize, name: String, stage: u8 },
    Harvested { index: usize, name: String, reward: u32 },
}

impl fmt::Display for TapOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TapOutcome::Placed { name, .. } => write!(f, "Placed {name}."),
            TapOutcome::Fed { name, stage, .. } => {
                write!(f, "Fed {name}. Stage -> {}", stage.saturating_add(1))
            }
            TapOutcome::Harvested { name, reward, .. } => {
                write!(f, "Harvested {name}! +{reward} Bits")
            }
        }
    }
}

/// Owns the game state and is the only thing allowed to mutate it.
///
/// Every operation checks its preconditions before touching the state, so a
/// failed call leaves the farm exactly as it was.
#[derive(Debug, Clone)]
pub struct Farm {
    rules: FarmRules,
    state: GameState,
}

impl Farm {
    pub fn new(rules: FarmRules) -> Self {
        Self {
            state: GameState::initialize(&rules),
            rules,
        }
    }

    /// Fresh farm of the given size using the default costs.
    pub fn initialize(width: usize, height: usize) -> Self {
        Self::new(FarmRules::default().with_grid(width, height))
    }

    pub fn from_state(rules: FarmRules, state: GameState) -> Result<Self, StateViolation> {
        state.validate(&rules)?;
        Ok(Self { rules, state })
    }

    pub fn rules(&self) -> &FarmRules {
        &self.rules
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn into_state(self) -> GameState {
        self.state
    }

    pub fn cell(&self, index: usize) -> Option<&PlacedCreature> {
        self.state.grid.get(index).and_then(Option::as_ref)
    }

    pub fn select(&mut self, definition: CreatureDefinition) {
        self.state.selected = Some(definition);
    }

    pub fn tap_cell(&mut self, index: usize) -> Result<TapOutcome, FarmError> {
        let len = self.state.grid.len();
        let bits = self.state.bits;
        let FarmRules {
            place_cost,
            feed_cost,
            harvest_reward,
            max_stage,
            ..
        } = self.rules;
        let cell = self
            .state
            .grid
            .get_mut(index)
            .ok_or(FarmError::IndexOutOfRange { index, len })?;

        match cell {
            Some(creature) if creature.stage < max_stage => {
                if bits < feed_cost {
                    return Err(FarmError::InsufficientFunds {
                        action: Spend::Feed,
                        needed: feed_cost,
                        available: bits,
                    });
                }
                creature.stage += 1;
                let outcome = TapOutcome::Fed {
                    index,
                    name: creature.name.clone(),
                    stage: creature.stage,
                };
                self.state.bits = bits - feed_cost;
                Ok(outcome)
            }
            Some(_) => {
                let name = cell.take().map(|creature| creature.name).unwrap_or_default();
                self.state.bits = bits.saturating_add(harvest_reward);
                Ok(TapOutcome::Harvested {
                    index,
                    name,
                    reward: harvest_reward,
                })
            }
            None => {
                let definition = self.state.selected.as_ref().ok_or(FarmError::NoSelection)?;
                if bits < place_cost {
                    return Err(FarmError::InsufficientFunds {
                        action: Spend::Place,
                        needed: place_cost,
                        available: bits,
                    });
                }
                let creature = PlacedCreature::from_definition(definition);
                let name = creature.name.clone();
                *cell = Some(creature);
                self.state.bits = bits - place_cost;
                Ok(TapOutcome::Placed { index, name })
            }
        }
    }

    /// Moves to the next day; every creature grows one stage, capped at maturity.
    pub fn advance_day(&mut self) -> u32 {
        let max_stage = self.rules.max_stage;
        self.state.day = self.state.day.saturating_add(1);
        for creature in self.state.grid.iter_mut().flatten() {
            creature.stage = creature.stage.saturating_add(1).min(max_stage);
        }
        self.state.day
    }

    pub fn reset(&mut self) {
        self.state = GameState::initialize(&self.rules);
    }
}
