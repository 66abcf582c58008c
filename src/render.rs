//! Read-only views of the farm for the terminal and the browser.

use std::fmt::Write as _;

use serde::Serialize;

use crate::{
    catalog::{Catalog, CreatureDefinition},
    farm::{FarmRules, GameState, PlacedCreature},
};

const SPRITES: [&str; 15] = [
    "🔥", "⭐", "🟧", "🟦", "🟪", "🟩", "🟨", "🟫", "🟥", "🟦", "🐲", "🦖", "🐾", "⚡", "💥",
];

/// 32-bit rolling hash over UTF-16 code units (`h * 31 + c`, wrapping).
pub fn name_hash(name: &str) -> i32 {
    name.encode_utf16()
        .fold(0_i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

/// Placeholder sprite picked deterministically from the creature's name.
pub fn sprite_for(name: &str) -> &'static str {
    let code = name_hash(name).unsigned_abs() as usize;
    SPRITES[code % SPRITES.len()]
}

#[derive(Debug, Clone, Serialize)]
pub struct CellView {
    pub index: usize,
    pub id: String,
    pub name: String,
    pub stage: u8,
    pub level: u8,
    pub sprite: &'static str,
    pub mature: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CardView {
    pub id: String,
    pub name: String,
    pub stage_label: String,
    pub kind_label: String,
    pub sprite: &'static str,
}

impl CardView {
    pub fn new(definition: &CreatureDefinition) -> Self {
        Self {
            id: definition.id.clone(),
            name: definition.name.clone(),
            stage_label: definition.stage_label().to_string(),
            kind_label: definition.kind_label().to_string(),
            sprite: sprite_for(&definition.name),
        }
    }
}

/// Full snapshot handed to a display after every mutation.
#[derive(Debug, Clone, Serialize)]
pub struct FarmView {
    pub width: usize,
    pub height: usize,
    pub day: u32,
    pub bits: u32,
    pub grid: Vec<Option<CellView>>,
    pub selected: Option<CardView>,
}

impl FarmView {
    pub fn new(state: &GameState, rules: &FarmRules) -> Self {
        let grid = state
            .grid
            .iter()
            .enumerate()
            .map(|(index, cell)| cell.as_ref().map(|c| cell_view(index, c, rules)))
            .collect();
        Self {
            width: rules.grid_width,
            height: rules.grid_height,
            day: state.day,
            bits: state.bits,
            grid,
            selected: state.selected.as_ref().map(CardView::new),
        }
    }
}

fn cell_view(index: usize, creature: &PlacedCreature, rules: &FarmRules) -> CellView {
    CellView {
        index,
        id: creature.id.clone(),
        name: creature.name.clone(),
        stage: creature.stage,
        level: creature.level(),
        sprite: sprite_for(&creature.name),
        mature: creature.stage >= rules.max_stage,
    }
}

pub fn catalog_cards(catalog: &Catalog) -> Vec<CardView> {
    catalog.entries().iter().map(CardView::new).collect()
}

/// Text rendering of the grid: `+` for an empty tile, otherwise the
/// creature's initial and level, with `*` marking a harvestable creature.
pub fn render_farm(state: &GameState, rules: &FarmRules) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Day {}    Bits: {}", state.day, state.bits);
    if let Some(selected) = &state.selected {
        let _ = writeln!(out, "Selected: {}", selected.name);
    }

    let width = rules.grid_width.max(1);
    let _ = write!(out, "    ");
    for column in 0..width {
        let _ = write!(out, "{column:>4}");
    }
    let _ = writeln!(out);

    for (row, cells) in state.grid.chunks(width).enumerate() {
        let _ = write!(out, "{:>4}", row * width);
        for cell in cells {
            let token = match cell {
                Some(creature) => {
                    let initial = creature.name.chars().next().unwrap_or('?');
                    let marker = if creature.stage >= rules.max_stage { "*" } else { "" };
                    format!("{initial}{}{marker}", creature.level())
                }
                None => "+".to_string(),
            };
            let _ = write!(out, "{token:>4}");
        }
        let _ = writeln!(out);
    }
    out
}

pub fn render_catalog(catalog: &Catalog) -> String {
    let mut out = String::new();
    for card in catalog_cards(catalog) {
        let _ = writeln!(
            out,
            "{} {:<6} {:<12} {:<12} {}",
            card.sprite, card.id, card.name, card.stage_label, card.kind_label
        );
    }
    out
}
