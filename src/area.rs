//! The 5x5 plot grid: cells, their derived accessibility, and the
//! construction-mode transitions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

/// Cells span coordinates `-GRID_RADIUS..=GRID_RADIUS` on both axes.
pub const GRID_RADIUS: i32 = 2;
/// Cells per row.
pub const GRID_SIDE: usize = 5;
/// Total cells in a grid.
pub const CELL_COUNT: usize = GRID_SIDE * GRID_SIDE;

/// Combat stats of the card placed on a cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CombatStats {
    #[serde(rename = "MaxHP")]
    pub max_hp: f64,
    pub strength: f64,
    pub walk_speed: f64,
    pub attack_speed: f64,
    pub crit_multiplier: f64,
    pub crit_chance: f64,
}

/// One plot on the grid, as written in the save's `Areas` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaCell {
    #[serde(rename = "IsUnlocked")]
    pub is_unlocked: bool,
    #[serde(rename = "PlotHoleEnabled")]
    pub has_hole: bool,
    #[serde(rename = "XCoordinate")]
    pub x: i32,
    #[serde(rename = "YCoordinate")]
    pub y: i32,
    /// Empty when nothing is placed.
    #[serde(rename = "PlacedCardName")]
    pub placed_card_name: String,
    #[serde(rename = "CardLevel")]
    pub card_level: i64,
    #[serde(
        rename = "MaxCardLevel",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub max_card_level: Option<i64>,
    #[serde(rename = "TroopQuantity")]
    pub troop_quantity: i64,
    #[serde(rename = "EntitySize")]
    pub entity_size: i64,
    #[serde(rename = "Stats")]
    pub stats: CombatStats,
    /// Keys the game writes that this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The mutable gameplay fields of a cell, as edited from the plot stats view.
///
/// Does not include anything that affects [`Accessibility`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaDetails {
    pub card_level: i64,
    #[serde(default)]
    pub max_card_level: Option<i64>,
    pub troop_quantity: i64,
    pub entity_size: i64,
    pub stats: CombatStats,
}

/// The four mutually exclusive states a cell can be in.
///
/// Never stored; always derived from `has_hole`, `placed_card_name` and
/// `is_unlocked` by [`AreaCell::accessibility`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accessibility {
    Hole,
    Occupied,
    Accessible,
    Inaccessible,
}

impl fmt::Display for Accessibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Accessibility::Hole => "hole",
            Accessibility::Occupied => "occupied",
            Accessibility::Accessible => "accessible",
            Accessibility::Inaccessible => "inaccessible",
        })
    }
}

/// Direction of a construction tool click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstructionMode {
    /// hole -> inaccessible -> accessible
    Add,
    /// occupied -> accessible -> inaccessible -> hole
    Remove,
}

impl AreaCell {
    /// A locked, empty cell at `(x, y)`.
    pub fn new(x: i32, y: i32) -> Self {
        AreaCell {
            is_unlocked: false,
            has_hole: false,
            x,
            y,
            placed_card_name: String::new(),
            card_level: 0,
            max_card_level: None,
            troop_quantity: 0,
            entity_size: 1,
            stats: CombatStats::default(),
            extra: Map::new(),
        }
    }

    /// Derive the cell's state. A hole dominates everything else.
    pub fn accessibility(&self) -> Accessibility {
        if self.has_hole {
            Accessibility::Hole
        } else if !self.placed_card_name.is_empty() {
            Accessibility::Occupied
        } else if self.is_unlocked {
            Accessibility::Accessible
        } else {
            Accessibility::Inaccessible
        }
    }

    /// Whether the cell counts toward card statistics: unlocked with a card
    /// placed on it.
    pub fn has_placed_card(&self) -> bool {
        self.is_unlocked && !self.placed_card_name.is_empty()
    }

    pub fn coordinate(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Remove the placed card and reset every gameplay field.
    pub fn clear_placement(&mut self) {
        self.placed_card_name.clear();
        self.card_level = 0;
        self.max_card_level = None;
        self.troop_quantity = 0;
        self.entity_size = 1;
        self.stats = CombatStats::default();
    }

    /// Overwrite the gameplay fields.
    pub fn set_details(&mut self, details: &AreaDetails) {
        self.card_level = details.card_level;
        self.max_card_level = details.max_card_level;
        self.troop_quantity = details.troop_quantity;
        self.entity_size = details.entity_size;
        self.stats = details.stats;
    }

    /// Move the cell one step in the direction of `mode`.
    ///
    /// Returns `false` when the cell is already at the end of that direction
    /// (`Add` on accessible/occupied, `Remove` on a hole) and nothing changed.
    ///
    /// ```
    /// use savefold::{Accessibility, AreaCell, ConstructionMode};
    ///
    /// let mut cell = AreaCell::new(0, 0);
    /// cell.has_hole = true;
    ///
    /// assert!(cell.apply_construction(ConstructionMode::Add));
    /// assert_eq!(cell.accessibility(), Accessibility::Inaccessible);
    /// assert!(cell.apply_construction(ConstructionMode::Add));
    /// assert_eq!(cell.accessibility(), Accessibility::Accessible);
    /// assert!(!cell.apply_construction(ConstructionMode::Add));
    /// ```
    pub fn apply_construction(&mut self, mode: ConstructionMode) -> bool {
        match (mode, self.accessibility()) {
            (ConstructionMode::Add, Accessibility::Hole) => {
                self.has_hole = false;
                self.is_unlocked = false;
            }
            (ConstructionMode::Add, Accessibility::Inaccessible) => {
                self.is_unlocked = true;
            }
            (ConstructionMode::Add, Accessibility::Accessible | Accessibility::Occupied) => {
                return false;
            }
            (ConstructionMode::Remove, Accessibility::Occupied) => {
                self.clear_placement();
            }
            (ConstructionMode::Remove, Accessibility::Accessible) => {
                self.is_unlocked = false;
            }
            (ConstructionMode::Remove, Accessibility::Inaccessible) => {
                self.has_hole = true;
            }
            (ConstructionMode::Remove, Accessibility::Hole) => return false,
        }
        true
    }
}

/// Canonical position of `(x, y)` in a sorted grid: `(y + 2) * 5 + (x + 2)`.
///
/// ```
/// assert_eq!(savefold::area::canonical_index(-2, -2), Some(0));
/// assert_eq!(savefold::area::canonical_index(0, 0), Some(12));
/// assert_eq!(savefold::area::canonical_index(3, 0), None);
/// ```
pub fn canonical_index(x: i32, y: i32) -> Option<usize> {
    if !in_grid(x, y) {
        return None;
    }
    Some(((y + GRID_RADIUS) as usize) * GRID_SIDE + (x + GRID_RADIUS) as usize)
}

/// Inverse of [`canonical_index`].
pub fn coordinate_at(index: usize) -> Option<(i32, i32)> {
    if index >= CELL_COUNT {
        return None;
    }
    let col = (index % GRID_SIDE) as i32;
    let row = (index / GRID_SIDE) as i32;
    Some((col - GRID_RADIUS, row - GRID_RADIUS))
}

pub fn in_grid(x: i32, y: i32) -> bool {
    (-GRID_RADIUS..=GRID_RADIUS).contains(&x) && (-GRID_RADIUS..=GRID_RADIUS).contains(&y)
}

/// Every coordinate of the grid in canonical order.
pub fn all_coordinates() -> impl Iterator<Item = (i32, i32)> {
    (0..CELL_COUNT).filter_map(coordinate_at)
}

/// The starting kingdom: the center nine cells are unlocked, the ring around
/// them is locked.
pub fn is_center_nine(x: i32, y: i32) -> bool {
    x.abs() <= 1 && y.abs() <= 1
}

/// A fresh grid in canonical order with the center nine unlocked.
pub fn default_grid() -> Vec<AreaCell> {
    all_coordinates()
        .map(|(x, y)| {
            let mut cell = AreaCell::new(x, y);
            cell.is_unlocked = is_center_nine(x, y);
            cell
        })
        .collect()
}

/// Sort cells into canonical order. Stable for cells sharing a coordinate.
pub fn sort_canonical(cells: &mut [AreaCell]) {
    cells.sort_by_key(|c| (c.y + GRID_RADIUS) * GRID_SIDE as i32 + (c.x + GRID_RADIUS));
}

/// Check that `cells` holds exactly one cell for every coordinate.
///
/// Returns a human-readable reason on failure.
pub fn validate_grid(cells: &[AreaCell]) -> Result<(), String> {
    if cells.len() != CELL_COUNT {
        return Err(format!(
            "expected {CELL_COUNT} areas, found {}",
            cells.len()
        ));
    }
    let mut seen = HashSet::with_capacity(CELL_COUNT);
    for cell in cells {
        if !in_grid(cell.x, cell.y) {
            return Err(format!("area ({}, {}) is outside the grid", cell.x, cell.y));
        }
        if !seen.insert(cell.coordinate()) {
            return Err(format!("area ({}, {}) appears more than once", cell.x, cell.y));
        }
    }
    Ok(())
}

/// Find the cell at `(x, y)` regardless of the sequence's order.
pub fn find_cell_mut(cells: &mut [AreaCell], x: i32, y: i32) -> Option<&mut AreaCell> {
    cells.iter_mut().find(|c| c.x == x && c.y == y)
}
