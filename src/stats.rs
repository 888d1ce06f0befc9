//! Aggregates derived from a document. Computed on demand, never cached.

use crate::area::AreaCell;
use crate::document::SaveDocument;
use serde::Serialize;
use std::collections::BTreeMap;

/// Summary of the plot grid.
///
/// Card figures only count cells that are unlocked *and* have a card placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AreaStatistics {
    pub total_cards: usize,
    pub total_troops: i64,
    /// Mean card level over placed cards, 0 when there are none.
    pub average_level: f64,
    /// `round(Σ maxHP * strength * (1 + critChance * critMultiplier))`.
    pub power_rating: i64,
    pub unlocked_plots: usize,
    pub occupied_plots: usize,
    pub plot_holes: usize,
}

/// Compute [`AreaStatistics`] for a document.
pub fn compute_statistics(doc: &SaveDocument) -> AreaStatistics {
    compute_for_cells(&doc.areas)
}

/// Same as [`compute_statistics`] over a bare cell slice.
///
/// ```
/// use savefold::{AreaCell, CombatStats};
/// use savefold::stats::compute_for_cells;
///
/// let mut cell = AreaCell::new(0, 0);
/// cell.is_unlocked = true;
/// cell.placed_card_name = "Archer".into();
/// cell.card_level = 3;
/// cell.stats = CombatStats {
///     max_hp: 100.0,
///     strength: 10.0,
///     crit_chance: 0.5,
///     crit_multiplier: 2.0,
///     ..Default::default()
/// };
///
/// let stats = compute_for_cells(std::slice::from_ref(&cell));
/// assert_eq!(stats.power_rating, 2000);
/// assert_eq!(stats.average_level, 3.0);
/// ```
pub fn compute_for_cells(cells: &[AreaCell]) -> AreaStatistics {
    let placed: Vec<_> = cells.iter().filter(|c| c.has_placed_card()).collect();

    let total_troops = placed
        .iter()
        .fold(0i64, |acc, c| acc.saturating_add(c.troop_quantity));
    let total_level = placed
        .iter()
        .fold(0i64, |acc, c| acc.saturating_add(c.card_level));
    let average_level = if placed.is_empty() {
        0.0
    } else {
        total_level as f64 / placed.len() as f64
    };
    let power: f64 = placed
        .iter()
        .map(|c| {
            let s = &c.stats;
            s.max_hp * s.strength * (1.0 + s.crit_chance * s.crit_multiplier)
        })
        .sum();

    AreaStatistics {
        total_cards: placed.len(),
        total_troops,
        average_level,
        power_rating: power.round() as i64,
        unlocked_plots: cells.iter().filter(|c| c.is_unlocked).count(),
        occupied_plots: placed.len(),
        plot_holes: cells.iter().filter(|c| c.has_hole).count(),
    }
}

/// Decree name to stack count. With duplicate names the later entry wins.
pub fn policy_effects(doc: &SaveDocument) -> BTreeMap<String, u32> {
    doc.policies
        .entries
        .iter()
        .map(|p| (p.name.clone(), p.stacks))
        .collect()
}
