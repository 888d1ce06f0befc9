use crate::area::{self, AreaCell, AreaDetails, ConstructionMode};
use crate::document::{Blessing, BlessingOffset, Policy, PolicyVariables, SaveDocument};
use crate::error::{Error, Result};
use crate::faction::Faction;
use crate::wave::WaveEntry;
use serde::{Deserialize, Serialize};

/// An edit to a loaded save document.
///
/// Commands serialize as `{"type": "...", "data": ...}` so they can be fed
/// to the store from JSON.
///
/// ```
/// use savefold::{Command, ConstructionMode};
///
/// let cmd: Command = serde_json::from_str(
///     r#"{"type": "apply_construction_action", "data": {"x": 1, "y": -2, "mode": "add"}}"#,
/// ).unwrap();
/// assert_eq!(cmd, Command::ApplyConstructionAction { x: 1, y: -2, mode: ConstructionMode::Add });
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
#[non_exhaustive]
pub enum Command {
    /// Replace the whole grid. Order is kept as given.
    SetAreas(Vec<AreaCell>),
    /// Move one cell a step along the construction cycle.
    ApplyConstructionAction {
        x: i32,
        y: i32,
        mode: ConstructionMode,
    },
    /// Overwrite a cell's gameplay fields.
    SetAreaDetails {
        x: i32,
        y: i32,
        details: AreaDetails,
    },
    /// Shallow-merge wave counters.
    SetWaveData(WaveDataPatch),
    SetWaves(Vec<WaveEntry>),
    /// 1-indexed, stored as given.
    SetWaveNumber(i64),
    /// 1-indexed, stored as given.
    SetSpecialWaveIndex(i64),
    SetKings(KingsPatch),
    SetHandCards(Vec<String>),
    SetPolicy {
        index: usize,
        policy: Policy,
    },
    /// Append a decree. Does not merge with an existing entry of the same name.
    AddPolicy(Policy),
    RemovePolicy {
        index: usize,
    },
    SetPolicyVariables(PolicyVariables),
    SetBlessing {
        name: String,
        areas: Vec<BlessingOffset>,
    },
}

/// Any subset of the scalar wave fields. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveDataPatch {
    pub wave_number: Option<i64>,
    pub seed: Option<i64>,
    pub currency: Option<i64>,
    pub chaos_level: Option<i64>,
    pub player_lives: Option<i64>,
    pub special_wave_index: Option<i64>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KingsPatch {
    pub player_king: Option<Faction>,
    pub enemy_kings: Option<Vec<Faction>>,
}

/// Fold a command into a document.
///
/// Pure: the input document is consumed and a new one returned. On error the
/// caller still holds whatever copy it passed in, so a failed command never
/// leaves a half-applied document behind.
///
/// # Errors
///
/// [`Error::InvalidAreaGrid`], [`Error::CoordinateOutOfRange`] or
/// [`Error::IndexOutOfRange`] when the payload does not fit the document.
pub fn reduce(mut doc: SaveDocument, command: &Command) -> Result<SaveDocument> {
    match command {
        Command::SetAreas(cells) => {
            area::validate_grid(cells).map_err(|reason| Error::InvalidAreaGrid { reason })?;
            doc.areas = cells.clone();
        }
        Command::ApplyConstructionAction { x, y, mode } => {
            let cell = cell_mut(&mut doc, *x, *y)?;
            cell.apply_construction(*mode);
        }
        Command::SetAreaDetails { x, y, details } => {
            cell_mut(&mut doc, *x, *y)?.set_details(details);
        }
        Command::SetWaveData(patch) => {
            let wave = &mut doc.wave_data;
            if let Some(v) = patch.wave_number {
                wave.wave_number = v;
            }
            if let Some(v) = patch.seed {
                wave.seed = v;
            }
            if let Some(v) = patch.currency {
                wave.currency = v;
            }
            if let Some(v) = patch.chaos_level {
                wave.chaos_level = v;
            }
            if let Some(v) = patch.player_lives {
                wave.player_lifes = v;
            }
            if let Some(v) = patch.special_wave_index {
                wave.special_wave_index = v;
            }
            if let Some(v) = &patch.difficulty {
                wave.difficulty = v.clone();
            }
        }
        Command::SetWaves(waves) => doc.wave_data.waves = waves.clone(),
        Command::SetWaveNumber(n) => doc.wave_data.wave_number = *n,
        Command::SetSpecialWaveIndex(n) => doc.wave_data.special_wave_index = *n,
        Command::SetKings(patch) => {
            if let Some(king) = patch.player_king {
                doc.kings.player_king = king;
            }
            if let Some(enemies) = &patch.enemy_kings {
                doc.kings.enemy_kings = enemies.clone();
            }
        }
        Command::SetHandCards(cards) => doc.hand_cards.cards = cards.clone(),
        Command::SetPolicy { index, policy } => {
            let len = doc.policies.entries.len();
            let slot = doc
                .policies
                .entries
                .get_mut(*index)
                .ok_or(Error::IndexOutOfRange { index: *index, len })?;
            *slot = policy.clone();
        }
        Command::AddPolicy(policy) => doc.policies.entries.push(policy.clone()),
        Command::RemovePolicy { index } => {
            let len = doc.policies.entries.len();
            if *index >= len {
                return Err(Error::IndexOutOfRange { index: *index, len });
            }
            doc.policies.entries.remove(*index);
        }
        Command::SetPolicyVariables(vars) => doc.policy_variables = vars.clone(),
        Command::SetBlessing { name, areas } => {
            doc.blessing = Blessing {
                name: name.clone(),
                areas: areas.clone(),
                extra: std::mem::take(&mut doc.blessing.extra),
            };
        }
    }
    Ok(doc)
}

fn cell_mut(doc: &mut SaveDocument, x: i32, y: i32) -> Result<&mut AreaCell> {
    area::find_cell_mut(&mut doc.areas, x, y).ok_or(Error::CoordinateOutOfRange { x, y })
}
