//! The save document as the game writes it.
//!
//! Field names on disk are PascalCase. Every section keeps the keys it does
//! not interpret in an `extra` map so that a load/serialize cycle writes back
//! what the game wrote.

use crate::area::{self, AreaCell};
use crate::error::{Error, Result};
use crate::faction::Faction;
use crate::wave::WaveEntry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// A complete save document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveDocument {
    #[serde(rename = "WaveData")]
    pub wave_data: WaveData,
    #[serde(rename = "Kings")]
    pub kings: Kings,
    /// Always 25 cells; sorted canonically after a load.
    #[serde(rename = "Areas")]
    pub areas: Vec<AreaCell>,
    #[serde(rename = "Policies")]
    pub policies: PolicyList,
    #[serde(rename = "HandCards")]
    pub hand_cards: HandCards,
    #[serde(rename = "PolicyVariables")]
    pub policy_variables: PolicyVariables,
    #[serde(rename = "Blessing")]
    pub blessing: Blessing,
    /// `Version`, `Message` and any other top-level key, written back untouched.
    #[serde(flatten)]
    pub passthrough: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WaveData {
    /// 1-indexed.
    pub wave_number: i64,
    pub seed: i64,
    pub currency: i64,
    pub chaos_level: i64,
    pub player_lifes: i64,
    /// 1-indexed.
    pub special_wave_index: i64,
    pub difficulty: String,
    pub waves: Vec<WaveEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Kings {
    pub player_king: Faction,
    pub enemy_kings: Vec<Faction>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `Policies` section wraps the decree list in an object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyList {
    #[serde(rename = "Policies")]
    pub entries: Vec<Policy>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A decree and how many times it has been taken.
///
/// Names are not unique; see [`DocumentStore::add_or_stack_policy`](crate::DocumentStore::add_or_stack_policy).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Policy {
    pub name: String,
    pub stacks: u32,
}

impl Policy {
    pub fn new(name: impl Into<String>, stacks: u32) -> Self {
        Policy {
            name: name.into(),
            stacks,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandCards {
    #[serde(rename = "Cards")]
    pub cards: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The flat table of named tuning values (`PIT_COINS_MULTIPLIER`,
/// `GARRISON_ENABLED`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyVariables(pub BTreeMap<String, PolicyValue>);

impl PolicyVariables {
    pub fn get(&self, name: &str) -> Option<&PolicyValue> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: PolicyValue) -> Option<PolicyValue> {
        self.0.insert(name.into(), value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A single policy variable.
///
/// Numbers keep their JSON representation, so an integer written by the game
/// is written back as an integer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PolicyValue {
    Flag(bool),
    Number(Number),
    /// Structured values the editor does not edit.
    Other(Value),
}

impl PolicyValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PolicyValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PolicyValue::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<bool> for PolicyValue {
    fn from(b: bool) -> Self {
        PolicyValue::Flag(b)
    }
}

impl From<i64> for PolicyValue {
    fn from(n: i64) -> Self {
        PolicyValue::Number(n.into())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Blessing {
    #[serde(rename = "Name")]
    pub name: String,
    /// Cells affected, relative to the blessing's origin.
    #[serde(rename = "Areas")]
    pub areas: Vec<BlessingOffset>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlessingOffset {
    pub x: i32,
    pub y: i32,
}

impl SaveDocument {
    /// Parse and validate a save, then sort its areas canonically.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedSaveData`] if the bytes are not JSON, a
    /// required section is missing or mistyped, or the areas do not cover
    /// the grid exactly once.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut doc: SaveDocument = serde_json::from_slice(bytes)?;
        area::validate_grid(&doc.areas).map_err(Error::malformed)?;
        area::sort_canonical(&mut doc.areas);
        Ok(doc)
    }

    /// Render as pretty-printed JSON (2-space indentation).
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// The opaque `Version` field, if present.
    pub fn version(&self) -> Option<&Value> {
        self.passthrough.get("Version")
    }

    /// The opaque `Message` field, if present.
    pub fn message(&self) -> Option<&Value> {
        self.passthrough.get("Message")
    }

    /// The cell at `(x, y)`.
    pub fn cell(&self, x: i32, y: i32) -> Option<&AreaCell> {
        self.areas.iter().find(|c| c.x == x && c.y == y)
    }
}
