//! The nine playable kings and their save-file encodings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A playable king.
///
/// In the `Kings` section kings are written by name (`"Blood"`, `"Time"`, ...).
/// Wave entries use the bit-flag encoding from [`Faction::id`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Faction {
    Nothing,
    Spells,
    Blood,
    Greed,
    Progress,
    Stone,
    Nomads,
    Nature,
    Time,
}

impl Faction {
    /// All kings, in bit-flag order.
    pub const ALL: [Faction; 9] = [
        Faction::Nothing,
        Faction::Spells,
        Faction::Blood,
        Faction::Greed,
        Faction::Progress,
        Faction::Stone,
        Faction::Nomads,
        Faction::Nature,
        Faction::Time,
    ];

    /// The bit-flag id this king is written as in wave entries.
    ///
    /// ```
    /// use savefold::Faction;
    ///
    /// assert_eq!(Faction::Nothing.id(), 1);
    /// assert_eq!(Faction::Progress.id(), 16);
    /// assert_eq!(Faction::Time.id(), 256);
    /// ```
    pub fn id(self) -> u32 {
        match self {
            Faction::Nothing => 1,
            Faction::Spells => 2,
            Faction::Blood => 4,
            Faction::Greed => 8,
            Faction::Progress => 16,
            Faction::Stone => 32,
            Faction::Nomads => 64,
            Faction::Nature => 128,
            Faction::Time => 256,
        }
    }

    /// Decode a bit-flag id. Anything that is not exactly one of the nine
    /// flags (512 included) means "random" and yields `None`.
    pub fn from_id(id: i64) -> Option<Faction> {
        Faction::ALL.into_iter().find(|f| i64::from(f.id()) == id)
    }

    pub fn name(self) -> &'static str {
        match self {
            Faction::Nothing => "Nothing",
            Faction::Spells => "Spells",
            Faction::Blood => "Blood",
            Faction::Greed => "Greed",
            Faction::Progress => "Progress",
            Faction::Stone => "Stone",
            Faction::Nomads => "Nomads",
            Faction::Nature => "Nature",
            Faction::Time => "Time",
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The raw king value stored on a wave entry.
///
/// Kept as the integer the game wrote so unknown values survive a round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactionId(pub i64);

impl FactionId {
    /// The value the game uses for a randomly chosen king.
    pub const RANDOM: FactionId = FactionId(512);

    /// The king this id names, or `None` for random/unspecified.
    pub fn faction(self) -> Option<Faction> {
        Faction::from_id(self.0)
    }

    pub fn is_random(self) -> bool {
        self.faction().is_none()
    }
}

impl From<Faction> for FactionId {
    fn from(f: Faction) -> Self {
        FactionId(i64::from(f.id()))
    }
}

impl From<Option<Faction>> for FactionId {
    fn from(f: Option<Faction>) -> Self {
        f.map(FactionId::from).unwrap_or(FactionId::RANDOM)
    }
}

impl fmt::Display for FactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.faction() {
            Some(faction) => write!(f, "{faction}"),
            None => f.write_str("<Random>"),
        }
    }
}
