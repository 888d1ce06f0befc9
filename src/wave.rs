//! Calendar waves and the 1-indexed wave counters.
//!
//! The document stores `WaveNumber` and `SpecialWaveIndex` 1-indexed, the way
//! the game does. UI code addresses the `Waves` sequence by 0-based position.
//! [`to_stored_index`] and [`to_position`] are the only place the two meet.

use crate::faction::FactionId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The special wave the game schedules when the counter is unset.
pub const DEFAULT_SPECIAL_WAVE: i64 = 30;

/// One scheduled event slot on the calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveEntry {
    /// Raw event kind; see [`WaveEntry::kind`].
    #[serde(rename = "Type")]
    pub kind_id: i64,

    /// Controlling king as a bit-flag id.
    #[serde(rename = "King")]
    pub king: FactionId,
}

impl WaveEntry {
    pub fn new(kind: WaveKind, king: impl Into<FactionId>) -> Self {
        WaveEntry {
            kind_id: kind.id(),
            king: king.into(),
        }
    }

    /// The decoded event kind, or `None` if the game wrote a value this
    /// crate does not know.
    pub fn kind(&self) -> Option<WaveKind> {
        WaveKind::from_id(self.kind_id)
    }
}

/// Event kinds that can appear on the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaveKind {
    Battle,
    RoyalCouncil,
    Shop,
    DiplomatPeace,
    ProphetGranted,
    Boss,
    ProphetForesee,
    DiplomatWar,
    Tower,
}

impl WaveKind {
    pub const ALL: [WaveKind; 9] = [
        WaveKind::Battle,
        WaveKind::RoyalCouncil,
        WaveKind::Shop,
        WaveKind::DiplomatPeace,
        WaveKind::ProphetGranted,
        WaveKind::Boss,
        WaveKind::ProphetForesee,
        WaveKind::DiplomatWar,
        WaveKind::Tower,
    ];

    pub fn id(self) -> i64 {
        match self {
            WaveKind::Battle => 0,
            WaveKind::RoyalCouncil => 1,
            WaveKind::Shop => 2,
            WaveKind::DiplomatPeace => 3,
            WaveKind::ProphetGranted => 4,
            WaveKind::Boss => 5,
            WaveKind::ProphetForesee => 6,
            WaveKind::DiplomatWar => 7,
            WaveKind::Tower => 8,
        }
    }

    pub fn from_id(id: i64) -> Option<WaveKind> {
        WaveKind::ALL.into_iter().find(|k| k.id() == id)
    }

    pub fn name(self) -> &'static str {
        match self {
            WaveKind::Battle => "Battle",
            WaveKind::RoyalCouncil => "Royal Council",
            WaveKind::Shop => "Shop",
            WaveKind::DiplomatPeace => "Diplomat (Peace)",
            WaveKind::ProphetGranted => "Prophet (granted)",
            WaveKind::Boss => "Boss",
            WaveKind::ProphetForesee => "Prophet (foresee)",
            WaveKind::DiplomatWar => "Diplomat (War)",
            WaveKind::Tower => "Tower",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            WaveKind::Battle => "Commence battle with an at-war King",
            WaveKind::RoyalCouncil => "Pick unique decree(s)",
            WaveKind::Shop => "Purchase cards with gold",
            WaveKind::DiplomatPeace => "Declare peace with an at-war King",
            WaveKind::ProphetGranted => "Grant the prophecy",
            WaveKind::Boss => "Final battle in the base run",
            WaveKind::ProphetForesee => "Foresee a random blessing that will happen in 9 years",
            WaveKind::DiplomatWar => "Declare war on a new King",
            WaveKind::Tower => "Kingdom-expanding event",
        }
    }
}

impl fmt::Display for WaveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Convert a 0-based position in `Waves` to the 1-indexed value stored in
/// `WaveNumber` / `SpecialWaveIndex`.
///
/// ```
/// assert_eq!(savefold::wave::to_stored_index(0), 1);
/// assert_eq!(savefold::wave::to_stored_index(29), 30);
/// ```
///
/// Saturates at `i64::MAX`.
pub fn to_stored_index(position: usize) -> i64 {
    i64::try_from(position)
        .unwrap_or(i64::MAX)
        .saturating_add(1)
}

/// Convert a stored 1-indexed counter back to a 0-based position.
///
/// Values below 1 have no position and yield `None`.
///
/// ```
/// assert_eq!(savefold::wave::to_position(1), Some(0));
/// assert_eq!(savefold::wave::to_position(0), None);
/// ```
pub fn to_position(stored: i64) -> Option<usize> {
    stored.checked_sub(1).and_then(|p| usize::try_from(p).ok())
}
