use crate::command::{self, Command, KingsPatch, WaveDataPatch};
use crate::document::{Policy, SaveDocument};
use crate::error::{Error, Result};
use crate::faction::Faction;
use crate::stats::{self, AreaStatistics};
use crate::wave::{self, WaveEntry};
use std::collections::BTreeMap;

/// Single-writer holder of the loaded save document.
///
/// Every edit goes through [`DocumentStore::apply`], which folds a
/// [`Command`] into the document with [`command::reduce`] and marks the store
/// dirty. Loads replace the document wholesale and clear the dirty flag.
///
/// # Examples
///
/// ```
/// use savefold::{Command, DocumentStore};
/// use serde_json::json;
///
/// let save = json!({
///     "Version": "1.0",
///     "WaveData": {
///         "WaveNumber": 1, "Seed": 7, "Currency": 50, "ChaosLevel": 0,
///         "PlayerLifes": 3, "SpecialWaveIndex": 30, "Difficulty": "Normal",
///         "Waves": [{"Type": 0, "King": 4}]
///     },
///     "Kings": {"PlayerKing": "Blood", "EnemyKings": ["Greed"]},
///     "Areas": savefold::area::default_grid(),
///     "Policies": {"Policies": []},
///     "HandCards": {"Cards": []},
///     "PolicyVariables": {"GARRISON_ENABLED": false},
///     "Blessing": {"Name": "", "Areas": []}
/// });
///
/// let mut store = DocumentStore::new();
/// store.load(save.to_string().as_bytes()).unwrap();
/// assert!(!store.is_dirty());
///
/// store.apply(Command::SetHandCards(vec!["Archer".into()])).unwrap();
/// assert!(store.is_dirty());
/// assert_eq!(store.document().unwrap().hand_cards.cards, ["Archer"]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct DocumentStore {
    document: Option<SaveDocument>,
    dirty: bool,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `bytes` and make the result the current document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedSaveData`] and leaves the current document
    /// and dirty flag untouched if the bytes are not a valid save.
    pub fn load(&mut self, bytes: &[u8]) -> Result<&SaveDocument> {
        let doc = SaveDocument::parse(bytes)?;
        self.dirty = false;
        Ok(&*self.document.insert(doc))
    }

    /// Apply an edit and mark the store dirty.
    ///
    /// # Errors
    ///
    /// [`Error::NoDocumentLoaded`] before the first load, or whatever
    /// [`command::reduce`] rejects. The document and dirty flag are unchanged
    /// on error.
    pub fn apply(&mut self, command: Command) -> Result<()> {
        let current = self.document.as_ref().ok_or(Error::NoDocumentLoaded)?;
        let next = command::reduce(current.clone(), &command)?;
        self.document = Some(next);
        self.dirty = true;
        Ok(())
    }

    /// Override the dirty flag without touching the document.
    ///
    /// Used after exporting the document somewhere other than the bound
    /// resource, which counts as saved without a verified write-back.
    pub fn mark_dirty(&mut self, dirty: bool) -> Result<()> {
        if self.document.is_none() {
            return Err(Error::NoDocumentLoaded);
        }
        self.dirty = dirty;
        Ok(())
    }

    /// Drop the document.
    pub fn reset(&mut self) {
        self.document = None;
        self.dirty = false;
    }

    pub fn document(&self) -> Option<&SaveDocument> {
        self.document.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    /// Whether there are edits not yet written back.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Pretty-printed JSON of the current document.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        self.document
            .as_ref()
            .ok_or(Error::NoDocumentLoaded)?
            .to_json_bytes()
    }

    pub fn statistics(&self) -> Option<AreaStatistics> {
        self.document.as_ref().map(stats::compute_statistics)
    }

    pub fn policy_effects(&self) -> BTreeMap<String, u32> {
        self.document
            .as_ref()
            .map(stats::policy_effects)
            .unwrap_or_default()
    }

    /// Take one more stack of a decree: bump the first entry named `name`,
    /// or append it with one stack. Returns the entry's index.
    pub fn add_or_stack_policy(&mut self, name: &str) -> Result<usize> {
        let doc = self.document.as_ref().ok_or(Error::NoDocumentLoaded)?;
        let entries = &doc.policies.entries;
        match entries.iter().position(|p| p.name == name) {
            Some(index) => {
                let policy = Policy::new(name, entries[index].stacks.saturating_add(1));
                self.apply(Command::SetPolicy { index, policy })?;
                Ok(index)
            }
            None => {
                let index = entries.len();
                self.apply(Command::AddPolicy(Policy::new(name, 1)))?;
                Ok(index)
            }
        }
    }

    /// Replace the decree list: remove every entry, then add `policies` in
    /// order.
    pub fn replace_policies(&mut self, policies: Vec<Policy>) -> Result<()> {
        let len = self
            .document
            .as_ref()
            .ok_or(Error::NoDocumentLoaded)?
            .policies
            .entries
            .len();
        for index in (0..len).rev() {
            self.apply(Command::RemovePolicy { index })?;
        }
        for policy in policies {
            self.apply(Command::AddPolicy(policy))?;
        }
        // An empty list over an empty list still counts as an edit.
        self.dirty = true;
        Ok(())
    }

    /// Replace the wave at a 0-based calendar position.
    pub fn set_wave(&mut self, position: usize, entry: WaveEntry) -> Result<()> {
        let doc = self.document.as_ref().ok_or(Error::NoDocumentLoaded)?;
        let mut waves = doc.wave_data.waves.clone();
        let len = waves.len();
        let slot = waves.get_mut(position).ok_or(Error::IndexOutOfRange {
            index: position,
            len,
        })?;
        *slot = entry;
        self.apply(Command::SetWaves(waves))
    }

    /// 0-based position of the current wave. Stored `0` reads as the first wave.
    pub fn current_wave_position(&self) -> Option<usize> {
        let doc = self.document.as_ref()?;
        wave::to_position(doc.wave_data.wave_number).or(Some(0))
    }

    /// Set the current wave from a 0-based position.
    pub fn set_current_wave_position(&mut self, position: usize) -> Result<()> {
        self.apply(Command::SetWaveNumber(wave::to_stored_index(position)))
    }

    /// 0-based position of the special wave. An unset counter reads as the
    /// game's default special wave.
    pub fn special_wave_position(&self) -> Option<usize> {
        let doc = self.document.as_ref()?;
        wave::to_position(doc.wave_data.special_wave_index)
            .or_else(|| wave::to_position(wave::DEFAULT_SPECIAL_WAVE))
    }

    /// Set the special wave from a 0-based position.
    pub fn set_special_wave_position(&mut self, position: usize) -> Result<()> {
        self.apply(Command::SetSpecialWaveIndex(wave::to_stored_index(position)))
    }

    pub fn set_currency(&mut self, currency: i64) -> Result<()> {
        self.apply(Command::SetWaveData(WaveDataPatch {
            currency: Some(currency),
            ..Default::default()
        }))
    }

    pub fn set_player_king(&mut self, king: Faction) -> Result<()> {
        self.apply(Command::SetKings(KingsPatch {
            player_king: Some(king),
            enemy_kings: None,
        }))
    }

    pub fn set_enemy_kings(&mut self, kings: Vec<Faction>) -> Result<()> {
        self.apply(Command::SetKings(KingsPatch {
            player_king: None,
            enemy_kings: Some(kings),
        }))
    }

    /// Flip whether `king` is in the active kings list.
    ///
    /// The player's own king can't be deactivated: returns `Ok(false)` and
    /// leaves the store untouched.
    pub fn toggle_enemy_king(&mut self, king: Faction) -> Result<bool> {
        let doc = self.document.as_ref().ok_or(Error::NoDocumentLoaded)?;
        if doc.kings.player_king == king {
            return Ok(false);
        }
        let mut kings = doc.kings.enemy_kings.clone();
        match kings.iter().position(|k| *k == king) {
            Some(index) => {
                kings.remove(index);
            }
            None => kings.push(king),
        }
        self.set_enemy_kings(kings)?;
        Ok(true)
    }

    /// Make `king` the player's king and make sure it is also active.
    pub fn select_player_king(&mut self, king: Faction) -> Result<()> {
        let doc = self.document.as_ref().ok_or(Error::NoDocumentLoaded)?;
        let enemy_kings = if doc.kings.enemy_kings.contains(&king) {
            None
        } else {
            let mut kings = doc.kings.enemy_kings.clone();
            kings.push(king);
            Some(kings)
        };
        self.apply(Command::SetKings(KingsPatch {
            player_king: Some(king),
            enemy_kings,
        }))
    }

    /// Append a card to the hand.
    pub fn add_hand_card(&mut self, card: impl Into<String>) -> Result<()> {
        let mut cards = self.hand_cards()?.to_vec();
        cards.push(card.into());
        self.apply(Command::SetHandCards(cards))
    }

    /// Remove the card at `position` and return it.
    pub fn remove_hand_card(&mut self, position: usize) -> Result<String> {
        let mut cards = self.hand_cards()?.to_vec();
        if position >= cards.len() {
            return Err(Error::IndexOutOfRange {
                index: position,
                len: cards.len(),
            });
        }
        let card = cards.remove(position);
        self.apply(Command::SetHandCards(cards))?;
        Ok(card)
    }

    pub fn clear_hand(&mut self) -> Result<()> {
        self.apply(Command::SetHandCards(Vec::new()))
    }

    fn hand_cards(&self) -> Result<&[String]> {
        self.document
            .as_ref()
            .map(|doc| doc.hand_cards.cards.as_slice())
            .ok_or(Error::NoDocumentLoaded)
    }
}
