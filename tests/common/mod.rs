#![allow(dead_code)]

use savefold::{
    AreaCell, AreaDetails, CombatStats, Command, DocumentStore, MemoryResource, SaveDocument,
    SyncController, SyncSettings,
};
use serde_json::Value;
use std::time::{Duration, Instant};

pub const SAMPLE_SAVE: &str = include_str!("../fixtures/save.json");

pub const POLL: Duration = Duration::from_millis(1000);
pub const DEBOUNCE: Duration = Duration::from_millis(500);

pub fn sample_bytes() -> Vec<u8> {
    SAMPLE_SAVE.as_bytes().to_vec()
}

pub fn sample_value() -> Value {
    serde_json::from_str(SAMPLE_SAVE).unwrap()
}

pub fn sample_document() -> SaveDocument {
    SaveDocument::parse(SAMPLE_SAVE.as_bytes()).unwrap()
}

/// The sample save with `edit` applied to its JSON tree first.
pub fn sample_with(edit: impl FnOnce(&mut Value)) -> Vec<u8> {
    let mut value = sample_value();
    edit(&mut value);
    serde_json::to_vec_pretty(&value).unwrap()
}

pub fn loaded_store() -> DocumentStore {
    let mut store = DocumentStore::new();
    store.load(SAMPLE_SAVE.as_bytes()).unwrap();
    store
}

pub fn test_settings() -> SyncSettings {
    SyncSettings {
        poll_interval: POLL,
        debounce: DEBOUNCE,
        auto_sync: true,
    }
}

/// A controller bound to an in-memory copy of the sample save, plus a clone
/// of the resource for playing the game's side.
pub fn bound_controller(now: Instant) -> (SyncController<MemoryResource>, MemoryResource) {
    let resource = MemoryResource::new("save", sample_bytes());
    let external = resource.clone();
    let mut controller = SyncController::with_settings(test_settings());
    controller.load_from_resource(resource, now).unwrap();
    (controller, external)
}

pub fn details(level: i64, troops: i64, max_hp: f64, strength: f64) -> AreaDetails {
    AreaDetails {
        card_level: level,
        max_card_level: None,
        troop_quantity: troops,
        entity_size: 1,
        stats: CombatStats {
            max_hp,
            strength,
            ..Default::default()
        },
    }
}

/// Turn the cell at `(x, y)` into an occupied one.
pub fn place_card(cells: &mut [AreaCell], x: i32, y: i32, name: &str, details: &AreaDetails) {
    let cell = cells.iter_mut().find(|c| c.x == x && c.y == y).unwrap();
    cell.has_hole = false;
    cell.is_unlocked = true;
    cell.placed_card_name = name.to_string();
    cell.set_details(details);
}

pub fn set_hand(cards: &[&str]) -> Command {
    Command::SetHandCards(cards.iter().map(|c| c.to_string()).collect())
}
