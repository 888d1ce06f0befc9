mod common;

use common::loaded_store;
use proptest::prelude::*;
use savefold::area::{self, CELL_COUNT};
use savefold::wave;
use savefold::{
    Accessibility, AreaCell, AreaDetails, CombatStats, Command, ConstructionMode, Faction, Policy,
    SaveDocument,
};
use std::collections::HashSet;

fn arb_mode() -> impl Strategy<Value = ConstructionMode> {
    prop_oneof![Just(ConstructionMode::Add), Just(ConstructionMode::Remove)]
}

// Quarter steps serialize and parse back exactly.
fn arb_stat() -> impl Strategy<Value = f64> {
    (0u32..4000).prop_map(|n| f64::from(n) / 4.0)
}

fn arb_details() -> impl Strategy<Value = AreaDetails> {
    (
        0i64..10,
        proptest::option::of(1i64..10),
        0i64..20,
        1i64..4,
        arb_stat(),
        arb_stat(),
        arb_stat(),
    )
        .prop_map(|(level, max, troops, size, hp, strength, crit)| AreaDetails {
            card_level: level,
            max_card_level: max,
            troop_quantity: troops,
            entity_size: size,
            stats: CombatStats {
                max_hp: hp,
                strength,
                crit_multiplier: crit,
                ..Default::default()
            },
        })
}

fn arb_command() -> impl Strategy<Value = Command> {
    prop_oneof![
        4 => (-3i32..=3, -3i32..=3, arb_mode())
            .prop_map(|(x, y, mode)| Command::ApplyConstructionAction { x, y, mode }),
        2 => (-3i32..=3, -3i32..=3, arb_details())
            .prop_map(|(x, y, details)| Command::SetAreaDetails { x, y, details }),
        1 => proptest::collection::vec("[A-Z][a-z]{2,6}", 0..5).prop_map(Command::SetHandCards),
        1 => ("[A-Z][a-z]{2,6}", 1u32..5)
            .prop_map(|(name, stacks)| Command::AddPolicy(Policy::new(name, stacks))),
        1 => (0usize..4).prop_map(|index| Command::RemovePolicy { index }),
        1 => (0i64..40).prop_map(Command::SetWaveNumber),
    ]
}

fn assert_grid_complete(doc: &SaveDocument) {
    assert_eq!(doc.areas.len(), CELL_COUNT);
    let coords: HashSet<(i32, i32)> = doc.areas.iter().map(AreaCell::coordinate).collect();
    assert_eq!(coords.len(), CELL_COUNT);
    assert!(coords.iter().all(|&(x, y)| area::in_grid(x, y)));
}

fn assert_state_matches_fields(cell: &AreaCell) {
    let expected = match (cell.has_hole, cell.placed_card_name.is_empty(), cell.is_unlocked) {
        (true, _, _) => Accessibility::Hole,
        (false, false, _) => Accessibility::Occupied,
        (false, true, true) => Accessibility::Accessible,
        (false, true, false) => Accessibility::Inaccessible,
    };
    assert_eq!(cell.accessibility(), expected);
}

// Any sequence of edits keeps the grid whole, keeps every cell in exactly
// one state, and serializes to something that parses back to the same
// document.
proptest! {
    #[test]
    fn prop_edits_preserve_document_shape(commands in proptest::collection::vec(arb_command(), 0..40)) {
        let mut store = loaded_store();

        for command in commands {
            let before = store.document().cloned();
            let was_dirty = store.is_dirty();
            match store.apply(command) {
                Ok(()) => {
                    prop_assert!(store.is_dirty());
                }
                Err(_) => {
                    prop_assert_eq!(store.document().cloned(), before);
                    prop_assert_eq!(store.is_dirty(), was_dirty);
                }
            }

            let doc = store.document().unwrap();
            assert_grid_complete(doc);
            for cell in &doc.areas {
                assert_state_matches_fields(cell);
            }
        }

        let doc = store.document().unwrap();
        let reparsed = SaveDocument::parse(&store.serialize().unwrap()).unwrap();
        prop_assert_eq!(&reparsed, doc);
    }
}

// Add then Remove on a cell that was inaccessible returns it to inaccessible;
// Remove then Add on an accessible, empty cell returns it to accessible.
proptest! {
    #[test]
    fn prop_construction_steps_are_reversible_mid_cycle(x in -2i32..=2, y in -2i32..=2) {
        let mut cell = AreaCell::new(x, y);
        prop_assert!(cell.apply_construction(ConstructionMode::Add));
        prop_assert!(cell.apply_construction(ConstructionMode::Remove));
        prop_assert_eq!(cell.accessibility(), Accessibility::Inaccessible);

        cell.is_unlocked = true;
        prop_assert!(cell.apply_construction(ConstructionMode::Remove));
        prop_assert!(cell.apply_construction(ConstructionMode::Add));
        prop_assert_eq!(cell.accessibility(), Accessibility::Accessible);
    }
}

proptest! {
    #[test]
    fn prop_faction_id_decodes_only_single_flags(id in -1024i64..1024) {
        let expected = (1..=256).contains(&id) && (id & (id - 1)) == 0;
        prop_assert_eq!(Faction::from_id(id).is_some(), expected);
        if let Some(faction) = Faction::from_id(id) {
            prop_assert_eq!(i64::from(faction.id()), id);
        }
    }
}

proptest! {
    #[test]
    fn prop_wave_position_conversion_inverts(position in 0usize..10_000) {
        let stored = wave::to_stored_index(position);
        prop_assert_eq!(stored, position as i64 + 1);
        prop_assert_eq!(wave::to_position(stored), Some(position));
    }
}
