//! Load a save, edit it through commands, and write it back with backups.
//!
//! Pass a path to edit a real save file; without one, a sample save is
//! copied into a temporary directory first.

use savefold::archive;
use savefold::{Command, ConstructionMode, Faction, FileResource, SyncController};
use std::path::PathBuf;
use std::time::Instant;

const SAMPLE: &str = include_str!("../tests/fixtures/save.json");

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = match std::env::args().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => {
            let path = dir.path().join("save.json");
            std::fs::write(&path, SAMPLE)?;
            path
        }
    };
    let backups = path.with_extension("bak.zst");

    let mut controller = SyncController::<FileResource>::builder().auto_sync(false).build();
    let now = Instant::now();
    controller.load_from_resource(FileResource::new(&path).with_backups(&backups), now)?;
    print_summary("Loaded", &controller);

    controller.apply(
        Command::ApplyConstructionAction {
            x: 2,
            y: 2,
            mode: ConstructionMode::Add,
        },
        now,
    )?;
    controller.edit(now, |store| {
        store.set_currency(500)?;
        store.set_player_king(Faction::Nature)?;
        store.add_or_stack_policy("Tithe")?;
        Ok(())
    })?;
    print_summary("Edited", &controller);

    controller.persist()?;
    println!("\nSaved {}", path.display());
    for backup in archive::read_backups(&backups)? {
        println!(
            "  backup at {} ms ({} bytes)",
            backup.replaced_at,
            backup.content.len()
        );
    }

    Ok(())
}

fn print_summary(label: &str, controller: &SyncController<FileResource>) {
    let store = controller.store();
    let Some(doc) = store.document() else {
        return;
    };
    println!("{label}:");
    println!("  king:     {}", doc.kings.player_king);
    println!("  currency: {}", doc.wave_data.currency);
    if let Some(stats) = store.statistics() {
        println!(
            "  cards:    {} (power {}, avg level {:.1})",
            stats.total_cards, stats.power_rating, stats.average_level
        );
        println!("  holes:    {}", stats.plot_holes);
    }
    for (name, stacks) in store.policy_effects() {
        println!("  decree:   {name} x{stacks}");
    }
    println!("  dirty:    {}", store.is_dirty());
}
