//! Keep a save in sync while "the game" rewrites it underneath.
//!
//! A background thread plays the game: it rewrites the save file twice.
//! The sync worker picks up each change, and a local edit is written back
//! after the debounce.

use savefold::{driver, FileResource, SyncController};
use std::fs;
use std::thread;
use std::time::Duration;

const SAMPLE: &str = include_str!("../tests/fixtures/save.json");

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("save.json");
    fs::write(&path, SAMPLE)?;

    let controller = SyncController::<FileResource>::builder()
        .poll_interval(Duration::from_millis(250))
        .debounce(Duration::from_millis(200))
        .build();
    let handle = driver::spawn(controller)?;
    handle.load(FileResource::new(&path))?;
    println!("Watching {}", path.display());

    let game_path = path.clone();
    let game = thread::spawn(move || {
        for currency in [300, 450] {
            thread::sleep(Duration::from_millis(1200));
            let body = SAMPLE.replace("\"Currency\": 120", &format!("\"Currency\": {currency}"));
            fs::write(&game_path, body).unwrap();
            println!("[game] wrote currency {currency}");
        }
    });

    for _ in 0..12 {
        thread::sleep(Duration::from_millis(250));
        let status = handle.status()?;
        if let Some(doc) = &status.document {
            println!(
                "[editor] currency {} dirty={} polling={}",
                doc.wave_data.currency, status.dirty, status.polling
            );
        }
    }
    game.join().unwrap();

    handle.edit(|store| store.set_currency(9999))?;
    thread::sleep(Duration::from_millis(600));
    let status = handle.status()?;
    println!("\nAfter local edit: dirty={}", status.dirty);
    println!("On disk: {}", fs::read_to_string(&path)?.contains("9999"));

    handle.shutdown()?;
    Ok(())
}
