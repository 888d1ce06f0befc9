mod common;

use common::{DEBOUNCE, POLL, bound_controller, sample_bytes, sample_with, set_hand, test_settings};
use savefold::{
    Command, Error, MemoryResource, ModifiedStamp, SaveDocument, SaveResource, SyncController,
    SyncSettings, TickReport,
};
use serde_json::json;
use std::time::{Duration, Instant};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn with_currency(currency: i64) -> Vec<u8> {
    sample_with(|v| v["WaveData"]["Currency"] = json!(currency))
}

#[test]
fn test_load_binds_and_starts_polling() {
    let t0 = Instant::now();
    let (controller, _external) = bound_controller(t0);

    assert!(controller.has_resource());
    assert!(controller.is_polling());
    assert!(!controller.persist_pending());
    assert!(!controller.store().is_dirty());
    assert_eq!(controller.last_known_stamp(), Some(ModifiedStamp(1)));
    assert_eq!(controller.next_deadline(), Some(t0 + POLL));
}

#[test]
fn test_load_malformed_does_not_bind() {
    let t0 = Instant::now();
    let mut controller = SyncController::with_settings(test_settings());
    let err = controller
        .load_from_resource(MemoryResource::new("bad", "not a save"), t0)
        .unwrap_err();

    assert!(matches!(err, Error::MalformedSaveData { .. }));
    assert!(!controller.has_resource());
    assert!(!controller.is_polling());
    assert!(controller.document().is_none());
}

#[test]
fn test_load_read_failure_does_not_bind() {
    let t0 = Instant::now();
    let resource = MemoryResource::new("locked", sample_bytes());
    resource.set_failing(true);

    let mut controller = SyncController::with_settings(test_settings());
    let err = controller.load_from_resource(resource, t0).unwrap_err();
    assert!(matches!(err, Error::ResourceAccess(_)));
    assert!(!controller.has_resource());
}

#[test]
fn test_failed_reload_keeps_previous_binding_and_document() {
    let t0 = Instant::now();
    let (mut controller, external) = bound_controller(t0);
    let before = controller.document().cloned();

    let err = controller
        .load_from_resource(MemoryResource::new("other", "[]"), t0)
        .unwrap_err();
    assert!(matches!(err, Error::MalformedSaveData { .. }));
    assert_eq!(controller.document().cloned(), before);
    assert_eq!(controller.resource().unwrap().describe(), external.describe());
}

#[test]
fn test_debounced_persist_fires_after_quiet_period() {
    let t0 = Instant::now();
    let (mut controller, external) = bound_controller(t0);

    controller.apply(set_hand(&["Wall"]), t0).unwrap();
    assert!(controller.persist_pending());
    assert_eq!(controller.tick(t0 + ms(400)), TickReport::default());

    // A second edit inside the window pushes the deadline out.
    controller.apply(set_hand(&["Wall", "Wall"]), t0 + ms(400)).unwrap();
    assert_eq!(controller.tick(t0 + ms(600)), TickReport::default());
    assert_eq!(external.write_count(), 0);

    let report = controller.tick(t0 + ms(400) + DEBOUNCE);
    assert!(report.persisted);
    assert_eq!(external.write_count(), 1);
    assert!(!controller.store().is_dirty());
    assert!(!controller.persist_pending());

    let written = SaveDocument::parse(&external.contents()).unwrap();
    assert_eq!(written.hand_cards.cards, ["Wall", "Wall"]);
    assert_eq!(controller.last_known_stamp(), Some(external.stamp()));
}

#[test]
fn test_own_write_is_not_reloaded() {
    let t0 = Instant::now();
    let (mut controller, external) = bound_controller(t0);

    controller.apply(set_hand(&[]), t0).unwrap();
    assert!(controller.tick(t0 + DEBOUNCE).persisted);

    assert_eq!(controller.tick(t0 + POLL), TickReport::default());
    assert_eq!(external.write_count(), 1);
}

#[test]
fn test_poll_reloads_external_change() {
    let t0 = Instant::now();
    let (mut controller, external) = bound_controller(t0);

    let stamp = external.write_external(with_currency(1));
    assert_eq!(controller.tick(t0 + ms(999)), TickReport::default());

    let report = controller.tick(t0 + POLL);
    assert!(report.reloaded);
    assert!(!report.skipped_dirty);
    assert_eq!(controller.document().unwrap().wave_data.currency, 1);
    assert_eq!(controller.last_known_stamp(), Some(stamp));
    assert!(!controller.store().is_dirty());
    assert_eq!(controller.next_deadline(), Some(t0 + POLL + POLL));
}

#[test]
fn test_poll_skips_external_change_while_dirty() {
    let t0 = Instant::now();
    let (mut controller, external) = bound_controller(t0);

    // The edit lands late enough that its save is still pending at the poll.
    controller.apply(set_hand(&["Mine"]), t0 + ms(900)).unwrap();
    external.write_external(with_currency(1));

    let report = controller.tick(t0 + POLL);
    assert!(report.skipped_dirty);
    assert!(!report.reloaded);
    assert_eq!(controller.last_known_stamp(), Some(ModifiedStamp(1)));
    let doc = controller.document().unwrap();
    assert_eq!(doc.hand_cards.cards, ["Mine"]);
    assert_eq!(doc.wave_data.currency, 120);

    // The local save then overwrites the external change.
    let report = controller.tick(t0 + ms(900) + DEBOUNCE);
    assert!(report.persisted);
    let written = SaveDocument::parse(&external.contents()).unwrap();
    assert_eq!(written.hand_cards.cards, ["Mine"]);
    assert_eq!(written.wave_data.currency, 120);
    assert_eq!(controller.tick(t0 + POLL * 2), TickReport::default());
}

#[test]
fn test_skipped_change_is_retried_every_poll() {
    let t0 = Instant::now();
    let settings = SyncSettings {
        debounce: Duration::from_secs(60),
        ..test_settings()
    };
    let mut controller = SyncController::with_settings(settings);
    let external = MemoryResource::new("save", sample_bytes());
    controller.load_from_resource(external.clone(), t0).unwrap();

    controller.apply(set_hand(&[]), t0).unwrap();
    external.write_external(with_currency(7));

    assert!(controller.tick(t0 + POLL).skipped_dirty);
    assert!(controller.tick(t0 + POLL * 2).skipped_dirty);
    assert_eq!(controller.last_known_stamp(), Some(ModifiedStamp(1)));

    // Discarding the local edits lets the pending change through.
    controller.mark_dirty(false, t0 + POLL * 2).unwrap();
    assert!(!controller.persist_pending());
    let report = controller.tick(t0 + POLL * 3);
    assert!(report.reloaded);
    assert_eq!(controller.document().unwrap().wave_data.currency, 7);
    assert_eq!(controller.document().unwrap().hand_cards.cards.len(), 3);
}

#[test]
fn test_touch_without_content_change_is_not_a_reload() {
    let t0 = Instant::now();
    let (mut controller, external) = bound_controller(t0);

    let stamp = external.touch();
    assert_eq!(controller.tick(t0 + POLL), TickReport::default());
    assert_eq!(controller.last_known_stamp(), Some(stamp));
}

#[test]
fn test_malformed_external_change_is_ignored() {
    let t0 = Instant::now();
    let (mut controller, external) = bound_controller(t0);
    let before = controller.document().cloned();

    external.write_external("{ truncated");
    assert_eq!(controller.tick(t0 + POLL), TickReport::default());
    assert_eq!(controller.document().cloned(), before);
    assert_eq!(controller.last_known_stamp(), Some(ModifiedStamp(1)));
    assert!(controller.is_polling());

    external.write_external(with_currency(3));
    assert!(controller.tick(t0 + POLL * 2).reloaded);
    assert_eq!(controller.document().unwrap().wave_data.currency, 3);
}

#[test]
fn test_io_failure_does_not_stop_polling() {
    let t0 = Instant::now();
    let (mut controller, external) = bound_controller(t0);

    external.set_failing(true);
    assert_eq!(controller.tick(t0 + POLL), TickReport::default());
    assert!(controller.is_polling());
    assert_eq!(controller.next_deadline(), Some(t0 + POLL * 2));

    external.set_failing(false);
    external.write_external(with_currency(2));
    assert!(controller.tick(t0 + POLL * 2).reloaded);
}

#[test]
fn test_failed_auto_save_keeps_dirty() {
    let t0 = Instant::now();
    let (mut controller, external) = bound_controller(t0);

    controller.apply(set_hand(&[]), t0).unwrap();
    external.set_failing(true);

    let report = controller.tick(t0 + DEBOUNCE);
    assert!(!report.persisted);
    assert!(controller.store().is_dirty());

    let err = controller.persist().unwrap_err();
    assert!(matches!(err, Error::ResourceAccess(_)));
    assert!(controller.store().is_dirty());

    external.set_failing(false);
    controller.persist().unwrap();
    assert!(!controller.store().is_dirty());
}

#[test]
fn test_persist_preconditions() {
    let mut controller: SyncController<MemoryResource> = SyncController::new();
    assert!(matches!(controller.persist(), Err(Error::NoDocumentLoaded)));

    controller.load_bytes(&sample_bytes()).unwrap();
    assert!(matches!(controller.persist(), Err(Error::NoFileHandle)));
}

#[test]
fn test_unbound_edits_do_not_schedule() {
    let t0 = Instant::now();
    let mut controller: SyncController<MemoryResource> = SyncController::new();
    controller.load_bytes(&sample_bytes()).unwrap();

    controller.apply(set_hand(&[]), t0).unwrap();
    assert!(controller.store().is_dirty());
    assert!(!controller.persist_pending());
    assert!(!controller.is_polling());
    assert_eq!(controller.next_deadline(), None);

    // Exported elsewhere: clear the flag by hand.
    controller.mark_dirty(false, t0).unwrap();
    assert!(!controller.store().is_dirty());
}

#[test]
fn test_polling_follows_auto_sync_and_binding() {
    let t0 = Instant::now();
    let (mut controller, _external) = bound_controller(t0);

    controller.set_auto_sync(false, t0);
    assert!(!controller.is_polling());
    controller.start_polling(t0);
    assert!(!controller.is_polling());

    controller.set_auto_sync(true, t0);
    assert!(controller.is_polling());

    let resource = controller.unbind_resource();
    assert!(resource.is_some());
    assert!(!controller.is_polling());
    controller.start_polling(t0);
    assert!(!controller.is_polling());
}

#[test]
fn test_start_polling_is_idempotent() {
    let t0 = Instant::now();
    let (mut controller, _external) = bound_controller(t0);

    controller.start_polling(t0 + ms(700));
    assert_eq!(controller.next_deadline(), Some(t0 + POLL));

    controller.stop_polling();
    controller.stop_polling();
    assert!(!controller.is_polling());
    controller.start_polling(t0 + ms(700));
    assert_eq!(controller.next_deadline(), Some(t0 + ms(700) + POLL));
}

#[test]
fn test_stop_polling_keeps_pending_persist() {
    let t0 = Instant::now();
    let (mut controller, external) = bound_controller(t0);

    controller.apply(set_hand(&[]), t0).unwrap();
    controller.stop_polling();
    assert!(controller.persist_pending());

    assert!(controller.tick(t0 + DEBOUNCE).persisted);
    assert_eq!(external.write_count(), 1);
}

#[test]
fn test_disabling_auto_sync_cancels_pending_persist() {
    let t0 = Instant::now();
    let (mut controller, external) = bound_controller(t0);

    controller.apply(set_hand(&[]), t0).unwrap();
    controller.set_auto_sync(false, t0 + ms(100));
    assert!(!controller.persist_pending());
    assert_eq!(controller.tick(t0 + POLL * 3), TickReport::default());
    assert_eq!(external.write_count(), 0);
    assert!(controller.store().is_dirty());

    // Re-enabling with unsaved edits schedules the save again.
    controller.set_auto_sync(true, t0 + POLL * 3);
    assert!(controller.persist_pending());
    assert!(controller.tick(t0 + POLL * 3 + DEBOUNCE).persisted);
}

#[test]
fn test_auto_sync_off_from_the_start() {
    let t0 = Instant::now();
    let mut controller = SyncController::<MemoryResource>::builder()
        .poll_interval(POLL)
        .debounce(DEBOUNCE)
        .auto_sync(false)
        .build();
    let external = MemoryResource::new("save", sample_bytes());
    controller.load_from_resource(external.clone(), t0).unwrap();

    assert!(controller.has_resource());
    assert!(!controller.is_polling());

    controller.apply(set_hand(&[]), t0).unwrap();
    assert!(!controller.persist_pending());
    controller.persist().unwrap();
    assert_eq!(external.write_count(), 1);
}

#[test]
fn test_edit_closure_schedules_persist() {
    let t0 = Instant::now();
    let (mut controller, _external) = bound_controller(t0);

    let index = controller
        .edit(t0, |store| store.add_or_stack_policy("Tithe"))
        .unwrap();
    assert_eq!(index, 0);
    assert!(controller.persist_pending());

    controller
        .edit(t0 + ms(300), |store| store.set_current_wave_position(2))
        .unwrap();
    assert_eq!(controller.next_deadline(), Some(t0 + ms(300) + DEBOUNCE));
}

#[test]
fn test_failed_edit_closure_leaves_store_untouched() {
    let t0 = Instant::now();
    let (mut controller, external) = bound_controller(t0);
    let before = controller.document().cloned();

    let err = controller
        .edit(t0, |store| {
            store.apply(set_hand(&["Lance"]))?;
            store.apply(Command::RemovePolicy { index: 99 })
        })
        .unwrap_err();
    assert!(matches!(err, Error::IndexOutOfRange { index: 99, len: 2 }));
    assert!(!controller.store().is_dirty());
    assert!(!controller.persist_pending());
    assert_eq!(controller.document().cloned(), before);
    assert_eq!(
        controller.document().unwrap().hand_cards.cards,
        ["Archer", "Wall", "Archer"]
    );

    assert_eq!(controller.tick(t0 + ms(10_500)), TickReport::default());
    assert_eq!(external.write_count(), 0);

    // Nothing local is pending, so an external change still gets through.
    external.write_external(with_currency(64));
    let report = controller.tick(t0 + ms(11_600));
    assert!(report.reloaded);
    assert_eq!(controller.document().unwrap().wave_data.currency, 64);
}

#[test]
fn test_check_external_reloads_immediately() {
    let t0 = Instant::now();
    let (mut controller, external) = bound_controller(t0);

    external.write_external(with_currency(55));
    let report = controller.check_external(t0 + ms(10));
    assert!(report.reloaded);
    assert_eq!(controller.document().unwrap().wave_data.currency, 55);
    assert_eq!(controller.next_deadline(), Some(t0 + ms(10) + POLL));

    controller.set_auto_sync(false, t0 + ms(20));
    external.write_external(with_currency(56));
    assert_eq!(
        controller.check_external(t0 + ms(30)),
        TickReport::default()
    );
}

#[test]
fn test_load_bytes_keeps_binding() {
    let t0 = Instant::now();
    let (mut controller, _external) = bound_controller(t0);

    controller.load_bytes(&with_currency(9)).unwrap();
    assert!(controller.has_resource());
    assert!(controller.is_polling());
    assert_eq!(controller.document().unwrap().wave_data.currency, 9);
}

#[test]
fn test_reset_unbinds_and_keeps_auto_sync() {
    let t0 = Instant::now();
    let (mut controller, _external) = bound_controller(t0);
    controller.apply(set_hand(&[]), t0).unwrap();

    controller.reset();
    assert!(controller.document().is_none());
    assert!(!controller.has_resource());
    assert!(!controller.is_polling());
    assert!(!controller.persist_pending());
    assert!(controller.auto_sync());
    assert_eq!(controller.last_known_stamp(), None);
}

#[test]
fn test_default_settings() {
    let settings = SyncSettings::default();
    assert_eq!(settings.poll_interval, Duration::from_secs(1));
    assert_eq!(settings.debounce, Duration::from_millis(500));
    assert!(settings.auto_sync);
}
