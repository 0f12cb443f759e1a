mod common;

use academy_cms::section::ContentPatch;
use academy_cms::{CmsEditor, EditorOptions, NoticeLevel, Selection};
use common::{abc, loaded_editor, ms, FakeRepository, DELAY};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_edits_in_one_window_send_one_save() {
    let repo = FakeRepository::with_sections(abc());
    let mut editor = loaded_editor(&repo).await;
    editor.select_section(1, || true).unwrap();

    let start = Instant::now();
    for i in 0..5u64 {
        let at = start + ms(i * 100);
        editor
            .update_section(&ContentPatch::title(format!("Title {i}")), at)
            .unwrap();
        editor.tick(at);
    }

    // Last edit at 400ms, so nothing is due before 1400ms
    editor.tick(start + ms(1399));
    editor.settle().await;
    assert!(repo.content_updates().is_empty());

    editor.tick(start + ms(1400));
    editor.settle().await;

    let updates = repo.content_updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].title, "Title 4");
    assert!(!editor.store().is_dirty());
    assert_eq!(editor.store().selected_content().unwrap().version, 2);
}

#[tokio::test]
async fn test_due_save_during_in_flight_save_sends_freshest_state() {
    let repo = FakeRepository::with_sections(abc());
    let mut editor = loaded_editor(&repo).await;
    editor.select_section(2, || true).unwrap();
    repo.hold_updates();

    let start = Instant::now();
    editor.update_section(&ContentPatch::title("first"), start).unwrap();
    editor.tick(start + DELAY);
    assert!(editor.autosave().is_in_flight(200));

    // Two more debounce cycles fire while the first save is held
    let second = start + ms(1500);
    editor.update_section(&ContentPatch::title("second"), second).unwrap();
    editor.tick(second + DELAY);
    let third = start + ms(3000);
    editor.update_section(&ContentPatch::title("third"), third).unwrap();
    editor.tick(third + DELAY);

    repo.release_updates(10);
    editor.settle().await;

    let titles: Vec<_> = repo.content_updates().into_iter().map(|c| c.title).collect();
    assert_eq!(titles, vec!["first", "third"]);
    assert!(!editor.store().is_dirty());
    assert_eq!(repo.server_content(2).unwrap().title, "third");
}

#[tokio::test]
async fn test_autosave_failure_keeps_edits_and_dirty_flag() {
    let repo = FakeRepository::with_sections(abc());
    let mut editor = loaded_editor(&repo).await;
    editor.select_section(1, || true).unwrap();
    repo.fail_updates(true);

    let start = Instant::now();
    editor
        .update_section(&ContentPatch::body("Enrolment is open"), start)
        .unwrap();
    editor.tick(start + DELAY);
    editor.settle().await;

    assert!(editor.store().is_dirty());
    assert_eq!(
        editor.store().selected_content().unwrap().body_content,
        "Enrolment is open"
    );
    let notices = editor.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Warning);
    assert!(notices[0].message.contains("database unavailable"));

    // The next explicit save retries with the same edits
    repo.fail_updates(false);
    editor.save().await.unwrap();
    assert!(!editor.store().is_dirty());
    assert_eq!(repo.server_content(1).unwrap().body_content, "Enrolment is open");
}

#[tokio::test]
async fn test_manual_save_bypasses_timer() {
    let repo = FakeRepository::with_sections(abc());
    let mut editor = loaded_editor(&repo).await;
    editor.select_section(3, || true).unwrap();

    let start = Instant::now();
    editor.update_section(&ContentPatch::title("Gallery"), start).unwrap();
    assert!(editor.autosave().is_pending());

    editor.save().await.unwrap();
    assert!(!editor.autosave().is_pending());
    assert_eq!(repo.content_updates().len(), 1);

    editor.tick(start + DELAY * 2);
    editor.settle().await;
    assert_eq!(repo.content_updates().len(), 1);
}

#[tokio::test]
async fn test_manual_save_failure_is_returned() {
    let repo = FakeRepository::with_sections(abc());
    let mut editor = loaded_editor(&repo).await;
    editor.select_section(3, || true).unwrap();
    editor
        .update_section(&ContentPatch::title("Gallery"), Instant::now())
        .unwrap();
    repo.fail_updates(true);

    let err = editor.save().await.unwrap_err();
    assert!(err.is_network());
    assert!(editor.store().is_dirty());
}

#[tokio::test]
async fn test_navigating_away_cancels_pending_autosave() {
    let repo = FakeRepository::with_sections(abc());
    let mut editor = loaded_editor(&repo).await;
    editor.select_section(1, || true).unwrap();

    let start = Instant::now();
    editor.update_section(&ContentPatch::title("never sent"), start).unwrap();
    assert_eq!(editor.select_section(2, || true).unwrap(), Selection::Selected);

    editor.tick(start + DELAY * 3);
    editor.settle().await;
    assert!(repo.content_updates().is_empty());
    assert_eq!(editor.store().get(1).unwrap().content.as_ref().unwrap().title, "");
}

#[tokio::test]
async fn test_save_resolving_after_deselection_does_not_touch_new_selection() {
    let repo = FakeRepository::with_sections(abc());
    let mut editor = loaded_editor(&repo).await;
    editor.select_section(1, || true).unwrap();
    repo.hold_updates();

    let start = Instant::now();
    editor.update_section(&ContentPatch::title("in flight"), start).unwrap();
    editor.tick(start + DELAY);

    editor.select_section(2, || true).unwrap();
    editor
        .update_section(&ContentPatch::title("new edits"), start + ms(1200))
        .unwrap();

    repo.release_updates(1);
    let completion = editor.next_completion().await.unwrap();
    editor.handle_completion(completion);

    // Section 2 keeps its unsaved edits; section 1 reflects what the server stored
    assert_eq!(editor.store().selected_id(), Some(2));
    assert!(editor.store().is_dirty());
    assert_eq!(editor.store().selected_content().unwrap().title, "new edits");
    assert_eq!(
        editor.store().get(1).unwrap().content.as_ref().unwrap().title,
        "in flight"
    );
}

#[tokio::test]
async fn test_typing_back_during_save_schedules_another_save() {
    let repo = FakeRepository::with_sections(abc());
    let mut editor = loaded_editor(&repo).await;
    editor.select_section(1, || true).unwrap();
    repo.hold_updates();

    let start = Instant::now();
    editor.update_section(&ContentPatch::title("x"), start).unwrap();
    editor.tick(start + DELAY);
    editor
        .update_section(&ContentPatch::title(""), start + ms(1100))
        .unwrap();
    assert!(!editor.store().is_dirty());
    assert!(!editor.autosave().is_pending());

    repo.release_updates(10);
    editor.settle().await;

    // The server now holds "x" while the editor shows ""
    assert!(editor.store().is_dirty());
    assert!(editor.autosave().is_pending());
    assert_eq!(editor.store().selected_content().unwrap().title, "");

    editor.tick(Instant::now() + DELAY);
    editor.settle().await;

    let titles: Vec<_> = repo.content_updates().into_iter().map(|c| c.title).collect();
    assert_eq!(titles, vec!["x", ""]);
    assert_eq!(repo.server_content(1).unwrap().title, "");
    assert!(!editor.store().is_dirty());
}

#[tokio::test]
async fn test_save_landing_after_reload_adopts_server_content() {
    let repo = FakeRepository::with_sections(abc());
    let mut editor = loaded_editor(&repo).await;
    editor.select_section(1, || true).unwrap();
    repo.hold_updates();

    let start = Instant::now();
    editor.update_section(&ContentPatch::title("x"), start).unwrap();
    editor.tick(start + DELAY);

    // Reload sees the server before the held save is stored
    editor.load_sections().await.unwrap();
    assert_eq!(editor.store().selected_content().unwrap().title, "");
    assert!(!editor.store().is_dirty());

    repo.release_updates(10);
    editor.settle().await;

    assert!(!editor.store().is_dirty());
    assert!(!editor.autosave().is_pending());
    assert_eq!(editor.store().selected_content().unwrap().title, "x");

    editor.tick(Instant::now() + DELAY * 60);
    editor.settle().await;
    assert_eq!(repo.content_updates().len(), 1);
    assert_eq!(repo.server_content(1).unwrap().title, "x");
}

#[tokio::test]
async fn test_crashed_autosave_still_reports_back() {
    let repo = FakeRepository::with_sections(abc());
    let mut editor = loaded_editor(&repo).await;
    editor.select_section(2, || true).unwrap();
    repo.panic_updates(true);

    let start = Instant::now();
    editor.update_section(&ContentPatch::title("Programs"), start).unwrap();
    editor.tick(start + DELAY);
    tokio::time::timeout(Duration::from_secs(5), editor.settle())
        .await
        .expect("settle returned");

    assert!(!editor.autosave().is_in_flight(200));
    assert!(editor.store().is_dirty());
    let notices = editor.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Warning);

    repo.panic_updates(false);
    tokio::time::timeout(Duration::from_secs(5), editor.save())
        .await
        .expect("save returned")
        .unwrap();
    assert_eq!(repo.server_content(2).unwrap().title, "Programs");
}

#[tokio::test]
async fn test_idle_editor_saves_after_quiet_period() {
    let repo = FakeRepository::with_sections(abc());
    let mut editor = CmsEditor::new(
        Arc::clone(&repo),
        EditorOptions {
            autosave_delay: ms(50),
            generate_ai_content: false,
        },
    );
    editor.load_sections().await.unwrap();
    editor.select_section(3, || true).unwrap();
    editor
        .update_section(&ContentPatch::title("Gallery"), Instant::now())
        .unwrap();

    // Nothing but the passage of time drives the save
    editor
        .run_until(tokio::time::sleep(ms(500)), ms(10))
        .await;

    assert_eq!(repo.content_updates().len(), 1);
    assert_eq!(repo.server_content(3).unwrap().title, "Gallery");
    assert!(!editor.store().is_dirty());
    assert!(!editor.has_outstanding_work());
}
