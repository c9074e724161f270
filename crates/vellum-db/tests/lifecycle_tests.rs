//! Integration tests for the versioned note lifecycle.
//!
//! These cover the transactional flows that matter most. Updates must
//! snapshot the pre-update content and deletes must purge the ledger.
//! Restores must back up the current content before rewinding it, and
//! concurrent writers must serialize on the note row lock.
//!
//! **IMPORTANT**: These tests require a migrated PostgreSQL database.
//! Configure it via `DATABASE_URL` and run migrations first:
//! `sqlx migrate run`

use vellum_core::{AppendVersionRequest, Error, NoteRepository, UpdateNoteRequest, VersionRepository};
use vellum_db::test_fixtures::{
    cleanup_note, cleanup_user, create_test_note, create_test_user, test_database,
};
use vellum_db::Database;

async fn setup() -> Database {
    dotenvy::dotenv().ok();
    test_database().await
}

fn update(title: &str, content: &str) -> UpdateNoteRequest {
    UpdateNoteRequest {
        title: title.to_string(),
        content: content.to_string(),
    }
}

#[tokio::test]
#[ignore] // Requires database connection with migrations applied
async fn test_create_leaves_ledger_empty() {
    let db = setup().await;
    let user = create_test_user(&db).await;
    let note = create_test_note(&db, user.id, "Fresh note", "Nothing edited yet").await;

    let versions = db.versions.list(note.id).await.expect("list failed");
    assert!(versions.is_empty());

    cleanup_note(&db, note.id, user.id).await;
    cleanup_user(&db, user.id).await;
}

#[tokio::test]
#[ignore] // Requires database connection with migrations applied
async fn test_update_snapshots_pre_update_content() {
    let db = setup().await;
    let user = create_test_user(&db).await;
    let note = create_test_note(&db, user.id, "Meeting notes", "First draft").await;

    let updated = db
        .lifecycle
        .update(note.id, user.id, update("Meeting notes", "Second draft"))
        .await
        .expect("update failed");

    assert_eq!(updated.content, "Second draft");
    assert!(updated.updated_at_utc > note.updated_at_utc);

    let versions = db.versions.list(note.id).await.expect("list failed");
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].version_number, 1);
    assert_eq!(versions[0].content_snapshot, "First draft");
    assert_eq!(versions[0].editor_id, user.id);

    cleanup_note(&db, note.id, user.id).await;
    cleanup_user(&db, user.id).await;
}

#[tokio::test]
#[ignore] // Requires database connection with migrations applied
async fn test_version_numbers_are_sequential() {
    let db = setup().await;
    let user = create_test_user(&db).await;
    let note = create_test_note(&db, user.id, "Journal", "Day 1").await;

    for content in ["Day 2", "Day 3", "Day 4"] {
        db.lifecycle
            .update(note.id, user.id, update("Journal", content))
            .await
            .expect("update failed");
    }

    let versions = db.versions.list(note.id).await.expect("list failed");
    let numbers: Vec<i32> = versions.iter().map(|v| v.version_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);

    let snapshots: Vec<&str> = versions.iter().map(|v| v.content_snapshot.as_str()).collect();
    assert_eq!(snapshots, vec!["Day 1", "Day 2", "Day 3"]);

    cleanup_note(&db, note.id, user.id).await;
    cleanup_user(&db, user.id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // Requires database connection with migrations applied
async fn test_concurrent_updates_keep_version_numbers_dense() {
    let db = setup().await;
    let user = create_test_user(&db).await;
    let note = create_test_note(&db, user.id, "Contended", "Round 0").await;

    let mut tasks = tokio::task::JoinSet::new();
    for round in 1..=8 {
        let db = db.clone();
        let (note_id, owner_id) = (note.id, user.id);
        tasks.spawn(async move {
            db.lifecycle
                .update(
                    note_id,
                    owner_id,
                    update("Contended", &format!("Round {round}")),
                )
                .await
        });
    }
    while let Some(result) = tasks.join_next().await {
        result.expect("update task panicked").expect("update failed");
    }

    // Racing writers serialize on the note row lock, so the ledger stays
    // dense: every number 1..=8 exactly once. The first snapshot is always
    // the content the note was created with.
    let versions = db.versions.list(note.id).await.expect("list failed");
    let numbers: Vec<i32> = versions.iter().map(|v| v.version_number).collect();
    assert_eq!(numbers, (1..=8).collect::<Vec<i32>>());
    assert_eq!(versions[0].content_snapshot, "Round 0");

    cleanup_note(&db, note.id, user.id).await;
    cleanup_user(&db, user.id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // Requires database connection with migrations applied
async fn test_concurrent_update_and_delete_leave_no_orphans() {
    let db = setup().await;
    let user = create_test_user(&db).await;
    let note = create_test_note(&db, user.id, "Contested", "Current").await;

    let update_db = db.clone();
    let delete_db = db.clone();
    let (note_id, owner_id) = (note.id, user.id);
    let updater = tokio::spawn(async move {
        update_db
            .lifecycle
            .update(note_id, owner_id, update("Contested", "Last words"))
            .await
    });
    let deleter = tokio::spawn(async move { delete_db.lifecycle.delete(note_id, owner_id).await });

    // The pair serializes on the row lock. The delete succeeds in either
    // order; the update either lands before it or finds the note gone.
    deleter
        .await
        .expect("delete task panicked")
        .expect("delete failed");
    match updater.await.expect("update task panicked") {
        Ok(_) | Err(Error::NoteNotFound(_)) => {}
        Err(other) => panic!("unexpected update error: {other:?}"),
    }

    let err = db.notes.fetch(note.id, user.id).await.expect_err("fetch should fail");
    assert!(matches!(err, Error::NoteNotFound(_)));
    let versions = db.versions.list(note.id).await.expect("list failed");
    assert!(versions.is_empty());

    cleanup_user(&db, user.id).await;
}

#[tokio::test]
#[ignore] // Requires database connection with migrations applied
async fn test_restore_backs_up_current_and_rewinds_content() {
    let db = setup().await;
    let user = create_test_user(&db).await;
    let note = create_test_note(&db, user.id, "Title A", "Original").await;

    let edited = db
        .lifecycle
        .update(note.id, user.id, update("Title B", "Edited"))
        .await
        .expect("update failed");

    let restored = db
        .lifecycle
        .restore(note.id, user.id, 1)
        .await
        .expect("restore failed");

    // Content rewinds to the target snapshot; the title survives the restore
    // while the modification timestamp moves forward.
    assert_eq!(restored.content, "Original");
    assert_eq!(restored.title, "Title B");
    assert!(restored.updated_at_utc > edited.updated_at_utc);

    let versions = db.versions.list(note.id).await.expect("list failed");
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[1].version_number, 2);
    assert_eq!(versions[1].content_snapshot, "Edited");

    cleanup_note(&db, note.id, user.id).await;
    cleanup_user(&db, user.id).await;
}

#[tokio::test]
#[ignore] // Requires database connection with migrations applied
async fn test_restore_missing_version_is_version_not_found() {
    let db = setup().await;
    let user = create_test_user(&db).await;
    let note = create_test_note(&db, user.id, "Sparse history", "Only draft").await;

    let err = db
        .lifecycle
        .restore(note.id, user.id, 7)
        .await
        .expect_err("restore should fail");
    assert!(matches!(
        err,
        Error::VersionNotFound {
            version_number: 7,
            ..
        }
    ));

    // The failed restore must not have appended a backup.
    let versions = db.versions.list(note.id).await.expect("list failed");
    assert!(versions.is_empty());

    cleanup_note(&db, note.id, user.id).await;
    cleanup_user(&db, user.id).await;
}

#[tokio::test]
#[ignore] // Requires database connection with migrations applied
async fn test_delete_purges_version_history() {
    let db = setup().await;
    let user = create_test_user(&db).await;
    let note = create_test_note(&db, user.id, "Doomed", "v1").await;

    db.lifecycle
        .update(note.id, user.id, update("Doomed", "v2"))
        .await
        .expect("update failed");
    db.lifecycle
        .update(note.id, user.id, update("Doomed", "v3"))
        .await
        .expect("update failed");

    db.lifecycle
        .delete(note.id, user.id)
        .await
        .expect("delete failed");

    let err = db.notes.fetch(note.id, user.id).await.expect_err("fetch should fail");
    assert!(matches!(err, Error::NoteNotFound(_)));

    let versions = db.versions.list(note.id).await.expect("list failed");
    assert!(versions.is_empty());

    cleanup_user(&db, user.id).await;
}

#[tokio::test]
#[ignore] // Requires database connection with migrations applied
async fn test_cross_owner_access_is_not_found() {
    let db = setup().await;
    let owner = create_test_user(&db).await;
    let intruder = create_test_user(&db).await;
    let note = create_test_note(&db, owner.id, "Private", "Owner only").await;

    let err = db.notes.fetch(note.id, intruder.id).await.expect_err("fetch should fail");
    assert!(matches!(err, Error::NoteNotFound(_)));

    let err = db
        .lifecycle
        .update(note.id, intruder.id, update("Stolen", "Rewritten"))
        .await
        .expect_err("update should fail");
    assert!(matches!(err, Error::NoteNotFound(_)));

    let err = db
        .lifecycle
        .delete(note.id, intruder.id)
        .await
        .expect_err("delete should fail");
    assert!(matches!(err, Error::NoteNotFound(_)));

    // The note is untouched for its real owner.
    let fetched = db.notes.fetch(note.id, owner.id).await.expect("fetch failed");
    assert_eq!(fetched.content, "Owner only");
    let versions = db.versions.list(note.id).await.expect("list failed");
    assert!(versions.is_empty());

    cleanup_note(&db, note.id, owner.id).await;
    cleanup_user(&db, owner.id).await;
    cleanup_user(&db, intruder.id).await;
}

#[tokio::test]
#[ignore] // Requires database connection with migrations applied
async fn test_repo_update_records_no_version() {
    let db = setup().await;
    let user = create_test_user(&db).await;
    let note = create_test_note(&db, user.id, "Raw", "Before").await;

    // The bare repository write bypasses version bookkeeping.
    db.notes
        .update(note.id, user.id, update("Raw", "After"))
        .await
        .expect("update failed");

    let versions = db.versions.list(note.id).await.expect("list failed");
    assert!(versions.is_empty());

    cleanup_note(&db, note.id, user.id).await;
    cleanup_user(&db, user.id).await;
}

#[tokio::test]
#[ignore] // Requires database connection with migrations applied
async fn test_repo_delete_requires_empty_ledger() {
    let db = setup().await;
    let user = create_test_user(&db).await;
    let note = create_test_note(&db, user.id, "Guarded", "Content").await;

    db.versions
        .append(AppendVersionRequest {
            note_id: note.id,
            version_number: 1,
            content_snapshot: "Content".to_string(),
            editor_id: user.id,
        })
        .await
        .expect("append failed");

    // Version rows still reference the note, so the bare delete trips the
    // foreign key.
    let err = db.notes.delete(note.id, user.id).await.expect_err("delete should fail");
    assert!(matches!(err, Error::Database(_)));

    let purged = db.versions.purge(note.id).await.expect("purge failed");
    assert_eq!(purged, 1);

    db.notes.delete(note.id, user.id).await.expect("delete failed");

    cleanup_user(&db, user.id).await;
}

#[tokio::test]
#[ignore] // Requires database connection with migrations applied
async fn test_duplicate_version_number_is_rejected() {
    let db = setup().await;
    let user = create_test_user(&db).await;
    let note = create_test_note(&db, user.id, "Collide", "Content").await;

    let req = AppendVersionRequest {
        note_id: note.id,
        version_number: 1,
        content_snapshot: "Snapshot".to_string(),
        editor_id: user.id,
    };

    db.versions.append(req.clone()).await.expect("first append failed");

    let err = db.versions.append(req).await.expect_err("second append should fail");
    assert!(matches!(
        err,
        Error::DuplicateVersion {
            version_number: 1,
            ..
        }
    ));

    cleanup_note(&db, note.id, user.id).await;
    cleanup_user(&db, user.id).await;
}

#[tokio::test]
#[ignore] // Requires database connection with migrations applied
async fn test_next_version_number_starts_at_one() {
    let db = setup().await;
    let user = create_test_user(&db).await;
    let note = create_test_note(&db, user.id, "Counter", "Content").await;

    let next = db
        .versions
        .next_version_number(note.id)
        .await
        .expect("next failed");
    assert_eq!(next, 1);

    db.versions
        .append(AppendVersionRequest {
            note_id: note.id,
            version_number: next,
            content_snapshot: "Content".to_string(),
            editor_id: user.id,
        })
        .await
        .expect("append failed");

    let next = db
        .versions
        .next_version_number(note.id)
        .await
        .expect("next failed");
    assert_eq!(next, 2);

    cleanup_note(&db, note.id, user.id).await;
    cleanup_user(&db, user.id).await;
}

#[tokio::test]
#[ignore] // Requires database connection with migrations applied
async fn test_edit_history_scenario_end_to_end() {
    let db = setup().await;
    let user = create_test_user(&db).await;
    let note = create_test_note(&db, user.id, "Essay", "Draft 1").await;

    db.lifecycle
        .update(note.id, user.id, update("Essay", "Draft 2"))
        .await
        .expect("update failed");
    db.lifecycle
        .update(note.id, user.id, update("Essay", "Draft 3"))
        .await
        .expect("update failed");

    let restored = db
        .lifecycle
        .restore(note.id, user.id, 1)
        .await
        .expect("restore failed");
    assert_eq!(restored.content, "Draft 1");

    let versions = db.versions.list(note.id).await.expect("list failed");
    let history: Vec<(i32, &str)> = versions
        .iter()
        .map(|v| (v.version_number, v.content_snapshot.as_str()))
        .collect();
    assert_eq!(
        history,
        vec![(1, "Draft 1"), (2, "Draft 2"), (3, "Draft 3")]
    );

    cleanup_note(&db, note.id, user.id).await;
    cleanup_user(&db, user.id).await;
}
