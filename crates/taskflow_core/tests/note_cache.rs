use taskflow_core::db::open_db_in_memory;
use taskflow_core::{
    DueDate, Identity, NoteId, NoteResult, NoteResultCache, RepoError, Session,
    SessionRepository, SqliteNoteResultCache, SqliteSessionRepository, TaskProposal,
};

fn note(id: &str, summary: &str) -> NoteResult {
    NoteResult {
        note_id: NoteId::new(id),
        original_text: format!("raw notes for {id}"),
        summary: summary.to_string(),
        extracted_tasks: vec![
            TaskProposal::new("Send deck", Some(DueDate::parse("2025-06-01").unwrap())),
            TaskProposal::new("Book room", None),
        ],
        created_at: Some("2025-05-30T09:00:00Z".to_string()),
    }
}

#[test]
fn cached_note_reads_back_with_its_proposals() {
    let conn = open_db_in_memory().unwrap();
    let cache = SqliteNoteResultCache::new(&conn);

    cache.put(&note("n1", "Sync")).unwrap();
    let loaded = cache.get(&NoteId::new("n1")).unwrap().unwrap();

    assert_eq!(loaded.summary, "Sync");
    assert_eq!(loaded.original_text, "raw notes for n1");
    assert_eq!(loaded.extracted_tasks.len(), 2);
    assert_eq!(loaded.extracted_tasks[0].description, "Send deck");
    assert_eq!(
        loaded.extracted_tasks[0].due_date,
        Some(DueDate::parse("2025-06-01").unwrap())
    );
    assert_eq!(loaded.extracted_tasks[1].due_date, None);
    assert!(cache.get(&NoteId::new("missing")).unwrap().is_none());
}

#[test]
fn recaching_a_note_replaces_its_payload() {
    let conn = open_db_in_memory().unwrap();
    let cache = SqliteNoteResultCache::new(&conn);

    cache.put(&note("n1", "first")).unwrap();
    cache.put(&note("n1", "second")).unwrap();

    assert_eq!(cache.len().unwrap(), 1);
    assert_eq!(
        cache.get(&NoteId::new("n1")).unwrap().unwrap().summary,
        "second"
    );
}

#[test]
fn full_cache_rejects_new_keys_without_evicting() {
    let conn = open_db_in_memory().unwrap();
    let cache = SqliteNoteResultCache::with_capacity(&conn, 2);
    cache.put(&note("n1", "one")).unwrap();
    cache.put(&note("n2", "two")).unwrap();

    let err = cache.put(&note("n3", "three")).unwrap_err();
    assert!(matches!(err, RepoError::CacheFull { capacity: 2 }));
    assert!(cache.get(&NoteId::new("n1")).unwrap().is_some());
    assert!(cache.get(&NoteId::new("n3")).unwrap().is_none());

    // Existing keys can still be refreshed at capacity.
    cache.put(&note("n2", "two again")).unwrap();
    assert_eq!(cache.len().unwrap(), 2);
}

#[test]
fn remove_and_clear_free_capacity() {
    let conn = open_db_in_memory().unwrap();
    let cache = SqliteNoteResultCache::with_capacity(&conn, 2);
    cache.put(&note("n1", "one")).unwrap();
    cache.put(&note("n2", "two")).unwrap();

    assert!(cache.remove(&NoteId::new("n1")).unwrap());
    assert!(!cache.remove(&NoteId::new("n1")).unwrap());
    cache.put(&note("n3", "three")).unwrap();

    assert_eq!(cache.clear().unwrap(), 2);
    assert_eq!(cache.len().unwrap(), 0);
}

#[test]
fn zero_capacity_is_raised_to_one() {
    let conn = open_db_in_memory().unwrap();
    let cache = SqliteNoteResultCache::with_capacity(&conn, 0);
    assert_eq!(cache.capacity(), 1);
    cache.put(&note("n1", "one")).unwrap();
}

#[test]
fn session_slot_saves_replaces_and_clears() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSessionRepository::new(&conn);
    assert!(repo.load().unwrap().is_none());

    let mut session = Session {
        access_token: "at-1".to_string(),
        refresh_token: Some("rt-1".to_string()),
        expires_at: 1_750_000_000,
        identity: Identity {
            user_id: "user-1".to_string(),
            email: Some("ada@example.com".to_string()),
        },
    };
    repo.save(&session).unwrap();
    session.access_token = "at-2".to_string();
    repo.save(&session).unwrap();

    assert_eq!(repo.load().unwrap(), Some(session));

    repo.clear().unwrap();
    assert!(repo.load().unwrap().is_none());
}
