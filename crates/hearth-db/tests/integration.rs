use hearth_db::{open_database, DbRuntimeSettings};

#[test]
fn file_database_is_shared_across_pooled_connections() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("hearth.db");
    let pool = open_database(path.to_str().unwrap(), DbRuntimeSettings::default())
        .expect("failed to open database");

    let first = pool.get().expect("failed to get first connection");
    let second = pool.get().expect("failed to get second connection");

    let mode: String = first
        .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
        .expect("failed to query journal mode");
    assert_eq!(mode, "wal");

    first
        .execute(
            "INSERT INTO room_memberships
                (room_id, user_id, membership, event_id, stream_pos, topological_pos)
             VALUES ('!r', '@u', 'join', '$e', 1, 1)",
            [],
        )
        .expect("failed to insert through first connection");

    let count: i64 = second
        .query_row("SELECT COUNT(*) FROM room_memberships", [], |row| row.get(0))
        .expect("failed to count through second connection");
    assert_eq!(count, 1);
}

#[test]
fn reopening_applies_no_new_migrations() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("hearth.db");
    let path = path.to_str().unwrap();

    drop(open_database(path, DbRuntimeSettings::default()).expect("first open"));
    let pool = open_database(path, DbRuntimeSettings::default()).expect("second open");
    let conn = pool.get().unwrap();

    let recorded: i64 = conn
        .query_row("SELECT COUNT(*) FROM _hearth_migrations", [], |row| row.get(0))
        .unwrap();
    assert_eq!(recorded, 3);
}
