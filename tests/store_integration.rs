//! Integration tests for the record store against a file database.

use std::path::Path;

use futures_util::TryStreamExt;
use mtv_core::feed::{open_feed_file, record_stream};
use mtv_core::store::{LAST_REFRESH, RECORD_COUNT};
use mtv_core::{
    Database, Ledger, LedgerStatus, Record, RecordStore, StatusMarkers, StoreError, WriteLock,
    compile,
};
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    db: Database,
    store: RecordStore,
    markers: StatusMarkers,
    lock: WriteLock,
}

async fn setup() -> Fixture {
    let dir = TempDir::new().expect("failed to create temp dir");
    let db = Database::new(&dir.path().join("filme.sqlite"))
        .await
        .expect("failed to open database");
    let lock = WriteLock::new();
    let markers = StatusMarkers::new(db.clone(), lock.clone());
    let store = RecordStore::new(db.clone(), markers.clone());
    Fixture {
        _dir: dir,
        db,
        store,
        markers,
        lock,
    }
}

fn fixture_reader() -> Box<dyn std::io::BufRead + Send> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/feed.json");
    open_feed_file(&path).expect("fixture should open")
}

async fn load_fixture(store: &RecordStore) {
    let summary = store
        .refresh(record_stream(fixture_reader()))
        .await
        .expect("refresh should succeed");
    assert_eq!(summary.stored, 5);
}

fn titles(records: &[Record]) -> Vec<&str> {
    records.iter().map(|record| record.title.as_str()).collect()
}

#[tokio::test]
async fn test_reconstruct_persist_find_round_trip() {
    let fixture = setup().await;
    load_fixture(&fixture.store).await;

    let mut expected: Vec<Record> = record_stream(fixture_reader()).try_collect().await.unwrap();
    let query = compile::<&str>(&[]).unwrap();
    let mut found: Vec<Record> = fixture.store.find(&query).try_collect().await.unwrap();

    expected.sort_by_key(Record::id);
    found.sort_by_key(Record::id);
    assert_eq!(found, expected);
}

#[tokio::test]
async fn test_search_keyword_and_date_range() {
    let fixture = setup().await;
    load_fixture(&fixture.store).await;

    let records = fixture
        .store
        .search(&["sender:ARD", "und", "datum:01.01.23-31.01.23"])
        .await
        .unwrap();

    let mut found = titles(&records);
    found.sort_unstable();
    assert_eq!(found, ["Borowski und das Meer", "Der Fall Holdt"]);
}

#[tokio::test]
async fn test_search_free_text_or() {
    let fixture = setup().await;
    load_fixture(&fixture.store).await;

    let records = fixture.store.search(&["katze", "kulturzeit"]).await.unwrap();

    let mut found = titles(&records);
    found.sort_unstable();
    assert_eq!(found, ["Katzen und Hunde", "Kulturzeit vom 01.02.2023"]);
}

#[tokio::test]
async fn test_search_date_comparison() {
    let fixture = setup().await;
    load_fixture(&fixture.store).await;

    let records = fixture.store.search(&["datum:>=01.02.2023"]).await.unwrap();

    let mut found = titles(&records);
    found.sort_unstable();
    assert_eq!(found, ["Katzen und Hunde", "Kulturzeit vom 01.02.2023"]);
}

#[tokio::test]
async fn test_search_group_then_connective() {
    let fixture = setup().await;
    load_fixture(&fixture.store).await;

    let records = fixture
        .store
        .search(&["(", "sender:ARD", "oder", "sender:ZDF", ")", "und", "datum:>=01.02.2023"])
        .await
        .unwrap();

    assert_eq!(titles(&records), ["Katzen und Hunde"]);
}

#[tokio::test]
async fn test_search_connective_then_group() {
    let fixture = setup().await;
    load_fixture(&fixture.store).await;

    let records = fixture
        .store
        .search(&["thema:Tatort", "und", "(", "titel:Holdt", "oder", "titel:Borowski", ")"])
        .await
        .unwrap();

    let mut found = titles(&records);
    found.sort_unstable();
    assert_eq!(found, ["Borowski und das Meer", "Der Fall Holdt"]);
}

#[tokio::test]
async fn test_search_free_text_group_narrowed_by_keyword() {
    let fixture = setup().await;
    load_fixture(&fixture.store).await;

    let records = fixture
        .store
        .search(&["(", "katze", "oder", "kulturzeit", ")", "und", "sender:3sat"])
        .await
        .unwrap();

    assert_eq!(titles(&records), ["Kulturzeit vom 01.02.2023"]);
}

#[tokio::test]
async fn test_search_raw_select_escape_hatch() {
    let fixture = setup().await;
    load_fixture(&fixture.store).await;

    let records = fixture
        .store
        .search(&["SELECT", "*", "FROM", "records", "WHERE", "topic", "=", "'Terra X'"])
        .await
        .unwrap();

    assert_eq!(titles(&records), ["Katzen und Hunde"]);
}

#[tokio::test]
async fn test_search_with_quote_in_value() {
    let fixture = setup().await;
    load_fixture(&fixture.store).await;

    let records = fixture.store.search(&["titel:it's"]).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_refresh_writes_markers() {
    let fixture = setup().await;
    load_fixture(&fixture.store).await;

    let markers = fixture
        .markers
        .get(&[LAST_REFRESH, RECORD_COUNT])
        .await
        .unwrap();

    assert_eq!(markers.len(), 2);
    assert_eq!(markers[0].key, LAST_REFRESH);
    assert_eq!(markers[1].key, RECORD_COUNT);
    assert_eq!(markers[1].text.as_deref(), Some("5"));
}

#[tokio::test]
async fn test_store_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("filme.sqlite");
    {
        let db = Database::new(&db_path).await.unwrap();
        let store = RecordStore::new(db.clone(), StatusMarkers::new(db.clone(), WriteLock::new()));
        load_fixture(&store).await;
        db.close().await;
    }

    let db = Database::new(&db_path).await.unwrap();
    let store = RecordStore::new(db.clone(), StatusMarkers::new(db, WriteLock::new()));
    let records = store.search(&["thema:tatort"]).await.unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_malformed_feed_empties_table_but_keeps_ledger() {
    let fixture = setup().await;
    load_fixture(&fixture.store).await;

    let ledger = Ledger::new(fixture.db.clone(), fixture.lock.clone());
    let marked = fixture.store.search(&["thema:Tatort"]).await.unwrap();
    ledger
        .mark_pending(&marked, chrono::NaiveDate::from_ymd_opt(2023, 2, 1).unwrap())
        .await
        .unwrap();

    let broken = std::io::Cursor::new(br#"[["ARD","Tatort""#.to_vec());
    let result = fixture.store.refresh(record_stream(broken)).await;
    assert!(matches!(result, Err(StoreError::Feed(_))));

    let remaining = fixture.store.search::<&str>(&[]).await.unwrap();
    assert!(remaining.is_empty());
    for record in &marked {
        assert_eq!(
            ledger.get(record).await.unwrap().map(|entry| entry.status),
            Some(LedgerStatus::Pending)
        );
    }
}
