// tests/history_roundtrip.rs
use offer_curator::{Candidate, HistoryStore};
use std::fs;

#[test]
fn commit_then_reload_is_exact() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("historico_produtos.json");

    let prices = [0.1 + 0.2, 19.99, 1234.5678, 1e-7, 33.333333333333336];
    let mut store = HistoryStore::load(&path).unwrap();
    for (i, p) in prices.iter().enumerate() {
        let c = Candidate::new(1000 + i as u64, format!("Produto ção {i}"), *p);
        store.commit(&c, 1_760_000_000 + i as i64).unwrap();
    }

    let reloaded = HistoryStore::load(&path).unwrap();
    assert_eq!(reloaded.len(), prices.len());
    for (id, entry) in store.iter() {
        assert_eq!(reloaded.get(*id), Some(entry));
    }
}

#[test]
fn flush_rewrites_whole_file_without_tmp_leftovers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("h.json");
    let mut store = HistoryStore::load(&path).unwrap();
    store.commit(&Candidate::new(2, "B", 2.0), 2).unwrap();
    store.commit(&Candidate::new(1, "A", 1.0), 1).unwrap();

    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["h.json".to_string()]);

    // Ids sorted numerically for readable diffs.
    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.find("\"1\"").unwrap() < raw.find("\"2\"").unwrap());
}

#[test]
fn reads_file_written_by_older_bot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("h.json");
    fs::write(
        &path,
        r#"{
  "22334455": { "productName": "Caixa de Som Bluetooth", "priceMin": 89.9, "lastPostedTimestamp": 1719000000 }
}"#,
    )
    .unwrap();

    let store = HistoryStore::load(&path).unwrap();
    let e = store.get(22334455).unwrap();
    assert_eq!(e.name, "Caixa de Som Bluetooth");
    assert_eq!(e.price, 89.9);
    assert_eq!(e.last_posted_at, 1_719_000_000);
}

#[test]
fn detached_store_never_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("h.json");
    let mut store = HistoryStore::load(&path).unwrap().detached();
    store.commit(&Candidate::new(1, "A", 1.0), 1).unwrap();
    assert!(store.contains(1));
    assert!(!path.exists());
}

#[test]
fn one_malformed_entry_does_not_cost_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("historico_produtos.json");
    fs::write(
        &path,
        r#"{
  "111": { "productName": "Fone Bluetooth", "priceMin": 99.9, "lastPostedTimestamp": 1719000000 },
  "222": { "productName": null, "priceMin": "49.90", "lastPostedTimestamp": 1719000100 }
}"#,
    )
    .unwrap();

    let mut store = HistoryStore::load(&path).unwrap();
    assert_eq!(store.len(), 2);
    assert_eq!(store.get(222).unwrap().price, 49.9);

    store
        .commit(&Candidate::new(333, "Air Fryer", 299.0), 1_760_000_000)
        .unwrap();

    let reloaded = HistoryStore::load(&path).unwrap();
    assert!(reloaded.contains(111));
    assert!(reloaded.contains(222));
    assert!(reloaded.contains(333));
    assert_eq!(reloaded.get(111).unwrap().name, "Fone Bluetooth");
}
