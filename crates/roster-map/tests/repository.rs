use roster_map::{ConfirmedMapping, MappingRepository, StoredMapping};
use roster_model::ColumnMapping;

fn sample(event_id: &str) -> ConfirmedMapping {
    ConfirmedMapping::from_mappings(
        event_id,
        &[
            ColumnMapping::manual("First", 0, "first_name"),
            ColumnMapping::manual("Last", 1, "last_name"),
            ColumnMapping::unmapped("Shoe Size", 2),
        ],
    )
}

#[test]
fn save_load_delete_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let repo = MappingRepository::new(dir.path().join("mappings")).expect("repo");

    assert!(!repo.exists("spring-combine"));
    assert!(repo.load("spring-combine").expect("load").is_none());

    let path = repo.save(&sample("spring-combine")).expect("save");
    assert!(path.ends_with("spring_combine.json"));
    assert!(repo.exists("spring-combine"));

    let loaded = repo.load("spring-combine").expect("load").expect("present");
    assert_eq!(loaded, sample("spring-combine"));

    let stored = repo
        .load_stored("spring-combine")
        .expect("load stored")
        .expect("present");
    assert_eq!(stored.version, "1.0");
    assert!(stored.saved_at.is_some());

    assert!(repo.delete("spring-combine").expect("delete"));
    assert!(!repo.delete("spring-combine").expect("delete again"));
}

#[test]
fn list_sorts_and_skips_foreign_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let repo = MappingRepository::new(dir.path()).expect("repo");
    repo.save_stored(&StoredMapping::new(sample("b-event")).with_description("second"))
        .expect("save b");
    repo.save(&sample("a-event")).expect("save a");
    std::fs::write(dir.path().join("notes.json"), "not json").expect("write junk");
    std::fs::write(dir.path().join("readme.txt"), "hello").expect("write txt");

    let listed = repo.list().expect("list");
    let ids: Vec<_> = listed.iter().map(|m| m.event_id.as_str()).collect();
    assert_eq!(ids, vec!["a-event", "b-event"]);
    assert_eq!(listed[0].mapping_count, 2);
    assert_eq!(listed[0].unmapped_count, 1);
}
