mod common;

use common::SpyProvider;
use persona_core::db::{open_db_in_memory, SqliteConnectionProvider};
use persona_core::{
    DbConfig, DbError, Person, PersonRepository, PersonValidationError, RepoError,
    SqlitePersonRepository,
};
use std::collections::HashSet;

#[test]
fn insert_then_list_roundtrip_assigns_positive_id() {
    let provider = SpyProvider::new();
    let repo = SqlitePersonRepository::new(&provider);

    let person = Person::new("Ana", "Lopez", "a@x.com", "111");
    assert_eq!(repo.insert(&person, None).unwrap(), 1);

    let persons = repo.list_all(None).unwrap();
    assert_eq!(persons.len(), 1);
    let stored = &persons[0];
    assert!(stored.id.unwrap() > 0);
    assert_eq!(stored.first_name, "Ana");
    assert_eq!(stored.last_name, "Lopez");
    assert_eq!(stored.email, "a@x.com");
    assert_eq!(stored.phone, "111");
}

#[test]
fn insert_ignores_preset_id() {
    let provider = SpyProvider::new();
    let repo = SqlitePersonRepository::new(&provider);

    let person = Person::with_id(42, "Ana", "Lopez", "a@x.com", "111");
    repo.insert(&person, None).unwrap();

    let persons = repo.list_all(None).unwrap();
    assert_eq!(persons[0].id, Some(1));
}

#[test]
fn list_all_on_empty_table_returns_empty_vec() {
    let provider = SpyProvider::new();
    let repo = SqlitePersonRepository::new(&provider);
    assert!(repo.list_all(None).unwrap().is_empty());
}

#[test]
fn list_all_contains_each_inserted_person_once() {
    let provider = SpyProvider::new();
    let repo = SqlitePersonRepository::new(&provider);

    repo.insert(&Person::new("Ana", "Lopez", "a@x.com", "111"), None)
        .unwrap();
    repo.insert(&Person::new("Luis", "Diaz", "l@x.com", "222"), None)
        .unwrap();

    let persons = repo.list_all(None).unwrap();
    assert_eq!(persons.len(), 2);
    let emails: HashSet<&str> = persons.iter().map(|p| p.email.as_str()).collect();
    assert_eq!(emails, HashSet::from(["a@x.com", "l@x.com"]));
    let ids: HashSet<i64> = persons.iter().filter_map(|p| p.id).collect();
    assert_eq!(ids.len(), 2);
}

#[test]
fn update_rewrites_all_mutable_fields() {
    let provider = SpyProvider::new();
    let repo = SqlitePersonRepository::new(&provider);

    repo.insert(&Person::new("Ana", "Lopez", "a@x.com", "111"), None)
        .unwrap();
    let mut stored = repo.list_all(None).unwrap().remove(0);
    stored.first_name = "Ana Maria".to_string();
    stored.last_name = "Lopez Ruiz".to_string();
    stored.email = "am@x.com".to_string();
    stored.phone = "999".to_string();

    assert_eq!(repo.update(&stored, None).unwrap(), 1);
    assert_eq!(repo.list_all(None).unwrap(), vec![stored]);
}

#[test]
fn delete_removes_row() {
    let provider = SpyProvider::new();
    let repo = SqlitePersonRepository::new(&provider);

    repo.insert(&Person::new("Ana", "Lopez", "a@x.com", "111"), None)
        .unwrap();
    let id = repo.list_all(None).unwrap()[0].id.unwrap();

    assert_eq!(repo.delete(&Person::reference(id), None).unwrap(), 1);
    assert!(repo.list_all(None).unwrap().is_empty());
}

#[test]
fn update_and_delete_of_missing_id_affect_zero_rows() {
    let provider = SpyProvider::new();
    let repo = SqlitePersonRepository::new(&provider);

    let ghost = Person::with_id(404, "No", "Body", "n@x.com", "000");
    assert_eq!(repo.update(&ghost, None).unwrap(), 0);
    assert_eq!(repo.delete(&ghost, None).unwrap(), 0);
}

#[test]
fn keyed_writes_without_id_fail_before_touching_storage() {
    let provider = SpyProvider::new();
    let repo = SqlitePersonRepository::new(&provider);

    let unsaved = Person::new("Ana", "Lopez", "a@x.com", "111");
    let err = repo.update(&unsaved, None).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(PersonValidationError::MissingId)
    ));
    let err = repo.delete(&Person::reference(-1), None).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(PersonValidationError::NonPositiveId(-1))
    ));
    assert_eq!(provider.acquired.get(), 0);
}

#[test]
fn owned_connection_is_released_after_each_call() {
    let provider = SpyProvider::new();
    let repo = SqlitePersonRepository::new(&provider);

    repo.insert(&Person::new("Ana", "Lopez", "a@x.com", "111"), None)
        .unwrap();
    repo.list_all(None).unwrap();
    repo.delete(&Person::reference(1), None).unwrap();

    assert_eq!(provider.acquired.get(), 3);
    assert_eq!(provider.released.get(), 3);
}

#[test]
fn owned_connection_is_released_when_statement_fails() {
    let provider = SpyProvider::new();
    let repo = SqlitePersonRepository::new(&provider);

    let oversized = Person::new("A".repeat(46), "Lopez", "a@x.com", "111");
    let err = repo.insert(&oversized, None).unwrap_err();

    assert_eq!(err.operation(), Some("insert"));
    assert!(matches!(
        err,
        RepoError::Storage {
            source: DbError::Sqlite(_),
            ..
        }
    ));
    assert_eq!(provider.acquired.get(), 1);
    assert_eq!(provider.released.get(), 1);
}

#[test]
fn owned_connection_is_released_when_query_fails() {
    let provider = SpyProvider::new();
    provider
        .open_unchecked()
        .execute_batch("DROP TABLE person;")
        .unwrap();
    let repo = SqlitePersonRepository::new(&provider);

    let err = repo.list_all(None).unwrap_err();

    assert!(matches!(
        err,
        RepoError::Storage {
            operation: "list_all",
            ..
        }
    ));
    assert_eq!(provider.acquired.get(), 1);
    assert_eq!(provider.released.get(), 1);
}

#[test]
fn borrowed_connection_is_never_acquired_or_released() {
    let provider = SpyProvider::new();
    let repo = SqlitePersonRepository::new(&provider);
    let conn = open_db_in_memory().unwrap();

    repo.insert(&Person::new("Ana", "Lopez", "a@x.com", "111"), Some(&conn))
        .unwrap();
    let persons = repo.list_all(Some(&conn)).unwrap();
    let mut stored = persons[0].clone();
    stored.phone = "222".to_string();
    repo.update(&stored, Some(&conn)).unwrap();
    repo.delete(&stored, Some(&conn)).unwrap();
    let oversized = Person::new("Ana", "Lopez", "a".repeat(46), "111");
    assert!(repo.insert(&oversized, Some(&conn)).is_err());

    assert_eq!(provider.acquired.get(), 0);
    assert_eq!(provider.released.get(), 0);

    // Still open and usable by its owner.
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM person;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn borrowed_connection_keeps_caller_transaction_open() {
    let provider = SpyProvider::new();
    let repo = SqlitePersonRepository::new(&provider);
    let conn = provider.open_unchecked();

    conn.execute_batch("BEGIN;").unwrap();
    repo.insert(&Person::new("Ana", "Lopez", "a@x.com", "111"), Some(&conn))
        .unwrap();
    assert!(!conn.is_autocommit());
    conn.execute_batch("ROLLBACK;").unwrap();

    assert!(repo.list_all(None).unwrap().is_empty());
}

#[test]
fn acquisition_failure_is_a_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = DbConfig::new(dir.path().join("missing").join("persona.sqlite3"));
    let repo = SqlitePersonRepository::new(SqliteConnectionProvider::new(config));

    let err = repo.list_all(None).unwrap_err();
    assert_eq!(err.operation(), Some("list_all"));
}
