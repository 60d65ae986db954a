//! Person repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide list/insert/update/delete over the `person` table.
//! - Decide per call whether the connection is borrowed or owned.
//!
//! # Invariants
//! - A borrowed connection (`Some(conn)`) is used verbatim; the repository
//!   never acquires, commits, rolls back or releases anything for it.
//! - An owned connection is acquired for exactly one statement and released
//!   before the call returns, on success and failure alike.
//! - Storage failures are returned unchanged in meaning; the repository never
//!   retries or recovers.
//! - Zero affected rows on update/delete is a normal result, not an error.

use crate::db::{ConnectionProvider, DbError, ScopedConnection};
use crate::model::person::{Person, PersonValidationError};
use log::{debug, warn};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const PERSON_SELECT_SQL: &str = "SELECT id_persona, nombre, apellido, email, telefono FROM person";
const PERSON_INSERT_SQL: &str =
    "INSERT INTO person(nombre, apellido, email, telefono) VALUES(?, ?, ?, ?)";
const PERSON_UPDATE_SQL: &str =
    "UPDATE person SET nombre=?, apellido=?, email=?, telefono=? WHERE id_persona=?";
const PERSON_DELETE_SQL: &str = "DELETE FROM person WHERE id_persona=?";

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for person persistence operations.
#[derive(Debug)]
pub enum RepoError {
    /// Statement execution or connection acquisition failed.
    Storage {
        operation: &'static str,
        source: DbError,
    },
    /// The person cannot address a row.
    Validation(PersonValidationError),
}

impl RepoError {
    /// Returns the failed operation name for storage errors.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Self::Storage { operation, .. } => Some(operation),
            Self::Validation(_) => None,
        }
    }

    /// Returns whether the failure was a lock-wait timeout.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Storage { source, .. } if source.is_busy())
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage { operation, source } => write!(f, "person {operation} failed: {source}"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage { source, .. } => Some(source),
            Self::Validation(err) => Some(err),
        }
    }
}

impl From<PersonValidationError> for RepoError {
    fn from(value: PersonValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Repository interface for person CRUD operations.
///
/// Every operation takes an optional external connection. Passing
/// `Some(conn)` runs the statement inside whatever transaction the caller
/// holds on `conn`; passing `None` runs it on a short-lived owned connection
/// in auto-commit mode.
pub trait PersonRepository {
    /// Reads every row in storage order (rowid order on SQLite).
    fn list_all(&self, external_conn: Option<&Connection>) -> RepoResult<Vec<Person>>;
    /// Inserts a new row. `person.id` is ignored. Returns affected rows.
    fn insert(&self, person: &Person, external_conn: Option<&Connection>) -> RepoResult<usize>;
    /// Rewrites all mutable fields of the row keyed by `person.id`.
    fn update(&self, person: &Person, external_conn: Option<&Connection>) -> RepoResult<usize>;
    /// Deletes the row keyed by `person.id`.
    fn delete(&self, person: &Person, external_conn: Option<&Connection>) -> RepoResult<usize>;
}

/// SQLite-backed person repository.
pub struct SqlitePersonRepository<P> {
    provider: P,
}

impl<P: ConnectionProvider> SqlitePersonRepository<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    fn with_connection<T>(
        &self,
        operation: &'static str,
        external_conn: Option<&Connection>,
        statement: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> RepoResult<T> {
        let started_at = Instant::now();
        let mode = if external_conn.is_some() {
            "borrowed"
        } else {
            "owned"
        };

        let result = match external_conn {
            Some(conn) => statement(conn).map_err(DbError::from),
            None => ScopedConnection::acquire(&self.provider)
                .and_then(|scoped| statement(scoped.connection()).map_err(DbError::from)),
        };

        result.map_err(|source| {
            warn!(
                "event=person_{} module=repo status=error mode={} duration_ms={} error={}",
                operation,
                mode,
                started_at.elapsed().as_millis(),
                source
            );
            RepoError::Storage { operation, source }
        })
    }
}

impl<P: ConnectionProvider> PersonRepository for SqlitePersonRepository<P> {
    fn list_all(&self, external_conn: Option<&Connection>) -> RepoResult<Vec<Person>> {
        let persons = self.with_connection("list_all", external_conn, |conn| {
            let mut stmt = conn.prepare(PERSON_SELECT_SQL)?;
            let rows = stmt.query_map([], parse_person_row)?;
            let persons = rows.collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(persons)
        })?;

        debug!(
            "event=person_list_all module=repo status=ok rows={}",
            persons.len()
        );
        Ok(persons)
    }

    fn insert(&self, person: &Person, external_conn: Option<&Connection>) -> RepoResult<usize> {
        let changed = self.with_connection("insert", external_conn, |conn| {
            conn.execute(
                PERSON_INSERT_SQL,
                params![
                    person.first_name.as_str(),
                    person.last_name.as_str(),
                    person.email.as_str(),
                    person.phone.as_str(),
                ],
            )
        })?;

        debug!("event=person_insert module=repo status=ok rows={changed}");
        Ok(changed)
    }

    fn update(&self, person: &Person, external_conn: Option<&Connection>) -> RepoResult<usize> {
        let id = person.key()?;
        let changed = self.with_connection("update", external_conn, |conn| {
            conn.execute(
                PERSON_UPDATE_SQL,
                params![
                    person.first_name.as_str(),
                    person.last_name.as_str(),
                    person.email.as_str(),
                    person.phone.as_str(),
                    id,
                ],
            )
        })?;

        debug!("event=person_update module=repo status=ok id={id} rows={changed}");
        Ok(changed)
    }

    fn delete(&self, person: &Person, external_conn: Option<&Connection>) -> RepoResult<usize> {
        let id = person.key()?;
        let changed = self.with_connection("delete", external_conn, |conn| {
            conn.execute(PERSON_DELETE_SQL, [id])
        })?;

        debug!("event=person_delete module=repo status=ok id={id} rows={changed}");
        Ok(changed)
    }
}

fn parse_person_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    Ok(Person {
        id: Some(row.get("id_persona")?),
        first_name: row.get("nombre")?,
        last_name: row.get("apellido")?,
        email: row.get("email")?,
        phone: row.get("telefono")?,
    })
}
