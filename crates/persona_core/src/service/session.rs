//! Interface-agnostic command dispatch for interactive person management.
//!
//! # Responsibility
//! - Model menu choices and CRUD commands independently of any I/O.
//! - Route commands to the repository on a caller-chosen connection.
//!
//! # Invariants
//! - Commands run strictly in the order given.
//! - A failing command stops the batch; later commands never run.
//! - Zero affected rows is reported as an outcome, never as an error.

use crate::db::ConnectionProvider;
use crate::model::person::{Person, PersonId};
use crate::repo::person_repo::{PersonRepository, RepoResult};
use crate::service::transaction::{TransactionRunner, TxResult};
use rusqlite::Connection;
use std::fmt::{Display, Formatter};

/// Menu text shown by interactive front ends.
pub const MENU_TEXT: &str = "1. List persons\n\
2. Insert person\n\
3. Update person\n\
4. Delete person\n\
5. Exit";

/// One entry of the interactive menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    List,
    Insert,
    Update,
    Delete,
    Exit,
}

impl MenuChoice {
    /// Parses the numeric menu option, ignoring surrounding whitespace.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::List),
            "2" => Some(Self::Insert),
            "3" => Some(Self::Update),
            "4" => Some(Self::Delete),
            "5" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// A single data-access request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonCommand {
    List,
    Insert(Person),
    Update(Person),
    Delete(PersonId),
}

/// Result of one executed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Listed(Vec<Person>),
    Inserted(usize),
    Updated { id: PersonId, rows: usize },
    Deleted { id: PersonId, rows: usize },
}

impl CommandOutcome {
    /// Returns affected rows for write commands.
    pub fn affected_rows(&self) -> Option<usize> {
        match self {
            Self::Listed(_) => None,
            Self::Inserted(rows) => Some(*rows),
            Self::Updated { rows, .. } | Self::Deleted { rows, .. } => Some(*rows),
        }
    }

    /// Returns whether a keyed write matched no row.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Updated { rows: 0, .. } | Self::Deleted { rows: 0, .. }
        )
    }
}

impl Display for CommandOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Listed(persons) if persons.is_empty() => write!(f, "no persons"),
            Self::Listed(persons) => {
                for (index, person) in persons.iter().enumerate() {
                    if index > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{person}")?;
                }
                Ok(())
            }
            Self::Inserted(rows) => write!(f, "inserted rows: {rows}"),
            Self::Updated { id, rows: 0 } | Self::Deleted { id, rows: 0 } => {
                write!(f, "no person with id {id}")
            }
            Self::Updated { rows, .. } => write!(f, "updated rows: {rows}"),
            Self::Deleted { rows, .. } => write!(f, "deleted rows: {rows}"),
        }
    }
}

/// Executes one command against `repo`.
///
/// `conn` is forwarded as the external connection, so `None` runs the
/// command on its own auto-committed connection.
pub fn execute_command<R: PersonRepository + ?Sized>(
    repo: &R,
    command: &PersonCommand,
    conn: Option<&Connection>,
) -> RepoResult<CommandOutcome> {
    match command {
        PersonCommand::List => repo.list_all(conn).map(CommandOutcome::Listed),
        PersonCommand::Insert(person) => repo.insert(person, conn).map(CommandOutcome::Inserted),
        PersonCommand::Update(person) => {
            let id = person.key()?;
            let rows = repo.update(person, conn)?;
            Ok(CommandOutcome::Updated { id, rows })
        }
        PersonCommand::Delete(id) => {
            let rows = repo.delete(&Person::reference(*id), conn)?;
            Ok(CommandOutcome::Deleted { id: *id, rows })
        }
    }
}

/// Executes `commands` in order as one transaction.
///
/// Either every command's effect is committed and all outcomes are
/// returned, or the first failure is returned and nothing is committed.
pub fn run_commands<P, R>(
    runner: &TransactionRunner<P>,
    repo: &R,
    commands: &[PersonCommand],
) -> TxResult<Vec<CommandOutcome>>
where
    P: ConnectionProvider,
    R: PersonRepository + ?Sized,
{
    runner.run(|conn| {
        commands
            .iter()
            .map(|command| execute_command(repo, command, Some(conn)))
            .collect()
    })
}
