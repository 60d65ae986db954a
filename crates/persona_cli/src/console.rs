//! Line-oriented console session.
//!
//! # Responsibility
//! - Prompt for menu choices and field values over any reader/writer pair.
//! - Turn answers into `PersonCommand`s and render their outcomes.
//!
//! # Invariants
//! - Every command runs on the session connection handed in by the caller.
//! - Invalid menu options and ids are reported and the loop continues.
//! - End of input at the menu prompt ends the session normally; end of input
//!   in the middle of a command is an error.

use persona_core::{
    execute_command, MenuChoice, Person, PersonCommand, PersonId, PersonRepository, RepoError,
    MENU_TEXT,
};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{self, BufRead, Write};

#[derive(Debug)]
pub enum SessionError {
    Repo(RepoError),
    Io(io::Error),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "console i/o failed: {err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<RepoError> for SessionError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<io::Error> for SessionError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Console front end bound to one input and one output stream.
pub struct Console<I, O> {
    input: I,
    output: O,
}

impl<I: BufRead, O: Write> Console<I, O> {
    pub fn new(input: I, output: O) -> Self {
        Self { input, output }
    }

    /// Runs the menu loop until the user exits or input ends.
    ///
    /// Returns how many commands were executed.
    pub fn run<R: PersonRepository + ?Sized>(
        &mut self,
        repo: &R,
        conn: &Connection,
    ) -> Result<usize, SessionError> {
        let mut executed = 0;
        loop {
            writeln!(self.output, "{MENU_TEXT}")?;
            let Some(answer) = self.prompt("option")? else {
                break;
            };

            let command = match MenuChoice::parse(&answer) {
                Some(MenuChoice::Exit) => break,
                Some(MenuChoice::List) => PersonCommand::List,
                Some(MenuChoice::Insert) => PersonCommand::Insert(self.read_person(None)?),
                Some(MenuChoice::Update) => match self.read_id("id to update")? {
                    Some(id) => PersonCommand::Update(self.read_person(Some(id))?),
                    None => continue,
                },
                Some(MenuChoice::Delete) => match self.read_id("id to delete")? {
                    Some(id) => PersonCommand::Delete(id),
                    None => continue,
                },
                None => {
                    writeln!(self.output, "invalid option `{}`", answer.trim())?;
                    continue;
                }
            };

            let outcome = execute_command(repo, &command, Some(conn))?;
            writeln!(self.output, "{outcome}")?;
            executed += 1;
        }
        self.output.flush()?;
        Ok(executed)
    }

    fn read_person(&mut self, id: Option<PersonId>) -> Result<Person, SessionError> {
        let first_name = self.require("first name")?;
        let last_name = self.require("last name")?;
        let email = self.require("email")?;
        let phone = self.require("phone")?;
        Ok(Person {
            id,
            first_name,
            last_name,
            email,
            phone,
        })
    }

    fn read_id(&mut self, label: &str) -> Result<Option<PersonId>, SessionError> {
        let answer = self.require(label)?;
        match answer.trim().parse::<PersonId>() {
            Ok(id) => Ok(Some(id)),
            Err(_) => {
                writeln!(self.output, "invalid id `{}`", answer.trim())?;
                Ok(None)
            }
        }
    }

    fn require(&mut self, label: &str) -> Result<String, SessionError> {
        self.prompt(label)?.ok_or_else(|| {
            SessionError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("input ended while reading {label}"),
            ))
        })
    }

    fn prompt(&mut self, label: &str) -> Result<Option<String>, SessionError> {
        write!(self.output, "{label}: ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}
