//! Person domain model.
//!
//! # Responsibility
//! - Define the record stored in the `person` table.
//! - Validate the row key required by keyed writes.
//!
//! # Invariants
//! - `id` is assigned by storage on insert and never chosen by callers.
//! - Update and delete require a positive `id`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned row identifier (`person.id_persona`).
pub type PersonId = i64;

/// Rejection reasons for a person used as a keyed write target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonValidationError {
    /// Update/delete was attempted on a person that was never persisted.
    MissingId,
    /// Row ids are positive; anything else cannot match a row.
    NonPositiveId(PersonId),
}

impl Display for PersonValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingId => write!(f, "person id is required for keyed writes"),
            Self::NonPositiveId(id) => write!(f, "person id must be positive, got {id}"),
        }
    }
}

impl Error for PersonValidationError {}

/// One row of the `person` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// `None` until the row is persisted. Ignored by insert.
    pub id: Option<PersonId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl Person {
    /// Creates an unsaved person.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }

    /// Creates a person bound to an existing row.
    pub fn with_id(
        id: PersonId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id),
            ..Self::new(first_name, last_name, email, phone)
        }
    }

    /// Creates a key-only person, enough to address a row for delete.
    pub fn reference(id: PersonId) -> Self {
        Self::with_id(id, "", "", "", "")
    }

    /// Returns the row key, rejecting unsaved or impossible ids.
    pub fn key(&self) -> Result<PersonId, PersonValidationError> {
        match self.id {
            None => Err(PersonValidationError::MissingId),
            Some(id) if id <= 0 => Err(PersonValidationError::NonPositiveId(id)),
            Some(id) => Ok(id),
        }
    }
}

impl Display for Person {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.id {
            Some(id) => write!(f, "#{id} ")?,
            None => write!(f, "#- ")?,
        }
        write!(
            f,
            "{} {} <{}> tel: {}",
            self.first_name, self.last_name, self.email, self.phone
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Person, PersonValidationError};

    #[test]
    fn key_requires_positive_id() {
        assert_eq!(
            Person::new("Ana", "Lopez", "a@x.com", "111").key(),
            Err(PersonValidationError::MissingId)
        );
        assert_eq!(
            Person::reference(0).key(),
            Err(PersonValidationError::NonPositiveId(0))
        );
        assert_eq!(Person::reference(7).key(), Ok(7));
    }

    #[test]
    fn display_is_single_line() {
        let person = Person::with_id(3, "Ana", "Lopez", "a@x.com", "111");
        assert_eq!(person.to_string(), "#3 Ana Lopez <a@x.com> tel: 111");
    }

    #[test]
    fn serializes_with_field_names() {
        let person = Person::new("Ana", "Lopez", "a@x.com", "111");
        let json = serde_json::to_value(&person).unwrap();
        assert_eq!(json["id"], serde_json::Value::Null);
        assert_eq!(json["first_name"], "Ana");
        assert_eq!(json["phone"], "111");
    }
}
