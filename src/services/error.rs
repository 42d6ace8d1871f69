use std::collections::BTreeMap;
use std::fmt;

use sea_orm::{DbErr, SqlErr};
use serde::Serialize;

/// Validation messages keyed by form field, in the order they were raised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Turns the collected messages into a `Validation` error, or hands back
    /// `value` when nothing was raised.
    pub fn finish<T>(self, value: T) -> StudioResult<T> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(StudioError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not authenticated")]
    Unauthorized,
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),
    #[error("{entity} {id} was changed by another request")]
    ConcurrencyConflict { entity: &'static str, id: i64 },
    #[error("Cannot delete {entity} {id}: {reason}")]
    ReferentialIntegrity {
        entity: &'static str,
        id: i64,
        reason: String,
    },
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

pub type StudioResult<T> = Result<T, StudioError>;

impl StudioError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Classifies a failed delete. The schema restricts deletes of rows that
    /// are still referenced, so a foreign key violation means dependents are
    /// left behind rather than a broken store.
    pub fn from_delete(entity: &'static str, id: i64, err: DbErr) -> Self {
        if matches!(
            err.sql_err(),
            Some(SqlErr::ForeignKeyConstraintViolation(_))
        ) {
            Self::ReferentialIntegrity {
                entity,
                id,
                reason: "other records still reference it".to_string(),
            }
        } else {
            Self::Database(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::EntityTrait;

    use super::*;
    use crate::entities::client;
    use crate::test_utils::{seed_project, test_db};

    #[test]
    fn test_field_errors_finish() {
        let errors = FieldErrors::new();
        assert_eq!(errors.finish(5).unwrap(), 5);

        let mut errors = FieldErrors::new();
        errors.add("pay_rate", "Please choose a Payrate");
        match errors.finish(()) {
            Err(StudioError::Validation(errors)) => {
                assert_eq!(
                    errors.get("pay_rate"),
                    Some(&["Please choose a Payrate".to_string()][..])
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_field_errors_display() {
        let mut errors = FieldErrors::new();
        errors.add("title", "The Title field is required.");
        errors.add("client_id", "Please choose a Client");
        assert_eq!(
            errors.to_string(),
            "client_id: Please choose a Client; title: The Title field is required."
        );
    }

    #[test]
    fn test_from_delete_keeps_other_errors() {
        let err = StudioError::from_delete("Client", 3, DbErr::Custom("disk full".into()));
        assert!(matches!(err, StudioError::Database(_)));

        let err = StudioError::from_delete(
            "Client",
            3,
            DbErr::Custom("FOREIGN KEY constraint failed".into()),
        );
        assert!(matches!(err, StudioError::Database(_)));
    }

    #[tokio::test]
    async fn test_from_delete_classifies_restricted_delete() {
        let db = test_db().await;
        seed_project(&db, "Hey Jude").await;

        let err = client::Entity::delete_by_id(1)
            .exec(&db.conn)
            .await
            .unwrap_err();
        assert!(matches!(
            StudioError::from_delete("Client", 1, err),
            StudioError::ReferentialIntegrity { entity: "Client", id: 1, .. }
        ));
    }
}
