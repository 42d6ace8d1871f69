use std::cmp::Ordering;

use sea_orm::{ConnectionTrait, DbErr, EntityTrait};

use crate::services::error::FieldErrors;
use crate::services::scope::{self, Owned};

/// Trims `value` and records "The {label} field is required." when nothing is left.
pub fn required(errors: &mut FieldErrors, field: &str, label: &str, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, format!("The {label} field is required."));
    }
    trimmed.to_string()
}

/// Length is counted in characters, not bytes.
pub fn max_chars(errors: &mut FieldErrors, field: &str, value: &str, max: usize, message: &str) {
    if value.chars().count() > max {
        errors.add(field, message);
    }
}

/// Values that cannot be compared with `min` (NaN) fail as well.
pub fn at_least<T: PartialOrd>(errors: &mut FieldErrors, field: &str, value: T, min: T, message: &str) {
    if !matches!(
        value.partial_cmp(&min),
        Some(Ordering::Greater | Ordering::Equal)
    ) {
        errors.add(field, message);
    }
}

/// Checks a single-valued choice against an unscoped lookup table.
///
/// `0` is what the form sends for "nothing chosen" and fails like any unknown id.
pub async fn lookup<E>(
    db: &impl ConnectionTrait,
    errors: &mut FieldErrors,
    field: &str,
    id: i64,
    message: &str,
) -> Result<(), DbErr>
where
    E: EntityTrait,
    <E::PrimaryKey as sea_orm::PrimaryKeyTrait>::ValueType: From<i64>,
{
    if id <= 0 || E::find_by_id(id).one(db).await?.is_none() {
        errors.add(field, message);
    }
    Ok(())
}

/// Checks a single-valued choice that must be one of the caller's rows.
pub async fn owned_choice<E: Owned>(
    db: &impl ConnectionTrait,
    errors: &mut FieldErrors,
    user_id: &str,
    field: &str,
    id: i64,
    message: &str,
) -> Result<(), DbErr> {
    if id <= 0 || !scope::exists_owned::<E>(db, user_id, id).await? {
        errors.add(field, message);
    }
    Ok(())
}

/// Checks a multi-select field. Absent selections are left alone.
pub async fn owned_selection<E: Owned>(
    db: &impl ConnectionTrait,
    errors: &mut FieldErrors,
    user_id: &str,
    field: &str,
    ids: Option<&[i64]>,
) -> Result<(), DbErr> {
    let Some(ids) = ids else {
        return Ok(());
    };

    let owned = scope::owned_ids::<E>(db, user_id, ids).await?;
    if ids.iter().any(|id| !owned.contains(id)) {
        errors.add(
            field,
            format!("Please choose only your own {}s", E::NAME.to_lowercase()),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use migration::ADMIN_USER_ID;

    use super::*;
    use crate::entities::{artist, project_type};
    use crate::test_utils::{OTHER_USER_ID, test_db};

    #[test]
    fn test_required_trims() {
        let mut errors = FieldErrors::new();
        assert_eq!(required(&mut errors, "name", "Name", "  Beck "), "Beck");
        assert!(errors.is_empty());

        required(&mut errors, "first_name", "First Name", "   ");
        assert_eq!(
            errors.get("first_name"),
            Some(&["The First Name field is required.".to_string()][..])
        );
    }

    #[test]
    fn test_bounds() {
        let mut errors = FieldErrors::new();
        max_chars(&mut errors, "title", &"é".repeat(55), 55, "too long");
        at_least(&mut errors, "pay_rate", 1.0, 1.0, "Please choose a Payrate");
        assert!(errors.is_empty());

        at_least(&mut errors, "pay_rate", f64::NAN, 1.0, "Please choose a Payrate");
        assert!(errors.get("pay_rate").is_some());

        max_chars(&mut errors, "title", &"a".repeat(56), 55, "too long");
        at_least(&mut errors, "duration_days", 0, 1, "Please choose a length of time in days");
        assert!(errors.get("title").is_some());
        assert!(errors.get("duration_days").is_some());
    }

    #[tokio::test]
    async fn test_lookup_rejects_zero_and_unknown() {
        let db = test_db().await;

        for (id, ok) in [(0, false), (1, true), (8, true), (9, false)] {
            let mut errors = FieldErrors::new();
            lookup::<project_type::Entity>(&db.conn, &mut errors, "project_type_id", id, "x")
                .await
                .unwrap();
            assert_eq!(errors.is_empty(), ok, "project type {id}");
        }
    }

    #[tokio::test]
    async fn test_owned_selection() {
        let db = test_db().await;

        let mut errors = FieldErrors::new();
        owned_selection::<artist::Entity>(&db.conn, &mut errors, ADMIN_USER_ID, "selected_artists", None)
            .await
            .unwrap();
        owned_selection::<artist::Entity>(
            &db.conn,
            &mut errors,
            ADMIN_USER_ID,
            "selected_artists",
            Some(&[1, 2, 2]),
        )
        .await
        .unwrap();
        assert!(errors.is_empty());

        owned_selection::<artist::Entity>(
            &db.conn,
            &mut errors,
            OTHER_USER_ID,
            "selected_artists",
            Some(&[1]),
        )
        .await
        .unwrap();
        assert_eq!(
            errors.get("selected_artists"),
            Some(&["Please choose only your own artists".to_string()][..])
        );
    }
}
