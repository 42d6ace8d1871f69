//! Reads restricted to the rows a studio owner is allowed to see.
//!
//! Every query here takes the caller's identity explicitly and filters on the
//! owning `user_id` column, so a row that belongs to someone else is
//! indistinguishable from one that does not exist.

use std::collections::BTreeSet;

use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Select,
};
use serde::Serialize;

use crate::entities::{artist, client, player, project};
use crate::services::error::StudioError;

/// An entity that belongs to exactly one studio owner.
pub trait Owned: EntityTrait {
    /// Display name used in errors and logs.
    const NAME: &'static str;

    fn id_column() -> Self::Column;

    fn owner_column() -> Self::Column;

    fn id_of(model: &Self::Model) -> i64;

    /// Text shown for the row in choice widgets.
    fn label(model: &Self::Model) -> String;
}

impl Owned for artist::Entity {
    const NAME: &'static str = "Artist";

    fn id_column() -> Self::Column {
        artist::Column::Id
    }

    fn owner_column() -> Self::Column {
        artist::Column::UserId
    }

    fn id_of(model: &Self::Model) -> i64 {
        model.id
    }

    fn label(model: &Self::Model) -> String {
        model.name.clone()
    }
}

impl Owned for client::Entity {
    const NAME: &'static str = "Client";

    fn id_column() -> Self::Column {
        client::Column::Id
    }

    fn owner_column() -> Self::Column {
        client::Column::UserId
    }

    fn id_of(model: &Self::Model) -> i64 {
        model.id
    }

    fn label(model: &Self::Model) -> String {
        model.name.clone()
    }
}

impl Owned for player::Entity {
    const NAME: &'static str = "Player";

    fn id_column() -> Self::Column {
        player::Column::Id
    }

    fn owner_column() -> Self::Column {
        player::Column::UserId
    }

    fn id_of(model: &Self::Model) -> i64 {
        model.id
    }

    fn label(model: &Self::Model) -> String {
        model.full_name()
    }
}

impl Owned for project::Entity {
    const NAME: &'static str = "Project";

    fn id_column() -> Self::Column {
        project::Column::Id
    }

    fn owner_column() -> Self::Column {
        project::Column::UserId
    }

    fn id_of(model: &Self::Model) -> i64 {
        model.id
    }

    fn label(model: &Self::Model) -> String {
        model.title.clone()
    }
}

/// A `(value, text)` pair for a choice widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub id: i64,
    pub label: String,
}

impl SelectOption {
    /// The "nothing chosen yet" entry; its id is never a valid foreign key.
    pub fn placeholder(label: &str) -> Self {
        Self {
            id: 0,
            label: label.to_string(),
        }
    }
}

/// Base query for every row of `E` owned by `user_id`.
pub fn owned_by<E: Owned>(user_id: &str) -> Select<E> {
    E::find().filter(E::owner_column().eq(user_id))
}

pub async fn list_owned<E: Owned>(
    db: &impl ConnectionTrait,
    user_id: &str,
) -> Result<Vec<E::Model>, DbErr> {
    owned_by::<E>(user_id)
        .order_by_asc(E::id_column())
        .all(db)
        .await
}

pub async fn find_owned<E: Owned>(
    db: &impl ConnectionTrait,
    user_id: &str,
    id: i64,
) -> Result<Option<E::Model>, DbErr> {
    owned_by::<E>(user_id)
        .filter(E::id_column().eq(id))
        .one(db)
        .await
}

/// Like [`find_owned`], but a missing row is an error.
pub async fn get_owned<E: Owned>(
    db: &impl ConnectionTrait,
    user_id: &str,
    id: i64,
) -> Result<E::Model, StudioError> {
    find_owned::<E>(db, user_id, id)
        .await?
        .ok_or_else(|| StudioError::not_found(E::NAME, id))
}

pub async fn exists_owned<E: Owned>(
    db: &impl ConnectionTrait,
    user_id: &str,
    id: i64,
) -> Result<bool, DbErr> {
    Ok(find_owned::<E>(db, user_id, id).await?.is_some())
}

/// Option list for every row of `E` the caller owns.
pub async fn options<E: Owned>(
    db: &impl ConnectionTrait,
    user_id: &str,
) -> Result<Vec<SelectOption>, DbErr> {
    Ok(list_owned::<E>(db, user_id)
        .await?
        .iter()
        .map(|model| SelectOption {
            id: E::id_of(model),
            label: E::label(model),
        })
        .collect())
}

/// The subset of `ids` that name rows of `E` owned by the caller.
pub async fn owned_ids<E: Owned>(
    db: &impl ConnectionTrait,
    user_id: &str,
    ids: &[i64],
) -> Result<BTreeSet<i64>, DbErr> {
    if ids.is_empty() {
        return Ok(BTreeSet::new());
    }

    Ok(owned_by::<E>(user_id)
        .filter(E::id_column().is_in(ids.iter().copied()))
        .all(db)
        .await?
        .iter()
        .map(E::id_of)
        .collect())
}

/// Decides what a scalar update that touched no row means: the row is gone
/// (or was never the caller's), or someone else changed it underneath us.
pub async fn resolve_missed_update<E: Owned>(
    db: &impl ConnectionTrait,
    user_id: &str,
    id: i64,
) -> StudioError {
    match exists_owned::<E>(db, user_id, id).await {
        Ok(false) => StudioError::not_found(E::NAME, id),
        Ok(true) => {
            tracing::error!(entity = E::NAME, id, "Update conflicted with another request");
            StudioError::ConcurrencyConflict {
                entity: E::NAME,
                id,
            }
        }
        Err(err) => StudioError::Database(err),
    }
}

#[cfg(test)]
mod tests {
    use migration::ADMIN_USER_ID;

    use super::*;
    use crate::test_utils::{OTHER_USER_ID, test_db};

    #[tokio::test]
    async fn test_list_owned_filters_by_owner() {
        let db = test_db().await;

        let mine = list_owned::<artist::Entity>(&db.conn, ADMIN_USER_ID)
            .await
            .unwrap();
        assert_eq!(mine.len(), 4);
        assert!(mine.iter().all(|a| a.user_id == ADMIN_USER_ID));

        let theirs = list_owned::<artist::Entity>(&db.conn, OTHER_USER_ID)
            .await
            .unwrap();
        assert!(theirs.is_empty());
    }

    #[tokio::test]
    async fn test_find_owned_hides_other_users_rows() {
        let db = test_db().await;

        assert!(
            find_owned::<client::Entity>(&db.conn, ADMIN_USER_ID, 1)
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            find_owned::<client::Entity>(&db.conn, OTHER_USER_ID, 1)
                .await
                .unwrap()
                .is_none()
        );

        let err = get_owned::<client::Entity>(&db.conn, OTHER_USER_ID, 1)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StudioError::NotFound {
                entity: "Client",
                id: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_player_options_use_full_name() {
        let db = test_db().await;

        let options = options::<player::Entity>(&db.conn, ADMIN_USER_ID)
            .await
            .unwrap();
        assert_eq!(options.len(), 4);
        assert_eq!(
            options[1],
            SelectOption {
                id: 2,
                label: "Paul McCartney".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_owned_ids_drops_unknown_and_foreign_ids() {
        let db = test_db().await;

        let ids = owned_ids::<player::Entity>(&db.conn, ADMIN_USER_ID, &[1, 3, 99])
            .await
            .unwrap();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![1, 3]);

        let ids = owned_ids::<player::Entity>(&db.conn, OTHER_USER_ID, &[1, 3])
            .await
            .unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_missed_update() {
        let db = test_db().await;

        let err = resolve_missed_update::<artist::Entity>(&db.conn, ADMIN_USER_ID, 1).await;
        assert!(matches!(err, StudioError::ConcurrencyConflict { id: 1, .. }));

        let err = resolve_missed_update::<artist::Entity>(&db.conn, ADMIN_USER_ID, 404).await;
        assert!(matches!(err, StudioError::NotFound { id: 404, .. }));
    }
}
