//! Many-to-many link maintenance.
//!
//! Join rows are never edited on their own. They are rewritten wholesale
//! whenever one of their endpoints is saved, and removed before an endpoint is
//! deleted.

use std::collections::BTreeSet;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};

use crate::entities::{
    artist, artist_project, client, client_artist, player, player_project, project,
};
use crate::services::error::{StudioError, StudioResult};
use crate::services::scope::{self, Owned};

/// One side of a join table, seen from the entity that owns the link list.
pub trait Association {
    /// Name used in logs.
    const NAME: &'static str;

    type Owner: Owned;
    type Join: EntityTrait;
    type Row: ActiveModelTrait<Entity = Self::Join> + Send;

    /// Join column pointing at the owning entity.
    fn owner_column() -> <Self::Join as EntityTrait>::Column;

    /// Join column pointing at the associated entity.
    fn associated_column() -> <Self::Join as EntityTrait>::Column;

    fn row(owner_id: i64, associated_id: i64) -> Self::Row;

    fn associated_id(model: &<Self::Join as EntityTrait>::Model) -> i64;
}

pub struct ArtistClients;
pub struct ArtistProjects;
pub struct ClientArtists;
pub struct PlayerProjects;
pub struct ProjectArtists;
pub struct ProjectPlayers;

impl Association for ArtistClients {
    const NAME: &'static str = "artist clients";

    type Owner = artist::Entity;
    type Join = client_artist::Entity;
    type Row = client_artist::ActiveModel;

    fn owner_column() -> client_artist::Column {
        client_artist::Column::ArtistId
    }

    fn associated_column() -> client_artist::Column {
        client_artist::Column::ClientId
    }

    fn row(owner_id: i64, associated_id: i64) -> Self::Row {
        client_artist::ActiveModel {
            artist_id: Set(owner_id),
            client_id: Set(associated_id),
            ..Default::default()
        }
    }

    fn associated_id(model: &client_artist::Model) -> i64 {
        model.client_id
    }
}

impl Association for ClientArtists {
    const NAME: &'static str = "client artists";

    type Owner = client::Entity;
    type Join = client_artist::Entity;
    type Row = client_artist::ActiveModel;

    fn owner_column() -> client_artist::Column {
        client_artist::Column::ClientId
    }

    fn associated_column() -> client_artist::Column {
        client_artist::Column::ArtistId
    }

    fn row(owner_id: i64, associated_id: i64) -> Self::Row {
        client_artist::ActiveModel {
            client_id: Set(owner_id),
            artist_id: Set(associated_id),
            ..Default::default()
        }
    }

    fn associated_id(model: &client_artist::Model) -> i64 {
        model.artist_id
    }
}

impl Association for ArtistProjects {
    const NAME: &'static str = "artist projects";

    type Owner = artist::Entity;
    type Join = artist_project::Entity;
    type Row = artist_project::ActiveModel;

    fn owner_column() -> artist_project::Column {
        artist_project::Column::ArtistId
    }

    fn associated_column() -> artist_project::Column {
        artist_project::Column::ProjectId
    }

    fn row(owner_id: i64, associated_id: i64) -> Self::Row {
        artist_project::ActiveModel {
            artist_id: Set(owner_id),
            project_id: Set(associated_id),
            ..Default::default()
        }
    }

    fn associated_id(model: &artist_project::Model) -> i64 {
        model.project_id
    }
}

impl Association for ProjectArtists {
    const NAME: &'static str = "project artists";

    type Owner = project::Entity;
    type Join = artist_project::Entity;
    type Row = artist_project::ActiveModel;

    fn owner_column() -> artist_project::Column {
        artist_project::Column::ProjectId
    }

    fn associated_column() -> artist_project::Column {
        artist_project::Column::ArtistId
    }

    fn row(owner_id: i64, associated_id: i64) -> Self::Row {
        artist_project::ActiveModel {
            project_id: Set(owner_id),
            artist_id: Set(associated_id),
            ..Default::default()
        }
    }

    fn associated_id(model: &artist_project::Model) -> i64 {
        model.artist_id
    }
}

impl Association for PlayerProjects {
    const NAME: &'static str = "player projects";

    type Owner = player::Entity;
    type Join = player_project::Entity;
    type Row = player_project::ActiveModel;

    fn owner_column() -> player_project::Column {
        player_project::Column::PlayerId
    }

    fn associated_column() -> player_project::Column {
        player_project::Column::ProjectId
    }

    fn row(owner_id: i64, associated_id: i64) -> Self::Row {
        player_project::ActiveModel {
            player_id: Set(owner_id),
            project_id: Set(associated_id),
            ..Default::default()
        }
    }

    fn associated_id(model: &player_project::Model) -> i64 {
        model.project_id
    }
}

impl Association for ProjectPlayers {
    const NAME: &'static str = "project players";

    type Owner = project::Entity;
    type Join = player_project::Entity;
    type Row = player_project::ActiveModel;

    fn owner_column() -> player_project::Column {
        player_project::Column::ProjectId
    }

    fn associated_column() -> player_project::Column {
        player_project::Column::PlayerId
    }

    fn row(owner_id: i64, associated_id: i64) -> Self::Row {
        player_project::ActiveModel {
            project_id: Set(owner_id),
            player_id: Set(associated_id),
            ..Default::default()
        }
    }

    fn associated_id(model: &player_project::Model) -> i64 {
        model.player_id
    }
}

/// Outcome of a [`reconcile`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// The caller did not send the field; links were left alone.
    Unchanged,
    Replaced { removed: u64, inserted: u64 },
}

/// Makes the links of `owner_id` match `desired` exactly.
///
/// `None` leaves the links untouched while `Some(&[])` removes all of them.
/// Existing rows are always deleted and the desired set reinserted, so kept
/// pairs come back with fresh surrogate keys. Run this inside the caller's
/// transaction; nothing is committed here.
pub async fn reconcile<A: Association>(
    db: &impl ConnectionTrait,
    user_id: &str,
    owner_id: i64,
    desired: Option<&[i64]>,
) -> StudioResult<Reconciled> {
    if !scope::exists_owned::<A::Owner>(db, user_id, owner_id).await? {
        return Err(StudioError::not_found(
            <A::Owner as Owned>::NAME,
            owner_id,
        ));
    }

    let Some(desired) = desired else {
        return Ok(Reconciled::Unchanged);
    };
    let desired: BTreeSet<i64> = desired.iter().copied().collect();

    let removed = clear::<A>(db, owner_id).await?;

    let mut inserted = 0;
    for associated_id in &desired {
        A::Join::insert(A::row(owner_id, *associated_id))
            .exec(db)
            .await?;
        inserted += 1;
    }

    tracing::debug!(
        association = A::NAME,
        owner_id,
        removed,
        inserted,
        "Reconciled links"
    );

    Ok(Reconciled::Replaced { removed, inserted })
}

/// Deletes every link row that points at `owner_id`. Returns how many went.
pub async fn clear<A: Association>(db: &impl ConnectionTrait, owner_id: i64) -> Result<u64, DbErr> {
    let result = A::Join::delete_many()
        .filter(A::owner_column().eq(owner_id))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

/// IDs currently linked to `owner_id`, ascending.
pub async fn selected_ids<A: Association>(
    db: &impl ConnectionTrait,
    owner_id: i64,
) -> Result<Vec<i64>, DbErr> {
    Ok(A::Join::find()
        .filter(A::owner_column().eq(owner_id))
        .order_by_asc(A::associated_column())
        .all(db)
        .await?
        .iter()
        .map(A::associated_id)
        .collect())
}

#[cfg(test)]
mod tests {
    use migration::ADMIN_USER_ID;
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

    use super::*;
    use crate::test_utils::{OTHER_USER_ID, seed_project, test_db};

    async fn client_artist_rows(
        db: &impl ConnectionTrait,
        client_id: i64,
    ) -> Vec<client_artist::Model> {
        client_artist::Entity::find()
            .filter(client_artist::Column::ClientId.eq(client_id))
            .all(db)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_reconcile_replaces_links() {
        let db = test_db().await;

        reconcile::<ClientArtists>(&db.conn, ADMIN_USER_ID, 2, Some(&[2, 4]))
            .await
            .unwrap();
        assert_eq!(
            selected_ids::<ClientArtists>(&db.conn, 2).await.unwrap(),
            vec![2, 4]
        );

        let outcome = reconcile::<ClientArtists>(&db.conn, ADMIN_USER_ID, 2, Some(&[4, 1]))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Reconciled::Replaced {
                removed: 2,
                inserted: 2
            }
        );
        assert_eq!(
            selected_ids::<ClientArtists>(&db.conn, 2).await.unwrap(),
            vec![1, 4]
        );
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent_but_rekeys_rows() {
        let db = test_db().await;

        reconcile::<ClientArtists>(&db.conn, ADMIN_USER_ID, 2, Some(&[1, 3]))
            .await
            .unwrap();
        let before = client_artist_rows(&db.conn, 2).await;

        reconcile::<ClientArtists>(&db.conn, ADMIN_USER_ID, 2, Some(&[1, 3]))
            .await
            .unwrap();
        let after = client_artist_rows(&db.conn, 2).await;

        let pairs = |rows: &[client_artist::Model]| {
            rows.iter()
                .map(|r| (r.client_id, r.artist_id))
                .collect::<BTreeSet<_>>()
        };
        assert_eq!(pairs(&before), pairs(&after));

        let before_ids: BTreeSet<i64> = before.iter().map(|r| r.id).collect();
        assert!(after.iter().all(|r| !before_ids.contains(&r.id)));
    }

    #[tokio::test]
    async fn test_reconcile_none_and_empty_differ() {
        let db = test_db().await;

        // The demo seed links client 1 to artist 1.
        let outcome = reconcile::<ClientArtists>(&db.conn, ADMIN_USER_ID, 1, None)
            .await
            .unwrap();
        assert_eq!(outcome, Reconciled::Unchanged);
        assert_eq!(
            selected_ids::<ClientArtists>(&db.conn, 1).await.unwrap(),
            vec![1]
        );

        reconcile::<ClientArtists>(&db.conn, ADMIN_USER_ID, 1, Some(&[]))
            .await
            .unwrap();
        assert!(
            selected_ids::<ClientArtists>(&db.conn, 1)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_reconcile_dedupes_desired_ids() {
        let db = test_db().await;

        let outcome = reconcile::<ArtistClients>(&db.conn, ADMIN_USER_ID, 4, Some(&[2, 2, 3]))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Reconciled::Replaced {
                removed: 0,
                inserted: 2
            }
        );
        assert_eq!(
            selected_ids::<ArtistClients>(&db.conn, 4).await.unwrap(),
            vec![2, 3]
        );
    }

    #[tokio::test]
    async fn test_reconcile_rejects_unknown_or_foreign_owner() {
        let db = test_db().await;

        let err = reconcile::<ClientArtists>(&db.conn, ADMIN_USER_ID, 42, Some(&[1]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StudioError::NotFound {
                entity: "Client",
                id: 42
            }
        ));

        let err = reconcile::<ClientArtists>(&db.conn, OTHER_USER_ID, 1, Some(&[]))
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::NotFound { id: 1, .. }));

        // The failed calls must not have touched the seeded link.
        assert_eq!(
            selected_ids::<ClientArtists>(&db.conn, 1).await.unwrap(),
            vec![1]
        );
    }

    #[tokio::test]
    async fn test_project_links_both_directions() {
        let db = test_db().await;
        let project = seed_project(&db, "Hey Jude").await;

        reconcile::<ProjectPlayers>(&db.conn, ADMIN_USER_ID, project.id, Some(&[1, 2]))
            .await
            .unwrap();
        assert_eq!(
            selected_ids::<PlayerProjects>(&db.conn, 2).await.unwrap(),
            vec![project.id]
        );

        assert_eq!(clear::<PlayerProjects>(&db.conn, 2).await.unwrap(), 1);
        assert_eq!(
            selected_ids::<ProjectPlayers>(&db.conn, project.id)
                .await
                .unwrap(),
            vec![1]
        );
    }
}
