use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Identity of the demo studio owner.
pub const ADMIN_USER_ID: &str = "6f6975c7-6999-42bc-90c1-9cb207231270";

const SEEDED_AT: &str = "2018-12-13T16:46:32+00:00";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(&format!(
            "INSERT INTO users (id, email, company_name, created_at) VALUES \
             ('{ADMIN_USER_ID}', 'admin@admin.com', 'admin', '{SEEDED_AT}')"
        ))
        .await?;

        db.execute_unprepared(&format!(
            "INSERT INTO artists (id, name, user_id, created_at, updated_at) VALUES \
             (1, 'Smashing Pumpkins', '{ADMIN_USER_ID}', '{SEEDED_AT}', '{SEEDED_AT}'), \
             (2, 'Lake Street Dive', '{ADMIN_USER_ID}', '{SEEDED_AT}', '{SEEDED_AT}'), \
             (3, 'Barns Courtney', '{ADMIN_USER_ID}', '{SEEDED_AT}', '{SEEDED_AT}'), \
             (4, 'The Pink Spiders', '{ADMIN_USER_ID}', '{SEEDED_AT}', '{SEEDED_AT}')"
        ))
        .await?;

        db.execute_unprepared(&format!(
            "INSERT INTO clients (id, name, phone, email, user_id, created_at, updated_at) VALUES \
             (1, 'Mark Hale', '615-111-1111', 'mhaleindustries@mhale.com', '{ADMIN_USER_ID}', '{SEEDED_AT}', '{SEEDED_AT}'), \
             (2, 'David Cunningham', '615-222-2222', 'dcunningham@dcunningham.com', '{ADMIN_USER_ID}', '{SEEDED_AT}', '{SEEDED_AT}'), \
             (3, 'Michelle An', '615-333-3333', 'mansound@sound.com', '{ADMIN_USER_ID}', '{SEEDED_AT}', '{SEEDED_AT}')"
        ))
        .await?;

        db.execute_unprepared(&format!(
            "INSERT INTO players (id, first_name, last_name, instrument, phone, email, user_id, created_at, updated_at) VALUES \
             (1, 'Abe', 'Laboriel Jr.', 'Drums', '999-999-9999', 'abelaboriel@paulmcaartney.com', '{ADMIN_USER_ID}', '{SEEDED_AT}', '{SEEDED_AT}'), \
             (2, 'Paul', 'McCartney', 'Vocals', '999-999-9999', 'paul@paulmccartney.com', '{ADMIN_USER_ID}', '{SEEDED_AT}', '{SEEDED_AT}'), \
             (3, 'Jimmy', 'Hendrix', 'Guitar', '999-999-9999', 'jhendrix@jhendrix.com', '{ADMIN_USER_ID}', '{SEEDED_AT}', '{SEEDED_AT}'), \
             (4, 'Stevie', 'Wonder', 'Keyboards', '999-999-9999', 'swonder@swonder.com', '{ADMIN_USER_ID}', '{SEEDED_AT}', '{SEEDED_AT}')"
        ))
        .await?;

        db.execute_unprepared(
            "INSERT INTO client_artists (id, client_id, artist_id) VALUES (1, 1, 1), (2, 3, 2)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(&format!(
            "DELETE FROM client_artists WHERE client_id IN \
             (SELECT id FROM clients WHERE user_id = '{ADMIN_USER_ID}')"
        ))
        .await?;
        for table in ["players", "clients", "artists"] {
            db.execute_unprepared(&format!(
                "DELETE FROM {table} WHERE user_id = '{ADMIN_USER_ID}'"
            ))
            .await?;
        }
        db.execute_unprepared(&format!("DELETE FROM users WHERE id = '{ADMIN_USER_ID}'"))
            .await?;

        Ok(())
    }
}
