use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

#[derive(DeriveMigrationName)]
pub struct Migration;

pub const PROJECT_TYPES: [(i32, &str); 8] = [
    (1, "Single Song Release"),
    (2, "Extended Play CD"),
    (3, "Full Length CD"),
    (4, "Single Song Demo"),
    (5, "30 Second Audio Commercial"),
    (6, "60 Second Audio Commercial"),
    (7, "Audio Industrial"),
    (8, "Live Concert Recording"),
];

pub const STATUS_TYPES: [(i32, &str); 4] = [
    (1, "Upcoming"),
    (2, "Completed"),
    (3, "Current"),
    (4, "Tentative"),
];

fn insert_labels(table: &str, rows: &[(i32, &str)]) -> String {
    let values = rows
        .iter()
        .map(|(id, label)| format!("({}, '{}')", id, label.replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT INTO {table} (id, label) VALUES {values}")
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(&insert_labels("project_types", &PROJECT_TYPES))
            .await?;
        db.execute_unprepared(&insert_labels("status_types", &STATUS_TYPES))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared("DELETE FROM status_types").await?;
        db.execute_unprepared("DELETE FROM project_types").await?;

        Ok(())
    }
}
