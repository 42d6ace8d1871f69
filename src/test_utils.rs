use std::sync::Arc;

use chrono::NaiveDate;
use migration::ADMIN_USER_ID;
use sea_orm::{ActiveModelBehavior, ActiveModelTrait, ConnectOptions, Database as SeaDatabase, Set};

use crate::database::Database;
use crate::entities::{project, user};

/// A second studio owner with no rows of their own.
pub const OTHER_USER_ID: &str = "0b4f3c1e-8d1a-4a57-9a43-5f1f2b6e7c10";

/// In-memory database with the real schema and demo seed applied.
pub async fn test_db() -> Arc<Database> {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    // Every connection to :memory: is its own database.
    opt.max_connections(1).sqlx_logging(false);

    let conn = SeaDatabase::connect(opt).await.unwrap();
    let db = Database::migrate(conn).await.unwrap();

    user::ActiveModel {
        id: Set(OTHER_USER_ID.to_string()),
        email: Set("other@studio.test".to_string()),
        company_name: Set("Other Studio".to_string()),
        created_at: Set(chrono::Utc::now()),
    }
    .insert(&db.conn)
    .await
    .unwrap();

    Arc::new(db)
}

/// Inserts an admin-owned project for client 1 without going through
/// validation.
pub async fn seed_project(db: &Database, title: &str) -> project::Model {
    project::ActiveModel {
        title: Set(title.to_string()),
        description: Set("Demo session".to_string()),
        pay_rate: Set(250.0),
        duration_days: Set(3),
        start_date: Set(NaiveDate::from_ymd_opt(2019, 1, 15).unwrap()),
        project_type_id: Set(1),
        status_type_id: Set(1),
        client_id: Set(1),
        user_id: Set(ADMIN_USER_ID.to_string()),
        ..project::ActiveModel::new()
    }
    .insert(&db.conn)
    .await
    .unwrap()
}
