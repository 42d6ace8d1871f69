pub use sea_orm_migration::prelude::*;

mod m20181213_000001_create_tables;
mod m20181213_000002_seed_lookup_types;
mod m20181213_000003_seed_demo_studio;

pub use m20181213_000003_seed_demo_studio::ADMIN_USER_ID;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20181213_000001_create_tables::Migration),
            Box::new(m20181213_000002_seed_lookup_types::Migration),
            Box::new(m20181213_000003_seed_demo_studio::Migration),
        ]
    }
}
