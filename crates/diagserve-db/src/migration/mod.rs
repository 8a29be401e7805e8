//! database migrations for diagserve.

pub use sea_orm_migration::prelude::*;

mod m20260702_000001_create_diagnosis_keys;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(
            m20260702_000001_create_diagnosis_keys::Migration,
        )]
    }
}
