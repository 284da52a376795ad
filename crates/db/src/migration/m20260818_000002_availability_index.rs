//! Partial index for the available-releases selector.
//!
//! The selector always filters on `period_id IS NULL` within one enterprise
//! and an entry date window, so a partial index over exactly that shape keeps
//! the close workflow fast once assigned releases dominate the table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            r"
            CREATE INDEX idx_releases_available
                ON releases(enterprise_id, entry_date)
                WHERE period_id IS NULL;
            ",
        )
        .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP INDEX IF EXISTS idx_releases_available;")
            .await?;
        Ok(())
    }
}
