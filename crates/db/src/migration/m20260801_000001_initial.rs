//! Initial schema.
//!
//! Creates the tenant tables (enterprises, groups, users) and the fiscal
//! tables (periods, releases, release_images).

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: TENANT TABLES
        // ============================================================
        db.execute_unprepared(ENTERPRISES_SQL).await?;
        db.execute_unprepared(GROUPS_SQL).await?;
        db.execute_unprepared(USERS_SQL).await?;

        // ============================================================
        // PART 2: PERIODS & RELEASES
        // ============================================================
        db.execute_unprepared(PERIODS_SQL).await?;
        db.execute_unprepared(RELEASES_SQL).await?;
        db.execute_unprepared(RELEASE_IMAGES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENTERPRISES_SQL: &str = r"
CREATE TABLE enterprises (
    id INTEGER GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    cnpj VARCHAR(18) NOT NULL UNIQUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const GROUPS_SQL: &str = r"
CREATE TABLE groups (
    id INTEGER GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
    enterprise_id INTEGER NOT NULL REFERENCES enterprises(id) ON DELETE CASCADE,
    name VARCHAR(100) NOT NULL,
    permissions JSONB NOT NULL DEFAULT '[]',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (enterprise_id, name)
);

CREATE INDEX idx_groups_enterprise ON groups(enterprise_id);
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id INTEGER GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
    enterprise_id INTEGER NOT NULL REFERENCES enterprises(id) ON DELETE CASCADE,
    group_id INTEGER REFERENCES groups(id) ON DELETE SET NULL,
    name VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL UNIQUE,
    active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_users_enterprise ON users(enterprise_id);
CREATE INDEX idx_users_email ON users(email) WHERE active = true;
";

const PERIODS_SQL: &str = r"
CREATE TABLE periods (
    id INTEGER GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
    enterprise_id INTEGER NOT NULL REFERENCES enterprises(id) ON DELETE CASCADE,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    closed BOOLEAN NOT NULL DEFAULT false,
    total_value NUMERIC(14, 2),
    observations TEXT,
    reopen_reason TEXT,
    closed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_period_dates CHECK (end_date >= start_date)
);

CREATE INDEX idx_periods_enterprise_dates ON periods(enterprise_id, start_date, end_date);
CREATE INDEX idx_periods_open ON periods(enterprise_id) WHERE closed = false;
";

const RELEASES_SQL: &str = r"
CREATE TABLE releases (
    id INTEGER GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
    enterprise_id INTEGER NOT NULL REFERENCES enterprises(id) ON DELETE CASCADE,
    period_id INTEGER REFERENCES periods(id) ON DELETE RESTRICT,
    created_by INTEGER NOT NULL REFERENCES users(id),
    entry_date TIMESTAMPTZ NOT NULL,
    invoice_number VARCHAR(60) NOT NULL,
    invoice_value NUMERIC(12, 2) NOT NULL,
    invoice_issue_date DATE NOT NULL,
    xml_key VARCHAR(255),
    latitude NUMERIC(9, 6) NOT NULL,
    longitude NUMERIC(9, 6) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_invoice_value CHECK (invoice_value > 0)
);

CREATE INDEX idx_releases_enterprise_entry ON releases(enterprise_id, entry_date);
CREATE INDEX idx_releases_period ON releases(period_id) WHERE period_id IS NOT NULL;
CREATE INDEX idx_releases_created_by ON releases(created_by);
";

const RELEASE_IMAGES_SQL: &str = r"
CREATE TABLE release_images (
    id INTEGER GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
    release_id INTEGER NOT NULL REFERENCES releases(id) ON DELETE CASCADE,
    url TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_release_images_release ON release_images(release_id);
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- Order matters due to foreign key constraints
-- ============================================================

DROP TABLE IF EXISTS release_images CASCADE;
DROP TABLE IF EXISTS releases CASCADE;
DROP TABLE IF EXISTS periods CASCADE;
DROP TABLE IF EXISTS users CASCADE;
DROP TABLE IF EXISTS groups CASCADE;
DROP TABLE IF EXISTS enterprises CASCADE;
";
