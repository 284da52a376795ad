//! Enterprise (tenant) records, keyed by CNPJ.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};

use notara_shared::types::EnterpriseId;

use crate::entities::enterprises;

/// Repository for tenant enterprises.
#[derive(Debug, Clone)]
pub struct EnterpriseRepository {
    db: DatabaseConnection,
}

impl EnterpriseRepository {
    /// Creates a new enterprise repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an enterprise by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: EnterpriseId) -> Result<Option<enterprises::Model>, DbErr> {
        enterprises::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
    }

    /// Finds an enterprise by CNPJ.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_cnpj(&self, cnpj: &str) -> Result<Option<enterprises::Model>, DbErr> {
        enterprises::Entity::find()
            .filter(enterprises::Column::Cnpj.eq(cnpj))
            .one(&self.db)
            .await
    }

    /// Creates a new enterprise.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, name: &str, cnpj: &str) -> Result<enterprises::Model, DbErr> {
        let now = chrono::Utc::now().into();
        let enterprise = enterprises::ActiveModel {
            name: Set(name.to_string()),
            cnpj: Set(cnpj.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        enterprise.insert(&self.db).await
    }
}
