//! `SeaORM` Entity for the releases table.
//!
//! `period_id` is the assignment column: NULL means the release is still
//! available for a close selection.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "releases")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub enterprise_id: i32,
    pub period_id: Option<i32>,
    pub created_by: i32,
    pub entry_date: DateTimeWithTimeZone,
    pub invoice_number: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub invoice_value: Decimal,
    pub invoice_issue_date: Date,
    pub xml_key: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((9, 6)))")]
    pub latitude: Decimal,
    #[sea_orm(column_type = "Decimal(Some((9, 6)))")]
    pub longitude: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::enterprises::Entity",
        from = "Column::EnterpriseId",
        to = "super::enterprises::Column::Id"
    )]
    Enterprises,
    #[sea_orm(
        belongs_to = "super::periods::Entity",
        from = "Column::PeriodId",
        to = "super::periods::Column::Id"
    )]
    Periods,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CreatedBy",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(has_many = "super::release_images::Entity")]
    ReleaseImages,
}

impl Related<super::enterprises::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enterprises.def()
    }
}

impl Related<super::periods::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Periods.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::release_images::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReleaseImages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
