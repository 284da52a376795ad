//! Database seeder for Notara development and testing.
//!
//! Seeds a demo enterprise with permission groups, users, releases, and an
//! open period, then prints development tokens for calling the API.
//!
//! Usage: cargo run --bin seeder

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::str::FromStr;

use notara_core::period::CreatePeriodInput;
use notara_core::permission::PermissionSet;
use notara_core::release::{CreateReleaseInput, GeoPoint, Invoice};
use notara_db::entities::{groups, periods, releases};
use notara_db::repositories::{
    EnterpriseRepository, GroupRepository, PeriodRepository, ReleaseRepository, UserRepository,
};
use notara_shared::types::{EnterpriseId, GroupId, UserId};
use notara_shared::{JwtConfig, JwtService};

/// Demo enterprise CNPJ (valid check digits, consistent for all seeds)
const DEMO_CNPJ: &str = "12345678000195";
/// Demo admin user email
const DEMO_ADMIN_EMAIL: &str = "ana@notara.dev";
/// Demo recorder user email
const DEMO_RECORDER_EMAIL: &str = "bruno@notara.dev";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = notara_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding demo enterprise...");
    let enterprise_id = seed_enterprise(&db).await;

    println!("Seeding permission groups...");
    let (admin_group, recorder_group) = seed_groups(&db, enterprise_id).await;

    println!("Seeding demo users...");
    let admin_id = seed_user(&db, enterprise_id, admin_group, "Ana Contadora", DEMO_ADMIN_EMAIL).await;
    let recorder_id = seed_user(
        &db,
        enterprise_id,
        recorder_group,
        "Bruno Lançador",
        DEMO_RECORDER_EMAIL,
    )
    .await;

    println!("Seeding demo releases...");
    seed_releases(&db, enterprise_id, recorder_id).await;

    println!("Seeding demo period...");
    seed_period(&db, enterprise_id).await;

    println!("Seeding complete!");

    print_dev_tokens(enterprise_id, admin_id, recorder_id);
}

/// Seeds the demo enterprise, keyed by its CNPJ.
async fn seed_enterprise(db: &DatabaseConnection) -> EnterpriseId {
    let repo = EnterpriseRepository::new(db.clone());

    if let Some(existing) = repo.find_by_cnpj(DEMO_CNPJ).await.ok().flatten() {
        println!("  Demo enterprise already exists, skipping...");
        return EnterpriseId::from_i32(existing.id);
    }

    let enterprise = repo
        .create("Construtora Demo Ltda", DEMO_CNPJ)
        .await
        .expect("Failed to insert demo enterprise");

    println!("  Created demo enterprise: Construtora Demo Ltda");
    EnterpriseId::from_i32(enterprise.id)
}

/// Seeds the admin and recorder groups, returning their ids.
async fn seed_groups(db: &DatabaseConnection, enterprise_id: EnterpriseId) -> (i32, i32) {
    let admin = seed_group(
        db,
        enterprise_id,
        "Administradores",
        PermissionSet::from_slugs(["admin"]).expect("valid permission slugs"),
    )
    .await;
    let recorder = seed_group(
        db,
        enterprise_id,
        "Lançadores",
        PermissionSet::from_slugs(["create-release", "view-release", "edit-release", "view-period"])
            .expect("valid permission slugs"),
    )
    .await;
    (admin, recorder)
}

async fn seed_group(
    db: &DatabaseConnection,
    enterprise_id: EnterpriseId,
    name: &str,
    permissions: PermissionSet,
) -> i32 {
    if let Some(existing) = groups::Entity::find()
        .filter(groups::Column::EnterpriseId.eq(enterprise_id.into_inner()))
        .filter(groups::Column::Name.eq(name))
        .one(db)
        .await
        .ok()
        .flatten()
    {
        println!("  Group {name} already exists, skipping...");
        return existing.id;
    }

    let group = GroupRepository::new(db.clone())
        .create(enterprise_id, name, &permissions)
        .await
        .expect("Failed to insert group");

    println!("  Created group: {name}");
    group.id
}

/// Seeds a demo user, keyed by email.
async fn seed_user(
    db: &DatabaseConnection,
    enterprise_id: EnterpriseId,
    group_id: i32,
    name: &str,
    email: &str,
) -> UserId {
    let repo = UserRepository::new(db.clone());

    if let Some(existing) = repo.find_by_email(email).await.ok().flatten() {
        println!("  User {email} already exists, skipping...");
        return UserId::from_i32(existing.id);
    }

    let user = repo
        .create(
            enterprise_id,
            Some(GroupId::from_i32(group_id)),
            name,
            email,
        )
        .await
        .expect("Failed to insert demo user");

    println!("  Created user: {email}");
    UserId::from_i32(user.id)
}

/// Seeds a handful of unassigned releases over the last month.
async fn seed_releases(db: &DatabaseConnection, enterprise_id: EnterpriseId, author: UserId) {
    let existing = releases::Entity::find()
        .filter(releases::Column::EnterpriseId.eq(enterprise_id.into_inner()))
        .one(db)
        .await
        .ok()
        .flatten();
    if existing.is_some() {
        println!("  Demo releases already exist, skipping...");
        return;
    }

    let repo = ReleaseRepository::new(db.clone());
    let invoices = [
        ("NF-4821", "1250.00", 25i64),
        ("NF-4850", "389.90", 15),
        ("NF-4903", "2174.35", 5),
    ];

    let mut inserted = 0;
    for (number, value, days_ago) in invoices {
        let entry_date = Utc::now() - Duration::days(days_ago);
        let input = CreateReleaseInput {
            enterprise_id,
            created_by: author,
            entry_date,
            invoice: Invoice {
                number: number.to_string(),
                value: Decimal::from_str(value).expect("valid decimal literal"),
                issue_date: entry_date.date_naive(),
            },
            xml_key: None,
            location: GeoPoint {
                latitude: Decimal::from_str("-23.550520").expect("valid decimal literal"),
                longitude: Decimal::from_str("-46.633308").expect("valid decimal literal"),
            },
            images: vec![format!(
                "https://storage.notara.dev/demo/{}.jpg",
                number.to_lowercase()
            )],
        };

        if let Err(e) = repo.create(input).await {
            eprintln!("Failed to insert release {number}: {e}");
        } else {
            inserted += 1;
        }
    }

    println!("  Inserted {inserted} releases");
}

/// Seeds one open period covering the last month.
async fn seed_period(db: &DatabaseConnection, enterprise_id: EnterpriseId) {
    let existing = periods::Entity::find()
        .filter(periods::Column::EnterpriseId.eq(enterprise_id.into_inner()))
        .one(db)
        .await
        .ok()
        .flatten();
    if existing.is_some() {
        println!("  Demo period already exists, skipping...");
        return;
    }

    let today = Utc::now().date_naive();
    let input = CreatePeriodInput {
        enterprise_id,
        start_date: today - Duration::days(30),
        end_date: today,
        observations: Some("Período de demonstração".to_string()),
    };

    if let Err(e) = PeriodRepository::new(db.clone()).create(input).await {
        eprintln!("Failed to insert demo period: {e}");
    } else {
        println!("  Created one open period covering the last 30 days");
    }
}

/// Prints tokens for exercising the API by hand. Tokens are issued out of
/// band in this system, so the seeder is the development entry point.
fn print_dev_tokens(enterprise_id: EnterpriseId, admin_id: UserId, recorder_id: UserId) {
    let secret = std::env::var("NOTARA__JWT__SECRET")
        .unwrap_or_else(|_| "dev-secret-change-me".to_string());
    let jwt = JwtService::new(JwtConfig {
        secret,
        access_token_expires_secs: 28800,
    });

    println!();
    println!("Development tokens (8h, signed with NOTARA__JWT__SECRET):");
    match jwt.generate_enterprise_token(enterprise_id) {
        Ok(token) => println!("  enterprise:      {token}"),
        Err(e) => eprintln!("Failed to generate enterprise token: {e}"),
    }
    match jwt.generate_user_token(admin_id, enterprise_id) {
        Ok(token) => println!("  {DEMO_ADMIN_EMAIL}:  {token}"),
        Err(e) => eprintln!("Failed to generate admin token: {e}"),
    }
    match jwt.generate_user_token(recorder_id, enterprise_id) {
        Ok(token) => println!("  {DEMO_RECORDER_EMAIL}: {token}"),
        Err(e) => eprintln!("Failed to generate recorder token: {e}"),
    }
}
