#![allow(dead_code)]

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue, ConnectOptions, Database, DatabaseConnection};
use tempfile::TempDir;
use uuid::Uuid;

use engine::{Engine, Membership, Role, users};
use migration::MigratorTrait;

/// In-memory database shared by every connection of the pool.
pub async fn memory_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
}

/// SQLite file in a scratch directory behind a pool of several connections,
/// so transactions really run side by side. Keep the `TempDir` alive for as
/// long as the database is used.
pub async fn pooled_file_db() -> (TempDir, DatabaseConnection) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledgers.db");
    let mut options = ConnectOptions::new(format!("sqlite:{}?mode=rwc", path.display()));
    options
        .max_connections(8)
        .min_connections(2)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    (dir, db)
}

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = memory_db().await;
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

/// Inserts a user and returns its id.
pub async fn add_user(db: &DatabaseConnection, username: &str) -> String {
    let id = Uuid::new_v4().to_string();
    users::ActiveModel {
        id: ActiveValue::Set(id.clone()),
        username: ActiveValue::Set(username.to_string()),
        password: ActiveValue::Set("password".to_string()),
    }
    .insert(db)
    .await
    .unwrap();
    id
}

/// Creates a ledger owned by `owner` and returns its id.
pub async fn new_ledger(engine: &Engine, owner: &str) -> Uuid {
    engine
        .create_ledger(owner, "Household", None, None)
        .await
        .unwrap()
        .id
}

/// Brings `user` into `ledger_id` with `role` through a single-use invitation
/// issued by the owner.
pub async fn join_as(
    engine: &Engine,
    owner: &str,
    ledger_id: Uuid,
    user: &str,
    role: Role,
) -> Membership {
    let invitation = engine
        .create_invitation(owner, ledger_id, role, 1, None)
        .await
        .unwrap();
    engine
        .join_by_invitation(user, &invitation.token, Utc::now())
        .await
        .unwrap()
}

pub fn hours_from_now(hours: i64) -> DateTime<Utc> {
    Utc::now() + chrono::Duration::hours(hours)
}
