//! Account repository.

use std::sync::Arc;

use accman_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};

use crate::entities::{Account, account};

/// Repository for account operations.
///
/// Each method is atomic at the single-record granularity the underlying
/// store provides; no operation spans multiple records.
#[derive(Clone)]
pub struct AccountRepository {
    db: Arc<DatabaseConnection>,
}

/// Convert a full model into an active model with every column marked dirty.
fn to_active(model: account::Model) -> account::ActiveModel {
    account::ActiveModel {
        id: Set(model.id),
        name: Set(model.name),
        email: Set(model.email),
        country: Set(model.country),
        postal_code: Set(model.postal_code),
        age: Set(model.age),
        status: Set(model.status),
        place: Set(model.place),
        state: Set(model.state),
        longitude: Set(model.longitude),
        latitude: Set(model.latitude),
        security_pin: Set(model.security_pin),
        created_at: Set(model.created_at),
        updated_at: Set(model.updated_at),
    }
}

/// Map a write failure, surfacing the email unique constraint as a conflict.
fn map_write_err(email: &str, e: &sea_orm::DbErr) -> AppError {
    classify_write_err(email, e.sql_err(), || e.to_string())
}

fn classify_write_err(
    email: &str,
    sql_err: Option<SqlErr>,
    detail: impl FnOnce() -> String,
) -> AppError {
    match sql_err {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict(format!("email already in use: {email}"))
        }
        _ => AppError::Database(detail()),
    }
}

impl AccountRepository {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a new account.
    ///
    /// Returns [`AppError::Conflict`] when the email is already registered.
    pub async fn insert(&self, model: account::Model) -> AppResult<account::Model> {
        let email = model.email.clone();
        to_active(model)
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_write_err(&email, &e))
    }

    /// Find an account by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<account::Model>> {
        Account::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an account by email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<account::Model>> {
        Account::find()
            .filter(account::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find all accounts.
    pub async fn find_all(&self) -> AppResult<Vec<account::Model>> {
        Account::find()
            .order_by_asc(account::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether an account with the given ID exists.
    pub async fn exists_by_id(&self, id: &str) -> AppResult<bool> {
        let count = Account::find_by_id(id)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Persist a full replacement of an existing account.
    ///
    /// Returns [`AppError::Conflict`] when the new email collides with
    /// another account.
    pub async fn update(&self, model: account::Model) -> AppResult<account::Model> {
        let email = model.email.clone();
        to_active(model)
            .update(self.db.as_ref())
            .await
            .map_err(|e| map_write_err(&email, &e))
    }

    /// Delete an account by ID.
    pub async fn delete_by_id(&self, id: &str) -> AppResult<()> {
        Account::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::account::{AccountStatus, Country};
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_account(id: &str, email: &str) -> account::Model {
        account::Model {
            id: id.to_string(),
            name: "Test Account".to_string(),
            email: email.to_string(),
            country: Country::Us,
            postal_code: "90210".to_string(),
            age: Some(30),
            status: AccountStatus::Active,
            place: None,
            state: None,
            longitude: None,
            latitude: None,
            security_pin: Some("1234".to_string()),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_returns_account() {
        let account = create_test_account("ab12cd", "test@example.com");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[account.clone()]])
                .into_connection(),
        );

        let repo = AccountRepository::new(db);
        let result = repo.find_by_id("ab12cd").await.unwrap();

        assert!(result.is_some());
        let found = result.unwrap();
        assert_eq!(found.id, "ab12cd");
        assert_eq!(found.email, "test@example.com");
    }

    #[tokio::test]
    async fn test_find_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<account::Model>::new()])
                .into_connection(),
        );

        let repo = AccountRepository::new(db);
        let result = repo.find_by_id("nonexistent").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_find_by_email_returns_account() {
        let account = create_test_account("ab12cd", "unique@example.com");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[account]])
                .into_connection(),
        );

        let repo = AccountRepository::new(db);
        let result = repo.find_by_email("unique@example.com").await.unwrap();

        assert_eq!(result.unwrap().id, "ab12cd");
    }

    #[tokio::test]
    async fn test_find_all_returns_every_account() {
        let first = create_test_account("aaaaaa", "a@example.com");
        let second = create_test_account("bbbbbb", "b@example.com");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[first, second]])
                .into_connection(),
        );

        let repo = AccountRepository::new(db);
        let results = repo.find_all().await.unwrap();

        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_exists_by_id() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1))
                }]])
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(0))
                }]])
                .into_connection(),
        );

        let repo = AccountRepository::new(db);
        assert!(repo.exists_by_id("ab12cd").await.unwrap());
        assert!(!repo.exists_by_id("nonexistent").await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_returns_persisted_account() {
        let account = create_test_account("ab12cd", "new@example.com");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[account.clone()]])
                .into_connection(),
        );

        let repo = AccountRepository::new(db);
        let inserted = repo.insert(account).await.unwrap();

        assert_eq!(inserted.email, "new@example.com");
        assert_eq!(inserted.status, AccountStatus::Active);
    }

    #[test]
    fn test_unique_violation_on_email_maps_to_conflict() {
        let sql_err = SqlErr::UniqueConstraintViolation(
            "duplicate key value violates unique constraint \"idx_account_email_unique\""
                .to_string(),
        );
        let mapped = classify_write_err("a@example.com", Some(sql_err), String::new);

        match mapped {
            AppError::Conflict(msg) => assert!(msg.contains("a@example.com")),
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_map_write_err_falls_back_to_database_error() {
        let err = sea_orm::DbErr::Custom("connection reset".to_string());
        let mapped = map_write_err("a@example.com", &err);
        assert!(matches!(mapped, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_delete_by_id() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = AccountRepository::new(db);
        let result = repo.delete_by_id("ab12cd").await;

        assert!(result.is_ok());
    }
}
