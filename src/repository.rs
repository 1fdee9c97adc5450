use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use crate::{
    error::RepositoryError,
    models::{CreateProductRequest, NewUser, Product, User, UserProfile},
};

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository Trait
///
/// The persistence contract the handlers and the auth layer program against.
/// `Send + Sync` lets the trait object (`Arc<dyn Repository>`) cross Axum's
/// task boundaries.
///
/// Mutations are plain find-then-write sequences with no transaction or
/// version check: concurrent writers to the same product are last-writer-wins.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Products ---
    /// All products, highest id first.
    async fn list_products(&self) -> RepoResult<Vec<Product>>;
    async fn find_product(&self, id: i64) -> RepoResult<Option<Product>>;
    async fn create_product(&self, req: CreateProductRequest) -> RepoResult<Product>;
    /// Writes every mutable column of `product` back to its row.
    async fn save_product(&self, product: &Product) -> RepoResult<Product>;
    async fn delete_product(&self, id: i64) -> RepoResult<()>;

    // --- Users ---
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    /// Projection used by the auth layer: never loads the password column.
    async fn find_user_profile(&self, id: i64) -> RepoResult<Option<UserProfile>>;
    /// Fails with `RepositoryError::Conflict` when the email is taken.
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const PRODUCT_COLUMNS: &str = "id, name, price, availability, created_at, updated_at";
const USER_COLUMNS: &str = "id, name, email, password, confirmed, created_at, updated_at";

/// connect_database
///
/// Opens the Postgres pool and brings the schema up to date. A datastore that
/// is unreachable at startup is logged, not fatal: the server keeps running on
/// a lazily-connecting pool and every query fails until the database answers.
pub async fn connect_database(db_url: &str) -> PgPool {
    let options = db_url.parse::<PgConnectOptions>().unwrap_or_else(|e| {
        tracing::error!("DATABASE_URL could not be parsed, using PG* defaults: {:?}", e);
        PgConnectOptions::new()
    });
    let pool_options = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5));

    match pool_options.clone().connect_with(options.clone()).await {
        Ok(pool) => {
            tracing::info!("Database connection established.");
            if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
                tracing::error!("Failed to run database migrations: {:?}", e);
            }
            pool
        }
        Err(e) => {
            tracing::error!("Failed to connect to the database: {:?}", e);
            pool_options.connect_lazy_with(options)
        }
    }
}

/// Maps unique-constraint violations to `Conflict`; everything else stays a database error.
fn map_write_error(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            RepositoryError::Conflict(db_err.message().to_string())
        }
        _ => RepositoryError::Database(err),
    }
}

/// PostgresRepository
///
/// The production implementation of the `Repository` trait.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn list_products(&self) -> RepoResult<Vec<Product>> {
        let query = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id DESC");
        Ok(sqlx::query_as::<_, Product>(&query)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_product(&self, id: i64) -> RepoResult<Option<Product>> {
        let query = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        Ok(sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_product(&self, req: CreateProductRequest) -> RepoResult<Product> {
        let query = format!(
            "INSERT INTO products (name, price, availability, created_at, updated_at) \
             VALUES ($1, $2, $3, NOW(), NOW()) RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(req.name)
            .bind(req.price)
            .bind(req.availability.unwrap_or(true))
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn save_product(&self, product: &Product) -> RepoResult<Product> {
        let query = format!(
            "UPDATE products SET name = $2, price = $3, availability = $4, updated_at = NOW() \
             WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(product.id)
            .bind(&product.name)
            .bind(product.price)
            .bind(product.availability)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn delete_product(&self, id: i64) -> RepoResult<()> {
        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_profile(&self, id: i64) -> RepoResult<Option<UserProfile>> {
        Ok(
            sqlx::query_as::<_, UserProfile>("SELECT id, name, email FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let query = format!(
            "INSERT INTO users (name, email, password, confirmed, created_at, updated_at) \
             VALUES ($1, $2, $3, FALSE, NOW(), NOW()) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(user.name)
            .bind(user.email)
            .bind(user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }
}

/// MemoryRepository
///
/// An in-process `Repository` with the same observable semantics as the
/// Postgres one: sequential ids starting at 1, newest-first listing and a
/// unique email constraint. Backs the router-level tests.
#[derive(Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    products: Vec<Product>,
    users: Vec<User>,
    next_product_id: i64,
    next_user_id: i64,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        // A panic while holding the lock can not leave the tables half-written.
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn list_products(&self) -> RepoResult<Vec<Product>> {
        let mut products = self.tables().products.clone();
        products.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(products)
    }

    async fn find_product(&self, id: i64) -> RepoResult<Option<Product>> {
        Ok(self.tables().products.iter().find(|p| p.id == id).cloned())
    }

    async fn create_product(&self, req: CreateProductRequest) -> RepoResult<Product> {
        let mut tables = self.tables();
        tables.next_product_id += 1;
        let now = Utc::now();
        let product = Product {
            id: tables.next_product_id,
            name: req.name,
            price: req.price,
            availability: req.availability.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        tables.products.push(product.clone());
        Ok(product)
    }

    async fn save_product(&self, product: &Product) -> RepoResult<Product> {
        let mut tables = self.tables();
        let stored = tables
            .products
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or(RepositoryError::Database(sqlx::Error::RowNotFound))?;
        stored.name = product.name.clone();
        stored.price = product.price;
        stored.availability = product.availability;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete_product(&self, id: i64) -> RepoResult<()> {
        self.tables().products.retain(|p| p.id != id);
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        Ok(self.tables().users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_profile(&self, id: i64) -> RepoResult<Option<UserProfile>> {
        Ok(self
            .tables()
            .users
            .iter()
            .find(|u| u.id == id)
            .map(UserProfile::from))
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let mut tables = self.tables();
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict(format!(
                "email {} already registered",
                user.email
            )));
        }
        tables.next_user_id += 1;
        let now = Utc::now();
        let created = User {
            id: tables.next_user_id,
            name: user.name,
            email: user.email,
            password: user.password_hash,
            confirmed: false,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(created.clone());
        Ok(created)
    }
}
