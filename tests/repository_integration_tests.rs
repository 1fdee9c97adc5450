//! Runs against a real Postgres when `DATABASE_URL` is set; otherwise every
//! test returns early.

use inventory_api::{
    error::RepositoryError,
    models::{CreateProductRequest, NewUser},
    repository::{self, PostgresRepository, Repository},
};
use serial_test::serial;

async fn setup() -> Option<PostgresRepository> {
    dotenv::dotenv().ok();
    let db_url = std::env::var("DATABASE_URL").ok()?;

    let pool = repository::connect_database(&db_url).await;
    sqlx::query("TRUNCATE products, users RESTART IDENTITY")
        .execute(&pool)
        .await
        .expect("Failed to reset tables");

    Some(PostgresRepository::new(pool))
}

fn product(name: &str, price: f64) -> CreateProductRequest {
    CreateProductRequest {
        name: name.to_string(),
        price,
        availability: None,
    }
}

#[tokio::test]
#[serial]
async fn test_product_lifecycle() {
    let Some(repo) = setup().await else {
        return;
    };

    let created = repo.create_product(product("Monitor", 300.0)).await.unwrap();
    assert!(created.availability);
    assert_eq!(created.price, 300.0);

    let mut found = repo.find_product(created.id).await.unwrap().unwrap();
    assert_eq!(found, created);

    found.availability = false;
    found.name = "Monitor 4K".to_string();
    let saved = repo.save_product(&found).await.unwrap();
    assert_eq!(saved.name, "Monitor 4K");
    assert!(!saved.availability);
    assert!(saved.updated_at >= created.updated_at);

    repo.delete_product(created.id).await.unwrap();
    assert!(repo.find_product(created.id).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn test_list_is_newest_first() {
    let Some(repo) = setup().await else {
        return;
    };

    for name in ["a", "b", "c"] {
        repo.create_product(product(name, 1.0)).await.unwrap();
    }

    let names: Vec<String> = repo
        .list_products()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["c", "b", "a"]);
}

#[tokio::test]
#[serial]
async fn test_user_email_is_unique() {
    let Some(repo) = setup().await else {
        return;
    };
    let new_user = || NewUser {
        name: "Ana".to_string(),
        email: "ana@correo.com".to_string(),
        password_hash: "hash".to_string(),
    };

    let user = repo.create_user(new_user()).await.unwrap();
    assert!(!user.confirmed);

    let profile = repo.find_user_profile(user.id).await.unwrap().unwrap();
    assert_eq!(profile.email, "ana@correo.com");

    let duplicate = repo.create_user(new_user()).await;
    assert!(matches!(duplicate, Err(RepositoryError::Conflict(_))));
}
