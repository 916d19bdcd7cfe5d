use futures::TryStreamExt as _;
use sqlx::Executor;
use turgus_dal::Error;
use turgus_dal::bookmark::BookmarkRepositoryImpl;

const TEST_DATA: &str = r#"
INSERT INTO users (id, username, email, contacts, created)
VALUES (1,'jonas','jonas@example.com',NULL,'2024-01-01T08:00:00Z');

INSERT INTO category (id, name) VALUES (1,'Electronics');

INSERT INTO product (id, user_id, category_id, subcategory_id, name, price, description, amount_in_stock, image_url, created)
VALUES (1,1,1,NULL,'Wooden chair',10.0,NULL,3,NULL,'2024-02-01T10:00:00Z');
"#;

async fn init_db() -> sqlx::Pool<sqlx::Sqlite> {
    const DB_URL: &str = "sqlite::memory:";
    let conn = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .connect(DB_URL)
        .await
        .unwrap();
    conn.execute("PRAGMA foreign_keys = ON").await.unwrap();
    sqlx::migrate!("../../migrations").run(&conn).await.unwrap();

    conn.execute_many(TEST_DATA)
        .try_collect::<Vec<_>>()
        .await
        .unwrap();

    conn
}

#[tokio::test]
async fn test_bookmark_lifecycle() {
    let conn = init_db().await;
    let repo = BookmarkRepositoryImpl::new(conn);

    assert!(repo.find(1, 1).await.unwrap().is_none());

    let bookmark = repo.create(1, 1).await.unwrap();
    assert_eq!(bookmark.user_id, 1);
    assert_eq!(bookmark.product_id, 1);

    let found = repo.find(1, 1).await.unwrap().unwrap();
    assert_eq!(found.id, bookmark.id);

    // one bookmark per (user, product), enforced by the store
    let duplicate = repo.create(1, 1).await.unwrap_err();
    assert!(duplicate.is_unique_violation());
    assert!(matches!(duplicate, Error::DatabaseError(_)));

    repo.delete(1, 1).await.unwrap();
    assert!(repo.find(1, 1).await.unwrap().is_none());

    let missing = repo.delete(1, 1).await;
    assert!(matches!(missing, Err(Error::RecordNotFound(_))));
}
