use super::*;
use crate::database::Database;
use tempfile::TempDir;

async fn setup_database() -> (TempDir, Database) {
    let dir = TempDir::new().unwrap();
    let db = Database::initialize_from_config_dir(dir.path())
        .await
        .unwrap();
    (dir, db)
}

#[tokio::test]
async fn bootstrap_role_assignment() {
    let (_dir, db) = setup_database().await;
    let pool = db.pool();

    let first = UserQueries::create_with_bootstrap_role(pool, "alice", "h")
        .await
        .unwrap();
    assert_eq!(first.role, Role::Admin);

    let second = UserQueries::create_with_bootstrap_role(pool, "bob", "h")
        .await
        .unwrap();
    assert_eq!(second.role, Role::Employee);

    let third = UserQueries::create_with_bootstrap_role(pool, "carol", "h")
        .await
        .unwrap();
    assert_eq!(third.role, Role::Employee);
}

#[tokio::test]
async fn get_by_id_and_username_agree() {
    let (_dir, db) = setup_database().await;
    let pool = db.pool();

    let created = UserQueries::create_with_bootstrap_role(pool, "alice", "h")
        .await
        .unwrap();

    let by_id = UserQueries::get_by_id(pool, created.id).await.unwrap();
    let by_name = UserQueries::get_by_username(pool, "alice").await.unwrap();
    assert_eq!(by_id, Some(created.clone()));
    assert_eq!(by_name, Some(created));
}

#[tokio::test]
async fn count_tracks_inserts() {
    let (_dir, db) = setup_database().await;
    let pool = db.pool();

    assert_eq!(UserQueries::count(pool).await.unwrap(), 0);
    UserQueries::create_with_bootstrap_role(pool, "alice", "h")
        .await
        .unwrap();
    assert_eq!(UserQueries::count(pool).await.unwrap(), 1);
}

#[tokio::test]
async fn document_log_create_and_list() {
    let (_dir, db) = setup_database().await;
    let pool = db.pool();

    let created = DocumentLogQueries::create(
        pool,
        NewDocumentLogEntry {
            filename: "q3.pdf".to_string(),
            username: "alice".to_string(),
            role: Role::Admin,
        },
    )
    .await
    .unwrap();

    let fetched = DocumentLogQueries::get_by_id(pool, created.id)
        .await
        .unwrap();
    assert_eq!(fetched, Some(created.clone()));

    let all = DocumentLogQueries::list_all(pool).await.unwrap();
    assert_eq!(all, vec![created]);
}

#[tokio::test]
async fn document_log_list_by_role_excludes_others() {
    let (_dir, db) = setup_database().await;
    let pool = db.pool();

    DocumentLogQueries::create(
        pool,
        NewDocumentLogEntry {
            filename: "a.pdf".to_string(),
            username: "alice".to_string(),
            role: Role::Admin,
        },
    )
    .await
    .unwrap();
    DocumentLogQueries::create(
        pool,
        NewDocumentLogEntry {
            filename: "b.pdf".to_string(),
            username: "bob".to_string(),
            role: Role::Employee,
        },
    )
    .await
    .unwrap();

    let employee = DocumentLogQueries::list_by_role(pool, Role::Employee)
        .await
        .unwrap();
    assert_eq!(employee.len(), 1);
    assert_eq!(employee[0].filename, "b.pdf");
}
