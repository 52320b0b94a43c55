//! Database-level tests for the vendor tree and its reachable-set scoping.
//!
//! These talk to `PostgreSQL` directly through the server's repositories,
//! no HTTP server needed.
//!
//! Requires `COURIERHUB_DATABASE_URL` (or `DATABASE_URL`) pointing at a
//! migrated database.

use secrecy::SecretString;
use sqlx::PgPool;
use uuid::Uuid;

use courierhub_core::Email;
use courierhub_server::db::{self, VendorRepository};
use courierhub_server::services::{VendorError, VendorService};

async fn test_pool() -> PgPool {
    let url = std::env::var("COURIERHUB_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .expect("COURIERHUB_DATABASE_URL not set");
    db::create_pool(&url).await.expect("Failed to connect")
}

fn unique_email() -> Email {
    Email::parse(&format!("{}@example.com", Uuid::new_v4())).expect("valid email")
}

#[tokio::test]
#[ignore = "Requires migrated database"]
async fn test_reachable_set_covers_descendants_only() {
    let pool = test_pool().await;
    let repo = VendorRepository::new(&pool);
    let tag = Uuid::new_v4().simple().to_string();

    let root = repo
        .create(&format!("IT-ROOT-{tag}"), "addr", &unique_email(), None)
        .await
        .expect("Failed to create root");
    let child = repo
        .create(
            &format!("IT-CHILD-{tag}"),
            "addr",
            &unique_email(),
            Some(root.id),
        )
        .await
        .expect("Failed to create child");
    let grandchild = repo
        .create(
            &format!("IT-GRANDCHILD-{tag}"),
            "addr",
            &unique_email(),
            Some(child.id),
        )
        .await
        .expect("Failed to create grandchild");
    let sibling = repo
        .create(&format!("IT-SIBLING-{tag}"), "addr", &unique_email(), None)
        .await
        .expect("Failed to create sibling");

    let service = VendorService::new(&pool);

    let from_root = service
        .reachable_vendor_ids(root.id)
        .await
        .expect("BFS failed");
    assert!(from_root.contains(&root.id));
    assert!(from_root.contains(&child.id));
    assert!(from_root.contains(&grandchild.id));
    assert!(!from_root.contains(&sibling.id));

    // A leaf reaches only itself.
    let from_leaf = service
        .reachable_vendor_ids(grandchild.id)
        .await
        .expect("BFS failed");
    assert_eq!(from_leaf, vec![grandchild.id]);
}

#[tokio::test]
#[ignore = "Requires migrated database"]
async fn test_child_named_after_parent_reports_self_parent() {
    let pool = test_pool().await;
    let repo = VendorRepository::new(&pool);
    let name = format!("IT-SELF-{}", Uuid::new_v4().simple());

    let parent = repo
        .create(&name, "addr", &unique_email(), None)
        .await
        .expect("Failed to create parent");

    let result = VendorService::new(&pool)
        .create(&name, "addr", &unique_email(), Some(parent.id))
        .await;
    assert!(
        matches!(result, Err(VendorError::SelfParent)),
        "expected SelfParent, got {result:?}"
    );
}

#[tokio::test]
#[ignore = "Requires migrated database"]
async fn test_vendor_names_are_unique() {
    let pool = test_pool().await;
    let repo = VendorRepository::new(&pool);
    let name = format!("IT-DUP-{}", Uuid::new_v4().simple());

    repo.create(&name, "addr", &unique_email(), None)
        .await
        .expect("Failed to create vendor");

    let dup = repo.create(&name, "addr", &unique_email(), None).await;
    assert!(dup.is_err(), "duplicate vendor name must be rejected");
}
