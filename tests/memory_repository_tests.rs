use chrono::{TimeDelta, Utc};
use meditool_hub::{
    InMemoryRepository,
    models::{InsertProduct, NewBlogPost, NewUser, Session, UpdateBlogPost, UpdateProduct},
    repository::{Repository, RepositoryError},
};
use uuid::Uuid;

fn product_form(name: &str, category: &str) -> InsertProduct {
    InsertProduct {
        name: name.to_string(),
        description: format!("{name} description"),
        price: 1000,
        category: category.to_string(),
        image_url: format!("{}.png", name.to_lowercase()),
    }
}

fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        password_hash: "hash".to_string(),
        first_name: "First".to_string(),
        last_name: "Last".to_string(),
        is_business_account: false,
        business_name: None,
        address: None,
        allow_notifications: true,
        is_admin: false,
    }
}

#[tokio::test]
async fn test_products_get_sequential_ids_in_order() {
    let repo = InMemoryRepository::new();

    let first = repo.create_product(product_form("Scalpel", "Surgical")).await.unwrap();
    let second = repo
        .create_product(product_form("Stethoscope", "Diagnostic"))
        .await
        .unwrap();

    assert_eq!(first.id, 1);
    assert_eq!(second.id, 2);

    let all = repo.get_products().await.unwrap();
    assert_eq!(all, vec![first.clone(), second]);
    assert_eq!(repo.get_product(1).await.unwrap(), Some(first));
    assert_eq!(repo.get_product(99).await.unwrap(), None);
}

#[tokio::test]
async fn test_ids_are_not_reused_after_delete() {
    let repo = InMemoryRepository::new();
    let first = repo.create_product(product_form("Gauze", "Consumables")).await.unwrap();

    assert!(repo.delete_product(first.id).await.unwrap());
    assert!(!repo.delete_product(first.id).await.unwrap());

    let next = repo.create_product(product_form("Tape", "Consumables")).await.unwrap();
    assert_eq!(next.id, first.id + 1);
}

#[tokio::test]
async fn test_update_product_merges_and_reports_missing() {
    let repo = InMemoryRepository::new();
    let created = repo.create_product(product_form("Scalpel", "Surgical")).await.unwrap();

    let updated = repo
        .update_product(
            created.id,
            UpdateProduct {
                price: Some(1500),
                ..UpdateProduct::default()
            },
        )
        .await
        .unwrap()
        .expect("product exists");

    assert_eq!(updated.price, 1500);
    assert_eq!(updated.name, "Scalpel");
    assert_eq!(repo.get_product(created.id).await.unwrap(), Some(updated));

    let missing = repo
        .update_product(404, UpdateProduct::default())
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_blog_post_lifecycle() {
    let repo = InMemoryRepository::new();
    let post = repo
        .create_blog_post(NewBlogPost {
            title: "Sterilization basics".to_string(),
            content: "Body".to_string(),
            image_url: "steril.png".to_string(),
            author_id: 5,
            created_at: "2025-01-01T00:00:00Z".to_string(),
        })
        .await
        .unwrap();

    let updated = repo
        .update_blog_post(
            post.id,
            UpdateBlogPost {
                title: Some("Sterilization 101".to_string()),
                ..UpdateBlogPost::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.title, "Sterilization 101");
    assert_eq!(updated.author_id, 5);

    assert!(repo.delete_blog_post(post.id).await.unwrap());
    assert!(repo.get_blog_posts().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_username_uniqueness() {
    let repo = InMemoryRepository::new();
    let user = repo.create_user(new_user("nurse")).await.unwrap();
    assert!(!user.is_admin);

    let duplicate = repo.create_user(new_user("nurse")).await;
    assert!(matches!(duplicate, Err(RepositoryError::UsernameTaken)));

    let found = repo.get_user_by_username("nurse").await.unwrap();
    assert_eq!(found, Some(user));
    assert!(repo.get_user_by_username("doctor").await.unwrap().is_none());
}

#[tokio::test]
async fn test_sessions() {
    let repo = InMemoryRepository::new();
    let session = Session {
        id: Uuid::new_v4(),
        user_id: 1,
        expires_at: Utc::now() + TimeDelta::hours(1),
    };

    repo.create_session(session.clone()).await.unwrap();
    assert_eq!(repo.get_session(session.id).await.unwrap(), Some(session.clone()));

    assert!(repo.delete_session(session.id).await.unwrap());
    assert!(!repo.delete_session(session.id).await.unwrap());
    assert!(repo.get_session(session.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_expired_sessions() {
    let repo = InMemoryRepository::new();
    let now = Utc::now();
    let lapsed = Session {
        id: Uuid::new_v4(),
        user_id: 1,
        expires_at: now - TimeDelta::minutes(1),
    };
    let boundary = Session {
        id: Uuid::new_v4(),
        user_id: 1,
        expires_at: now,
    };
    let live = Session {
        id: Uuid::new_v4(),
        user_id: 2,
        expires_at: now + TimeDelta::hours(1),
    };
    for session in [&lapsed, &boundary, &live] {
        repo.create_session(session.clone()).await.unwrap();
    }

    assert_eq!(repo.delete_expired_sessions(now).await.unwrap(), 2);
    assert!(repo.get_session(lapsed.id).await.unwrap().is_none());
    assert!(repo.get_session(boundary.id).await.unwrap().is_none());
    assert_eq!(repo.get_session(live.id).await.unwrap(), Some(live));

    assert_eq!(repo.delete_expired_sessions(now).await.unwrap(), 0);
}
