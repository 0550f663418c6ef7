//! Sign-up, sessions and profiles against PostgreSQL.

use super::common::{test_client, unique};
use crm_insight::auth::{
    AuthService, Credentials, ProfileUpdate, SignUp, TokenStore, INVALID_CREDENTIALS,
};
use crm_insight::db::DatabaseClient;
use crm_insight::error::CrmError;
use tempfile::TempDir;

fn signup(email: &str) -> SignUp {
    SignUp {
        email: email.to_string(),
        password: "correct horse".to_string(),
        name: "Margaret Hamilton".to_string(),
    }
}

#[tokio::test]
async fn test_signup_signin_signout() {
    let Some(client) = test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let dir = TempDir::new().unwrap();
    let store = TokenStore::file_only(dir.path().join("session"));
    let auth = AuthService::new(client.pool(), &store, 7);
    let email = format!("{}@example.com", unique("user"));

    let user = auth.sign_up(signup(&email)).await.unwrap();
    assert_eq!(user.first_name, "Margaret");
    assert_eq!(user.last_name, "Hamilton");
    assert_eq!(auth.current_user().await.unwrap(), Some(user.clone()));

    let duplicate = auth.sign_up(signup(&email.to_uppercase())).await.unwrap_err();
    assert_eq!(duplicate.message(), "User already exists");

    assert!(auth.sign_out().await.unwrap());
    assert_eq!(auth.current_user().await.unwrap(), None);
    assert!(!auth.sign_out().await.unwrap());
    assert!(matches!(
        auth.require_user().await,
        Err(CrmError::Auth(_))
    ));

    let wrong = auth
        .sign_in(Credentials {
            email: email.clone(),
            password: "wrong password".to_string(),
        })
        .await
        .unwrap_err();
    let unknown = auth
        .sign_in(Credentials {
            email: format!("{}@example.com", unique("nobody")),
            password: "correct horse".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(wrong.message(), INVALID_CREDENTIALS);
    assert_eq!(unknown.message(), INVALID_CREDENTIALS);

    let signed_in = auth
        .sign_in(Credentials {
            email: email.clone(),
            password: "correct horse".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(signed_in.id, user.id);
    assert_eq!(auth.require_user().await.unwrap().id, user.id);

    auth.sign_out().await.unwrap();
    sqlx::query("DELETE FROM app_users WHERE id = $1")
        .bind(user.id)
        .execute(client.pool())
        .await
        .unwrap();
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_profile_update() {
    let Some(client) = test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let dir = TempDir::new().unwrap();
    let store = TokenStore::file_only(dir.path().join("session"));
    let auth = AuthService::new(client.pool(), &store, 1);
    let email = format!("{}@example.com", unique("profile"));

    let user = auth.sign_up(signup(&email)).await.unwrap();
    let updated = auth
        .update_profile(ProfileUpdate {
            first_name: "Maggie".to_string(),
            last_name: "Hamilton".to_string(),
            email: email.clone(),
            image_url: Some("https://example.com/m.png".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(updated.id, user.id);
    assert_eq!(updated.first_name, "Maggie");
    assert_eq!(updated.image_url.as_deref(), Some("https://example.com/m.png"));

    let invalid = auth
        .update_profile(ProfileUpdate {
            first_name: "M".to_string(),
            last_name: "Hamilton".to_string(),
            email,
            image_url: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(invalid, CrmError::Validation(_)));

    auth.sign_out().await.unwrap();
    sqlx::query("DELETE FROM app_users WHERE id = $1")
        .bind(user.id)
        .execute(client.pool())
        .await
        .unwrap();
    client.close().await.unwrap();
}
