mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn user_can_read_self() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let user = app.create_user().await?;

    let res = app.get(&format!("/users/{}", user.id), Some(&user.slug)).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["id"], user.id);
    assert_eq!(res.body["random_slugs"], user.body["random_slugs"]);
    Ok(())
}

#[tokio::test]
async fn reading_user_requires_login() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let user = app.create_user().await?;

    let res = app.get(&format!("/users/{}", user.id), None).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn other_user_is_forbidden() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let owner = app.create_user().await?;
    let other = app.create_user().await?;

    let res = app.get(&format!("/users/{}", owner.id), Some(&other.slug)).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app
        .patch(&format!("/users/{}", owner.id), Some(&other.slug), json!({"name": "x"}))
        .await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn update_profile() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let user = app.create_user().await?;

    let res = app
        .put(
            &format!("/users/{}", user.id),
            Some(&user.slug),
            json!({"name": "Grace", "email": "grace@example.org"}),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["name"], "Grace");
    assert_eq!(res.body["email"], "grace@example.org");

    // Omitted fields are left alone
    let res = app
        .patch(&format!("/users/{}", user.id), Some(&user.slug), json!({"name": "Hopper"}))
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["name"], "Hopper");
    assert_eq!(res.body["email"], "grace@example.org");
    Ok(())
}

#[tokio::test]
async fn rotating_slugs_retires_oldest() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let user = app.create_user().await?;
    let before: Vec<String> = serde_json::from_value(user.body["random_slugs"].clone())?;

    let res = app
        .post(&format!("/users/{}/slugs", user.id), Some(&user.slug), json!({}))
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    let after: Vec<String> = serde_json::from_value(res.body["random_slugs"].clone())?;

    assert_eq!(after.len(), before.len());
    assert!(!before.contains(&after[0]));
    assert_eq!(&after[1..], &before[..before.len() - 1]);

    // The retired slug no longer authenticates; the fresh one does
    let retired = before.last().unwrap();
    let res = app.get(&format!("/users/{}", user.id), Some(retired)).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app.get(&format!("/users/{}", user.id), Some(&after[0])).await?;
    assert_eq!(res.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn unknown_user_id_is_forbidden_not_leaked() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let user = app.create_user().await?;

    let res = app.get("/users/9999", Some(&user.slug)).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    Ok(())
}
