mod common;

use anyhow::Result;
use axum::http::StatusCode;

#[tokio::test]
async fn links_follow_limit_and_offset() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let user = app.create_user().await?;
    for _ in 0..5 {
        app.create_classifier(&user).await?;
    }

    let res = app.get("/classifiers?limit=2", None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["count"], 5);
    assert_eq!(res.body["results"].as_array().unwrap().len(), 2);
    assert_eq!(res.body["next"], "http://testserver/classifiers?limit=2&offset=2");
    assert!(res.body["previous"].is_null());

    let res = app.get("/classifiers?limit=2&offset=2", None).await?;
    assert_eq!(res.body["next"], "http://testserver/classifiers?limit=2&offset=4");
    assert_eq!(res.body["previous"], "http://testserver/classifiers?limit=2");

    let res = app.get("/classifiers?limit=2&offset=4", None).await?;
    assert_eq!(res.body["results"].as_array().unwrap().len(), 1);
    assert!(res.body["next"].is_null());
    assert_eq!(res.body["previous"], "http://testserver/classifiers?limit=2&offset=2");
    Ok(())
}

#[tokio::test]
async fn links_keep_other_parameters() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let user = app.create_user().await?;
    for _ in 0..3 {
        app.create_classifier(&user).await?;
    }

    let res = app.get("/classifiers?expand=user&limit=1", None).await?;
    assert_eq!(
        res.body["next"],
        "http://testserver/classifiers?expand=user&limit=1&offset=1"
    );
    Ok(())
}

#[tokio::test]
async fn page_size_is_capped() -> Result<()> {
    let app = common::TestApp::with_config(|c| {
        c.api.page_size = 1;
        c.api.max_page_size = 2;
    })
    .await?;
    let user = app.create_user().await?;
    for _ in 0..3 {
        app.create_classifier(&user).await?;
    }

    let res = app.get("/classifiers", None).await?;
    assert_eq!(res.body["results"].as_array().unwrap().len(), 1);

    let res = app.get("/classifiers?limit=50", None).await?;
    assert_eq!(res.body["results"].as_array().unwrap().len(), 2);
    Ok(())
}

#[tokio::test]
async fn huge_offset_returns_empty_last_page() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let user = app.create_user().await?;
    app.create_classifier(&user).await?;

    for resource in ["classifiers", "genes", "diseases"] {
        let res = app
            .get(&format!("/{}?offset=9223372036854775807", resource), None)
            .await?;
        assert_eq!(res.status, StatusCode::OK, "{}", resource);
        assert!(res.body["next"].is_null(), "{}", resource);
        assert!(res.body["results"].as_array().unwrap().is_empty(), "{}", resource);
    }
    Ok(())
}

#[tokio::test]
async fn previous_from_inside_first_page_drops_offset() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let user = app.create_user().await?;
    for _ in 0..4 {
        app.create_classifier(&user).await?;
    }

    let res = app.get("/classifiers?limit=2&offset=1", None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["previous"], "http://testserver/classifiers?limit=2");
    assert_eq!(res.body["next"], "http://testserver/classifiers?limit=2&offset=3");
    Ok(())
}

#[tokio::test]
async fn invalid_limit_and_offset_fall_back_to_defaults() -> Result<()> {
    let app = common::TestApp::with_config(|c| c.api.page_size = 2).await?;
    let user = app.create_user().await?;
    for _ in 0..3 {
        app.create_classifier(&user).await?;
    }

    let res = app.get("/classifiers?limit=abc&offset=-5", None).await?;
    assert_eq!(res.status, StatusCode::OK);
    let results = res.body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["id"], 1);
    assert!(res.body["previous"].is_null());
    assert_eq!(res.body["next"], "http://testserver/classifiers?limit=2&offset=2");

    let res = app.get("/classifiers?limit=0", None).await?;
    assert_eq!(res.body["results"].as_array().unwrap().len(), 2);
    Ok(())
}
