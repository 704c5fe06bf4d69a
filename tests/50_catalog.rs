mod common;

use anyhow::Result;
use axum::http::StatusCode;

#[tokio::test]
async fn list_and_show_genes() -> Result<()> {
    let app = common::TestApp::spawn().await?;

    let res = app.get("/genes", None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["count"], 2);
    assert_eq!(res.body["results"][0]["systematic_name"], "TP53");
    assert!(res.body["results"][0]["organism"].is_number());

    let res = app
        .get(&format!("/genes/{}?expand=organism", app.genes[1]), None)
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["entrezid"], 7422);
    assert_eq!(res.body["organism"]["taxonomy_id"], 9606);

    let res = app.get("/genes/424242", None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn list_and_show_diseases() -> Result<()> {
    let app = common::TestApp::spawn().await?;

    let res = app.get("/diseases", None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["count"], 2);
    assert_eq!(res.body["results"][0]["acronym"], "BLCA");

    let res = app.get("/diseases/GBM", None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["name"], "glioblastoma multiforme");

    let res = app.get("/diseases/XYZ", None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}
