#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use cognoma_api::config::{AppConfig, StoreBackend};
use cognoma_api::database::models::{Disease, NewGene, NewOrganism};
use cognoma_api::database::{MemoryStore, Store};
use cognoma_api::{app, AppState};

/// In-process application backed by a seeded memory store
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub genes: Vec<i64>,
}

pub struct TestUser {
    pub id: i64,
    pub slug: String,
    pub body: Value,
}

pub struct Response {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Result<Self> {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(customize: impl FnOnce(&mut AppConfig)) -> Result<Self> {
        let mut config = AppConfig::from_env();
        config.server.store = StoreBackend::Memory;
        config.api.page_size = 100;
        config.api.max_page_size = 1000;
        config.api.enable_request_logging = false;
        config.security.slug_count = 5;
        customize(&mut config);

        let store = Arc::new(MemoryStore::new());
        let genes = seed(store.as_ref()).await?;
        let router = app(AppState::new(store.clone(), config));

        Ok(Self { router, store, genes })
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        slug: Option<&str>,
        body: Option<Value>,
    ) -> Result<Response> {
        let authorization = slug.map(|slug| format!("Bearer {}", slug));
        self.send(method, uri, authorization.as_deref(), body).await
    }

    /// Send with a raw `Authorization` header value
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> Result<Response> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::HOST, "testserver");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .context("router failed")?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .with_context(|| format!("non-JSON body: {}", String::from_utf8_lossy(&bytes)))?
        };

        Ok(Response { status, body })
    }

    pub async fn get(&self, uri: &str, slug: Option<&str>) -> Result<Response> {
        self.request(Method::GET, uri, slug, None).await
    }

    pub async fn post(&self, uri: &str, slug: Option<&str>, body: Value) -> Result<Response> {
        self.request(Method::POST, uri, slug, Some(body)).await
    }

    pub async fn put(&self, uri: &str, slug: Option<&str>, body: Value) -> Result<Response> {
        self.request(Method::PUT, uri, slug, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, slug: Option<&str>, body: Value) -> Result<Response> {
        self.request(Method::PATCH, uri, slug, Some(body)).await
    }

    /// Register a user through the API and keep its first slug
    pub async fn create_user(&self) -> Result<TestUser> {
        let res = self.post("/users", None, json!({})).await?;
        anyhow::ensure!(res.status == StatusCode::CREATED, "user create failed: {}", res.body);

        let id = res.body["id"].as_i64().context("user id")?;
        let slug = res.body["random_slugs"][0]
            .as_str()
            .context("user slug")?
            .to_string();
        Ok(TestUser { id, slug, body: res.body })
    }

    pub fn classifier_body(&self) -> Value {
        json!({
            "genes": self.genes,
            "diseases": ["BLCA", "GBM"],
        })
    }

    pub async fn create_classifier(&self, user: &TestUser) -> Result<Value> {
        let res = self
            .post("/classifiers", Some(&user.slug), self.classifier_body())
            .await?;
        anyhow::ensure!(
            res.status == StatusCode::CREATED,
            "classifier create failed: {} {}",
            res.status,
            res.body
        );
        Ok(res.body)
    }
}

async fn seed(store: &MemoryStore) -> Result<Vec<i64>> {
    let human = store
        .insert_organism(NewOrganism {
            taxonomy_id: 9606,
            common_name: "human".into(),
            scientific_name: "Homo sapiens".into(),
            slug: "homo-sapiens".into(),
        })
        .await?;

    let mut genes = Vec::new();
    for (entrezid, name, description) in [
        (7157, "TP53", "tumor protein p53"),
        (7422, "VEGFA", "vascular endothelial growth factor A"),
    ] {
        let gene = store
            .insert_gene(NewGene {
                entrezid,
                systematic_name: name.into(),
                standard_name: None,
                description: description.into(),
                organism_id: human.id,
                aliases: None,
                obsolete: false,
                weight: 1.0,
            })
            .await?;
        genes.push(gene.id);
    }

    for (acronym, name) in [
        ("BLCA", "bladder urothelial carcinoma"),
        ("GBM", "glioblastoma multiforme"),
    ] {
        store
            .upsert_disease(Disease {
                acronym: acronym.into(),
                name: name.into(),
            })
            .await?;
    }

    Ok(genes)
}
