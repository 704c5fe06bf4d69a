use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::api::{ClassifierView, Expand, ListQuery, Paginated, Pagination, RequestUrl, Serializer};
use crate::auth::ensure_owner;
use crate::database::models::{ClassifierChanges, NewClassifier};
use crate::database::store::Store;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, MaybeUser};
use crate::state::AppState;

use super::ExpandQuery;

/// Request body for classifier writes. Read-only fields in the body
/// (`id`, `user`, timestamps) are accepted and ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ClassifierPayload {
    #[serde(default)]
    pub genes: Option<Vec<i64>>,
    #[serde(default)]
    pub diseases: Option<Vec<String>>,
    #[serde(default, deserialize_with = "present")]
    pub task_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    pub results: Option<Option<Value>>,
}

/// Distinguish an explicit `null` from an absent key
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::field_error(field, "This field is required."))
}

/// Every referenced gene and disease must exist
async fn validate_references(
    store: &dyn Store,
    genes: Option<&[i64]>,
    diseases: Option<&[String]>,
) -> Result<(), ApiError> {
    if let Some(genes) = genes {
        let found = store.get_genes(genes).await?;
        if let Some(missing) = genes.iter().find(|id| !found.iter().any(|g| g.id == **id)) {
            return Err(ApiError::field_error(
                "genes",
                format!("Invalid pk \"{}\" - object does not exist.", missing),
            ));
        }
    }
    if let Some(diseases) = diseases {
        let found = store.get_diseases(diseases).await?;
        if let Some(missing) = diseases
            .iter()
            .find(|acronym| !found.iter().any(|d| &d.acronym == *acronym))
        {
            return Err(ApiError::field_error(
                "diseases",
                format!("Invalid pk \"{}\" - object does not exist.", missing),
            ));
        }
    }
    Ok(())
}

/// POST /classifiers
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<ClassifierPayload>, JsonRejection>,
) -> ApiResult<ClassifierView> {
    let Json(payload) = payload?;
    let genes = required(payload.genes, "genes")?;
    let diseases = required(payload.diseases, "diseases")?;
    validate_references(state.store.as_ref(), Some(genes.as_slice()), Some(diseases.as_slice())).await?;

    let classifier = state
        .store
        .create_classifier(NewClassifier {
            user_id: user.id,
            genes,
            diseases,
            task_id: payload.task_id.flatten(),
            results: payload.results.flatten(),
        })
        .await?;

    tracing::info!("User {} created classifier {}", user.id, classifier.id);

    let view = Serializer::new(state.store.as_ref(), Some(user.id))
        .classifier(classifier, &Expand::none())
        .await?;
    Ok(ApiResponse::created(view))
}

/// GET /classifiers
pub async fn list(
    State(state): State<AppState>,
    viewer: MaybeUser,
    RequestUrl(url): RequestUrl,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Paginated<ClassifierView>> {
    let Query(query) = query?;
    let pagination = Pagination::from_query(&query, &state.config.api);
    let expand = Expand::parse(query.expand.as_deref());

    let page = state
        .store
        .list_classifiers(pagination.limit, pagination.offset)
        .await?;
    let results = Serializer::new(state.store.as_ref(), viewer.id())
        .classifiers(page.rows, &expand)
        .await?;

    Ok(ApiResponse::success(Paginated::new(results, page.total, pagination, &url)))
}

/// GET /classifiers/:id
pub async fn show(
    State(state): State<AppState>,
    viewer: MaybeUser,
    id: Result<Path<i64>, PathRejection>,
    query: Result<Query<ExpandQuery>, QueryRejection>,
) -> ApiResult<ClassifierView> {
    let Path(id) = id?;
    let Query(query) = query?;
    let classifier = state
        .store
        .get_classifier(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Classifier {} not found", id)))?;

    let view = Serializer::new(state.store.as_ref(), viewer.id())
        .classifier(classifier, &Expand::parse(query.expand.as_deref()))
        .await?;
    Ok(ApiResponse::success(view))
}

/// PUT /classifiers/:id - full update; `genes` and `diseases` are required
pub async fn replace(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ClassifierPayload>, JsonRejection>,
) -> ApiResult<ClassifierView> {
    update(state, user, id, payload, true).await
}

/// PATCH /classifiers/:id - partial update
pub async fn modify(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ClassifierPayload>, JsonRejection>,
) -> ApiResult<ClassifierView> {
    update(state, user, id, payload, false).await
}

async fn update(
    state: AppState,
    AuthUser(user): AuthUser,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ClassifierPayload>, JsonRejection>,
    full: bool,
) -> ApiResult<ClassifierView> {
    let Path(id) = id?;
    let existing = state
        .store
        .get_classifier(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Classifier {} not found", id)))?;

    // Ownership is settled before the body is looked at
    ensure_owner(user.id, existing.user_id)?;

    let Json(payload) = payload?;
    let (genes, diseases) = if full {
        (
            Some(required(payload.genes, "genes")?),
            Some(required(payload.diseases, "diseases")?),
        )
    } else {
        (payload.genes, payload.diseases)
    };
    validate_references(state.store.as_ref(), genes.as_deref(), diseases.as_deref()).await?;

    let changes = ClassifierChanges {
        genes,
        diseases,
        task_id: payload.task_id,
        results: payload.results,
    };

    let classifier = if changes.is_empty() {
        existing
    } else {
        state.store.update_classifier(id, changes).await?
    };

    tracing::info!("User {} updated classifier {}", user.id, classifier.id);

    let view = Serializer::new(state.store.as_ref(), Some(user.id))
        .classifier(classifier, &Expand::none())
        .await?;
    Ok(ApiResponse::success(view))
}
