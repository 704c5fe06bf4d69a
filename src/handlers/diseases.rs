use axum::extract::{
    rejection::{PathRejection, QueryRejection},
    Path, Query, State,
};

use crate::api::{ListQuery, Paginated, Pagination, RequestUrl};
use crate::database::models::Disease;
use crate::database::store::Store;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /diseases
pub async fn list(
    State(state): State<AppState>,
    RequestUrl(url): RequestUrl,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Paginated<Disease>> {
    let Query(query) = query?;
    let pagination = Pagination::from_query(&query, &state.config.api);

    let page = state
        .store
        .list_diseases(pagination.limit, pagination.offset)
        .await?;
    Ok(ApiResponse::success(Paginated::new(page.rows, page.total, pagination, &url)))
}

/// GET /diseases/:acronym
pub async fn show(
    State(state): State<AppState>,
    acronym: Result<Path<String>, PathRejection>,
) -> ApiResult<Disease> {
    let Path(acronym) = acronym?;
    let disease = state
        .store
        .get_disease(&acronym)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Disease '{}' not found", acronym)))?;
    Ok(ApiResponse::success(disease))
}
