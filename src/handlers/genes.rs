use axum::extract::{
    rejection::{PathRejection, QueryRejection},
    Path, Query, State,
};

use crate::api::{Expand, GeneView, ListQuery, Paginated, Pagination, RequestUrl, Serializer};
use crate::database::store::Store;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, MaybeUser};
use crate::state::AppState;

use super::ExpandQuery;

/// GET /genes - supports `expand=organism`
pub async fn list(
    State(state): State<AppState>,
    viewer: MaybeUser,
    RequestUrl(url): RequestUrl,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Paginated<GeneView>> {
    let Query(query) = query?;
    let pagination = Pagination::from_query(&query, &state.config.api);

    let page = state.store.list_genes(pagination.limit, pagination.offset).await?;
    let results = Serializer::new(state.store.as_ref(), viewer.id())
        .genes(page.rows, &Expand::parse(query.expand.as_deref()))
        .await?;

    Ok(ApiResponse::success(Paginated::new(results, page.total, pagination, &url)))
}

/// GET /genes/:id
pub async fn show(
    State(state): State<AppState>,
    viewer: MaybeUser,
    id: Result<Path<i64>, PathRejection>,
    query: Result<Query<ExpandQuery>, QueryRejection>,
) -> ApiResult<GeneView> {
    let Path(id) = id?;
    let Query(query) = query?;
    let gene = state
        .store
        .get_gene(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Gene {} not found", id)))?;

    let view = Serializer::new(state.store.as_ref(), viewer.id())
        .gene(gene, &Expand::parse(query.expand.as_deref()))
        .await?;
    Ok(ApiResponse::success(view))
}
