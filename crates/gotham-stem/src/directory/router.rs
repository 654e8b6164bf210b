use std::sync::Arc;

use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::get;
use axum::Router;

use super::service::DirectoryService;
use super::views;
use crate::pages::router::{html, not_found, store_failure};
use crate::pages::service::SiteService;
use crate::store::StoreError;

#[derive(Clone)]
pub struct DirectoryState {
    pub directory: Arc<DirectoryService>,
    pub site: Arc<SiteService>,
}

pub fn directory_router(directory: Arc<DirectoryService>, site: Arc<SiteService>) -> Router {
    Router::new()
        .route(views::PROGRAMS_PATH, get(program_index_handler))
        .route("/programs/:slug", get(program_detail_handler))
        .route(views::RESOURCES_PATH, get(resource_index_handler))
        .with_state(DirectoryState { directory, site })
}

/// Filter widgets refresh the listing with an XHR and expect only the results block.
fn wants_fragment(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case("XMLHttpRequest"))
}

pub(crate) async fn program_index_handler(
    State(state): State<DirectoryState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let index = match state.directory.program_index().await {
        Ok(Some(index)) => index,
        Ok(None) => return not_found(&state.site).await,
        Err(error) => return store_failure(error),
    };
    let results = match state
        .directory
        .search_programs(&index, query.as_deref())
        .await
    {
        Ok(results) => results,
        Err(error) => return store_failure(error),
    };

    if wants_fragment(&headers) {
        return html(StatusCode::OK, views::program_results(&results));
    }
    match state.site.chrome().await {
        Ok(chrome) => html(
            StatusCode::OK,
            views::program_search_page(&chrome, &index, &results),
        ),
        Err(error) => store_failure(error),
    }
}

pub(crate) async fn resource_index_handler(
    State(state): State<DirectoryState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let index = match state.directory.resource_index().await {
        Ok(Some(index)) => index,
        Ok(None) => return not_found(&state.site).await,
        Err(error) => return store_failure(error),
    };
    let results = match state.directory.search_resources(query.as_deref()).await {
        Ok(results) => results,
        Err(error) => return store_failure(error),
    };

    if wants_fragment(&headers) {
        return html(StatusCode::OK, views::resource_results(&results));
    }
    match state.site.chrome().await {
        Ok(chrome) => html(
            StatusCode::OK,
            views::resource_search_page(&chrome, &index, &results),
        ),
        Err(error) => store_failure(error),
    }
}

pub(crate) async fn program_detail_handler(
    State(state): State<DirectoryState>,
    Path(slug): Path<String>,
) -> Response {
    let result = async {
        let Some(detail) = state.directory.program_detail(&slug).await? else {
            return Ok(None);
        };
        let chrome = state.site.chrome().await?;
        Ok::<_, StoreError>(Some(views::program_detail_page(&chrome, &detail)))
    }
    .await;

    match result {
        Ok(Some(markup)) => html(StatusCode::OK, markup),
        Ok(None) => not_found(&state.site).await,
        Err(error) => store_failure(error),
    }
}
