use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use maud::Markup;
use tracing::error;

use super::domain::PageKind;
use super::service::SiteService;
use super::views;
use crate::admin::auth::EditorToken;
use crate::store::StoreError;

#[derive(Clone)]
pub struct SiteState {
    pub site: Arc<SiteService>,
    pub editors: EditorToken,
}

pub fn pages_router(site: Arc<SiteService>, editors: EditorToken) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/pages/:slug", get(page_handler))
        .route("/newsletters/:slug", get(newsletter_handler))
        .with_state(SiteState { site, editors })
}

pub(crate) fn html(status: StatusCode, markup: Markup) -> Response {
    (status, Html(markup.into_string())).into_response()
}

pub(crate) fn store_failure(error: StoreError) -> Response {
    error!(error = %error, "page rendering failed");
    html(StatusCode::INTERNAL_SERVER_ERROR, views::server_error())
}

/// 404 page rendered inside the site layout.
pub async fn not_found(site: &SiteService) -> Response {
    match site.chrome().await {
        Ok(chrome) => html(StatusCode::NOT_FOUND, views::not_found(&chrome)),
        Err(error) => store_failure(error),
    }
}

pub(crate) async fn home_handler(State(state): State<SiteState>) -> Response {
    let site = &state.site;
    let result = async {
        let chrome = site.chrome().await?;
        let Some(home) = site.home().await? else {
            return Ok(None);
        };
        let featured = site.featured(&home).await?;
        Ok::<_, StoreError>(Some(views::home_page(&chrome, &home, &featured)))
    }
    .await;

    match result {
        Ok(Some(markup)) => html(StatusCode::OK, markup),
        Ok(None) => not_found(site).await,
        Err(error) => store_failure(error),
    }
}

pub(crate) async fn page_handler(
    State(state): State<SiteState>,
    Path(slug): Path<String>,
) -> Response {
    let site = &state.site;
    let page = match site.home_child(&slug).await {
        Ok(Some(page)) => page,
        Ok(None) => return not_found(site).await,
        Err(error) => return store_failure(error),
    };

    if page.kind == PageKind::NewsletterIndex {
        let result = async {
            let chrome = site.chrome().await?;
            let issues = site.newsletter_issues(&page).await?;
            Ok::<_, StoreError>(views::newsletter_index(&chrome, &page, &issues))
        }
        .await;
        return match result {
            Ok(markup) => html(StatusCode::OK, markup),
            Err(error) => store_failure(error),
        };
    }

    if !page.kind.is_static() {
        return Redirect::to(&page.href()).into_response();
    }

    match site.chrome().await {
        Ok(chrome) => html(StatusCode::OK, views::static_page(&chrome, &page)),
        Err(error) => store_failure(error),
    }
}

pub(crate) async fn newsletter_handler(
    State(state): State<SiteState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !state.editors.authorizes(&headers) {
        return not_found(&state.site).await;
    }
    match state.site.newsletter(&slug).await {
        Ok(Some(issue)) => html(
            StatusCode::OK,
            views::newsletter_issue(state.site.site(), &issue),
        ),
        Ok(None) => not_found(&state.site).await,
        Err(error) => store_failure(error),
    }
}
