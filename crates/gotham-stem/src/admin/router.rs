use std::sync::Arc;

use axum::extract::{Path, Query, RawQuery, State};
use axum::http::{header, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::auth::{require_editor, EditorToken};
use super::export::ExportFile;
use super::service::{AdminError, AdminService, ProgramListing, TermInput};
use crate::directory::domain::{ProgramDraft, ProgramId, ResourceDraft, ResourceId};
use crate::directory::taxonomy::{TaxonomyKind, TermId, TermPatch};
use crate::pages::domain::{PageDraft, PageId, PagePatch};

pub fn admin_router(service: Arc<AdminService>, token: EditorToken) -> Router {
    Router::new()
        .route(
            "/admin/api/taxonomy/:kind",
            get(list_terms_handler).post(create_term_handler),
        )
        .route(
            "/admin/api/taxonomy/:kind/:id",
            axum::routing::patch(update_term_handler).delete(delete_term_handler),
        )
        .route(
            "/admin/api/programs",
            get(list_programs_handler).post(create_program_handler),
        )
        .route(
            "/admin/api/programs/:id",
            get(program_handler)
                .put(update_program_handler)
                .delete(delete_program_handler),
        )
        .route(
            "/admin/api/programs/:id/publish",
            post(publish_program_handler),
        )
        .route(
            "/admin/api/programs/:id/unpublish",
            post(unpublish_program_handler),
        )
        .route(
            "/admin/api/resources",
            get(list_resources_handler).post(create_resource_handler),
        )
        .route(
            "/admin/api/resources/:id",
            get(resource_handler)
                .put(update_resource_handler)
                .delete(delete_resource_handler),
        )
        .route(
            "/admin/api/pages",
            get(root_pages_handler).post(create_page_handler),
        )
        .route(
            "/admin/api/pages/:id",
            get(page_handler).patch(update_page_handler),
        )
        .route("/admin/api/pages/:id/children", get(page_children_handler))
        .route("/admin/api/recipients", get(recipients_handler))
        .route("/admin/api/exports/programs.csv", get(export_programs_handler))
        .route("/admin/api/exports/resources.csv", get(export_resources_handler))
        .route(
            "/admin/api/exports/recipients.csv",
            get(export_recipients_handler),
        )
        .route_layer(middleware::from_fn_with_state(token, require_editor))
        .with_state(service)
}

pub(crate) fn error_response(error: AdminError) -> Response {
    let status = match &error {
        AdminError::Validation(_) => StatusCode::BAD_REQUEST,
        AdminError::NotFound(_) => StatusCode::NOT_FOUND,
        AdminError::Conflict(_) => StatusCode::CONFLICT,
        AdminError::Store(_) | AdminError::Export(_) => {
            error!(error = %error, "admin operation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}

fn respond<T: serde::Serialize>(status: StatusCode, result: Result<T, AdminError>) -> Response {
    match result {
        Ok(value) => (status, Json(value)).into_response(),
        Err(error) => error_response(error),
    }
}

fn csv_download(result: Result<ExportFile, AdminError>) -> Response {
    match result {
        Ok(file) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, mime::TEXT_CSV_UTF_8.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file.filename),
                ),
            ],
            file.content,
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

fn taxonomy_kind(raw: &str) -> Result<TaxonomyKind, AdminError> {
    raw.parse::<TaxonomyKind>()
        .map_err(|_| AdminError::NotFound("taxonomy"))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchParams {
    #[serde(default)]
    q: Option<String>,
}

pub(crate) async fn list_terms_handler(
    State(service): State<Arc<AdminService>>,
    Path(kind): Path<String>,
    Query(params): Query<SearchParams>,
) -> Response {
    let result = match taxonomy_kind(&kind) {
        Ok(kind) => service.list_terms(kind, params.q.as_deref()).await,
        Err(error) => Err(error),
    };
    respond(StatusCode::OK, result)
}

pub(crate) async fn create_term_handler(
    State(service): State<Arc<AdminService>>,
    Path(kind): Path<String>,
    Json(input): Json<TermInput>,
) -> Response {
    let result = match taxonomy_kind(&kind) {
        Ok(kind) => service.create_term(kind, input).await,
        Err(error) => Err(error),
    };
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn update_term_handler(
    State(service): State<Arc<AdminService>>,
    Path((kind, id)): Path<(String, i64)>,
    Json(patch): Json<TermPatch>,
) -> Response {
    let result = match taxonomy_kind(&kind) {
        Ok(kind) => service.update_term(kind, TermId(id), patch).await,
        Err(error) => Err(error),
    };
    respond(StatusCode::OK, result)
}

pub(crate) async fn delete_term_handler(
    State(service): State<Arc<AdminService>>,
    Path((kind, id)): Path<(String, i64)>,
) -> Response {
    let result = match taxonomy_kind(&kind) {
        Ok(kind) => service.delete_term(kind, TermId(id)).await,
        Err(error) => Err(error),
    };
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_programs_handler(
    State(service): State<Arc<AdminService>>,
    RawQuery(query): RawQuery,
) -> Response {
    let listing = ProgramListing::parse(query.as_deref());
    respond(StatusCode::OK, service.list_programs(&listing).await)
}

pub(crate) async fn create_program_handler(
    State(service): State<Arc<AdminService>>,
    Json(draft): Json<ProgramDraft>,
) -> Response {
    respond(
        StatusCode::CREATED,
        service.create_program(draft, Utc::now()).await,
    )
}

pub(crate) async fn program_handler(
    State(service): State<Arc<AdminService>>,
    Path(id): Path<i64>,
) -> Response {
    respond(StatusCode::OK, service.program(ProgramId(id)).await)
}

pub(crate) async fn update_program_handler(
    State(service): State<Arc<AdminService>>,
    Path(id): Path<i64>,
    Json(draft): Json<ProgramDraft>,
) -> Response {
    respond(
        StatusCode::OK,
        service
            .update_program(ProgramId(id), draft, Utc::now())
            .await,
    )
}

pub(crate) async fn publish_program_handler(
    State(service): State<Arc<AdminService>>,
    Path(id): Path<i64>,
) -> Response {
    respond(
        StatusCode::OK,
        service
            .set_program_live(ProgramId(id), true, Utc::now())
            .await,
    )
}

pub(crate) async fn unpublish_program_handler(
    State(service): State<Arc<AdminService>>,
    Path(id): Path<i64>,
) -> Response {
    respond(
        StatusCode::OK,
        service
            .set_program_live(ProgramId(id), false, Utc::now())
            .await,
    )
}

pub(crate) async fn delete_program_handler(
    State(service): State<Arc<AdminService>>,
    Path(id): Path<i64>,
) -> Response {
    match service.delete_program(ProgramId(id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_resources_handler(
    State(service): State<Arc<AdminService>>,
    RawQuery(query): RawQuery,
) -> Response {
    respond(
        StatusCode::OK,
        service.list_resources(query.as_deref()).await,
    )
}

pub(crate) async fn create_resource_handler(
    State(service): State<Arc<AdminService>>,
    Json(draft): Json<ResourceDraft>,
) -> Response {
    respond(StatusCode::CREATED, service.create_resource(draft).await)
}

pub(crate) async fn resource_handler(
    State(service): State<Arc<AdminService>>,
    Path(id): Path<i64>,
) -> Response {
    respond(StatusCode::OK, service.resource(ResourceId(id)).await)
}

pub(crate) async fn update_resource_handler(
    State(service): State<Arc<AdminService>>,
    Path(id): Path<i64>,
    Json(draft): Json<ResourceDraft>,
) -> Response {
    respond(
        StatusCode::OK,
        service.update_resource(ResourceId(id), draft).await,
    )
}

pub(crate) async fn delete_resource_handler(
    State(service): State<Arc<AdminService>>,
    Path(id): Path<i64>,
) -> Response {
    match service.delete_resource(ResourceId(id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn root_pages_handler(State(service): State<Arc<AdminService>>) -> Response {
    respond(StatusCode::OK, service.page_children(None).await)
}

pub(crate) async fn create_page_handler(
    State(service): State<Arc<AdminService>>,
    Json(draft): Json<PageDraft>,
) -> Response {
    respond(StatusCode::CREATED, service.create_page(draft).await)
}

pub(crate) async fn page_handler(
    State(service): State<Arc<AdminService>>,
    Path(id): Path<i64>,
) -> Response {
    respond(StatusCode::OK, service.page(PageId(id)).await)
}

pub(crate) async fn update_page_handler(
    State(service): State<Arc<AdminService>>,
    Path(id): Path<i64>,
    Json(patch): Json<PagePatch>,
) -> Response {
    respond(StatusCode::OK, service.update_page(PageId(id), patch).await)
}

pub(crate) async fn page_children_handler(
    State(service): State<Arc<AdminService>>,
    Path(id): Path<i64>,
) -> Response {
    respond(
        StatusCode::OK,
        service.page_children(Some(PageId(id))).await,
    )
}

pub(crate) async fn recipients_handler(State(service): State<Arc<AdminService>>) -> Response {
    respond(StatusCode::OK, service.recipients().await)
}

pub(crate) async fn export_programs_handler(
    State(service): State<Arc<AdminService>>,
    RawQuery(query): RawQuery,
) -> Response {
    let listing = ProgramListing::parse(query.as_deref());
    csv_download(service.export_programs(&listing).await)
}

pub(crate) async fn export_resources_handler(
    State(service): State<Arc<AdminService>>,
    RawQuery(query): RawQuery,
) -> Response {
    csv_download(service.export_resources(query.as_deref()).await)
}

pub(crate) async fn export_recipients_handler(
    State(service): State<Arc<AdminService>>,
) -> Response {
    csv_download(service.export_recipients().await)
}
