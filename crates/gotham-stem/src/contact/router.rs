use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};

use super::service::{normalize_mode, ContactError, ContactForm, ContactService, THANK_YOU};
use super::views::{self, Flash};
use crate::pages::domain::PageKind;
use crate::pages::router::{html, store_failure};
use crate::pages::service::SiteService;
use crate::store::StoreError;

const DELIVERY_FAILED: &str =
    "Sorry, we could not send your message right now. Please try again later.";

#[derive(Clone)]
pub struct ContactState {
    pub contact: Arc<ContactService>,
    pub site: Arc<SiteService>,
}

pub fn contact_router(contact: Arc<ContactService>, site: Arc<SiteService>) -> Router {
    Router::new()
        .route("/contact", get(form_handler).post(submit_handler))
        .route(
            "/contact/:mode",
            get(mode_form_handler).post(mode_submit_handler),
        )
        .with_state(ContactState { contact, site })
}

async fn render(
    state: &ContactState,
    status: StatusCode,
    mode: &str,
    flash: Option<Flash<'_>>,
) -> Response {
    match state.site.chrome().await {
        Ok(chrome) => html(
            status,
            views::contact_page(&chrome, mode, state.contact.site_key(), flash),
        ),
        Err(error) => store_failure(error),
    }
}

async fn program_index_href(site: &SiteService) -> Result<Option<String>, StoreError> {
    let indexes = site.pages().pages_of_kind(PageKind::ProgramIndex).await?;
    Ok(indexes
        .into_iter()
        .find(|page| page.live)
        .map(|page| page.href()))
}

async fn submit(state: ContactState, raw_mode: Option<&str>, form: ContactForm) -> Response {
    let mode = normalize_mode(raw_mode);
    match state.contact.submit(&mode, &form).await {
        Ok(_) => match program_index_href(&state.site).await {
            Ok(Some(href)) => Redirect::to(&href).into_response(),
            Ok(None) => render(&state, StatusCode::OK, &mode, Some(Flash::Success(THANK_YOU))).await,
            Err(error) => store_failure(error),
        },
        Err(error @ ContactError::InvalidRecaptcha) => {
            let message = error.to_string();
            render(&state, StatusCode::OK, &mode, Some(Flash::Error(&message))).await
        }
        Err(ContactError::Notify(_)) => {
            render(
                &state,
                StatusCode::BAD_GATEWAY,
                &mode,
                Some(Flash::Error(DELIVERY_FAILED)),
            )
            .await
        }
    }
}

pub(crate) async fn form_handler(State(state): State<ContactState>) -> Response {
    render(&state, StatusCode::OK, &normalize_mode(None), None).await
}

pub(crate) async fn mode_form_handler(
    State(state): State<ContactState>,
    Path(mode): Path<String>,
) -> Response {
    render(&state, StatusCode::OK, &normalize_mode(Some(&mode)), None).await
}

pub(crate) async fn submit_handler(
    State(state): State<ContactState>,
    Form(form): Form<ContactForm>,
) -> Response {
    submit(state, None, form).await
}

pub(crate) async fn mode_submit_handler(
    State(state): State<ContactState>,
    Path(mode): Path<String>,
    Form(form): Form<ContactForm>,
) -> Response {
    submit(state, Some(&mode), form).await
}
