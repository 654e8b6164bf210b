use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::error;

use super::service::{NewsletterService, SignupResponse};
use super::NewsletterError;
use crate::pages::router::{html, store_failure};
use crate::pages::service::SiteService;
use crate::pages::views;

#[derive(Clone)]
pub struct NewsletterState {
    pub newsletter: Arc<NewsletterService>,
    pub site: Arc<SiteService>,
}

pub fn newsletter_router(newsletter: Arc<NewsletterService>, site: Arc<SiteService>) -> Router {
    Router::new()
        .route("/newsletter/subscribe", post(subscribe_handler))
        .route("/newsletter/thank-you", get(thank_you_handler))
        .with_state(NewsletterState { newsletter, site })
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SignupForm {
    #[serde(default)]
    email: Option<String>,
}

pub(crate) async fn subscribe_handler(
    State(state): State<NewsletterState>,
    Form(form): Form<SignupForm>,
) -> Response {
    match state
        .newsletter
        .subscribe(form.email.as_deref(), Utc::now())
        .await
    {
        Ok(signup) => (StatusCode::OK, Json(signup.response)).into_response(),
        Err(NewsletterError::EmailRequired) => (
            StatusCode::BAD_REQUEST,
            Json(SignupResponse::email_required()),
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "newsletter signup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SignupResponse::Error {
                    message: "Signup is temporarily unavailable.".to_string(),
                }),
            )
                .into_response()
        }
    }
}

pub(crate) async fn thank_you_handler(State(state): State<NewsletterState>) -> Response {
    match state.site.chrome().await {
        Ok(chrome) => html(StatusCode::OK, views::thank_you(&chrome)),
        Err(err) => store_failure(err),
    }
}
