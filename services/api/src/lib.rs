mod cli;
mod infra;
mod jobs;
mod routes;
mod server;

use gotham_stem::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
