use crate::jobs::{
    run_backup_db, run_backup_media, run_restore_media, run_sync_unsubscribes, RestoreArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use gotham_stem::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Gotham STEM",
    about = "Serve the Gotham STEM site and run its maintenance jobs",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Dump the database into the backup directory and copy it to object storage
    BackupDb,
    /// Archive the media directory and copy it to object storage
    BackupMedia,
    /// Replace the media directory with the contents of a backup archive
    RestoreMedia(RestoreArgs),
    /// Mark recipients inactive when the mailing list reports them unsubscribed
    SyncUnsubscribes,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::BackupDb => run_backup_db().await,
        Command::BackupMedia => run_backup_media().await,
        Command::RestoreMedia(args) => run_restore_media(args).await,
        Command::SyncUnsubscribes => run_sync_unsubscribes().await,
    }
}
