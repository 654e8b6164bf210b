use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;
use tokio::process::Command;
use tracing::{error, info};
use url::Url;

use super::BackupError;

/// Database connection parsed from `DATABASE_URL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    Postgres(ServerTarget),
    Mysql(ServerTarget),
    Sqlite { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTarget {
    pub host: String,
    pub port: Option<u16>,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
}

fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

impl DatabaseTarget {
    pub fn parse(database_url: &str) -> Result<Self, BackupError> {
        if let Some(path) = database_url
            .strip_prefix("sqlite://")
            .or_else(|| database_url.strip_prefix("sqlite:"))
        {
            let path = path.split('?').next().unwrap_or_default();
            if path.is_empty() {
                return Err(BackupError::InvalidDatabaseUrl(database_url.to_string()));
            }
            return Ok(Self::Sqlite {
                path: PathBuf::from(path),
            });
        }

        let url = Url::parse(database_url)
            .map_err(|_| BackupError::InvalidDatabaseUrl(database_url.to_string()))?;
        let server = ServerTarget {
            host: url.host_str().unwrap_or("localhost").to_string(),
            port: url.port(),
            user: decode(url.username()),
            password: url.password().map(decode),
            database: decode(url.path().trim_start_matches('/')),
        };
        if server.database.is_empty() {
            return Err(BackupError::InvalidDatabaseUrl(database_url.to_string()));
        }
        match url.scheme() {
            "postgres" | "postgresql" => Ok(Self::Postgres(server)),
            "mysql" | "mariadb" => Ok(Self::Mysql(server)),
            other => Err(BackupError::UnsupportedDatabase(other.to_string())),
        }
    }
}

/// External dump invocation. Secrets travel in `env`, which is applied to the child only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpCommand {
    pub program: &'static str,
    pub args: Vec<String>,
    pub env: Vec<(&'static str, String)>,
}

impl DumpCommand {
    pub fn for_target(target: &DatabaseTarget, output: &Path) -> Option<Self> {
        let output = output.display().to_string();
        match target {
            DatabaseTarget::Postgres(server) => {
                let mut args = vec!["-h".to_string(), server.host.clone()];
                if let Some(port) = server.port {
                    args.extend(["-p".to_string(), port.to_string()]);
                }
                args.extend([
                    "-U".to_string(),
                    server.user.clone(),
                    "-d".to_string(),
                    server.database.clone(),
                    "-f".to_string(),
                    output,
                ]);
                Some(Self {
                    program: "pg_dump",
                    args,
                    env: server
                        .password
                        .iter()
                        .map(|password| ("PGPASSWORD", password.clone()))
                        .collect(),
                })
            }
            DatabaseTarget::Mysql(server) => {
                let mut args = vec!["-h".to_string(), server.host.clone()];
                if let Some(port) = server.port {
                    args.push(format!("--port={port}"));
                }
                args.extend([
                    "-u".to_string(),
                    server.user.clone(),
                    server.database.clone(),
                    format!("--result-file={output}"),
                ]);
                Some(Self {
                    program: "mysqldump",
                    args,
                    env: server
                        .password
                        .iter()
                        .map(|password| ("MYSQL_PWD", password.clone()))
                        .collect(),
                })
            }
            DatabaseTarget::Sqlite { .. } => None,
        }
    }

    async fn run(&self) -> Result<(), BackupError> {
        let mut command = Command::new(self.program);
        command.args(&self.args);
        for (name, value) in &self.env {
            command.env(name, value);
        }
        let status = command.status().await.map_err(|source| BackupError::Spawn {
            program: self.program,
            source,
        })?;
        if !status.success() {
            return Err(BackupError::DumpFailed {
                program: self.program,
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

pub fn backup_file_name(stamp: &str) -> String {
    format!("db_backup_{stamp}.sql")
}

/// Dumps the database into `backup_dir` and returns the written file.
///
/// A failed dump leaves no partial file behind.
pub async fn backup_database(
    database_url: &str,
    backup_dir: &Path,
    stamp: &str,
) -> Result<PathBuf, BackupError> {
    let target = DatabaseTarget::parse(database_url)?;
    tokio::fs::create_dir_all(backup_dir).await?;
    let output = backup_dir.join(backup_file_name(stamp));
    info!(path = %output.display(), "starting database dump");

    let result = match (&target, DumpCommand::for_target(&target, &output)) {
        (_, Some(command)) => command.run().await,
        (DatabaseTarget::Sqlite { path }, None) => tokio::fs::copy(path, &output)
            .await
            .map(|_| ())
            .map_err(BackupError::from),
        (_, None) => Err(BackupError::UnsupportedDatabase(database_url.to_string())),
    };

    if let Err(err) = result {
        error!(error = %err, "database dump failed");
        if tokio::fs::remove_file(&output).await.is_ok() {
            info!(path = %output.display(), "removed partial dump");
        }
        return Err(err);
    }

    info!(path = %output.display(), "database dump written");
    Ok(output)
}
