use std::sync::Arc;

use anyhow::{bail, Context};
use tokio_postgres::config::SslMode;
use tokio_postgres::{Client, NoTls};

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub ssl_mode: String,
}

impl PostgresConfig {
    /// Connection parameters as typed values, so the password is never parsed as part of a string
    fn connection_config(&self) -> anyhow::Result<tokio_postgres::Config> {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .user(&self.username)
            .password(&self.password)
            .dbname(&self.database)
            .ssl_mode(parse_ssl_mode(&self.ssl_mode)?);
        Ok(config)
    }

    fn redacted(&self) -> String {
        format!(
            "host={} port={} user={} password=******** dbname={} sslmode={}",
            self.host, self.port, self.username, self.database, self.ssl_mode
        )
    }
}

fn parse_ssl_mode(ssl_mode: &str) -> anyhow::Result<SslMode> {
    match ssl_mode {
        "disable" => Ok(SslMode::Disable),
        "prefer" => Ok(SslMode::Prefer),
        "require" => Ok(SslMode::Require),
        other => bail!("Unsupported postgres sslmode {other}"),
    }
}

/// Connects to postgres and spawns the task driving the connection.
/// The returned client is shared by all repositories, tokio_postgres pipelines concurrent queries over it
pub async fn connect(config: &PostgresConfig) -> anyhow::Result<Arc<Client>> {
    tracing::info!("Postgres connection: {}", config.redacted());
    let (client, connection) = config
        .connection_config()?
        .connect(NoTls)
        .await
        .context("Failed to start postgres")?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("Postgres connection error: {}", e);
        }
    });

    Ok(Arc::new(client))
}
