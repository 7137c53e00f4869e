#![warn(clippy::all, clippy::pedantic)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use actix_web::{App, HttpServer, middleware::Logger, web};
use clap::Parser;
use healthcheck::{Aggregator, HttpChecker, MetricsStore};
use tracing::info;

mod config;
mod error;
mod prometheus;
mod routes;

use config::Config;
use error::AppError;
use logger::init_tracing;

/// Health-check aggregator exposing service status and Prometheus metrics
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "HEALTHCHECK_CONFIG")]
    config: Option<PathBuf>,
}

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_config(cli.config.as_ref())?.with_env_overrides()?;
    info!("Loaded configuration\n{config}");

    let aggregator = web::Data::new(build_aggregator(&config).await?);

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let result = run_server(addr, aggregator.clone()).await;

    aggregator.shutdown().await;
    result
}

async fn build_aggregator(config: &Config) -> Result<Aggregator, AppError> {
    let checker = HttpChecker::new().map_err(AppError::Checker)?;
    let aggregator = Aggregator::new(Arc::new(checker), Arc::new(MetricsStore::new()));

    for service in &config.services {
        aggregator.add_service(&service.name, &service.url, service.options()).await?;
    }

    Ok(aggregator)
}

async fn run_server(addr: SocketAddr, aggregator: web::Data<Aggregator>) -> Result<(), AppError> {
    info!("Listening on http://{addr}");

    HttpServer::new(move || {
        App::new().wrap(Logger::default()).app_data(aggregator.clone()).configure(routes::routes)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}
