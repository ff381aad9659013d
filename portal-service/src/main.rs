use log::{error, info};
use pena_shared::config::Config;

mod calendar;
mod error;
mod handlers;
mod models;
mod notifications;
mod ranking;
mod routes;

#[cfg(test)]
mod tests;

#[tokio::main]
async fn main() -> Result<(), lambda_http::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Logging initialized with env_logger");
    info!("Starting Peña portal service");

    let config = Config::from_env();
    let app = routes::create_router(&config).await;

    // Running inside Lambda when the runtime API is present
    if std::env::var("AWS_LAMBDA_RUNTIME_API").is_ok() {
        info!("Running as Lambda function");
        return lambda_http::run(app).await;
    }

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind {}: {}", addr, e);
        e
    })?;
    axum::serve(listener, app).await?;

    Ok(())
}
