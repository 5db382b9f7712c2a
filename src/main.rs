use cardapio::config::AppConfig;
use cardapio::controller::Controller;
use cardapio::routes::{self, RouteState};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env().expect("invalid configuration");
    let mut controller = Controller::from_config(&config).expect("backend client init failed");

    // Startup check: loads the landing list so a broken backend shows up in the logs.
    match controller.start().await {
        Ok(()) => tracing::info!(restaurants = controller.state().restaurants().len(), "backend reachable"),
        Err(e) => tracing::warn!(error = %e, "initial restaurant load failed"),
    }
    controller.stop();

    let state = RouteState { store: controller.store(), public_origin: config.public_origin.clone() };
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("failed to bind");

    tracing::info!(port = config.port, origin = %config.public_origin, "cardapio listening");
    axum::serve(listener, app).await.expect("server failed");
}
