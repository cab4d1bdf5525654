use querychat::{build_router, llm::build_language_model, AppConfig, AppState};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_logging()?;

    let config = AppConfig::from_env()?;
    tracing::info!("Configuration: {:?}", config);

    let llm = build_language_model(&config.llm);
    match &llm {
        Some(client) => tracing::info!("Language model ready ({})", client.name()),
        None => tracing::warn!("Language model unavailable, /chat will return errors"),
    }

    let bind_addr = config.bind_addr;
    let sweep_interval = config.session_sweep_interval;
    let shared_state = Arc::new(AppState::new(config, llm));

    // Background sweep of idle sessions
    let sweeper_state = shared_state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            let removed = sweeper_state.sessions.cleanup_expired().await;
            if removed > 0 {
                tracing::info!("Removed {} expired sessions", removed);
            } else {
                tracing::debug!("Session sweep found nothing to remove");
            }
        }
    });

    let app = build_router(shared_state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "info,querychat=debug,sqlx=warn,reqwest=info,hyper=info,tower=info".to_string()
        } else {
            "info,querychat=info,sqlx=warn,reqwest=warn,hyper=warn,tower=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();

    tracing::info!("QueryChat starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Build mode: {}",
        if cfg!(debug_assertions) { "development" } else { "production" }
    );
    tracing::info!("Log level: {}", log_level);
    Ok(())
}
