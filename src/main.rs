use anyhow::Result;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use quizmaster::{
    api::{create_router, AppState},
    config::{Config, LoggingConfig},
    llm_providers::build_http_client,
    log_system_event, ChatProvider, ClientIdentity, DocumentStore, GeminiProvider, KeyRotator,
    QuizService,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    // Initialize logging with optional file output
    let _guard = setup_logging(&config.logging)?;

    config.validate()?;
    config.log_configuration_summary();

    log_system_event!(startup, component = "server", "Starting QuizMaster server");

    let documents = DocumentStore::new(config.uploads.directory.clone());
    documents.init().await?;

    let client = build_http_client(config.http.timeout())?;

    let gemini = GeminiProvider::new(
        client.clone(),
        config.gemini.api_url.clone(),
        KeyRotator::new(config.gemini.api_keys.clone())?,
    );
    let chat = ChatProvider::new(
        client,
        config.chat.api_url.clone(),
        config.chat.api_key.clone(),
        config.chat.model.clone(),
        ClientIdentity {
            referer: config.chat.referer.clone(),
            title: config.chat.title.clone(),
        },
    );

    let quiz_service = QuizService::new(gemini, chat);
    info!(
        document_provider = quiz_service.gemini().provider_name(),
        gemini_keys = quiz_service.gemini().key_count(),
        analysis_provider = quiz_service.chat().provider_name(),
        chat_model = %quiz_service.chat().model_name(),
        "Initialized LLM providers"
    );

    let state = AppState {
        quiz_service,
        documents,
        max_upload_bytes: config.uploads.max_bytes,
    };

    let app = create_router(state).layer(ServiceBuilder::new().layer(CorsLayer::permissive()));

    let addr = config.server.address();
    info!("Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn setup_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    use std::fs;
    use tracing_subscriber::fmt;

    let env_filter = EnvFilter::try_new(&config.level)
        .unwrap_or_else(|_| EnvFilter::new("info,quizmaster=debug"));

    let console_layer = config.console_enabled.then(|| {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(true)
            .boxed()
    });

    let (file_layer, guard) = if config.file_enabled {
        fs::create_dir_all(&config.log_directory).unwrap_or_else(|e| {
            eprintln!("Warning: Could not create logs directory: {}", e);
        });

        // Daily rotation, no ANSI colors for files
        let file_appender = tracing_appender::rolling::daily(&config.log_directory, "quizmaster.log");
        let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
        let layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .with_writer(non_blocking_file)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!(
        log_directory = %config.log_directory,
        file_enabled = config.file_enabled,
        console_enabled = config.console_enabled,
        "Logging initialized"
    );

    Ok(guard)
}
