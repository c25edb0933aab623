use std::net::TcpListener;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Path},
    http::{header, Response, StatusCode},
    routing::{get, post},
    Router,
};
use protoeval_host::api;
use protoeval_host::config::Config;
use protoeval_host::embedded;
use protoeval_host::evaluate::OpenAiEvaluator;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_connection_info(http_port: u16, bind: &str, upload_dir: &std::path::Path) {
    eprintln!("  \x1b[1;32m[http]\x1b[0m    Server listening on port \x1b[1;96m{http_port}\x1b[0m");
    eprintln!(
        "  \x1b[1;32m[uploads]\x1b[0m Stored under {}",
        upload_dir.display()
    );
    eprintln!();
    eprintln!("  \x1b[1;37m>\x1b[0m Open: \x1b[4;96mhttp://{bind}:{http_port}\x1b[0m");
    eprintln!();
    eprintln!("  \x1b[2mPress Ctrl+C to stop\x1b[0m");
    eprintln!();
}

/// Graceful start: Check if port is available
fn check_port_available(bind: &str, port: u16) -> bool {
    TcpListener::bind(format!("{bind}:{port}")).is_ok()
}

/// Graceful start: Find available port starting from default
fn find_available_port(bind: &str, start: u16) -> Option<u16> {
    (start..start + 10).find(|&port| check_port_available(bind, port))
}

/// Serve embedded static file
async fn serve_static(Path(path): Path<String>) -> Response<Body> {
    match embedded::get_asset(&path) {
        Some((data, mime)) => {
            // Use application/javascript for .js files (override detected mime)
            let content_type = if std::path::Path::new(&path)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("js"))
            {
                "application/javascript"
            } else {
                mime
            };

            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, content_type)
                .header(header::CACHE_CONTROL, "public, max-age=3600")
                .body(Body::from(data))
                .unwrap()
        }
        None => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::from("Not Found"))
            .unwrap(),
    }
}

/// Serve index.html at root
async fn serve_index() -> Response<Body> {
    match embedded::get_asset("index.html") {
        Some((data, mime)) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, mime)
            .body(Body::from(data))
            .unwrap(),
        None => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::from("index.html not found"))
            .unwrap(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize structured logging (tracing)
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    // Handle --version and --help
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "--version" | "-v" => {
                println!("protoeval {VERSION}");
                return Ok(());
            }
            "--help" | "-h" => {
                println!("protoeval - research protocol evaluation in the browser");
                println!();
                println!("USAGE:");
                println!("    protoeval-host [OPTIONS]");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version");
                println!();
                println!("CONFIG:");
                println!("    ~/.config/protoeval/config.toml");
                println!();
                println!("ENVIRONMENT:");
                println!("    OPENAI_API_KEY   API key for the evaluation model (required)");
                return Ok(());
            }
            _ => {}
        }
    }

    // === LOAD CONFIGURATION ===
    Config::create_default_if_missing();
    let config = Config::load();
    eprintln!(
        "  \x1b[1;32m[config]\x1b[0m  Loaded from {}",
        Config::default_config_path().display()
    );

    let api_key = match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => key,
        _ => {
            eprintln!("  \x1b[1;31m[error]\x1b[0m   OPENAI_API_KEY is not set");
            std::process::exit(1);
        }
    };

    // === GRACEFUL START ===
    let http_port = if check_port_available(&config.server.bind, config.server.http_port) {
        config.server.http_port
    } else {
        eprintln!(
            "  \x1b[1;33m[warn]\x1b[0m    Port {} in use, finding alternative...",
            config.server.http_port
        );
        if let Some(p) = find_available_port(&config.server.bind, config.server.http_port + 1) {
            eprintln!("  \x1b[1;32m[check]\x1b[0m   Using HTTP port {p}");
            p
        } else {
            eprintln!(
                "  \x1b[1;31m[error]\x1b[0m   No available HTTP ports in range {}-{}",
                config.server.http_port,
                config.server.http_port + 10
            );
            std::process::exit(1);
        }
    };

    tokio::fs::create_dir_all(&config.upload.dir).await?;

    let evaluator = Arc::new(OpenAiEvaluator::new(&config.ai, api_key));
    let app_state = api::AppState {
        evaluator,
        upload_dir: config.upload.dir.clone(),
    };

    // === START EMBEDDED HTTP SERVER (axum) ===
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(serve_index))
        .route(
            protoeval_api::UPLOAD_ENDPOINT,
            post(api::upload_and_evaluate),
        )
        .route("/*path", get(serve_static))
        .nest("/api", api::api_router())
        .layer(DefaultBodyLimit::max(config.upload.max_bytes))
        .with_state(app_state)
        .layer(cors);

    let http_addr = format!("{}:{}", config.server.bind, http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_addr).await?;

    print_connection_info(http_port, &config.server.bind, &config.upload.dir);

    axum::serve(http_listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    eprintln!("  \x1b[1;32m[done]\x1b[0m    Shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    eprintln!();
    eprintln!("  \x1b[1;33m[stop]\x1b[0m    Graceful shutdown initiated...");
}
