//! HTTP server for the report pipeline.
//!
//! Thin adapter: each handler collects multipart uploads and runs the
//! pipeline on a blocking thread.
//!
//! # API Endpoints
//!
//! | Method | Path               | Description                                 |
//! |--------|--------------------|---------------------------------------------|
//! | GET    | `/health`          | Health check                                |
//! | POST   | `/clean`           | `file` → `cleaned_report.xlsx`              |
//! | POST   | `/merge`           | `file1`, `file2` → `merged_report.xlsx`     |
//! | POST   | `/split`           | `file` → JSON map of category download URLs |
//! | GET    | `/download/{file}` | Split report written by `/split`            |
//! | GET    | `/api/logs`        | SSE stream for real-time logs               |

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderValue, Method},
    response::{sse::Event, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use uuid::Uuid;

use super::logs::{log_error, log_success, LOG_BROADCASTER};
use super::types::{xlsx_attachment, SplitLinks};
use crate::config::{AllowedOrigin, ServerConfig};
use crate::error::{PipelineResult, ServerError, ServerResult};
use crate::transform::pipeline::{merge, normalize_and_aggregate, split_source, SourceFile};

/// Start the HTTP server
pub async fn start_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    tokio::fs::create_dir_all(&config.download_dir).await?;

    let cors = CorsLayer::new()
        .allow_origin(match &config.allowed_origin {
            AllowedOrigin::Any => AllowOrigin::any(),
            AllowedOrigin::Exact(origin) => AllowOrigin::exact(HeaderValue::from_str(origin)?),
        })
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_DISPOSITION]);

    let port = config.port;
    let state = Arc::new(config);
    let app = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/clean", post(clean))
        .route("/merge", post(merge_files))
        .route("/split", post(split_file))
        .route("/api/logs", get(sse_logs))
        .nest_service("/download", ServeDir::new(&state.download_dir))
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Ridefare server running on http://localhost:{}", port);
    println!("   POST /clean      - Clean one export");
    println!("   POST /merge      - Merge two exports");
    println!("   POST /split      - Split a report by category");
    println!("   GET  /api/logs   - SSE log stream");
    println!("   GET  /health     - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "ridefare",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "clean": "POST /clean",
            "merge": "POST /merge",
            "split": "POST /split",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Clean endpoint
async fn clean(multipart: Multipart) -> ServerResult<Response> {
    let mut files = read_files(multipart, &["file"]).await?;
    let source = files.remove(0);
    banner(&format!("CLEAN: {} ({} bytes)", source.filename, source.bytes.len()));

    let report = run_blocking(move || normalize_and_aggregate(&source)).await?;
    Ok(xlsx_attachment("cleaned_report.xlsx", report.workbook, &report.summary))
}

/// Merge endpoint
async fn merge_files(multipart: Multipart) -> ServerResult<Response> {
    let mut files = read_files(multipart, &["file1", "file2"]).await?;
    let second = files.remove(1);
    let first = files.remove(0);
    banner(&format!("MERGE: {} + {}", first.filename, second.filename));

    let report = run_blocking(move || merge(&first, &second)).await?;
    Ok(xlsx_attachment("merged_report.xlsx", report.workbook, &report.summary))
}

/// Split endpoint: writes each category report to the download directory.
async fn split_file(
    State(config): State<Arc<ServerConfig>>,
    multipart: Multipart,
) -> ServerResult<Json<SplitLinks>> {
    let mut files = read_files(multipart, &["file"]).await?;
    let source = files.remove(0);
    banner(&format!("SPLIT: {} ({} bytes)", source.filename, source.bytes.len()));

    let reports = run_blocking(move || split_source(&source)).await?;
    if reports.is_empty() {
        return Err(ServerError::BadRequest(
            "Could not split. 'Internal Note' missing or empty.".into(),
        ));
    }

    let mut links = SplitLinks::new();
    for (category, report) in reports {
        let filename = format!("{}_{}.xlsx", category, Uuid::new_v4());
        tokio::fs::write(config.download_dir.join(&filename), &report.workbook)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to write {}: {}", filename, e)))?;
        links.insert(category.to_string(), config.download_url(&filename));
    }
    log_success(format!("Wrote {} split report(s)", links.len()));

    Ok(Json(links))
}

/// Collect the named file fields, in the order given.
async fn read_files(mut multipart: Multipart, names: &[&str]) -> ServerResult<Vec<SourceFile>> {
    let mut found: Vec<Option<SourceFile>> = vec![None; names.len()];

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        let Some(slot) = names.iter().position(|n| *n == name) else {
            continue;
        };
        let filename = field.file_name().unwrap_or(names[slot]).to_string();
        let content_type = field.content_type().map(String::from);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
        found[slot] = Some(SourceFile::new(bytes.to_vec(), filename, content_type));
    }

    found
        .into_iter()
        .zip(names)
        .map(|(file, name)| {
            file.ok_or_else(|| ServerError::BadRequest(format!("No '{}' file provided", name)))
        })
        .collect()
}

/// Run a pipeline call off the async runtime.
async fn run_blocking<T, F>(f: F) -> ServerResult<T>
where
    F: FnOnce() -> PipelineResult<T> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?;
    result.map_err(|e| {
        log_error(e.to_string());
        ServerError::from(e)
    })
}

fn banner(title: &str) {
    println!("\n{}", "=".repeat(70));
    println!("📄 {}", title);
    println!("{}\n", "=".repeat(70));
}
