// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Web UI for the drawing renamer
//!
//! A single page shows the mapping table. Forms on it upload drawings,
//! edit replacement names, and import a completed spreadsheet; the export
//! and process actions answer with file downloads.

use axum::{
    extract::{DefaultBodyLimit, Form, Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use minijinja::{context, Environment};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::mapping::MappingTable;
use crate::session::{Download, Session};
use crate::staging::UploadedFile;
use crate::{RenamerError, Result};

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    pub session: Mutex<Session>,
    templates: Environment<'static>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let mut templates = Environment::new();
        templates.add_template("index.html", INDEX_TEMPLATE)?;

        Ok(Self {
            session: Mutex::new(Session::new(config.clone())),
            config,
            templates,
        })
    }
}

/// Create the web application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.web.max_upload_mb * 1024 * 1024;

    Router::new()
        // Page
        .route("/", get(index_page))
        // Actions
        .route("/upload", post(upload_files))
        .route("/rename", post(rename_file))
        .route("/export", get(export_spreadsheet))
        .route("/import", post(import_spreadsheet))
        .route("/process", post(process_files))
        // API endpoints
        .route("/api/table", get(api_get_table))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Status line shown above the table
#[derive(Debug, Serialize)]
struct Notice {
    kind: &'static str,
    text: String,
}

impl Notice {
    fn success(text: impl Into<String>) -> Self {
        Self { kind: "success", text: text.into() }
    }

    fn error(text: impl Into<String>) -> Self {
        Self { kind: "error", text: text.into() }
    }
}

// === Page Handlers ===

async fn index_page(State(state): State<Arc<AppState>>) -> Response {
    let session = state.session.lock().await;
    render_page(&state, &session, StatusCode::OK, None)
}

async fn upload_files(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let files = read_files(&mut multipart, "files").await;

    let mut session = state.session.lock().await;
    let outcome = files
        .and_then(|files| session.upload(files))
        .map(|count| format!("Uploaded {} drawing(s).", count));
    respond(&state, &session, outcome)
}

#[derive(Deserialize)]
struct RenameForm {
    original_name: String,
    #[serde(default)]
    new_name: String,
}

async fn rename_file(State(state): State<Arc<AppState>>, Form(form): Form<RenameForm>) -> Response {
    let mut session = state.session.lock().await;
    let outcome = session
        .set_new_name(&form.original_name, &form.new_name)
        .map(|()| format!("Updated name for {}.", form.original_name));
    respond(&state, &session, outcome)
}

async fn export_spreadsheet(State(state): State<Arc<AppState>>) -> Response {
    let session = state.session.lock().await;
    match session.export_spreadsheet() {
        Ok(download) => attachment(download),
        Err(e) => respond(&state, &session, Err(e)),
    }
}

async fn import_spreadsheet(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let sheet = read_files(&mut multipart, "sheet").await.and_then(|files| {
        files.into_iter().next().ok_or_else(|| {
            RenamerError::EmptyInput("No Excel file uploaded. Please upload a file to process.".to_string())
        })
    });

    let mut session = state.session.lock().await;
    let outcome = sheet
        .and_then(|sheet| session.import_spreadsheet(&sheet.bytes))
        .map(|_| "File names updated from the Excel file.".to_string());
    respond(&state, &session, outcome)
}

async fn process_files(State(state): State<Arc<AppState>>) -> Response {
    let mut session = state.session.lock().await;
    match session.process() {
        Ok(archive) => {
            for name in &archive.report.skipped {
                warn!("Not in archive (file no longer staged): {}", name);
            }
            attachment(archive.into())
        }
        Err(e) => respond(&state, &session, Err(e)),
    }
}

// === API Handlers ===

async fn api_get_table(State(state): State<Arc<AppState>>) -> Json<MappingTable> {
    let session = state.session.lock().await;
    Json(session.table().clone())
}

// === Helpers ===

/// Collect every non-empty file part named `field_name`
async fn read_files(multipart: &mut Multipart, field_name: &str) -> Result<Vec<UploadedFile>> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RenamerError::Upload(e.to_string()))?
    {
        if field.name() != Some(field_name) {
            continue;
        }
        let name = match field.file_name() {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => continue,
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| RenamerError::Upload(e.to_string()))?;
        files.push(UploadedFile::new(name, bytes.to_vec()));
    }

    Ok(files)
}

fn status_for(err: &RenamerError) -> StatusCode {
    if err.is_user_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Re-render the page with the outcome of an action
fn respond(state: &AppState, session: &Session, outcome: Result<String>) -> Response {
    match outcome {
        Ok(message) => {
            info!("{}", message);
            render_page(state, session, StatusCode::OK, Some(Notice::success(message)))
        }
        Err(e) => {
            if e.is_user_error() {
                warn!("Action rejected: {}", e);
            } else {
                error!("Action failed: {}", e);
            }
            render_page(state, session, status_for(&e), Some(Notice::error(e.user_message())))
        }
    }
}

fn render_page(
    state: &AppState,
    session: &Session,
    status: StatusCode,
    notice: Option<Notice>,
) -> Response {
    let rendered = state.templates.get_template("index.html").and_then(|tmpl| {
        tmpl.render(context! {
            entries => session.table().entries(),
            notice => notice,
            has_staged => session.has_staged_files(),
            accept => state
                .config
                .uploads
                .allowed_extensions
                .iter()
                .map(|e| format!(".{}", e))
                .collect::<Vec<_>>()
                .join(","),
        })
    });

    match rendered {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!("Template error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

fn attachment(download: Download) -> Response {
    info!("Serving {} ({} bytes)", download.file_name, download.bytes.len());
    let disposition = format!("attachment; filename=\"{}\"", download.file_name);
    (
        [
            (header::CONTENT_TYPE, download.mime.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        download.bytes,
    )
        .into_response()
}

const INDEX_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Drawing Renamer Tool</title>
    <style>
        :root {
            --bg-primary: #1a1a2e;
            --bg-secondary: #16213e;
            --bg-card: #0f3460;
            --text-primary: #e8e8e8;
            --text-secondary: #a0a0a0;
            --accent: #e94560;
            --success: #00d9a5;
            --border: #2a2a4a;
        }
        * { box-sizing: border-box; margin: 0; padding: 0; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.6;
        }
        .container { max-width: 1100px; margin: 0 auto; padding: 20px; }
        h1 { color: var(--accent); margin-bottom: 20px; }
        .card {
            background: var(--bg-card);
            border-radius: 12px;
            padding: 20px;
            margin-bottom: 20px;
        }
        .card h2 { margin-bottom: 15px; color: var(--accent); }
        .notice { padding: 12px 16px; border-radius: 8px; margin-bottom: 20px; }
        .notice.success { border: 1px solid var(--success); color: var(--success); }
        .notice.error { border: 1px solid var(--accent); color: var(--accent); }
        table { width: 100%; border-collapse: collapse; }
        th, td { padding: 10px; text-align: left; border-bottom: 1px solid var(--border); }
        th { color: var(--text-secondary); font-weight: 500; }
        input[type=text] {
            background: var(--bg-secondary);
            color: var(--text-primary);
            border: 1px solid var(--border);
            padding: 6px 8px;
            border-radius: 6px;
            width: 70%;
        }
        button {
            background: var(--accent);
            color: white;
            border: none;
            padding: 8px 14px;
            border-radius: 6px;
            cursor: pointer;
        }
        .actions { display: flex; gap: 12px; flex-wrap: wrap; align-items: center; }
    </style>
</head>
<body>
<main class="container">
    <h1>Drawing Renamer Tool</h1>

    {% if notice %}
    <div class="notice {{ notice.kind }}">{{ notice.text }}</div>
    {% endif %}

    <div class="card">
        <h2>Upload Drawings</h2>
        <form class="actions" action="/upload" method="post" enctype="multipart/form-data">
            <input type="file" name="files" multiple accept="{{ accept }}">
            <button type="submit">Upload</button>
        </form>
    </div>

    <div class="card">
        <h2>Rename from Excel sheet</h2>
        <div class="actions">
            <form action="/export" method="get">
                <button type="submit">Export to Excel</button>
            </form>
            <form class="actions" action="/import" method="post" enctype="multipart/form-data">
                <input type="file" name="sheet" accept=".xlsx">
                <button type="submit">Import Excel File</button>
            </form>
        </div>
    </div>

    <div class="card">
        <h2>Uploaded Drawings</h2>
        {% if entries %}
        <table>
            <tr><th>Original Name</th><th>New Name</th></tr>
            {% for entry in entries %}
            <tr>
                <td>{{ entry.original_name }}</td>
                <td>
                    <form class="actions" action="/rename" method="post">
                        <input type="hidden" name="original_name" value="{{ entry.original_name }}">
                        <input type="text" name="new_name" value="{{ entry.new_name }}">
                        <button type="submit">Save</button>
                    </form>
                </td>
            </tr>
            {% endfor %}
        </table>
        {% else %}
        <p>No drawings uploaded yet.</p>
        {% endif %}
    </div>

    <form action="/process" method="post">
        <button type="submit" {% if not has_staged %}disabled{% endif %}>Process Rename</button>
    </form>
</main>
</body>
</html>"#;

/// Bind the listening socket for the configured host and port
pub async fn bind(config: &AppConfig) -> Result<TcpListener> {
    let addr = format!("{}:{}", config.web.host, config.web.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Web UI available at http://{}", listener.local_addr()?);
    Ok(listener)
}

/// Serve the UI on an already bound listener until the server stops
pub async fn serve(listener: TcpListener, config: AppConfig) -> Result<()> {
    let state = Arc::new(AppState::new(config)?);
    let router = create_router(state);
    axum::serve(listener, router)
        .await
        .map_err(|e| RenamerError::Config(format!("Server error: {}", e)))?;

    Ok(())
}

/// Start the web server with the given configuration
pub async fn start_server(config: AppConfig) -> Result<()> {
    let listener = bind(&config).await?;
    serve(listener, config).await
}
