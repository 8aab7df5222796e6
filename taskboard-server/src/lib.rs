//! HTTP surface for taskboard: router, extractors, and the error envelope.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use taskboard_core::{
    Authenticator, Db, SessionAuthenticator, SubtaskService, TaskService, WorkspaceService,
};
use tokio::net::TcpListener;
use tracing::{error, info};

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod response;

pub use config::{ConfigError, ServerConfig};

use handlers::{subtasks, tasks, workspaces};

#[derive(Clone)]
pub struct AppState {
    pub tasks: TaskService,
    pub workspaces: WorkspaceService,
    pub subtasks: SubtaskService,
    pub authenticator: Arc<dyn Authenticator>,
    pub session_cookie: Arc<str>,
}

impl AppState {
    /// Services over `db`, authenticating against its `session` table.
    pub fn new(db: Db, session_cookie: &str) -> Self {
        let authenticator = Arc::new(SessionAuthenticator::new(db.clone()));
        Self::with_authenticator(db, session_cookie, authenticator)
    }

    pub fn with_authenticator(
        db: Db,
        session_cookie: &str,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        AppState {
            tasks: TaskService::new(db.clone()),
            workspaces: WorkspaceService::new(db.clone()),
            subtasks: SubtaskService::new(db),
            authenticator,
            session_cookie: Arc::from(session_cookie),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/tasks", get(tasks::list).post(tasks::create))
        .route("/tasks/{id}", get(tasks::get).patch(tasks::update).delete(tasks::delete))
        .route("/workspaces", get(workspaces::list).post(workspaces::create))
        .route("/workspaces/default", get(workspaces::default))
        .route("/workspaces/public/{token}", get(workspaces::public_view))
        .route(
            "/workspaces/{id}",
            get(workspaces::get).patch(workspaces::update).delete(workspaces::delete),
        )
        .route("/workspaces/{id}/share-token", post(workspaces::regenerate_share_token))
        .route("/workspaces/{id}/toggle-public", post(workspaces::toggle_public))
        .route("/subtasks", get(subtasks::list_by_query).post(subtasks::create))
        .route("/subtasks/task/{task_id}", get(subtasks::list_for_task))
        .route("/subtasks/{id}", patch(subtasks::update).delete(subtasks::delete))
        .route("/subtasks/{id}/toggle", post(subtasks::toggle));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .fallback(handlers::not_found)
        .with_state(state)
}

/// Binds `config.addr` and serves until ctrl-c or SIGTERM.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let db = Db::connect(&config.database_url).await?;
    let app = router(AppState::new(db.clone(), &config.session_cookie));

    let listener = TcpListener::bind(config.addr).await?;
    info!(addr = %listener.local_addr()?, "taskboard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("taskboard stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
