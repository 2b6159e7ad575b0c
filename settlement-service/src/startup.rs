use crate::config::SettlementConfig;
use crate::handlers;
use crate::middleware::http_metrics_middleware;
use crate::services::{PaymentStatusService, RefundProcessor, SettlementStore};
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::request_id_middleware;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: SettlementConfig,
    pub store: Arc<dyn SettlementStore>,
    pub status: Arc<PaymentStatusService>,
    pub refunds: Arc<RefundProcessor>,
}

impl AppState {
    /// Wire the services around `store`. The refund processor invalidates
    /// the same cache the status lookups read from.
    pub fn new(config: SettlementConfig, store: Arc<dyn SettlementStore>) -> Self {
        let status = Arc::new(PaymentStatusService::new(
            Arc::clone(&store),
            config.cache.status_ttl,
        ));
        let refunds = Arc::new(
            RefundProcessor::new(Arc::clone(&store))
                .with_cache(status.cache())
                .allow_partial(config.refunds.allow_partial),
        );

        Self {
            config,
            store,
            status,
            refunds,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .route("/payment-status", post(handlers::compute_payment_status))
        .route(
            "/purchases/:id/payment-status",
            get(handlers::get_payment_status),
        )
        .route("/refunds/preview", post(handlers::preview_refund))
        .route("/returns/:id/refund", post(handlers::process_refund))
        .route("/returns/:id/refund/retry", post(handlers::retry_refund))
        .route_layer(from_fn(http_metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    shutdown_grace: Duration,
}

impl Application {
    pub async fn build(
        config: SettlementConfig,
        store: Arc<dyn SettlementStore>,
    ) -> Result<Self, AppError> {
        let addr = config.common.socket_addr();
        let shutdown_grace = Duration::from_secs(config.common.shutdown_grace_secs);
        let router = build_router(AppState::new(config, store));

        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(address = %addr, port = port, "Listening");

        Ok(Self {
            port,
            listener,
            router,
            shutdown_grace,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until Ctrl-C/SIGTERM, then give in-flight requests up to the
    /// configured grace period to finish.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let (signalled_tx, signalled_rx) = oneshot::channel();
        let server = axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                let _ = signalled_tx.send(());
            })
            .into_future();

        let grace = self.shutdown_grace;
        let deadline = async move {
            match signalled_rx.await {
                Ok(()) => tokio::time::sleep(grace).await,
                Err(_) => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            result = server => {
                tracing::info!("Service shutdown complete");
                result
            }
            _ = deadline => {
                tracing::warn!(
                    grace_secs = grace.as_secs(),
                    "Grace period elapsed, dropping open connections"
                );
                Ok(())
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
