//! Axum-based RPC server.

use crate::error::RpcError;
use crate::handlers;
use axum::routing::{get, post};
use axum::Router;
use peerlend_node::LendingService;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub struct RpcServer {
    pub listen_addr: String,
    pub port: u16,
}

impl RpcServer {
    pub fn new(listen_addr: impl Into<String>, port: u16) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            port,
        }
    }

    /// Build the router over a shared service handle.
    pub fn router(service: Arc<LendingService>) -> Router {
        Router::new()
            .route("/requests", post(handlers::create_request))
            .route("/requests/open", get(handlers::open_requests))
            .route("/requests/:id", get(handlers::get_request))
            .route("/requests/:id/fund", post(handlers::fund_request))
            .route("/loans/live", get(handlers::live_loans))
            .route("/loans/:id", get(handlers::get_loan))
            .route("/loans/:id/status", get(handlers::loan_status))
            .route("/loans/:id/repay", post(handlers::repay_loan))
            .route("/loans/:id/liquidate", post(handlers::liquidate_loan))
            .route("/accounts/:account/positions", get(handlers::borrower_positions))
            .route("/accounts/:account/balance", get(handlers::balance))
            .route("/accounts/:account/deposit", post(handlers::faucet_deposit))
            .route("/stats", get(handlers::stats))
            .layer(CorsLayer::permissive())
            .with_state(service)
    }

    /// Bind and serve until `shutdown` resolves.
    pub async fn start(
        &self,
        service: Arc<LendingService>,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), RpcError> {
        let addr: SocketAddr = format!("{}:{}", self.listen_addr, self.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| {
                RpcError::Service(peerlend_node::ServiceError::Config(e.to_string()))
            })?;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| RpcError::Service(peerlend_node::ServiceError::Io(e)))?;
        tracing::info!("RPC server listening on {addr}");

        axum::serve(listener, Self::router(service))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Service(peerlend_node::ServiceError::Io(e)))?;
        Ok(())
    }
}
