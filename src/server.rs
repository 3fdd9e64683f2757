//! Service loop: owns the listening socket and runs sessions one after another.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};

use crate::config::ServiceConfig;
use crate::crypto::DualSigner;
use crate::decision::DecisionEngine;
use crate::errors::ServiceError;
use crate::feedback::FeedbackState;
use crate::resources::MetricsSource;
use crate::session::{Session, SessionContext, SessionOutcome};
use crate::telemetry::ServiceMetrics;

pub struct Server {
    listener: TcpListener,
    signer: DualSigner,
    engine: DecisionEngine,
    metrics: Box<dyn MetricsSource>,
    telemetry: Arc<ServiceMetrics>,
    feedback: FeedbackState,
    max_request_bytes: usize,
    accept_retry: Duration,
}

impl Server {
    /// Bind the listening socket. Failure is fatal: the service cannot start.
    pub async fn bind(
        cfg: &ServiceConfig,
        signer: DualSigner,
        engine: DecisionEngine,
        metrics: Box<dyn MetricsSource>,
    ) -> Result<Self, ServiceError> {
        let addr = cfg.socket_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServiceError::Bind { addr: addr.clone(), source })?;
        log::info!("Listening on {}", listener.local_addr()?);
        Ok(Server {
            listener,
            signer,
            engine,
            metrics,
            telemetry: Arc::new(ServiceMetrics::default()),
            feedback: FeedbackState::new(),
            max_request_bytes: cfg.max_request_bytes,
            accept_retry: Duration::from_millis(cfg.accept_retry_ms),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn feedback(&self) -> &FeedbackState {
        &self.feedback
    }

    pub fn telemetry(&self) -> Arc<ServiceMetrics> {
        Arc::clone(&self.telemetry)
    }

    pub fn signer(&self) -> &DualSigner {
        &self.signer
    }

    /// Accept one connection and run its session to completion.
    pub async fn serve_one(&mut self) -> std::io::Result<SessionOutcome> {
        let (stream, peer) = self.listener.accept().await?;
        Ok(self.handle(stream, peer).await)
    }

    /// Serve until `shutdown` resolves. Accept failures are logged and retried after
    /// `accept_retry_ms`; session faults never stop the loop.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            let accepted = tokio::select! {
                _ = &mut shutdown => {
                    log::info!("Shutdown requested");
                    break;
                }
                accepted = self.listener.accept() => accepted,
            };
            match accepted {
                Ok((stream, peer)) => {
                    self.handle(stream, peer).await;
                }
                Err(e) => {
                    log::error!("Accept failed: {e}");
                    self.telemetry.accept_failures_total.fetch_add(1, Ordering::Relaxed);
                    tokio::time::sleep(self.accept_retry).await;
                }
            }
        }
        self.telemetry.log_snapshot();
    }

    async fn handle(&mut self, stream: TcpStream, peer: SocketAddr) -> SessionOutcome {
        log::info!("Client connected: {peer}");
        let ctx = SessionContext {
            signer: &self.signer,
            engine: &self.engine,
            metrics: self.metrics.as_ref(),
            telemetry: &self.telemetry,
            max_request_bytes: self.max_request_bytes,
        };
        let mut session = Session::new(stream, peer.to_string());
        let outcome = session.run(&ctx, &mut self.feedback).await;
        self.telemetry.log_snapshot();
        outcome
    }
}
