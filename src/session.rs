//! One accept-to-close client interaction.
//!
//! States run `Idle → Reading → Deciding → Signing → Encoding → Responding → Closed` in
//! order. Any failure jumps straight to `Closed`; nothing is sent unless encoding finished.

use std::io;
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::crypto::{AlgorithmId, DualSigner};
use crate::decision::{DecisionEngine, DecisionSample};
use crate::errors::SessionError;
use crate::feedback::FeedbackState;
use crate::logger::AUDIT_TARGET;
use crate::protocol::SignedResponse;
use crate::resources::MetricsSource;
use crate::telemetry::ServiceMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Reading,
    Deciding,
    Signing,
    Encoding,
    Responding,
    Closed,
}

impl SessionState {
    /// The state that follows on success, `None` once closed.
    pub fn next(self) -> Option<SessionState> {
        use SessionState::*;
        match self {
            Idle => Some(Reading),
            Reading => Some(Deciding),
            Deciding => Some(Signing),
            Signing => Some(Encoding),
            Encoding => Some(Responding),
            Responding => Some(Closed),
            Closed => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Reading => "reading",
            SessionState::Deciding => "deciding",
            SessionState::Signing => "signing",
            SessionState::Encoding => "encoding",
            SessionState::Responding => "responding",
            SessionState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared, read-only collaborators a session needs.
pub struct SessionContext<'a> {
    pub signer: &'a DualSigner,
    pub engine: &'a DecisionEngine,
    pub metrics: &'a dyn MetricsSource,
    pub telemetry: &'a ServiceMetrics,
    pub max_request_bytes: usize,
}

#[derive(Debug)]
pub enum SessionOutcome {
    Responded { algorithm: AlgorithmId, latency_ms: f32, bytes_sent: usize },
    Abandoned { error: SessionError, latency_ms: Option<f32> },
}

impl SessionOutcome {
    pub fn is_responded(&self) -> bool {
        matches!(self, SessionOutcome::Responded { .. })
    }
}

pub struct Session<S> {
    stream: S,
    peer: String,
    state: SessionState,
    history: Vec<SessionState>,
    measured_latency_ms: Option<f32>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Session<S> {
    pub fn new(stream: S, peer: impl Into<String>) -> Self {
        Session {
            stream,
            peer: peer.into(),
            state: SessionState::Idle,
            history: vec![SessionState::Idle],
            measured_latency_ms: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Every state visited so far, starting with `Idle`.
    pub fn history(&self) -> &[SessionState] {
        &self.history
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    fn transition(&mut self, to: SessionState) {
        debug_assert!(
            to == SessionState::Closed || self.state.next() == Some(to),
            "illegal session transition {} -> {}",
            self.state,
            to
        );
        log::trace!("session {}: {} -> {}", self.peer, self.state, to);
        self.state = to;
        self.history.push(to);
    }

    /// Drive the session to `Closed`. Per-connection faults are contained in the outcome.
    pub async fn run(
        &mut self,
        ctx: &SessionContext<'_>,
        feedback: &mut FeedbackState,
    ) -> SessionOutcome {
        ctx.telemetry.sessions_total.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let result = self.drive(ctx, feedback).await;
        self.close(feedback).await;

        let outcome = match result {
            Ok((algorithm, latency_ms, bytes_sent)) => {
                SessionOutcome::Responded { algorithm, latency_ms, bytes_sent }
            }
            Err(error) => SessionOutcome::Abandoned { error, latency_ms: self.measured_latency_ms },
        };
        record_outcome(ctx.telemetry, &outcome);
        match &outcome {
            SessionOutcome::Responded { algorithm, latency_ms, bytes_sent } => log::info!(
                target: AUDIT_TARGET,
                "peer={} outcome=responded alg={} time_ms={:.2} bytes={}",
                self.peer, algorithm, latency_ms, bytes_sent
            ),
            SessionOutcome::Abandoned { error, .. } => log::warn!(
                target: AUDIT_TARGET,
                "peer={} outcome=abandoned stage={} error={}",
                self.peer, error.stage(), error
            ),
        }
        outcome
    }

    async fn drive(
        &mut self,
        ctx: &SessionContext<'_>,
        feedback: &FeedbackState,
    ) -> Result<(AlgorithmId, f32, usize), SessionError> {
        self.transition(SessionState::Reading);
        let payload = self.read_request(ctx.max_request_bytes).await?;
        log::info!("Received {} bytes from {}", payload.len(), self.peer);

        self.transition(SessionState::Deciding);
        let free_kb = ctx.metrics.free_memory_kb();
        let sample = DecisionSample::new(free_kb, feedback.previous_latency_ms());
        let decision = ctx.engine.evaluate(&sample);
        if decision.fallback.is_some() {
            ctx.telemetry.inference_fallbacks_total.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }

        self.transition(SessionState::Signing);
        let started = Instant::now();
        let signed = ctx.signer.sign(&payload, decision.use_level_b);
        let latency_ms = started.elapsed().as_secs_f32() * 1000.0;
        let signed = signed?;
        self.measured_latency_ms = Some(latency_ms);
        let algorithm = signed.algorithm();
        log::info!(
            "Signed with {} | FreeMem: {:.1} KB | SignTime: {:.2} ms | StackHeadroom: {}",
            algorithm,
            free_kb,
            latency_ms,
            ctx.metrics
                .stack_headroom_bytes()
                .map_or_else(|| "n/a".to_string(), |b| format!("{b} B"))
        );

        self.transition(SessionState::Encoding);
        let frame = SignedResponse {
            algorithm,
            latency_ms,
            signature: signed.as_bytes(),
            public_key: ctx.signer.public_key(algorithm),
        }
        .encode();
        drop(payload);

        self.transition(SessionState::Responding);
        let sent = send_all(&mut self.stream, frame.as_bytes()).await.map_err(SessionError::Write)?;
        Ok((algorithm, latency_ms, sent))
    }

    /// One receive into a buffer of at most `max` bytes. Zero bytes means the peer closed.
    async fn read_request(&mut self, max: usize) -> Result<Vec<u8>, SessionError> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(max).map_err(|_| SessionError::Allocation(max))?;
        buf.resize(max, 0);
        let n = loop {
            match self.stream.read(&mut buf).await {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(SessionError::Read(e)),
            }
        };
        if n == 0 {
            return Err(SessionError::PeerClosed);
        }
        buf.truncate(n);
        Ok(buf)
    }

    async fn close(&mut self, feedback: &mut FeedbackState) {
        self.transition(SessionState::Closed);
        if let Some(ms) = self.measured_latency_ms {
            feedback.record(ms);
        }
        if let Err(e) = self.stream.shutdown().await {
            log::debug!("shutdown of {} failed: {e}", self.peer);
        }
        log::info!("Client {} disconnected", self.peer);
    }
}

fn record_outcome(telemetry: &ServiceMetrics, outcome: &SessionOutcome) {
    use std::sync::atomic::Ordering::Relaxed;
    match outcome {
        SessionOutcome::Responded { algorithm, latency_ms, .. } => {
            telemetry.responses_total.fetch_add(1, Relaxed);
            telemetry.record_selection(*algorithm);
            telemetry.record_latency(*latency_ms);
        }
        SessionOutcome::Abandoned { error, latency_ms } => {
            let counter = match error {
                SessionError::PeerClosed | SessionError::Read(_) | SessionError::Allocation(_) => {
                    &telemetry.read_failures_total
                }
                SessionError::Sign(_) => &telemetry.sign_failures_total,
                SessionError::Write(_) => &telemetry.write_failures_total,
            };
            counter.fetch_add(1, Relaxed);
            if let Some(ms) = latency_ms {
                telemetry.record_latency(*ms);
            }
        }
    }
}

/// Write all of `buf`, looping over partial writes. `Ok(0)` from the stream is a hard error.
pub async fn send_all<W: AsyncWrite + Unpin>(stream: &mut W, mut buf: &[u8]) -> io::Result<usize> {
    let total = buf.len();
    while !buf.is_empty() {
        match stream.write(buf).await {
            Ok(0) => {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "peer stopped accepting bytes"));
            }
            Ok(n) => buf = &buf[n..],
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    stream.flush().await?;
    Ok(total)
}
