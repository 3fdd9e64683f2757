// Shared fixtures for the integration suites. Each suite pulls in what it needs.
#![allow(dead_code)]

use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use sleeqc::config::ServiceConfig;
use sleeqc::crypto::{AlgorithmProfile, DualSigner, MlDsa44, MlDsa87, SigningPrimitive};
use sleeqc::decision::{DecisionEngine, InferenceCapability};
use sleeqc::errors::{InferenceError, SignError};
use sleeqc::resources::FixedMetrics;

pub const SCENARIO_MESSAGE: &[u8] = b"Resource adaptive PQC signing test";

/// Wraps a real primitive and fails the first `failures` sign calls.
pub struct FlakySigner<P> {
    pub inner: P,
    pub failures: usize,
    pub calls: AtomicUsize,
}

impl<P> FlakySigner<P> {
    pub fn new(inner: P, failures: usize) -> Self {
        Self { inner, failures, calls: AtomicUsize::new(0) }
    }
}

impl<P: SigningPrimitive> SigningPrimitive for FlakySigner<P> {
    fn profile(&self) -> &'static AlgorithmProfile {
        self.inner.profile()
    }

    fn keypair(&self, public: &mut [u8], secret: &mut [u8]) -> Result<(), SignError> {
        self.inner.keypair(public, secret)
    }

    fn sign(&self, signature: &mut [u8], message: &[u8], secret: &[u8]) -> Result<usize, SignError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            return Err(SignError::Primitive {
                profile: self.inner.profile().label,
                reason: "injected failure".into(),
            });
        }
        self.inner.sign(signature, message, secret)
    }

    fn verify(&self, signature: &[u8], message: &[u8], public: &[u8]) -> bool {
        self.inner.verify(signature, message, public)
    }
}

/// Primitive whose key generation always fails.
pub struct BrokenKeygen<P>(pub P);

impl<P: SigningPrimitive> SigningPrimitive for BrokenKeygen<P> {
    fn profile(&self) -> &'static AlgorithmProfile {
        self.0.profile()
    }

    fn keypair(&self, _: &mut [u8], _: &mut [u8]) -> Result<(), SignError> {
        Err(SignError::Primitive { profile: self.0.profile().label, reason: "rng unavailable".into() })
    }

    fn sign(&self, signature: &mut [u8], message: &[u8], secret: &[u8]) -> Result<usize, SignError> {
        self.0.sign(signature, message, secret)
    }

    fn verify(&self, signature: &[u8], message: &[u8], public: &[u8]) -> bool {
        self.0.verify(signature, message, public)
    }
}

/// Returns a fixed score.
pub struct FixedScore(pub f32);

impl InferenceCapability for FixedScore {
    fn infer(&self, _: [f32; 3]) -> Result<f32, InferenceError> {
        Ok(self.0)
    }
}

/// Always faults.
pub struct Faulting;

impl InferenceCapability for Faulting {
    fn infer(&self, _: [f32; 3]) -> Result<f32, InferenceError> {
        Err(InferenceError::Fault("accelerator offline".into()))
    }
}

/// Records every feature vector it sees, then returns `score`.
pub struct Recording {
    pub seen: Arc<Mutex<Vec<[f32; 3]>>>,
    pub score: f32,
}

impl InferenceCapability for Recording {
    fn infer(&self, features: [f32; 3]) -> Result<f32, InferenceError> {
        self.seen.lock().unwrap().push(features);
        Ok(self.score)
    }
}

pub fn real_signer() -> DualSigner {
    DualSigner::generate().unwrap()
}

/// Level-A primitive failing its first `failures` signs, real Level-B.
pub fn flaky_level_a_signer(failures: usize) -> DualSigner {
    DualSigner::with_primitives(Box::new(FlakySigner::new(MlDsa44, failures)), Box::new(MlDsa87))
        .unwrap()
}

pub fn level_a_engine() -> DecisionEngine {
    DecisionEngine::new(Box::new(FixedScore(0.0)))
}

pub fn level_b_engine() -> DecisionEngine {
    DecisionEngine::new(Box::new(FixedScore(1.0)))
}

pub fn plenty_of_memory() -> FixedMetrics {
    FixedMetrics { free_kb: 4096.0, stack_headroom: Some(64 * 1024) }
}

pub fn loopback_config() -> ServiceConfig {
    ServiceConfig { bind: "127.0.0.1".into(), port: 0, accept_retry_ms: 10, ..ServiceConfig::default() }
}

/// Delivers `request` on the first read, then fails every write with `BrokenPipe`.
pub struct BrokenPipeStream {
    pub request: Vec<u8>,
    pub delivered: usize,
}

impl BrokenPipeStream {
    pub fn new(request: &[u8]) -> Self {
        Self { request: request.to_vec(), delivered: 0 }
    }
}

impl AsyncRead for BrokenPipeStream {
    fn poll_read(mut self: Pin<&mut Self>, _: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let start = self.delivered;
        let n = buf.remaining().min(self.request.len() - start);
        buf.put_slice(&self.request[start..start + n]);
        self.delivered += n;
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for BrokenPipeStream {
    fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, _: &[u8]) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer went away")))
    }
    fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
    fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
