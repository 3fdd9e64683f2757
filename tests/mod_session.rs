#[path = "_support/mod.rs"]
mod support;

use sleeqc::crypto::AlgorithmId;
use sleeqc::errors::SessionError;
use sleeqc::feedback::FeedbackState;
use sleeqc::protocol::parse_response;
use sleeqc::session::{Session, SessionContext, SessionOutcome, SessionState};
use sleeqc::telemetry::ServiceMetrics;
use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};
use support::SCENARIO_MESSAGE;

use SessionState::*;

#[tokio::test]
async fn full_session_walks_every_state_and_responds() {
    let signer = support::real_signer();
    let engine = support::level_a_engine();
    let metrics = support::plenty_of_memory();
    let telemetry = ServiceMetrics::default();
    let ctx = SessionContext { signer: &signer, engine: &engine, metrics: &metrics, telemetry: &telemetry, max_request_bytes: 10_000 };
    let mut feedback = FeedbackState::new();

    let (mut client, server) = duplex(64 * 1024);
    client.write_all(SCENARIO_MESSAGE).await.unwrap();
    client.shutdown().await.unwrap();

    let mut session = Session::new(server, "duplex");
    let outcome = session.run(&ctx, &mut feedback).await;
    assert_eq!(session.history(), &[Idle, Reading, Deciding, Signing, Encoding, Responding, Closed]);
    assert_eq!(session.state(), Closed);

    let latency = match outcome {
        SessionOutcome::Responded { algorithm, latency_ms, bytes_sent } => {
            assert_eq!(algorithm, AlgorithmId::LevelA);
            assert!(bytes_sent > 0);
            latency_ms
        }
        other => panic!("unexpected outcome: {other:?}"),
    };
    assert_eq!(feedback.previous_latency_ms(), latency);

    let mut response = String::new();
    client.read_to_string(&mut response).await.unwrap();
    let parsed = parse_response(&response).unwrap();
    assert_eq!(parsed.label, "ML-DSA-44");
    assert!(sleeqc::client::verify_response(&parsed, SCENARIO_MESSAGE));

    let snap = telemetry.snapshot();
    assert_eq!((snap.sessions_total, snap.responses_total, snap.level_a_total), (1, 1, 1));
}

#[tokio::test]
async fn peer_closing_without_data_sends_nothing() {
    let signer = support::real_signer();
    let engine = support::level_b_engine();
    let metrics = support::plenty_of_memory();
    let telemetry = ServiceMetrics::default();
    let ctx = SessionContext { signer: &signer, engine: &engine, metrics: &metrics, telemetry: &telemetry, max_request_bytes: 10_000 };
    let mut feedback = FeedbackState::new();
    feedback.record(42.0);

    let (mut client, server) = duplex(1024);
    client.shutdown().await.unwrap();

    let mut session = Session::new(server, "duplex");
    let outcome = session.run(&ctx, &mut feedback).await;
    assert!(matches!(outcome, SessionOutcome::Abandoned { error: SessionError::PeerClosed, latency_ms: None }));
    assert_eq!(session.history(), &[Idle, Reading, Closed]);
    assert_eq!(feedback.previous_latency_ms(), 42.0);

    let mut rest = Vec::new();
    client.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty());
    assert_eq!(telemetry.snapshot().read_failures_total, 1);
}

#[tokio::test]
async fn signing_failure_sends_nothing_and_keeps_feedback() {
    let signer = support::flaky_level_a_signer(1);
    let engine = support::level_a_engine();
    let metrics = support::plenty_of_memory();
    let telemetry = ServiceMetrics::default();
    let ctx = SessionContext { signer: &signer, engine: &engine, metrics: &metrics, telemetry: &telemetry, max_request_bytes: 10_000 };
    let mut feedback = FeedbackState::new();
    feedback.record(3.5);

    let (mut client, server) = duplex(64 * 1024);
    client.write_all(SCENARIO_MESSAGE).await.unwrap();
    client.shutdown().await.unwrap();

    let mut session = Session::new(server, "duplex");
    let outcome = session.run(&ctx, &mut feedback).await;
    assert!(matches!(outcome, SessionOutcome::Abandoned { error: SessionError::Sign(_), latency_ms: None }));
    assert_eq!(session.history(), &[Idle, Reading, Deciding, Signing, Closed]);
    assert_eq!(feedback.previous_latency_ms(), 3.5);

    let mut rest = Vec::new();
    client.read_to_end(&mut rest).await.unwrap();
    assert_eq!(rest.len(), 0);
    assert_eq!(telemetry.snapshot().sign_failures_total, 1);
}

#[tokio::test]
async fn oversized_request_is_truncated_to_one_read() {
    let signer = support::real_signer();
    let engine = support::level_a_engine();
    let metrics = support::plenty_of_memory();
    let telemetry = ServiceMetrics::default();
    let ctx = SessionContext { signer: &signer, engine: &engine, metrics: &metrics, telemetry: &telemetry, max_request_bytes: 16 };
    let mut feedback = FeedbackState::new();

    let (mut client, server) = duplex(64 * 1024);
    let payload = vec![0x5au8; 64];
    client.write_all(&payload).await.unwrap();
    client.shutdown().await.unwrap();

    let mut session = Session::new(server, "duplex");
    assert!(session.run(&ctx, &mut feedback).await.is_responded());

    let mut response = String::new();
    client.read_to_string(&mut response).await.unwrap();
    let parsed = parse_response(&response).unwrap();
    // Only the first receive (at most 16 bytes) was signed.
    assert!(sleeqc::client::verify_response(&parsed, &payload[..16]));
    assert!(!sleeqc::client::verify_response(&parsed, &payload));
}

#[tokio::test]
async fn inference_fault_still_produces_a_level_a_response() {
    let signer = support::real_signer();
    let engine = sleeqc::decision::DecisionEngine::new(Box::new(support::Faulting));
    let metrics = support::plenty_of_memory();
    let telemetry = ServiceMetrics::default();
    let ctx = SessionContext { signer: &signer, engine: &engine, metrics: &metrics, telemetry: &telemetry, max_request_bytes: 10_000 };
    let mut feedback = FeedbackState::new();

    let (mut client, server) = duplex(64 * 1024);
    client.write_all(b"hello").await.unwrap();
    client.shutdown().await.unwrap();

    let mut session = Session::new(server, "duplex");
    let outcome = session.run(&ctx, &mut feedback).await;
    assert!(matches!(outcome, SessionOutcome::Responded { algorithm: AlgorithmId::LevelA, .. }));
    assert_eq!(telemetry.snapshot().inference_fallbacks_total, 1);
}

#[tokio::test]
async fn write_failure_after_signing_still_records_latency() {
    let signer = support::real_signer();
    let engine = support::level_a_engine();
    let metrics = support::plenty_of_memory();
    let telemetry = ServiceMetrics::default();
    let ctx = SessionContext { signer: &signer, engine: &engine, metrics: &metrics, telemetry: &telemetry, max_request_bytes: 10_000 };
    let mut feedback = FeedbackState::new();

    let mut session = Session::new(support::BrokenPipeStream::new(SCENARIO_MESSAGE), "broken-pipe");
    let outcome = session.run(&ctx, &mut feedback).await;
    let latency = match outcome {
        SessionOutcome::Abandoned { error: SessionError::Write(e), latency_ms: Some(ms) } => {
            assert_eq!(e.kind(), std::io::ErrorKind::BrokenPipe);
            ms
        }
        other => panic!("unexpected outcome: {other:?}"),
    };
    assert_eq!(session.history(), &[Idle, Reading, Deciding, Signing, Encoding, Responding, Closed]);
    assert_eq!(feedback.previous_latency_ms(), latency);

    let snap = telemetry.snapshot();
    assert_eq!(snap.write_failures_total, 1);
    assert_eq!(snap.responses_total, 0);
    assert_eq!(session.into_inner().delivered, SCENARIO_MESSAGE.len());
}
