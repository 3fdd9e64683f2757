use std::time::Duration;

use crate::config::ServiceConfig;
use crate::crypto::DualSigner;
use crate::decision::DecisionEngine;
use crate::errors::ServiceError;
use crate::resources::SystemMetrics;
use crate::server::Server;

pub enum Command {
    // Service
    Serve,
    // Client
    Sign { addr: String, payload: Vec<u8> },
    // Diagnostics
    Bench { iterations: u32, message: Vec<u8> },
    ShowConfig,
}

/// Generate keys, load the model and bind. Any failure here stops the service.
pub async fn start(cfg: &ServiceConfig) -> Result<Server, ServiceError> {
    let signer = DualSigner::generate()?;
    let engine = DecisionEngine::from_config(&cfg.model)?;
    log::info!("Decision engine: {engine:?}");
    Server::bind(cfg, signer, engine, Box::new(SystemMetrics)).await
}

pub async fn run(cfg: &ServiceConfig, cmd: Command) -> Result<(), ServiceError> {
    match cmd {
        Command::Serve => {
            crate::logger::configure_logging(&cfg.log)?;
            let mut server = start(cfg).await.inspect_err(|e| log::error!("Fatal: {e}"))?;
            server
                .run_until(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        log::error!("ctrl-c handler failed: {e}");
                        std::future::pending::<()>().await;
                    }
                })
                .await;
            // Dropping the server drops the signer, which wipes both secret keys.
            drop(server);
            log::info!("Service stopped");
            Ok(())
        }
        Command::Sign { addr, payload } => {
            let timeout = Duration::from_secs(cfg.client_timeout_secs);
            let response = crate::client::sign_remote(&addr, &payload, timeout).await?;
            println!("algorithm={}", response.label);
            match response.latency_ms {
                Some(ms) => println!("sign_time_ms={ms:.2}"),
                None => println!("sign_time_ms=n/a"),
            }
            println!("signature_bytes={}", response.signature.len());
            println!("public_key_bytes={}", response.public_key.len());
            if !crate::client::verify_response(&response, &payload) {
                return Err(ServiceError::VerificationFailed(response.label));
            }
            println!("verification=ok");
            Ok(())
        }
        Command::Bench { iterations, message } => {
            for report in crate::bench::run(iterations, &message)? {
                println!("{report}");
            }
            Ok(())
        }
        Command::ShowConfig => {
            print!("{}", cfg.to_toml_string()?);
            Ok(())
        }
    }
}
