//! Client side of the wire protocol: send one payload, read the framed response and
//! verify the returned signature against the returned public key.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::crypto::{AlgorithmId, MlDsa44, MlDsa87, SigningPrimitive};
use crate::errors::ServiceError;
use crate::protocol::{ParsedResponse, parse_response};

/// Send `payload`, half-close, and read the response until the service closes the connection.
pub async fn request_signature(
    addr: &str,
    payload: &[u8],
    timeout: Duration,
) -> Result<String, ServiceError> {
    let exchange = async {
        let mut stream = TcpStream::connect(addr).await?;
        stream.write_all(payload).await?;
        stream.shutdown().await?;
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await?;
        Ok::<_, std::io::Error>(response)
    };
    let response = tokio::time::timeout(timeout, exchange).await.map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::TimedOut, format!("no response from {addr} within {timeout:?}"))
    })??;
    Ok(String::from_utf8_lossy(&response).trim().to_string())
}

/// Request a signature and decode the frame. An empty reply means the service abandoned the
/// session (oversized/empty request or signing failure).
pub async fn sign_remote(
    addr: &str,
    payload: &[u8],
    timeout: Duration,
) -> Result<ParsedResponse, ServiceError> {
    let text = request_signature(addr, payload, timeout).await?;
    if text.is_empty() {
        return Err(ServiceError::EmptyResponse);
    }
    Ok(parse_response(&text)?)
}

/// Verify the signature in `response` over `message` with the profile the service reported.
pub fn verify_response(response: &ParsedResponse, message: &[u8]) -> bool {
    let primitive: &dyn SigningPrimitive = match response.algorithm {
        AlgorithmId::LevelA => &MlDsa44,
        AlgorithmId::LevelB => &MlDsa87,
    };
    primitive.verify(&response.signature, message, &response.public_key)
}
