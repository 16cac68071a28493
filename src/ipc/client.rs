use super::protocol::{Request, Response};
use crate::error::AppError;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

/// Send one request to a running daemon and wait for its response.
pub async fn send_request(socket: &Path, request: &Request) -> Result<Response, AppError> {
    let mut bytes = serde_json::to_vec(request)?;
    bytes.push(b'\n');
    exchange(socket, &bytes, false).await
}

/// Send arbitrary bytes, then half-close so the daemon sees end of input.
pub async fn send_raw(socket: &Path, bytes: &[u8]) -> Result<Response, AppError> {
    exchange(socket, bytes, true).await
}

async fn exchange(socket: &Path, bytes: &[u8], half_close: bool) -> Result<Response, AppError> {
    let mut stream = UnixStream::connect(socket).await?;
    stream.write_all(bytes).await?;
    if half_close {
        stream.shutdown().await?;
    }

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await?;
    Ok(serde_json::from_slice(&raw)?)
}
