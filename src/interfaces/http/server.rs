//! Minimal HTTP/1.1 server loop for the prediction API.
//!
//! Deliberately tiny: one spawned task per connection, close after the
//! response. All routing logic lives in [`super::routes`].

use super::routes::{dispatch, reason_phrase};
use crate::application::serving::service::PredictionService;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

const MAX_BODY_BYTES: usize = 1 << 20;

pub async fn serve(addr: &str, service: Arc<PredictionService>) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Prediction API listening on {}", addr);

    loop {
        let (stream, peer) = listener.accept().await.context("Accept failed")?;
        let service = service.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, service).await {
                debug!("Connection from {} closed with error: {}", peer, e);
            }
        });
    }
}

async fn handle_connection(stream: TcpStream, service: Arc<PredictionService>) -> Result<()> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .await
        .context("Failed to read request line")?;

    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let path = parts.next().unwrap_or("").to_string();

    // Headers: only Content-Length matters for this API
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 || line.trim().is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':')
            && name.trim().eq_ignore_ascii_case("content-length")
        {
            content_length = value.trim().parse().unwrap_or(0);
        }
    }

    let response = if content_length > MAX_BODY_BYTES {
        warn!("Rejecting oversized request body ({} bytes)", content_length);
        super::routes::HttpResponse {
            status: 400,
            body: r#"{"detail": "Request body too large"}"#.to_string(),
        }
    } else {
        let mut body = vec![0u8; content_length];
        if content_length > 0 {
            reader
                .read_exact(&mut body)
                .await
                .context("Failed to read request body")?;
        }
        let body = String::from_utf8_lossy(&body);
        dispatch(&service, &method, &path, &body)
    };

    let raw = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        reason_phrase(response.status),
        response.body.len(),
        response.body
    );

    let mut stream = reader.into_inner();
    stream.write_all(raw.as_bytes()).await?;
    stream.shutdown().await.ok();
    Ok(())
}
