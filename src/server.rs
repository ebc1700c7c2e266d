//! ## HTTP server
//!
//! A small request/response loop over a tokio `TcpListener`. Connections are handled one at a
//! time, in the order they are accepted; a client that does not send its request head within
//! the configured timeout is disconnected. `GET /` loads (or reuses) the summary and renders the
//! dashboard; a failed load renders the error page and the server keeps running.

use crate::cache::{AnalysisCache, CsvSummarySource, SummarySource};
use crate::dashboard;
use crate::exceptions::DashboardResult;
use crate::settings::DashboardConfig;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Upper bound on header lines read per request.
const MAX_HEADER_LINES: usize = 100;

/// Upper bound on bytes read for the request line and headers together.
pub const MAX_REQUEST_HEAD_BYTES: u64 = 16 * 1024;

/// A fully rendered response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    fn html(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "text/html; charset=utf-8",
            body,
        }
    }

    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.to_string(),
        }
    }

    fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            405 => "Method Not Allowed",
            _ => "Internal Server Error",
        }
    }

    /// Serializes the status line, headers, and body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            self.status,
            self.reason(),
            self.content_type,
            self.body.len()
        )
        .into_bytes();
        out.extend_from_slice(self.body.as_bytes());
        out
    }
}

/// Routes a single request line such as `GET / HTTP/1.1`.
pub async fn handle_request<S>(
    request_line: &str,
    cache: &AnalysisCache<S>,
    config: &DashboardConfig,
) -> HttpResponse
where
    S: SummarySource + Send + Sync,
{
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
        return HttpResponse::text(400, "Bad Request");
    };
    let path = target.split('?').next().unwrap_or(target);

    if path != "/" {
        return HttpResponse::text(404, "Not Found");
    }
    if method != "GET" {
        return HttpResponse::text(405, "Method Not Allowed");
    }

    let source_name = config.source_name();
    match cache.get_or_load(&config.data_path).await {
        Ok(summary) => HttpResponse::html(200, dashboard::render_dashboard(&summary, &source_name)),
        Err(e) => HttpResponse::html(200, dashboard::render_error(&e, &source_name)),
    }
}

/// Reads the request line and skips the headers, never reading past [`MAX_REQUEST_HEAD_BYTES`].
///
/// Returns an empty string when the client closed the connection without sending anything.
pub async fn read_request_head<R>(reader: R) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader.take(MAX_REQUEST_HEAD_BYTES));

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).await? == 0 {
        return Ok(request_line);
    }

    // Headers are read and dropped; nothing in them changes the response.
    let mut line = String::new();
    for _ in 0..MAX_HEADER_LINES {
        line.clear();
        let read = reader.read_line(&mut line).await?;
        if read == 0 || line == "\r\n" || line == "\n" {
            break;
        }
    }
    Ok(request_line)
}

async fn handle_connection<S>(
    mut stream: TcpStream,
    cache: &AnalysisCache<S>,
    config: &DashboardConfig,
) -> DashboardResult<()>
where
    S: SummarySource + Send + Sync,
{
    let (read_half, mut write_half) = stream.split();

    let request_line = match timeout(config.request_timeout, read_request_head(read_half)).await {
        Ok(head) => head?,
        Err(_) => {
            debug!(
                "No request within {:?}, closing connection",
                config.request_timeout
            );
            return Ok(());
        }
    };
    if request_line.is_empty() {
        return Ok(());
    }

    let response = handle_request(request_line.trim_end(), cache, config).await;
    debug!("{} -> {}", request_line.trim_end(), response.status);
    write_half.write_all(&response.to_bytes()).await?;
    write_half.flush().await?;
    Ok(())
}

/// Accepts connections on `listener` forever, answering them one by one.
pub async fn serve_with<S>(
    listener: TcpListener,
    cache: Arc<AnalysisCache<S>>,
    config: DashboardConfig,
) -> DashboardResult<()>
where
    S: SummarySource + Send + Sync,
{
    loop {
        let (stream, peer) = listener.accept().await?;
        debug!("Accepted connection from {}", peer);
        if let Err(e) = handle_connection(stream, &cache, &config).await {
            warn!("Connection from {} failed: {}", peer, e);
        }
    }
}

/// Binds the configured address and serves the dashboard for the CSV at `config.data_path`.
pub async fn serve(config: DashboardConfig) -> DashboardResult<()> {
    config.validate()?;
    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(
        "Serving dashboard for '{}' on http://{}/",
        config.data_path.display(),
        listener.local_addr()?
    );
    let cache = Arc::new(AnalysisCache::new(CsvSummarySource::new(config.top_n)));
    serve_with(listener, cache, config).await
}
