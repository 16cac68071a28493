use super::protocol::{Request, Response};
use crate::constants::{ACCEPT_BACKOFF, MAX_REQUEST_BYTES, REQUEST_READ_TIMEOUT};
use crate::error::AppError;
use log::{debug, info, warn};
use std::fs::{self, Permissions};
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::time;
use tokio_util::sync::CancellationToken;

/// Answers one decoded request. Supplied by whoever composes the server.
pub trait CommandHandler: Send + Sync {
    fn handle(&self, request: Request) -> Response;
}

impl<F> CommandHandler for F
where
    F: Fn(Request) -> Response + Send + Sync,
{
    fn handle(&self, request: Request) -> Response {
        self(request)
    }
}

/// Local control socket: one request and one response per connection.
pub struct ControlServer {
    listener: UnixListener,
    path: PathBuf,
}

impl ControlServer {
    /// Bind `path`, replacing any stale socket left by a previous run, and
    /// restrict it to the owning user.
    pub fn bind(path: &Path) -> Result<Self, AppError> {
        remove_socket_file(path);

        let bind_err = |source: io::Error| AppError::Bind {
            path: path.to_path_buf(),
            source,
        };

        let listener = UnixListener::bind(path).map_err(bind_err)?;
        if let Err(e) = fs::set_permissions(path, Permissions::from_mode(0o600)) {
            drop(listener);
            let _ = fs::remove_file(path);
            return Err(bind_err(e));
        }

        info!("Control server listening on {}", path.display());
        Ok(Self {
            listener,
            path: path.to_path_buf(),
        })
    }

    /// Accept connections until `shutdown` is cancelled. Each connection is
    /// served on its own task and is never cut short by shutdown.
    pub async fn serve(self, handler: Arc<dyn CommandHandler>, shutdown: CancellationToken) {
        let Self { listener, path } = self;

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, _addr)) => {
                        let handler = Arc::clone(&handler);
                        tokio::spawn(async move {
                            handle_connection(stream, handler.as_ref()).await;
                        });
                    }
                    Err(e) => match on_accept_error(&e, shutdown.is_cancelled()) {
                        AcceptAction::Stop => break,
                        AcceptAction::Retry => {
                            warn!("Control socket accept failed: {e}, retrying");
                            time::sleep(ACCEPT_BACKOFF).await;
                        }
                    },
                },
            }
        }

        // Dropping the listener closes the socket; the file is removed by shutdown.
        drop(listener);
        info!("Control server on {} stopped", path.display());
    }
}

/// Remove a socket file if present. Failures other than "not found" are logged.
pub fn remove_socket_file(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed socket file {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove socket file {}: {e}", path.display()),
    }
}

fn is_listener_closed(err: &io::Error) -> bool {
    matches!(err.raw_os_error(), Some(code) if code == libc::EBADF || code == libc::EINVAL)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AcceptAction {
    Stop,
    Retry,
}

/// Stop once shutdown was requested or the listener is gone; back off and retry otherwise.
fn on_accept_error(err: &io::Error, cancelled: bool) -> AcceptAction {
    if cancelled || is_listener_closed(err) {
        AcceptAction::Stop
    } else {
        AcceptAction::Retry
    }
}

async fn handle_connection(mut stream: UnixStream, handler: &dyn CommandHandler) {
    let response = match time::timeout(REQUEST_READ_TIMEOUT, read_request(&mut stream)).await {
        Ok(Ok(request)) => handler.handle(request),
        Ok(Err(e)) => {
            debug!("Rejecting control request: {e}");
            Response::failure()
        }
        Err(_) => {
            debug!("Rejecting control request: {}", AppError::RequestTimeout);
            Response::failure()
        }
    };

    if let Err(e) = write_response(&mut stream, &response).await {
        debug!("Failed to send control response: {e}");
    }
}

/// Read exactly one JSON request. The peer does not have to close its write
/// half; decoding stops as soon as one complete value has arrived.
pub(crate) async fn read_request<R>(reader: &mut R) -> Result<Request, AppError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 4096];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            // EOF before a complete value: report the decoder's own error.
            return Ok(serde_json::from_slice(&buf)?);
        }

        buf.extend_from_slice(chunk.get(..n).unwrap_or_default());
        if buf.len() > MAX_REQUEST_BYTES {
            return Err(AppError::RequestTooLarge {
                max: MAX_REQUEST_BYTES,
            });
        }

        if let Some(decoded) = try_decode(&buf) {
            return decoded;
        }
    }
}

/// `None` means the buffer holds a valid prefix and more bytes are needed.
fn try_decode(buf: &[u8]) -> Option<Result<Request, AppError>> {
    let mut values = serde_json::Deserializer::from_slice(buf).into_iter::<Request>();
    match values.next()? {
        Ok(request) => Some(Ok(request)),
        Err(e) if e.is_eof() => None,
        Err(e) => Some(Err(e.into())),
    }
}

pub(crate) async fn write_response<W>(writer: &mut W, response: &Response) -> Result<(), AppError>
where
    W: AsyncWrite + Unpin,
{
    let mut bytes = serde_json::to_vec(response)?;
    bytes.push(b'\n');
    writer.write_all(&bytes).await?;
    writer.shutdown().await?;
    Ok(())
}
