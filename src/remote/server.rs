use std::io::{BufReader, BufWriter};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::foundation::error::{MatrixError, MatrixResult};
use crate::matrix::Matrix;
use crate::remote::protocol::{Request, Response, decode, read_line, write_message};

type SharedMatrix = Arc<Mutex<Box<dyn Matrix>>>;

/// Serves a local [`Matrix`] to [`super::RemoteMatrix`] clients over TCP.
///
/// Every connection gets its own thread and executes its requests one at a time, in arrival
/// order. A client's `Close` only ends its connection; the wrapped matrix stays open for later
/// clients. The wrapped matrix sits behind a mutex, so calls from different connections never
/// overlap, but nothing stops two clients from interleaving whole frames.
pub struct MatrixServer {
    listener: TcpListener,
    matrix: SharedMatrix,
}

impl MatrixServer {
    /// Bind a listener for `matrix`.
    pub fn bind(addr: impl ToSocketAddrs, matrix: impl Matrix + 'static) -> MatrixResult<Self> {
        let listener = TcpListener::bind(addr)
            .map_err(|e| MatrixError::construction(format!("bind matrix server: {e}")))?;
        Ok(Self {
            listener,
            matrix: Arc::new(Mutex::new(Box::new(matrix))),
        })
    }

    /// Address the server is listening on.
    pub fn local_addr(&self) -> MatrixResult<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| MatrixError::transport(format!("listener address: {e}")))
    }

    /// Accept connections forever, one handler thread per connection.
    pub fn serve(self) -> MatrixResult<()> {
        let addr = self.local_addr()?;
        tracing::info!(%addr, "matrix server listening");

        for stream in self.listener.incoming() {
            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                    continue;
                }
            };
            let matrix = Arc::clone(&self.matrix);
            let spawned = std::thread::Builder::new()
                .name("rgbmatrix-conn".to_string())
                .spawn(move || {
                    let peer = stream.peer_addr().ok();
                    tracing::info!(?peer, "client connected");
                    match handle_connection(stream, &matrix) {
                        Ok(calls) => tracing::info!(?peer, calls, "client disconnected"),
                        Err(e) => tracing::warn!(?peer, error = %e, "connection aborted"),
                    }
                });
            if let Err(e) = spawned {
                tracing::warn!(error = %e, "failed to spawn connection handler");
            }
        }
        Ok(())
    }

    /// Run [`MatrixServer::serve`] on a background thread.
    pub fn spawn(self) -> JoinHandle<MatrixResult<()>> {
        std::thread::spawn(move || self.serve())
    }
}

/// Serve requests from one client until it hangs up. Returns the number of calls handled.
fn handle_connection(stream: TcpStream, matrix: &SharedMatrix) -> MatrixResult<u64> {
    let mut reader = BufReader::new(
        stream
            .try_clone()
            .map_err(|e| MatrixError::transport(format!("clone connection: {e}")))?,
    );
    let mut writer = BufWriter::new(stream);
    let mut line = String::new();
    let mut calls = 0u64;

    while read_line(&mut reader, &mut line)? {
        let mut finished = false;
        let resp = match decode::<Request>(&line) {
            Ok(req) => {
                calls += 1;
                finished = req == Request::Close;
                execute(matrix, req)
            }
            Err(e) => {
                tracing::warn!(error = %e, "rejecting malformed request");
                Response::Error {
                    message: e.to_string(),
                }
            }
        };
        write_message(&mut writer, &resp)?;
        if finished {
            break;
        }
    }
    Ok(calls)
}

fn execute(matrix: &SharedMatrix, req: Request) -> Response {
    let Ok(mut m) = matrix.lock() else {
        return Response::Error {
            message: "server matrix lock poisoned".to_string(),
        };
    };

    let res = match req {
        Request::Geometry => m.geometry().map(|g| Response::Geometry {
            width: g.width,
            height: g.height,
        }),
        Request::Apply { colors } => {
            tracing::trace!(pixels = colors.len(), "apply");
            m.apply(colors).map(|()| Response::Done)
        }
        Request::Close => {
            tracing::debug!("client ended its session");
            Ok(Response::Done)
        }
    };

    res.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "matrix call failed");
        Response::Error {
            message: e.to_string(),
        }
    })
}

#[cfg(test)]
#[path = "../../tests/unit/remote/server.rs"]
mod tests;
