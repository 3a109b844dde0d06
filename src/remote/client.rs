use std::io::{BufReader, BufWriter};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};

use crate::foundation::core::{Geometry, Rgb8};
use crate::foundation::error::{MatrixError, MatrixResult};
use crate::matrix::{Matrix, check_frame_len};
use crate::remote::protocol::{Request, Response, decode, read_line, write_message};

/// Matrix proxy that forwards every call to a [`super::MatrixServer`].
///
/// `set`/`at` work on a local pending buffer shaped like the server's matrix; `render` ships
/// the whole buffer in one `Apply` call. Transport failures are returned as
/// [`MatrixError::Transport`] and never retried.
///
/// Closing only ends this client's session. The server's matrix stays open for the next client.
pub struct RemoteMatrix {
    peer: SocketAddr,
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    line: String,
    geometry: Geometry,
    pending: Vec<Rgb8>,
    /// Last frame the server acknowledged was all black.
    shown_blank: bool,
}

impl RemoteMatrix {
    /// Connect to a server and size the local buffer from its geometry.
    pub fn connect(addr: impl ToSocketAddrs) -> MatrixResult<Self> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| MatrixError::construction(format!("connect to matrix server: {e}")))?;
        stream
            .set_nodelay(true)
            .map_err(|e| MatrixError::construction(format!("configure connection: {e}")))?;
        let peer = stream
            .peer_addr()
            .map_err(|e| MatrixError::construction(format!("matrix server address: {e}")))?;
        let reader = BufReader::new(
            stream
                .try_clone()
                .map_err(|e| MatrixError::construction(format!("clone connection: {e}")))?,
        );

        let mut client = Self {
            peer,
            reader,
            writer: BufWriter::new(stream),
            line: String::new(),
            geometry: Geometry::new(0, 0),
            pending: Vec::new(),
            shown_blank: false,
        };
        let geometry = client
            .fetch_geometry()
            .map_err(|e| MatrixError::construction(format!("initial geometry call: {e}")))?;
        client.geometry = geometry;
        client.pending = geometry.blank_frame();

        tracing::debug!(%peer, width = geometry.width, height = geometry.height, "connected");
        Ok(client)
    }

    /// Address of the server.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    fn call(&mut self, req: &Request) -> MatrixResult<Response> {
        write_message(&mut self.writer, req)?;
        if !read_line(&mut self.reader, &mut self.line)? {
            return Err(MatrixError::transport(
                "matrix server closed the connection",
            ));
        }
        match decode::<Response>(&self.line)? {
            Response::Error { message } => Err(MatrixError::remote(message)),
            resp => Ok(resp),
        }
    }

    fn call_done(&mut self, req: &Request) -> MatrixResult<()> {
        match self.call(req)? {
            Response::Done => Ok(()),
            other => Err(MatrixError::transport(format!(
                "unexpected response {other:?}"
            ))),
        }
    }

    fn ship(&mut self, colors: Vec<Rgb8>) -> MatrixResult<()> {
        let blank = colors.iter().all(|&c| c == Rgb8::BLACK);
        self.shown_blank = false;
        self.call_done(&Request::Apply { colors })?;
        self.shown_blank = blank;
        Ok(())
    }

    fn fetch_geometry(&mut self) -> MatrixResult<Geometry> {
        match self.call(&Request::Geometry)? {
            Response::Geometry { width, height } => Ok(Geometry::new(width, height)),
            other => Err(MatrixError::transport(format!(
                "unexpected response {other:?}"
            ))),
        }
    }
}

impl Matrix for RemoteMatrix {
    fn geometry(&mut self) -> MatrixResult<Geometry> {
        self.fetch_geometry()
    }

    fn at(&self, position: usize) -> Rgb8 {
        self.pending[position]
    }

    fn set(&mut self, position: usize, color: Rgb8) {
        self.pending[position] = color;
    }

    fn apply(&mut self, colors: Vec<Rgb8>) -> MatrixResult<()> {
        check_frame_len(self.geometry, &colors)?;
        self.pending = self.geometry.blank_frame();
        self.ship(colors)
    }

    fn render(&mut self) -> MatrixResult<()> {
        let colors = std::mem::replace(&mut self.pending, self.geometry.blank_frame());
        self.ship(colors)
    }

    /// Blank the panel unless it already shows black, then end the session.
    fn close(&mut self) -> MatrixResult<()> {
        if !self.shown_blank {
            self.ship(self.geometry.blank_frame())?;
        }
        self.call_done(&Request::Close)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/remote/client.rs"]
mod tests;
