use std::io::{BufRead, Write};

use crate::foundation::core::Rgb8;
use crate::foundation::error::{MatrixError, MatrixResult};

/// A call from a [`super::RemoteMatrix`] to a [`super::MatrixServer`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Request {
    /// Ask for the wrapped matrix's size.
    Geometry,
    /// Replace and render the whole frame.
    Apply {
        /// One color per position, row-major.
        colors: Vec<Rgb8>,
    },
    /// Close the wrapped matrix.
    Close,
}

/// The server's answer to one [`Request`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Response {
    /// Reply to [`Request::Geometry`].
    Geometry {
        /// Width in pixels.
        width: usize,
        /// Height in pixels.
        height: usize,
    },
    /// The call succeeded and has no payload.
    Done,
    /// The call failed on the server.
    Error {
        /// Server-side error message.
        message: String,
    },
}

/// Write `msg` as a single JSON line and flush.
pub(crate) fn write_message<T: serde::Serialize>(w: &mut impl Write, msg: &T) -> MatrixResult<()> {
    let mut line = serde_json::to_vec(msg)
        .map_err(|e| MatrixError::transport(format!("encode message: {e}")))?;
    line.push(b'\n');
    w.write_all(&line)
        .and_then(|()| w.flush())
        .map_err(|e| MatrixError::transport(format!("write message: {e}")))
}

/// Read one line into `buf`. Returns `false` on a clean end of stream.
pub(crate) fn read_line(r: &mut impl BufRead, buf: &mut String) -> MatrixResult<bool> {
    buf.clear();
    let n = r
        .read_line(buf)
        .map_err(|e| MatrixError::transport(format!("read message: {e}")))?;
    Ok(n > 0)
}

/// Decode one JSON line.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(line: &str) -> MatrixResult<T> {
    serde_json::from_str(line.trim_end())
        .map_err(|e| MatrixError::transport(format!("malformed message: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/remote/protocol.rs"]
mod tests;
