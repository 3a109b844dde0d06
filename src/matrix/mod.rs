//! The backend contract every pixel surface implements, and the factory that picks one.

/// Construction options and backend selection.
pub mod config;
/// Physical panel backend.
#[cfg(feature = "hardware")]
pub mod native;
/// In-memory backend with observable output.
pub mod simulated;

use crate::foundation::core::{Geometry, Rgb8};
use crate::foundation::error::{MatrixError, MatrixResult};
use config::{BackendKind, MatrixConfig};

/// An addressable RGB pixel grid with buffered render/commit.
///
/// Positions are linear, row-major, top-left origin: `x + y * width`, always in
/// `[0, width * height)`. Writes go to a pending buffer; [`Matrix::render`] makes every write
/// since the previous render visible as one unit and starts a fresh black pending buffer.
///
/// Native, simulated and remote implementations are interchangeable behind this trait.
pub trait Matrix: Send {
    /// Surface size. Remote backends ask the server on every call.
    fn geometry(&mut self) -> MatrixResult<Geometry>;

    /// Color of the pending buffer at `position`.
    fn at(&self, position: usize) -> Rgb8;

    /// Write `color` into the pending buffer at `position`.
    fn set(&mut self, position: usize, color: Rgb8);

    /// Replace the whole frame and render it.
    ///
    /// Equivalent to `set` for every position in order followed by `render`. `colors` must hold
    /// exactly `width * height` entries.
    fn apply(&mut self, colors: Vec<Rgb8>) -> MatrixResult<()>;

    /// Commit the pending buffer to the output. Safe to call with nothing pending.
    fn render(&mut self) -> MatrixResult<()>;

    /// Release the backend. Irreversible.
    fn close(&mut self) -> MatrixResult<()>;
}

impl<M: Matrix + ?Sized> Matrix for Box<M> {
    fn geometry(&mut self) -> MatrixResult<Geometry> {
        (**self).geometry()
    }

    fn at(&self, position: usize) -> Rgb8 {
        (**self).at(position)
    }

    fn set(&mut self, position: usize, color: Rgb8) {
        (**self).set(position, color)
    }

    fn apply(&mut self, colors: Vec<Rgb8>) -> MatrixResult<()> {
        (**self).apply(colors)
    }

    fn render(&mut self) -> MatrixResult<()> {
        (**self).render()
    }

    fn close(&mut self) -> MatrixResult<()> {
        (**self).close()
    }
}

/// Check that a full-frame buffer matches the surface size.
pub(crate) fn check_frame_len(geometry: Geometry, colors: &[Rgb8]) -> MatrixResult<()> {
    if colors.len() != geometry.len() {
        return Err(MatrixError::validation(format!(
            "frame buffer has {} pixels, matrix {}x{} needs {}",
            colors.len(),
            geometry.width,
            geometry.height,
            geometry.len()
        )));
    }
    Ok(())
}

/// Create the backend selected by `config.backend`.
///
/// - `Simulated` is always available.
/// - `Native` requires the `hardware` feature.
/// - `Remote` connects to `config.remote_addr`.
#[tracing::instrument(skip(config), fields(backend = ?config.backend))]
pub fn create_matrix(config: &MatrixConfig) -> MatrixResult<Box<dyn Matrix>> {
    config.validate()?;
    match config.backend {
        BackendKind::Simulated => Ok(Box::new(simulated::SimulatedMatrix::from_config(config))),
        BackendKind::Native => create_native(config),
        BackendKind::Remote => Ok(Box::new(crate::remote::RemoteMatrix::connect(
            config.remote_addr.as_str(),
        )?)),
    }
}

#[cfg(feature = "hardware")]
fn create_native(config: &MatrixConfig) -> MatrixResult<Box<dyn Matrix>> {
    Ok(Box::new(native::NativeMatrix::new(config)?))
}

#[cfg(not(feature = "hardware"))]
fn create_native(_config: &MatrixConfig) -> MatrixResult<Box<dyn Matrix>> {
    Err(MatrixError::construction(
        "native backend requires rgbmatrix to be built with the `hardware` feature",
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/matrix/factory.rs"]
mod tests;
