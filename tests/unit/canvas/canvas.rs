use super::*;
use crate::foundation::core::Geometry;
use crate::foundation::error::MatrixError;
use crate::matrix::simulated::SimulatedMatrix;

const RED: Rgb8 = Rgb8::new(255, 0, 0);
const BLUE: Rgb8 = Rgb8::new(0, 0, 255);

/// Matrix that records every call; `fail_*` make the corresponding call return an error.
#[derive(Default)]
struct RecordingMatrix {
    geometry: Option<Geometry>,
    colors: Vec<Rgb8>,
    calls: Vec<String>,
    fail_render: bool,
    fail_close: bool,
}

impl RecordingMatrix {
    fn new(width: usize, height: usize) -> Self {
        let g = Geometry::new(width, height);
        Self {
            geometry: Some(g),
            colors: vec![Rgb8::new(9, 9, 9); g.len()],
            ..Self::default()
        }
    }

    fn count(&self, name: &str) -> usize {
        self.calls.iter().filter(|c| c.as_str() == name).count()
    }
}

impl Matrix for RecordingMatrix {
    fn geometry(&mut self) -> MatrixResult<Geometry> {
        self.calls.push("geometry".to_string());
        self.geometry
            .ok_or_else(|| MatrixError::transport("geometry unavailable"))
    }

    fn at(&self, position: usize) -> Rgb8 {
        self.colors[position]
    }

    fn set(&mut self, position: usize, color: Rgb8) {
        self.colors[position] = color;
    }

    fn apply(&mut self, colors: Vec<Rgb8>) -> MatrixResult<()> {
        self.colors = colors;
        self.render()
    }

    fn render(&mut self) -> MatrixResult<()> {
        self.calls.push("render".to_string());
        if self.fail_render {
            return Err(MatrixError::transport("render failed"));
        }
        Ok(())
    }

    fn close(&mut self) -> MatrixResult<()> {
        // Record what the backend looked like at the moment it was closed.
        let blank = self.colors.iter().all(|&c| c == Rgb8::BLACK);
        self.calls.push(format!("close(blank={blank})"));
        if self.fail_close {
            return Err(MatrixError::remote("close failed"));
        }
        Ok(())
    }
}

#[test]
fn new_caches_geometry_once() {
    let mut canvas = Canvas::new(RecordingMatrix::new(64, 32)).unwrap();
    assert_eq!((canvas.width(), canvas.height()), (64, 32));
    canvas.set(1, 1, RED);
    let _ = canvas.at(1, 1);
    assert_eq!(canvas.matrix().count("geometry"), 1);
}

#[test]
fn new_propagates_geometry_failure() {
    let m = RecordingMatrix::default();
    assert!(matches!(
        Canvas::new(m).err().unwrap(),
        MatrixError::Transport(_)
    ));
}

#[test]
fn bounds_start_at_origin() {
    let canvas = Canvas::new(RecordingMatrix::new(10, 20)).unwrap();
    assert_eq!(
        canvas.bounds(),
        Rect {
            x: 0,
            y: 0,
            width: 10,
            height: 20
        }
    );
}

#[test]
fn set_and_at_map_to_row_major_positions() {
    let mut canvas = Canvas::new(RecordingMatrix::new(10, 20)).unwrap();
    canvas.set(5, 15, Rgb8::WHITE);
    assert_eq!(canvas.matrix().colors[155], Rgb8::WHITE);
    assert_eq!(canvas.at(5, 15), Rgb8::WHITE);

    for y in 0..20 {
        for x in 0..10 {
            let c = Rgb8::new(x as u8, y as u8, 1);
            canvas.set(x, y, c);
            assert_eq!(canvas.matrix().at(x + y * 10), c);
            assert_eq!(canvas.at(x, y), c);
        }
    }
}

#[test]
#[should_panic(expected = "out of bounds")]
fn set_outside_bounds_panics() {
    let mut canvas = Canvas::new(RecordingMatrix::new(4, 4)).unwrap();
    canvas.set(4, 0, RED);
}

#[test]
#[should_panic(expected = "canvas coordinate (0, 3) out of bounds 4x3")]
fn at_outside_bounds_names_the_coordinate() {
    let canvas = Canvas::new(RecordingMatrix::new(4, 3)).unwrap();
    let _ = canvas.at(0, 3);
}

#[test]
fn every_addressable_coordinate_is_inside_bounds() {
    let canvas = Canvas::new(RecordingMatrix::new(4, 3)).unwrap();
    let b = canvas.bounds();
    for y in 0..3 {
        for x in 0..4 {
            assert!(b.contains(x, y));
        }
    }
    assert!(!b.contains(4, 0));
    assert!(!b.contains(0, 3));
}

#[test]
fn clear_blanks_everything_and_renders_once() {
    let mut canvas = Canvas::new(RecordingMatrix::new(10, 20)).unwrap();
    canvas.clear().unwrap();
    assert!(canvas.matrix().colors.iter().all(|&c| c == Rgb8::BLACK));
    assert_eq!(canvas.matrix().count("render"), 1);
}

#[test]
fn render_delegates() {
    let mut canvas = Canvas::new(RecordingMatrix::new(1, 1)).unwrap();
    canvas.render().unwrap();
    assert_eq!(canvas.matrix().count("render"), 1);
}

#[test]
fn close_blanks_before_closing_backend() {
    let mut canvas = Canvas::new(RecordingMatrix::new(10, 20)).unwrap();
    canvas.set(3, 3, RED);
    canvas.close().unwrap();
    assert!(canvas.is_closed());
    assert_eq!(
        canvas.matrix().calls,
        vec!["geometry", "render", "close(blank=true)"]
    );

    // Second close does nothing.
    canvas.close().unwrap();
    assert_eq!(canvas.matrix().calls.len(), 3);
}

#[test]
fn close_still_closes_when_blanking_fails() {
    let mut m = RecordingMatrix::new(2, 2);
    m.fail_render = true;
    let mut canvas = Canvas::new(m).unwrap();
    let err = canvas.close().unwrap_err();
    assert!(err.to_string().contains("render failed"));
    assert_eq!(canvas.matrix().count("close(blank=true)"), 1);
}

#[test]
fn close_error_takes_priority_over_blanking_error() {
    let mut m = RecordingMatrix::new(2, 2);
    m.fail_render = true;
    m.fail_close = true;
    let mut canvas = Canvas::new(m).unwrap();
    let err = canvas.close().unwrap_err();
    assert!(matches!(err, MatrixError::Remote(_)));
}

#[test]
fn draw_image_is_opaque_over_and_clipped() {
    let mut canvas = Canvas::new(RecordingMatrix::new(3, 2)).unwrap();
    canvas.clear().unwrap();

    // 4x1 image: wider than the canvas, shorter than it.
    let img = RgbaImage::from_fn(4, 1, |x, _| match x {
        0 => Rgba([255, 0, 0, 255]),
        1 => Rgba([0, 0, 255, 0]),
        _ => Rgba([255, 255, 255, 128]),
    });
    canvas.draw_image(&img);

    assert_eq!(canvas.at(0, 0), RED);
    assert_eq!(canvas.at(1, 0), Rgb8::BLACK);
    assert_eq!(canvas.at(2, 0), Rgb8::new(128, 128, 128));
    // Row 1 is not covered by the image.
    assert_eq!(canvas.at(0, 1), Rgb8::BLACK);
}

#[test]
fn generic_image_view_reads_through_canvas() {
    let mut canvas = Canvas::new(RecordingMatrix::new(2, 2)).unwrap();
    canvas.set(1, 0, BLUE);
    assert_eq!(canvas.dimensions(), (2, 2));
    assert_eq!(canvas.get_pixel(1, 0), Rgba([0, 0, 255, 255]));
}

#[test]
fn two_by_two_scenario_lands_in_linear_order() {
    let sim = SimulatedMatrix::new(2, 2);
    let view = sim.view();
    let mut canvas = Canvas::new(sim).unwrap();
    canvas.set(0, 0, RED);
    canvas.set(1, 1, BLUE);
    canvas.render().unwrap();
    assert_eq!(
        view.front().unwrap(),
        vec![RED, Rgb8::BLACK, Rgb8::BLACK, BLUE]
    );
    assert_eq!(view.renders().unwrap(), 1);
}

#[test]
fn close_leaves_simulator_blank() {
    let sim = SimulatedMatrix::new(2, 2);
    let view = sim.view();
    let mut canvas = Canvas::new(sim).unwrap();
    canvas.set(0, 1, RED);
    canvas.render().unwrap();
    canvas.close().unwrap();
    assert!(view.is_closed().unwrap());
    assert_eq!(view.front().unwrap(), vec![Rgb8::BLACK; 4]);
}
