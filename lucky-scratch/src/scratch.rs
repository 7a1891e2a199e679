use crate::constants::{BRUSH_RADIUS, REVEAL_THRESHOLD, SURFACE_HEIGHT, SURFACE_WIDTH};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// On-screen rectangle of the card as reported by the input device.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct DeviceRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl DeviceRect {
    /// Maps a device point into a surface's logical space. `None` for a degenerate rect.
    pub fn to_surface(&self, client: Point, surface: &ScratchSurface) -> Option<Point> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        let scale_x = surface.width() as f64 / self.width;
        let scale_y = surface.height() as f64 / self.height;
        Some(Point {
            x: (client.x - self.left) * scale_x,
            y: (client.y - self.top) * scale_y,
        })
    }
}

/// Covered card surface. Cells are cleared by round-brush strokes; the reveal signal fires once,
/// on the stroke that first takes the cleared fraction past the threshold.
#[derive(Clone, Debug)]
pub struct ScratchSurface {
    width: usize,
    height: usize,
    brush_radius: f64,
    threshold: f64,
    cleared: Vec<bool>,
    cleared_count: usize,
    past_threshold: bool,
    revealed: bool,
    last_point: Option<Point>,
}

impl Default for ScratchSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl ScratchSurface {
    pub fn new() -> Self {
        Self::with_dimensions(SURFACE_WIDTH, SURFACE_HEIGHT, BRUSH_RADIUS, REVEAL_THRESHOLD)
    }

    pub fn with_dimensions(width: usize, height: usize, brush_radius: f64, threshold: f64) -> Self {
        let mut surface = Self {
            width,
            height,
            brush_radius,
            threshold,
            cleared: vec![false; width * height],
            cleared_count: 0,
            past_threshold: false,
            revealed: false,
            last_point: None,
        };
        surface.past_threshold = surface.cleared_fraction() > threshold;
        surface
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn cleared_fraction(&self) -> f64 {
        let total = self.width * self.height;
        if total == 0 {
            return 0.0;
        }
        self.cleared_count as f64 / total as f64
    }

    pub fn is_cleared(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.cleared[y * self.width + x]
    }

    /// Clears the brush footprint at `to`, plus the swept segment from `from` when given.
    /// Returns true only on the stroke that triggers the reveal.
    pub fn apply_stroke(&mut self, from: Option<Point>, to: Point) -> bool {
        let from_point = from.unwrap_or(to);
        let r = self.brush_radius;
        let min_x = from_point.x.min(to.x) - r;
        let max_x = from_point.x.max(to.x) + r;
        let min_y = from_point.y.min(to.y) - r;
        let max_y = from_point.y.max(to.y) + r;
        if let (Some((x0, x1)), Some((y0, y1))) = (
            clip_span(min_x, max_x, self.width),
            clip_span(min_y, max_y, self.height),
        ) {
            let r2 = r * r;
            for cy in y0..=y1 {
                for cx in x0..=x1 {
                    let idx = cy * self.width + cx;
                    if self.cleared[idx] {
                        continue;
                    }
                    let center = Point::new(cx as f64 + 0.5, cy as f64 + 0.5);
                    if distance_sq_to_segment(center, from_point, to) <= r2 {
                        self.cleared[idx] = true;
                        self.cleared_count += 1;
                    }
                }
            }
        }
        self.update_reveal()
    }

    /// Starts a pointer gesture; the first contact already scratches.
    pub fn begin(&mut self, point: Point) -> bool {
        self.last_point = Some(point);
        self.apply_stroke(None, point)
    }

    /// Continues the current gesture. Moves outside a gesture are ignored.
    pub fn move_to(&mut self, point: Point) -> bool {
        let Some(last) = self.last_point else {
            return false;
        };
        self.last_point = Some(point);
        self.apply_stroke(Some(last), point)
    }

    pub fn end(&mut self) {
        self.last_point = None;
    }

    /// Wipes whatever is left once the card has been revealed.
    pub fn clear_all(&mut self) {
        if !self.revealed {
            return;
        }
        self.cleared.iter_mut().for_each(|c| *c = true);
        self.cleared_count = self.cleared.len();
        self.past_threshold = true;
    }

    fn update_reveal(&mut self) -> bool {
        let now_past = self.cleared_fraction() > self.threshold;
        let crossed = now_past && !self.past_threshold;
        self.past_threshold = now_past;
        if crossed && !self.revealed {
            self.revealed = true;
            return true;
        }
        false
    }
}

fn clip_span(lo: f64, hi: f64, len: usize) -> Option<(usize, usize)> {
    if len == 0 || hi < 0.0 || lo >= len as f64 || !lo.is_finite() || !hi.is_finite() {
        return None;
    }
    let start = lo.max(0.0).floor() as usize;
    let end = hi.min((len - 1) as f64).floor() as usize;
    Some((start, end))
}

fn distance_sq_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    (p.x - cx).powi(2) + (p.y - cy).powi(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sweep_row(surface: &mut ScratchSurface, y: f64) -> bool {
        surface.apply_stroke(Some(Point::new(-10.0, y)), Point::new(310.0, y))
    }

    #[test]
    fn strokes_outside_clear_nothing() {
        let mut surface = ScratchSurface::new();
        assert!(!surface.apply_stroke(None, Point::new(-100.0, -100.0)));
        assert!(!surface.apply_stroke(Some(Point::new(400.0, 10.0)), Point::new(600.0, 150.0)));
        assert_eq!(surface.cleared_fraction(), 0.0);
        assert!(!surface.is_revealed());
    }

    #[test]
    fn dab_clears_a_disc() {
        let mut surface = ScratchSurface::new();
        surface.apply_stroke(None, Point::new(150.0, 100.0));
        assert!(surface.is_cleared(150, 100));
        assert!(surface.is_cleared(135, 100));
        assert!(!surface.is_cleared(171, 100));
        assert!(!surface.is_cleared(165, 115));
        let disc = std::f64::consts::PI * 20.0 * 20.0 / (300.0 * 200.0);
        assert!((surface.cleared_fraction() - disc).abs() < 0.002);
    }

    #[test]
    fn reveal_fires_once_strictly_past_threshold() {
        let mut surface = ScratchSurface::new();
        // Each sweep clears a 40-row band: 20% of the card.
        assert!(!sweep_row(&mut surface, 20.0));
        assert!(!sweep_row(&mut surface, 60.0));
        assert!(!sweep_row(&mut surface, 100.0));
        assert!((surface.cleared_fraction() - 0.6).abs() < 1e-9);
        assert!(!surface.is_revealed());
        assert!(sweep_row(&mut surface, 140.0));
        assert!(surface.is_revealed());
        assert!(!sweep_row(&mut surface, 180.0));
        assert!(!sweep_row(&mut surface, 20.0));
        assert_eq!(surface.cleared_fraction(), 1.0);
    }

    #[test]
    fn gesture_moves_connect_points() {
        let mut surface = ScratchSurface::new();
        assert!(!surface.move_to(Point::new(50.0, 50.0)));
        assert_eq!(surface.cleared_fraction(), 0.0);
        surface.begin(Point::new(20.0, 100.0));
        surface.move_to(Point::new(280.0, 100.0));
        for x in (0..300).step_by(10) {
            assert!(surface.is_cleared(x, 100), "gap at {}", x);
        }
        surface.end();
        let before = surface.cleared_fraction();
        surface.move_to(Point::new(150.0, 10.0));
        assert_eq!(surface.cleared_fraction(), before);
    }

    #[test]
    fn device_points_are_rescaled() {
        let surface = ScratchSurface::new();
        let rect = DeviceRect {
            left: 10.0,
            top: 20.0,
            width: 600.0,
            height: 400.0,
        };
        let p = rect.to_surface(Point::new(310.0, 220.0), &surface).unwrap();
        assert_eq!(p, Point::new(150.0, 100.0));
        let flat = DeviceRect { height: 0.0, ..rect };
        assert!(flat.to_surface(Point::new(1.0, 1.0), &surface).is_none());
    }

    #[test]
    fn surface_starting_past_threshold_never_reveals() {
        let mut surface = ScratchSurface::with_dimensions(10, 10, 2.0, -0.5);
        assert!(!surface.apply_stroke(None, Point::new(5.0, 5.0)));
        assert!(!surface.apply_stroke(Some(Point::new(0.0, 0.0)), Point::new(9.0, 9.0)));
        assert!(!surface.begin(Point::new(0.0, 9.0)));
        assert!(!surface.move_to(Point::new(9.0, 0.0)));
        assert!(surface.cleared_fraction() > 0.0);
        assert!(!surface.is_revealed());
    }

    #[test]
    fn clear_all_only_after_reveal() {
        let mut surface = ScratchSurface::new();
        surface.clear_all();
        assert_eq!(surface.cleared_fraction(), 0.0);
        for y in [20.0, 60.0, 100.0, 140.0] {
            sweep_row(&mut surface, y);
        }
        surface.clear_all();
        assert_eq!(surface.cleared_fraction(), 1.0);
    }
}
