use svg::node::element::{path::Data, Circle, Line, Path, Rectangle, Text};
use svg::Node;

pub struct Point {
    pub x: f64,
    pub y: f64,
}

pub struct Renderer {
    pub width: i32,
    pub height: i32,
    margin: i32,
}

impl Renderer {
    pub fn new(width: i32, height: i32, margin: i32) -> Self {
        Self {
            width,
            height,
            margin,
        }
    }

    pub fn render(&self, layers: Vec<Box<dyn Node>>) -> String {
        let mut document = svg::Document::new()
            .set(
                "viewBox",
                (-self.margin, -self.margin, self.width + 2 * self.margin, self.height + 2 * self.margin),
            )
            .set("width", self.width + 2 * self.margin)
            .set("height", self.height + 2 * self.margin)
            .set("font-family", "sans-serif");

        for layer in layers {
            document = document.add(layer);
        }

        document.to_string()
    }

    pub fn line(&self, points: &[Point], color: &str) -> Path {
        let mut path_data = Data::new();
        if let Some(first) = points.first() {
            path_data = path_data.move_to((first.x, first.y));
            for point in &points[1..] {
                path_data = path_data.line_to((point.x, point.y));
            }
        }
        Path::new()
            .set("d", path_data)
            .set("stroke", color)
            .set("stroke-width", "2")
            .set("fill", "none")
    }

    /// Bar from `top` down to the baseline.
    pub fn bar(&self, x: f64, top: f64, width: f64, color: &str) -> Rectangle {
        Rectangle::new()
            .set("x", x)
            .set("y", top)
            .set("width", width)
            .set("height", (self.height as f64 - top).max(0.0))
            .set("fill", color)
    }

    pub fn grid_line(&self, y: f64) -> Line {
        Line::new()
            .set("x1", 0)
            .set("y1", y)
            .set("x2", self.width)
            .set("y2", y)
            .set("stroke", "#e5e7eb")
            .set("stroke-dasharray", "3 3")
    }

    pub fn label(&self, x: f64, y: f64, content: &str, anchor: &str) -> Text {
        Text::new(content)
            .set("x", x)
            .set("y", y)
            .set("font-size", 11)
            .set("text-anchor", anchor)
    }

    /// Wedge between two angles in radians, measured clockwise from 12 o'clock.
    pub fn wedge(&self, center: &Point, radius: f64, start: f64, end: f64, color: &str) -> Box<dyn Node> {
        if end - start >= std::f64::consts::TAU - f64::EPSILON {
            return Box::new(
                Circle::new()
                    .set("cx", center.x)
                    .set("cy", center.y)
                    .set("r", radius)
                    .set("fill", color),
            );
        }
        let from = polar(center, radius, start);
        let to = polar(center, radius, end);
        let large_arc = if end - start > std::f64::consts::PI { 1.0 } else { 0.0 };
        let path_data = Data::new()
            .move_to((center.x, center.y))
            .line_to((from.x, from.y))
            .elliptical_arc_to(vec![
                radius as f32,
                radius as f32,
                0.0,
                large_arc,
                1.0,
                to.x as f32,
                to.y as f32,
            ])
            .close();
        Box::new(
            Path::new()
                .set("d", path_data)
                .set("fill", color)
                .set("stroke", "#ffffff"),
        )
    }
}

pub fn polar(center: &Point, radius: f64, angle: f64) -> Point {
    Point {
        x: center.x + radius * angle.sin(),
        y: center.y - radius * angle.cos(),
    }
}
