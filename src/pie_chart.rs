use std::f64::consts::TAU;

use svg::Node;

use crate::aggregator::PieSlice;
use crate::renderer::{polar, Point, Renderer};

const COLORS: [&str; 6] = ["#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#06b6d4"];
const PIE_SIZE: i32 = 280;
const PIE_MARGIN: i32 = 60;
const RADIUS: f64 = 100.0;

pub fn slice_label(slice: &PieSlice, total: u64) -> String {
    let percent = if total == 0 {
        0.0
    } else {
        slice.count as f64 / total as f64 * 100.0
    };
    format!("{} {:.0}%", slice.name, percent)
}

pub fn render_pie_chart(slices: &[PieSlice], title: &str) -> String {
    let renderer = Renderer::new(PIE_SIZE, PIE_SIZE, PIE_MARGIN);
    let center = Point {
        x: PIE_SIZE as f64 / 2.0,
        y: PIE_SIZE as f64 / 2.0,
    };
    let total: u64 = slices.iter().map(|slice| slice.count).sum();
    let mut layers: Vec<Box<dyn Node>> = Vec::new();
    layers.push(Box::new(renderer.label(center.x, -30.0, title, "middle")));

    if total == 0 {
        layers.push(Box::new(renderer.label(center.x, center.y, "No data", "middle")));
        return renderer.render(layers);
    }

    let mut start = 0.0;
    for (index, slice) in slices.iter().enumerate() {
        let sweep = slice.count as f64 / total as f64 * TAU;
        let color = COLORS[index % COLORS.len()];
        layers.push(renderer.wedge(&center, RADIUS, start, start + sweep, color));

        let anchor = polar(&center, RADIUS + 18.0, start + sweep / 2.0);
        let align = if anchor.x >= center.x { "start" } else { "end" };
        layers.push(Box::new(renderer.label(anchor.x, anchor.y, &slice_label(slice, total), align)));
        start += sweep;
    }

    renderer.render(layers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slice(name: &str, count: u64) -> PieSlice {
        PieSlice {
            name: name.to_string(),
            count,
        }
    }

    #[test]
    fn labels_show_rounded_share() {
        assert_eq!(slice_label(&slice("Bug", 2), 3), "Bug 67%");
        assert_eq!(slice_label(&slice("Bug", 0), 0), "Bug 0%");
    }

    #[test]
    fn renders_one_wedge_per_slice() {
        let svg = render_pie_chart(&[slice("Bug", 2), slice("Task", 1)], "Tracker");

        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains("Task 33%"));
        assert!(svg.contains("Tracker"));
    }

    #[test]
    fn single_slice_is_a_full_circle() {
        let svg = render_pie_chart(&[slice("Bug", 4)], "Tracker");
        assert!(svg.contains("<circle"));
        assert!(svg.contains("Bug 100%"));
    }

    #[test]
    fn empty_chart_says_no_data() {
        let svg = render_pie_chart(&[], "Status");
        assert!(svg.contains("No data"));
        assert!(!svg.contains("<path"));
    }
}
