use crate::aggregator::DataPoint;
use crate::renderer::{Point, Renderer};
use crate::settings::{Axis, ChartSettings, ChartType, DateFormat, SeriesDefinition};
use svg::Node;

pub const COMBO_WIDTH: i32 = 720;
const COMBO_MARGIN: i32 = 40;
const MAX_X_LABELS: usize = 10;

/// Value range of one y axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisScale {
    pub min: f64,
    pub max: f64,
}

impl AxisScale {
    pub fn fit(values: impl Iterator<Item = u64>, min: Option<f64>, max: Option<f64>) -> Self {
        let min = min.unwrap_or(0.0);
        let data_max = values.map(|v| v as f64).fold(min, f64::max);
        let max = max.unwrap_or(data_max);
        Self {
            min,
            max: if max > min { max } else { min + 1.0 },
        }
    }
}

pub fn format_date_label(point: &DataPoint, format: DateFormat) -> String {
    match format {
        DateFormat::Iso => point.date.format("%Y-%m-%d").to_string(),
        DateFormat::MonthDay => point.date.format("%-m/%-d").to_string(),
    }
}

pub struct ComboChart {
    renderer: Renderer,
}

impl ComboChart {
    pub fn new(width: i32, height: i32, margin: i32) -> Self {
        Self {
            renderer: Renderer::new(width, height, margin),
        }
    }

    fn slot_width(&self, buckets: usize) -> f64 {
        self.renderer.width as f64 / buckets.max(1) as f64
    }

    fn normalize_value(&self, value: u64, scale: AxisScale) -> f64 {
        let height = self.renderer.height as f64;
        let ratio = (value as f64 - scale.min) / (scale.max - scale.min);
        (height - ratio * height).clamp(0.0, height)
    }

    fn scale_for(&self, points: &[DataPoint], series: &[&SeriesDefinition], axis: Axis, settings: &ChartSettings) -> AxisScale {
        let values = points.iter().flat_map(move |point| {
            series
                .iter()
                .filter(move |s| s.axis == axis)
                .map(move |s| point.value(&s.id))
        });
        match axis {
            Axis::Left => AxisScale::fit(values, settings.y_axis_left_min, None),
            Axis::Right => AxisScale::fit(values, None, settings.y_axis_right_max),
        }
    }

    pub fn render(&self, points: &[DataPoint], settings: &ChartSettings) -> String {
        let visible: Vec<&SeriesDefinition> = settings.series.iter().filter(|s| s.visible).collect();
        let left = self.scale_for(points, &visible, Axis::Left, settings);
        let right = self.scale_for(points, &visible, Axis::Right, settings);
        let scale_of = |s: &SeriesDefinition| match s.axis {
            Axis::Left => left,
            Axis::Right => right,
        };

        let slot = self.slot_width(points.len());
        let width = self.renderer.width as f64;
        let height = self.renderer.height as f64;
        let mut layers: Vec<Box<dyn Node>> = Vec::new();

        for y in [0.0, height / 2.0, height] {
            layers.push(Box::new(self.renderer.grid_line(y)));
        }
        layers.push(Box::new(self.renderer.label(-6.0, 4.0, &format_axis_value(left.max), "end")));
        layers.push(Box::new(self.renderer.label(-6.0, height, &format_axis_value(left.min), "end")));
        layers.push(Box::new(self.renderer.label(width + 6.0, 4.0, &format_axis_value(right.max), "start")));
        layers.push(Box::new(self.renderer.label(width + 6.0, height, &format_axis_value(right.min), "start")));

        let bars: Vec<&SeriesDefinition> = visible.iter().copied().filter(|s| s.chart_type == ChartType::Bar).collect();
        let bar_width = slot * 0.8 / bars.len().max(1) as f64;
        for (position, s) in bars.iter().copied().enumerate() {
            for (index, point) in points.iter().enumerate() {
                let x = index as f64 * slot + slot * 0.1 + position as f64 * bar_width;
                let top = self.normalize_value(point.value(&s.id), scale_of(s));
                layers.push(Box::new(self.renderer.bar(x, top, bar_width, &s.color)));
            }
        }

        for s in visible.iter().copied().filter(|s| s.chart_type == ChartType::Line) {
            let line: Vec<Point> = points
                .iter()
                .enumerate()
                .map(|(index, point)| Point {
                    x: (index as f64 + 0.5) * slot,
                    y: self.normalize_value(point.value(&s.id), scale_of(s)),
                })
                .collect();
            if !line.is_empty() {
                layers.push(Box::new(self.renderer.line(&line, &s.color)));
            }
        }

        let step = points.len().div_ceil(MAX_X_LABELS).max(1);
        for (index, point) in points.iter().enumerate().step_by(step) {
            let x = (index as f64 + 0.5) * slot;
            let text = format_date_label(point, settings.date_format);
            layers.push(Box::new(self.renderer.label(x, height + 16.0, &text, "middle")));
        }

        let legend_gap = width / visible.len().max(1) as f64;
        for (position, s) in visible.iter().enumerate() {
            let x = position as f64 * legend_gap;
            layers.push(Box::new(
                self.renderer.bar(x, -22.0, 10.0, &s.color).set("height", 10),
            ));
            layers.push(Box::new(self.renderer.label(x + 14.0, -13.0, &s.label, "start")));
        }

        self.renderer.render(layers)
    }
}

fn format_axis_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

pub fn render_combo_chart(points: &[DataPoint], settings: &ChartSettings) -> String {
    let height = i32::try_from(settings.chart_height()).unwrap_or(i32::MAX);
    ComboChart::new(COMBO_WIDTH, height, COMBO_MARGIN).render(points, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn point(day: u32, values: &[(&str, u64)]) -> DataPoint {
        DataPoint {
            date: NaiveDate::from_ymd_opt(2026, 2, day).unwrap(),
            values: values.iter().map(|(id, v)| (id.to_string(), *v)).collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn axis_scale_honours_configured_bounds() {
        assert_eq!(AxisScale::fit([3, 7].into_iter(), None, None), AxisScale { min: 0.0, max: 7.0 });
        assert_eq!(AxisScale::fit([3, 7].into_iter(), Some(2.0), None), AxisScale { min: 2.0, max: 7.0 });
        assert_eq!(AxisScale::fit([3, 7].into_iter(), None, Some(20.0)), AxisScale { min: 0.0, max: 20.0 });
        assert_eq!(AxisScale::fit(std::iter::empty(), None, None), AxisScale { min: 0.0, max: 1.0 });
    }

    #[test]
    fn date_labels_follow_format() {
        let p = point(5, &[]);
        assert_eq!(format_date_label(&p, DateFormat::Iso), "2026-02-05");
        assert_eq!(format_date_label(&p, DateFormat::MonthDay), "2/5");
    }

    #[test]
    fn renders_bars_lines_and_legend_for_visible_series() {
        let mut settings = ChartSettings::default();
        let points = vec![
            point(9, &[("series-0", 2), ("series-1", 1)]),
            point(10, &[("series-0", 0), ("series-1", 3)]),
        ];

        let svg = render_combo_chart(&points, &settings);

        assert_eq!(svg.matches("<path").count(), 1);
        assert!(svg.contains("Created"));
        assert!(svg.contains("Closed (cumulative)"));
        assert!(svg.contains("2026-02-10"));

        settings.series[1].visible = false;
        let svg = render_combo_chart(&points, &settings);
        assert_eq!(svg.matches("<path").count(), 0);
        assert!(!svg.contains("Closed (cumulative)"));
    }

    #[test]
    fn renders_empty_window_without_panicking() {
        let svg = render_combo_chart(&[], &ChartSettings::default());
        assert!(svg.contains("<svg"));
    }
}
