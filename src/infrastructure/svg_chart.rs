// SVG chart renderer - turns chart models into inline markup
use crate::domain::dashboard::{format_value, NO_DATA};
use crate::domain::telemetry::{ChartData, TimeSeriesPoint};
use chrono::TimeDelta;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 420.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 70.0;
const TICKS: usize = 5;
const LINE_COLOR: &str = "#1f77b4";
const TICK_FORMAT: &str = "%m-%d %H:%M";
const POINT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Maps data coordinates into the plot area
struct Scale {
    min_ms: i64,
    max_ms: i64,
    min_value: f64,
    max_value: f64,
}

impl Scale {
    fn fit(points: &[TimeSeriesPoint]) -> Self {
        let min_ms = points.iter().map(TimeSeriesPoint::time_ms).min().unwrap_or(0);
        let max_ms = points.iter().map(TimeSeriesPoint::time_ms).max().unwrap_or(0);

        let (low, high) = points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), p| {
                (low.min(p.value), high.max(p.value))
            });
        let (min_value, max_value) = if !low.is_finite() {
            (0.0, 1.0)
        } else if high - low < f64::EPSILON {
            (low - 1.0, high + 1.0)
        } else {
            let pad = (high - low) * 0.05;
            (low - pad, high + pad)
        };

        Self {
            min_ms,
            max_ms,
            min_value,
            max_value,
        }
    }

    fn plot_width() -> f64 {
        WIDTH - MARGIN_LEFT - MARGIN_RIGHT
    }

    fn plot_height() -> f64 {
        HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
    }

    fn x(&self, time_ms: i64) -> f64 {
        if self.max_ms == self.min_ms {
            return MARGIN_LEFT + Self::plot_width() / 2.0;
        }
        let ratio = (time_ms - self.min_ms) as f64 / (self.max_ms - self.min_ms) as f64;
        MARGIN_LEFT + ratio * Self::plot_width()
    }

    fn y(&self, value: f64) -> f64 {
        let ratio = (value - self.min_value) / (self.max_value - self.min_value);
        MARGIN_TOP + (1.0 - ratio) * Self::plot_height()
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render `chart` as a standalone `<svg>` element
pub fn render_svg(chart: &ChartData) -> String {
    let scale = Scale::fit(&chart.points);
    let bottom = HEIGHT - MARGIN_BOTTOM;
    let right = WIDTH - MARGIN_RIGHT;
    let mut svg = String::new();

    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="chart" viewBox="0 0 {WIDTH} {HEIGHT}" role="img" aria-label="{title}">"#,
        title = escape(&chart.title)
    ));
    svg.push_str(&format!(
        r#"<text class="chart-title" x="{}" y="28" text-anchor="middle" font-size="20">{}</text>"#,
        WIDTH / 2.0,
        escape(&chart.title)
    ));

    // Axes
    svg.push_str(&format!(
        r##"<g class="axes" stroke="#444" stroke-width="1"><line x1="{MARGIN_LEFT}" y1="{bottom}" x2="{right}" y2="{bottom}"/><line x1="{MARGIN_LEFT}" y1="{MARGIN_TOP}" x2="{MARGIN_LEFT}" y2="{bottom}"/></g>"##
    ));

    // Y ticks and grid
    svg.push_str(r##"<g class="y-ticks" font-size="12" fill="#444">"##);
    for i in 0..TICKS {
        let value = scale.min_value + (scale.max_value - scale.min_value) * i as f64 / (TICKS - 1) as f64;
        let y = scale.y(value);
        svg.push_str(&format!(
            r##"<line x1="{MARGIN_LEFT}" y1="{y:.1}" x2="{right}" y2="{y:.1}" stroke="#e5e5e5"/><text x="{}" y="{:.1}" text-anchor="end">{value:.1}</text>"##,
            MARGIN_LEFT - 8.0,
            y + 4.0
        ));
    }
    svg.push_str("</g>");

    // X ticks
    if let Some(first) = chart.points.first() {
        svg.push_str(r##"<g class="x-ticks" font-size="12" fill="#444">"##);
        let span = scale.max_ms - scale.min_ms;
        let ticks = if span == 0 { 1 } else { TICKS };
        for i in 0..ticks {
            let offset_ms = if ticks == 1 { 0 } else { span * i as i64 / (ticks - 1) as i64 };
            let time = first.time + TimeDelta::milliseconds(scale.min_ms + offset_ms - first.time_ms());
            svg.push_str(&format!(
                r#"<text x="{:.1}" y="{}" text-anchor="middle">{}</text>"#,
                scale.x(scale.min_ms + offset_ms),
                bottom + 20.0,
                time.format(TICK_FORMAT)
            ));
        }
        svg.push_str("</g>");
    }

    // Axis labels
    svg.push_str(&format!(
        r#"<text class="x-label" x="{}" y="{}" text-anchor="middle" font-size="14">{}</text>"#,
        MARGIN_LEFT + Scale::plot_width() / 2.0,
        HEIGHT - 20.0,
        escape(&chart.x_label)
    ));
    let label_y = MARGIN_TOP + Scale::plot_height() / 2.0;
    svg.push_str(&format!(
        r#"<text class="y-label" x="20" y="{label_y}" text-anchor="middle" font-size="14" transform="rotate(-90 20 {label_y})">{}</text>"#,
        escape(&chart.y_label)
    ));

    if chart.points.is_empty() {
        svg.push_str(&format!(
            r##"<text class="empty" x="{}" y="{label_y}" text-anchor="middle" font-size="16" fill="#888">{NO_DATA}</text>"##,
            MARGIN_LEFT + Scale::plot_width() / 2.0
        ));
    } else {
        let coordinates: Vec<(f64, f64)> = chart
            .points
            .iter()
            .map(|p| (scale.x(p.time_ms()), scale.y(p.value)))
            .collect();
        let line: Vec<String> = coordinates
            .iter()
            .map(|(x, y)| format!("{x:.1},{y:.1}"))
            .collect();
        svg.push_str(&format!(
            r#"<polyline class="series" fill="none" stroke="{LINE_COLOR}" stroke-width="2" points="{}"/>"#,
            line.join(" ")
        ));

        svg.push_str(&format!(r#"<g class="markers" fill="{LINE_COLOR}">"#));
        for (point, (x, y)) in chart.points.iter().zip(&coordinates) {
            svg.push_str(&format!(
                r#"<circle cx="{x:.1}" cy="{y:.1}" r="3.5"><title>{}: {}</title></circle>"#,
                point.time.format(POINT_FORMAT),
                format_value(point.value)
            ));
        }
        svg.push_str("</g>");
    }

    svg.push_str("</svg>");
    svg
}
