// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal SVG dump of a derived chart state.

use std::fmt::Write as _;

use cubeviz_charts::{Bounds, ChartState, MapFeature, to_hex};
use kurbo::{BezPath, Point, Rect, Shape};
use peniko::Color;

const AXIS_COLOR: &str = "#999999";
const FONT_SIZE: f64 = 12.0;

#[derive(Debug, Default)]
struct SvgWriter {
    out: String,
}

impl SvgWriter {
    fn rect(&mut self, r: Rect, fill: Color) {
        let _ = writeln!(
            self.out,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"/>"#,
            r.x0,
            r.y0,
            r.width(),
            r.height(),
            to_hex(fill)
        );
    }

    fn fill_path(&mut self, path: &BezPath, fill: Color) {
        let _ = writeln!(self.out, r#"<path d="{}" fill="{}"/>"#, path.to_svg(), to_hex(fill));
    }

    fn stroke_path(&mut self, path: &BezPath, stroke: Color) {
        let _ = writeln!(
            self.out,
            r#"<path d="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
            path.to_svg(),
            to_hex(stroke)
        );
    }

    fn circle(&mut self, center: Point, radius: f64, fill: Color) {
        let _ = writeln!(
            self.out,
            r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{}" fill-opacity="0.8"/>"#,
            center.x,
            center.y,
            radius,
            to_hex(fill)
        );
    }

    fn text(&mut self, pos: Point, anchor: &str, text: &str) {
        let _ = writeln!(
            self.out,
            r#"<text x="{:.2}" y="{:.2}" font-size="{FONT_SIZE}" text-anchor="{anchor}">{}</text>"#,
            pos.x,
            pos.y,
            escape_xml(text)
        );
    }

    /// Left value axis with its tick labels.
    fn value_axis(&mut self, bounds: &Bounds, ticks: &[(f64, String)]) {
        let _ = writeln!(
            self.out,
            r#"<line x1="0" y1="0" x2="0" y2="{:.2}" stroke="{AXIS_COLOR}"/>"#,
            bounds.chart_height
        );
        for (y, label) in ticks {
            self.text(Point::new(-6.0, *y + FONT_SIZE / 3.0), "end", label);
        }
    }
}

fn draw(w: &mut SvgWriter, state: &ChartState, features: &[MapFeature]) {
    match state {
        ChartState::Bar(s) | ChartState::Column(s) => {
            for m in s.marks() {
                w.rect(m.rect, m.color);
            }
            let ticks: Vec<(f64, String)> = s
                .value_axis
                .ticks
                .iter()
                .zip(&s.value_axis.labels)
                .map(|(t, l)| (s.value_scale.map(*t), l.clone()))
                .collect();
            if s.orientation == cubeviz_charts::Orientation::Vertical {
                w.value_axis(&s.bounds, &ticks);
            }
        }
        ChartState::Area(s) => {
            for (_, path, color) in s.areas() {
                w.fill_path(&path, color);
            }
            let ticks: Vec<(f64, String)> = s
                .y_axis
                .ticks
                .iter()
                .zip(&s.y_axis.labels)
                .map(|(t, l)| (s.y_scale.map(*t), l.clone()))
                .collect();
            w.value_axis(&s.bounds, &ticks);
        }
        ChartState::Line(s) => {
            for (_, path, color) in s.paths() {
                w.stroke_path(&path, color);
            }
        }
        ChartState::Scatterplot(s) => {
            for (p, color) in s.dots() {
                w.circle(p, cubeviz_charts::DOT_RADIUS, color);
            }
        }
        ChartState::Pie(s) => {
            for arc in &s.arcs {
                let path = s.wedge(arc).to_path(0.1);
                w.fill_path(&path, s.colors.for_key(&arc.segment));
            }
        }
        ChartState::Map(s) => {
            if let Some(layer) = &s.area_layer {
                for area in &layer.areas {
                    let (Some(color), Some(f)) =
                        (area.color, features.iter().find(|f| f.id == area.feature_id))
                    else {
                        continue;
                    };
                    w.rect(Rect::from_center_size(f.centroid, (12.0, 12.0)), color);
                }
            }
            if let Some(layer) = &s.symbol_layer {
                for sym in &layer.symbols {
                    w.circle(sym.center, sym.radius, sym.color);
                }
            }
        }
        ChartState::Table(s) => {
            let row_height = cubeviz_charts::ROW_HEIGHT;
            let col_width = s.bounds.chart_width / s.columns.len().max(1) as f64;
            for (i, c) in s.columns.iter().enumerate() {
                w.text(Point::new(i as f64 * col_width, row_height * 0.6), "start", &c.label);
            }
            for (r, row) in s.rows.iter().enumerate() {
                let y = (r + 1) as f64 * row_height;
                for (i, cell) in row.cells.iter().enumerate() {
                    let x = i as f64 * col_width;
                    if let (Some((a, b)), Some(color)) = (cell.bar, cell.color) {
                        w.rect(Rect::new(x + a * col_width, y + 4.0, x + b * col_width, y + 10.0), color);
                    } else if let Some(color) = cell.color {
                        w.rect(Rect::new(x, y, x + col_width, y + row_height), color);
                    }
                    w.text(Point::new(x, y + row_height * 0.6), "start", &cell.text);
                }
            }
        }
        ChartState::ComboLineSingle(s) | ChartState::ComboLineDual(s) => {
            for (_, path, color) in s.paths() {
                w.stroke_path(&path, color);
            }
        }
        ChartState::ComboLineColumn(s) => {
            for (_, rect, color) in s.column_rects() {
                w.rect(rect, color);
            }
            let line_color = s
                .line_axis
                .measures
                .first()
                .map_or(Color::BLACK, |m| s.colors.for_key(&m.id));
            w.stroke_path(&s.line_path(), line_color);
        }
    }
}

/// Renders `state` as a standalone SVG document. Map areas are drawn as squares at
/// their feature centroids.
pub(crate) fn render(state: &ChartState, features: &[MapFeature]) -> String {
    let bounds = state.bounds();
    let mut writer = SvgWriter::default();
    draw(&mut writer, state, features);
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            "\n",
            r#"<g transform="translate({x} {y})" font-family="sans-serif">"#,
            "\n{body}</g>\n</svg>\n"
        ),
        w = bounds.width,
        h = bounds.height,
        x = bounds.margins.x0,
        y = bounds.margins.y0,
        body = writer.out,
    )
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
