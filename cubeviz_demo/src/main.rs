// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Derives a chart state from a JSON fixture and dumps it as SVG plus a short summary.

mod svg;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use cubeviz_charts::{ChartDimensions, ChartInputs, ChartState, ChartStateCache, MapFeature};
use cubeviz_core::{ChartConfig, ChartError, Component, Components, InteractiveFiltersState, Observation};
use cubeviz_text::{CachedTextMeasurer, HeuristicTextMeasurer};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Derive a `CubeViz` chart from a fixture file.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Fixture with components, observations, config and optional filters.
    fixture: PathBuf,

    /// Container width in pixels.
    #[arg(short, long, default_value_t = 640.0)]
    width: f64,

    /// Plot height as a fraction of the plot width.
    #[arg(long)]
    aspect_ratio: Option<f64>,

    /// Use the narrow-screen layout.
    #[arg(long)]
    mobile: bool,

    /// Where to write the SVG (defaults to the fixture path with an `.svg` extension).
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fixture {
    components: Vec<Component>,
    observations: Vec<Observation>,
    config: ChartConfig,
    #[serde(default)]
    filters: InteractiveFiltersState,
    #[serde(default)]
    features: Vec<FeatureFixture>,
    /// Observations whose tooltip is printed.
    #[serde(default)]
    hover: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct FeatureFixture {
    id: String,
    x: f64,
    y: f64,
}

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Chart(#[from] ChartError),
}

fn load(path: &Path) -> Result<Fixture, DemoError> {
    let text = std::fs::read_to_string(path).map_err(|source| DemoError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| DemoError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn run(cli: &Cli) -> Result<(), DemoError> {
    let fixture = load(&cli.fixture)?;
    let components = Components::new(fixture.components);
    let features: Vec<MapFeature> = fixture
        .features
        .iter()
        .map(|f| MapFeature::new(f.id.clone(), (f.x, f.y)))
        .collect();
    let mut dimensions = ChartDimensions::new(cli.width).with_mobile(cli.mobile);
    if let Some(ratio) = cli.aspect_ratio {
        dimensions = dimensions.with_aspect_ratio(ratio);
    }
    let measurer = CachedTextMeasurer::new(HeuristicTextMeasurer);
    let inputs = ChartInputs::new(
        &fixture.observations,
        &components,
        &fixture.filters,
        dimensions,
        &measurer,
    )
    .with_features(&features);

    let mut cache = ChartStateCache::new();
    let state = cache.get(&fixture.config, &inputs)?;
    // A second request with the same inputs must not derive again.
    let again = cache.get(&fixture.config, &inputs)?;
    tracing::info!(
        chart = state.chart_type(),
        derivations = cache.derivations(),
        reused = std::sync::Arc::ptr_eq(&state, &again),
        measured_labels = measurer.len(),
        "derived chart"
    );

    print_summary(&state);
    for o in &fixture.hover {
        match state.tooltip_info(o) {
            Some(info) => {
                println!(
                    "tooltip at ({:.1}, {:.1}): {} = {}",
                    info.x_anchor, info.y_anchor, info.datum.label, info.datum.value
                );
                for v in &info.values {
                    println!("  {} = {}", v.label, v.value);
                }
            }
            None => println!("no tooltip for {o:?}"),
        }
    }

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.fixture.with_extension("svg"));
    std::fs::write(&output, svg::render(&state, &features)).map_err(|source| DemoError::Io {
        path: output.clone(),
        source,
    })?;
    println!("wrote {}", output.display());
    Ok(())
}

fn print_summary(state: &ChartState) {
    let b = state.bounds();
    println!(
        "{}: {:.0}x{:.0}, plot {:.0}x{:.0}, margins l{:.0} t{:.0} r{:.0} b{:.0}",
        state.chart_type(),
        b.width,
        b.height,
        b.chart_width,
        b.chart_height,
        b.margins.x0,
        b.margins.y0,
        b.margins.x1,
        b.margins.y1,
    );
    match state {
        ChartState::Bar(s) | ChartState::Column(s) => {
            println!("bands: {}", s.band_labels.join(", "));
            println!("value axis: {}", s.value_axis.labels.join(" "));
            if let Some(segments) = &s.segments {
                println!("segments: {}", segments.segments.join(", "));
            }
        }
        ChartState::Area(s) => {
            println!("steps: {}, series: {}", s.frame.row_count(), s.series.len());
            println!("y axis: {}", s.y_axis.labels.join(" "));
        }
        ChartState::Line(s) => {
            println!("series: {}", s.series.len());
            println!("y axis: {}", s.y_axis.labels.join(" "));
        }
        ChartState::Scatterplot(s) => println!("points: {}", s.points.len()),
        ChartState::Pie(s) => {
            for arc in &s.arcs {
                println!("  {}: {}", arc.segment, s.formatter.format_with_unit(arc.value));
            }
        }
        ChartState::Map(s) => println!(
            "areas: {}, symbols: {}",
            s.area_layer.as_ref().map_or(0, |l| l.areas.len()),
            s.symbol_layer.as_ref().map_or(0, |l| l.symbols.len()),
        ),
        ChartState::Table(s) => println!("columns: {}, rows: {}", s.columns.len(), s.rows.len()),
        ChartState::ComboLineSingle(s) | ChartState::ComboLineDual(s) => {
            println!("left axis: {}", s.left.axis.title);
            if let Some(right) = &s.right {
                println!("right axis: {}", right.axis.title);
            }
        }
        ChartState::ComboLineColumn(s) => println!("columns: {}", s.columns.len()),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "demo failed");
            ExitCode::FAILURE
        }
    }
}
