// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Maps: a colored area layer and a proportional symbol layer.
//!
//! Projection is not done here. Callers pass one [`MapFeature`] per geo value with its
//! anchor already in plot coordinates.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use cubeviz_core::{ChartError, ColorField, Component, MapConfig, Observation};
use cubeviz_transforms::{CategorySorter, SortContext, unique_in_order};
use hashbrown::HashMap;
use kurbo::{Insets, Point};
use peniko::Color;

use crate::accessors::{LabelGetter, NumericGetter, StringGetter};
use crate::chart_data::{ChartInputs, DataViews};
use crate::color::{
    ColorScale, DEFAULT_COLOR, NumericColorScale, UNKNOWN_COLOR, categorical_colors,
    parse_css_color,
};
use crate::format::ValueFormatter;
use crate::layout::{Bounds, ChartDimensions};
use crate::padding::MIN_MARGIN;
use crate::scale::ScaleSqrt;
use crate::tooltip::{self, AnnotationInfo, TooltipInfo, TooltipValue};

/// Largest symbol radius, in pixels.
pub const MAX_SYMBOL_RADIUS: f64 = 24.0;
/// Radius of symbols without a size measure.
pub const DEFAULT_SYMBOL_RADIUS: f64 = 3.0;

/// A projected geographic feature.
#[derive(Clone, Debug, PartialEq)]
pub struct MapFeature {
    /// Geo dimension value this feature stands for.
    pub id: String,
    /// Anchor for symbols and tooltips, in plot coordinates.
    pub centroid: Point,
}

impl MapFeature {
    /// A feature anchored at `centroid`.
    pub fn new(id: impl Into<String>, centroid: impl Into<Point>) -> Self {
        Self {
            id: id.into(),
            centroid: centroid.into(),
        }
    }
}

#[derive(Clone, Debug)]
enum ColorEncoding {
    Fixed,
    Category(StringGetter),
    Measure(NumericGetter, ValueFormatter, String),
}

/// A layer's color scale and how observations feed it.
#[derive(Clone, Debug)]
pub struct LayerColors {
    /// Resolved scale.
    pub scale: ColorScale,
    encoding: ColorEncoding,
}

impl LayerColors {
    fn resolve(color: &ColorField, inputs: &ChartInputs<'_>, views: &DataViews<'_>) -> Result<Self, ChartError> {
        Ok(match color {
            ColorField::Single { color } => Self {
                scale: ColorScale::Fixed(parse_css_color(color).unwrap_or(DEFAULT_COLOR)),
                encoding: ColorEncoding::Fixed,
            },
            ColorField::Segment {
                component_id,
                palette_id,
                color_mapping,
            } => {
                let component = inputs.components.require(component_id)?;
                let getter = StringGetter::new(component.id.clone());
                let mut domain = unique_in_order(views.all.iter().filter_map(|o| getter.get(o)));
                let ctx = SortContext::from_component(component);
                CategorySorter::new(&ctx, None).sort(&mut domain);
                Self {
                    scale: ColorScale::Categorical(categorical_colors(
                        &domain,
                        palette_id.as_deref(),
                        color_mapping,
                        Some(component),
                    )),
                    encoding: ColorEncoding::Category(getter),
                }
            }
            ColorField::Measure {
                component_id,
                palette_id,
                scale_type,
                interpolation_type,
                nb_class,
            } => {
                let component = inputs.measure(component_id, "color")?;
                let getter = NumericGetter::new(component.id.clone());
                let values: Vec<f64> = views
                    .filtered
                    .iter()
                    .map(|o| getter.get(o))
                    .filter(|v| v.is_finite())
                    .collect();
                Self {
                    scale: ColorScale::Numeric(NumericColorScale::new(
                        &values,
                        palette_id.as_deref(),
                        *scale_type,
                        *interpolation_type,
                        *nb_class,
                    )),
                    encoding: ColorEncoding::Measure(
                        getter,
                        ValueFormatter::for_component(component),
                        component.label.clone(),
                    ),
                }
            }
            ColorField::Measures { .. } => {
                return Err(ChartError::InvalidConfig(
                    "map layers cannot be colored by several measures".into(),
                ));
            }
        })
    }

    /// Color of one observation.
    pub fn color(&self, o: &Observation) -> Color {
        match &self.encoding {
            ColorEncoding::Fixed => self.scale.for_key(""),
            ColorEncoding::Category(g) => g.get(o).map_or(UNKNOWN_COLOR, |k| self.scale.for_key(&k)),
            ColorEncoding::Measure(g, ..) => self.scale.for_value(g.get(o)),
        }
    }

    fn tooltip_value(&self, o: &Observation) -> Option<TooltipValue> {
        let ColorEncoding::Measure(g, formatter, label) = &self.encoding else {
            return None;
        };
        Some(TooltipValue {
            label: label.clone(),
            value: formatter.format_with_unit(g.get(o)),
            error: None,
            color: Some(self.color(o)),
        })
    }
}

/// One colored area.
#[derive(Clone, Debug, PartialEq)]
pub struct MapArea {
    /// Geo value.
    pub feature_id: String,
    /// Fill; `None` for features without an observation.
    pub color: Option<Color>,
}

/// Colored areas.
#[derive(Clone, Debug)]
pub struct AreaLayerState {
    /// Geo shapes dimension id.
    pub component_id: String,
    /// Fill colors.
    pub colors: LayerColors,
    /// One entry per supplied feature.
    pub areas: Vec<MapArea>,
}

/// One proportional symbol.
#[derive(Clone, Debug, PartialEq)]
pub struct MapSymbol {
    /// Geo value.
    pub feature_id: String,
    /// Symbol center.
    pub center: Point,
    /// Radius in pixels.
    pub radius: f64,
    /// Fill.
    pub color: Color,
    /// Size measure, `NaN` without one.
    pub value: f64,
}

/// Proportional symbols.
#[derive(Clone, Debug)]
pub struct SymbolLayerState {
    /// Geo dimension id.
    pub component_id: String,
    /// Radius scale, absent without a size measure.
    pub radius_scale: Option<ScaleSqrt>,
    /// Symbol colors.
    pub colors: LayerColors,
    /// Symbols sorted largest first so small ones stay on top.
    pub symbols: Vec<MapSymbol>,
    size: Option<(NumericGetter, ValueFormatter, String)>,
}

/// Resolved state of a map.
#[derive(Clone, Debug)]
pub struct MapState {
    /// Arranged geometry.
    pub bounds: Bounds,
    /// Area layer.
    pub area_layer: Option<AreaLayerState>,
    /// Symbol layer.
    pub symbol_layer: Option<SymbolLayerState>,
    dimensions: ChartDimensions,
    features: HashMap<String, Point>,
    geo: Option<(StringGetter, LabelGetter)>,
}

fn geo_component<'a>(inputs: &ChartInputs<'a>, id: &str, role: &'static str) -> Result<&'a Component, ChartError> {
    let c = inputs.components.require(id)?;
    if c.kind.is_geo() {
        Ok(c)
    } else {
        Err(ChartError::InvalidComponent {
            id: id.into(),
            role,
            expected: "a geographic dimension",
        })
    }
}

/// First observation per geo value.
fn by_feature<'a>(rows: &[&'a Observation], geo: &StringGetter) -> BTreeMap<String, &'a Observation> {
    let mut out = BTreeMap::new();
    for o in rows {
        if let Some(k) = geo.get(o) {
            out.entry(k).or_insert(*o);
        }
    }
    out
}

/// Derives a map.
#[tracing::instrument(skip_all, fields(features = inputs.features.len()))]
pub fn derive_map_state(config: &MapConfig, inputs: &ChartInputs<'_>) -> Result<MapState, ChartError> {
    let fields = &config.fields;
    if fields.area_layer.is_none() && fields.symbol_layer.is_none() {
        return Err(ChartError::MissingField {
            chart: "map",
            role: "areaLayer",
        });
    }
    let views = DataViews::new(inputs, &config.interactive_filters_config, None, None, false);
    let features: HashMap<String, Point> = inputs
        .features
        .iter()
        .map(|f| (f.id.clone(), f.centroid))
        .collect();
    let mut geo = None;

    let area_layer = match &fields.area_layer {
        Some(layer) => {
            let component = geo_component(inputs, &layer.component_id, "areaLayer")?;
            let getter = StringGetter::new(component.id.clone());
            let colors = LayerColors::resolve(&layer.color, inputs, &views)?;
            let rows = by_feature(&views.chart, &getter);
            let areas = inputs
                .features
                .iter()
                .map(|f| MapArea {
                    feature_id: f.id.clone(),
                    color: rows.get(&f.id).map(|o| colors.color(o)),
                })
                .collect();
            geo = Some((getter, LabelGetter::new(component, false)));
            Some(AreaLayerState {
                component_id: component.id.clone(),
                colors,
                areas,
            })
        }
        None => None,
    };

    let symbol_layer = match &fields.symbol_layer {
        Some(layer) => {
            let component = geo_component(inputs, &layer.component_id, "symbolLayer")?;
            let getter = StringGetter::new(component.id.clone());
            let colors = LayerColors::resolve(&layer.color, inputs, &views)?;
            let size = match &layer.measure_id {
                Some(id) => {
                    let m = inputs.measure(id, "symbolLayer.measure")?;
                    Some((
                        NumericGetter::new(m.id.clone()),
                        ValueFormatter::for_component(m),
                        m.label.clone(),
                    ))
                }
                None => None,
            };
            let radius_scale = size.as_ref().map(|(g, ..)| {
                let max = views
                    .filtered
                    .iter()
                    .map(|o| g.get(o).abs())
                    .filter(|v| v.is_finite())
                    .fold(0.0_f64, f64::max);
                ScaleSqrt::new((0.0, max), (0.0, MAX_SYMBOL_RADIUS))
            });
            let mut symbols: Vec<MapSymbol> = by_feature(&views.chart, &getter)
                .into_iter()
                .filter_map(|(id, o)| {
                    let center = *features.get(&id)?;
                    let value = size.as_ref().map_or(f64::NAN, |(g, ..)| g.get(o));
                    let radius = match &radius_scale {
                        Some(s) if value.is_finite() => s.map(value),
                        Some(_) => 0.0,
                        None => DEFAULT_SYMBOL_RADIUS,
                    };
                    Some(MapSymbol {
                        feature_id: id,
                        center,
                        radius,
                        color: colors.color(o),
                        value,
                    })
                })
                .collect();
            symbols.sort_by(|a, b| b.radius.total_cmp(&a.radius));
            if geo.is_none() {
                geo = Some((getter, LabelGetter::new(component, false)));
            }
            Some(SymbolLayerState {
                component_id: component.id.clone(),
                radius_scale,
                colors,
                symbols,
                size,
            })
        }
        None => None,
    };

    let dims = inputs.dimensions;
    let bounds = Bounds::arrange(&dims, Insets::uniform(MIN_MARGIN));
    tracing::debug!(
        areas = area_layer.as_ref().map_or(0, |l| l.areas.len()),
        symbols = symbol_layer.as_ref().map_or(0, |l| l.symbols.len()),
        "derived map"
    );

    Ok(MapState {
        bounds,
        area_layer,
        symbol_layer,
        dimensions: dims,
        features,
        geo,
    })
}

impl MapState {
    fn anchor(&self, o: &Observation) -> Option<(String, Point)> {
        let (geo, _) = self.geo.as_ref()?;
        let id = geo.get(o)?;
        let p = *self.features.get(&id)?;
        Some((id, p))
    }

    /// Tooltip for the hovered feature: its area color value and symbol size.
    pub fn tooltip_info(&self, o: &Observation) -> Option<TooltipInfo> {
        let (id, anchor) = self.anchor(o)?;
        let label = self.geo.as_ref().map_or(id.as_str(), |(_, l)| l.label(&id));
        let mut values = Vec::new();
        if let Some(v) = self.area_layer.as_ref().and_then(|l| l.colors.tooltip_value(o)) {
            values.push(v);
        }
        if let Some(layer) = &self.symbol_layer {
            if let Some((g, formatter, title)) = &layer.size {
                values.push(TooltipValue {
                    label: title.clone(),
                    value: formatter.format_with_unit(g.get(o)),
                    error: None,
                    color: Some(layer.colors.color(o)),
                });
            } else if let Some(v) = layer.colors.tooltip_value(o) {
                values.push(v);
            }
        }
        let datum = TooltipValue {
            label: label.into(),
            value: values.first().map(|v| v.value.clone()).unwrap_or_default(),
            error: None,
            color: values.first().and_then(|v| v.color),
        };
        Some(TooltipInfo {
            x_anchor: anchor.x,
            y_anchor: anchor.y,
            placement: tooltip::placement(&self.dimensions, self.bounds.chart_width, anchor.x, false),
            datum,
            values,
        })
    }

    /// Highlight at the hovered feature.
    pub fn annotation_info(&self, o: &Observation) -> Option<AnnotationInfo> {
        let (_, anchor) = self.anchor(o)?;
        let color = match (&self.area_layer, &self.symbol_layer) {
            (Some(l), _) => l.colors.color(o),
            (None, Some(l)) => l.colors.color(o),
            (None, None) => UNKNOWN_COLOR,
        };
        Some(AnnotationInfo {
            x: anchor.x,
            y: anchor.y,
            color,
        })
    }
}
