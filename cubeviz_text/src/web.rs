// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canvas `measureText` backend.
//!
//! Only `wasm32` builds talk to the browser. Elsewhere the measurer delegates to
//! [`HeuristicTextMeasurer`] so the same code path works in tests and on servers.

use crate::{HeuristicTextMeasurer, TextMeasurer, TextMetrics, TextStyle};

/// Measures labels with a 2D canvas context in the browser.
#[derive(Clone, Debug, Default)]
pub struct WebTextMeasurer {
    #[cfg(target_arch = "wasm32")]
    ctx: Option<web_sys::CanvasRenderingContext2d>,
}

impl WebTextMeasurer {
    /// Measurer on a detached canvas. Falls back to heuristics when no document is
    /// reachable (workers, non-wasm targets).
    #[must_use]
    pub fn new() -> Self {
        Self {
            #[cfg(target_arch = "wasm32")]
            ctx: detached_context(),
        }
    }

    /// Measurer on the context of a canvas the caller already owns.
    #[cfg(target_arch = "wasm32")]
    #[must_use]
    pub fn with_context(ctx: web_sys::CanvasRenderingContext2d) -> Self {
        Self { ctx: Some(ctx) }
    }
}

#[cfg(target_arch = "wasm32")]
fn detached_context() -> Option<web_sys::CanvasRenderingContext2d> {
    use wasm_bindgen::JsCast as _;

    let canvas = web_sys::window()?
        .document()?
        .create_element("canvas")
        .ok()?
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .ok()?;
    canvas
        .get_context("2d")
        .ok()??
        .dyn_into::<web_sys::CanvasRenderingContext2d>()
        .ok()
}

impl TextMeasurer for WebTextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics {
        #[cfg(target_arch = "wasm32")]
        if let Some(ctx) = &self.ctx {
            ctx.set_font(&style.css_font());
            if let Ok(m) = ctx.measure_text(text) {
                let fallback = TextMetrics::with_default_extent(m.width(), style.size);
                // Zero bounding boxes come from engines without extended metrics.
                let ascent = m.actual_bounding_box_ascent();
                let descent = m.actual_bounding_box_descent();
                return TextMetrics {
                    width: m.width(),
                    ascent: if ascent > 0.0 { ascent } else { fallback.ascent },
                    descent: if descent > 0.0 { descent } else { fallback.descent },
                };
            }
        }
        HeuristicTextMeasurer.measure(text, style)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn off_the_web_it_matches_the_heuristic() {
        let style = TextStyle::new(12.0);
        assert_eq!(
            WebTextMeasurer::new().measure("2'500", &style),
            HeuristicTextMeasurer.measure("2'500", &style),
            "native targets fall back"
        );
    }
}
