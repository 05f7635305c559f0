// ============================================================================
// OVERLAY VIEW - Dibujo de los símbolos detectados sobre un canvas
// ============================================================================

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlVideoElement};

use crate::services::DetectedSymbol;
use crate::utils::constants::{SYMBOL_STROKE_COLOR, SYMBOL_STROKE_WIDTH};

/// Canvas montado sobre el video donde se trazan los polígonos de los
/// símbolos. Se limpia y redibuja completo en cada frame.
#[derive(Clone)]
pub struct Overlay {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl Overlay {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("No 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { canvas, ctx })
    }

    /// Limpiar el frame anterior y trazar el polígono de cada símbolo
    /// siguiendo sus corner points. Un frame sin símbolos deja el canvas
    /// limpio, sin trazos residuales.
    pub fn draw(&self, symbols: &[DetectedSymbol], source: &HtmlVideoElement) {
        let width = if source.video_width() > 0 {
            source.video_width()
        } else {
            source.width()
        };
        let height = if source.video_height() > 0 {
            source.video_height()
        } else {
            source.height()
        };

        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.ctx
            .clear_rect(0.0, 0.0, f64::from(width), f64::from(height));

        for symbol in symbols {
            let last = match symbol.corner_points.last() {
                Some(point) => point,
                None => continue,
            };

            self.ctx.begin_path();
            self.ctx.move_to(last.x, last.y);
            for point in &symbol.corner_points {
                self.ctx.line_to(point.x, point.y);
            }
            self.ctx.set_line_width(SYMBOL_STROKE_WIDTH);
            self.ctx.set_stroke_style_str(SYMBOL_STROKE_COLOR);
            self.ctx.stroke();
        }
    }

    /// Limpiar el canvas completo
    pub fn clear(&self) {
        self.ctx.clear_rect(
            0.0,
            0.0,
            f64::from(self.canvas.width()),
            f64::from(self.canvas.height()),
        );
    }

    /// Quitar el canvas del DOM
    pub fn remove(&self) {
        self.canvas.remove();
    }
}
