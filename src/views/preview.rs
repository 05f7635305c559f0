// ============================================================================
// PREVIEW VIEW - Montaje del video en vivo (y canvas de overlay) en el DOM
// ============================================================================

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlVideoElement, MediaStream};

use crate::dom::{append_child, ElementBuilder};
use crate::utils::constants::{CANVAS_ELEMENT_ID, VIDEO_CLASS, VIDEO_ELEMENT_ID};
use crate::views::Overlay;

/// Elementos montados del preview
pub struct Preview {
    pub video: HtmlVideoElement,
    pub overlay: Option<Overlay>,
}

/// Montar el preview dentro del contenedor: primero el canvas de overlay
/// (solo si draw_symbols), después el video alimentado por el stream.
pub fn mount_preview(
    container: &Element,
    stream: &MediaStream,
    draw_symbols: bool,
) -> Result<Preview, JsValue> {
    let overlay = if draw_symbols {
        let canvas = ElementBuilder::new("canvas")?.id(CANVAS_ELEMENT_ID)?.build();
        append_child(container, &canvas)?;
        Some(Overlay::new(canvas.dyn_into()?)?)
    } else {
        None
    };

    let video: HtmlVideoElement = ElementBuilder::new("video")?
        .id(VIDEO_ELEMENT_ID)?
        .class(VIDEO_CLASS)
        .attr("playsinline", "true")?
        .attr("muted", "true")?
        .attr("autoplay", "true")?
        .build()
        .dyn_into()?;

    video.set_src_object(Some(stream));
    append_child(container, &video)?;

    // autoplay debería bastar, pero algunos navegadores exigen play() explícito
    let _ = video.play();

    Ok(Preview { video, overlay })
}
