// ============================================================================
// DETECTOR FFI - Bindings al motor de decodificación del navegador
// ============================================================================
// Tipados extern sobre la instancia de BarcodeDetector (nativo o polyfill).
// La construcción se hace vía Reflect sobre window (ver services::engine),
// porque el polyfill puede instalarse en window después de cargar el módulo.
// ============================================================================

use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    /// Instancia del motor de decodificación
    pub type BarcodeDetector;

    /// Detectar símbolos en un frame del source (video o imagen).
    /// Devuelve Promise<Array<DetectedBarcode>>
    #[wasm_bindgen(method)]
    pub fn detect(this: &BarcodeDetector, source: &JsValue) -> js_sys::Promise;

    /// Símbolo detectado devuelto por el motor
    pub type DetectedBarcode;

    #[wasm_bindgen(method, getter, js_name = rawValue)]
    pub fn raw_value(this: &DetectedBarcode) -> String;

    /// Array de puntos {x, y} que delimitan el símbolo en el frame
    #[wasm_bindgen(method, getter, js_name = cornerPoints)]
    pub fn corner_points(this: &DetectedBarcode) -> js_sys::Array;
}
