/// ID del contenedor por defecto donde se monta el preview
/// si el caller no indica uno propio
pub const DEFAULT_CONTAINER_ID: &str = "barcode-scanner";

/// IDs de los elementos montados dentro del contenedor
pub const VIDEO_ELEMENT_ID: &str = "video";
pub const CANVAS_ELEMENT_ID: &str = "canvas";

/// Clase CSS del elemento de video (para que el caller pueda estilarlo)
pub const VIDEO_CLASS: &str = "barcode-video";

/// Estilo del polígono dibujado sobre los símbolos detectados
pub const SYMBOL_STROKE_COLOR: &str = "#00e000";
pub const SYMBOL_STROKE_WIDTH: f64 = 3.0;

/// Encoding pasado al motor de decodificación al construirlo
pub const DETECTOR_ENCODING: &str = "UTF-8";

/// Nombre del constructor global del motor de decodificación
/// (nativo del navegador o polyfill instalado en window)
pub const DETECTOR_GLOBAL: &str = "BarcodeDetector";
