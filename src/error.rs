// ============================================================================
// ERRORES DEL SCANNER
// ============================================================================
// Taxonomía de errores que puede rechazar init():
// - NoContainer: contenedor ausente o no resoluble (antes de pedir permisos)
// - CameraAccess: permiso denegado o sin dispositivo compatible
// - DetectorUnavailable: el motor de decodificación no se pudo construir
// ============================================================================

use wasm_bindgen::JsValue;

/// Errores del ciclo de vida del scanner
#[derive(thiserror::Error, Debug)]
pub enum ScannerError {
    /// El contenedor no existe en el DOM (se verifica antes de pedir la cámara)
    #[error("NO_CONTAINER")]
    NoContainer,

    /// El usuario denegó el acceso a la cámara o no hay dispositivo compatible
    #[error("NOT_ALLOWED")]
    CameraAccess,

    /// El motor de decodificación no está disponible o falló al construirse
    #[error("DETECTOR_UNAVAILABLE: {0}")]
    DetectorUnavailable(String),

    /// Fallo inesperado manipulando el DOM al montar el preview
    #[error("DOM_ERROR: {0}")]
    Dom(String),
}

impl From<ScannerError> for JsValue {
    fn from(error: ScannerError) -> Self {
        JsValue::from_str(&error.to_string())
    }
}
