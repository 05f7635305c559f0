// ============================================================================
// CAMERA SERVICE - Adquisición del stream de cámara
// ============================================================================
// Sin lógica de negocio: solo habla con mediaDevices. El trait existe para
// poder sustituir la cámara real en tests.
// ============================================================================

use wasm_bindgen::prelude::*;
use web_sys::MediaStreamConstraints;

use crate::dom::window;

/// Fuente del stream de cámara
pub trait CameraProvider {
    /// Solicitar un stream de video con los constraints dados.
    /// La Promise rechaza si el usuario deniega el permiso o no hay
    /// dispositivo compatible.
    fn acquire(&self, constraints: &MediaStreamConstraints) -> Result<js_sys::Promise, JsValue>;
}

/// Implementación real sobre navigator.mediaDevices.getUserMedia
pub struct NavigatorCamera;

impl CameraProvider for NavigatorCamera {
    fn acquire(&self, constraints: &MediaStreamConstraints) -> Result<js_sys::Promise, JsValue> {
        let window = window().ok_or_else(|| JsValue::from_str("No window"))?;
        let devices = window.navigator().media_devices()?;
        devices.get_user_media_with_constraints(constraints)
    }
}

/// Construir los constraints de getUserMedia: audio apagado y video con la
/// cámara trasera por defecto. Los overrides del caller se mezclan encima,
/// por lo que pueden cambiar el facingMode.
pub fn build_constraints(overrides: Option<&js_sys::Object>) -> MediaStreamConstraints {
    let constraints = MediaStreamConstraints::new();
    constraints.set_audio(&JsValue::FALSE);

    let video = js_sys::Object::new();
    let _ = js_sys::Reflect::set(
        &video,
        &JsValue::from_str("facingMode"),
        &JsValue::from_str("environment"),
    );
    if let Some(overrides) = overrides {
        let _ = js_sys::Object::assign(&video, overrides);
    }

    constraints.set_video(&video.into());
    constraints
}
