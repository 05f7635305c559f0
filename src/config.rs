// ============================================================================
// CONFIGURACIÓN DEL SCANNER
// ============================================================================

use serde::{Deserialize, Serialize};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Element;

use crate::utils::constants::DEFAULT_CONTAINER_ID;

/// Simbologías soportadas por el motor de decodificación
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarcodeFormat {
    #[serde(rename = "aztec")]
    Aztec,
    #[serde(rename = "codabar")]
    Codabar,
    #[serde(rename = "code_39")]
    Code39,
    #[serde(rename = "code_93")]
    Code93,
    #[serde(rename = "code_128")]
    Code128,
    #[serde(rename = "data_matrix")]
    DataMatrix,
    #[serde(rename = "ean_8")]
    Ean8,
    #[serde(rename = "ean_13")]
    Ean13,
    #[serde(rename = "itf")]
    Itf,
    #[serde(rename = "pdf417")]
    Pdf417,
    #[serde(rename = "qr_code")]
    QrCode,
    #[serde(rename = "upc_a")]
    UpcA,
    #[serde(rename = "upc_e")]
    UpcE,
}

impl BarcodeFormat {
    /// Identificador tal como lo espera el motor de decodificación
    pub fn as_wire(&self) -> &'static str {
        match self {
            BarcodeFormat::Aztec => "aztec",
            BarcodeFormat::Codabar => "codabar",
            BarcodeFormat::Code39 => "code_39",
            BarcodeFormat::Code93 => "code_93",
            BarcodeFormat::Code128 => "code_128",
            BarcodeFormat::DataMatrix => "data_matrix",
            BarcodeFormat::Ean8 => "ean_8",
            BarcodeFormat::Ean13 => "ean_13",
            BarcodeFormat::Itf => "itf",
            BarcodeFormat::Pdf417 => "pdf417",
            BarcodeFormat::QrCode => "qr_code",
            BarcodeFormat::UpcA => "upc_a",
            BarcodeFormat::UpcE => "upc_e",
        }
    }

    /// Parsear un identificador recibido por el boundary JS
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "aztec" => Some(BarcodeFormat::Aztec),
            "codabar" => Some(BarcodeFormat::Codabar),
            "code_39" => Some(BarcodeFormat::Code39),
            "code_93" => Some(BarcodeFormat::Code93),
            "code_128" => Some(BarcodeFormat::Code128),
            "data_matrix" => Some(BarcodeFormat::DataMatrix),
            "ean_8" => Some(BarcodeFormat::Ean8),
            "ean_13" => Some(BarcodeFormat::Ean13),
            "itf" => Some(BarcodeFormat::Itf),
            "pdf417" => Some(BarcodeFormat::Pdf417),
            "qr_code" => Some(BarcodeFormat::QrCode),
            "upc_a" => Some(BarcodeFormat::UpcA),
            "upc_e" => Some(BarcodeFormat::UpcE),
            _ => None,
        }
    }

    /// Formatos usados cuando el caller no indica ninguno
    pub fn default_set() -> Vec<BarcodeFormat> {
        vec![BarcodeFormat::Ean13, BarcodeFormat::Ean8, BarcodeFormat::Code128]
    }
}

/// Dónde montar el preview: un elemento ya resuelto o un ID a buscar en el DOM
#[derive(Clone)]
pub enum ContainerTarget {
    Id(String),
    Element(Element),
}

impl Default for ContainerTarget {
    fn default() -> Self {
        ContainerTarget::Id(DEFAULT_CONTAINER_ID.to_string())
    }
}

/// Configuración de una sesión de escaneo
#[derive(Clone)]
pub struct ScannerConfig {
    /// Contenedor donde montar el video (y el canvas si draw_symbols)
    pub container: ContainerTarget,
    /// Simbologías a intentar; vacío = todas las que soporte el motor
    pub formats: Vec<BarcodeFormat>,
    /// Overrides de constraints del track de video (se mezclan sobre facingMode)
    pub settings: Option<js_sys::Object>,
    /// Dibujar el polígono de cada símbolo detectado sobre un canvas
    pub draw_symbols: bool,
    /// Callback invocado con los valores decodificados de cada detección
    /// no vacía y no pausada. Detecciones consecutivas del mismo código
    /// NO se deduplican: eso es responsabilidad del caller.
    pub on_success: Rc<dyn Fn(Vec<String>)>,
}

impl ScannerConfig {
    /// Configuración por defecto con el callback del caller
    pub fn new<F>(on_success: F) -> Self
    where
        F: Fn(Vec<String>) + 'static,
    {
        Self {
            container: ContainerTarget::default(),
            formats: BarcodeFormat::default_set(),
            settings: None,
            draw_symbols: false,
            on_success: Rc::new(on_success),
        }
    }

    /// Parsear el payload recibido desde JavaScript:
    /// { container?, formats?, settings?, drawSymbols?, onSuccess }
    pub fn from_js(payload: &JsValue) -> Result<Self, JsValue> {
        let on_success_js = js_sys::Reflect::get(payload, &JsValue::from_str("onSuccess"))?;
        let callback: js_sys::Function = on_success_js
            .dyn_into()
            .map_err(|_| JsValue::from_str("onSuccess es requerido y debe ser una función"))?;

        let on_success = Rc::new(move |values: Vec<String>| {
            let array = js_sys::Array::new();
            for value in &values {
                array.push(&JsValue::from_str(value));
            }
            if let Err(e) = callback.call1(&JsValue::NULL, &array) {
                log::warn!("⚠️ [SCANNER] Error en callback onSuccess: {:?}", e);
            }
        });

        let container = match js_sys::Reflect::get(payload, &JsValue::from_str("container")) {
            Ok(value) if value.is_undefined() || value.is_null() => ContainerTarget::default(),
            Ok(value) => match value.as_string() {
                Some(id) => ContainerTarget::Id(id),
                None => ContainerTarget::Element(
                    value
                        .dyn_into()
                        .map_err(|_| JsValue::from_str("container debe ser un ID o un Element"))?,
                ),
            },
            Err(_) => ContainerTarget::default(),
        };

        let formats = match js_sys::Reflect::get(payload, &JsValue::from_str("formats")) {
            Ok(value) if value.is_undefined() || value.is_null() => BarcodeFormat::default_set(),
            Ok(value) => {
                let array: js_sys::Array = value
                    .dyn_into()
                    .map_err(|_| JsValue::from_str("formats debe ser un array de strings"))?;
                let mut formats = Vec::with_capacity(array.length() as usize);
                for entry in array.iter() {
                    let id = entry
                        .as_string()
                        .ok_or_else(|| JsValue::from_str("formats debe contener strings"))?;
                    let format = BarcodeFormat::from_wire(&id)
                        .ok_or_else(|| JsValue::from_str(&format!("Formato no soportado: {}", id)))?;
                    formats.push(format);
                }
                formats
            }
            Err(_) => BarcodeFormat::default_set(),
        };

        let settings = js_sys::Reflect::get(payload, &JsValue::from_str("settings"))
            .ok()
            .and_then(|value| value.dyn_into::<js_sys::Object>().ok());

        let draw_symbols = js_sys::Reflect::get(payload, &JsValue::from_str("drawSymbols"))
            .ok()
            .and_then(|value| value.as_bool())
            .unwrap_or(false);

        Ok(Self {
            container,
            formats,
            settings,
            draw_symbols,
            on_success,
        })
    }
}
