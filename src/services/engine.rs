// ============================================================================
// ENGINE SERVICE - Motor de decodificación de códigos de barras
// ============================================================================
// El motor (BarcodeDetector nativo o polyfill en window) se trata como caja
// negra: se le piden formatos soportados, se construye una instancia y se le
// pasan frames. Los traits son la costura para stubearlo en tests.
// ============================================================================

use serde::{Deserialize, Serialize};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::config::BarcodeFormat;
use crate::dom::window;
use crate::error::ScannerError;
use crate::utils::constants::{DETECTOR_ENCODING, DETECTOR_GLOBAL};
use crate::utils::detector_ffi;

/// Punto de una esquina del símbolo, en píxeles del frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CornerPoint {
    pub x: f64,
    pub y: f64,
}

/// Símbolo decodificado en un frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedSymbol {
    pub raw_value: String,
    pub corner_points: Vec<CornerPoint>,
}

/// Instancia construida del motor, reutilizada frame a frame en la sesión
pub trait DetectorHandle {
    /// Detectar símbolos en el source. Promise<Array<DetectedBarcode>>
    fn detect(&self, source: &JsValue) -> js_sys::Promise;
}

/// Contrato a nivel constructor del motor de decodificación
pub trait BarcodeEngine {
    /// Promise<Array<string>> con los formatos que soporta el motor
    fn supported_formats(&self) -> Result<js_sys::Promise, ScannerError>;

    /// Construir una instancia configurada con los formatos pedidos
    fn create(&self, formats: &[BarcodeFormat]) -> Result<Rc<dyn DetectorHandle>, ScannerError>;
}

/// Motor real: el constructor global BarcodeDetector del navegador.
/// Se busca en window en cada uso porque el polyfill puede instalarse
/// después de que cargue este módulo.
pub struct NativeBarcodeEngine;

impl NativeBarcodeEngine {
    fn constructor() -> Result<js_sys::Function, ScannerError> {
        let window = window()
            .ok_or_else(|| ScannerError::DetectorUnavailable("No window".to_string()))?;
        let ctor = js_sys::Reflect::get(&window, &JsValue::from_str(DETECTOR_GLOBAL))
            .map_err(|e| ScannerError::DetectorUnavailable(format!("{:?}", e)))?;
        if ctor.is_undefined() || ctor.is_null() {
            return Err(ScannerError::DetectorUnavailable(format!(
                "{} no está definido en window",
                DETECTOR_GLOBAL
            )));
        }
        ctor.dyn_into::<js_sys::Function>()
            .map_err(|_| ScannerError::DetectorUnavailable(format!("{} no es un constructor", DETECTOR_GLOBAL)))
    }
}

impl BarcodeEngine for NativeBarcodeEngine {
    fn supported_formats(&self) -> Result<js_sys::Promise, ScannerError> {
        let ctor = Self::constructor()?;
        let method = js_sys::Reflect::get(&ctor, &JsValue::from_str("getSupportedFormats"))
            .map_err(|e| ScannerError::DetectorUnavailable(format!("{:?}", e)))?
            .dyn_into::<js_sys::Function>()
            .map_err(|_| {
                ScannerError::DetectorUnavailable("getSupportedFormats no disponible".to_string())
            })?;
        let result = method
            .call0(&ctor)
            .map_err(|e| ScannerError::DetectorUnavailable(format!("{:?}", e)))?;
        Ok(js_sys::Promise::from(result))
    }

    fn create(&self, formats: &[BarcodeFormat]) -> Result<Rc<dyn DetectorHandle>, ScannerError> {
        let ctor = Self::constructor()?;

        let wire_formats = js_sys::Array::new();
        for format in formats {
            wire_formats.push(&JsValue::from_str(format.as_wire()));
        }

        let options = js_sys::Object::new();
        let _ = js_sys::Reflect::set(&options, &JsValue::from_str("formats"), &wire_formats);
        let _ = js_sys::Reflect::set(
            &options,
            &JsValue::from_str("encoding"),
            &JsValue::from_str(DETECTOR_ENCODING),
        );

        let instance =
            js_sys::Reflect::construct(&ctor, &js_sys::Array::of1(&options)).map_err(|e| {
                ScannerError::DetectorUnavailable(format!("Fallo al construir el motor: {:?}", e))
            })?;

        log::info!(
            "🔍 [DETECTOR] Motor construido con {} formato(s)",
            formats.len()
        );

        Ok(Rc::new(NativeDetector {
            inner: instance.unchecked_into(),
        }))
    }
}

struct NativeDetector {
    inner: detector_ffi::BarcodeDetector,
}

impl DetectorHandle for NativeDetector {
    fn detect(&self, source: &JsValue) -> js_sys::Promise {
        self.inner.detect(source)
    }
}

/// Parsear el array de símbolos devuelto por detect()
pub fn parse_symbols(value: &JsValue) -> Vec<DetectedSymbol> {
    let array = match value.dyn_ref::<js_sys::Array>() {
        Some(array) => array,
        None => return Vec::new(),
    };

    let mut symbols = Vec::with_capacity(array.length() as usize);
    for entry in array.iter() {
        let barcode = entry.unchecked_into::<detector_ffi::DetectedBarcode>();
        let corner_points = barcode
            .corner_points()
            .iter()
            .map(|point| CornerPoint {
                x: js_sys::Reflect::get(&point, &JsValue::from_str("x"))
                    .ok()
                    .and_then(|v| v.as_f64())
                    .unwrap_or(0.0),
                y: js_sys::Reflect::get(&point, &JsValue::from_str("y"))
                    .ok()
                    .and_then(|v| v.as_f64())
                    .unwrap_or(0.0),
            })
            .collect();
        symbols.push(DetectedSymbol {
            raw_value: barcode.raw_value(),
            corner_points,
        });
    }
    symbols
}

/// Parsear la lista de formatos soportados que reporta el motor.
/// Identificadores que no conocemos se ignoran.
pub fn parse_supported_formats(value: &JsValue) -> Vec<BarcodeFormat> {
    let array = match value.dyn_ref::<js_sys::Array>() {
        Some(array) => array,
        None => return Vec::new(),
    };

    array
        .iter()
        .filter_map(|entry| entry.as_string())
        .filter_map(|id| BarcodeFormat::from_wire(&id))
        .collect()
}
