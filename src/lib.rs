// ============================================================================
// BARCODE SCANNER - Widget de escaneo de códigos de barras en el navegador
// ============================================================================
// Adquiere la cámara, monta un preview de video en el contenedor indicado y
// alimenta cada frame al motor de decodificación del navegador. Los valores
// decodificados se entregan por callback; pause/resume/destroy controlan el
// ciclo de vida. Opcionalmente dibuja el contorno de cada símbolo detectado
// sobre un canvas.
// ============================================================================

pub mod config;
pub mod dom;
pub mod error;
pub mod scanner;
pub mod services;
pub mod state;
pub mod utils;
pub mod views;

use std::cell::RefCell;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use wasm_logger::Config;

pub use config::{BarcodeFormat, ContainerTarget, ScannerConfig};
pub use error::ScannerError;
pub use scanner::Scanner;
pub use services::{
    BarcodeEngine, CameraProvider, CornerPoint, DetectedSymbol, DetectorHandle,
    NativeBarcodeEngine, NavigatorCamera,
};

// Instancia global para la API llamable desde JavaScript. Desde Rust se
// pueden crear instancias independientes con Scanner directamente.
thread_local! {
    static SCANNER: RefCell<Option<Scanner>> = RefCell::new(None);
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    wasm_logger::init(Config::default());
    log::info!("🚀 Barcode Scanner - módulo cargado");
    Ok(())
}

/// Inicializar el scanner global con el payload
/// { container?, formats?, settings?, drawSymbols?, onSuccess }.
/// Si ya había una sesión activa se destruye antes de crear la nueva.
#[wasm_bindgen(js_name = initScanner)]
pub async fn init_scanner(payload: JsValue) -> Result<JsValue, JsValue> {
    let config = ScannerConfig::from_js(&payload)?;

    SCANNER.with(|slot| {
        if let Some(previous) = slot.borrow_mut().take() {
            previous.destroy();
        }
    });

    let scanner = Scanner::new();
    scanner.init(config).await?;

    SCANNER.with(|slot| {
        *slot.borrow_mut() = Some(scanner);
    });

    Ok(JsValue::TRUE)
}

/// Suprimir el callback sin detener la cámara ni el loop
#[wasm_bindgen(js_name = pauseScanner)]
pub fn pause_scanner() {
    SCANNER.with(|slot| {
        if let Some(scanner) = &*slot.borrow() {
            scanner.pause();
        }
    });
}

/// Reanudar la entrega de detecciones al callback
#[wasm_bindgen(js_name = resumeScanner)]
pub fn resume_scanner() {
    SCANNER.with(|slot| {
        if let Some(scanner) = &*slot.borrow() {
            scanner.resume();
        }
    });
}

/// Destruir la sesión global: cancela el loop, libera la cámara y
/// desmonta el preview. No-op si no hay sesión.
#[wasm_bindgen(js_name = destroyScanner)]
pub fn destroy_scanner() {
    SCANNER.with(|slot| {
        if let Some(scanner) = slot.borrow_mut().take() {
            scanner.destroy();
        }
    });
}

/// Formatos que soporta el motor de decodificación del navegador.
/// Promise<Array<string>>
#[wasm_bindgen(js_name = supportedFormats)]
pub async fn supported_formats() -> Result<JsValue, JsValue> {
    let engine = NativeBarcodeEngine;
    let promise = engine.supported_formats().map_err(JsValue::from)?;
    JsFuture::from(promise).await
}
