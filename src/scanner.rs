// ============================================================================
// SCANNER - Controller del ciclo de vida de escaneo
// ============================================================================
// Máquina de estados: Idle → Starting (esperando permiso de cámara) →
// Running ⇄ Paused → Idle (con destroy). Una instancia posee como máximo
// un stream de cámara y un loop de detección a la vez.
// ============================================================================

use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Element, HtmlVideoElement, MediaStream};

use crate::config::{ContainerTarget, ScannerConfig};
use crate::dom::{get_element_by_id, window};
use crate::error::ScannerError;
use crate::services::{
    build_constraints, parse_supported_formats, parse_symbols, BarcodeEngine, CameraProvider,
    DetectorHandle, NativeBarcodeEngine, NavigatorCamera,
};
use crate::state::ScannerState;
use crate::views::{mount_preview, Overlay};

/// Controller del scanner: posee el estado de la sesión y los dos
/// colaboradores externos (cámara y motor de decodificación)
pub struct Scanner {
    state: ScannerState,
    camera: Rc<dyn CameraProvider>,
    engine: Rc<dyn BarcodeEngine>,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner {
    /// Scanner con los colaboradores reales del navegador
    pub fn new() -> Self {
        Self::with_collaborators(Rc::new(NavigatorCamera), Rc::new(NativeBarcodeEngine))
    }

    /// Scanner con colaboradores inyectados (tests)
    pub fn with_collaborators(
        camera: Rc<dyn CameraProvider>,
        engine: Rc<dyn BarcodeEngine>,
    ) -> Self {
        Self {
            state: ScannerState::new(),
            camera,
            engine,
        }
    }

    /// Iniciar una sesión de escaneo. Resuelve en cuanto el loop de
    /// detección queda programado; no espera al primer símbolo.
    ///
    /// Orden de fallos: contenedor (NO_CONTAINER, antes de pedir ningún
    /// permiso), motor (DETECTOR_UNAVAILABLE, antes de pedir la cámara),
    /// cámara (NOT_ALLOWED, sin dejar nada montado en el DOM).
    ///
    /// Un fallo puntual de detect() durante la sesión NO la termina: se
    /// registra y el loop reintenta en el próximo frame. Solo destroy()
    /// termina una sesión.
    pub async fn init(&self, config: ScannerConfig) -> Result<(), ScannerError> {
        // Re-init: derribar la sesión anterior antes de crear otro stream
        if self.state.is_running() {
            log::info!("🔄 [SCANNER] init() con sesión activa, destruyendo la anterior");
            self.destroy();
        }

        let mount =
            Self::resolve_container(&config.container).ok_or(ScannerError::NoContainer)?;

        // Construcción temprana del motor: si no está disponible fallamos
        // sin haber pedido permiso de cámara. Los formatos soportados solo
        // se consultan si el caller no pidió ninguno.
        let formats = if config.formats.is_empty() {
            let promise = self.engine.supported_formats()?;
            let value = JsFuture::from(promise)
                .await
                .map_err(|e| ScannerError::DetectorUnavailable(format!("{:?}", e)))?;
            parse_supported_formats(&value)
        } else {
            config.formats.clone()
        };
        let detector = self.engine.create(&formats)?;

        log::info!("📷 [CAMERA] Solicitando acceso a la cámara...");
        let constraints = build_constraints(config.settings.as_ref());
        let promise = self.camera.acquire(&constraints).map_err(|e| {
            log::warn!("❌ [CAMERA] Sin acceso a mediaDevices: {:?}", e);
            ScannerError::CameraAccess
        })?;
        let stream = match JsFuture::from(promise).await {
            Ok(value) => MediaStream::from(value),
            Err(e) => {
                log::warn!("❌ [CAMERA] Acceso denegado: {:?}", e);
                return Err(ScannerError::CameraAccess);
            }
        };

        let preview = mount_preview(&mount, &stream, config.draw_symbols)
            .map_err(|e| ScannerError::Dom(format!("{:?}", e)))?;

        self.state
            .store_session(mount, preview.video.clone(), preview.overlay.clone(), stream);
        let generation = self.state.begin_session();
        spawn_detection_loop(
            self.state.clone(),
            generation,
            detector,
            preview.video,
            preview.overlay,
            config.on_success,
        );

        log::info!("✅ [SCANNER] Sesión iniciada (generación {})", generation);
        Ok(())
    }

    fn resolve_container(target: &ContainerTarget) -> Option<Element> {
        match target {
            ContainerTarget::Id(id) => get_element_by_id(id),
            ContainerTarget::Element(element) => Some(element.clone()),
        }
    }

    /// Suprimir el callback de éxito. El loop y el motor siguen corriendo
    /// a frame rate completo, así resume() es instantáneo. Idempotente.
    pub fn pause(&self) {
        self.state.set_paused(true);
        log::info!("⏸️ [SCANNER] Pausado (el loop sigue corriendo)");
    }

    /// Volver a entregar detecciones al callback. Idempotente.
    pub fn resume(&self) {
        self.state.set_paused(false);
        log::info!("▶️ [SCANNER] Reanudado");
    }

    /// Terminar la sesión: cancela el loop en su próximo checkpoint, detiene
    /// todos los tracks del stream y desmonta el preview. Idempotente.
    pub fn destroy(&self) {
        let was_running = self.state.is_running();
        self.state.invalidate();
        self.state.release();
        if was_running {
            log::info!("🧹 [SCANNER] Sesión destruida");
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn is_paused(&self) -> bool {
        self.state.is_paused()
    }

    pub fn state(&self) -> &ScannerState {
        &self.state
    }
}

/// Loop de detección: una tarea por generación. La siguiente iteración solo
/// se programa cuando la anterior resolvió, así un detect lento en un
/// dispositivo de gama baja reduce el muestreo en vez de encolar trabajo.
fn spawn_detection_loop(
    state: ScannerState,
    generation: u64,
    detector: Rc<dyn DetectorHandle>,
    video: HtmlVideoElement,
    overlay: Option<Overlay>,
    on_success: Rc<dyn Fn(Vec<String>)>,
) {
    spawn_local(async move {
        log::debug!("🔁 [SCANNER] Loop de detección iniciado (generación {})", generation);
        loop {
            if !state.is_current(generation) {
                break;
            }

            let result = JsFuture::from(detector.detect(video.as_ref())).await;

            // Un destroy() pudo ganarle la carrera al detect en vuelo:
            // el resultado viejo se descarta sin tocar el callback.
            if !state.is_current(generation) {
                break;
            }

            match result {
                Ok(value) => {
                    let symbols = parse_symbols(&value);
                    if let Some(overlay) = &overlay {
                        overlay.draw(&symbols, &video);
                    }
                    if !symbols.is_empty() && !state.is_paused() {
                        let values: Vec<String> =
                            symbols.iter().map(|s| s.raw_value.clone()).collect();
                        log::debug!("📱 [SCANNER] {} símbolo(s) detectado(s)", values.len());
                        (on_success)(values);
                    }
                }
                Err(e) => {
                    log::warn!("⚠️ [DETECTOR] Fallo de detección, reintentando: {:?}", e);
                }
            }

            if next_animation_frame().await.is_err() {
                break;
            }
        }
        log::debug!("🛑 [SCANNER] Loop de detección terminado (generación {})", generation);
    });
}

/// Future que resuelve justo antes del próximo repintado
async fn next_animation_frame() -> Result<(), JsValue> {
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        if let Some(window) = window() {
            let _ = window.request_animation_frame(&resolve);
        }
    });
    JsFuture::from(promise).await.map(|_| ())
}
