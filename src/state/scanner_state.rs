// ============================================================================
// SCANNER STATE - Estado runtime compartido de una sesión de escaneo
// ============================================================================
// Los campos viven en Rc para poder compartirse entre el controller y el
// loop de detección. El contador de generación es el token de cancelación:
// el loop solo sigue vivo mientras su generación capturada coincida con la
// actual. Invariante: running == true ⇔ hay una generación viva ⇔ hay un
// stream montado.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlVideoElement, MediaStream, MediaStreamTrack};

use crate::views::Overlay;

/// Estado compartido de la sesión de escaneo activa
#[derive(Clone, Default)]
pub struct ScannerState {
    mount: Rc<RefCell<Option<Element>>>,
    video: Rc<RefCell<Option<HtmlVideoElement>>>,
    overlay: Rc<RefCell<Option<Overlay>>>,
    stream: Rc<RefCell<Option<MediaStream>>>,
    paused: Rc<Cell<bool>>,
    running: Rc<Cell<bool>>,
    generation: Rc<Cell<u64>>,
}

impl ScannerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registrar los recursos montados de la nueva sesión
    pub fn store_session(
        &self,
        mount: Element,
        video: HtmlVideoElement,
        overlay: Option<Overlay>,
        stream: MediaStream,
    ) {
        *self.mount.borrow_mut() = Some(mount);
        *self.video.borrow_mut() = Some(video);
        *self.overlay.borrow_mut() = overlay;
        *self.stream.borrow_mut() = Some(stream);
    }

    /// Arrancar una nueva generación de loop. La sesión arranca sin pausa.
    pub fn begin_session(&self) -> u64 {
        self.generation.set(self.generation.get() + 1);
        self.paused.set(false);
        self.running.set(true);
        self.generation.get()
    }

    /// ¿Sigue viva la generación capturada por el loop?
    pub fn is_current(&self, generation: u64) -> bool {
        self.running.get() && self.generation.get() == generation
    }

    /// Invalidar la generación actual: el loop se abandona en su próximo
    /// checkpoint y descarta cualquier resultado en vuelo.
    pub fn invalidate(&self) {
        self.generation.set(self.generation.get() + 1);
        self.running.set(false);
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.set(paused);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.get()
    }

    /// Liberar la cámara y desmontar el preview. Idempotente.
    pub fn release(&self) {
        if let Some(stream) = self.stream.borrow_mut().take() {
            let tracks = stream.get_tracks();
            for i in 0..tracks.length() {
                let track = tracks.get(i);
                if track.is_undefined() || track.is_null() {
                    continue;
                }
                if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                    track.stop();
                }
            }
        }

        if let Some(video) = self.video.borrow_mut().take() {
            video.set_src_object(None);
            video.remove();
        }

        if let Some(overlay) = self.overlay.borrow_mut().take() {
            overlay.clear();
            overlay.remove();
        }

        *self.mount.borrow_mut() = None;
    }
}
