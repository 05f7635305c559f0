// ============================================================================
// TESTS DE INTEGRACIÓN DEL SCANNER (navegador)
// ============================================================================
// Ejercitan el controller completo con cámara y motor stubeados:
// errores de init, pause/resume, destroy idempotente, overlay y formatos
// por defecto. Correr con wasm-pack test --headless --chrome (o --firefox).
// ============================================================================

#![cfg(target_arch = "wasm32")]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{Element, HtmlCanvasElement, HtmlVideoElement, MediaStream, MediaStreamTrack};

use barcode_scanner::{
    BarcodeEngine, BarcodeFormat, CameraProvider, ContainerTarget, DetectorHandle, Scanner,
    ScannerConfig, ScannerError,
};
use gloo_timers::future::TimeoutFuture;

wasm_bindgen_test_configure!(run_in_browser);

// ============================================================================
// Helpers DOM
// ============================================================================

fn document() -> web_sys::Document {
    web_sys::window().unwrap().document().unwrap()
}

/// Montar un contenedor vacío con el ID dado en el body
fn mount_container(id: &str) -> Element {
    let container = document().create_element("div").unwrap();
    container.set_id(id);
    document().body().unwrap().append_child(&container).unwrap();
    container
}

fn remove_container(container: &Element) {
    container.remove();
}

/// Esperar hasta que se cumpla la condición o venza el timeout
async fn wait_until<F: Fn() -> bool>(condition: F, timeout_ms: u32) -> bool {
    let mut elapsed = 0;
    while elapsed < timeout_ms {
        if condition() {
            return true;
        }
        TimeoutFuture::new(25).await;
        elapsed += 25;
    }
    condition()
}

/// Dejar correr el loop unos cuantos frames
async fn let_frames_pass() {
    TimeoutFuture::new(200).await;
}

// ============================================================================
// Stub de cámara
// ============================================================================

#[derive(Clone)]
struct FakeCamera {
    calls: Rc<Cell<u32>>,
    deny: bool,
    /// Si true, el stream sale de canvas.captureStream() y trae un track
    /// de video real que destroy() debe detener
    with_track: bool,
    handed_stream: Rc<RefCell<Option<MediaStream>>>,
}

impl FakeCamera {
    fn granting() -> Self {
        Self {
            calls: Rc::new(Cell::new(0)),
            deny: false,
            with_track: false,
            handed_stream: Rc::new(RefCell::new(None)),
        }
    }

    fn denying() -> Self {
        Self {
            deny: true,
            ..Self::granting()
        }
    }

    fn with_real_track() -> Self {
        Self {
            with_track: true,
            ..Self::granting()
        }
    }
}

impl CameraProvider for FakeCamera {
    fn acquire(
        &self,
        _constraints: &web_sys::MediaStreamConstraints,
    ) -> Result<js_sys::Promise, JsValue> {
        self.calls.set(self.calls.get() + 1);

        if self.deny {
            return Ok(js_sys::Promise::reject(
                &js_sys::Error::new("Permission denied").into(),
            ));
        }

        let stream = if self.with_track {
            let canvas: HtmlCanvasElement = document()
                .create_element("canvas")
                .unwrap()
                .dyn_into()
                .unwrap();
            canvas.set_width(100);
            canvas.set_height(100);
            // captureStream necesita un contexto creado y con contenido
            let ctx: web_sys::CanvasRenderingContext2d = canvas
                .get_context("2d")
                .unwrap()
                .unwrap()
                .dyn_into()
                .unwrap();
            ctx.fill_rect(0.0, 0.0, 100.0, 100.0);
            canvas.capture_stream().unwrap()
        } else {
            MediaStream::new().unwrap()
        };

        *self.handed_stream.borrow_mut() = Some(stream.clone());
        Ok(js_sys::Promise::resolve(&stream))
    }
}

// ============================================================================
// Stub del motor de decodificación
// ============================================================================

#[derive(Clone, Copy, PartialEq)]
enum StubMode {
    /// Nunca encuentra símbolos
    Never,
    /// Encuentra un símbolo en cada frame
    Always,
    /// Encuentra un símbolo solo en la llamada N (1-indexed)
    OnlyCall(u32),
    /// Rechaza la primera llamada, después encuentra siempre
    RejectFirst,
}

#[derive(Clone)]
struct StubEngine {
    create_calls: Rc<RefCell<Vec<Vec<BarcodeFormat>>>>,
    detect_calls: Rc<Cell<u32>>,
    mode: Rc<Cell<StubMode>>,
    supported: Vec<&'static str>,
}

impl StubEngine {
    fn new(mode: StubMode) -> Self {
        Self {
            create_calls: Rc::new(RefCell::new(Vec::new())),
            detect_calls: Rc::new(Cell::new(0)),
            mode: Rc::new(Cell::new(mode)),
            supported: vec!["ean_13", "ean_8", "code_128", "qr_code"],
        }
    }
}

impl BarcodeEngine for StubEngine {
    fn supported_formats(&self) -> Result<js_sys::Promise, ScannerError> {
        let array = js_sys::Array::new();
        for id in &self.supported {
            array.push(&JsValue::from_str(id));
        }
        Ok(js_sys::Promise::resolve(&array))
    }

    fn create(
        &self,
        formats: &[BarcodeFormat],
    ) -> Result<Rc<dyn DetectorHandle>, ScannerError> {
        self.create_calls.borrow_mut().push(formats.to_vec());
        Ok(Rc::new(StubDetector {
            detect_calls: self.detect_calls.clone(),
            mode: self.mode.clone(),
        }))
    }
}

struct StubDetector {
    detect_calls: Rc<Cell<u32>>,
    mode: Rc<Cell<StubMode>>,
}

impl DetectorHandle for StubDetector {
    fn detect(&self, _source: &JsValue) -> js_sys::Promise {
        let call = self.detect_calls.get() + 1;
        self.detect_calls.set(call);

        let hit = match self.mode.get() {
            StubMode::Never => false,
            StubMode::Always => true,
            StubMode::OnlyCall(n) => call == n,
            StubMode::RejectFirst => {
                if call == 1 {
                    return js_sys::Promise::reject(&js_sys::Error::new("engine hiccup").into());
                }
                true
            }
        };

        let result = js_sys::Array::new();
        if hit {
            result.push(&js_symbol(
                "0123456789012",
                &[(10.0, 10.0), (90.0, 10.0), (90.0, 90.0), (10.0, 90.0)],
            ));
        }
        js_sys::Promise::resolve(&result)
    }
}

/// Construir un objeto símbolo con la forma que devuelve el motor:
/// { rawValue, cornerPoints: [{x, y}, ...] }
fn js_symbol(raw_value: &str, corners: &[(f64, f64)]) -> JsValue {
    let symbol = js_sys::Object::new();
    js_sys::Reflect::set(
        &symbol,
        &JsValue::from_str("rawValue"),
        &JsValue::from_str(raw_value),
    )
    .unwrap();

    let points = js_sys::Array::new();
    for (x, y) in corners {
        let point = js_sys::Object::new();
        js_sys::Reflect::set(&point, &JsValue::from_str("x"), &JsValue::from_f64(*x)).unwrap();
        js_sys::Reflect::set(&point, &JsValue::from_str("y"), &JsValue::from_f64(*y)).unwrap();
        points.push(&point);
    }
    js_sys::Reflect::set(&symbol, &JsValue::from_str("cornerPoints"), &points).unwrap();
    symbol.into()
}

/// Scanner con stubs + registro de lo que recibió el callback
fn build_scanner(
    camera: FakeCamera,
    engine: StubEngine,
    container_id: &str,
) -> (Scanner, ScannerConfig, Rc<RefCell<Vec<Vec<String>>>>) {
    let seen: Rc<RefCell<Vec<Vec<String>>>> = Rc::new(RefCell::new(Vec::new()));
    let seen_clone = seen.clone();

    let mut config = ScannerConfig::new(move |values| {
        seen_clone.borrow_mut().push(values);
    });
    config.container = ContainerTarget::Id(container_id.to_string());

    let scanner = Scanner::with_collaborators(Rc::new(camera), Rc::new(engine));
    (scanner, config, seen)
}

// ============================================================================
// Tests
// ============================================================================

/// Contenedor inexistente: rechaza con NO_CONTAINER sin llamar a getUserMedia
#[wasm_bindgen_test]
async fn test_init_sin_contenedor() {
    let camera = FakeCamera::granting();
    let engine = StubEngine::new(StubMode::Never);
    let (scanner, config, _seen) = build_scanner(camera.clone(), engine, "no-existe");

    let result = scanner.init(config).await;

    assert!(matches!(result, Err(ScannerError::NoContainer)));
    assert_eq!(camera.calls.get(), 0, "nunca debe pedirse la cámara");
    assert!(!scanner.is_running());
}

/// Permiso denegado: rechaza con NOT_ALLOWED y no deja nada montado
#[wasm_bindgen_test]
async fn test_init_camara_denegada() {
    let container = mount_container("denegada");
    let camera = FakeCamera::denying();
    let engine = StubEngine::new(StubMode::Never);
    let (scanner, config, _seen) = build_scanner(camera.clone(), engine, "denegada");

    let result = scanner.init(config).await;

    assert!(matches!(result, Err(ScannerError::CameraAccess)));
    assert_eq!(camera.calls.get(), 1);
    assert_eq!(container.child_element_count(), 0, "sin video ni canvas montados");
    assert!(!scanner.is_running());

    remove_container(&container);
}

/// pause() suprime el callback; resume() lo restaura sin readquirir la cámara
#[wasm_bindgen_test]
async fn test_pause_resume() {
    let container = mount_container("pausa");
    let camera = FakeCamera::granting();
    let engine = StubEngine::new(StubMode::Always);
    let (scanner, config, seen) = build_scanner(camera.clone(), engine.clone(), "pausa");

    scanner.init(config).await.unwrap();
    scanner.pause();

    let_frames_pass().await;
    assert!(
        seen.borrow().is_empty(),
        "en pausa no debe invocarse el callback"
    );
    assert!(
        engine.detect_calls.get() > 0,
        "el loop sigue decodificando durante la pausa"
    );

    scanner.resume();
    let delivered = wait_until(|| !seen.borrow().is_empty(), 2_000).await;
    assert!(delivered, "tras resume() vuelve a entregar detecciones");

    // Mismo stream: sin readquisición de cámara
    assert_eq!(camera.calls.get(), 1);
    let video: HtmlVideoElement = container
        .query_selector("video")
        .unwrap()
        .unwrap()
        .dyn_into()
        .unwrap();
    let handed = camera.handed_stream.borrow().clone().unwrap();
    let current = video.src_object().unwrap();
    assert!(js_sys::Object::is(handed.as_ref(), current.as_ref()));

    scanner.destroy();
    remove_container(&container);
}

/// destroy() es idempotente y detiene todos los tracks del stream
#[wasm_bindgen_test]
async fn test_destroy_idempotente() {
    let container = mount_container("destruir");
    let camera = FakeCamera::with_real_track();
    let engine = StubEngine::new(StubMode::Never);
    let (scanner, config, _seen) = build_scanner(camera.clone(), engine, "destruir");

    scanner.init(config).await.unwrap();
    let stream = camera.handed_stream.borrow().clone().unwrap();
    assert!(stream.get_tracks().length() > 0);

    scanner.destroy();
    scanner.destroy(); // segunda llamada: no-op sin error

    assert!(!scanner.is_running());
    assert_eq!(container.child_element_count(), 0, "preview desmontado");

    let tracks = stream.get_tracks();
    for i in 0..tracks.length() {
        let track: MediaStreamTrack = tracks.get(i).dyn_into().unwrap();
        assert_eq!(
            track.ready_state(),
            web_sys::MediaStreamTrackState::Ended,
            "todos los tracks detenidos"
        );
    }

    remove_container(&container);
}

/// Un único hit del motor produce exactamente una invocación del callback
#[wasm_bindgen_test]
async fn test_deteccion_unica() {
    let container = mount_container("unica");
    let camera = FakeCamera::granting();
    let engine = StubEngine::new(StubMode::OnlyCall(3));
    let (scanner, config, seen) = build_scanner(camera, engine, "unica");

    scanner.init(config).await.unwrap();

    let delivered = wait_until(|| !seen.borrow().is_empty(), 2_000).await;
    assert!(delivered);

    // Dejar correr más frames: no deben llegar más invocaciones
    let_frames_pass().await;
    assert_eq!(*seen.borrow(), vec![vec!["0123456789012".to_string()]]);

    scanner.destroy();
    remove_container(&container);
}

/// Con drawSymbols el canvas se limpia y redibuja en cada ciclo
#[wasm_bindgen_test]
async fn test_overlay_limpia_y_redibuja() {
    let container = mount_container("overlay");
    let camera = FakeCamera::granting();
    let engine = StubEngine::new(StubMode::Always);
    let (scanner, mut config, _seen) = build_scanner(camera, engine.clone(), "overlay");
    config.draw_symbols = true;

    scanner.init(config).await.unwrap();

    // Sin frames reales de video el overlay usa los atributos width/height
    let video: HtmlVideoElement = container
        .query_selector("video")
        .unwrap()
        .unwrap()
        .dyn_into()
        .unwrap();
    video.set_width(100);
    video.set_height(100);

    let canvas: HtmlCanvasElement = container
        .query_selector("canvas")
        .unwrap()
        .unwrap()
        .dyn_into()
        .unwrap();

    let drawn = wait_until(|| canvas.width() == 100 && edge_pixel_drawn(&canvas), 2_000).await;
    assert!(drawn, "el polígono del símbolo queda trazado");

    // Frames sin símbolos: el canvas queda limpio, sin trazos residuales
    engine.mode.set(StubMode::Never);
    let cleared = wait_until(|| !edge_pixel_drawn(&canvas), 2_000).await;
    assert!(cleared, "un frame sin símbolos limpia el trazo anterior");

    scanner.destroy();
    remove_container(&container);
}

/// ¿Hay pintura sobre el borde superior del polígono (50, 10)?
fn edge_pixel_drawn(canvas: &HtmlCanvasElement) -> bool {
    if canvas.width() == 0 || canvas.height() == 0 {
        return false;
    }
    let ctx: web_sys::CanvasRenderingContext2d = canvas
        .get_context("2d")
        .unwrap()
        .unwrap()
        .dyn_into()
        .unwrap();
    let data = match ctx.get_image_data(49.0, 9.0, 3.0, 3.0) {
        Ok(image) => image.data(),
        Err(_) => return false,
    };
    data.iter().any(|byte| *byte != 0)
}

/// Sin formats en el payload, el motor se construye con el set por defecto
#[wasm_bindgen_test]
async fn test_formatos_por_defecto() {
    let container = mount_container("defecto");
    let camera = FakeCamera::granting();
    let engine = StubEngine::new(StubMode::Never);
    let (scanner, config, _seen) = build_scanner(camera, engine.clone(), "defecto");

    scanner.init(config).await.unwrap();

    assert_eq!(
        *engine.create_calls.borrow(),
        vec![vec![
            BarcodeFormat::Ean13,
            BarcodeFormat::Ean8,
            BarcodeFormat::Code128
        ]]
    );

    scanner.destroy();
    remove_container(&container);
}

/// Lista de formatos explícitamente vacía: se usan todos los del motor
#[wasm_bindgen_test]
async fn test_formatos_vacios_usa_soportados() {
    let container = mount_container("soportados");
    let camera = FakeCamera::granting();
    let engine = StubEngine::new(StubMode::Never);
    let (scanner, mut config, _seen) = build_scanner(camera, engine.clone(), "soportados");
    config.formats = Vec::new();

    scanner.init(config).await.unwrap();

    assert_eq!(
        *engine.create_calls.borrow(),
        vec![vec![
            BarcodeFormat::Ean13,
            BarcodeFormat::Ean8,
            BarcodeFormat::Code128,
            BarcodeFormat::QrCode
        ]]
    );

    scanner.destroy();
    remove_container(&container);
}

/// Un rechazo puntual de detect() no termina la sesión
#[wasm_bindgen_test]
async fn test_fallo_de_detect_no_fatal() {
    let container = mount_container("fallo");
    let camera = FakeCamera::granting();
    let engine = StubEngine::new(StubMode::RejectFirst);
    let (scanner, config, seen) = build_scanner(camera, engine, "fallo");

    scanner.init(config).await.unwrap();

    let delivered = wait_until(|| !seen.borrow().is_empty(), 2_000).await;
    assert!(delivered, "el loop sobrevive al rechazo y sigue detectando");

    scanner.destroy();
    remove_container(&container);
}

/// Re-init sobre una sesión viva: derriba la anterior y no acumula previews
#[wasm_bindgen_test]
async fn test_reinit_derriba_sesion_anterior() {
    let container = mount_container("reinit");
    let camera = FakeCamera::granting();
    let engine = StubEngine::new(StubMode::Never);
    let (scanner, config, _seen) = build_scanner(camera.clone(), engine, "reinit");

    scanner.init(config.clone()).await.unwrap();
    scanner.init(config).await.unwrap();

    assert_eq!(camera.calls.get(), 2);
    assert_eq!(
        container.query_selector_all("video").unwrap().length(),
        1,
        "un solo preview montado tras re-init"
    );

    scanner.destroy();
    remove_container(&container);
}

/// Parseo del payload JS: defaults y formatos explícitos
#[wasm_bindgen_test]
fn test_payload_desde_js() {
    let payload = js_sys::Object::new();
    let noop = js_sys::Function::new_no_args("");
    js_sys::Reflect::set(&payload, &JsValue::from_str("onSuccess"), &noop).unwrap();

    let config = ScannerConfig::from_js(&payload.clone().into()).unwrap();
    assert_eq!(config.formats, BarcodeFormat::default_set());
    assert!(!config.draw_symbols);
    assert!(matches!(config.container, ContainerTarget::Id(ref id) if id == "barcode-scanner"));

    let formats = js_sys::Array::new();
    formats.push(&JsValue::from_str("qr_code"));
    js_sys::Reflect::set(&payload, &JsValue::from_str("formats"), &formats).unwrap();
    js_sys::Reflect::set(&payload, &JsValue::from_str("drawSymbols"), &JsValue::TRUE).unwrap();

    let config = ScannerConfig::from_js(&payload.clone().into()).unwrap();
    assert_eq!(config.formats, vec![BarcodeFormat::QrCode]);
    assert!(config.draw_symbols);

    // Formato desconocido: el parseo falla
    let bad = js_sys::Array::new();
    bad.push(&JsValue::from_str("code39"));
    js_sys::Reflect::set(&payload, &JsValue::from_str("formats"), &bad).unwrap();
    assert!(ScannerConfig::from_js(&payload.into()).is_err());
}

/// Sin onSuccess el payload se rechaza
#[wasm_bindgen_test]
fn test_payload_sin_callback() {
    let payload = js_sys::Object::new();
    assert!(ScannerConfig::from_js(&payload.into()).is_err());
}
