// ============================================================================
// BARCODE READER - Componente yew del escáner de códigos de barras
// ============================================================================
// Componente solo-lógica: el host renderiza el <video> y el <canvas> y los
// provee vía NodeRef; el componente posee el ciclo de vida del bridge
// (crear en el primer render, liberar en el cleanup del efecto) y reenvía
// los eventos del bridge a los callbacks del host.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlCanvasElement, HtmlVideoElement};
use yew::prelude::*;

use crate::interop::{EngineFlavor, JsEngine, ScannerBridge, ScannerError};
use crate::models::{
    BarcodeReceivedEvent, DecodingChangedEvent, ErrorReceivedEvent, VideoInputDevice,
};
use crate::state::SubscriptionSet;
use crate::utils::constants::{DECODED_PICTURE_FORMAT, NO_DIMENSION_PREFERENCE};

/// Callbacks del host; se refrescan en cada render para que los eventos
/// lleguen siempre a la versión más reciente
#[derive(Clone, PartialEq)]
struct HostCallbacks {
    on_barcode: Callback<BarcodeReceivedEvent>,
    on_error: Callback<ErrorReceivedEvent>,
    on_decoding: Callback<DecodingChangedEvent>,
    on_devices: Callback<Vec<VideoInputDevice>>,
    on_selected: Callback<String>,
}

impl HostCallbacks {
    fn from_props(props: &BarcodeReaderProps) -> Self {
        Self {
            on_barcode: props.on_barcode_received.clone(),
            on_error: props.on_error_received.clone(),
            on_decoding: props.on_decoding_changed.clone(),
            on_devices: props.on_video_input_devices_changed.clone(),
            on_selected: props.on_selected_video_input_id_changed.clone(),
        }
    }
}

/// Núcleo compartido entre el componente y el handle imperativo
pub(crate) struct ReaderCore {
    bridge: ScannerBridge<JsEngine>,
    video_ref: NodeRef,
    canvas_ref: NodeRef,
    stream_hints: Cell<(Option<u32>, Option<u32>)>,
    picture_capture: Cell<bool>,
    callbacks: Rc<RefCell<HostCallbacks>>,
    subscriptions: RefCell<SubscriptionSet>,
}

impl ReaderCore {
    fn new(
        flavor: EngineFlavor,
        video_ref: NodeRef,
        canvas_ref: NodeRef,
        stream_hints: (Option<u32>, Option<u32>),
        picture_capture: bool,
        callbacks: HostCallbacks,
    ) -> Self {
        Self {
            bridge: ScannerBridge::new(JsEngine::new(flavor)),
            video_ref,
            canvas_ref,
            stream_hints: Cell::new(stream_hints),
            picture_capture: Cell::new(picture_capture),
            callbacks: Rc::new(RefCell::new(callbacks)),
            subscriptions: RefCell::new(SubscriptionSet::new()),
        }
    }

    fn update_callbacks(&self, callbacks: HostCallbacks) {
        *self.callbacks.borrow_mut() = callbacks;
    }

    fn set_stream_hints(&self, width: Option<u32>, height: Option<u32>) {
        self.stream_hints.set((width, height));
    }

    fn dimensions(&self) -> (u32, u32) {
        let (width, height) = self.stream_hints.get();
        (
            width.unwrap_or(NO_DIMENSION_PREFERENCE),
            height.unwrap_or(NO_DIMENSION_PREFERENCE),
        )
    }

    fn video_surface(&self) -> Result<HtmlVideoElement, ScannerError> {
        self.video_ref
            .cast::<HtmlVideoElement>()
            .ok_or(ScannerError::SurfaceUnavailable("video"))
    }

    fn canvas_surface(&self) -> Result<HtmlCanvasElement, ScannerError> {
        self.canvas_ref
            .cast::<HtmlCanvasElement>()
            .ok_or(ScannerError::SurfaceUnavailable("canvas"))
    }

    /// Suscribir los cuatro tipos de evento del bridge en un único set.
    /// Las closures capturan solo los callbacks del host, no el core: el
    /// registro vive dentro del bridge y un ciclo de Rc lo haría inmortal.
    fn subscribe_events(&self) {
        let mut set = SubscriptionSet::new();

        // Clonar el callback antes de emitir: el borrow no debe seguir vivo
        // mientras corre código del host
        let cbs = self.callbacks.clone();
        set.push(self.bridge.on_barcode_received(move |e| {
            let callback = cbs.borrow().on_barcode.clone();
            callback.emit(e.clone());
        }));
        let cbs = self.callbacks.clone();
        set.push(self.bridge.on_error_received(move |e| {
            let callback = cbs.borrow().on_error.clone();
            callback.emit(e.clone());
        }));
        let cbs = self.callbacks.clone();
        set.push(self.bridge.on_decoding_changed(move |e| {
            let callback = cbs.borrow().on_decoding.clone();
            callback.emit(*e);
        }));
        let cbs = self.callbacks.clone();
        set.push(self.bridge.on_selected_device_changed(move |id| {
            let callback = cbs.borrow().on_selected.clone();
            callback.emit(id.clone());
        }));

        *self.subscriptions.borrow_mut() = set;
    }

    /// Secuencia de arranque del primer render.
    /// Cualquier error se reporta como evento de error en lugar de abortar
    /// la construcción del componente.
    async fn run_setup(&self, auto_start: bool) -> Result<(), ScannerError> {
        // Suscribir primero: los fallos del resto de la secuencia ya salen
        // por el camino de eventos hacia el host
        self.subscribe_events();
        self.bridge.initialize()?;
        self.apply_picture_capture(self.picture_capture.get()).await?;

        let devices = self.bridge.list_video_input_devices().await?;
        log::info!("📷 [READER] {} cámaras enumeradas", devices.len());
        let on_devices = self.callbacks.borrow().on_devices.clone();
        on_devices.emit(devices.clone());

        if auto_start && !devices.is_empty() {
            let preferred = self.bridge.selected_video_input_id();
            self.bridge.set_video_input_device(&preferred).await?;
            self.start().await?;
        }
        Ok(())
    }

    async fn apply_picture_capture(&self, enabled: bool) -> Result<(), ScannerError> {
        let format = enabled.then_some(DECODED_PICTURE_FORMAT);
        self.bridge.set_last_decoded_picture_format(format).await
    }

    /// Re-aplicar el toggle de captura solo cuando realmente cambió
    async fn sync_picture_capture(&self, enabled: bool) -> Result<(), ScannerError> {
        if self.picture_capture.replace(enabled) == enabled {
            return Ok(());
        }
        self.apply_picture_capture(enabled).await
    }

    async fn start(&self) -> Result<(), ScannerError> {
        let video = self.video_surface()?;
        let (width, height) = self.dimensions();
        self.bridge.start(&video, width, height).await
    }

    async fn stop(&self) -> Result<(), ScannerError> {
        self.bridge.stop().await
    }

    async fn restart(&self) -> Result<(), ScannerError> {
        let video = self.video_surface()?;
        let (width, height) = self.dimensions();
        self.bridge.restart(&video, width, height).await
    }

    /// Cambiar de cámara: registrar la preferencia y reiniciar el stream
    async fn select_device(&self, device_id: &str) -> Result<(), ScannerError> {
        self.bridge.set_video_input_device(device_id).await?;
        self.restart().await
    }

    async fn refresh_devices(&self) -> Result<(), ScannerError> {
        let devices = self.bridge.list_video_input_devices().await?;
        let on_devices = self.callbacks.borrow().on_devices.clone();
        on_devices.emit(devices);
        Ok(())
    }

    async fn capture(&self) -> Result<String, ScannerError> {
        let canvas = self.canvas_surface()?;
        self.bridge.capture(&canvas).await
    }

    async fn capture_last_decoded_picture(&self) -> Result<String, ScannerError> {
        self.bridge.last_decoded_picture().await
    }

    async fn torch_on(&self) -> Result<(), ScannerError> {
        self.bridge.set_torch_on().await
    }

    async fn torch_off(&self) -> Result<(), ScannerError> {
        self.bridge.set_torch_off().await
    }

    async fn toggle_torch(&self) -> Result<(), ScannerError> {
        self.bridge.toggle_torch().await
    }

    /// Convertir un fallo de interop en el evento de error del host
    fn report(&self, err: ScannerError) {
        self.bridge.report_error(err.to_string());
    }

    async fn dispose(&self) {
        self.bridge.dispose().await;
        // Los tokens ya quedaron inertes; liberar el set en bloque
        self.subscriptions.borrow_mut().release();
        log::info!("🔌 [READER] Componente liberado");
    }

    fn is_decoding(&self) -> bool {
        self.bridge.is_decoding()
    }

    fn barcode_text(&self) -> String {
        self.bridge.barcode_text()
    }

    fn error_message(&self) -> String {
        self.bridge.error_message()
    }

    fn selected_video_input_id(&self) -> String {
        self.bridge.selected_video_input_id()
    }
}

/// Handle imperativo del componente para la aplicación host.
///
/// Toda operación fallida se reporta como evento de error; ningún fallo
/// escapa hacia el host sin manejar. Las operaciones de ciclo de vida
/// comparten el guard single-flight del bridge: mientras una siga en vuelo,
/// la siguiente se rechaza (el host debería deshabilitar el control que la
/// dispara hasta que la pendiente termine).
#[derive(Clone, Default)]
pub struct BarcodeReaderHandle {
    core: Rc<RefCell<Option<Rc<ReaderCore>>>>,
}

impl PartialEq for BarcodeReaderHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.core, &other.core)
    }
}

impl BarcodeReaderHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn attach(&self, core: Rc<ReaderCore>) {
        *self.core.borrow_mut() = Some(core);
    }

    pub(crate) fn detach(&self) {
        self.core.borrow_mut().take();
    }

    fn core(&self) -> Option<Rc<ReaderCore>> {
        let core = self.core.borrow().clone();
        if core.is_none() {
            log::warn!("⚠️ [READER] Handle sin componente montado, operación ignorada");
        }
        core
    }

    /// Correr una operación async reportando el error como evento
    fn run<F, Fut>(&self, op: F)
    where
        F: FnOnce(Rc<ReaderCore>) -> Fut + 'static,
        Fut: Future<Output = Result<(), ScannerError>> + 'static,
    {
        if let Some(core) = self.core() {
            spawn_local(async move {
                if let Err(e) = op(core.clone()).await {
                    core.report(e);
                }
            });
        }
    }

    pub fn start_decoding(&self) {
        self.run(|core| async move { core.start().await });
    }

    pub fn stop_decoding(&self) {
        self.run(|core| async move { core.stop().await });
    }

    pub fn restart_decoding(&self) {
        self.run(|core| async move { core.restart().await });
    }

    /// Reiniciar el stream aplicando los hints de resolución actuales de
    /// las props
    pub fn update_resolution(&self) {
        self.run(|core| async move { core.restart().await });
    }

    pub fn torch_on(&self) {
        self.run(|core| async move { core.torch_on().await });
    }

    pub fn torch_off(&self) {
        self.run(|core| async move { core.torch_off().await });
    }

    pub fn toggle_torch(&self) {
        self.run(|core| async move { core.toggle_torch().await });
    }

    /// Cambiar de cámara (preferencia + restart)
    pub fn select_video_input(&self, device_id: String) {
        self.run(move |core| async move { core.select_device(&device_id).await });
    }

    /// Volver a enumerar cámaras; la lista fresca llega por el callback
    /// de dispositivos
    pub fn refresh_video_input_devices(&self) {
        self.run(|core| async move { core.refresh_devices().await });
    }

    /// Capturar el frame actual; el data URL llega al callback dado
    pub fn capture(&self, on_captured: Callback<String>) {
        if let Some(core) = self.core() {
            spawn_local(async move {
                match core.capture().await {
                    Ok(data_url) => on_captured.emit(data_url),
                    Err(e) => core.report(e),
                }
            });
        }
    }

    /// Data URL del frame detrás de la última decodificación exitosa
    pub fn capture_last_decoded_picture(&self, on_captured: Callback<String>) {
        if let Some(core) = self.core() {
            spawn_local(async move {
                match core.capture_last_decoded_picture().await {
                    Ok(data_url) => on_captured.emit(data_url),
                    Err(e) => core.report(e),
                }
            });
        }
    }

    // Estado observable instantáneo

    pub fn is_decoding(&self) -> bool {
        self.core
            .borrow()
            .as_ref()
            .map(|core| core.is_decoding())
            .unwrap_or(false)
    }

    pub fn barcode_text(&self) -> String {
        self.core
            .borrow()
            .as_ref()
            .map(|core| core.barcode_text())
            .unwrap_or_default()
    }

    pub fn error_message(&self) -> String {
        self.core
            .borrow()
            .as_ref()
            .map(|core| core.error_message())
            .unwrap_or_default()
    }

    pub fn selected_video_input_id(&self) -> String {
        self.core
            .borrow()
            .as_ref()
            .map(|core| core.selected_video_input_id())
            .unwrap_or_default()
    }
}

#[derive(Properties, PartialEq)]
pub struct BarcodeReaderProps {
    /// Superficie de video provista por el host (montada en el DOM)
    pub video_ref: NodeRef,
    /// Canvas off-screen para capturas
    #[prop_or_default]
    pub canvas_ref: NodeRef,
    /// Hint de ancho del stream; None = sin preferencia
    #[prop_or_default]
    pub stream_width: Option<u32>,
    /// Hint de alto del stream; None = sin preferencia
    #[prop_or_default]
    pub stream_height: Option<u32>,
    /// Guardar el frame de cada decodificación exitosa
    #[prop_or_default]
    pub decoded_picture_capture: bool,
    /// Arrancar la cámara apenas haya dispositivos enumerados
    #[prop_or_default]
    pub start_camera_automatically: bool,
    /// Motor concreto contra el que se enlaza el bridge
    #[prop_or_default]
    pub engine: EngineFlavor,
    /// Acceso imperativo para el host (start/stop/capture/torch/...)
    #[prop_or_default]
    pub handle: Option<BarcodeReaderHandle>,
    #[prop_or_default]
    pub on_barcode_received: Callback<BarcodeReceivedEvent>,
    #[prop_or_default]
    pub on_error_received: Callback<ErrorReceivedEvent>,
    #[prop_or_default]
    pub on_decoding_changed: Callback<DecodingChangedEvent>,
    #[prop_or_default]
    pub on_video_input_devices_changed: Callback<Vec<VideoInputDevice>>,
    #[prop_or_default]
    pub on_selected_video_input_id_changed: Callback<String>,
}

#[function_component(BarcodeReader)]
pub fn barcode_reader(props: &BarcodeReaderProps) -> Html {
    let core_ref = use_mut_ref(|| None::<Rc<ReaderCore>>);

    // Montaje: construir el bridge y correr la secuencia de arranque;
    // el cleanup del efecto libera todo al desmontar
    {
        let core_ref = core_ref.clone();
        let video_ref = props.video_ref.clone();
        let canvas_ref = props.canvas_ref.clone();
        let flavor = props.engine;
        let auto_start = props.start_camera_automatically;
        let picture_capture = props.decoded_picture_capture;
        let stream_hints = (props.stream_width, props.stream_height);
        let handle = props.handle.clone();
        let callbacks = HostCallbacks::from_props(props);

        use_effect_with((), move |_| {
            log::info!("📷 [READER] Inicializando scanner ({:?})...", flavor);
            let core = Rc::new(ReaderCore::new(
                flavor,
                video_ref,
                canvas_ref,
                stream_hints,
                picture_capture,
                callbacks,
            ));
            *core_ref.borrow_mut() = Some(core.clone());
            if let Some(handle) = handle.clone() {
                handle.attach(core.clone());
            }

            {
                let core = core.clone();
                spawn_local(async move {
                    if let Err(e) = core.run_setup(auto_start).await {
                        core.report(e);
                    }
                });
            }

            move || {
                if let Some(handle) = handle {
                    handle.detach();
                }
                core_ref.borrow_mut().take();
                // El orden de teardown relativo al host no está garantizado:
                // liberar en best-effort, nunca propagar
                spawn_local(async move {
                    core.dispose().await;
                });
            }
        });
    }

    // Mantener callbacks y hints de resolución al día con las props
    {
        let core_ref = core_ref.clone();
        let callbacks = HostCallbacks::from_props(props);
        let stream_hints = (props.stream_width, props.stream_height);
        use_effect(move || {
            if let Some(core) = core_ref.borrow().clone() {
                core.update_callbacks(callbacks);
                core.set_stream_hints(stream_hints.0, stream_hints.1);
            }
            || {}
        });
    }

    // Toggle de captura por decodificación: se re-aplica en caliente, sin
    // reiniciar el stream
    {
        let core_ref = core_ref.clone();
        use_effect_with(props.decoded_picture_capture, move |enabled| {
            let enabled = *enabled;
            if let Some(core) = core_ref.borrow().clone() {
                spawn_local(async move {
                    if let Err(e) = core.sync_picture_capture(enabled).await {
                        core.report(e);
                    }
                });
            }
            || {}
        });
    }

    // Componente solo-lógica: las superficies las renderiza el host
    html! {}
}
