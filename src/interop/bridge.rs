// ============================================================================
// SCANNER BRIDGE - Núcleo del interop con el motor de escaneo
// ============================================================================
// Posee exactamente un adapter por instancia de componente. Traduce
// peticiones tipadas en llamadas al motor, convierte las notificaciones push
// en eventos locales tipados y mantiene el estado mutable (dispositivo
// seleccionado, flag de escaneo, último error) coherente bajo ciclos
// repetidos de start/stop/restart y dispose.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::backend::{EngineBackend, EventRelay, NotificationSink};
use super::error::ScannerError;
use crate::models::{
    BarcodeReceivedEvent, DecodingChangedEvent, ErrorReceivedEvent, VideoInputDevice,
};
use crate::state::{EventListeners, Subscription};
use crate::utils::constants::DEVICE_KIND_VIDEO_INPUT;

/// Estado compartido entre el bridge y el relay de notificaciones.
///
/// Las notificaciones escriben directamente sobre este estado: pueden llegar
/// mientras un start/stop sigue en vuelo, así que nada aquí asume exclusión
/// con una operación pendiente.
struct BridgeShared {
    initialized: Cell<bool>,
    lifecycle_busy: Cell<bool>,
    is_decoding: Cell<bool>,
    barcode_text: RefCell<String>,
    error_message: RefCell<String>,
    selected_device_id: RefCell<String>,
    barcode_listeners: EventListeners<BarcodeReceivedEvent>,
    error_listeners: EventListeners<ErrorReceivedEvent>,
    decoding_listeners: EventListeners<DecodingChangedEvent>,
    selected_listeners: EventListeners<String>,
}

impl BridgeShared {
    fn new() -> Self {
        Self {
            initialized: Cell::new(false),
            lifecycle_busy: Cell::new(false),
            is_decoding: Cell::new(false),
            barcode_text: RefCell::new(String::new()),
            error_message: RefCell::new(String::new()),
            selected_device_id: RefCell::new(String::new()),
            barcode_listeners: EventListeners::new(),
            error_listeners: EventListeners::new(),
            decoding_listeners: EventListeners::new(),
            selected_listeners: EventListeners::new(),
        }
    }

    fn set_barcode_text(&self, text: String) {
        *self.barcode_text.borrow_mut() = text.clone();
        self.barcode_listeners.emit(&BarcodeReceivedEvent { text });
    }

    fn set_error_message(&self, message: String) {
        *self.error_message.borrow_mut() = message.clone();
        self.error_listeners.emit(&ErrorReceivedEvent { message });
    }

    /// Flip del flag de escaneo con supresión de notificaciones redundantes
    fn set_decoding(&self, value: bool) {
        let changed = self.is_decoding.get() != value;
        self.is_decoding.set(value);
        if changed {
            self.decoding_listeners
                .emit(&DecodingChangedEvent { is_decoding: value });
        }
    }

    /// Actualizar el dispositivo seleccionado; emite solo si cambió
    fn set_selected_device(&self, device_id: String) {
        if *self.selected_device_id.borrow() == device_id {
            return;
        }
        *self.selected_device_id.borrow_mut() = device_id.clone();
        self.selected_listeners.emit(&device_id);
    }

    fn clear_listeners(&self) {
        self.barcode_listeners.clear();
        self.error_listeners.clear();
        self.decoding_listeners.clear();
        self.selected_listeners.clear();
    }
}

impl NotificationSink for BridgeShared {
    fn barcode_decoded(&self, text: String) {
        log::info!("📱 [BRIDGE] Código decodificado: {}", text);
        self.set_barcode_text(text);
    }

    fn decode_error(&self, message: String) {
        // Error de decodificación: nunca fatal, el loop sigue corriendo
        log::warn!("⚠️ [BRIDGE] Error de decodificación: {}", message);
        self.set_error_message(message);
    }

    fn decoding_started(&self) {
        self.set_decoding(true);
    }

    fn decoding_stopped(&self) {
        self.set_decoding(false);
    }
}

/// Token RAII del guard single-flight de operaciones de ciclo de vida
struct LifecycleGuard {
    shared: Rc<BridgeShared>,
}

impl Drop for LifecycleGuard {
    fn drop(&mut self) {
        self.shared.lifecycle_busy.set(false);
    }
}

/// Bridge entre el componente y el motor de escaneo.
///
/// Las operaciones de ciclo de vida (start/stop/restart) están serializadas
/// por un token single-flight por instancia: una segunda operación mientras
/// otra sigue en vuelo falla con `ScannerError::Busy` en lugar de
/// intercalarse. Las notificaciones push NO pasan por el token.
pub struct ScannerBridge<E: EngineBackend> {
    engine: E,
    shared: Rc<BridgeShared>,
}

impl<E: EngineBackend> ScannerBridge<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            shared: Rc::new(BridgeShared::new()),
        }
    }

    /// Registrar este bridge como receptor de las notificaciones push del
    /// motor. Debe preceder a cualquier otra operación.
    pub fn initialize(&self) -> Result<(), ScannerError> {
        if self.shared.initialized.get() {
            return Err(ScannerError::AlreadyInitialized);
        }
        let relay = EventRelay::new(self.shared.clone());
        self.engine.bind_receiver(relay)?;
        self.shared.initialized.set(true);
        Ok(())
    }

    fn ensure_initialized(&self) -> Result<(), ScannerError> {
        if self.shared.initialized.get() {
            Ok(())
        } else {
            Err(ScannerError::NotInitialized)
        }
    }

    fn acquire_lifecycle(&self) -> Result<LifecycleGuard, ScannerError> {
        if self.shared.lifecycle_busy.get() {
            return Err(ScannerError::Busy);
        }
        self.shared.lifecycle_busy.set(true);
        Ok(LifecycleGuard {
            shared: self.shared.clone(),
        })
    }

    /// Arrancar el loop de decodificación sobre la superficie dada.
    /// width/height son hints de resolución; 0 = sin preferencia.
    pub async fn start(
        &self,
        video: &E::VideoSurface,
        width: u32,
        height: u32,
    ) -> Result<(), ScannerError> {
        self.ensure_initialized()?;
        let _guard = self.acquire_lifecycle()?;
        self.start_inner(video, width, height).await
    }

    async fn start_inner(
        &self,
        video: &E::VideoSurface,
        width: u32,
        height: u32,
    ) -> Result<(), ScannerError> {
        // Un intento nuevo de escaneo descarta el último error
        self.shared.error_message.borrow_mut().clear();
        self.engine.start_decoding(video, width, height).await?;
        // El motor puede haber caído a un dispositivo default distinto del
        // pedido: el id activo que reporta es el autoritativo
        let active = self.engine.active_video_input_device_id().await?;
        self.shared.set_selected_device(active);
        Ok(())
    }

    /// Detener el loop de decodificación y soltar el stream
    pub async fn stop(&self) -> Result<(), ScannerError> {
        self.ensure_initialized()?;
        let _guard = self.acquire_lifecycle()?;
        self.stop_inner().await
    }

    async fn stop_inner(&self) -> Result<(), ScannerError> {
        // Limpiar ANTES de parar: ningún observador debe ver un resultado
        // viejo mientras el motor está a medio detenerse, ni siquiera si el
        // stop falla
        self.shared.set_barcode_text(String::new());
        self.engine.stop_decoding().await
    }

    /// stop() seguido de start() bajo un único token single-flight.
    /// Se usa cuando cambia configuración que afecta al stream en vivo
    /// (dispositivo seleccionado, hints de resolución).
    pub async fn restart(
        &self,
        video: &E::VideoSurface,
        width: u32,
        height: u32,
    ) -> Result<(), ScannerError> {
        self.ensure_initialized()?;
        let _guard = self.acquire_lifecycle()?;
        self.stop_inner().await?;
        self.start_inner(video, width, height).await
    }

    /// Enumerar cámaras disponibles (lista fresca bajo demanda)
    pub async fn list_video_input_devices(&self) -> Result<Vec<VideoInputDevice>, ScannerError> {
        self.ensure_initialized()?;
        self.engine
            .list_video_input_devices(DEVICE_KIND_VIDEO_INPUT)
            .await
    }

    /// Registrar el dispositivo preferido para el próximo start
    pub async fn set_video_input_device(&self, device_id: &str) -> Result<(), ScannerError> {
        self.ensure_initialized()?;
        self.shared.set_selected_device(device_id.to_string());
        self.engine.set_video_input_device(device_id).await
    }

    /// Capturar el frame actual como data URL
    pub async fn capture(&self, canvas: &E::CanvasSurface) -> Result<String, ScannerError> {
        self.ensure_initialized()?;
        self.engine.capture(canvas).await
    }

    /// Data URL del frame detrás de la última decodificación exitosa
    pub async fn last_decoded_picture(&self) -> Result<String, ScannerError> {
        self.ensure_initialized()?;
        self.engine.last_decoded_picture().await
    }

    /// Activar/desactivar la captura por decodificación. No reinicia el
    /// stream ni toca el flag de escaneo.
    pub async fn set_last_decoded_picture_format(
        &self,
        format: Option<&str>,
    ) -> Result<(), ScannerError> {
        self.ensure_initialized()?;
        self.engine.set_last_decoded_picture_format(format).await
    }

    pub async fn set_torch_on(&self) -> Result<(), ScannerError> {
        self.ensure_initialized()?;
        self.engine.set_torch_on().await
    }

    pub async fn set_torch_off(&self) -> Result<(), ScannerError> {
        self.ensure_initialized()?;
        self.engine.set_torch_off().await
    }

    pub async fn toggle_torch(&self) -> Result<(), ScannerError> {
        self.ensure_initialized()?;
        self.engine.toggle_torch().await
    }

    /// Informar un error operativo: actualiza el último error y emite el
    /// evento, igual que un error reportado por el motor
    pub fn report_error(&self, message: String) {
        log::error!("❌ [BRIDGE] {}", message);
        self.shared.set_error_message(message);
    }

    /// Teardown best-effort: siempre completa, nunca propaga.
    /// Si el stop falla igual se libera el receptor de notificaciones.
    pub async fn dispose(&self) {
        if !self.shared.initialized.get() {
            self.shared.clear_listeners();
            return;
        }

        let stopped = match self.acquire_lifecycle() {
            Ok(_guard) => self.stop_inner().await,
            Err(busy) => Err(busy),
        };
        if let Err(e) = stopped {
            // Demasiado tarde para hacer algo al respecto; al menos
            // degradar con gracia
            log::warn!("⚠️ [BRIDGE] stop durante dispose falló: {}", e);
        }

        self.shared.clear_listeners();
        self.engine.release_receiver();
        self.shared.initialized.set(false);
        log::info!("🔌 [BRIDGE] Bridge liberado");
    }

    // ------------------------------------------------------------------
    // Estado observable
    // ------------------------------------------------------------------

    pub fn is_decoding(&self) -> bool {
        self.shared.is_decoding.get()
    }

    pub fn barcode_text(&self) -> String {
        self.shared.barcode_text.borrow().clone()
    }

    pub fn error_message(&self) -> String {
        self.shared.error_message.borrow().clone()
    }

    pub fn selected_video_input_id(&self) -> String {
        self.shared.selected_device_id.borrow().clone()
    }

    // ------------------------------------------------------------------
    // Suscripciones (tokens cancelables; agruparlos en un SubscriptionSet)
    // ------------------------------------------------------------------

    pub fn on_barcode_received<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&BarcodeReceivedEvent) + 'static,
    {
        self.shared.barcode_listeners.add(callback)
    }

    pub fn on_error_received<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ErrorReceivedEvent) + 'static,
    {
        self.shared.error_listeners.add(callback)
    }

    pub fn on_decoding_changed<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&DecodingChangedEvent) + 'static,
    {
        self.shared.decoding_listeners.add(callback)
    }

    pub fn on_selected_device_changed<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&String) + 'static,
    {
        self.shared.selected_listeners.add(callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::pin::Pin;
    use std::task::{Context, Poll, Waker};

    /// Compuerta manual para dejar una operación del motor en vuelo
    #[derive(Clone, Default)]
    struct Gate {
        inner: Rc<GateInner>,
    }

    #[derive(Default)]
    struct GateInner {
        open: Cell<bool>,
        waker: RefCell<Option<Waker>>,
    }

    impl Gate {
        fn new() -> Self {
            Self::default()
        }

        fn open(&self) {
            self.inner.open.set(true);
            if let Some(waker) = self.inner.waker.borrow_mut().take() {
                waker.wake();
            }
        }

        fn wait(&self) -> GateWait {
            GateWait {
                inner: self.inner.clone(),
            }
        }
    }

    struct GateWait {
        inner: Rc<GateInner>,
    }

    impl Future for GateWait {
        type Output = ();

        fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.inner.open.get() {
                Poll::Ready(())
            } else {
                *self.inner.waker.borrow_mut() = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }

    /// Motor falso con fallos programables y notificaciones manuales
    #[derive(Clone, Default)]
    struct MockEngine {
        inner: Rc<MockInner>,
    }

    #[derive(Default)]
    struct MockInner {
        relay: RefCell<Option<EventRelay>>,
        active_device: RefCell<String>,
        preferred_device: RefCell<String>,
        picture_format: RefCell<Option<String>>,
        fail_stop: Cell<bool>,
        fail_start: Cell<bool>,
        released: Cell<u32>,
        start_gate: RefCell<Option<Gate>>,
        calls: RefCell<Vec<String>>,
    }

    impl MockEngine {
        fn new() -> Self {
            Self::default()
        }

        fn relay(&self) -> EventRelay {
            self.inner
                .relay
                .borrow()
                .clone()
                .expect("receiver no registrado")
        }

        fn log_call(&self, name: &str) {
            self.inner.calls.borrow_mut().push(name.to_string());
        }

        fn calls(&self) -> Vec<String> {
            self.inner.calls.borrow().clone()
        }
    }

    impl EngineBackend for MockEngine {
        type VideoSurface = ();
        type CanvasSurface = ();

        fn bind_receiver(&self, relay: EventRelay) -> Result<(), ScannerError> {
            if self.inner.relay.borrow().is_some() {
                return Err(ScannerError::AlreadyInitialized);
            }
            *self.inner.relay.borrow_mut() = Some(relay);
            Ok(())
        }

        fn release_receiver(&self) {
            if self.inner.relay.borrow_mut().take().is_some() {
                self.inner.released.set(self.inner.released.get() + 1);
            }
        }

        async fn list_video_input_devices(
            &self,
            _filter_kind: &str,
        ) -> Result<Vec<VideoInputDevice>, ScannerError> {
            self.log_call("listVideoInputDevices");
            Ok(vec![
                VideoInputDevice {
                    device_id: "A".to_string(),
                    label: "Cam A".to_string(),
                },
                VideoInputDevice {
                    device_id: "B".to_string(),
                    label: "Cam B".to_string(),
                },
            ])
        }

        async fn start_decoding(
            &self,
            _video: &(),
            _width: u32,
            _height: u32,
        ) -> Result<(), ScannerError> {
            self.log_call("startDecoding");
            let gate = self.inner.start_gate.borrow().clone();
            if let Some(gate) = gate {
                gate.wait().await;
            }
            if self.inner.fail_start.get() {
                return Err(ScannerError::invocation_message(
                    "startDecoding",
                    "NotAllowedError",
                ));
            }
            let relay = self.relay();
            relay.decoding_started();
            Ok(())
        }

        async fn stop_decoding(&self) -> Result<(), ScannerError> {
            self.log_call("stopDecoding");
            if self.inner.fail_stop.get() {
                return Err(ScannerError::invocation_message(
                    "stopDecoding",
                    "engine detenido a la fuerza",
                ));
            }
            let relay = self.relay();
            relay.decoding_stopped();
            Ok(())
        }

        async fn active_video_input_device_id(&self) -> Result<String, ScannerError> {
            self.log_call("getActiveVideoInputDeviceId");
            Ok(self.inner.active_device.borrow().clone())
        }

        async fn set_video_input_device(&self, device_id: &str) -> Result<(), ScannerError> {
            self.log_call("setVideoInputDevice");
            *self.inner.preferred_device.borrow_mut() = device_id.to_string();
            Ok(())
        }

        async fn capture(&self, _canvas: &()) -> Result<String, ScannerError> {
            self.log_call("capture");
            Ok("data:image/jpeg;base64,FRAME".to_string())
        }

        async fn last_decoded_picture(&self) -> Result<String, ScannerError> {
            self.log_call("getLastDecodedPicture");
            Ok(String::new())
        }

        async fn set_last_decoded_picture_format(
            &self,
            format: Option<&str>,
        ) -> Result<(), ScannerError> {
            self.log_call("setLastDecodedPictureFormat");
            *self.inner.picture_format.borrow_mut() = format.map(str::to_string);
            Ok(())
        }

        async fn set_torch_on(&self) -> Result<(), ScannerError> {
            self.log_call("setTorchOn");
            Ok(())
        }

        async fn set_torch_off(&self) -> Result<(), ScannerError> {
            self.log_call("setTorchOff");
            Ok(())
        }

        async fn toggle_torch(&self) -> Result<(), ScannerError> {
            self.log_call("toggleTorch");
            Ok(())
        }
    }

    fn initialized_bridge() -> (ScannerBridge<MockEngine>, MockEngine) {
        let engine = MockEngine::new();
        let mock = engine.clone();
        let bridge = ScannerBridge::new(engine);
        bridge.initialize().unwrap();
        (bridge, mock)
    }

    #[tokio::test]
    async fn test_decoding_flag_tracks_notifications_without_duplicates() {
        let (bridge, mock) = initialized_bridge();
        let events = Rc::new(RefCell::new(Vec::new()));

        let sink = events.clone();
        let _sub = bridge.on_decoding_changed(move |e| sink.borrow_mut().push(e.is_decoding));

        assert!(!bridge.is_decoding());
        bridge.start(&(), 0, 0).await.unwrap();
        assert!(bridge.is_decoding());

        // Notificación redundante del mismo tipo: se suprime
        mock.relay().decoding_started();
        assert_eq!(*events.borrow(), vec![true]);

        bridge.stop().await.unwrap();
        assert!(!bridge.is_decoding());
        mock.relay().decoding_stopped();
        assert_eq!(*events.borrow(), vec![true, false]);
    }

    #[tokio::test]
    async fn test_stop_clears_barcode_before_engine_call_even_on_failure() {
        let (bridge, mock) = initialized_bridge();
        bridge.start(&(), 0, 0).await.unwrap();
        mock.relay().barcode_decoded("999".to_string());
        assert_eq!(bridge.barcode_text(), "999");

        let trace = mock.clone();
        let _sub = bridge.on_barcode_received(move |e| {
            trace.log_call(&format!("barcodeEvent:{}", e.text));
        });

        mock.inner.fail_stop.set(true);
        let err = bridge.stop().await.unwrap_err();
        assert!(matches!(err, ScannerError::Invocation { .. }));

        // El texto quedó limpio y el evento vacío salió antes de la llamada
        // al motor
        assert_eq!(bridge.barcode_text(), "");
        let calls = mock.calls();
        let event_at = calls.iter().position(|c| c == "barcodeEvent:").unwrap();
        let stop_at = calls.iter().rposition(|c| c == "stopDecoding").unwrap();
        assert!(event_at < stop_at);
    }

    #[tokio::test]
    async fn test_active_device_reported_by_engine_is_authoritative() {
        let (bridge, mock) = initialized_bridge();
        *mock.inner.active_device.borrow_mut() = "B".to_string();

        let selected = Rc::new(RefCell::new(Vec::new()));
        let sink = selected.clone();
        let _sub = bridge.on_selected_device_changed(move |id| sink.borrow_mut().push(id.clone()));

        bridge.set_video_input_device("A").await.unwrap();
        assert_eq!(bridge.selected_video_input_id(), "A");
        assert_eq!(*mock.inner.preferred_device.borrow(), "A");

        // El motor cayó a "B": el id activo manda y el evento refleja el
        // cambio real
        bridge.start(&(), 0, 0).await.unwrap();
        assert_eq!(bridge.selected_video_input_id(), "B");
        assert_eq!(*selected.borrow(), vec!["A".to_string(), "B".to_string()]);
    }

    #[tokio::test]
    async fn test_selected_device_event_suppressed_when_unchanged() {
        let (bridge, mock) = initialized_bridge();
        *mock.inner.active_device.borrow_mut() = "A".to_string();

        let selected = Rc::new(RefCell::new(Vec::new()));
        let sink = selected.clone();
        let _sub = bridge.on_selected_device_changed(move |id| sink.borrow_mut().push(id.clone()));

        bridge.set_video_input_device("A").await.unwrap();
        bridge.start(&(), 0, 0).await.unwrap();
        // set("A") emitió una vez; el start confirmó el mismo id sin re-emitir
        assert_eq!(*selected.borrow(), vec!["A".to_string()]);
    }

    #[tokio::test]
    async fn test_restart_leaves_no_stale_barcode() {
        let (bridge, mock) = initialized_bridge();
        bridge.start(&(), 0, 0).await.unwrap();
        mock.relay().barcode_decoded("1234567890128".to_string());
        assert_eq!(bridge.barcode_text(), "1234567890128");

        bridge.restart(&(), 0, 0).await.unwrap();

        assert_eq!(bridge.barcode_text(), "");
        // El restart dejó el loop corriendo de nuevo
        assert!(bridge.is_decoding());
    }

    #[tokio::test]
    async fn test_barcode_event_fires_once_then_clears_on_stop() {
        let (bridge, mock) = initialized_bridge();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        let _sub = bridge.on_barcode_received(move |e| sink.borrow_mut().push(e.text.clone()));

        bridge.start(&(), 0, 0).await.unwrap();
        mock.relay().barcode_decoded("1234567890128".to_string());
        assert_eq!(*events.borrow(), vec!["1234567890128".to_string()]);

        bridge.stop().await.unwrap();
        assert_eq!(
            *events.borrow(),
            vec!["1234567890128".to_string(), String::new()]
        );
    }

    #[tokio::test]
    async fn test_picture_format_toggle_does_not_touch_decoding() {
        let (bridge, mock) = initialized_bridge();
        bridge.start(&(), 0, 0).await.unwrap();

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        let _sub = bridge.on_decoding_changed(move |e| sink.borrow_mut().push(e.is_decoding));

        bridge
            .set_last_decoded_picture_format(Some("image/jpeg"))
            .await
            .unwrap();
        bridge.set_last_decoded_picture_format(None).await.unwrap();

        assert!(bridge.is_decoding());
        assert!(events.borrow().is_empty());
        assert_eq!(*mock.inner.picture_format.borrow(), None);
    }

    #[tokio::test]
    async fn test_dispose_releases_receiver_once_despite_stop_failure() {
        let (bridge, mock) = initialized_bridge();
        bridge.start(&(), 0, 0).await.unwrap();
        mock.inner.fail_stop.set(true);

        bridge.dispose().await;
        assert_eq!(mock.inner.released.get(), 1);

        // Dispose repetido: no re-libera ni falla
        bridge.dispose().await;
        assert_eq!(mock.inner.released.get(), 1);
    }

    #[tokio::test]
    async fn test_dispose_clears_subscriptions() {
        let (bridge, mock) = initialized_bridge();
        bridge.start(&(), 0, 0).await.unwrap();

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        let _sub = bridge.on_barcode_received(move |e| sink.borrow_mut().push(e.text.clone()));

        let relay = mock.relay();
        bridge.dispose().await;

        // Un relay rezagado ya no alcanza a ningún suscriptor
        relay.barcode_decoded("tarde".to_string());
        assert!(events.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_lifecycle_ops_require_initialize() {
        let engine = MockEngine::new();
        let bridge = ScannerBridge::new(engine);

        assert_eq!(
            bridge.start(&(), 0, 0).await.unwrap_err(),
            ScannerError::NotInitialized
        );
        assert_eq!(bridge.stop().await.unwrap_err(), ScannerError::NotInitialized);
        assert_eq!(
            bridge.list_video_input_devices().await.unwrap_err(),
            ScannerError::NotInitialized
        );

        bridge.initialize().unwrap();
        assert_eq!(
            bridge.initialize().unwrap_err(),
            ScannerError::AlreadyInitialized
        );
    }

    #[tokio::test]
    async fn test_second_lifecycle_op_fails_busy_while_one_in_flight() {
        let (bridge, mock) = initialized_bridge();
        bridge.start(&(), 0, 0).await.unwrap();
        mock.relay().barcode_decoded("estable".to_string());

        let gate = Gate::new();
        *mock.inner.start_gate.borrow_mut() = Some(gate.clone());

        let restart = async {
            bridge.restart(&(), 0, 0).await.unwrap();
        };
        let concurrent_stop = async {
            let err = bridge.stop().await.unwrap_err();
            assert_eq!(err, ScannerError::Busy);
            gate.open();
        };
        tokio::join!(restart, concurrent_stop);

        // El restart en vuelo completó normalmente después del rechazo
        assert!(bridge.is_decoding());
    }

    #[tokio::test]
    async fn test_notifications_land_while_operation_in_flight() {
        let (bridge, mock) = initialized_bridge();
        bridge.start(&(), 0, 0).await.unwrap();

        let gate = Gate::new();
        *mock.inner.start_gate.borrow_mut() = Some(gate.clone());

        let restart = async {
            bridge.restart(&(), 0, 0).await.unwrap();
        };
        let push_during_flight = async {
            // El restart está esperando al motor; una notificación del loop
            // anterior aterriza igual
            mock.relay().barcode_decoded("durante".to_string());
            assert_eq!(bridge.barcode_text(), "durante");
            gate.open();
        };
        tokio::join!(restart, push_during_flight);
    }

    #[tokio::test]
    async fn test_start_clears_previous_error() {
        let (bridge, mock) = initialized_bridge();
        mock.relay().decode_error("sin luz".to_string());
        assert_eq!(bridge.error_message(), "sin luz");

        bridge.start(&(), 0, 0).await.unwrap();
        assert_eq!(bridge.error_message(), "");
    }

    #[tokio::test]
    async fn test_decode_error_updates_state_without_stopping() {
        let (bridge, mock) = initialized_bridge();
        let errors = Rc::new(RefCell::new(Vec::new()));
        let sink = errors.clone();
        let _sub = bridge.on_error_received(move |e| sink.borrow_mut().push(e.message.clone()));

        bridge.start(&(), 0, 0).await.unwrap();
        mock.relay().decode_error("checksum inválido".to_string());

        assert_eq!(bridge.error_message(), "checksum inválido");
        assert_eq!(*errors.borrow(), vec!["checksum inválido".to_string()]);
        // El loop sigue corriendo
        assert!(bridge.is_decoding());
    }
}
