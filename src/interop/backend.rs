// ============================================================================
// ENGINE BACKEND - Capacidades del motor de escaneo + relay de notificaciones
// ============================================================================
// El bridge es polimórfico sobre este trait: el motor concreto (zxing-js o
// zxing-cpp compilado a wasm) se elige al construir el adapter, y los tests
// inyectan un motor falso sin tocar el contexto JS.
// ============================================================================

use std::rc::Rc;

use super::error::ScannerError;
use crate::models::VideoInputDevice;

/// Destino de las notificaciones push del motor
pub trait NotificationSink {
    fn barcode_decoded(&self, text: String);
    fn decode_error(&self, message: String);
    fn decoding_started(&self);
    fn decoding_stopped(&self);
}

/// Receptor registrado en el motor.
///
/// El motor lo invoca desde su propio turno del event loop: una notificación
/// puede llegar mientras un start/stop del mismo bridge sigue esperando su
/// resultado, así que el sink escribe estado directamente, sin asumir
/// exclusión con la operación en vuelo.
#[derive(Clone)]
pub struct EventRelay {
    sink: Rc<dyn NotificationSink>,
}

impl EventRelay {
    pub fn new(sink: Rc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    pub fn barcode_decoded(&self, text: String) {
        self.sink.barcode_decoded(text);
    }

    pub fn decode_error(&self, message: String) {
        self.sink.decode_error(message);
    }

    pub fn decoding_started(&self) {
        self.sink.decoding_started();
    }

    pub fn decoding_stopped(&self) {
        self.sink.decoding_stopped();
    }
}

/// Conjunto de capacidades del motor de escaneo en el contexto foráneo.
///
/// Todas las operaciones son asíncronas y pueden fallar con un error de
/// invocación si el contexto JS rechaza la llamada o no está disponible.
#[allow(async_fn_in_trait)]
pub trait EngineBackend {
    /// Superficie de video donde el motor engancha el stream de la cámara
    type VideoSurface;
    /// Superficie off-screen donde el motor renderiza capturas
    type CanvasSurface;

    /// Registrar el receptor de notificaciones push.
    /// Exactamente un registro vivo por adapter; registrar de nuevo sin
    /// liberar es un error de precondición.
    fn bind_receiver(&self, relay: EventRelay) -> Result<(), ScannerError>;

    /// Liberar el receptor registrado. Idempotente: liberar sin registro
    /// previo no hace nada.
    fn release_receiver(&self);

    /// Enumerar cámaras disponibles del kind indicado
    async fn list_video_input_devices(
        &self,
        filter_kind: &str,
    ) -> Result<Vec<VideoInputDevice>, ScannerError>;

    /// Pedir el stream de cámara (width/height son hints; 0 = sin
    /// preferencia), engancharlo a la superficie y arrancar el loop de
    /// decodificación. Solo válido si no se está decodificando ya.
    async fn start_decoding(
        &self,
        video: &Self::VideoSurface,
        width: u32,
        height: u32,
    ) -> Result<(), ScannerError>;

    /// Detener el loop y soltar el stream. Idempotente.
    async fn stop_decoding(&self) -> Result<(), ScannerError>;

    /// Id del dispositivo que el motor abrió realmente (puede diferir del
    /// pedido si el motor cayó a un default)
    async fn active_video_input_device_id(&self) -> Result<String, ScannerError>;

    /// Registrar el dispositivo preferido para el próximo start; no arranca
    /// ni detiene nada por sí mismo
    async fn set_video_input_device(&self, device_id: &str) -> Result<(), ScannerError>;

    /// Renderizar el frame actual al canvas y devolverlo como data URL
    async fn capture(&self, canvas: &Self::CanvasSurface) -> Result<String, ScannerError>;

    /// Data URL del frame detrás de la última decodificación exitosa;
    /// vacío si la captura por decodificación está desactivada
    async fn last_decoded_picture(&self) -> Result<String, ScannerError>;

    /// Activar (mime type) o desactivar (None) la captura por decodificación
    async fn set_last_decoded_picture_format(
        &self,
        format: Option<&str>,
    ) -> Result<(), ScannerError>;

    async fn set_torch_on(&self) -> Result<(), ScannerError>;

    async fn set_torch_off(&self) -> Result<(), ScannerError>;

    async fn toggle_torch(&self) -> Result<(), ScannerError>;
}
