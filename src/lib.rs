// ============================================================================
// YEW BARCODE SCANNER - Componente de escaneo de códigos de barras
// ============================================================================
// Arquitectura:
// - Models: tipos compartidos (dispositivos de video, argumentos de eventos)
// - State: registro de listeners con tokens cancelables
// - Interop: adapter FFI hacia los motores ZXing en JavaScript + bridge
// - Components: componente yew BarcodeReader + handle imperativo
// - Demo: aplicación de ejemplo que compone el componente
// ============================================================================

pub mod components;
pub mod demo;
pub mod interop;
pub mod models;
pub mod state;
pub mod utils;

pub use components::{BarcodeReader, BarcodeReaderHandle, BarcodeReaderProps};
pub use interop::{EngineBackend, EngineFlavor, EventRelay, JsEngine, ScannerBridge, ScannerError};
pub use models::{
    BarcodeReceivedEvent, DecodingChangedEvent, ErrorReceivedEvent, VideoInputDevice,
};
pub use state::{Subscription, SubscriptionSet};
