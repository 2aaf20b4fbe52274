// ============================================================================
// INTEROP - Adapter FFI y bridge hacia el motor de escaneo en JavaScript
// ============================================================================

pub mod backend;
pub mod bridge;
pub mod engine;
pub mod error;
pub mod zxing_cpp;
pub mod zxing_js;

pub use backend::{EngineBackend, EventRelay, NotificationSink};
pub use bridge::ScannerBridge;
pub use engine::{EngineFlavor, JsEngine};
pub use error::ScannerError;
