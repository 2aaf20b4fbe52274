// ============================================================================
// COMPONENTS - Componentes yew del crate
// ============================================================================

pub mod barcode_reader;

pub use barcode_reader::{BarcodeReader, BarcodeReaderHandle, BarcodeReaderProps};
