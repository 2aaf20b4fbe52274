// Tipos compartidos entre el bridge y la aplicación host

pub mod device;
pub mod events;

pub use device::VideoInputDevice;
pub use events::{BarcodeReceivedEvent, DecodingChangedEvent, ErrorReceivedEvent};
