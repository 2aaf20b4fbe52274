/// Kind de MediaDevices que filtra el motor al enumerar cámaras
pub const DEVICE_KIND_VIDEO_INPUT: &str = "videoinput";

/// Formato de imagen usado cuando la captura por decodificación está activa
pub const DECODED_PICTURE_FORMAT: &str = "image/jpeg";

/// Hint de dimensión "sin preferencia" para el stream de video
pub const NO_DIMENSION_PREFERENCE: u32 = 0;
