// ============================================================================
// EVENTOS - Argumentos de los eventos publicados hacia la aplicación host
// ============================================================================

/// Último código decodificado. Se sobrescribe con cada lectura nueva y se
/// limpia (string vacío) cuando el escaneo se detiene.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BarcodeReceivedEvent {
    pub text: String,
}

/// Último fallo reportado. Se limpia cuando comienza un intento nuevo de
/// escaneo; no hay historial de errores.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorReceivedEvent {
    pub message: String,
}

/// Cambio del flag de escaneo activo. Solo se emite cuando el valor
/// realmente cambió; las notificaciones redundantes del motor se suprimen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodingChangedEvent {
    pub is_decoding: bool,
}
