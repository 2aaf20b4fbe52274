// ============================================================================
// SCANNER ERROR - Errores de las operaciones del bridge y del adapter
// ============================================================================

use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};

/// Errores de las operaciones del scanner.
///
/// Los errores de decodificación NO pasan por aquí: el motor los reporta
/// como notificaciones push mientras escanea, actualizan el último error y
/// el loop sigue corriendo.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScannerError {
    /// La llamada al contexto JS fue rechazada o el contexto no responde
    #[error("la llamada '{call}' al motor falló: {message}")]
    Invocation { call: &'static str, message: String },

    /// Operación invocada antes de initialize() (error de programación,
    /// se expone en lugar de tragarse)
    #[error("el bridge no está inicializado")]
    NotInitialized,

    /// initialize() con un receiver ya registrado; registrar dos veces sin
    /// liberar filtraría la referencia del lado JS
    #[error("el receiver de notificaciones ya está registrado")]
    AlreadyInitialized,

    /// Guard single-flight: ya hay una operación de ciclo de vida en curso
    /// sobre esta instancia
    #[error("ya hay una operación de cámara en curso")]
    Busy,

    /// La superficie de render provista por el host no está montada en el DOM
    #[error("la superficie '{0}' no está montada en el DOM")]
    SurfaceUnavailable(&'static str),
}

impl ScannerError {
    /// Construir un error de invocación desde el valor JS rechazado
    pub fn invocation(call: &'static str, err: JsValue) -> Self {
        Self::Invocation {
            call,
            message: js_error_message(&err),
        }
    }

    /// Error de invocación con mensaje ya formateado
    pub fn invocation_message(call: &'static str, message: impl Into<String>) -> Self {
        Self::Invocation {
            call,
            message: message.into(),
        }
    }
}

/// Extraer un mensaje legible de un valor de error JS
pub(crate) fn js_error_message(err: &JsValue) -> String {
    if let Some(text) = err.as_string() {
        return text;
    }
    match err.dyn_ref::<js_sys::Error>() {
        Some(error) => String::from(error.message()),
        None => format!("{:?}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_display_includes_call_and_message() {
        let err = ScannerError::invocation_message("startDecoding", "NotAllowedError");
        let text = err.to_string();
        assert!(text.contains("startDecoding"));
        assert!(text.contains("NotAllowedError"));
    }
}
