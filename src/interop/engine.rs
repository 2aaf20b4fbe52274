// ============================================================================
// JS ENGINE - Adapter sobre los motores ZXing del lado JavaScript
// ============================================================================
// Un único adapter para los dos sabores del motor (zxing-js y zxing-cpp
// compilado a wasm). El sabor se elige al construir; el resto del crate solo
// ve las capacidades de EngineBackend.
// ============================================================================

use std::cell::RefCell;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlCanvasElement, HtmlVideoElement};

use super::backend::{EngineBackend, EventRelay};
use super::error::{js_error_message, ScannerError};
use super::{zxing_cpp, zxing_js};
use crate::models::VideoInputDevice;

/// Motor concreto contra el que se enlaza el adapter
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EngineFlavor {
    #[default]
    ZxingJs,
    ZxingCpp,
}

/// Closures registradas en el lado JS.
/// Se mantienen vivas mientras el registro esté activo; al soltarlas se
/// libera la referencia que el motor guarda. No usar forget(): estas
/// closures deben morir exactamente una vez, en release_receiver.
struct EngineCallbacks {
    _on_barcode: Closure<dyn FnMut(String)>,
    _on_error: Closure<dyn FnMut(String)>,
    _on_started: Closure<dyn FnMut()>,
    _on_stopped: Closure<dyn FnMut()>,
}

/// Handle del motor de escaneo en el navegador
pub struct JsEngine {
    flavor: EngineFlavor,
    callbacks: RefCell<Option<EngineCallbacks>>,
}

impl JsEngine {
    pub fn new(flavor: EngineFlavor) -> Self {
        Self {
            flavor,
            callbacks: RefCell::new(None),
        }
    }

    pub fn flavor(&self) -> EngineFlavor {
        self.flavor
    }

    /// Interpretar el resultado de una operación que devuelve string
    fn expect_string(call: &'static str, value: JsValue) -> Result<String, ScannerError> {
        value
            .as_string()
            .ok_or_else(|| ScannerError::invocation_message(call, "el motor no devolvió un string"))
    }
}

impl Default for JsEngine {
    fn default() -> Self {
        Self::new(EngineFlavor::default())
    }
}

impl EngineBackend for JsEngine {
    type VideoSurface = HtmlVideoElement;
    type CanvasSurface = HtmlCanvasElement;

    fn bind_receiver(&self, relay: EventRelay) -> Result<(), ScannerError> {
        if self.callbacks.borrow().is_some() {
            return Err(ScannerError::AlreadyInitialized);
        }

        let on_barcode = {
            let relay = relay.clone();
            Closure::wrap(Box::new(move |text: String| {
                relay.barcode_decoded(text);
            }) as Box<dyn FnMut(String)>)
        };
        let on_error = {
            let relay = relay.clone();
            Closure::wrap(Box::new(move |message: String| {
                relay.decode_error(message);
            }) as Box<dyn FnMut(String)>)
        };
        let on_started = {
            let relay = relay.clone();
            Closure::wrap(Box::new(move || {
                relay.decoding_started();
            }) as Box<dyn FnMut()>)
        };
        let on_stopped = {
            let relay = relay.clone();
            Closure::wrap(Box::new(move || {
                relay.decoding_stopped();
            }) as Box<dyn FnMut()>)
        };

        let registered = match self.flavor {
            EngineFlavor::ZxingJs => zxing_js::register_callbacks(
                on_barcode.as_ref().unchecked_ref(),
                on_error.as_ref().unchecked_ref(),
                on_started.as_ref().unchecked_ref(),
                on_stopped.as_ref().unchecked_ref(),
            ),
            EngineFlavor::ZxingCpp => zxing_cpp::register_callbacks(
                on_barcode.as_ref().unchecked_ref(),
                on_error.as_ref().unchecked_ref(),
                on_started.as_ref().unchecked_ref(),
                on_stopped.as_ref().unchecked_ref(),
            ),
        };
        registered.map_err(|e| ScannerError::invocation("registerCallbacks", e))?;

        *self.callbacks.borrow_mut() = Some(EngineCallbacks {
            _on_barcode: on_barcode,
            _on_error: on_error,
            _on_started: on_started,
            _on_stopped: on_stopped,
        });
        log::info!("✅ [ENGINE] Callbacks registrados en {:?}", self.flavor);
        Ok(())
    }

    fn release_receiver(&self) {
        if self.callbacks.borrow_mut().take().is_none() {
            return;
        }
        let unregistered = match self.flavor {
            EngineFlavor::ZxingJs => zxing_js::unregister_callbacks(),
            EngineFlavor::ZxingCpp => zxing_cpp::unregister_callbacks(),
        };
        if let Err(e) = unregistered {
            log::warn!(
                "⚠️ [ENGINE] unregisterCallbacks falló: {}",
                js_error_message(&e)
            );
        } else {
            log::info!("🔌 [ENGINE] Callbacks liberados de {:?}", self.flavor);
        }
    }

    async fn list_video_input_devices(
        &self,
        filter_kind: &str,
    ) -> Result<Vec<VideoInputDevice>, ScannerError> {
        let value = match self.flavor {
            EngineFlavor::ZxingJs => zxing_js::list_video_input_devices(filter_kind).await,
            EngineFlavor::ZxingCpp => zxing_cpp::list_video_input_devices(filter_kind).await,
        }
        .map_err(|e| ScannerError::invocation("listVideoInputDevices", e))?;

        // El motor serializa la lista como JSON a través del boundary
        let json = Self::expect_string("listVideoInputDevices", value)?;
        serde_json::from_str(&json).map_err(|e| {
            ScannerError::invocation_message(
                "listVideoInputDevices",
                format!("respuesta inválida del motor: {}", e),
            )
        })
    }

    async fn start_decoding(
        &self,
        video: &HtmlVideoElement,
        width: u32,
        height: u32,
    ) -> Result<(), ScannerError> {
        match self.flavor {
            EngineFlavor::ZxingJs => zxing_js::start_decoding(video, width, height).await,
            EngineFlavor::ZxingCpp => zxing_cpp::start_decoding(video, width, height).await,
        }
        .map_err(|e| ScannerError::invocation("startDecoding", e))?;
        Ok(())
    }

    async fn stop_decoding(&self) -> Result<(), ScannerError> {
        match self.flavor {
            EngineFlavor::ZxingJs => zxing_js::stop_decoding().await,
            EngineFlavor::ZxingCpp => zxing_cpp::stop_decoding().await,
        }
        .map_err(|e| ScannerError::invocation("stopDecoding", e))?;
        Ok(())
    }

    async fn active_video_input_device_id(&self) -> Result<String, ScannerError> {
        let value = match self.flavor {
            EngineFlavor::ZxingJs => zxing_js::get_active_video_input_device_id().await,
            EngineFlavor::ZxingCpp => zxing_cpp::get_active_video_input_device_id().await,
        }
        .map_err(|e| ScannerError::invocation("getActiveVideoInputDeviceId", e))?;
        // Un motor sin dispositivo abierto reporta vacío
        Ok(value.as_string().unwrap_or_default())
    }

    async fn set_video_input_device(&self, device_id: &str) -> Result<(), ScannerError> {
        match self.flavor {
            EngineFlavor::ZxingJs => zxing_js::set_video_input_device(device_id).await,
            EngineFlavor::ZxingCpp => zxing_cpp::set_video_input_device(device_id).await,
        }
        .map_err(|e| ScannerError::invocation("setVideoInputDevice", e))?;
        Ok(())
    }

    async fn capture(&self, canvas: &HtmlCanvasElement) -> Result<String, ScannerError> {
        let value = match self.flavor {
            EngineFlavor::ZxingJs => zxing_js::capture(canvas).await,
            EngineFlavor::ZxingCpp => zxing_cpp::capture(canvas).await,
        }
        .map_err(|e| ScannerError::invocation("capture", e))?;
        Self::expect_string("capture", value)
    }

    async fn last_decoded_picture(&self) -> Result<String, ScannerError> {
        let value = match self.flavor {
            EngineFlavor::ZxingJs => zxing_js::get_last_decoded_picture().await,
            EngineFlavor::ZxingCpp => zxing_cpp::get_last_decoded_picture().await,
        }
        .map_err(|e| ScannerError::invocation("getLastDecodedPicture", e))?;
        // Vacío cuando la captura por decodificación está desactivada
        Ok(value.as_string().unwrap_or_default())
    }

    async fn set_last_decoded_picture_format(
        &self,
        format: Option<&str>,
    ) -> Result<(), ScannerError> {
        match self.flavor {
            EngineFlavor::ZxingJs => zxing_js::set_last_decoded_picture_format(format).await,
            EngineFlavor::ZxingCpp => zxing_cpp::set_last_decoded_picture_format(format).await,
        }
        .map_err(|e| ScannerError::invocation("setLastDecodedPictureFormat", e))?;
        Ok(())
    }

    async fn set_torch_on(&self) -> Result<(), ScannerError> {
        match self.flavor {
            EngineFlavor::ZxingJs => zxing_js::set_torch_on().await,
            EngineFlavor::ZxingCpp => zxing_cpp::set_torch_on().await,
        }
        .map_err(|e| ScannerError::invocation("setTorchOn", e))?;
        Ok(())
    }

    async fn set_torch_off(&self) -> Result<(), ScannerError> {
        match self.flavor {
            EngineFlavor::ZxingJs => zxing_js::set_torch_off().await,
            EngineFlavor::ZxingCpp => zxing_cpp::set_torch_off().await,
        }
        .map_err(|e| ScannerError::invocation("setTorchOff", e))?;
        Ok(())
    }

    async fn toggle_torch(&self) -> Result<(), ScannerError> {
        match self.flavor {
            EngineFlavor::ZxingJs => zxing_js::toggle_torch().await,
            EngineFlavor::ZxingCpp => zxing_cpp::toggle_torch().await,
        }
        .map_err(|e| ScannerError::invocation("toggleTorch", e))?;
        Ok(())
    }
}
