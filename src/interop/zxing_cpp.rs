// ============================================================================
// ZXING CPP FFI - Bindings al interop del motor zxing-cpp (build wasm)
// ============================================================================
// Mismo contrato que window.zxingJsInterop pero contra
// window.zxingCppInterop; los dos motores exponen las operaciones por
// nombre con argumentos posicionales.
// ============================================================================

use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, HtmlVideoElement};

#[wasm_bindgen(js_namespace = ["window", "zxingCppInterop"])]
extern "C" {
    #[wasm_bindgen(catch, js_name = listVideoInputDevices)]
    pub async fn list_video_input_devices(filter_kind: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = startDecoding)]
    pub async fn start_decoding(
        video: &HtmlVideoElement,
        width: u32,
        height: u32,
    ) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = stopDecoding)]
    pub async fn stop_decoding() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = getActiveVideoInputDeviceId)]
    pub async fn get_active_video_input_device_id() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = setVideoInputDevice)]
    pub async fn set_video_input_device(device_id: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = capture)]
    pub async fn capture(canvas: &HtmlCanvasElement) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = getLastDecodedPicture)]
    pub async fn get_last_decoded_picture() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = setLastDecodedPictureFormat)]
    pub async fn set_last_decoded_picture_format(format: Option<&str>)
        -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = setTorchOn)]
    pub async fn set_torch_on() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = setTorchOff)]
    pub async fn set_torch_off() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = toggleTorch)]
    pub async fn toggle_torch() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = registerCallbacks)]
    pub fn register_callbacks(
        on_barcode_decoded: &js_sys::Function,
        on_decode_error: &js_sys::Function,
        on_decoding_started: &js_sys::Function,
        on_decoding_stopped: &js_sys::Function,
    ) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_name = unregisterCallbacks)]
    pub fn unregister_callbacks() -> Result<(), JsValue>;
}
