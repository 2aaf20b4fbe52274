// ============================================================================
// DEMO APP - Aplicación de ejemplo del escáner
// ============================================================================
// Composición de referencia: el host renderiza el <video>, el <canvas> y
// los controles, y habla con el componente vía props + handle imperativo.
// ============================================================================

use yew::prelude::*;

use crate::components::{BarcodeReader, BarcodeReaderHandle};
use crate::models::{
    BarcodeReceivedEvent, DecodingChangedEvent, ErrorReceivedEvent, VideoInputDevice,
};

#[function_component(DemoApp)]
pub fn demo_app() -> Html {
    let video_ref = use_node_ref();
    let canvas_ref = use_node_ref();
    let handle = use_mut_ref(BarcodeReaderHandle::new).borrow().clone();

    let barcode_text = use_state(String::new);
    let last_error = use_state(String::new);
    let is_decoding = use_state(|| false);
    let devices = use_state(Vec::<VideoInputDevice>::new);
    let selected_id = use_state(String::new);
    let img_src = use_state(String::new);
    let current_idx = use_state(|| 0_usize);

    // Al leer un código: mostrarlo y detener el escaneo
    let on_barcode = {
        let barcode_text = barcode_text.clone();
        let handle = handle.clone();
        Callback::from(move |e: BarcodeReceivedEvent| {
            if e.text.is_empty() {
                return;
            }
            log::info!("📱 Código escaneado: {}", e.text);
            barcode_text.set(e.text);
            handle.stop_decoding();
        })
    };

    let on_error = {
        let last_error = last_error.clone();
        Callback::from(move |e: ErrorReceivedEvent| last_error.set(e.message))
    };

    let on_decoding = {
        let is_decoding = is_decoding.clone();
        Callback::from(move |e: DecodingChangedEvent| is_decoding.set(e.is_decoding))
    };

    let on_devices = {
        let devices = devices.clone();
        Callback::from(move |list: Vec<VideoInputDevice>| {
            log::info!("✅ Cámaras disponibles: {}", list.len());
            devices.set(list);
        })
    };

    let on_selected = {
        let selected_id = selected_id.clone();
        Callback::from(move |id: String| selected_id.set(id))
    };

    let on_start = {
        let handle = handle.clone();
        Callback::from(move |_: MouseEvent| handle.start_decoding())
    };
    let on_stop = {
        let handle = handle.clone();
        Callback::from(move |_: MouseEvent| handle.stop_decoding())
    };
    let on_torch = {
        let handle = handle.clone();
        Callback::from(move |_: MouseEvent| handle.toggle_torch())
    };
    let on_capture = {
        let handle = handle.clone();
        let img_src = img_src.clone();
        Callback::from(move |_: MouseEvent| {
            let img_src = img_src.clone();
            handle.capture(Callback::from(move |data_url: String| img_src.set(data_url)));
        })
    };

    // Ciclar a la siguiente cámara enumerada
    let on_next_device = {
        let handle = handle.clone();
        let devices = devices.clone();
        let current_idx = current_idx.clone();
        Callback::from(move |_: MouseEvent| {
            if devices.is_empty() {
                return;
            }
            let next = (*current_idx + 1) % devices.len();
            current_idx.set(next);
            if let Some(device) = devices.get(next) {
                handle.select_video_input(device.device_id.clone());
            }
        })
    };

    let selected_label = devices
        .iter()
        .find(|d| d.device_id == *selected_id)
        .map(|d| d.label.clone())
        .unwrap_or_else(|| "buscando cámaras...".to_string());

    html! {
        <div class="scanner-demo">
            <h2>{"Escanear código de barras desde la cámara"}</h2>

            <video ref={video_ref.clone()} width="640" height="480" />
            <canvas ref={canvas_ref.clone()} style="display: none;" />

            <BarcodeReader
                video_ref={video_ref.clone()}
                canvas_ref={canvas_ref.clone()}
                stream_width={Some(720)}
                stream_height={Some(540)}
                start_camera_automatically={true}
                handle={Some(handle.clone())}
                on_barcode_received={on_barcode}
                on_error_received={on_error}
                on_decoding_changed={on_decoding}
                on_video_input_devices_changed={on_devices}
                on_selected_video_input_id_changed={on_selected}
            />

            <div class="scanner-status">
                <p>
                    {"Cámara: "}{selected_label}
                    {format!(" ({} disponibles)", devices.len())}
                </p>
                <p>{"Último código: "}<strong>{(*barcode_text).clone()}</strong></p>
                {
                    if !last_error.is_empty() {
                        html! { <p class="scanner-error">{"Error: "}{(*last_error).clone()}</p> }
                    } else {
                        html! {}
                    }
                }
            </div>

            <div class="scanner-controls">
                // Deshabilitar el control que dispara la operación mientras
                // la anterior sigue en vuelo
                <button onclick={on_start} disabled={*is_decoding}>{"Iniciar"}</button>
                <button onclick={on_stop} disabled={!*is_decoding}>{"Detener"}</button>
                <button onclick={on_torch}>{"Linterna"}</button>
                <button onclick={on_capture}>{"Capturar"}</button>
                <button onclick={on_next_device}>{"Siguiente cámara"}</button>
            </div>

            {
                if !img_src.is_empty() {
                    html! { <img src={(*img_src).clone()} alt="captura" /> }
                } else {
                    html! {}
                }
            }
        </div>
    }
}
