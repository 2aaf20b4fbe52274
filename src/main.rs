use yew_barcode_scanner::demo::DemoApp;

fn main() {
    // Panic hook para debugging legible en la consola del navegador
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("🚀 Barcode Scanner Demo iniciando...");

    yew::Renderer::<DemoApp>::new().render();
}
