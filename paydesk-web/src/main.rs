use paydesk_web::{app::App, config::FrontendConfig, logging};
use yew::Renderer;

fn main() {
    logging::install_panic_hook();

    let config = FrontendConfig::new();
    if let Err(err) = logging::init_logging(config.log_level) {
        web_sys::console::warn_1(&format!("logging already initialised: {err}").into());
    }

    tracing::info!(api = %config.api_base_url, "starting PayDesk admin dashboard");

    Renderer::<App>::new().render();
}
