pub mod client;
pub mod form;
pub mod render;

pub use client::DashboardClient;
pub use form::DashboardForm;

use crate::config::ClientConfig;

/// One request/render cycle. Returns whether a price was shown.
pub async fn run(config: &ClientConfig, form: &DashboardForm) -> bool {
    if let Err(e) = form.validate() {
        eprintln!("Invalid input: {}", e);
        return false;
    }

    let result = match DashboardClient::new(config) {
        Ok(client) => client.predict_simple(&form.to_simple_input()).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(prediction) => {
            print!("{}", render::render_prediction(form, &prediction));
            true
        }
        Err(e) => {
            eprintln!("{}", render::render_error(&e));
            false
        }
    }
}
