// Entrypoint for the CLI application.
// - Keeps `main` small: resolve configuration, start logging, build the API
//   client and hand it to the UI loop.

use audiolib_cli::{api::ApiClient, config::Config, logging, ui::main_menu};

fn main() -> anyhow::Result<()> {
    // Defaults, then ~/.config/audiolib/config.json, then AUDIOLIB_* vars.
    let config = Config::load()?;
    logging::init(&config.log_level);
    tracing::debug!(?config, "configuration resolved");

    let api = ApiClient::new(&config)?;

    // Blocks until the user exits.
    main_menu(api, &config)?;
    Ok(())
}
