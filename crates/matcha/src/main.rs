//! matcha: stellar-to-halo abundance matching across redshift.

use matcha_lib::{app, config, errors};

fn main() {
    let config = config::AppConfig::parse();

    let level = if config.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    if let Err(err) = app::run(&config) {
        matcha_cli::ui::print_error(&format!("{err:#}"));
        std::process::exit(errors::handle_error(&err));
    }
}
