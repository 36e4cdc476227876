mod app;
mod cli;

use tracing_subscriber::EnvFilter;

fn main() {
    let cli = cli::parse();

    // RUST_LOG wins; otherwise -v switches to debug
    let default_level = if cli.verbose { "clipjoin=debug" } else { "clipjoin=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    app::run(cli);
}
