use tracing_subscriber::EnvFilter;

mod acquire;
mod config;
mod library;
mod mpris;
mod player;
mod runtime;
mod store;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = runtime::run() {
        eprintln!("vivace: {e}");
        std::process::exit(1);
    }
}
