use tracing::Level;
use tracing_subscriber::FmtSubscriber;

// Initializer for logger; diagnostics go to stderr so decoded text on stdout stays clean
pub fn init(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set up the global logger: {err}");
    }
}
