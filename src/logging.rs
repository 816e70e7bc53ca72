use std::io;

/// Initialize tracing. Logs go to stderr so stdout stays clean for output.
///
/// `RUST_LOG` takes precedence over the verbosity level when set.
pub fn setup_logging(verbose_level: u8) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let filter_str = match verbose_level {
            0 => "warn,agri_assistant=info",
            1 => "info,agri_assistant=debug",
            _ => "debug,agri_assistant=trace",
        };
        tracing_subscriber::EnvFilter::new(filter_str)
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .with_writer(io::stderr)
        .init();
}
