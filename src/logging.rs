use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialise logging. The default level is `info`; `debug` is enabled via
/// the settings file, in which case `RUST_LOG` may override it. When
/// `log_file` is given, events are also written to that file without ANSI
/// colouring.
pub fn init(debug: bool, log_file: Option<PathBuf>) {
    // Without debug logging `info` is forced so a stray `RUST_LOG` in the
    // user's environment cannot turn on verbose output.
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };

    let file_layer = log_file.as_deref().and_then(file_writer).map(|writer| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(writer)
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init();
}

fn file_writer(path: &Path) -> Option<tracing_appender::rolling::RollingFileAppender> {
    let file_name = path.file_name()?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Some(tracing_appender::rolling::never(dir, file_name))
}
