use autoclaim::config::LoggingConfig;
use tokio::signal;
use tracing::error;
use tracing_subscriber::EnvFilter;

pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::Layer;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},reqwest=warn", config.level)));

    // `tracing_appender::rolling::daily` panics if it can't create the initial
    // log file, so writability is checked first.
    let file_layer = config.dir.as_deref().and_then(|log_dir| {
        if let Err(e) = std::fs::create_dir_all(log_dir) {
            eprintln!(
                "Warning: Could not create log directory {} ({}), file logging disabled",
                log_dir, e
            );
            return None;
        }

        let test_path = std::path::Path::new(log_dir).join(".autoclaim_write_test");
        if let Err(e) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&test_path)
        {
            eprintln!(
                "Warning: Could not write to log directory {} ({}), file logging disabled",
                log_dir, e
            );
            return None;
        }
        let _ = std::fs::remove_file(&test_path);

        let file_appender = tracing_appender::rolling::daily(log_dir, "autoclaim.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // Keep the guard alive for the lifetime of the daemon
        Box::leak(Box::new(guard));

        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
    });

    let console_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed()
    };

    let file_logging_enabled = file_layer.is_some();
    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    if let (true, Some(dir)) = (file_logging_enabled, config.dir.as_deref()) {
        eprintln!("Logging to: {}/autoclaim.log", dir);
    }
}

pub fn init_logging_simple() {
    // Minimal logging for one-shot commands
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .try_init();
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
