use clap::Parser;
use neurosignet::{
    Application, Config,
    config::{Args, Command},
    installer::Installer,
    telemetry,
};

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before anything else that might build a TLS client
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    // Parse CLI args
    let args = Args::parse();

    // Load configuration
    let config = Config::load(&args)?;

    // If --validate flag is set, exit successfully after config validation
    if args.validate {
        println!("Configuration is valid.");
        return Ok(());
    }

    // Initialize telemetry (tracing + optional OpenTelemetry)
    telemetry::init_telemetry(config.enable_otel_export)?;

    tracing::debug!("{:?}", args);

    if let Some(Command::Install { dir, shortcut_dir, force }) = args.command {
        let report = Installer::builder()
            .root(dir)
            .config(config)
            .maybe_shortcut_dir(shortcut_dir)
            .force(force)
            .build()
            .run()
            .await?;
        println!("{}", report.summary());
        return Ok(());
    }

    // Run the application with graceful shutdown on SIGTERM/Ctrl+C
    Application::new(config).await?.serve(shutdown_signal()).await
}
