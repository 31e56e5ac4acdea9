use {
    clap::Parser,
    refflow::{
        config::{AppConfig, SourceKind},
        refresh::{DataSource, HttpCountsSource, LogSink, RefreshOrchestrator, SimulatedSource, Sinks},
        ui::{self, Dashboard},
    },
};

/// Live referrer counts for a resource, refreshed from a producer fleet
#[derive(Debug, Parser)]
#[command(name = "refflow", version, about)]
struct Args {
    /// Report source: http or simulated (overrides COUNTS_SOURCE)
    #[arg(long)]
    source: Option<String>,

    /// Count endpoint URL (overrides COUNTS_ENDPOINT)
    #[arg(long)]
    endpoint: Option<String>,

    /// Resource to follow (overrides ACTIVE_RESOURCE)
    #[arg(long)]
    resource: Option<String>,

    /// Log rankings instead of drawing the dashboard
    #[arg(long, env = "HEADLESS", default_value_t = false)]
    headless: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let args = Args::parse();
    let mut config = AppConfig::from_env()?;

    if let Some(raw) = args.source.as_deref() {
        config.source = SourceKind::parse(raw)
            .ok_or_else(|| anyhow::anyhow!("unknown source '{}', expected http or simulated", raw))?;
    }
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(resource) = args.resource {
        if !config.resources.contains(&resource) {
            config.resources.insert(0, resource.clone());
        }
        config.refresh.active_resource = resource;
        config.refresh.validate()?;
    }

    log::info!("🚀 Starting refflow...");
    log::info!("📊 Configuration:");
    log::info!("   Source: {:?}", config.source);
    log::info!("   Resource: {}", config.refresh.active_resource);
    log::info!(
        "   Interval: {}ms, top {} every {} cycles, window {}s",
        config.refresh.interval_ms,
        config.refresh.top_n_count,
        config.refresh.top_n_every,
        config.refresh.window_seconds
    );

    let source: Box<dyn DataSource> = match config.source {
        SourceKind::Http => {
            log::info!("   Endpoint: {}", config.endpoint);
            Box::new(HttpCountsSource::new(config.endpoint.clone(), config.http_timeout())?)
        }
        SourceKind::Simulated => {
            log::info!("   Simulated hosts: {}", config.simulated_hosts);
            Box::new(SimulatedSource::new(config.simulated_hosts))
        }
    };

    let dashboard = Dashboard::new();
    let sinks = if args.headless {
        Sinks::shared(LogSink::new())
    } else {
        Sinks::shared(dashboard.clone())
    };

    let mut orchestrator = RefreshOrchestrator::new(source, sinks, config.refresh.clone());
    orchestrator.start().await?;

    if args.headless {
        log::info!("✅ Running headless, press Ctrl-C to stop");
        tokio::signal::ctrl_c().await?;
    } else if let Err(e) = ui::run_ui(dashboard, &orchestrator, &config).await {
        log::error!("UI error: {}", e);
    }

    orchestrator.stop();
    orchestrator.join().await;
    log::info!("👋 Shut down");

    Ok(())
}
