mod commands;
mod terminal;

use std::sync::Arc;

use anyhow::Context;
use commands::{CommandLine, Commands, clear, history, monitor, scan, watch};
use subtrack_common::config::Config;
use subtrack_common::ports::{MetadataProber, MonitorBackend};
use subtrack_core::{Aggregator, Engine, LocalMonitor};
use subtrack_protocols::{HttpProber, JsonFileStore, RemoteMonitor};
use terminal::{logging, print};

/// The engine and, when no remote service is configured, the in-process
/// monitor backing it.
pub struct Runtime {
    pub engine: Engine,
    pub local_monitor: Option<Arc<LocalMonitor>>,
}

fn build_runtime(cfg: &Config) -> anyhow::Result<Runtime> {
    let sources = subtrack_protocols::default_sources(cfg).context("setting up discovery sources")?;
    let aggregator = Arc::new(Aggregator::new(sources, cfg.source_timeout));

    let prober: Option<Arc<dyn MetadataProber>> = if cfg.no_probe {
        None
    } else {
        let prober = HttpProber::new().context("setting up the metadata prober")?;
        Some(Arc::new(prober) as Arc<dyn MetadataProber>)
    };

    let (backend, local_monitor): (Arc<dyn MonitorBackend>, Option<Arc<LocalMonitor>>) =
        match cfg.monitor_url.as_deref() {
            Some(url) => {
                let client = subtrack_protocols::api_client(cfg.source_timeout)?;
                let remote = Arc::new(RemoteMonitor::new(client, url)?);
                (remote as Arc<dyn MonitorBackend>, None)
            }
            None => {
                let local = Arc::new(LocalMonitor::new(aggregator.clone()));
                (local.clone() as Arc<dyn MonitorBackend>, Some(local))
            }
        };

    let persistence = Box::new(JsonFileStore::new(cfg.state_file.clone()));
    let engine = Engine::new(cfg, aggregator, prober, backend, persistence);

    Ok(Runtime {
        engine,
        local_monitor,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging();

    let cfg: Config = commands.config();
    cfg.validate()?;
    print::banner(cfg.quiet);

    let runtime: Runtime = build_runtime(&cfg)?;

    let result = match commands.command {
        Commands::Scan { domain, .. } => {
            print::header("discovering subdomains", cfg.quiet);
            scan::scan(&domain, &runtime.engine, &cfg).await
        }
        Commands::History { domain } => {
            print::header("scan history", cfg.quiet);
            history::history(domain.as_deref(), &runtime.engine, &cfg).await
        }
        Commands::Monitor { domain, enable, .. } => {
            print::header("monitoring", cfg.quiet);
            monitor::monitor(&domain, enable, &runtime.engine, &cfg).await
        }
        Commands::Watch { domains, .. } => {
            print::header("watching for new assets", cfg.quiet);
            watch::watch(&domains, &runtime, &cfg).await
        }
        Commands::Clear => clear::clear(&runtime.engine).await,
    };

    print::end_of_program();
    result
}
