use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use solarsrv::publish::{MqttPublisher, Publisher};
use solarsrv::{Config, ProxyServer};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[clap(short, long, value_parser, default_value = "config/solarsrv.yml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;
    solarsrv::logging::init(&config.logging.level);
    info!("configuration loaded: {:?}", config);

    let publisher: Option<Arc<dyn Publisher>> = if config.mqtt.enabled {
        Some(Arc::new(MqttPublisher::connect(&config.mqtt)?))
    } else {
        None
    };

    let server = ProxyServer::new(config, publisher);
    server.run().await?;
    Ok(())
}
