use anyhow::Context;
use fhub::domain::config::ApiConfig;
use fhub::kernel::config::load_config;
use fhub_logger::Logger;
use fhub_server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg: ApiConfig = load_config(Some("server")).context("Critical: Configuration is malformed")?;

    let logging = &cfg.logging;
    let _log = Logger::builder(env!("CARGO_PKG_NAME"))
        .level(logging.level.clone())
        .filter(logging.filter.clone())
        .dir(logging.dir.clone())
        .json(logging.json)
        .init()?;

    Server::builder().config(cfg).build().await?.run().await
}
