use kvtable::{LoopError, Server, ServerConfig, storage};
use log::info;

fn main() -> Result<(), LoopError> {
    env_logger::builder().init();

    let config = ServerConfig::from_env()?;
    info!("{config:?}");
    storage::init(config.initial_buckets);

    let mut server = Server::bind(config.addr()?)?;
    server.run()
}
