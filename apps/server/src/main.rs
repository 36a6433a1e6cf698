use anyhow::Context;
use selfhost_kernel::domain::build_info;
use selfhost_kernel::prelude::{AppConfig, CommandLine, load_config};
use selfhost_runtime::{RuntimeConfig, build_runtime_with_config};
use selfhost_server::{Server, init_logger};

fn main() -> anyhow::Result<()> {
    let cfg: AppConfig =
        load_config(&CommandLine::from_env()).context("Critical: Configuration is malformed")?;
    let build = build_info!(env!("CARGO_BIN_NAME"));
    let _log = init_logger(&build, &cfg.logging)?;

    let runtime = build_runtime_with_config(&RuntimeConfig::default())?;
    runtime.block_on(async { Server::builder().config(cfg).build_info(build).build()?.run().await })
}
