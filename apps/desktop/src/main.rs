#![windows_subsystem = "windows"]

use anyhow::Context;
use selfhost_desktop::{Bootstrap, MainWindow};
use selfhost_kernel::domain::build_info;
use selfhost_kernel::prelude::{AppConfig, CommandLine, load_config};
use selfhost_server::init_logger;

fn main() -> anyhow::Result<()> {
    let cfg: AppConfig =
        load_config(&CommandLine::from_env()).context("Critical: Configuration is malformed")?;
    let build = build_info!(env!("CARGO_BIN_NAME"));
    // Handed to the bootstrap: the window loop exits the process without unwinding,
    // so the host releases it after stopping the listener.
    let log = init_logger(&build, &cfg.logging)?;

    Bootstrap::builder().config(cfg).build_info(build).logger(log).window(MainWindow::new).run()
}
