use anyhow::{Result, anyhow};
use selfhost_desktop::{Bootstrap, HostHandle, Window, WindowContext};
use selfhost_kernel::domain::build::BuildInfo;
use selfhost_kernel::domain::config::AppConfig;
use selfhost_runtime::RuntimeConfig;
use std::net::{SocketAddr, TcpStream};
use std::sync::{Arc, Mutex};

/// Records the API address and fetches the document while "the loop runs".
struct ProbeWindow {
    ctx: WindowContext,
    seen: Arc<Mutex<Option<SocketAddr>>>,
    fail_with: Option<&'static str>,
    stop_from_loop: bool,
}

impl Window for ProbeWindow {
    fn run(self) -> Result<()> {
        *self.seen.lock().map_err(|_| anyhow!("poisoned"))? = Some(self.ctx.api_address);

        let url = format!("http://{}/swagger/v1/swagger.json", self.ctx.api_address);
        let doc: serde_json::Value = serde_json::from_str(&reqwest::blocking::get(url)?.text()?)?;
        assert_eq!(doc["info"]["title"], "selfhost-probe");
        assert_eq!(doc["info"]["version"], "v4.5.6");

        if self.stop_from_loop {
            self.ctx.host.stop()?;
            assert!(!self.ctx.host.is_running());
        }

        self.fail_with.map_or(Ok(()), |message| Err(anyhow!(message)))
    }
}

/// Stops the host from a thread that drives its own runtime, like the Dioxus
/// event loop does when it is destroyed.
struct NestedRuntimeWindow {
    host: HostHandle,
    address: SocketAddr,
}

impl Window for NestedRuntimeWindow {
    fn run(self) -> Result<()> {
        let ui_runtime =
            tokio::runtime::Builder::new_multi_thread().worker_threads(1).enable_all().build()?;
        ui_runtime.block_on(async { self.host.stop() })?;

        assert!(!self.host.is_running());
        assert!(TcpStream::connect(self.address).is_err(), "listener should be closed");
        Ok(())
    }
}

fn bootstrap() -> selfhost_desktop::BootstrapBuilder {
    let mut config = AppConfig::default();
    config.server.port = 0;
    config.shutdown.grace_seconds = 1;

    Bootstrap::builder()
        .config(config)
        .build_info(BuildInfo::new("selfhost-probe", "4.5.6"))
        .runtime(RuntimeConfig::default().with_worker_threads(1))
}

fn probe(
    fail_with: Option<&'static str>,
    stop_from_loop: bool,
) -> (Arc<Mutex<Option<SocketAddr>>>, impl FnOnce(&WindowContext) -> Result<ProbeWindow>) {
    let seen = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&seen);
    let factory = move |ctx: &WindowContext| {
        assert!(ctx.host.is_running(), "host must be started before the window is built");
        assert!(TcpStream::connect(ctx.api_address).is_ok(), "listener must accept before the window runs");
        assert!(ctx.docs_url().ends_with("/swagger"));
        Ok(ProbeWindow { ctx: ctx.clone(), seen: slot, fail_with, stop_from_loop })
    };
    (seen, factory)
}

fn recorded(seen: &Arc<Mutex<Option<SocketAddr>>>) -> SocketAddr {
    seen.lock().expect("lock").expect("window ran")
}

#[test]
fn host_serves_while_window_runs_and_stops_after() {
    let (seen, factory) = probe(None, false);

    bootstrap().window(factory).run().expect("clean exit");

    let address = recorded(&seen);
    assert!(TcpStream::connect(address).is_err(), "listener should be closed after the loop exits");
}

#[test]
fn window_error_is_returned_and_host_still_stops() {
    let (seen, factory) = probe(Some("renderer crashed"), false);

    let err = bootstrap().window(factory).run().expect_err("window failure propagates");
    assert_eq!(err.to_string(), "renderer crashed");
    assert!(TcpStream::connect(recorded(&seen)).is_err());
}

#[test]
fn stopping_from_the_loop_is_not_repeated() {
    let (seen, factory) = probe(None, true);

    bootstrap().window(factory).run().expect("second stop is a no-op");
    assert!(TcpStream::connect(recorded(&seen)).is_err());
}

#[test]
fn window_factory_error_is_a_startup_error() {
    let err = bootstrap()
        .window(|_: &WindowContext| -> Result<ProbeWindow> { Err(anyhow!("no display")) })
        .run()
        .expect_err("factory failure propagates");

    assert!(format!("{err:#}").contains("no display"));
    assert!(err.to_string().contains("Failed to create the main window"));
}

#[test]
fn host_stops_from_inside_another_runtime() {
    bootstrap()
        .window(|ctx: &WindowContext| {
            Ok(NestedRuntimeWindow { host: ctx.host.clone(), address: ctx.api_address })
        })
        .run()
        .expect("stopping from a runtime thread must not panic");
}
