use crate::{HostHandle, Window, WindowContext};
use anyhow::Result;
use dioxus::desktop::tao::event::Event;
use dioxus::desktop::{Config, LogicalSize, WindowBuilder};
use dioxus::prelude::*;
use selfhost_kernel::domain::build::BuildInfo;
use selfhost_kernel::domain::config::WindowConfig;
use tracing::{error, info};

/// Read by the root component through the context API.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ApiEndpoint {
    title: String,
    docs_url: String,
}

/// The application's main window, rendered by Dioxus desktop.
///
/// The Dioxus event loop never returns to the caller, so the host is stopped
/// from the loop-destroyed event instead of after [`Window::run`].
#[derive(Debug)]
pub struct MainWindow {
    title: String,
    width: f64,
    height: f64,
    endpoint: ApiEndpoint,
    host: HostHandle,
}

impl MainWindow {
    /// Window factory for [`crate::BootstrapBuilder::window`].
    pub fn new(ctx: &WindowContext) -> Result<Self> {
        let title = window_title(&ctx.config.window, &ctx.build);
        Ok(Self {
            width: ctx.config.window.width,
            height: ctx.config.window.height,
            endpoint: ApiEndpoint { title: title.clone(), docs_url: ctx.docs_url() },
            host: ctx.host.clone(),
            title,
        })
    }
}

impl Window for MainWindow {
    fn run(self) -> Result<()> {
        let window = WindowBuilder::new()
            .with_title(&self.title)
            .with_inner_size(LogicalSize { width: self.width, height: self.height });

        let host = self.host;
        let cfg = Config::default()
            .with_window(window)
            .with_custom_head(
                r#"<meta name="viewport" content="width=device-width, initial-scale=1.0">"#.into(),
            )
            .with_custom_event_handler(move |event, _| {
                if matches!(event, Event::LoopDestroyed) {
                    info!("Window loop destroyed, stopping API host");
                    if let Err(e) = host.stop() {
                        error!("API host did not stop cleanly: {e:#}");
                    }
                }
            });

        LaunchBuilder::desktop().with_cfg(cfg).with_context(self.endpoint).launch(App);
        Ok(())
    }
}

/// Configured title, or the binary name.
fn window_title(window: &WindowConfig, build: &BuildInfo) -> String {
    window
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map_or_else(|| build.name.to_string(), ToOwned::to_owned)
}

#[component]
fn App() -> Element {
    let endpoint = use_context::<ApiEndpoint>();

    rsx! {
        main {
            h1 { "{endpoint.title}" }
            p {
                "API documentation: "
                a { href: "{endpoint.docs_url}", "{endpoint.docs_url}" }
            }
        }
    }
}
