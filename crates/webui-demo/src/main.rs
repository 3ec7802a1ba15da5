use anyhow::{Context, Result};
use serde::Serialize;
use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use webui::{Config, Event, EventKind, Json, WebUi, Window};

const PAGE: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Counter</title>
    <script src="/webui.js"></script>
  </head>
  <body>
    <h1 id="count">0</h1>
    <button id="inc" onclick="bump()">+1</button>
    <button id="reset">Reset</button>
    <script>
      async function bump() {
        const el = document.getElementById('count');
        el.textContent = await webui.call('increment', Number(el.textContent));
      }
    </script>
  </body>
</html>"#;

#[derive(Debug, Default)]
struct Counter {
    count: AtomicI64,
    clicks: AtomicUsize,
}

#[derive(Debug, Serialize)]
struct Stats {
    count: i64,
    clicks: usize,
}

fn main() -> Result<()> {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_env("WEBUI_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    // Parse args: --config <file>
    let mut args = env::args().skip(1);
    let mut config_path: Option<PathBuf> = None;
    while let Some(a) = args.next() {
        match a.as_str() {
            "--config" => {
                config_path = Some(PathBuf::from(
                    args.next().context("--config requires a path")?,
                ));
            }
            other => tracing::warn!("Ignoring unknown argument: {}", other),
        }
    }

    let config = match &config_path {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config at {}", path.display()))?,
        None => Config::default(),
    };

    #[cfg(feature = "native")]
    {
        let ui = WebUi::native();
        let _window = setup(&ui, &config)?;
        tracing::info!("Window open, waiting for it to close");
        ui.wait();
    }

    #[cfg(not(feature = "native"))]
    {
        let (ui, fake) = webui::testing::fake_webui();
        let window = setup(&ui, &config)?;
        tracing::info!("Built without `native`, simulating a session");
        simulate(&ui, &fake, &window)?;
    }

    Ok(())
}

/// Create the window, bind its handlers and show it.
fn setup(ui: &WebUi, config: &Config) -> Result<Window> {
    ui.apply(&config.runtime).context("applying runtime config")?;
    let window = ui.new_window();
    window
        .apply(&config.window)
        .context("applying window config")?;

    let counter = Arc::new(Counter::default());

    let state = counter.clone();
    window.bind("increment", move |e: &Event| {
        let next = e.arg::<i64>()? + 1;
        state.count.store(next, Ordering::SeqCst);
        Ok::<_, webui::WebUiError>(next)
    })?;

    let state = counter.clone();
    window.bind("reset", move |e: &Event| {
        state.count.store(0, Ordering::SeqCst);
        e.window()
            .run("document.getElementById('count').textContent = '0'")
    })?;

    let state = counter.clone();
    window.bind("stats", move |_: &Event| {
        Json(Stats {
            count: state.count.load(Ordering::SeqCst),
            clicks: state.clicks.load(Ordering::SeqCst),
        })
    })?;

    let state = counter;
    window.bind_all(move |e: &Event| match e.kind() {
        EventKind::Connected => tracing::info!(window = %e.window_id(), "Browser connected"),
        EventKind::Disconnected => tracing::info!(window = %e.window_id(), "Browser disconnected"),
        EventKind::MouseClick => {
            state.clicks.fetch_add(1, Ordering::SeqCst);
            tracing::info!(element = %e.element(), "Click");
        }
        kind => tracing::debug!(?kind, element = %e.element(), "Event"),
    })?;

    let content = config.window.content.as_deref().unwrap_or(PAGE);
    match config.window.browser {
        Some(browser) => window.show_browser(content, browser)?,
        None => window.show(content)?,
    }
    Ok(window)
}

#[cfg(not(feature = "native"))]
fn simulate(
    ui: &WebUi,
    fake: &webui::testing::FakeEngine,
    window: &Window,
) -> Result<()> {
    use webui::testing::ScriptReply;
    use webui::ScriptOptions;

    let fire = |kind: EventKind, element: &str, args: &[&str]| -> Result<()> {
        let raw = fake
            .event(window.id(), kind, element, args)
            .with_context(|| format!("nothing bound for `{element}`"))?;
        let event_number = raw.event_number;
        ui.dispatcher().dispatch(raw)?;
        match fake.response(event_number) {
            Some(response) => tracing::info!(element, %response, "Response"),
            None => tracing::info!(element, "No response"),
        }
        Ok(())
    };

    fire(EventKind::Connected, "", &[])?;
    fire(EventKind::MouseClick, "inc", &[])?;
    fire(EventKind::Callback, "increment", &["5"])?;
    fire(EventKind::MouseClick, "inc", &[])?;
    fire(EventKind::Callback, "increment", &["6"])?;
    fire(EventKind::Callback, "stats", &[])?;
    fire(EventKind::Callback, "reset", &[])?;

    fake.on_script(|_, script| ScriptReply::Value(format!("evaluated {} bytes", script.len())));
    let title = window.script("return document.title", ScriptOptions::default().with_timeout(5))?;
    tracing::info!(%title, "Script result");

    fire(EventKind::Disconnected, "", &[])?;
    ui.exit();
    ui.wait();
    Ok(())
}
