//! Per-window façade.

use crate::app::Bridge;
use crate::codec::IntoReply;
use crate::config::WindowConfig;
use crate::engine::{BindId, Engine, WindowId};
use crate::error::{Result, WebUiError};
use crate::event::Event;
use crate::registry::Callback;
use crate::types::{Browser, Runtime, ScriptOptions};
use std::ffi::CString;
use std::fmt;
use std::sync::Arc;

/// Handle to one engine window.
///
/// Cheap to clone and safe to share between threads. Once the window is
/// destroyed every call through any clone returns
/// [`WebUiError::WindowDestroyed`], even if the engine hands the same number
/// to a new window later.
#[derive(Clone)]
pub struct Window {
    id: WindowId,
    generation: u64,
    bridge: Arc<Bridge>,
}

pub(crate) fn c_string(what: &'static str, value: &str) -> Result<CString> {
    CString::new(value).map_err(|_| WebUiError::invalid_string(what))
}

/// Text the engine left in a result buffer: everything before the first
/// NUL, or the whole buffer if it has none.
pub(crate) fn terminated_text(buffer: &[u8]) -> String {
    let end = buffer.iter().position(|&b| b == 0).unwrap_or(buffer.len());
    String::from_utf8_lossy(&buffer[..end]).into_owned()
}

impl Window {
    pub(crate) fn new(id: WindowId, generation: u64, bridge: Arc<Bridge>) -> Self {
        Self {
            id,
            generation,
            bridge,
        }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub(crate) fn engine(&self) -> &dyn Engine {
        &*self.bridge.engine
    }

    /// Engine handle, provided this window is still alive.
    fn live(&self) -> Result<&dyn Engine> {
        if self.bridge.registry.is_live(self.id, self.generation) {
            Ok(self.engine())
        } else {
            Err(WebUiError::window_destroyed(self.id))
        }
    }

    /// True until [`Window::destroy`] runs.
    pub fn is_alive(&self) -> bool {
        self.bridge.registry.is_live(self.id, self.generation)
    }

    // ------------------------------------------------------------------------
    // Bindings
    // ------------------------------------------------------------------------

    /// Bind `element` to `callback`. An empty element receives every event
    /// of this window.
    ///
    /// The callback may return anything implementing [`IntoReply`]: `()` or
    /// `None` send nothing, other values are sent back as JSON.
    pub fn bind<F, R>(&self, element: &str, callback: F) -> Result<BindId>
    where
        F: Fn(&Event) -> R + Send + Sync + 'static,
        R: IntoReply,
    {
        let engine = self.live()?;
        let name = c_string("element", element)?;
        let callback: Callback = Arc::new(move |event: &Event| callback(event).into_reply());
        let bind_id = self
            .bridge
            .registry
            .register(engine, self.id, &name, callback)?;
        tracing::debug!(window = %self.id, element, bind_id = %bind_id, "Bound element");
        Ok(bind_id)
    }

    /// Bind every event of this window to one callback.
    pub fn bind_all<F, R>(&self, callback: F) -> Result<BindId>
    where
        F: Fn(&Event) -> R + Send + Sync + 'static,
        R: IntoReply,
    {
        self.bind("", callback)
    }

    // ------------------------------------------------------------------------
    // Display
    // ------------------------------------------------------------------------

    /// Show embedded HTML, a file or a URL. Refreshes an already open
    /// window.
    pub fn show(&self, content: &str) -> Result<()> {
        let engine = self.live()?;
        let c_content = c_string("content", content)?;
        if !engine.show(self.id, &c_content) {
            tracing::warn!(window = %self.id, "Engine failed to show window");
            return Err(WebUiError::show_failed(content));
        }
        Ok(())
    }

    /// Like [`Window::show`] in a specific browser.
    pub fn show_browser(&self, content: &str, browser: Browser) -> Result<()> {
        let engine = self.live()?;
        let c_content = c_string("content", content)?;
        if !engine.show_browser(self.id, &c_content, browser) {
            tracing::warn!(window = %self.id, ?browser, "Engine failed to show window");
            return Err(WebUiError::show_failed(content));
        }
        Ok(())
    }

    pub fn is_shown(&self) -> bool {
        self.live()
            .map(|engine| engine.is_shown(self.id))
            .unwrap_or(false)
    }

    /// Full URL currently loaded.
    pub fn url(&self) -> Result<String> {
        Ok(self.live()?.url(self.id))
    }

    pub fn navigate(&self, url: &str) -> Result<()> {
        let engine = self.live()?;
        engine.navigate(self.id, &c_string("url", url)?);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------------

    pub fn set_kiosk(&self, enable: bool) -> Result<()> {
        self.live()?.set_kiosk(self.id, enable);
        Ok(())
    }

    pub fn set_hide(&self, hidden: bool) -> Result<()> {
        self.live()?.set_hide(self.id, hidden);
        Ok(())
    }

    pub fn set_size(&self, width: u32, height: u32) -> Result<()> {
        self.live()?.set_size(self.id, width, height);
        Ok(())
    }

    pub fn set_position(&self, x: u32, y: u32) -> Result<()> {
        self.live()?.set_position(self.id, x, y);
        Ok(())
    }

    /// Web-server root folder for this window only.
    pub fn set_root_folder(&self, path: &str) -> Result<()> {
        let engine = self.live()?;
        if !engine.set_root_folder(self.id, &c_string("root folder", path)?) {
            return Err(WebUiError::root_folder_rejected(path));
        }
        Ok(())
    }

    /// Favicon for embedded HTML, e.g. an SVG with `image/svg+xml`.
    pub fn set_icon(&self, icon: &str, mime: &str) -> Result<()> {
        let engine = self.live()?;
        engine.set_icon(
            self.id,
            &c_string("icon", icon)?,
            &c_string("icon type", mime)?,
        );
        Ok(())
    }

    /// Browser profile to launch with; empty name and path select the
    /// default profile. Only effective before the window is shown.
    pub fn set_profile(&self, name: &str, path: &str) -> Result<()> {
        let engine = self.live()?;
        engine.set_profile(
            self.id,
            &c_string("profile name", name)?,
            &c_string("profile path", path)?,
        );
        Ok(())
    }

    pub fn set_runtime(&self, runtime: Runtime) -> Result<()> {
        self.live()?.set_runtime(self.id, runtime);
        Ok(())
    }

    /// Apply every setting named in `config`.
    pub fn apply(&self, config: &WindowConfig) -> Result<()> {
        if let Some(kiosk) = config.kiosk {
            self.set_kiosk(kiosk)?;
        }
        if let Some(hidden) = config.hidden {
            self.set_hide(hidden)?;
        }
        match (config.width, config.height) {
            (Some(width), Some(height)) => self.set_size(width, height)?,
            (None, None) => {}
            _ => tracing::warn!(window = %self.id, "Ignoring size, both width and height are needed"),
        }
        match (config.x, config.y) {
            (Some(x), Some(y)) => self.set_position(x, y)?,
            (None, None) => {}
            _ => tracing::warn!(window = %self.id, "Ignoring position, both x and y are needed"),
        }
        if let Some(path) = &config.root_folder {
            self.set_root_folder(path)?;
        }
        if let Some(icon) = &config.icon {
            self.set_icon(&icon.content, &icon.mime)?;
        }
        if let Some(profile) = &config.profile {
            self.set_profile(&profile.name, &profile.path)?;
        }
        if let Some(runtime) = config.runtime {
            self.set_runtime(runtime)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // JavaScript
    // ------------------------------------------------------------------------

    /// Run `script` without waiting for it.
    pub fn run(&self, script: &str) -> Result<()> {
        let engine = self.live()?;
        engine.run(self.id, &c_string("script", script)?);
        Ok(())
    }

    /// Run `script` and wait for its result.
    ///
    /// Blocks until the script answers, `options.timeout` seconds pass (zero
    /// waits forever), the window closes or the engine exits. Results longer
    /// than the buffer are cut at the buffer's end.
    pub fn script(&self, script: &str, options: ScriptOptions) -> Result<String> {
        let engine = self.live()?;
        let code = c_string("script", script)?;
        let mut buffer = vec![0u8; options.capacity()];

        let ok = engine.script(self.id, &code, options.timeout, &mut buffer);
        let text = terminated_text(&buffer);
        if !ok {
            tracing::warn!(window = %self.id, error = %text, "Script failed");
            return Err(WebUiError::script_failed(script, text));
        }
        Ok(text)
    }

    /// [`Window::script`] on tokio's blocking pool.
    pub async fn script_async(
        &self,
        script: impl Into<String>,
        options: ScriptOptions,
    ) -> Result<String> {
        let window = self.clone();
        let script = script.into();
        match tokio::task::spawn_blocking(move || window.script(&script, options)).await {
            Ok(result) => result,
            Err(err) => std::panic::resume_unwind(err.into_panic()),
        }
    }

    // ------------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------------

    /// Close the window; its bindings and settings are kept.
    pub fn close(&self) -> Result<()> {
        self.live()?.close(self.id);
        Ok(())
    }

    /// Close the window and release everything the engine and the binding
    /// hold for it. The handle is unusable afterwards.
    pub fn destroy(&self) -> Result<()> {
        let engine = self.live()?;
        engine.destroy(self.id);
        self.bridge.registry.close_window(self.id);
        tracing::debug!(window = %self.id, "Destroyed window");
        Ok(())
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("generation", &self.generation)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IconConfig, ProfileConfig};
    use crate::error::WebUiErrorCode;
    use crate::testing::{fake_webui, ScriptReply};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn test_terminated_text() {
        assert_eq!(terminated_text(b"abc\0def"), "abc");
        assert_eq!(terminated_text(b"\0"), "");
        assert_eq!(terminated_text(b"no terminator"), "no terminator");
        assert_eq!(terminated_text(b""), "");
    }

    #[test]
    fn test_show_and_query() {
        let (ui, fake) = fake_webui();
        let window = ui.new_window();
        assert!(!window.is_shown());

        window.show("<html>hi</html>").unwrap();
        assert!(window.is_shown());
        assert_eq!(window.url().unwrap(), "http://localhost:8081/");

        window.navigate("https://example.com").unwrap();
        assert_eq!(window.url().unwrap(), "https://example.com");

        window.show_browser("index.html", Browser::Firefox).unwrap();
        let state = fake.window_state(window.id()).unwrap();
        assert_eq!(state.content.as_deref(), Some("index.html"));
        assert_eq!(state.browser, Some(Browser::Firefox));
    }

    #[test]
    fn test_show_failure_is_recoverable() {
        let (ui, fake) = fake_webui();
        let window = ui.new_window();
        fake.reject_show(true);

        let err = window.show("index.html").unwrap_err();
        assert_eq!(err.code(), WebUiErrorCode::ShowFailed as u32);
        let err = window.show_browser("index.html", Browser::Chrome).unwrap_err();
        assert_eq!(err.code(), WebUiErrorCode::ShowFailed as u32);

        fake.reject_show(false);
        window.show("index.html").unwrap();
    }

    #[test]
    fn test_interior_nul_is_rejected() {
        let (ui, _fake) = fake_webui();
        let window = ui.new_window();
        let err = window.show("bad\0content").unwrap_err();
        assert_eq!(err.code(), WebUiErrorCode::InvalidString as u32);
        let err = window.bind("a\0b", |_: &Event| ()).unwrap_err();
        assert_eq!(err.code(), WebUiErrorCode::InvalidString as u32);
    }

    #[test]
    fn test_setters_reach_engine() {
        let (ui, fake) = fake_webui();
        let window = ui.new_window();
        window.set_kiosk(true).unwrap();
        window.set_hide(true).unwrap();
        window.set_size(800, 600).unwrap();
        window.set_position(10, 20).unwrap();
        window.set_root_folder("ui").unwrap();
        window.set_icon("<svg/>", "image/svg+xml").unwrap();
        window.set_profile("", "").unwrap();
        window.set_runtime(Runtime::Deno).unwrap();

        let state = fake.window_state(window.id()).unwrap();
        assert!(state.kiosk);
        assert!(state.hidden);
        assert_eq!(state.size, Some((800, 600)));
        assert_eq!(state.position, Some((10, 20)));
        assert_eq!(state.root_folder.as_deref(), Some("ui"));
        assert_eq!(
            state.icon,
            Some(("<svg/>".to_string(), "image/svg+xml".to_string()))
        );
        assert_eq!(state.profile, Some((String::new(), String::new())));
        assert_eq!(state.runtime, Runtime::Deno);

        fake.reject_root_folder(true);
        let err = window.set_root_folder("elsewhere").unwrap_err();
        assert_eq!(err.code(), WebUiErrorCode::RootFolderRejected as u32);
    }

    #[test]
    fn test_apply_config() {
        let (ui, fake) = fake_webui();
        let window = ui.new_window();
        let config = WindowConfig {
            kiosk: Some(false),
            width: Some(1024),
            height: Some(768),
            x: Some(5),
            root_folder: Some("public".into()),
            icon: Some(IconConfig {
                content: "<svg/>".into(),
                mime: "image/svg+xml".into(),
            }),
            profile: Some(ProfileConfig {
                name: "work".into(),
                path: "/tmp/work".into(),
            }),
            runtime: Some(Runtime::NodeJs),
            ..Default::default()
        };
        window.apply(&config).unwrap();

        let state = fake.window_state(window.id()).unwrap();
        assert_eq!(state.size, Some((1024, 768)));
        assert_eq!(state.position, None);
        assert_eq!(state.root_folder.as_deref(), Some("public"));
        assert_eq!(
            state.profile,
            Some(("work".to_string(), "/tmp/work".to_string()))
        );
        assert_eq!(state.runtime, Runtime::NodeJs);
    }

    #[test]
    fn test_run_is_fire_and_forget() {
        let (ui, fake) = fake_webui();
        let window = ui.new_window();
        window.run("alert(1)").unwrap();
        assert_eq!(fake.ran(), vec![(window.id(), "alert(1)".to_string())]);
    }

    #[test]
    fn test_script_returns_result() {
        let (ui, fake) = fake_webui();
        let window = ui.new_window();
        fake.on_script(|_, code| ScriptReply::Value(format!("ran: {code}")));

        let out = window.script("return 1", ScriptOptions::default()).unwrap();
        assert_eq!(out, "ran: return 1");
    }

    #[test]
    fn test_script_failure_keeps_script_text() {
        let (ui, fake) = fake_webui();
        let window = ui.new_window();
        fake.on_script(|_, _| ScriptReply::Fail("ReferenceError: nope".into()));

        let err = window
            .script("return nope", ScriptOptions::default())
            .unwrap_err();
        match err {
            WebUiError::ScriptFailed {
                script, message, ..
            } => {
                assert_eq!(script, "return nope");
                assert_eq!(message, "ReferenceError: nope");
            }
            other => panic!("expected script failure, got {other:?}"),
        }
    }

    #[test]
    fn test_script_one_byte_buffer_truncates() {
        let (ui, fake) = fake_webui();
        let window = ui.new_window();
        fake.on_script(|_, _| ScriptReply::Value("a long answer".into()));

        let options = ScriptOptions::default().with_buffer_size(1);
        assert_eq!(window.script("return x", options).unwrap(), "");

        let options = ScriptOptions::default().with_buffer_size(5);
        assert_eq!(window.script("return x", options).unwrap(), "a lo");
    }

    #[test]
    fn test_script_timeout() {
        let (ui, fake) = fake_webui();
        let window = ui.new_window();
        window.show("index.html").unwrap();
        fake.on_script(|_, _| ScriptReply::Never);

        let err = window
            .script("await forever()", ScriptOptions::default().with_timeout(1))
            .unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_script_without_timeout_blocks_until_exit() {
        let (ui, fake) = fake_webui();
        let window = ui.new_window();
        window.show("index.html").unwrap();
        fake.on_script(|_, _| ScriptReply::Never);

        let (tx, rx) = std::sync::mpsc::channel();
        let worker = window.clone();
        let handle = std::thread::spawn(move || {
            let result = worker.script("await forever()", ScriptOptions::default());
            tx.send(result).unwrap();
        });

        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        ui.exit();
        let result = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(result.unwrap_err().code(), WebUiErrorCode::ScriptFailed as u32);
        handle.join().unwrap();
    }

    #[test]
    fn test_script_without_timeout_unblocks_on_close() {
        let (ui, fake) = fake_webui();
        let window = ui.new_window();
        window.show("index.html").unwrap();
        fake.on_script(|_, _| ScriptReply::Never);

        let worker = window.clone();
        let handle =
            std::thread::spawn(move || worker.script("await forever()", ScriptOptions::default()));

        std::thread::sleep(Duration::from_millis(100));
        assert!(!handle.is_finished());
        window.close().unwrap();
        let err = handle.join().unwrap().unwrap_err();
        assert!(err.to_string().contains("window closed"));
    }

    #[tokio::test]
    async fn test_script_async() {
        let (ui, fake) = fake_webui();
        let window = ui.new_window();
        fake.on_script(|_, _| ScriptReply::Value("42".into()));

        let out = window
            .script_async("return 42", ScriptOptions::default())
            .await
            .unwrap();
        assert_eq!(out, "42");
    }

    #[test]
    fn test_destroyed_handle_is_rejected() {
        let (ui, fake) = fake_webui();
        let window = ui.new_window();
        let copy = window.clone();
        window.bind("a", |_: &Event| ()).unwrap();

        window.destroy().unwrap();
        assert!(fake.window_state(window.id()).unwrap().destroyed);
        assert!(!copy.is_alive());
        assert!(!copy.is_shown());
        for err in [
            copy.show("x").unwrap_err(),
            copy.run("x").unwrap_err(),
            copy.set_kiosk(true).unwrap_err(),
            copy.destroy().unwrap_err(),
        ] {
            assert_eq!(err.code(), WebUiErrorCode::WindowDestroyed as u32);
        }
        assert!(copy.bind("b", |_: &Event| ()).is_err());

        // The number comes back for a new window; the old handle stays dead.
        let reborn = ui.new_window_with_id(window.id());
        assert!(reborn.is_alive());
        assert!(!copy.is_alive());
    }

    #[test]
    fn test_close_keeps_bindings() {
        let (ui, fake) = fake_webui();
        let window = ui.new_window();
        window.show("index.html").unwrap();
        window.bind("a", |_: &Event| ()).unwrap();
        window.close().unwrap();

        assert!(!window.is_shown());
        assert!(window.is_alive());
        assert_eq!(ui.registry().binding_count(window.id()), 1);
        assert!(fake.window_state(window.id()).unwrap().closed);
    }
}
