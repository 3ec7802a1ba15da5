//! In-memory engine for tests and headless runs.
//!
//! [`FakeEngine`] behaves like the native engine from the binding's point of
//! view: it hands out window and bind ids, keeps argument slots per event,
//! records responses and every setter call, and implements the blocking
//! `wait()` and `script()` calls with a condition variable.

use crate::engine::{BindId, Engine, WindowId, MAX_ARGS};
use crate::event::{EventKind, RawEvent};
use crate::types::{Browser, Runtime};
use crate::WebUi;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use parking_lot::{Condvar, Mutex};
use std::collections::{BTreeMap, HashMap};
use std::ffi::CStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How the fake answers a blocking script call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptReply {
    /// Succeed with this text.
    Value(String),
    /// Fail with this error text.
    Fail(String),
    /// Never answer; the call ends on timeout, window close or exit.
    Never,
}

type ScriptHandler = Arc<dyn Fn(WindowId, &str) -> ScriptReply + Send + Sync>;

/// Recorded state of one window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FakeWindow {
    pub shown: bool,
    pub closed: bool,
    pub destroyed: bool,
    pub content: Option<String>,
    pub browser: Option<Browser>,
    pub kiosk: bool,
    pub hidden: bool,
    pub size: Option<(u32, u32)>,
    pub position: Option<(u32, u32)>,
    pub root_folder: Option<String>,
    pub icon: Option<(String, String)>,
    pub profile: Option<(String, String)>,
    pub runtime: Runtime,
    pub url: String,
}

#[derive(Debug, Clone)]
struct FakeBinding {
    window: WindowId,
    element: String,
    bind_id: BindId,
}

#[derive(Default)]
struct FakeState {
    next_window: usize,
    next_bind: usize,
    next_event: usize,
    windows: BTreeMap<WindowId, FakeWindow>,
    bindings: Vec<FakeBinding>,
    args: HashMap<usize, Vec<String>>,
    responses: HashMap<usize, String>,
    ran: Vec<(WindowId, String)>,
    timeout: Option<usize>,
    default_root_folder: Option<String>,
    exited: bool,
    reject_show: bool,
    reject_root_folder: bool,
    reuse_bind_ids: bool,
    script_handler: Option<ScriptHandler>,
}

/// Engine that keeps everything in memory.
#[derive(Default)]
pub struct FakeEngine {
    state: Mutex<FakeState>,
    changed: Condvar,
}

/// A [`WebUi`] over a fresh [`FakeEngine`], plus the engine for inspection.
pub fn fake_webui() -> (WebUi, Arc<FakeEngine>) {
    let fake = FakeEngine::new();
    let ui = WebUi::with_engine(fake.clone());
    (ui, fake)
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    // -- Knobs -----------------------------------------------------------

    /// Make `show()` report failure.
    pub fn reject_show(&self, reject: bool) {
        self.state.lock().reject_show = reject;
    }

    /// Make root folder setters report failure.
    pub fn reject_root_folder(&self, reject: bool) {
        self.state.lock().reject_root_folder = reject;
    }

    /// Return the existing bind id when an element is bound twice.
    pub fn reuse_bind_ids(&self, reuse: bool) {
        self.state.lock().reuse_bind_ids = reuse;
    }

    /// Decide how blocking script calls answer. Defaults to an empty value.
    pub fn on_script<F>(&self, handler: F)
    where
        F: Fn(WindowId, &str) -> ScriptReply + Send + Sync + 'static,
    {
        self.state.lock().script_handler = Some(Arc::new(handler));
    }

    // -- Event simulation ------------------------------------------------

    /// Build the event the engine would deliver for `element` on `window`,
    /// storing `args` as its slots. Exact bindings win over the wildcard;
    /// `None` when nothing on that window matches.
    pub fn event(
        &self,
        window: WindowId,
        kind: EventKind,
        element: &str,
        args: &[&str],
    ) -> Option<RawEvent> {
        let mut state = self.state.lock();
        let bind_id = Self::matching_binding(&state, window, element)?;
        state.next_event += 1;
        let event_number = state.next_event;
        state
            .args
            .insert(event_number, args.iter().map(|a| a.to_string()).collect());
        Some(RawEvent {
            window,
            kind,
            element: element.to_string(),
            event_number,
            bind_id,
        })
    }

    fn matching_binding(state: &FakeState, window: WindowId, element: &str) -> Option<BindId> {
        let on_window = || state.bindings.iter().filter(move |b| b.window == window);
        on_window()
            .filter(|b| b.element == element)
            .last()
            .or_else(|| on_window().filter(|b| b.element.is_empty()).last())
            .map(|b| b.bind_id)
    }

    // -- Inspection ------------------------------------------------------

    /// JSON response delivered for `event_number`, if any.
    pub fn response(&self, event_number: usize) -> Option<String> {
        self.state.lock().responses.get(&event_number).cloned()
    }

    pub fn response_count(&self) -> usize {
        self.state.lock().responses.len()
    }

    pub fn window_state(&self, window: WindowId) -> Option<FakeWindow> {
        self.state.lock().windows.get(&window).cloned()
    }

    /// Scripts passed to `run()`, in order.
    pub fn ran(&self) -> Vec<(WindowId, String)> {
        self.state.lock().ran.clone()
    }

    pub fn timeout(&self) -> Option<usize> {
        self.state.lock().timeout
    }

    pub fn default_root_folder(&self) -> Option<String> {
        self.state.lock().default_root_folder.clone()
    }

    pub fn has_exited(&self) -> bool {
        self.state.lock().exited
    }

    fn update_window(&self, window: WindowId, f: impl FnOnce(&mut FakeWindow)) {
        let mut state = self.state.lock();
        if let Some(entry) = state.windows.get_mut(&window) {
            f(entry);
        }
        drop(state);
        self.changed.notify_all();
    }
}

fn text(value: &CStr) -> String {
    value.to_string_lossy().into_owned()
}

/// Copy `text` into `buffer` the way the engine does: truncated to leave
/// room for the terminator, never past the end.
fn write_terminated(buffer: &mut [u8], text: &str) {
    let Some(room) = buffer.len().checked_sub(1) else {
        return;
    };
    let len = text.len().min(room);
    buffer[..len].copy_from_slice(&text.as_bytes()[..len]);
    buffer[len] = 0;
}

impl Engine for FakeEngine {
    fn new_window(&self) -> WindowId {
        let mut state = self.state.lock();
        state.next_window += 1;
        let window = WindowId(state.next_window);
        state.windows.insert(window, FakeWindow::default());
        window
    }

    fn new_window_with_id(&self, window: WindowId) {
        let mut state = self.state.lock();
        state.next_window = state.next_window.max(window.0);
        state.windows.insert(window, FakeWindow::default());
    }

    fn new_window_id(&self) -> WindowId {
        let state = self.state.lock();
        let highest = state.windows.keys().last().map(|w| w.0).unwrap_or(0);
        WindowId(highest.max(state.next_window) + 1)
    }

    fn bind(&self, window: WindowId, element: &CStr) -> BindId {
        let mut state = self.state.lock();
        let element = text(element);
        if state.reuse_bind_ids {
            if let Some(existing) = state
                .bindings
                .iter()
                .find(|b| b.window == window && b.element == element)
            {
                return existing.bind_id;
            }
        }
        state.next_bind += 1;
        let bind_id = BindId(state.next_bind);
        state.bindings.push(FakeBinding {
            window,
            element,
            bind_id,
        });
        bind_id
    }

    fn show(&self, window: WindowId, content: &CStr) -> bool {
        if self.state.lock().reject_show {
            return false;
        }
        let content = text(content);
        self.update_window(window, |w| {
            w.shown = true;
            w.closed = false;
            w.url = format!("http://localhost:{}/", 8080 + window.0);
            w.content = Some(content);
        });
        true
    }

    fn show_browser(&self, window: WindowId, content: &CStr, browser: Browser) -> bool {
        let shown = self.show(window, content);
        if shown {
            self.update_window(window, |w| w.browser = Some(browser));
        }
        shown
    }

    fn set_kiosk(&self, window: WindowId, enable: bool) {
        self.update_window(window, |w| w.kiosk = enable);
    }

    fn set_hide(&self, window: WindowId, hidden: bool) {
        self.update_window(window, |w| w.hidden = hidden);
    }

    fn set_size(&self, window: WindowId, width: u32, height: u32) {
        self.update_window(window, |w| w.size = Some((width, height)));
    }

    fn set_position(&self, window: WindowId, x: u32, y: u32) {
        self.update_window(window, |w| w.position = Some((x, y)));
    }

    fn set_root_folder(&self, window: WindowId, path: &CStr) -> bool {
        if self.state.lock().reject_root_folder {
            return false;
        }
        let path = text(path);
        self.update_window(window, |w| w.root_folder = Some(path));
        true
    }

    fn set_default_root_folder(&self, path: &CStr) -> bool {
        let mut state = self.state.lock();
        if state.reject_root_folder {
            return false;
        }
        state.default_root_folder = Some(text(path));
        true
    }

    fn set_icon(&self, window: WindowId, icon: &CStr, mime: &CStr) {
        let icon = (text(icon), text(mime));
        self.update_window(window, |w| w.icon = Some(icon));
    }

    fn set_profile(&self, window: WindowId, name: &CStr, path: &CStr) {
        let profile = (text(name), text(path));
        self.update_window(window, |w| w.profile = Some(profile));
    }

    fn set_runtime(&self, window: WindowId, runtime: Runtime) {
        self.update_window(window, |w| w.runtime = runtime);
    }

    fn set_timeout(&self, seconds: usize) {
        self.state.lock().timeout = Some(seconds);
    }

    fn is_shown(&self, window: WindowId) -> bool {
        self.state
            .lock()
            .windows
            .get(&window)
            .map(|w| w.shown)
            .unwrap_or(false)
    }

    fn url(&self, window: WindowId) -> String {
        self.state
            .lock()
            .windows
            .get(&window)
            .map(|w| w.url.clone())
            .unwrap_or_default()
    }

    fn navigate(&self, window: WindowId, url: &CStr) {
        let url = text(url);
        self.update_window(window, |w| w.url = url);
    }

    fn close(&self, window: WindowId) {
        self.update_window(window, |w| {
            w.shown = false;
            w.closed = true;
        });
    }

    fn destroy(&self, window: WindowId) {
        self.update_window(window, |w| {
            w.shown = false;
            w.closed = true;
            w.destroyed = true;
        });
    }

    fn exit(&self) {
        let mut state = self.state.lock();
        state.exited = true;
        for window in state.windows.values_mut() {
            window.shown = false;
            window.closed = true;
        }
        drop(state);
        self.changed.notify_all();
    }

    fn wait(&self) {
        let mut state = self.state.lock();
        while !state.exited && state.windows.values().any(|w| w.shown) {
            self.changed.wait(&mut state);
        }
    }

    fn run(&self, window: WindowId, script: &CStr) {
        self.state.lock().ran.push((window, text(script)));
    }

    fn script(&self, window: WindowId, script: &CStr, timeout: usize, buffer: &mut [u8]) -> bool {
        let handler = self.state.lock().script_handler.clone();
        let reply = match handler {
            Some(handler) => handler(window, &text(script)),
            None => ScriptReply::Value(String::new()),
        };

        match reply {
            ScriptReply::Value(value) => {
                write_terminated(buffer, &value);
                true
            }
            ScriptReply::Fail(message) => {
                write_terminated(buffer, &message);
                false
            }
            ScriptReply::Never => {
                let deadline =
                    (timeout > 0).then(|| Instant::now() + Duration::from_secs(timeout as u64));
                let mut state = self.state.lock();
                loop {
                    if state.exited {
                        write_terminated(buffer, "engine exited");
                        return false;
                    }
                    if state.windows.get(&window).map_or(true, |w| w.closed) {
                        write_terminated(buffer, "window closed");
                        return false;
                    }
                    match deadline {
                        Some(deadline) => {
                            if self.changed.wait_until(&mut state, deadline).timed_out() {
                                write_terminated(buffer, "timeout");
                                return false;
                            }
                        }
                        None => self.changed.wait(&mut state),
                    }
                }
            }
        }
    }

    fn encode(&self, text: &CStr) -> Option<String> {
        Some(STANDARD.encode(text.to_bytes()))
    }

    fn decode(&self, text: &CStr) -> Option<String> {
        let bytes = STANDARD.decode(text.to_bytes()).ok()?;
        String::from_utf8(bytes).ok()
    }

    fn size_at(&self, event: &RawEvent, index: usize) -> usize {
        if index >= MAX_ARGS {
            return 0;
        }
        self.state
            .lock()
            .args
            .get(&event.event_number)
            .and_then(|args| args.get(index))
            .map(|arg| arg.len())
            .unwrap_or(0)
    }

    fn string_at(&self, event: &RawEvent, index: usize) -> String {
        self.state
            .lock()
            .args
            .get(&event.event_number)
            .and_then(|args| args.get(index))
            .cloned()
            .unwrap_or_default()
    }

    fn int_at(&self, event: &RawEvent, index: usize) -> i64 {
        self.string_at(event, index).trim().parse().unwrap_or(0)
    }

    fn bool_at(&self, event: &RawEvent, index: usize) -> bool {
        let value = self.string_at(event, index);
        let value = value.trim();
        value.eq_ignore_ascii_case("true") || value.parse::<i64>().map_or(false, |n| n != 0)
    }

    fn set_response(&self, _window: WindowId, event_number: usize, response: &CStr) {
        self.state
            .lock()
            .responses
            .insert(event_number, text(response));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn test_write_terminated_respects_capacity() {
        let mut one = [0xAAu8; 1];
        write_terminated(&mut one, "hello");
        assert_eq!(one, [0]);

        let mut four = [0xAAu8; 4];
        write_terminated(&mut four, "hello");
        assert_eq!(&four, b"hel\0");

        let mut empty: [u8; 0] = [];
        write_terminated(&mut empty, "hello");
    }

    #[test]
    fn test_wildcard_binding_matches_unbound_elements() {
        let fake = FakeEngine::new();
        let window = fake.new_window();
        let all = fake.bind(window, &CString::new("").unwrap());
        let save = fake.bind(window, &CString::new("save").unwrap());

        let ev = fake.event(window, EventKind::MouseClick, "save", &[]).unwrap();
        assert_eq!(ev.bind_id, save);
        let ev = fake.event(window, EventKind::MouseClick, "other", &[]).unwrap();
        assert_eq!(ev.bind_id, all);
        assert!(fake.event(WindowId(99), EventKind::MouseClick, "save", &[]).is_none());
    }
}
