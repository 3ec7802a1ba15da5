//! The foreign call surface the binding is built on.
//!
//! [`Engine`] lists every capability the binding consumes, one method per C
//! entry point. The native implementation forwards to `webui-sys`; tests run
//! against the in-memory engine in [`crate::testing`]. Strings arrive here
//! already validated as [`CStr`], so implementations never see interior NULs.

use crate::event::RawEvent;
use crate::types::{Browser, Runtime};
use serde::{Deserialize, Serialize};
use std::ffi::CStr;
use std::fmt;

/// Highest number of argument slots the engine delivers with one event.
pub const MAX_ARGS: usize = 16;

/// Opaque window number handed out by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowId(pub usize);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key the engine returns from `bind`, echoed back on every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BindId(pub usize);

impl fmt::Display for BindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Capabilities of the native engine.
///
/// Calls may arrive from any thread, including from inside a dispatch that
/// the engine itself started.
pub trait Engine: Send + Sync + 'static {
    // -- Windows ---------------------------------------------------------

    fn new_window(&self) -> WindowId;
    fn new_window_with_id(&self, window: WindowId);
    fn new_window_id(&self) -> WindowId;

    /// Register interest in `element` (empty means every element) and
    /// return the id the engine will put on matching events.
    fn bind(&self, window: WindowId, element: &CStr) -> BindId;

    fn show(&self, window: WindowId, content: &CStr) -> bool;
    fn show_browser(&self, window: WindowId, content: &CStr, browser: Browser) -> bool;
    fn set_kiosk(&self, window: WindowId, enable: bool);
    fn set_hide(&self, window: WindowId, hidden: bool);
    fn set_size(&self, window: WindowId, width: u32, height: u32);
    fn set_position(&self, window: WindowId, x: u32, y: u32);
    fn set_root_folder(&self, window: WindowId, path: &CStr) -> bool;
    fn set_default_root_folder(&self, path: &CStr) -> bool;
    fn set_icon(&self, window: WindowId, icon: &CStr, mime: &CStr);
    fn set_profile(&self, window: WindowId, name: &CStr, path: &CStr);
    fn set_runtime(&self, window: WindowId, runtime: Runtime);
    fn set_timeout(&self, seconds: usize);
    fn is_shown(&self, window: WindowId) -> bool;
    fn url(&self, window: WindowId) -> String;
    fn navigate(&self, window: WindowId, url: &CStr);
    fn close(&self, window: WindowId);
    fn destroy(&self, window: WindowId);
    fn exit(&self);
    fn wait(&self);

    // -- JavaScript ------------------------------------------------------

    fn run(&self, window: WindowId, script: &CStr);

    /// Run `script` and block until it answers, `timeout` seconds pass
    /// (zero: forever), the window closes or the engine exits. The engine
    /// writes a NUL-terminated result or error text into `buffer` and never
    /// past its end.
    fn script(&self, window: WindowId, script: &CStr, timeout: usize, buffer: &mut [u8]) -> bool;

    fn encode(&self, text: &CStr) -> Option<String>;
    fn decode(&self, text: &CStr) -> Option<String>;

    // -- Event path ------------------------------------------------------

    /// Byte length of argument slot `index`; zero when nothing was sent.
    fn size_at(&self, event: &RawEvent, index: usize) -> usize;
    fn string_at(&self, event: &RawEvent, index: usize) -> String;
    fn int_at(&self, event: &RawEvent, index: usize) -> i64;
    fn bool_at(&self, event: &RawEvent, index: usize) -> bool;

    /// Number of leading non-empty argument slots.
    fn arg_count(&self, event: &RawEvent) -> usize {
        (0..MAX_ARGS)
            .take_while(|&index| self.size_at(event, index) > 0)
            .count()
    }

    /// Resolve the JS promise waiting on `event_number` with a JSON value.
    fn set_response(&self, window: WindowId, event_number: usize, response: &CStr);
}
