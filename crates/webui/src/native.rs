//! [`Engine`] over the linked WebUI library.
//!
//! The C callback carries no user data, so a single process-wide
//! [`Dispatcher`] receives every event. [`crate::WebUi::native`] installs it
//! once before any window exists.

use crate::dispatch::Dispatcher;
use crate::engine::{BindId, Engine, WindowId};
use crate::event::{EventKind, RawEvent};
use crate::types::{Browser, Runtime};
use parking_lot::Mutex;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_void};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;
use std::sync::OnceLock;
use webui_sys as sys;

static DISPATCHER: OnceLock<Dispatcher> = OnceLock::new();

/// Route native events to `dispatcher`. Later calls are ignored.
pub(crate) fn install(dispatcher: Dispatcher) {
    if DISPATCHER.set(dispatcher).is_err() {
        tracing::warn!("Native dispatcher already installed");
    }
}

/// Copy a C string the engine still owns. Null reads as empty.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that stays valid
/// for the duration of the call.
unsafe fn borrowed_text(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

/// Take a string the engine allocated for us and release it.
///
/// # Safety
/// `ptr` must be null or a string returned by `webui_encode`/`webui_decode`.
unsafe fn owned_text(ptr: *mut c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let text = CStr::from_ptr(ptr).to_string_lossy().into_owned();
    sys::webui_free(ptr.cast::<c_void>());
    Some(text)
}

extern "C" fn handle_event(e: *mut sys::webui_event_t) {
    if e.is_null() {
        return;
    }
    // SAFETY: the engine passes a valid descriptor for the duration of the
    // callback.
    let raw = unsafe {
        let e = &*e;
        RawEvent {
            window: WindowId(e.window),
            kind: EventKind::from(e.event_type),
            element: borrowed_text(e.element),
            event_number: e.event_number,
            bind_id: BindId(e.bind_id),
        }
    };

    let Some(dispatcher) = DISPATCHER.get() else {
        tracing::error!(window = %raw.window, "Event arrived before a dispatcher was installed");
        return;
    };

    // Unwinding into C is undefined behavior.
    let outcome = catch_unwind(AssertUnwindSafe(|| dispatcher.dispatch(raw)));
    if outcome.is_err() {
        tracing::error!("Callback panicked, event dropped");
    }
}

/// Engine backed by `webui-sys`.
#[derive(Default)]
pub struct NativeEngine {
    /// Element names handed to `webui_bind`, kept alive for the process.
    elements: Mutex<Vec<CString>>,
}

impl NativeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the C descriptor for an event being dispatched. The engine
    /// looks arguments up by window and event number.
    fn with_event<R>(event: &RawEvent, f: impl FnOnce(*mut sys::webui_event_t) -> R) -> R {
        let element = CString::new(event.element.as_str()).unwrap_or_default();
        let mut descriptor = sys::webui_event_t {
            window: event.window.0,
            event_type: event.kind.as_raw(),
            element: element.as_ptr() as *mut c_char,
            event_number: event.event_number,
            bind_id: event.bind_id.0,
        };
        f(&mut descriptor)
    }
}

// SAFETY (all blocks below): every pointer passed in comes from a `CStr` or
// a buffer borrowed for the duration of the call, and the engine's API is
// thread safe.
impl Engine for NativeEngine {
    fn new_window(&self) -> WindowId {
        WindowId(unsafe { sys::webui_new_window() })
    }

    fn new_window_with_id(&self, window: WindowId) {
        unsafe { sys::webui_new_window_id(window.0) };
    }

    fn new_window_id(&self) -> WindowId {
        WindowId(unsafe { sys::webui_get_new_window_id() })
    }

    fn bind(&self, window: WindowId, element: &CStr) -> BindId {
        let element = element.to_owned();
        let id = unsafe { sys::webui_bind(window.0, element.as_ptr(), handle_event) };
        self.elements.lock().push(element);
        BindId(id)
    }

    fn show(&self, window: WindowId, content: &CStr) -> bool {
        unsafe { sys::webui_show(window.0, content.as_ptr()) }
    }

    fn show_browser(&self, window: WindowId, content: &CStr, browser: Browser) -> bool {
        unsafe { sys::webui_show_browser(window.0, content.as_ptr(), browser.as_raw()) }
    }

    fn set_kiosk(&self, window: WindowId, enable: bool) {
        unsafe { sys::webui_set_kiosk(window.0, enable) }
    }

    fn set_hide(&self, window: WindowId, hidden: bool) {
        unsafe { sys::webui_set_hide(window.0, hidden) }
    }

    fn set_size(&self, window: WindowId, width: u32, height: u32) {
        unsafe { sys::webui_set_size(window.0, width, height) }
    }

    fn set_position(&self, window: WindowId, x: u32, y: u32) {
        unsafe { sys::webui_set_position(window.0, x, y) }
    }

    fn set_root_folder(&self, window: WindowId, path: &CStr) -> bool {
        unsafe { sys::webui_set_root_folder(window.0, path.as_ptr()) }
    }

    fn set_default_root_folder(&self, path: &CStr) -> bool {
        unsafe { sys::webui_set_default_root_folder(path.as_ptr()) }
    }

    fn set_icon(&self, window: WindowId, icon: &CStr, mime: &CStr) {
        unsafe { sys::webui_set_icon(window.0, icon.as_ptr(), mime.as_ptr()) }
    }

    fn set_profile(&self, window: WindowId, name: &CStr, path: &CStr) {
        unsafe { sys::webui_set_profile(window.0, name.as_ptr(), path.as_ptr()) }
    }

    fn set_runtime(&self, window: WindowId, runtime: Runtime) {
        unsafe { sys::webui_set_runtime(window.0, runtime.as_raw()) }
    }

    fn set_timeout(&self, seconds: usize) {
        unsafe { sys::webui_set_timeout(seconds) }
    }

    fn is_shown(&self, window: WindowId) -> bool {
        unsafe { sys::webui_is_shown(window.0) }
    }

    fn url(&self, window: WindowId) -> String {
        unsafe { borrowed_text(sys::webui_get_url(window.0)) }
    }

    fn navigate(&self, window: WindowId, url: &CStr) {
        unsafe { sys::webui_navigate(window.0, url.as_ptr()) }
    }

    fn close(&self, window: WindowId) {
        unsafe { sys::webui_close(window.0) }
    }

    fn destroy(&self, window: WindowId) {
        unsafe { sys::webui_destroy(window.0) }
    }

    fn exit(&self) {
        unsafe { sys::webui_exit() }
    }

    fn wait(&self) {
        unsafe { sys::webui_wait() }
    }

    fn run(&self, window: WindowId, script: &CStr) {
        unsafe { sys::webui_run(window.0, script.as_ptr()) }
    }

    fn script(&self, window: WindowId, script: &CStr, timeout: usize, buffer: &mut [u8]) -> bool {
        let (ptr, len) = if buffer.is_empty() {
            (ptr::null_mut(), 0)
        } else {
            (buffer.as_mut_ptr().cast::<c_char>(), buffer.len())
        };
        unsafe { sys::webui_script(window.0, script.as_ptr(), timeout, ptr, len) }
    }

    fn encode(&self, text: &CStr) -> Option<String> {
        unsafe { owned_text(sys::webui_encode(text.as_ptr())) }
    }

    fn decode(&self, text: &CStr) -> Option<String> {
        unsafe { owned_text(sys::webui_decode(text.as_ptr())) }
    }

    fn size_at(&self, event: &RawEvent, index: usize) -> usize {
        if index >= sys::WEBUI_MAX_ARG {
            return 0;
        }
        Self::with_event(event, |e| unsafe { sys::webui_get_size_at(e, index) })
    }

    fn string_at(&self, event: &RawEvent, index: usize) -> String {
        Self::with_event(event, |e| unsafe { borrowed_text(sys::webui_get_string_at(e, index)) })
    }

    fn int_at(&self, event: &RawEvent, index: usize) -> i64 {
        Self::with_event(event, |e| unsafe { sys::webui_get_int_at(e, index) })
    }

    fn bool_at(&self, event: &RawEvent, index: usize) -> bool {
        Self::with_event(event, |e| unsafe { sys::webui_get_bool_at(e, index) })
    }

    fn set_response(&self, window: WindowId, event_number: usize, response: &CStr) {
        unsafe { sys::webui_interface_set_response(window.0, event_number, response.as_ptr()) }
    }
}
