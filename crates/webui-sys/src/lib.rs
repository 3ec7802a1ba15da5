//! Raw declarations for the WebUI 2.4 C library.
//!
//! Nothing here is safe to call without reading `webui.h`. The safe layer
//! lives in the `webui` crate.

#![allow(non_camel_case_types)]

use std::os::raw::{c_char, c_longlong, c_uint, c_void};

/// Event descriptor handed to bound callbacks.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct webui_event_t {
    pub window: usize,
    pub event_type: usize,
    pub element: *mut c_char,
    pub event_number: usize,
    pub bind_id: usize,
}

/// Signature the engine expects for `webui_bind`.
pub type webui_event_handler = extern "C" fn(e: *mut webui_event_t);

// Event types
pub const WEBUI_EVENT_DISCONNECTED: usize = 0;
pub const WEBUI_EVENT_CONNECTED: usize = 1;
pub const WEBUI_EVENT_MOUSE_CLICK: usize = 2;
pub const WEBUI_EVENT_NAVIGATION: usize = 3;
pub const WEBUI_EVENT_CALLBACK: usize = 4;

/// Highest argument index the engine accepts on the event path.
pub const WEBUI_MAX_ARG: usize = 16;

extern "C" {
    // -- Windows ---------------------------------------------------------
    pub fn webui_new_window() -> usize;
    pub fn webui_new_window_id(window_number: usize) -> usize;
    pub fn webui_get_new_window_id() -> usize;
    pub fn webui_bind(window: usize, element: *const c_char, func: webui_event_handler) -> usize;
    pub fn webui_show(window: usize, content: *const c_char) -> bool;
    pub fn webui_show_browser(window: usize, content: *const c_char, browser: usize) -> bool;
    pub fn webui_set_kiosk(window: usize, status: bool);
    pub fn webui_wait();
    pub fn webui_close(window: usize);
    pub fn webui_destroy(window: usize);
    pub fn webui_exit();
    pub fn webui_set_root_folder(window: usize, path: *const c_char) -> bool;
    pub fn webui_set_default_root_folder(path: *const c_char) -> bool;
    pub fn webui_is_shown(window: usize) -> bool;
    pub fn webui_set_timeout(second: usize);
    pub fn webui_set_icon(window: usize, icon: *const c_char, icon_type: *const c_char);
    pub fn webui_encode(str: *const c_char) -> *mut c_char;
    pub fn webui_decode(str: *const c_char) -> *mut c_char;
    pub fn webui_free(ptr: *mut c_void);
    pub fn webui_set_hide(window: usize, status: bool);
    pub fn webui_set_size(window: usize, width: c_uint, height: c_uint);
    pub fn webui_set_position(window: usize, x: c_uint, y: c_uint);
    pub fn webui_set_profile(window: usize, name: *const c_char, path: *const c_char);
    pub fn webui_get_url(window: usize) -> *const c_char;
    pub fn webui_navigate(window: usize, url: *const c_char);

    // -- JavaScript ------------------------------------------------------
    pub fn webui_run(window: usize, script: *const c_char);
    pub fn webui_script(
        window: usize,
        script: *const c_char,
        timeout: usize,
        buffer: *mut c_char,
        buffer_length: usize,
    ) -> bool;
    pub fn webui_set_runtime(window: usize, runtime: usize);

    // -- Event arguments -------------------------------------------------
    pub fn webui_get_int_at(e: *mut webui_event_t, index: usize) -> c_longlong;
    pub fn webui_get_int(e: *mut webui_event_t) -> c_longlong;
    pub fn webui_get_string_at(e: *mut webui_event_t, index: usize) -> *const c_char;
    pub fn webui_get_string(e: *mut webui_event_t) -> *const c_char;
    pub fn webui_get_bool_at(e: *mut webui_event_t, index: usize) -> bool;
    pub fn webui_get_bool(e: *mut webui_event_t) -> bool;
    pub fn webui_get_size_at(e: *mut webui_event_t, index: usize) -> usize;
    pub fn webui_get_size(e: *mut webui_event_t) -> usize;

    // -- Wrapper interface -----------------------------------------------
    pub fn webui_interface_set_response(
        window: usize,
        event_number: usize,
        response: *const c_char,
    );
}
