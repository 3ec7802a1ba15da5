//! WebUI: Rust binding for the WebUI browser-window engine
//!
//! The engine opens an installed browser (or a native web view) as the UI of
//! a program and talks to it over a local web server. This crate wraps its C
//! API in typed window handles, typed callback arguments and JSON replies.
//!
//! # Architecture
//!
//! - `registry`: which callback answers which bind id, per window
//! - `codec`: argument extraction ([`FromArg`]) and reply encoding ([`IntoReply`])
//! - `dispatch`: the single event entry point
//! - `window` / `app`: the public façade
//! - `engine`: the [`Engine`] trait every backend implements
//!
//! # Usage
//!
//! ```rust,ignore
//! use webui::{Event, WebUi};
//!
//! let ui = WebUi::native();
//! let window = ui.new_window();
//! window.bind("increment", |e: &Event| e.arg::<i64>().map(|n| n + 1))?;
//! window.show("<html><script src=\"webui.js\"></script>...</html>")?;
//! ui.wait();
//! ```

mod app;
pub mod codec;
pub mod config;
mod dispatch;
pub mod engine;
pub mod error;
mod event;
pub mod registry;
pub mod types;
mod window;

#[cfg(feature = "native")]
mod native;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used types
pub use app::WebUi;
pub use codec::{FromArg, IntoReply, Json, Reply};
pub use config::{Config, IconConfig, ProfileConfig, RuntimeConfig, WindowConfig};
pub use dispatch::Dispatcher;
pub use engine::{BindId, Engine, WindowId, MAX_ARGS};
pub use error::{Result, WebUiError, WebUiErrorCode};
pub use event::{Event, EventKind, RawEvent};
pub use types::{Browser, Runtime, ScriptOptions, DEFAULT_SCRIPT_BUFFER};
pub use window::Window;

#[cfg(feature = "native")]
pub use native::NativeEngine;
