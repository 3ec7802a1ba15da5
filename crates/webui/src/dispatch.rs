//! Event entry point.
//!
//! The engine calls into [`Dispatcher::dispatch`] once per UI occurrence, on
//! whichever thread it likes and possibly for several windows at once.

use crate::app::Bridge;
use crate::codec::Reply;
use crate::error::Result;
use crate::event::{Event, RawEvent};
use crate::window::Window;
use std::ffi::CString;
use std::sync::Arc;

/// Routes engine events to bound callbacks and sends their replies back.
#[derive(Clone)]
pub struct Dispatcher {
    bridge: Arc<Bridge>,
}

impl Dispatcher {
    pub(crate) fn new(bridge: Arc<Bridge>) -> Self {
        Self { bridge }
    }

    /// Handle one event.
    ///
    /// Returns the reply that was delivered (`Reply::Void` when nothing was
    /// sent). An unregistered bind id is logged and returned as
    /// [`crate::WebUiError::UnknownBinding`]; it means the binding and the
    /// engine disagree about what is registered.
    pub fn dispatch(&self, raw: RawEvent) -> Result<Reply> {
        let (callback, generation) = match self.bridge.registry.lookup(raw.window, raw.bind_id) {
            Ok(found) => found,
            Err(err) => {
                tracing::error!(
                    window = %raw.window,
                    bind_id = %raw.bind_id,
                    element = %raw.element,
                    event_number = raw.event_number,
                    "Event for unregistered binding, engine and binding are out of sync"
                );
                return Err(err);
            }
        };

        tracing::debug!(
            window = %raw.window,
            bind_id = %raw.bind_id,
            element = %raw.element,
            kind = ?raw.kind,
            event_number = raw.event_number,
            "Dispatching event"
        );

        let window = Window::new(raw.window, generation, self.bridge.clone());
        let event = Event::new(raw, window);

        let reply = match callback(&event) {
            Ok(reply) => reply,
            Err(err) => {
                tracing::error!(
                    element = %event.element(),
                    error = %err,
                    "Failed encoding JS result into JSON"
                );
                return Ok(Reply::Void);
            }
        };

        let Reply::Json(text) = &reply else {
            return Ok(Reply::Void);
        };

        // serde_json escapes NUL inside strings, so this only trips on a
        // hand-built Reply.
        let Ok(response) = CString::new(text.as_str()) else {
            tracing::error!(
                element = %event.element(),
                "Response contains an interior NUL byte, not sent"
            );
            return Ok(Reply::Void);
        };

        self.bridge
            .engine
            .set_response(event.window_id(), event.event_number(), &response);
        Ok(reply)
    }
}

// ============================================================================
// Tests
// ============================================================================
