use crate::codec::FromArg;
use crate::engine::{BindId, Engine, WindowId};
use crate::error::{Result, WebUiError};
use crate::window::Window;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened in the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Disconnected,
    Connected,
    MouseClick,
    Navigation,
    Callback,
    /// A kind this binding does not know about yet.
    Unknown(usize),
}

impl EventKind {
    pub fn as_raw(self) -> usize {
        match self {
            Self::Disconnected => 0,
            Self::Connected => 1,
            Self::MouseClick => 2,
            Self::Navigation => 3,
            Self::Callback => 4,
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<usize> for EventKind {
    fn from(raw: usize) -> Self {
        match raw {
            0 => Self::Disconnected,
            1 => Self::Connected,
            2 => Self::MouseClick,
            3 => Self::Navigation,
            4 => Self::Callback,
            other => Self::Unknown(other),
        }
    }
}

/// Event descriptor exactly as the engine delivers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub window: WindowId,
    pub kind: EventKind,
    pub element: String,
    /// Correlates the response with the JS-side promise. Valid for one
    /// dispatch only.
    pub event_number: usize,
    pub bind_id: BindId,
}

/// One UI occurrence, handed to a bound callback.
pub struct Event {
    raw: RawEvent,
    window: Window,
}

impl Event {
    pub(crate) fn new(raw: RawEvent, window: Window) -> Self {
        Self { raw, window }
    }

    /// Handle to the window the event came from. Calls made through it
    /// while the callback runs go straight back into the engine.
    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn window_id(&self) -> WindowId {
        self.raw.window
    }

    pub fn kind(&self) -> EventKind {
        self.raw.kind
    }

    pub fn element(&self) -> &str {
        &self.raw.element
    }

    pub fn event_number(&self) -> usize {
        self.raw.event_number
    }

    pub fn bind_id(&self) -> BindId {
        self.raw.bind_id
    }

    pub fn raw(&self) -> &RawEvent {
        &self.raw
    }

    /// Byte length of the first argument.
    pub fn size(&self) -> usize {
        self.size_at(0)
    }

    pub fn size_at(&self, index: usize) -> usize {
        self.engine().size_at(&self.raw, index)
    }

    pub fn arg_count(&self) -> usize {
        self.engine().arg_count(&self.raw)
    }

    /// First argument converted to `T`.
    pub fn arg<T: FromArg>(&self) -> Result<T> {
        self.arg_at(0)
    }

    /// Argument `index` converted to `T`.
    ///
    /// An empty slot is always [`WebUiError::MissingArgument`], whatever `T`
    /// is; conversion is only attempted on slots that carry data.
    pub fn arg_at<T: FromArg>(&self, index: usize) -> Result<T> {
        if self.size_at(index) == 0 {
            return Err(WebUiError::missing_argument(self.element(), index));
        }
        T::from_arg(self, index)
    }

    pub(crate) fn engine(&self) -> &dyn Engine {
        self.window.engine()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event").field("raw", &self.raw).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_raw_values() {
        for raw in 0..5 {
            assert_eq!(EventKind::from(raw).as_raw(), raw);
        }
        assert_eq!(EventKind::from(4), EventKind::Callback);
        assert_eq!(EventKind::from(42), EventKind::Unknown(42));
        assert_eq!(EventKind::Unknown(42).as_raw(), 42);
    }

    #[test]
    fn test_raw_event_serialization() {
        let raw = RawEvent {
            window: WindowId(1),
            kind: EventKind::MouseClick,
            element: "save".to_string(),
            event_number: 7,
            bind_id: BindId(3),
        };

        let json = serde_json::to_string(&raw).unwrap();
        assert!(json.contains("save"));

        let parsed: RawEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, raw);
    }
}
