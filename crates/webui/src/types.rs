use serde::{Deserialize, Serialize};

/// Default capacity of the result buffer used by [`crate::Window::script`].
pub const DEFAULT_SCRIPT_BUFFER: usize = 8 * 1024;

/// Browser the engine should launch for a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Browser {
    #[serde(rename = "none")]
    NoBrowser,
    #[default]
    #[serde(rename = "any")]
    AnyBrowser,
    Chrome,
    Firefox,
    Edge,
    Safari,
    Chromium,
    Opera,
    Brave,
    Vivaldi,
    Epic,
    Yandex,
    ChromiumBased,
}

impl Browser {
    /// Value the engine expects on the wire.
    pub fn as_raw(self) -> usize {
        self as usize
    }
}

/// Runtime used by the embedded web server for `.js` and `.ts` files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Runtime {
    #[default]
    None,
    Deno,
    NodeJs,
}

impl Runtime {
    pub fn as_raw(self) -> usize {
        self as usize
    }
}

/// Options for a blocking script call.
///
/// `timeout` is in seconds and zero waits forever. A `buffer_size` of zero
/// falls back to [`DEFAULT_SCRIPT_BUFFER`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptOptions {
    pub timeout: usize,
    pub buffer_size: usize,
}

impl ScriptOptions {
    pub fn with_timeout(mut self, seconds: usize) -> Self {
        self.timeout = seconds;
        self
    }

    pub fn with_buffer_size(mut self, bytes: usize) -> Self {
        self.buffer_size = bytes;
        self
    }

    /// Buffer capacity actually handed to the engine.
    pub fn capacity(&self) -> usize {
        if self.buffer_size == 0 {
            DEFAULT_SCRIPT_BUFFER
        } else {
            self.buffer_size
        }
    }
}
