use crate::engine::{BindId, WindowId};

// ============================================================================
// Error Types (8000+ range)
// ============================================================================

/// Error codes for binding operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum WebUiErrorCode {
    /// Callback asked for an argument slot that was not supplied
    MissingArgument = 8000,
    /// Argument could not be converted to the requested type
    Decode = 8001,
    /// Engine refused to show the window
    ShowFailed = 8002,
    /// Engine reported a script failure or timeout
    ScriptFailed = 8003,
    /// Event carried a bind id with no registered callback
    UnknownBinding = 8004,
    /// Callback return value could not be serialized
    Encode = 8005,
    /// String contains an interior NUL byte
    InvalidString = 8006,
    /// Window handle outlived its window
    WindowDestroyed = 8007,
    /// Engine refused a root folder
    RootFolderRejected = 8008,
    /// Configuration could not be read or parsed
    Config = 8009,
    /// Engine could not base64 encode or decode a string
    Transcode = 8010,
}

/// Boxed cause carried by decode and encode errors.
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Custom error type for binding operations
#[derive(Debug, thiserror::Error)]
pub enum WebUiError {
    #[error("[{code}] `{element}` did not receive an argument at index {index}")]
    MissingArgument {
        code: u32,
        element: String,
        index: usize,
    },

    #[error("[{code}] Failed getting argument of type `{type_name}` for `{element}`: {source}")]
    Decode {
        code: u32,
        element: String,
        type_name: &'static str,
        #[source]
        source: Cause,
    },

    #[error("[{code}] Failed showing window: {content}")]
    ShowFailed { code: u32, content: String },

    #[error("[{code}] Failed running script: {script} ({message})")]
    ScriptFailed {
        code: u32,
        script: String,
        message: String,
    },

    #[error("[{code}] No callback registered for bind id {bind_id} on window {window}")]
    UnknownBinding {
        code: u32,
        window: WindowId,
        bind_id: BindId,
    },

    #[error("[{code}] Failed encoding `{type_name}` into JSON: {source}")]
    Encode {
        code: u32,
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("[{code}] {what} contains an interior NUL byte")]
    InvalidString { code: u32, what: &'static str },

    #[error("[{code}] Window {window} was destroyed")]
    WindowDestroyed { code: u32, window: WindowId },

    #[error("[{code}] Root folder rejected: {path}")]
    RootFolderRejected { code: u32, path: String },

    #[error("[{code}] Config error: {message}")]
    Config { code: u32, message: String },

    #[error("[{code}] Engine failed to {op} text")]
    Transcode { code: u32, op: &'static str },
}

impl WebUiError {
    pub fn missing_argument(element: impl Into<String>, index: usize) -> Self {
        Self::MissingArgument {
            code: WebUiErrorCode::MissingArgument as u32,
            element: element.into(),
            index,
        }
    }

    pub fn decode(
        element: impl Into<String>,
        type_name: &'static str,
        source: impl Into<Cause>,
    ) -> Self {
        Self::Decode {
            code: WebUiErrorCode::Decode as u32,
            element: element.into(),
            type_name,
            source: source.into(),
        }
    }

    pub fn show_failed(content: impl Into<String>) -> Self {
        Self::ShowFailed {
            code: WebUiErrorCode::ShowFailed as u32,
            content: content.into(),
        }
    }

    pub fn script_failed(script: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ScriptFailed {
            code: WebUiErrorCode::ScriptFailed as u32,
            script: script.into(),
            message: message.into(),
        }
    }

    pub fn unknown_binding(window: WindowId, bind_id: BindId) -> Self {
        Self::UnknownBinding {
            code: WebUiErrorCode::UnknownBinding as u32,
            window,
            bind_id,
        }
    }

    pub fn encode(type_name: &'static str, source: serde_json::Error) -> Self {
        Self::Encode {
            code: WebUiErrorCode::Encode as u32,
            type_name,
            source,
        }
    }

    pub fn invalid_string(what: &'static str) -> Self {
        Self::InvalidString {
            code: WebUiErrorCode::InvalidString as u32,
            what,
        }
    }

    pub fn window_destroyed(window: WindowId) -> Self {
        Self::WindowDestroyed {
            code: WebUiErrorCode::WindowDestroyed as u32,
            window,
        }
    }

    pub fn root_folder_rejected(path: impl Into<String>) -> Self {
        Self::RootFolderRejected {
            code: WebUiErrorCode::RootFolderRejected as u32,
            path: path.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            code: WebUiErrorCode::Config as u32,
            message: message.into(),
        }
    }

    pub fn transcode(op: &'static str) -> Self {
        Self::Transcode {
            code: WebUiErrorCode::Transcode as u32,
            op,
        }
    }

    /// Numeric code of this error.
    pub fn code(&self) -> u32 {
        match self {
            Self::MissingArgument { code, .. }
            | Self::Decode { code, .. }
            | Self::ShowFailed { code, .. }
            | Self::ScriptFailed { code, .. }
            | Self::UnknownBinding { code, .. }
            | Self::Encode { code, .. }
            | Self::InvalidString { code, .. }
            | Self::WindowDestroyed { code, .. }
            | Self::RootFolderRejected { code, .. }
            | Self::Config { code, .. }
            | Self::Transcode { code, .. } => *code,
        }
    }

    /// True for the one error that signals a binding/engine desync.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::UnknownBinding { .. })
    }
}

pub type Result<T, E = WebUiError> = std::result::Result<T, E>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(WebUiErrorCode::MissingArgument as u32, 8000);
        assert_eq!(WebUiErrorCode::Decode as u32, 8001);
        assert_eq!(WebUiErrorCode::UnknownBinding as u32, 8004);
        assert_eq!(WebUiErrorCode::Config as u32, 8009);
    }

    #[test]
    fn test_error_display() {
        let err = WebUiError::missing_argument("increment", 2);
        assert!(err.to_string().contains("8000"));
        assert!(err.to_string().contains("`increment`"));
        assert!(err.to_string().contains("index 2"));

        let err = WebUiError::script_failed("return 1 +", "timeout");
        assert!(err.to_string().contains("8003"));
        assert!(err.to_string().contains("return 1 +"));

        let err = WebUiError::unknown_binding(WindowId(3), BindId(9));
        assert!(err.to_string().contains("8004"));
        assert!(err.to_string().contains("bind id 9"));
        assert!(err.is_internal());
    }

    #[test]
    fn test_decode_error_keeps_source() {
        let parse = serde_json::from_str::<u8>("nope").unwrap_err();
        let err = WebUiError::decode("save", "Settings", parse);
        assert_eq!(err.code(), 8001);
        assert!(!err.is_internal());
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("`Settings`"));
        assert!(err.to_string().contains("`save`"));
    }
}
