//! Error types for the live chart bridge.
//!
//! Each [`ChartBridgeError`] variant carries a stable error code
//! (SCREAMING_SNAKE_CASE) that is included in the Display output and
//! accessible via [`ChartBridgeError::code()`].

/// Stable error codes for programmatic error handling.
pub mod error_codes {
    /// Bridge configuration could not be read or parsed.
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";

    /// The live session rejected the session configuration.
    pub const CONFIG_INSTALL_FAILED: &str = "CONFIG_INSTALL_FAILED";

    /// A function declaration carries an inconsistent parameter schema.
    pub const DECLARATION_INVALID: &str = "DECLARATION_INVALID";

    /// A chart specification is not valid serialized JSON.
    pub const SPEC_MALFORMED: &str = "SPEC_MALFORMED";

    /// The rendering collaborator failed to accept a render.
    pub const RENDER_FAILED: &str = "RENDER_FAILED";

    /// Session-side failure (subscription, tool response, lock poisoning).
    pub const SESSION_ERROR: &str = "SESSION_ERROR";

    /// A live protocol frame could not be decoded or encoded.
    pub const WIRE_INVALID: &str = "WIRE_INVALID";
}

/// Top-level error type for the bridge.
///
/// The Display impl formats as `[CODE] message`.
#[derive(Debug, thiserror::Error)]
pub enum ChartBridgeError {
    /// Bridge configuration could not be read or parsed.
    #[error("[{}] {}", error_codes::CONFIG_INVALID, .0)]
    Config(String),

    /// The live session rejected or failed to install the configuration.
    #[error("[{}] {}", error_codes::CONFIG_INSTALL_FAILED, .0)]
    ConfigInstall(String),

    /// A function declaration failed schema validation.
    #[error("[{}] {}", error_codes::DECLARATION_INVALID, .0)]
    Declaration(String),

    /// The stored chart specification is not valid JSON.
    #[error("[{}] {}", error_codes::SPEC_MALFORMED, .0)]
    MalformedSpec(String),

    /// The rendering collaborator refused the render.
    #[error("[{}] {}", error_codes::RENDER_FAILED, .0)]
    Render(String),

    /// Session-side failure.
    #[error("[{}] {}", error_codes::SESSION_ERROR, .0)]
    Session(String),

    /// A live protocol frame could not be decoded or encoded.
    #[error("[{}] {}", error_codes::WIRE_INVALID, .0)]
    Wire(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChartBridgeError {
    /// Returns the stable error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => error_codes::CONFIG_INVALID,
            Self::ConfigInstall(_) => error_codes::CONFIG_INSTALL_FAILED,
            Self::Declaration(_) => error_codes::DECLARATION_INVALID,
            Self::MalformedSpec(_) => error_codes::SPEC_MALFORMED,
            Self::Render(_) => error_codes::RENDER_FAILED,
            Self::Session(_) => error_codes::SESSION_ERROR,
            Self::Wire(_) => error_codes::WIRE_INVALID,
            Self::Io(_) => error_codes::CONFIG_INVALID,
        }
    }

    /// Returns the inner message without the code prefix.
    pub fn message(&self) -> String {
        match self {
            Self::Config(m)
            | Self::ConfigInstall(m)
            | Self::Declaration(m)
            | Self::MalformedSpec(m)
            | Self::Render(m)
            | Self::Session(m)
            | Self::Wire(m) => m.clone(),
            Self::Io(e) => e.to_string(),
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ChartBridgeError>;
