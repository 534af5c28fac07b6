//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Invocation orchestrator constants
pub mod chain {
    /// Default attempts per transport
    pub const DEFAULT_RETRIES: u32 = 3;

    /// Base delay for backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 2000;
}

/// Gemini API constants
pub mod gemini {
    pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

    pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

    /// Environment variable holding the credential
    pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

    pub const TEMPERATURE: f32 = 0.0;

    pub const TOP_P: f32 = 0.95;

    pub const TOP_K: u32 = 64;

    pub const MAX_OUTPUT_TOKENS: u32 = 8192;

    pub const RESPONSE_MIME_TYPE: &str = "application/json";

    /// Harm categories, each blocked at medium and above
    pub const HARM_CATEGORIES: [&str; 4] = [
        "HARM_CATEGORY_HARASSMENT",
        "HARM_CATEGORY_HATE_SPEECH",
        "HARM_CATEGORY_SEXUALLY_EXPLICIT",
        "HARM_CATEGORY_DANGEROUS_CONTENT",
    ];

    pub const SAFETY_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";

    /// Failure message when a candidate carries no text
    pub const NO_RESPONSE_TEXT: &str = "No response text received from API";
}

/// Relay constants
pub mod relay {
    /// Route the relay server mounts the proxy on
    pub const DEFAULT_PATH: &str = "/api/gemini-proxy";

    /// Default relay URL used by the relay transport
    pub const DEFAULT_URL: &str = "http://127.0.0.1:8787/api/gemini-proxy";

    /// Default bind address for the relay server
    pub const DEFAULT_BIND: &str = "127.0.0.1:8787";

    /// Prefix of the relay's missing-credential error
    pub const CONFIG_ERROR_PREFIX: &str = "Server configuration error";

    /// Relay answer when it holds no Gemini key
    pub const MISSING_KEY_ERROR: &str = "Server configuration error: API key not configured";
}

/// Fallback analyzer constants
pub mod fallback {
    /// Tokens must be strictly longer than this to count as keywords
    pub const MIN_TOKEN_LEN: usize = 3;

    /// Below this match percentage an ATS is assumed to reject
    pub const AUTO_REJECT_BELOW: u8 = 30;

    pub const HARD_SKILLS: [&str; 10] = [
        "javascript",
        "react",
        "python",
        "java",
        "sql",
        "html",
        "css",
        "node",
        "angular",
        "vue",
    ];

    pub const SOFT_SKILLS: [&str; 6] = [
        "leadership",
        "communication",
        "teamwork",
        "problem-solving",
        "analytical",
        "adaptability",
    ];
}

/// Document extraction constants
pub mod extraction {
    /// Maximum accepted file size (50MB)
    pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

    /// Only the first pages of a PDF are read
    pub const MAX_PDF_PAGES: usize = 10;
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Timeout for the preflight reachability probe (seconds)
    pub const PROBE_TIMEOUT_SECS: u64 = 5;
}
