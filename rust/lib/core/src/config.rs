/// Runtime configuration shared by admin console engines.
///
/// Screens parse these from command-line style flags (or construct them
/// directly), then hand them to the backend client and editing sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Base URL of the platform REST API.
    pub api_base: String,

    /// Static bearer token. `None` sends anonymous requests.
    pub access_token: Option<String>,

    /// Quiet period before a candidate search is issued (milliseconds).
    pub search_debounce_ms: u64,

    /// Page size for candidate search results.
    pub search_page_size: usize,

    /// Per-request timeout for backend calls (seconds).
    pub request_timeout_secs: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8080".to_string(),
            access_token: None,
            search_debounce_ms: 300,
            search_page_size: 20,
            request_timeout_secs: 30,
        }
    }
}

impl ConsoleConfig {
    /// Parse configuration from command-line arguments.
    ///
    /// Supported flags:
    /// - `--api=URL`
    /// - `--token=TOKEN`
    /// - `--search-debounce-ms=N`
    /// - `--search-page-size=N`
    /// - `--timeout-secs=N`
    ///
    /// Unknown flags and unparsable numbers are ignored (defaults stay).
    pub fn from_args(args: &[String]) -> Self {
        let mut config = ConsoleConfig::default();

        for arg in args {
            if let Some(val) = arg.strip_prefix("--api=") {
                config.api_base = val.trim_end_matches('/').to_string();
            } else if let Some(val) = arg.strip_prefix("--token=") {
                config.access_token = (!val.is_empty()).then(|| val.to_string());
            } else if let Some(val) = arg.strip_prefix("--search-debounce-ms=") {
                if let Ok(n) = val.parse() {
                    config.search_debounce_ms = n;
                }
            } else if let Some(val) = arg.strip_prefix("--search-page-size=") {
                if let Ok(n) = val.parse() {
                    config.search_page_size = n;
                }
            } else if let Some(val) = arg.strip_prefix("--timeout-secs=") {
                if let Ok(n) = val.parse() {
                    config.request_timeout_secs = n;
                }
            }
        }

        config
    }

    pub fn search_debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.search_debounce_ms)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}
