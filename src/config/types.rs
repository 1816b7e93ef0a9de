use serde::Deserialize;

/// Default system instruction sent with every page
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a documentation engine, which makes docs readily \
available to other LLMs. Given my input, your task is to condense it into a markdown file, and \
brevity must be maintained. Do not add any content other than the markdown file. Inline any code \
explanations, and try omitting any very trivial items.";

/// Main configuration structure for Doc-Digest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
}

/// Where pages come from
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Pages to start from; may be empty when a sitemap is given
    #[serde(default)]
    pub seeds: Vec<String>,

    /// Optional sitemap whose `<loc>` entries are added to the seeds
    #[serde(default)]
    pub sitemap: Option<String>,

    /// Glob over the full URL, e.g. `*docs/*`; `None` accepts every URL
    #[serde(default)]
    pub pattern: Option<String>,

    /// Breadth-first link-following depth (0 = seeds only)
    #[serde(rename = "max-depth", default)]
    pub max_depth: u32,

    /// Capacity of the channel between the source and the dispatcher
    #[serde(rename = "buffer-size", default = "default_buffer_size")]
    pub buffer_size: usize,
}

/// Job dispatch behavior
#[derive(Debug, Clone, Deserialize)]
pub struct DispatcherConfig {
    /// Pause between two job spawns (milliseconds)
    #[serde(rename = "throttle-ms", default = "default_throttle_ms")]
    pub throttle_ms: u64,

    /// Maximum number of jobs running at once
    #[serde(rename = "max-concurrent-jobs", default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: u32,
}

/// Per-job retry behavior
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Multiplier of the exponential backoff (seconds)
    #[serde(rename = "base-delay-secs", default = "default_base_delay_secs")]
    pub base_delay_secs: u64,

    /// Lower bound of a single wait (seconds)
    #[serde(rename = "min-delay-secs", default = "default_min_delay_secs")]
    pub min_delay_secs: u64,

    /// Upper bound of a single wait (seconds)
    #[serde(rename = "max-delay-secs", default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
}

/// Credential pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    /// Environment variables starting with this prefix form the pool
    #[serde(rename = "env-prefix", default = "default_env_prefix")]
    pub env_prefix: String,

    /// How long a rate-limited credential sits out (seconds)
    #[serde(rename = "cooldown-secs", default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

/// Hosted model configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SummarizerConfig {
    /// Base URL of the generative language API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(rename = "system-prompt", default = "default_system_prompt")]
    pub system_prompt: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving one markdown file per URL
    #[serde(default = "default_directory")]
    pub directory: String,

    /// Path prefix removed before deriving a filename
    #[serde(rename = "strip-prefix", default = "default_strip_prefix")]
    pub strip_prefix: String,

    /// Files shorter than this (in characters) are treated as missing
    #[serde(rename = "min-content-chars", default = "default_min_content_chars")]
    pub min_content_chars: usize,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            throttle_ms: default_throttle_ms(),
            max_concurrent_jobs: default_max_concurrent_jobs(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_secs: default_base_delay_secs(),
            min_delay_secs: default_min_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            env_prefix: default_env_prefix(),
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            system_prompt: default_system_prompt(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            strip_prefix: default_strip_prefix(),
            min_content_chars: default_min_content_chars(),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: None,
        }
    }
}

fn default_buffer_size() -> usize {
    16
}

fn default_throttle_ms() -> u64 {
    200
}

fn default_max_concurrent_jobs() -> u32 {
    8
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_secs() -> u64 {
    1
}

fn default_min_delay_secs() -> u64 {
    1
}

fn default_max_delay_secs() -> u64 {
    60
}

fn default_env_prefix() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_cooldown_secs() -> u64 {
    60
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_directory() -> String {
    "docs".to_string()
}

fn default_strip_prefix() -> String {
    "/docs/".to_string()
}

fn default_min_content_chars() -> usize {
    100
}

fn default_crawler_name() -> String {
    "DocDigest".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
