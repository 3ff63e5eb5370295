use std::env;
use std::str::FromStr;

pub const DEFAULT_GENAI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GENAI_MODEL: &str = "gemini-1.5-flash";

fn parse_env_or<T: FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_opt<T: FromStr>(var: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) if val.trim().is_empty() => None,
        Ok(val) => match val.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Ignoring.", val, var, e);
                None
            }
        },
        Err(_) => None,
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub ocr: OcrConfig,
    pub remote: RemoteConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
    pub log_json: bool,
}

/// Offline OCR engine settings.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// When false the offline engine is never initialized and `/api/ocr`
    /// answers 501.
    pub enabled: bool,
    pub languages: String,
    pub data_path: Option<String>,
    pub timeout_secs: u64,
}

/// Remote multimodal model settings.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub audio_mode: AudioMode,
}

/// How audio reaches the remote model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AudioMode {
    /// Base64 bytes embedded in the generation request.
    #[default]
    Inline,
    /// Staged to disk, uploaded out of band, then referenced by file URI.
    Upload,
}

impl FromStr for AudioMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inline" => Ok(AudioMode::Inline),
            "upload" | "file" => Ok(AudioMode::Upload),
            other => Err(format!("unknown audio mode '{other}' (expected inline or upload)")),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            languages: "eng".to_string(),
            data_path: None,
            timeout_secs: 60,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GENAI_MODEL.to_string(),
            base_url: DEFAULT_GENAI_BASE_URL.to_string(),
            timeout_secs: 60,
            audio_mode: AudioMode::Inline,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("SIGNSIGHT_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("SIGNSIGHT_PORT", 5000),
                max_body_bytes: parse_env_or("SIGNSIGHT_MAX_BODY_BYTES", 25 * 1024 * 1024),
                log_json: log_json_from_env(),
            },
            ocr: OcrConfig {
                enabled: parse_env_or("OCR_ENABLED", true),
                languages: env::var("OCR_LANGUAGES").unwrap_or_else(|_| "eng".to_string()),
                data_path: parse_env_opt("OCR_DATA_PATH"),
                timeout_secs: parse_env_or("OCR_TIMEOUT", 60),
            },
            remote: RemoteConfig {
                api_key: parse_env_opt("GENAI_API_KEY"),
                model: env::var("GENAI_MODEL").unwrap_or_else(|_| DEFAULT_GENAI_MODEL.to_string()),
                base_url: env::var("GENAI_BASE_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or_else(|_| DEFAULT_GENAI_BASE_URL.to_string()),
                timeout_secs: parse_env_or("GENAI_TIMEOUT", 60),
                audio_mode: parse_env_or("GENAI_AUDIO_MODE", AudioMode::Inline),
            },
        }
    }
}

/// `SIGNSIGHT_LOG_JSON`, read on its own so logging can start before the
/// rest of the configuration is parsed. Anything but `true` means plain text.
pub fn log_json_from_env() -> bool {
    env::var("SIGNSIGHT_LOG_JSON")
        .map(|val| val.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}
