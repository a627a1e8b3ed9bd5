use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::{AcceptPolicy, Peer};
use crate::errors::{LocalDropError, Result};

/// Directory name used below the platform config and download directories
pub const APP_NAME: &str = "LocalDrop";

/// Config file name inside the app config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含：
/// - peer: 本机显示名称与对外通告的 IP
/// - transfer: 文件接收端口、下载目录、缓冲区与超时
/// - discovery: UDP 发现与 hello 端口
/// - logging: 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub peer: PeerConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > TOML 文件 > 默认值
    /// ENV 前缀：LD，分隔符：__
    /// 示例：LD__TRANSFER__PORT=9000
    pub fn load(path: Option<&Path>) -> Result<Self> {
        use config::{Config, Environment, File, FileFormat};

        let path = resolve_config_path(path);

        let settings = Config::builder()
            .add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix("LD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| LocalDropError::config(format!("Failed to build config: {}", e)))?;

        let config = settings
            .try_deserialize::<StaticConfig>()
            .map_err(|e| LocalDropError::config(format!("Failed to deserialize config: {}", e)))?;

        if path.exists() {
            eprintln!("[INFO] Configuration loaded from: {}", path.display());
        }
        Ok(config)
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| LocalDropError::serialization(e.to_string()))?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.peer.name {
            Peer::validate_name(name)?;
        }
        if self.transfer.buffer_size == 0 {
            return Err(LocalDropError::config("transfer.buffer_size must be > 0"));
        }
        if self.transfer.connect_timeout_secs == 0 || self.transfer.response_timeout_secs == 0 {
            return Err(LocalDropError::config("transfer timeouts must be > 0"));
        }
        if self.discovery.timeout_ms == 0 {
            return Err(LocalDropError::config("discovery.timeout_ms must be > 0"));
        }
        if self.discovery.discovery_port == self.discovery.hello_port {
            return Err(LocalDropError::config(
                "discovery.discovery_port and discovery.hello_port must differ",
            ));
        }
        Ok(())
    }
}

/// 本机身份配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PeerConfig {
    /// Display name; falls back to the OS user name
    #[serde(default)]
    pub name: Option<String>,
    /// IPv4 announced to other peers; detected when unset
    #[serde(default)]
    pub advertise_ip: Option<String>,
}

/// 文件传输配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// TCP port of the file receiver, 0 picks a free port
    #[serde(default)]
    pub port: u16,
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// How long a sender waits for the receiver's accept/deny decision
    #[serde(default = "default_response_timeout_secs")]
    pub response_timeout_secs: u64,
    #[serde(default)]
    pub accept_policy: AcceptPolicy,
    /// Where the transfer log is persisted; `None` keeps it in memory only
    #[serde(default = "default_log_path")]
    pub log_path: Option<PathBuf>,
}

impl TransferConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.response_timeout_secs)
    }
}

/// UDP 发现配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_discovery_port")]
    pub discovery_port: u16,
    #[serde(default = "default_hello_port")]
    pub hello_port: u16,
    #[serde(default = "default_broadcast_address")]
    pub broadcast_address: String,
    /// How long to collect discovery responses
    #[serde(default = "default_discovery_timeout_ms")]
    pub timeout_ms: u64,
}

impl DiscoveryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions
// ============================================================

/// Base directory when the platform reports none
fn fallback_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// `<config dir>/LocalDrop/config.toml`
///
/// `%APPDATA%` on Windows, `~/Library/Application Support` on macOS,
/// `$XDG_CONFIG_HOME` or `~/.config` elsewhere.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(fallback_dir)
        .join(APP_NAME)
        .join(CONFIG_FILE_NAME)
}

/// The config file actually used
///
/// An explicit path wins. Otherwise the platform file, or `./config.toml`
/// when only that one exists.
pub fn resolve_config_path(path: Option<&Path>) -> PathBuf {
    if let Some(path) = path {
        return path.to_path_buf();
    }
    let platform = default_config_path();
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if !platform.exists() && local.exists() {
        local
    } else {
        platform
    }
}

fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(fallback_dir)
        .join(APP_NAME)
}

fn default_log_path() -> Option<PathBuf> {
    default_config_path()
        .parent()
        .map(|dir| dir.join("transfers.json"))
}

fn default_buffer_size() -> usize {
    64 * 1024
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_response_timeout_secs() -> u64 {
    120
}

fn default_discovery_port() -> u16 {
    8888
}

fn default_hello_port() -> u16 {
    8889
}

fn default_broadcast_address() -> String {
    "255.255.255.255".to_string()
}

fn default_discovery_timeout_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            port: 0,
            download_dir: default_download_dir(),
            buffer_size: default_buffer_size(),
            connect_timeout_secs: default_connect_timeout_secs(),
            response_timeout_secs: default_response_timeout_secs(),
            accept_policy: AcceptPolicy::default(),
            log_path: default_log_path(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            discovery_port: default_discovery_port(),
            hello_port: default_hello_port(),
            broadcast_address: default_broadcast_address(),
            timeout_ms: default_discovery_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}
