use std::fmt;

use crate::transfer::protocol::ProtocolError;

#[derive(Debug, Clone)]
pub enum LocalDropError {
    Config(String),
    Network(String),
    Protocol(String),
    FileOperation(String),
    Validation(String),
    NotFound(String),
    Serialization(String),
    TransferDenied(String),
    TransferFailed(String),
    Discovery(String),
    Timeout(String),
}

impl LocalDropError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            LocalDropError::Config(_) => "E001",
            LocalDropError::Network(_) => "E002",
            LocalDropError::Protocol(_) => "E003",
            LocalDropError::FileOperation(_) => "E004",
            LocalDropError::Validation(_) => "E005",
            LocalDropError::NotFound(_) => "E006",
            LocalDropError::Serialization(_) => "E007",
            LocalDropError::TransferDenied(_) => "E008",
            LocalDropError::TransferFailed(_) => "E009",
            LocalDropError::Discovery(_) => "E010",
            LocalDropError::Timeout(_) => "E011",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            LocalDropError::Config(_) => "Configuration Error",
            LocalDropError::Network(_) => "Network Error",
            LocalDropError::Protocol(_) => "Protocol Error",
            LocalDropError::FileOperation(_) => "File Operation Error",
            LocalDropError::Validation(_) => "Validation Error",
            LocalDropError::NotFound(_) => "Resource Not Found",
            LocalDropError::Serialization(_) => "Serialization Error",
            LocalDropError::TransferDenied(_) => "Transfer Denied",
            LocalDropError::TransferFailed(_) => "Transfer Failed",
            LocalDropError::Discovery(_) => "Discovery Error",
            LocalDropError::Timeout(_) => "Timeout",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            LocalDropError::Config(msg)
            | LocalDropError::Network(msg)
            | LocalDropError::Protocol(msg)
            | LocalDropError::FileOperation(msg)
            | LocalDropError::Validation(msg)
            | LocalDropError::NotFound(msg)
            | LocalDropError::Serialization(msg)
            | LocalDropError::TransferDenied(msg)
            | LocalDropError::TransferFailed(msg)
            | LocalDropError::Discovery(msg)
            | LocalDropError::Timeout(msg) => msg,
        }
    }

    /// 格式化为彩色输出
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for LocalDropError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for LocalDropError {}

// 便捷的构造函数
impl LocalDropError {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        LocalDropError::Config(msg.into())
    }

    pub fn network<T: Into<String>>(msg: T) -> Self {
        LocalDropError::Network(msg.into())
    }

    pub fn protocol<T: Into<String>>(msg: T) -> Self {
        LocalDropError::Protocol(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        LocalDropError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        LocalDropError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        LocalDropError::NotFound(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        LocalDropError::Serialization(msg.into())
    }

    pub fn transfer_denied<T: Into<String>>(msg: T) -> Self {
        LocalDropError::TransferDenied(msg.into())
    }

    pub fn transfer_failed<T: Into<String>>(msg: T) -> Self {
        LocalDropError::TransferFailed(msg.into())
    }

    pub fn discovery<T: Into<String>>(msg: T) -> Self {
        LocalDropError::Discovery(msg.into())
    }

    pub fn timeout<T: Into<String>>(msg: T) -> Self {
        LocalDropError::Timeout(msg.into())
    }
}

impl From<std::io::Error> for LocalDropError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => LocalDropError::NotFound(err.to_string()),
            std::io::ErrorKind::TimedOut => LocalDropError::Timeout(err.to_string()),
            std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::AddrInUse
            | std::io::ErrorKind::AddrNotAvailable => LocalDropError::Network(err.to_string()),
            _ => LocalDropError::FileOperation(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for LocalDropError {
    fn from(err: serde_json::Error) -> Self {
        LocalDropError::Serialization(err.to_string())
    }
}

impl From<ProtocolError> for LocalDropError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Io(e) => e.into(),
            other => LocalDropError::Protocol(other.to_string()),
        }
    }
}

impl From<walkdir::Error> for LocalDropError {
    fn from(err: walkdir::Error) -> Self {
        LocalDropError::FileOperation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LocalDropError>;
