//! Конфигурация сервера: флаги командной строки и переменные окружения

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::preprocessing::TableLimits;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Parser)]
#[command(name = "dp-utility")]
#[command(about = "Differential-privacy CSV anonymizer and private model utility evaluator", long_about = None)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, default_value_t = SocketAddr::from(([0, 0, 0, 0], 5000)), env = "DP_UTILITY_ADDR")]
    pub addr: SocketAddr,

    /// Directory for uploads and anonymized outputs, created at startup
    #[arg(long, default_value = "uploads", env = "DP_UTILITY_UPLOAD_DIR")]
    pub upload_dir: PathBuf,

    /// Request body limit in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES, env = "DP_UTILITY_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: usize,

    #[command(flatten)]
    pub limits: TableLimits,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            limits: TableLimits::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::try_parse_from(["dp-utility"]).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.addr.port(), 5000);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::try_parse_from([
            "dp-utility",
            "--addr",
            "127.0.0.1:8080",
            "--upload-dir",
            "/tmp/dp",
            "--max-rows",
            "10",
        ])
        .unwrap();

        assert_eq!(config.addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.upload_dir, PathBuf::from("/tmp/dp"));
        assert_eq!(config.limits.max_rows, 10);
        assert_eq!(config.limits.max_columns, 512);
    }

    #[test]
    fn test_invalid_value() {
        let err = ServerConfig::try_parse_from(["dp-utility", "--max-columns", "many"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
