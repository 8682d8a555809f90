use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::dns_parser::HEADER_SIZE;

pub const DNS_PORT: u16 = 53;

/// IPv4 addresses of the thirteen root servers, a.root-servers.net first
pub const ROOT_HINTS: [Ipv4Addr; 13] = [
    Ipv4Addr::new(198, 41, 0, 4),
    Ipv4Addr::new(170, 247, 170, 2),
    Ipv4Addr::new(192, 33, 4, 12),
    Ipv4Addr::new(199, 7, 91, 13),
    Ipv4Addr::new(192, 203, 230, 10),
    Ipv4Addr::new(192, 5, 5, 241),
    Ipv4Addr::new(192, 112, 36, 4),
    Ipv4Addr::new(198, 97, 190, 53),
    Ipv4Addr::new(192, 36, 148, 17),
    Ipv4Addr::new(192, 58, 128, 30),
    Ipv4Addr::new(193, 0, 14, 129),
    Ipv4Addr::new(199, 7, 83, 42),
    Ipv4Addr::new(202, 12, 27, 33),
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Everything the resolver needs that is not part of the question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Servers the iterative walk starts from, tried in order
    pub root_servers: Vec<IpAddr>,
    /// Recursive resolver used by plain lookups
    pub recursive_server: IpAddr,
    pub port: u16,
    /// How long to wait for each response
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Largest response datagram accepted
    pub recv_buffer_size: usize,
    /// Upper bound on queries sent during one resolution
    pub max_probes: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            root_servers: ROOT_HINTS.iter().map(|&ip| IpAddr::V4(ip)).collect(),
            recursive_server: IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)),
            port: DNS_PORT,
            timeout: Duration::from_secs(5),
            recv_buffer_size: 512,
            max_probes: 64,
        }
    }
}

impl ResolverConfig {
    /// Reads a TOML file; missing keys keep their default
    pub fn load(path: &Path) -> Result<ResolverConfig, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let config: ResolverConfig =
            toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_owned(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root_servers.is_empty() {
            return Err(ConfigError::Invalid("root_servers must not be empty"));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid("timeout must be greater than zero"));
        }
        if self.recv_buffer_size < HEADER_SIZE {
            return Err(ConfigError::Invalid(
                "recv_buffer_size must hold at least a message header",
            ));
        }
        if self.max_probes == 0 {
            return Err(ConfigError::Invalid("max_probes must be greater than zero"));
        }
        Ok(())
    }
}
