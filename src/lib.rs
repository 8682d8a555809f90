//! DNS message codec and an iterative resolver built on it
//!
//! The resolver starts at the root servers and follows referrals, using the
//! glue records found in each response, until some server answers with an
//! address record. Every query sent along the way is kept for inspection.
//!
//! ```no_run
//! use dnswalk::dns_parser::Type;
//! use dnswalk::ResolverConfig;
//!
//! let mut resolver = dnswalk::udp_resolver(ResolverConfig::default());
//! let resolution = resolver.resolve("www.example.com", Type::A).unwrap();
//! if let Some(answer) = resolution.answer() {
//!     println!("{}", answer.data.ip().unwrap_or_default());
//! }
//! ```

pub mod config;
pub mod dns_parser;
pub mod resolver;
pub mod transport;

pub use crate::config::{ConfigError, ResolverConfig, DNS_PORT, ROOT_HINTS};
pub use crate::resolver::{
    query, Failure, LookupError, Outcome, Probe, ProbeError, Resolution, ResolutionState,
    Resolver, State,
};
pub use crate::transport::{Transport, TransportError, UdpTransport};

/// A resolver sending real UDP datagrams with the timeout and buffer size
/// from `config`
pub fn udp_resolver(config: ResolverConfig) -> Resolver<UdpTransport> {
    let transport = UdpTransport::new(config.timeout, config.recv_buffer_size);
    Resolver::new(transport, config)
}
