use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fs;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use dnswalk::dns_parser::Type;
use dnswalk::ResolverConfig;

#[derive(Parser)]
#[command(name = "dnswalk")]
#[command(version)]
#[command(about = "Resolve names by walking the DNS hierarchy from the root servers", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Server to start the walk from, may be repeated
    #[arg(long = "root", value_name = "IP")]
    roots: Vec<IpAddr>,

    /// Recursive resolver for `lookup` and `ns`
    #[arg(long, value_name = "IP")]
    server: Option<IpAddr>,

    /// Destination port of every query
    #[arg(long)]
    port: Option<u16>,

    /// Per-query timeout, e.g. "5s" or "500ms"
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Largest response accepted, in bytes
    #[arg(long, value_name = "BYTES")]
    recv_buffer_size: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a name iteratively, following referrals from the roots
    Resolve {
        name: String,

        /// Record type, as mnemonic or number
        #[arg(short = 't', long = "type", default_value = "A")]
        qtype: Type,
    },

    /// Ask the recursive resolver directly
    Lookup {
        name: String,

        #[arg(short = 't', long = "type", default_value = "A")]
        qtype: Type,
    },

    /// Ask the recursive resolver for the name servers of a domain
    Ns { name: String },

    /// Run every query of a JSON file and write the results as JSON
    Batch {
        #[arg(value_enum)]
        mode: Mode,

        /// JSON array of {"qname": .., "qtype": ..}
        input: PathBuf,

        /// Where to write the results, besides stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Resolve,
    Lookup,
    Ns,
}

#[derive(Debug, Serialize, Deserialize)]
struct BatchQuery {
    qname: String,
    qtype: u16,
}

fn load_config(cli: &Cli) -> Result<ResolverConfig> {
    let mut config = match cli.config {
        Some(ref path) => ResolverConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ResolverConfig::default(),
    };

    if !cli.roots.is_empty() {
        config.root_servers = cli.roots.clone();
    }
    if let Some(server) = cli.server {
        config.recursive_server = server;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(timeout) = cli.timeout {
        config.timeout = timeout;
    }
    if let Some(size) = cli.recv_buffer_size {
        config.recv_buffer_size = size;
    }
    config.validate()?;
    Ok(config)
}

fn run_one(config: &ResolverConfig, mode: Mode, qname: &str, qtype: Type) -> Result<Value> {
    let mut resolver = dnswalk::udp_resolver(config.clone());
    let value = match mode {
        Mode::Resolve => {
            let resolution = resolver.resolve(qname, qtype)?;
            json!({
                "query": { "qname": qname, "qtype": u16::from(qtype) },
                "result": resolution,
            })
        }
        Mode::Lookup => {
            let response = resolver.lookup(qname, qtype)?;
            json!({
                "query": { "qname": qname, "qtype": u16::from(qtype) },
                "response": response,
            })
        }
        Mode::Ns => {
            let (domain, response) = resolver.lookup_delegation(qname)?;
            json!({
                "query": { "qname": domain, "qtype": u16::from(Type::NS) },
                "response": response,
            })
        }
    };
    Ok(value)
}

fn run_batch(config: &ResolverConfig, mode: Mode, input: &PathBuf) -> Result<Vec<Value>> {
    let content = fs::read_to_string(input)
        .with_context(|| format!("reading queries from {}", input.display()))?;
    let queries: Vec<BatchQuery> = serde_json::from_str(&content)
        .with_context(|| format!("parsing queries from {}", input.display()))?;
    info!("running {} queries from {}", queries.len(), input.display());

    let mut results = Vec::with_capacity(queries.len());
    for query in queries {
        let result = match run_one(config, mode, &query.qname, Type::from(query.qtype)) {
            Ok(result) => result,
            Err(err) => json!({ "query": query, "error": format!("{:#}", err) }),
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
        results.push(result);
    }
    Ok(results)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "dnswalk=debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(filter)).init();

    let config = load_config(&cli)?;
    debug!("configuration: {:?}", config);

    match cli.command {
        Commands::Resolve { ref name, qtype } => {
            let result = run_one(&config, Mode::Resolve, name, qtype)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if result["result"]["success"] != true {
                bail!("could not resolve {}", name);
            }
        }
        Commands::Lookup { ref name, qtype } => {
            let result = run_one(&config, Mode::Lookup, name, qtype)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Ns { ref name } => {
            let result = run_one(&config, Mode::Ns, name, Type::NS)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Batch {
            mode,
            ref input,
            ref output,
        } => {
            let results = run_batch(&config, mode, input)?;
            if let Some(output) = output {
                fs::write(output, serde_json::to_string_pretty(&results)?)
                    .with_context(|| format!("writing results to {}", output.display()))?;
                info!("results saved to {}", output.display());
            }
        }
    }

    Ok(())
}
