//! Iterative resolution: walk from the root servers down the delegation
//! chain, following referrals that come with glue records.

use log::{debug, info, warn};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::collections::VecDeque;
use std::net::{IpAddr, SocketAddr};
use thiserror::Error;

use crate::config::ResolverConfig;
use crate::dns_parser::{
    self, Class, Name, QuerySpec, Question, RRData, ResourceRecord, Response, Type,
};
use crate::transport::{Transport, TransportError};

/// Why a single query to one server produced nothing usable
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("could not encode query: {0}")]
    Encode(#[source] dns_parser::Error),
    #[error("could not decode response: {0}")]
    Decode(#[source] dns_parser::Error),
    #[error("response id {received} does not match query id {expected}")]
    IdMismatch { expected: u16, received: u16 },
}

/// Terminal failures of a whole resolution
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    #[error("No referral found")]
    NoReferral,
    #[error("No glue records found")]
    NoGlueRecords,
    #[error("No servers to query")]
    ExhaustedServers,
    #[error("Gave up after {0} queries")]
    TooManyProbes(usize),
}

/// Where the resolution currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Querying,
    Referred,
    Answered,
    Failed,
}

impl State {
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Answered | State::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Answered(ResourceRecord),
    Failed(Failure),
}

/// One query sent during a resolution and what came back
#[derive(Debug)]
pub struct Probe {
    pub server: IpAddr,
    pub result: Result<Response, ProbeError>,
}

/// The outcome of [`Resolver::resolve`] with every probe made on the way
#[derive(Debug)]
pub struct Resolution {
    pub question: Question,
    pub outcome: Outcome,
    pub history: Vec<Probe>,
}

impl Resolution {
    pub fn answer(&self) -> Option<&ResourceRecord> {
        match self.outcome {
            Outcome::Answered(ref record) => Some(record),
            Outcome::Failed(..) => None,
        }
    }

    pub fn failure(&self) -> Option<Failure> {
        match self.outcome {
            Outcome::Answered(..) => None,
            Outcome::Failed(failure) => Some(failure),
        }
    }

    /// The last response that decoded, usually the one holding the answer
    pub fn last_response(&self) -> Option<&Response> {
        self.history
            .iter()
            .rev()
            .find_map(|probe| probe.result.as_ref().ok())
    }
}

/// Worklist and history of one resolution
///
/// Servers are tried first in, first out, so a whole referral level is
/// exhausted before the next one is entered.
#[derive(Debug)]
pub struct ResolutionState {
    worklist: VecDeque<IpAddr>,
    history: Vec<Probe>,
    state: State,
    outcome: Option<Outcome>,
}

impl ResolutionState {
    pub fn new<I>(roots: I) -> ResolutionState
    where
        I: IntoIterator<Item = IpAddr>,
    {
        ResolutionState {
            worklist: roots.into_iter().collect(),
            history: Vec::new(),
            state: State::Querying,
            outcome: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn worklist(&self) -> &VecDeque<IpAddr> {
        &self.worklist
    }

    pub fn history(&self) -> &[Probe] {
        &self.history
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// Pops the next server to ask
    ///
    /// Returns `None` once the resolution is over; an empty worklist ends it
    /// with [`Failure::ExhaustedServers`].
    pub fn next_server(&mut self) -> Option<IpAddr> {
        if self.state.is_terminal() {
            return None;
        }
        match self.worklist.pop_front() {
            Some(server) => {
                self.state = State::Querying;
                Some(server)
            }
            None => {
                self.fail(Failure::ExhaustedServers);
                None
            }
        }
    }

    /// Records a probe that produced no usable response
    pub fn probe_failed(&mut self, server: IpAddr, error: ProbeError) {
        warn!("query to {} failed: {}", server, error);
        self.history.push(Probe {
            server,
            result: Err(error),
        });
    }

    /// Decides what `response` from `server` means for the resolution
    pub fn inspect(&mut self, server: IpAddr, response: Response) -> State {
        if let Some(answer) = response.answers.iter().find(|rr| rr.is_address()).cloned() {
            debug!("{} answered {} {}", server, answer.name, answer.typ);
            self.record(server, response);
            self.state = State::Answered;
            self.outcome = Some(Outcome::Answered(answer));
            return self.state;
        }

        let mut ns_found = false;
        for authority in response.nameservers.iter().filter(|rr| rr.typ == Type::NS) {
            ns_found = true;
            let ns_name = match authority.ns_name() {
                Some(name) => name,
                None => {
                    warn!(
                        "{} sent an NS record for {} with an undecodable target",
                        server, authority.name
                    );
                    continue;
                }
            };
            for glue in glue_for(&response.additional, ns_name) {
                debug!("{} refers {} to {} at {}", server, authority.name, ns_name, glue);
                self.worklist.push_back(IpAddr::V4(glue));
            }
        }
        self.record(server, response);

        if !ns_found {
            self.fail(Failure::NoReferral);
        } else if self.worklist.is_empty() {
            self.fail(Failure::NoGlueRecords);
        } else {
            self.state = State::Referred;
        }
        self.state
    }

    /// Ends the resolution; still running means the servers ran out
    pub fn finish(mut self, question: Question) -> Resolution {
        let outcome = match self.outcome.take() {
            Some(outcome) => outcome,
            None => Outcome::Failed(Failure::ExhaustedServers),
        };
        Resolution {
            question,
            outcome,
            history: self.history,
        }
    }

    fn fail(&mut self, failure: Failure) {
        debug!("resolution failed: {}", failure);
        self.state = State::Failed;
        self.outcome = Some(Outcome::Failed(failure));
    }

    fn record(&mut self, server: IpAddr, response: Response) {
        self.history.push(Probe {
            server,
            result: Ok(response),
        });
    }
}

/// IPv4 addresses held by the A records in `additional` owned by `ns_name`
fn glue_for<'a>(
    additional: &'a [ResourceRecord],
    ns_name: &'a Name,
) -> impl Iterator<Item = std::net::Ipv4Addr> + 'a {
    additional
        .iter()
        .filter(move |rr| rr.typ == Type::A && rr.name == *ns_name)
        .filter_map(|rr| match rr.data {
            RRData::A(ip) => Some(ip),
            _ => None,
        })
}

/// Sends `spec` to `server` and decodes the reply
pub fn query<T: Transport>(
    transport: &mut T,
    server: SocketAddr,
    spec: &QuerySpec,
) -> Result<Response, ProbeError> {
    let packet = spec.encode().map_err(ProbeError::Encode)?;
    let data = transport.exchange(server, &packet)?;
    let response = dns_parser::decode_response(&data).map_err(ProbeError::Decode)?;
    if response.header.id != spec.id() {
        return Err(ProbeError::IdMismatch {
            expected: spec.id(),
            received: response.header.id,
        });
    }
    Ok(response)
}

/// Drives resolutions over a [`Transport`]
pub struct Resolver<T: Transport> {
    transport: T,
    config: ResolverConfig,
}

impl<T: Transport> Resolver<T> {
    pub fn new(transport: T, config: ResolverConfig) -> Resolver<T> {
        Resolver { transport, config }
    }

    /// Resolves `qname` iteratively, starting at the configured roots
    ///
    /// Only an invalid name is an error; every other outcome, failures
    /// included, is reported in the returned [`Resolution`].
    pub fn resolve(&mut self, qname: &str, qtype: Type) -> Result<Resolution, dns_parser::Error> {
        let question = Question {
            qname: Name::from_str(qname)?,
            qtype,
            qclass: Class::IN,
        };
        QuerySpec::new(0, false)
            .with_question(question.clone())
            .encode()?;

        info!("resolving {} {}", question.qname, question.qtype);
        let mut state = ResolutionState::new(self.config.root_servers.iter().cloned());
        let mut probes = 0;
        while let Some(server) = state.next_server() {
            if probes == self.config.max_probes {
                warn!("giving up on {} after {} queries", question.qname, probes);
                state.fail(Failure::TooManyProbes(probes));
                break;
            }
            probes += 1;

            // recursion is never requested from the servers along the chain
            let spec = QuerySpec::new(rand::random(), false).with_question(question.clone());
            let addr = SocketAddr::new(server, self.config.port);
            debug!("asking {} for {}", addr, question.qname);
            match query(&mut self.transport, addr, &spec) {
                Ok(response) => {
                    state.inspect(server, response);
                }
                Err(error) => state.probe_failed(server, error),
            }
        }

        Ok(state.finish(question))
    }

    /// Sends a single query to the configured recursive server
    pub fn lookup(&mut self, qname: &str, qtype: Type) -> Result<Response, LookupError> {
        let spec = QuerySpec::new(rand::random(), true).question(qname, qtype)?;
        let addr = SocketAddr::new(self.config.recursive_server, self.config.port);
        info!("looking up {} {} at {}", qname, qtype, addr);
        Ok(query(&mut self.transport, addr, &spec)?)
    }

    /// Looks up the name servers of the last two labels of `qname`
    pub fn lookup_delegation(&mut self, qname: &str) -> Result<(Name, Response), LookupError> {
        let domain = Name::from_str(qname)?.registrable_domain();
        let response = self.lookup(domain.as_str(), Type::NS)?;
        Ok((domain, response))
    }
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error(transparent)]
    InvalidQuery(#[from] dns_parser::Error),
    #[error(transparent)]
    Probe(#[from] ProbeError),
}

impl Serialize for Probe {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Probe", 2)?;
        state.serialize_field("server", &self.server)?;
        match self.result {
            Ok(ref response) => state.serialize_field("response", response)?,
            Err(ref error) => state.serialize_field("error", &error.to_string())?,
        }
        state.end()
    }
}

/// `success`, then `answer` and `response` or `error`, then the history
impl Serialize for Resolution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Resolution", 4)?;
        match self.outcome {
            Outcome::Answered(ref answer) => {
                state.serialize_field("success", &true)?;
                state.serialize_field("answer", answer)?;
                state.serialize_field("response", &self.last_response())?;
            }
            Outcome::Failed(failure) => {
                state.serialize_field("success", &false)?;
                state.serialize_field("error", &failure.to_string())?;
            }
        }
        state.serialize_field("query_history", &self.history)?;
        state.end()
    }
}
