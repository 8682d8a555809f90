use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::thread;
use std::time::Duration;

use dnswalk::dns_parser::{decode_response, Builder, Class, Name, NsData, RRData, Type};
use dnswalk::{Failure, ResolverConfig};

const LOOPBACK: Ipv4Addr = Ipv4Addr::LOCALHOST;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Plays root, TLD and authority in turn on one loopback socket: the first
/// `referrals` queries are referred back to the same address through glue,
/// the next one gets an A record for `answer`, or nothing at all.
fn spawn_hierarchy(
    referrals: usize,
    answer: Option<Ipv4Addr>,
) -> (SocketAddr, thread::JoinHandle<Vec<bool>>) {
    let socket = UdpSocket::bind((LOOPBACK, 0)).unwrap();
    socket
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let addr = socket.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let mut recursion_flags = Vec::new();
        let mut buf = [0u8; 512];
        for round in 0..=referrals {
            let (len, from) = socket.recv_from(&mut buf).unwrap();
            let query = decode_response(&buf[..len]).unwrap();
            recursion_flags.push(query.header.recursion_desired);

            let question = &query.questions[0];
            let builder = Builder::new_response(query.header.id, false, round == referrals)
                .add_question(&question.qname, question.qtype, Class::IN);

            let reply = if round < referrals {
                let ns = Name::from_str(&format!("ns{}.test", round)).unwrap();
                builder
                    .add_nameserver(
                        &Name::from_str("test").unwrap(),
                        Type::NS,
                        172800,
                        &RRData::NS(NsData::Name(ns.clone())),
                    )
                    .add_additional(&ns, Type::A, 172800, &RRData::A(LOOPBACK))
                    .build()
                    .unwrap()
            } else if let Some(ip) = answer {
                builder
                    .add_answer(&question.qname, Type::A, 300, &RRData::A(ip))
                    .build()
                    .unwrap()
            } else {
                builder.build().unwrap()
            };
            socket.send_to(&reply, from).unwrap();
        }
        recursion_flags
    });

    (addr, handle)
}

fn config_for(addr: SocketAddr) -> ResolverConfig {
    ResolverConfig {
        root_servers: vec![addr.ip()],
        port: addr.port(),
        timeout: Duration::from_secs(2),
        ..ResolverConfig::default()
    }
}

#[test]
fn resolve_through_two_referrals() {
    init_logging();
    let target = Ipv4Addr::new(203, 0, 113, 7);
    let (addr, server) = spawn_hierarchy(2, Some(target));

    let mut resolver = dnswalk::udp_resolver(config_for(addr));
    let resolution = resolver.resolve("www.example.test", Type::A).unwrap();

    let answer = resolution.answer().expect("resolution should succeed");
    assert_eq!(answer.data, RRData::A(target));
    assert_eq!(answer.name.as_str(), "www.example.test");
    assert_eq!(resolution.history.len(), 3);
    assert!(resolution
        .history
        .iter()
        .all(|probe| probe.server == IpAddr::V4(LOOPBACK)));

    let recursion_flags = server.join().unwrap();
    assert_eq!(recursion_flags, vec![false, false, false]);
}

#[test]
fn dead_end_is_reported_as_no_referral() {
    init_logging();
    let (addr, server) = spawn_hierarchy(1, None);

    let mut resolver = dnswalk::udp_resolver(config_for(addr));
    let resolution = resolver.resolve("missing.example.test", Type::A).unwrap();

    assert_eq!(resolution.failure(), Some(Failure::NoReferral));
    assert_eq!(resolution.history.len(), 2);
    server.join().unwrap();

    let json = serde_json::to_value(&resolution).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "No referral found");
    assert_eq!(json["query_history"].as_array().unwrap().len(), 2);
}

#[test]
fn unreachable_roots_exhaust_the_worklist() {
    init_logging();
    // bound but never read, so every query times out
    let socket = UdpSocket::bind((LOOPBACK, 0)).unwrap();
    let addr = socket.local_addr().unwrap();

    let mut config = config_for(addr);
    config.timeout = Duration::from_millis(100);
    config.root_servers = vec![addr.ip(), addr.ip()];

    let mut resolver = dnswalk::udp_resolver(config);
    let resolution = resolver.resolve("example.test", Type::A).unwrap();

    assert_eq!(resolution.failure(), Some(Failure::ExhaustedServers));
    assert_eq!(resolution.history.len(), 2);
    assert!(resolution.history.iter().all(|probe| probe.result.is_err()));
}
