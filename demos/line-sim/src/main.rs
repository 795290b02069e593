use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs;

use anyhow::{bail, Context};
use log::info;
use netroute::framework::RoutingSystem;
use netroute::router::dv::DvRouter;
use netroute::router::ls::LsRouter;
use netroute::router::{LogObserver, RoutingEngine};
use simplelog::*;

struct DemoSystem {}
impl RoutingSystem for DemoSystem {
    type NodeAddress = String;
    type Port = usize; // index of the link in the topology
    type Observer = LogObserver;
}

const HEARTBEAT_MS: u64 = 1000;

struct Link {
    a: String,
    b: String,
    cost: u16,
}

fn parse_topology(text: &str) -> anyhow::Result<Vec<Link>> {
    let mut links = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        let [a, b, cost] = parts[..] else {
            bail!("line {}: expected `<node> <node> <cost>`", lineno + 1);
        };
        if a == b {
            bail!("line {}: {a} is linked to itself", lineno + 1);
        }
        let cost = cost
            .parse()
            .with_context(|| format!("line {}: bad cost {cost:?}", lineno + 1))?;
        links.push(Link {
            a: a.to_string(),
            b: b.to_string(),
            cost,
        });
    }
    Ok(links)
}

fn default_topology() -> Vec<Link> {
    // A <-> B <-> C
    vec![
        Link { a: "A".into(), b: "B".into(), cost: 1 },
        Link { a: "B".into(), b: "C".into(), cost: 1 },
    ]
}

/// runs one engine kind over the topology and prints every node once it settles
fn simulate<E>(name: &str, links: &[Link], make: impl Fn(String) -> E) -> anyhow::Result<()>
where
    E: RoutingEngine<DemoSystem> + Display,
{
    info!("Simulating {name} over {} links", links.len());

    let mut nodes: BTreeMap<String, E> = BTreeMap::new();
    for link in links {
        for addr in [&link.a, &link.b] {
            nodes.entry(addr.clone()).or_insert_with(|| make(addr.clone()));
        }
    }
    for (port, link) in links.iter().enumerate() {
        nodes.get_mut(&link.a).context("missing node")?.handle_new_link(port, link.b.clone(), link.cost);
        nodes.get_mut(&link.b).context("missing node")?.handle_new_link(port, link.a.clone(), link.cost);
    }

    // packets cross one link per step, enough steps for any path to be learned
    let steps = nodes.len() as u64 * 2 + 2;
    for step in 1..=steps {
        let mut deliveries = Vec::new();
        for (addr, node) in nodes.iter_mut() {
            for out in node.outbound_packets().drain(..) {
                let link = &links[out.port];
                let to = if link.a == *addr { &link.b } else { &link.a };
                deliveries.push((to.clone(), out.port, out.packet));
            }
        }
        for (to, port, packet) in deliveries {
            nodes.get_mut(&to).context("missing node")?.handle_packet(&port, packet);
        }
        for node in nodes.values_mut() {
            node.handle_time(step * HEARTBEAT_MS);
        }
    }

    println!("== {name} ==");
    for node in nodes.values() {
        println!("{node}");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    CombinedLogger::init(vec![TermLogger::new(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )])?;

    let links = match std::env::args().nth(1) {
        Some(path) => {
            let text = fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))?;
            parse_topology(&text)?
        }
        None => default_topology(),
    };
    if links.is_empty() {
        bail!("topology has no links");
    }

    simulate("distance vector", &links, DvRouter::<DemoSystem>::new)?;
    simulate("link state", &links, LsRouter::<DemoSystem>::new)?;
    Ok(())
}
