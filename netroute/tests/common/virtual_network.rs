use std::collections::{BTreeMap, BTreeSet};

use netroute::concepts::packet::Packet;
use netroute::concepts::table::ForwardEntry;
use netroute::framework::RoutingSystem;
use netroute::router::{NoObserver, RoutingEngine};

pub struct VirtualSystem;

impl RoutingSystem for VirtualSystem {
    type NodeAddress = String;
    /// both ends of a link use the link id as their port
    type Port = i32;
    type Observer = NoObserver;
}

pub const TICK_MS: u64 = 1000;

/// A set of engines joined by lossless links, packets travel one hop per tick
pub struct VirtualNetwork<E: RoutingEngine<VirtualSystem>> {
    pub routers: Vec<E>,
    /// link id -> (a, b, cost)
    pub links: BTreeMap<i32, (String, String, u16)>,
    /// (receiving node, arrival port, packet)
    pub in_flight: Vec<(String, i32, Packet<VirtualSystem>)>,
    /// every packet ever put on a link
    pub sent: Vec<Packet<VirtualSystem>>,
    pub now: u64,
}

impl<E: RoutingEngine<VirtualSystem>> VirtualNetwork<E> {
    pub fn create(nodes: &[&str], links: &[(i32, &str, &str, u16)], make: impl Fn(String) -> E) -> Self {
        let mut network = VirtualNetwork {
            routers: nodes.iter().map(|id| make(id.to_string())).collect(),
            links: BTreeMap::new(),
            in_flight: Vec::new(),
            sent: Vec::new(),
            now: 0,
        };
        for (id, a, b, cost) in links {
            network.connect(*id, a, b, *cost);
        }
        network
    }

    pub fn connect(&mut self, id: i32, a: &str, b: &str, cost: u16) {
        self.links.insert(id, (a.to_string(), b.to_string(), cost));
        self.get_node(a).handle_new_link(id, b.to_string(), cost);
        self.get_node(b).handle_new_link(id, a.to_string(), cost);
        self.flush_packets();
    }

    pub fn disconnect(&mut self, id: i32) {
        let (a, b, _) = self.links.remove(&id).unwrap_or_else(|| panic!("No link {id} found"));
        self.in_flight.retain(|(_, port, _)| *port != id);
        self.get_node(&a).handle_remove_link(&id);
        self.get_node(&b).handle_remove_link(&id);
        self.flush_packets();
    }

    pub fn get_node(&mut self, node: &str) -> &mut E {
        self.routers
            .iter_mut()
            .find(|r| r.address() == node)
            .unwrap_or_else(|| panic!("No node {node} found"))
    }

    pub fn node(&self, node: &str) -> &E {
        self.routers
            .iter()
            .find(|r| r.address() == node)
            .unwrap_or_else(|| panic!("No node {node} found"))
    }

    pub fn route(&self, cur: &str, dst: &str) -> Option<&ForwardEntry<VirtualSystem>> {
        self.node(cur).forwarding_table().get(&dst.to_string())
    }

    pub fn get_next_hop(&self, cur: &str, dst: &str) -> String {
        self.route(cur, dst)
            .unwrap_or_else(|| panic!("No route found to {dst}"))
            .next_hop
            .clone()
    }

    pub fn get_cost_to(&self, cur: &str, dst: &str) -> u32 {
        self.route(cur, dst)
            .unwrap_or_else(|| panic!("No route found to {dst}"))
            .cost
    }

    /// follows the forwarding tables hop by hop, None if a node along the way has no route
    pub fn trace(&self, src: &str, dst: &str) -> Option<Vec<String>> {
        let mut path = vec![src.to_string()];
        let mut cur = src.to_string();
        while cur != dst {
            let port = self.node(&cur).forward(&dst.to_string())?;
            cur = self.other_end(port, &cur);
            path.push(cur.clone());
            if path.len() > self.routers.len() {
                panic!("Forwarding loop: {path:?}");
            }
        }
        Some(path)
    }

    fn other_end(&self, link: i32, node: &str) -> String {
        let (a, b, _) = &self.links[&link];
        if a == node {
            b.clone()
        } else {
            a.clone()
        }
    }

    pub fn flush_packets(&mut self) {
        let mut outbound = Vec::new();
        for router in &mut self.routers {
            let from = router.address().clone();
            for packet in router.outbound_packets().drain(..) {
                outbound.push((from.clone(), packet));
            }
        }
        for (from, packet) in outbound {
            if !self.links.contains_key(&packet.port) {
                continue; // sent on a detached port
            }
            let to = self.other_end(packet.port, &from);
            self.sent.push(packet.packet.clone());
            self.in_flight.push((to, packet.port, packet.packet));
        }
    }

    pub fn tick(&mut self) {
        for (node, port, packet) in std::mem::take(&mut self.in_flight) {
            self.get_node(&node).handle_packet(&port, packet);
        }
        self.now += TICK_MS;
        let now = self.now;
        for router in &mut self.routers {
            router.handle_time(now);
        }
        self.flush_packets();
    }

    pub fn tick_n(&mut self, times: i32) {
        for _ in 0..times {
            self.tick();
        }
    }

    /// all pairs shortest path over the links currently attached
    pub fn shortest_distances(&self) -> BTreeMap<(String, String), u32> {
        let nodes: BTreeSet<String> = self.routers.iter().map(|r| r.address().clone()).collect();
        let mut dist = BTreeMap::new();
        for n in &nodes {
            dist.insert((n.clone(), n.clone()), 0u32);
        }
        for (a, b, cost) in self.links.values() {
            for key in [(a.clone(), b.clone()), (b.clone(), a.clone())] {
                let entry = dist.entry(key).or_insert(u32::MAX);
                *entry = (*entry).min(*cost as u32);
            }
        }
        for k in &nodes {
            for i in &nodes {
                for j in &nodes {
                    let (Some(ik), Some(kj)) = (dist.get(&(i.clone(), k.clone())), dist.get(&(k.clone(), j.clone()))) else {
                        continue;
                    };
                    let through = ik.saturating_add(*kj);
                    let entry = dist.entry((i.clone(), j.clone())).or_insert(u32::MAX);
                    *entry = (*entry).min(through);
                }
            }
        }
        dist
    }

    /// every node must route every other node along a minimum cost path, paths at or above `limit`
    /// must not be routed at all
    pub fn assert_shortest_paths(&self, limit: Option<u32>) {
        let dist = self.shortest_distances();
        for router in &self.routers {
            let src = router.address();
            assert!(router.forwarding_table().iter().all(|(dst, _)| dst != src), "{src} routes to itself");
            for other in &self.routers {
                let dst = other.address();
                if src == dst {
                    continue;
                }
                let best = dist.get(&(src.clone(), dst.clone())).copied().unwrap_or(u32::MAX);
                let routable = best != u32::MAX && limit.map_or(true, |limit| best < limit);
                let entry = router.forwarding_table().get(dst);
                if !routable {
                    assert!(!router.forwarding_table().contains(dst), "{src} should not route {dst}");
                    continue;
                }
                let entry = entry.unwrap_or_else(|| panic!("{src} has no route to {dst}"));
                assert_eq!(entry.cost, best, "{src} -> {dst}");

                let (a, b, link_cost) = &self.links[&entry.port];
                let hop = if a == src { b } else { a };
                assert_eq!(*hop, entry.next_hop, "{src} -> {dst}, port does not lead to next hop");
                let rest = dist.get(&(hop.clone(), dst.clone())).copied().unwrap_or(u32::MAX);
                assert_eq!(*link_cost as u32 + rest, best, "{src} -> {dst} first hop is not on a shortest path");
            }
        }
    }
}
