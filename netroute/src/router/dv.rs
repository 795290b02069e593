use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::{Display, Formatter};

use serde_json::json;

use crate::concepts::neighbour::{Neighbour, NeighbourTable};
use crate::concepts::packet::{DistanceVectorPayload, OutboundPacket, Packet};
use crate::concepts::route::DvRoute;
use crate::concepts::table::{ForwardEntry, ForwardingTable};
use crate::feedback::{RouterEvent, RoutingError, RoutingWarning};
use crate::framework::{Observer, ProtocolParams, RoutingSystem};
use crate::router::{heartbeat_elapsed, RoutingEngine, INF};
use crate::util::{is_reachable, sum_inf};

/// Distance-vector routing engine
pub struct DvRouter<T: RoutingSystem> {
    pub address: T::NodeAddress,
    pub params: ProtocolParams,
    neighbours: NeighbourTable<T>,
    /// destination -> selected route, always holds the route to ourself
    vector: HashMap<T::NodeAddress, DvRoute<T>>,
    /// neighbour -> the last vector it reported, replaced wholesale
    neighbour_vectors: HashMap<T::NodeAddress, BTreeMap<T::NodeAddress, u16>>,
    table: ForwardingTable<T>,
    /// what we advertised last, the periodic timer rebroadcasts when this is out of date
    last_broadcast: BTreeMap<T::NodeAddress, u16>,
    last_time: u64,
    pub outbound_packets: Vec<OutboundPacket<T>>,
    pub observer: T::Observer,
}

impl<T: RoutingSystem> DvRouter<T> {
    pub fn new(address: T::NodeAddress) -> Self {
        Self::with_params(address, T::config())
    }

    pub fn with_params(address: T::NodeAddress, params: ProtocolParams) -> Self {
        let mut vector = HashMap::new();
        vector.insert(address.clone(), DvRoute {
            cost: 0,
            port: None,
        });
        Self {
            address,
            params,
            neighbours: NeighbourTable::new(),
            vector,
            neighbour_vectors: HashMap::new(),
            table: ForwardingTable::new(),
            last_broadcast: BTreeMap::new(),
            last_time: 0,
            outbound_packets: Vec::new(),
            observer: Default::default(),
        }
    }

    pub fn neighbours(&self) -> &NeighbourTable<T> {
        &self.neighbours
    }

    pub fn route(&self, dst: &T::NodeAddress) -> Option<&DvRoute<T>> {
        self.vector.get(dst)
    }

    pub fn neighbour_vector(&self, neigh: &T::NodeAddress) -> Option<&BTreeMap<T::NodeAddress, u16>> {
        self.neighbour_vectors.get(neigh)
    }

    /// the vector as it would be advertised right now
    pub fn advertisable(&self) -> BTreeMap<T::NodeAddress, u16> {
        self.vector
            .iter()
            .filter(|(_, route)| is_reachable(route.cost))
            .map(|(dst, route)| (dst.clone(), route.cost))
            .collect()
    }

    // region Route Selection

    /// Bellman-Ford relaxation over the neighbour vectors, returns true if the cost or the port of
    /// any destination changed
    pub fn recompute(&mut self) -> bool {
        let mut destinations: BTreeSet<T::NodeAddress> = self.vector.keys().cloned().collect();
        for neigh in self.neighbours.iter() {
            destinations.insert(neigh.addr.clone());
        }
        for reported in self.neighbour_vectors.values() {
            destinations.extend(reported.keys().cloned());
        }
        destinations.remove(&self.address);

        let mut vector = HashMap::new();
        vector.insert(self.address.clone(), DvRoute {
            cost: 0,
            port: None,
        });
        for dst in destinations {
            if let Some(route) = self.best_route_to(&dst) {
                vector.insert(dst, route);
            }
        }

        let changed = vector != self.vector;
        self.vector = vector;
        self.rebuild_table();
        changed
    }

    /// lowest cost wins, then a direct link over a relayed path, then the lowest port
    fn best_route_to(&self, dst: &T::NodeAddress) -> Option<DvRoute<T>> {
        let mut best: Option<(u16, bool, &T::Port)> = None;
        for neigh in self.neighbours.iter() {
            let direct = (neigh.addr == *dst).then(|| (neigh.link_cost.min(INF), false));
            let relayed = self
                .neighbour_vectors
                .get(&neigh.addr)
                .and_then(|reported| reported.get(dst))
                .map(|cost| (sum_inf(neigh.link_cost, *cost), true));

            for (cost, is_relayed) in [direct, relayed].into_iter().flatten() {
                let candidate = (cost, is_relayed, &neigh.port);
                if best.map_or(true, |cur| candidate < cur) {
                    best = Some(candidate);
                }
            }
        }
        best.filter(|(cost, _, _)| is_reachable(*cost))
            .map(|(cost, _, port)| DvRoute {
                cost,
                port: Some(port.clone()),
            })
    }

    fn rebuild_table(&mut self) {
        let mut table = ForwardingTable::new();
        for (dst, route) in &self.vector {
            let Some(neigh) = route.port.as_ref().and_then(|port| self.neighbours.get(port)) else {
                continue; // the route to ourself
            };
            table.insert(dst.clone(), ForwardEntry {
                port: neigh.port.clone(),
                next_hop: neigh.addr.clone(),
                cost: route.cost as u32,
            });
        }
        if table != self.table {
            self.emit(RouterEvent::RoutesChanged { routes: table.len() });
        }
        self.table = table;
    }
    // endregion

    /// whether the selected route to `dst` leads through `neigh`
    fn learned_from(&self, dst: &T::NodeAddress, neigh: &Neighbour<T>) -> bool {
        self.vector
            .get(dst)
            .and_then(|route| route.port.as_ref())
            .and_then(|port| self.neighbours.get(port))
            .is_some_and(|via| via.addr == neigh.addr)
    }

    /// sends the advertisable vector to every neighbour
    pub fn broadcast(&mut self) {
        let costs = self.advertisable();
        let mut packets = Vec::new();
        for neigh in self.neighbours.iter() {
            let payload = DistanceVectorPayload::<T> {
                costs: if self.params.split_horizon {
                    costs
                        .iter()
                        .filter(|(dst, _)| !self.learned_from(dst, neigh))
                        .map(|(dst, cost)| (dst.clone(), *cost))
                        .collect()
                } else {
                    costs.clone()
                },
            };
            match payload.encode() {
                Ok(content) => packets.push(OutboundPacket {
                    port: neigh.port.clone(),
                    packet: Packet::routing(self.address.clone(), content),
                }),
                Err(err) => {
                    self.emit(RouterEvent::Rejected(RoutingError::EncodeFailed {
                        reason: err.to_string(),
                    }));
                    return;
                }
            }
        }
        self.emit(RouterEvent::Broadcast { ports: packets.len() });
        self.outbound_packets.extend(packets);
        self.last_broadcast = costs;
    }

    /// handles a distance vector reported by a neighbour
    fn handle_vector(&mut self, port: &T::Port, packet: &Packet<T>) {
        let payload = match DistanceVectorPayload::<T>::decode(&packet.content) {
            Ok(payload) => payload,
            Err(err) => {
                self.emit(RouterEvent::Rejected(RoutingError::MalformedPayload {
                    port: port.clone(),
                    reason: format!("{err:#}"),
                }));
                return;
            }
        };

        let sender = &packet.src;
        if !self.neighbours.contains_addr(sender) {
            self.emit(RouterEvent::Rejected(RoutingError::NotNeighbour {
                sender: sender.clone(),
            }));
            return;
        }
        if self.neighbour_vectors.get(sender) == Some(&payload.costs) {
            return; // nothing new
        }

        self.emit(RouterEvent::VectorReceived {
            from: sender.clone(),
            entries: payload.costs.len(),
        });
        self.neighbour_vectors.insert(sender.clone(), payload.costs);
        if self.recompute() {
            self.broadcast();
        }
    }
}

impl<T: RoutingSystem> RoutingEngine<T> for DvRouter<T> {
    fn address(&self) -> &T::NodeAddress {
        &self.address
    }

    fn handle_new_link(&mut self, port: T::Port, endpoint: T::NodeAddress, cost: u16) {
        if let Some(old) = self.neighbours.insert(port.clone(), endpoint.clone(), cost) {
            // the port was rebound to another node
            if old.addr != endpoint && !self.neighbours.contains_addr(&old.addr) {
                self.neighbour_vectors.remove(&old.addr);
                self.vector.remove(&old.addr);
            }
        }
        self.emit(RouterEvent::LinkAdded {
            port: port.clone(),
            neighbour: endpoint.clone(),
            cost,
        });
        if endpoint != self.address && is_reachable(cost) {
            self.vector.insert(endpoint, DvRoute {
                cost,
                port: Some(port),
            });
        }
        self.recompute();
        self.broadcast();
    }

    fn handle_remove_link(&mut self, port: &T::Port) {
        let Some(removed) = self.neighbours.remove(port) else {
            self.emit(RouterEvent::Warning(RoutingWarning::UnknownPort { port: port.clone() }));
            return;
        };
        self.emit(RouterEvent::LinkRemoved {
            port: port.clone(),
            neighbour: removed.addr.clone(),
        });
        // a parallel link may still reach the same node
        if !self.neighbours.contains_addr(&removed.addr) {
            self.neighbour_vectors.remove(&removed.addr);
            self.vector.remove(&removed.addr);
        }
        self.recompute();
        self.broadcast();
    }

    fn handle_routing_packet(&mut self, port: &T::Port, packet: &Packet<T>) {
        self.handle_vector(port, packet);
    }

    fn handle_time(&mut self, time_ms: u64) {
        if !heartbeat_elapsed(self.last_time, time_ms, self.params.heartbeat_time.as_millis()) {
            return;
        }
        self.last_time = time_ms;
        let changed = self.recompute();
        if changed || self.advertisable() != self.last_broadcast {
            self.broadcast();
        }
    }

    fn forwarding_table(&self) -> &ForwardingTable<T> {
        &self.table
    }

    fn outbound_packets(&mut self) -> &mut Vec<OutboundPacket<T>> {
        &mut self.outbound_packets
    }

    fn emit(&self, event: RouterEvent<T>) {
        self.observer.observe(&self.address, &event);
    }
}

impl<T: RoutingSystem> Display for DvRouter<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "DvRouter(addr={})", json!(self.address))?;
        writeln!(f, "Distance Vector:")?;
        let mut vector: Vec<_> = self.vector.iter().collect();
        vector.sort_by(|a, b| a.0.cmp(b.0));
        for (dst, route) in vector {
            writeln!(f, "  {}: {}", json!(dst), route.cost)?;
        }
        writeln!(f, "Forwarding Table:")?;
        for (dst, entry) in self.table.sorted() {
            writeln!(f, "  {} -> Port {} (cost {})", json!(dst), json!(entry.port), entry.cost)?;
        }
        Ok(())
    }
}
