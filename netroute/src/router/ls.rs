use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use serde_json::json;

use crate::concepts::neighbour::NeighbourTable;
use crate::concepts::packet::{LinkStatePayload, OutboundPacket, Packet};
use crate::concepts::route::LinkStateEntry;
use crate::concepts::table::{ForwardEntry, ForwardingTable};
use crate::feedback::{RouterEvent, RoutingError, RoutingWarning};
use crate::framework::{Observer, ProtocolParams, RoutingSystem};
use crate::router::spf::ShortestPathTree;
use crate::router::{heartbeat_elapsed, RoutingEngine};
use crate::util::increment;

/// Link-state routing engine
pub struct LsRouter<T: RoutingSystem> {
    pub address: T::NodeAddress,
    pub params: ProtocolParams,
    neighbours: NeighbourTable<T>,
    /// owner -> latest link state, includes our own entry
    database: HashMap<T::NodeAddress, LinkStateEntry<T>>,
    /// seqno of our own link state
    seqno: u64,
    table: ForwardingTable<T>,
    tree: ShortestPathTree<T>,
    last_time: u64,
    pub outbound_packets: Vec<OutboundPacket<T>>,
    pub observer: T::Observer,
}

impl<T: RoutingSystem> LsRouter<T> {
    pub fn new(address: T::NodeAddress) -> Self {
        Self::with_params(address, T::config())
    }

    pub fn with_params(address: T::NodeAddress, params: ProtocolParams) -> Self {
        let mut database = HashMap::new();
        database.insert(address.clone(), LinkStateEntry::default());
        Self {
            tree: ShortestPathTree::empty(address.clone()),
            address,
            params,
            neighbours: NeighbourTable::new(),
            database,
            seqno: 0,
            table: ForwardingTable::new(),
            last_time: 0,
            outbound_packets: Vec::new(),
            observer: Default::default(),
        }
    }

    pub fn neighbours(&self) -> &NeighbourTable<T> {
        &self.neighbours
    }

    pub fn seqno(&self) -> u64 {
        self.seqno
    }

    pub fn link_state(&self, owner: &T::NodeAddress) -> Option<&LinkStateEntry<T>> {
        self.database.get(owner)
    }

    /// hop list from the last shortest path computation, both ends included
    pub fn path_to(&self, dst: &T::NodeAddress) -> Option<Vec<T::NodeAddress>> {
        self.tree.path_to(dst)
    }

    /// bumps our seqno and stores our current links in the database
    fn update_own_link_state(&mut self) {
        increment(&mut self.seqno);
        let mut links = self.neighbours.link_costs();
        links.remove(&self.address);
        self.database.insert(self.address.clone(), LinkStateEntry {
            seqno: self.seqno,
            links,
        });
    }

    /// rebuilds the shortest path tree and the forwarding table from the database
    pub fn recompute(&mut self) {
        let tree = ShortestPathTree::compute(&self.address, &self.database);
        let mut table = ForwardingTable::new();
        for (dst, cost) in tree.reachable() {
            let Some(next_hop) = tree.next_hop(dst) else {
                continue;
            };
            if let Some(link) = self.neighbours.best_link_to(&next_hop) {
                table.insert(dst.clone(), ForwardEntry {
                    port: link.port.clone(),
                    next_hop,
                    cost,
                });
            }
        }
        if table != self.table {
            self.emit(RouterEvent::RoutesChanged { routes: table.len() });
        }
        self.table = table;
        self.tree = tree;
    }

    /// sends our own link state to every neighbour
    pub fn flood_own(&mut self) {
        let payload = LinkStatePayload::<T> {
            owner: self.address.clone(),
            sequence_number: self.seqno,
            links: self
                .database
                .get(&self.address)
                .map(|entry| entry.links.clone())
                .unwrap_or_default(),
        };
        let content = match payload.encode() {
            Ok(content) => content,
            Err(err) => {
                self.emit(RouterEvent::Rejected(RoutingError::EncodeFailed {
                    reason: err.to_string(),
                }));
                return;
            }
        };
        let packet = Packet::routing(self.address.clone(), content);
        let packets: Vec<_> = self
            .neighbours
            .ports()
            .map(|port| OutboundPacket {
                port: port.clone(),
                packet: packet.clone(),
            })
            .collect();
        self.emit(RouterEvent::Flooded {
            owner: self.address.clone(),
            seqno: self.seqno,
            ports: packets.len(),
        });
        self.outbound_packets.extend(packets);
    }

    /// handles a link state flooded by any node, `port` is the port it arrived on
    fn handle_link_state(&mut self, port: &T::Port, packet: &Packet<T>) {
        let payload = match LinkStatePayload::<T>::decode(&packet.content) {
            Ok(payload) => payload,
            Err(err) => {
                self.emit(RouterEvent::Rejected(RoutingError::MalformedPayload {
                    port: port.clone(),
                    reason: format!("{err:#}"),
                }));
                return;
            }
        };
        let LinkStatePayload { owner, sequence_number, links } = payload;

        if owner == self.address {
            if sequence_number > self.seqno {
                // a previous incarnation of ourselves is still being flooded, overtake it
                let old_seqno = self.seqno;
                self.seqno = sequence_number;
                self.update_own_link_state();
                self.emit(RouterEvent::Warning(RoutingWarning::DesynchronizedSeqno {
                    old_seqno,
                    new_seqno: self.seqno,
                }));
                self.recompute();
                self.flood_own();
            } else {
                self.emit(RouterEvent::Warning(RoutingWarning::StaleLinkState {
                    owner,
                    seqno: sequence_number,
                    stored: self.seqno,
                }));
            }
            return;
        }

        if let Some(stored) = self.database.get(&owner) {
            if sequence_number <= stored.seqno {
                self.emit(RouterEvent::Warning(RoutingWarning::StaleLinkState {
                    owner,
                    seqno: sequence_number,
                    stored: stored.seqno,
                }));
                return;
            }
        }

        self.emit(RouterEvent::LinkStateInstalled {
            owner: owner.clone(),
            seqno: sequence_number,
        });
        self.database.insert(owner.clone(), LinkStateEntry {
            seqno: sequence_number,
            links,
        });

        // forward the packet as received, except back where it came from
        let packets: Vec<_> = self
            .neighbours
            .ports()
            .filter(|out| *out != port)
            .map(|out| OutboundPacket {
                port: out.clone(),
                packet: packet.clone(),
            })
            .collect();
        self.emit(RouterEvent::Flooded {
            owner,
            seqno: sequence_number,
            ports: packets.len(),
        });
        self.outbound_packets.extend(packets);

        self.recompute();
    }
}

impl<T: RoutingSystem> RoutingEngine<T> for LsRouter<T> {
    fn address(&self) -> &T::NodeAddress {
        &self.address
    }

    fn handle_new_link(&mut self, port: T::Port, endpoint: T::NodeAddress, cost: u16) {
        self.neighbours.insert(port.clone(), endpoint.clone(), cost);
        self.emit(RouterEvent::LinkAdded {
            port,
            neighbour: endpoint,
            cost,
        });
        self.update_own_link_state();
        self.recompute();
        self.flood_own();
    }

    fn handle_remove_link(&mut self, port: &T::Port) {
        let Some(removed) = self.neighbours.remove(port) else {
            self.emit(RouterEvent::Warning(RoutingWarning::UnknownPort { port: port.clone() }));
            return;
        };
        self.emit(RouterEvent::LinkRemoved {
            port: port.clone(),
            neighbour: removed.addr,
        });
        self.update_own_link_state();
        self.recompute();
        self.flood_own();
    }

    fn handle_routing_packet(&mut self, port: &T::Port, packet: &Packet<T>) {
        self.handle_link_state(port, packet);
    }

    fn handle_time(&mut self, time_ms: u64) {
        if !heartbeat_elapsed(self.last_time, time_ms, self.params.heartbeat_time.as_millis()) {
            return;
        }
        self.last_time = time_ms;
        self.flood_own();
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

impl<T: RoutingSystem> Display for LsRouter<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "LsRouter(addr={}, seq={})", json!(self.address), self.seqno)?;
        writeln!(f, "Link State Database:")?;
        let mut owners: Vec<_> = self.database.iter().collect();
        owners.sort_by(|a, b| a.0.cmp(b.0));
        for (owner, entry) in owners {
            writeln!(f, "  {} (seq {}):", json!(owner), entry.seqno)?;
            for (neigh, cost) in &entry.links {
                writeln!(f, "    {}: {cost}", json!(neigh))?;
            }
        }
        writeln!(f, "Forwarding Table:")?;
        for (dst, entry) in self.table.sorted() {
            writeln!(f, "  {} -> Port {} via {} (cost {})", json!(dst), json!(entry.port), json!(entry.next_hop), entry.cost)?;
        }
        Ok(())
    }
}
