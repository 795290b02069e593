use std::collections::BTreeMap;

use educe::Educe;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::framework::RoutingSystem;

#[derive(Serialize, Deserialize, Educe)]
#[educe(Clone(bound()), Debug(bound()), PartialEq(bound()))]
#[serde(bound = "")]
pub struct Neighbour<T: RoutingSystem + ?Sized> {
    /// the local port the link is attached to, the pair (port, addr) is unique
    pub port: T::Port,
    /// the routing network address of the node at the other end
    pub addr: T::NodeAddress,
    /// Direct link-cost to this neighbour. Lower is better.
    pub link_cost: u16,
}

/// The directly attached links of a node, keyed by port.
/// Only link-up and link-down notifications mutate this table.
#[serde_as]
#[derive(Serialize, Deserialize, Educe)]
#[educe(Clone(bound()), Debug(bound()), Default(bound()))]
#[serde(bound = "")]
pub struct NeighbourTable<T: RoutingSystem + ?Sized> {
    #[serde_as(as = "Vec<(_, _)>")]
    links: BTreeMap<T::Port, Neighbour<T>>,
}

impl<T: RoutingSystem + ?Sized> NeighbourTable<T> {
    pub fn new() -> Self {
        Self {
            links: BTreeMap::new(),
        }
    }

    /// attaches a link, returns the link previously attached to the port, if any
    pub fn insert(&mut self, port: T::Port, addr: T::NodeAddress, link_cost: u16) -> Option<Neighbour<T>> {
        self.links.insert(port.clone(), Neighbour {
            port,
            addr,
            link_cost,
        })
    }

    pub fn remove(&mut self, port: &T::Port) -> Option<Neighbour<T>> {
        self.links.remove(port)
    }

    pub fn get(&self, port: &T::Port) -> Option<&Neighbour<T>> {
        self.links.get(port)
    }

    /// whether any link reaches `addr`
    pub fn contains_addr(&self, addr: &T::NodeAddress) -> bool {
        self.links.values().any(|neigh| neigh.addr == *addr)
    }

    /// the cheapest link to `addr`, ties go to the lowest port
    pub fn best_link_to(&self, addr: &T::NodeAddress) -> Option<&Neighbour<T>> {
        // BTreeMap iterates ports in order, min_by_key keeps the first minimum
        self.links
            .values()
            .filter(|neigh| neigh.addr == *addr)
            .min_by_key(|neigh| neigh.link_cost)
    }

    /// neighbour address -> cheapest link cost, this is the local node's link state
    pub fn link_costs(&self) -> BTreeMap<T::NodeAddress, u16> {
        let mut costs = BTreeMap::new();
        for neigh in self.links.values() {
            costs
                .entry(neigh.addr.clone())
                .and_modify(|cost: &mut u16| *cost = (*cost).min(neigh.link_cost))
                .or_insert(neigh.link_cost);
        }
        costs
    }

    /// links in port order
    pub fn iter(&self) -> impl Iterator<Item = &Neighbour<T>> {
        self.links.values()
    }

    pub fn ports(&self) -> impl Iterator<Item = &T::Port> {
        self.links.keys()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
