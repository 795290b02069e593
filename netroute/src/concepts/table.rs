use std::collections::HashMap;

use educe::Educe;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::framework::RoutingSystem;

#[derive(Serialize, Deserialize, Educe)]
#[educe(Clone(bound()), Debug(bound()), PartialEq(bound()))]
#[serde(bound = "")]
pub struct ForwardEntry<T: RoutingSystem + ?Sized> {
    /// outgoing port towards the destination
    pub port: T::Port,
    /// the neighbour at the other end of `port`
    pub next_hop: T::NodeAddress,
    /// total path cost
    pub cost: u32,
}

/// Destination -> outgoing port. This table is derived state: engines build a fresh table on every
/// recomputation and swap it in, it is never patched in place.
#[serde_as]
#[derive(Serialize, Deserialize, Educe)]
#[educe(Clone(bound()), Debug(bound()), PartialEq(bound()), Default(bound()))]
#[serde(bound = "")]
pub struct ForwardingTable<T: RoutingSystem + ?Sized> {
    #[serde_as(as = "Vec<(_, _)>")]
    entries: HashMap<T::NodeAddress, ForwardEntry<T>>,
}

impl<T: RoutingSystem + ?Sized> ForwardingTable<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, dst: T::NodeAddress, entry: ForwardEntry<T>) {
        self.entries.insert(dst, entry);
    }

    pub fn get(&self, dst: &T::NodeAddress) -> Option<&ForwardEntry<T>> {
        self.entries.get(dst)
    }

    /// the port to send a packet for `dst` on, None if `dst` is currently unreachable
    pub fn port(&self, dst: &T::NodeAddress) -> Option<&T::Port> {
        self.entries.get(dst).map(|entry| &entry.port)
    }

    pub fn contains(&self, dst: &T::NodeAddress) -> bool {
        self.entries.contains_key(dst)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&T::NodeAddress, &ForwardEntry<T>)> {
        self.entries.iter()
    }

    /// entries ordered by destination, for stable output
    pub fn sorted(&self) -> Vec<(&T::NodeAddress, &ForwardEntry<T>)> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
