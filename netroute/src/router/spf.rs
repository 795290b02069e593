use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use educe::Educe;

use crate::concepts::route::LinkStateEntry;
use crate::framework::RoutingSystem;

/// Result of a single-source shortest path search over a link-state database
#[derive(Educe)]
#[educe(Clone(bound()), Debug(bound()))]
pub struct ShortestPathTree<T: RoutingSystem + ?Sized> {
    source: T::NodeAddress,
    /// only reached nodes are present, everything else is unreachable
    distances: HashMap<T::NodeAddress, u32>,
    predecessors: HashMap<T::NodeAddress, T::NodeAddress>,
}

impl<T: RoutingSystem + ?Sized> ShortestPathTree<T> {
    /// a tree that only contains the source
    pub fn empty(source: T::NodeAddress) -> Self {
        let mut distances = HashMap::new();
        distances.insert(source.clone(), 0);
        Self {
            source,
            distances,
            predecessors: HashMap::new(),
        }
    }

    /// Dijkstra from `source`, each database entry's links are the outgoing edges of its owner
    pub fn compute(source: &T::NodeAddress, database: &HashMap<T::NodeAddress, LinkStateEntry<T>>) -> Self {
        let mut distances: HashMap<T::NodeAddress, u32> = HashMap::new();
        let mut predecessors: HashMap<T::NodeAddress, T::NodeAddress> = HashMap::new();
        let mut visited: HashSet<T::NodeAddress> = HashSet::new();
        let mut heap: BinaryHeap<Reverse<(u32, T::NodeAddress)>> = BinaryHeap::new();

        distances.insert(source.clone(), 0);
        heap.push(Reverse((0, source.clone())));

        while let Some(Reverse((dist, node))) = heap.pop() {
            if !visited.insert(node.clone()) {
                continue; // stale heap entry, already settled with a lower distance
            }
            // a node we only know as someone's neighbour has no outgoing edges yet
            let Some(entry) = database.get(&node) else {
                continue;
            };
            for (neighbour, cost) in &entry.links {
                let candidate = dist.saturating_add(*cost as u32);
                if distances.get(neighbour).map_or(true, |known| candidate < *known) {
                    distances.insert(neighbour.clone(), candidate);
                    predecessors.insert(neighbour.clone(), node.clone());
                    heap.push(Reverse((candidate, neighbour.clone())));
                }
            }
        }

        Self {
            source: source.clone(),
            distances,
            predecessors,
        }
    }

    pub fn source(&self) -> &T::NodeAddress {
        &self.source
    }

    pub fn distance(&self, dst: &T::NodeAddress) -> Option<u32> {
        self.distances.get(dst).copied()
    }

    /// full hop list from the source to `dst`, both included
    pub fn path_to(&self, dst: &T::NodeAddress) -> Option<Vec<T::NodeAddress>> {
        if !self.distances.contains_key(dst) {
            return None;
        }
        let mut path = vec![dst.clone()];
        let mut cur = dst;
        while *cur != self.source {
            let prev = self.predecessors.get(cur)?;
            path.push(prev.clone());
            if path.len() > self.distances.len() {
                return None;
            }
            cur = prev;
        }
        path.reverse();
        Some(path)
    }

    /// the second node on the path to `dst`
    pub fn next_hop(&self, dst: &T::NodeAddress) -> Option<T::NodeAddress> {
        self.path_to(dst).and_then(|mut path| {
            if path.len() < 2 {
                return None;
            }
            Some(path.swap_remove(1))
        })
    }

    /// every reached node except the source, with its distance
    pub fn reachable(&self) -> impl Iterator<Item = (&T::NodeAddress, u32)> {
        self.distances
            .iter()
            .filter(|(addr, _)| **addr != self.source)
            .map(|(addr, dist)| (addr, *dist))
    }
}
