use std::collections::BTreeMap;

use educe::Educe;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::framework::RoutingSystem;

/// A distance vector entry
#[derive(Serialize, Deserialize, Educe)]
#[educe(Clone(bound()), Debug(bound()), PartialEq(bound()))]
#[serde(bound = "")]
pub struct DvRoute<T: RoutingSystem + ?Sized> {
    /// always below INF, unreachable destinations are removed instead
    pub cost: u16,
    /// the port that leads to the next hop, None only for the route to ourself
    pub port: Option<T::Port>,
}

/// One node's entry in the link-state database
#[serde_as]
#[derive(Serialize, Deserialize, Educe)]
#[educe(Clone(bound()), Debug(bound()), PartialEq(bound()), Default(bound()))]
#[serde(bound = "")]
pub struct LinkStateEntry<T: RoutingSystem + ?Sized> {
    /// only ever replaced by a strictly greater seqno from the same owner
    pub seqno: u64,
    /// outgoing edges of the owner: neighbour -> cost
    #[serde_as(as = "Vec<(_, _)>")]
    pub links: BTreeMap<T::NodeAddress, u16>,
}
