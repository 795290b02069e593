use std::collections::BTreeMap;

use anyhow::Context;
use educe::Educe;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::framework::RoutingSystem;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq)]
pub enum PacketKind {
    /// carries a distance vector or a link state, handled by the engine
    Routing,
    /// data-plane packet, only looked up in the forwarding table
    Traceroute,
}

#[derive(Serialize, Deserialize, Educe)]
#[educe(Clone(bound()), Debug(bound()), PartialEq(bound()))]
#[serde(bound = "")]
pub struct Packet<T: RoutingSystem + ?Sized> {
    pub kind: PacketKind,
    pub src: T::NodeAddress,
    /// None for a broadcast
    pub dst: Option<T::NodeAddress>,
    /// serialized payload, opaque to the transport
    pub content: String,
}

impl<T: RoutingSystem + ?Sized> Packet<T> {
    pub fn routing(src: T::NodeAddress, content: String) -> Self {
        Self {
            kind: PacketKind::Routing,
            src,
            dst: None,
            content,
        }
    }

    pub fn traceroute(src: T::NodeAddress, dst: T::NodeAddress) -> Self {
        Self {
            kind: PacketKind::Traceroute,
            src,
            dst: Some(dst),
            content: String::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Educe)]
#[educe(Clone(bound()), Debug(bound()), PartialEq(bound()))]
#[serde(bound = "")]
pub struct OutboundPacket<T: RoutingSystem + ?Sized> {
    /// send via this port
    pub port: T::Port,
    pub packet: Packet<T>,
}

/// Content of a distance-vector routing packet: destination -> cost.
/// Only reachable destinations are ever present.
/// Maps go over the wire as `[[key, value], ...]` since JSON object keys must be strings.
#[serde_as]
#[derive(Serialize, Deserialize, Educe)]
#[educe(Clone(bound()), Debug(bound()), PartialEq(bound()), Default(bound()))]
#[serde(bound = "")]
pub struct DistanceVectorPayload<T: RoutingSystem + ?Sized> {
    #[serde_as(as = "Vec<(_, _)>")]
    pub costs: BTreeMap<T::NodeAddress, u16>,
}

impl<T: RoutingSystem + ?Sized> DistanceVectorPayload<T> {
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(content: &str) -> anyhow::Result<Self> {
        serde_json::from_str(content).context("content is not a distance vector")
    }
}

/// Content of a link-state routing packet, the neighbour-cost map of `owner` at `sequence_number`
#[serde_as]
#[derive(Serialize, Deserialize, Educe)]
#[educe(Clone(bound()), Debug(bound()), PartialEq(bound()))]
#[serde(bound = "")]
pub struct LinkStatePayload<T: RoutingSystem + ?Sized> {
    pub owner: T::NodeAddress,
    pub sequence_number: u64,
    /// pair list, as in [`DistanceVectorPayload`]
    #[serde_as(as = "Vec<(_, _)>")]
    pub links: BTreeMap<T::NodeAddress, u16>,
}

impl<T: RoutingSystem + ?Sized> LinkStatePayload<T> {
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(content: &str) -> anyhow::Result<Self> {
        serde_json::from_str(content).context("content is not a link state")
    }
}
