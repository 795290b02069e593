use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::feedback::RouterEvent;

pub trait RoutingSystem {
    /// Address of the node on the routing network, MUST be globally unique
    type NodeAddress: Ord + PartialOrd + RouteData + RouteKey;
    /// Local attachment point of a link, only unique within a single node
    type Port: Ord + PartialOrd + RouteData + RouteKey;
    /// Sink for events raised by the engines, constructed through [`Default`]
    type Observer: Observer<Self>;
    fn config() -> ProtocolParams {
        Default::default()
    }
}

pub trait RouteData: Clone + Debug + Serialize + DeserializeOwned + Sized {}
pub trait RouteKey: Eq + PartialEq + Hash {}
impl<T: Eq + PartialEq + Hash> RouteKey for T {}
impl<T: Clone + Debug + Serialize + DeserializeOwned + Sized> RouteData for T {}

/// Receives everything an engine wants to report. Correctness never depends on the observer,
/// an engine behaves identically with [`crate::router::NoObserver`].
pub trait Observer<T: RoutingSystem + ?Sized>: Default {
    fn observe(&self, router: &T::NodeAddress, event: &RouterEvent<T>);
}

/// Protocol Parameters
#[derive(Clone, Debug)]
pub struct ProtocolParams {
    /// minimum time between two processed timer ticks
    pub heartbeat_time: Duration,
    /// omit routes from a distance vector sent back over the port they were learned from
    pub split_horizon: bool,
}
impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            heartbeat_time: Duration::from_millis(1000),
            split_horizon: false,
        }
    }
}
