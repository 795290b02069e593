use std::cell::RefCell;

use educe::Educe;
use log::{debug, error, info, trace, warn};
use serde_json::json;

use crate::concepts::packet::{OutboundPacket, Packet, PacketKind};
use crate::concepts::table::ForwardingTable;
use crate::feedback::{RouterEvent, RoutingError, RoutingWarning};
use crate::framework::{Observer, RoutingSystem};

pub mod dv;
pub mod ls;
pub mod spf;

/// Distance-vector infinity, a cost at or above this is unreachable
pub const INF: u16 = 16;

/// The callbacks shared by every routing engine. The engine performs no I/O, everything it wants
/// to send is written to [`RoutingEngine::outbound_packets`] for the transport to drain.
pub trait RoutingEngine<T: RoutingSystem> {
    fn address(&self) -> &T::NodeAddress;

    /// a link to `endpoint` was attached on `port`
    fn handle_new_link(&mut self, port: T::Port, endpoint: T::NodeAddress, cost: u16);

    /// the link on `port` was detached, unknown ports are ignored
    fn handle_remove_link(&mut self, port: &T::Port);

    /// protocol specific handling of a routing packet
    fn handle_routing_packet(&mut self, port: &T::Port, packet: &Packet<T>);

    /// periodic timer, a no-op unless a full heartbeat has passed since the last processed tick
    fn handle_time(&mut self, time_ms: u64);

    fn forwarding_table(&self) -> &ForwardingTable<T>;

    fn outbound_packets(&mut self) -> &mut Vec<OutboundPacket<T>>;

    fn emit(&self, event: RouterEvent<T>);

    /// the port to use for `dst`, None if there is no route right now
    fn forward(&self, dst: &T::NodeAddress) -> Option<T::Port> {
        self.forwarding_table().port(dst).cloned()
    }

    /// handle a single packet delivered by the transport
    fn handle_packet(&mut self, port: &T::Port, packet: Packet<T>) {
        match packet.kind {
            PacketKind::Routing => self.handle_routing_packet(port, &packet),
            PacketKind::Traceroute => {
                let Some(dst) = packet.dst.clone() else {
                    self.emit(RouterEvent::Undeliverable { dst: None });
                    return;
                };
                match self.forward(&dst) {
                    Some(out) => {
                        self.emit(RouterEvent::Forwarded {
                            dst,
                            port: out.clone(),
                        });
                        self.outbound_packets().push(OutboundPacket { port: out, packet });
                    }
                    // the transport is responsible for dropping it
                    None => self.emit(RouterEvent::Undeliverable { dst: Some(dst) }),
                }
            }
        }
    }
}

/// lets engines be swapped at runtime behind `Box<dyn RoutingEngine<T>>`
impl<T: RoutingSystem, E: RoutingEngine<T> + ?Sized> RoutingEngine<T> for Box<E> {
    fn address(&self) -> &T::NodeAddress {
        (**self).address()
    }

    fn handle_new_link(&mut self, port: T::Port, endpoint: T::NodeAddress, cost: u16) {
        (**self).handle_new_link(port, endpoint, cost)
    }

    fn handle_remove_link(&mut self, port: &T::Port) {
        (**self).handle_remove_link(port)
    }

    fn handle_routing_packet(&mut self, port: &T::Port, packet: &Packet<T>) {
        (**self).handle_routing_packet(port, packet)
    }

    fn handle_time(&mut self, time_ms: u64) {
        (**self).handle_time(time_ms)
    }

    fn forwarding_table(&self) -> &ForwardingTable<T> {
        (**self).forwarding_table()
    }

    fn outbound_packets(&mut self) -> &mut Vec<OutboundPacket<T>> {
        (**self).outbound_packets()
    }

    fn emit(&self, event: RouterEvent<T>) {
        (**self).emit(event)
    }

    fn handle_packet(&mut self, port: &T::Port, packet: Packet<T>) {
        (**self).handle_packet(port, packet)
    }
}

pub(crate) fn heartbeat_elapsed(last_time: u64, time_ms: u64, heartbeat_ms: u128) -> bool {
    time_ms.saturating_sub(last_time) as u128 >= heartbeat_ms
}

#[derive(Default)]
pub struct NoObserver {}

impl<T: RoutingSystem + ?Sized> Observer<T> for NoObserver {
    fn observe(&self, _router: &T::NodeAddress, _event: &RouterEvent<T>) {}
}

/// Forwards events to the `log` facade
#[derive(Default)]
pub struct LogObserver {}

impl<T: RoutingSystem + ?Sized> Observer<T> for LogObserver {
    fn observe(&self, router: &T::NodeAddress, event: &RouterEvent<T>) {
        let me = json!(router);
        match event {
            RouterEvent::LinkAdded { port, neighbour, cost } => {
                info!("[{me}] Link to {} up on port {}, cost {cost}", json!(neighbour), json!(port))
            }
            RouterEvent::LinkRemoved { port, neighbour } => {
                info!("[{me}] Link to {} on port {} removed", json!(neighbour), json!(port))
            }
            RouterEvent::VectorReceived { from, entries } => {
                debug!("[{me}] Got distance vector from {} with {entries} entries", json!(from))
            }
            RouterEvent::LinkStateInstalled { owner, seqno } => {
                debug!("[{me}] Installed link state of {} at seqno {seqno}", json!(owner))
            }
            RouterEvent::RoutesChanged { routes } => {
                debug!("[{me}] Forwarding table rebuilt, {routes} routes")
            }
            RouterEvent::Broadcast { ports } => {
                trace!("[{me}] Broadcast distance vector over {ports} ports")
            }
            RouterEvent::Flooded { owner, seqno, ports } => {
                trace!("[{me}] Flooded link state of {} seqno {seqno} over {ports} ports", json!(owner))
            }
            RouterEvent::Forwarded { dst, port } => {
                trace!("[{me}] Forwarding packet for {} via port {}", json!(dst), json!(port))
            }
            RouterEvent::Undeliverable { dst } => {
                debug!("[{me}] No route to {}, dropping packet", json!(dst))
            }
            RouterEvent::Rejected(err @ RoutingError::EncodeFailed { .. }) => error!("[{me}] {err}"),
            RouterEvent::Rejected(err) => warn!("[{me}] {err}"),
            RouterEvent::Warning(warning @ RoutingWarning::DesynchronizedSeqno { .. }) => {
                warn!("[{me}] {warning}")
            }
            RouterEvent::Warning(warning @ RoutingWarning::StaleLinkState { .. }) => {
                trace!("[{me}] {warning}")
            }
            RouterEvent::Warning(warning) => debug!("[{me}] {warning}"),
        }
    }
}

/// Keeps every event in memory, useful for inspecting an engine in tests
#[derive(Educe)]
#[educe(Default(bound()))]
pub struct RecordingObserver<T: RoutingSystem + ?Sized> {
    pub events: RefCell<Vec<RouterEvent<T>>>,
}

impl<T: RoutingSystem + ?Sized> RecordingObserver<T> {
    /// removes and returns the recorded events
    pub fn take(&self) -> Vec<RouterEvent<T>> {
        self.events.take()
    }
}

impl<T: RoutingSystem + ?Sized> Observer<T> for RecordingObserver<T> {
    fn observe(&self, _router: &T::NodeAddress, event: &RouterEvent<T>) {
        self.events.borrow_mut().push(event.clone());
    }
}
