use educe::Educe;
use thiserror::Error;
use crate::framework::RoutingSystem;

/// Inputs that were refused. None of these are fatal, the engine drops the input and carries on.
#[derive(Error)]
#[derive(Educe)]
#[educe(Debug(bound()), Clone(bound()))]
pub enum RoutingError<T: RoutingSystem + ?Sized> {
    /// The content of a routing packet could not be parsed as the expected payload
    #[error("Discarded routing packet received on port {port:?}: {reason}")]
    MalformedPayload {
        port: T::Port,
        reason: String,
    },
    /// A distance vector was sent by a node that is not attached to any of our links.
    /// This is either a stale session or an injected report.
    #[error("Discarded distance vector from {sender:?}, it is not a neighbour")]
    NotNeighbour {
        sender: T::NodeAddress,
    },
    #[error("Unable to encode routing payload: {reason}")]
    EncodeFailed {
        reason: String,
    },
}

/// Although this is an error enum, these should be treated as warnings.
#[derive(Error)]
#[derive(Educe)]
#[educe(Debug(bound()), Clone(bound()))]
pub enum RoutingWarning<T: RoutingSystem + ?Sized> {
    #[error("Port {port:?} has no link attached")]
    UnknownPort {
        port: T::Port,
    },
    /// Steady state for flooding, every node sees each update once per neighbour.
    #[error("Dropped link state from {owner:?} with seqno {seqno}, already have {stored}")]
    StaleLinkState {
        owner: T::NodeAddress,
        seqno: u64,
        stored: u64,
    },
    /// A flood carried our own address with a seqno ahead of ours.
    /// The local counter is moved past it so that our next update is accepted by the network.
    /// NOTE: This is an indication that the node has restarted and lost its state!
    #[error("Local seqno {old_seqno} is behind the network, resynchronized to {new_seqno}")]
    DesynchronizedSeqno {
        old_seqno: u64,
        new_seqno: u64,
    },
}

/// Everything an engine reports to its [`crate::framework::Observer`]
#[derive(Educe)]
#[educe(Debug(bound()), Clone(bound()))]
pub enum RouterEvent<T: RoutingSystem + ?Sized> {
    LinkAdded {
        port: T::Port,
        neighbour: T::NodeAddress,
        cost: u16,
    },
    LinkRemoved {
        port: T::Port,
        neighbour: T::NodeAddress,
    },
    VectorReceived {
        from: T::NodeAddress,
        entries: usize,
    },
    LinkStateInstalled {
        owner: T::NodeAddress,
        seqno: u64,
    },
    /// the forwarding table was rebuilt and differs from the previous one
    RoutesChanged {
        routes: usize,
    },
    Broadcast {
        ports: usize,
    },
    Flooded {
        owner: T::NodeAddress,
        seqno: u64,
        ports: usize,
    },
    Forwarded {
        dst: T::NodeAddress,
        port: T::Port,
    },
    Undeliverable {
        dst: Option<T::NodeAddress>,
    },
    Rejected(RoutingError<T>),
    Warning(RoutingWarning<T>),
}
