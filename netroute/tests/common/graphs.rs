use netroute::router::RoutingEngine;

use crate::common::virtual_network::{VirtualNetwork, VirtualSystem};

/// A - B - C, every link costs 1
pub fn vnet_line<E: RoutingEngine<VirtualSystem>>(make: impl Fn(String) -> E) -> VirtualNetwork<E> {
    VirtualNetwork::create(
        &["A", "B", "C"],
        &[
            (0, "A", "B", 1),
            (1, "B", "C", 1),
        ],
        make,
    )
}

pub fn vnet_simple_weighted<E: RoutingEngine<VirtualSystem>>(make: impl Fn(String) -> E) -> VirtualNetwork<E> {
    VirtualNetwork::create(
        &["1", "2", "3", "4", "5"],
        &[
            (0, "1", "2", 2),
            (1, "1", "3", 1),
            (2, "2", "3", 4),
            (3, "2", "4", 5),
            (4, "3", "4", 100),
            (5, "3", "5", 8),
            (6, "4", "5", 1),
        ],
        make,
    )
}

/// two triangles joined by a single bridge (link 3), with parallel links between 5 and 6
pub fn vnet_bridged<E: RoutingEngine<VirtualSystem>>(make: impl Fn(String) -> E) -> VirtualNetwork<E> {
    VirtualNetwork::create(
        &["1", "2", "3", "4", "5", "6"],
        &[
            (0, "1", "2", 1),
            (1, "2", "3", 2),
            (2, "3", "1", 4),
            (3, "3", "4", 3),
            (4, "4", "5", 1),
            (5, "5", "6", 6),
            (6, "6", "4", 2),
            (7, "5", "6", 1),
        ],
        make,
    )
}

/// 1 - 2 - ... - 9, costs of 2 make the far end cost 16 from node 1
pub fn vnet_long_chain<E: RoutingEngine<VirtualSystem>>(make: impl Fn(String) -> E) -> VirtualNetwork<E> {
    VirtualNetwork::create(
        &["1", "2", "3", "4", "5", "6", "7", "8", "9"],
        &[
            (0, "1", "2", 2),
            (1, "2", "3", 2),
            (2, "3", "4", 2),
            (3, "4", "5", 2),
            (4, "5", "6", 2),
            (5, "6", "7", 2),
            (6, "7", "8", 2),
            (7, "8", "9", 2),
        ],
        make,
    )
}
