use netroute::concepts::packet::DistanceVectorPayload;
use netroute::framework::ProtocolParams;
use netroute::router::dv::DvRouter;
use netroute::router::{RoutingEngine, INF};

use crate::common::virtual_network::{VirtualNetwork, VirtualSystem};

mod common;

fn dv(addr: String) -> DvRouter<VirtualSystem> {
    DvRouter::new(addr)
}

fn dv_split_horizon(addr: String) -> DvRouter<VirtualSystem> {
    DvRouter::with_params(addr, ProtocolParams {
        split_horizon: true,
        ..Default::default()
    })
}

fn max_advertised_cost(network: &VirtualNetwork<DvRouter<VirtualSystem>>) -> u16 {
    network
        .sent
        .iter()
        .map(|packet| DistanceVectorPayload::<VirtualSystem>::decode(&packet.content).unwrap())
        .flat_map(|payload| payload.costs.into_values())
        .max()
        .unwrap_or(0)
}

#[test]
fn line_scenario() {
    let mut network = common::graphs::vnet_line(dv);
    network.tick_n(3);

    assert_eq!(network.get_next_hop("A", "C"), "B");
    assert_eq!(network.get_cost_to("A", "C"), 2);
    assert_eq!(network.node("A").forward(&"C".to_string()), Some(0));

    network.disconnect(0);
    // no ticks needed, the local recomputation is enough
    assert!(network.route("A", "B").is_none());
    assert!(network.route("A", "C").is_none());
    assert!(network.node("A").forwarding_table().is_empty());

    // B and C count to infinity over each other before dropping A
    network.tick_n(3);
    assert!(network.get_cost_to("C", "A") < INF as u32);
    network.tick_n(20);
    assert!(network.route("C", "A").is_none());
    assert!(network.route("B", "A").is_none());
    assert_eq!(network.get_cost_to("C", "B"), 1);
}

#[test]
fn simple_weighted_graph() {
    let mut network = common::graphs::vnet_simple_weighted(dv);
    network.tick_n(10); // just make it converge

    // at node 1
    assert_eq!(network.get_next_hop("1", "5"), "2");
    assert_eq!(network.get_cost_to("1", "5"), 8);
    assert_eq!(network.get_next_hop("1", "3"), "3");

    // at node 3
    assert_eq!(network.get_next_hop("3", "4"), "1");
    assert_eq!(network.get_cost_to("3", "4"), 8);

    network.assert_shortest_paths(Some(INF as u32));
}

#[test]
fn route_optimizer() {
    let mut network = common::graphs::vnet_simple_weighted(dv);
    network.tick_n(10);

    // improve the link between 3 and 5
    network.disconnect(5);
    network.connect(5, "3", "5", 1);
    network.tick_n(10);

    assert_eq!(network.get_next_hop("1", "5"), "3");
    assert_eq!(network.get_cost_to("1", "5"), 2);
    network.assert_shortest_paths(Some(INF as u32));
}

#[test]
fn converged_network_is_quiet() {
    let mut network = common::graphs::vnet_bridged(dv);
    network.tick_n(10);
    network.assert_shortest_paths(Some(INF as u32));

    let sent = network.sent.len();
    network.tick_n(5);
    assert_eq!(network.sent.len(), sent);
}

#[test]
fn count_to_infinity_is_bounded() {
    let mut network = common::graphs::vnet_line(dv);
    network.tick_n(3);

    network.disconnect(1);
    network.tick_n(40);

    assert!(network.route("A", "C").is_none());
    assert!(network.route("B", "C").is_none());
    assert_eq!(network.get_cost_to("A", "B"), 1);
    assert!(max_advertised_cost(&network) < INF);
}

#[test]
fn split_horizon_avoids_counting() {
    let mut network = common::graphs::vnet_line(dv_split_horizon);
    network.tick_n(3);
    assert_eq!(network.get_cost_to("A", "C"), 2);

    network.disconnect(1);
    network.tick_n(2);

    assert!(network.route("A", "C").is_none());
    assert!(network.route("B", "C").is_none());
    assert!(max_advertised_cost(&network) <= 2);
}

#[test]
fn far_nodes_are_unreachable() {
    let mut network = common::graphs::vnet_long_chain(dv);
    network.tick_n(20);

    assert_eq!(network.get_cost_to("1", "8"), 14);
    assert!(network.route("1", "9").is_none());
    assert!(network.route("9", "1").is_none());
    assert_eq!(network.trace("2", "9").map(|path| path.len()), Some(8));
    network.assert_shortest_paths(Some(INF as u32));
    assert!(max_advertised_cost(&network) < INF);
}

#[test]
fn bridge_removal_partitions() {
    let mut network = common::graphs::vnet_bridged(dv);
    network.tick_n(10);
    assert_eq!(network.trace("1", "6"), Some(vec!["1", "2", "3", "4", "6"].into_iter().map(String::from).collect()));

    network.disconnect(3);
    network.tick_n(40);
    for (src, dst) in [("1", "4"), ("2", "5"), ("6", "3"), ("4", "1")] {
        assert!(network.route(src, dst).is_none(), "{src} still routes {dst}");
    }
    network.assert_shortest_paths(Some(INF as u32));

    network.connect(3, "3", "4", 3);
    network.tick_n(10);
    network.assert_shortest_paths(Some(INF as u32));
}
