use crate::router::INF;
use std::cmp::min;

/// Adds two distance-vector costs, saturating at [`INF`]
///
/// # Arguments
///
/// * `cost_a`: First one
/// * `cost_b`: Second one
///
/// returns: u16
///
/// # Examples
///
/// ```
/// use netroute::router::INF;
/// assert_eq!(netroute::util::sum_inf(3, 4), 7);
/// assert_eq!(netroute::util::sum_inf(10, 6), INF);
/// assert_eq!(netroute::util::sum_inf(INF, 1), INF);
/// assert_eq!(netroute::util::sum_inf(u16::MAX, u16::MAX), INF);
/// ```
pub fn sum_inf(cost_a: u16, cost_b: u16) -> u16 {
    min(INF as u32, cost_a as u32 + cost_b as u32) as u16
}

/// Whether a distance-vector cost may be stored or advertised
///
/// ```
/// assert!(netroute::util::is_reachable(15));
/// assert!(!netroute::util::is_reachable(16));
/// ```
pub fn is_reachable(cost: u16) -> bool {
    cost < INF
}

/// Shortcut for a sequence number increment, sequence numbers never wrap
pub fn increment(x: &mut u64) {
    *x = x.saturating_add(1)
}
