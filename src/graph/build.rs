use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::util::canonical_address;
use crate::wallet::{Direction, TransactionRecord};

use super::{NodeRole, TxEdge, TxGraph, TxNode};

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("this address has no transactions to display")]
    NoValidTransactions,
    #[error("no connections could be derived from these transactions; try a different address")]
    NoValidConnections,
}

const FOCUS_INDEX: usize = 0;

/// Turns a transaction list into the focus address's one-hop neighborhood.
///
/// Records are validity-filtered and truncated to `limit`, endpoints are
/// interned into a node arena (focus first), and raw transfers collapse into
/// at most one edge per (unordered pair, direction) group. Two fallback
/// stages run in strict priority order when aggregation comes up empty, so
/// the focus node is never left isolated while any valid record exists.
/// `explored` holds canonical addresses the user has already clicked into.
pub fn build_graph(
    transactions: &[TransactionRecord],
    focus: &str,
    limit: usize,
    explored: &HashSet<String>,
) -> Result<TxGraph, BuildError> {
    if transactions.is_empty() {
        return Err(BuildError::NoValidTransactions);
    }

    let filtered = transactions
        .iter()
        .filter(|record| record.is_valid())
        .take(limit)
        .collect::<Vec<_>>();

    let mut nodes = vec![TxNode {
        address: focus.to_owned(),
        role: NodeRole::Focus,
    }];
    let mut index_by_address = HashMap::new();
    index_by_address.insert(canonical_address(focus), FOCUS_INDEX);

    for record in &filtered {
        intern_node(&mut nodes, &mut index_by_address, explored, &record.source_address);
        intern_node(&mut nodes, &mut index_by_address, explored, &record.target_address);
    }

    let mut edges = aggregate_pairs(&filtered, FOCUS_INDEX, &index_by_address);
    if edges.is_empty() {
        edges = synthesize_from_peers(&filtered, FOCUS_INDEX, &index_by_address);
    }
    if edges.is_empty()
        && let Some(&record) = filtered.first()
        && let Some(edge) = synthesize_single_edge(record, FOCUS_INDEX, &index_by_address)
    {
        edges.push(edge);
    }

    if edges.is_empty() {
        return Err(BuildError::NoValidConnections);
    }

    Ok(TxGraph {
        nodes,
        edges,
        focus_index: FOCUS_INDEX,
        index_by_address,
    })
}

fn intern_node(
    nodes: &mut Vec<TxNode>,
    index_by_address: &mut HashMap<String, usize>,
    explored: &HashSet<String>,
    address: &str,
) -> usize {
    let key = canonical_address(address);
    if let Some(&index) = index_by_address.get(&key) {
        return index;
    }

    let role = if explored.contains(&key) {
        NodeRole::Explored
    } else {
        NodeRole::Peripheral
    };
    let index = nodes.len();
    nodes.push(TxNode {
        address: address.to_owned(),
        role,
    });
    index_by_address.insert(key, index);
    index
}

fn resolve(index_by_address: &HashMap<String, usize>, address: &str) -> Option<usize> {
    index_by_address.get(&canonical_address(address)).copied()
}

struct EdgeGroup {
    source: usize,
    target: usize,
    amount: f64,
    representative_tx: String,
    member_count: usize,
}

impl EdgeGroup {
    fn seed(source: usize, target: usize, record: &TransactionRecord) -> Self {
        Self {
            source,
            target,
            amount: 0.0,
            representative_tx: record.transaction_id.clone(),
            member_count: 0,
        }
    }

    fn absorb(&mut self, record: &TransactionRecord) {
        self.amount += record.amount;
        self.member_count += 1;
    }

    fn into_edge(self, direction: Direction) -> TxEdge {
        TxEdge {
            source: self.source,
            target: self.target,
            amount: self.amount,
            direction,
            representative_tx: self.representative_tx,
            member_count: self.member_count,
        }
    }
}

/// Primary aggregation: one edge per (unordered pair, direction) group.
/// Direction is relative to the focus (outgoing iff the record's source is
/// the focus), so each focus peer collapses to at most one incoming plus one
/// outgoing edge. Focus-adjacent edges are oriented by that direction;
/// other pairs keep the orientation of their first record.
fn aggregate_pairs(
    filtered: &[&TransactionRecord],
    focus: usize,
    index_by_address: &HashMap<String, usize>,
) -> Vec<TxEdge> {
    let mut order = Vec::new();
    let mut groups: HashMap<(usize, usize, Direction), EdgeGroup> = HashMap::new();

    for record in filtered {
        let Some(source) = resolve(index_by_address, &record.source_address) else {
            continue;
        };
        let Some(target) = resolve(index_by_address, &record.target_address) else {
            continue;
        };
        if source == target {
            continue;
        }

        let direction = if source == focus {
            Direction::Outgoing
        } else {
            Direction::Incoming
        };
        let (edge_source, edge_target) = if source == focus || target == focus {
            let peer = if source == focus { target } else { source };
            match direction {
                Direction::Outgoing => (focus, peer),
                Direction::Incoming => (peer, focus),
            }
        } else {
            (source, target)
        };

        let key = (source.min(target), source.max(target), direction);
        groups
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                EdgeGroup::seed(edge_source, edge_target, record)
            })
            .absorb(record);
    }

    order
        .into_iter()
        .map(|key| {
            let group = groups.remove(&key).expect("group exists");
            group.into_edge(key.2)
        })
        .collect()
}

/// First fallback: connect the focus to every peer named by a record that
/// touches it, trusting the record's own direction field and ignoring which
/// slot the focus occupied.
fn synthesize_from_peers(
    filtered: &[&TransactionRecord],
    focus: usize,
    index_by_address: &HashMap<String, usize>,
) -> Vec<TxEdge> {
    let mut order = Vec::new();
    let mut groups: HashMap<(usize, Direction), EdgeGroup> = HashMap::new();

    for record in filtered {
        let Some(source) = resolve(index_by_address, &record.source_address) else {
            continue;
        };
        let Some(target) = resolve(index_by_address, &record.target_address) else {
            continue;
        };

        let peer = if source == focus {
            target
        } else if target == focus {
            source
        } else {
            continue;
        };
        if peer == focus {
            continue;
        }

        let (edge_source, edge_target) = match record.direction {
            Direction::Outgoing => (focus, peer),
            Direction::Incoming => (peer, focus),
        };

        let key = (peer, record.direction);
        groups
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                EdgeGroup::seed(edge_source, edge_target, record)
            })
            .absorb(record);
    }

    order
        .into_iter()
        .map(|key| {
            let group = groups.remove(&key).expect("group exists");
            group.into_edge(key.1)
        })
        .collect()
}

/// Last fallback: force one visible connection out of a single record. The
/// focus takes the slot named by the record's direction (incoming puts it in
/// the target slot, outgoing in the source slot) and the record's other
/// endpoint keeps the opposite slot.
fn synthesize_single_edge(
    record: &TransactionRecord,
    focus: usize,
    index_by_address: &HashMap<String, usize>,
) -> Option<TxEdge> {
    let source = resolve(index_by_address, &record.source_address)?;
    let target = resolve(index_by_address, &record.target_address)?;

    let other = if source == focus {
        target
    } else if target == focus {
        source
    } else {
        match record.direction {
            Direction::Incoming => source,
            Direction::Outgoing => target,
        }
    };
    if other == focus {
        return None;
    }

    let (edge_source, edge_target) = match record.direction {
        Direction::Incoming => (other, focus),
        Direction::Outgoing => (focus, other),
    };

    Some(TxEdge {
        source: edge_source,
        target: edge_target,
        amount: record.amount,
        direction: record.direction,
        representative_tx: record.transaction_id.clone(),
        member_count: 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOCUS: &str = "0xf0cus00000000000000000000000000000000001";
    const BOB: &str = "0xb0b0000000000000000000000000000000000002";
    const CAROL: &str = "0xca201000000000000000000000000000000000e3";
    const DAVE: &str = "0xdave000000000000000000000000000000000004";

    fn record(source: &str, target: &str, amount: f64, tx: &str) -> TransactionRecord {
        let direction = if source.eq_ignore_ascii_case(FOCUS) {
            Direction::Outgoing
        } else {
            Direction::Incoming
        };
        TransactionRecord {
            source_address: source.to_owned(),
            target_address: target.to_owned(),
            amount,
            timestamp: 1_700_000_000,
            transaction_id: tx.to_owned(),
            direction,
            gas_cost: 0.0,
        }
    }

    fn build(transactions: &[TransactionRecord]) -> Result<TxGraph, BuildError> {
        build_graph(transactions, FOCUS, 50, &HashSet::new())
    }

    #[test]
    fn repeated_transfers_collapse_into_one_aggregated_edge() {
        let graph = build(&[
            record(FOCUS, BOB, 1.0, "0xh1"),
            record(FOCUS, BOB, 2.0, "0xh2"),
        ])
        .unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        let edge = &graph.edges[0];
        assert_eq!(edge.source, graph.focus_index);
        assert_eq!(edge.direction, Direction::Outgoing);
        assert!((edge.amount - 3.0).abs() < 1e-12);
        assert_eq!(edge.member_count, 2);
        assert_eq!(edge.representative_tx, "0xh1");
    }

    #[test]
    fn opposite_flows_become_one_incoming_and_one_outgoing_edge() {
        let graph = build(&[
            record(FOCUS, BOB, 1.0, "0xh1"),
            record(CAROL, FOCUS, 2.0, "0xh2"),
        ])
        .unwrap();

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);

        let outgoing = &graph.edges[0];
        assert_eq!(outgoing.direction, Direction::Outgoing);
        assert_eq!(outgoing.source, graph.focus_index);

        let incoming = &graph.edges[1];
        assert_eq!(incoming.direction, Direction::Incoming);
        assert_eq!(incoming.target, graph.focus_index);
        let carol = graph.index_by_address[&canonical_address(CAROL)];
        assert_eq!(incoming.source, carol);
    }

    #[test]
    fn a_peer_collapses_to_at_most_two_edges() {
        let graph = build(&[
            record(FOCUS, BOB, 1.0, "0xh1"),
            record(BOB, FOCUS, 4.0, "0xh2"),
            record(FOCUS, BOB, 2.0, "0xh3"),
            record(BOB, FOCUS, 8.0, "0xh4"),
        ])
        .unwrap();

        assert_eq!(graph.edge_count(), 2);
        let outgoing = graph
            .edges
            .iter()
            .find(|edge| edge.direction == Direction::Outgoing)
            .unwrap();
        let incoming = graph
            .edges
            .iter()
            .find(|edge| edge.direction == Direction::Incoming)
            .unwrap();
        assert!((outgoing.amount - 3.0).abs() < 1e-12);
        assert!((incoming.amount - 12.0).abs() < 1e-12);
    }

    #[test]
    fn aggregation_conserves_raw_amounts() {
        let transactions = [
            record(FOCUS, BOB, 1.0, "0xh1"),
            record(FOCUS, BOB, 2.0, "0xh2"),
            record(BOB, FOCUS, 4.0, "0xh3"),
            record(CAROL, BOB, 8.0, "0xh4"),
            record(CAROL, DAVE, 16.0, "0xh5"),
        ];
        let graph = build(&transactions).unwrap();

        let raw_total: f64 = transactions.iter().map(|record| record.amount).sum();
        let edge_total: f64 = graph.edges.iter().map(|edge| edge.amount).sum();
        assert!((raw_total - edge_total).abs() < 1e-12);
    }

    #[test]
    fn every_edge_joins_two_distinct_arena_nodes() {
        let graph = build(&[
            record(FOCUS, BOB, 1.0, "0xh1"),
            record(BOB, CAROL, 2.0, "0xh2"),
            record(DAVE, FOCUS, 3.0, "0xh3"),
            record(CAROL, DAVE, 4.0, "0xh4"),
        ])
        .unwrap();

        for edge in &graph.edges {
            assert_ne!(edge.source, edge.target);
            assert!(edge.source < graph.node_count());
            assert!(edge.target < graph.node_count());
            assert!(edge.member_count >= 1);
            assert!(edge.amount >= 0.0);
        }
    }

    #[test]
    fn empty_input_reports_no_valid_transactions() {
        assert_eq!(build(&[]).unwrap_err(), BuildError::NoValidTransactions);
    }

    #[test]
    fn self_referential_only_input_reports_no_valid_connections() {
        let result = build(&[record(FOCUS, FOCUS, 1.0, "0xh1")]);
        assert_eq!(result.unwrap_err(), BuildError::NoValidConnections);
    }

    #[test]
    fn a_record_touching_the_focus_always_yields_a_connection() {
        let graph = build(&[record(FOCUS, BOB, 0.0, "0xh1")]).unwrap();
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn detail_limit_truncates_after_the_validity_filter() {
        let mut transactions = vec![record(FOCUS, FOCUS, 1.0, "0xbad"); 5];
        for index in 0..200 {
            transactions.push(record(
                FOCUS,
                &format!("0xpeer{index:036}"),
                1.0,
                &format!("0xh{index}"),
            ));
        }

        let graph = build_graph(&transactions, FOCUS, 25, &HashSet::new()).unwrap();
        // 25 valid records considered, each with a distinct peer.
        assert_eq!(graph.node_count(), 26);
        assert_eq!(graph.edge_count(), 25);
    }

    #[test]
    fn addresses_dedupe_case_insensitively() {
        let graph = build(&[
            record(FOCUS, BOB, 1.0, "0xh1"),
            record(FOCUS, &BOB.to_ascii_uppercase(), 2.0, "0xh2"),
        ])
        .unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!((graph.edges[0].amount - 3.0).abs() < 1e-12);
    }

    #[test]
    fn roles_come_from_the_explored_set_with_focus_winning() {
        let explored: HashSet<String> = [canonical_address(FOCUS), canonical_address(BOB)]
            .into_iter()
            .collect();
        let graph = build_graph(
            &[
                record(FOCUS, BOB, 1.0, "0xh1"),
                record(CAROL, FOCUS, 2.0, "0xh2"),
            ],
            FOCUS,
            50,
            &explored,
        )
        .unwrap();

        assert_eq!(graph.nodes[graph.focus_index].role, NodeRole::Focus);
        let bob = graph.index_by_address[&canonical_address(BOB)];
        assert_eq!(graph.nodes[bob].role, NodeRole::Explored);
        let carol = graph.index_by_address[&canonical_address(CAROL)];
        assert_eq!(graph.nodes[carol].role, NodeRole::Peripheral);
    }

    #[test]
    fn focus_node_is_always_first_in_the_arena() {
        let graph = build(&[record(BOB, CAROL, 1.0, "0xh1")]).unwrap();
        assert_eq!(graph.focus_index, 0);
        assert_eq!(
            canonical_address(&graph.nodes[0].address),
            canonical_address(FOCUS)
        );
    }

    // The fallback stages are unreachable through `build_graph` with
    // well-formed input (any valid record survives pair aggregation), so
    // they are exercised directly in priority order.

    fn arena_for(records: &[&TransactionRecord]) -> HashMap<String, usize> {
        let mut nodes = vec![TxNode {
            address: FOCUS.to_owned(),
            role: NodeRole::Focus,
        }];
        let mut index_by_address = HashMap::new();
        index_by_address.insert(canonical_address(FOCUS), FOCUS_INDEX);
        for record in records {
            intern_node(
                &mut nodes,
                &mut index_by_address,
                &HashSet::new(),
                &record.source_address,
            );
            intern_node(
                &mut nodes,
                &mut index_by_address,
                &HashSet::new(),
                &record.target_address,
            );
        }
        index_by_address
    }

    #[test]
    fn peer_synthesis_trusts_the_record_direction_field() {
        // Direction field says incoming even though the pairing puts the
        // focus in the source slot.
        let mut twisted = record(FOCUS, BOB, 5.0, "0xh1");
        twisted.direction = Direction::Incoming;
        let records = [&twisted];
        let index_by_address = arena_for(&records);

        let edges = synthesize_from_peers(&records, FOCUS_INDEX, &index_by_address);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].direction, Direction::Incoming);
        assert_eq!(edges[0].target, FOCUS_INDEX);
        assert!((edges[0].amount - 5.0).abs() < 1e-12);
    }

    #[test]
    fn peer_synthesis_aggregates_per_peer_and_direction() {
        let first = record(FOCUS, BOB, 1.0, "0xh1");
        let second = record(FOCUS, BOB, 2.0, "0xh2");
        let third = record(BOB, FOCUS, 4.0, "0xh3");
        let records = [&first, &second, &third];
        let index_by_address = arena_for(&records);

        let edges = synthesize_from_peers(&records, FOCUS_INDEX, &index_by_address);
        assert_eq!(edges.len(), 2);
        assert!((edges[0].amount - 3.0).abs() < 1e-12);
        assert_eq!(edges[0].member_count, 2);
        assert!((edges[1].amount - 4.0).abs() < 1e-12);
    }

    #[test]
    fn peer_synthesis_skips_records_not_touching_the_focus() {
        let stranger = record(BOB, CAROL, 1.0, "0xh1");
        let records = [&stranger];
        let index_by_address = arena_for(&records);
        assert!(synthesize_from_peers(&records, FOCUS_INDEX, &index_by_address).is_empty());
    }

    #[test]
    fn single_edge_synthesis_remaps_the_focus_into_the_direction_slot() {
        let incoming = record(BOB, CAROL, 7.0, "0xh1");
        let records = [&incoming];
        let index_by_address = arena_for(&records);

        // Incoming: the focus takes the target slot, the source endpoint stays.
        let edge = synthesize_single_edge(&incoming, FOCUS_INDEX, &index_by_address).unwrap();
        let bob = index_by_address[&canonical_address(BOB)];
        assert_eq!(edge.source, bob);
        assert_eq!(edge.target, FOCUS_INDEX);
        assert_eq!(edge.member_count, 1);

        let mut outgoing = record(BOB, CAROL, 7.0, "0xh2");
        outgoing.direction = Direction::Outgoing;
        let edge = synthesize_single_edge(&outgoing, FOCUS_INDEX, &index_by_address).unwrap();
        let carol = index_by_address[&canonical_address(CAROL)];
        assert_eq!(edge.source, FOCUS_INDEX);
        assert_eq!(edge.target, carol);
    }
}
