//! Property-based tests for the matrix pipeline.
//!
//! These tests verify invariants that should hold for any input:
//! - Any square matrix symmetrizes to a symmetric one
//! - Symmetrizing a symmetric matrix changes nothing
//! - Graphs have one node per label and one edge per nonzero upper cell
//! - Community output partitions the node set

use proptest::prelude::*;
use review_network::{
    annotate, symmetrize, AdjacencyTable, AttrValue, CommunityDetection, ConnectedComponents,
    GreedyModularity, NetworkGraph, COMMUNITY_KEY,
};

fn weight() -> impl Strategy<Value = f64> {
    prop_oneof![3 => Just(0.0), 2 => (1u8..10).prop_map(f64::from)]
}

fn labelled(n: usize, values: Vec<Vec<f64>>) -> AdjacencyTable {
    let labels: Vec<String> = (0..n).map(|i| format!("n{i}")).collect();
    AdjacencyTable {
        row_labels: labels.clone(),
        column_labels: labels,
        values,
    }
}

/// Any square matrix: arbitrary lower cells and diagonal.
fn arb_square() -> impl Strategy<Value = AdjacencyTable> {
    (1usize..12).prop_flat_map(|n| {
        prop::collection::vec(weight(), n * n).prop_map(move |cells| {
            let values = cells.chunks(n).map(<[f64]>::to_vec).collect();
            labelled(n, values)
        })
    })
}

/// Upper-triangular matrix, lower half zero. The diagonal is zero unless
/// `diagonal` is set.
fn arb_upper_triangular_with(diagonal: bool) -> impl Strategy<Value = AdjacencyTable> {
    (1usize..12).prop_flat_map(move |n| {
        prop::collection::vec(weight(), n * n).prop_map(move |cells| {
            let keep = |i: usize, j: usize| j > i || (diagonal && j == i);
            let values = (0..n)
                .map(|i| (0..n).map(|j| if keep(i, j) { cells[i * n + j] } else { 0.0 }).collect())
                .collect();
            labelled(n, values)
        })
    })
}

fn arb_upper_triangular() -> impl Strategy<Value = AdjacencyTable> {
    arb_upper_triangular_with(false)
}

/// Nonzero cells on or above the diagonal (`skip_diagonal` leaves it out).
fn nonzero_upper(table: &AdjacencyTable, skip_diagonal: bool) -> usize {
    let offset = usize::from(skip_diagonal);
    table
        .values
        .iter()
        .enumerate()
        .map(|(i, row)| row.iter().skip(i + offset).filter(|&&v| v != 0.0).count())
        .sum()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn symmetrized_matrix_is_symmetric(table in arb_upper_triangular()) {
        let m = symmetrize(&table).unwrap();
        for i in 0..m.len() {
            for j in 0..m.len() {
                prop_assert_eq!(m.get(i, j), m.get(j, i));
            }
        }
    }

    #[test]
    fn any_square_matrix_symmetrizes(table in arb_square()) {
        let m = symmetrize(&table).unwrap();
        prop_assert!(m.is_symmetric(0.0));
        for i in 0..m.len() {
            prop_assert_eq!(m.get(i, i), table.values[i][i]);
            for j in (i + 1)..m.len() {
                prop_assert_eq!(m.get(j, i), table.values[i][j]);
            }
        }
    }

    #[test]
    fn symmetrize_is_idempotent(table in arb_square()) {
        let once = symmetrize(&table).unwrap();
        let twice = symmetrize(&AdjacencyTable::from(once.clone())).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn graph_counts_match_matrix(table in arb_upper_triangular()) {
        let graph = NetworkGraph::from_matrix(&symmetrize(&table).unwrap());
        prop_assert_eq!(graph.node_count(), table.rows());
        prop_assert_eq!(graph.edge_count(), nonzero_upper(&table, true));
    }

    #[test]
    fn self_loops_count_as_edges(table in arb_upper_triangular_with(true)) {
        let graph = NetworkGraph::from_matrix(&symmetrize(&table).unwrap());
        prop_assert_eq!(graph.node_count(), table.rows());
        prop_assert_eq!(graph.edge_count(), nonzero_upper(&table, false));
    }

    #[test]
    fn greedy_output_is_a_partition(table in arb_upper_triangular_with(true), w in any::<bool>()) {
        let mut graph = NetworkGraph::from_matrix(&symmetrize(&table).unwrap());
        let partition = GreedyModularity::new().with_weighted(w).detect(&graph).unwrap();
        prop_assert!(partition.validate(&graph).is_ok());

        annotate(&mut graph, &partition, COMMUNITY_KEY).unwrap();
        let ids = graph.node_attributes(COMMUNITY_KEY);
        prop_assert_eq!(ids.len(), graph.node_count());
        for value in ids.values() {
            match value {
                AttrValue::Int(id) => prop_assert!((0..partition.len() as i64).contains(id)),
                other => prop_assert!(false, "unexpected community value {:?}", other),
            }
        }
    }

    #[test]
    fn greedy_never_merges_components(table in arb_upper_triangular_with(true)) {
        let graph = NetworkGraph::from_matrix(&symmetrize(&table).unwrap());
        let greedy = GreedyModularity::new().detect(&graph).unwrap();
        let components = ConnectedComponents.detect(&graph).unwrap();
        prop_assert!(greedy.len() >= components.len());
    }
}

#[test]
fn three_node_example() {
    let csv = ",A,B,C\nA,0,1,0\nB,0,0,2\nC,0,0,0\n";
    let table = AdjacencyTable::from_reader(csv.as_bytes()).unwrap();
    let m = symmetrize(&table).unwrap();
    assert_eq!((m.get(0, 1), m.get(1, 0)), (1.0, 1.0));
    assert_eq!((m.get(1, 2), m.get(2, 1)), (2.0, 2.0));
    assert_eq!(m.get(0, 2), 0.0);

    let graph = NetworkGraph::from_matrix(&m);
    let mut edges: Vec<(String, String, f64)> = graph
        .edges()
        .map(|(a, b, e)| (a.to_string(), b.to_string(), e.weight().unwrap()))
        .collect();
    edges.sort_by(|x, y| x.0.cmp(&y.0));
    assert_eq!(
        edges,
        vec![("A".into(), "B".into(), 1.0), ("B".into(), "C".into(), 2.0)]
    );
}
