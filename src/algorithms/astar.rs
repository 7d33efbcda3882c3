// Exact open-path search with A*
//
// States are (visited stops, current node), starting at the origin with
// nothing visited. The priority is g + h, where h is the cost of a minimum
// spanning tree over the current node and the unvisited stops. Any path
// that completes the route spans exactly those nodes, so h never
// overestimates; it is also consistent, so the first goal popped is optimal
// and closed states are never reopened. The state space is n * 2^n, which
// is why MAX_EXACT_STOPS caps n.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::iter;
use std::time::Instant;

use log::debug;
use petgraph::algo::min_spanning_tree;
use petgraph::data::Element;
use petgraph::graph::{NodeIndex, UnGraph};
use priority_queue::PriorityQueue;

use crate::algorithms::{RouteSolver, SolverOutcome};
use crate::config::MAX_EXACT_STOPS;
use crate::utils::cost_matrix::{CostMatrix, ORIGIN};

/// Expansions between two deadline checks
const DEADLINE_CHECK_INTERVAL: u64 = 256;

type VisitedSet = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SearchState {
    visited: VisitedSet,
    /// Node index (origin or stop + 1)
    at: usize,
}

impl SearchState {
    fn has_visited(&self, stop: usize) -> bool {
        self.visited & (1 << stop) != 0
    }
}

// Frontier priority: lower f first, then the most recently pushed state
#[derive(Debug, Clone, Copy)]
struct Priority {
    f: f64,
    seq: u64,
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed on f: the queue pops its maximum
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Priority {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Priority {}

#[derive(Debug, Clone, Copy)]
struct Record {
    g: f64,
    parent: Option<SearchState>,
}

/// Optimal open-path solver for small stop counts
#[derive(Debug, Clone, Copy, Default)]
pub struct AStarSolver;

impl AStarSolver {
    pub fn new() -> Self {
        Self
    }
}

impl RouteSolver for AStarSolver {
    fn solve(&self, matrix: &CostMatrix, deadline: Instant) -> Option<SolverOutcome> {
        let n = matrix.stop_count();
        if n > MAX_EXACT_STOPS {
            return None;
        }
        if n == 0 {
            return Some(SolverOutcome::new(Vec::new(), matrix, false));
        }

        let goal: VisitedSet = (1 << n) - 1;
        let start = SearchState {
            visited: 0,
            at: ORIGIN,
        };

        let mut frontier = PriorityQueue::new();
        let mut records: HashMap<SearchState, Record> = HashMap::new();
        let mut closed: HashSet<SearchState> = HashSet::new();
        let mut seq: u64 = 0;
        let mut expansions: u64 = 0;

        records.insert(
            start,
            Record {
                g: 0.0,
                parent: None,
            },
        );
        frontier.push(
            start,
            Priority {
                f: spanning_bound(matrix, start),
                seq,
            },
        );

        while let Some((state, _)) = frontier.pop() {
            if state.visited == goal {
                debug!(
                    "A* reached the goal after {} expansions ({} states recorded)",
                    expansions,
                    records.len()
                );
                let order = reconstruct(&records, state);
                return Some(SolverOutcome::new(order, matrix, false));
            }

            if expansions % DEADLINE_CHECK_INTERVAL == 0 && Instant::now() >= deadline {
                debug!("A* stopped by the deadline after {} expansions", expansions);
                return None;
            }
            expansions += 1;

            closed.insert(state);
            let Some(g) = records.get(&state).map(|record| record.g) else {
                continue;
            };

            // Successors go in reverse input order: on equal priority the
            // last pushed wins, which makes the earliest stop pop first
            for stop in (0..n).rev() {
                if state.has_visited(stop) {
                    continue;
                }
                let next = SearchState {
                    visited: state.visited | (1 << stop),
                    at: stop + 1,
                };
                if closed.contains(&next) {
                    continue;
                }

                let next_g = g + matrix.cost(state.at, next.at);
                if records
                    .get(&next)
                    .is_some_and(|record| record.g <= next_g)
                {
                    continue;
                }

                records.insert(
                    next,
                    Record {
                        g: next_g,
                        parent: Some(state),
                    },
                );
                seq += 1;
                frontier.push(
                    next,
                    Priority {
                        f: next_g + spanning_bound(matrix, next),
                        seq,
                    },
                );
            }
        }

        None
    }
}

/// Cost of a minimum spanning tree over the current node and every
/// unvisited stop
///
/// Edges take the cheaper direction, so the bound also holds for
/// asymmetric costs
fn spanning_bound(matrix: &CostMatrix, state: SearchState) -> f64 {
    let nodes: Vec<usize> = iter::once(state.at)
        .chain(
            (0..matrix.stop_count())
                .filter(|&stop| !state.has_visited(stop))
                .map(|stop| stop + 1),
        )
        .collect();
    if nodes.len() < 2 {
        return 0.0;
    }

    let mut graph =
        UnGraph::<usize, f64>::with_capacity(nodes.len(), nodes.len() * (nodes.len() - 1) / 2);
    for &node in &nodes {
        graph.add_node(node);
    }
    for (a, &from) in nodes.iter().enumerate() {
        for (b, &to) in nodes.iter().enumerate().skip(a + 1) {
            let weight = matrix.cost(from, to).min(matrix.cost(to, from));
            graph.add_edge(NodeIndex::new(a), NodeIndex::new(b), weight);
        }
    }

    min_spanning_tree(&graph)
        .filter_map(|element| match element {
            Element::Edge { weight, .. } => Some(weight),
            Element::Node { .. } => None,
        })
        .sum()
}

/// Walks parent links back from the goal; returns stop indices
fn reconstruct(records: &HashMap<SearchState, Record>, goal: SearchState) -> Vec<usize> {
    let mut order = Vec::new();
    let mut current = Some(goal);

    while let Some(state) = current {
        if state.at == ORIGIN {
            break;
        }
        order.push(state.at - 1);
        current = records.get(&state).and_then(|record| record.parent);
    }

    order.reverse();
    order
}
