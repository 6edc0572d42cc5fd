use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::Serialize;

use super::graph::GraphModel;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct CentralityRecord {
    pub degree: usize,
    pub betweenness: f64,
}

/// Per-node centrality for one graph snapshot. Values are raw (not
/// normalized); use [`CentralityTable::betweenness_scale`] for render sizing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CentralityTable {
    records: Vec<CentralityRecord>,
    max_degree: usize,
    max_betweenness: f64,
}

impl CentralityTable {
    pub fn compute(model: &GraphModel) -> Self {
        let adjacency = model.adjacency();
        let betweenness = brandes_betweenness(adjacency);

        let records = adjacency
            .iter()
            .zip(betweenness)
            .map(|(neighbors, betweenness)| CentralityRecord {
                degree: neighbors.len(),
                betweenness,
            })
            .collect::<Vec<_>>();

        let max_degree = records.iter().map(|record| record.degree).max().unwrap_or(0);
        let max_betweenness = records
            .iter()
            .map(|record| record.betweenness)
            .fold(0.0_f64, f64::max);

        Self {
            records,
            max_degree,
            max_betweenness,
        }
    }

    /// Missing entries read as zero rather than failing.
    pub fn get(&self, index: usize) -> CentralityRecord {
        self.records.get(index).copied().unwrap_or_default()
    }

    pub fn records(&self) -> &[CentralityRecord] {
        &self.records
    }

    pub fn max_degree(&self) -> usize {
        self.max_degree
    }

    pub fn max_betweenness(&self) -> f64 {
        self.max_betweenness
    }

    /// Betweenness divided by `max(1, observed maximum)`, in `[0, 1]`.
    pub fn betweenness_scale(&self, index: usize) -> f32 {
        (self.get(index).betweenness / self.max_betweenness.max(1.0)) as f32
    }

    pub fn degree_scale(&self, index: usize) -> f32 {
        self.get(index).degree as f32 / self.max_degree.max(1) as f32
    }

    pub fn by_id(&self, model: &GraphModel) -> BTreeMap<String, CentralityRecord> {
        model
            .nodes()
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), self.get(index)))
            .collect()
    }
}

/// Brandes' accumulation over an unweighted, undirected adjacency. Each
/// unordered pair is reached from both endpoints, so totals are halved.
pub fn brandes_betweenness(adjacency: &[BTreeSet<usize>]) -> Vec<f64> {
    let n = adjacency.len();
    let mut betweenness = vec![0.0_f64; n];
    if n < 3 {
        return betweenness;
    }

    let mut sigma = vec![0.0_f64; n];
    let mut distance = vec![-1_i64; n];
    let mut delta = vec![0.0_f64; n];
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut order = Vec::with_capacity(n);
    let mut queue = VecDeque::with_capacity(n);

    for source in 0..n {
        sigma.fill(0.0);
        distance.fill(-1);
        delta.fill(0.0);
        for list in &mut predecessors {
            list.clear();
        }
        order.clear();

        sigma[source] = 1.0;
        distance[source] = 0;
        queue.push_back(source);

        while let Some(current) = queue.pop_front() {
            order.push(current);
            for &next in &adjacency[current] {
                if next >= n {
                    continue;
                }
                if distance[next] < 0 {
                    distance[next] = distance[current] + 1;
                    queue.push_back(next);
                }
                if distance[next] == distance[current] + 1 {
                    sigma[next] += sigma[current];
                    predecessors[next].push(current);
                }
            }
        }

        for &node in order.iter().rev() {
            for &previous in &predecessors[node] {
                delta[previous] += (sigma[previous] / sigma[node]) * (1.0 + delta[node]);
            }
            if node != source {
                betweenness[node] += delta[node];
            }
        }
    }

    for value in &mut betweenness {
        *value /= 2.0;
    }
    betweenness
}
