use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    improvement: f64,
}

/// Binary regression tree grown on squared error with Friedman's improvement score
///
/// Samples with `x[feature] <= threshold` go left. Leaf values are supplied by the
/// caller from the sample indices that reach the leaf.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    pub fn fit<F>(x: ArrayView2<f64>, targets: &[f64], max_depth: usize, leaf_value: F) -> Self
    where
        F: Fn(&[usize]) -> f64,
    {
        let mut tree = Self { nodes: Vec::new() };
        let indices: Vec<usize> = (0..x.nrows()).collect();
        tree.grow(&x, targets, indices, 0, max_depth, &leaf_value);
        tree
    }

    fn grow<F>(
        &mut self,
        x: &ArrayView2<f64>,
        targets: &[f64],
        indices: Vec<usize>,
        depth: usize,
        max_depth: usize,
        leaf_value: &F,
    ) -> usize
    where
        F: Fn(&[usize]) -> f64,
    {
        let node_id = self.nodes.len();
        self.nodes.push(Node::Leaf { value: 0.0 });

        if depth < max_depth && indices.len() >= 2 && !is_pure(targets, &indices) {
            if let Some(split) = best_split(x, targets, &indices) {
                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| x[[i, split.feature]] <= split.threshold);

                let left = self.grow(x, targets, left_idx, depth + 1, max_depth, leaf_value);
                let right = self.grow(x, targets, right_idx, depth + 1, max_depth, leaf_value);

                self.nodes[node_id] = Node::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    left,
                    right,
                };
                return node_id;
            }
        }

        self.nodes[node_id] = Node::Leaf {
            value: leaf_value(&indices),
        };
        node_id
    }

    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut node = 0;
        loop {
            match &self.nodes[node] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }
}

fn is_pure(targets: &[f64], indices: &[usize]) -> bool {
    let first = targets[indices[0]];
    indices
        .iter()
        .all(|&i| (targets[i] - first).abs() <= f64::EPSILON)
}

/// Exhaustive search over every feature and every gap between distinct values
fn best_split(x: &ArrayView2<f64>, targets: &[f64], indices: &[usize]) -> Option<SplitCandidate> {
    let n = indices.len();
    let total: f64 = indices.iter().map(|&i| targets[i]).sum();
    let mut best: Option<SplitCandidate> = None;
    let mut order = indices.to_vec();

    for feature in 0..x.ncols() {
        order.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

        let mut left_sum = 0.0;
        for pos in 1..n {
            left_sum += targets[order[pos - 1]];

            let prev = x[[order[pos - 1], feature]];
            let next = x[[order[pos], feature]];
            if next <= prev {
                continue;
            }

            let n_left = pos as f64;
            let n_right = (n - pos) as f64;
            let diff = left_sum / n_left - (total - left_sum) / n_right;
            let improvement = n_left * n_right * diff * diff / (n_left + n_right);

            if best.map_or(true, |b| improvement > b.improvement) {
                let mut threshold = prev + (next - prev) / 2.0;
                if threshold >= next {
                    threshold = prev;
                }
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    improvement,
                });
            }
        }
    }

    best.filter(|b| b.improvement > 0.0)
}
