//! Балансировка классов: SMOTE (Synthetic Minority Over-sampling Technique)

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{PipelineError, Result};
use crate::preprocessing::features::{FeatureEngineer, FeatureMatrix};
use crate::types::Table;

#[derive(Debug, Clone, Copy)]
struct Neighbor(f64, usize);

impl PartialEq for Neighbor {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for Neighbor {}
impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0).then(self.1.cmp(&other.1))
    }
}

#[derive(Debug, Clone)]
pub struct Smote {
    k_neighbors: usize,
    seed: u64,
}

impl Smote {
    pub fn new() -> Self {
        Self {
            k_neighbors: 5,
            seed: 42,
        }
    }

    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k.max(1);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).powi(2))
            .sum::<f64>()
    }

    /// k ближайших соседей каждой строки внутри класса (сама строка исключается)
    fn nearest_neighbors(&self, samples: &Array2<f64>) -> Vec<Vec<usize>> {
        let k = self.k_neighbors;
        (0..samples.nrows())
            .map(|i| {
                let mut heap: BinaryHeap<Neighbor> = BinaryHeap::with_capacity(k + 1);
                for j in 0..samples.nrows() {
                    if i == j {
                        continue;
                    }
                    let candidate = Neighbor(Self::squared_distance(samples.row(i), samples.row(j)), j);
                    if heap.len() < k {
                        heap.push(candidate);
                    } else if heap.peek().map_or(false, |worst| candidate < *worst) {
                        heap.pop();
                        heap.push(candidate);
                    }
                }
                heap.into_sorted_vec().into_iter().map(|n| n.1).collect()
            })
            .collect()
    }

    /// Дополняет каждый класс синтетическими строками до размера самого большого.
    /// Исходные строки идут первыми, синтетические добавляются в конец.
    pub fn fit_resample(
        &self,
        x: &Array2<f64>,
        y: &Array1<usize>,
    ) -> Result<(Array2<f64>, Array1<usize>)> {
        if x.nrows() != y.len() {
            return Err(PipelineError::preprocessing(format!(
                "feature matrix has {} rows, labels have {}",
                x.nrows(),
                y.len()
            )));
        }
        if x.iter().any(|v| v.is_nan()) {
            return Err(PipelineError::preprocessing(
                "feature matrix contains NaN values",
            ));
        }

        let mut class_indices: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, &label) in y.iter().enumerate() {
            class_indices.entry(label).or_default().push(i);
        }
        if class_indices.len() < 2 {
            return Err(PipelineError::preprocessing(format!(
                "SMOTE needs at least 2 classes, got {}",
                class_indices.len()
            )));
        }

        let majority = class_indices.values().map(Vec::len).max().unwrap_or(0);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut synthetic_x: Vec<f64> = Vec::new();
        let mut synthetic_y: Vec<usize> = Vec::new();

        for (&class, indices) in &class_indices {
            let n_to_generate = majority - indices.len();
            if n_to_generate == 0 {
                continue;
            }
            if indices.len() <= self.k_neighbors {
                return Err(PipelineError::preprocessing(format!(
                    "class {} has {} samples, SMOTE with k_neighbors={} needs at least {}",
                    class,
                    indices.len(),
                    self.k_neighbors,
                    self.k_neighbors + 1
                )));
            }

            let samples = x.select(ndarray::Axis(0), indices);
            let neighbors = self.nearest_neighbors(&samples);
            let k = self.k_neighbors;

            for _ in 0..n_to_generate {
                let pick = rng.gen_range(0..samples.nrows() * k);
                let row = samples.row(pick / k);
                let neighbor = samples.row(neighbors[pick / k][pick % k]);
                let gap: f64 = rng.gen();
                synthetic_x.extend(row.iter().zip(neighbor.iter()).map(|(&p, &n)| p + gap * (n - p)));
                synthetic_y.push(class);
            }

            tracing::debug!("Class {}: generated {} synthetic samples", class, n_to_generate);
        }

        let n_original = x.nrows();
        let n_features = x.ncols();
        let n_synthetic = synthetic_y.len();
        let resampled_x = Array2::from_shape_fn((n_original + n_synthetic, n_features), |(i, j)| {
            if i < n_original {
                x[[i, j]]
            } else {
                synthetic_x[(i - n_original) * n_features + j]
            }
        });

        let mut resampled_y = y.to_vec();
        resampled_y.extend(synthetic_y);

        Ok((resampled_x, Array1::from_vec(resampled_y)))
    }
}

impl Default for Smote {
    fn default() -> Self {
        Self::new()
    }
}

/// Балансирует таблицу по целевому столбцу
pub fn balance_classes(table: &Table, target: &str, smote: &Smote) -> Result<Table> {
    let (features, targets) = FeatureEngineer::split_target(table, target)?;
    let (x, y) = smote.fit_resample(&features.records, &targets.classes)?;

    let features = FeatureMatrix {
        names: features.names,
        records: x,
    };
    FeatureEngineer::assemble(features, target, &y.to_vec(), &targets.encoder)
}
