//! Случайный лес поверх деревьев linfa-tree: нужен ради важности признаков

#![allow(non_snake_case)]

use linfa::traits::Fit;
use linfa::DatasetBase;
use linfa_tree::{DecisionTree, SplitQuality};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};

use crate::error::{PipelineError, Result};

pub struct RandomForest {
    n_estimators: usize,
    max_features: Option<usize>,
    max_depth: Option<usize>,
    min_weight_split: f32,
    seed: u64,
    feature_importances: Option<Array1<f64>>,
}

impl RandomForest {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            n_estimators: n_estimators.max(1),
            max_features: None,
            max_depth: None,
            min_weight_split: 2.0,
            seed: 42,
            feature_importances: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// По умолчанию ceil(sqrt(n_features)) признаков на дерево
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features.max(1));
        self
    }

    /// Ограничивает стоимость обучения на больших выборках
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_min_weight_split(mut self, min_weight_split: f32) -> Self {
        self.min_weight_split = min_weight_split;
        self
    }

    fn features_per_tree(&self, n_features: usize) -> usize {
        self.max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().ceil() as usize)
            .clamp(1, n_features)
    }

    pub fn fit(&mut self, X: &Array2<f64>, y: &Array1<usize>) -> Result<()> {
        let n_samples = X.nrows();
        let n_features = X.ncols();

        if n_samples == 0 || n_features == 0 {
            return Err(PipelineError::preprocessing("Empty dataset"));
        }
        if n_samples != y.len() {
            return Err(PipelineError::preprocessing(format!(
                "feature matrix has {} rows, labels have {}",
                n_samples,
                y.len()
            )));
        }

        let m = self.features_per_tree(n_features);
        let mut total = vec![0.0; n_features];

        for tree_idx in 0..self.n_estimators {
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(tree_idx as u64));

            // Bootstrap-выборка строк и случайное подпространство признаков
            let rows: Vec<usize> = (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
            let mut columns = sample(&mut rng, n_features, m).into_vec();
            columns.sort_unstable();

            let records = X.select(Axis(0), &rows).select(Axis(1), &columns);
            let targets: Array1<usize> = rows.iter().map(|&i| y[i]).collect();
            let dataset = DatasetBase::new(records, targets);

            let fitted: linfa::error::Result<DecisionTree<f64, usize>> = DecisionTree::params()
                .split_quality(SplitQuality::Gini)
                .max_depth(self.max_depth)
                .min_weight_split(self.min_weight_split)
                .fit(&dataset);
            let tree = fitted.map_err(|e| {
                PipelineError::preprocessing(format!("decision tree {} failed to fit: {}", tree_idx, e))
            })?;

            // Дерево без разбиений даёт NaN (0 / 0)
            for (&feature, importance) in columns.iter().zip(tree.feature_importance()) {
                if importance.is_finite() {
                    total[feature] += importance;
                }
            }
        }

        let mut importances = Array1::from_vec(total) / self.n_estimators as f64;
        let sum = importances.sum();
        if sum > 0.0 {
            importances /= sum;
        }

        self.feature_importances = Some(importances);
        Ok(())
    }

    /// Средняя важность признаков по деревьям, нормированная к сумме 1
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Признак 0 определяет класс, признак 1 - шум
    fn informative() -> (Array2<f64>, Array1<usize>) {
        let n = 60;
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            if j == 0 {
                i as f64
            } else {
                ((i * 7919) % 13) as f64
            }
        });
        let y = Array1::from_shape_fn(n, |i| usize::from(i >= n / 2));
        (x, y)
    }

    #[test]
    fn test_informative_feature_ranks_first() {
        let (x, y) = informative();
        let mut forest = RandomForest::new(25).with_seed(42).with_max_features(2);
        forest.fit(&x, &y).unwrap();

        let importances = forest.feature_importances().unwrap();
        assert_eq!(importances.len(), 2);
        assert!(importances[0] > importances[1], "importances = {}", importances);
        assert!((importances.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_seeded_importances_are_reproducible() {
        let (x, y) = informative();
        let mut a = RandomForest::new(10);
        let mut b = RandomForest::new(10);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.feature_importances(), b.feature_importances());
    }

    #[test]
    fn test_depth_limited_forest_still_ranks_informative_feature() {
        let (x, y) = informative();
        let mut forest = RandomForest::new(25)
            .with_max_features(2)
            .with_max_depth(Some(2))
            .with_min_weight_split(4.0);
        forest.fit(&x, &y).unwrap();

        let importances = forest.feature_importances().unwrap();
        assert!(importances[0] > importances[1], "importances = {}", importances);
    }

    #[test]
    fn test_length_mismatch() {
        let mut forest = RandomForest::new(3);
        let x = Array2::zeros((4, 2));
        let y = Array1::from_vec(vec![0, 1]);
        assert!(forest.fit(&x, &y).is_err());
    }
}
