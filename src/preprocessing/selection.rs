//! Отбор признаков по важности в случайном лесе

use crate::error::{PipelineError, Result};
use crate::models::RandomForest;
use crate::preprocessing::features::FeatureEngineer;
use crate::types::Table;

pub struct FeatureSelector {
    num_features: usize,
    n_estimators: usize,
    max_depth: Option<usize>,
    min_weight_split: f32,
    seed: u64,
}

impl FeatureSelector {
    pub fn new(num_features: usize) -> Self {
        Self {
            num_features,
            n_estimators: 100,
            max_depth: None,
            min_weight_split: 2.0,
            seed: 42,
        }
    }

    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    pub fn with_tree_limits(mut self, max_depth: Option<usize>, min_weight_split: f32) -> Self {
        self.max_depth = max_depth;
        self.min_weight_split = min_weight_split;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Все признаки по убыванию важности (при равенстве сохраняется порядок столбцов)
    pub fn rank(&self, table: &Table, target: &str) -> Result<Vec<(String, f64)>> {
        let (features, targets) = FeatureEngineer::split_target(table, target)?;

        let mut forest = RandomForest::new(self.n_estimators)
            .with_seed(self.seed)
            .with_max_depth(self.max_depth)
            .with_min_weight_split(self.min_weight_split);
        forest.fit(&features.records, &targets.classes)?;
        let importances = forest
            .feature_importances()
            .ok_or_else(|| PipelineError::preprocessing("forest has no feature importances"))?;

        let mut ranking: Vec<(String, f64)> = features
            .names
            .into_iter()
            .zip(importances.iter().copied())
            .collect();
        ranking.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(ranking)
    }

    /// Оставляет min(K, доступно) лучших признаков и целевой столбец
    pub fn select(&self, table: &Table, target: &str) -> Result<(Table, Vec<(String, f64)>)> {
        let mut ranking = self.rank(table, target)?;
        ranking.truncate(self.num_features);

        let mut columns: Vec<&str> = ranking.iter().map(|(name, _)| name.as_str()).collect();
        columns.push(target);
        let selected = table.select_columns(&columns)?;

        Ok((selected, ranking))
    }
}

/// Приводит таблицу к набору и порядку столбцов эталона
pub fn align_columns(table: &Table, reference: &Table) -> Result<Table> {
    table.select_columns(reference.column_names()).map_err(|e| {
        PipelineError::preprocessing_with("test data does not have the selected columns", e)
    })
}
