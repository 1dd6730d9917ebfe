//! Преобразование таблицы в матрицу признаков и обратно

use ndarray::{Array1, Array2};

use crate::error::{PipelineError, Result};
use crate::preprocessing::encoding::LabelEncoder;
use crate::types::{Column, Table};

pub struct FeatureMatrix {
    pub names: Vec<String>,
    pub records: Array2<f64>,
}

/// Целевой столбец в виде индексов классов
pub struct Targets {
    pub classes: Array1<usize>,
    pub encoder: LabelEncoder,
}

pub struct FeatureEngineer;

impl FeatureEngineer {
    /// Отделяет целевой столбец; все остальные столбцы должны быть числовыми
    pub fn split_target(table: &Table, target: &str) -> Result<(FeatureMatrix, Targets)> {
        let target_column = table.column(target).ok_or_else(|| {
            PipelineError::preprocessing(format!("label column '{}' not found", target))
        })?;

        let names: Vec<String> = table
            .column_names()
            .iter()
            .filter(|name| name.as_str() != target)
            .cloned()
            .collect();

        let n_samples = table.n_rows();
        let mut records = Array2::zeros((n_samples, names.len()));

        for (j, name) in names.iter().enumerate() {
            let values = table
                .column(name)
                .and_then(Column::as_numeric)
                .ok_or_else(|| {
                    PipelineError::preprocessing(format!(
                        "feature column '{}' is not numeric",
                        name
                    ))
                })?;
            for (i, &value) in values.iter().enumerate() {
                records[[i, j]] = value;
            }
        }

        let mut encoder = LabelEncoder::new();
        let classes = Array1::from_vec(encoder.fit_transform(target_column)?);

        Ok((FeatureMatrix { names, records }, Targets { classes, encoder }))
    }

    /// Собирает таблицу: признаки в исходном порядке, целевой столбец последним
    pub fn assemble(
        features: FeatureMatrix,
        target: &str,
        classes: &[usize],
        encoder: &LabelEncoder,
    ) -> Result<Table> {
        let mut table = Table::new();
        for (j, name) in features.names.into_iter().enumerate() {
            let values = features.records.column(j).to_vec();
            table.push_column(name, Column::Numeric(values))?;
        }
        table.push_column(target, encoder.inverse_transform(classes)?)?;
        Ok(table)
    }
}
