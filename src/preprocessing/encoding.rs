//! Label encoding категориальных столбцов

use std::cmp::Ordering;
use std::fmt;

use crate::error::{PipelineError, Result};
use crate::types::{Column, Table};

/// Исходное значение категории
#[derive(Debug, Clone, PartialEq)]
pub enum Label {
    Number(f64),
    Text(String),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Number(value) => write!(f, "{}", value),
            Label::Text(value) => write!(f, "{}", value),
        }
    }
}

/// Коды присваиваются по порядку сортировки различных значений
pub struct LabelEncoder {
    classes: Option<Vec<Label>>,
}

impl LabelEncoder {
    pub fn new() -> Self {
        Self { classes: None }
    }

    pub fn fit(&mut self, column: &Column) {
        let classes = match column {
            Column::Numeric(values) => {
                let mut distinct: Vec<f64> = values.iter().map(|&v| canonical(v)).collect();
                distinct.sort_by(f64::total_cmp);
                distinct.dedup_by(|a, b| a.total_cmp(b) == Ordering::Equal);
                distinct.into_iter().map(Label::Number).collect()
            }
            Column::Text(values) => {
                let mut distinct: Vec<&String> = values.iter().collect();
                distinct.sort();
                distinct.dedup();
                distinct.into_iter().map(|v| Label::Text(v.clone())).collect()
            }
        };
        self.classes = Some(classes);
    }

    pub fn transform(&self, column: &Column) -> Result<Vec<usize>> {
        let classes = self.classes.as_ref().ok_or_else(|| {
            PipelineError::preprocessing("label encoder not fitted")
        })?;

        let unseen = |label: String| {
            PipelineError::preprocessing(format!("label '{}' was not seen during fit", label))
        };

        match column {
            Column::Numeric(values) => values
                .iter()
                .map(|&v| {
                    let v = canonical(v);
                    classes
                        .binary_search_by(|c| match c {
                            Label::Number(n) => n.total_cmp(&v),
                            Label::Text(_) => Ordering::Greater,
                        })
                        .map_err(|_| unseen(v.to_string()))
                })
                .collect(),
            Column::Text(values) => values
                .iter()
                .map(|v| {
                    classes
                        .binary_search_by(|c| match c {
                            Label::Text(t) => t.as_str().cmp(v.as_str()),
                            Label::Number(_) => Ordering::Less,
                        })
                        .map_err(|_| unseen(v.clone()))
                })
                .collect(),
        }
    }

    pub fn fit_transform(&mut self, column: &Column) -> Result<Vec<usize>> {
        self.fit(column);
        self.transform(column)
    }

    /// Обратное преобразование кодов в столбец исходного типа
    pub fn inverse_transform(&self, codes: &[usize]) -> Result<Column> {
        let classes = self.classes.as_ref().ok_or_else(|| {
            PipelineError::preprocessing("label encoder not fitted")
        })?;

        let label_at = |code: usize| {
            classes.get(code).ok_or_else(|| {
                PipelineError::preprocessing(format!("unknown label code {}", code))
            })
        };

        match classes.first() {
            Some(Label::Text(_)) => codes
                .iter()
                .map(|&code| label_at(code).map(Label::to_string))
                .collect::<Result<Vec<_>>>()
                .map(Column::Text),
            _ => codes
                .iter()
                .map(|&code| {
                    label_at(code).map(|label| match label {
                        Label::Number(n) => *n,
                        Label::Text(_) => f64::NAN,
                    })
                })
                .collect::<Result<Vec<_>>>()
                .map(Column::Numeric),
        }
    }

    pub fn classes(&self) -> &[Label] {
        self.classes.as_deref().unwrap_or(&[])
    }

    /// Таблица label → code для аудита
    pub fn mapping(&self) -> Vec<(Label, usize)> {
        self.classes()
            .iter()
            .cloned()
            .enumerate()
            .map(|(code, label)| (label, code))
            .collect()
    }
}

impl Default for LabelEncoder {
    fn default() -> Self {
        Self::new()
    }
}

fn canonical(value: f64) -> f64 {
    if value.is_nan() {
        f64::NAN
    } else if value == 0.0 {
        0.0
    } else {
        value
    }
}

/// Кодирует столбцы таблицы на месте; каждый столбец обучается независимо
pub fn encode_columns(
    table: &mut Table,
    columns: &[String],
) -> Result<Vec<(String, Vec<(Label, usize)>)>> {
    let mut mappings = Vec::with_capacity(columns.len());

    for name in columns {
        let column = table.column(name).ok_or_else(|| {
            PipelineError::preprocessing(format!("categorical column '{}' not found", name))
        })?;

        let mut encoder = LabelEncoder::new();
        let codes = encoder.fit_transform(column)?;
        table.replace_column(name, Column::Numeric(codes.iter().map(|&c| c as f64).collect()))?;
        mappings.push((name.clone(), encoder.mapping()));
    }

    Ok(mappings)
}
