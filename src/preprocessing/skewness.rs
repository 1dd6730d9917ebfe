//! Коррекция асимметрии числовых признаков через log(1 + x)

use crate::error::{PipelineError, Result};
use crate::types::{Column, Table};

/// Выборочная асимметрия (скорректированный коэффициент Фишера–Пирсона), NaN пропускаются
pub fn skewness(values: &[f64]) -> f64 {
    let finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    let n = finite.len() as f64;
    if finite.len() < 3 {
        return f64::NAN;
    }

    let mean = finite.iter().sum::<f64>() / n;
    let mut m2 = 0.0f64;
    let mut m3 = 0.0f64;
    for v in &finite {
        let d = v - mean;
        m2 += d * d;
        m3 += d * d * d;
    }

    // Погрешность округления для почти константных столбцов
    if m2.abs() < 1e-14 {
        m2 = 0.0;
    }
    if m3.abs() < 1e-14 {
        m3 = 0.0;
    }
    if m2 == 0.0 {
        return 0.0;
    }

    (n * (n - 1.0).sqrt() / (n - 2.0)) * (m3 / m2.powf(1.5))
}

pub struct SkewCorrector {
    threshold: f64,
}

impl SkewCorrector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Асимметрия каждого столбца в порядке `columns`
    pub fn measure(&self, table: &Table, columns: &[String]) -> Result<Vec<(String, f64)>> {
        columns
            .iter()
            .map(|name| {
                let values = numeric_column(table, name)?;
                Ok((name.clone(), skewness(values)))
            })
            .collect()
    }

    /// Логарифмирует столбцы с асимметрией выше порога; возвращает преобразованные
    pub fn correct(&self, table: &mut Table, columns: &[String]) -> Result<Vec<(String, f64)>> {
        let skewed: Vec<(String, f64)> = self
            .measure(table, columns)?
            .into_iter()
            .filter(|(_, skew)| *skew > self.threshold)
            .collect();

        for (name, _) in &skewed {
            let transformed: Vec<f64> = numeric_column(table, name)?
                .iter()
                .map(|v| v.ln_1p())
                .collect();
            table.replace_column(name, Column::Numeric(transformed))?;
        }

        Ok(skewed)
    }
}

fn numeric_column<'a>(table: &'a Table, name: &str) -> Result<&'a [f64]> {
    let column = table.column(name).ok_or_else(|| {
        PipelineError::preprocessing(format!("numerical column '{}' not found", name))
    })?;
    column.as_numeric().ok_or_else(|| {
        PipelineError::preprocessing(format!("numerical column '{}' contains text", name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::from_columns(vec![
            (
                "lead_time".to_string(),
                Column::Numeric(vec![0.0, 1.0, 1.0, 2.0, 1.0, 0.0, 1.0, 100.0]),
            ),
            (
                "no_of_adults".to_string(),
                Column::Numeric(vec![1.0, 2.0, 3.0, 2.0, 1.0, 2.0, 3.0, 2.0]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_skewness_known_value() {
        // scipy.stats.skew([1, 2, 3, 10], bias=False)
        let skew = skewness(&[1.0, 2.0, 3.0, 10.0]);
        assert!((skew - 1.7636326).abs() < 1e-6, "skew = {}", skew);
    }

    #[test]
    fn test_skewness_degenerate_inputs() {
        assert!(skewness(&[1.0, 2.0]).is_nan());
        assert_eq!(skewness(&[3.0, 3.0, 3.0, 3.0]), 0.0);
        assert!(skewness(&[1.0, 2.0, 3.0, f64::NAN]).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric_column_unchanged() {
        let mut table = table();
        let before = table.column("no_of_adults").cloned();

        let corrector = SkewCorrector::new(1.0);
        let skewed = corrector
            .correct(&mut table, &["lead_time".to_string(), "no_of_adults".to_string()])
            .unwrap();

        assert_eq!(skewed.len(), 1);
        assert_eq!(skewed[0].0, "lead_time");
        assert_eq!(table.column("no_of_adults").cloned(), before);
    }

    #[test]
    fn test_skewed_column_is_log1p() {
        let mut table = table();
        let original = table.column("lead_time").unwrap().as_numeric().unwrap().to_vec();

        SkewCorrector::new(1.0)
            .correct(&mut table, &["lead_time".to_string()])
            .unwrap();

        let corrected = table.column("lead_time").unwrap().as_numeric().unwrap();
        for (x, y) in original.iter().zip(corrected) {
            assert!((x.ln_1p() - y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut table = table();
        let skew = skewness(table.column("lead_time").unwrap().as_numeric().unwrap());

        let skewed = SkewCorrector::new(skew)
            .correct(&mut table, &["lead_time".to_string()])
            .unwrap();

        assert!(skewed.is_empty());
    }

    #[test]
    fn test_text_column_rejected() {
        let mut table = Table::from_columns(vec![(
            "market".to_string(),
            Column::Text(vec!["Online".into(); 3]),
        )])
        .unwrap();

        let result = SkewCorrector::new(0.5).correct(&mut table, &["market".to_string()]);
        assert!(result.is_err());
    }
}
