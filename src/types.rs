/// Табличные данные пайплайна

use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{PipelineError, Result};

/// Столбец таблицы: числовой (пустые ячейки → NaN) или текстовый
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(values) => values.len(),
            Column::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Numeric(_))
    }

    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            Column::Numeric(values) => Some(values),
            Column::Text(_) => None,
        }
    }

    /// Значение ячейки в виде строки CSV
    pub fn cell(&self, row: usize) -> String {
        match self {
            Column::Numeric(values) => {
                let value = values[row];
                if value.is_nan() {
                    String::new()
                } else {
                    value.to_string()
                }
            }
            Column::Text(values) => values[row].clone(),
        }
    }

    pub fn select(&self, rows: &[usize]) -> Column {
        match self {
            Column::Numeric(values) => Column::Numeric(rows.iter().map(|&i| values[i]).collect()),
            Column::Text(values) => Column::Text(rows.iter().map(|&i| values[i].clone()).collect()),
        }
    }

    fn key(&self, row: usize) -> CellKey {
        match self {
            Column::Numeric(values) => CellKey::Number(canonical_bits(values[row])),
            Column::Text(values) => CellKey::Text(values[row].clone()),
        }
    }

    /// Вывод типа: числовой, если каждая непустая ячейка парсится как f64
    fn infer(cells: Vec<String>) -> Column {
        let numeric = cells
            .iter()
            .all(|cell| cell.trim().is_empty() || cell.trim().parse::<f64>().is_ok());

        if numeric {
            Column::Numeric(
                cells
                    .iter()
                    .map(|cell| cell.trim().parse::<f64>().unwrap_or(f64::NAN))
                    .collect(),
            )
        } else {
            Column::Text(cells)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CellKey {
    Number(u64),
    Text(String),
}

// NaN == NaN и 0.0 == -0.0 при поиске дубликатов
fn canonical_bits(value: f64) -> u64 {
    if value.is_nan() {
        f64::NAN.to_bits()
    } else if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}

/// Таблица с именованными столбцами одинаковой длины
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns(columns: Vec<(String, Column)>) -> Result<Self> {
        let mut table = Self::new();
        for (name, column) in columns {
            table.push_column(name, column)?;
        }
        Ok(table)
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index_of(name).map(|i| &self.columns[i])
    }

    pub fn push_column(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(PipelineError::preprocessing(format!(
                "duplicate column '{}'",
                name
            )));
        }
        if !self.columns.is_empty() && column.len() != self.n_rows() {
            return Err(PipelineError::preprocessing(format!(
                "column '{}' has {} rows, table has {}",
                name,
                column.len(),
                self.n_rows()
            )));
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    /// Заменяет существующий столбец той же длины
    pub fn replace_column(&mut self, name: &str, column: Column) -> Result<()> {
        let idx = self.index_of(name).ok_or_else(|| missing_column(name))?;
        if column.len() != self.n_rows() {
            return Err(PipelineError::preprocessing(format!(
                "replacement for '{}' has {} rows, table has {}",
                name,
                column.len(),
                self.n_rows()
            )));
        }
        self.columns[idx] = column;
        Ok(())
    }

    pub fn drop_column(&mut self, name: &str) -> Result<Column> {
        let idx = self.index_of(name).ok_or_else(|| missing_column(name))?;
        self.names.remove(idx);
        Ok(self.columns.remove(idx))
    }

    pub fn select_rows(&self, rows: &[usize]) -> Table {
        Table {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.select(rows)).collect(),
        }
    }

    /// Новая таблица из указанных столбцов в заданном порядке
    pub fn select_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Table> {
        let mut table = Table::new();
        for name in names {
            let name = name.as_ref();
            let column = self.column(name).ok_or_else(|| missing_column(name))?;
            table.push_column(name, column.clone())?;
        }
        Ok(table)
    }

    /// Удаляет полностью совпадающие строки, оставляя первое вхождение
    pub fn drop_duplicates(&mut self) -> usize {
        let n_rows = self.n_rows();
        let mut seen = HashSet::with_capacity(n_rows);
        let keep: Vec<usize> = (0..n_rows)
            .filter(|&row| {
                let key: Vec<CellKey> = self.columns.iter().map(|c| c.key(row)).collect();
                seen.insert(key)
            })
            .collect();

        let removed = n_rows - keep.len();
        if removed > 0 {
            *self = self.select_rows(&keep);
        }
        removed
    }

    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path.as_ref())?;
        Self::from_csv_reader(reader)
    }

    pub fn from_csv<R: Read>(input: R) -> Result<Self> {
        let reader = csv::ReaderBuilder::new().has_headers(true).from_reader(input);
        Self::from_csv_reader(reader)
    }

    fn from_csv_reader<R: Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];

        for record in reader.records() {
            let record = record?;
            for (column, value) in cells.iter_mut().zip(record.iter()) {
                column.push(value.to_string());
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, values)| (name, Column::infer(values)))
            .collect();
        Self::from_columns(columns)
    }

    /// Запись с заголовком и без индекса
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let writer = csv::Writer::from_path(path.as_ref())?;
        self.write_records(writer)
    }

    pub fn to_csv<W: Write>(&self, output: W) -> Result<()> {
        self.write_records(csv::Writer::from_writer(output))
    }

    fn write_records<W: Write>(&self, mut writer: csv::Writer<W>) -> Result<()> {
        writer.write_record(&self.names)?;
        for row in 0..self.n_rows() {
            writer.write_record(self.columns.iter().map(|c| c.cell(row)))?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn missing_column(name: &str) -> PipelineError {
    PipelineError::preprocessing(format!("column '{}' not found", name))
}
