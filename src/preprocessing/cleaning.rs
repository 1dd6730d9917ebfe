use crate::error::{PipelineError, Result};
use crate::types::Table;

/// Удаляет столбец-идентификатор и дубликаты строк; возвращает число удалённых строк
pub fn drop_id_and_duplicates(table: &mut Table, id_column: &str) -> Result<usize> {
    table.drop_column(id_column).map_err(|_| {
        PipelineError::preprocessing(format!("identifier column '{}' not found", id_column))
    })?;
    Ok(table.drop_duplicates())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Booking_ID,no_of_adults,market_segment_type
INN00001,2,Online
INN00002,2,Online
INN00003,1,Offline
";

    #[test]
    fn test_id_dropped_before_deduplication() {
        let mut table = Table::from_csv(CSV.as_bytes()).unwrap();

        let removed = drop_id_and_duplicates(&mut table, "Booking_ID").unwrap();

        assert_eq!(removed, 1);
        assert_eq!(table.n_rows(), 2);
        assert!(!table.has_column("Booking_ID"));
    }

    #[test]
    fn test_missing_id_column() {
        let mut table = Table::from_csv(CSV.as_bytes()).unwrap();
        let err = drop_id_and_duplicates(&mut table, "Reservation_ID").unwrap_err();
        assert!(matches!(err, PipelineError::Preprocessing { .. }));
    }
}
