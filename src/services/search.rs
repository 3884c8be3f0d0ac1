use crate::domain::record::Record;

/// Returns the records whose razão social, CNPJ, consultant, plan or status
/// contains `query`, ignoring case. A blank query keeps every record.
pub fn filter_records<'a>(records: &'a [Record], query: &str) -> Vec<&'a Record> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return records.iter().collect();
    }

    records
        .iter()
        .filter(|record| record.matches_search(&needle))
        .collect()
}
