use crate::error::CoreError;
use crate::types::KeywordSet;

/// Builds a keyword set from CSV text. Every non-blank cell in every row is
/// a keyword; rows may have different widths and there is no header row.
pub fn parse_keywords(raw: &[u8]) -> Result<KeywordSet, CoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(raw);

    let mut keywords = KeywordSet::new();
    for record in reader.records() {
        let record = record?;
        for cell in record.iter() {
            keywords.insert(cell);
        }
    }
    Ok(keywords)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_cell_is_a_keyword() {
        let raw = b"Rust, Kafka ,dbt\nSnowflake\n\n  AIRFLOW  ,,\n";
        let keywords = parse_keywords(raw).unwrap();

        assert_eq!(keywords.len(), 5);
        for expected in ["rust", "kafka", "dbt", "snowflake", "airflow"] {
            assert!(keywords.contains(expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_duplicates_collapse() {
        let keywords = parse_keywords(b"spark,Spark,SPARK\nspark\n").unwrap();
        assert_eq!(keywords.len(), 1);
    }

    #[test]
    fn test_quoted_cells_keep_commas() {
        let keywords = parse_keywords(b"\"data, lake\",delta\n").unwrap();
        assert!(keywords.contains("data, lake"));
        assert!(keywords.contains("delta"));
    }

    #[test]
    fn test_empty_input_gives_empty_set() {
        assert!(parse_keywords(b"").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let result = parse_keywords(&[0xff, 0xfe, b',', b'a']);
        assert!(matches!(result, Err(CoreError::Csv(_))));
    }
}
