use std::time::Instant;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

/// A raw email record as it arrives from the record source.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub id: u64,
    pub subject: String,
    /// Absent body is a valid state, not an error.
    pub body: Option<String>,
}

/// A record after cleaning and domain filtering.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NormalizedRecord {
    pub record: Record,
    /// Lower-cased body with every non-letter character replaced by a space.
    /// Empty string when the body is absent.
    pub processed_text: String,
    pub is_domain_relevant: bool,
}

/// A normalized record with its embedding attached.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EmbeddedRecord {
    pub normalized: NormalizedRecord,
    pub embedding: Vec<f32>,
}

impl EmbeddedRecord {
    pub fn id(&self) -> u64 {
        self.normalized.record.id
    }

    pub fn subject(&self) -> &str {
        &self.normalized.record.subject
    }

    pub fn body(&self) -> Option<&str> {
        self.normalized.record.body.as_deref()
    }
}

const CSV_HEADERS: [&str; 3] = ["id", "subject", "body"];

/// Load records from a CSV file with an `id,subject,body` header row.
///
/// An empty body cell becomes `None`.
pub fn load_csv(path: &str) -> anyhow::Result<Vec<Record>> {
    let now = Instant::now();
    let mut csv_reader = csv::Reader::from_path(path)?;
    let iter = csv_reader.records();

    let mut records = vec![];
    for record in iter {
        let record = record?;
        let id = record
            .get(0)
            .ok_or(anyhow!("couldnt get record id"))?
            .parse::<u64>()?;
        let subject = record
            .get(1)
            .ok_or(anyhow!("couldnt get record subject"))?
            .to_string();
        let body = record
            .get(2)
            .ok_or(anyhow!("couldnt get record body"))?
            .to_string();

        records.push(Record {
            id,
            subject,
            body: if body.is_empty() { None } else { Some(body) },
        });
    }

    log::debug!(
        "took {}ms to read csv",
        now.elapsed().as_micros() as f64 / 1000.0
    );

    Ok(records)
}

/// Write records back out in the same CSV shape. Used by tests and
/// by collaborators that want to materialize a filtered subset.
pub fn save_csv(path: &str, records: &[Record]) -> anyhow::Result<()> {
    let mut csv_wrt = csv::Writer::from_path(path)?;
    csv_wrt.write_record(CSV_HEADERS)?;
    for record in records {
        csv_wrt.write_record([
            &record.id.to_string(),
            &record.subject,
            &record.body.clone().unwrap_or_default(),
        ])?;
    }
    csv_wrt.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("records.csv");
        let path = path.to_str().unwrap();

        let records = vec![
            Record {
                id: 1,
                subject: "Consulta".to_string(),
                body: Some("¿Cómo invertir?".to_string()),
            },
            Record {
                id: 2,
                subject: "Sin cuerpo".to_string(),
                body: None,
            },
        ];

        save_csv(path, &records).unwrap();
        let loaded = load_csv(path).unwrap();

        assert_eq!(loaded, records);
    }

    #[test]
    fn test_empty_body_cell_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("records.csv");
        std::fs::write(&path, "id,subject,body\n7,hello,\n").unwrap();

        let loaded = load_csv(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].body, None);
    }

    #[test]
    fn test_bad_id_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("records.csv");
        std::fs::write(&path, "id,subject,body\nnot-a-number,hello,world\n").unwrap();

        assert!(load_csv(path.to_str().unwrap()).is_err());
    }
}
