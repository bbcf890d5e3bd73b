//! Representative question/answer extraction per cluster.

use serde::{Deserialize, Serialize};

use crate::records::EmbeddedRecord;

/// One catalogue entry per non-empty cluster, derived once per run and
/// never mutated afterwards.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QaEntry {
    pub cluster: usize,
    /// Subject of the cluster's representative record.
    pub question: String,
    /// Body of the cluster's representative record.
    pub answer: String,
    /// Number of records assigned to this cluster.
    pub freq: usize,
}

/// Extract one entry per non-empty cluster, ascending cluster index.
///
/// The representative is the first record of each cluster in input
/// iteration order. Deliberately not similarity-ranked: a stable,
/// deterministic rule beats a marginally better pick that depends on
/// iteration order of some engine.
pub fn extract(questions: &[EmbeddedRecord], assignment: &[usize]) -> Vec<QaEntry> {
    debug_assert_eq!(questions.len(), assignment.len());

    let clusters = assignment.iter().max().map(|&c| c + 1).unwrap_or(0);
    let mut representative: Vec<Option<usize>> = vec![None; clusters];
    let mut freq = vec![0usize; clusters];

    for (idx, &cluster) in assignment.iter().enumerate() {
        freq[cluster] += 1;
        if representative[cluster].is_none() {
            representative[cluster] = Some(idx);
        }
    }

    (0..clusters)
        .filter_map(|cluster| {
            representative[cluster].map(|idx| {
                let record = &questions[idx];
                QaEntry {
                    cluster,
                    question: record.subject().to_string(),
                    answer: record.body().unwrap_or_default().to_string(),
                    freq: freq[cluster],
                }
            })
        })
        .collect()
}

/// Reorder entries for display: most frequent cluster first.
/// Presentation only, extraction order stays ascending by cluster.
pub fn sort_for_display(entries: &mut [QaEntry]) {
    entries.sort_by(|a, b| b.freq.cmp(&a.freq));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{NormalizedRecord, Record};

    fn embedded(id: u64, subject: &str, body: &str) -> EmbeddedRecord {
        EmbeddedRecord {
            normalized: NormalizedRecord {
                record: Record {
                    id,
                    subject: subject.to_string(),
                    body: Some(body.to_string()),
                },
                processed_text: body.to_lowercase(),
                is_domain_relevant: true,
            },
            embedding: vec![0.0; 4],
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(extract(&[], &[]).is_empty());
    }

    #[test]
    fn test_one_entry_per_cluster_first_seen_wins() {
        let questions = vec![
            embedded(1, "primero", "cuerpo uno"),
            embedded(2, "segundo", "cuerpo dos"),
            embedded(3, "tercero", "cuerpo tres"),
        ];
        let assignment = vec![1, 0, 1];

        let entries = extract(&questions, &assignment);

        assert_eq!(entries.len(), 2);
        // Ascending cluster index.
        assert_eq!(entries[0].cluster, 0);
        assert_eq!(entries[0].question, "segundo");
        assert_eq!(entries[0].freq, 1);
        // Cluster 1's representative is record 1, not record 3.
        assert_eq!(entries[1].cluster, 1);
        assert_eq!(entries[1].question, "primero");
        assert_eq!(entries[1].answer, "cuerpo uno");
        assert_eq!(entries[1].freq, 2);
    }

    #[test]
    fn test_empty_clusters_produce_no_entry() {
        let questions = vec![embedded(1, "a", "x"), embedded(2, "b", "y")];
        // Cluster 1 is empty.
        let assignment = vec![0, 2];

        let entries = extract(&questions, &assignment);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].cluster, 0);
        assert_eq!(entries[1].cluster, 2);
    }

    #[test]
    fn test_no_duplicate_clusters_and_frequencies_sum() {
        let questions: Vec<EmbeddedRecord> = (0..10)
            .map(|i| embedded(i, &format!("s{i}"), &format!("b{i}")))
            .collect();
        let assignment = vec![0, 1, 1, 2, 0, 2, 2, 0, 1, 0];

        let entries = extract(&questions, &assignment);

        let mut seen = std::collections::HashSet::new();
        for entry in &entries {
            assert!(seen.insert(entry.cluster));
        }
        assert_eq!(entries.iter().map(|e| e.freq).sum::<usize>(), 10);
    }

    #[test]
    fn test_sort_for_display_by_freq_desc() {
        let questions = vec![
            embedded(1, "a", "x"),
            embedded(2, "b", "y"),
            embedded(3, "c", "z"),
        ];
        let assignment = vec![0, 1, 1];

        let mut entries = extract(&questions, &assignment);
        sort_for_display(&mut entries);

        assert_eq!(entries[0].cluster, 1);
        assert_eq!(entries[0].freq, 2);
        assert_eq!(entries[1].cluster, 0);
    }
}
