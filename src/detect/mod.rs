//! Duplicate and near-duplicate detection
//!
//! Documents sharing a slug always land in the same class. Documents with
//! different slugs are merged when their bodies score at or above the
//! configured threshold. Pair scores are computed first (optionally on the
//! rayon pool) and merged afterwards, so the partition does not depend on
//! the order in which scores arrive.

mod similarity;
mod union_find;

pub use similarity::{edit_ratio, token_overlap, Metric, Profile};
pub use union_find::UnionFind;

use rayon::prelude::*;

use crate::content::Document;
use crate::store::DocumentStore;

/// Default similarity threshold
pub const DEFAULT_THRESHOLD: f64 = 0.85;

/// Detector settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectConfig {
    pub threshold: f64,
    pub metric: Metric,
    /// Score pairs on the rayon thread pool
    pub parallel: bool,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            metric: Metric::default(),
            parallel: true,
        }
    }
}

/// Documents judged to be revisions of the same article.
/// Never empty; members are in ingestion order.
#[derive(Debug, Clone)]
pub struct EquivalenceClass<'a> {
    members: Vec<&'a Document>,
}

impl<'a> EquivalenceClass<'a> {
    pub fn members(&self) -> &[&'a Document] {
        &self.members
    }

    /// Earliest ingested member
    pub fn earliest(&self) -> &'a Document {
        self.members[0]
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, doc: &Document) -> bool {
        self.members.iter().any(|m| m.seq() == doc.seq())
    }
}

/// Groups documents into equivalence classes
#[derive(Debug, Clone, Default)]
pub struct Detector {
    config: DetectConfig,
}

impl Detector {
    pub fn new(config: DetectConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectConfig {
        &self.config
    }

    /// Similarity of two documents' bodies
    pub fn score(&self, a: &Document, b: &Document) -> f64 {
        self.config.metric.score(a.body(), b.body())
    }

    pub fn is_match(&self, a: &Document, b: &Document) -> bool {
        self.score(a, b) >= self.config.threshold
    }

    /// Partition the store into equivalence classes, ordered by each
    /// class's earliest member.
    ///
    /// Each slug collection starts out as one set. Pairs from different
    /// collections are then scored and merged when they clear the threshold.
    pub fn partition<'a>(&self, store: &'a DocumentStore) -> Vec<EquivalenceClass<'a>> {
        let documents = store.documents();
        let mut sets = UnionFind::new(documents.len());

        for collection in store.collections() {
            let first = collection.earliest().seq();
            for doc in &collection.documents()[1..] {
                sets.union(first, doc.seq());
            }
        }

        let metric = self.config.metric;
        let profiles: Vec<Profile<'a>> = if self.config.parallel {
            documents.par_iter().map(|d| Profile::new(d.body())).collect()
        } else {
            documents.iter().map(|d| Profile::new(d.body())).collect()
        };

        let pairs: Vec<(usize, usize)> = (0..documents.len())
            .flat_map(|i| (i + 1..documents.len()).map(move |j| (i, j)))
            .filter(|&(i, j)| documents[i].slug() != documents[j].slug())
            .collect();

        let is_match = |&(i, j): &(usize, usize)| {
            metric.compare(&profiles[i], &profiles[j]) >= self.config.threshold
        };
        let matches: Vec<(usize, usize)> = if self.config.parallel {
            pairs.par_iter().copied().filter(is_match).collect()
        } else {
            pairs.iter().copied().filter(is_match).collect()
        };

        tracing::debug!(
            "Scored {} pairs, {} above threshold {}",
            pairs.len(),
            matches.len(),
            self.config.threshold
        );

        for (i, j) in matches {
            if sets.union(i, j) {
                tracing::debug!(
                    "Near-duplicate: {} ~ {}",
                    documents[i].source(),
                    documents[j].source()
                );
            }
        }

        // Store indices are ingestion order, so groups come out sorted
        sets.groups()
            .into_iter()
            .map(|group| EquivalenceClass {
                members: group.into_iter().map(|i| &documents[i]).collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPARK: &str = "---\ntitle: Apache Spark serialize\n---\n\
        Spark has to serialize every closure it sends to the executors. The default \
        Java serializer handles anything that implements Serializable, but it is slow \
        and the output is large. Kryo is much faster and more compact. Register your \
        classes with registerKryoClasses and set spark.serializer on the SparkConf.\n";

    const SPARK_FIXED: &str = "---\ntitle: Apache Spark serialize\n---\n\
        Spark has to serialize every closure it sends to the executors.  The default \
        Java serializer handles anything that implements Serializable, but it is slow \
        and the output is large.\n\nKryo is much faster and more compact. Register your \
        classes with registerKryoClasses and set spark.serializer on the SparkConf.\n";

    const HARDWARE: &str = "---\ntitle: Building a workstation\n---\n\
        The parts arrived on Friday: a Ryzen processor, a B450 board, 32GB of memory \
        and an NVMe drive. Assembly took an afternoon and the first boot went fine.\n";

    const MAP: &str = "---\ntitle: ConcurrentHashMap vs synchronizedMap\n---\n\
        synchronizedMap locks the whole map on every call while ConcurrentHashMap \
        allows concurrent readers and fine-grained writes.\n";

    fn docs(inputs: &[(&str, &str)]) -> DocumentStore {
        let mut store = DocumentStore::new();
        for (source, text) in inputs {
            store.ingest(*source, *text).unwrap();
        }
        store
    }

    fn sources(classes: &[EquivalenceClass<'_>]) -> Vec<Vec<String>> {
        classes
            .iter()
            .map(|c| c.members().iter().map(|d| d.source().to_string()).collect())
            .collect()
    }

    #[test]
    fn test_near_duplicates_with_different_slugs_merge() {
        let documents = docs(&[
            ("2017-03-21-apache-spark-serialize.md", SPARK),
            ("2017-03-22-hardware.md", HARDWARE),
            ("2017-03-25-spark-serialization.md", SPARK_FIXED),
        ]);

        let classes = Detector::default().partition(&documents);
        assert_eq!(
            sources(&classes),
            vec![
                vec![
                    "2017-03-21-apache-spark-serialize.md",
                    "2017-03-25-spark-serialization.md"
                ],
                vec!["2017-03-22-hardware.md"],
            ]
        );
    }

    #[test]
    fn test_short_typo_fixed_revision_merges() {
        let store = docs(&[
            ("2017-03-21-kryo.md", "---\ntitle: Kryo\n---\nKryo is fastr than Java serializaton.\n"),
            ("2017-03-22-hardware.md", HARDWARE),
            ("2017-03-23-kryo-fixed.md", "---\ntitle: Kryo\n---\nKryo is faster than Java serialization.\n"),
        ]);

        let classes = Detector::default().partition(&store);
        assert_eq!(
            sources(&classes),
            vec![
                vec!["2017-03-21-kryo.md", "2017-03-23-kryo-fixed.md"],
                vec!["2017-03-22-hardware.md"],
            ]
        );
    }

    #[test]
    fn test_collections_seed_the_partition() {
        let store = docs(&[
            ("2017-01-01-notes.md", SPARK),
            ("map.md", MAP),
            ("2017-06-01-notes.md", HARDWARE),
            ("2018-01-01-notes.md", ""),
        ]);
        assert_eq!(store.collection("notes").unwrap().documents().len(), 3);

        let strict = Detector::new(DetectConfig {
            threshold: 1.0,
            ..Default::default()
        });
        assert_eq!(
            sources(&strict.partition(&store)),
            vec![
                vec!["2017-01-01-notes.md", "2017-06-01-notes.md", "2018-01-01-notes.md"],
                vec!["map.md"],
            ]
        );
    }

    #[test]
    fn test_same_slug_always_groups() {
        let documents = docs(&[
            ("2017-01-01-notes.md", SPARK),
            ("2018-01-01-notes.md", HARDWARE),
        ]);
        let classes = Detector::default().partition(&documents);
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].len(), 2);
    }

    #[test]
    fn test_unrelated_topics_split() {
        let documents = docs(&[("spark.md", SPARK), ("hardware.md", HARDWARE), ("map.md", MAP)]);
        let classes = Detector::default().partition(&documents);
        assert_eq!(classes.len(), 3);
    }

    #[test]
    fn test_empty_bodies_group_together() {
        let documents = docs(&[
            ("a.md", "---\ntitle: A\n---\n"),
            ("spark.md", SPARK),
            ("b.md", "---\ntitle: B\n---\n\n  \n"),
        ]);
        let classes = Detector::default().partition(&documents);
        assert_eq!(sources(&classes), vec![vec!["a.md", "b.md"], vec!["spark.md"]]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let documents = docs(&[
            ("one.md", SPARK),
            ("two.md", MAP),
            ("three.md", SPARK_FIXED),
            ("four.md", HARDWARE),
            ("five.md", MAP),
        ]);

        for metric in [Metric::Tokens, Metric::Edit] {
            let parallel = Detector::new(DetectConfig {
                metric,
                parallel: true,
                ..Default::default()
            });
            let sequential = Detector::new(DetectConfig {
                metric,
                parallel: false,
                ..Default::default()
            });
            assert_eq!(
                sources(&parallel.partition(&documents)),
                sources(&sequential.partition(&documents))
            );
        }
    }

    #[test]
    fn test_threshold_controls_merging() {
        let documents = docs(&[("a.md", SPARK), ("b.md", HARDWARE)]);
        let merge_all = Detector::new(DetectConfig {
            threshold: 0.0,
            ..Default::default()
        });
        assert_eq!(merge_all.partition(&documents).len(), 1);
    }

    #[test]
    fn test_score_is_reflexive_and_symmetric() {
        let store = docs(&[("a.md", SPARK), ("b.md", SPARK_FIXED)]);
        let documents = store.documents();
        let detector = Detector::default();
        assert_eq!(detector.score(&documents[0], &documents[0]), 1.0);
        assert_eq!(
            detector.score(&documents[0], &documents[1]),
            detector.score(&documents[1], &documents[0])
        );
        assert!(detector.is_match(&documents[0], &documents[1]));
    }

    #[test]
    fn test_empty_input() {
        assert!(Detector::default().partition(&DocumentStore::new()).is_empty());
    }
}
