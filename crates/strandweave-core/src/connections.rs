//! Connection discovery between strands.
//!
//! Derives implicit and explicit relationships from a slice of [`Strand`]s
//! with no persistent state: the output is a pure function of the input.
//!
//! # Algorithm
//!
//! 1. Bucket strands by normalized tag, topic/subject, loom and weave, and
//!    resolve explicit relationship targets and content backlinks. Every
//!    bucket and hit contributes candidate pairs `(i, j)` with `i < j`.
//! 2. Evaluate candidate pairs in input order (the same order a nested
//!    `for i { for j > i }` scan would visit them), emitting at most one
//!    connection per `(pair, type)`. The first direction found wins.
//! 3. Stable-sort by strength, descending.
//!
//! Pairs that share nothing are never visited, so cost scales with bucket
//! sizes rather than `n²`. Backlink detection still scans each strand's
//! content for every other path.
//!
//! # Strengths
//!
//! | Type | Strength |
//! |------|----------|
//! | `sharedTags`, `sharedTopics` | `min(1, shared / 3)` |
//! | `sameLoom` | 0.6 |
//! | `sameWeave` | 0.3 |
//! | `references` | 0.9 |
//! | `prerequisites` | 1.0 |
//! | `seeAlso` | 0.7 |
//! | `backlink` | 0.8 |

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::models::{normalize_term, Strand};

pub const SAME_LOOM_STRENGTH: f64 = 0.6;
pub const SAME_WEAVE_STRENGTH: f64 = 0.3;
pub const REFERENCES_STRENGTH: f64 = 0.9;
pub const PREREQUISITES_STRENGTH: f64 = 1.0;
pub const SEE_ALSO_STRENGTH: f64 = 0.7;
pub const BACKLINK_STRENGTH: f64 = 0.8;

/// Number of shared terms at which an overlap connection saturates at 1.0.
const OVERLAP_SATURATION: f64 = 3.0;

/// The kind of relationship a [`DiscoveredConnection`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionType {
    SharedTags,
    SharedTopics,
    SameLoom,
    SameWeave,
    References,
    Prerequisites,
    SeeAlso,
    Backlink,
}

impl ConnectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionType::SharedTags => "sharedTags",
            ConnectionType::SharedTopics => "sharedTopics",
            ConnectionType::SameLoom => "sameLoom",
            ConnectionType::SameWeave => "sameWeave",
            ConnectionType::References => "references",
            ConnectionType::Prerequisites => "prerequisites",
            ConnectionType::SeeAlso => "seeAlso",
            ConnectionType::Backlink => "backlink",
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A relationship between two strands found by [`discover_connections`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredConnection {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: ConnectionType,
    /// Relationship strength in `[0.0, 1.0]`.
    pub strength: f64,
    /// Human-readable explanation.
    pub reason: String,
    /// Normalized shared terms, for overlap connections only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_items: Option<Vec<String>>,
}

/// The shape consumed by the collections subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionConnection {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: ConnectionType,
    /// Always `true`: the connection was inferred, not authored.
    pub discovered: bool,
    pub strength: f64,
    pub label: String,
}

/// Strength of an overlap connection with `shared` terms in common.
pub fn overlap_strength(shared: usize) -> f64 {
    (shared as f64 / OVERLAP_SATURATION).min(1.0)
}

/// Per-strand normalized term lists, deduplicated in first-seen order.
struct Prepared<'a> {
    strand: &'a Strand,
    tags: Vec<String>,
    topics: Vec<String>,
}

impl<'a> Prepared<'a> {
    fn new(strand: &'a Strand) -> Self {
        Self {
            strand,
            tags: normalized_unique(strand.tags.iter()),
            topics: normalized_unique(strand.topics.iter().chain(strand.subjects.iter())),
        }
    }
}

fn normalized_unique<'s>(terms: impl Iterator<Item = &'s String>) -> Vec<String> {
    let mut seen = HashSet::new();
    terms
        .filter_map(|t| normalize_term(t))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Terms of `a` that also appear in `b`, in `a`'s order.
fn intersect(a: &[String], b: &[String]) -> Vec<String> {
    let b_set: HashSet<&str> = b.iter().map(String::as_str).collect();
    a.iter()
        .filter(|t| b_set.contains(t.as_str()))
        .cloned()
        .collect()
}

/// Keep the first strand for each path. Blank paths are dropped.
fn unique_strands(strands: &[Strand]) -> Vec<&Strand> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(strands.len());
    for s in strands {
        if s.path.trim().is_empty() {
            tracing::warn!("skipping strand with empty path");
            continue;
        }
        if !seen.insert(s.path.as_str()) {
            tracing::warn!(path = %s.path, "duplicate strand path; keeping first occurrence");
            continue;
        }
        out.push(s);
    }
    out
}

fn add_bucket_pairs(bucket: &[usize], pairs: &mut BTreeSet<(usize, usize)>) {
    for (n, &i) in bucket.iter().enumerate() {
        for &j in &bucket[n + 1..] {
            pairs.insert((i.min(j), i.max(j)));
        }
    }
}

/// Every pair that could produce at least one connection.
fn candidate_pairs(prepared: &[Prepared<'_>]) -> BTreeSet<(usize, usize)> {
    let mut pairs = BTreeSet::new();

    let mut tag_buckets: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut topic_buckets: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut loom_buckets: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut weave_buckets: HashMap<&str, Vec<usize>> = HashMap::new();

    for (i, p) in prepared.iter().enumerate() {
        for t in &p.tags {
            tag_buckets.entry(t.as_str()).or_default().push(i);
        }
        for t in &p.topics {
            topic_buckets.entry(t.as_str()).or_default().push(i);
        }
        if let Some(loom) = p.strand.loom() {
            loom_buckets.entry(loom).or_default().push(i);
        }
        if let Some(weave) = p.strand.weave() {
            weave_buckets.entry(weave).or_default().push(i);
        }
    }

    for bucket in tag_buckets
        .values()
        .chain(topic_buckets.values())
        .chain(loom_buckets.values())
        .chain(weave_buckets.values())
    {
        add_bucket_pairs(bucket, &mut pairs);
    }

    let by_path: HashMap<&str, usize> = prepared
        .iter()
        .enumerate()
        .map(|(i, p)| (p.strand.path.as_str(), i))
        .collect();

    for (i, p) in prepared.iter().enumerate() {
        let rel = &p.strand.relationships;
        for target in rel
            .references
            .iter()
            .chain(rel.prerequisites.iter())
            .chain(rel.see_also.iter())
        {
            if let Some(&j) = by_path.get(target.as_str()) {
                if i != j {
                    pairs.insert((i.min(j), i.max(j)));
                }
            }
        }

        if p.strand.content.is_empty() {
            continue;
        }
        for (j, other) in prepared.iter().enumerate() {
            if i != j && p.strand.content.contains(other.strand.path.as_str()) {
                pairs.insert((i.min(j), i.max(j)));
            }
        }
    }

    pairs
}

/// Collects connections for one pair, keeping the first of each type.
struct PairEmitter<'o> {
    emitted: HashSet<ConnectionType>,
    out: &'o mut Vec<DiscoveredConnection>,
}

impl PairEmitter<'_> {
    fn emit(
        &mut self,
        source: &Strand,
        target: &Strand,
        kind: ConnectionType,
        strength: f64,
        reason: String,
        shared_items: Option<Vec<String>>,
    ) {
        if !self.emitted.insert(kind) {
            return;
        }
        self.out.push(DiscoveredConnection {
            source: source.path.clone(),
            target: target.path.clone(),
            kind,
            strength,
            reason,
            shared_items,
        });
    }
}

fn explicit_links(from: &Strand, to: &Strand, emitter: &mut PairEmitter<'_>) {
    let rel = &from.relationships;
    if rel.references.iter().any(|p| *p == to.path) {
        emitter.emit(
            from,
            to,
            ConnectionType::References,
            REFERENCES_STRENGTH,
            format!("References {}", to.path),
            None,
        );
    }
    if rel.prerequisites.iter().any(|p| *p == to.path) {
        emitter.emit(
            from,
            to,
            ConnectionType::Prerequisites,
            PREREQUISITES_STRENGTH,
            format!("Requires {}", to.path),
            None,
        );
    }
    if rel.see_also.iter().any(|p| *p == to.path) {
        emitter.emit(
            from,
            to,
            ConnectionType::SeeAlso,
            SEE_ALSO_STRENGTH,
            format!("See also {}", to.path),
            None,
        );
    }
}

fn backlink(from: &Strand, to: &Strand, emitter: &mut PairEmitter<'_>) {
    if !from.content.is_empty() && from.content.contains(to.path.as_str()) {
        emitter.emit(
            from,
            to,
            ConnectionType::Backlink,
            BACKLINK_STRENGTH,
            format!("Mentions {} in content", to.path),
            None,
        );
    }
}

fn evaluate_pair(a: &Prepared<'_>, b: &Prepared<'_>, out: &mut Vec<DiscoveredConnection>) {
    let mut emitter = PairEmitter {
        emitted: HashSet::new(),
        out,
    };
    let (sa, sb) = (a.strand, b.strand);

    let shared_tags = intersect(&a.tags, &b.tags);
    if !shared_tags.is_empty() {
        emitter.emit(
            sa,
            sb,
            ConnectionType::SharedTags,
            overlap_strength(shared_tags.len()),
            format!("Shared tags: {}", shared_tags.join(", ")),
            Some(shared_tags),
        );
    }

    let shared_topics = intersect(&a.topics, &b.topics);
    if !shared_topics.is_empty() {
        emitter.emit(
            sa,
            sb,
            ConnectionType::SharedTopics,
            overlap_strength(shared_topics.len()),
            format!("Shared topics: {}", shared_topics.join(", ")),
            Some(shared_topics),
        );
    }

    let same_loom = match (sa.loom(), sb.loom()) {
        (Some(la), Some(lb)) if la == lb => Some(la),
        _ => None,
    };
    if let Some(loom) = same_loom {
        emitter.emit(
            sa,
            sb,
            ConnectionType::SameLoom,
            SAME_LOOM_STRENGTH,
            format!("Same loom: {}", loom),
            None,
        );
    } else if let (Some(wa), Some(wb)) = (sa.weave(), sb.weave()) {
        if wa == wb {
            emitter.emit(
                sa,
                sb,
                ConnectionType::SameWeave,
                SAME_WEAVE_STRENGTH,
                format!("Same weave: {}", wa),
                None,
            );
        }
    }

    explicit_links(sa, sb, &mut emitter);
    explicit_links(sb, sa, &mut emitter);

    backlink(sa, sb, &mut emitter);
    backlink(sb, sa, &mut emitter);
}

/// Discover relationships between strands, strongest first.
///
/// At most one connection is returned per unordered pair and type. Ties
/// keep discovery order. Empty or single-strand input yields an empty list.
pub fn discover_connections(strands: &[Strand]) -> Vec<DiscoveredConnection> {
    let unique = unique_strands(strands);
    if unique.len() < 2 {
        return Vec::new();
    }

    let prepared: Vec<Prepared<'_>> = unique.into_iter().map(Prepared::new).collect();
    let pairs = candidate_pairs(&prepared);

    let mut connections = Vec::new();
    for (i, j) in &pairs {
        evaluate_pair(&prepared[*i], &prepared[*j], &mut connections);
    }

    connections.sort_by(|a, b| {
        b.strength
            .partial_cmp(&a.strength)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    tracing::debug!(
        strands = prepared.len(),
        candidate_pairs = pairs.len(),
        connections = connections.len(),
        "connection discovery complete"
    );

    connections
}

fn shared_terms<F>(strands: &[Strand], terms_of: F) -> IndexMap<String, Vec<String>>
where
    F: Fn(&Strand) -> Vec<String>,
{
    let mut map: IndexMap<String, Vec<String>> = IndexMap::new();
    for strand in unique_strands(strands) {
        for term in terms_of(strand) {
            map.entry(term).or_default().push(strand.path.clone());
        }
    }
    map.retain(|_, paths| paths.len() >= 2);
    map
}

/// Tags held by two or more strands, mapped to the paths that hold them.
///
/// Keys are lowercase; a strand counts once per tag however it is cased.
pub fn analyze_shared_tags(strands: &[Strand]) -> IndexMap<String, Vec<String>> {
    shared_terms(strands, |s| normalized_unique(s.tags.iter()))
}

/// Like [`analyze_shared_tags`], over the union of topics and subjects.
pub fn analyze_shared_topics(strands: &[Strand]) -> IndexMap<String, Vec<String>> {
    shared_terms(strands, |s| {
        normalized_unique(s.topics.iter().chain(s.subjects.iter()))
    })
}

/// Flatten discovered connections into the collections shape.
pub fn to_collection_connections(discovered: &[DiscoveredConnection]) -> Vec<CollectionConnection> {
    discovered
        .iter()
        .map(|c| CollectionConnection {
            source: c.source.clone(),
            target: c.target.clone(),
            kind: c.kind,
            discovered: true,
            strength: c.strength,
            label: c.reason.clone(),
        })
        .collect()
}

/// Connections with `path` on either end, preserving order.
pub fn connections_for<'c>(
    path: &str,
    connections: &'c [DiscoveredConnection],
) -> Vec<&'c DiscoveredConnection> {
    connections
        .iter()
        .filter(|c| c.source == path || c.target == path)
        .collect()
}
