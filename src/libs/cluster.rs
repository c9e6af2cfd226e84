use std::collections::{BTreeMap, HashSet};

use crate::libs::align;
use crate::libs::hit::RepeatHit;
use crate::libs::seq::SeqMap;

//----------------------------
// Span primitives
//----------------------------

/// Inclusive interval overlap.
pub fn overlaps(a: (i32, i32), b: (i32, i32)) -> bool {
    a.0 <= b.1 && b.0 <= a.1
}

/// Signed gap between two spans: `b.start - a.end` when `b` lies right of
/// `a`, else `a.start - b.end`. Positive for disjoint spans, zero or
/// negative when they touch or overlap.
pub fn gap_dist(a: (i32, i32), b: (i32, i32)) -> i32 {
    if b.0 > a.1 {
        b.0 - a.1
    } else {
        a.0 - b.1
    }
}

fn by_acc(hits: Vec<RepeatHit>) -> BTreeMap<String, Vec<RepeatHit>> {
    let mut map: BTreeMap<String, Vec<RepeatHit>> = BTreeMap::new();
    for hit in hits {
        map.entry(hit.acc.clone()).or_default().push(hit);
    }
    map
}

//----------------------------
// Overlap resolver
//----------------------------

/// Per accession, keep a maximal set of mutually non-overlapping hits,
/// best-scoring first.
///
/// Hits sharing a start or end coordinate with an earlier kept hit are
/// redundant and dropped before the greedy scan; a dropped hit registers
/// none of its coordinates.
pub fn remove_overlap(hits: Vec<RepeatHit>) -> Vec<RepeatHit> {
    let mut kept_all = Vec::new();

    for (_, mut group) in by_acc(hits) {
        group.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap()
                .then(b.alignment.cmp(&a.alignment))
                .then(a.row.cmp(&b.row))
        });

        let mut seen_start: HashSet<i32> = HashSet::new();
        let mut seen_end: HashSet<i32> = HashSet::new();
        let mut seen_acc_start: HashSet<i32> = HashSet::new();
        let mut seen_acc_end: HashSet<i32> = HashSet::new();

        let mut kept_spans: Vec<(i32, i32)> = Vec::new();

        for hit in group {
            if seen_start.contains(&hit.start)
                || seen_end.contains(&hit.end)
                || seen_acc_start.contains(&hit.acc_start)
                || seen_acc_end.contains(&hit.acc_end)
            {
                continue;
            }
            seen_start.insert(hit.start);
            seen_end.insert(hit.end);
            seen_acc_start.insert(hit.acc_start);
            seen_acc_end.insert(hit.acc_end);

            if kept_spans.iter().any(|&span| overlaps(span, hit.span())) {
                continue;
            }

            kept_spans.push(hit.span());
            kept_all.push(hit);
        }
    }

    kept_all
}

//----------------------------
// Spatial clusterer
//----------------------------

/// A group of hits on one accession. One member is an isolated repeat
/// (SRU); two or more form an array.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub id: u32,
    pub acc: String,
    pub members: Vec<RepeatHit>,
}

impl Cluster {
    /// Bounding span of the members, 1-based inclusive.
    pub fn bound(&self) -> (i32, i32) {
        let start = self.members.iter().map(|m| m.start).min().unwrap();
        let end = self.members.iter().map(|m| m.end).max().unwrap();
        (start, end)
    }
}

/// Group complete hits into positional clusters.
///
/// Per accession, hits sorted by start join the active cluster when the
/// minimum gap to any of its spans is within `max_dist`, otherwise a new
/// cluster opens. Ids come from one counter and advance at every open, so
/// clusters never merge or share ids across accessions.
pub fn cluster_adjacent(complete: Vec<RepeatHit>, max_dist: i32) -> Vec<Cluster> {
    let mut clusters: Vec<Cluster> = Vec::new();
    let mut next_id = 0u32;

    for (acc, mut group) in by_acc(complete) {
        group.sort_by(|a, b| a.start.cmp(&b.start).then(a.row.cmp(&b.row)));

        let mut spans: Vec<(i32, i32)> = Vec::new();
        for hit in group {
            let joins = !spans.is_empty()
                && spans
                    .iter()
                    .map(|&span| gap_dist(span, hit.span()))
                    .min()
                    .unwrap()
                    <= max_dist;

            if joins {
                spans.push(hit.span());
                clusters.last_mut().unwrap().members.push(hit);
            } else {
                spans = vec![hit.span()];
                clusters.push(Cluster {
                    id: next_id,
                    acc: acc.clone(),
                    members: vec![hit],
                });
                next_id += 1;
            }
        }
    }

    clusters
}

//----------------------------
// Partial-match reattacher
//----------------------------

/// Adopt partial hits into nearby clusters.
///
/// A partial qualifies when its gap to the cluster's bounding span is
/// strictly inside `(0, max_dist)` - partials overlapping or touching the
/// bound stay out, since non-overlap with complete members is not
/// guaranteed for them - and its sequence reaches `min_identity` against at
/// least one complete member. A partial sitting between two clusters may be
/// adopted by both.
pub fn append_partials(
    clusters: &mut [Cluster],
    partials: &[RepeatHit],
    max_dist: i32,
    min_identity: f64,
    genome: &SeqMap,
) -> anyhow::Result<()> {
    for cluster in clusters.iter_mut() {
        let bound = cluster.bound();

        let member_seqs: Vec<String> = cluster
            .members
            .iter()
            .map(|m| genome.subseq(&cluster.acc, m.start, m.end))
            .collect::<Result<_, _>>()?;

        let mut adopted = Vec::new();
        for part in partials.iter().filter(|p| p.acc == cluster.acc) {
            let dist = gap_dist(bound, part.span());
            if dist <= 0 || dist >= max_dist {
                continue;
            }

            let part_seq = genome.subseq(&part.acc, part.start, part.end)?;
            let related = member_seqs
                .iter()
                .any(|ms| align::identity_pct(part_seq.as_bytes(), ms.as_bytes()) >= min_identity);

            if related {
                adopted.push(part.clone());
            }
        }

        cluster.members.extend(adopted);
    }

    Ok(())
}
