use std::io::Write;

use itertools::Itertools;

use crate::libs::cluster::Cluster;
use crate::libs::hit::RepeatHit;
use crate::libs::seq::SeqMap;

//----------------------------
// Records
//----------------------------

/// An isolated repeat: a cluster with a single member.
#[derive(Debug)]
pub struct SruRecord {
    pub hit: RepeatHit,
    pub cluster: u32,
    pub sequence: String,
    pub left_flank: String,
    pub right_flank: String,
}

/// A CRISPR-like array: a cluster with two or more members, ordered by
/// position, with the spacer sequences between consecutive members.
#[derive(Debug)]
pub struct ArrayRecord {
    pub acc: String,
    pub start: i32,
    pub end: i32,
    pub cluster: u32,
    /// member sequences, in positional order
    pub repeats: Vec<String>,
    /// member repeat identifiers, in the same order
    pub types: Vec<String>,
    pub spacers: Vec<String>,
    pub left_flank: String,
    pub right_flank: String,
}

//----------------------------
// Classifier
//----------------------------

/// Split clusters into SRUs and arrays, extracting member sequences,
/// spacers, and flanking context.
pub fn classify(
    clusters: &[Cluster],
    genome: &SeqMap,
    flank: i32,
) -> anyhow::Result<(Vec<SruRecord>, Vec<ArrayRecord>)> {
    let mut srus = Vec::new();
    let mut arrays = Vec::new();

    for cluster in clusters {
        if cluster.members.len() == 1 {
            let hit = cluster.members[0].clone();
            let sequence = genome.subseq(&cluster.acc, hit.start, hit.end)?;
            let (left_flank, right_flank) = genome.flanks(&cluster.acc, hit.span(), flank)?;

            srus.push(SruRecord {
                hit,
                cluster: cluster.id,
                sequence,
                left_flank,
                right_flank,
            });
        } else {
            let mut members = cluster.members.clone();
            members.sort_by(|a, b| a.start.cmp(&b.start).then(a.row.cmp(&b.row)));

            let (start, end) = cluster.bound();

            let mut repeats = Vec::new();
            let mut types = Vec::new();
            for member in &members {
                repeats.push(genome.subseq(&cluster.acc, member.start, member.end)?);
                types.push(member.repeat.clone());
            }

            let mut spacers = Vec::new();
            for pair in members.windows(2) {
                spacers.push(genome.subseq(&cluster.acc, pair[0].end + 1, pair[1].start - 1)?);
            }

            let (left_flank, right_flank) = genome.flanks(&cluster.acc, (start, end), flank)?;

            arrays.push(ArrayRecord {
                acc: cluster.acc.clone(),
                start,
                end,
                cluster: cluster.id,
                repeats,
                types,
                spacers,
                left_flank,
                right_flank,
            });
        }
    }

    Ok((srus, arrays))
}

//----------------------------
// Writers
//----------------------------

pub const MATCHES_HEADER: &str = "Repeat\tAcc\tIdentity\tAlignment\tMismatches\tGaps\t\
    Repeat_start\tRepeat_end\tAcc_start\tAcc_end\tEvalue\tScore\tCoverage\tStart\tEnd";

pub const SRU_HEADER: &str = "Repeat\tAcc\tIdentity\tAlignment\tMismatches\tGaps\tCoverage\t\
    Start\tEnd\tEvalue\tScore\tCluster\tSequence\tLeft_flank\tRight_flank";

pub const ARRAY_HEADER: &str =
    "Acc\tStart\tEnd\tCluster\tRepeats\tTypes\tSpacers\tLeft_flank\tRight_flank";

/// Best hits after overlap resolution, sorted by accession and position.
pub fn write_matches(writer: &mut dyn Write, hits: &[RepeatHit]) -> anyhow::Result<()> {
    let mut hits: Vec<&RepeatHit> = hits.iter().collect();
    hits.sort_by(|a, b| a.acc.cmp(&b.acc).then(a.start.cmp(&b.start)));

    writer.write_fmt(format_args!("{}\n", MATCHES_HEADER))?;
    for hit in hits {
        writer.write_fmt(format_args!(
            "{}\t{}\t{:.1}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.1e}\t{:.1}\t{:.1}\t{}\t{}\n",
            hit.repeat,
            hit.acc,
            hit.identity,
            hit.alignment,
            hit.mismatches,
            hit.gaps,
            hit.repeat_start,
            hit.repeat_end,
            hit.acc_start,
            hit.acc_end,
            hit.evalue,
            hit.score,
            hit.coverage,
            hit.start,
            hit.end,
        ))?;
    }

    Ok(())
}

pub fn write_srus(writer: &mut dyn Write, srus: &[SruRecord]) -> anyhow::Result<()> {
    writer.write_fmt(format_args!("{}\n", SRU_HEADER))?;
    for sru in srus {
        let hit = &sru.hit;
        writer.write_fmt(format_args!(
            "{}\t{}\t{:.1}\t{}\t{}\t{}\t{:.1}\t{}\t{}\t{:.1e}\t{:.1}\t{}\t{}\t{}\t{}\n",
            hit.repeat,
            hit.acc,
            hit.identity,
            hit.alignment,
            hit.mismatches,
            hit.gaps,
            hit.coverage,
            hit.start,
            hit.end,
            hit.evalue,
            hit.score,
            sru.cluster,
            sru.sequence,
            sru.left_flank,
            sru.right_flank,
        ))?;
    }

    Ok(())
}

pub fn write_arrays(writer: &mut dyn Write, arrays: &[ArrayRecord]) -> anyhow::Result<()> {
    writer.write_fmt(format_args!("{}\n", ARRAY_HEADER))?;
    for array in arrays {
        writer.write_fmt(format_args!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
            array.acc,
            array.start,
            array.end,
            array.cluster,
            array.repeats.iter().join(","),
            array.types.iter().join(","),
            array.spacers.iter().join(","),
            array.left_flank,
            array.right_flank,
        ))?;
    }

    Ok(())
}

/// One FASTA record per spacer, named `{acc}_{cluster}:{index}`.
pub fn write_spacers(writer: &mut dyn Write, arrays: &[ArrayRecord]) -> anyhow::Result<()> {
    for array in arrays {
        for (i, spacer) in array.spacers.iter().enumerate() {
            writer.write_fmt(format_args!(
                ">{}_{}:{}\n{}\n",
                array.acc,
                array.cluster,
                i + 1,
                spacer
            ))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::cluster::cluster_adjacent;
    use std::collections::BTreeMap;

    fn hit(repeat: &str, acc: &str, start: i32, end: i32, row: usize) -> RepeatHit {
        RepeatHit {
            repeat: repeat.to_string(),
            acc: acc.to_string(),
            identity: 97.25,
            alignment: end - start + 1,
            acc_start: start,
            acc_end: end,
            evalue: 3.2e-11,
            score: 62.0,
            coverage: 100.0,
            start,
            end,
            row,
            ..Default::default()
        }
    }

    fn genome() -> SeqMap {
        let mut map = BTreeMap::new();
        //   1-10 left context, 11-20 repeat, 21-25 spacer, 26-35 repeat, 36-45 right context
        map.insert(
            "ctg".to_string(),
            "TTTTTTTTTTACGTACGTACCCGGGACGTACGTACAAAAAAAAAA".to_string(),
        );
        SeqMap::from_map(map)
    }

    #[test]
    fn singleton_becomes_sru() {
        let genome = genome();
        let clusters = cluster_adjacent(vec![hit("R1", "ctg", 11, 20, 0)], 3);
        let (srus, arrays) = classify(&clusters, &genome, 5).unwrap();

        assert_eq!(srus.len(), 1);
        assert!(arrays.is_empty());
        assert_eq!(srus[0].sequence, "ACGTACGTAC");
        assert_eq!(srus[0].left_flank, "TTTTT");
        assert_eq!(srus[0].right_flank, "CCGGG");
    }

    #[test]
    fn pair_becomes_array_with_one_spacer() {
        let genome = genome();
        let clusters = cluster_adjacent(
            vec![hit("R1", "ctg", 11, 20, 0), hit("R1", "ctg", 26, 35, 1)],
            10,
        );
        let (srus, arrays) = classify(&clusters, &genome, 5).unwrap();

        assert!(srus.is_empty());
        assert_eq!(arrays.len(), 1);

        let array = &arrays[0];
        assert_eq!((array.start, array.end), (11, 35));
        assert_eq!(array.repeats, vec!["ACGTACGTAC", "ACGTACGTAC"]);
        assert_eq!(array.types, vec!["R1", "R1"]);
        assert_eq!(array.spacers, vec!["CCGGG"]);
        assert_eq!(array.left_flank, "TTTTT");
        assert_eq!(array.right_flank, "AAAAA");
    }

    #[test]
    fn spacer_count_is_members_minus_one() {
        let mut map = BTreeMap::new();
        map.insert("ctg".to_string(), "A".repeat(200));
        let genome = SeqMap::from_map(map);

        let clusters = cluster_adjacent(
            vec![
                hit("R1", "ctg", 11, 20, 0),
                hit("R1", "ctg", 26, 35, 1),
                hit("R1", "ctg", 41, 50, 2),
                hit("R1", "ctg", 56, 65, 3),
            ],
            10,
        );
        let (_, arrays) = classify(&clusters, &genome, 5).unwrap();
        assert_eq!(arrays.len(), 1);
        assert_eq!(arrays[0].spacers.len(), 3);
    }

    #[test]
    fn flanks_clip_at_contig_edges() {
        let genome = genome();
        let clusters = cluster_adjacent(vec![hit("R1", "ctg", 11, 20, 0)], 3);
        let (srus, _) = classify(&clusters, &genome, 100).unwrap();

        assert_eq!(srus[0].left_flank, "TTTTTTTTTT");
        assert_eq!(srus[0].right_flank, "CCGGGACGTACGTACAAAAAAAAAA");
    }

    #[test]
    fn tables_round_for_presentation() {
        let genome = genome();
        let clusters = cluster_adjacent(vec![hit("R1", "ctg", 11, 20, 0)], 3);
        let (srus, _) = classify(&clusters, &genome, 5).unwrap();

        let mut buf: Vec<u8> = Vec::new();
        write_srus(&mut buf, &srus).unwrap();
        let out = String::from_utf8(buf).unwrap();

        assert!(out.starts_with(SRU_HEADER));
        assert!(out.contains("\t97.2\t"));
        assert!(out.contains("3.2e-11"));
    }

    #[test]
    fn spacer_fasta_names_carry_cluster_and_index() {
        let genome = genome();
        let clusters = cluster_adjacent(
            vec![hit("R1", "ctg", 11, 20, 0), hit("R1", "ctg", 26, 35, 1)],
            10,
        );
        let (_, arrays) = classify(&clusters, &genome, 5).unwrap();

        let mut buf: Vec<u8> = Vec::new();
        write_spacers(&mut buf, &arrays).unwrap();
        let out = String::from_utf8(buf).unwrap();

        assert_eq!(out, ">ctg_0:1\nCCGGG\n");
    }
}
