use std::collections::BTreeMap;
use std::io::BufRead;

use crate::libs::error::ScanError;

//----------------------------
// RepeatHit
//----------------------------

/// One hit of a repeat against the genome, from a 12-column tabular search
/// result (BLAST `-outfmt 6`): repeat id, accession, identity, alignment
/// length, mismatches, gaps, repeat start/end, accession start/end, e-value,
/// bit score.
///
/// `start`/`end` are the orientation-normalized accession coordinates, so
/// `start <= end` always holds even for minus-strand hits.
#[derive(Debug, Clone, Default)]
pub struct RepeatHit {
    pub repeat: String,
    pub acc: String,
    pub identity: f64,
    pub alignment: i32,
    pub mismatches: i32,
    pub gaps: i32,
    pub repeat_start: i32,
    pub repeat_end: i32,
    pub acc_start: i32,
    pub acc_end: i32,
    pub evalue: f64,
    pub score: f64,

    /// (alignment - gaps) / repeat length, as a percentage
    pub coverage: f64,
    /// 1-based inclusive span on the accession
    pub start: i32,
    pub end: i32,
    /// Input row number, the final sorting tie-break
    pub row: usize,
}

impl RepeatHit {
    /// Parse one search table row.
    ///
    /// ```
    /// # use sruscan::libs::hit::RepeatHit;
    /// let line = "CRISPR_II-B\tNC_000001\t95.24\t42\t2\t0\t1\t42\t180\t139\t3e-12\t62.1";
    /// let hit = RepeatHit::parse(line, 0).unwrap();
    /// # assert_eq!(hit.repeat, "CRISPR_II-B");
    /// # assert_eq!(hit.start, 139);
    /// # assert_eq!(hit.end, 180);
    /// ```
    pub fn parse(line: &str, row: usize) -> crate::libs::error::Result<Self> {
        let bad = |msg: &str| ScanError::BadRecord {
            line: row + 1,
            msg: msg.to_string(),
        };

        let fields: Vec<&str> = line.trim_end().split('\t').collect();
        if fields.len() != 12 {
            return Err(bad(&format!("expected 12 columns, got {}", fields.len())));
        }

        let int = |i: usize| -> crate::libs::error::Result<i32> {
            fields[i]
                .parse::<i32>()
                .map_err(|e| bad(&format!("column {}: {}", i + 1, e)))
        };
        let float = |i: usize| -> crate::libs::error::Result<f64> {
            fields[i]
                .parse::<f64>()
                .map_err(|e| bad(&format!("column {}: {}", i + 1, e)))
        };

        let acc_start = int(8)?;
        let acc_end = int(9)?;

        Ok(Self {
            repeat: fields[0].to_string(),
            acc: fields[1].to_string(),
            identity: float(2)?,
            alignment: int(3)?,
            mismatches: int(4)?,
            gaps: int(5)?,
            repeat_start: int(6)?,
            repeat_end: int(7)?,
            acc_start,
            acc_end,
            evalue: float(10)?,
            score: float(11)?,
            coverage: 0.0,
            start: acc_start.min(acc_end),
            end: acc_start.max(acc_end),
            row,
        })
    }

    /// The normalized `[start, end]` span on the accession.
    pub fn span(&self) -> (i32, i32) {
        (self.start, self.end)
    }
}

//----------------------------
// RepeatLengths
//----------------------------

/// Repeat id -> repeat length, taken from the repeat database FASTA.
#[derive(Debug, Default)]
pub struct RepeatLengths(BTreeMap<String, usize>);

impl RepeatLengths {
    pub fn from_fasta(infile: &str) -> anyhow::Result<Self> {
        let reader = crate::reader(infile);
        let mut fa_in = noodles_fasta::io::Reader::new(reader);

        let mut lengths = BTreeMap::new();
        for result in fa_in.records() {
            let record = result?;
            let name = String::from_utf8(record.name().into())?;
            lengths.insert(name, record.sequence().len());
        }

        Ok(Self(lengths))
    }

    pub fn get(&self, repeat: &str) -> Option<usize> {
        self.0.get(repeat).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

//----------------------------
// Loader & filter
//----------------------------

/// Load the search table and attach coverage from the repeat lengths.
///
/// Blank lines are skipped. A row with a repeat absent from `lengths` is
/// malformed input and fails the whole run.
pub fn read_hits<R: BufRead>(reader: R, lengths: &RepeatLengths) -> anyhow::Result<Vec<RepeatHit>> {
    let mut hits = Vec::new();

    for (row, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let mut hit = RepeatHit::parse(&line, row)?;
        let repeat_len = lengths
            .get(&hit.repeat)
            .ok_or_else(|| ScanError::UnknownRepeat(hit.repeat.clone()))?;
        hit.coverage = (hit.alignment - hit.gaps) as f64 / repeat_len as f64 * 100.0;

        hits.push(hit);
    }

    Ok(hits)
}

/// Drop hits below the identity floor or the partial-coverage floor. The
/// higher "complete" coverage bar is applied later, when clustering splits
/// complete from partial hits.
pub fn filter_hits(hits: Vec<RepeatHit>, min_identity: f64, min_coverage: f64) -> Vec<RepeatHit> {
    hits.into_iter()
        .filter(|hit| hit.identity >= min_identity && hit.coverage >= min_coverage)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn lengths() -> RepeatLengths {
        let mut map = BTreeMap::new();
        map.insert("R1".to_string(), 40);
        map.insert("R2".to_string(), 30);
        RepeatLengths(map)
    }

    #[test]
    fn parse_normalizes_span() {
        let line = "R1\tctg\t98.00\t40\t1\t0\t1\t40\t200\t161\t1e-15\t70.0";
        let hit = RepeatHit::parse(line, 3).unwrap();
        assert_eq!(hit.acc_start, 200);
        assert_eq!(hit.acc_end, 161);
        assert_eq!(hit.span(), (161, 200));
        assert_eq!(hit.row, 3);
    }

    #[test]
    fn parse_rejects_short_rows() {
        let err = RepeatHit::parse("R1\tctg\t98.00", 0).unwrap_err();
        assert!(err.to_string().contains("expected 12 columns"));
    }

    #[test]
    fn parse_rejects_bad_fields() {
        let line = "R1\tctg\tninety\t40\t1\t0\t1\t40\t161\t200\t1e-15\t70.0";
        let err = RepeatHit::parse(line, 4).unwrap_err();
        assert!(err.to_string().contains("line 5"));
    }

    #[test]
    fn read_hits_attaches_coverage() {
        let table = "R1\tctg\t98.00\t40\t1\t0\t1\t40\t101\t140\t1e-15\t70.0\n\
                     R2\tctg\t95.00\t24\t1\t3\t1\t24\t300\t323\t1e-05\t40.0\n";
        let hits = read_hits(table.as_bytes(), &lengths()).unwrap();
        assert_eq!(hits.len(), 2);
        assert_relative_eq!(hits[0].coverage, 100.0);
        assert_relative_eq!(hits[1].coverage, 70.0);
    }

    #[test]
    fn read_hits_rejects_unknown_repeat() {
        let table = "RX\tctg\t98.00\t40\t1\t0\t1\t40\t101\t140\t1e-15\t70.0\n";
        let err = read_hits(table.as_bytes(), &lengths()).unwrap_err();
        assert!(err.to_string().contains("RX"));
    }

    #[test]
    fn filter_drops_below_thresholds() {
        let table = "R1\tctg\t98.00\t40\t1\t0\t1\t40\t101\t140\t1e-15\t70.0\n\
                     R1\tctg\t80.00\t40\t8\t0\t1\t40\t201\t240\t1e-08\t50.0\n\
                     R1\tctg\t98.00\t12\t0\t0\t1\t12\t301\t312\t1e-03\t24.0\n";
        let hits = read_hits(table.as_bytes(), &lengths()).unwrap();
        let kept = filter_hits(hits, 90.0, 50.0);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].start, 101);
    }
}
