//! Tab-separated inputs. Blank lines and lines starting with `#` are skipped.
//!
//! Germlines: `gene  segment(V|J)  cdr3_anchor  sequence`
//!
//! Clones: `name  v_gene  j_gene  sequence`

use super::arena::{CloneArena, CloneStore};
use super::reconstruct::{Germline, GermlineTable, Segment};
use anyhow::{bail, Context};
use log::warn;
use std::collections::HashSet;
use std::io::BufRead;

fn data_fields(line: &str) -> Option<Vec<&str>> {
    let line = line.trim_end();
    if line.trim().is_empty() || line.starts_with('#') {
        None
    } else {
        Some(line.split('\t').map(|f| f.trim()).collect())
    }
}

pub fn read_germlines(infile: &str) -> anyhow::Result<GermlineTable> {
    let reader = intspan::reader(infile);
    let mut table = GermlineTable::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let fields = match data_fields(&line) {
            Some(fields) => fields,
            None => continue,
        };
        if fields.len() < 4 {
            bail!("{}:{}: expected 4 fields, found {}", infile, i + 1, fields.len());
        }

        let segment = fields[1]
            .parse::<Segment>()
            .with_context(|| format!("{}:{}", infile, i + 1))?;
        let cdr3_anchor = fields[2]
            .parse::<usize>()
            .with_context(|| format!("{}:{}: bad CDR3 anchor '{}'", infile, i + 1, fields[2]))?;
        table
            .insert(Germline {
                name: fields[0].to_string(),
                segment,
                cdr3_anchor,
                sequence: fields[3].as_bytes().to_vec(),
            })
            .with_context(|| format!("{}:{}", infile, i + 1))?;
    }

    Ok(table)
}

/// Read clones and annotate each against `table`, in file order.
pub fn read_clones(infile: &str, table: &GermlineTable) -> anyhow::Result<CloneArena> {
    let reader = intspan::reader(infile);
    let mut arena = CloneArena::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let fields = match data_fields(&line) {
            Some(fields) => fields,
            None => continue,
        };
        if fields.len() < 4 {
            bail!("{}:{}: expected 4 fields, found {}", infile, i + 1, fields.len());
        }

        let clone = table
            .annotate(fields[0], fields[3].as_bytes(), fields[1], fields[2])
            .with_context(|| format!("{}:{}", infile, i + 1))?;
        if !seen.insert(clone.name.clone()) {
            warn!("{}:{}: duplicate clone name {}", infile, i + 1, clone.name);
        }
        arena.push(clone);
    }

    Ok(arena)
}
