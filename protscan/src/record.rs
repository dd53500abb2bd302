//! UniProtKB/Swiss-Prot flat-text records.

use context_error::*;
use serde::{Deserialize, Serialize};

use crate::ProtScanError;

/// A single protein record as read from the UniProtKB flat-text format
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SequenceRecord {
    /// The entry name, the first token on the `ID` line (e.g. `HBA_HUMAN`)
    pub entry_name: String,
    /// All accessions of all `AC` lines, primary accession first
    pub accessions: Vec<String>,
    /// All `DE` line values joined by a single space
    pub description: String,
    /// All `OS` line values joined by a single space
    pub organism: String,
    /// The NCBI taxonomy identifier from the `OX` line
    pub taxonomy_id: Option<u32>,
    /// The `DR` lines
    pub cross_references: Vec<CrossReference>,
    /// The amino acid sequence, without any whitespace
    pub sequence: String,
}

/// A database cross reference, one `DR` line
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct CrossReference {
    /// The database name, e.g. `PDB`
    pub database: String,
    /// The identifier in that database, e.g. `1A3N`
    pub identifier: String,
    /// Any further database specific fields
    pub properties: Vec<String>,
}

impl SequenceRecord {
    /// The primary accession, if any `AC` line was present
    pub fn primary_accession(&self) -> Option<&str> {
        self.accessions.first().map(String::as_str)
    }

    /// Parse exactly one flat-text record. Line codes are taken from columns 1-2 and values from
    /// column 6 onwards, unknown line codes are skipped.
    /// # Errors
    /// If there is no `ID` line, more than one record, no sequence, or the sequence length does
    /// not match the length declared on the `SQ` line.
    pub fn parse_swissprot(text: &str) -> Result<Self, BoxedError<'static, ProtScanError>> {
        let mut record = Self::default();
        let mut has_id = false;
        let mut description = Vec::new();
        let mut organism = Vec::new();
        let mut declared: Option<(usize, usize, &str)> = None;
        let mut in_sequence = false;
        let mut ended = false;

        for (line_index, line) in text.lines().enumerate() {
            if ended {
                if line.trim().is_empty() {
                    continue;
                }
                return Err(BoxedError::new(
                    ProtScanError::InvalidRecord,
                    "Multiple records found",
                    "Only a single record was expected but more content follows the `//` terminator",
                    Context::full_line(line_index as u32, line).to_owned(),
                ));
            }
            if line.starts_with("//") {
                ended = true;
                continue;
            }
            if in_sequence && line.starts_with(' ') {
                record
                    .sequence
                    .extend(line.chars().filter(|c| !c.is_whitespace()));
                continue;
            }
            in_sequence = false;

            let code = line.get(..2).unwrap_or(line);
            let value = line.get(5..).unwrap_or_default().trim_end();
            match code {
                "ID" => {
                    has_id = true;
                    value
                        .split_whitespace()
                        .next()
                        .unwrap_or_default()
                        .clone_into(&mut record.entry_name);
                }
                "AC" => record.accessions.extend(
                    value
                        .split(';')
                        .map(str::trim)
                        .filter(|a| !a.is_empty())
                        .map(ToString::to_string),
                ),
                "DE" => description.push(value),
                "OS" => organism.push(value),
                "OX" => {
                    record.taxonomy_id = value
                        .split_once("NCBI_TaxID=")
                        .and_then(|(_, rest)| {
                            rest.split(|c: char| !c.is_ascii_digit())
                                .next()
                                .and_then(|n| n.parse().ok())
                        });
                }
                "DR" => record.cross_references.push(parse_cross_reference(value)),
                "SQ" => {
                    let length = value
                        .split_whitespace()
                        .nth(1)
                        .and_then(|n| n.parse::<usize>().ok());
                    if let Some(length) = length {
                        declared = Some((length, line_index, line));
                    }
                    in_sequence = true;
                }
                _ => (),
            }
        }

        if !has_id {
            return Err(BoxedError::new(
                ProtScanError::InvalidRecord,
                "No UniProt record found",
                "The text does not contain an `ID` line, it is likely an error page",
                text.lines().next().map_or_else(Context::none, |line| {
                    Context::full_line(0, line).to_owned()
                }),
            ));
        }
        if record.sequence.is_empty() {
            return Err(BoxedError::small(
                ProtScanError::InvalidRecord,
                "Record has no sequence",
                format!("The record `{}` does not contain sequence data", record.entry_name),
            ));
        }
        if let Some((length, line_index, line)) = declared
            && length != record.sequence.len()
        {
            return Err(BoxedError::new(
                ProtScanError::InvalidRecord,
                "Sequence length mismatch",
                format!(
                    "The `SQ` line declares {length} residues but {} were found",
                    record.sequence.len()
                ),
                Context::full_line(line_index as u32, line).to_owned(),
            ));
        }

        record.description = description.join(" ");
        record.organism = organism.join(" ");
        Ok(record)
    }
}

fn parse_cross_reference(value: &str) -> CrossReference {
    let value = value.strip_suffix('.').unwrap_or(value);
    let mut fields = value.split(';').map(str::trim);
    CrossReference {
        database: fields.next().unwrap_or_default().to_string(),
        identifier: fields.next().unwrap_or_default().to_string(),
        properties: fields.map(ToString::to_string).collect(),
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    const HBA_HUMAN: &str = include_str!("../tests/data/P69905.txt");

    #[test]
    fn hemoglobin() {
        let record = SequenceRecord::parse_swissprot(HBA_HUMAN).unwrap();
        assert_eq!(record.entry_name, "HBA_HUMAN");
        assert_eq!(record.primary_accession(), Some("P69905"));
        assert_eq!(record.accessions.len(), 8);
        assert_eq!(record.accessions[7], "Q9UCM0");
        assert!(record.description.starts_with("RecName: Full=Hemoglobin subunit alpha;"));
        assert!(record.description.contains("; AltName: Full=Alpha-globin;"));
        assert_eq!(record.organism, "Homo sapiens (Human).");
        assert_eq!(record.taxonomy_id, Some(9606));
        assert_eq!(record.sequence.len(), 142);
        assert!(record.sequence.starts_with("MVLSPADKTNVKAAWGKVGAHAGEYGAEALERMFLSFPTTKTYFPHF"));
        assert!(record.sequence.ends_with("TSKYR"));
        let pdb: Vec<_> = record
            .cross_references
            .iter()
            .filter(|r| r.database == "PDB")
            .collect();
        assert_eq!(pdb.len(), 3);
        assert_eq!(pdb[0].identifier, "1A00");
        assert_eq!(pdb[0].properties, ["X-ray", "2.00 A", "A/C=2-142"]);
    }

    #[test]
    fn error_page() {
        let error =
            SequenceRecord::parse_swissprot("<!DOCTYPE html>\n<html><body>Not found</body></html>")
                .unwrap_err();
        assert_eq!(error.get_kind(), ProtScanError::InvalidRecord);
        assert_eq!(error.get_short_description(), "No UniProt record found");
        let error = SequenceRecord::parse_swissprot("").unwrap_err();
        assert_eq!(error.get_short_description(), "No UniProt record found");
    }

    #[test]
    fn multiple_records() {
        let text = format!("{HBA_HUMAN}{HBA_HUMAN}");
        let error = SequenceRecord::parse_swissprot(&text).unwrap_err();
        assert_eq!(error.get_short_description(), "Multiple records found");
    }

    #[test]
    fn trailing_blank_lines() {
        let text = format!("{HBA_HUMAN}\n\n");
        assert!(SequenceRecord::parse_swissprot(&text).is_ok());
    }

    #[test]
    fn no_sequence() {
        let text = "ID   TEST_HUMAN   Reviewed;   0 AA.\nAC   P00000;\n//\n";
        let error = SequenceRecord::parse_swissprot(text).unwrap_err();
        assert_eq!(error.get_short_description(), "Record has no sequence");
    }

    #[test]
    fn length_mismatch() {
        let text = "ID   TEST_HUMAN   Reviewed;   5 AA.\nSQ   SEQUENCE   5 AA;  500 MW;  0 CRC64;\n     MKV\n//\n";
        let error = SequenceRecord::parse_swissprot(text).unwrap_err();
        assert_eq!(error.get_short_description(), "Sequence length mismatch");
    }

    #[test]
    fn taxonomy_with_evidence() {
        let text = "ID   TEST_MOUSE   Reviewed;   3 AA.\nOX   NCBI_TaxID=10090 {ECO:0000313|EMBL:BAE12345.1};\nSQ   SEQUENCE   3 AA;\n     MKV\n//\n";
        let record = SequenceRecord::parse_swissprot(text).unwrap();
        assert_eq!(record.taxonomy_id, Some(10090));
        assert_eq!(record.sequence, "MKV");
    }
}
