// Tab-separated table reader for the IMDb-style dumps
// Header row names the columns; `\N` marks a null field
use anyhow::{anyhow, Context, Result};
use csv::{ByteRecordsIntoIter, ReaderBuilder, StringRecord};
use std::io::Read;
use tracing::warn;

use reelsim_core::record::{parse_flag, NULL_MARKER};
use reelsim_core::{AkaRecord, BasicsRecord, RatingRecord};

/// A table whose header row has been read.
pub struct TsvTable<R> {
    reader: csv::Reader<R>,
    headers: StringRecord,
}

impl<R: Read> TsvTable<R> {
    pub fn new(reader: R) -> Result<Self> {
        // Titles carry literal quotes, so quoting is off
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .quoting(false)
            .flexible(true)
            .from_reader(reader);
        let headers = reader
            .headers()
            .context("Failed to read TSV header")?
            .clone();
        if headers.is_empty() {
            return Err(anyhow!("TSV input is empty (missing header row)"));
        }
        Ok(Self { reader, headers })
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    pub fn require(&self, name: &str) -> Result<usize> {
        self.column(name)
            .ok_or_else(|| anyhow!("TSV header has no '{}' column", name))
    }

    /// Lazily map each data row with `map`.
    pub fn rows<T, F>(self, map: F) -> TsvRows<R, F>
    where
        F: FnMut(&StringRecord) -> T,
    {
        TsvRows {
            records: self.reader.into_byte_records(),
            map,
            read: 0,
            skipped: 0,
            error: None,
        }
    }
}

/// Streaming row iterator.
///
/// Rows that are not valid UTF-8 are skipped and counted. A read error ends
/// iteration; [`TsvRows::finish`] reports it.
pub struct TsvRows<R, F> {
    records: ByteRecordsIntoIter<R>,
    map: F,
    read: usize,
    skipped: usize,
    error: Option<csv::Error>,
}

impl<R, F> TsvRows<R, F> {
    #[inline]
    pub fn read(&self) -> usize {
        self.read
    }

    #[inline]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Number of rows produced, or the error that cut the stream short.
    pub fn finish(self) -> Result<usize> {
        if self.skipped > 0 {
            warn!("Skipped {} undecodable TSV lines", self.skipped);
        }
        match self.error {
            Some(e) => Err(e).context("Failed to read TSV record"),
            None => Ok(self.read),
        }
    }
}

impl<R, T, F> Iterator for TsvRows<R, F>
where
    R: Read,
    F: FnMut(&StringRecord) -> T,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.error.is_some() {
            return None;
        }
        for result in self.records.by_ref() {
            let bytes = match result {
                Ok(bytes) => bytes,
                Err(e) => {
                    self.error = Some(e);
                    return None;
                }
            };
            match StringRecord::from_byte_record(bytes) {
                Ok(record) => {
                    self.read += 1;
                    return Some((self.map)(&record));
                }
                Err(e) => {
                    let line = e.into_byte_record().position().map_or(0, |p| p.line());
                    warn!("Skipping TSV line {}: invalid UTF-8", line);
                    self.skipped += 1;
                }
            }
        }
        None
    }
}

/// Field at `index`; null markers, empty fields and missing trailing fields
/// all read as `None`.
fn field(record: &StringRecord, index: Option<usize>) -> Option<&str> {
    index
        .and_then(|i| record.get(i))
        .filter(|v| !v.is_empty() && *v != NULL_MARKER)
}

fn owned(record: &StringRecord, index: Option<usize>) -> Option<String> {
    field(record, index).map(str::to_string)
}

/// Stream a `title.basics` table.
pub fn basics_rows<R: Read>(
    reader: R,
) -> Result<TsvRows<R, impl FnMut(&StringRecord) -> BasicsRecord>> {
    let table = TsvTable::new(reader)?;
    let id = Some(table.require("tconst")?);
    let title_type = table.column("titleType");
    let primary_title = table.column("primaryTitle");
    let original_title = table.column("originalTitle");
    let is_adult = table.column("isAdult");
    let start_year = table.column("startYear");
    let genres = table.column("genres");

    Ok(table.rows(move |row: &StringRecord| BasicsRecord {
        id: owned(row, id),
        title_type: owned(row, title_type),
        primary_title: owned(row, primary_title),
        original_title: owned(row, original_title),
        is_adult: field(row, is_adult).and_then(parse_flag),
        start_year: owned(row, start_year),
        genres: owned(row, genres),
    }))
}

/// Stream a `title.ratings` table. Unparsable numbers read as `None`.
pub fn ratings_rows<R: Read>(
    reader: R,
) -> Result<TsvRows<R, impl FnMut(&StringRecord) -> RatingRecord>> {
    let table = TsvTable::new(reader)?;
    let id = Some(table.require("tconst")?);
    let average_rating = table.column("averageRating");
    let num_votes = table.column("numVotes");

    Ok(table.rows(move |row: &StringRecord| RatingRecord {
        id: owned(row, id),
        average_rating: field(row, average_rating).and_then(|v| v.trim().parse().ok()),
        num_votes: field(row, num_votes).and_then(|v| v.trim().parse().ok()),
    }))
}

/// Stream a `title.akas` table.
pub fn akas_rows<R: Read>(reader: R) -> Result<TsvRows<R, impl FnMut(&StringRecord) -> AkaRecord>> {
    let table = TsvTable::new(reader)?;
    let title_id = Some(table.require("titleId")?);
    let title = table.column("title");

    Ok(table.rows(move |row: &StringRecord| AkaRecord {
        title_id: owned(row, title_id),
        title: owned(row, title),
    }))
}

fn collect_rows<R, T, F>(mut rows: TsvRows<R, F>) -> Result<Vec<T>>
where
    R: Read,
    F: FnMut(&StringRecord) -> T,
{
    let records = rows.by_ref().collect();
    rows.finish()?;
    Ok(records)
}

/// Read a whole `title.basics` table into memory.
pub fn read_basics<R: Read>(reader: R) -> Result<Vec<BasicsRecord>> {
    collect_rows(basics_rows(reader)?)
}

pub fn read_ratings<R: Read>(reader: R) -> Result<Vec<RatingRecord>> {
    collect_rows(ratings_rows(reader)?)
}

pub fn read_akas<R: Read>(reader: R) -> Result<Vec<AkaRecord>> {
    collect_rows(akas_rows(reader)?)
}
