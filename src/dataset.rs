use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::category::{Category, Field};
use crate::error::{PipelineError, Result};
use crate::normalize::NormalizedRecord;
use crate::parser::RawListing;

/// A delimited file as loaded: header plus string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn read_from<R: io::Read>(reader: R) -> std::result::Result<Table, csv::Error> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let rows = rdr
            .records()
            .map(|rec| rec.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<std::result::Result<Vec<Vec<String>>, _>>()?;
        Ok(Table { headers, rows })
    }

    /// Load a saved file. Anything that prevents reading it is reported as
    /// `DatasetUnavailable`.
    pub fn load(path: &Path) -> Result<Table> {
        let unavailable = |reason: String| PipelineError::DatasetUnavailable {
            path: path.to_path_buf(),
            reason,
        };
        let file = fs::File::open(path).map_err(|e| unavailable(e.to_string()))?;
        let table = Table::read_from(file).map_err(|e| unavailable(format!("corrupt file: {}", e)))?;
        if table.headers.iter().all(|h| h.is_empty()) {
            return Err(unavailable("file has no header row".to_string()));
        }
        Ok(table)
    }

    /// Index of the first header matching one of `names`, ignoring case.
    pub fn column(&self, names: &[&str]) -> Option<usize> {
        names
            .iter()
            .find_map(|name| self.headers.iter().position(|h| h.eq_ignore_ascii_case(name)))
    }
}

/// Normalized records of one category, in scrape order.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub category: Category,
    pub records: Vec<NormalizedRecord>,
}

impl Dataset {
    pub fn new(category: Category, records: Vec<NormalizedRecord>) -> Self {
        Dataset { category, records }
    }

    /// Default location of a category's dataset under `data_dir`.
    pub fn path_in(data_dir: &Path, category: Category) -> PathBuf {
        data_dir.join(category.spec().file_name)
    }

    pub fn to_table(&self) -> Table {
        let spec = self.category.spec();
        let headers = spec.columns().into_iter().map(String::from).collect();
        let rows = self
            .records
            .iter()
            .map(|rec| {
                let mut row = vec![rec.adresse.clone(), rec.prix.to_string()];
                for field in spec.fields {
                    row.push(match field {
                        Field::Superficie => opt_cell(rec.superficie),
                        Field::Pieces => opt_cell(rec.pieces),
                        Field::SallesBain => opt_cell(rec.salles_bain),
                    });
                }
                row
            })
            .collect();
        Table { headers, rows }
    }

    pub fn write_to<W: io::Write>(&self, writer: W) -> std::result::Result<(), csv::Error> {
        let table = self.to_table();
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&table.headers)?;
        for row in &table.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Replace the file at `path` with this dataset.
    pub fn save(&self, path: &Path) -> Result<()> {
        replace_file(path, |file| self.write_to(file))?;
        info!(path = %path.display(), rows = self.records.len(), "Saved dataset");
        Ok(())
    }
}

/// Write scraped listings untouched, one column per `RawListing` field.
pub fn write_raw<W: io::Write>(listings: &[RawListing], writer: W) -> std::result::Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for listing in listings {
        wtr.serialize(listing)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn save_raw(listings: &[RawListing], path: &Path) -> Result<()> {
    replace_file(path, |file| write_raw(listings, file))?;
    info!(path = %path.display(), rows = listings.len(), "Saved raw listings");
    Ok(())
}

/// The write goes to a sibling temp file first so a failed run leaves the
/// old file intact.
fn replace_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(io::BufWriter<fs::File>) -> std::result::Result<(), csv::Error>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let file = fs::File::create(&tmp)?;
    if let Err(e) = write(io::BufWriter::new(file)) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn opt_cell<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}
