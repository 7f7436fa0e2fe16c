use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

pub const HISTORY_HEADER: [&str; 6] = [
    "Age",
    "Income",
    "City",
    "PricePerSqm",
    "PurchaseValue",
    "FiveYearProjectionPct",
];

/// One completed query with a snapshot of the city's figures at that moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "Age")]
    pub age: u8,
    #[serde(rename = "Income")]
    pub annual_income: f64,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "PricePerSqm")]
    pub price_per_sqm: Option<f64>,
    #[serde(rename = "PurchaseValue")]
    pub purchase_value: Option<f64>,
    #[serde(rename = "FiveYearProjectionPct")]
    pub five_year_projection_pct: Option<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("search history unavailable: {0}")]
    Io(#[from] std::io::Error),
    #[error("search history is malformed: {0}")]
    Csv(#[from] csv::Error),
    #[error("search history lock poisoned")]
    Poisoned,
}

/// Append-only audit trail of queries; entries are never updated or removed.
pub trait HistoryStore: Send + Sync {
    fn append(&self, entry: &HistoryEntry) -> Result<(), HistoryError>;
    fn load_all(&self) -> Result<Vec<HistoryEntry>, HistoryError>;
}

/// CSV-backed history. Each append opens the file in append mode, writes one row and
/// closes it again; the mutex keeps writers in this process from interleaving.
#[derive(Debug)]
pub struct CsvHistoryLog {
    path: PathBuf,
    writer_lock: Mutex<()>,
}

impl CsvHistoryLog {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            writer_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes a header-only file when none exists yet.
    pub fn create(&self) -> Result<(), HistoryError> {
        let _guard = self.writer_lock.lock().map_err(|_| HistoryError::Poisoned)?;
        self.open_for_append().map(|_| ())
    }

    fn open_for_append(&self) -> Result<std::fs::File, HistoryError> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if file.metadata()?.len() == 0 {
            let mut header = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(&mut file);
            header.write_record(HISTORY_HEADER)?;
            header.flush()?;
            debug!(path = %self.path.display(), "created search history");
        }

        Ok(file)
    }
}

impl HistoryStore for CsvHistoryLog {
    fn append(&self, entry: &HistoryEntry) -> Result<(), HistoryError> {
        let _guard = self.writer_lock.lock().map_err(|_| HistoryError::Poisoned)?;
        let file = self.open_for_append()?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.serialize(entry)?;
        writer.flush()?;
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let file = match std::fs::File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(file);
        reader
            .deserialize::<HistoryEntry>()
            .map(|row| row.map_err(HistoryError::from))
            .collect()
    }
}
