//! Trace capture for the bid planner.
//!
//! The planner emits `tracing` events under a few fixed targets. A custom
//! subscriber turns every INFO event into one row of a per-target table;
//! columns appear the first time a field name is seen. Tables can be
//! converted to polars frames for analysis or written out as parquet.
//!
//! ```ignore
//! tracing::subscriber::with_default(instrument::TraceSubscriber, || {
//!     planner.find_optimal_bid(&facts, &strategy)
//! });
//! let log = instrument::drain();
//! let candidates = log.table(instrument::CANDIDATE_TARGET).unwrap();
//! assert_eq!(candidates.row_count, 21);
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Record};
use tracing::{Event, Id, Metadata, Subscriber};

/// One row per single-bid evaluation.
pub const EVALUATION_TARGET: &str = "bid_evaluation";
/// One row per price tried by the optimal-bid search.
pub const CANDIDATE_TARGET: &str = "bid_candidate";
/// One row per finished search.
pub const SELECTION_TARGET: &str = "bid_selection";

#[derive(Debug, Clone, PartialEq)]
pub enum TraceColumn {
    U64(Vec<u64>),
    I64(Vec<i64>),
    F64(Vec<f64>),
    Bool(Vec<bool>),
    Str(Vec<String>),
}

impl TraceColumn {
    pub fn len(&self) -> usize {
        match self {
            TraceColumn::U64(v) => v.len(),
            TraceColumn::I64(v) => v.len(),
            TraceColumn::F64(v) => v.len(),
            TraceColumn::Bool(v) => v.len(),
            TraceColumn::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fill with the type's zero value up to `rows`.
    fn pad_to(&mut self, rows: usize) {
        let missing = rows.saturating_sub(self.len());
        if missing == 0 {
            return;
        }
        match self {
            TraceColumn::U64(v) => v.extend(std::iter::repeat_n(0, missing)),
            TraceColumn::I64(v) => v.extend(std::iter::repeat_n(0, missing)),
            TraceColumn::F64(v) => v.extend(std::iter::repeat_n(0.0, missing)),
            TraceColumn::Bool(v) => v.extend(std::iter::repeat_n(false, missing)),
            TraceColumn::Str(v) => v.extend(std::iter::repeat_n(String::new(), missing)),
        }
    }
}

/// Rows recorded under one target. Columns are kept aligned to `row_count`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceTable {
    pub columns: BTreeMap<String, TraceColumn>,
    pub row_count: usize,
}

impl TraceTable {
    fn pad_columns(&mut self) {
        let rows = self.row_count;
        for column in self.columns.values_mut() {
            column.pad_to(rows);
        }
    }

    pub fn f64_column(&self, name: &str) -> Option<&[f64]> {
        match self.columns.get(name)? {
            TraceColumn::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn u64_column(&self, name: &str) -> Option<&[u64]> {
        match self.columns.get(name)? {
            TraceColumn::U64(v) => Some(v),
            _ => None,
        }
    }
}

/// Every table captured on this thread, keyed by tracing target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceLog {
    pub tables: BTreeMap<String, TraceTable>,
}

impl TraceLog {
    pub fn table(&self, target: &str) -> Option<&TraceTable> {
        self.tables.get(target)
    }

    pub fn rows(&self, target: &str) -> usize {
        self.table(target).map_or(0, |t| t.row_count)
    }
}

thread_local! {
    static TRACE_LOG: RefCell<TraceLog> = RefCell::default();
}

struct RowVisitor<'a> {
    table: &'a mut TraceTable,
}

impl RowVisitor<'_> {
    /// Column for `field`, created zero-filled for earlier rows if new.
    fn column(&mut self, field: &Field, empty: fn(usize) -> TraceColumn) -> &mut TraceColumn {
        let rows = self.table.row_count;
        self.table
            .columns
            .entry(field.name().to_string())
            .or_insert_with(|| empty(rows))
    }
}

// A value whose type disagrees with the column's is dropped; the row is
// zero-filled for that column instead.
impl Visit for RowVisitor<'_> {
    fn record_u64(&mut self, field: &Field, value: u64) {
        if let TraceColumn::U64(v) = self.column(field, |n| TraceColumn::U64(vec![0; n])) {
            v.push(value);
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        if let TraceColumn::I64(v) = self.column(field, |n| TraceColumn::I64(vec![0; n])) {
            v.push(value);
        }
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if let TraceColumn::F64(v) = self.column(field, |n| TraceColumn::F64(vec![0.0; n])) {
            v.push(value);
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if let TraceColumn::Bool(v) = self.column(field, |n| TraceColumn::Bool(vec![false; n])) {
            v.push(value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if let TraceColumn::Str(v) =
            self.column(field, |n| TraceColumn::Str(vec![String::new(); n]))
        {
            v.push(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.record_str(field, &format!("{value:?}"));
    }
}

/// Subscriber that appends every INFO (or more severe) event to the
/// thread-local trace log. Spans are ignored.
pub struct TraceSubscriber;

impl Subscriber for TraceSubscriber {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.is_event() && *metadata.level() <= tracing::Level::INFO
    }

    fn new_span(&self, _span: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let target = event.metadata().target().to_string();
        TRACE_LOG.with(|log| {
            let mut log = log.borrow_mut();
            let table = log.tables.entry(target).or_default();
            event.record(&mut RowVisitor { table });
            table.row_count += 1;
            table.pad_columns();
        });
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

/// Install `TraceSubscriber` process-wide. Later calls are ignored.
pub fn install_subscriber() {
    let _ = tracing::subscriber::set_global_default(TraceSubscriber);
}

/// Take everything captured on this thread so far.
pub fn drain() -> TraceLog {
    TRACE_LOG.with(|log| std::mem::take(&mut *log.borrow_mut()))
}

pub fn clear() {
    TRACE_LOG.with(|log| *log.borrow_mut() = TraceLog::default());
}

// ============================================================================
// Polars
// ============================================================================

use polars::prelude::*;

impl TraceTable {
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let columns = self
            .columns
            .iter()
            .map(|(name, column)| match column {
                TraceColumn::U64(v) => Column::new(name.into(), v),
                TraceColumn::I64(v) => Column::new(name.into(), v),
                TraceColumn::F64(v) => Column::new(name.into(), v),
                TraceColumn::Bool(v) => Column::new(name.into(), v),
                TraceColumn::Str(v) => Column::new(name.into(), v),
            })
            .collect();
        DataFrame::new(columns)
    }
}

impl TraceLog {
    pub fn to_dataframes(&self) -> PolarsResult<BTreeMap<String, DataFrame>> {
        self.tables
            .iter()
            .map(|(target, table)| Ok((target.clone(), table.to_dataframe()?)))
            .collect()
    }
}

fn io_error(error: std::io::Error) -> PolarsError {
    PolarsError::IO {
        error: error.into(),
        msg: None,
    }
}

/// Write each frame to `{dir}/{target}.parquet`.
pub fn save_parquet(frames: &mut BTreeMap<String, DataFrame>, dir: &Path) -> PolarsResult<()> {
    std::fs::create_dir_all(dir).map_err(io_error)?;
    for (target, frame) in frames.iter_mut() {
        let file = std::fs::File::create(dir.join(format!("{target}.parquet"))).map_err(io_error)?;
        ParquetWriter::new(file).finish(frame)?;
    }
    Ok(())
}

/// Keep directory names portable.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .take(60)
        .collect()
}

/// Captures a test run and persists it on drop.
///
/// Creation clears the thread's log and installs the subscriber. `frames()`
/// drains the log once and caches the frames. On drop the frames are written
/// to `{parent}/{name}/*.parquet`, followed by an empty `_ready` file so
/// watchers know the set is complete. Nothing is written if nothing was
/// captured.
pub struct ScopedTrace {
    dir: PathBuf,
    frames: Option<BTreeMap<String, DataFrame>>,
}

impl ScopedTrace {
    pub fn new(parent: impl Into<PathBuf>, name: &str) -> Self {
        clear();
        install_subscriber();
        Self {
            dir: parent.into().join(sanitize(name)),
            frames: None,
        }
    }

    pub fn frames(&mut self) -> PolarsResult<&BTreeMap<String, DataFrame>> {
        if self.frames.is_none() {
            self.frames = Some(drain().to_dataframes()?);
        }
        Ok(self.frames.get_or_insert_with(BTreeMap::new))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn persist(&mut self) -> PolarsResult<usize> {
        let mut frames = match self.frames.take() {
            Some(frames) => frames,
            None => drain().to_dataframes()?,
        };
        if frames.is_empty() {
            return Ok(0);
        }
        save_parquet(&mut frames, &self.dir)?;
        std::fs::File::create(self.dir.join("_ready")).map_err(io_error)?;
        Ok(frames.len())
    }
}

impl Drop for ScopedTrace {
    fn drop(&mut self) {
        match self.persist() {
            Ok(0) => {}
            Ok(n) => eprintln!("ScopedTrace: wrote {n} tables to {}", self.dir.display()),
            Err(e) => eprintln!("ScopedTrace({}): {e}", self.dir.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::subscriber::with_default;

    #[test]
    fn events_become_rows_per_target() {
        clear();
        with_default(TraceSubscriber, || {
            tracing::info!(target: CANDIDATE_TARGET, index = 0u64, price = 100.0f64);
            tracing::info!(target: CANDIDATE_TARGET, index = 1u64, price = 110.0f64);
            tracing::info!(target: SELECTION_TARGET, price = 110.0f64);
            tracing::debug!(target: CANDIDATE_TARGET, index = 9u64);
        });
        let log = drain();

        assert_eq!(log.rows(CANDIDATE_TARGET), 2, "debug events are skipped");
        assert_eq!(log.rows(SELECTION_TARGET), 1);
        assert_eq!(log.rows(EVALUATION_TARGET), 0);

        let candidates = log.table(CANDIDATE_TARGET).unwrap();
        assert_eq!(candidates.u64_column("index"), Some(&[0, 1][..]));
        assert_eq!(candidates.f64_column("price"), Some(&[100.0, 110.0][..]));
        assert_eq!(candidates.f64_column("index"), None);
    }

    #[test]
    fn late_and_missing_fields_are_zero_filled() {
        clear();
        with_default(TraceSubscriber, || {
            tracing::info!(target: "t", price = 1.0f64, mode = "search");
            tracing::info!(target: "t", score = 5.0f64);
        });
        let log = drain();
        let table = log.table("t").unwrap();

        assert_eq!(table.row_count, 2);
        assert_eq!(table.f64_column("price"), Some(&[1.0, 0.0][..]));
        assert_eq!(table.f64_column("score"), Some(&[0.0, 5.0][..]));
        assert_eq!(
            table.columns["mode"],
            TraceColumn::Str(vec!["search".into(), String::new()])
        );
    }

    #[test]
    fn mismatched_type_keeps_columns_aligned() {
        clear();
        with_default(TraceSubscriber, || {
            tracing::info!(target: "t", value = 1u64);
            tracing::info!(target: "t", value = 2.5f64);
        });
        let log = drain();
        let table = log.table("t").unwrap();
        assert_eq!(table.u64_column("value"), Some(&[1, 0][..]));
    }

    #[test]
    fn drain_empties_the_log() {
        clear();
        with_default(TraceSubscriber, || {
            tracing::info!(target: "t", value = 1u64);
        });
        assert_eq!(drain().rows("t"), 1);
        assert!(drain().tables.is_empty());
    }

    #[test]
    fn tables_convert_to_dataframes() {
        let mut table = TraceTable::default();
        table.columns.insert("index".into(), TraceColumn::U64(vec![0, 1, 2]));
        table
            .columns
            .insert("score".into(), TraceColumn::F64(vec![1.0, 3.0, 2.0]));
        table.row_count = 3;

        let df = table.to_dataframe().unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn sanitize_keeps_names_portable() {
        assert_eq!(sanitize("optimal bid/hot"), "optimal_bid_hot");
        assert_eq!(sanitize(&"x".repeat(100)).len(), 60);
    }
}
