//! Case service: one pass of load, mutate, save, project.
//!
//! Every mutating call reloads the document, applies the edit to the fresh working copy and
//! writes the whole collection back. A failed backend call aborts the operation without retry.

use crate::{
    build_calendar_grid, delete_at, delete_by_key, month_records, test_date_set, upsert,
    CalendarGrid, CaseForm, CaseResult, CaseSchema, CaseStore, CoreConfig,
};
use case_files::BlobBackend;
use case_types::CaseRecord;
use chrono::{NaiveDate, Weekday};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Everything a render target needs for one month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    pub records: Vec<CaseRecord>,
    pub test_dates: BTreeSet<NaiveDate>,
    pub grid: CalendarGrid,
}

impl MonthView {
    /// Projects `collection` onto `(year, month)`.
    pub fn project(
        collection: &[CaseRecord],
        schema: &CaseSchema,
        year: i32,
        month: u32,
        first_weekday: Weekday,
    ) -> CaseResult<Self> {
        let test_dates = test_date_set(collection, schema, year, month);
        let grid = build_calendar_grid(year, month, first_weekday)?.with_flags(&test_dates);
        let records = month_records(collection, schema, year, month)
            .cloned()
            .collect();

        Ok(Self {
            year,
            month,
            records,
            test_dates,
            grid,
        })
    }
}

/// Case operations bound to one configured document.
#[derive(Clone, Debug)]
pub struct CaseService {
    cfg: Arc<CoreConfig>,
    store: CaseStore,
}

impl CaseService {
    /// Opens (or creates) the configured document on `backend`.
    pub fn new(cfg: Arc<CoreConfig>, backend: Arc<dyn BlobBackend>) -> CaseResult<Self> {
        let store = CaseStore::open(backend, &cfg)?;
        Ok(Self { cfg, store })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    pub fn store(&self) -> &CaseStore {
        &self.store
    }

    /// The full collection, as currently stored.
    pub fn cases(&self) -> CaseResult<Vec<CaseRecord>> {
        self.store.load()
    }

    /// Upserts `record` by the configured key field and returns the saved collection.
    pub fn submit(&self, record: CaseRecord) -> CaseResult<Vec<CaseRecord>> {
        let cases = self.store.load()?;
        let cases = upsert(cases, record, self.cfg.schema().key_field());
        self.store.save(&cases)?;
        tracing::info!("case submitted; collection now holds {} cases", cases.len());
        Ok(cases)
    }

    pub fn submit_form(&self, form: CaseForm) -> CaseResult<Vec<CaseRecord>> {
        let record = form.into_record(self.cfg.schema());
        self.submit(record)
    }

    /// Deletes the record at `index`. Nothing is written when the index is out of range.
    pub fn remove_at(&self, index: usize) -> CaseResult<CaseRecord> {
        let mut cases = self.store.load()?;
        let removed = delete_at(&mut cases, index)?;
        self.store.save(&cases)?;
        Ok(removed)
    }

    /// Deletes the record carrying `key` in the configured key field.
    pub fn remove_by_key(&self, key: &str) -> CaseResult<CaseRecord> {
        let mut cases = self.store.load()?;
        let removed = delete_by_key(&mut cases, self.cfg.schema().key_field(), key)?;
        self.store.save(&cases)?;
        Ok(removed)
    }

    /// Reloads the collection and projects it onto `(year, month)`.
    pub fn month_view(&self, year: i32, month: u32) -> CaseResult<MonthView> {
        let cases = self.store.load()?;
        MonthView::project(
            &cases,
            self.cfg.schema(),
            year,
            month,
            self.cfg.first_weekday(),
        )
    }
}
