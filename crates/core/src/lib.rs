//! # Case Core
//!
//! Core logic for the case tracker.
//!
//! This crate contains pure data operations over the case collection:
//! - Loading and saving the whole collection as one JSON document through a [`BlobBackend`]
//! - Upsert by a configurable key field, delete by position or key
//! - Month projection: which cases touch a month, which days carry test dates, and the
//!   calendar grid for that month
//!
//! **No transport concerns**: HTTP servers and terminal handling belong in `api-rest` and
//! `case-cli`. Configuration is resolved once by the binaries and passed in.

pub mod config;
pub mod constants;
pub mod error;
pub mod form;
pub mod projector;
pub mod render;
pub mod service;
pub mod store;

pub use case_files::{BlobBackend, DocumentHandle, DocumentMetadata, LocalDirBackend, MemoryBackend};
pub use case_types::{CaseRecord, FieldValue, NonEmptyText, TextError};
pub use config::{CaseSchema, CoreConfig};
pub use error::{CaseError, CaseResult};
pub use form::CaseForm;
pub use projector::{
    build_calendar_grid, matches_month, month_records, parse_iso_date, test_date_set,
    CalendarDay, CalendarGrid, DateParseError,
};
pub use render::{month_page, render_month, HtmlRenderer, RenderTarget, TextRenderer};
pub use service::{CaseService, MonthView};
pub use store::{delete_at, delete_by_key, upsert, CaseStore};
