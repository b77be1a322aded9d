//! Request and response bodies for the REST API.

use case_core::{CaseRecord, MonthView};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

/// A case submission, shaped like the entry form.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CaseFormReq {
    pub key: String,
    /// `YYYY-MM-DD`; today when omitted
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub name: String,
    /// `key=value` lines
    #[serde(default)]
    pub extra_fields: String,
    /// Comma-separated `YYYY-MM-DD` dates
    #[serde(default)]
    pub test_dates: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CasesRes {
    #[schema(value_type = Vec<Object>)]
    pub cases: Vec<CaseRecord>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteRes {
    #[schema(value_type = Object)]
    pub deleted: CaseRecord,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MonthQuery {
    /// Defaults to the current year
    pub year: Option<i32>,
    /// 1-12; defaults to the current month
    pub month: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct DayRes {
    pub date: String,
    pub day: u32,
    pub in_month: bool,
    pub flagged: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MonthRes {
    pub year: i32,
    pub month: u32,
    #[schema(value_type = Vec<Object>)]
    pub records: Vec<CaseRecord>,
    pub test_dates: Vec<String>,
    pub first_weekday: String,
    pub weeks: Vec<Vec<DayRes>>,
}

impl From<MonthView> for MonthRes {
    fn from(view: MonthView) -> Self {
        use chrono::Datelike;

        let weeks = view
            .grid
            .weeks()
            .iter()
            .map(|week| {
                week.iter()
                    .map(|day| DayRes {
                        date: day.date.to_string(),
                        day: day.date.day(),
                        in_month: day.in_month,
                        flagged: day.flagged,
                    })
                    .collect()
            })
            .collect();

        Self {
            year: view.year,
            month: view.month,
            first_weekday: view.grid.first_weekday().to_string(),
            test_dates: view.test_dates.iter().map(|d| d.to_string()).collect(),
            records: view.records,
            weeks,
        }
    }
}
