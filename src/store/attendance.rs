use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::api::{ApiClient, Transport};
use crate::models::{ApiResponse, Attendance};
use crate::stats;

pub const FETCH_FAILED: &str = "Failed to fetch attendance";

#[derive(Debug)]
pub struct AttendanceStore {
    pub records: Vec<Attendance>,
    pub loading: bool,
    pub error: Option<String>,
    pub selected_date: NaiveDate,
}

impl Default for AttendanceStore {
    fn default() -> Self {
        Self::for_date(stats::today())
    }
}

impl AttendanceStore {
    pub fn for_date(selected_date: NaiveDate) -> Self {
        Self {
            records: Vec::new(),
            loading: false,
            error: None,
            selected_date,
        }
    }

    pub fn set_selected_date(&mut self, date: NaiveDate) {
        self.selected_date = date;
    }

    pub async fn fetch_today<T: Transport>(&mut self, api: &ApiClient<T>) {
        self.loading = true;
        self.error = None;
        let response = api.attendance().today().await;
        self.apply(response);
    }

    pub async fn fetch_for_date<T: Transport>(&mut self, api: &ApiClient<T>, date: NaiveDate) {
        self.loading = true;
        self.error = None;
        let response = api.attendance().for_date(date).await;
        self.apply(response);
    }

    /// Re-fetches `selected_date` without raising `loading`.
    pub async fn refresh<T: Transport>(&mut self, api: &ApiClient<T>) {
        match api
            .attendance()
            .for_date(self.selected_date)
            .await
            .into_result(FETCH_FAILED)
        {
            Ok(records) => self.records = records,
            Err(error) => warn!(%error, date = %self.selected_date, "attendance refresh failed"),
        }
    }

    fn apply(&mut self, response: ApiResponse<Vec<Attendance>>) {
        match response.into_result(FETCH_FAILED) {
            Ok(records) => {
                debug!(count = records.len(), "attendance loaded");
                self.records = records;
            }
            Err(error) => {
                warn!(%error, "attendance fetch failed");
                self.error = Some(error);
            }
        }
        self.loading = false;
    }
}
