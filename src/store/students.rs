use tracing::{debug, warn};

use crate::api::{ApiClient, Transport};
use crate::models::Student;

pub const FETCH_FAILED: &str = "Failed to fetch students";

#[derive(Debug, Default)]
pub struct StudentStore {
    pub students: Vec<Student>,
    pub loading: bool,
    pub error: Option<String>,
    pub active_only: bool,
}

impl StudentStore {
    pub fn new(active_only: bool) -> Self {
        Self {
            active_only,
            ..Self::default()
        }
    }

    pub async fn fetch_students<T: Transport>(&mut self, api: &ApiClient<T>) {
        self.loading = true;
        self.error = None;

        match api.students().list(self.active_only).await.into_result(FETCH_FAILED) {
            Ok(students) => {
                debug!(count = students.len(), "students loaded");
                self.students = students;
            }
            Err(error) => {
                warn!(%error, "student fetch failed");
                self.error = Some(error);
            }
        }

        self.loading = false;
    }

    /// Re-runs the last fetch without raising `loading`. A failed refresh
    /// keeps the collection already on screen.
    pub async fn refresh_students<T: Transport>(&mut self, api: &ApiClient<T>) {
        match api.students().list(self.active_only).await.into_result(FETCH_FAILED) {
            Ok(students) => self.students = students,
            Err(error) => warn!(%error, "student refresh failed"),
        }
    }
}
