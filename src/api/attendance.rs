use chrono::NaiveDate;

use crate::api::{ApiClient, Endpoint, Transport};
use crate::models::{
    ApiResponse, Attendance, AttendanceStats, AttendanceStatus, MarkAttendanceRequest,
    StudentAttendanceHistory,
};

pub struct AttendanceApi<'a, T> {
    client: &'a ApiClient<T>,
}

fn date_param(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

impl<'a, T: Transport> AttendanceApi<'a, T> {
    pub fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    fn root() -> Endpoint {
        Endpoint::new("attendance")
    }

    fn ranged(endpoint: Endpoint, start: NaiveDate, end: NaiveDate) -> Endpoint {
        endpoint
            .query("startDate", date_param(start))
            .query("endDate", date_param(end))
    }

    fn student(roll_number: &str) -> Endpoint {
        Self::root().segment("student").segment(roll_number)
    }

    pub async fn mark(&self, request: &MarkAttendanceRequest) -> ApiResponse<Attendance> {
        self.client.post(Self::root().segment("mark"), request).await
    }

    pub async fn update(
        &self,
        id: &str,
        request: &MarkAttendanceRequest,
    ) -> ApiResponse<Attendance> {
        self.client.put(Self::root().segment(id), request).await
    }

    pub async fn delete(&self, id: &str) -> ApiResponse<()> {
        self.client.delete(Self::root().segment(id)).await
    }

    pub async fn today(&self) -> ApiResponse<Vec<Attendance>> {
        self.client.get(Self::root().segment("today")).await
    }

    pub async fn for_date(&self, date: NaiveDate) -> ApiResponse<Vec<Attendance>> {
        self.client
            .get(Self::root().segment("date").segment(date_param(date)))
            .await
    }

    pub async fn by_range(&self, start: NaiveDate, end: NaiveDate) -> ApiResponse<Vec<Attendance>> {
        self.client
            .get(Self::ranged(Self::root().segment("range"), start, end))
            .await
    }

    pub async fn student_history(&self, roll_number: &str) -> ApiResponse<StudentAttendanceHistory> {
        self.client.get(Self::student(roll_number)).await
    }

    pub async fn student_history_by_range(
        &self,
        roll_number: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ApiResponse<StudentAttendanceHistory> {
        self.client
            .get(Self::ranged(
                Self::student(roll_number).segment("range"),
                start,
                end,
            ))
            .await
    }

    pub async fn student_stats(&self, roll_number: &str) -> ApiResponse<AttendanceStats> {
        self.client
            .get(Self::student(roll_number).segment("stats"))
            .await
    }

    pub async fn student_stats_by_range(
        &self,
        roll_number: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ApiResponse<AttendanceStats> {
        self.client
            .get(Self::ranged(
                Self::student(roll_number).segment("stats").segment("range"),
                start,
                end,
            ))
            .await
    }

    pub async fn by_status(
        &self,
        status: AttendanceStatus,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ApiResponse<Vec<Attendance>> {
        self.client
            .get(Self::ranged(
                Self::root().segment("status").segment(status.as_str()),
                start,
                end,
            ))
            .await
    }
}
