use std::fmt::Write;

use chrono::NaiveDate;
use tracing::debug;

use crate::api::{ApiClient, Transport};
use crate::models::{AttendanceStats, StudentAttendanceHistory};
use crate::pages::{or_missing, render_table, year_label};
use crate::validation::{sanitize_roll_number, Field, ValidationErrors};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
    pub roll_number: String,
    pub range: Option<(NaiveDate, NaiveDate)>,
}

impl ReportQuery {
    /// The range only applies when both bounds are present.
    pub fn new(roll_input: &str, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self {
            roll_number: sanitize_roll_number(roll_input),
            range: start.zip(end),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.roll_number.is_empty() {
            errors.add(Field::RollNumber, "Roll number is required");
        }
        if let Some((start, end)) = self.range {
            if start > end {
                errors.add(Field::DateRange, "Start date must not be after end date");
            }
        }
        errors.into_result()
    }
}

#[derive(Debug, Default)]
pub struct ReportsState {
    pub history: Option<StudentAttendanceHistory>,
    pub loading: bool,
    pub error: Option<String>,
}

impl ReportsState {
    pub async fn search<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        query: &ReportQuery,
    ) -> Result<(), ValidationErrors> {
        query.validate()?;

        self.loading = true;
        self.error = None;

        let response = match query.range {
            Some((start, end)) => {
                api.attendance()
                    .student_history_by_range(&query.roll_number, start, end)
                    .await
            }
            None => api.attendance().student_history(&query.roll_number).await,
        };

        match response.into_result("Failed to fetch history") {
            Ok(history) => {
                debug!(
                    roll_number = %query.roll_number,
                    records = history.attendance_records.len(),
                    "history loaded"
                );
                self.history = Some(history);
            }
            Err(error) => {
                self.error = Some(error);
                self.history = None;
            }
        }

        self.loading = false;
        Ok(())
    }
}

pub fn render_statistics(stats: &AttendanceStats) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Total Records  {}", stats.total_days);
    let _ = writeln!(output, "Present        {}", stats.present_days);
    let _ = writeln!(output, "Absent         {}", stats.absent_days);
    let _ = writeln!(output, "Percentage     {}%", stats.attendance_percentage);
    output
}

pub fn render(state: &ReportsState) -> String {
    let mut output = String::new();
    if state.loading {
        let _ = writeln!(output, "Searching...");
        return output;
    }
    if let Some(error) = &state.error {
        let _ = writeln!(output, "Error: {error}");
        return output;
    }
    let Some(history) = &state.history else {
        return output;
    };

    let student = &history.student;
    let _ = writeln!(output, "Student Information");
    let _ = writeln!(output, "Name:        {}", student.name);
    let _ = writeln!(output, "Roll Number: {}", student.roll_number);
    let _ = writeln!(output, "Email:       {}", or_missing(student.email.as_deref()));
    let _ = writeln!(output, "Department:  {}", or_missing(student.department.as_deref()));
    let _ = writeln!(output, "Year:        {}", year_label(student.year));
    let _ = writeln!(
        output,
        "Status:      {}",
        if student.active { "Active" } else { "Inactive" }
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "Attendance Statistics");
    output.push_str(&render_statistics(&history.statistics));
    let _ = writeln!(output);
    let _ = writeln!(output, "Attendance History");

    if history.attendance_records.is_empty() {
        let _ = writeln!(output, "No attendance records found.");
    } else {
        let rows: Vec<Vec<String>> = history
            .attendance_records
            .iter()
            .map(|r| vec![r.date.to_string(), r.status.label().to_string()])
            .collect();
        output.push_str(&render_table(&["Date", "Status"], &rows));
    }
    output
}
