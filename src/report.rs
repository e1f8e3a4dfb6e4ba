use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{AttendanceStatus, StudentAttendanceHistory};
use crate::pages::{or_missing, year_label};

/// Longest run of consecutive recorded absences, in date order.
pub fn longest_absence_streak(history: &StudentAttendanceHistory) -> usize {
    let mut records: Vec<_> = history.attendance_records.iter().collect();
    records.sort_by_key(|r| r.date);

    let mut longest = 0;
    let mut current = 0;
    for record in records {
        if record.status == AttendanceStatus::Absent {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

pub fn build_report(
    history: &StudentAttendanceHistory,
    range: Option<(NaiveDate, NaiveDate)>,
    generated_on: NaiveDate,
) -> String {
    let student = &history.student;
    let stats = &history.statistics;
    let mut output = String::new();

    let _ = writeln!(output, "# Attendance Report: {}", student.name);
    let window = match range {
        Some((start, end)) => format!("records from {start} to {end}"),
        None => "all recorded days".to_string(),
    };
    let _ = writeln!(output, "Generated on {generated_on} ({window})");
    let _ = writeln!(output);

    let _ = writeln!(output, "## Student");
    let _ = writeln!(output, "- Roll number: {}", student.roll_number);
    let _ = writeln!(output, "- Email: {}", or_missing(student.email.as_deref()));
    let _ = writeln!(
        output,
        "- Department: {}",
        or_missing(student.department.as_deref())
    );
    let _ = writeln!(output, "- Year: {}", year_label(student.year));
    let _ = writeln!(
        output,
        "- Status: {}",
        if student.active { "Active" } else { "Inactive" }
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## Statistics");
    let _ = writeln!(output, "- Total records: {}", stats.total_days);
    let _ = writeln!(output, "- Present: {}", stats.present_days);
    let _ = writeln!(output, "- Absent: {}", stats.absent_days);
    let _ = writeln!(output, "- Attendance: {}%", stats.attendance_percentage);
    let streak = longest_absence_streak(history);
    if streak > 1 {
        let _ = writeln!(output, "- Longest absence streak: {streak} days");
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## History");
    if history.attendance_records.is_empty() {
        let _ = writeln!(output, "No attendance records found.");
    } else {
        let mut records = history.attendance_records.clone();
        records.sort_by(|a, b| b.date.cmp(&a.date));
        let _ = writeln!(output, "| Date | Status |");
        let _ = writeln!(output, "|------|--------|");
        for record in records.iter() {
            let _ = writeln!(output, "| {} | {} |", record.date, record.status.label());
        }
    }

    output
}
