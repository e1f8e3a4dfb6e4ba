use std::fmt::Write;

use crate::models::{Attendance, AttendanceStatus, Student};
use crate::stats;
use crate::store::{AttendanceStore, StudentStore};

/// Counts derived from collections the stores already hold.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub active_students: usize,
    pub present_today: u64,
    pub absent_today: u64,
    pub recorded_today: usize,
    pub attendance_rate: f64,
}

impl DashboardSummary {
    pub fn derive(students: &[Student], today: &[Attendance]) -> Self {
        let present_today = stats::count_status(today, AttendanceStatus::Present);
        Self {
            active_students: students.iter().filter(|s| s.active).count(),
            present_today,
            absent_today: stats::count_status(today, AttendanceStatus::Absent),
            recorded_today: today.len(),
            attendance_rate: stats::attendance_percentage(present_today, today.len() as u64),
        }
    }
}

pub fn render(students: &StudentStore, attendance: &AttendanceStore) -> String {
    let summary = DashboardSummary::derive(&students.students, &attendance.records);
    let mut output = String::new();

    let _ = writeln!(output, "Dashboard ({})", attendance.selected_date);
    for error in [&students.error, &attendance.error].into_iter().flatten() {
        let _ = writeln!(output, "! {error}");
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "Total Students   {}", summary.active_students);
    let _ = writeln!(output, "Present Today    {}", summary.present_today);
    let _ = writeln!(output, "Absent Today     {}", summary.absent_today);
    let _ = writeln!(output, "Attendance Rate  {}%", summary.attendance_rate);
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Today's attendance has been recorded for {} students.",
        summary.recorded_today
    );

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn student(roll: &str, active: bool) -> Student {
        Student {
            id: format!("s-{roll}"),
            name: format!("Student {roll}"),
            roll_number: roll.to_string(),
            email: None,
            phone: None,
            department: None,
            year: Some(1),
            active,
        }
    }

    fn record(roll: &str, status: AttendanceStatus) -> Attendance {
        Attendance {
            id: format!("a-{roll}"),
            student_id: None,
            roll_number: roll.to_string(),
            student_name: format!("Student {roll}"),
            status,
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        }
    }

    #[test]
    fn counts_only_active_students() {
        let students = vec![
            student("11111111", true),
            student("22222222", false),
            student("33333333", true),
        ];
        let today = vec![
            record("11111111", AttendanceStatus::Present),
            record("22222222", AttendanceStatus::Absent),
            record("33333333", AttendanceStatus::Present),
        ];

        let summary = DashboardSummary::derive(&students, &today);
        assert_eq!(
            summary,
            DashboardSummary {
                active_students: 2,
                present_today: 2,
                absent_today: 1,
                recorded_today: 3,
                attendance_rate: 66.67,
            }
        );
    }

    #[test]
    fn empty_day_has_zero_rate() {
        let summary = DashboardSummary::derive(&[student("11111111", true)], &[]);
        assert_eq!(summary.attendance_rate, 0.0);
        assert_eq!(summary.recorded_today, 0);
    }

    #[test]
    fn render_shows_fetch_errors_as_banner() {
        let mut students = StudentStore::default();
        students.error = Some("Failed to fetch students".to_string());
        let attendance = AttendanceStore::for_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());

        let text = render(&students, &attendance);
        assert!(text.starts_with("Dashboard (2024-01-15)\n! Failed to fetch students\n"));
        assert!(text.contains("Total Students   0\n"));
        assert!(text.contains("Attendance Rate  0%\n"));
    }
}
