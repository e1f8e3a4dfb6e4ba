use chrono::{NaiveDate, Utc};

use crate::models::{Attendance, AttendanceStats, AttendanceStatus};

/// `present / total * 100`, rounded to two decimals. Zero when nothing was recorded.
pub fn attendance_percentage(present: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (present as f64 / total as f64 * 10_000.0).round() / 100.0
}

pub fn count_status(records: &[Attendance], status: AttendanceStatus) -> u64 {
    records.iter().filter(|r| r.status == status).count() as u64
}

pub fn summarize(records: &[Attendance]) -> AttendanceStats {
    let present_days = count_status(records, AttendanceStatus::Present);
    let absent_days = count_status(records, AttendanceStatus::Absent);
    let total_days = records.len() as u64;

    AttendanceStats {
        total_days,
        present_days,
        absent_days,
        attendance_percentage: attendance_percentage(present_days, total_days),
    }
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(day: u32, status: AttendanceStatus) -> Attendance {
        Attendance {
            id: format!("a-{day}"),
            student_id: None,
            roll_number: "12345678".to_string(),
            student_name: "Avery Lee".to_string(),
            status,
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
        }
    }

    #[test]
    fn percentage_rounds_to_two_decimals() {
        assert_eq!(attendance_percentage(1, 3), 33.33);
        assert_eq!(attendance_percentage(2, 3), 66.67);
        assert_eq!(attendance_percentage(5, 5), 100.0);
        assert_eq!(attendance_percentage(0, 4), 0.0);
    }

    #[test]
    fn percentage_is_zero_without_records() {
        assert_eq!(attendance_percentage(0, 0), 0.0);
        assert_eq!(summarize(&[]), AttendanceStats::default());
    }

    #[test]
    fn summary_counts_by_status() {
        let records = vec![
            record(15, AttendanceStatus::Present),
            record(16, AttendanceStatus::Absent),
            record(17, AttendanceStatus::Present),
            record(18, AttendanceStatus::Present),
        ];
        let stats = summarize(&records);
        assert_eq!(stats.total_days, 4);
        assert_eq!(stats.present_days, 3);
        assert_eq!(stats.absent_days, 1);
        assert_eq!(stats.attendance_percentage, 75.0);
    }
}
