use chrono::NaiveDate;
use tracing::info;

use crate::api::{ApiClient, Transport};
use crate::models::{Attendance, AttendanceStatus, MarkAttendanceRequest};
use crate::pages::{render_table, Confirm, Flash};
use crate::stats;
use crate::store::AttendanceStore;
use crate::validation::{is_valid_roll_number, sanitize_roll_number, Field, ValidationErrors};

pub const DELETE_PROMPT: &str =
    "Are you sure you want to delete this attendance record? This action cannot be undone.";

/// Selects `date` and reloads its records. Future dates are refused.
pub async fn change_date<T: Transport>(
    api: &ApiClient<T>,
    store: &mut AttendanceStore,
    date: NaiveDate,
) -> Option<Flash> {
    if date > stats::today() {
        return Some(Flash::error(format!(
            "Cannot show attendance for {date}: the date is in the future"
        )));
    }
    store.set_selected_date(date);
    store.fetch_for_date(api, date).await;
    None
}

pub async fn mark<T: Transport>(
    api: &ApiClient<T>,
    store: &mut AttendanceStore,
    roll_input: &str,
    status: AttendanceStatus,
) -> Result<Flash, ValidationErrors> {
    let roll_number = sanitize_roll_number(roll_input);
    if roll_number.is_empty() {
        return Err(ValidationErrors::single(Field::RollNumber, "Roll number is required"));
    }
    if !is_valid_roll_number(&roll_number) {
        return Err(ValidationErrors::single(
            Field::RollNumber,
            "Roll number must be exactly 8 digits",
        ));
    }

    let request = MarkAttendanceRequest {
        roll_number,
        status,
        date: Some(store.selected_date),
    };
    match api
        .attendance()
        .mark(&request)
        .await
        .into_ack("Failed to mark attendance")
    {
        Ok(()) => {
            info!(
                roll_number = %request.roll_number,
                %status,
                date = %store.selected_date,
                "attendance marked"
            );
            store.refresh(api).await;
            Ok(Flash::success("Attendance marked successfully!"))
        }
        Err(error) => Ok(Flash::error(error)),
    }
}

fn not_listed(store: &AttendanceStore, id: &str) -> Option<Flash> {
    if store.records.iter().any(|r| r.id == id) {
        return None;
    }
    Some(Flash::error(format!(
        "Attendance record not found for {}",
        store.selected_date
    )))
}

/// Rewrites one record listed for the selected date.
pub async fn edit<T: Transport>(
    api: &ApiClient<T>,
    store: &mut AttendanceStore,
    id: &str,
    roll_input: &str,
    status: AttendanceStatus,
) -> Result<Flash, ValidationErrors> {
    if let Some(flash) = not_listed(store, id) {
        return Ok(flash);
    }

    let roll_number = roll_input.trim().to_uppercase();
    if roll_number.is_empty() {
        return Err(ValidationErrors::single(Field::RollNumber, "Roll number is required"));
    }

    let request = MarkAttendanceRequest {
        roll_number,
        status,
        date: Some(store.selected_date),
    };
    match api
        .attendance()
        .update(id, &request)
        .await
        .into_ack("Failed to update attendance")
    {
        Ok(()) => {
            info!(%id, %status, "attendance updated");
            store.refresh(api).await;
            Ok(Flash::success("Attendance updated successfully!"))
        }
        Err(error) => Ok(Flash::error(error)),
    }
}

/// Deletes one record listed for the selected date. `None` when declined.
pub async fn delete<T: Transport>(
    api: &ApiClient<T>,
    store: &mut AttendanceStore,
    id: &str,
    confirm: &mut dyn Confirm,
) -> Option<Flash> {
    if let Some(flash) = not_listed(store, id) {
        return Some(flash);
    }
    if !confirm.confirm(DELETE_PROMPT) {
        return None;
    }

    let flash = match api
        .attendance()
        .delete(id)
        .await
        .into_ack("Failed to delete attendance")
    {
        Ok(()) => {
            info!(%id, "attendance deleted");
            store.refresh(api).await;
            Flash::success("Attendance deleted successfully!")
        }
        Err(error) => Flash::error(error),
    };
    Some(flash)
}

pub fn render_records(title: &str, records: &[Attendance], empty: &str) -> String {
    let mut output = format!("{title} ({})\n", records.len());
    if records.is_empty() {
        output.push_str(empty);
        output.push('\n');
        return output;
    }

    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            vec![
                r.id.clone(),
                r.roll_number.clone(),
                r.student_name.clone(),
                r.status.label().to_string(),
                r.date.to_string(),
            ]
        })
        .collect();
    output.push_str(&render_table(&["ID", "Roll No", "Name", "Status", "Date"], &rows));

    let summary = stats::summarize(records);
    output.push_str(&format!(
        "Present: {}  Absent: {}  Rate: {}%\n",
        summary.present_days, summary.absent_days, summary.attendance_percentage
    ));
    output
}

pub fn render(store: &AttendanceStore) -> String {
    if store.loading {
        return "Loading...\n".to_string();
    }
    render_records(
        &format!("Attendance for {}", store.selected_date),
        &store.records,
        "No attendance records for this date.",
    )
}
