use tracing::info;

use crate::api::{ApiClient, Transport};
use crate::models::{CreateStudentRequest, Student, UpdateStudentRequest};
use crate::pages::{or_missing, render_table, year_label, Confirm, Flash};
use crate::store::StudentStore;
use crate::validation::{
    is_valid_email, is_valid_phone, is_valid_roll_number, sanitize_phone, sanitize_roll_number,
    Field, ValidationErrors,
};

pub const DELETE_PROMPT: &str =
    "Are you sure you want to delete this student? This action cannot be undone.";
pub const DEACTIVATE_PROMPT: &str =
    "Deactivate this student? They stay on record but no longer count as active.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentForm {
    pub name: String,
    pub roll_number: String,
    pub email: String,
    pub phone: String,
    pub department: String,
    pub year: Option<u8>,
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl StudentForm {
    /// Applies the same filtering the input fields do on every keystroke.
    pub fn sanitized(mut self) -> Self {
        self.roll_number = sanitize_roll_number(&self.roll_number);
        self.phone = sanitize_phone(&self.phone);
        self
    }

    pub fn from_student(student: &Student) -> Self {
        Self {
            name: student.name.clone(),
            roll_number: student.roll_number.clone(),
            email: student.email.clone().unwrap_or_default(),
            phone: student.phone.clone().unwrap_or_default(),
            department: student.department.clone().unwrap_or_default(),
            year: Some(student.year.unwrap_or(1)),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = self.validate_details();

        if self.roll_number.is_empty() {
            errors.add(Field::RollNumber, "Roll number is required");
        } else if !is_valid_roll_number(&self.roll_number) {
            errors.add(Field::RollNumber, "Roll number must be exactly 8 digits");
        }

        errors.into_result()
    }

    /// Every check except the roll number, which is locked once created.
    fn validate_details(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        if self.name.trim().is_empty() {
            errors.add(Field::Name, "Name is required");
        }
        if !self.email.is_empty() && !is_valid_email(&self.email) {
            errors.add(Field::Email, "Invalid email format");
        }
        if !self.phone.is_empty() && !is_valid_phone(&self.phone) {
            errors.add(Field::Phone, "Phone number must be exactly 10 digits");
        }
        if self.department.trim().is_empty() {
            errors.add(Field::Department, "Department is required");
        }
        match self.year {
            None | Some(0) => errors.add(Field::Year, "Year is required"),
            Some(1..=4) => {}
            Some(_) => errors.add(Field::Year, "Year must be between 1 and 4"),
        }

        errors
    }

    pub fn create_request(&self) -> CreateStudentRequest {
        CreateStudentRequest {
            name: self.name.trim().to_string(),
            roll_number: self.roll_number.clone(),
            email: optional(&self.email),
            phone: optional(&self.phone),
            department: optional(&self.department),
            year: self.year.unwrap_or(1),
        }
    }

    fn update_request(&self) -> UpdateStudentRequest {
        UpdateStudentRequest {
            name: Some(self.name.trim().to_string()),
            email: Some(self.email.trim().to_string()),
            phone: Some(self.phone.clone()),
            department: Some(self.department.trim().to_string()),
            year: self.year,
            active: None,
        }
    }
}

/// Fields changed by an edit; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct StudentEdits {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub year: Option<u8>,
}

impl StudentEdits {
    fn apply_to(self, form: &mut StudentForm) {
        if let Some(name) = self.name {
            form.name = name;
        }
        if let Some(email) = self.email {
            form.email = email;
        }
        if let Some(phone) = self.phone {
            form.phone = sanitize_phone(&phone);
        }
        if let Some(department) = self.department {
            form.department = department;
        }
        if self.year.is_some() {
            form.year = self.year;
        }
    }
}

pub async fn create<T: Transport>(
    api: &ApiClient<T>,
    store: &mut StudentStore,
    form: StudentForm,
) -> Result<Flash, ValidationErrors> {
    form.validate()?;

    let response = api.students().create(&form.create_request()).await;
    match response.into_ack("Failed to add student") {
        Ok(()) => {
            info!(roll_number = %form.roll_number, "student created");
            store.refresh_students(api).await;
            Ok(Flash::success("Student added successfully!"))
        }
        Err(error) => Ok(Flash::error(error)),
    }
}

/// Loads the stored record, overlays `edits`, and sends the update. The roll
/// number is never part of the request.
pub async fn edit<T: Transport>(
    api: &ApiClient<T>,
    store: &mut StudentStore,
    id: &str,
    edits: StudentEdits,
) -> Result<Flash, ValidationErrors> {
    let student = match api
        .students()
        .get_by_id(id)
        .await
        .into_result("Failed to load student")
    {
        Ok(student) => student,
        Err(error) => return Ok(Flash::error(error)),
    };

    let mut form = StudentForm::from_student(&student);
    edits.apply_to(&mut form);
    form.validate_details().into_result()?;

    let response = api.students().update(id, &form.update_request()).await;
    match response.into_ack("Failed to update student") {
        Ok(()) => {
            info!(%id, roll_number = %student.roll_number, "student updated");
            store.refresh_students(api).await;
            Ok(Flash::success("Student updated successfully!"))
        }
        Err(error) => Ok(Flash::error(error)),
    }
}

/// Hard delete. `None` when the prompt is declined.
pub async fn delete<T: Transport>(
    api: &ApiClient<T>,
    store: &mut StudentStore,
    id: &str,
    confirm: &mut dyn Confirm,
) -> Option<Flash> {
    if !confirm.confirm(DELETE_PROMPT) {
        return None;
    }

    let flash = match api
        .students()
        .delete(id)
        .await
        .into_ack("Failed to delete student")
    {
        Ok(()) => {
            info!(%id, "student deleted");
            store.refresh_students(api).await;
            Flash::success("Student deleted successfully!")
        }
        Err(error) => Flash::error(error),
    };
    Some(flash)
}

/// Soft delete: the record stays, flagged inactive.
pub async fn deactivate<T: Transport>(
    api: &ApiClient<T>,
    store: &mut StudentStore,
    id: &str,
    confirm: &mut dyn Confirm,
) -> Option<Flash> {
    if !confirm.confirm(DEACTIVATE_PROMPT) {
        return None;
    }

    let flash = match api
        .students()
        .deactivate(id)
        .await
        .into_ack("Failed to deactivate student")
    {
        Ok(()) => {
            info!(%id, "student deactivated");
            store.refresh_students(api).await;
            Flash::success("Student deactivated successfully!")
        }
        Err(error) => Flash::error(error),
    };
    Some(flash)
}

fn status_label(active: bool) -> &'static str {
    if active {
        "Active"
    } else {
        "Inactive"
    }
}

pub fn render_list(title: &str, students: &[Student]) -> String {
    let mut output = format!("{title} ({})\n", students.len());
    if students.is_empty() {
        output.push_str("No students found. Add a new student to get started.\n");
        return output;
    }

    let rows: Vec<Vec<String>> = students
        .iter()
        .map(|s| {
            vec![
                s.id.clone(),
                s.roll_number.clone(),
                s.name.clone(),
                or_missing(s.email.as_deref()).to_string(),
                or_missing(s.phone.as_deref()).to_string(),
                or_missing(s.department.as_deref()).to_string(),
                year_label(s.year).to_string(),
                status_label(s.active).to_string(),
            ]
        })
        .collect();
    output.push_str(&render_table(
        &[
            "ID",
            "Roll No",
            "Name",
            "Email",
            "Phone",
            "Department",
            "Year",
            "Status",
        ],
        &rows,
    ));
    output
}

pub fn render(store: &StudentStore) -> String {
    if store.loading {
        return "Loading...\n".to_string();
    }
    render_list("Students List", &store.students)
}

pub fn render_student(student: &Student) -> String {
    let fields = [
        ("Name", student.name.as_str()),
        ("Roll Number", student.roll_number.as_str()),
        ("Email", or_missing(student.email.as_deref())),
        ("Phone", or_missing(student.phone.as_deref())),
        ("Department", or_missing(student.department.as_deref())),
        ("Year", year_label(student.year)),
        ("Status", status_label(student.active)),
        ("ID", student.id.as_str()),
    ];
    fields
        .iter()
        .map(|(label, value)| format!("{label}: {value}\n"))
        .collect()
}
