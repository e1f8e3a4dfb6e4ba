//! In-memory stand-in for the attendance REST service.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::api::{HttpRequest, HttpResponse, Method, Transport, TransportError};
use crate::models::{
    Attendance, AttendanceStatus, CreateStudentRequest, MarkAttendanceRequest, Student,
    StudentAttendanceHistory, UpdateStudentRequest,
};
use crate::pages::Confirm;
use crate::stats;

#[derive(Default)]
struct State {
    students: Vec<Student>,
    attendance: Vec<Attendance>,
    next_id: u64,
    calls: Vec<(Method, String)>,
    queued: VecDeque<HttpResponse>,
    offline: bool,
}

pub struct FakeBackend {
    state: Mutex<State>,
}

fn ok<T: Serialize>(status: u16, data: T) -> HttpResponse {
    HttpResponse {
        status,
        body: json!({ "success": true, "message": "ok", "data": data }).to_string(),
    }
}

fn fail(status: u16, message: &str) -> HttpResponse {
    HttpResponse {
        status,
        body: json!({ "success": false, "message": message }).to_string(),
    }
}

fn body<T: DeserializeOwned>(request: &HttpRequest) -> Result<T, HttpResponse> {
    let value = request.body.clone().unwrap_or(serde_json::Value::Null);
    serde_json::from_value(value).map_err(|err| fail(400, &format!("Malformed request: {err}")))
}

fn query_value<'a>(request: &'a HttpRequest, key: &str) -> Option<&'a str> {
    request
        .endpoint
        .query_pairs()
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn date_query(request: &HttpRequest, key: &str) -> Result<NaiveDate, HttpResponse> {
    query_value(request, key)
        .and_then(|value| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok())
        .ok_or_else(|| fail(400, &format!("Missing or invalid {key}")))
}

fn parse_date(value: &str) -> Result<NaiveDate, HttpResponse> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| fail(400, "Invalid date"))
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn student_by_roll(&self, roll_number: &str) -> Result<Student, HttpResponse> {
        self.students
            .iter()
            .find(|s| s.roll_number == roll_number)
            .cloned()
            .ok_or_else(|| {
                fail(
                    404,
                    &format!("Student not found with rollNumber : '{roll_number}'"),
                )
            })
    }

    fn records_for(&self, roll_number: &str, range: Option<(NaiveDate, NaiveDate)>) -> Vec<Attendance> {
        let mut records: Vec<Attendance> = self
            .attendance
            .iter()
            .filter(|a| a.roll_number == roll_number)
            .filter(|a| range.map_or(true, |(start, end)| a.date >= start && a.date <= end))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date));
        records
    }

    fn in_range(&self, start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = &Attendance> {
        self.attendance
            .iter()
            .filter(move |a| a.date >= start && a.date <= end)
    }

    fn route(&mut self, request: &HttpRequest) -> Result<HttpResponse, HttpResponse> {
        let segments: Vec<&str> = request
            .endpoint
            .segments()
            .iter()
            .map(String::as_str)
            .collect();

        let response = match (request.method, segments.as_slice()) {
            (Method::Get, ["students"]) => {
                let active_only = query_value(request, "activeOnly") == Some("true");
                let students: Vec<&Student> = self
                    .students
                    .iter()
                    .filter(|s| !active_only || s.active)
                    .collect();
                ok(200, students)
            }
            (Method::Get, ["students", "stats", "count"]) => {
                ok(200, self.students.iter().filter(|s| s.active).count())
            }
            (Method::Get, ["students", "search"]) => {
                let needle = query_value(request, "name")
                    .unwrap_or_default()
                    .to_lowercase();
                let students: Vec<&Student> = self
                    .students
                    .iter()
                    .filter(|s| s.name.to_lowercase().contains(&needle))
                    .collect();
                ok(200, students)
            }
            (Method::Get, ["students", "roll", roll]) => ok(200, self.student_by_roll(roll)?),
            (Method::Get, ["students", "department", department]) => {
                let students: Vec<&Student> = self
                    .students
                    .iter()
                    .filter(|s| {
                        s.department
                            .as_deref()
                            .is_some_and(|d| d.eq_ignore_ascii_case(department))
                    })
                    .collect();
                ok(200, students)
            }
            (Method::Get, ["students", id]) => match self.students.iter().find(|s| s.id == *id) {
                Some(student) => ok(200, student),
                None => fail(404, "Student not found"),
            },
            (Method::Post, ["students"]) => {
                let create: CreateStudentRequest = body(request)?;
                if self.students.iter().any(|s| s.roll_number == create.roll_number) {
                    return Err(fail(
                        409,
                        &format!("Student already exists with rollNumber : '{}'", create.roll_number),
                    ));
                }
                let student = Student {
                    id: self.next_id("s"),
                    name: create.name,
                    roll_number: create.roll_number,
                    email: create.email,
                    phone: create.phone,
                    department: create.department,
                    year: Some(create.year),
                    active: true,
                };
                self.students.push(student.clone());
                ok(201, student)
            }
            (Method::Put, ["students", id]) => {
                let update: UpdateStudentRequest = body(request)?;
                let Some(student) = self.students.iter_mut().find(|s| s.id == *id) else {
                    return Err(fail(404, "Student not found"));
                };
                if let Some(name) = update.name {
                    student.name = name;
                }
                if update.email.is_some() {
                    student.email = update.email;
                }
                if update.phone.is_some() {
                    student.phone = update.phone;
                }
                if update.department.is_some() {
                    student.department = update.department;
                }
                if update.year.is_some() {
                    student.year = update.year;
                }
                if let Some(active) = update.active {
                    student.active = active;
                }
                ok(200, student.clone())
            }
            (Method::Delete, ["students", id]) => {
                let before = self.students.len();
                self.students.retain(|s| s.id != *id);
                if self.students.len() == before {
                    fail(404, "Student not found")
                } else {
                    ok(200, serde_json::Value::Null)
                }
            }
            (Method::Patch, ["students", id, "deactivate"]) => {
                match self.students.iter_mut().find(|s| s.id == *id) {
                    Some(student) => {
                        student.active = false;
                        ok(200, serde_json::Value::Null)
                    }
                    None => fail(404, "Student not found"),
                }
            }
            (Method::Post, ["attendance", "mark"]) => {
                let mark: MarkAttendanceRequest = body(request)?;
                let student = self.student_by_roll(&mark.roll_number)?;
                let date = mark.date.unwrap_or_else(stats::today);
                if let Some(existing) = self
                    .attendance
                    .iter_mut()
                    .find(|a| a.roll_number == student.roll_number && a.date == date)
                {
                    existing.status = mark.status;
                    return Ok(ok(201, existing.clone()));
                }
                let record = Attendance {
                    id: self.next_id("a"),
                    student_id: Some(student.id.clone()),
                    roll_number: student.roll_number,
                    student_name: student.name,
                    status: mark.status,
                    date,
                };
                self.attendance.push(record.clone());
                ok(201, record)
            }
            (Method::Put, ["attendance", id]) => {
                let mark: MarkAttendanceRequest = body(request)?;
                let student = self.student_by_roll(&mark.roll_number)?;
                let Some(record) = self.attendance.iter_mut().find(|a| a.id == *id) else {
                    return Err(fail(404, "Attendance not found"));
                };
                record.student_id = Some(student.id);
                record.roll_number = student.roll_number;
                record.student_name = student.name;
                record.status = mark.status;
                if let Some(date) = mark.date {
                    record.date = date;
                }
                ok(200, record.clone())
            }
            (Method::Delete, ["attendance", id]) => {
                let before = self.attendance.len();
                self.attendance.retain(|a| a.id != *id);
                if self.attendance.len() == before {
                    fail(404, "Attendance not found")
                } else {
                    ok(200, serde_json::Value::Null)
                }
            }
            (Method::Get, ["attendance", "today"]) => {
                let today = stats::today();
                let records: Vec<&Attendance> = self.in_range(today, today).collect();
                ok(200, records)
            }
            (Method::Get, ["attendance", "date", date]) => {
                let date = parse_date(date)?;
                let records: Vec<&Attendance> = self.in_range(date, date).collect();
                ok(200, records)
            }
            (Method::Get, ["attendance", "range"]) => {
                let start = date_query(request, "startDate")?;
                let end = date_query(request, "endDate")?;
                let records: Vec<&Attendance> = self.in_range(start, end).collect();
                ok(200, records)
            }
            (Method::Get, ["attendance", "status", status]) => {
                let status: AttendanceStatus =
                    status.parse().map_err(|err: String| fail(400, &err))?;
                let start = date_query(request, "startDate")?;
                let end = date_query(request, "endDate")?;
                let records: Vec<&Attendance> =
                    self.in_range(start, end).filter(|a| a.status == status).collect();
                ok(200, records)
            }
            (Method::Get, ["attendance", "student", roll]) => {
                let student = self.student_by_roll(roll)?;
                let records = self.records_for(roll, None);
                ok(200, history(student, records))
            }
            (Method::Get, ["attendance", "student", roll, "range"]) => {
                let student = self.student_by_roll(roll)?;
                let range = (date_query(request, "startDate")?, date_query(request, "endDate")?);
                let records = self.records_for(roll, Some(range));
                ok(200, history(student, records))
            }
            (Method::Get, ["attendance", "student", roll, "stats"]) => {
                self.student_by_roll(roll)?;
                ok(200, stats::summarize(&self.records_for(roll, None)))
            }
            (Method::Get, ["attendance", "student", roll, "stats", "range"]) => {
                self.student_by_roll(roll)?;
                let range = (date_query(request, "startDate")?, date_query(request, "endDate")?);
                ok(200, stats::summarize(&self.records_for(roll, Some(range))))
            }
            _ => fail(404, "No handler for request"),
        };
        Ok(response)
    }
}

fn history(student: Student, records: Vec<Attendance>) -> StudentAttendanceHistory {
    StudentAttendanceHistory {
        statistics: stats::summarize(&records),
        student,
        attendance_records: records,
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    pub fn seed_student(&self, roll_number: &str, name: &str, active: bool) -> Student {
        let mut state = self.state.lock().unwrap();
        let student = Student {
            id: state.next_id("s"),
            name: name.to_string(),
            roll_number: roll_number.to_string(),
            email: None,
            phone: None,
            department: Some("Physics".to_string()),
            year: Some(1),
            active,
        };
        state.students.push(student.clone());
        student
    }

    pub fn seed_attendance(
        &self,
        roll_number: &str,
        status: AttendanceStatus,
        date: NaiveDate,
    ) -> Attendance {
        let mut state = self.state.lock().unwrap();
        let student = state.student_by_roll(roll_number).expect("seeded student");
        let record = Attendance {
            id: state.next_id("a"),
            student_id: Some(student.id),
            roll_number: student.roll_number,
            student_name: student.name,
            status,
            date,
        };
        state.attendance.push(record.clone());
        record
    }

    /// Answer the next request with this response instead of routing it.
    pub fn queue_response(&self, status: u16, body: &str) {
        self.state.lock().unwrap().queued.push_back(HttpResponse {
            status,
            body: body.to_string(),
        });
    }

    pub fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    pub fn calls(&self) -> Vec<(Method, String)> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count_calls(&self, method: Method, path: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(m, p)| *m == method && p == path)
            .count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn students(&self) -> Vec<Student> {
        self.state.lock().unwrap().students.clone()
    }

    pub fn attendance(&self) -> Vec<Attendance> {
        self.state.lock().unwrap().attendance.clone()
    }
}

impl Transport for FakeBackend {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((request.method, request.endpoint.to_string()));
        if state.offline {
            return Err(TransportError::Connect("connection refused".to_string()));
        }
        if let Some(response) = state.queued.pop_front() {
            return Ok(response);
        }
        Ok(state.route(&request).unwrap_or_else(|rejected| rejected))
    }
}

/// Gives a fixed answer and remembers every prompt shown.
pub struct ScriptedConfirm {
    answer: bool,
    pub prompts: Vec<String>,
}

impl ScriptedConfirm {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            prompts: Vec::new(),
        }
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        self.prompts.push(prompt.to_string());
        self.answer
    }
}
