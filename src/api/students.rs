use crate::api::{ApiClient, Endpoint, Transport};
use crate::models::{ApiResponse, CreateStudentRequest, Student, UpdateStudentRequest};

pub struct StudentsApi<'a, T> {
    client: &'a ApiClient<T>,
}

impl<'a, T: Transport> StudentsApi<'a, T> {
    pub fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    fn root() -> Endpoint {
        Endpoint::new("students")
    }

    pub async fn list(&self, active_only: bool) -> ApiResponse<Vec<Student>> {
        let endpoint = if active_only {
            Self::root().query("activeOnly", "true")
        } else {
            Self::root()
        };
        self.client.get(endpoint).await
    }

    pub async fn get_by_id(&self, id: &str) -> ApiResponse<Student> {
        self.client.get(Self::root().segment(id)).await
    }

    pub async fn get_by_roll_number(&self, roll_number: &str) -> ApiResponse<Student> {
        self.client
            .get(Self::root().segment("roll").segment(roll_number))
            .await
    }

    pub async fn search(&self, name: &str) -> ApiResponse<Vec<Student>> {
        self.client
            .get(Self::root().segment("search").query("name", name))
            .await
    }

    pub async fn by_department(&self, department: &str) -> ApiResponse<Vec<Student>> {
        self.client
            .get(Self::root().segment("department").segment(department))
            .await
    }

    pub async fn create(&self, request: &CreateStudentRequest) -> ApiResponse<Student> {
        self.client.post(Self::root(), request).await
    }

    pub async fn update(&self, id: &str, request: &UpdateStudentRequest) -> ApiResponse<Student> {
        self.client.put(Self::root().segment(id), request).await
    }

    pub async fn delete(&self, id: &str) -> ApiResponse<()> {
        self.client.delete(Self::root().segment(id)).await
    }

    pub async fn deactivate(&self, id: &str) -> ApiResponse<()> {
        self.client
            .patch(Self::root().segment(id).segment("deactivate"))
            .await
    }

    pub async fn active_count(&self) -> ApiResponse<u64> {
        self.client
            .get(Self::root().segment("stats").segment("count"))
            .await
    }
}
