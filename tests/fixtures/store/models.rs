use serde::{Deserialize, Serialize};

/// A registered user
#[derive(Debug, Serialize, Deserialize)]
pub struct User {
    pub id: u32,
    pub name: String,
    /// Contact address
    pub email: Option<String>,
    pub role: Role,
    pub manager: Option<Box<User>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Member,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub tags: Option<Vec<String>>,
}
