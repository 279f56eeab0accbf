use crate::models::{CreateUserRequest, ListQuery, User};
use actix_web::{delete, get, post, web, HttpResponse};

/// List users
///
/// Results are paged.
#[get("/users")]
pub async fn list_users(query: web::Query<ListQuery>) -> web::Json<Vec<User>> {
    web::Json(Vec::new())
}

#[get("/users/{id}")]
pub async fn get_user(path: web::Path<u32>) -> Result<web::Json<User>, actix_web::Error> {
    Err(actix_web::error::ErrorNotFound(path.into_inner()))
}

#[post("/users")]
pub async fn create_user(payload: web::Json<CreateUserRequest>) -> HttpResponse {
    HttpResponse::Created().finish()
}

#[delete("/users/{id}")]
#[deprecated]
pub async fn delete_user(path: web::Path<u32>) -> HttpResponse {
    HttpResponse::NoContent().finish()
}
