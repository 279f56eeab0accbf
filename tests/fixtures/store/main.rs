// Actix-Web test fixture - a small user store split across modules
use actix_web::{App, HttpServer};

mod models;
mod users;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    HttpServer::new(|| {
        App::new()
            .service(users::list_users)
            .service(users::get_user)
            .service(users::create_user)
            .service(users::delete_user)
    })
    .bind(("127.0.0.1", 8080))?
    .run()
    .await
}
