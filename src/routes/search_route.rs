use actix_web::{post, web, HttpResponse};

use crate::{domain::query::Query, services::SearchPipeline};

#[post("/store")]
async fn find_stores(
    pipeline: web::Data<SearchPipeline>,
    body: web::Json<Vec<Query>>,
) -> HttpResponse {
    // One seed plus at least one confirmation query.
    if body.len() <= 1 {
        return HttpResponse::BadRequest().body("Queries length must be greater than 1");
    }

    let stores = pipeline.find_in_stores(&body).await;

    HttpResponse::Ok().json(stores)
}
