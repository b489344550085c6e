// Route exports
pub mod matching;

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest, HttpResponse};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::models::ErrorResponse;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api/v1").configure(matching::configure));
}

/// The pre-authenticated caller.
///
/// The gateway verifies credentials and forwards the caller's id in the
/// `X-Actor-Id` header; this service performs no credential checks of its
/// own.
#[derive(Debug, Clone, Copy)]
pub struct Actor(pub Uuid);

impl FromRequest for Actor {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let actor = req
            .headers()
            .get("X-Actor-Id")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok());

        ready(match actor {
            Some(id) => Ok(Actor(id)),
            None => Err(actix_web::error::InternalError::from_response(
                "missing or malformed X-Actor-Id header",
                HttpResponse::Unauthorized().json(ErrorResponse {
                    error: "unauthorized".to_string(),
                    message: "Missing or malformed X-Actor-Id header".to_string(),
                    status_code: 401,
                }),
            )
            .into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn test_actor_extraction() {
        let id = Uuid::new_v4();
        let req = TestRequest::default()
            .insert_header(("X-Actor-Id", id.to_string()))
            .to_http_request();

        let actor = Actor::from_request(&req, &mut Payload::None).await.unwrap();
        assert_eq!(actor.0, id);
    }

    #[actix_web::test]
    async fn test_actor_rejects_garbage() {
        let req = TestRequest::default()
            .insert_header(("X-Actor-Id", "not-a-uuid"))
            .to_http_request();

        assert!(Actor::from_request(&req, &mut Payload::None).await.is_err());
    }

    #[actix_web::test]
    async fn test_actor_rejects_missing_header() {
        let req = TestRequest::default().to_http_request();
        assert!(Actor::from_request(&req, &mut Payload::None).await.is_err());
    }
}
