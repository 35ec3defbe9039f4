use async_trait::async_trait;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common_auth::pipeline::{Endpoint, Request, RequestContext};

/// Terminal endpoint behind the gates; greets the authenticated subject.
#[derive(Debug, Clone, Copy, Default)]
pub struct Greeting;

#[async_trait]
impl Endpoint for Greeting {
    async fn call(&self, _request: Request, context: RequestContext) -> Response {
        match context.identity() {
            Some(identity) => (
                [(CONTENT_TYPE, "text/plain")],
                format!("Hello {}!", identity.subject()),
            )
                .into_response(),
            // Only reachable when mounted without an access gate in front.
            None => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use common_auth::Identity;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn greets_the_subject() {
        let mut context = RequestContext::default();
        context.set_identity(Identity::new("admin"));

        let response = Greeting.call(Request::new(Body::empty()), context).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");

        let body = response.into_body().collect().await.expect("body").to_bytes();
        assert_eq!(&body[..], b"Hello admin!");
    }

    #[tokio::test]
    async fn anonymous_context_is_unauthorized() {
        let response = Greeting
            .call(Request::new(Body::empty()), RequestContext::default())
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
