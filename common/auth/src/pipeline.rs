//! Ordered request pipeline, independent of the router that hosts it.
//!
//! Each [`Stage`] receives the request, the per-request [`RequestContext`] and
//! a [`Next`] handle. Calling [`Next::run`] hands control to the following
//! stage or, once the stages are exhausted, to the terminal [`Endpoint`]. A
//! stage short-circuits by returning a response without running `next`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::claims::Identity;

pub type Request = axum::extract::Request;
pub type Response = axum::response::Response;

/// State that travels with a single request through the pipeline.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    identity: Option<Identity>,
}

impl RequestContext {
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn set_identity(&mut self, identity: Identity) {
        self.identity = Some(identity);
    }
}

#[async_trait]
pub trait Stage: Send + Sync {
    async fn handle(&self, request: Request, context: RequestContext, next: Next<'_>) -> Response;
}

#[async_trait]
pub trait Endpoint: Send + Sync {
    async fn call(&self, request: Request, context: RequestContext) -> Response;
}

/// The remainder of the pipeline after the current stage.
pub struct Next<'a> {
    stages: &'a [Box<dyn Stage>],
    endpoint: &'a dyn Endpoint,
}

impl<'a> Next<'a> {
    pub async fn run(self, request: Request, context: RequestContext) -> Response {
        match self.stages.split_first() {
            Some((stage, rest)) => {
                let next = Next {
                    stages: rest,
                    endpoint: self.endpoint,
                };
                stage.handle(request, context, next).await
            }
            None => self.endpoint.call(request, context).await,
        }
    }
}

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    endpoint: Arc<dyn Endpoint>,
}

impl Pipeline {
    pub fn new(endpoint: Arc<dyn Endpoint>) -> Self {
        Self {
            stages: Vec::new(),
            endpoint,
        }
    }

    /// Appends a stage; stages run in the order they are added.
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub async fn run(&self, request: Request) -> Response {
        let next = Next {
            stages: &self.stages,
            endpoint: self.endpoint.as_ref(),
        };
        next.run(request, RequestContext::default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use http_body_util::BodyExt;
    use std::sync::Mutex;

    struct Record {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Stage for Record {
        async fn handle(
            &self,
            request: Request,
            context: RequestContext,
            next: Next<'_>,
        ) -> Response {
            self.log.lock().expect("log").push(self.name);
            next.run(request, context).await
        }
    }

    struct Stop;

    #[async_trait]
    impl Stage for Stop {
        async fn handle(&self, _: Request, _: RequestContext, _: Next<'_>) -> Response {
            StatusCode::FORBIDDEN.into_response()
        }
    }

    struct Authenticate;

    #[async_trait]
    impl Stage for Authenticate {
        async fn handle(
            &self,
            request: Request,
            mut context: RequestContext,
            next: Next<'_>,
        ) -> Response {
            context.set_identity(Identity::new("alice"));
            next.run(request, context).await
        }
    }

    struct Echo {
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Endpoint for Echo {
        async fn call(&self, _: Request, context: RequestContext) -> Response {
            self.log.lock().expect("log").push("endpoint");
            let subject = context
                .identity()
                .map(|identity| identity.subject().to_string())
                .unwrap_or_else(|| "anonymous".to_string());
            subject.into_response()
        }
    }

    fn request() -> Request {
        Request::new(Body::empty())
    }

    async fn body_text(response: Response) -> String {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        String::from_utf8(bytes.to_vec()).expect("utf8")
    }

    #[tokio::test]
    async fn stages_run_in_order_before_endpoint() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new(Arc::new(Echo { log: log.clone() }))
            .stage(Record {
                name: "first",
                log: log.clone(),
            })
            .stage(Record {
                name: "second",
                log: log.clone(),
            });

        let response = pipeline.run(request()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "anonymous");
        assert_eq!(*log.lock().expect("log"), vec!["first", "second", "endpoint"]);
    }

    #[tokio::test]
    async fn short_circuit_skips_downstream() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new(Arc::new(Echo { log: log.clone() }))
            .stage(Stop)
            .stage(Record {
                name: "after",
                log: log.clone(),
            });

        let response = pipeline.run(request()).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(log.lock().expect("log").is_empty());
    }

    #[tokio::test]
    async fn context_changes_reach_the_endpoint() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new(Arc::new(Echo { log })).stage(Authenticate);
        assert_eq!(pipeline.len(), 1);

        let response = pipeline.run(request()).await;
        assert_eq!(body_text(response).await, "alice");
    }

    #[tokio::test]
    async fn empty_pipeline_calls_endpoint_directly() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new(Arc::new(Echo { log: log.clone() }));
        assert!(pipeline.is_empty());

        pipeline.run(request()).await;
        assert_eq!(*log.lock().expect("log"), vec!["endpoint"]);
    }
}
