use std::{
    future::Future,
    net::SocketAddr,
    pin::Pin,
    task::{Context, Poll},
};

use axum::{
    extract::ConnectInfo,
    http::{Request, Response, Version},
};
use futures_util::ready;
use pin_project_lite::pin_project;
use tokio::time::Instant;
use tower::{Layer, Service};
use yansi::Paint;

/// Logs one line per request once the response is ready.
#[derive(Clone)]
pub struct TraceLayer;

impl<S> Layer<S> for TraceLayer {
    type Service = TraceMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TraceMiddleware { inner }
    }
}

#[derive(Clone)]
pub struct TraceMiddleware<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for TraceMiddleware<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = TraceFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let start = Instant::now();
        let client = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string())
            .unwrap_or_else(|| String::from("-"));
        let request_line = format!(
            "{} {} {}",
            req.method(),
            req.uri().path(),
            version_str(req.version())
        );
        let response_future = self.inner.call(req);
        TraceFuture {
            response_future,
            client,
            request_line,
            start,
        }
    }
}

fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_2 => "HTTP/2",
        Version::HTTP_3 => "HTTP/3",
        _ => "HTTP/1.1",
    }
}

pin_project! {
    pub struct TraceFuture<F> {
        #[pin]
        response_future: F,
        start: Instant,
        client: String,
        request_line: String,
    }
}

impl<F, ResBody, E> Future for TraceFuture<F>
where
    F: Future<Output = Result<Response<ResBody>, E>>,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let res = ready!(this.response_future.poll(cx)?);
        let status = res.status();
        let status = match status.as_u16() {
            100..=199 => status.blue(),
            200..=299 => status.green(),
            300..=399 => status.cyan(),
            400..=499 => status.yellow(),
            _ => status.red(),
        };
        info!(
            client = %this.client,
            request = ?this.request_line.green(),
            status = ?status,
            elapsed = ?this.start.elapsed().rgb(248, 200, 220)
        );
        Poll::Ready(Ok(res))
    }
}
