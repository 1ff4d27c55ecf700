mod handler;

use crate::repositories::{AuthorRepository, BookRepository};
use anyhow::Context;
use axum::extract::Request;
use axum::routing::get;
use axum::{Router, ServiceExt};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::normalize_path::NormalizePath;
use tower_http::trace::TraceLayer;

pub use handler::{
    ApiError, AuthorBaseHttpResponse, AuthorHttpResponse, BookHttpResponse, ErrorHttpResponse,
};

#[derive(Debug)]
pub struct AppState<R> {
    repo: Arc<R>,
}

impl<R> AppState<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo: Arc::new(repo),
        }
    }
}

impl<R> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

#[derive(Debug)]
pub struct HttpServerConfig {
    port: u16,
}

impl HttpServerConfig {
    pub const fn new(port: u16) -> Self {
        Self { port }
    }
}

/// Router that also answers paths missing their trailing slash.
pub type App = NormalizePath<Router>;

pub struct HttpServer {
    router: App,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new<R>(state: AppState<R>, config: HttpServerConfig) -> anyhow::Result<Self>
    where
        R: AuthorRepository + BookRepository,
    {
        let router = router(state);

        let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port))
            .await
            .with_context(|| format!("Failed to bind to port {}", config.port))?;

        Ok(Self { router, listener })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let addr = self.listener.local_addr()?;
        tracing::info!(%addr, "listening");
        let service = ServiceExt::<Request>::into_make_service(self.router);
        axum::serve(self.listener, service)
            .await
            .context("Received error from running server")?;
        Ok(())
    }
}

pub fn router<R>(state: AppState<R>) -> App
where
    R: AuthorRepository + BookRepository,
{
    let router = Router::new()
        .route("/", get(handler::root))
        .merge(api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Routing happens inside, so the rewrite has to wrap the whole router.
    NormalizePath::append_trailing_slash(router)
}

fn api_routes<R>() -> Router<AppState<R>>
where
    R: AuthorRepository + BookRepository,
{
    Router::new()
        .route(
            "/authors/",
            get(handler::list_authors::<R>).post(handler::create_author::<R>),
        )
        .route("/authors/{author_id}/", get(handler::get_author::<R>))
        .route("/books/", get(handler::list_books::<R>))
        .route(
            "/books/{author_id}/",
            get(handler::list_books_for_author::<R>).post(handler::create_book_for_author::<R>),
        )
}
