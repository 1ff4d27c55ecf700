use crate::http::AppState;
use crate::models::{
    Author, AuthorName, AuthorNameEmptyError, Book, BookTitle, BookTitleEmptyError,
    CreateAuthorError, CreateAuthorRequest, CreateBookError, CreateBookRequest,
    FindAllAuthorsError, FindAllBooksError, FindAuthorByNameError, FindAuthorError,
    FindAuthorRequest, FindBooksByAuthorError, Pagination,
};
use crate::repositories::{AuthorRepository, BookRepository};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};

const AUTHOR_EXISTS: &str = "Author already exists";
const AUTHOR_NOT_FOUND: &str = "Author not found";
const BOOKS_NOT_FOUND: &str = "Books not found";

#[derive(Debug)]
pub struct ApiSuccess<T: Serialize>(StatusCode, Json<T>);

impl<T: Serialize> ApiSuccess<T> {
    pub const fn new(status: StatusCode, data: T) -> Self {
        Self(status, Json(data))
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> axum::response::Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorHttpResponse {
    pub detail: String,
}

#[derive(Debug)]
pub enum ApiError {
    InternalServerError(String),
    BadRequest(String),
    NotFound(String),
    UnprocessableEntity(String),
}

impl ApiError {
    fn internal(cause: &anyhow::Error) -> Self {
        tracing::error!(error = ?cause, "request failed");
        Self::InternalServerError("Internal server error".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, detail) = match self {
            Self::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
        };
        (status, Json(ErrorHttpResponse { detail })).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::UnprocessableEntity(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::UnprocessableEntity(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::UnprocessableEntity(rejection.body_text())
    }
}

impl From<AuthorNameEmptyError> for ApiError {
    fn from(err: AuthorNameEmptyError) -> Self {
        Self::UnprocessableEntity(err.to_string())
    }
}

impl From<BookTitleEmptyError> for ApiError {
    fn from(err: BookTitleEmptyError) -> Self {
        Self::UnprocessableEntity(err.to_string())
    }
}

impl From<CreateAuthorError> for ApiError {
    fn from(err: CreateAuthorError) -> Self {
        match err {
            CreateAuthorError::Duplicate { name } => {
                tracing::debug!(%name, "author name already taken");
                Self::BadRequest(AUTHOR_EXISTS.to_string())
            }
            CreateAuthorError::Other(cause) => Self::internal(&cause),
        }
    }
}

impl From<FindAuthorError> for ApiError {
    fn from(err: FindAuthorError) -> Self {
        match err {
            FindAuthorError::NotFound { .. } => Self::NotFound(AUTHOR_NOT_FOUND.to_string()),
            FindAuthorError::Other(cause) => Self::internal(&cause),
        }
    }
}

impl From<FindAuthorByNameError> for ApiError {
    fn from(err: FindAuthorByNameError) -> Self {
        Self::internal(&err.0)
    }
}

impl From<FindAllAuthorsError> for ApiError {
    fn from(err: FindAllAuthorsError) -> Self {
        Self::internal(&err.0)
    }
}

impl From<CreateBookError> for ApiError {
    fn from(err: CreateBookError) -> Self {
        match err {
            CreateBookError::AuthorNotFound { .. } => Self::NotFound(AUTHOR_NOT_FOUND.to_string()),
            CreateBookError::Other(cause) => Self::internal(&cause),
        }
    }
}

impl From<FindAllBooksError> for ApiError {
    fn from(err: FindAllBooksError) -> Self {
        Self::internal(&err.0)
    }
}

impl From<FindBooksByAuthorError> for ApiError {
    fn from(err: FindBooksByAuthorError) -> Self {
        Self::internal(&err.0)
    }
}

#[derive(Debug, Deserialize)]
pub struct PaginationHttpQuery {
    #[serde(default)]
    skip: u32,
    #[serde(default = "default_limit")]
    limit: u32,
}

const fn default_limit() -> u32 {
    Pagination::DEFAULT_LIMIT
}

impl From<PaginationHttpQuery> for Pagination {
    fn from(value: PaginationHttpQuery) -> Self {
        Self::new(value.skip, value.limit)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAuthorHttpRequest {
    name: String,
}

impl TryFrom<CreateAuthorHttpRequest> for CreateAuthorRequest {
    type Error = AuthorNameEmptyError;

    fn try_from(value: CreateAuthorHttpRequest) -> Result<Self, Self::Error> {
        let name = AuthorName::new(&value.name)?;
        Ok(Self::new(name))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorHttpResponse {
    pub id: i64,
    pub name: String,
}

impl From<Author> for AuthorHttpResponse {
    fn from(value: Author) -> Self {
        Self {
            id: value.id(),
            name: value.name().to_string(),
        }
    }
}

/// Author without its id, as returned by the single-author lookup.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorBaseHttpResponse {
    pub name: String,
}

impl From<Author> for AuthorBaseHttpResponse {
    fn from(value: Author) -> Self {
        Self {
            name: value.name().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateBookHttpRequest {
    title: String,
    #[serde(default)]
    description: Option<String>,
}

impl CreateBookHttpRequest {
    fn into_domain(self, author_id: i64) -> Result<CreateBookRequest, BookTitleEmptyError> {
        let title = BookTitle::new(&self.title)?;
        Ok(CreateBookRequest::new(author_id, title, self.description))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookHttpResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub author_id: i64,
}

impl From<Book> for BookHttpResponse {
    fn from(value: Book) -> Self {
        Self {
            id: value.id(),
            title: value.title().to_string(),
            description: value.description().map(str::to_string),
            author_id: value.author_id(),
        }
    }
}

fn into_http<T, U: From<T>>(items: Vec<T>) -> Vec<U> {
    items.into_iter().map(U::from).collect()
}

pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "Hello11": "World11" }))
}

pub async fn list_authors<R: AuthorRepository>(
    State(state): State<AppState<R>>,
    WithRejection(Query(query), _): WithRejection<Query<PaginationHttpQuery>, ApiError>,
) -> Result<ApiSuccess<Vec<AuthorHttpResponse>>, ApiError> {
    state
        .repo
        .get_all_authors(query.into())
        .await
        .map_err(ApiError::from)
        .map(|authors| ApiSuccess::new(StatusCode::OK, into_http(authors)))
}

/// The name pre-check keeps the common case off the insert path; the unique
/// index still settles concurrent creations.
pub async fn create_author<R: AuthorRepository>(
    State(state): State<AppState<R>>,
    WithRejection(Json(body), _): WithRejection<Json<CreateAuthorHttpRequest>, ApiError>,
) -> Result<ApiSuccess<AuthorHttpResponse>, ApiError> {
    let req: CreateAuthorRequest = body.try_into()?;

    if state.repo.get_author_by_name(req.name()).await?.is_some() {
        return Err(ApiError::BadRequest(AUTHOR_EXISTS.to_string()));
    }

    let author = state.repo.create_author(&req).await?;
    tracing::info!(id = author.id(), name = %author.name(), "created author");
    Ok(ApiSuccess::new(StatusCode::CREATED, author.into()))
}

pub async fn get_author<R: AuthorRepository>(
    State(state): State<AppState<R>>,
    WithRejection(Path(author_id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<ApiSuccess<AuthorBaseHttpResponse>, ApiError> {
    state
        .repo
        .get_author_by_id(&FindAuthorRequest::new(author_id))
        .await
        .map_err(ApiError::from)
        .map(|author| ApiSuccess::new(StatusCode::OK, author.into()))
}

pub async fn list_books<R: BookRepository>(
    State(state): State<AppState<R>>,
    WithRejection(Query(query), _): WithRejection<Query<PaginationHttpQuery>, ApiError>,
) -> Result<ApiSuccess<Vec<BookHttpResponse>>, ApiError> {
    state
        .repo
        .get_all_books(query.into())
        .await
        .map_err(ApiError::from)
        .map(|books| ApiSuccess::new(StatusCode::OK, into_http(books)))
}

pub async fn create_book_for_author<R: BookRepository>(
    State(state): State<AppState<R>>,
    WithRejection(Path(author_id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(body), _): WithRejection<Json<CreateBookHttpRequest>, ApiError>,
) -> Result<ApiSuccess<BookHttpResponse>, ApiError> {
    let req = body.into_domain(author_id)?;

    let book = state.repo.create_book_for_author(&req).await?;
    tracing::info!(id = book.id(), author_id, "created book");
    Ok(ApiSuccess::new(StatusCode::CREATED, book.into()))
}

/// An author with no books answers 404, unlike the unfiltered listing.
pub async fn list_books_for_author<R: BookRepository>(
    State(state): State<AppState<R>>,
    WithRejection(Path(author_id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<ApiSuccess<Vec<BookHttpResponse>>, ApiError> {
    let books = state.repo.get_books_by_author_id(author_id).await?;
    if books.is_empty() {
        return Err(ApiError::NotFound(BOOKS_NOT_FOUND.to_string()));
    }

    Ok(ApiSuccess::new(StatusCode::OK, into_http(books)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(response: axum::response::Response) -> ErrorHttpResponse {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn duplicate_author_maps_to_bad_request() {
        let err = ApiError::from(CreateAuthorError::Duplicate {
            name: "Lem".to_string(),
        });
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(response).await.detail, "Author already exists");
    }

    #[tokio::test]
    async fn unknown_failures_hide_their_cause() {
        let err = ApiError::from(FindAllBooksError(anyhow::anyhow!("disk I/O error")));
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await.detail, "Internal server error");
    }

    #[tokio::test]
    async fn missing_author_for_book_maps_to_not_found() {
        let err = ApiError::from(CreateBookError::AuthorNotFound { author_id: 3 });
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(response).await.detail, "Author not found");
    }

    #[test]
    fn blank_name_is_unprocessable() {
        let body = CreateAuthorHttpRequest {
            name: "  ".to_string(),
        };
        let err = CreateAuthorRequest::try_from(body).unwrap_err();

        assert!(matches!(
            ApiError::from(err),
            ApiError::UnprocessableEntity(msg) if msg == "Author name cannot be empty"
        ));
    }
}
