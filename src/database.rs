use crate::models::{
    Author, AuthorName, Book, BookTitle, CreateAuthorError, CreateAuthorRequest, CreateBookError,
    CreateBookRequest, FindAllAuthorsError, FindAllBooksError, FindAuthorByNameError,
    FindAuthorError, FindAuthorRequest, FindBooksByAuthorError, Pagination,
};
use crate::repositories::{AuthorRepository, BookRepository};
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{FromRow, Row, SqlitePool};
use std::str::FromStr;

static MIGRATOR: Migrator = sqlx::migrate!();

pub async fn establish_pool(url: &str) -> anyhow::Result<SqlitePool> {
    let opts = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("Invalid database url {url}"))?
        .journal_mode(SqliteJournalMode::Wal);

    connect(opts, SqlitePoolOptions::new()).await
}

/// Single-connection pool over a private in-memory database.
pub async fn establish_in_memory_pool() -> anyhow::Result<SqlitePool> {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let pool_opts = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None);

    connect(opts, pool_opts).await
}

pub async fn connect(
    opts: SqliteConnectOptions,
    pool_opts: SqlitePoolOptions,
) -> anyhow::Result<SqlitePool> {
    let opts = opts.foreign_keys(true);
    let filename = opts.get_filename().display().to_string();
    let pool = pool_opts
        .connect_with(opts)
        .await
        .with_context(|| format!("Failed to open database at {filename}"))?;

    MIGRATOR
        .run(&pool)
        .await
        .context("Failed to apply database migrations")?;

    tracing::debug!(%filename, "database ready");
    Ok(pool)
}

/// Author and book store backed by one SQLite pool.
///
/// Every call checks a connection out of the pool for the duration of a
/// single statement; the connection goes back when the call returns.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl<'r> FromRow<'r, SqliteRow> for Author {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        let name: String = row.try_get("name")?;

        let name = AuthorName::new_unchecked(&name);
        Ok(Self::new(id, name))
    }
}

impl<'r> FromRow<'r, SqliteRow> for Book {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        let title: String = row.try_get("title")?;
        let description: Option<String> = row.try_get("description")?;
        let author_id: i64 = row.try_get("author_id")?;

        let title = BookTitle::new_unchecked(&title);
        Ok(Self::new(id, title, description, author_id))
    }
}

#[async_trait]
impl AuthorRepository for SqliteRepository {
    async fn get_all_authors(&self, page: Pagination) -> Result<Vec<Author>, FindAllAuthorsError> {
        let authors = sqlx::query_as("SELECT id, name FROM authors ORDER BY id LIMIT ? OFFSET ?")
            .bind(i64::from(page.limit()))
            .bind(i64::from(page.skip()))
            .fetch_all(&self.pool)
            .await
            .map_err(|err| {
                let err = anyhow!(err).context("Failed to retrieve authors");
                FindAllAuthorsError(err)
            })?;

        Ok(authors)
    }

    async fn get_author_by_name(
        &self,
        name: &AuthorName,
    ) -> Result<Option<Author>, FindAuthorByNameError> {
        let author = sqlx::query_as("SELECT id, name FROM authors WHERE name = ?")
            .bind(name.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| {
                let err = anyhow!(err)
                    .context(format!(r#"Failed to look up author with name "{name}""#));
                FindAuthorByNameError(err)
            })?;

        Ok(author)
    }

    async fn create_author(&self, req: &CreateAuthorRequest) -> Result<Author, CreateAuthorError> {
        let author = sqlx::query_as("INSERT INTO authors (name) VALUES (?) RETURNING id, name")
            .bind(req.name().as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    CreateAuthorError::Duplicate {
                        name: req.name().to_string(),
                    }
                } else {
                    let err = anyhow!(err).context(format!(
                        r#"Failed to create author with name "{}""#,
                        req.name()
                    ));
                    CreateAuthorError::Other(err)
                }
            })?;

        Ok(author)
    }

    async fn get_author_by_id(&self, req: &FindAuthorRequest) -> Result<Author, FindAuthorError> {
        let author = sqlx::query_as("SELECT id, name FROM authors WHERE id = ?")
            .bind(req.id())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                if matches!(err, sqlx::Error::RowNotFound) {
                    FindAuthorError::NotFound { id: req.id() }
                } else {
                    let err = anyhow!(err).context(format!(
                        r#"Failed to retrieve author with id "{}""#,
                        req.id()
                    ));
                    FindAuthorError::Other(err)
                }
            })?;

        Ok(author)
    }
}

#[async_trait]
impl BookRepository for SqliteRepository {
    async fn get_all_books(&self, page: Pagination) -> Result<Vec<Book>, FindAllBooksError> {
        let books = sqlx::query_as(
            "SELECT id, title, description, author_id FROM books ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(i64::from(page.limit()))
        .bind(i64::from(page.skip()))
        .fetch_all(&self.pool)
        .await
        .map_err(|err| {
            let err = anyhow!(err).context("Failed to retrieve books");
            FindAllBooksError(err)
        })?;

        Ok(books)
    }

    async fn create_book_for_author(&self, req: &CreateBookRequest) -> Result<Book, CreateBookError> {
        let book = sqlx::query_as(
            "INSERT INTO books (title, description, author_id) VALUES (?, ?, ?) \
             RETURNING id, title, description, author_id",
        )
        .bind(req.title().as_str())
        .bind(req.description())
        .bind(req.author_id())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if is_foreign_key_violation(&err) {
                CreateBookError::AuthorNotFound {
                    author_id: req.author_id(),
                }
            } else {
                let err = anyhow!(err).context(format!(
                    r#"Failed to create book "{}" for author "{}""#,
                    req.title(),
                    req.author_id()
                ));
                CreateBookError::Other(err)
            }
        })?;

        Ok(book)
    }

    async fn get_books_by_author_id(
        &self,
        author_id: i64,
    ) -> Result<Vec<Book>, FindBooksByAuthorError> {
        let books = sqlx::query_as(
            "SELECT id, title, description, author_id FROM books WHERE author_id = ? ORDER BY id",
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| {
            let err = anyhow!(err).context(format!(
                r#"Failed to retrieve books for author "{author_id}""#
            ));
            FindBooksByAuthorError(err)
        })?;

        Ok(books)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.is_unique_violation();
    }

    false
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.is_foreign_key_violation();
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repository() -> SqliteRepository {
        let pool = establish_in_memory_pool().await.unwrap();
        SqliteRepository::new(pool)
    }

    async fn add_author(repo: &SqliteRepository, name: &str) -> Author {
        let req = CreateAuthorRequest::new(AuthorName::new(name).unwrap());
        repo.create_author(&req).await.unwrap()
    }

    async fn add_book(repo: &SqliteRepository, author_id: i64, title: &str) -> Book {
        let req = CreateBookRequest::new(author_id, BookTitle::new(title).unwrap(), None);
        repo.create_book_for_author(&req).await.unwrap()
    }

    #[tokio::test]
    async fn create_author_assigns_increasing_ids() {
        let repo = repository().await;

        let first = add_author(&repo, "Iain M. Banks").await;
        let second = add_author(&repo, "Octavia Butler").await;

        assert!(second.id() > first.id());
        assert_eq!(first.name().as_str(), "Iain M. Banks");
    }

    #[tokio::test]
    async fn duplicate_author_name_is_rejected_by_the_store() {
        let repo = repository().await;
        add_author(&repo, "Stanislaw Lem").await;

        let req = CreateAuthorRequest::new(AuthorName::new("Stanislaw Lem").unwrap());
        let err = repo.create_author(&req).await.unwrap_err();

        assert!(matches!(err, CreateAuthorError::Duplicate { name } if name == "Stanislaw Lem"));
    }

    #[tokio::test]
    async fn get_author_by_name_matches_exactly() {
        let repo = repository().await;
        let created = add_author(&repo, "Ted Chiang").await;

        let found = repo
            .get_author_by_name(&AuthorName::new("Ted Chiang").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id(), created.id());

        let missing = repo
            .get_author_by_name(&AuthorName::new("ted chiang").unwrap())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn get_author_by_unknown_id_is_not_found() {
        let repo = repository().await;

        let err = repo
            .get_author_by_id(&FindAuthorRequest::new(42))
            .await
            .unwrap_err();

        assert!(matches!(err, FindAuthorError::NotFound { id: 42 }));
    }

    #[tokio::test]
    async fn get_all_authors_applies_skip_and_limit_in_id_order() {
        let repo = repository().await;
        for name in ["A", "B", "C", "D", "E"] {
            add_author(&repo, name).await;
        }

        let page = repo.get_all_authors(Pagination::new(1, 3)).await.unwrap();
        let names: Vec<_> = page.iter().map(|a| a.name().to_string()).collect();
        assert_eq!(names, ["B", "C", "D"]);

        let again = repo.get_all_authors(Pagination::new(1, 3)).await.unwrap();
        let ids: Vec<_> = again.iter().map(Author::id).collect();
        assert_eq!(ids, page.iter().map(Author::id).collect::<Vec<_>>());

        let past_end = repo.get_all_authors(Pagination::new(10, 3)).await.unwrap();
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn book_for_missing_author_violates_foreign_key() {
        let repo = repository().await;

        let req = CreateBookRequest::new(7, BookTitle::new("Orphan").unwrap(), None);
        let err = repo.create_book_for_author(&req).await.unwrap_err();

        assert!(matches!(err, CreateBookError::AuthorNotFound { author_id: 7 }));
    }

    #[tokio::test]
    async fn books_are_listed_per_author() {
        let repo = repository().await;
        let lem = add_author(&repo, "Stanislaw Lem").await;
        let banks = add_author(&repo, "Iain M. Banks").await;
        add_book(&repo, lem.id(), "Solaris").await;
        add_book(&repo, banks.id(), "Excession").await;
        add_book(&repo, lem.id(), "The Cyberiad").await;

        let books = repo.get_books_by_author_id(lem.id()).await.unwrap();
        let titles: Vec<_> = books.iter().map(|b| b.title().to_string()).collect();
        assert_eq!(titles, ["Solaris", "The Cyberiad"]);
        assert!(books.iter().all(|b| b.author_id() == lem.id()));

        let all = repo.get_all_books(Pagination::default()).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn book_description_is_optional() {
        let repo = repository().await;
        let author = add_author(&repo, "Ursula K. Le Guin").await;

        let req = CreateBookRequest::new(
            author.id(),
            BookTitle::new("The Dispossessed").unwrap(),
            Some("An ambiguous utopia".to_string()),
        );
        let with = repo.create_book_for_author(&req).await.unwrap();
        let without = add_book(&repo, author.id(), "The Lathe of Heaven").await;

        assert_eq!(with.description(), Some("An ambiguous utopia"));
        assert_eq!(without.description(), None);
    }
}
