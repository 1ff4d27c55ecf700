use crate::models::{
    Author, AuthorName, Book, CreateAuthorError, CreateAuthorRequest, CreateBookError,
    CreateBookRequest, FindAllAuthorsError, FindAllBooksError, FindAuthorByNameError,
    FindAuthorError, FindAuthorRequest, FindBooksByAuthorError, Pagination,
};
use async_trait::async_trait;

#[async_trait]
pub trait AuthorRepository: Send + Sync + 'static {
    async fn get_all_authors(&self, page: Pagination) -> Result<Vec<Author>, FindAllAuthorsError>;

    async fn get_author_by_name(
        &self,
        name: &AuthorName,
    ) -> Result<Option<Author>, FindAuthorByNameError>;

    async fn create_author(&self, req: &CreateAuthorRequest) -> Result<Author, CreateAuthorError>;

    async fn get_author_by_id(&self, req: &FindAuthorRequest) -> Result<Author, FindAuthorError>;
}

#[async_trait]
pub trait BookRepository: Send + Sync + 'static {
    async fn get_all_books(&self, page: Pagination) -> Result<Vec<Book>, FindAllBooksError>;

    /// Inserts without checking the author first; the store's foreign key decides.
    async fn create_book_for_author(&self, req: &CreateBookRequest) -> Result<Book, CreateBookError>;

    async fn get_books_by_author_id(&self, author_id: i64)
    -> Result<Vec<Book>, FindBooksByAuthorError>;
}
