use async_trait::async_trait;

use super::domain::{NewPage, Page, PageId, PageKind};
use crate::store::StoreError;

/// Persistence for the page tree. The root page always exists.
#[async_trait]
pub trait PageStore: Send + Sync {
    async fn root(&self) -> Result<Page, StoreError>;

    /// Inserts a page; a sibling with the same slug is a conflict.
    async fn insert_page(&self, page: NewPage) -> Result<Page, StoreError>;

    async fn update_page(&self, page: Page) -> Result<Page, StoreError>;

    async fn fetch_page(&self, id: PageId) -> Result<Option<Page>, StoreError>;

    /// Direct children in creation order.
    async fn children(&self, parent: PageId) -> Result<Vec<Page>, StoreError>;

    /// Every page of a kind in creation order.
    async fn pages_of_kind(&self, kind: PageKind) -> Result<Vec<Page>, StoreError>;
}
