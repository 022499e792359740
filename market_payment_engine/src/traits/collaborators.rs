use crate::{
    db_types::{Article, Customer},
    MarketplaceError,
};

#[allow(async_fn_in_trait)]
pub trait ArticleProvider {
    /// Returns `None` if there is no article with that id.
    async fn fetch_article(&self, article_id: &str) -> Result<Option<Article>, MarketplaceError>;
}

#[allow(async_fn_in_trait)]
pub trait UserProvider {
    async fn fetch_user(&self, username: &str) -> Result<Option<Customer>, MarketplaceError>;
}
