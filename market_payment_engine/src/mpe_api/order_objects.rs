use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatusType, Payment};

/// Which side of the trade an order listing is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderRole {
    Seller,
    Consumer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    /// Zero-based page index
    pub page: u32,
    pub limit: u32,
    /// Sort by id, oldest first when `true`
    pub ascending: bool,
}

impl Default for Paging {
    fn default() -> Self {
        Self { page: 0, limit: 20, ascending: true }
    }
}

impl Paging {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit, ..Default::default() }
    }

    pub fn descending(mut self) -> Self {
        self.ascending = false;
        self
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.limit)
    }
}

/// Criteria for order listings. Soft-deleted orders never match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub seller: Option<String>,
    pub consumer: Option<String>,
    pub article_id: Option<String>,
    pub status: Option<Vec<OrderStatusType>>,
    /// Substring of the article title
    pub search_text: Option<String>,
}

impl OrderQueryFilter {
    pub fn with_seller<S: Into<String>>(mut self, seller: S) -> Self {
        self.seller = Some(seller.into());
        self
    }

    pub fn with_consumer<S: Into<String>>(mut self, consumer: S) -> Self {
        self.consumer = Some(consumer.into());
        self
    }

    pub fn with_article_id<S: Into<String>>(mut self, article_id: S) -> Self {
        self.article_id = Some(article_id.into());
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn with_search_text<S: Into<String>>(mut self, text: S) -> Self {
        let text = text.into();
        if !text.trim().is_empty() {
            self.search_text = Some(text.trim().to_string());
        }
        self
    }

    pub fn for_role(self, role: OrderRole, username: &str) -> Self {
        match role {
            OrderRole::Seller => self.with_seller(username),
            OrderRole::Consumer => self.with_consumer(username),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.seller.is_none() &&
            self.consumer.is_none() &&
            self.article_id.is_none() &&
            self.status.as_ref().map(|s| s.is_empty()).unwrap_or(true) &&
            self.search_text.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "No filters.");
        }
        if let Some(seller) = &self.seller {
            write!(f, "seller: {seller}. ")?;
        }
        if let Some(consumer) = &self.consumer {
            write!(f, "consumer: {consumer}. ")?;
        }
        if let Some(article_id) = &self.article_id {
            write!(f, "article: {article_id}. ")?;
        }
        if let Some(status) = &self.status {
            let statuses = status.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(",");
            write!(f, "status: [{statuses}]. ")?;
        }
        if let Some(text) = &self.search_text {
            write!(f, "title contains: {text}. ")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub page: u32,
    pub limit: u32,
    /// Number of matching orders across all pages
    pub total: i64,
}

impl OrderPage {
    pub fn total_pages(&self) -> i64 {
        if self.limit == 0 {
            return 0;
        }
        let limit = i64::from(self.limit);
        (self.total + limit - 1) / limit
    }
}

/// Everything a buyer or seller sees when they open an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order: Order,
    pub payment: Option<Payment>,
    pub receipt_api_id: Option<String>,
}
