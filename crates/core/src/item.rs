use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quantity assigned to every record that does not say otherwise.
pub const DEFAULT_QUANTITY: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub i64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored line item. Shop and date are repeated on every item that came
/// from the same receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptItem {
    pub id: ItemId,
    pub shop: String,
    pub date: String,
    pub item: String,
    /// Verbatim price text, e.g. `"2.50"`.
    pub price: String,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

/// A record that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReceiptItem {
    pub shop: String,
    pub date: String,
    pub item: String,
    pub price: String,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

impl NewReceiptItem {
    /// Builds a record with the default quantity, stamped with the current time.
    pub fn new(
        shop: impl Into<String>,
        date: impl Into<String>,
        item: impl Into<String>,
        price: impl Into<String>,
    ) -> Self {
        Self {
            shop: shop.into(),
            date: date.into(),
            item: item.into(),
            price: price.into(),
            quantity: DEFAULT_QUANTITY,
            created_at: Utc::now(),
        }
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    /// One record per `(item, price)` pair, all sharing `shop`, `date` and the
    /// same creation timestamp.
    pub fn from_receipt<I, N, P>(shop: &str, date: &str, pairs: I) -> Vec<Self>
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: Into<String>,
    {
        let created_at = Utc::now();
        pairs
            .into_iter()
            .map(|(item, price)| Self {
                created_at,
                ..Self::new(shop, date, item, price)
            })
            .collect()
    }
}

/// Field replacements for an edit. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemChanges {
    pub shop: Option<String>,
    pub date: Option<String>,
    pub item: Option<String>,
    pub price: Option<String>,
    pub quantity: Option<i64>,
}

impl ItemChanges {
    pub fn is_empty(&self) -> bool {
        self.shop.is_none()
            && self.date.is_none()
            && self.item.is_none()
            && self.price.is_none()
            && self.quantity.is_none()
    }

    pub fn apply(&self, target: &mut ReceiptItem) {
        if let Some(shop) = &self.shop {
            target.shop.clone_from(shop);
        }
        if let Some(date) = &self.date {
            target.date.clone_from(date);
        }
        if let Some(item) = &self.item {
            target.item.clone_from(item);
        }
        if let Some(price) = &self.price {
            target.price.clone_from(price);
        }
        if let Some(quantity) = self.quantity {
            target.quantity = quantity;
        }
    }
}
