use serde::{Deserialize, Serialize};

/// Placeholder for a shop name or date that could not be determined.
pub const NOT_FOUND: &str = "Not found";

/// One `(name, price)` pair read off an item line. The price keeps the exact
/// text that was matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub name: String,
    pub price: String,
}

impl ReceiptLine {
    pub fn new(name: impl Into<String>, price: impl Into<String>) -> Self {
        Self { name: name.into(), price: price.into() }
    }
}

/// Structured fields recovered from one receipt's OCR text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedReceipt {
    /// Shop name, or [`NOT_FOUND`].
    pub shop_name: String,
    /// Date text as printed, or [`NOT_FOUND`].
    pub date: String,
    pub items: Vec<ReceiptLine>,
}

impl ExtractedReceipt {
    pub fn has_shop_name(&self) -> bool {
        self.shop_name != NOT_FOUND
    }

    pub fn has_date(&self) -> bool {
        self.date != NOT_FOUND
    }

    /// No item line produced a pair. A valid outcome for blank or unreadable
    /// receipts.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().map(|l| (l.name.as_str(), l.price.as_str()))
    }
}
