//! Plain-text rendering for the terminal.

use std::fmt;
use tally_core::{Money, ReceiptItem};
use tally_ocr::ExtractedReceipt;

/// Shop, date, optional raw prices and the display form of each item.
pub struct ReceiptReport<'a> {
    pub extracted: &'a ExtractedReceipt,
    pub prices: Option<&'a [String]>,
}

impl fmt::Display for ReceiptReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Shop Name: {}", self.extracted.shop_name)?;
        writeln!(f, "Date: {}", self.extracted.date)?;
        if let Some(prices) = self.prices {
            writeln!(f, "Prices found: {}", prices.join(", "))?;
        }
        if self.extracted.is_empty() {
            return writeln!(f, "Items: none found");
        }
        writeln!(f, "Items:")?;
        for line in &self.extracted.items {
            writeln!(f, " - {}", line.display())?;
        }
        Ok(())
    }
}

pub fn receipt<'a>(extracted: &'a ExtractedReceipt, prices: Option<&'a [String]>) -> ReceiptReport<'a> {
    ReceiptReport { extracted, prices }
}

/// Sum of price × quantity over the prices that parse. `None` if the sum
/// does not fit in a decimal.
pub fn total(items: &[ReceiptItem]) -> Option<Money> {
    items
        .iter()
        .filter_map(|i| Money::parse(&i.price).ok().map(|m| (m, i.quantity)))
        .try_fold(Money::zero(), |acc, (price, quantity)| {
            acc.checked_add(price.checked_mul(quantity)?)
        })
}

pub struct ItemTable<'a>(pub &'a [ReceiptItem]);

impl fmt::Display for ItemTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items = self.0;
        if items.is_empty() {
            return writeln!(f, "No items stored.");
        }

        writeln!(
            f,
            "{:>5}  {:<24}  {:<12}  {:<28}  {:>9}  {:>3}",
            "ID", "SHOP", "DATE", "ITEM", "PRICE", "QTY"
        )?;
        for i in items {
            writeln!(
                f,
                "{:>5}  {:<24}  {:<12}  {:<28}  {:>9}  {:>3}",
                i.id.0,
                clip(&i.shop, 24),
                clip(&i.date, 12),
                clip(&i.item, 28),
                i.price,
                i.quantity
            )?;
        }
        match total(items) {
            Some(sum) => writeln!(f, "Total: {sum}"),
            None => writeln!(f, "Total: out of range"),
        }
    }
}

pub fn item_table(items: &[ReceiptItem]) -> ItemTable<'_> {
    ItemTable(items)
}

fn clip(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut clipped: String = s.chars().take(width.saturating_sub(1)).collect();
        clipped.push('…');
        clipped
    }
}
