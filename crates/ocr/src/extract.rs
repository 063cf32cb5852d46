use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::rules::{ExtractionRules, ShopNameMode};
use crate::types::{ExtractedReceipt, ReceiptLine, NOT_FOUND};

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_price, r"\d+\.\d{2}");
re!(re_item_line, r"^(.+?)\s+(\d+\.\d{2})$");
re!(re_date, r"\d{2}[/-]\d{2}[/-]\d{4}|\d{4}[/-]\d{2}[/-]\d{2}");
re!(re_shop_symbols, r"[^A-Za-z0-9\s&]");
re!(re_sku_token, r"\b\d+\s+[A-Za-z]+\b");

re!(re_date_day_first, r"^(\d{2})[/-](\d{2})[/-](\d{4})$");
re!(re_date_year_first, r"^(\d{4})[/-](\d{2})[/-](\d{2})$");

// ── Extractor ────────────────────────────────────────────────────────────────

/// Line-oriented heuristics that turn noisy OCR text into a shop name, a date
/// and `(item, price)` pairs. Never fails: anything it cannot read degrades to
/// [`NOT_FOUND`] or an empty item list.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    rules: ExtractionRules,
}

impl Extractor {
    pub fn new(rules: ExtractionRules) -> Self {
        Self { rules: rules.normalized() }
    }

    /// Run every pass over raw OCR text.
    pub fn extract(&self, ocr_text: &str) -> ExtractedReceipt {
        let lines = split_lines(ocr_text);
        let receipt = ExtractedReceipt {
            shop_name: self.shop_name(&lines),
            date: detect_date(ocr_text),
            items: self.items(&lines),
        };
        tracing::debug!(
            lines = lines.len(),
            items = receipt.items.len(),
            shop = %receipt.shop_name,
            date = %receipt.date,
            "extracted receipt fields"
        );
        receipt
    }

    // ── Shop name ─────────────────────────────────────────────────────────────

    /// First qualifying line among the leading `shop_prefix_lines`.
    pub fn shop_name(&self, lines: &[&str]) -> String {
        lines
            .iter()
            .take(self.rules.shop_prefix_lines)
            .find_map(|line| self.qualify_shop_line(line))
            .unwrap_or_else(|| NOT_FOUND.to_string())
    }

    fn qualify_shop_line(&self, line: &str) -> Option<String> {
        match self.rules.shop_name_mode {
            ShopNameMode::Strict => {
                let clean = re_shop_symbols().replace_all(line, "");
                // Length is measured before trimming.
                let qualifies = clean.split_whitespace().count() >= self.rules.min_shop_tokens
                    && clean.chars().count() >= self.rules.min_shop_chars;
                qualifies.then(|| clean.trim().to_string())
            }
            ShopNameMode::Lenient => {
                let line = line.trim();
                (line.split_whitespace().count() >= self.rules.min_shop_tokens)
                    .then(|| line.to_string())
            }
        }
    }

    // ── Items ─────────────────────────────────────────────────────────────────

    /// A line carries a decimal price somewhere and none of the exclusion
    /// keywords.
    pub fn is_eligible(&self, line: &str) -> bool {
        if !re_price().is_match(line) {
            return false;
        }
        let lower = line.to_lowercase();
        !self.rules.exclusion_keywords.iter().any(|k| lower.contains(k.as_str()))
    }

    pub fn eligible_lines<'a>(&self, lines: &[&'a str]) -> Vec<&'a str> {
        lines.iter().copied().filter(|l| self.is_eligible(l)).collect()
    }

    /// Pairs from eligible lines whose price sits at the very end, in line order.
    pub fn items(&self, lines: &[&str]) -> Vec<ReceiptLine> {
        lines
            .iter()
            .filter(|l| self.is_eligible(l))
            .filter_map(|l| parse_item_line(l))
            .collect()
    }
}

// ── Free-standing passes ─────────────────────────────────────────────────────

/// Split on line breaks, trim each segment and drop the blank ones.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split(['\n', '\r'])
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

/// Leftmost `DD/DD/DDDD` or `DDDD/DD/DD` shaped substring (either separator
/// `/` or `-`) anywhere in the text. Ranges are not checked.
pub fn detect_date(text: &str) -> String {
    re_date()
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| NOT_FOUND.to_string())
}

/// `name<whitespace>price` with the price anchored to the end of the line.
pub fn parse_item_line(line: &str) -> Option<ReceiptLine> {
    let c = re_item_line().captures(line)?;
    let name = c.get(1)?.as_str().trim();
    if name.is_empty() {
        return None;
    }
    Some(ReceiptLine::new(name, c.get(2)?.as_str()))
}

/// Every decimal price in the text, in order of appearance.
pub fn find_prices(text: &str) -> Vec<String> {
    re_price().find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// Optional check of a detected date. Day-first for `DD/MM/YYYY`, otherwise
/// `YYYY/MM/DD`. Returns `None` for [`NOT_FOUND`] and impossible dates.
pub fn parse_receipt_date(date: &str) -> Option<NaiveDate> {
    if let Some(c) = re_date_day_first().captures(date) {
        let d: u32 = c.get(1)?.as_str().parse().ok()?;
        let m: u32 = c.get(2)?.as_str().parse().ok()?;
        let y: i32 = c.get(3)?.as_str().parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    let c = re_date_year_first().captures(date)?;
    let y: i32 = c.get(1)?.as_str().parse().ok()?;
    let m: u32 = c.get(2)?.as_str().parse().ok()?;
    let d: u32 = c.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(y, m, d)
}

// ── Display ──────────────────────────────────────────────────────────────────

impl ReceiptLine {
    /// Presentation form: quantity/code tokens like `1 BE` removed from the
    /// name and the price appended with a `$`. The pair itself is untouched.
    pub fn display(&self) -> String {
        let name = re_sku_token().replace_all(&self.name, "");
        let name = name.trim();
        if name.is_empty() {
            format!("${}", self.price)
        } else {
            format!("{name} ${}", self.price)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
