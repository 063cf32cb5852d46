pub mod item;
pub mod money;

pub use item::{ItemChanges, ItemId, NewReceiptItem, ReceiptItem, DEFAULT_QUANTITY};
pub use money::{Money, MoneyError};
