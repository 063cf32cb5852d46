pub mod db;

pub use db::{
    create_db, create_memory_db, delete_item, get_all_items, get_item_by_id, insert_item,
    insert_receipt_items, update_item, DbPool,
};
