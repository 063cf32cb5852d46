use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tally_core::ItemChanges;

use crate::config::ProviderKind;

#[derive(Parser, Debug)]
#[command(name = "tally", version, about = "Read shop, date and line items off receipt photos")]
pub struct Cli {
    /// Config file (defaults to config.toml in the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file (overrides the config)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// OCR a receipt image, extract its items and store them
    Scan(ScanArgs),
    /// Extract fields from OCR text in a file, or `-` for stdin
    Parse(ParseArgs),
    /// Show stored items, newest first
    List,
    /// Store an item by hand
    Add(AddArgs),
    /// Change fields of a stored item
    Edit(EditArgs),
    /// Remove a stored item
    Delete {
        id: i64,
    },
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    pub image: PathBuf,

    /// OCR provider (overrides the config)
    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    /// Text file standing in for OCR output with `--provider mock`
    #[arg(long)]
    pub ocr_text: Option<PathBuf>,

    /// Print the result without storing it
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Print the result as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ParseArgs {
    pub input: PathBuf,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(long)]
    pub shop: String,
    #[arg(long)]
    pub date: String,
    #[arg(long)]
    pub item: String,
    #[arg(long)]
    pub price: String,
    #[arg(long, default_value_t = tally_core::DEFAULT_QUANTITY)]
    pub quantity: i64,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub id: i64,
    #[arg(long)]
    pub shop: Option<String>,
    #[arg(long)]
    pub date: Option<String>,
    #[arg(long)]
    pub item: Option<String>,
    #[arg(long)]
    pub price: Option<String>,
    #[arg(long)]
    pub quantity: Option<i64>,
}

impl EditArgs {
    pub fn changes(&self) -> ItemChanges {
        ItemChanges {
            shop: self.shop.clone(),
            date: self.date.clone(),
            item: self.item.clone(),
            price: self.price.clone(),
            quantity: self.quantity,
        }
    }
}
