use anyhow::{bail, Context, Result};
use std::io::Read;
use std::path::Path;
use tally_core::{ItemId, NewReceiptItem};
use tally_ocr::{
    find_prices, Extractor, MockRecognizer, OcrBackend, OcrSpaceRecognizer, ReceiptPipeline,
};
use tally_storage::DbPool;

use crate::cli::{AddArgs, EditArgs, ParseArgs, ScanArgs};
use crate::config::{Config, OcrConfig, ProviderKind, API_KEY_ENV};
use crate::report;

pub fn build_backend(
    kind: ProviderKind,
    ocr: &OcrConfig,
    ocr_text: Option<&Path>,
) -> Result<Box<dyn OcrBackend>> {
    match kind {
        ProviderKind::Mock => {
            let path = ocr_text.context("--provider mock needs --ocr-text <FILE>")?;
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            Ok(Box::new(MockRecognizer::new(text)))
        }
        ProviderKind::OcrSpace => {
            let Some(config) = ocr.ocr_space() else {
                bail!("the OCR API needs a key: set ocr.api_key or {API_KEY_ENV}");
            };
            Ok(Box::new(OcrSpaceRecognizer::new(config)?))
        }
        ProviderKind::Tesseract => tesseract(ocr),
    }
}

#[cfg(feature = "tesseract")]
fn tesseract(ocr: &OcrConfig) -> Result<Box<dyn OcrBackend>> {
    use tally_ocr::{Preprocessed, TesseractRecognizer};

    let engine = TesseractRecognizer::new(ocr.tessdata.clone(), &ocr.tesseract_lang);
    Ok(Box::new(Preprocessed::new(engine)))
}

#[cfg(not(feature = "tesseract"))]
fn tesseract(_ocr: &OcrConfig) -> Result<Box<dyn OcrBackend>> {
    Err(tally_ocr::OcrError::NotAvailable.into())
}

/// Stores the extracted items when `db` is given. Callers pass `None` for
/// `--dry-run`.
pub async fn scan(config: &Config, db: Option<&DbPool>, args: &ScanArgs) -> Result<()> {
    let kind = args.provider.unwrap_or(config.ocr.provider);
    let backend = build_backend(kind, &config.ocr, args.ocr_text.as_deref())?;
    let pipeline = ReceiptPipeline::new(backend, Extractor::new(config.extraction.rules()));

    let result = pipeline
        .process_file(&args.image)
        .await
        .with_context(|| format!("could not read receipt {}", args.image.display()))?;
    let extracted = &result.extracted;

    if args.json {
        println!("{}", serde_json::to_string_pretty(extracted)?);
    } else {
        print!("{}", report::receipt(extracted, None));
    }

    if extracted.is_empty() {
        eprintln!("warning: no item lines were recognized on this receipt");
    }

    if let Some(db) = db {
        let records =
            NewReceiptItem::from_receipt(&extracted.shop_name, &extracted.date, extracted.pairs());
        let ids = tally_storage::insert_receipt_items(db, &records).await?;
        tracing::info!(stored = ids.len(), "receipt items stored");
        if !args.json {
            println!("Stored {} item(s).", ids.len());
        }
    }
    Ok(())
}

pub fn parse(config: &Config, args: &ParseArgs) -> Result<()> {
    let text = if args.input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).context("reading stdin")?;
        buf
    } else {
        std::fs::read_to_string(&args.input)
            .with_context(|| format!("reading {}", args.input.display()))?
    };

    let extracted = Extractor::new(config.extraction.rules()).extract(&text);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&extracted)?);
    } else {
        let prices = find_prices(&text);
        print!("{}", report::receipt(&extracted, Some(prices.as_slice())));
    }
    Ok(())
}

pub async fn list(db: &DbPool) -> Result<()> {
    let items = tally_storage::get_all_items(db).await?;
    print!("{}", report::item_table(&items));
    Ok(())
}

pub async fn add(db: &DbPool, args: &AddArgs) -> Result<()> {
    let item = NewReceiptItem::new(&args.shop, &args.date, &args.item, &args.price)
        .with_quantity(args.quantity);
    let id = tally_storage::insert_item(db, &item).await?;
    println!("Added item {id}.");
    Ok(())
}

pub async fn edit(db: &DbPool, args: &EditArgs) -> Result<()> {
    let changes = args.changes();
    if changes.is_empty() {
        bail!("nothing to change: pass at least one of --shop, --date, --item, --price, --quantity");
    }
    match tally_storage::update_item(db, ItemId(args.id), &changes).await? {
        Some(item) => {
            println!("Updated item {}.", item.id);
            Ok(())
        }
        None => bail!("no item with id {}", args.id),
    }
}

pub async fn delete(db: &DbPool, id: i64) -> Result<()> {
    if !tally_storage::delete_item(db, ItemId(id)).await? {
        bail!("no item with id {id}");
    }
    println!("Deleted item {id}.");
    Ok(())
}
