pub mod extract;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod remote;
pub mod rules;
pub mod types;

pub use extract::{detect_date, find_prices, parse_item_line, parse_receipt_date, split_lines, Extractor};
pub use pipeline::{PipelineError, ReceiptPipeline, ScanResult};
pub use preprocess::{prepare_for_ocr_from_bytes, PreprocessError, Preprocessed};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError};
pub use remote::{OcrSpaceConfig, OcrSpaceRecognizer};
pub use rules::{ExtractionRules, RulesPreset, ShopNameMode};
pub use types::{ExtractedReceipt, ReceiptLine, NOT_FOUND};

#[cfg(feature = "tesseract")]
pub use recognizer::tesseract_backend::TesseractRecognizer;
