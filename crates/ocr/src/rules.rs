use serde::{Deserialize, Serialize};

/// How the shop-name detector qualifies a candidate line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopNameMode {
    /// Strip everything but letters, digits, whitespace and `&`, then require
    /// enough tokens and characters. The stripped line is returned.
    #[default]
    Strict,
    /// Only require enough tokens. The line is returned as read.
    Lenient,
}

/// Named starting points for [`ExtractionRules`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulesPreset {
    /// Tuned for text coming out of a local engine.
    #[default]
    Local,
    /// Tuned for text coming back from the remote OCR API.
    Api,
}

impl RulesPreset {
    pub fn rules(self) -> ExtractionRules {
        match self {
            RulesPreset::Local => ExtractionRules::local_engine(),
            RulesPreset::Api => ExtractionRules::ocr_api(),
        }
    }
}

/// Every tunable heuristic of the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionRules {
    /// Number of leading lines searched for the shop name.
    pub shop_prefix_lines: usize,
    pub shop_name_mode: ShopNameMode,
    /// Minimum whitespace-separated tokens in a shop name.
    pub min_shop_tokens: usize,
    /// Minimum characters in a shop name after stripping. Strict mode only.
    pub min_shop_chars: usize,
    /// Case-insensitive substrings that disqualify an item line.
    pub exclusion_keywords: Vec<String>,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self::local_engine()
    }
}

impl ExtractionRules {
    pub fn local_engine() -> Self {
        Self {
            shop_prefix_lines: 10,
            shop_name_mode: ShopNameMode::Strict,
            min_shop_tokens: 2,
            min_shop_chars: 5,
            exclusion_keywords: keywords(&[
                "cash", "change", "total", "subtotal", "payment", "balance", "tax",
            ]),
        }
    }

    pub fn ocr_api() -> Self {
        Self {
            shop_prefix_lines: 5,
            shop_name_mode: ShopNameMode::Lenient,
            min_shop_tokens: 2,
            min_shop_chars: 0,
            exclusion_keywords: keywords(&["total", "change", "cash", "balance", "payment"]),
        }
    }

    pub fn with_shop_prefix_lines(mut self, n: usize) -> Self {
        self.shop_prefix_lines = n;
        self
    }

    pub fn with_shop_name_mode(mut self, mode: ShopNameMode) -> Self {
        self.shop_name_mode = mode;
        self
    }

    pub fn with_exclusion_keywords<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclusion_keywords = words.into_iter().map(|w| w.as_ref().to_lowercase()).collect();
        self
    }

    /// Lower-cases keywords and drops blank ones. A blank keyword would match
    /// every line.
    pub fn normalized(mut self) -> Self {
        self.exclusion_keywords = self
            .exclusion_keywords
            .iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        self
    }
}

fn keywords(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_local_engine() {
        let rules = ExtractionRules::default();
        assert_eq!(rules.shop_prefix_lines, 10);
        assert_eq!(rules.shop_name_mode, ShopNameMode::Strict);
        assert_eq!(rules.exclusion_keywords.len(), 7);
        assert!(rules.exclusion_keywords.contains(&"tax".to_string()));
    }

    #[test]
    fn api_preset_is_narrower() {
        let rules = RulesPreset::Api.rules();
        assert_eq!(rules.shop_prefix_lines, 5);
        assert_eq!(rules.shop_name_mode, ShopNameMode::Lenient);
        assert!(!rules.exclusion_keywords.contains(&"tax".to_string()));
        assert!(!rules.exclusion_keywords.contains(&"subtotal".to_string()));
    }

    #[test]
    fn normalized_lowercases_and_drops_blanks() {
        let rules = ExtractionRules {
            exclusion_keywords: vec!["  TOTAL ".into(), "".into(), "Cash".into()],
            ..Default::default()
        }
        .normalized();
        assert_eq!(rules.exclusion_keywords, vec!["total", "cash"]);
    }

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let rules: ExtractionRules = from_json(r#"{"shop_prefix_lines": 3}"#);
        assert_eq!(rules.shop_prefix_lines, 3);
        assert_eq!(rules.shop_name_mode, ShopNameMode::Strict);
        assert_eq!(rules.min_shop_chars, 5);
    }

    #[test]
    fn mode_and_preset_names_in_config() {
        let rules: ExtractionRules = from_json(r#"{"shop_name_mode": "lenient"}"#);
        assert_eq!(rules.shop_name_mode, ShopNameMode::Lenient);
        let preset: RulesPreset = serde_json::from_str(r#""api""#).unwrap();
        assert_eq!(preset, RulesPreset::Api);
        assert!(serde_json::from_str::<ShopNameMode>(r#""fuzzy""#).is_err());
    }

    fn from_json(json: &str) -> ExtractionRules {
        serde_json::from_str(json).unwrap()
    }
}
