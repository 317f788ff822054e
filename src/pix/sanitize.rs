//! Field sanitization for the free-text parts of a payload.
//!
//! Banking apps only guarantee printable ASCII in the merchant name and city,
//! so accented Latin letters are folded to their base letter and anything else
//! outside `0x20..=0x7E` is dropped. Values are then truncated to the field's
//! maximum length. Truncation is silent; the encoder never rejects a name or
//! city for being too long.

/// Maximum length of the merchant name (tag 59).
pub const MERCHANT_NAME_MAX: usize = 25;

/// Maximum length of the merchant city (tag 60).
pub const MERCHANT_CITY_MAX: usize = 15;

/// Maximum length of the transaction id (tag 62/05).
pub const TRANSACTION_ID_MAX: usize = 25;

/// Transaction id used when the caller supplies none.
pub const DEFAULT_TRANSACTION_ID: &str = "***";

/// Fold, filter, trim and truncate a free-text field.
pub fn sanitize_text(input: &str, max_len: usize) -> String {
    let folded: String = input
        .chars()
        .filter_map(fold_char)
        .collect();

    let truncated: String = folded.trim().chars().take(max_len).collect();
    truncated.trim_end().to_string()
}

/// Keep only ASCII alphanumerics, falling back to `***` when nothing is left.
pub fn sanitize_transaction_id(input: Option<&str>) -> String {
    let cleaned: String = input
        .unwrap_or_default()
        .chars()
        .filter_map(fold_char)
        .filter(|c| c.is_ascii_alphanumeric())
        .take(TRANSACTION_ID_MAX)
        .collect();

    if cleaned.is_empty() {
        DEFAULT_TRANSACTION_ID.to_string()
    } else {
        cleaned
    }
}

fn fold_char(c: char) -> Option<char> {
    if (' '..='~').contains(&c) {
        return Some(c);
    }
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'ç' => 'c',
        'Ç' => 'C',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        '\t' | '\n' | '\r' => ' ',
        _ => return None,
    };
    Some(folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folds_portuguese_diacritics() {
        assert_eq!(sanitize_text("São Paulo", MERCHANT_CITY_MAX), "Sao Paulo");
        assert_eq!(sanitize_text("Jacarépaguá", MERCHANT_CITY_MAX), "Jacarepagua");
        assert_eq!(sanitize_text("Conceição", MERCHANT_NAME_MAX), "Conceicao");
    }

    #[test]
    fn test_strips_unsupported_characters() {
        assert_eq!(sanitize_text("Davi ❤ Larissa", MERCHANT_NAME_MAX), "Davi  Larissa");
        assert_eq!(sanitize_text("东京", MERCHANT_CITY_MAX), "");
    }

    #[test]
    fn test_truncates_to_limit() {
        let city = sanitize_text("Rio de Janeiro - Capital", MERCHANT_CITY_MAX);
        assert_eq!(city, "Rio de Janeiro");
        assert!(city.chars().count() <= MERCHANT_CITY_MAX);

        let name = sanitize_text(&"A".repeat(40), MERCHANT_NAME_MAX);
        assert_eq!(name.len(), MERCHANT_NAME_MAX);
    }

    #[test]
    fn test_transaction_id_defaults() {
        assert_eq!(sanitize_transaction_id(None), "***");
        assert_eq!(sanitize_transaction_id(Some("")), "***");
        assert_eq!(sanitize_transaction_id(Some("---")), "***");
    }

    #[test]
    fn test_transaction_id_keeps_alphanumerics() {
        assert_eq!(sanitize_transaction_id(Some("GIFT-01")), "GIFT01");
        assert_eq!(sanitize_transaction_id(Some(&"x".repeat(30))).len(), TRANSACTION_ID_MAX);
    }
}
