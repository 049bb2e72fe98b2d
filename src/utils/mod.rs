use sha2::{Digest, Sha256};

pub fn sha256_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// File extension for a stored blob name; anything suspicious collapses to "bin".
pub fn sanitized_ext(file_name: &str) -> String {
    let ext = file_name
        .rsplit('.')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        "bin".to_string()
    } else {
        ext
    }
}

/// Thousands-grouped display amount for notification messages, e.g. 1200 -> "1,200.00".
pub fn format_amount(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    let (int_part, frac) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };

    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}{}.{}", sign, grouped, frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_amounts_with_grouping() {
        assert_eq!(format_amount(1200.0), "1,200.00");
        assert_eq!(format_amount(999.5), "999.50");
        assert_eq!(format_amount(1234567.891), "1,234,567.89");
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(-45000.0), "-45,000.00");
    }

    #[test]
    fn sanitizes_extensions() {
        assert_eq!(sanitized_ext("scan.PDF"), "pdf");
        assert_eq!(sanitized_ext("invoice.2024.jpg"), "jpg");
        assert_eq!(sanitized_ext("no_extension"), "bin");
        assert_eq!(sanitized_ext("weird.../../x"), "bin");
    }
}
