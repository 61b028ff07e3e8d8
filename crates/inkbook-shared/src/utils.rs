//! Utility functions

/// Masks the local part of an e-mail address for log output.
pub fn mask_email(email: &str) -> String {
    if let Some(at_pos) = email.find('@') {
        let (local, domain) = email.split_at(at_pos);
        match local.chars().count() {
            0 => format!("***{}", domain),
            1 | 2 => format!("{}***{}", local.chars().next().unwrap_or('*'), domain),
            _ => format!("{}***{}", local.chars().take(2).collect::<String>(), domain),
        }
    } else {
        "***".to_string()
    }
}

/// Case-insensitive substring match used by the text-search filters.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("maria@studio.com"), "ma***@studio.com");
        assert_eq!(mask_email("jo@studio.com"), "j***@studio.com");
        assert_eq!(mask_email("@studio.com"), "***@studio.com");
        assert_eq!(mask_email("not-an-email"), "***");
    }

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("Dragon Sleeve", "dragon"));
        assert!(!contains_ignore_case("Koi Fish", "dragon"));
    }
}
