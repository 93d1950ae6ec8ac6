//! Masking for contact details that end up in log lines.

const MASK: &str = "***";

/// `jean.dupont@example.fr` -> `j***@example.fr`
pub fn mask_email(email: &str) -> String {
    match email.trim().split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
            let first: String = local.chars().take(1).collect();
            format!("{first}{MASK}@{domain}")
        }
        _ => MASK.to_string(),
    }
}

/// Keeps the last two digits only: `+33 6 12 34 56 78` -> `***78`
pub fn mask_phone(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() <= 2 {
        return MASK.to_string();
    }
    let tail: String = digits[digits.len() - 2..].iter().collect();
    format!("{MASK}{tail}")
}
