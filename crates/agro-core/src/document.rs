//! # Document Module
//!
//! Checksum validation for Brazilian taxpayer documents.
//!
//! ## Supported Documents
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CPF  (individuals)   11 digits   529.982.247-25                        │
//! │       ├── digit 10: weights 10..2 over digits 1-9                       │
//! │       └── digit 11: weights 11..2 over digits 1-10                      │
//! │                                                                         │
//! │  CNPJ (companies)     14 digits   11.222.333/0001-81                    │
//! │       ├── digit 13: weights 5..2, 9..2 over digits 1-12                 │
//! │       └── digit 14: weights 6..2, 9..2 over digits 1-13                 │
//! │                                                                         │
//! │  Punctuation is ignored: only ASCII digits take part in the checksum.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A document made of a single repeated digit (`111.111.111-11`) satisfies
//! both checksums and is rejected explicitly.

const CPF_LEN: usize = 11;
const CNPJ_LEN: usize = 14;

/// Returns true if `document` is a valid CPF or CNPJ.
///
/// ## Example
/// ```rust
/// use agro_core::document::is_valid_document;
///
/// assert!(is_valid_document("529.982.247-25"));
/// assert!(is_valid_document("11.222.333/0001-81"));
/// assert!(!is_valid_document("12345678900"));
/// ```
pub fn is_valid_document(document: &str) -> bool {
    is_valid_cpf(document) || is_valid_cnpj(document)
}

/// Returns true if `cpf` carries 11 digits with matching check digits.
pub fn is_valid_cpf(cpf: &str) -> bool {
    let digits = digits_of(cpf);
    if digits.len() != CPF_LEN || is_repeated(&digits) {
        return false;
    }

    cpf_check_digit(&digits[..9]) == digits[9] && cpf_check_digit(&digits[..10]) == digits[10]
}

/// Returns true if `cnpj` carries 14 digits with matching check digits.
pub fn is_valid_cnpj(cnpj: &str) -> bool {
    let digits = digits_of(cnpj);
    if digits.len() != CNPJ_LEN || is_repeated(&digits) {
        return false;
    }

    cnpj_check_digit(&digits[..12]) == digits[12] && cnpj_check_digit(&digits[..13]) == digits[13]
}

/// The stored form of a document: its ASCII digits, punctuation dropped.
///
/// ## Example
/// ```rust
/// use agro_core::document::normalize_document;
///
/// assert_eq!(normalize_document("529.982.247-25"), "52998224725");
/// assert_eq!(normalize_document("11.222.333/0001-81"), "11222333000181");
/// ```
pub fn normalize_document(document: &str) -> String {
    document.chars().filter(char::is_ascii_digit).collect()
}

/// Completes a 9-digit base into a valid 11-digit CPF.
///
/// Returns `None` when the base does not hold exactly nine digits or the
/// result would be a repeated-digit document.
///
/// ## Example
/// ```rust
/// use agro_core::document::{cpf_from_base, is_valid_cpf};
///
/// let cpf = cpf_from_base("529982247").unwrap();
/// assert_eq!(cpf, "52998224725");
/// assert!(is_valid_cpf(&cpf));
/// ```
pub fn cpf_from_base(base: &str) -> Option<String> {
    let mut digits = digits_of(base);
    if digits.len() != 9 || base.chars().any(|c| !c.is_ascii_digit()) {
        return None;
    }

    digits.push(cpf_check_digit(&digits));
    digits.push(cpf_check_digit(&digits));

    if is_repeated(&digits) {
        return None;
    }

    Some(digits.iter().map(|d| char::from(b'0' + *d)).collect())
}

// =============================================================================
// Checksums
// =============================================================================

fn digits_of(input: &str) -> Vec<u8> {
    input
        .bytes()
        .filter(u8::is_ascii_digit)
        .map(|b| b - b'0')
        .collect()
}

fn is_repeated(digits: &[u8]) -> bool {
    digits.windows(2).all(|pair| pair[0] == pair[1])
}

/// Weights run from `len + 1` down to 2.
fn cpf_check_digit(digits: &[u8]) -> u8 {
    let top = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .zip((2..=top).rev())
        .map(|(d, weight)| u32::from(*d) * weight)
        .sum();

    match (sum * 10) % 11 {
        10 => 0,
        rest => rest as u8,
    }
}

/// Weights start at `len - 7` and wrap from 2 back to 9.
fn cnpj_check_digit(digits: &[u8]) -> u8 {
    let mut weight = digits.len() as u32 - 7;
    let mut sum = 0u32;
    for d in digits {
        sum += u32::from(*d) * weight;
        weight = if weight == 2 { 9 } else { weight - 1 };
    }

    match sum % 11 {
        rest if rest < 2 => 0,
        rest => (11 - rest) as u8,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
