//! Brazilian identity numbers: CPF, RG and CNPJ.

/// Keep only ASCII digits.
pub fn only_digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn digit_values(value: &str) -> Vec<u32> {
    value.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn all_identical(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

/// CPF check digit over `digits` with weights starting at `first_weight`
/// and decreasing to 2. A remainder of 10 maps to 0.
pub(crate) fn cpf_remainder(digits: &[u32], first_weight: u32) -> u32 {
    let sum: u32 = digits
        .iter()
        .zip((2..=first_weight).rev())
        .map(|(d, w)| d * w)
        .sum();
    (sum * 10) % 11
}

fn cpf_check_digit(digits: &[u32], first_weight: u32) -> u32 {
    match cpf_remainder(digits, first_weight) {
        10 => 0,
        r => r,
    }
}

/// Validate a CPF (individual tax id).
///
/// Non-digits are ignored. The number must have 11 digits, must not be a
/// repetition of one digit, and must carry the two mod-11 check digits
/// (weights 10..2, then 11..2).
pub fn validate_tax_id(value: &str) -> bool {
    let digits = digit_values(value);
    if digits.len() != 11 || all_identical(&digits) {
        return false;
    }

    cpf_check_digit(&digits[..9], 10) == digits[9]
        && cpf_check_digit(&digits[..10], 11) == digits[10]
}

/// Validate an RG (state identity card). Issuing states use different
/// layouts, so only a minimum of 7 digits is required.
pub fn validate_national_id(value: &str) -> bool {
    only_digits(value).len() >= 7
}

fn cnpj_check_digit(digits: &[u32]) -> u32 {
    // Weights cycle 2..9 from the rightmost digit.
    let sum: u32 = digits
        .iter()
        .rev()
        .zip((2..=9).cycle())
        .map(|(d, w)| d * w)
        .sum();
    match sum % 11 {
        r if r < 2 => 0,
        r => 11 - r,
    }
}

/// Validate a CNPJ (company tax id): 14 digits with two mod-11 check digits.
pub fn validate_company_tax_id(value: &str) -> bool {
    let digits = digit_values(value);
    if digits.len() != 14 || all_identical(&digits) {
        return false;
    }

    cnpj_check_digit(&digits[..12]) == digits[12] && cnpj_check_digit(&digits[..13]) == digits[13]
}

/// Insert separators between digit groups as the digits arrive. A group's
/// leading separator only appears once the group has at least one digit;
/// digits beyond the last group are dropped.
fn format_grouped(value: &str, groups: &[(usize, &str)]) -> String {
    let digits = only_digits(value);
    let mut out = String::with_capacity(digits.len() + groups.len());
    let mut rest = digits.as_str();

    for (len, separator) in groups {
        if rest.is_empty() {
            break;
        }
        let take = (*len).min(rest.len());
        if !out.is_empty() {
            out.push_str(separator);
        }
        out.push_str(&rest[..take]);
        rest = &rest[take..];
    }

    out
}

/// Format a CPF as `###.###.###-##`, progressively for partial input.
/// Idempotent.
pub fn format_tax_id(value: &str) -> String {
    format_grouped(value, &[(3, ""), (3, "."), (3, "."), (2, "-")])
}

/// Format a CNPJ as `##.###.###/####-##`, progressively for partial input.
pub fn format_company_tax_id(value: &str) -> String {
    format_grouped(value, &[(2, ""), (3, "."), (3, "."), (4, "/"), (2, "-")])
}
