//! Conversion between integer amounts and thousands-grouped display strings (`1500000` ⇄
//! `"1.500.000"`).

pub const DEFAULT_GROUP_SEPARATOR: char = '.';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyFormatter {
    separator: char,
}

impl Default for CurrencyFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_GROUP_SEPARATOR)
    }
}

impl CurrencyFormatter {
    /// Digits are never accepted as a separator; they fall back to the default.
    pub fn new(separator: char) -> Self {
        let separator = if separator.is_ascii_digit() {
            DEFAULT_GROUP_SEPARATOR
        } else {
            separator
        };
        Self { separator }
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn format(&self, amount: u64) -> String {
        let digits = amount.to_string();
        let mut out = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push(self.separator);
            }
            out.push(ch);
        }
        out
    }

    /// Strips every non-digit and reads the rest as base 10. Empty, non-numeric or
    /// out-of-range input yields 0.
    pub fn parse(&self, display: &str) -> u64 {
        let digits: String = display.chars().filter(|c| c.is_ascii_digit()).collect();
        digits.parse().unwrap_or(0)
    }

    /// Canonical display form of arbitrary user input.
    pub fn normalize(&self, display: &str) -> String {
        self.format(self.parse(display))
    }
}
