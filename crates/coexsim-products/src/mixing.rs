//! Mixing terms and order tagging.
//!
//! Every enumerated product is described by a term `m·X ± n·Y` over two
//! tones. The product family is derived from the exponent sum `m + n` of
//! that term, never from the enumeration branch that produced it, so a
//! `4·A ± B` generated next to the IM3 products is still labelled IM5.

use coexsim_common::{BandEdge, ProductType};

/// One transmit edge used as a mixing input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone<'a> {
    /// Band code the tone belongs to.
    pub code: &'a str,
    /// Which transmit edge.
    pub edge: BandEdge,
    /// Frequency in MHz.
    pub freq: f64,
}

impl<'a> Tone<'a> {
    /// Create a tone.
    pub fn new(code: &'a str, edge: BandEdge, freq: f64) -> Self {
        Tone { code, edge, freq }
    }

    /// Formula label, e.g. `LTE_B13_high`.
    pub fn label(&self) -> String {
        format!("{}_{}", self.code, self.edge.as_str())
    }
}

/// Sign joining the two tones of a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    /// `m·X + n·Y`
    Plus,
    /// `m·X - n·Y`
    Minus,
}

impl Sign {
    /// Both signs, minus first.
    pub const BOTH: [Sign; 2] = [Sign::Minus, Sign::Plus];

    fn factor(&self) -> f64 {
        match self {
            Sign::Plus => 1.0,
            Sign::Minus => -1.0,
        }
    }

    /// Operator character.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sign::Plus => "+",
            Sign::Minus => "-",
        }
    }
}

/// A mixing term `m·X ± n·Y`. A pure harmonic has `n == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixingTerm {
    /// Coefficient of the leading tone.
    pub m: u32,
    /// Coefficient of the trailing tone.
    pub n: u32,
    /// Sign applied to the trailing tone.
    pub sign: Sign,
}

impl MixingTerm {
    /// Create a two-tone term.
    pub fn new(m: u32, n: u32, sign: Sign) -> Self {
        MixingTerm { m, n, sign }
    }

    /// Create a single-tone harmonic term.
    pub fn harmonic(order: u32) -> Self {
        MixingTerm { m: order, n: 0, sign: Sign::Plus }
    }

    /// Exponent sum of the term (the nonlinearity order).
    pub fn exponent_sum(&self) -> u32 {
        self.m + self.n
    }

    /// Product frequency for the given tone frequencies.
    pub fn frequency(&self, x: f64, y: f64) -> f64 {
        self.m as f64 * x + self.sign.factor() * self.n as f64 * y
    }

    /// Family implied by the exponent sum.
    pub fn product_type(&self) -> Option<ProductType> {
        if self.n == 0 {
            ProductType::from_harmonic_order(self.m)
        } else {
            ProductType::from_intermod_order(self.exponent_sum())
        }
    }

    /// Symbolic formula over tone labels, e.g. `2×LTE_B13_low - LTE_B26_high`.
    pub fn formula(&self, x: &Tone<'_>, y: &Tone<'_>) -> String {
        format!(
            "{}{} {} {}{}",
            coefficient(self.m),
            x.label(),
            self.sign.as_str(),
            coefficient(self.n),
            y.label()
        )
    }

    /// Numeric expression, e.g. `2×777 - 798`.
    pub fn arithmetic(&self, x: f64, y: f64) -> String {
        if self.n == 0 {
            return format!("{}×{}", self.m, x);
        }
        format!(
            "{}{} {} {}{}",
            coefficient(self.m),
            x,
            self.sign.as_str(),
            coefficient(self.n),
            y
        )
    }
}

fn coefficient(c: u32) -> String {
    if c == 1 {
        String::new()
    } else {
        format!("{}×", c)
    }
}

/// Ordinal text for a harmonic order.
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (1, r) if r != 11 => "st",
        (2, r) if r != 12 => "nd",
        (3, r) if r != 13 => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}
