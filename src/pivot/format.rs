//! Cell value formatting.

use crate::model::ValueType;

/// How values of one indicator are displayed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueFormat {
    pub value_type: ValueType,
    pub unit: Option<String>,
    pub decimal_places: usize,
}

impl ValueFormat {
    pub fn new(value_type: ValueType, unit: Option<String>, decimal_places: usize) -> Self {
        Self {
            value_type,
            unit,
            decimal_places,
        }
    }

    /// Plain integers, used when no indicator applies.
    pub fn integer() -> Self {
        Self::new(ValueType::Integer, None, 0)
    }

    pub fn format(&self, value: f64) -> String {
        let value = if value.is_finite() { value } else { 0.0 };
        match self.value_type {
            ValueType::Integer => group_thousands(&format!("{:.0}", value)),
            ValueType::Decimal => {
                group_thousands(&format!("{:.*}", self.decimal_places, value))
            }
            ValueType::Percentage => format!("{:.*}%", self.decimal_places, value),
            ValueType::Currency => {
                let amount = group_thousands(&format!("{:.*}", self.decimal_places, value));
                match &self.unit {
                    Some(unit) => format!("{} {}", amount, unit),
                    None => amount,
                }
            }
        }
    }
}

/// Insert a space every three digits of the integer part.
fn group_thousands(number: &str) -> String {
    let (sign, rest) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rest, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }

    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}
