use std::fmt::Display;

use serde::{Deserialize, Serialize};
use sqlx::Type;

//--------------------------------------        Won           ---------------------------------------------------------
/// An amount of money in whole currency units. The won has no minor unit, so every price, payment and receipt
/// amount in the system is an integer.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Won(i64);

impl From<i64> for Won {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for Won {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}₩{grouped}")
    }
}

impl Won {
    pub fn value(&self) -> i64 {
        self.0
    }
}
