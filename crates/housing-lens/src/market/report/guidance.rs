use serde::Serialize;

const YOUNG_BUYER_AGE: u8 = 30;
const INCOME_THRESHOLD: f64 = 20_000.0;

/// Short advice chosen from the buyer's age and income bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Guidance {
    AffordableFirst,
    BroadOptions,
    CompareByBudget,
}

impl Guidance {
    pub fn for_profile(age: u8, annual_income: f64) -> Self {
        match (age < YOUNG_BUYER_AGE, annual_income < INCOME_THRESHOLD) {
            (true, true) => Self::AffordableFirst,
            (false, false) => Self::BroadOptions,
            _ => Self::CompareByBudget,
        }
    }

    pub const fn message(self) -> &'static str {
        match self {
            Self::AffordableFirst => {
                "Explore more affordable options and check assistance programs for young buyers."
            }
            Self::BroadOptions => "There are options available in mid-range and upper-range areas.",
            Self::CompareByBudget => "Compare different areas against your budget and preferences.",
        }
    }
}
