use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::scraper::error::{ExtractError, ExtractResult};
use crate::utils::fmt_price;

// ── Category ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    DayPass,
    MultiPass,
    SharePass,
    MonthPass,
    Membership,
    Class,
    EqRental,
    SectionPass,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::DayPass => "day-pass",
            Category::MultiPass => "multi-pass",
            Category::SharePass => "share-pass",
            Category::MonthPass => "month-pass",
            Category::Membership => "membership",
            Category::Class => "class",
            Category::EqRental => "eq-rental",
            Category::SectionPass => "section-pass",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Price tag ─────────────────────────────────────────────────────────────────

/// Currency marker + amount as printed on the page. "$1,200" → ("$", 1200)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceTag {
    pub currency_symbol: String,
    pub price: u32,
}

impl PriceTag {
    pub fn new(currency_symbol: impl Into<String>, price: u32) -> Self {
        Self {
            currency_symbol: currency_symbol.into(),
            price,
        }
    }

    /// Plain dollar amount, for pages that print the number without a symbol.
    pub fn dollars(price: u32) -> Self {
        Self::new("$", price)
    }
}

impl fmt::Display for PriceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&fmt_price(&self.currency_symbol, self.price))
    }
}

// ── Package ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Package {
    pub title: String,
    pub category: Category,
    pub tags: BTreeSet<String>,
    pub currency_symbol: String,
    pub price: u32,
    pub validity: Option<String>,
}

impl Package {
    /// A package only exists once it has a title and a decoded price.
    pub fn new(title: impl Into<String>, category: Category, tag: PriceTag) -> ExtractResult<Self> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(ExtractError::EmptyTitle);
        }
        Ok(Self {
            title,
            category,
            tags: BTreeSet::new(),
            currency_symbol: tag.currency_symbol,
            price: tag.price,
            validity: None,
        })
    }

    /// Blank tags are dropped, duplicates collapse.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags.extend(
            tags.into_iter()
                .map(|t| t.as_ref().trim().to_string())
                .filter(|t| !t.is_empty()),
        );
        self
    }

    pub fn price_tag(&self) -> PriceTag {
        PriceTag::new(self.currency_symbol.as_str(), self.price)
    }

    pub fn with_validity(mut self, validity: impl Into<String>) -> Self {
        let validity = validity.into().trim().to_string();
        self.validity = if validity.is_empty() { None } else { Some(validity) };
        self
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.title,
            self.category,
            self.price_tag()
        )?;
        if let Some(v) = &self.validity {
            write!(f, " ({})", v)?;
        }
        Ok(())
    }
}

// ── Gym ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum SectionOutcome {
    /// Section parsed; `skipped` lists variants that failed on their own.
    Extracted { packages: usize, skipped: Vec<String> },
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectionReport {
    pub section: String,
    pub outcome: SectionOutcome,
}

impl SectionReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, SectionOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Gym {
    pub name: String,
    pub link: Option<String>,
    pub scraped_at: NaiveDateTime,
    pub packages: Vec<Package>,
    pub sections: Vec<SectionReport>,
}

impl Gym {
    pub fn failed_sections(&self) -> impl Iterator<Item = &SectionReport> {
        self.sections.iter().filter(|s| s.is_failed())
    }

    /// Failed sections plus individually skipped variants.
    pub fn error_count(&self) -> usize {
        self.sections
            .iter()
            .map(|s| match &s.outcome {
                SectionOutcome::Failed { .. } => 1,
                SectionOutcome::Extracted { skipped, .. } => skipped.len(),
            })
            .sum()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
