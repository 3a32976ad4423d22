//! Verm City pricing page (Chinese edition).
//!
//! Content blocks live under `section.Main-content > div`; inside each block
//! the `div.block-content` children are read by position.

use crate::models::{Category, Package, PriceTag};
use crate::scraper::cleaner::{
    decode_price_tag, normalize, nth_field, remove_parentheses, split_at_dollar,
    split_trailing_fields,
};
use crate::scraper::error::ExtractResult;
use crate::scraper::query::{DocumentQuery, Fragment};

use super::{GymSite, SectionExtractor, Variants, drop_unpriced, join_title, require_price};

const CONTENT: &str = "div.block-content";
const PASSES_BLOCK: &str = "section.Main-content > div > div:nth-of-type(4) > div > div:nth-of-type(1)";

pub struct VermCity;

impl GymSite for VermCity {
    fn key(&self) -> &'static str {
        "vermcity"
    }

    fn name(&self) -> &'static str {
        "Verm City"
    }

    fn default_url(&self) -> &'static str {
        "https://www.vermcity.com/pricing-chi"
    }

    fn sections(&self) -> Vec<Box<dyn SectionExtractor>> {
        vec![
            Box::new(DayPass),
            Box::new(ClipNClimb),
            Box::new(SharePass),
            Box::new(Membership),
        ]
    }
}

/// "成人 $180" → ("成人", Some($180))
fn labelled_price(raw: &str) -> ExtractResult<(&str, Option<PriceTag>)> {
    Ok((nth_field(raw, 0)?, decode_price_tag(nth_field(raw, 1)?)?))
}

// ── Day pass ──────────────────────────────────────────────────────────────────

struct DayPass;

impl DayPass {
    const BLOCK: &'static str = "section.Main-content > div > div:nth-of-type(3) > div:nth-of-type(4)";
    const HEADING: usize = 1;
    const PRICE: usize = 2;
    const TAGS: [usize; 4] = [3, 4, 5, 6];
}

impl SectionExtractor for DayPass {
    fn section(&self) -> &'static str {
        "day-pass"
    }

    fn locate<'p>(&self, page: &'p dyn DocumentQuery) -> ExtractResult<Fragment<'p>> {
        page.select_first(Self::BLOCK)
    }

    fn extract(&self, fragment: &dyn DocumentQuery) -> ExtractResult<Variants> {
        let content = fragment.select_first(CONTENT)?;
        let heading = normalize(&content.child_text(Self::HEADING)?);

        let package = content.child_text(Self::PRICE).and_then(|raw| {
            let (label, tag) = labelled_price(&raw)?;
            let title = join_title(&heading, label);
            let tags: Vec<String> = Self::TAGS
                .iter()
                .filter_map(|&n| content.child_text(n).ok())
                .collect();
            Ok(Package::new(&title, Category::DayPass, require_price(&title, tag)?)?.with_tags(tags))
        });
        Ok(vec![package])
    }
}

// ── Clip 'n Climb ─────────────────────────────────────────────────────────────

/// One single-session pass and one 10-session share pass.
struct ClipNClimb;

impl ClipNClimb {
    const BLOCK: &'static str = "section.Main-content > div > div:nth-of-type(3) > div:nth-of-type(2)";
    const HEADING: usize = 1;
    /// "單次 $120"
    const SESSION: usize = 2;
    /// "10次 $1,000 (6個月)"
    const TEN_PASS: usize = 3;
    const TAGS: usize = 5;
}

impl SectionExtractor for ClipNClimb {
    fn section(&self) -> &'static str {
        "clip-n-climb"
    }

    fn locate<'p>(&self, page: &'p dyn DocumentQuery) -> ExtractResult<Fragment<'p>> {
        page.select_first(Self::BLOCK)
    }

    fn extract(&self, fragment: &dyn DocumentQuery) -> ExtractResult<Variants> {
        let content = fragment.select_first(CONTENT)?;
        let heading = normalize(&content.child_text(Self::HEADING)?);
        let tags: Vec<String> = content.child_text(Self::TAGS).ok().into_iter().collect();

        let session = content.child_text(Self::SESSION).and_then(|raw| {
            let (label, tag) = labelled_price(&raw)?;
            // Label only; the price already lives in the package, not the title.
            let title = join_title(&heading, label);
            Ok(Package::new(&title, Category::SectionPass, require_price(&title, tag)?)?
                .with_tags(&tags))
        });

        let ten_pass = content.child_text(Self::TEN_PASS).and_then(|raw| {
            let (label, tag) = labelled_price(&raw)?;
            let title = join_title(&heading, label);
            Ok(Package::new(&title, Category::SharePass, require_price(&title, tag)?)?
                .with_tags(&tags)
                .with_validity(remove_parentheses(nth_field(&raw, 2)?)))
        });

        Ok(vec![session, ten_pass])
    }
}

// ── Share passes ──────────────────────────────────────────────────────────────

/// Rows read "<name> <(validity)> <price>".
struct SharePass;

impl SharePass {
    const ROWS: [usize; 2] = [6, 7];
    const RESTRICTION: &'static str = "只限";

    fn row(raw: &str) -> ExtractResult<Option<Package>> {
        let (name, validity, price) = split_trailing_fields(raw)?;
        let Some(tag) = decode_price_tag(price)? else {
            return Ok(None);
        };
        let validity = remove_parentheses(validity).replace(Self::RESTRICTION, "");
        Ok(Some(
            Package::new(name, Category::SharePass, tag)?.with_validity(validity),
        ))
    }
}

impl SectionExtractor for SharePass {
    fn section(&self) -> &'static str {
        "share-pass"
    }

    fn locate<'p>(&self, page: &'p dyn DocumentQuery) -> ExtractResult<Fragment<'p>> {
        page.select_first(PASSES_BLOCK)
    }

    fn extract(&self, fragment: &dyn DocumentQuery) -> ExtractResult<Variants> {
        let content = fragment.select_first(CONTENT)?;
        let rows = Self::ROWS
            .iter()
            .map(|&n| content.child_text(n).and_then(|raw| Self::row(&raw)))
            .collect();
        Ok(drop_unpriced(rows))
    }
}

// ── Membership ────────────────────────────────────────────────────────────────

/// A heading followed by four "<term> $<price>" clauses.
struct Membership;

impl Membership {
    const HEADING: usize = 1;
    const CLAUSES: [usize; 4] = [2, 3, 4, 5];

    fn clause(heading: &str, raw: &str) -> ExtractResult<Package> {
        let (term, price) = split_at_dollar(raw)?;
        let term = normalize(term);
        let title = join_title(heading, &term);
        let tag = decode_price_tag(&price)?;
        Ok(Package::new(&title, Category::Membership, require_price(&title, tag)?)?
            .with_validity(term))
    }
}

impl SectionExtractor for Membership {
    fn section(&self) -> &'static str {
        "membership"
    }

    fn locate<'p>(&self, page: &'p dyn DocumentQuery) -> ExtractResult<Fragment<'p>> {
        page.select_first(PASSES_BLOCK)
    }

    fn extract(&self, fragment: &dyn DocumentQuery) -> ExtractResult<Variants> {
        let content = fragment.select_first(CONTENT)?;
        let heading = normalize(&content.child_text(Self::HEADING)?);
        Ok(Self::CLAUSES
            .iter()
            .map(|&n| content.child_text(n).and_then(|raw| Self::clause(&heading, &raw)))
            .collect())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
