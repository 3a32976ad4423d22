//! Just Climb price page.
//!
//! Every block is an anchor `div#…` holding the `h4` heading, followed by a
//! sibling `div` with one or more `div.shoppage-title` items.

use crate::models::{Category, Package};
use crate::scraper::cleaner::{decode_price_tag, normalize, nth_field, split_at_dollar, split_bar};
use crate::scraper::error::{ExtractError, ExtractResult};
use crate::scraper::query::{DocumentQuery, Fragment};

use super::{GymSite, SectionExtractor, Variants, drop_unpriced, join_title, require_price};

const HEADING: &str = "h4";
const ITEM: &str = "div.shoppage-title";

pub struct JustClimb;

impl GymSite for JustClimb {
    fn key(&self) -> &'static str {
        "justclimb"
    }

    fn name(&self) -> &'static str {
        "Just Climb"
    }

    fn default_url(&self) -> &'static str {
        "https://justclimb.hk/price/"
    }

    fn sections(&self) -> Vec<Box<dyn SectionExtractor>> {
        vec![
            Box::new(DayPass),
            Box::new(SharePass),
            Box::new(MonthPass),
            Box::new(Membership),
        ]
    }
}

fn base_title(anchor: &dyn DocumentQuery) -> ExtractResult<String> {
    Ok(normalize(&anchor.select_text(HEADING)?))
}

/// The `div` right after the anchor.
fn detail<'a>(anchor: &'a dyn DocumentQuery, path: &str) -> ExtractResult<Fragment<'a>> {
    anchor
        .following_sibling("div")
        .ok_or_else(|| ExtractError::missing(format!("{} ~ div", path)))
}

// ── Day pass ──────────────────────────────────────────────────────────────────

struct DayPass;

impl DayPass {
    const ANCHOR: &'static str = "div#day-pass";
    const TAG_LEAD: &'static str = "p:nth-of-type(1)";
    const TAG_TAIL: &'static str = "p:nth-of-type(3)";
    const ADULT_PRICE: usize = 2;
    const STUDENT_PRICE: usize = 3;
    const CLASS_TITLE: usize = 1;
    const CLASS_PRICE: usize = 2;
    const CLASS_TAGS: usize = 3;
    const VALIDITY: &'static str = "一日";

    fn tags(item: &dyn DocumentQuery) -> ExtractResult<Vec<String>> {
        let mut tags: Vec<String> = item.select_texts(Self::TAG_LEAD)?.into_iter().take(1).collect();
        tags.extend(item.select_texts(Self::TAG_TAIL)?);
        Ok(tags)
    }

    fn adult(base: &str, item: &dyn DocumentQuery, tags: &[String]) -> ExtractResult<Package> {
        let title = join_title(base, "Adult");
        let tag = decode_price_tag(&item.child_text(Self::ADULT_PRICE)?)?;
        Ok(Package::new(&title, Category::DayPass, require_price(&title, tag)?)?
            .with_tags(tags)
            .with_validity(Self::VALIDITY))
    }

    /// "學生 $120" → $120
    fn student(base: &str, item: &dyn DocumentQuery, tags: &[String]) -> ExtractResult<Package> {
        let title = join_title(base, "Student");
        let raw = item.child_text(Self::STUDENT_PRICE)?;
        let tag = decode_price_tag(nth_field(&raw, 1)?)?;
        Ok(Package::new(&title, Category::DayPass, require_price(&title, tag)?)?
            .with_tags(tags)
            .with_validity(Self::VALIDITY))
    }

    /// Second item is a class, packed as `title｜tag` / price / `tag｜tag…`.
    fn class(item: &dyn DocumentQuery) -> ExtractResult<Package> {
        let raw_title = item.child(Self::CLASS_TITLE)?.select_text("span")?;
        let raw_price = item.child(Self::CLASS_PRICE)?.select_text("span")?;
        let raw_tags = item.child(Self::CLASS_TAGS)?.select_text("span")?;

        let parts = split_bar(&raw_title);
        let [title, lead, ..] = parts[..] else {
            return Err(ExtractError::layout("`title｜tag`", raw_title.as_str()));
        };
        let title = normalize(title);
        let tag = decode_price_tag(&raw_price)?;
        Ok(Package::new(&title, Category::Class, require_price(&title, tag)?)?
            .with_tags(std::iter::once(lead).chain(split_bar(&raw_tags))))
    }
}

impl SectionExtractor for DayPass {
    fn section(&self) -> &'static str {
        "day-pass"
    }

    fn locate<'p>(&self, page: &'p dyn DocumentQuery) -> ExtractResult<Fragment<'p>> {
        page.select_first(Self::ANCHOR)
    }

    fn extract(&self, anchor: &dyn DocumentQuery) -> ExtractResult<Variants> {
        let base = base_title(anchor)?;
        let detail = detail(anchor, Self::ANCHOR)?;
        let items = detail.select_all(ITEM)?;
        let first = items.first().ok_or_else(|| ExtractError::missing(ITEM))?;
        let tags = Self::tags(first.as_ref())?;

        let class = match items.get(1) {
            Some(item) => Self::class(item.as_ref()),
            None => Err(ExtractError::missing(format!("{} [1]", ITEM))),
        };

        Ok(vec![
            Self::adult(&base, first.as_ref(), &tags),
            Self::student(&base, first.as_ref(), &tags),
            class,
        ])
    }
}

// ── Share pass ────────────────────────────────────────────────────────────────

struct SharePass;

impl SharePass {
    const ANCHOR: &'static str = "div#share-climb";
    const ROW: &'static str = "div.grve-text";
    const ROW_TITLE: usize = 1;
    const ROW_PRICE: usize = 2;
    /// Text nodes: [tag, validity]
    const ROW_NOTES: &'static str = "p:nth-of-type(2)";
    const VALIDITY_PREFIX: &'static str = "有效期";

    fn row(base: &str, row: &dyn DocumentQuery) -> ExtractResult<Option<Package>> {
        let Some(label) = row.child(Self::ROW_TITLE).ok().and_then(|c| c.own_text()) else {
            return Ok(None);
        };
        let Some(raw_price) = row.child(Self::ROW_PRICE).ok().and_then(|c| c.own_text()) else {
            return Ok(None);
        };
        let Some(tag) = decode_price_tag(&raw_price)? else {
            return Ok(None);
        };

        let notes = row.select_texts(Self::ROW_NOTES)?;
        let mut package = Package::new(join_title(base, &normalize(&label)), Category::SharePass, tag)?
            .with_tags(notes.first());
        if let Some(validity) = notes.get(1) {
            package = package.with_validity(validity.trim().replace(Self::VALIDITY_PREFIX, ""));
        }
        Ok(Some(package))
    }
}

impl SectionExtractor for SharePass {
    fn section(&self) -> &'static str {
        "share-pass"
    }

    fn locate<'p>(&self, page: &'p dyn DocumentQuery) -> ExtractResult<Fragment<'p>> {
        page.select_first(Self::ANCHOR)
    }

    fn extract(&self, anchor: &dyn DocumentQuery) -> ExtractResult<Variants> {
        let base = base_title(anchor)?;
        let detail = detail(anchor, Self::ANCHOR)?;
        let rows = detail
            .select_all(Self::ROW)?
            .iter()
            .map(|row| Self::row(&base, row.as_ref()))
            .collect();
        Ok(drop_unpriced(rows))
    }
}

// ── Month pass ────────────────────────────────────────────────────────────────

struct MonthPass;

impl MonthPass {
    const ANCHOR: &'static str = "div#monthly-pass";
    const TAGS: &'static str = "p:nth-of-type(1) > span";
    const ADULT_PRICE: usize = 2;
    const STUDENT_PRICE: usize = 3;
    const VALIDITY: &'static str = "一個月";

    fn variant(
        base: &str,
        qualifier: &str,
        raw_price: &str,
        tags: &[String],
    ) -> ExtractResult<Package> {
        let title = join_title(base, qualifier);
        let tag = decode_price_tag(raw_price)?;
        Ok(Package::new(&title, Category::MonthPass, require_price(&title, tag)?)?
            .with_tags(tags)
            .with_validity(Self::VALIDITY))
    }
}

impl SectionExtractor for MonthPass {
    fn section(&self) -> &'static str {
        "month-pass"
    }

    fn locate<'p>(&self, page: &'p dyn DocumentQuery) -> ExtractResult<Fragment<'p>> {
        page.select_first(Self::ANCHOR)
    }

    fn extract(&self, anchor: &dyn DocumentQuery) -> ExtractResult<Variants> {
        let base = base_title(anchor)?;
        let detail = detail(anchor, Self::ANCHOR)?;
        let item = detail.select_first(ITEM)?;
        let tags: Vec<String> = item.select_texts(Self::TAGS)?.into_iter().take(1).collect();

        let adult = item
            .child(Self::ADULT_PRICE)
            .and_then(|c| c.select_text("span"))
            .and_then(|raw| Self::variant(&base, "Adult", &raw, &tags));
        let student = item
            .child(Self::STUDENT_PRICE)
            .and_then(|c| c.select_text("span"))
            .and_then(|raw| Self::variant(&base, "Student", nth_field(&raw, 1)?, &tags));

        Ok(vec![adult, student])
    }
}

// ── Membership ────────────────────────────────────────────────────────────────

struct Membership;

impl Membership {
    const ANCHOR: &'static str = "div#just-climber";
    const PRICE: usize = 1;
    const TITLE: usize = 2;
    const TAGS: usize = 4;
    const CONTRACT: &'static str = "合約";

    fn item(item: &dyn DocumentQuery) -> ExtractResult<Package> {
        let title = normalize(&item.child_text(Self::TITLE)?);
        let (_, raw_price) = split_at_dollar(&item.child_text(Self::PRICE)?)?;
        let tag = decode_price_tag(&raw_price)?;
        let validity = title.replace(Self::CONTRACT, "");
        Ok(Package::new(&title, Category::Membership, require_price(&title, tag)?)?
            .with_tags(item.child(Self::TAGS)?.own_texts())
            .with_validity(validity))
    }
}

impl SectionExtractor for Membership {
    fn section(&self) -> &'static str {
        "membership"
    }

    fn locate<'p>(&self, page: &'p dyn DocumentQuery) -> ExtractResult<Fragment<'p>> {
        page.select_first(Self::ANCHOR)
    }

    fn extract(&self, anchor: &dyn DocumentQuery) -> ExtractResult<Variants> {
        let detail = detail(anchor, Self::ANCHOR)?;
        let item = detail.select_first(ITEM)?;
        Ok(vec![Self::item(item.as_ref())])
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
