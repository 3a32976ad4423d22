//! Per-gym extraction rules.
//!
//! Every site is an ordered list of sections. A section knows where its
//! fragment sits in the page and how to turn it into packages; markup
//! positions are declared as constants on each extractor.

pub mod atticv;
pub mod justclimb;
pub mod vermcity;

use tracing::debug;

use crate::models::{Package, PriceTag};
use crate::scraper::error::{ExtractError, ExtractResult};
use crate::scraper::query::{DocumentQuery, Fragment};

/// One entry per variant; a failed variant does not sink its siblings.
pub type Variants = Vec<ExtractResult<Package>>;

pub trait SectionExtractor: Send + Sync {
    /// Name used in reports and logs.
    fn section(&self) -> &'static str;

    fn locate<'p>(&self, page: &'p dyn DocumentQuery) -> ExtractResult<Fragment<'p>>;

    /// Section-level failures (missing shared fields, broken layout) are
    /// returned as `Err`; per-variant failures go inside the list.
    fn extract(&self, fragment: &dyn DocumentQuery) -> ExtractResult<Variants>;
}

pub trait GymSite: Send + Sync {
    fn key(&self) -> &'static str;
    fn name(&self) -> &'static str;
    fn default_url(&self) -> &'static str;

    /// Sections in output order.
    fn sections(&self) -> Vec<Box<dyn SectionExtractor>>;
}

pub fn all() -> Vec<Box<dyn GymSite>> {
    vec![
        Box::new(justclimb::JustClimb),
        Box::new(atticv::AtticV),
        Box::new(vermcity::VermCity),
    ]
}

pub fn by_key(key: &str) -> Option<Box<dyn GymSite>> {
    all().into_iter().find(|s| s.key().eq_ignore_ascii_case(key.trim()))
}

// ── Shared rules ──────────────────────────────────────────────────────────────

/// A variant that must carry a price.
pub(crate) fn require_price(title: &str, tag: Option<PriceTag>) -> ExtractResult<PriceTag> {
    tag.ok_or_else(|| ExtractError::MissingPrice {
        title: title.to_string(),
    })
}

/// Share-pass rows without a price, or priced at zero, are separators or
/// headers in the markup and are left out.
pub(crate) fn drop_unpriced(rows: Vec<ExtractResult<Option<Package>>>) -> Variants {
    rows.into_iter()
        .filter_map(|row| match row {
            Ok(Some(p)) if p.price > 0 => Some(Ok(p)),
            Ok(Some(p)) => {
                debug!("Dropping zero-priced row {:?}", p.title);
                None
            }
            Ok(None) => {
                debug!("Dropping row without a price");
                None
            }
            Err(e) => Some(Err(e)),
        })
        .collect()
}

/// `base + " " + qualifier`, either side may be blank.
pub(crate) fn join_title(base: &str, qualifier: &str) -> String {
    [base.trim(), qualifier.trim()]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn row(title: &str, price: Option<u32>) -> ExtractResult<Option<Package>> {
        match price {
            Some(p) => Package::new(title, Category::SharePass, PriceTag::dollars(p)).map(Some),
            None => Ok(None),
        }
    }

    #[test]
    fn test_drop_unpriced_keeps_priced_rows_and_errors() {
        let rows = vec![
            row("10-Pass", Some(800)),
            row("— header —", None),
            row("Free trial", Some(0)),
            Err(ExtractError::MalformedPrice {
                raw: "$abc".into(),
                reason: "invalid digit".into(),
            }),
        ];
        let kept = drop_unpriced(rows);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].as_ref().unwrap().price, 800);
        assert!(kept[1].is_err());
    }

    #[test]
    fn test_by_key() {
        assert_eq!(by_key("justclimb").unwrap().name(), "Just Climb");
        assert_eq!(by_key(" AtticV ").unwrap().name(), "Attic V");
        assert!(by_key("nowhere").is_none());
    }

    #[test]
    fn test_join_title() {
        assert_eq!(join_title("Day Pass", "Adult"), "Day Pass Adult");
        assert_eq!(join_title("Day Pass ", ""), "Day Pass");
    }

    #[test]
    fn test_require_price() {
        assert!(matches!(
            require_price("Adult", None),
            Err(ExtractError::MissingPrice { .. })
        ));
        assert_eq!(require_price("Adult", Some(PriceTag::dollars(1))).unwrap().price, 1);
    }
}
