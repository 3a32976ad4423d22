//! Attic V membership page.
//!
//! The page is a Wix grid: pass sections are the grandchildren of
//! `.c4inlineContent`, picked by index. Equipment rental sits in the last
//! child of the grid container.

use crate::models::{Category, Package, PriceTag};
use crate::scraper::cleaner::{
    before_unit, normalize, parse_amount, split_currency_amount, split_label, split_label_price,
    split_priced_variant, split_variants, valid_for,
};
use crate::scraper::error::ExtractResult;
use crate::scraper::query::{DocumentQuery, Fragment};

use super::{GymSite, SectionExtractor, Variants, drop_unpriced};

const SECTIONS: &str =
    "div#masterPage #cuy0inlineContent-gridContainer .c4inlineContent > div > div";
const EXTRA: &str = "div#masterPage #cuy0inlineContent-gridContainer > div:last-child";

const HKD: &str = "HK$";

pub struct AtticV;

impl GymSite for AtticV {
    fn key(&self) -> &'static str {
        "atticv"
    }

    fn name(&self) -> &'static str {
        "Attic V"
    }

    fn default_url(&self) -> &'static str {
        "https://www.atticv.com.hk/membership"
    }

    fn sections(&self) -> Vec<Box<dyn SectionExtractor>> {
        vec![
            Box::new(DayPass),
            Box::new(MultiPass),
            Box::new(SharePass::TEN),
            Box::new(SharePass::FIVE),
            Box::new(EqRental),
        ]
    }
}

// ── Day pass ──────────────────────────────────────────────────────────────────

/// One text node carries both variants:
/// "Adult - HK$ 150/day; Student - HK$ 120/day"
struct DayPass;

impl DayPass {
    const INDEX: usize = 0;
    const CONTENT: &'static str = "div:nth-of-type(3)";
    const BASE_TITLE: &'static str = "h6 > span";
    const PRICES: &'static str = "h6 > span > span > span";
    const DESCRIPTION: &'static str = "p:nth-of-type(2)";
    const VALIDITY: &'static str = "1 day";
}

impl SectionExtractor for DayPass {
    fn section(&self) -> &'static str {
        "day-pass"
    }

    fn locate<'p>(&self, page: &'p dyn DocumentQuery) -> ExtractResult<Fragment<'p>> {
        page.select_nth(SECTIONS, Self::INDEX)
    }

    fn extract(&self, fragment: &dyn DocumentQuery) -> ExtractResult<Variants> {
        let content = fragment.select_first(Self::CONTENT)?;
        let base = normalize(&content.select_text(Self::BASE_TITLE)?);
        let prices = content.select_text(Self::PRICES)?;
        let description = content.select_text(Self::DESCRIPTION).ok();
        let (adult, student) = split_variants(&prices)?;

        Ok([adult, student]
            .into_iter()
            .map(|half| -> ExtractResult<Package> {
                let (label, tag) = split_priced_variant(half)?;
                Ok(Package::new(format!("{} - {}", base, label), Category::DayPass, tag)?
                    .with_tags(description.as_deref())
                    .with_validity(Self::VALIDITY))
            })
            .collect())
    }
}

// ── Multiple-entry passes ─────────────────────────────────────────────────────

/// Title and price of one multi-pass variant.
type VariantFn = fn(&dyn DocumentQuery, &str) -> ExtractResult<(String, u32)>;

/// Three variants, each read from its own spot in the markup.
struct MultiPass;

impl MultiPass {
    const INDEX: usize = 1;
    const CONTENT: &'static str = "div:nth-of-type(3)";
    const BASE_TITLE: &'static str = "h6";
    const NOTE: &'static str = ":nth-child(6) > span";
    const VALIDITY: &'static str = "p > span";
    const ADULT_LABEL: &'static str = "h6 > span > span:nth-of-type(1)";
    const ADULT_PRICE: &'static str = "h6 > span > span:nth-of-type(2)";
    /// "Student (18 or above) - HK$1,100"
    const OVER_18: &'static str = "h6:nth-of-type(2) > span > span";
    const UNDER_18_LABEL: &'static str = "h6:nth-of-type(3) > span > span";
    const UNDER_18_QUALIFIER: &'static str = "h6:nth-of-type(3) > span:nth-of-type(2) > span > span";
    const UNDER_18_PRICE: &'static str = "h6:nth-of-type(3) > span:nth-of-type(3) > span";

    fn package(title: String, price: u32, note: &str, validity: &str) -> ExtractResult<Package> {
        Ok(Package::new(title, Category::MultiPass, PriceTag::dollars(price))?
            .with_tags([note])
            .with_validity(validity))
    }

    /// "HK$ 1,300" or "HK$\u{a0}1,300" → 1300
    fn adult(content: &dyn DocumentQuery, base: &str) -> ExtractResult<(String, u32)> {
        let label = normalize(&content.select_text(Self::ADULT_LABEL)?);
        let price = split_currency_amount(&content.select_text(Self::ADULT_PRICE)?)?.price;
        Ok((format!("{} - {}", base, label), price))
    }

    fn over_18(content: &dyn DocumentQuery, base: &str) -> ExtractResult<(String, u32)> {
        let raw = normalize(&content.select_text(Self::OVER_18)?);
        let (label, price) = split_label(&raw)?;
        let price = parse_amount(&price.replace(HKD, ""))?;
        Ok((format!("{} - {}", base, normalize(label)), price))
    }

    fn under_18(content: &dyn DocumentQuery, base: &str) -> ExtractResult<(String, u32)> {
        let label = normalize(&content.select_text(Self::UNDER_18_LABEL)?);
        let qualifier = normalize(&content.select_text(Self::UNDER_18_QUALIFIER)?);
        let raw = normalize(&content.select_text(Self::UNDER_18_PRICE)?);
        let price = parse_amount(&raw.replace(HKD, ""))?;
        Ok((format!("{} - {} {}", base, label, qualifier), price))
    }
}

impl SectionExtractor for MultiPass {
    fn section(&self) -> &'static str {
        "multi-pass"
    }

    fn locate<'p>(&self, page: &'p dyn DocumentQuery) -> ExtractResult<Fragment<'p>> {
        page.select_nth(SECTIONS, Self::INDEX)
    }

    fn extract(&self, fragment: &dyn DocumentQuery) -> ExtractResult<Variants> {
        let content = fragment.select_first(Self::CONTENT)?;
        let content = content.as_ref();
        let base = normalize(&content.select_text(Self::BASE_TITLE)?);
        let note = content.select_text(Self::NOTE)?;
        let validity = valid_for(&content.select_text(Self::VALIDITY)?)?;

        let variants: [VariantFn; 3] = [Self::adult, Self::over_18, Self::under_18];
        Ok(variants
            .into_iter()
            .map(|variant| {
                let (title, price) = variant(content, &base)?;
                Self::package(title, price, &note, &validity)
            })
            .collect())
    }
}

// ── Share passes ──────────────────────────────────────────────────────────────

/// The 10- and 5-entry share passes share one layout, offset by one block.
struct SharePass {
    section: &'static str,
    index: usize,
    content: &'static str,
}

impl SharePass {
    const TEN: SharePass = SharePass {
        section: "share-pass-10",
        index: 2,
        content: "div:nth-of-type(3)",
    };
    const FIVE: SharePass = SharePass {
        section: "share-pass-5",
        index: 3,
        content: "div:nth-of-type(4)",
    };
    const TITLE: &'static str = "h6";
    const PRICE: &'static str = "h6 > span:nth-of-type(2) > span";
    const VALIDITY: &'static str = "p:nth-of-type(2) > span";

    fn package(content: &dyn DocumentQuery) -> ExtractResult<Option<Package>> {
        let title = normalize(&content.select_text(Self::TITLE)?);
        let raw = content.select_text(Self::PRICE)?;
        let price = parse_amount(&normalize(&raw.replace("HKD", "")))?;
        let validity = valid_for(&content.select_text(Self::VALIDITY)?)?;
        Ok(Some(
            Package::new(title, Category::SharePass, PriceTag::dollars(price))?
                .with_validity(validity),
        ))
    }
}

impl SectionExtractor for SharePass {
    fn section(&self) -> &'static str {
        self.section
    }

    fn locate<'p>(&self, page: &'p dyn DocumentQuery) -> ExtractResult<Fragment<'p>> {
        page.select_nth(SECTIONS, self.index)
    }

    fn extract(&self, fragment: &dyn DocumentQuery) -> ExtractResult<Variants> {
        let content = fragment.select_first(self.content)?;
        Ok(drop_unpriced(vec![Self::package(content.as_ref())]))
    }
}

// ── Equipment rental ──────────────────────────────────────────────────────────

/// "Climbing Shoes Rental: $30/pair"
struct EqRental;

impl EqRental {
    const TEXT: &'static str = "h6 > span > span";
}

impl SectionExtractor for EqRental {
    fn section(&self) -> &'static str {
        "eq-rental"
    }

    fn locate<'p>(&self, page: &'p dyn DocumentQuery) -> ExtractResult<Fragment<'p>> {
        page.select_first(EXTRA)
    }

    fn extract(&self, fragment: &dyn DocumentQuery) -> ExtractResult<Variants> {
        let raw = fragment.select_text(Self::TEXT)?;
        let (label, price) = split_label_price(&raw)?;
        let price = parse_amount(&before_unit(price).replace('$', ""))?;
        Ok(vec![Package::new(
            normalize(label),
            Category::EqRental,
            PriceTag::dollars(price),
        )])
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SectionOutcome;
    use crate::scraper::aggregate_html;
    use crate::scraper::error::ExtractError;
    use crate::scraper::sites::fixtures::ATTICV;

    #[test]
    fn test_full_page() {
        let gym = aggregate_html(&AtticV, ATTICV, None);
        assert_eq!(gym.name, "Attic V");
        assert_eq!(gym.sections.len(), 5);
        assert_eq!(gym.error_count(), 0, "{:?}", gym.sections);

        let titles: Vec<&str> = gym.packages.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(
            titles,
            [
                "All Day Pass - Adult",
                "All Day Pass - Student",
                "10 Visits Pass - Adult",
                "10 Visits Pass - Student (18 or above)",
                "10 Visits Pass - Student (below 18)",
                "10 Share Pass",
                "5 Share Pass",
                "Climbing Shoes Rental",
            ]
        );
    }

    #[test]
    fn test_day_pass_prices() {
        let gym = aggregate_html(&AtticV, ATTICV, None);
        let adult = &gym.packages[0];
        assert_eq!(adult.category, Category::DayPass);
        assert_eq!(adult.currency_symbol, "HK$");
        assert_eq!(adult.price, 150);
        assert_eq!(adult.validity.as_deref(), Some("1 day"));
        assert!(adult.tags.contains("Shoes and chalk included"));
        assert_eq!(gym.packages[1].price, 120);
    }

    #[test]
    fn test_day_pass_compact_prices() {
        let html = ATTICV.replace(
            "Adult - HK$&nbsp;150/day; Student - HK$ 120/day",
            "Adult - $150/day; Student - $100/day",
        );
        let gym = aggregate_html(&AtticV, &html, None);
        assert_eq!(gym.packages[0].title, "All Day Pass - Adult");
        assert_eq!(gym.packages[0].price, 150);
        assert_eq!(gym.packages[0].currency_symbol, "$");
        assert_eq!(gym.packages[1].title, "All Day Pass - Student");
        assert_eq!(gym.packages[1].price, 100);
    }

    #[test]
    fn test_multi_pass_positions() {
        let gym = aggregate_html(&AtticV, ATTICV, None);
        let multi: Vec<_> = gym
            .packages
            .iter()
            .filter(|p| p.category == Category::MultiPass)
            .collect();
        assert_eq!(multi.len(), 3);
        assert_eq!(multi.iter().map(|p| p.price).collect::<Vec<_>>(), [1300, 1100, 900]);
        for p in &multi {
            assert_eq!(p.validity.as_deref(), Some("6 months"));
            assert!(p.tags.contains("Not transferable"));
        }
    }

    #[test]
    fn test_multi_pass_adult_price_behind_nbsp() {
        let html = ATTICV.replace("HK$ 1,300", "HK$&nbsp;1,300");
        let gym = aggregate_html(&AtticV, &html, None);
        assert_eq!(gym.error_count(), 0, "{:?}", gym.sections);
        let adult = gym
            .packages
            .iter()
            .find(|p| p.title == "10 Visits Pass - Adult")
            .unwrap();
        assert_eq!(adult.price, 1300);
    }

    #[test]
    fn test_share_and_rental() {
        let gym = aggregate_html(&AtticV, ATTICV, None);
        let ten = &gym.packages[5];
        assert_eq!(ten.category, Category::SharePass);
        assert_eq!(ten.price, 1800);
        assert_eq!(ten.validity.as_deref(), Some("12 months"));
        let five = &gym.packages[6];
        assert_eq!(five.price, 950);

        let rental = gym.packages.last().unwrap();
        assert_eq!(rental.category, Category::EqRental);
        assert_eq!(rental.price, 30);
        assert_eq!(rental.validity, None);
    }

    #[test]
    fn test_single_variant_day_pass_fails_section() {
        let html = ATTICV.replace("/day; Student - HK$ 120/day", "/day");
        let gym = aggregate_html(&AtticV, &html, None);
        assert_eq!(gym.sections.len(), 5);
        assert_eq!(gym.sections[0].section, "day-pass");
        match &gym.sections[0].outcome {
            SectionOutcome::Failed { reason } => assert!(reason.contains("unexpected layout")),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(gym.packages.len(), 6);
    }

    #[test]
    fn test_missing_section_reports_path() {
        let gym = aggregate_html(&AtticV, "<html><body></body></html>", None);
        assert!(gym.packages.is_empty());
        assert_eq!(gym.failed_sections().count(), 5);

        let err = MultiPass.locate(&crate::scraper::query::Page::parse("").root()).err();
        assert!(matches!(err, Some(ExtractError::MissingFragment { .. })));
    }
}
