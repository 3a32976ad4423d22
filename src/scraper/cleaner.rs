//! Text normalisation, price decoding and the separator mini-grammars the
//! gym pages use to pack several fields into one text node.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::PriceTag;
use crate::scraper::error::{ExtractError, ExtractResult};

const NBSP: char = '\u{a0}';
const EDGE_SEPARATORS: [char; 4] = [';', '-', ':', ' '];
const FULL_WIDTH_BAR: char = '｜';

static VALID_FOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\* Valid for (.*) only$").expect("static regex"));

// ── Normaliser ────────────────────────────────────────────────────────────────

/// Drop non-breaking spaces, then strip whitespace and `; - :` from both ends.
/// "\u{a0}Adult - " → "Adult" | "; 10 Pass:" → "10 Pass"
pub fn normalize(raw: &str) -> String {
    raw.replace(NBSP, "")
        .trim_matches(|c: char| c.is_whitespace() || EDGE_SEPARATORS.contains(&c))
        .to_string()
}

/// "(3個月)" → "3個月"
pub fn remove_parentheses(raw: &str) -> String {
    raw.chars().filter(|c| *c != '(' && *c != ')').collect()
}

// ── Prices ────────────────────────────────────────────────────────────────────

/// First char is the currency, the rest is the amount.
/// "$1,200" → ("$", 1200) | "" → None
pub fn decode_price_tag(raw: &str) -> ExtractResult<Option<PriceTag>> {
    let raw = raw.trim();
    let mut chars = raw.chars();
    let Some(symbol) = chars.next() else {
        return Ok(None);
    };
    let price = parse_amount(chars.as_str())?;
    Ok(Some(PriceTag::new(symbol.to_string(), price)))
}

/// Bare amount with optional thousands separators. "1,200" → 1200
pub fn parse_amount(raw: &str) -> ExtractResult<u32> {
    let cleaned = raw.replace(',', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Err(ExtractError::MalformedPrice {
            raw: raw.to_string(),
            reason: "no amount".to_string(),
        });
    }
    cleaned.parse().map_err(|e: std::num::ParseIntError| ExtractError::MalformedPrice {
        raw: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Accepts both the compact and the spaced form.
/// "$150" → ("$", 150) | "HK$\u{a0}150" → ("HK$", 150)
pub fn split_currency_amount(raw: &str) -> ExtractResult<PriceTag> {
    let spaced = raw.replace(NBSP, " ");
    let fields: Vec<&str> = spaced.split_whitespace().collect();
    match fields.as_slice() {
        [] => Err(ExtractError::MalformedPrice {
            raw: raw.to_string(),
            reason: "empty price tag".to_string(),
        }),
        [compact] => decode_price_tag(compact)?.ok_or_else(|| ExtractError::MalformedPrice {
            raw: raw.to_string(),
            reason: "empty price tag".to_string(),
        }),
        [symbol, amount, ..] => Ok(PriceTag::new(*symbol, parse_amount(amount)?)),
    }
}

// ── Separator grammars ────────────────────────────────────────────────────────

fn split_exact<const N: usize>(raw: &str, sep: char) -> ExtractResult<[&str; N]> {
    let parts: Vec<&str> = raw.split(sep).collect();
    parts.try_into().map_err(|parts: Vec<&str>| {
        ExtractError::layout(
            format!("{} `{}`-separated parts, found {}", N, sep, parts.len()),
            raw,
        )
    })
}

/// Whitespace field `n` (0-based). ("Student $120", 1) → "$120"
pub fn nth_field(raw: &str, n: usize) -> ExtractResult<&str> {
    raw.split_whitespace()
        .nth(n)
        .ok_or_else(|| ExtractError::layout(format!("at least {} whitespace fields", n + 1), raw))
}

/// Two parallel variant blocks. "Adult …; Student …" → ("Adult …", " Student …")
pub fn split_variants(raw: &str) -> ExtractResult<(&str, &str)> {
    let [first, second] = split_exact::<2>(raw, ';')?;
    Ok((first, second))
}

/// Label and whatever follows the first `-`. "Adult - $150/day" → ("Adult ", " $150/day")
pub fn split_label(raw: &str) -> ExtractResult<(&str, &str)> {
    raw.split_once('-')
        .ok_or_else(|| ExtractError::layout("a `-` between label and value", raw))
}

/// Text before the unit qualifier. "$150/day" → "$150"
pub fn before_unit(raw: &str) -> &str {
    raw.split('/').next().unwrap_or(raw)
}

/// "Shoes Rental: $30/pair" → ("Shoes Rental", " $30/pair")
pub fn split_label_price(raw: &str) -> ExtractResult<(&str, &str)> {
    let [label, price] = split_exact::<2>(raw, ':')?;
    Ok((label, price))
}

/// Fields of a compact multi-lingual block. "攀石班｜初學者" → ["攀石班", "初學者"]
pub fn split_bar(raw: &str) -> Vec<&str> {
    raw.split(FULL_WIDTH_BAR).map(str::trim).collect()
}

/// Price embedded mid-sentence. "12個月合約 $3,600" → ("12個月合約 ", "$3,600")
pub fn split_at_dollar(raw: &str) -> ExtractResult<(&str, String)> {
    let [title, amount] = split_exact::<2>(raw, '$')?;
    Ok((title, format!("${}", amount.trim())))
}

/// Last two whitespace fields peeled off the right.
/// "10次通行證 (3個月) $1,500" → ("10次通行證", "(3個月)", "$1,500")
pub fn split_trailing_fields(raw: &str) -> ExtractResult<(&str, &str, &str)> {
    let layout = || ExtractError::layout("`<name> <validity> <price>`", raw);
    let (rest, price) = raw.trim().rsplit_once(char::is_whitespace).ok_or_else(layout)?;
    let (name, validity) = rest.trim_end().rsplit_once(char::is_whitespace).ok_or_else(layout)?;
    let name = name.trim_end();
    if name.is_empty() {
        return Err(layout());
    }
    Ok((name, validity, price))
}

/// One `<label> - <price>/<unit>` block. "Adult - $150/day" → ("Adult", $150)
pub fn split_priced_variant(raw: &str) -> ExtractResult<(String, PriceTag)> {
    let (label, rest) = split_label(raw)?;
    let tag = split_currency_amount(before_unit(rest).trim())?;
    Ok((normalize(label), tag))
}

/// "* Valid for 6 months only" → "6 months"
pub fn valid_for(raw: &str) -> ExtractResult<String> {
    VALID_FOR
        .captures(raw.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ExtractError::layout("`* Valid for <period> only`", raw))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_price_tag() {
        assert_eq!(decode_price_tag("$1,200").unwrap(), Some(PriceTag::new("$", 1200)));
        assert_eq!(decode_price_tag(" $150 ").unwrap(), Some(PriceTag::new("$", 150)));
        assert_eq!(decode_price_tag("").unwrap(), None);
        assert_eq!(decode_price_tag("   ").unwrap(), None);
    }

    #[test]
    fn test_decoded_price_renders_back() {
        for raw in ["$1,200", "$80", "$12,345,678", "¥1000"] {
            let tag = decode_price_tag(raw).unwrap().unwrap();
            let rendered = format!("{}{}", tag.currency_symbol, tag.price);
            assert_eq!(rendered, raw.replace(',', ""));
        }
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_price_tag("$12a"),
            Err(ExtractError::MalformedPrice { .. })
        ));
        assert!(matches!(decode_price_tag("$"), Err(ExtractError::MalformedPrice { .. })));
        assert!(matches!(
            decode_price_tag("HK$150"),
            Err(ExtractError::MalformedPrice { .. })
        ));
    }

    #[test]
    fn test_split_currency_amount() {
        assert_eq!(split_currency_amount("$150").unwrap(), PriceTag::new("$", 150));
        assert_eq!(
            split_currency_amount("HK$\u{a0}1,150").unwrap(),
            PriceTag::new("HK$", 1150)
        );
        assert!(split_currency_amount(" ").is_err());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("\u{a0}Adult - "), "Adult");
        assert_eq!(normalize("; 10 Pass:"), "10 Pass");
        assert_eq!(normalize("Day-Pass"), "Day-Pass");
        assert_eq!(normalize(" -\t"), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in [
            "  Adult -\t",
            "\u{a0}; HK$ 150 :",
            "a\t-",
            "成人 ：",
            "- - -",
            "Student (18+) - ",
        ] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "input {:?}", raw);
        }
    }

    #[test]
    fn test_remove_parentheses() {
        assert_eq!(remove_parentheses("(3個月)"), "3個月");
        assert_eq!(remove_parentheses("只限(平日)"), "只限平日");
    }

    #[test]
    fn test_day_pass_variants_split() {
        let (adult, student) = split_variants("Adult - $150/day; Student - $100/day").unwrap();
        let (label, tag) = split_priced_variant(adult).unwrap();
        assert_eq!(label, "Adult");
        assert_eq!(tag.price, 150);
        let (label, tag) = split_priced_variant(student).unwrap();
        assert_eq!(label, "Student");
        assert_eq!(tag.price, 100);
    }

    #[test]
    fn test_split_variants_needs_two_blocks() {
        assert!(matches!(
            split_variants("Adult - $150/day"),
            Err(ExtractError::UnexpectedLayout { .. })
        ));
        assert!(split_variants("a;b;c").is_err());
    }

    #[test]
    fn test_label_price_and_unit() {
        let (label, price) = split_label_price("Shoes Rental: $30/pair").unwrap();
        assert_eq!(normalize(label), "Shoes Rental");
        assert_eq!(before_unit(price).trim(), "$30");
        assert!(split_label_price("Shoes Rental $30").is_err());
    }

    #[test]
    fn test_split_bar() {
        assert_eq!(split_bar("攀石班｜初學者"), vec!["攀石班", "初學者"]);
        assert_eq!(split_bar("single"), vec!["single"]);
    }

    #[test]
    fn test_split_at_dollar() {
        let (title, tag) = split_at_dollar("12個月合約 $3,600").unwrap();
        assert_eq!(normalize(title), "12個月合約");
        assert_eq!(tag, "$3,600");
        assert!(split_at_dollar("免費").is_err());
    }

    #[test]
    fn test_split_trailing_fields() {
        let (name, validity, price) = split_trailing_fields("10次通行證 (3個月) $1,500").unwrap();
        assert_eq!((name, validity, price), ("10次通行證", "(3個月)", "$1,500"));
        assert!(split_trailing_fields("$1,500").is_err());
    }

    #[test]
    fn test_nth_field() {
        assert_eq!(nth_field("Student $120", 1).unwrap(), "$120");
        assert!(nth_field("$120", 1).is_err());
    }

    #[test]
    fn test_valid_for() {
        assert_eq!(valid_for("* Valid for 6 months only").unwrap(), "6 months");
        assert!(valid_for("Valid forever").is_err());
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(
            raw in prop_oneof![any::<String>(), "[ \u{a0}\t;:a-z成人-]{0,16}"]
        ) {
            let once = normalize(&raw);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn prop_decoded_tag_renders_back(
            symbol in prop::sample::select(vec!['$', '¥', '€', '£']),
            price in any::<u32>(),
        ) {
            let tag = PriceTag::new(symbol.to_string(), price);
            prop_assert_eq!(decode_price_tag(&tag.to_string()).unwrap(), Some(tag.clone()));
            let plain = format!("{}{}", symbol, price);
            prop_assert_eq!(decode_price_tag(&plain).unwrap(), Some(tag));
        }
    }
}
