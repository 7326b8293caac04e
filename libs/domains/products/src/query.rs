//! Query-string to query-descriptor translation for product listings.
//!
//! Listing requests carry free-form query parameters. This module turns them
//! into a [`QueryDescriptor`]: a list of typed [`Predicate`]s plus a bounded
//! [`Page`] window. Nothing here knows about MongoDB; the store adapters in
//! [`crate::mongodb`] and [`crate::memory`] consume the descriptor.
//!
//! ```text
//! ?keyword=phone&category=Mobiles&price[gte]=100&price[lt]=500&page=2
//!
//! QueryDescriptor {
//!     predicates: [
//!         Text  { field: "name", needle: "phone" },
//!         Eq    { field: "category", value: "Mobiles" },
//!         Range { field: "price", bounds: [Gte 100, Lt 500] },
//!     ],
//!     page: Page { number: 2, size: 5 },
//! }
//! ```
//!
//! Malformed `page`/`limit` values never fail a request: they fall back to
//! the configured defaults.

use std::collections::BTreeMap;

/// Free-text search parameter
pub const KEYWORD_KEY: &str = "keyword";
/// 1-based page number parameter
pub const PAGE_KEY: &str = "page";
/// Page size parameter
pub const LIMIT_KEY: &str = "limit";
/// Keys that never become field predicates
pub const RESERVED_KEYS: [&str; 3] = [KEYWORD_KEY, PAGE_KEY, LIMIT_KEY];

/// Field the keyword is matched against
pub const SEARCH_FIELD: &str = "name";

pub const DEFAULT_PAGE_SIZE: u64 = 5;
pub const DEFAULT_MAX_PAGE_SIZE: u64 = 100;

/// Value(s) supplied for one query parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// `?field=value`
    Single(String),
    /// `?field=a&field=b`
    Many(Vec<String>),
    /// `?field[op]=value&field[op2]=value2`
    Operators(BTreeMap<String, String>),
}

impl ParamValue {
    /// First plain value, if any
    fn first(&self) -> Option<&str> {
        match self {
            ParamValue::Single(value) => Some(value),
            ParamValue::Many(values) => values.first().map(String::as_str),
            ParamValue::Operators(_) => None,
        }
    }
}

/// Parsed query parameters, keyed by parameter name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, ParamValue>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build parameters from URL-decoded `(key, value)` pairs.
    ///
    /// Bracketed keys (`price[gte]`) become operator maps. A repeated plain key
    /// becomes [`ParamValue::Many`]. When a key has both plain values and
    /// operators, the operators win. A repeated operator keeps its last value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (key, value) in pairs {
            params.push(key.as_ref(), value.into());
        }
        params
    }

    /// Set a parameter, replacing any previous value
    pub fn insert(&mut self, key: impl Into<String>, value: ParamValue) -> &mut Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn scalar(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ParamValue::first)
    }

    fn push(&mut self, raw_key: &str, value: String) {
        match split_bracket(raw_key) {
            Some((field, op)) if !op.is_empty() => {
                let entry = self
                    .0
                    .entry(field.to_string())
                    .or_insert_with(|| ParamValue::Operators(BTreeMap::new()));
                match entry {
                    ParamValue::Operators(ops) => {
                        ops.insert(op.to_string(), value);
                    }
                    plain => {
                        *plain = ParamValue::Operators(BTreeMap::from([(op.to_string(), value)]));
                    }
                }
            }
            Some((field, _)) => self.push_plain(field, value),
            None => self.push_plain(raw_key, value),
        }
    }

    fn push_plain(&mut self, key: &str, value: String) {
        match self.0.get_mut(key) {
            None => {
                self.0.insert(key.to_string(), ParamValue::Single(value));
            }
            Some(ParamValue::Single(previous)) => {
                let previous = std::mem::take(previous);
                self.0
                    .insert(key.to_string(), ParamValue::Many(vec![previous, value]));
            }
            Some(ParamValue::Many(values)) => values.push(value),
            Some(ParamValue::Operators(_)) => {}
        }
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::from_pairs(iter)
    }
}

/// Split `field[op]` into `("field", "op")`
fn split_bracket(key: &str) -> Option<(&str, &str)> {
    let open = key.find('[')?;
    let inner = key[open + 1..].strip_suffix(']')?;
    Some((&key[..open], inner))
}

/// Comparison operators accepted inside `field[op]`.
///
/// This is the complete allow-list: any other operator key is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComparisonOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl ComparisonOp {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "gt" => Some(ComparisonOp::Gt),
            "gte" => Some(ComparisonOp::Gte),
            "lt" => Some(ComparisonOp::Lt),
            "lte" => Some(ComparisonOp::Lte),
            _ => None,
        }
    }

    pub fn as_key(&self) -> &'static str {
        match self {
            ComparisonOp::Gt => "gt",
            ComparisonOp::Gte => "gte",
            ComparisonOp::Lt => "lt",
            ComparisonOp::Lte => "lte",
        }
    }
}

/// One side of a range predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    pub op: ComparisonOp,
    pub value: String,
}

/// A single filter clause. All predicates of a descriptor are ANDed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Field equals value
    Eq { field: String, value: String },
    /// Field equals any of the values
    In { field: String, values: Vec<String> },
    /// Field satisfies every bound
    Range { field: String, bounds: Vec<Bound> },
    /// Field contains the needle, ignoring case
    Text { field: String, needle: String },
}

impl Predicate {
    pub fn field(&self) -> &str {
        match self {
            Predicate::Eq { field, .. }
            | Predicate::In { field, .. }
            | Predicate::Range { field, .. }
            | Predicate::Text { field, .. } => field,
        }
    }
}

/// Pagination window. Both number and size are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    number: u64,
    size: u64,
}

impl Page {
    pub fn new(number: u64, size: u64) -> Self {
        Self {
            number: number.max(1),
            size: size.max(1),
        }
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Records to skip before this page
    pub fn skip(&self) -> u64 {
        self.size.saturating_mul(self.number - 1)
    }

    /// Records in this page
    pub fn limit(&self) -> u64 {
        self.size
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// Page-size defaults and ceiling applied during translation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationPolicy {
    default_page_size: u64,
    max_page_size: u64,
}

impl PaginationPolicy {
    /// A policy whose default never exceeds its ceiling
    pub fn new(default_page_size: u64, max_page_size: u64) -> Self {
        let max_page_size = max_page_size.max(1);
        Self {
            default_page_size: default_page_size.clamp(1, max_page_size),
            max_page_size,
        }
    }

    /// A policy with no ceiling on `limit`
    pub fn uncapped(default_page_size: u64) -> Self {
        Self::new(default_page_size, u64::MAX)
    }

    pub fn default_page_size(&self) -> u64 {
        self.default_page_size
    }

    pub fn max_page_size(&self) -> u64 {
        self.max_page_size
    }
}

impl Default for PaginationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, DEFAULT_MAX_PAGE_SIZE)
    }
}

/// Structured, bounded representation of a listing request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryDescriptor {
    predicates: Vec<Predicate>,
    page: Page,
}

impl QueryDescriptor {
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn page(&self) -> Page {
        self.page
    }

    /// Add a case-insensitive substring match on the product name when a
    /// non-blank keyword is present
    pub fn with_search(mut self, params: &QueryParams) -> Self {
        if let Some(keyword) = params.scalar(KEYWORD_KEY).map(str::trim) {
            if !keyword.is_empty() {
                self.predicates.push(Predicate::Text {
                    field: SEARCH_FIELD.to_string(),
                    needle: keyword.to_string(),
                });
            }
        }
        self
    }

    /// Add one predicate per non-reserved field parameter
    pub fn with_filters(mut self, params: &QueryParams) -> Self {
        for (key, value) in params.iter() {
            if RESERVED_KEYS.contains(&key) {
                continue;
            }
            if !is_field_name(key) {
                tracing::debug!(key, "dropping filter on invalid field name");
                continue;
            }
            if let Some(predicate) = field_predicate(key, value) {
                self.predicates.push(predicate);
            }
        }
        self
    }

    /// Set the page window from `page`/`limit`, falling back to the policy
    /// defaults for missing or malformed values
    pub fn with_pagination(mut self, params: &QueryParams, policy: &PaginationPolicy) -> Self {
        let size = params
            .scalar(LIMIT_KEY)
            .and_then(parse_positive)
            .map(|size| size.min(policy.max_page_size()))
            .unwrap_or(policy.default_page_size());
        let number = params.scalar(PAGE_KEY).and_then(parse_positive).unwrap_or(1);

        self.page = Page::new(number, size);
        self
    }
}

/// Translate query parameters with the given default page size and no
/// page-size ceiling
pub fn translate(params: &QueryParams, default_page_size: u64) -> QueryDescriptor {
    translate_with(params, &PaginationPolicy::uncapped(default_page_size))
}

/// Translate query parameters: search, then field filters, then pagination
pub fn translate_with(params: &QueryParams, policy: &PaginationPolicy) -> QueryDescriptor {
    QueryDescriptor::default()
        .with_search(params)
        .with_filters(params)
        .with_pagination(params, policy)
}

fn field_predicate(field: &str, value: &ParamValue) -> Option<Predicate> {
    match value {
        ParamValue::Single(value) => Some(Predicate::Eq {
            field: field.to_string(),
            value: value.clone(),
        }),
        ParamValue::Many(values) => Some(Predicate::In {
            field: field.to_string(),
            values: values.clone(),
        }),
        ParamValue::Operators(ops) => {
            let bounds: Vec<Bound> = ops
                .iter()
                .filter_map(|(key, value)| match ComparisonOp::from_key(key) {
                    Some(op) => Some(Bound {
                        op,
                        value: value.clone(),
                    }),
                    None => {
                        tracing::debug!(field, operator = %key, "dropping unsupported operator");
                        None
                    }
                })
                .collect();

            if bounds.is_empty() {
                None
            } else {
                Some(Predicate::Range {
                    field: field.to_string(),
                    bounds,
                })
            }
        }
    }
}

/// Plain identifier: `[A-Za-z_][A-Za-z0-9_]*`
fn is_field_name(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn parse_positive(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(query: &str) -> QueryParams {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap();
        QueryParams::from_pairs(pairs)
    }

    #[test]
    fn test_default_pagination() {
        let descriptor = translate(&QueryParams::new(), 5);

        assert!(descriptor.predicates().is_empty());
        assert_eq!(descriptor.page().size(), 5);
        assert_eq!(descriptor.page().skip(), 0);
        assert_eq!(descriptor.page().limit(), 5);
    }

    #[test]
    fn test_second_page_skips_one_page() {
        let descriptor = translate(&params("page=2"), 5);

        assert_eq!(descriptor.page().number(), 2);
        assert_eq!(descriptor.page().skip(), 5);
        assert_eq!(descriptor.page().limit(), 5);
    }

    #[test]
    fn test_non_numeric_page_falls_back_to_first_page() {
        for raw in ["abc", "0", "-3", "2.5", ""] {
            let descriptor = translate(&params(&format!("page={}", raw)), 5);
            assert_eq!(descriptor.page().number(), 1, "page={}", raw);
            assert_eq!(descriptor.page().skip(), 0, "page={}", raw);
        }
    }

    #[test]
    fn test_limit_overrides_default_page_size() {
        let descriptor = translate(&params("limit=20&page=3"), 5);

        assert_eq!(descriptor.page().limit(), 20);
        assert_eq!(descriptor.page().skip(), 40);
    }

    #[test]
    fn test_malformed_limit_falls_back_to_default() {
        let descriptor = translate(&params("limit=lots"), 5);
        assert_eq!(descriptor.page().limit(), 5);
    }

    #[test]
    fn test_limit_is_clamped_to_policy_ceiling() {
        let policy = PaginationPolicy::new(5, 50);
        let descriptor = translate_with(&params("limit=100000"), &policy);

        assert_eq!(descriptor.page().limit(), 50);
    }

    #[test]
    fn test_policy_default_never_exceeds_ceiling() {
        let policy = PaginationPolicy::new(500, 50);
        assert_eq!(policy.default_page_size(), 50);

        let policy = PaginationPolicy::new(0, 0);
        assert_eq!(policy.default_page_size(), 1);
        assert_eq!(policy.max_page_size(), 1);
    }

    #[test]
    fn test_huge_page_number_does_not_overflow() {
        let descriptor = translate(&params(&format!("page={}", u64::MAX)), 5);
        assert_eq!(descriptor.page().skip(), u64::MAX);
    }

    #[test]
    fn test_keyword_produces_text_predicate_on_name() {
        let descriptor = translate(&params("keyword=PHONE"), 5);

        assert_eq!(
            descriptor.predicates(),
            &[Predicate::Text {
                field: "name".to_string(),
                needle: "PHONE".to_string(),
            }]
        );
    }

    #[test]
    fn test_blank_keyword_adds_nothing() {
        assert!(translate(&params("keyword="), 5).predicates().is_empty());
        assert!(translate(&params("keyword=%20%20"), 5).predicates().is_empty());
    }

    #[test]
    fn test_reserved_keys_never_become_filters() {
        let descriptor = translate(&params("keyword=x&page=1&limit=2"), 5);

        assert_eq!(descriptor.predicates().len(), 1);
        assert!(descriptor
            .predicates()
            .iter()
            .all(|p| matches!(p, Predicate::Text { .. })));
    }

    #[test]
    fn test_scalar_becomes_equality() {
        let descriptor = translate(&params("category=Laptop"), 5);

        assert_eq!(
            descriptor.predicates(),
            &[Predicate::Eq {
                field: "category".to_string(),
                value: "Laptop".to_string(),
            }]
        );
    }

    #[test]
    fn test_repeated_key_becomes_any_of() {
        let descriptor = translate(&params("category=Laptop&category=Camera"), 5);

        assert_eq!(
            descriptor.predicates(),
            &[Predicate::In {
                field: "category".to_string(),
                values: vec!["Laptop".to_string(), "Camera".to_string()],
            }]
        );
    }

    #[test]
    fn test_operators_become_range_bounds() {
        let descriptor = translate(&params("price[gte]=100&price[lt]=500"), 5);

        assert_eq!(
            descriptor.predicates(),
            &[Predicate::Range {
                field: "price".to_string(),
                bounds: vec![
                    Bound {
                        op: ComparisonOp::Gte,
                        value: "100".to_string(),
                    },
                    Bound {
                        op: ComparisonOp::Lt,
                        value: "500".to_string(),
                    },
                ],
            }]
        );
    }

    #[test]
    fn test_unknown_operators_are_dropped() {
        let descriptor = translate(&params("price[gt]=1&price[ne]=5&price[$where]=1&price[regex]=.*"), 5);

        assert_eq!(
            descriptor.predicates(),
            &[Predicate::Range {
                field: "price".to_string(),
                bounds: vec![Bound {
                    op: ComparisonOp::Gt,
                    value: "1".to_string(),
                }],
            }]
        );
    }

    #[test]
    fn test_field_with_only_unknown_operators_is_dropped() {
        let descriptor = translate(&params("stock[ne]=0&stock[in]=1"), 5);
        assert!(descriptor.predicates().is_empty());
    }

    #[test]
    fn test_operator_like_field_names_are_dropped() {
        let descriptor = translate(&params("%24where=1&%24or=x&user.role=admin&9lives=1&name=ok"), 5);

        assert_eq!(
            descriptor.predicates(),
            &[Predicate::Eq {
                field: "name".to_string(),
                value: "ok".to_string(),
            }]
        );
    }

    #[test]
    fn test_operators_win_over_plain_value() {
        let forward = params("price=10&price[lte]=20");
        let backward = params("price[lte]=20&price=10");

        assert_eq!(forward, backward);
        assert!(matches!(
            forward.get("price"),
            Some(ParamValue::Operators(ops)) if ops.len() == 1
        ));
    }

    #[test]
    fn test_empty_brackets_are_plain_values() {
        let parsed = params("category[]=a&category[]=b");
        assert_eq!(
            parsed.get("category"),
            Some(&ParamValue::Many(vec!["a".to_string(), "b".to_string()]))
        );
    }

    #[test]
    fn test_search_filter_and_pagination_combine() {
        let descriptor = translate(&params("keyword=phone&category=Mobiles&price[lte]=300&page=2"), 5);

        assert_eq!(descriptor.predicates().len(), 3);
        assert!(matches!(&descriptor.predicates()[0], Predicate::Text { needle, .. } if needle == "phone"));
        assert!(matches!(&descriptor.predicates()[1], Predicate::Eq { field, .. } if field == "category"));
        assert!(matches!(&descriptor.predicates()[2], Predicate::Range { field, .. } if field == "price"));
        assert_eq!(descriptor.page().skip(), 5);
        assert_eq!(descriptor.page().limit(), 5);
    }

    #[test]
    fn test_translate_is_deterministic() {
        let query = "stock[gte]=1&category=b&keyword=k&brand=x&page=3&limit=7";
        assert_eq!(translate(&params(query), 5), translate(&params(query), 5));
    }

    #[test]
    fn test_pipeline_steps_are_independent() {
        let p = params("keyword=phone&category=Mobiles&page=4");

        let searched = QueryDescriptor::default().with_search(&p);
        assert_eq!(searched.predicates().len(), 1);
        assert_eq!(searched.page(), Page::default());

        let filtered = QueryDescriptor::default().with_filters(&p);
        assert_eq!(filtered.predicates().len(), 1);

        let paged = QueryDescriptor::default().with_pagination(&p, &PaginationPolicy::default());
        assert!(paged.predicates().is_empty());
        assert_eq!(paged.page().number(), 4);
    }
}
