//! Canonical column names and the rules that map source schemas onto them.
//!
//! Rules are evaluated in order and the first applicable one wins. Adding a new
//! source schema means adding a rule here, not another branch in the normalizer.

pub const COUNTRY: &str = "country";
pub const IMG_TYPE: &str = "img_type";
pub const LIKES: &str = "likes";
pub const COMMENTS: &str = "comments";
pub const ENG_RATE: &str = "eng_rate";
pub const ENGAGEMENT: &str = "engagement";
pub const FOLLOWERS: &str = "followers";
pub const MAIN_TYPE: &str = "main_type";
pub const IMAGE_TYPE: &str = "image_type";
/// Reference view only.
pub const LOG_ENG: &str = "log_eng";

/// Smallest valid image classification code.
pub const IMG_TYPE_MIN: i64 = 1;
/// Largest valid image classification code.
pub const IMG_TYPE_MAX: i64 = 6;

/// Columns coerced to numeric before engagement is resolved.
pub const COUNT_COLUMNS: [&str; 2] = [LIKES, COMMENTS];

/// How a rule produces its target column from its sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Target already exists under its own name.
    Keep,
    /// Single source column renamed to the target.
    Rename,
    /// Numeric copy of a single source column.
    Numeric,
    /// Sum of numeric sources with nulls counted as zero.
    SumFilled,
}

/// One step of a fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRule {
    pub sources: &'static [&'static str],
    pub target: &'static str,
    pub transform: Transform,
    /// Rule only applies when its sources hold at least one non-null value.
    pub requires_values: bool,
}

impl ColumnRule {
    const fn new(
        sources: &'static [&'static str],
        target: &'static str,
        transform: Transform,
    ) -> Self {
        Self {
            sources,
            target,
            transform,
            requires_values: false,
        }
    }

    const fn non_empty(self) -> Self {
        Self {
            requires_values: true,
            ..self
        }
    }
}

/// Classification column: `img_type`, else `main_type`, else `image_type`.
pub const IMG_TYPE_RULES: &[ColumnRule] = &[
    ColumnRule::new(&[IMG_TYPE], IMG_TYPE, Transform::Keep),
    ColumnRule::new(&[MAIN_TYPE], IMG_TYPE, Transform::Rename),
    ColumnRule::new(&[IMAGE_TYPE], IMG_TYPE, Transform::Rename),
];

/// Engagement signal: a populated `eng_rate`, else `engagement`, else `likes + comments`.
pub const ENG_RATE_RULES: &[ColumnRule] = &[
    ColumnRule::new(&[ENG_RATE], ENG_RATE, Transform::Numeric).non_empty(),
    ColumnRule::new(&[ENGAGEMENT], ENG_RATE, Transform::Numeric),
    ColumnRule::new(&[LIKES, COMMENTS], ENG_RATE, Transform::SumFilled),
];
