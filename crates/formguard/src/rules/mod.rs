//! Built-in rules
//!
//! Every built-in rule is a plain function from a [`RuleContext`] to an
//! [`Outcome`]. The engine owns all mutation: a rule only *describes* what
//! should happen (replace the value, skip the rest of the chain, record a
//! failure) and the engine applies it.
//!
//! ## Families
//!
//! - [`fillable`] - defaults and skip marking (`required`, `nullable`, ...)
//! - [`datatype`] - type assertion and coercion (`numeric`, `file`, ...)
//! - [`sanitize`] - value transforms (`trim`, `capitalize`, `format_date`)
//! - [`compare`] - size and range comparisons (`min`, `between`, `gt`, ...)
//! - [`text`] - string content checks (`alpha`, `regex`, `password`, ...)
//! - [`temporal`] - date parsing and relative checks (`after`, `time`, ...)
//! - [`files`] - MIME checks (`mimes`, `image`, ...)
//! - [`cross`] - rules that read other attributes (`confirmed`, `same`)

pub mod compare;
pub mod cross;
pub mod datatype;
pub mod files;
pub mod fillable;
pub mod sanitize;
pub mod temporal;
pub mod text;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::foundation::predicates::{as_number, to_text};
use crate::foundation::{FileInspector, GuardError, GuardResult};
use crate::infer::DataType;
use crate::probe::UrlProbe;

pub use files::FileKinds;

// ============================================================================
// RULE TABLE
// ============================================================================

macro_rules! builtin_rules {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Every rule the engine implements natively.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum BuiltinRule {
            $($variant),+
        }

        impl BuiltinRule {
            /// All built-in rules in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Looks a rule up by its specification name.
            #[must_use]
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Self::$variant),)+
                    _ => None,
                }
            }

            /// Name used in specifications and message tables.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }
    };
}

builtin_rules! {
    // fillables
    Fill => "fill",
    IfEmpty => "if_empty",
    Fillable => "fillable",
    Nullable => "nullable",
    Required => "required",
    RequiredIf => "required_if",
    RequiredUnless => "required_unless",
    RequiredWith => "required_with",
    RequiredWithAll => "required_with_all",
    RequiredWithout => "required_without",
    RequiredWithoutAll => "required_without_all",
    // datatypes
    Blob => "blob",
    Date => "date",
    Datetime => "datetime",
    Array => "array",
    Object => "object",
    Numeric => "numeric",
    Integer => "integer",
    String => "string",
    File => "file",
    Files => "files",
    Boolean => "boolean",
    Url => "url",
    Ip => "ip",
    Email => "email",
    Uuid => "uuid",
    // sanitizers
    Trim => "trim",
    Capitalize => "capitalize",
    FormatDate => "format_date",
    // everything else
    Filled => "filled",
    Accepted => "accepted",
    Password => "password",
    Alpha => "alpha",
    AlphaUnderscore => "alpha_underscore",
    AlphaDash => "alpha_dash",
    AlphaNum => "alpha_num",
    AlphaSpaces => "alpha_spaces",
    Between => "between",
    Confirmed => "confirmed",
    Contains => "contains",
    NotContains => "not_contains",
    CreditCard => "credit_card",
    After => "after",
    Before => "before",
    EndsWith => "ends_with",
    StartsWith => "starts_with",
    In => "in",
    NotIn => "not_in",
    InArray => "in_array",
    Json => "json",
    Lowercase => "lowercase",
    Uppercase => "uppercase",
    Min => "min",
    Max => "max",
    Gt => "gt",
    Gte => "gte",
    Lt => "lt",
    Lte => "lte",
    Mimes => "mimes",
    MultipleOf => "multiple_of",
    Phone => "phone",
    Range => "range",
    Regex => "regex",
    Same => "same",
    ActiveUrl => "active_url",
    Digits => "digits",
    Image => "image",
    Video => "video",
    Audio => "audio",
    Pattern => "pattern",
    Time => "time",
    Timestamp => "timestamp",
}

// ============================================================================
// CONTEXT
// ============================================================================

/// Everything a built-in rule may read.
pub struct RuleContext<'a> {
    pub(crate) attribute: &'a str,
    pub(crate) rule: BuiltinRule,
    pub(crate) args: &'a [String],
    pub(crate) data_type: DataType,
    pub(crate) data: &'a Map<String, Value>,
    pub(crate) inspector: &'a dyn FileInspector,
    pub(crate) kinds: &'a FileKinds,
    pub(crate) probe: &'a dyn UrlProbe,
    pub(crate) password_min_length: usize,
}

impl RuleContext<'_> {
    pub(crate) fn value(&self) -> Option<&Value> {
        self.data.get(self.attribute)
    }

    pub(crate) fn other(&self, attribute: &str) -> Option<&Value> {
        self.data.get(attribute)
    }

    pub(crate) fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    pub(crate) fn require_arg(&self, index: usize) -> GuardResult<&str> {
        self.arg(index)
            .ok_or_else(|| self.misuse(format!("expects at least {} argument(s)", index + 1)))
    }

    /// Parses argument `index` as a number.
    pub(crate) fn number_arg(&self, index: usize) -> GuardResult<f64> {
        let raw = self.require_arg(index)?;
        as_number(&Value::String(raw.trim().to_owned()))
            .ok_or_else(|| self.misuse(format!("expects a number but '{raw}' was given")))
    }

    /// The value as text when it is a string or a number.
    pub(crate) fn text(&self) -> Option<String> {
        match self.value()? {
            v @ (Value::String(_) | Value::Number(_)) => Some(to_text(v)),
            _ => None,
        }
    }

    pub(crate) fn misuse(&self, reason: impl Into<String>) -> GuardError {
        GuardError::rule_argument(self.attribute, self.rule.name(), reason)
    }
}

// ============================================================================
// OUTCOME
// ============================================================================

/// How a failure should be worded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Failure {
    /// Sub-key for message lookup, e.g. `mixed` for `password`.
    pub variant: Option<String>,
    /// `:token` replacements.
    pub params: IndexMap<String, String>,
    /// A message chosen by the rule itself.
    pub explicit: Option<String>,
}

impl Failure {
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.insert(key.to_owned(), value.into());
        self
    }

    #[must_use]
    pub fn variant(mut self, variant: &str) -> Self {
        self.variant = Some(variant.to_owned());
        self
    }
}

/// What the chain should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Clear any error recorded for the attribute.
    Pass,
    /// Leave error state untouched.
    Keep,
    /// Stop the chain without an error.
    Skip,
    /// Record a failure against the attribute and stop the chain.
    Fail(Failure),
    /// Record a failure against another attribute.
    FailOn { attribute: String, failure: Failure },
}

/// A rule's decision plus an optional replacement value.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub replace: Option<Value>,
    pub step: Step,
}

impl Outcome {
    pub(crate) fn pass() -> GuardResult<Self> {
        Ok(Self::from(Step::Pass))
    }

    pub(crate) fn keep() -> GuardResult<Self> {
        Ok(Self::from(Step::Keep))
    }

    pub(crate) fn skip() -> GuardResult<Self> {
        Ok(Self::from(Step::Skip))
    }

    pub(crate) fn fail(failure: Failure) -> GuardResult<Self> {
        Ok(Self::from(Step::Fail(failure)))
    }

    /// Passes when `ok`, otherwise fails with a default failure.
    pub(crate) fn check(ok: bool) -> GuardResult<Self> {
        Self::check_with(ok, Failure::default)
    }

    pub(crate) fn check_with(ok: bool, failure: impl FnOnce() -> Failure) -> GuardResult<Self> {
        if ok { Self::pass() } else { Self::fail(failure()) }
    }

    /// Attaches a replacement value.
    pub(crate) fn replacing(value: Value, step: Step) -> GuardResult<Self> {
        Ok(Self {
            replace: Some(value),
            step,
        })
    }
}

impl From<Step> for Outcome {
    fn from(step: Step) -> Self {
        Self {
            replace: None,
            step,
        }
    }
}

// ============================================================================
// DISPATCH
// ============================================================================

/// Runs one built-in rule.
pub async fn run(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    use BuiltinRule::*;

    match ctx.rule {
        Fill => fillable::fill(ctx),
        IfEmpty => fillable::if_empty(ctx),
        Fillable => fillable::fillable(ctx),
        Nullable => fillable::nullable(ctx),
        Required => fillable::required(ctx),
        RequiredIf => fillable::required_if(ctx),
        RequiredUnless => fillable::required_unless(ctx),
        RequiredWith => fillable::required_with(ctx),
        RequiredWithAll => fillable::required_with_all(ctx),
        RequiredWithout => fillable::required_without(ctx),
        RequiredWithoutAll => fillable::required_without_all(ctx),

        Blob => datatype::blob(ctx),
        Date => temporal::date(ctx),
        Datetime => temporal::datetime(ctx),
        Array => datatype::array(ctx),
        Object => datatype::object(ctx),
        Numeric => datatype::numeric(ctx),
        Integer => datatype::integer(ctx),
        String => datatype::string(ctx),
        File => files::file(ctx),
        Files => files::files(ctx),
        Boolean => datatype::boolean(ctx),
        Url => datatype::url(ctx),
        Ip => datatype::ip(ctx),
        Email => datatype::email(ctx),
        Uuid => datatype::uuid(ctx),

        Trim => sanitize::trim(ctx),
        Capitalize => sanitize::capitalize(ctx),
        FormatDate => sanitize::format_date(ctx),

        Filled => text::filled(ctx),
        Accepted => text::accepted(ctx),
        Password => text::password(ctx),
        Alpha | AlphaUnderscore | AlphaDash | AlphaNum | AlphaSpaces => text::alpha(ctx),
        Between => compare::between(ctx),
        Confirmed => cross::confirmed(ctx),
        Contains => text::contains(ctx),
        NotContains => text::not_contains(ctx),
        CreditCard => text::credit_card(ctx),
        After => temporal::after(ctx),
        Before => temporal::before(ctx),
        EndsWith => text::ends_with(ctx),
        StartsWith => text::starts_with(ctx),
        In => text::one_of(ctx),
        NotIn => text::not_in(ctx),
        InArray => cross::in_array(ctx),
        Json => text::json(ctx),
        Lowercase => text::lowercase(ctx),
        Uppercase => text::uppercase(ctx),
        Min | Max | Gt | Gte | Lt | Lte => compare::bound(ctx),
        Mimes => files::mimes(ctx),
        MultipleOf => compare::multiple_of(ctx),
        Phone => text::phone(ctx),
        Range => compare::range(ctx),
        Regex => text::regex(ctx),
        Same => cross::same(ctx),
        ActiveUrl => datatype::active_url(ctx).await,
        Digits => compare::digits(ctx),
        Image | Video | Audio => files::kind(ctx),
        Pattern => text::pattern(ctx),
        Time => temporal::time(ctx),
        Timestamp => temporal::timestamp(ctx),
    }
}

// ============================================================================
// TEST SUPPORT
// ============================================================================
