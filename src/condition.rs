//! Boolean conditions for Choice states.
//!
//! A [`Condition`] is an immutable expression tree: comparator leaves test a
//! single value addressed by a JSON path against either a literal or another
//! path, and `And`/`Or`/`Not` combine child conditions. [`Condition::render`]
//! is a pure projection to the JSON form the workflow runtime expects; it has
//! no side effects and can be called any number of times.
//!
//! Construction never fails. Path strings are stored verbatim: a malformed
//! path is not detectable here and surfaces only when the external runtime
//! parses the document.
//!
//! # Examples
//!
//! ```rust
//! use stepgraph::condition::Condition;
//! use serde_json::json;
//!
//! let cond = Condition::and(vec![
//!     Condition::string_equals("$.kind", "order"),
//!     Condition::number_greater_than("$.total", 100.0),
//! ]);
//!
//! assert_eq!(cond.render(), json!({
//!     "And": [
//!         {"Variable": "$.kind", "StringEquals": "order"},
//!         {"Variable": "$.total", "NumericGreaterThan": 100.0},
//!     ]
//! }));
//! ```

use serde_json::{json, Value};

/// Comparison operators understood by the workflow runtime.
///
/// Each operator name doubles as the JSON field name in the rendered rule,
/// e.g. `Comparator::StringEquals` renders as `"StringEquals"`. The `...Path`
/// variants read the comparison operand from another location in the input
/// data instead of a literal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Comparator {
    StringEquals,
    StringEqualsPath,
    StringLessThan,
    StringLessThanPath,
    StringGreaterThan,
    StringGreaterThanPath,
    StringLessThanEquals,
    StringLessThanEqualsPath,
    StringGreaterThanEquals,
    StringGreaterThanEqualsPath,
    StringMatches,
    NumericEquals,
    NumericEqualsPath,
    NumericLessThan,
    NumericLessThanPath,
    NumericGreaterThan,
    NumericGreaterThanPath,
    NumericLessThanEquals,
    NumericLessThanEqualsPath,
    NumericGreaterThanEquals,
    NumericGreaterThanEqualsPath,
    BooleanEquals,
    BooleanEqualsPath,
    TimestampEquals,
    TimestampEqualsPath,
    TimestampLessThan,
    TimestampLessThanPath,
    TimestampGreaterThan,
    TimestampGreaterThanPath,
    TimestampLessThanEquals,
    TimestampLessThanEqualsPath,
    TimestampGreaterThanEquals,
    TimestampGreaterThanEqualsPath,
    IsNull,
    IsPresent,
    IsNumeric,
    IsString,
    IsBoolean,
    IsTimestamp,
}

impl Comparator {
    /// The JSON field name for this comparator.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::StringEquals => "StringEquals",
            Comparator::StringEqualsPath => "StringEqualsPath",
            Comparator::StringLessThan => "StringLessThan",
            Comparator::StringLessThanPath => "StringLessThanPath",
            Comparator::StringGreaterThan => "StringGreaterThan",
            Comparator::StringGreaterThanPath => "StringGreaterThanPath",
            Comparator::StringLessThanEquals => "StringLessThanEquals",
            Comparator::StringLessThanEqualsPath => "StringLessThanEqualsPath",
            Comparator::StringGreaterThanEquals => "StringGreaterThanEquals",
            Comparator::StringGreaterThanEqualsPath => "StringGreaterThanEqualsPath",
            Comparator::StringMatches => "StringMatches",
            Comparator::NumericEquals => "NumericEquals",
            Comparator::NumericEqualsPath => "NumericEqualsPath",
            Comparator::NumericLessThan => "NumericLessThan",
            Comparator::NumericLessThanPath => "NumericLessThanPath",
            Comparator::NumericGreaterThan => "NumericGreaterThan",
            Comparator::NumericGreaterThanPath => "NumericGreaterThanPath",
            Comparator::NumericLessThanEquals => "NumericLessThanEquals",
            Comparator::NumericLessThanEqualsPath => "NumericLessThanEqualsPath",
            Comparator::NumericGreaterThanEquals => "NumericGreaterThanEquals",
            Comparator::NumericGreaterThanEqualsPath => "NumericGreaterThanEqualsPath",
            Comparator::BooleanEquals => "BooleanEquals",
            Comparator::BooleanEqualsPath => "BooleanEqualsPath",
            Comparator::TimestampEquals => "TimestampEquals",
            Comparator::TimestampEqualsPath => "TimestampEqualsPath",
            Comparator::TimestampLessThan => "TimestampLessThan",
            Comparator::TimestampLessThanPath => "TimestampLessThanPath",
            Comparator::TimestampGreaterThan => "TimestampGreaterThan",
            Comparator::TimestampGreaterThanPath => "TimestampGreaterThanPath",
            Comparator::TimestampLessThanEquals => "TimestampLessThanEquals",
            Comparator::TimestampLessThanEqualsPath => "TimestampLessThanEqualsPath",
            Comparator::TimestampGreaterThanEquals => "TimestampGreaterThanEquals",
            Comparator::TimestampGreaterThanEqualsPath => "TimestampGreaterThanEqualsPath",
            Comparator::IsNull => "IsNull",
            Comparator::IsPresent => "IsPresent",
            Comparator::IsNumeric => "IsNumeric",
            Comparator::IsString => "IsString",
            Comparator::IsBoolean => "IsBoolean",
            Comparator::IsTimestamp => "IsTimestamp",
        }
    }
}

/// An immutable boolean expression over workflow data.
///
/// Built from the comparator constructors and combined with
/// [`and`](Condition::and), [`or`](Condition::or), and
/// [`not`](Condition::not). `and`/`or` expect at least one child; `not`
/// takes exactly one, which the signature enforces.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// Leaf test: compare the value at `variable` using `comparator`.
    Comparison {
        variable: String,
        comparator: Comparator,
        value: Value,
    },
    /// All child conditions must hold. Expects at least one child.
    And(Vec<Condition>),
    /// At least one child condition must hold. Expects at least one child.
    Or(Vec<Condition>),
    /// The child condition must not hold.
    Not(Box<Condition>),
}

/// One comparator constructor taking a string-like operand.
macro_rules! string_operand_constructors {
    ($($(#[$meta:meta])* $name:ident => $comparator:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[must_use]
            pub fn $name(variable: impl Into<String>, value: impl Into<String>) -> Self {
                Condition::Comparison {
                    variable: variable.into(),
                    comparator: Comparator::$comparator,
                    value: Value::String(value.into()),
                }
            }
        )+
    };
}

/// One comparator constructor taking a numeric operand.
macro_rules! number_operand_constructors {
    ($($(#[$meta:meta])* $name:ident => $comparator:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[must_use]
            pub fn $name(variable: impl Into<String>, value: f64) -> Self {
                Condition::Comparison {
                    variable: variable.into(),
                    comparator: Comparator::$comparator,
                    value: json!(value),
                }
            }
        )+
    };
}

/// One type-test constructor taking a boolean expectation.
macro_rules! type_test_constructors {
    ($($(#[$meta:meta])* $name:ident => $comparator:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[must_use]
            pub fn $name(variable: impl Into<String>, expected: bool) -> Self {
                Condition::Comparison {
                    variable: variable.into(),
                    comparator: Comparator::$comparator,
                    value: Value::Bool(expected),
                }
            }
        )+
    };
}

impl Condition {
    string_operand_constructors! {
        /// Tests that the string at `variable` equals the literal `value`.
        string_equals => StringEquals,
        /// Tests that the string at `variable` equals the string at the path `value`.
        string_equals_path => StringEqualsPath,
        string_less_than => StringLessThan,
        string_less_than_path => StringLessThanPath,
        string_greater_than => StringGreaterThan,
        string_greater_than_path => StringGreaterThanPath,
        string_less_than_equals => StringLessThanEquals,
        string_less_than_equals_path => StringLessThanEqualsPath,
        string_greater_than_equals => StringGreaterThanEquals,
        string_greater_than_equals_path => StringGreaterThanEqualsPath,
        /// Tests the string at `variable` against a wildcard pattern (`*` matches any run of characters).
        string_matches => StringMatches,
        /// Tests that the timestamp at `variable` equals the literal RFC3339 `value`.
        timestamp_equals => TimestampEquals,
        timestamp_equals_path => TimestampEqualsPath,
        timestamp_less_than => TimestampLessThan,
        timestamp_less_than_path => TimestampLessThanPath,
        timestamp_greater_than => TimestampGreaterThan,
        timestamp_greater_than_path => TimestampGreaterThanPath,
        timestamp_less_than_equals => TimestampLessThanEquals,
        timestamp_less_than_equals_path => TimestampLessThanEqualsPath,
        timestamp_greater_than_equals => TimestampGreaterThanEquals,
        timestamp_greater_than_equals_path => TimestampGreaterThanEqualsPath,
    }

    number_operand_constructors! {
        /// Tests that the number at `variable` equals the literal `value`.
        number_equals => NumericEquals,
        number_less_than => NumericLessThan,
        number_greater_than => NumericGreaterThan,
        number_less_than_equals => NumericLessThanEquals,
        number_greater_than_equals => NumericGreaterThanEquals,
    }

    string_operand_constructors! {
        /// Tests that the number at `variable` equals the number at the path `value`.
        number_equals_path => NumericEqualsPath,
        number_less_than_path => NumericLessThanPath,
        number_greater_than_path => NumericGreaterThanPath,
        number_less_than_equals_path => NumericLessThanEqualsPath,
        number_greater_than_equals_path => NumericGreaterThanEqualsPath,
        /// Tests that the boolean at `variable` equals the boolean at the path `value`.
        boolean_equals_path => BooleanEqualsPath,
    }

    /// Tests that the boolean at `variable` equals the literal `value`.
    #[must_use]
    pub fn boolean_equals(variable: impl Into<String>, value: bool) -> Self {
        Condition::Comparison {
            variable: variable.into(),
            comparator: Comparator::BooleanEquals,
            value: Value::Bool(value),
        }
    }

    type_test_constructors! {
        /// Tests whether the value at `variable` is null (`expected = true`) or non-null.
        is_null => IsNull,
        /// Tests whether a value exists at `variable` at all.
        is_present => IsPresent,
        is_numeric => IsNumeric,
        is_string => IsString,
        is_boolean => IsBoolean,
        is_timestamp => IsTimestamp,
    }

    /// All child conditions must hold. Expects at least one child; an empty
    /// vector renders as an empty `And` array, which the external runtime
    /// rejects when it parses the document.
    #[must_use]
    pub fn and(children: Vec<Condition>) -> Self {
        Condition::And(children)
    }

    /// At least one child condition must hold. Expects at least one child.
    #[must_use]
    pub fn or(children: Vec<Condition>) -> Self {
        Condition::Or(children)
    }

    /// The child condition must not hold.
    #[must_use]
    pub fn not(child: Condition) -> Self {
        Condition::Not(Box::new(child))
    }

    /// Renders this condition to its JSON representation.
    ///
    /// Pure and deterministic; callable repeatedly with identical results.
    #[must_use]
    pub fn render(&self) -> Value {
        match self {
            Condition::Comparison {
                variable,
                comparator,
                value,
            } => {
                let mut rule = serde_json::Map::new();
                rule.insert("Variable".to_string(), Value::String(variable.clone()));
                rule.insert(comparator.as_str().to_string(), value.clone());
                Value::Object(rule)
            }
            Condition::And(children) => {
                json!({ "And": children.iter().map(Condition::render).collect::<Vec<_>>() })
            }
            Condition::Or(children) => {
                json!({ "Or": children.iter().map(Condition::render).collect::<Vec<_>>() })
            }
            Condition::Not(child) => json!({ "Not": child.render() }),
        }
    }
}
