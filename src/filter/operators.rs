//! Filter types and their operator tables

use std::fmt;

use serde::{Deserialize, Serialize};

/// Column type of a filter; decides which operators are legal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterType {
    Text,
    Option,
    MultiOption,
    Number,
    Date,
}

impl FilterType {
    /// Legal operator strings for this type, in display order
    pub fn operators(self) -> &'static [&'static str] {
        match self {
            FilterType::Text => TextOperator::NAMES,
            FilterType::Option => OptionOperator::NAMES,
            FilterType::MultiOption => MultiOptionOperator::NAMES,
            FilterType::Number => NumberOperator::NAMES,
            FilterType::Date => DateOperator::NAMES,
        }
    }

    /// Operator a freshly added filter starts with
    pub fn default_operator(self) -> &'static str {
        match self {
            FilterType::Text => TextOperator::Contains.as_str(),
            FilterType::Option => OptionOperator::Is.as_str(),
            FilterType::MultiOption => MultiOptionOperator::IncludeAnyOf.as_str(),
            FilterType::Number => NumberOperator::Is.as_str(),
            FilterType::Date => DateOperator::Is.as_str(),
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FilterType::Text => "text",
            FilterType::Option => "option",
            FilterType::MultiOption => "multiOption",
            FilterType::Number => "number",
            FilterType::Date => "date",
        };
        f.write_str(s)
    }
}

macro_rules! operator_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const NAMES: &'static [&'static str] = &[$($text),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn parse(operator: &str) -> Option<Self> {
                match operator {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

operator_enum! {
    /// Operators for free-text columns
    TextOperator {
        Contains => "contains",
        DoesNotContain => "does not contain",
    }
}

operator_enum! {
    /// Operators for single-valued option columns
    OptionOperator {
        Is => "is",
        IsNot => "is not",
        IsAnyOf => "is any of",
        IsNoneOf => "is none of",
    }
}

operator_enum! {
    /// Operators for array-valued option columns
    MultiOptionOperator {
        IncludeAnyOf => "include any of",
        IncludeAllOf => "include all of",
        ExcludeIfAnyOf => "exclude if any of",
    }
}

operator_enum! {
    /// Operators for numeric columns
    NumberOperator {
        Is => "is",
        IsNot => "is not",
        GreaterThan => "is greater than",
        GreaterThanOrEqual => "is greater than or equal to",
        LessThan => "is less than",
        LessThanOrEqual => "is less than or equal to",
        IsBetween => "is between",
    }
}

operator_enum! {
    /// Operators for date columns
    DateOperator {
        Is => "is",
        IsNot => "is not",
        IsAfter => "is after",
        IsOnOrAfter => "is on or after",
        IsBefore => "is before",
        IsOnOrBefore => "is on or before",
    }
}

/// How many operand values an operation reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Only `values[0]`
    Single,
    /// `values[0]` and `values[1]`
    Pair,
    /// The whole value list
    Set,
}

/// A recognized `(type, operator)` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Text(TextOperator),
    Option(OptionOperator),
    MultiOption(MultiOptionOperator),
    Number(NumberOperator),
    Date(DateOperator),
}

impl Operation {
    /// Resolve an operator string against a type's table.
    ///
    /// Returns `None` for pairs outside the table.
    pub fn parse(filter_type: FilterType, operator: &str) -> Option<Self> {
        match filter_type {
            FilterType::Text => TextOperator::parse(operator).map(Operation::Text),
            FilterType::Option => OptionOperator::parse(operator).map(Operation::Option),
            FilterType::MultiOption => {
                MultiOptionOperator::parse(operator).map(Operation::MultiOption)
            }
            FilterType::Number => NumberOperator::parse(operator).map(Operation::Number),
            FilterType::Date => DateOperator::parse(operator).map(Operation::Date),
        }
    }

    pub fn filter_type(self) -> FilterType {
        match self {
            Operation::Text(_) => FilterType::Text,
            Operation::Option(_) => FilterType::Option,
            Operation::MultiOption(_) => FilterType::MultiOption,
            Operation::Number(_) => FilterType::Number,
            Operation::Date(_) => FilterType::Date,
        }
    }

    pub fn operator(self) -> &'static str {
        match self {
            Operation::Text(op) => op.as_str(),
            Operation::Option(op) => op.as_str(),
            Operation::MultiOption(op) => op.as_str(),
            Operation::Number(op) => op.as_str(),
            Operation::Date(op) => op.as_str(),
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            Operation::Option(OptionOperator::IsAnyOf | OptionOperator::IsNoneOf)
            | Operation::MultiOption(_) => Arity::Set,
            Operation::Number(NumberOperator::IsBetween) => Arity::Pair,
            _ => Arity::Single,
        }
    }
}
