//! Stable error codes for compilation failures.
//!
//! All codes are SCREAMING_SNAKE_CASE and stable across versions.

/// A character outside the accepted source range.
pub const FORMCALC_INVALID_CHARACTER: &str = "FORMCALC_INVALID_CHARACTER";

/// A valid character that cannot start a token.
pub const FORMCALC_UNEXPECTED_CHARACTER: &str = "FORMCALC_UNEXPECTED_CHARACTER";

/// String literal without a closing quote.
pub const FORMCALC_UNTERMINATED_STRING: &str = "FORMCALC_UNTERMINATED_STRING";

/// Number literal followed directly by a letter.
pub const FORMCALC_MALFORMED_NUMBER: &str = "FORMCALC_MALFORMED_NUMBER";

/// The grammar required a different token.
pub const FORMCALC_UNEXPECTED_TOKEN: &str = "FORMCALC_UNEXPECTED_TOKEN";

/// `()` where an expression was required.
pub const FORMCALC_EMPTY_PARENS: &str = "FORMCALC_EMPTY_PARENS";

/// Parser recursion limit reached.
pub const FORMCALC_PARSE_TOO_DEEP: &str = "FORMCALC_PARSE_TOO_DEEP";

/// Too many arguments in one call.
pub const FORMCALC_TOO_MANY_ARGUMENTS: &str = "FORMCALC_TOO_MANY_ARGUMENTS";

/// Accessor/call chain too long.
pub const FORMCALC_CHAIN_TOO_LONG: &str = "FORMCALC_CHAIN_TOO_LONG";

/// Too many statements in one list.
pub const FORMCALC_TOO_MANY_EXPRESSIONS: &str = "FORMCALC_TOO_MANY_EXPRESSIONS";

/// Input left over after the last statement.
pub const FORMCALC_TRAILING_INPUT: &str = "FORMCALC_TRAILING_INPUT";

/// Code generator recursion limit reached.
pub const FORMCALC_CODEGEN_TOO_DEEP: &str = "FORMCALC_CODEGEN_TOO_DEEP";

/// Generated JavaScript exceeded the size ceiling.
pub const FORMCALC_OUTPUT_TOO_LARGE: &str = "FORMCALC_OUTPUT_TOO_LARGE";

/// Call to a name that is neither a built-in nor a SOM method.
pub const FORMCALC_UNKNOWN_FUNCTION: &str = "FORMCALC_UNKNOWN_FUNCTION";

/// Every code, for exhaustive checks.
pub const ALL: &[&str] = &[
    FORMCALC_INVALID_CHARACTER,
    FORMCALC_UNEXPECTED_CHARACTER,
    FORMCALC_UNTERMINATED_STRING,
    FORMCALC_MALFORMED_NUMBER,
    FORMCALC_UNEXPECTED_TOKEN,
    FORMCALC_EMPTY_PARENS,
    FORMCALC_PARSE_TOO_DEEP,
    FORMCALC_TOO_MANY_ARGUMENTS,
    FORMCALC_CHAIN_TOO_LONG,
    FORMCALC_TOO_MANY_EXPRESSIONS,
    FORMCALC_TRAILING_INPUT,
    FORMCALC_CODEGEN_TOO_DEEP,
    FORMCALC_OUTPUT_TOO_LARGE,
    FORMCALC_UNKNOWN_FUNCTION,
];
