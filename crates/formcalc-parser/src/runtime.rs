//! Names the generated JavaScript expects from its host.
//!
//! The output calls into a runtime object bound to [`NAMESPACE`]; every
//! member it touches is listed here. Hosts implement these names, so they
//! are a wire contract and must not change.

use std::cmp::Ordering;

/// Global the generated code reads runtime helpers from.
pub const NAMESPACE: &str = "pfm_rt";

// =============================================================================
// Helpers
// =============================================================================

pub const POS_OP: &str = "pos_op";
pub const NEG_OP: &str = "neg_op";
pub const LOG_NOT_OP: &str = "log_not_op";
pub const LOG_OR_OP: &str = "log_or_op";
pub const LOG_AND_OP: &str = "log_and_op";
pub const EQ_OP: &str = "eq_op";
pub const NEQ_OP: &str = "neq_op";
pub const LT_OP: &str = "lt_op";
pub const LE_OP: &str = "le_op";
pub const GT_OP: &str = "gt_op";
pub const GE_OP: &str = "ge_op";
pub const PLUS_OP: &str = "plus_op";
pub const MINUS_OP: &str = "minus_op";
pub const MUL_OP: &str = "mul_op";
pub const DIV_OP: &str = "div_op";
pub const ASGN_VAL_OP: &str = "asgn_val_op";

pub const DOT_ACC: &str = "dot_acc";
pub const DOTDOT_ACC: &str = "dotdot_acc";
pub const CONCAT_OBJ: &str = "concat_obj";
pub const IS_OBJ: &str = "is_obj";
pub const IS_ARY: &str = "is_ary";
pub const GET_VAL: &str = "get_val";
pub const GET_JSOBJ: &str = "get_jsobj";
pub const VAR_FILTER: &str = "var_filter";

/// Re-enters the compiler from `Eval`.
pub const TRANSLATE: &str = "Translate";

/// Every non-built-in member of the runtime namespace.
pub const HELPERS: &[&str] = &[
    POS_OP,
    NEG_OP,
    LOG_NOT_OP,
    LOG_OR_OP,
    LOG_AND_OP,
    EQ_OP,
    NEQ_OP,
    LT_OP,
    LE_OP,
    GT_OP,
    GE_OP,
    PLUS_OP,
    MINUS_OP,
    MUL_OP,
    DIV_OP,
    ASGN_VAL_OP,
    DOT_ACC,
    DOTDOT_ACC,
    CONCAT_OBJ,
    IS_OBJ,
    IS_ARY,
    GET_VAL,
    GET_JSOBJ,
    VAR_FILTER,
    TRANSLATE,
];

/// Whether `name` is a member of the runtime namespace.
pub fn is_runtime_member(name: &str) -> bool {
    HELPERS.contains(&name) || BUILTIN_FUNCTIONS.contains(&name)
}

// =============================================================================
// Built-in Functions
// =============================================================================

/// Longest built-in name; longer callees are never looked up.
pub const BUILTIN_NAME_MAX_LEN: usize = 12;

/// FormCalc built-ins in canonical spelling, sorted case-insensitively.
pub const BUILTIN_FUNCTIONS: &[&str] = &[
    "Abs",
    "Apr",
    "At",
    "Avg",
    "Ceil",
    "Choose",
    "Concat",
    "Count",
    "Cterm",
    "Date",
    "Date2Num",
    "DateFmt",
    "Decode",
    "Encode",
    "Eval",
    "Exists",
    "Floor",
    "Format",
    "FV",
    "Get",
    "HasValue",
    "If",
    "Ipmt",
    "IsoDate2Num",
    "IsoTime2Num",
    "Left",
    "Len",
    "LocalDateFmt",
    "LocalTimeFmt",
    "Lower",
    "Ltrim",
    "Max",
    "Min",
    "Mod",
    "NPV",
    "Num2Date",
    "Num2GMTime",
    "Num2Time",
    "Oneof",
    "Parse",
    "Pmt",
    "Post",
    "PPmt",
    "Put",
    "PV",
    "Rate",
    "Ref",
    "Replace",
    "Right",
    "Round",
    "Rtrim",
    "Space",
    "Str",
    "Stuff",
    "Substr",
    "Sum",
    "Term",
    "Time",
    "Time2Num",
    "TimeFmt",
    "UnitType",
    "UnitValue",
    "Upper",
    "Uuid",
    "Within",
    "WordNum",
];

fn cmp_ignore_ascii_case(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
}

/// Canonical spelling of a built-in, matched case-insensitively.
pub fn builtin_function_name(name: &str) -> Option<&'static str> {
    if name.len() > BUILTIN_NAME_MAX_LEN {
        return None;
    }
    BUILTIN_FUNCTIONS
        .binary_search_by(|probe| cmp_ignore_ascii_case(probe, name))
        .ok()
        .map(|i| BUILTIN_FUNCTIONS[i])
}

// =============================================================================
// SOM Methods
// =============================================================================

/// SOM methods with object parameters. Bit `i` of the mask marks argument
/// `i` as an object reference rather than a value. Sorted by name.
pub const SOM_METHODS: &[(&str, u32)] = &[
    ("absPage", 0x01),
    ("absPageInBatch", 0x01),
    ("absPageSpan", 0x01),
    ("append", 0x01),
    ("clear", 0x01),
    ("formNodes", 0x01),
    ("h", 0x01),
    ("insert", 0x03),
    ("isRecordGroup", 0x01),
    ("page", 0x01),
    ("pageSpan", 0x01),
    ("remove", 0x01),
    ("saveFilteredXML", 0x01),
    ("setElement", 0x01),
    ("sheet", 0x01),
    ("sheetInBatch", 0x01),
    ("sign", 0x61),
    ("verify", 0x0d),
    ("w", 0x01),
    ("x", 0x01),
    ("y", 0x01),
];

/// Object-parameter mask of a SOM method; `0` when unknown. Case-sensitive.
pub fn som_method_params(name: &str) -> u32 {
    SOM_METHODS
        .binary_search_by(|(probe, _)| probe.cmp(&name))
        .map_or(0, |i| SOM_METHODS[i].1)
}
