//! End-to-end FormCalc to JavaScript fixtures.

use formcalc_parser::{
    codes, compile, compile_with_options, runtime, CompileError, CompileOptions, ParseError,
    ParserOptions, COMMENTS_ONLY,
};

const PROLOGUE: &str = r#"(function() {
let pfm_method_runner = function(obj, cb) {
  if (pfm_rt.is_ary(obj)) {
    let pfm_method_return = null;
    for (var idx = obj.length -1; idx > 1; idx--) {
      pfm_method_return = cb(obj[idx]);
    }
    return pfm_method_return;
  }
  return cb(obj);
};
var pfm_ret = null;
"#;

const EPILOGUE: &str = "return pfm_rt.get_val(pfm_ret);\n}).call(this);";

fn wrap(body: &str) -> String {
    format!("{PROLOGUE}{body}{EPILOGUE}")
}

fn assert_compiles_to(source: &str, body: &str) {
    assert_eq!(compile(source).unwrap(), wrap(body), "source: {source:?}");
}

fn assert_fails(source: &str) -> CompileError {
    match compile(source) {
        Ok(js) => panic!("{source:?} should not compile, got:\n{js}"),
        Err(err) => err,
    }
}

fn with_parse_depth(depth: usize) -> CompileOptions {
    CompileOptions::default().with_parser(ParserOptions::default().with_max_depth(depth))
}

// =============================================================================
// Programs
// =============================================================================

#[test]
fn empty_and_comment_only_scripts() {
    assert_eq!(compile("").unwrap(), COMMENTS_ONLY);
    assert_eq!(compile("; Just comment").unwrap(), COMMENTS_ONLY);
    assert_eq!(compile("// Just comment\r\n\t ").unwrap(), COMMENTS_ONLY);
}

#[test]
fn comment_then_value() {
    assert_compiles_to("; Just comment\n12", "pfm_ret = 12;\n");
}

#[test]
fn form_script_with_if_chain() {
    let input = r#"$ = Avg (-3, 5, -6, 12, -13);
$ = Avg (Table2..Row[*].Cell1);
if ($ ne -1)then
  border.fill.color.value = "255,64,64";
elseif ($ ne -2) then
  border.fill.color.value = "128,128,128";
else
  border.fill.color.value = "20,170,13";
endif
$"#;

    let value = r#"pfm_rt.dot_acc(pfm_rt.dot_acc(pfm_rt.dot_acc(border, "border", "fill", 0, 0), "", "color", 0, 0), "", "value", 0, 0)"#;
    let assign = |color: &str| {
        format!("if (pfm_rt.is_obj({value}))\n{{\npfm_rt.asgn_val_op({value}, \"{color}\");\n}}\n")
    };

    let expected = format!(
        r#"if (pfm_rt.is_obj(this))
{{
pfm_rt.asgn_val_op(this, pfm_rt.Avg(pfm_rt.neg_op(3), 5, pfm_rt.neg_op(6), 12, pfm_rt.neg_op(13)));
}}
if (pfm_rt.is_obj(this))
{{
pfm_rt.asgn_val_op(this, pfm_rt.Avg(pfm_rt.dot_acc(pfm_rt.dotdot_acc(Table2, "Table2", "Row", 1), "", "Cell1", 0, 0)));
}}
if (pfm_rt.get_val(pfm_rt.neq_op(this, pfm_rt.neg_op(1))))
{{
{}}}
else if (pfm_rt.get_val(pfm_rt.neq_op(this, pfm_rt.neg_op(2))))
{{
{}}}
else {{
{}}}
pfm_ret = this;
"#,
        assign("255,64,64"),
        assign("128,128,128"),
        assign("20,170,13"),
    );

    assert_compiles_to(input, &expected);
}

#[test]
fn output_is_deterministic() {
    let source = "var total = 0\nforeach v in (a.b[*], c) do total = total + v endfor\ntotal";
    assert_eq!(compile(source).unwrap(), compile(source).unwrap());
}

// =============================================================================
// Functions and declarations
// =============================================================================

#[test]
fn function_with_params() {
    assert_compiles_to(
        "func MyFunction(param1, param2) do\n  param1 * param2\nendfunc",
        "function MyFunction(param1, param2) {\n\
         var pfm_ret = null;\n\
         pfm_ret = pfm_rt.mul_op(param1, param2);\n\
         return pfm_ret;\n\
         }\n",
    );
}

#[test]
fn function_without_params() {
    assert_compiles_to(
        "func MyFunction() do\n  42\nendfunc",
        "function MyFunction() {\nvar pfm_ret = null;\npfm_ret = 42;\nreturn pfm_ret;\n}\n",
    );
}

#[test]
fn function_with_bad_params_list() {
    assert_fails("func MyFunction(param1,) do\n  param1 * param2\nendfunc");
}

#[test]
fn var_declaration() {
    assert_compiles_to(
        r#"var s = """#,
        "var s = \"\";\ns = pfm_rt.var_filter(s);\npfm_ret = s;\n",
    );
}

#[test]
fn var_without_initializer() {
    assert_compiles_to("var s", "var s = \"\";\npfm_ret = s;\n");
}

// =============================================================================
// Calls
// =============================================================================

#[test]
fn method_call_small() {
    assert_compiles_to(
        "i.f(O)",
        "pfm_ret = pfm_rt.get_val((function() {\n\
         \x20 return pfm_method_runner(i, function(obj) {\n\
         \x20   return obj.f(pfm_rt.get_val(O));\n\
         \x20 });\n\
         }).call(this));\n",
    );
}

#[test]
fn method_call_nested() {
    let expected = r#"pfm_ret = pfm_rt.get_val((function() {
  return pfm_method_runner(i, function(obj) {
    return obj.f(pfm_rt.get_val((function() {
  return pfm_method_runner(O, function(obj) {
    return obj.e(pfm_rt.get_val((function() {
  return pfm_method_runner(O, function(obj) {
    return obj.e(pfm_rt.get_val(O));
  });
}).call(this)));
  });
}).call(this)));
  });
}).call(this));
"#;
    assert_compiles_to("i.f(O.e(O.e(O)))", expected);
}

fn method_runner(receiver: &str, call: &str) -> String {
    format!(
        "pfm_ret = pfm_rt.get_val((function() {{\n  return pfm_method_runner({receiver}, function(obj) {{\n    return obj.{call};\n  }});\n}}).call(this));\n"
    )
}

#[test]
fn method_call_no_arguments() {
    assert_compiles_to("P.x()", &method_runner("P", "x()"));
}

#[test]
fn method_call_single_object_argument() {
    assert_compiles_to("P.x(foo)", &method_runner("P", "x(pfm_rt.get_jsobj(foo))"));
}

#[test]
fn method_call_multiple_arguments() {
    assert_compiles_to(
        "P.x(foo, bar, baz)",
        &method_runner(
            "P",
            "x(pfm_rt.get_jsobj(foo), pfm_rt.get_val(bar), pfm_rt.get_val(baz))",
        ),
    );
}

#[test]
fn method_call_verify_mask() {
    // 0x0d: arguments 0, 2 and 3 are objects.
    assert_compiles_to(
        "s.verify(a, b, c, d, e)",
        &method_runner(
            "s",
            "verify(pfm_rt.get_jsobj(a), pfm_rt.get_val(b), pfm_rt.get_jsobj(c), \
             pfm_rt.get_jsobj(d), pfm_rt.get_val(e))",
        ),
    );
}

#[test]
fn argument_list_errors() {
    for source in ["P.x(!foo!bar!baz)", "P.x(foo,bar,baz,)", "P.x(foo,bar,,baz)"] {
        let err = assert_fails(source);
        assert_eq!(err.code(), codes::FORMCALC_UNEXPECTED_TOKEN, "{source}");
    }
}

#[test]
fn builtin_lookup_is_case_insensitive_som_lookup_is_not() {
    assert_compiles_to("avg(1, 2)", "pfm_ret = pfm_rt.Avg(1, 2);\n");
    assert_compiles_to("AVG(1, 2)", "pfm_ret = pfm_rt.Avg(1, 2);\n");
    assert_compiles_to("a.X(b)", &method_runner("a", "X(pfm_rt.get_val(b))"));
    assert_compiles_to("a.x(b)", &method_runner("a", "x(pfm_rt.get_jsobj(b))"));
}

#[test]
fn unknown_function_fails() {
    let err = assert_fails("Frobnicate(1)");
    assert_eq!(err.code(), codes::FORMCALC_UNKNOWN_FUNCTION);
    assert!(err.to_string().contains("Frobnicate"));
}

// =============================================================================
// Literals and operators
// =============================================================================

#[test]
fn numbers_pass_through_unchanged() {
    for number in ["0", "007", "1.50", "2e10", "3.5E-2", ".25", "4e+1"] {
        assert_compiles_to(number, &format!("pfm_ret = {number};\n"));
    }
}

#[test]
fn string_quoting() {
    assert_compiles_to(
        r#""Simon says ""run""""#,
        "pfm_ret = \"Simon says \\\"run\\\"\";\n",
    );
    assert_compiles_to("\"line1\r\nline2\"", "pfm_ret = \"line1\\nline2\";\n");
    assert_compiles_to(r#""""#, "pfm_ret = \"\";\n");
}

#[test]
fn keywords_are_case_sensitive() {
    // `IF` is an ordinary identifier.
    assert_compiles_to("IF", "pfm_ret = IF;\n");
    assert_compiles_to("a ne b", "pfm_ret = pfm_rt.neq_op(a, b);\n");
    assert_compiles_to("a <> b", "pfm_ret = pfm_rt.neq_op(a, b);\n");
}

#[test]
fn multiple_assignment_is_not_allowed() {
    assert_fails("(a=(b=t))=u");
}

#[test]
fn bad_if_expressions() {
    assert_fails("if ( then");
    let err = assert_fails("if ($ ne -1) then\"\nelseif( then");
    assert_eq!(err.code(), codes::FORMCALC_UNTERMINATED_STRING);
}

#[test]
fn stray_closing_keyword_is_trailing_input() {
    let err = assert_fails("1 endif");
    assert_eq!(err.code(), codes::FORMCALC_TRAILING_INPUT);
}

#[test]
fn lexer_errors_abort_compilation() {
    let err = assert_fails("fTep a\n.#\nfo@ =[=l");
    assert_eq!(err.code(), codes::FORMCALC_UNEXPECTED_CHARACTER);
    let err = assert_fails("a = 1\u{0}");
    assert_eq!(err.code(), codes::FORMCALC_INVALID_CHARACTER);
    let err = assert_fails("12abc");
    assert_eq!(err.code(), codes::FORMCALC_MALFORMED_NUMBER);
}

#[test]
fn exponent_without_digits_is_rejected() {
    for source in ["3e", "1e+", "2E-", "a = 1.5e"] {
        let err = assert_fails(source);
        assert_eq!(err.code(), codes::FORMCALC_MALFORMED_NUMBER, "{source}");
    }
    assert_compiles_to("2e3", "pfm_ret = 2e3;\n");
}

// =============================================================================
// Limits
// =============================================================================

#[test]
fn max_parse_depth() {
    let source = "foo(bar[baz(fizz[0])])";
    let err = compile_with_options(source, &with_parse_depth(5)).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Parse(ParseError::TooDeep { limit: 5, .. })
    ));
}

#[test]
fn parse_depth_with_wide_tree() {
    let source = "a <> b <> c <> d <> e <> f <> g <> h <> i <> j";
    assert!(compile(source).is_ok());
    let err = compile_with_options(source, &with_parse_depth(5)).unwrap_err();
    assert_eq!(err.code(), codes::FORMCALC_PARSE_TOO_DEEP);
}

#[test]
fn pathological_nesting_is_rejected() {
    let source = format!("{}x{}", "(".repeat(100_000), ")".repeat(100_000));
    let err = compile(&source).unwrap_err();
    assert_eq!(err.code(), codes::FORMCALC_PARSE_TOO_DEEP);

    let source = format!("{}x", "-".repeat(100_000));
    let err = compile(&source).unwrap_err();
    assert_eq!(err.code(), codes::FORMCALC_PARSE_TOO_DEEP);
}

#[test]
fn deepest_accepted_operator_chains_compile() {
    let source = format!("{}a", "-".repeat(1_230));
    assert!(compile(&source).is_ok());

    let source = format!("{}a", "-".repeat(1_240));
    let err = compile(&source).unwrap_err();
    assert_eq!(err.code(), codes::FORMCALC_PARSE_TOO_DEEP);

    let source = vec!["a"; 1_200].join(" * ");
    assert!(compile(&source).is_ok());
}

// =============================================================================
// Runtime contract
// =============================================================================

/// Every `pfm_rt.<member>` reference in `js`.
fn runtime_members(js: &str) -> Vec<&str> {
    let prefix = format!("{}.", runtime::NAMESPACE);
    js.match_indices(&prefix)
        .map(|(start, _)| {
            let rest = &js[start + prefix.len()..];
            let end = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(rest.len());
            &rest[..end]
        })
        .collect()
}

#[test]
fn generated_code_only_uses_runtime_members() {
    let source = r#"
        var !count = 0
        func Total(a, b) do a + b endfunc
        if (not x.y & z | w) then
          !count = Total(1, 2)
        elseif (a <= b) then
          a = -b * +c / d - e
        else
          a.#b.* = "x"
        endif
        while (a < b) do a = a + 1 endwhile
        for i = 1 upto 10 step 2 do continue endfor
        foreach v in (a..b[-1], c[+2]) do break endfor
        Exists(a.b) Eval("1") Sum(a[*]) p.sign(q, r)
        x ge y
    "#;
    // `Total` is not a built-in, so call it through a method receiver.
    let source = source.replace("Total(1, 2)", "$.Total(1, 2)");
    let js = compile(&source).unwrap();
    let members = runtime_members(&js);
    assert!(!members.is_empty());
    for member in members {
        assert!(
            runtime::is_runtime_member(member),
            "unknown runtime member `{member}`"
        );
    }
}
