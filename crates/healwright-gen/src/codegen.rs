//! Deterministic source emitter.
//!
//! Output conventions: two-space indentation, single-quoted strings,
//! semicolon-terminated statements, one statement per line. String and
//! template literal contents are always escaped here, so no HIR value
//! can break out of its literal.

use std::fmt::Write as _;

use crate::hir::*;

const INDENT: &str = "  ";

/// Render a module to source text.
#[must_use]
pub fn generate(module: &JsModule) -> String {
    let mut out = String::new();
    for stmt in &module.statements {
        write_stmt(&mut out, stmt, 0);
    }
    out
}

/// Render a single expression (top level, no indentation).
#[must_use]
pub fn generate_expr(expr: &Expr) -> String {
    render_expr(expr, 0)
}

/// JS ends a line comment at any of these, not just `\n`.
const fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Split comment text on every JS line terminator; `\r\n` counts once and
/// a trailing terminator adds no empty line.
fn comment_lines(text: &str) -> Vec<&str> {
    let normalized_end = text.strip_suffix("\r\n").or_else(|| text.strip_suffix(is_line_terminator));
    let body = match normalized_end {
        Some(rest) if !rest.is_empty() => rest,
        _ => text,
    };
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = body.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if !is_line_terminator(c) {
            continue;
        }
        lines.push(&body[start..i]);
        start = i + c.len_utf8();
        if c == '\r' {
            if let Some(&(j, '\n')) = chars.peek() {
                start = j + 1;
                chars.next();
            }
        }
    }
    lines.push(&body[start..]);
    lines
}

fn pad(level: usize) -> String {
    INDENT.repeat(level)
}

fn write_stmt(out: &mut String, stmt: &Stmt, level: usize) {
    let p = pad(level);
    match stmt {
        Stmt::Blank => out.push('\n'),
        Stmt::Comment(text) => {
            for line in comment_lines(text) {
                if line.is_empty() {
                    let _ = writeln!(out, "{p}//");
                } else {
                    let _ = writeln!(out, "{p}// {line}");
                }
            }
        }
        Stmt::Import { names, from } => {
            let names: Vec<&str> = names.iter().map(Identifier::as_str).collect();
            let _ = writeln!(out, "{p}import {{ {} }} from {};", names.join(", "), quote(from));
        }
        Stmt::Let { name, value } => {
            let _ = writeln!(out, "{p}let {name} = {};", render_expr(value, level));
        }
        Stmt::Const { name, value } => {
            let _ = writeln!(out, "{p}const {name} = {};", render_expr(value, level));
        }
        Stmt::Assign { name, value } => {
            let _ = writeln!(out, "{p}{name} = {};", render_expr(value, level));
        }
        Stmt::Expr(e) => {
            let _ = writeln!(out, "{p}{};", render_expr(e, level));
        }
        Stmt::Return(None) => {
            let _ = writeln!(out, "{p}return;");
        }
        Stmt::Return(Some(e)) => {
            let _ = writeln!(out, "{p}return {};", render_expr(e, level));
        }
        Stmt::Throw(e) => {
            let _ = writeln!(out, "{p}throw {};", render_expr(e, level));
        }
        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => {
            let _ = write!(
                out,
                "{p}if ({}) {}",
                render_expr(condition, level),
                block(then_branch, level)
            );
            if let Some(else_branch) = else_branch {
                let _ = write!(out, " else {}", block(else_branch, level));
            }
            out.push('\n');
        }
        Stmt::For {
            var,
            start,
            end,
            inclusive,
            body,
        } => {
            let cmp = if *inclusive { "<=" } else { "<" };
            let _ = writeln!(
                out,
                "{p}for (let {var} = {}; {var} {cmp} {}; {var}++) {}",
                render_expr(start, level),
                render_expr(end, level),
                block(body, level)
            );
        }
        Stmt::ForOf { var, iterable, body } => {
            let _ = writeln!(
                out,
                "{p}for (const {var} of {}) {}",
                render_expr(iterable, level),
                block(body, level)
            );
        }
        Stmt::TryCatch {
            body,
            catch_var,
            handler,
        } => {
            let _ = writeln!(
                out,
                "{p}try {} catch ({catch_var}) {}",
                block(body, level),
                block(handler, level)
            );
        }
        Stmt::Function(f) => {
            let prefix = if f.is_async { "async " } else { "" };
            let _ = writeln!(
                out,
                "{p}{prefix}function {}({}) {}",
                f.name,
                render_params(&f.params),
                block(&f.body, level)
            );
        }
    }
}

/// `{ ... }` with the body one level deeper and the brace at `level`.
fn block(stmts: &[Stmt], level: usize) -> String {
    if stmts.is_empty() {
        return "{}".to_string();
    }
    let mut out = String::from("{\n");
    for stmt in stmts {
        write_stmt(&mut out, stmt, level + 1);
    }
    out.push_str(&pad(level));
    out.push('}');
    out
}

fn render_params(params: &[Param]) -> String {
    params
        .iter()
        .map(|p| match p {
            Param::Name(name) => name.to_string(),
            Param::Destructure(names) => {
                let names: Vec<&str> = names.iter().map(Identifier::as_str).collect();
                format!("{{ {} }}", names.join(", "))
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_args(args: &[Expr], level: usize) -> String {
    args.iter()
        .map(|a| render_expr(a, level))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Expressions that need parentheses when used as a member/call target.
const fn is_compound(e: &Expr) -> bool {
    matches!(
        e,
        Expr::Binary { .. }
            | Expr::Unary { .. }
            | Expr::Ternary { .. }
            | Expr::Await(_)
            | Expr::Arrow { .. }
            | Expr::ArrowBlock { .. }
            | Expr::New { .. }
            | Expr::Object(_)
    )
}

fn wrap_if(cond: bool, s: String) -> String {
    if cond {
        format!("({s})")
    } else {
        s
    }
}

fn render_operand(e: &Expr, parent: BinOp, right_side: bool, level: usize) -> String {
    let needs = match e {
        Expr::Binary { op, .. } => {
            let (child, outer) = (op.precedence(), parent.precedence());
            if parent == BinOp::Pow {
                child < outer || (child == outer && !right_side)
            } else {
                child < outer || (child == outer && right_side)
            }
        }
        Expr::Unary { .. } => parent == BinOp::Pow && !right_side,
        Expr::Ternary { .. } | Expr::Arrow { .. } | Expr::ArrowBlock { .. } => true,
        _ => false,
    };
    wrap_if(needs, render_expr(e, level))
}

fn render_expr(e: &Expr, level: usize) -> String {
    match e {
        Expr::Null => "null".to_string(),
        Expr::Bool(b) => b.to_string(),
        Expr::Num(n) => render_num(*n),
        Expr::Str(s) => quote(s),
        Expr::Template(parts) => render_template(parts, level),
        Expr::Ident(id) => id.to_string(),
        Expr::Member { object, property } => {
            format!("{}.{property}", wrap_if(is_compound(object), render_expr(object, level)))
        }
        Expr::Call { callee, args } => format!(
            "{}({})",
            wrap_if(is_compound(callee), render_expr(callee, level)),
            render_args(args, level)
        ),
        Expr::New { constructor, args } => format!(
            "new {}({})",
            wrap_if(is_compound(constructor), render_expr(constructor, level)),
            render_args(args, level)
        ),
        Expr::Await(inner) => {
            let needs = matches!(
                **inner,
                Expr::Binary { .. } | Expr::Ternary { .. } | Expr::Arrow { .. } | Expr::ArrowBlock { .. }
            );
            format!("await {}", wrap_if(needs, render_expr(inner, level)))
        }
        Expr::Binary { left, op, right } => format!(
            "{} {} {}",
            render_operand(left, *op, false, level),
            op.as_str(),
            render_operand(right, *op, true, level)
        ),
        Expr::Unary { op, operand } => {
            let needs = matches!(
                **operand,
                Expr::Binary { .. } | Expr::Ternary { .. } | Expr::Arrow { .. } | Expr::ArrowBlock { .. }
            );
            format!("{}{}", op.as_str(), wrap_if(needs, render_expr(operand, level)))
        }
        Expr::Ternary {
            condition,
            then_expr,
            else_expr,
        } => {
            let nested = |x: &Expr| matches!(x, Expr::Ternary { .. } | Expr::Arrow { .. } | Expr::ArrowBlock { .. });
            format!(
                "{} ? {} : {}",
                wrap_if(nested(condition), render_expr(condition, level)),
                wrap_if(nested(then_expr), render_expr(then_expr, level)),
                wrap_if(nested(else_expr), render_expr(else_expr, level))
            )
        }
        Expr::Object(pairs) => {
            if pairs.is_empty() {
                return "{}".to_string();
            }
            let body: Vec<String> = pairs
                .iter()
                .map(|(k, v)| format!("{}: {}", render_key(k), render_expr(v, level)))
                .collect();
            format!("{{ {} }}", body.join(", "))
        }
        Expr::Array(items) => format!("[{}]", render_args(items, level)),
        Expr::Arrow { params, body } => {
            let body_src = wrap_if(matches!(**body, Expr::Object(_)), render_expr(body, level));
            format!("({}) => {body_src}", render_params(params))
        }
        Expr::ArrowBlock { is_async, params, body } => {
            let prefix = if *is_async { "async " } else { "" };
            format!("{prefix}({}) => {}", render_params(params), block(body, level))
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn render_num(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let s = if n > 0.0 { "Infinity" } else { "-Infinity" };
        s.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn render_key(key: &str) -> String {
    let bare = key
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if bare {
        key.to_string()
    } else {
        quote(key)
    }
}

fn push_escaped_char(out: &mut String, c: char) {
    match c {
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        '\u{2028}' => out.push_str("\\u2028"),
        '\u{2029}' => out.push_str("\\u2029"),
        c if c.is_control() => {
            let _ = write!(out, "\\u{:04x}", u32::from(c));
        }
        c => out.push(c),
    }
}

/// Single-quoted, escaped string literal.
#[must_use]
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push_str("\\'");
        } else {
            push_escaped_char(&mut out, c);
        }
    }
    out.push('\'');
    out
}

fn render_template(parts: &[TemplatePart], level: usize) -> String {
    let mut out = String::from("`");
    for part in parts {
        match part {
            TemplatePart::Text(text) => {
                let mut chars = text.chars().peekable();
                while let Some(c) = chars.next() {
                    match c {
                        '`' => out.push_str("\\`"),
                        '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
                        c => push_escaped_char(&mut out, c),
                    }
                }
            }
            TemplatePart::Expr(e) => {
                let _ = write!(out, "${{{}}}", render_expr(e, level));
            }
        }
    }
    out.push('`');
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn id(name: &str) -> Expr {
        Expr::ident(name).unwrap()
    }

    mod literal_tests {
        use super::*;

        #[test]
        fn numbers() {
            assert_eq!(generate_expr(&Expr::num(3)), "3");
            assert_eq!(generate_expr(&Expr::num(1.5)), "1.5");
            assert_eq!(generate_expr(&Expr::num(-2)), "-2");
            assert_eq!(generate_expr(&Expr::millis(30_000)), "30000");
            assert_eq!(generate_expr(&Expr::Num(f64::NAN)), "NaN");
        }

        #[test]
        fn strings_single_quoted_and_escaped() {
            assert_eq!(generate_expr(&Expr::str("it's")), r"'it\'s'");
            assert_eq!(generate_expr(&Expr::str(r#"text="a\b""#)), r#"'text="a\\b"'"#);
            assert_eq!(generate_expr(&Expr::str("a\nb")), r"'a\nb'");
            assert_eq!(generate_expr(&Expr::str("\u{0}")), r"'\u0000'");
        }

        #[test]
        fn template_escapes() {
            let t = Expr::template(vec![
                TemplatePart::text("Step 1 failed: `x` ${no} "),
                TemplatePart::expr(id("error").dot("message").unwrap()),
            ]);
            assert_eq!(generate_expr(&t), r"`Step 1 failed: \`x\` \${no} ${error.message}`");
        }

        #[test]
        fn object_keys() {
            let o = Expr::object(vec![("waitUntil", Expr::str("load")), ("data-x", Expr::num(1))]);
            assert_eq!(generate_expr(&o), "{ waitUntil: 'load', 'data-x': 1 }");
            assert_eq!(generate_expr(&Expr::object(vec![])), "{}");
        }
    }

    mod precedence_tests {
        use super::*;

        #[test]
        fn mul_of_sum_is_parenthesized() {
            let e = id("a").add(id("b")).mul(id("c"));
            assert_eq!(generate_expr(&e), "(a + b) * c");
        }

        #[test]
        fn left_assoc_right_operand() {
            let e = id("a").sub(id("b").sub(id("c")));
            assert_eq!(generate_expr(&e), "a - (b - c)");
            let e = id("a").sub(id("b")).sub(id("c"));
            assert_eq!(generate_expr(&e), "a - b - c");
        }

        #[test]
        fn pow_backoff_expression() {
            let e = Expr::num(2)
                .pow(id("attempt").sub(Expr::num(1)))
                .mul(id("BASE_DELAY"));
            assert_eq!(generate_expr(&e), "2 ** (attempt - 1) * BASE_DELAY");
        }

        #[test]
        fn await_call_member() {
            let e = id("page").method("goto", vec![Expr::str("/")]).unwrap().await_expr();
            assert_eq!(generate_expr(&e), "await page.goto('/')");
        }

        #[test]
        fn not_of_binary() {
            assert_eq!(generate_expr(&id("a").and(id("b")).not()), "!(a && b)");
        }

        #[test]
        fn arrow_returning_object() {
            let e = Expr::arrow(&[], Expr::object(vec![("a", Expr::num(1))])).unwrap();
            assert_eq!(generate_expr(&e), "() => ({ a: 1 })");
        }
    }

    mod statement_tests {
        use super::*;
        use crate::builder::{JsFunctionBuilder, JsModuleBuilder};

        #[test]
        fn import_and_const() {
            let m = JsModuleBuilder::new()
                .import(&["test", "expect"], "@playwright/test")
                .unwrap()
                .blank()
                .const_decl("MAX", Expr::num(3))
                .unwrap()
                .build();
            assert_eq!(
                generate(&m),
                "import { test, expect } from '@playwright/test';\n\nconst MAX = 3;\n"
            );
        }

        #[test]
        fn inclusive_for_loop() {
            let s = Stmt::for_inclusive(
                "attempt",
                Expr::num(1),
                Expr::num(3),
                vec![Stmt::expr(id("tick").call(vec![]))],
            )
            .unwrap();
            let m = JsModuleBuilder::new().stmt(s).build();
            assert_eq!(
                generate(&m),
                "for (let attempt = 1; attempt <= 3; attempt++) {\n  tick();\n}\n"
            );
        }

        #[test]
        fn async_function_with_try_catch() {
            let f = JsFunctionBuilder::new_async("run")
                .unwrap()
                .params(&["page"])
                .unwrap()
                .stmt(
                    Stmt::try_catch(
                        vec![Stmt::ret()],
                        "error",
                        vec![Stmt::throw(id("error"))],
                    )
                    .unwrap(),
                )
                .build();
            let m = JsModuleBuilder::new().function(f).build();
            assert_eq!(
                generate(&m),
                "async function run(page) {\n  try {\n    return;\n  } catch (error) {\n    throw error;\n  }\n}\n"
            );
        }

        #[test]
        fn nested_async_arrow_indents() {
            let arrow = Expr::async_arrow(
                vec![Param::destructure(&["page"]).unwrap()],
                vec![Stmt::expr(id("go").call(vec![]).await_expr())],
            );
            let m = JsModuleBuilder::new()
                .expr(id("test").call(vec![Expr::str("t"), arrow]))
                .build();
            assert_eq!(
                generate(&m),
                "test('t', async ({ page }) => {\n  await go();\n});\n"
            );
        }

        #[test]
        fn if_else_and_for_of() {
            let s = Stmt::for_of(
                "s",
                id("list"),
                vec![Stmt::if_else(id("s"), vec![Stmt::ret()], vec![])],
            )
            .unwrap();
            let m = JsModuleBuilder::new().stmt(s).build();
            assert_eq!(
                generate(&m),
                "for (const s of list) {\n  if (s) {\n    return;\n  } else {}\n}\n"
            );
        }

        #[test]
        fn multi_line_comment() {
            let m = JsModuleBuilder::new().comment("one\ntwo").build();
            assert_eq!(generate(&m), "// one\n// two\n");
        }

        #[test]
        fn comment_splits_on_every_js_line_terminator() {
            for name in ["pwn\rprocess.exit(1)", "pwn\u{2028}process.exit(1)", "pwn\u{2029}process.exit(1)"] {
                let m = JsModuleBuilder::new().comment(format!("Test: {name}")).build();
                assert_eq!(generate(&m), "// Test: pwn\n// process.exit(1)\n", "{name:?}");
            }
        }

        #[test]
        fn comment_crlf_and_trailing_terminator() {
            let m = JsModuleBuilder::new().comment("one\r\ntwo\r\n").build();
            assert_eq!(generate(&m), "// one\n// two\n");
            let m = JsModuleBuilder::new().comment("one\n\ntwo").build();
            assert_eq!(generate(&m), "// one\n//\n// two\n");
            let m = JsModuleBuilder::new().comment("").build();
            assert_eq!(generate(&m), "//\n");
        }

        #[test]
        fn deterministic() {
            let m = JsModuleBuilder::new()
                .const_decl("X", Expr::str_array(&["a", "b"]))
                .unwrap()
                .build();
            assert_eq!(generate(&m), generate(&m.clone()));
        }
    }
}
