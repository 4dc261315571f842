// Integration tests for the minic front end

use minic::parser::ast::*;
use minic::{parse, parse_source, tokenize, DiagnosticClass, ParseOptions, Severity};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// Every span must start and end inside the source text
fn assert_spans_in_bounds(source: &str, program: &Program) {
    let lines: Vec<&str> = source.split('\n').collect();
    program.for_each_span(|span| {
        for loc in [span.start, span.end] {
            assert!(loc.line >= 1 && loc.line <= lines.len(), "line out of bounds: {:?}", span);
            let width = lines[loc.line - 1].chars().count();
            assert!(
                loc.column >= 1 && loc.column <= width + 1,
                "column out of bounds: {:?}",
                span
            );
        }
        assert!(span.start <= span.end, "inverted span: {:?}", span);
    });
}

#[test]
fn test_full_program() {
    let source = r#"
        struct Point {
            int x;
            int y;
        };

        int count = 0;
        float ratios[4];

        int add(int a, int b) {
            return a + b;
        }

        int sum(int values[], int n) {
            int total = 0;
            for (int i = 0; i < n; i++) {
                total = total + values[0];
            }
            return total;
        }

        void classify(int code) {
            switch (code) {
                case 1:
                    count = count + 1;
                    break;
                case -1:
                    count = count - 1;
                    break;
                default:
                    return;
            }
        }

        int main() {
            struct Point p;
            int i = 10;
            while (i > 0 && !(i == 5)) {
                i--;
                if (i % 2 == 0) {
                    continue;
                } else if (i == 3) {
                    break;
                } else {
                    add(i, 2 * i);
                }
            }
            // done
            return add(1, 2);
        }
    "#;

    let output = parse_source(source);
    // `values[0]` is not part of the grammar: indexing is only allowed in declarations
    assert!(output.has_errors());

    let fixed = source.replace("values[0]", "n");
    let output = parse_source(&fixed);
    assert!(output.diagnostics.is_empty(), "{:#?}", output.diagnostics);

    let names: Vec<&str> = output.program.declarations.iter().map(Decl::name).collect();
    assert_eq!(names, vec!["Point", "count", "ratios", "add", "sum", "classify", "main"]);
    assert!(output.program.node_count() > 50);
    assert_spans_in_bounds(&fixed, &output.program);
}

#[test]
fn test_float_declaration() {
    let output = parse_source("int x = 3.4;");
    assert!(output.diagnostics.is_empty());
    match output.program.declarations.as_slice() {
        [Decl::Var(decl)] => {
            assert_eq!(decl.var_type, TypeName::Int);
            assert_eq!(decl.name, "x");
            assert!(matches!(
                decl.init,
                Some(Expr::Literal { value: LiteralValue::Float(v), .. }) if v == 3.4
            ));
        }
        other => panic!("Expected one variable declaration, got {:?}", other),
    }
}

#[test]
fn test_if_statement_shape() {
    let output = parse_source("void f() { if(x < 3){ return 0; } }");
    assert!(output.diagnostics.is_empty());

    let Decl::Func(func) = &output.program.declarations[0] else {
        panic!("Expected function");
    };
    let Stmt::If(if_stmt) = &func.body.statements[0] else {
        panic!("Expected if statement, got {:?}", func.body.statements[0]);
    };

    match &if_stmt.condition {
        Expr::Binary { op: BinOp::Lt, left, right, .. } => {
            assert!(matches!(&**left, Expr::VarRef { name, .. } if name == "x"));
            assert!(matches!(
                &**right,
                Expr::Literal { value: LiteralValue::Int(3), .. }
            ));
        }
        other => panic!("Expected x < 3, got {:?}", other),
    }
    match if_stmt.then_block.statements.as_slice() {
        [Stmt::Return(ReturnStmt { value: Some(Expr::Literal { value, .. }), .. })] => {
            assert_eq!(*value, LiteralValue::Int(0));
        }
        other => panic!("Expected return 0, got {:?}", other),
    }
    assert!(if_stmt.else_branch.is_none());
}

#[test]
fn test_chained_comparison() {
    let output = parse_source("void f() { a < b < c; }");
    assert_eq!(output.diagnostics.len(), 1);
    let diag = &output.diagnostics[0];
    assert_eq!(diag.severity, Severity::Error);
    assert_eq!(diag.class, DiagnosticClass::Syntax);
    assert!(diag.message.contains("non-associative"));
    assert_eq!(output.program.declarations.len(), 1);
}

#[test]
fn test_unterminated_string() {
    let output = parse_source("char s = \"abc");
    let lexical: Vec<_> = output
        .diagnostics
        .iter()
        .filter(|d| d.class == DiagnosticClass::Lexical)
        .collect();
    assert_eq!(lexical.len(), 1);
    assert_eq!(lexical[0].message, "unterminated string literal");
    assert!(output.tokens.last().is_some_and(|t| t.is_eof()));
}

#[test]
fn test_two_malformed_declarations() {
    let output = parse_source("int ;\nint ;\nint ok = 1;");
    assert_eq!(output.diagnostics.len(), 2);
    assert!(output.diagnostics.iter().all(|d| d.class == DiagnosticClass::Syntax));
    assert_eq!(output.diagnostics[0].line, 1);
    assert_eq!(output.diagnostics[1].line, 2);
    assert_eq!(output.program.declarations.len(), 1);
    assert_eq!(output.program.declarations[0].name(), "ok");
}

#[test]
fn test_recovery_resumes_at_next_function() {
    let source = r#"
        int broken() {
            int x = (1 + ;
            return x;
        }

        int fine() {
            return 1;
        }
    "#;
    let output = parse_source(source);
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].line, 3);
    let names: Vec<&str> = output.program.declarations.iter().map(Decl::name).collect();
    assert_eq!(names, vec!["broken", "fine"]);
}

#[test]
fn test_lexical_and_syntax_diagnostics_together() {
    let output = parse_source("int a = 1;\nint b = # 2;\nint c = ;");
    let classes: Vec<DiagnosticClass> = output.diagnostics.iter().map(|d| d.class).collect();
    assert_eq!(classes, vec![DiagnosticClass::Lexical, DiagnosticClass::Syntax]);
    assert_eq!(
        output.diagnostics[0].message,
        "unexpected character '#' at line 2, column 9"
    );
}

#[test]
fn test_parse_from_tokens() {
    let (tokens, lex_diagnostics) = tokenize("int main() { return 0; }");
    assert!(lex_diagnostics.is_empty());
    let before = tokens.clone();

    let (program, diagnostics) = parse(tokens);
    assert!(diagnostics.is_empty());
    assert_eq!(program.declarations.len(), 1);
    assert_eq!(before.len(), 10);
}

#[test]
fn test_nesting_limit() {
    let source = format!("int x = {}1{};", "(".repeat(500), ")".repeat(500));
    let output = parse_source(&source);
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(
        output.diagnostics[0].message,
        "nesting is deeper than the limit of 128"
    );

    let shallow = format!("int x = {}1{};", "(".repeat(80), ")".repeat(80));
    assert_eq!(parse_source(&shallow).diagnostics.len(), 1);

    let options = ParseOptions {
        max_nesting_depth: 1000,
        ..ParseOptions::default()
    };
    let output = minic::parse_source_with(&shallow, options);
    assert!(output.diagnostics.is_empty());
}

#[test]
fn test_serde_round_trip() {
    let output = parse_source(
        "struct S { int a; };\nint f(int x[]) { switch (x) { case \"s\": break; default: return -1.5; } }\nint g = ;",
    );
    assert_eq!(output.diagnostics.len(), 1);

    let json = serde_json::to_string(&output).unwrap();
    let back: minic::ParseOutput = serde_json::from_str(&json).unwrap();
    assert_eq!(back, output);
}

#[test]
fn test_warnings_are_not_errors() {
    let source = r#"
        int f(int a, int a) { return a; }
        int f() { return 0; }
    "#;
    let output = parse_source(source);
    assert!(!output.has_errors());
    let messages: Vec<&str> = output.diagnostics.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "duplicate parameter 'a'",
            "duplicate declaration of 'f' (first declared at line 2, column 9)",
        ]
    );
    assert!(output.into_result().is_ok());
}

fn expr_strategy() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        prop::sample::select(vec!["a", "b", "count", "x1"]).prop_map(|name| name.to_string()),
        (0u32..1000).prop_map(|n| n.to_string()),
        (0u32..100, 0u32..100).prop_map(|(whole, frac)| format!("{}.{}", whole, frac)),
        "[a-z ]{0,8}".prop_map(|text| format!("\"{}\"", text)),
    ];
    leaf.prop_recursive(4, 24, 3, |inner| {
        let ops = vec!["+", "-", "*", "/", "%", "<", "<=", ">", ">=", "==", "!=", "&&", "||"];
        prop_oneof![
            (inner.clone(), prop::sample::select(ops), inner.clone())
                .prop_map(|(left, op, right)| format!("({} {} {})", left, op, right)),
            inner.clone().prop_map(|operand| format!("-({})", operand)),
            inner.clone().prop_map(|operand| format!("!({})", operand)),
            prop::collection::vec(inner, 0..3).prop_map(|args| format!("g({})", args.join(", "))),
        ]
    })
}

fn stmt_strategy() -> impl Strategy<Value = String> {
    let simple = prop_oneof![
        expr_strategy().prop_map(|e| format!("int v = {};", e)),
        expr_strategy().prop_map(|e| format!("a = {};", e)),
        expr_strategy().prop_map(|e| format!("return {};", e)),
        Just("i++;".to_string()),
        Just("break;".to_string()),
    ];
    simple.prop_recursive(3, 16, 4, |inner| {
        let body = prop::collection::vec(inner, 0..4)
            .prop_map(|stmts| stmts.join("\n"))
            .boxed();
        prop_oneof![
            (expr_strategy(), body.clone())
                .prop_map(|(cond, body)| format!("while ({}) {{\n{}\n}}", cond, body)),
            (expr_strategy(), body.clone(), body.clone()).prop_map(|(cond, then, other)| {
                format!("if ({}) {{\n{}\n}} else {{\n{}\n}}", cond, then, other)
            }),
            (expr_strategy(), body)
                .prop_map(|(cond, body)| format!("for (int i = 0; {}; i++) {{ {} }}", cond, body)),
        ]
    })
}

fn program_strategy() -> impl Strategy<Value = String> {
    (
        expr_strategy(),
        prop::collection::vec(stmt_strategy(), 0..6),
        0usize..6,
    )
        .prop_map(|(init, body, indent)| {
            let pad = " ".repeat(indent);
            let body: Vec<String> = body.iter().map(|stmt| format!("{}{}", pad, stmt)).collect();
            format!(
                "int count = {};\n\nint f(int a, int b[]) {{\n{}\n}}\n",
                init,
                body.join("\n")
            )
        })
}

proptest! {
    #[test]
    fn prop_valid_programs_have_spans_in_bounds(source in program_strategy()) {
        let output = parse_source(&source);
        prop_assert!(output.diagnostics.is_empty(), "{:?}\n{}", output.diagnostics, source);
        prop_assert_eq!(output.program.declarations.len(), 2);
        prop_assert!(output.program.node_count() >= 4);
        assert_spans_in_bounds(&source, &output.program);
    }
}
