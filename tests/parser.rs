use pretty_assertions::assert_eq;

use quill::ast::{Expr, Program, Stmt};
use quill::ast_printer::AstPrinter;
use quill::error::LoxError;
use quill::parser::{Parser, MAX_NESTING};
use quill::scanner::Scanner;

fn parse(source: &str) -> Result<Program, Vec<LoxError>> {
    Parser::new(Scanner::new(source)).parse()
}

/// Parse and render in prefix form, panicking on any error.
fn sexpr(source: &str) -> String {
    match parse(source) {
        Ok(program) => AstPrinter.print_program(&program),
        Err(errors) => panic!("unexpected parse errors: {:?}", errors),
    }
}

fn error_messages(source: &str) -> Vec<String> {
    match parse(source) {
        Ok(program) => panic!("expected errors, got {:?}", program),
        Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
    }
}

#[test]
fn test_parse_multiplication_binds_tighter_than_addition() {
    assert_eq!(sexpr("print 2 + 3 * 4;"), "(print (+ 2 (* 3 4)))");
}

#[test]
fn test_parse_grouping_overrides_precedence() {
    assert_eq!(sexpr("print (2 + 3) * 4;"), "(print (* (group (+ 2 3)) 4))");
}

#[test]
fn test_parse_binary_operators_are_left_associative() {
    assert_eq!(sexpr("print 10 - 4 - 3;"), "(print (- (- 10 4) 3))");
    assert_eq!(sexpr("print 8 / 4 / 2;"), "(print (/ (/ 8 4) 2))");
}

#[test]
fn test_parse_assignment_is_right_associative() {
    assert_eq!(sexpr("a = b = 1;"), "(expr (= a (= b 1)))");
}

#[test]
fn test_parse_unary_comparison_and_equality() {
    assert_eq!(sexpr("print -!x;"), "(print (- (! x)))");
    assert_eq!(sexpr("print !true == false;"), "(print (== (! true) false))");
    assert_eq!(
        sexpr("print 1 + 2 < 4 != nil;"),
        "(print (!= (< (+ 1 2) 4) nil))"
    );
}

#[test]
fn test_parse_literals() {
    assert_eq!(
        sexpr("print \"hi\"; print 2.5; print true; print nil;"),
        "(print \"hi\")\n(print 2.5)\n(print true)\n(print nil)"
    );
}

#[test]
fn test_parse_declarations() {
    assert_eq!(sexpr("let x;"), "(let x)");
    assert_eq!(sexpr("let x = 1;"), "(let x 1)");
    assert_eq!(
        sexpr("fn add(a, b) { return a + b; }"),
        "(fn add (a b) (return (+ a b)))"
    );
    assert_eq!(sexpr("fn f() { return; }"), "(fn f () (return))");
}

#[test]
fn test_parse_control_flow() {
    assert_eq!(
        sexpr("while (i < 3) { print i; i = i + 1; }"),
        "(while (< i 3) (block (print i) (expr (= i (+ i 1)))))"
    );
    assert_eq!(
        sexpr("if (x) print 1; else print 2;"),
        "(if x (print 1) (print 2))"
    );
}

#[test]
fn test_parse_dangling_else_binds_to_nearest_if() {
    assert_eq!(
        sexpr("if (a) if (b) print 1; else print 2;"),
        "(if a (if b (print 1) (print 2)))"
    );
}

#[test]
fn test_parse_calls_and_properties() {
    assert_eq!(sexpr("a.b.c(1, 2);"), "(expr (call (. (. a b) c) 1 2))");
    assert_eq!(sexpr("make()();"), "(expr (call (call make)))");
    assert_eq!(sexpr("a.b = 3;"), "(expr (.= a b 3))");
    assert_eq!(sexpr("this.x = this.y;"), "(expr (.= this x (. this y)))");
}

#[test]
fn test_parse_class_keeps_only_methods() {
    assert_eq!(
        sexpr("class A { let x = 1; fn m() { return 1; } }"),
        "(class A (fn m () (return 1)))"
    );
}

#[test]
fn test_parse_class_with_init_and_methods() {
    let program = parse("class P { fn init(x) { this.x = x; } fn get() { return this.x; } }")
        .expect("valid class");

    let Stmt::Class(class) = &program.declarations[0] else {
        panic!("expected a class, got {:?}", program.declarations[0]);
    };

    assert_eq!(class.name.lexeme, "P");

    let names: Vec<&str> = class.methods.iter().map(|m| m.name.lexeme.as_str()).collect();
    assert_eq!(names, ["init", "get"]);
    assert_eq!(class.methods[0].arity(), 1);
}

#[test]
fn test_parse_invalid_assignment_target() {
    assert_eq!(
        error_messages("1 = 2;"),
        ["[line 1] Error: Invalid assignment target."]
    );
    assert_eq!(
        error_messages("a + b = c;"),
        ["[line 1] Error: Invalid assignment target."]
    );
    assert_eq!(
        error_messages("f() = 1;"),
        ["[line 1] Error: Invalid assignment target."]
    );
}

/// Run `source` through the parser on a thread with a roomy stack so only
/// the parser's own nesting limit decides the outcome.
fn errors_on_large_stack(source: String) -> Vec<String> {
    std::thread::Builder::new()
        .stack_size(32 * 1024 * 1024)
        .spawn(move || error_messages(&source))
        .expect("spawn test thread")
        .join()
        .expect("test thread panicked")
}

#[test]
fn test_parse_rejects_runaway_grouping() {
    let source = "(".repeat(100_000);

    assert_eq!(
        errors_on_large_stack(source),
        ["[line 1] Error: at '(': Too much nesting."]
    );
}

#[test]
fn test_parse_rejects_runaway_unary_and_blocks() {
    let unary = format!("print {}1;", "-".repeat(100_000));
    let blocks = format!("{}{}", "{".repeat(100_000), "}".repeat(100_000));

    assert_eq!(
        errors_on_large_stack(unary),
        ["[line 1] Error: at '-': Too much nesting."]
    );

    // Every enclosing block then runs out of input before its `}`.
    let errors = errors_on_large_stack(blocks);
    assert_eq!(errors[0], "[line 1] Error: at '{': Too much nesting.");
    assert!(errors.len() > 1);
    assert!(errors[1..]
        .iter()
        .all(|e| e == "[line 1] Error: at end: Expect '}' after block."));
}

#[test]
fn test_parse_accepts_nesting_below_the_limit() {
    let depth = MAX_NESTING / 4;
    let source = format!("print {}1{};", "(".repeat(depth), ")".repeat(depth));

    let program = std::thread::Builder::new()
        .stack_size(32 * 1024 * 1024)
        .spawn(move || parse(&source).map_err(|errors| errors.len()))
        .expect("spawn test thread")
        .join()
        .expect("test thread panicked");

    assert_eq!(program.map(|p| p.declarations.len()), Ok(1));
}

#[test]
fn test_parse_reports_every_independent_error() {
    let messages = error_messages("let = 1;\nprint 2;\nprint ;\n");

    assert_eq!(
        messages,
        [
            "[line 1] Error: at '=': Expect variable name.",
            "[line 3] Error: at ';': Expect expression.",
        ]
    );
}

#[test]
fn test_parse_error_inside_block_does_not_abandon_block() {
    let messages = error_messages("{ print ; print 1; }");

    assert_eq!(messages, ["[line 1] Error: at ';': Expect expression."]);
}

#[test]
fn test_parse_missing_semicolon_at_end() {
    assert_eq!(
        error_messages("print 1"),
        ["[line 1] Error: at end: Expect ';' after value."]
    );
}

#[test]
fn test_parse_unexpected_character_is_a_lex_error() {
    let errors = parse("print 1 $;").expect_err("stray character");

    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], LoxError::Lex { line: 1, .. }));
    assert_eq!(errors[0].to_string(), "[line 1] Error: Unexpected character: $");
}

#[test]
fn test_parse_unterminated_string() {
    let errors = parse("print \"abc").expect_err("unterminated string");

    assert_eq!(errors.len(), 2);
    assert!(matches!(errors[0], LoxError::Lex { .. }));
    assert_eq!(errors[0].to_string(), "[line 1] Error: Unterminated string.");
    assert_eq!(
        errors[1].to_string(),
        "[line 1] Error: at end: Expect expression."
    );
}

#[test]
fn test_parse_too_many_arguments() {
    let args: Vec<String> = (0..256).map(|n| n.to_string()).collect();
    let source = format!("f({});", args.join(", "));

    assert_eq!(
        error_messages(&source),
        ["[line 1] Error: Can't have more than 255 arguments."]
    );
}

#[test]
fn test_parse_empty_input() {
    assert!(parse("").expect("empty").is_empty());
    assert!(parse("// only a comment\n").expect("comment").is_empty());
}

#[test]
fn test_parse_records_source_lines() {
    let program = parse("print 1;\n\nprint x;").expect("valid");

    let Stmt::Print(Expr::Variable(token)) = &program.declarations[1] else {
        panic!("expected print of a variable");
    };

    assert_eq!(token.line, 3);

    let Stmt::Print(Expr::Literal { line, .. }) = &program.declarations[0] else {
        panic!("expected print of a literal");
    };

    assert_eq!(*line, 1);
}

#[test]
fn test_parse_is_deterministic() {
    let source = "class C { fn init() { this.n = 0; } } let c = C(); while (c.n < 3) c.n = c.n + 1;";

    assert_eq!(parse(source).expect("first"), parse(source).expect("second"));
}

#[test]
fn test_parse_serializes_to_json() {
    let program = parse("print 1;").expect("valid");
    let json = serde_json::to_value(&program).expect("serializable");

    assert_eq!(
        json["declarations"][0]["Print"]["Literal"]["value"]["Number"],
        serde_json::json!(1.0)
    );
}
