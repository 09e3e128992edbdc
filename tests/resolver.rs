use pretty_assertions::assert_eq;

use quill::ast::Program;
use quill::error::LoxError;
use quill::parser::Parser;
use quill::resolver::Resolver;
use quill::scanner::Scanner;

fn parse(source: &str) -> Program {
    Parser::new(Scanner::new(source))
        .parse()
        .expect("program should parse")
}

fn diagnostics(source: &str) -> Vec<String> {
    Resolver::new()
        .check(&parse(source))
        .iter()
        .map(|d| d.to_string())
        .collect()
}

#[test]
fn test_clean_program_has_no_diagnostics() {
    let source = r#"
        fn makeCounter() {
            let i = 0;
            fn count() {
                i = i + 1;
                return i;
            }
            return count;
        }

        class Point {
            fn init(x, y) {
                this.x = x;
                this.y = y;
            }
            fn sum() { return this.x + this.y; }
        }

        let c = makeCounter();
        let p = Point(1, 2);
        let a = 1;
        { let a = 2; print a; }
        while (a < 3) a = a + 1;
        print c() + p.sum();
    "#;

    assert_eq!(diagnostics(source), Vec::<String>::new());
}

#[test]
fn test_undefined_read_and_assignment() {
    assert_eq!(
        diagnostics("print y;\nz = 1;"),
        [
            "[line 1] Error: Undefined variable 'y'.",
            "[line 2] Error: Undefined variable 'z'.",
        ]
    );
}

#[test]
fn test_variable_not_visible_outside_its_block() {
    assert_eq!(
        diagnostics("{ let inner = 1; }\nprint inner;"),
        ["[line 2] Error: Undefined variable 'inner'."]
    );
}

#[test]
fn test_initializer_cannot_see_the_variable_it_defines() {
    assert_eq!(
        diagnostics("let x = x;"),
        ["[line 1] Error: Undefined variable 'x'."]
    );
    assert_eq!(diagnostics("let x = 1; { let x = x + 1; }"), Vec::<String>::new());
}

#[test]
fn test_names_resolve_in_textual_order() {
    assert_eq!(
        diagnostics("fn f() { return g(); }\nfn g() { return 1; }"),
        ["[line 1] Error: Undefined variable 'g'."]
    );
}

#[test]
fn test_recursive_function_sees_its_own_name() {
    assert_eq!(
        diagnostics("fn f(n) { if (n < 1) return 0; return f(n - 1); }"),
        Vec::<String>::new()
    );
}

#[test]
fn test_assignment_to_constants() {
    assert_eq!(
        diagnostics("fn f() {}\nf = 1;\nclass K {}\nK = 2;"),
        [
            "[line 2] Error: Cannot assign to constant 'f'.",
            "[line 4] Error: Cannot assign to constant 'K'.",
        ]
    );
}

#[test]
fn test_duplicate_definitions_in_one_scope() {
    assert_eq!(
        diagnostics("let a = 1;\nlet a = 2;"),
        ["[line 2] Error: Variable 'a' is already defined in this scope."]
    );
    assert_eq!(
        diagnostics("fn f(a, a) {}"),
        ["[line 1] Error: Parameter 'a' is already defined in this scope."]
    );
    assert_eq!(
        diagnostics("fn f(a) { let a = 1; }"),
        ["[line 1] Error: Variable 'a' is already defined in this scope."]
    );
    assert_eq!(
        diagnostics("fn g() {}\nclass g {}"),
        ["[line 2] Error: Class 'g' is already defined in this scope."]
    );
    assert_eq!(
        diagnostics("class C { fn m() {} fn m() {} }"),
        ["[line 1] Error: Function 'm' is already defined in this scope."]
    );
}

#[test]
fn test_shadowing_in_nested_scope_is_allowed() {
    assert_eq!(
        diagnostics("let a = 1; { let a = 2; { let a = 3; } }"),
        Vec::<String>::new()
    );
}

#[test]
fn test_top_level_return() {
    assert_eq!(
        diagnostics("print 1;\nreturn 2;"),
        ["[line 2] Error: Cannot return from top-level code."]
    );
    assert_eq!(
        diagnostics("{ return; }"),
        ["[line 1] Error: Cannot return from top-level code."]
    );
}

#[test]
fn test_this_outside_class() {
    assert_eq!(
        diagnostics("print this;\nfn f() { return this; }"),
        [
            "[line 1] Error: Cannot use 'this' outside of a class.",
            "[line 2] Error: Cannot use 'this' outside of a class.",
        ]
    );
    assert_eq!(
        diagnostics("class C { fn m() { return this; } }"),
        Vec::<String>::new()
    );
}

#[test]
fn test_checker_reports_everything_without_stopping() {
    let issues = Resolver::new().check(&parse("print a;\nprint b;\nreturn;\nprint this;"));

    assert_eq!(issues.len(), 4);
    assert!(issues
        .iter()
        .all(|issue| matches!(issue, LoxError::Scope { .. })));

    let lines: Vec<Option<usize>> = issues.iter().map(|issue| issue.line()).collect();
    assert_eq!(lines, [Some(1), Some(2), Some(3), Some(4)]);
}

#[test]
fn test_checker_leaves_the_tree_untouched() {
    let program = parse("let x = 1; print x; print y;");
    let before = program.clone();

    let _ = Resolver::new().check(&program);

    assert_eq!(program, before);
}

#[test]
fn test_bare_method_name_inside_class_is_not_flagged() {
    // Accepted here, though running it fails with an undefined variable.
    assert_eq!(
        diagnostics("class C { fn a() { return 1; } fn b() { return a(); } }"),
        Vec::<String>::new()
    );
}
