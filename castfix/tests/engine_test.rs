//! End-to-end tests for rewriting single translation units.

#![allow(clippy::unwrap_used)]

use castfix::classify::CastKind;
use castfix::engine::{rewrite_source, FileRewrite, RewriteOptions};
use castfix::plan::SkipReason;

fn run(source: &str) -> FileRewrite {
    rewrite_source(source, &RewriteOptions::default()).unwrap()
}

fn rewrite(source: &str) -> String {
    run(source).output
}

#[test]
fn test_numeric_conversion_becomes_static_cast() {
    assert_eq!(
        rewrite("int to_int(double x) { return (int)x; }\n"),
        "int to_int(double x) { return static_cast<int>(x); }\n"
    );
}

#[test]
fn test_adding_const_is_static_cast() {
    assert_eq!(
        rewrite("const char *view(char *p) { return (const char*)p; }\n"),
        "const char *view(char *p) { return static_cast<const char*>(p); }\n"
    );
}

#[test]
fn test_removing_const_is_const_cast() {
    assert_eq!(
        rewrite("char *mutate(const char *cp) { return (char*)cp; }\n"),
        "char *mutate(const char *cp) { return const_cast<char*>(cp); }\n"
    );
}

#[test]
fn test_parenthesized_operand_is_not_wrapped_twice() {
    assert_eq!(
        rewrite("long sum(int a, int b) { return (long)(a + b); }\n"),
        "long sum(int a, int b) { return static_cast<long>(a + b); }\n"
    );
}

#[test]
fn test_void_cast_is_left_alone() {
    let source = "void f(int unused) { (void)unused; }\n";
    let result = run(source);
    assert_eq!(result.output, source);
    assert!(!result.is_changed());
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].reason, SkipReason::DiscardedValue);
}

#[test]
fn test_destination_spelling_is_verbatim() {
    assert_eq!(
        rewrite("void f(double d) { unsigned   long n = ( unsigned   long )d; }\n"),
        "void f(double d) { unsigned   long n = static_cast< unsigned   long >(d); }\n"
    );
}

#[test]
fn test_const_removal_two_levels_deep() {
    assert_eq!(
        rewrite("void f(const char **pp) { char **q = (char **)pp; }\n"),
        "void f(const char **pp) { char **q = const_cast<char **>(pp); }\n"
    );
}

#[test]
fn test_shape_mismatch_is_static_cast() {
    let result = run("void f(char * const *pp) { char *p = (char *)pp; }\n");
    assert_eq!(result.count(CastKind::General), 1);
    assert_eq!(result.count(CastKind::Qualification), 0);
}

#[test]
fn test_reference_cast_removing_const() {
    assert_eq!(
        rewrite("struct W {};\nvoid f(const W &w) { W &m = (W &)w; }\n"),
        "struct W {};\nvoid f(const W &w) { W &m = const_cast<W &>(w); }\n"
    );
}

#[test]
fn test_typedef_is_looked_through() {
    assert_eq!(
        rewrite("typedef const char *cstr;\nchar *f(cstr s) { return (char *)s; }\n"),
        "typedef const char *cstr;\nchar *f(cstr s) { return const_cast<char *>(s); }\n"
    );
}

#[test]
fn test_using_alias_is_looked_through() {
    let result = run("using Text = const char *;\nchar *f(Text t) { return (char *)t; }\n");
    assert_eq!(result.count(CastKind::Qualification), 1);
}

#[test]
fn test_cast_to_typedef_before_dereference() {
    assert_eq!(
        rewrite("typedef int MyInt;\nMyInt get(int *p) { return (MyInt)*p; }\n"),
        "typedef int MyInt;\nMyInt get(int *p) { return static_cast<MyInt>(*p); }\n"
    );
}

#[test]
fn test_cast_to_typedef_before_negation() {
    assert_eq!(
        rewrite("typedef long Offset;\nOffset back(int n) { return (Offset)-n + 1; }\n"),
        "typedef long Offset;\nOffset back(int n) { return static_cast<Offset>(-n) + 1; }\n"
    );
}

#[test]
fn test_cast_to_record_with_parenthesized_operand() {
    assert_eq!(
        rewrite("struct Foo { Foo(int) {} };\nvoid f(int x) { Foo y = (Foo)(x); }\n"),
        "struct Foo { Foo(int) {} };\nvoid f(int x) { Foo y = static_cast<Foo>(x); }\n"
    );
}

#[test]
fn test_pointer_typedef_removing_const_with_parenthesized_operand() {
    let result = run("typedef char *str;\nstr f(const char *cp) { return (str)(cp); }\n");
    assert_eq!(
        result.output,
        "typedef char *str;\nstr f(const char *cp) { return const_cast<str>(cp); }\n"
    );
    assert_eq!(result.count(CastKind::Qualification), 1);
}

#[test]
fn test_parenthesized_variables_are_not_casts() {
    let source = "int f(int a, int *b) { return (a)*b[0] + (a)-1; }\n";
    let result = run(source);
    assert!(!result.is_changed());
    assert_eq!(result.output, source);
}

#[test]
fn test_nested_casts() {
    assert_eq!(
        rewrite("int f(double d) { return (int)(char)d; }\n"),
        "int f(double d) { return static_cast<int>(static_cast<char>(d)); }\n"
    );
}

#[test]
fn test_multiple_casts_on_one_line() {
    let result = run("void f(const int *cp, double d) { int *p = (int *)cp; int i = (int)d; }\n");
    assert_eq!(
        result.output,
        "void f(const int *cp, double d) { int *p = const_cast<int *>(cp); int i = static_cast<int>(d); }\n"
    );
    assert_eq!(result.rewrites.len(), 2);
    assert_eq!(result.rewrites[0].kind, CastKind::Qualification);
    assert_eq!(result.rewrites[1].kind, CastKind::General);
}

#[test]
fn test_unknown_operand_is_static_cast() {
    assert_eq!(
        rewrite("int f() { return (int)external_value; }\n"),
        "int f() { return static_cast<int>(external_value); }\n"
    );
}

#[test]
fn test_macro_argument_is_skipped() {
    let source = "#define LOG(x) x\nvoid f(double d) { LOG((int)d); }\n";
    let result = run(source);
    assert_eq!(result.output, source);
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].reason, SkipReason::MacroExpansion);
}

#[test]
fn test_macro_argument_rewritten_when_allowed() {
    let source = "#define LOG(x) x\nvoid f(double d) { LOG((int)d); }\n";
    let options = RewriteOptions {
        skip_macro_arguments: false,
        ..RewriteOptions::default()
    };
    let result = rewrite_source(source, &options).unwrap();
    assert_eq!(
        result.output,
        "#define LOG(x) x\nvoid f(double d) { LOG(static_cast<int>(d)); }\n"
    );
}

#[test]
fn test_rewriting_is_idempotent() {
    let once = rewrite("char *f(const char *cp, double d) { (void)d; return (char *)cp; }\n");
    let twice = run(&once);
    assert!(!twice.is_changed());
    assert_eq!(twice.output, once);
}

#[test]
fn test_rewrite_reports_lines_and_types() {
    let source = "void f(const char *cp) {\n  char *p = (char *)cp;\n}\n";
    let result = run(source);
    let rewrite = &result.rewrites[0];
    assert_eq!(rewrite.line, 2);
    assert_eq!(rewrite.original, "(char *)");
    assert_eq!(rewrite.replacement, "const_cast<char *>(");
    assert!(rewrite.wraps_operand);
    assert_eq!(rewrite.source_type.to_string(), "const char *");
    assert_eq!(rewrite.dest_type.to_string(), "char *");
}

#[test]
fn test_file_without_casts_is_unchanged() {
    let source = "int main() { int x = static_cast<int>(1.5); return x; }\n";
    let result = run(source);
    assert!(!result.is_changed());
    assert_eq!(result.output, source);
}
