use cscript_core::{CScriptErrorExt, CompileOptions, Level, compile_source, generate_error_report};

fn compile_err(src: &str) -> String {
    match compile_source(src, &CompileOptions::default()) {
        Ok(_) => panic!("expected compilation of {:?} to fail", src),
        Err(err) => err.message(),
    }
}

#[test]
fn gated_function_without_import() {
    let msg = compile_err(r#"int fd = fopen("a", "r");"#);
    assert!(msg.starts_with("missing import:"), "{}", msg);
    assert!(msg.contains("'fopen' requires 'import file'"));
    assert!(msg.ends_with("on line 1"));
}

#[test]
fn os_functions_need_their_own_import() {
    let msg = compile_err("import file;\nsystem(\"ls\");");
    assert!(msg.contains("'system' requires 'import os'"), "{}", msg);
}

#[test]
fn undefined_function_is_named() {
    let msg = compile_err("foo(1);");
    assert!(msg.contains("undefined function 'foo'"), "{}", msg);
}

#[test]
fn undefined_variable_is_named() {
    let msg = compile_err("print(y);");
    assert!(msg.contains("undefined variable 'y'"), "{}", msg);
}

#[test]
fn initializer_cannot_see_its_own_name() {
    let msg = compile_err("int x = x + 1;");
    assert!(msg.contains("undefined variable 'x'"), "{}", msg);
}

#[test]
fn unknown_import_lists_available_modules() {
    let msg = compile_err("import net;");
    assert!(msg.contains("unknown module 'net'"), "{}", msg);
    assert!(msg.contains("file, os"));
}

#[test]
fn duplicate_function() {
    let msg = compile_err("def f() -> void { } def f() -> void { }");
    assert!(msg.contains("function 'f' is already defined"), "{}", msg);
}

#[test]
fn runtime_names_cannot_be_redefined() {
    let msg = compile_err("def cscript_print_int(int v) -> void { }");
    assert!(msg.starts_with("duplicate function"), "{}", msg);
}

#[test]
fn void_call_used_as_value() {
    let msg = compile_err("def f() -> void { } int x = f();");
    assert!(msg.starts_with("void value"), "{}", msg);
}

#[test]
fn arity_is_checked() {
    let msg = compile_err("def f(int a) -> int { return a; } f(1, 2);");
    assert!(msg.contains("'f' takes 1 argument(s) but 2 were given"), "{}", msg);

    let msg = compile_err("print(1, 2);");
    assert!(msg.starts_with("arity mismatch"), "{}", msg);
}

#[test]
fn address_of_element_is_rejected() {
    let msg = compile_err("int a[2]; int* p = &a[0];");
    assert!(msg.starts_with("invalid address-of"), "{}", msg);
}

#[test]
fn whole_array_is_not_assignable() {
    let msg = compile_err("int a[2]; a = 1;");
    assert!(msg.contains("cannot assign to array 'a'"), "{}", msg);
}

#[test]
fn literal_is_not_assignable() {
    let msg = compile_err("int x = 1;\n1 = x;");
    assert!(msg.starts_with("invalid assignment target"), "{}", msg);
}

#[test]
fn mixed_int_float_is_a_type_mismatch() {
    let msg = compile_err("float f = 1.5; int x = 1; print(f + x);");
    assert!(msg.starts_with("type mismatch"), "{}", msg);
}

#[test]
fn void_variables_are_rejected() {
    let msg = compile_err("void v = 1;");
    assert!(msg.contains("variable 'v' cannot have type void"), "{}", msg);
}

#[test]
fn return_shape_is_checked() {
    let msg = compile_err("def f() -> void { return 1; }");
    assert!(msg.contains("void function 'f' cannot return a value"), "{}", msg);
    let msg = compile_err("def g() -> int { return; }");
    assert!(msg.contains("function 'g' must return a value of type i32"), "{}", msg);
}

#[test]
fn entry_point_collision_is_skipped_by_default() {
    let module = compile_source(
        "def main() -> int { return 7; }\nprint(1);",
        &CompileOptions::default(),
    )
    .unwrap()
    .module;
    assert_eq!(module.functions.len(), 1);
    let main = module.find_function("main").unwrap();
    assert_eq!(main.blocks[0].terminator.as_ref().unwrap().to_string(), "ret i32 7");
}

#[test]
fn entry_point_collision_in_strict_mode() {
    let err = compile_source(
        "def main() -> int { return 7; }\nprint(1);",
        &CompileOptions::default().strict(),
    )
    .unwrap_err();
    assert_eq!(err.level(), Level::Error);
    assert!(err.message().starts_with("entry point conflict"), "{}", err.message());
    assert_eq!(err.location().unwrap().line, 2);
}

#[test]
fn syntax_error_names_the_token() {
    let msg = compile_err("int x = 1\nprint(x);");
    assert_eq!(msg, "Syntax error: unexpected token 'print' on line 2");
}

#[test]
fn syntax_error_at_end_of_input() {
    let msg = compile_err("int x = 1 +");
    assert_eq!(msg, "Syntax error: unexpected end of input on line 1");
}

#[test]
fn empty_script_is_an_error() {
    let msg = compile_err("  // nothing here\n");
    assert_eq!(msg, "The provided script contains no statements.");
}

#[test]
fn illegal_characters_are_reported_and_skipped() {
    let compilation = compile_source("int x = 1;\nint $y = 2;\nprint(y);", &CompileOptions::default())
        .unwrap();
    assert_eq!(compilation.reports.len(), 1);
    let report = &compilation.reports.reports()[0];
    assert_eq!(report.message, "Illegal character '$'");
    assert_eq!(report.level, Level::Error);
    let loc = report.location.as_ref().unwrap();
    assert_eq!((loc.line, loc.column), (2, 5));
    assert!(compilation.module.find_function("main").is_some());
}

#[test]
fn error_report_line_format() {
    let err = compile_source("foo();", &CompileOptions::default()).unwrap_err();
    let line = generate_error_report(err.as_ref());
    assert_eq!(
        line,
        "CSCRIPT | ERROR | <source>:1:1 | undefined function: undefined function 'foo' on line 1"
    );
}

#[test]
fn entry_statements_are_invisible_to_functions() {
    let msg = compile_err("int g = 3;\ndef f() -> int { return g; }");
    assert!(msg.starts_with("undefined symbol"), "{}", msg);
    assert!(msg.contains("undefined variable 'g'"), "{}", msg);
}

#[test]
fn function_locals_are_invisible_to_the_entry_point() {
    let msg = compile_err("def f() -> int { int t = 1; return t; }\nprint(t);");
    assert!(msg.contains("undefined variable 't' on line 2"), "{}", msg);
}

#[test]
fn pointers_only_compare_for_equality() {
    let msg = compile_err("int x = 1; int* p = &x; print(p < p);");
    assert!(msg.contains("operator '<' cannot combine i32* and i32*"), "{}", msg);

    let msg = compile_err("int x = 1; char c = 2; int* p = &x; char* q = &c; print(p == q);");
    assert!(msg.starts_with("type mismatch"), "{}", msg);
}
