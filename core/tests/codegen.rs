use cscript_core::ir::{IROp, IrFunction, IrModule, Register, Terminator, Value};
use cscript_core::{CScriptErrorExt, CompileOptions, compile_source};

fn compile(src: &str) -> IrModule {
    match compile_source(src, &CompileOptions::default()) {
        Ok(compilation) => compilation.module,
        Err(err) => panic!("compilation failed: {}", err.message()),
    }
}

fn function<'m>(module: &'m IrModule, name: &str) -> &'m IrFunction {
    module
        .find_function(name)
        .unwrap_or_else(|| panic!("no function '{}' in module", name))
}

fn callees(f: &IrFunction) -> Vec<String> {
    f.ops()
        .filter_map(|op| match op {
            IROp::Call { callee, .. } => Some(callee.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn loose_statements_become_main_in_order() {
    let module = compile(
        r#"
def add(int a, int b) -> int { return a + b; }
int x = add(1, 2);
print(x);
print("done");
"#,
    );

    assert_eq!(module.functions.len(), 2);
    let main = function(&module, "main");
    assert_eq!(main.ret.to_string(), "i32");
    assert!(main.params.is_empty());
    assert_eq!(
        callees(main),
        vec!["add", "cscript_print_int", "cscript_print_string"]
    );

    let last = main.blocks.last().unwrap();
    assert_eq!(last.terminator.as_ref().unwrap().to_string(), "ret i32 0");

    let text = module.to_string();
    assert!(text.contains("define i32 @add(i32 %arg0, i32 %arg1) {"));
    assert!(text.contains("define i32 @main() {"));
}

#[test]
fn no_loose_statements_means_no_main() {
    let module = compile("def f() -> void { print(1); }");
    assert!(module.find_function("main").is_none());
    assert!(module.find_function("f").is_some());
}

#[test]
fn print_externs_are_always_declared() {
    let text = compile("int x = 1;").to_string();
    assert!(text.contains("declare void @cscript_print_int(i32)"));
    assert!(text.contains("declare void @cscript_print_float(float)"));
    assert!(text.contains("declare void @cscript_print_string(ptr)"));
}

#[test]
fn arithmetic_then_print() {
    let module = compile("int x = 2 + 3; print(x);");
    let text = module.to_string();
    assert!(text.contains("= add i32 2, 3"));
    assert!(text.contains("call void @cscript_print_int(i32 %t"));

    let main = function(&module, "main");
    let entry = main.entry().unwrap();
    assert!(matches!(entry.ops[0], IROp::Alloca { .. }));
}

#[test]
fn identical_string_literals_share_one_global() {
    let module = compile(r#"print("hi"); print("hi"); print("yo");"#);
    assert_eq!(module.strings.len(), 2);

    let text = module.to_string();
    assert!(text.contains(r#"@.str.0 = private unnamed_addr constant [3 x i8] c"hi\00""#));
    assert!(text.contains(r#"@.str.1 = private unnamed_addr constant [3 x i8] c"yo\00""#));
    assert_eq!(text.matches("getelementptr [3 x i8], ptr @.str.0, i32 0, i32 0").count(), 2);
}

#[test]
fn string_escapes_are_encoded_as_bytes() {
    let text = compile(r#"print("a\tb\n");"#).to_string();
    assert!(text.contains(r#"[5 x i8] c"a\09b\0A\00""#));
}

#[test]
fn every_if_block_has_exactly_one_terminator() {
    let module = compile(
        r#"
int x = 1;
if (x < 2) {
    print(1);
    return 0;
} else {
    print(2);
}
print(3);
"#,
    );

    let main = function(&module, "main");
    for block in &main.blocks {
        assert!(block.terminator.is_some(), "block '{}' is open", block.label);
    }
    let then_block = main.blocks.iter().find(|b| b.label.starts_with("then")).unwrap();
    assert!(matches!(then_block.terminator, Some(Terminator::Ret { .. })));

    let else_block = main.blocks.iter().find(|b| b.label.starts_with("else")).unwrap();
    match &else_block.terminator {
        Some(Terminator::Br { target }) => assert!(target.starts_with("ifcont")),
        other => panic!("else block ends with {:?}", other),
    }
}

#[test]
fn return_in_both_arms_leaves_merge_block_terminated() {
    let module = compile(
        r#"
def sign(int v) -> int {
    if (v < 0) { return 0 - 1; } else { return 1; }
}
"#,
    );
    let sign = function(&module, "sign");
    assert!(sign.blocks.iter().all(|b| b.terminator.is_some()));
    let merge = sign.blocks.iter().find(|b| b.label.starts_with("ifcont")).unwrap();
    assert_eq!(merge.terminator.as_ref().unwrap().to_string(), "ret i32 0");
}

#[test]
fn else_if_chains_nest() {
    let module = compile(
        r#"
int x = 5;
if (x == 1) { print(1); } else if (x == 2) { print(2); } else { print(3); }
"#,
    );
    let main = function(&module, "main");
    assert_eq!(main.blocks.iter().filter(|b| b.label.starts_with("then")).count(), 2);
    assert_eq!(callees(main).len(), 3);
}

#[test]
fn while_loop_blocks() {
    let module = compile(
        r#"
int i = 0;
while (i < 3) { i = i + 1; }
"#,
    );
    let main = function(&module, "main");
    let labels: Vec<&str> = main.blocks.iter().map(|b| b.label.as_str()).collect();
    assert!(labels[1].starts_with("whilecond"));
    assert!(labels[2].starts_with("whilebody"));
    assert!(labels[3].starts_with("whileend"));
    match &main.blocks[2].terminator {
        Some(Terminator::Br { target }) => assert_eq!(target, labels[1]),
        other => panic!("loop body ends with {:?}", other),
    }
}

#[test]
fn for_loop_checks_condition_first() {
    let module = compile("for (int i = 0; i < 3; i = i + 1) { print(i); }");
    let main = function(&module, "main");
    let labels: Vec<&str> = main.blocks.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels.len(), 4);
    assert!(labels[1].starts_with("forcond"));
    assert!(labels[2].starts_with("forbody"));
    assert!(labels[3].starts_with("forend"));

    match &main.blocks[0].terminator {
        Some(Terminator::Br { target }) => assert_eq!(target, labels[1]),
        other => panic!("entry ends with {:?}", other),
    }
    assert!(matches!(main.blocks[1].terminator, Some(Terminator::CondBr { .. })));
    let body_ops: Vec<String> = main.blocks[2].ops.iter().map(|op| op.to_string()).collect();
    assert!(body_ops.iter().any(|op| op.contains("cscript_print_int")));
    assert!(body_ops.iter().any(|op| op.contains("= add i32")));
}

#[test]
fn arrays_use_element_geps() {
    let module = compile(
        r#"
int a[4];
a[1] = 5;
char s[8];
s[1] = 7;
print(a[1]);
"#,
    );
    let text = module.to_string();
    assert!(text.contains("alloca [4 x i32]"));
    assert!(text.contains("alloca [8 x i8]"));
    assert!(text.contains("getelementptr [4 x i32], ptr %t"));
    assert!(text.contains(", i32 0, i32 1"));
    assert!(text.contains("store i8 7, ptr %t"));
    assert!(text.contains("store i32 5, ptr %t"));
}

#[test]
fn address_of_deref_is_the_pointer_itself() {
    let module = compile(
        r#"
int x = 1;
int* p = &x;
int* q = &*p;
"#,
    );
    let main = function(&module, "main");
    let loads = main.ops().filter(|op| matches!(op, IROp::Load { .. })).count();
    let stores = main.ops().filter(|op| matches!(op, IROp::Store { .. })).count();
    // one load of p; stores into x, p and q
    assert_eq!(loads, 1);
    assert_eq!(stores, 3);
}

#[test]
fn pointer_store_and_deref() {
    let module = compile(
        r#"
int x = 1;
int* p = &x;
*p = 4;
print(*p);
"#,
    );
    let text = module.to_string();
    assert!(text.contains("store i32 4, ptr %t"));
    assert!(text.contains("load ptr, ptr %t"));
}

#[test]
fn pointer_to_integer_uses_the_slot_width() {
    let text = compile(
        r#"
int x = 1;
int* p = &x;
char c = p;
int n = p;
"#,
    )
    .to_string();
    assert!(text.contains("ptrtoint ptr %t"));
    assert!(text.contains(" to i8"));
    assert!(text.contains(" to i32"));
}

#[test]
fn char_operands_widen_before_arithmetic() {
    let text = compile("char c = 65; int n = c + 1;").to_string();
    assert!(text.contains("store i8 65, ptr %t"));
    assert!(text.contains("= sext i8 %t"));
}

#[test]
fn float_arithmetic() {
    let text = compile("float f = 1.5; float g = f * 2.0; print(g);").to_string();
    assert!(text.contains("store float 0x3FF8000000000000, ptr %t"));
    assert!(text.contains("= fmul float %t"));
    assert!(text.contains("call void @cscript_print_float(float %t"));
}

#[test]
fn comparisons_widen_to_i32() {
    let text = compile("int a = 1; int b = a < 2;").to_string();
    assert!(text.contains("= icmp slt i32 %t"));
    assert!(text.contains("= zext i1 %t"));
}

#[test]
fn recursion_resolves_to_the_function_itself() {
    let module = compile(
        r#"
def fact(int n) -> int {
    if (n < 2) { return 1; }
    return n * fact(n - 1);
}
print(fact(5));
"#,
    );
    let fact = function(&module, "fact");
    assert_eq!(callees(fact), vec!["fact"]);
}

#[test]
fn missing_return_gets_a_default() {
    let module = compile("def f() -> int { print(1); } def g() -> void { print(2); }");
    let f = function(&module, "f");
    let g = function(&module, "g");
    assert_eq!(f.blocks.last().unwrap().terminator.as_ref().unwrap().to_string(), "ret i32 0");
    assert_eq!(g.blocks.last().unwrap().terminator.as_ref().unwrap().to_string(), "ret void");
}

#[test]
fn statements_after_return_land_in_a_dead_block() {
    let module = compile("def f() -> int { return 1; print(2); }");
    let f = function(&module, "f");
    assert_eq!(f.blocks.len(), 2);
    assert!(f.blocks[1].label.starts_with("dead"));
    assert!(f.blocks.iter().all(|b| b.terminator.is_some()));
}

#[test]
fn imports_declare_runtime_functions() {
    let module = compile(
        r#"
import file;
import file;
int fd = fopen("out.txt", "w");
fwrite(fd, "hello");
fclose(fd);
"#,
    );
    assert_eq!(
        module.externals.iter().filter(|e| e.name == "cscript_fopen").count(),
        1
    );
    let main = function(&module, "main");
    assert_eq!(
        callees(main),
        vec!["cscript_fopen", "cscript_fwrite", "cscript_fclose"]
    );
}

#[test]
fn module_header_uses_options() {
    let mut options = CompileOptions::default();
    options.module_name = "demo".to_string();
    options.target_triple = Some("x86_64-pc-linux-gnu".to_string());
    let text = compile_source("print(1);", &options).unwrap().ir_text();
    assert!(text.starts_with("; ModuleID = 'demo'\nsource_filename = \"demo\"\n"));
    assert!(text.contains("target triple = \"x86_64-pc-linux-gnu\""));
}

#[test]
fn custom_entry_point_name() {
    let options = CompileOptions::default().with_entry_point("script_main");
    let module = compile_source("print(1);", &options).unwrap().module;
    assert!(module.find_function("script_main").is_some());
    assert!(module.find_function("main").is_none());
}

#[test]
fn module_exports_json() {
    let module = compile("print(\"x\");");
    let json: serde_json::Value = serde_json::from_str(&module.to_json().unwrap()).unwrap();
    assert_eq!(json["functions"][0]["name"], "main");
    assert_eq!(json["strings"][0]["text"], serde_json::json!([120]));
}

fn alloca_regs(f: &IrFunction) -> Vec<Register> {
    f.ops()
        .filter_map(|op| match op {
            IROp::Alloca { dest, .. } => Some(*dest),
            _ => None,
        })
        .collect()
}

fn stores_into(f: &IrFunction, slot: Register) -> Vec<&Value> {
    f.ops()
        .filter_map(|op| match op {
            IROp::Store { value, ptr: Value::Reg { id, .. } } if *id == slot => Some(value),
            _ => None,
        })
        .collect()
}

#[test]
fn hex_and_octal_escapes_are_raw_bytes() {
    let module = compile(r#"print("\xff"); print("\101\x80");"#);
    assert_eq!(module.strings[0].text, vec![0xFF]);
    assert_eq!(module.strings[1].text, vec![0x41, 0x80]);

    let text = module.to_string();
    assert!(text.contains(r#"@.str.0 = private unnamed_addr constant [2 x i8] c"\FF\00""#));
    assert!(text.contains(r#"@.str.1 = private unnamed_addr constant [3 x i8] c"A\80\00""#));
}

#[test]
fn redeclaration_in_a_block_replaces_the_slot() {
    let module = compile(
        r#"
int x = 1;
if (x) { int x = 2; }
print(x);
"#,
    );
    let main = function(&module, "main");
    let slots = alloca_regs(main);
    assert_eq!(slots.len(), 2);
    assert_eq!(stores_into(main, slots[1]), vec![&Value::int(cscript_core::ir::IrType::I32, 2)]);

    // print reads the slot declared inside the block
    let last_load = main
        .ops()
        .filter_map(|op| match op {
            IROp::Load { ptr: Value::Reg { id, .. }, .. } => Some(*id),
            _ => None,
        })
        .last();
    assert_eq!(last_load, Some(slots[1]));
}

#[test]
fn parameters_get_their_own_mutable_slot() {
    let module = compile("def inc(int n) -> int { n = n + 1; return n; }");
    let inc = function(&module, "inc");
    let slots = alloca_regs(inc);
    assert_eq!(slots.len(), 1);

    let stores = stores_into(inc, slots[0]);
    assert_eq!(stores.len(), 2);
    assert!(matches!(stores[0], Value::Arg { index: 0, .. }));
    assert!(matches!(stores[1], Value::Reg { .. }));
    assert!(inc.to_string().contains("store i32 %arg0, ptr %t"));
}

#[test]
fn assignment_target_is_lowered_before_the_value() {
    let module = compile(
        r#"
def f(int v) -> int { return v; }
def g(int v) -> int { return v; }
int a[4];
a[f(1)] = g(2);
"#,
    );
    assert_eq!(callees(function(&module, "main")), vec!["f", "g"]);
}

#[test]
fn pointers_of_one_type_compare_for_equality() {
    let text = compile(
        r#"
int x = 1;
int* p = &x;
int* q = &x;
print(p == q);
print(p != q);
"#,
    )
    .to_string();
    assert!(text.contains("= icmp eq ptr %t"));
    assert!(text.contains("= icmp ne ptr %t"));
}
