use compiler::prelude::*;
use compiler::{Assets, Ast, Compiler, CompilerError, Initializer};
use resolve::{CallableKind, ResolveError, Symbol, SymbolTable};

// ============================================================================
// Helpers
// ============================================================================

/// Index of `needle` in `haystack`, panicking with context when absent.
fn at(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("`{needle}` not found in:\n{haystack}"))
}

fn assert_in_order(text: &str, lines: &[&str]) {
    let mut from = 0;
    for line in lines {
        let found = text[from..]
            .find(line)
            .unwrap_or_else(|| panic!("`{line}` missing (or out of order) in:\n{text}"));
        from += found + line.len();
    }
}

// ============================================================================
// End-to-end examples
// ============================================================================

#[test]
fn scalar_assignment_in_outermost_scope() {
    // x := 2 + 3;
    let mut symbols = SymbolTable::new();
    symbols
        .add_region(0, None, 0)
        .push(Symbol::variable("x", 4, "integer"));

    let mut ast = Ast::new();
    let x = ast.path(&["x"]);
    let two = ast.leaf("2");
    let three = ast.leaf("3");
    let sum = ast.push("+", &[two, three]);
    let assign = ast.push(":=", &[x, sum]);

    let mut compiler = Compiler::new(&ast, &symbols);
    let main = compiler.enter_scope(CallableKind::Procedure, "main", 0).unwrap();
    compiler.declare_variables().unwrap();
    compiler.compile_assignment(assign).unwrap();
    compiler.close_scope(main).unwrap();

    let text = &compiler.completed_blocks()[0];
    assert_in_order(
        text,
        &[
            "\tmov\tr0, #2\n",
            "\tmov\tr1, #3\n",
            "\tadd\tr0, r0, r1\n",
            "\tsub\tr1, r12, #8 ; x\n",
            "\tstr\tr0, [r1]\n",
        ],
    );
    assert_eq!(text.matches("\tadd\t").count(), 1);
    assert!(!text.contains("static link"));
}

#[test]
fn record_assignment_copies_every_word() {
    // p := q; with Point = record x, y: integer end record;
    let mut symbols = SymbolTable::new();
    symbols
        .add_region(0, None, 0)
        .push(Symbol::record("Point", &[("x", "integer"), ("y", "integer")]))
        .push(Symbol::variable("p", 8, "Point"))
        .push(Symbol::variable("q", 16, "Point"));
    symbols.set_type_size("Point", 8);

    let mut ast = Ast::new();
    let p = ast.path(&["p"]);
    let q = ast.path(&["q"]);
    let assign = ast.push(":=", &[p, q]);

    let mut compiler = Compiler::new(&ast, &symbols);
    let main = compiler.enter_scope(CallableKind::Procedure, "main", 0).unwrap();
    compiler.declare_variables().unwrap();
    compiler.compile_assignment(assign).unwrap();
    compiler.close_scope(main).unwrap();

    let text = &compiler.completed_blocks()[0];
    assert_in_order(
        text,
        &[
            "\tsub\tr0, r12, #20 ; q\n",
            "\tsub\tr1, r12, #12 ; p\n",
            "\tldr\tr10, [r0, #0] ; Point.x\n",
            "\tstr\tr10, [r1, #0]\n",
            "\tldr\tr10, [r0, #4] ; Point.y\n",
            "\tstr\tr10, [r1, #4]\n",
        ],
    );
    assert_eq!(text.matches("\tldr\tr10, [r0").count(), 2);
    assert_eq!(text.matches("\tstr\tr10, [r1").count(), 2);
    assert!(!text.contains("\tstr\tr0, [r1]"));
}

fn two_parameter_function() -> (Ast, SymbolTable) {
    let mut symbols = SymbolTable::new();
    symbols
        .add_region(0, None, 0)
        .push(Symbol::variable("a", 4, "integer"))
        .push(Symbol::variable("b", 8, "integer"))
        .push(Symbol::variable("r", 12, "integer"))
        .push(Symbol::function("f", 1, &["integer", "integer"], "integer"));
    symbols
        .add_region(1, Some(0), 1)
        .push(Symbol::parameter("x", 4, "integer"))
        .push(Symbol::parameter("y", 8, "integer"));

    let mut ast = Ast::new();
    // 0: return x - y;
    let x = ast.path(&["x"]);
    let y = ast.path(&["y"]);
    let diff = ast.push("-", &[x, y]);
    ast.push("RETURN", &[diff]);
    (ast, symbols)
}

#[test]
fn call_pushes_and_reclaims_parameter_bytes() {
    let (mut ast, symbols) = two_parameter_function();
    let ret = compiler::NodeId(ast.len() as u32 - 1);
    let a = ast.path(&["a"]);
    let b = ast.path(&["b"]);
    let r = ast.path(&["r"]);
    let call = ast.push("CALL", &[]);
    let assign = ast.push(":=", &[r, call]);

    let mut compiler = Compiler::new(&ast, &symbols);
    let main = compiler.enter_scope(CallableKind::Procedure, "main", 0).unwrap();

    let f = compiler.enter_scope(CallableKind::Function, "f", 1).unwrap();
    compiler.declare_variables().unwrap();
    compiler.compile_return(ret).unwrap();
    compiler.close_scope(f).unwrap();

    compiler.declare_variables().unwrap();
    let site = compiler.begin_call("f").unwrap();
    compiler.stage_argument(&site, a).unwrap();
    compiler.stage_argument(&site, b).unwrap();
    compiler.finish_call(site).unwrap();
    compiler.compile_assignment(assign).unwrap();
    compiler.close_scope(main).unwrap();

    let main_text = &compiler.completed_blocks()[1];
    assert_in_order(
        main_text,
        &[
            "\tstmfd\tr13!, {r0}\n",
            "\tstmfd\tr13!, {r0}\n",
            "\tsub\tr13, r13, #4 ; result of f\n",
            "\tbl\tf0\n",
            "\tldmfd\tr13!, {r0} ; call result\n",
            "\tadd\tr13, r13, #8 ; parameters\n",
        ],
    );
}

#[test]
fn function_frame_addresses_parameters_and_result() {
    let (ast, symbols) = two_parameter_function();
    let ret = compiler::NodeId(ast.len() as u32 - 1);

    let mut compiler = Compiler::new(&ast, &symbols);
    let main = compiler.enter_scope(CallableKind::Procedure, "main", 0).unwrap();
    let f = compiler.enter_scope(CallableKind::Function, "f", 1).unwrap();
    compiler.compile_return(ret).unwrap();
    compiler.close_scope(f).unwrap();
    compiler.close_scope(main).unwrap();

    // f borrows r0 and r1: save set {r0, r1, r12, lr} is 16 bytes.
    let text = &compiler.completed_blocks()[0];
    assert_in_order(
        text,
        &[
            "f0\n",
            "\tstmfd\tr13!, {r0, r1, r12, lr}\n",
            "\tadd\tr10, r13, #20 ; parameter area\n",
            "\tldr\tr10, =main0_instance\n",
            "\tstmfd\tr13!, {r10} ; static link\n",
            "\tmov\tr12, r13\n",
            // `-` evaluates its right operand first.
            "\tldr\tr10, [r12, #8] ; parameter area\n",
            "\tadd\tr0, r10, #0 ; y\n",
            "\tadd\tr1, r10, #4 ; x\n",
            "\tsub\tr0, r1, r0\n",
            "\tstr\tr0, [r11, #32] ; result\n",
            "\tb\tendf0\n",
            "endf0\n",
            "\tmov\tr13, r11\n",
            "\tldmfd\tr13!, {r11}\n",
            "\tldmfd\tr13!, {r0, r1, r12, pc}\n",
        ],
    );
}

// ============================================================================
// Scopes
// ============================================================================

#[test]
fn instance_ids_count_per_name() {
    let mut symbols = SymbolTable::new();
    symbols.add_region(0, None, 0);
    symbols.add_region(1, Some(0), 1);
    symbols.add_region(2, Some(0), 1);
    symbols.add_region(3, Some(2), 2);
    let ast = Ast::new();

    let mut compiler = Compiler::new(&ast, &symbols);
    let main = compiler.enter_scope(CallableKind::Procedure, "main", 0).unwrap();
    let first = compiler.enter_scope(CallableKind::Procedure, "step", 1).unwrap();
    assert_eq!(first.label(), "step0");
    compiler.close_scope(first).unwrap();
    let outer = compiler.enter_scope(CallableKind::Procedure, "walk", 2).unwrap();
    let second = compiler.enter_scope(CallableKind::Procedure, "step", 3).unwrap();
    assert_eq!(second.label(), "step1");
    compiler.close_scope(second).unwrap();
    compiler.close_scope(outer).unwrap();
    compiler.close_scope(main).unwrap();

    // The inner step links to walk, not to main.
    let step1 = &compiler.completed_blocks()[1];
    assert!(step1.starts_with("step1\n"));
    assert!(step1.contains("\tldr\tr10, =walk0_instance\n"));

    // All instance words end up after the outermost block.
    let main_text = compiler.completed_blocks().last().unwrap();
    assert_in_order(
        main_text,
        &[
            "endmain0\n",
            "main0_instance\tDCD\t0xFF000004\n",
            "step0_instance\tDCD\t0xFFFFFFFF\n",
            "walk0_instance\tDCD\t0xFFFFFFFF\n",
            "step1_instance\tDCD\t0xFFFFFFFF\n",
        ],
    );
}

#[test]
fn nested_teardown_mirrors_entry() {
    let mut symbols = SymbolTable::new();
    symbols.add_region(0, None, 0);
    symbols.add_region(1, Some(0), 1);
    let ast = Ast::new();

    let mut compiler = Compiler::new(&ast, &symbols);
    let main = compiler.enter_scope(CallableKind::Procedure, "main", 0).unwrap();
    let inner = compiler.enter_scope(CallableKind::Procedure, "inner", 1).unwrap();
    compiler.close_scope(inner).unwrap();
    compiler.close_scope(main).unwrap();

    let text = &compiler.completed_blocks()[0];
    assert_in_order(
        text,
        &[
            "inner0\n",
            "\tstmfd\tr13!, {r12, lr}\n",
            "\tadd\tr10, r13, #8 ; parameter area\n",
            "\tstmfd\tr13!, {r10}\n",
            "\tstmfd\tr13!, {r10} ; previous instance\n",
            "\tstmfd\tr13!, {r10} ; static link\n",
            "\tmov\tr12, r13\n",
            "\tstmfd\tr13!, {r11}\n",
            "\tmov\tr11, r13\n",
            "endinner0\n",
            "\tmov\tr13, r11\n",
            "\tldmfd\tr13!, {r11}\n",
            "\tadd\tr13, r13, #4 ; static link\n",
            "\tldmfd\tr13!, {r10}\n",
            "\tldr\tr12, =inner0_instance\n",
            "\tstr\tr10, [r12]\n",
            "\tadd\tr13, r13, #4 ; parameter area\n",
            "\tldmfd\tr13!, {r12, pc}\n",
        ],
    );
}

#[test]
fn outer_variables_are_reached_through_static_links() {
    let mut symbols = SymbolTable::new();
    symbols
        .add_region(0, None, 0)
        .push(Symbol::variable("total", 4, "integer"));
    symbols.add_region(1, Some(0), 1);
    symbols.add_region(2, Some(1), 2);

    let mut ast = Ast::new();
    let total = ast.path(&["total"]);
    let one = ast.leaf("1");
    let assign = ast.push(":=", &[total, one]);

    let mut compiler = Compiler::new(&ast, &symbols);
    let main = compiler.enter_scope(CallableKind::Procedure, "main", 0).unwrap();
    let outer = compiler.enter_scope(CallableKind::Procedure, "outer", 1).unwrap();
    let inner = compiler.enter_scope(CallableKind::Procedure, "inner", 2).unwrap();
    compiler.compile_assignment(assign).unwrap();
    compiler.close_scope(inner).unwrap();
    compiler.close_scope(outer).unwrap();
    compiler.close_scope(main).unwrap();

    let text = &compiler.completed_blocks()[0];
    assert_in_order(
        text,
        &[
            "\tmov\tr0, #1\n",
            "\tmov\tr10, r12\n",
            "\tldr\tr10, [r10] ; static link\n",
            "\tldr\tr10, [r10] ; static link\n",
            "\tsub\tr1, r10, #8 ; total\n",
            "\tstr\tr0, [r1]\n",
        ],
    );
    assert_eq!(text.matches("; static link\n").count(), 4);
}

#[test]
fn recursive_call_branches_to_own_label() {
    let mut symbols = SymbolTable::new();
    symbols
        .add_region(0, None, 0)
        .push(Symbol::procedure("count", 1, &["integer"]));
    symbols
        .add_region(1, Some(0), 1)
        .push(Symbol::parameter("n", 4, "integer"));

    let mut ast = Ast::new();
    let n = ast.path(&["n"]);
    let one = ast.leaf("1");
    let less = ast.push("-", &[n, one]);

    let mut compiler = Compiler::new(&ast, &symbols);
    let main = compiler.enter_scope(CallableKind::Procedure, "main", 0).unwrap();
    let count = compiler.enter_scope(CallableKind::Procedure, "count", 1).unwrap();
    let site = compiler.begin_call("count").unwrap();
    compiler.stage_argument(&site, less).unwrap();
    compiler.finish_call(site).unwrap();
    compiler.close_scope(count).unwrap();
    compiler.close_scope(main).unwrap();

    let text = &compiler.completed_blocks()[0];
    assert_in_order(
        text,
        &[
            "\tmov\tr0, #1\n",
            "\tadd\tr1, r10, #0 ; n\n",
            "\tsub\tr0, r1, r0\n",
            "\tstmfd\tr13!, {r0}\n",
            "\tbl\tcount0\n",
            "\tadd\tr13, r13, #4 ; parameters\n",
        ],
    );
}

// ============================================================================
// Declarations
// ============================================================================

#[test]
fn variables_are_reserved_then_initialized_in_order() {
    let mut symbols = SymbolTable::new();
    symbols
        .add_region(0, None, 0)
        .push(Symbol::variable("a", 4, "integer"))
        .push(Symbol::variable("b", 8, "integer"))
        .push(Symbol::variable("c", 12, "boolean"));

    let mut ast = Ast::new();
    let seven = ast.leaf("7");
    let yes = ast.leaf("True");

    let mut compiler = Compiler::new(&ast, &symbols);
    let main = compiler.enter_scope(CallableKind::Procedure, "main", 0).unwrap();
    compiler.initialize("b", Initializer::Expr(seven)).unwrap();
    compiler.initialize("a", Initializer::Zero).unwrap();
    compiler.initialize("c", Initializer::Expr(yes)).unwrap();
    compiler.declare_variables().unwrap();
    compiler.close_scope(main).unwrap();

    let text = &compiler.completed_blocks()[0];
    assert_in_order(
        text,
        &[
            "\tmov\tr11, r13\n",
            "\t; a : integer\n",
            "\tsub\tr13, r13, #12\n",
            "\tmov\tr0, #7\n",
            "\tstr\tr0, [r12, #-12] ; b\n",
            "\tmov\tr10, #0\n",
            "\tstr\tr10, [r12, #-8] ; a\n",
            "\tmov\tr0, #1\n",
            "\tstr\tr0, [r12, #-16] ; c\n",
            "endmain0\n",
        ],
    );
}

#[test]
fn variables_are_declared_once() {
    let mut symbols = SymbolTable::new();
    symbols
        .add_region(0, None, 0)
        .push(Symbol::variable("a", 4, "integer"));
    let ast = Ast::new();

    let mut compiler = Compiler::new(&ast, &symbols);
    let _main = compiler.enter_scope(CallableKind::Procedure, "main", 0).unwrap();
    compiler.declare_variables().unwrap();
    assert!(matches!(
        compiler.declare_variables(),
        Err(CompilerError::VariablesAlreadyDeclared(label)) if label == "main0"
    ));
    assert!(matches!(
        compiler.initialize("a", Initializer::Zero),
        Err(CompilerError::VariablesAlreadyDeclared(_))
    ));
    assert!(matches!(
        compiler.initialize("nope", Initializer::Zero),
        Err(CompilerError::NotALocal(name)) if name == "nope"
    ));
}

#[test]
fn empty_scope_reserves_nothing() {
    let mut symbols = SymbolTable::new();
    symbols.add_region(0, None, 0);
    let ast = Ast::new();

    let mut compiler = Compiler::new(&ast, &symbols);
    let main = compiler.enter_scope(CallableKind::Procedure, "main", 0).unwrap();
    compiler.declare_variables().unwrap();
    compiler.close_scope(main).unwrap();
    assert!(!compiler.completed_blocks()[0].contains("\tsub\tr13"));
}

// ============================================================================
// Output and errors
// ============================================================================

#[test]
fn output_is_prologue_blocks_runtime_epilogue() {
    let mut symbols = SymbolTable::new();
    symbols.add_region(0, None, 0);
    symbols.add_region(1, Some(0), 1);
    let ast = Ast::new();

    let mut compiler = Compiler::new(&ast, &symbols);
    let main = compiler.enter_scope(CallableKind::Procedure, "main", 0).unwrap();
    let inner = compiler.enter_scope(CallableKind::Procedure, "inner", 1).unwrap();
    compiler.close_scope(inner).unwrap();
    compiler.close_scope(main).unwrap();

    let out = compiler
        .finish(&Assets::new("; print routines", "; entry glue"))
        .unwrap();
    let prologue = at(&out, "; print routines");
    let main_block = at(&out, "main0\n");
    let inner_block = at(&out, "inner0\n");
    let mul = at(&out, "mul\tstmfd");
    let div = at(&out, "div\tstmfd");
    let epilogue = at(&out, "; entry glue");
    assert!(prologue < main_block);
    assert!(main_block < inner_block);
    assert!(inner_block < mul && mul < div && div < epilogue);
}

#[test]
fn finish_refuses_open_scopes() {
    let mut symbols = SymbolTable::new();
    symbols.add_region(0, None, 0);
    let ast = Ast::new();

    let mut compiler = Compiler::new(&ast, &symbols);
    let _main = compiler.enter_scope(CallableKind::Procedure, "main", 0).unwrap();
    assert!(matches!(
        compiler.finish(&Assets::default()),
        Err(CompilerError::UnclosedScopes(1))
    ));
}

#[test]
fn unresolved_identifier_names_the_culprit() {
    let mut symbols = SymbolTable::new();
    symbols.add_region(0, None, 0);
    let mut ast = Ast::new();
    let ghost = ast.path(&["ghost"]);
    let one = ast.leaf("1");
    let assign = ast.push(":=", &[ghost, one]);

    let mut compiler = Compiler::new(&ast, &symbols);
    let _main = compiler.enter_scope(CallableKind::Procedure, "main", 0).unwrap();
    match compiler.compile_assignment(assign) {
        Err(CompilerError::Resolve(ResolveError::UnresolvedIdentifier(name))) => {
            assert_eq!(name, "ghost")
        }
        other => panic!("expected unresolved identifier, got {other:?}"),
    }
}

#[test]
fn close_scope_checks_the_ticket() {
    let mut symbols = SymbolTable::new();
    symbols.add_region(0, None, 0);
    symbols.add_region(1, Some(0), 1);
    let ast = Ast::new();

    let mut compiler = Compiler::new(&ast, &symbols);
    let main = compiler.enter_scope(CallableKind::Procedure, "main", 0).unwrap();
    let _inner = compiler.enter_scope(CallableKind::Procedure, "inner", 1).unwrap();
    assert!(matches!(
        compiler.close_scope(main),
        Err(CompilerError::ScopeMismatch { expected, found })
            if expected == "inner0" && found == "main0"
    ));
}

#[test]
fn nested_scope_needs_its_father_open() {
    let mut symbols = SymbolTable::new();
    symbols.add_region(0, None, 0);
    symbols.add_region(1, Some(0), 1);
    symbols.add_region(2, Some(1), 2);
    let ast = Ast::new();

    let mut compiler = Compiler::new(&ast, &symbols);
    let _main = compiler.enter_scope(CallableKind::Procedure, "main", 0).unwrap();
    assert!(matches!(
        compiler.enter_scope(CallableKind::Procedure, "inner", 2),
        Err(CompilerError::FatherNotOpen { scope, father: 1 }) if scope == "inner"
    ));
    assert!(matches!(
        compiler.enter_scope(CallableKind::Procedure, "loose", 1),
        Ok(_)
    ));
}

#[test]
fn return_is_only_legal_in_functions() {
    let mut symbols = SymbolTable::new();
    symbols.add_region(0, None, 0);
    let mut ast = Ast::new();
    let one = ast.leaf("1");
    let ret = ast.push("RETURN", &[one]);

    let mut compiler = Compiler::new(&ast, &symbols);
    let _main = compiler.enter_scope(CallableKind::Procedure, "main", 0).unwrap();
    assert!(matches!(
        compiler.compile_return(ret),
        Err(CompilerError::ReturnOutsideFunction)
    ));
}

#[test]
fn call_to_a_body_not_yet_generated_fails() {
    let mut symbols = SymbolTable::new();
    symbols
        .add_region(0, None, 0)
        .push(Symbol::procedure("later", 1, &[]));
    symbols.add_region(1, Some(0), 1);
    let ast = Ast::new();

    let mut compiler = Compiler::new(&ast, &symbols);
    let _main = compiler.enter_scope(CallableKind::Procedure, "main", 0).unwrap();
    assert!(matches!(
        compiler.begin_call("later"),
        Err(CompilerError::UnknownCallable(name)) if name == "later"
    ));
}
