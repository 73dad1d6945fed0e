//! End-to-end loop selection over TIR modules.
//!
//! Each test parses a module, runs loop analysis on one function and checks
//! which loop headers the selector hands to the mapper.

use loopsel::config::TargetConfig;
use loopsel::core::{IrAdaptor, LoopAnalysis, LoopClass, LoopSelector, Selection, SelectionEvent};
use loopsel::plan::MappingPlan;
use loopsel::test_ir::{TestIR, TestIRAdaptor};
use std::fs;
use std::path::Path;

/// Helper to load and parse a TIR file from the test data directory
fn load_tir_file(filename: &str) -> TestIR {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(filename);
    let contents = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));

    TestIR::parse(&contents).unwrap_or_else(|e| panic!("Failed to parse {filename}: {e}"))
}

/// Run selection on `func` and return the selected loop headers.
fn select_headers(ir: &TestIR, func: &str, config: &TargetConfig) -> (Vec<String>, Selection) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut adaptor = TestIRAdaptor::new(ir);
    let func_ref = adaptor
        .func_by_name(func)
        .unwrap_or_else(|| panic!("no function {func}"));
    let forest = LoopAnalysis::new().switch_func(&mut adaptor, func_ref);
    let selection = LoopSelector::new(config).select(func, &adaptor, &forest);
    let headers = selection
        .loop_ids()
        .map(|id| adaptor.block_name(forest.get(id).header()).to_string())
        .collect();
    (headers, selection)
}

fn parse(source: &str) -> TestIR {
    TestIR::parse(source).unwrap_or_else(|e| panic!("Failed to parse: {e}\n{source}"))
}

// Three top-level loops: scalar, vectorized, scalar.
const MIXED: &str = "
kernel(%n, %p:ptr, %va:v8i16) {
entry:
    br ^first
first:
    %x = load %p
    condbr %x, ^first, ^second
second:
    %y = add %n, %n
    store %va, %p
    condbr %y, ^second, ^third
third:
    %z = mul %n, %n
    condbr %z, ^third, ^exit
exit:
    ret
}

other(%n, %va:v8i16) {
entry:
    br ^loop
loop:
    %w:v8i16 = add %va, %va
    condbr %n, ^loop, ^exit
exit:
    ret
}
";

#[test]
fn combined_index_zero_picks_vectorized_loop() {
    let ir = parse(MIXED);
    let config = TargetConfig::new().with_kernel("kernel", [0]);
    let (headers, selection) = select_headers(&ir, "kernel", &config);

    assert_eq!(headers, ["second"]);
    assert_eq!(
        selection.events[0].to_string(),
        "[Loop Selection] Selected loop 0 (vectorized: yes)"
    );
}

#[test]
fn empty_target_ids_select_only_vectorized_loops() {
    let ir = parse(MIXED);
    let config = TargetConfig::new().with_kernel("kernel", []);
    let (headers, selection) = select_headers(&ir, "kernel", &config);

    assert_eq!(headers, ["second"]);
    assert!(selection.auto_selected);
    assert_eq!(
        selection.events[0].to_string(),
        "[Loop Selection] Auto-selected vectorized loop"
    );
}

#[test]
fn scalar_loops_are_numbered_last_loop_first() {
    let ir = parse(MIXED);
    let config = TargetConfig::new().with_kernel("kernel", [2, 1, 1]);
    let (headers, selection) = select_headers(&ir, "kernel", &config);

    // Combined order is second, third, first.
    assert_eq!(headers, ["third", "first"]);
    assert_eq!(
        selection.events,
        [
            SelectionEvent::Selected { index: 1, class: LoopClass::Scalar },
            SelectionEvent::Selected { index: 2, class: LoopClass::Scalar },
        ]
    );
}

#[test]
fn function_outside_kernel_set_selects_nothing() {
    let ir = parse(MIXED);
    let config = TargetConfig::new().with_kernel("kernel", []);
    let (headers, selection) = select_headers(&ir, "other", &config);

    assert!(headers.is_empty());
    assert!(selection.events.is_empty());
}

#[test]
fn two_scalar_loops_are_both_auto_selected() {
    let ir = parse(
        "
kernel(%n) {
entry:
    br ^a
a:
    %i = add %i, %n
    condbr %i, ^a, ^b
b:
    %j = add %j, %n
    condbr %j, ^b, ^exit
exit:
    ret
}",
    );
    let config = TargetConfig::new().with_kernel("kernel", []);
    let (headers, selection) = select_headers(&ir, "kernel", &config);

    assert_eq!(headers, ["b", "a"]);
    assert!(selection
        .events
        .iter()
        .all(|e| *e == SelectionEvent::AutoSelected { class: LoopClass::Scalar }));
}

const SCALAR_OUTER_VECTOR_INNER: &str = "
kernel(%n, %va:v4f32) {
entry:
    br ^outer
outer:
    %i = add %i, %n
    br ^inner
inner:
    %acc:v4f32 = fadd %va, %va
    condbr %n, ^inner, ^outer.latch
outer.latch:
    condbr %i, ^outer, ^exit
exit:
    ret
}";

#[test]
fn nested_vectorized_sub_loop_sorts_before_its_scalar_parent() {
    let ir = parse(SCALAR_OUTER_VECTOR_INNER);
    let config = TargetConfig::new()
        .with_kernel("kernel", [])
        .with_target_nested(true);
    let (headers, _) = select_headers(&ir, "kernel", &config);
    assert_eq!(headers, ["inner"]);

    let config = TargetConfig::new()
        .with_kernel("kernel", [1])
        .with_target_nested(true);
    let (headers, selection) = select_headers(&ir, "kernel", &config);
    assert_eq!(headers, ["outer"]);
    assert_eq!(
        selection.events[0].to_string(),
        "[Loop Selection] Selected loop 1 (vectorized: no)"
    );
}

#[test]
fn deep_classification_counts_sub_loop_blocks() {
    let ir = parse(SCALAR_OUTER_VECTOR_INNER);

    let own = TargetConfig::new().with_kernel("kernel", [0]);
    let (_, selection) = select_headers(&ir, "kernel", &own);
    assert_eq!(selection.loops[0].class, LoopClass::Scalar);

    let deep = TargetConfig::new()
        .with_kernel("kernel", [0])
        .with_classify_sub_loop_blocks(true);
    let (headers, selection) = select_headers(&ir, "kernel", &deep);
    assert_eq!(headers, ["outer"]);
    assert_eq!(selection.loops[0].class, LoopClass::Vectorized);
}

#[test]
fn grandchild_loops_are_never_candidates() {
    let ir = parse(
        "
kernel(%n, %va:v2i64) {
entry:
    br ^l1
l1:
    br ^l2
l2:
    br ^l3
l3:
    %v:v2i64 = add %va, %va
    condbr %n, ^l3, ^l2.latch
l2.latch:
    condbr %n, ^l2, ^l1.latch
l1.latch:
    condbr %n, ^l1, ^exit
exit:
    ret
}",
    );
    let config = TargetConfig::new()
        .with_kernel("kernel", [])
        .with_target_nested(true);
    let (headers, selection) = select_headers(&ir, "kernel", &config);

    // Only l1 and l2 are candidates, both scalar by their own blocks.
    assert_eq!(headers, ["l1", "l2"]);
    assert!(selection.loops.iter().all(|l| l.class == LoopClass::Scalar));
}

#[test]
fn vector_add_prefers_vector_body_over_remainder() {
    let ir = load_tir_file("vector_add.tir");

    let config = TargetConfig::new().with_kernel("kernel", []);
    let (headers, _) = select_headers(&ir, "kernel", &config);
    assert_eq!(headers, ["vector.body"]);

    let config = TargetConfig::new().with_kernel("kernel", [1]);
    let (headers, _) = select_headers(&ir, "kernel", &config);
    assert_eq!(headers, ["for.body"]);

    let config = TargetConfig::new().with_kernel("kernel", [0, 1]);
    let (headers, _) = select_headers(&ir, "kernel", &config);
    assert_eq!(headers, ["vector.body", "for.body"]);
}

#[test]
fn vector_add_plan_carries_flags_and_blocks() {
    let ir = load_tir_file("vector_add.tir");
    let config = TargetConfig::new()
        .with_kernel("kernel", [1])
        .with_target_entire_function(true);

    let mut adaptor = TestIRAdaptor::new(&ir);
    let func = adaptor.func_by_name("kernel").unwrap();
    let forest = LoopAnalysis::new().switch_func(&mut adaptor, func);
    let selection = LoopSelector::new(&config).select("kernel", &adaptor, &forest);
    let plan = MappingPlan::new("kernel", &adaptor, &forest, &selection, &config);

    assert!(plan.target_entire_function);
    assert!(!plan.target_nested);
    assert_eq!(plan.loops.len(), 1);
    assert_eq!(plan.loops[0].header, "for.body");
    assert_eq!(plan.loops[0].candidate_index, 1);
    assert_eq!(plan.loops[0].class, LoopClass::Scalar);
    assert_eq!(plan.loops[0].depth, 1);
}

#[test]
fn declarations_have_no_loops() {
    let ir = load_tir_file("vector_add.tir");
    let mut adaptor = TestIRAdaptor::new(&ir);
    let printf = adaptor.func_by_name("printf").unwrap();
    assert!(adaptor.func_is_declaration(printf));

    let forest = LoopAnalysis::new().switch_func(&mut adaptor, printf);
    assert!(forest.is_empty());

    let config = TargetConfig::new().with_kernel("printf", []);
    let selection = LoopSelector::new(&config).select("printf", &adaptor, &forest);
    assert!(selection.is_empty());
    assert!(!selection.auto_selected);
}
