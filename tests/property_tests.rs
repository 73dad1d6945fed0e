//! Property tests for classification and selection.
//!
//! Kernels are generated as a chain of top-level loops `h0, h1, ...`, each
//! optionally holding one sub-loop `i<k>`. Every loop is vectorized or scalar
//! independently, so the expected candidate order can be computed directly
//! from the generated shape.

use loopsel::config::TargetConfig;
use loopsel::core::{
    IrAdaptor, LoopAnalysis, LoopClass, LoopForest, LoopId, LoopSelector, Selection,
    VectorOpClassifier,
};
use loopsel::test_ir::{BlockRef, TestIR, TestIRAdaptor};
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::fmt::Write as _;

#[derive(Debug, Clone)]
struct LoopShape {
    vector: bool,
    inner: Option<bool>,
}

fn loop_shape() -> impl Strategy<Value = LoopShape> {
    (any::<bool>(), proptest::option::of(any::<bool>()))
        .prop_map(|(vector, inner)| LoopShape { vector, inner })
}

fn kernel_shape() -> impl Strategy<Value = Vec<LoopShape>> {
    proptest::collection::vec(loop_shape(), 0..6)
}

fn body_inst(out: &mut String, name: &str, vector: bool) {
    if vector {
        writeln!(out, "    %{name}:v4i32 = add %va, %va").unwrap();
    } else {
        writeln!(out, "    %{name} = add %n, %n").unwrap();
    }
}

fn build_kernel(shape: &[LoopShape]) -> String {
    let mut out = String::from("kernel(%n, %va:v4i32) {\nentry:\n");
    let first = if shape.is_empty() { "exit" } else { "h0" };
    writeln!(out, "    br ^{first}").unwrap();

    for (k, lp) in shape.iter().enumerate() {
        let next = if k + 1 == shape.len() {
            "exit".to_string()
        } else {
            format!("h{}", k + 1)
        };
        writeln!(out, "h{k}:").unwrap();
        body_inst(&mut out, &format!("t{k}"), lp.vector);
        match lp.inner {
            None => writeln!(out, "    condbr %n, ^h{k}, ^{next}").unwrap(),
            Some(inner_vector) => {
                writeln!(out, "    br ^i{k}").unwrap();
                writeln!(out, "i{k}:").unwrap();
                body_inst(&mut out, &format!("u{k}"), inner_vector);
                writeln!(out, "    condbr %n, ^i{k}, ^x{k}").unwrap();
                writeln!(out, "x{k}:").unwrap();
                writeln!(out, "    condbr %n, ^h{k}, ^{next}").unwrap();
            }
        }
    }
    out.push_str("exit:\n    ret\n}\n");
    out
}

/// Candidate headers in discovery order, with their expected class. Top-level
/// loops come last header first, each followed by its sub-loop.
fn discovery_order(shape: &[LoopShape], target_nested: bool) -> Vec<(String, LoopClass)> {
    let class = |vector: bool| {
        if vector {
            LoopClass::Vectorized
        } else {
            LoopClass::Scalar
        }
    };
    let mut order = Vec::new();
    for (k, lp) in shape.iter().enumerate().rev() {
        order.push((format!("h{k}"), class(lp.vector)));
        if let (true, Some(inner)) = (target_nested, lp.inner) {
            order.push((format!("i{k}"), class(inner)));
        }
    }
    order
}

/// Vectorized candidates first, discovery order kept within each class.
fn expected_combined(shape: &[LoopShape], target_nested: bool) -> Vec<(String, LoopClass)> {
    let order = discovery_order(shape, target_nested);
    let (mut vectorized, scalar): (Vec<_>, Vec<_>) =
        order.into_iter().partition(|(_, c)| c.is_vectorized());
    vectorized.extend(scalar);
    vectorized
}

struct Run {
    combined: Vec<(String, LoopClass)>,
    selected: Vec<(String, LoopClass)>,
    selection: Selection,
}

fn run(source: &str, func: &str, config: &TargetConfig) -> Run {
    let ir = TestIR::parse(source).unwrap_or_else(|e| panic!("{e}\n{source}"));
    let mut adaptor = TestIRAdaptor::new(&ir);
    let func_ref = adaptor.func_by_name("kernel").unwrap();
    let forest = LoopAnalysis::new().switch_func(&mut adaptor, func_ref);
    let selector = LoopSelector::new(config);

    let named = |adaptor: &TestIRAdaptor<'_>, forest: &LoopForest<BlockRef>, id: LoopId| {
        adaptor.block_name(forest.get(id).header()).to_string()
    };

    let candidates = selector.candidates(&adaptor, &forest);
    let combined = candidates
        .combined()
        .enumerate()
        .map(|(i, id)| (named(&adaptor, &forest, id), candidates.class_at(i).unwrap()))
        .collect();

    let selection = selector.select(func, &adaptor, &forest);
    let selected = selection
        .loops
        .iter()
        .map(|l| (named(&adaptor, &forest, l.id), l.class))
        .collect();

    Run {
        combined,
        selected,
        selection,
    }
}

proptest! {
    #[test]
    fn classification_matches_instruction_types(shape in kernel_shape()) {
        let source = build_kernel(&shape);
        let ir = TestIR::parse(&source).unwrap();
        let mut adaptor = TestIRAdaptor::new(&ir);
        let func = adaptor.func_by_name("kernel").unwrap();
        let forest = LoopAnalysis::new().switch_func(&mut adaptor, func);
        let classifier = VectorOpClassifier::default();

        prop_assert_eq!(forest.top_level_loops().len(), shape.len());
        for id in forest.loops_in_preorder() {
            let header = adaptor.block_name(forest.get(id).header()).to_string();
            let k: usize = header[1..].parse().unwrap();
            let expected = if header.starts_with('h') {
                shape[k].vector
            } else {
                shape[k].inner == Some(true)
            };
            let first = classifier.classify(&adaptor, &forest, id);
            prop_assert_eq!(first.is_vectorized(), expected, "loop {}", header);
            prop_assert_eq!(classifier.classify(&adaptor, &forest, id), first);
        }
    }

    #[test]
    fn combined_list_puts_vectorized_first(
        shape in kernel_shape(),
        target_nested in any::<bool>(),
    ) {
        let config = TargetConfig::new()
            .with_kernel("kernel", [])
            .with_target_nested(target_nested);
        let result = run(&build_kernel(&shape), "kernel", &config);

        prop_assert_eq!(&result.combined, &expected_combined(&shape, target_nested));
        let first_scalar = result
            .combined
            .iter()
            .position(|(_, c)| !c.is_vectorized())
            .unwrap_or(result.combined.len());
        prop_assert!(result.combined[first_scalar..].iter().all(|(_, c)| !c.is_vectorized()));
    }

    #[test]
    fn explicit_ids_select_exact_positions(
        shape in kernel_shape(),
        target_nested in any::<bool>(),
        ids in proptest::collection::vec(0usize..12, 0..6),
    ) {
        let config = TargetConfig::new()
            .with_kernel("kernel", ids.iter().copied())
            .with_target_nested(target_nested);
        let result = run(&build_kernel(&shape), "kernel", &config);

        let wanted: BTreeSet<usize> = ids.iter().copied().collect();
        let explicit: Vec<_> = result
            .combined
            .iter()
            .enumerate()
            .filter(|(i, _)| wanted.contains(i))
            .map(|(_, c)| c.clone())
            .collect();

        if explicit.is_empty() {
            prop_assert!(result.selection.auto_selected || result.combined.is_empty());
        } else {
            prop_assert!(!result.selection.auto_selected);
            prop_assert_eq!(&result.selected, &explicit);
            prop_assert_eq!(result.selection.events.len(), explicit.len());
        }

        let unmatched: Vec<usize> = wanted.iter().copied().filter(|&i| i >= result.combined.len()).collect();
        prop_assert_eq!(&result.selection.unmatched_ids, &unmatched);
    }

    #[test]
    fn fallback_never_mixes_classes(
        shape in kernel_shape(),
        target_nested in any::<bool>(),
    ) {
        let config = TargetConfig::new()
            .with_kernel("kernel", [])
            .with_target_nested(target_nested);
        let result = run(&build_kernel(&shape), "kernel", &config);

        let vectorized: Vec<_> = result
            .combined
            .iter()
            .filter(|(_, c)| c.is_vectorized())
            .cloned()
            .collect();
        let expected = if vectorized.is_empty() {
            result.combined.clone()
        } else {
            vectorized
        };
        prop_assert_eq!(&result.selected, &expected);
        prop_assert_eq!(result.selection.events.len(), expected.len());
    }

    #[test]
    fn non_kernel_functions_are_skipped(
        shape in kernel_shape(),
        ids in proptest::collection::vec(0usize..4, 0..3),
    ) {
        let config = TargetConfig::new().with_kernel("other", ids);
        let result = run(&build_kernel(&shape), "kernel", &config);

        prop_assert!(result.selection.is_empty());
        prop_assert!(result.selection.events.is_empty());
        prop_assert!(result.selection.unmatched_ids.is_empty());
    }
}
