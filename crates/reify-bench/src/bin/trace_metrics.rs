use std::collections::BTreeMap;
use std::path::PathBuf;

use reify_bench::nested_pairs;
use reify_infer::trace::UnifyAction;
use reify_infer::{Unifier, UnifierOptions};
use reify_types::{ClassType, ScopeId, TypeExpr};
use serde::Serialize;

#[derive(Serialize)]
struct KernelMetric {
    name: &'static str,
    steps: usize,
    bindings: usize,
    actions: BTreeMap<&'static str, usize>,
}

#[derive(Serialize)]
struct Report {
    kernels: Vec<KernelMetric>,
    total_steps: usize,
    total_bindings: usize,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let map = ScopeId::of_type("Map");
    let (pairs_formal, pairs_actual) = nested_pairs(16);
    let kernels = vec![
        measure_kernel(
            "map_entry",
            &TypeExpr::parameterized(
                ClassType::new("Map"),
                vec![
                    TypeExpr::variable(map.clone(), "K"),
                    TypeExpr::variable(map, "V"),
                ],
            ),
            &TypeExpr::parameterized(
                ClassType::new("Map"),
                vec![TypeExpr::class("String"), TypeExpr::class("Integer")],
            ),
        )?,
        measure_kernel(
            "wildcard_list",
            &TypeExpr::parameterized(ClassType::new("List"), vec![TypeExpr::wildcard()]),
            &TypeExpr::parameterized(ClassType::new("List"), vec![TypeExpr::class("String")]),
        )?,
        measure_kernel("nested_pairs_16", &pairs_formal, &pairs_actual)?,
    ];
    let report = Report {
        total_steps: kernels.iter().map(|k| k.steps).sum(),
        total_bindings: kernels.iter().map(|k| k.bindings).sum(),
        kernels,
    };
    let json = serde_json::to_string_pretty(&report)
        .map_err(|err| format!("failed to render metrics: {err}"))?;

    if let Some(path) = std::env::args().nth(1) {
        let path = PathBuf::from(path);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|err| format!("failed to create `{}`: {err}", parent.display()))?;
        }
        std::fs::write(&path, json)
            .map_err(|err| format!("failed to write `{}`: {err}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(())
}

fn measure_kernel(
    name: &'static str,
    formal: &TypeExpr,
    actual: &TypeExpr,
) -> Result<KernelMetric, String> {
    let mut unifier = Unifier::with_options(UnifierOptions {
        record_trace: true,
        trace_limit: usize::MAX,
    });
    unifier
        .populate(formal, actual)
        .map_err(|err| format!("failed to unify kernel `{name}`: {err}"))?;

    let mut actions = BTreeMap::new();
    for step in unifier.unify_trace() {
        *actions.entry(step.action.as_str()).or_insert(0) += 1;
    }
    Ok(KernelMetric {
        name,
        steps: unifier.unify_trace().len(),
        bindings: count_bindings(unifier.unify_trace().iter().map(|s| s.action)),
        actions,
    })
}

fn count_bindings(actions: impl Iterator<Item = UnifyAction>) -> usize {
    actions.filter(|action| *action == UnifyAction::Bind).count()
}
