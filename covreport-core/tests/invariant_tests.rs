//! CI Invariant Tests
//!
//! These tests explicitly validate invariants that must always hold.
//! Run in CI to prevent regressions.

use covreport_core::header::Header;
use covreport_core::plan::{targets, RenderStep};
use covreport_core::record::{CoverageRecord, Dataset, DatasetRole};
use covreport_core::sort::SortIntent;
use covreport_core::surface::{RecordingSurface, SurfaceOp};
use covreport_core::{
    apply, classify, render_index, render_source, CoverageClass, IndexContext, SourceContext,
    Thresholds,
};

fn header(covered: u64, instrumented: u64) -> Header {
    Header {
        command: "./run-tests --all".to_string(),
        date: "2024-06-30 23:59:59".to_string(),
        covered,
        instrumented,
    }
}

fn records(n: usize) -> Vec<CoverageRecord> {
    (0..n)
        .map(|i| {
            let mut r = CoverageRecord::new();
            r.insert("title", format!("src/file{}.c", i));
            r.insert("covered", "50.0");
            r
        })
        .collect()
}

fn index_ctx(covered: u64, instrumented: u64) -> IndexContext {
    IndexContext {
        header: header(covered, instrumented),
        main: Dataset::new(DatasetRole::Main, records(4)),
        merged: Dataset::new(DatasetRole::Merged, records(1)),
        thresholds: Thresholds::default(),
        sort: SortIntent::default(),
    }
}

/// Invariant: classes are ordered by ratio and the limits themselves are
/// Low and High
#[test]
fn test_classification_is_monotonic() {
    let thresholds = Thresholds {
        percent_low: 30.0,
        percent_high: 60.0,
    };
    let rank = |c: CoverageClass| match c {
        CoverageClass::Low => 0,
        CoverageClass::Medium => 1,
        CoverageClass::High => 2,
    };

    let mut previous = 0;
    for covered in 0..=10 {
        let class = classify(covered, 10, &thresholds);
        assert!(rank(class) >= previous, "{}/10 went down a class", covered);
        previous = rank(class);
    }
    assert_eq!(classify(3, 10, &thresholds), CoverageClass::Low);
    assert_eq!(classify(4, 10, &thresholds), CoverageClass::Medium);
    assert_eq!(classify(6, 10, &thresholds), CoverageClass::High);
}

/// Invariant: nothing instrumented is neither low nor high
#[test]
fn test_empty_run_is_medium() {
    for thresholds in [
        Thresholds::default(),
        Thresholds {
            percent_low: 0.0,
            percent_high: 100.0,
        },
    ] {
        assert_eq!(classify(0, 0, &thresholds), CoverageClass::Medium);
    }
}

/// Invariant: identical context yields a byte-identical plan
#[test]
fn test_plan_determinism() {
    let ctx = index_ctx(80, 100);
    let first = render_index(&ctx).to_json().unwrap();
    for _ in 0..5 {
        assert_eq!(render_index(&ctx).to_json().unwrap(), first);
    }
}

/// Invariant: building a plan does not depend on any surface
#[test]
fn test_plan_is_independent_of_surface() {
    let ctx = index_ctx(80, 100);
    let plan = render_index(&ctx);

    let mut full = RecordingSurface::index_page();
    let mut bare = RecordingSurface::new(Vec::<String>::new(), Vec::<String>::new());
    apply(&plan, &mut full);
    apply(&plan, &mut bare);

    assert_eq!(render_index(&ctx), plan);
}

/// Invariant: both page kinds write the same header
#[test]
fn test_header_writes_shared_by_page_kinds() {
    let index = render_index(&index_ctx(7, 9));
    let source = render_source(&SourceContext {
        header: header(7, 9),
        source: Dataset::empty(DatasetRole::Source),
        thresholds: Thresholds::default(),
    });
    assert_eq!(index.header_writes(), source.header_writes());
}

/// Invariant: writes that succeeded stay in place after a later failure
#[test]
fn test_no_rollback_after_failure() {
    let plan = render_index(&index_ctx(80, 100));
    let ids = [targets::PERCENT_COVERED, targets::COMMAND];
    let mut surface = RecordingSurface::new(ids, ["main-data"]);
    let report = apply(&plan, &mut surface);

    assert!(!report.is_complete());
    assert_eq!(surface.rows("main-data"), Some(4));
    assert_eq!(surface.text(targets::PERCENT_COVERED), Some("80.0%"));
    assert_eq!(surface.text(targets::COMMAND), Some("./run-tests --all"));
    assert_eq!(
        surface.ops().last(),
        Some(&SurfaceOp::Text {
            target: targets::COMMAND.to_string(),
            text: "./run-tests --all".to_string(),
        })
    );
}

/// Invariant: records reach the surface untouched and in order
#[test]
fn test_records_pass_through() {
    let ctx = index_ctx(1, 2);
    let plan = render_index(&ctx);
    let bound = plan
        .steps
        .iter()
        .find_map(|s| match s {
            RenderStep::Bind(b) if b.slot == "main-data" => Some(&b.records),
            _ => None,
        })
        .unwrap();
    assert_eq!(bound, &ctx.main.records);
}

/// Invariant: source pages never activate sorting
#[test]
fn test_source_pages_have_no_sort() {
    let plan = render_source(&SourceContext {
        header: header(0, 0),
        source: Dataset::new(DatasetRole::Source, records(3)),
        thresholds: Thresholds::default(),
    });
    assert!(plan.sort().is_none());
    assert!(plan
        .steps
        .iter()
        .all(|s| !matches!(s, RenderStep::ActivateSort(_))));
}
