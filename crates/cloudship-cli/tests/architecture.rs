use arch_lint::rules::{NoErrorSwallowing, NoSilentResultDrop};
use arch_lint::{Analyzer, Severity};
use std::path::Path;

/// Every crate whose `src/` must stay free of swallowed errors. A failed
/// gcloud or docker call has to surface as a step failure, never as a
/// silently skipped step.
const GUARDED_CRATES: [&str; 3] = ["cloudship-core", "cloudship-cloud", "cloudship-cli"];

#[test]
fn step_errors_are_never_swallowed() {
    let crates_dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("crates directory");

    let mut reports = Vec::new();
    for name in GUARDED_CRATES {
        let src = crates_dir.join(name).join("src");
        assert!(src.is_dir(), "{} is missing", src.display());

        let analyzer = Analyzer::builder()
            .root(src.as_path())
            .rule(NoErrorSwallowing::new())
            .rule(NoSilentResultDrop::new())
            .build()
            .expect("build analyzer");

        let result = analyzer.analyze().expect("analyze");
        if result.has_violations_at(Severity::Warning) {
            reports.push(format!(
                "{name}:\n{}",
                result.format_test_report(Severity::Warning)
            ));
        }
    }

    assert!(reports.is_empty(), "{}", reports.join("\n"));
}
