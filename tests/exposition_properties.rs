// tests/exposition_properties.rs

use std::collections::{BTreeMap, HashMap};

use proptest::prelude::*;

use cronmanager::metrics::exposition::{Exposition, Label, Line, Sample};

// Small pools so sequences revisit the same series often. Names that are
// prefixes of each other and contain regex metacharacters are included on
// purpose.
const JOBS: &[&str] = &["backup", "backup_db", "job.*", "a\"b", "x\\y", "sync job"];
const DIMENSIONS: &[&str] = &["duration", "failed", "delayed", "run", "last"];

fn upserts_strategy() -> impl Strategy<Value = Vec<(usize, usize, u32)>> {
    proptest::collection::vec((0..JOBS.len(), 0..DIMENSIONS.len(), 0u32..10_000), 1..60)
}

fn sample(job: usize, dim: usize, value: u32) -> Sample {
    Sample::new(
        "cronjob",
        vec![
            Label::new("name", JOBS[job]),
            Label::new("dimension", DIMENSIONS[dim]),
        ],
        f64::from(value),
    )
}

/// Rows of the family with no `cronjob` header, optionally under the
/// `cron_job` header older releases wrote.
fn headerless_seed_strategy() -> impl Strategy<Value = (bool, BTreeMap<(usize, usize), u32>)> {
    (
        any::<bool>(),
        proptest::collection::btree_map((0..JOBS.len(), 0..DIMENSIONS.len()), 0u32..10_000, 0..8),
    )
}

fn render_seed(legacy_header: bool, rows: &BTreeMap<(usize, usize), u32>) -> String {
    let mut text = String::new();
    if legacy_header {
        text.push_str("# TYPE cron_job gauge\n");
    }
    for ((job, dim), value) in rows {
        text.push_str(&sample(*job, *dim, *value).render());
        text.push('\n');
    }
    text
}

proptest! {
    /// Applying upserts one file rewrite at a time keeps the document valid:
    /// one header, before every sample, one line per series holding the
    /// latest value.
    #[test]
    fn upsert_sequences_keep_file_invariants(
        (legacy_header, seed) in headerless_seed_strategy(),
        ops in upserts_strategy(),
    ) {
        let mut text = render_seed(legacy_header, &seed);
        let mut expected: HashMap<(usize, usize), u32> = seed.into_iter().collect();

        for (job, dim, value) in ops {
            let mut doc = Exposition::parse(&text);
            doc.upsert(&sample(job, dim, value));
            text = doc.render();
            expected.insert((job, dim), value);
        }

        let doc = Exposition::parse(&text);
        let lines = doc.lines();

        let headers: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, l)| matches!(l, Line::TypeHeader { metric, .. } if metric == "cronjob"))
            .map(|(i, _)| i)
            .collect();
        prop_assert_eq!(headers.len(), 1);

        let sample_positions: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, l)| matches!(l, Line::Sample { .. }))
            .map(|(i, _)| i)
            .collect();
        prop_assert!(sample_positions.iter().all(|i| *i > headers[0]));
        prop_assert_eq!(sample_positions.len(), expected.len());
        prop_assert_eq!(lines.len(), expected.len() + 1 + usize::from(legacy_header));

        for ((job, dim), value) in expected {
            let key = sample(job, dim, 0).key();
            let rendered = value.to_string();
            prop_assert_eq!(doc.value_of(&key), Some(rendered.as_str()));
        }
    }

    /// Re-writing an existing series never moves or alters any other line.
    #[test]
    fn replacing_a_series_only_changes_its_own_line(
        ops in upserts_strategy(),
        pick in any::<prop::sample::Index>(),
        new_value in 10_000u32..20_000,
    ) {
        let mut doc = Exposition::parse("");
        for (job, dim, value) in &ops {
            doc.upsert(&sample(*job, *dim, *value));
        }
        let before = doc.render();

        let (job, dim, _) = ops[pick.index(ops.len())];
        doc.upsert(&sample(job, dim, new_value));
        let after = doc.render();

        let before_lines: Vec<&str> = before.lines().collect();
        let after_lines: Vec<&str> = after.lines().collect();
        prop_assert_eq!(before_lines.len(), after_lines.len());

        let changed: Vec<usize> = before_lines
            .iter()
            .zip(after_lines.iter())
            .enumerate()
            .filter(|(_, (b, a))| b != a)
            .map(|(i, _)| i)
            .collect();
        prop_assert_eq!(changed.len(), 1);
        for i in changed {
            let expected_suffix = format!(" {new_value}");
            prop_assert!(after_lines[i].ends_with(&expected_suffix));
        }
    }
}
