//! Deployer instructions.
//!
//! A markdown walkthrough for the operator who applies a generated
//! configuration: which script to run, which pipelines to trigger and in
//! what order.

use std::fmt::Write;

use crate::assemble::script_file_name;
use crate::lint::{LintIssue, LintLevel};
use crate::pipeline::PipelineMode;
use crate::run::Run;
use crate::sql::Step;

/// Render the instructions for `run`. Lint findings other than `Info` are
/// listed at the end.
pub fn render(run: &Run, issues: &[LintIssue]) -> String {
    let cfg = run.config();
    let targets = run.targets();
    let src = run.src_table();
    let mut md = String::new();

    let _ = writeln!(md, "# Deployment for: {}\n", src);
    let _ = writeln!(
        md,
        "**Configuration prepared by:** {}  ",
        if cfg.user_initials.is_empty() {
            "Developer".to_string()
        } else {
            cfg.user_initials.to_uppercase()
        }
    );
    let _ = writeln!(md, "**Table suffix:** `{}`  ", run.table_suffix());
    let _ = writeln!(md, "**Target tables:**\n");
    let _ = writeln!(md, "- ST table: `{}.{}`", targets.st_schema, targets.st_table);
    let _ = writeln!(md, "- HS table: `{}.{}`", targets.hs_schema, targets.hs_table);
    if Step::HelperTable.generate(run).is_some() {
        let _ = writeln!(
            md,
            "- Helper table: `{}.{}`",
            cfg.helper_schema,
            run.dimension().helper_table
        );
    }
    if Step::MainTable.generate(run).is_some() {
        let _ = writeln!(
            md,
            "- Dimension table: `{}.{}`",
            cfg.main_table_schema,
            run.dimension().dimension_table
        );
    }

    let _ = writeln!(md, "\n## 1. Run the SQL script\n");
    let _ = writeln!(md, "- Connect to the warehouse database");
    let _ = writeln!(md, "- Run `{}`", script_file_name(run));
    let _ = writeln!(md, "- It will:");
    for step in Step::ALL {
        if matches!(step, Step::QuickHsTable | Step::Cleanup) {
            continue;
        }
        if step.generate(run).is_some() {
            let _ = writeln!(md, "  - {}", sentence_case(step.title()));
        }
    }

    let _ = writeln!(md, "\n## 2. Deploy the pipelines\n");
    let _ = writeln!(
        md,
        "- Locate the pull request created by the developer and review the pipeline changes"
    );
    let _ = writeln!(md, "- Approve and merge it into the target environment");
    let _ = writeln!(md, "- Verify that these pipelines appear in the data factory:");
    for mode in PipelineMode::ALL {
        let _ = writeln!(md, "  - `{}`", mode.pipeline_name(src));
    }

    let _ = writeln!(md, "\n## 3. Run the initial load\n");
    if cfg.skip_st_table {
        let _ = writeln!(
            md,
            "- The ST table already exists: trigger `{}` to load the HS table only",
            PipelineMode::Placeholder.pipeline_name(src)
        );
    } else {
        let _ = writeln!(
            md,
            "- Trigger `{}` to populate the ST and HS tables",
            PipelineMode::Initial.pipeline_name(src)
        );
        if !cfg.skip_hs_table {
            let _ = writeln!(
                md,
                "- To stage the data before the HS table exists, trigger `{}` instead, \
                 then run the commented step 8 of the script and rerun the initial load",
                PipelineMode::InvalidHs.pipeline_name(src)
            );
        }
    }

    let _ = writeln!(md, "\n## 4. Verify the deployment\n");
    let _ = writeln!(md, "- Check that data is flowing into the ST and HS tables");
    let _ = writeln!(md, "- Verify the HS table has all technical columns");
    let _ = writeln!(
        md,
        "- If helper or dimension tables were configured, check they were created"
    );

    let _ = writeln!(md, "\n## 5. Schedule the daily load\n");
    let _ = writeln!(
        md,
        "- Attach the daily trigger to `{}`",
        PipelineMode::Daily.pipeline_name(src)
    );
    let _ = writeln!(md, "- Set up monitoring to verify successful daily runs");

    let _ = writeln!(md, "\n## 6. Clean up\n");
    let _ = writeln!(
        md,
        "- Once the load is verified, run the commented statements of step 9 by hand"
    );
    let _ = writeln!(
        md,
        "- They promote the sandbox configuration `*_{}` to production and drop the temporary tables",
        run.table_suffix()
    );

    let findings: Vec<_> = issues
        .iter()
        .filter(|i| i.level != LintLevel::Info)
        .collect();
    if !findings.is_empty() {
        let _ = writeln!(md, "\n## Warnings\n");
        for issue in findings {
            let _ = writeln!(md, "- `{}`: {}", issue.field, issue.message);
        }
    }
    md
}

fn sentence_case(title: &str) -> String {
    title
        .split(' ')
        .enumerate()
        .map(|(i, word)| match (i, word) {
            (_, "ST" | "HS") => word.to_string(),
            (0, _) => word[..1].to_string() + &word[1..].to_lowercase(),
            _ => word.to_lowercase(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
