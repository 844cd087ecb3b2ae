//! Artifact assembly.
//!
//! Collects every generated document of a [`Run`] under a stable file name:
//! the composite deployment script, one fragment per step, the pipeline
//! documents, the parameter export and the deployer instructions.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DeployResult;
use crate::instructions;
use crate::lint::lint_config;
use crate::params::export_parameters;
use crate::pipeline::{Pipeline, PipelineMode};
use crate::run::Run;
use crate::sql::Step;

const BANNER: &str = "---------------------------------------------------------";

/// A named text document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub file_name: String,
    pub contents: String,
}

/// The SQL of a single step.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub step: Step,
    pub file_name: String,
    pub sql: String,
}

/// Everything generated for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifacts {
    pub script: Document,
    pub fragments: Vec<Fragment>,
    pub pipelines: Vec<Document>,
    pub parameters: Document,
    pub instructions: Document,
}

pub fn script_file_name(run: &Run) -> String {
    format!("deploy_{}_{}.sql", run.src_table(), run.table_suffix())
}

pub fn fragment_file_name(run: &Run, step: Step) -> String {
    format!(
        "{}_{}_step{}_{}.sql",
        run.src_table(),
        run.table_suffix(),
        step.number(),
        step.label()
    )
}

pub fn parameters_file_name(run: &Run) -> String {
    format!("deploy_params_{}_{}.json", run.src_table(), run.table_suffix())
}

pub fn instructions_file_name(run: &Run) -> String {
    format!(
        "deploy_instructions_{}_{}.md",
        run.src_table(),
        run.table_suffix()
    )
}

impl Artifacts {
    /// Generate every artifact of `run`.
    pub fn build(run: &Run) -> DeployResult<Self> {
        let fragments: Vec<Fragment> = Step::ALL
            .iter()
            .filter_map(|&step| {
                step.generate(run).map(|sql| Fragment {
                    step,
                    file_name: fragment_file_name(run, step),
                    sql,
                })
            })
            .collect();

        let script = Document {
            file_name: script_file_name(run),
            contents: composite_script(run, &fragments),
        };

        let pipelines = PipelineMode::ALL
            .iter()
            .map(|&mode| {
                let pipeline = Pipeline::build(run, mode);
                Ok(Document {
                    file_name: pipeline.file_name(),
                    contents: pipeline.to_json()?,
                })
            })
            .collect::<DeployResult<Vec<_>>>()?;

        let parameters = Document {
            file_name: parameters_file_name(run),
            contents: export_parameters(
                run.config(),
                Some(run.table_suffix()),
                run.generated_at(),
            )?,
        };

        let issues = lint_config(run.config());
        let instructions = Document {
            file_name: instructions_file_name(run),
            contents: instructions::render(run, &issues),
        };

        Ok(Self {
            script,
            fragments,
            pipelines,
            parameters,
            instructions,
        })
    }

    /// The fragment of `step`, if the step produced one.
    pub fn fragment(&self, step: Step) -> Option<&Fragment> {
        self.fragments.iter().find(|f| f.step == step)
    }

    /// Every document as `(file name, contents)`, in write order.
    pub fn documents(&self) -> Vec<(&str, &str)> {
        let mut docs = vec![(self.script.file_name.as_str(), self.script.contents.as_str())];
        docs.extend(
            self.fragments
                .iter()
                .map(|f| (f.file_name.as_str(), f.sql.as_str())),
        );
        docs.extend(
            self.pipelines
                .iter()
                .map(|d| (d.file_name.as_str(), d.contents.as_str())),
        );
        docs.push((
            self.parameters.file_name.as_str(),
            self.parameters.contents.as_str(),
        ));
        docs.push((
            self.instructions.file_name.as_str(),
            self.instructions.contents.as_str(),
        ));
        docs
    }

    /// Write every document into `dir`, creating it if needed.
    pub fn write_to(&self, dir: &Path) -> DeployResult<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::new();
        for (name, contents) in self.documents() {
            let path = dir.join(name);
            fs::write(&path, contents)?;
            log::info!("wrote {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}

/// Join the step fragments under `STEP n` banners.
///
/// Step 8 replaces step 5 rather than following it, so it is carried
/// commented out.
pub fn composite_script(run: &Run, fragments: &[Fragment]) -> String {
    let mut out = format!(
        "-- Generated SQL Deployment Script for {}\n\
         -- Generated on: {}\n\
         -- Table suffix: {}\n\
         -- Created by: {}\n",
        run.src_table(),
        run.generated_at().format("%Y-%m-%d %H:%M:%S"),
        run.table_suffix(),
        run.config().user_initials.to_uppercase()
    );

    for fragment in fragments {
        out.push('\n');
        out.push_str(BANNER);
        out.push_str(&format!("\n-- {}\n", fragment.step));
        out.push_str(BANNER);
        out.push('\n');
        if fragment.step == Step::QuickHsTable {
            out.push_str("-- Run this block instead of step 5 when the ST job was started\n");
            out.push_str("-- before the HS table existed.\n");
            for line in fragment.sql.lines() {
                if line.is_empty() {
                    out.push_str("--\n");
                } else {
                    out.push_str("-- ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
        } else {
            out.push_str(&fragment.sql);
            if !fragment.sql.ends_with('\n') {
                out.push('\n');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::fixtures::{party, policy, run_of};

    #[test]
    fn test_file_names() {
        let run = run_of(policy());
        assert_eq!(script_file_name(&run), "deploy_POLICY_jdo_20240101_093000.sql");
        assert_eq!(
            fragment_file_name(&run, Step::HsControl),
            "POLICY_jdo_20240101_093000_step3_hs_control.sql"
        );
        assert_eq!(
            parameters_file_name(&run),
            "deploy_params_POLICY_jdo_20240101_093000.json"
        );
        assert_eq!(
            instructions_file_name(&run),
            "deploy_instructions_POLICY_jdo_20240101_093000.md"
        );
    }

    #[test]
    fn test_composite_header_and_order() {
        let artifacts = Artifacts::build(&run_of(policy())).unwrap();
        let script = &artifacts.script.contents;
        assert!(script.starts_with(
            "-- Generated SQL Deployment Script for POLICY\n\
             -- Generated on: 2024-01-01 09:30:00\n\
             -- Table suffix: jdo_20240101_093000\n\
             -- Created by: JDO\n"
        ));

        let positions: Vec<usize> = [1, 2, 3, 4, 5, 8, 9]
            .iter()
            .map(|n| script.find(&format!("-- STEP {}:", n)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(!script.contains("-- STEP 6:"));
        assert!(!script.contains("-- STEP 7:"));
    }

    #[test]
    fn test_quick_hs_table_is_commented() {
        let artifacts = Artifacts::build(&run_of(policy())).unwrap();
        let script = &artifacts.script.contents;
        let start = script.find("-- STEP 8:").unwrap();
        let end = script.find("-- STEP 9:").unwrap();
        let section = &script[start..end];
        assert!(section.contains("-- SELECT * INTO HS.HS_POLICY FROM ST.ST_POLICY WHERE 1 = 0;\n"));
        for line in section.lines().filter(|l| !l.is_empty()) {
            assert!(line.starts_with("--"), "live line in step 8: {}", line);
        }
        // the fragment itself stays runnable
        let fragment = artifacts.fragment(Step::QuickHsTable).unwrap();
        assert!(fragment.sql.lines().any(|l| l.starts_with("SELECT * INTO HS.HS_POLICY")));
    }

    #[test]
    fn test_optional_steps_included() {
        let artifacts = Artifacts::build(&run_of(party())).unwrap();
        assert!(artifacts.fragment(Step::HelperTable).is_some());
        assert!(artifacts.fragment(Step::MainTable).is_some());
        assert!(artifacts.script.contents.contains("-- STEP 6: CREATE HELPER TABLE\n"));
        assert!(artifacts.script.contents.contains("-- STEP 7: CREATE MAIN TABLE\n"));
    }

    #[test]
    fn test_skip_hs_table_drops_steps() {
        let cfg = Configuration {
            skip_hs_table: true,
            ..policy()
        };
        let artifacts = Artifacts::build(&run_of(cfg)).unwrap();
        assert!(artifacts.fragment(Step::HsTable).is_none());
        assert!(artifacts.fragment(Step::QuickHsTable).is_none());
        assert_eq!(artifacts.fragments.len(), 5);
    }

    #[test]
    fn test_documents() {
        let artifacts = Artifacts::build(&run_of(policy())).unwrap();
        let docs = artifacts.documents();
        // script, 7 fragments, 4 pipelines, parameters, instructions
        assert_eq!(docs.len(), 14);
        assert_eq!(docs[0].0, "deploy_POLICY_jdo_20240101_093000.sql");
        assert!(docs
            .iter()
            .any(|(name, _)| *name == "pl_StageAndHistoricStageDailyLoad_POLICY.json"));
    }
}
