// src/strategy.rs

//! Packaging strategies and the selector that orders them.
//!
//! One run attempts each strategy at most once, in priority order: the
//! external packaging CLI, then manual staged assembly, then a rescue
//! script. A strategy reports its result as a tagged [`Outcome`] rather
//! than letting errors escape, so the selector is a plain state machine
//! instead of nested error handlers. Only invalid metadata is fatal, and
//! that is rejected before the selector ever runs.

use crate::archive;
use crate::error::Error;
use crate::metadata::ExtensionMetadata;
use crate::staging::StagingPlan;
use crate::tool::{self, ToolCommand};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Last-resort packaging script, run through `sh` when present.
pub const RESCUE_SCRIPT: &str = "scripts/package.sh";

/// Everything a strategy needs: the extension root and its metadata.
/// Paths are threaded explicitly; no strategy changes the process working
/// directory.
pub struct PackageContext {
    pub root: PathBuf,
    pub metadata: ExtensionMetadata,
}

impl PackageContext {
    pub fn new(root: PathBuf, metadata: ExtensionMetadata) -> Self {
        Self { root, metadata }
    }

    /// Where the finished archive lands.
    pub fn output_path(&self) -> PathBuf {
        self.root.join(self.metadata.output_name())
    }
}

/// Result of one strategy attempt.
pub enum Outcome {
    /// Archive produced and verified at this path.
    Success(PathBuf),
    /// This strategy cannot deliver; the selector moves on.
    Retry(String),
    /// No strategy can deliver; the run aborts.
    Fatal(Error),
}

/// One complete method of producing the output archive.
pub trait PackagingStrategy {
    fn name(&self) -> &'static str;
    fn attempt(&self, ctx: &PackageContext) -> Outcome;
}

/// Primary: the `vsce` packaging CLI, preferring a global install and
/// falling back to a locally resolved `npx vsce`.
pub struct VsceStrategy;

impl VsceStrategy {
    fn invoke(&self, ctx: &PackageContext) -> Result<(), String> {
        if let Some(vsce) = tool::resolve("vsce") {
            match ToolCommand::new(vsce)
                .arg("package")
                .current_dir(&ctx.root)
                .run("vsce")
            {
                Ok(()) => return Ok(()),
                Err(err) => warn!("global vsce failed: {}", err),
            }
        }

        match tool::resolve("npx") {
            Some(npx) => ToolCommand::new(npx)
                .args(["vsce", "package"])
                .current_dir(&ctx.root)
                .run("npx vsce")
                .map_err(|err| err.to_string()),
            None => Err("vsce not found globally and npx is unavailable".to_string()),
        }
    }
}

impl PackagingStrategy for VsceStrategy {
    fn name(&self) -> &'static str {
        "vsce"
    }

    fn attempt(&self, ctx: &PackageContext) -> Outcome {
        if let Err(reason) = self.invoke(ctx) {
            return Outcome::Retry(reason);
        }

        let output = ctx.output_path();
        if !output.is_file() {
            return Outcome::Retry(format!(
                "{} missing after vsce run",
                ctx.metadata.output_name()
            ));
        }
        match archive::verify(&output, &ctx.metadata.name) {
            Ok(()) => Outcome::Success(output),
            Err(err) => Outcome::Retry(err.to_string()),
        }
    }
}

/// Fallback: staged manual assembly plus archive construction.
pub struct ManualStrategy;

impl ManualStrategy {
    fn package(&self, ctx: &PackageContext) -> crate::Result<PathBuf> {
        let plan = StagingPlan::assemble(&ctx.root, &ctx.metadata)?;
        let staging = plan.materialize()?;

        let output = ctx.output_path();
        let built = archive::build(staging.path(), &output)
            .and_then(|_| archive::verify(&output, &ctx.metadata.name));
        // staging drops here, success or not

        match built {
            Ok(()) => Ok(output),
            Err(err) => {
                if output.exists() {
                    let _ = fs::remove_file(&output);
                }
                Err(err)
            }
        }
    }
}

impl PackagingStrategy for ManualStrategy {
    fn name(&self) -> &'static str {
        "manual"
    }

    fn attempt(&self, ctx: &PackageContext) -> Outcome {
        match self.package(ctx) {
            Ok(path) => Outcome::Success(path),
            // Strategy boundary policy: everything is recoverable except
            // invalid metadata, which no later strategy can fix.
            Err(err @ Error::Config(_)) => Outcome::Fatal(err),
            Err(err) => Outcome::Retry(err.to_string()),
        }
    }
}

/// Last resort: an external packaging script shipped with the extension.
pub struct ScriptStrategy;

impl PackagingStrategy for ScriptStrategy {
    fn name(&self) -> &'static str {
        "rescue script"
    }

    fn attempt(&self, ctx: &PackageContext) -> Outcome {
        let script = ctx.root.join(RESCUE_SCRIPT);
        if !script.is_file() {
            return Outcome::Retry(format!("no rescue script at {}", RESCUE_SCRIPT));
        }
        let Some(sh) = tool::resolve("sh") else {
            return Outcome::Retry("sh is unavailable".to_string());
        };

        if let Err(err) = ToolCommand::new(sh)
            .arg(&script)
            .current_dir(&ctx.root)
            .run("rescue script")
        {
            return Outcome::Retry(err.to_string());
        }

        let output = ctx.output_path();
        if output.is_file() {
            Outcome::Success(output)
        } else {
            Outcome::Retry(format!(
                "{} missing after rescue script",
                ctx.metadata.output_name()
            ))
        }
    }
}

/// Attempts strategies in order until one succeeds.
pub struct Selector {
    strategies: Vec<Box<dyn PackagingStrategy>>,
}

impl Selector {
    /// The standard order: vsce, manual assembly, rescue script.
    pub fn standard() -> Self {
        Self {
            strategies: vec![
                Box::new(VsceStrategy),
                Box::new(ManualStrategy),
                Box::new(ScriptStrategy),
            ],
        }
    }

    pub fn with_strategies(strategies: Vec<Box<dyn PackagingStrategy>>) -> Self {
        Self { strategies }
    }

    /// Run the state machine. Each strategy is attempted at most once.
    pub fn run(&self, ctx: &PackageContext) -> crate::Result<PathBuf> {
        let mut attempted = Vec::new();
        for strategy in &self.strategies {
            info!("attempting {} strategy", strategy.name());
            match strategy.attempt(ctx) {
                Outcome::Success(path) => {
                    info!("{} strategy produced {}", strategy.name(), path.display());
                    return Ok(path);
                }
                Outcome::Retry(reason) => {
                    warn!("{} strategy failed: {}", strategy.name(), reason);
                    attempted.push(strategy.name());
                }
                Outcome::Fatal(err) => return Err(err),
            }
        }
        Err(Error::StrategiesExhausted(attempted.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashSet;
    use std::rc::Rc;

    fn fixture_context() -> (tempfile::TempDir, PackageContext) {
        let root = tempfile::tempdir().unwrap();
        let manifest = r#"{
            "name": "terrarium-theme",
            "version": "1.2.0",
            "publisher": "acme",
            "keywords": ["dark", "theme"]
        }"#;
        fs::write(root.path().join("package.json"), manifest).unwrap();
        fs::write(root.path().join("README.md"), "# Terrarium").unwrap();
        fs::write(root.path().join("LICENSE"), "MIT").unwrap();
        fs::write(root.path().join("icon.png"), [0x89]).unwrap();
        fs::create_dir(root.path().join("themes")).unwrap();
        fs::write(root.path().join("themes/dark.json"), "{}").unwrap();

        let metadata = ExtensionMetadata::parse(manifest).unwrap();
        let ctx = PackageContext::new(root.path().to_path_buf(), metadata);
        (root, ctx)
    }

    struct ScriptedStrategy {
        label: &'static str,
        outcome: Box<dyn Fn() -> Outcome>,
        attempts: Rc<Cell<u32>>,
    }

    impl ScriptedStrategy {
        fn new(label: &'static str, outcome: impl Fn() -> Outcome + 'static) -> Self {
            Self {
                label,
                outcome: Box::new(outcome),
                attempts: Rc::new(Cell::new(0)),
            }
        }

        fn counter(&self) -> Rc<Cell<u32>> {
            Rc::clone(&self.attempts)
        }
    }

    impl PackagingStrategy for ScriptedStrategy {
        fn name(&self) -> &'static str {
            self.label
        }

        fn attempt(&self, _ctx: &PackageContext) -> Outcome {
            self.attempts.set(self.attempts.get() + 1);
            (self.outcome)()
        }
    }

    #[test]
    fn test_selector_stops_at_first_success() {
        let (_root, ctx) = fixture_context();
        let selector = Selector::with_strategies(vec![
            Box::new(ScriptedStrategy::new("first", || {
                Outcome::Success(PathBuf::from("out.vsix"))
            })),
            Box::new(ScriptedStrategy::new("second", || {
                panic!("second strategy must not run")
            })),
        ]);

        let path = selector.run(&ctx).unwrap();
        assert_eq!(path, PathBuf::from("out.vsix"));
    }

    #[test]
    fn test_selector_reports_exhaustion_with_attempted_names() {
        let (_root, ctx) = fixture_context();
        let selector = Selector::with_strategies(vec![
            Box::new(ScriptedStrategy::new("alpha", || {
                Outcome::Retry("nope".to_string())
            })),
            Box::new(ScriptedStrategy::new("beta", || {
                Outcome::Retry("still no".to_string())
            })),
        ]);

        let err = selector.run(&ctx).unwrap_err();
        assert!(matches!(err, Error::StrategiesExhausted(_)));
        let message = err.to_string();
        assert!(message.contains("alpha"));
        assert!(message.contains("beta"));
    }

    #[test]
    fn test_selector_fatal_short_circuits() {
        let (_root, ctx) = fixture_context();
        let selector = Selector::with_strategies(vec![
            Box::new(ScriptedStrategy::new("fatal", || {
                Outcome::Fatal(Error::Config("bad metadata".to_string()))
            })),
            Box::new(ScriptedStrategy::new("after", || {
                panic!("strategy after fatal must not run")
            })),
        ]);

        let err = selector.run(&ctx).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_each_strategy_attempted_at_most_once() {
        let (_root, ctx) = fixture_context();
        let first = ScriptedStrategy::new("alpha", || Outcome::Retry("no".to_string()));
        let second = ScriptedStrategy::new("beta", || Outcome::Retry("no".to_string()));
        let first_count = first.counter();
        let second_count = second.counter();
        let selector = Selector::with_strategies(vec![Box::new(first), Box::new(second)]);

        let err = selector.run(&ctx).unwrap_err();
        assert!(matches!(err, Error::StrategiesExhausted(_)));
        assert_eq!(first_count.get(), 1);
        assert_eq!(second_count.get(), 1);
    }

    #[test]
    fn test_manual_strategy_packages_fixture() {
        let (_root, ctx) = fixture_context();
        let outcome = ManualStrategy.attempt(&ctx);

        let Outcome::Success(path) = outcome else {
            panic!("manual strategy should succeed on a complete fixture");
        };
        assert_eq!(path, ctx.output_path());

        let names: HashSet<String> = archive::entry_names(&path).unwrap().into_iter().collect();
        assert!(names.contains("extension.vsixmanifest"));
        assert!(names.contains("themes/dark.json"));
    }

    #[test]
    fn test_manual_strategy_retries_without_themes() {
        let (root, ctx) = fixture_context();
        fs::remove_dir_all(root.path().join("themes")).unwrap();

        let outcome = ManualStrategy.attempt(&ctx);
        assert!(matches!(outcome, Outcome::Retry(_)));
        assert!(!ctx.output_path().exists());
    }

    #[test]
    fn test_script_strategy_not_configured() {
        let (_root, ctx) = fixture_context();
        let outcome = ScriptStrategy.attempt(&ctx);

        let Outcome::Retry(reason) = outcome else {
            panic!("script strategy without a script should retry");
        };
        assert!(reason.contains(RESCUE_SCRIPT));
    }

    #[test]
    fn test_script_strategy_succeeds_when_script_creates_output() {
        let (root, ctx) = fixture_context();
        fs::create_dir(root.path().join("scripts")).unwrap();
        fs::write(
            root.path().join(RESCUE_SCRIPT),
            "#!/bin/sh\ntouch terrarium-theme-1.2.0.vsix\n",
        )
        .unwrap();

        let outcome = ScriptStrategy.attempt(&ctx);
        assert!(matches!(outcome, Outcome::Success(_)));
        assert!(ctx.output_path().is_file());
    }

    #[test]
    fn test_script_strategy_retries_when_output_missing() {
        let (root, ctx) = fixture_context();
        fs::create_dir(root.path().join("scripts")).unwrap();
        fs::write(root.path().join(RESCUE_SCRIPT), "#!/bin/sh\nexit 0\n").unwrap();

        let outcome = ScriptStrategy.attempt(&ctx);
        assert!(matches!(outcome, Outcome::Retry(_)));
    }
}
