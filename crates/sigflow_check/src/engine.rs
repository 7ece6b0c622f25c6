//! Checker engine that manages rule registration, configuration, and execution.
//!
//! The `Checker` accepts a `CheckConfig` to control which rules are denied,
//! allowed, or kept at their default severity, then runs every enabled rule
//! over the design.

use std::collections::HashSet;

use sigflow_config::{CheckConfig, WidthPolicy};
use sigflow_diagnostics::{DiagnosticSink, Severity};
use sigflow_ir::Design;

use crate::finding::Finding;
use crate::outcome::{CheckFailure, CheckedDesign};
use crate::rules::register_builtin_rules;
use crate::{CheckContext, CheckRule};

/// Runs check rules and classifies their findings.
pub struct Checker {
    rules: Vec<Box<dyn CheckRule>>,
    /// Rule names or codes promoted to error severity.
    denied: HashSet<String>,
    /// Rule names or codes that are not reported.
    allowed: HashSet<String>,
    width_policy: WidthPolicy,
}

impl Checker {
    /// Creates a checker with every builtin rule, configured by `config`.
    pub fn new(config: &CheckConfig) -> Self {
        let mut checker = Self {
            rules: Vec::new(),
            denied: config.deny.iter().cloned().collect(),
            allowed: config.allow.iter().cloned().collect(),
            width_policy: config.width_policy,
        };
        register_builtin_rules(&mut checker);
        checker
    }

    /// Creates a checker with the default configuration.
    pub fn with_defaults() -> Self {
        Self::new(&CheckConfig::default())
    }

    /// Registers a rule.
    pub fn register(&mut self, rule: Box<dyn CheckRule>) {
        self.rules.push(rule);
    }

    /// Number of registered rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Names of all registered rules.
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Runs every enabled rule and emits one diagnostic per finding to `sink`.
    /// Returns the findings paired with their effective severity.
    pub fn run(&self, design: &Design, sink: &DiagnosticSink) -> Vec<(Finding, Severity)> {
        let cx = CheckContext {
            design,
            width_policy: self.width_policy,
        };
        let mut out = Vec::new();
        for rule in &self.rules {
            if self.matches(&self.allowed, rule.as_ref()) {
                continue;
            }
            let severity = if self.matches(&self.denied, rule.as_ref()) {
                Severity::Error
            } else {
                rule.default_severity()
            };
            for finding in rule.check(&cx) {
                sink.emit(finding.to_diagnostic(design, rule.code(), severity));
                out.push((finding, severity));
            }
        }
        out
    }

    /// Checks `design`, returning it as a [`CheckedDesign`] if no finding
    /// has error severity.
    pub fn check(&self, design: Design) -> Result<CheckedDesign, CheckFailure> {
        let sink = DiagnosticSink::new();
        let findings = self.run(&design, &sink);
        let diagnostics = sink.take_all();
        for diag in diagnostics.iter().filter(|d| !d.severity.is_error()) {
            log::warn!("[{}] {}", diag.code, diag.message);
        }

        let (errors, warnings): (Vec<_>, Vec<_>) =
            findings.into_iter().partition(|(_, sev)| sev.is_error());
        let errors: Vec<Finding> = errors.into_iter().map(|(f, _)| f).collect();
        let warnings: Vec<Finding> = warnings.into_iter().map(|(f, _)| f).collect();
        log::info!(
            "checked '{}': {} error(s), {} warning(s)",
            design.top().path,
            errors.len(),
            warnings.len()
        );

        if errors.is_empty() {
            Ok(CheckedDesign::new(
                design,
                warnings,
                diagnostics,
                self.width_policy,
            ))
        } else {
            for diag in diagnostics.iter().filter(|d| d.severity.is_error()) {
                log::error!("[{}] {}", diag.code, diag.message);
            }
            Err(CheckFailure::new(errors, warnings, diagnostics))
        }
    }

    fn matches(&self, set: &HashSet<String>, rule: &dyn CheckRule) -> bool {
        set.contains(rule.name()) || set.contains(&rule.code().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigflow_diagnostics::{Category, DiagnosticCode};
    use sigflow_ir::{elaborate, Clocking, Expr, Statement};

    struct DummyRule;
    impl CheckRule for DummyRule {
        fn code(&self) -> DiagnosticCode {
            DiagnosticCode::new(Category::Warning, 999)
        }
        fn name(&self) -> &str {
            "dummy-rule"
        }
        fn description(&self) -> &str {
            "a test rule"
        }
        fn default_severity(&self) -> Severity {
            Severity::Warning
        }
        fn check(&self, cx: &CheckContext<'_>) -> Vec<Finding> {
            cx.design
                .signals()
                .filter(|s| s.local_name() == "flagged")
                .map(|s| Finding::KindMismatch {
                    signal: s.id,
                    kind: s.kind,
                    process: None,
                })
                .collect()
        }
    }

    fn flagged_design() -> Design {
        elaborate("top", |top| {
            top.wire("flagged", 1)?;
            Ok(())
        })
        .unwrap()
    }

    fn dummy_checker(config: CheckConfig) -> Checker {
        let mut checker = Checker {
            rules: Vec::new(),
            denied: config.deny.iter().cloned().collect(),
            allowed: config.allow.iter().cloned().collect(),
            width_policy: config.width_policy,
        };
        checker.register(Box::new(DummyRule));
        checker
    }

    #[test]
    fn builtin_rules_are_registered() {
        let checker = Checker::with_defaults();
        assert_eq!(checker.rule_count(), 8);
        let names = checker.rule_names();
        assert!(names.contains(&"multiple-drivers"));
        assert!(names.contains(&"latch-inference"));
    }

    #[test]
    fn warnings_pass_through() {
        let checked = dummy_checker(CheckConfig::default())
            .check(flagged_design())
            .unwrap();
        assert_eq!(checked.warnings().len(), 1);
        assert_eq!(checked.diagnostics().len(), 1);
        assert_eq!(checked.diagnostics()[0].severity, Severity::Warning);
    }

    #[test]
    fn denied_rule_becomes_fatal() {
        let config = CheckConfig {
            deny: vec!["dummy-rule".into()],
            ..CheckConfig::default()
        };
        let failure = dummy_checker(config).check(flagged_design()).unwrap_err();
        assert_eq!(failure.errors.len(), 1);
        assert!(failure.diagnostics[0].severity.is_error());
        assert!(failure.to_string().contains("W999"));
    }

    #[test]
    fn allowed_rule_is_silent_by_code() {
        let config = CheckConfig {
            allow: vec!["W999".into()],
            ..CheckConfig::default()
        };
        let checked = dummy_checker(config).check(flagged_design()).unwrap();
        assert!(checked.warnings().is_empty());
        assert!(checked.diagnostics().is_empty());
    }

    #[test]
    fn clean_design_has_no_findings() {
        let design = elaborate("top", |top| {
            let clk = top.clock("clk", 5)?;
            let q = top.register("q", 1)?;
            top.clocked(
                "ff",
                Clocking::rising(clk),
                &[q],
                Statement::assign(q, Expr::not(q.into())),
            )?;
            Ok(())
        })
        .unwrap();
        let checked = Checker::with_defaults().check(design).unwrap();
        assert!(checked.warnings().is_empty());
        assert_eq!(checked.width_policy(), WidthPolicy::Strict);
    }
}
