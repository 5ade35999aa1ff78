//! Per-dependency update decision
//!
//! Given an update checker for one dependency, decides whether the dependency
//! is skipped or updated and with which unlock scope. Every step is reported
//! to a `Reporter` as it is taken.

use crate::domain::{Dependency, SkipReason, UnlockDecision, UnlockScope, UpdateResult};
use crate::ecosystem::UpdateChecker;
use crate::error::AppError;
use crate::output::{Reporter, RunEvent};

/// Position of a dependency within the check loop (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckPosition {
    /// Index of the dependency, starting at 1
    pub index: usize,
    /// Number of dependencies checked in the run
    pub total: usize,
}

/// Probe the checker for the least disruptive unlock scope
///
/// When requirements cannot be unlocked only `None` is tried; otherwise
/// `Own` is tried before `All`.
pub fn unlock_decision(checker: &dyn UpdateChecker) -> Result<UnlockDecision, AppError> {
    if !checker.requirements_unlocked_or_can_be() {
        return Ok(if checker.can_update(UnlockScope::None)? {
            UnlockDecision::Unlock(UnlockScope::None)
        } else {
            UnlockDecision::UpdateNotPossible
        });
    }

    for scope in UnlockScope::UNLOCKING_ORDER {
        if checker.can_update(scope)? {
            return Ok(UnlockDecision::Unlock(scope));
        }
    }
    Ok(UnlockDecision::UpdateNotPossible)
}

/// Decide what happens to `dependency`
///
/// Returns `UpdateResult::Update` carrying the dependencies to append to the
/// run's update collection, or `UpdateResult::Skip` with the reason.
/// Checker failures propagate.
pub fn decide(
    dependency: &Dependency,
    checker: &dyn UpdateChecker,
    position: CheckPosition,
    security_updates_only: bool,
    reporter: &dyn Reporter,
) -> Result<UpdateResult, AppError> {
    let vulnerable = checker.vulnerable();
    reporter.report(&RunEvent::DependencyStarted {
        name: &dependency.name,
        version: dependency.version.as_deref(),
        vulnerable,
    });
    reporter.report(&RunEvent::CheckingForUpdates {
        index: position.index,
        total: position.total,
    });
    let latest = checker.latest_version();
    reporter.report(&RunEvent::LatestVersion {
        version: latest.as_deref(),
    });

    if security_updates_only && !vulnerable {
        let version_known = checker.version_known();
        reporter.report(&RunEvent::NotVulnerable { version_known });
        return Ok(UpdateResult::skip(
            dependency.clone(),
            SkipReason::NotVulnerable { version_known },
        ));
    }

    if vulnerable {
        let fix = checker.lowest_security_fix_version();
        reporter.report(&RunEvent::SecurityFix {
            version: fix.as_deref(),
        });
    }

    if checker.up_to_date() {
        reporter.report(&RunEvent::UpToDate);
        return Ok(UpdateResult::skip(dependency.clone(), SkipReason::UpToDate));
    }

    let target_version = if vulnerable {
        checker.lowest_resolvable_security_fix_version()
    } else {
        checker.latest_resolvable_version()
    };
    reporter.report(&RunEvent::LatestAllowedVersion {
        version: target_version
            .as_deref()
            .or(dependency.version.as_deref()),
    });

    let decision = unlock_decision(checker)?;
    reporter.report(&RunEvent::Unlock(decision));
    if let Some(strategy) = checker.requirements_update_strategy() {
        reporter.report(&RunEvent::Strategy(strategy));
    }

    let scope = match decision {
        UnlockDecision::Unlock(scope) => scope,
        UnlockDecision::UpdateNotPossible => {
            let security = vulnerable || security_updates_only;
            let conflicts = checker.conflicting_dependencies();
            reporter.report(&RunEvent::UpdateNotPossible { security });
            reporter.report(&RunEvent::Conflicts(&conflicts));
            return Ok(UpdateResult::skip(
                dependency.clone(),
                SkipReason::UpdateNotPossible {
                    security,
                    conflicts,
                },
            ));
        }
    };

    let updated = checker.updated_dependencies(scope)?;
    log::debug!(
        "{} updates {} dependencies with unlock {}",
        dependency.name,
        updated.len(),
        scope
    );
    Ok(UpdateResult::Update {
        dependency: dependency.clone(),
        target_version,
        scope,
        updated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConflictingDependency, RequirementsUpdateStrategy};
    use std::sync::Mutex;

    /// Checker answering from fixed values
    struct StubChecker {
        dependency: Dependency,
        vulnerable: bool,
        version_known: bool,
        up_to_date: bool,
        unlockable: bool,
        allowed: Vec<UnlockScope>,
        conflicts: Vec<ConflictingDependency>,
        strategy: Option<RequirementsUpdateStrategy>,
        probed: Mutex<Vec<UnlockScope>>,
    }

    impl StubChecker {
        fn new() -> Self {
            Self {
                dependency: Dependency::new("serde", Some("1.0.0".to_string()), "cargo"),
                vulnerable: false,
                version_known: true,
                up_to_date: false,
                unlockable: true,
                allowed: vec![UnlockScope::Own, UnlockScope::All],
                conflicts: Vec::new(),
                strategy: None,
                probed: Mutex::new(Vec::new()),
            }
        }
    }

    impl UpdateChecker for StubChecker {
        fn dependency(&self) -> &Dependency {
            &self.dependency
        }
        fn vulnerable(&self) -> bool {
            self.vulnerable
        }
        fn version_known(&self) -> bool {
            self.version_known
        }
        fn latest_version(&self) -> Option<String> {
            Some("1.2.0".to_string())
        }
        fn lowest_security_fix_version(&self) -> Option<String> {
            Some("1.0.1".to_string())
        }
        fn up_to_date(&self) -> bool {
            self.up_to_date
        }
        fn latest_resolvable_version(&self) -> Option<String> {
            Some("1.2.0".to_string())
        }
        fn lowest_resolvable_security_fix_version(&self) -> Option<String> {
            Some("1.0.1".to_string())
        }
        fn requirements_unlocked_or_can_be(&self) -> bool {
            self.unlockable
        }
        fn can_update(&self, scope: UnlockScope) -> Result<bool, AppError> {
            self.probed.lock().unwrap().push(scope);
            Ok(self.allowed.contains(&scope))
        }
        fn conflicting_dependencies(&self) -> Vec<ConflictingDependency> {
            self.conflicts.clone()
        }
        fn updated_dependencies(&self, _scope: UnlockScope) -> Result<Vec<Dependency>, AppError> {
            Ok(vec![self.dependency.updated_to(
                self.latest_resolvable_version().unwrap_or_default(),
                vec![],
            )])
        }
        fn requirements_update_strategy(&self) -> Option<RequirementsUpdateStrategy> {
            self.strategy
        }
    }

    /// Reporter recording event debug strings
    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl Reporter for Recorder {
        fn report(&self, event: &RunEvent<'_>) {
            self.0.lock().unwrap().push(format!("{:?}", event));
        }
    }

    impl Recorder {
        fn contains(&self, needle: &str) -> bool {
            self.0.lock().unwrap().iter().any(|e| e.contains(needle))
        }
    }

    const FIRST: CheckPosition = CheckPosition { index: 1, total: 1 };

    fn run(checker: &StubChecker, security_only: bool) -> (UpdateResult, Recorder) {
        let recorder = Recorder::default();
        let result = decide(
            &checker.dependency,
            checker,
            FIRST,
            security_only,
            &recorder,
        )
        .unwrap();
        (result, recorder)
    }

    #[test]
    fn test_up_to_date_is_skipped() {
        let mut checker = StubChecker::new();
        checker.up_to_date = true;
        let (result, recorder) = run(&checker, false);
        assert_eq!(result.skip_reason(), Some(&SkipReason::UpToDate));
        assert!(result.updated_dependencies().is_empty());
        assert!(recorder.contains("UpToDate"));
        assert!(checker.probed.lock().unwrap().is_empty());
    }

    #[test]
    fn test_security_only_not_vulnerable_skips_even_when_outdated() {
        let checker = StubChecker::new();
        let (result, _) = run(&checker, true);
        assert_eq!(
            result.skip_reason(),
            Some(&SkipReason::NotVulnerable {
                version_known: true
            })
        );
    }

    #[test]
    fn test_security_only_reports_unknown_version() {
        let mut checker = StubChecker::new();
        checker.version_known = false;
        let (result, recorder) = run(&checker, true);
        assert_eq!(
            result.skip_reason(),
            Some(&SkipReason::NotVulnerable {
                version_known: false
            })
        );
        assert!(recorder.contains("NotVulnerable { version_known: false }"));
    }

    #[test]
    fn test_own_preferred_over_all() {
        let checker = StubChecker::new();
        let (result, recorder) = run(&checker, false);
        match result {
            UpdateResult::Update { scope, updated, .. } => {
                assert_eq!(scope, UnlockScope::Own);
                assert_eq!(updated.len(), 1);
            }
            other => panic!("expected update, got {:?}", other),
        }
        assert_eq!(*checker.probed.lock().unwrap(), vec![UnlockScope::Own]);
        assert!(recorder.contains("Unlock(Unlock(Own))"));
    }

    #[test]
    fn test_all_when_own_not_possible() {
        let mut checker = StubChecker::new();
        checker.allowed = vec![UnlockScope::All];
        assert_eq!(
            unlock_decision(&checker).unwrap(),
            UnlockDecision::Unlock(UnlockScope::All)
        );
    }

    #[test]
    fn test_not_unlockable_uses_none() {
        let mut checker = StubChecker::new();
        checker.unlockable = false;
        checker.allowed = vec![UnlockScope::None, UnlockScope::Own];
        assert_eq!(
            unlock_decision(&checker).unwrap(),
            UnlockDecision::Unlock(UnlockScope::None)
        );
        assert_eq!(*checker.probed.lock().unwrap(), vec![UnlockScope::None]);
    }

    #[test]
    fn test_not_unlockable_and_none_refused() {
        let mut checker = StubChecker::new();
        checker.unlockable = false;
        checker.allowed = vec![UnlockScope::Own, UnlockScope::All];
        assert_eq!(
            unlock_decision(&checker).unwrap(),
            UnlockDecision::UpdateNotPossible
        );
    }

    #[test]
    fn test_update_not_possible_lists_conflicts() {
        let mut checker = StubChecker::new();
        checker.allowed = vec![];
        checker.conflicts = vec![ConflictingDependency {
            name: "app".to_string(),
            version: None,
            requirement: Some("=1.0.0".to_string()),
            explanation: "app requires serde =1.0.0".to_string(),
        }];
        let (result, recorder) = run(&checker, false);
        match result.skip_reason() {
            Some(SkipReason::UpdateNotPossible {
                security,
                conflicts,
            }) => {
                assert!(!security);
                assert_eq!(conflicts.len(), 1);
            }
            other => panic!("unexpected skip reason {:?}", other),
        }
        assert!(recorder.contains("UpdateNotPossible { security: false }"));
        assert!(recorder.contains("app requires serde =1.0.0"));
    }

    #[test]
    fn test_vulnerable_targets_security_fix() {
        let mut checker = StubChecker::new();
        checker.vulnerable = true;
        let (result, recorder) = run(&checker, true);
        match result {
            UpdateResult::Update { target_version, .. } => {
                assert_eq!(target_version.as_deref(), Some("1.0.1"));
            }
            other => panic!("expected update, got {:?}", other),
        }
        assert!(recorder.contains("SecurityFix { version: Some(\"1.0.1\") }"));
        assert!(recorder.contains("vulnerable: true"));
    }

    #[test]
    fn test_vulnerable_update_not_possible_is_security() {
        let mut checker = StubChecker::new();
        checker.vulnerable = true;
        checker.allowed = vec![];
        let (result, _) = run(&checker, false);
        assert!(matches!(
            result.skip_reason(),
            Some(SkipReason::UpdateNotPossible { security: true, .. })
        ));
    }

    #[test]
    fn test_strategy_reported_when_exposed() {
        let mut checker = StubChecker::new();
        checker.strategy = Some(RequirementsUpdateStrategy::BumpVersions);
        let (_, recorder) = run(&checker, false);
        assert!(recorder.contains("Strategy(BumpVersions)"));

        let checker = StubChecker::new();
        let (_, recorder) = run(&checker, false);
        assert!(!recorder.contains("Strategy("));
    }

    #[test]
    fn test_progress_events() {
        let checker = StubChecker::new();
        let recorder = Recorder::default();
        decide(
            &checker.dependency,
            &checker,
            CheckPosition { index: 3, total: 7 },
            false,
            &recorder,
        )
        .unwrap();
        assert!(recorder.contains("CheckingForUpdates { index: 3, total: 7 }"));
        assert!(recorder.contains("LatestVersion { version: Some(\"1.2.0\") }"));
        assert!(recorder.contains("LatestAllowedVersion { version: Some(\"1.2.0\") }"));
    }
}
