//! Property-based tests for version ordering, coordinates, cache freshness,
//! grants, and summary parsing

use std::cmp::Ordering;
use std::path::PathBuf;
use std::time::{Duration, UNIX_EPOCH};

use proptest::prelude::*;
use regex_harness::module::{check_grants, ModuleRef};
use regex_harness::resolver::{
    compare_versions, select_version, CacheEntry, Coordinate, ResolvedArtifact, VersionSelector,
};
use regex_harness::testing::SummaryParser;

fn version_strategy() -> impl Strategy<Value = String> {
    "[0-9]{1,3}(\\.[0-9]{1,3}){0,3}(-(alpha|beta|rc|SNAPSHOT|sp|final)[0-9]?)?"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_version_order_is_antisymmetric(a in version_strategy(), b in version_strategy()) {
        prop_assert_eq!(compare_versions(&a, &b), compare_versions(&b, &a).reverse());
    }

    #[test]
    fn prop_version_order_is_transitive(
        a in version_strategy(),
        b in version_strategy(),
        c in version_strategy(),
    ) {
        let mut sorted = [a, b, c];
        sorted.sort_by(|x, y| compare_versions(x, y));
        prop_assert_ne!(compare_versions(&sorted[0], &sorted[1]), Ordering::Greater);
        prop_assert_ne!(compare_versions(&sorted[1], &sorted[2]), Ordering::Greater);
        prop_assert_ne!(compare_versions(&sorted[0], &sorted[2]), Ordering::Greater);
    }

    #[test]
    fn prop_numeric_versions_compare_as_padded_tuples(
        a in prop::collection::vec(0u32..50, 1..4),
        b in prop::collection::vec(0u32..50, 1..4),
    ) {
        let render = |parts: &[u32]| {
            parts.iter().map(u32::to_string).collect::<Vec<_>>().join(".")
        };
        let len = a.len().max(b.len());
        let mut padded_a = a.clone();
        let mut padded_b = b.clone();
        padded_a.resize(len, 0);
        padded_b.resize(len, 0);

        prop_assert_eq!(compare_versions(&render(&a), &render(&b)), padded_a.cmp(&padded_b));
    }

    #[test]
    fn prop_latest_selects_a_maximum(versions in prop::collection::vec(version_strategy(), 1..8)) {
        let chosen = select_version(versions.iter().map(String::as_str), &VersionSelector::Latest)
            .unwrap();
        for version in &versions {
            prop_assert_ne!(compare_versions(chosen, version), Ordering::Less);
        }
    }

    #[test]
    fn prop_prefix_selection_respects_prefix(
        versions in prop::collection::vec(version_strategy(), 0..8),
        major in 0u32..10,
    ) {
        let selector = VersionSelector::parse(&format!("{}.+", major)).unwrap();
        let prefix = format!("{}.", major);
        match select_version(versions.iter().map(String::as_str), &selector) {
            Some(chosen) => prop_assert!(chosen.starts_with(&prefix)),
            None => prop_assert!(versions.iter().all(|v| !v.starts_with(&prefix))),
        }
    }

    #[test]
    fn prop_coordinate_display_reparses(
        group in "[a-z]{1,8}(\\.[a-z]{1,8}){0,2}",
        name in "[A-Za-z][A-Za-z0-9-]{0,10}",
        version in prop_oneof![
            version_strategy(),
            Just("+".to_string()),
            (0u32..10).prop_map(|m| format!("{}.+", m)),
        ],
    ) {
        let notation = format!("{}:{}:{}", group, name, version);
        let coordinate = Coordinate::parse(&notation).unwrap();
        prop_assert_eq!(coordinate.to_string(), notation.clone());
        prop_assert_eq!(Coordinate::parse(&coordinate.to_string()).unwrap(), coordinate);
    }

    #[test]
    fn prop_freshness_is_strict_age_bound(
        start in 1_000_000u64..2_000_000_000,
        age in 0u64..10_000,
        window in 0u64..10_000,
    ) {
        let artifact = ResolvedArtifact {
            coordinate: "syspro.tm:RegexApp:+".to_string(),
            version: "1.0".to_string(),
            path: PathBuf::from("/nonexistent/RegexApp-1.0.jar"),
            repository: "local".to_string(),
            sha256: String::new(),
        };
        let resolved_at = UNIX_EPOCH + Duration::from_secs(start);
        let entry = CacheEntry::new(artifact, resolved_at);
        let now = resolved_at + Duration::from_secs(age);
        prop_assert_eq!(entry.is_fresh(now, Duration::from_secs(window)), age < window);
    }

    #[test]
    fn prop_grant_names_exactly_its_module(
        module in "[a-z][a-z0-9_]{0,6}(\\.[A-Za-z][A-Za-z0-9_]{0,6}){0,3}",
    ) {
        let module = ModuleRef::new(module).unwrap();
        let flag = module.native_access_grant().to_flag();
        prop_assert_eq!(flag.clone(), format!("--enable-native-access={}", module));
        prop_assert!(check_grants(&module, &[flag]).is_ok());

        let other = ModuleRef::new(format!("{}.other", module)).unwrap();
        prop_assert!(check_grants(&other, &[module.native_access_grant().to_flag()]).is_err());
    }

    #[test]
    fn prop_summary_counts_survive_parsing(
        found in 0u64..10_000,
        failed in 0u64..100,
        containers_failed in 0u64..10,
    ) {
        let output = format!(
            "[{:>10} tests found           ]\n[{:>10} tests failed          ]\n[{:>10} containers failed     ]\n",
            found, failed, containers_failed
        );
        let mut parser = SummaryParser::new();
        for line in output.lines() {
            parser.feed(line);
        }
        let summary = parser.finish().unwrap();
        prop_assert_eq!(summary.tests_found, found);
        prop_assert_eq!(summary.tests_failed, failed);
        prop_assert_eq!(summary.containers_failed, containers_failed);
        prop_assert_eq!(summary.is_clean(), failed == 0 && containers_failed == 0);
    }
}
