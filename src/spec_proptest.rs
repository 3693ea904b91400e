//! Property-based tests for spec parsing.
//!
//! These tests use proptest to generate random specs and verify that
//! invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::spec::PackageSpec;
    use proptest::prelude::*;

    fn segment() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_][a-zA-Z0-9_.-]{0,11}"
    }

    fn path() -> impl Strategy<Value = String> {
        prop::collection::vec(segment(), 1..5).prop_map(|parts| parts.join("/"))
    }

    proptest! {
        /// Property: parse then key recovers org/repo/path exactly
        #[test]
        fn key_round_trips(org in segment(), repo in segment(), path in path(), r in segment()) {
            let raw = format!("{}/{}/{}@{}", org, repo, path, r);
            let spec = PackageSpec::parse(&raw).unwrap();
            prop_assert_eq!(spec.key(), format!("{}/{}/{}", org, repo, path));
            prop_assert_eq!(spec.r#ref, r);
        }

        /// Property: a spec without `@` always pins to main
        #[test]
        fn missing_ref_defaults_to_main(org in segment(), repo in segment(), path in path()) {
            let spec = PackageSpec::parse(&format!("{}/{}/{}", org, repo, path)).unwrap();
            prop_assert_eq!(spec.r#ref.as_str(), "main");
            prop_assert_eq!(spec.path, path);
        }

        /// Property: exactly one trailing `.md` is stripped from the name
        #[test]
        fn name_strips_exactly_one_md(org in segment(), repo in segment(), stem in segment()) {
            let spec = PackageSpec::parse(&format!("{}/{}/agents/{}.md", org, repo, stem)).unwrap();
            prop_assert_eq!(spec.name(), stem);
        }

        /// Property: the name is always the last path segment minus `.md`
        #[test]
        fn name_is_last_segment(org in segment(), repo in segment(), path in path()) {
            let spec = PackageSpec::parse(&format!("{}/{}/{}", org, repo, path)).unwrap();
            let last = path.rsplit('/').next().unwrap();
            prop_assert_eq!(spec.name(), last.strip_suffix(".md").unwrap_or(last));
        }

        /// Property: fewer than three segments is always rejected
        #[test]
        fn short_specs_are_rejected(org in segment(), repo in segment()) {
            prop_assert!(PackageSpec::parse(&org).is_err());
            let two = format!("{}/{}", org, repo);
            prop_assert!(PackageSpec::parse(&two).is_err());
        }

        /// Property: a `.` or `..` component anywhere in the path is rejected
        #[test]
        fn dot_segments_are_rejected(
            org in segment(),
            repo in segment(),
            path in path(),
            dots in prop::sample::select(vec![".", ".."]),
            before in any::<bool>(),
        ) {
            let raw = if before {
                format!("{}/{}/{}/{}", org, repo, dots, path)
            } else {
                format!("{}/{}/{}/{}", org, repo, path, dots)
            };
            prop_assert!(PackageSpec::parse(&raw).is_err());
        }

        /// Property: parsing never panics
        #[test]
        fn parse_never_panics(input in ".*") {
            let _ = PackageSpec::parse(&input);
        }
    }
}
