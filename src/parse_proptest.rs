//! Property-based tests for declaration parsing and link expansion.
//!
//! These tests use proptest to generate declarations and check that the
//! parser, combinator, defaulting passes and moot-link filter keep their
//! invariants for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::file::{FileRef, Repo};
    use crate::link::Link;
    use crate::links::{combine, filter};
    use crate::parse::parse_string;
    use proptest::prelude::*;

    fn token() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_-]{1,8}"
    }

    fn path() -> impl Strategy<Value = String> {
        "[a-z0-9_]{1,6}(/[a-z0-9_]{1,6}){0,2}\\.txt"
    }

    fn file() -> impl Strategy<Value = FileRef> {
        (token(), token(), path(), token())
            .prop_map(|(owner, repo, path, r#ref)| FileRef::new(Repo::new(owner, repo), path, r#ref))
    }

    /// A file where every field may be empty.
    fn partial_file() -> impl Strategy<Value = FileRef> {
        ("[a-z]{0,2}", "[a-z]{0,2}", "([a-z]{1,3}\\.txt)?").prop_map(|(owner, repo, path)| {
            FileRef::new(Repo::new(owner, repo), path, "")
        })
    }

    fn partial_link() -> impl Strategy<Value = Link> {
        (partial_file(), partial_file()).prop_map(|(from, to)| Link::new(from, to))
    }

    fn fields(file: &FileRef) -> (String, String, String, String) {
        (
            file.repo.owner.clone(),
            file.repo.repo.clone(),
            file.path.clone(),
            file.r#ref.clone(),
        )
    }

    fn default_and_mirror(link: Link, default: &Link) -> Link {
        link.fill_defaults(default).fill_missing()
    }

    // ============================================================================
    // parse_string property tests
    // ============================================================================

    proptest! {
        /// Property: `owner/repo:path@ref` yields exactly the encoded fields
        #[test]
        fn repo_path_ref_form_round_trips(want in file()) {
            let s = format!("{}/{}:{}@{}", want.repo.owner, want.repo.repo, want.path, want.r#ref);
            prop_assert_eq!(fields(&parse_string(&s)), fields(&want));
        }

        /// Property: `owner/repo:path` leaves the ref empty
        #[test]
        fn repo_path_form_round_trips(want in file()) {
            let s = format!("{}/{}:{}", want.repo.owner, want.repo.repo, want.path);
            let got = parse_string(&s);
            prop_assert_eq!(fields(&got), fields(&want.at("")));
        }

        /// Property: blob paths and blob URLs yield exactly the encoded fields
        #[test]
        fn blob_forms_round_trip(want in file()) {
            let blob = format!("{}/{}/blob/{}/{}", want.repo.owner, want.repo.repo, want.r#ref, want.path);
            let url = format!("https://github.com/{}", blob);

            prop_assert_eq!(fields(&parse_string(&blob)), fields(&want));
            prop_assert_eq!(fields(&parse_string(&url)), fields(&want));
        }

        /// Property: `owner/repo:@ref` and `owner/repo:` leave the path empty
        #[test]
        fn repo_only_forms_round_trip(want in file()) {
            let with_ref = parse_string(&format!("{}/{}:@{}", want.repo.owner, want.repo.repo, want.r#ref));
            prop_assert_eq!(&with_ref.repo, &want.repo);
            prop_assert_eq!(with_ref.path, "");
            prop_assert_eq!(with_ref.r#ref, want.r#ref);

            let bare = parse_string(&format!("{}/{}:", want.repo.owner, want.repo.repo));
            prop_assert_eq!(&bare.repo, &want.repo);
            prop_assert_eq!(bare.path, "");
            prop_assert_eq!(bare.r#ref, "");
        }

        /// Property: `path@ref` leaves the repository empty
        #[test]
        fn path_ref_form_round_trips(path in path(), r#ref in token()) {
            let got = parse_string(&format!("{}@{}", path, r#ref));
            prop_assert!(got.repo.is_empty());
            prop_assert_eq!(got.path, path);
            prop_assert_eq!(got.r#ref, r#ref);
        }

        /// Property: strings matching no form become the path, verbatim
        #[test]
        fn fallback_keeps_whole_string(s in "[^@:/]*") {
            let got = parse_string(&s);
            prop_assert!(got.repo.is_empty());
            prop_assert_eq!(got.path, s);
            prop_assert_eq!(got.r#ref, "");
        }
    }

    // ============================================================================
    // combine property tests
    // ============================================================================

    proptest! {
        /// Property: the link count is max(|F|, 1) * max(|T|, 1)
        #[test]
        fn combine_count(
            froms in prop::collection::vec(file(), 0..4),
            tos in prop::collection::vec(file(), 0..4),
        ) {
            let links = combine(&froms, &tos);
            let want = if froms.is_empty() && tos.is_empty() {
                0
            } else {
                froms.len().max(1) * tos.len().max(1)
            };
            prop_assert_eq!(links.len(), want);
        }

        /// Property: links are ordered sources first, destinations second
        #[test]
        fn combine_is_from_major(
            froms in prop::collection::vec(file(), 1..4),
            tos in prop::collection::vec(file(), 1..4),
        ) {
            let links = combine(&froms, &tos);
            for (i, from) in froms.iter().enumerate() {
                for (j, to) in tos.iter().enumerate() {
                    let link = &links[i * tos.len() + j];
                    prop_assert_eq!(&link.from, from);
                    prop_assert_eq!(&link.to, to);
                }
            }
        }

        /// Property: a missing side is blank in every link
        #[test]
        fn combine_blanks_missing_side(tos in prop::collection::vec(file(), 1..4)) {
            for (link, to) in combine(&[], &tos).iter().zip(&tos) {
                prop_assert_eq!(&link.from, &FileRef::default());
                prop_assert_eq!(&link.to, to);
            }
        }
    }

    // ============================================================================
    // defaulting property tests
    // ============================================================================

    proptest! {
        /// Property: both defaulting passes together are idempotent
        #[test]
        fn defaulting_is_idempotent(link in partial_link(), default in partial_link()) {
            let once = default_and_mirror(link, &default);
            let twice = default_and_mirror(once.clone(), &default);
            prop_assert_eq!(fields(&once.from), fields(&twice.from));
            prop_assert_eq!(fields(&once.to), fields(&twice.to));
        }

        /// Property: set fields are never replaced, empty ones take the default
        #[test]
        fn defaulting_keeps_own_values(link in partial_link(), default in partial_link()) {
            let got = default_and_mirror(link.clone(), &default);

            let want_from_repo = if link.from.repo.is_empty() { &default.from.repo } else { &link.from.repo };
            prop_assert_eq!(&got.from.repo, want_from_repo);
            let want_from_path = if link.from.path.is_empty() { &default.from.path } else { &link.from.path };
            prop_assert_eq!(&got.from.path, want_from_path);

            if !link.to.repo.is_empty() {
                prop_assert_eq!(&got.to.repo, &link.to.repo);
            }
            if !link.to.path.is_empty() {
                prop_assert_eq!(&got.to.path, &link.to.path);
            }
        }

        /// Property: a field set by any contributor stays set
        #[test]
        fn defaulting_never_empties(link in partial_link(), default in partial_link()) {
            let got = default_and_mirror(link.clone(), &default);

            let from_repo_set = !link.from.repo.is_empty() || !default.from.repo.is_empty();
            let from_path_set = !link.from.path.is_empty() || !default.from.path.is_empty();
            prop_assert_eq!(!got.from.repo.is_empty(), from_repo_set);
            prop_assert_eq!(!got.from.path.is_empty(), from_path_set);

            if from_repo_set || !link.to.repo.is_empty() || !default.to.repo.is_empty() {
                prop_assert!(!got.to.repo.is_empty());
            }
            if from_path_set || !link.to.path.is_empty() || !default.to.path.is_empty() {
                prop_assert!(!got.to.path.is_empty());
            }
        }
    }

    // ============================================================================
    // filter property tests
    // ============================================================================

    proptest! {
        /// Property: no moot link survives, and survivors keep their order
        #[test]
        fn filter_drops_moot_links_in_order(
            pairs in prop::collection::vec((0usize..3, 0usize..3), 0..10),
        ) {
            let pool: Vec<FileRef> = (0..3)
                .map(|i| FileRef::new(Repo::new("o", "r"), format!("{}.txt", i), ""))
                .collect();
            let links: Vec<Link> = pairs
                .iter()
                .map(|&(f, t)| Link::new(pool[f].clone(), pool[t].clone()))
                .collect();

            let (kept, moot) = filter(links.clone());

            prop_assert!(kept.iter().all(|l| !l.is_moot()));
            prop_assert!(moot.iter().all(|l| l.is_moot()));
            prop_assert_eq!(kept.len() + moot.len(), links.len());

            let want: Vec<Link> = links.into_iter().filter(|l| l.from != l.to).collect();
            prop_assert_eq!(kept, want);
        }
    }
}
