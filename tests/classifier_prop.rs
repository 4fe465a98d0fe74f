//! Property tests for the payload classifier.

use proptest::prelude::*;

use shacl_kernel::router::is_query;
use shacl_kernel::sparql::QUERY_STARTERS;

proptest! {
    #[test]
    fn any_starter_in_any_case_classifies_as_query(
        index in 0..QUERY_STARTERS.len(),
        upper in proptest::collection::vec(any::<bool>(), 10),
        rest in "[ \\t][a-zA-Z0-9 ?{}.]{0,40}",
        pad in "[ \\t\\n]{0,5}",
    ) {
        let keyword: String = QUERY_STARTERS[index]
            .chars()
            .enumerate()
            .map(|(position, ch)| {
                if *upper.get(position).unwrap_or(&true) {
                    ch.to_ascii_uppercase()
                } else {
                    ch.to_ascii_lowercase()
                }
            })
            .collect();
        let payload = format!("{pad}{keyword}{rest}");
        prop_assert!(is_query(&payload));
    }

    #[test]
    fn turtle_prefix_lines_never_classify_as_query(body in "[a-z:<>/# .]{0,60}") {
        let payload = format!("@prefix ex: <http://example.org/> .\n{body}");
        prop_assert!(!is_query(&payload));
    }

    #[test]
    fn classification_is_stable(payload in ".{0,80}") {
        let first = is_query(&payload);
        let second = is_query(&payload);
        prop_assert_eq!(first, second);
    }
}

#[test]
fn empty_payload_is_not_a_query() {
    assert!(!is_query(""));
    assert!(!is_query("   \n\t"));
}
