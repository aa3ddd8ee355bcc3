//! Property tests for input normalization.

use proptest::prelude::*;

use atnav_atproto::{Address, AddressError, POST_COLLECTION, is_did};

/// Handles and DIDs as users type them.
fn identifier() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z][a-z0-9-]{0,12}\\.(test|bsky\\.social|example\\.com)",
        "did:plc:[a-z2-7]{24}",
        "did:web:[a-z]{3,10}\\.example",
    ]
}

fn nsid() -> impl Strategy<Value = String> {
    "(app\\.bsky|com\\.example)\\.[a-z]{2,8}\\.[a-z][a-zA-Z]{1,10}"
}

fn rkey() -> impl Strategy<Value = String> {
    prop_oneof!["3[a-z2-7]{12}", Just("self".to_string())]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn post_links_match_at_uris(id in identifier(), key in rkey()) {
        let at_uri = format!("at://{}/{}/{}", id, POST_COLLECTION, key);
        for host in ["https://bsky.app", "https://main.bsky.dev"] {
            let link = format!("{}/profile/{}/post/{}", host, id, key);
            prop_assert_eq!(Address::parse(&link).unwrap(), Address::parse(&at_uri).unwrap());
        }
    }

    #[test]
    fn profile_links_match_bare_identifiers(id in identifier()) {
        let link = format!("https://bsky.app/profile/{}", id);
        prop_assert_eq!(Address::parse(&link).unwrap(), Address::parse(&id).unwrap());
    }

    #[test]
    fn at_prefix_is_optional(id in identifier(), collection in nsid(), key in rkey()) {
        let bare = format!("{}/{}/{}", id, collection, key);
        let prefixed = format!("at://{}", bare);
        prop_assert_eq!(Address::parse(&bare).unwrap(), Address::parse(&prefixed).unwrap());
    }

    #[test]
    fn segments_land_in_order(id in identifier(), collection in nsid(), key in rkey()) {
        let address = Address::parse(&format!("{}/{}/{}", id, collection, key)).unwrap();
        prop_assert_eq!(address.identifier(), Some(id.as_str()));
        prop_assert_eq!(address.collection(), Some(collection.as_str()));
        prop_assert_eq!(address.record_key(), Some(key.as_str()));
        prop_assert_eq!(address.host(), None);
    }

    #[test]
    fn display_reparses_to_same_address(id in identifier(), collection in nsid(), key in rkey()) {
        for input in [id.clone(), format!("{}/{}", id, collection), format!("{}/{}/{}", id, collection, key)] {
            let address = Address::parse(&input).unwrap();
            prop_assert_eq!(Address::parse(&address.to_string()).unwrap(), address);
        }
    }

    #[test]
    fn server_urls_keep_only_host(host in "[a-z]{2,10}\\.[a-z]{2,10}\\.(com|net|mom)", path in "(/[a-z]{0,6}){0,3}") {
        let address = Address::parse(&format!("https://{}{}", host, path)).unwrap();
        prop_assert_eq!(address, Address::Endpoint { host });
    }

    #[test]
    fn leading_slash_has_no_identifier(collection in nsid()) {
        let input = format!("at:///{}", collection);
        prop_assert!(matches!(
            Address::parse(&input),
            Err(AddressError::EmptyIdentifier(_))
        ));
    }

    #[test]
    fn did_detection_matches_prefix(id in identifier()) {
        prop_assert_eq!(is_did(&id), id.starts_with("did:"));
    }
}
