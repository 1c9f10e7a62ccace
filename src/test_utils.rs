//! Shared proptest strategies for unit tests.

use proptest::prelude::*;

use crate::operation::{Operation, OperationSet};
use crate::resource::Resource;

/// Identifiers accepted in resource specs.
pub fn arb_identifier() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z_][a-z0-9_]{0,11}").unwrap()
}

/// Any well-formed resource.
pub fn arb_resource() -> impl Strategy<Value = Resource> {
    prop_oneof![
        Just(Resource::root_data()),
        arb_identifier().prop_map(Resource::keyspace),
        (arb_identifier(), arb_identifier()).prop_map(|(ks, tbl)| Resource::table(ks, tbl)),
        Just(Resource::root_roles()),
        arb_identifier().prop_map(Resource::role),
        Just(Resource::Connection),
    ]
}

/// Any operation.
pub fn arb_operation() -> impl Strategy<Value = Operation> {
    prop::sample::select(Operation::ALL.to_vec())
}

/// Any subset of operations.
pub fn arb_operation_set() -> impl Strategy<Value = OperationSet> {
    prop::collection::vec(arb_operation(), 0..8).prop_map(|ops| ops.into_iter().collect())
}

mod proptests {
    use super::*;
    use crate::option::Mutation;
    use crate::store::Whitelist;

    proptest! {
        /// Property: ancestors are root-first, end with the resource, and
        /// have depth 1..=3
        #[test]
        fn proptest_ancestor_chain_shape(resource in arb_resource()) {
            let chain = resource.ancestors();

            prop_assert!(chain.first().unwrap().parent().is_none());
            prop_assert_eq!(chain.last().unwrap(), &resource);
            for pair in chain.windows(2) {
                let parent = pair[1].parent();
                prop_assert_eq!(parent.as_ref(), Some(&pair[0]));
                prop_assert!(pair[0].covers(&pair[1]));
            }

            let expected = match &resource {
                Resource::Connection => 1,
                Resource::Role(Some(_)) | Resource::Data(crate::DataResource::Keyspace(_)) => 2,
                Resource::Data(crate::DataResource::Table(..)) => 3,
                _ => 1,
            };
            prop_assert_eq!(chain.len(), expected);
        }

        /// Property: the display form parses back to the same resource
        #[test]
        fn proptest_spec_string_round_trip(resource in arb_resource()) {
            prop_assert_eq!(Resource::parse(&resource.to_string()), Ok(resource));
        }

        /// Property: grant then revoke of the same operations leaves no entry
        #[test]
        fn proptest_grant_revoke_cancels(resource in arb_resource(), ops in arb_operation_set()) {
            let grant = Mutation::grant(resource.clone(), ops);
            let revoke = Mutation::revoke(resource, ops);

            let mut whitelist = Whitelist::new();
            whitelist.apply(&grant);
            whitelist.apply(&revoke);

            prop_assert!(whitelist.is_empty());
        }

        /// Property: recorded operations are always legal for the resource kind
        #[test]
        fn proptest_whitelist_only_holds_legal_operations(
            resource in arb_resource(),
            ops in arb_operation_set()
        ) {
            let mut whitelist = Whitelist::new();
            whitelist.apply(&Mutation::grant(resource.clone(), ops));

            let legal = OperationSet::legal_for(resource.kind());
            prop_assert!(whitelist.operations(&resource).difference(legal).is_empty());
        }
    }
}
