//! Conversion between [`Whitelist`] and the host's textual role options.
//!
//! The host persists custom role options as a string map. Each whitelist
//! entry becomes one option:
//!
//! ```text
//! "AUDIT WHITELIST ON data/ecks/ectbl" => "SELECT,MODIFY"
//! ```
//!
//! Operation order in the value carries no meaning.

use std::collections::BTreeMap;

use crate::error::ParseError;
use crate::operation::{Operation, OperationSet};
use crate::resource::Resource;
use crate::store::Whitelist;

/// Key prefix of a persisted whitelist entry.
pub const WHITELIST_OPTION_PREFIX: &str = "AUDIT WHITELIST ON ";

/// Renders a whitelist as role options.
pub fn encode_whitelist(whitelist: &Whitelist) -> BTreeMap<String, String> {
    whitelist
        .iter()
        .map(|(resource, ops)| {
            (
                format!("{}{}", WHITELIST_OPTION_PREFIX, resource),
                ops.to_string(),
            )
        })
        .collect()
}

/// Reads a whitelist back from role options.
///
/// Options without the whitelist prefix are ignored. Operation names are
/// trimmed and matched case-insensitively; duplicates collapse. Operations
/// that cannot occur on the entry's resource kind are dropped.
///
/// # Errors
///
/// Returns [`ParseError`] if a key holds a malformed resource spec or a
/// value holds an unknown operation name.
pub fn decode_whitelist<'a, I>(options: I) -> Result<Whitelist, ParseError>
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    let mut whitelist = Whitelist::new();
    for (key, value) in options {
        let Some(spec) = key.strip_prefix(WHITELIST_OPTION_PREFIX) else {
            continue;
        };
        let resource = Resource::parse(spec.trim())?;
        let operations = value
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::parse::<Operation>)
            .collect::<Result<OperationSet, _>>()?;
        whitelist.grant(resource, operations);
    }
    Ok(whitelist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::option::{parse_option, Mutation};

    fn grant(key: &str, value: &str) -> Mutation {
        parse_option(key, value).unwrap()
    }

    #[test]
    fn encodes_one_option_per_entry() {
        let mut whitelist = Whitelist::new();
        whitelist.apply(&grant("grant_audit_whitelist_for_all", "connections"));
        whitelist.apply(&grant("grant_audit_whitelist_for_select", "data/ecks"));

        let options = encode_whitelist(&whitelist);
        assert_eq!(options.len(), 2);
        assert_eq!(options["AUDIT WHITELIST ON connections"], "AUTHORIZE,EXECUTE");
        assert_eq!(options["AUDIT WHITELIST ON data/ecks"], "SELECT");
    }

    #[test]
    fn decodes_as_a_set_and_ignores_other_options() {
        let mut options = BTreeMap::new();
        options.insert(
            "AUDIT WHITELIST ON roles".to_string(),
            " describe , CREATE,CREATE ".to_string(),
        );
        options.insert("department".to_string(), "billing".to_string());

        let whitelist = decode_whitelist(&options).unwrap();
        assert_eq!(whitelist.len(), 1);
        let ops = whitelist.operations(&Resource::root_roles());
        assert!(ops.contains(Operation::Describe));
        assert!(ops.contains(Operation::Create));
        assert_eq!(ops.len(), 2);
    }

    #[test]
    fn decode_rejects_garbage() {
        let mut options = BTreeMap::new();
        options.insert("AUDIT WHITELIST ON data/a/b/c".to_string(), "SELECT".to_string());
        assert!(matches!(decode_whitelist(&options), Err(ParseError::Resource(_))));

        let mut options = BTreeMap::new();
        options.insert("AUDIT WHITELIST ON data".to_string(), "SELECT,FLY".to_string());
        assert_eq!(
            decode_whitelist(&options),
            Err(ParseError::UnknownOperation("FLY".to_string()))
        );
    }

    #[test]
    fn decode_drops_operations_illegal_for_the_resource() {
        let mut options = BTreeMap::new();
        options.insert("AUDIT WHITELIST ON connections".to_string(), "SELECT".to_string());
        options.insert("AUDIT WHITELIST ON data/ecks".to_string(), "select,execute".to_string());

        let whitelist = decode_whitelist(&options).unwrap();
        assert!(whitelist.operations(&Resource::Connection).is_empty());
        assert_eq!(
            whitelist.operations(&Resource::keyspace("ecks")),
            OperationSet::single(Operation::Select)
        );
        assert_eq!(whitelist.len(), 1);
    }

    #[test]
    fn encode_then_decode_preserves_entries() {
        let mut whitelist = Whitelist::new();
        whitelist.apply(&grant("grant_audit_whitelist_for_all", "data/ecks/ectbl"));
        whitelist.apply(&grant("grant_audit_whitelist_for_describe", "roles/bob"));

        let options = encode_whitelist(&whitelist);
        assert_eq!(decode_whitelist(&options).unwrap(), whitelist);
    }
}
