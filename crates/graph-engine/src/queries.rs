//! Query texts used by the engine's phases.
//!
//! Derived requests always re-query by the configured identity properties,
//! never by internal store identifiers, which are not portable across
//! stores.

/// Broad query feeding the relationship verification phase.
pub const MATCH_ALL_RELATIONSHIPS: &str = "MATCH (n)-[r]->(m) RETURN n,m,r";

/// Broad query feeding the isolated-node verification phase.
pub const MATCH_ISOLATED_NODES: &str = "MATCH (n) WHERE NOT ( (n)--() ) RETURN n";

pub const COUNT_NODES: &str = "MATCH (n) RETURN count(n) as count";

pub const COUNT_RELATIONSHIPS: &str = "MATCH ()-[r]->() RETURN count(r) as count";

pub const COUNT_ISOLATED_NODES: &str =
    "MATCH (n) WHERE NOT ( (n)--() ) RETURN count(n) as count";

/// Streams the whole source store as plain statement blobs (copy phase).
pub const EXPORT_ALL_STATEMENTS: &str = "CALL apoc.export.cypher.all(null, {format:\"plain\",streamStatements:true,batchSize:5000}) YIELD cypherStatements RETURN cypherStatements";

/// Clears the target store before a copy run replays the export.
pub const RESET_TARGET: &str = "MATCH (n) DETACH DELETE n";

/// Re-query for one relationship by its composite identity key.
pub fn relationship_by_key(node_key: &str, relationship_key: &str) -> String {
    format!(
        "MATCH (n {{ {node_key}: $n_key }})-[r {{ {relationship_key}: $r_key }}]->(m {{ {node_key}: $m_key }}) RETURN n,m,r"
    )
}

/// Re-query for one isolated node by its identity key.
pub fn isolated_node_by_key(node_key: &str) -> String {
    format!("MATCH (n {{ {node_key}: $n_key }}) WHERE NOT ( (n)--() ) RETURN n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_query_uses_configured_keys() {
        let query = relationship_by_key("name", "distance");
        assert_eq!(
            query,
            "MATCH (n { name: $n_key })-[r { distance: $r_key }]->(m { name: $m_key }) RETURN n,m,r"
        );
    }

    #[test]
    fn test_isolated_node_query_uses_configured_key() {
        let query = isolated_node_by_key("code");
        assert_eq!(
            query,
            "MATCH (n { code: $n_key }) WHERE NOT ( (n)--() ) RETURN n"
        );
    }
}
