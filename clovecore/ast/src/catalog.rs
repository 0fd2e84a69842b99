//! The finite action and entity vocabularies a template may use. The builder
//! rejects anything outside these sets before a statement is ever committed.
use once_cell::sync::Lazy;
use std::collections::HashSet;

pub static ACTIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "attach", "check", "copy", "create", "delete", "detach", "import",
        "restart", "start", "stop", "update",
    ]
    .into_iter()
    .collect()
});

pub static ENTITIES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "alarm", "bucket", "certificate", "database", "function", "gateway",
        "group", "image", "instance", "keypair", "listener", "loadbalancer",
        "policy", "queue", "record", "role", "securitygroup", "snapshot",
        "subnet", "subscription", "tag", "topic", "user", "volume", "vpc",
        "zone",
    ]
    .into_iter()
    .collect()
});

pub fn is_invalid_action(text: &str) -> bool {
    !ACTIONS.contains(text)
}

pub fn is_invalid_entity(text: &str) -> bool {
    !ENTITIES.contains(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vocabulary() {
        assert!(!is_invalid_action("create"));
        assert!(!is_invalid_entity("instance"));
        assert!(is_invalid_action("explode"));
        assert!(is_invalid_entity("mainframe"));
    }
}
