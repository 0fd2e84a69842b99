//! Composite values: the semantic form of a parameter, tracking what each
//! slot resolves to across hole filling, ref resolution and alias lookup.
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::nodes::{Lit, Node, quote_if_needed};

/// Descriptor for one unfilled hole, with every `action.entity.key` path the
/// hole appears under.
#[derive(Debug, Clone, PartialEq)]
pub struct Hole {
    pub name: String,
    pub optional: bool,
    pub param_paths: Vec<String>,
}

/// Semantic mirror of [`Node`]: same six kinds, plus the resolution state a
/// substitution pass fills in.
#[derive(Debug, Clone, PartialEq)]
pub enum CompositeValue {
    Interface(Lit),
    Ref { name: String, val: Option<Lit> },
    Hole { name: String, optional: bool, val: Option<Lit> },
    Alias { name: String, val: Option<String> },
    List(Vec<CompositeValue>),
    Concat(Vec<CompositeValue>),
}

impl CompositeValue {
    pub fn from_node(node: &Node) -> CompositeValue {
        match node {
            Node::Interface(l) => CompositeValue::Interface(l.clone()),
            Node::Ref(name) => CompositeValue::Ref { name: name.clone(), val: None },
            Node::Hole { name, optional } => {
                CompositeValue::Hole { name: name.clone(), optional: *optional, val: None }
            }
            Node::Alias(name) => CompositeValue::Alias { name: name.clone(), val: None },
            Node::List(items) => CompositeValue::List(items.iter().map(Self::from_node).collect()),
            Node::Concat(items) => CompositeValue::Concat(items.iter().map(Self::from_node).collect()),
        }
    }

    /// The materialized value, or `None` while any part is unresolved.
    /// A concatenation folds to the string join of its parts.
    pub fn value(&self) -> Option<Lit> {
        match self {
            CompositeValue::Interface(l) => Some(l.clone()),
            CompositeValue::Ref { val, .. } | CompositeValue::Hole { val, .. } => val.clone(),
            CompositeValue::Alias { val, .. } => val.as_ref().map(|s| Lit::Str(s.clone())),
            CompositeValue::List(items) => {
                let all: Option<Vec<Lit>> = items.iter().map(|i| i.value()).collect();
                all.map(Lit::List)
            }
            CompositeValue::Concat(items) => {
                let all: Option<Vec<Lit>> = items.iter().map(|i| i.value()).collect();
                all.map(|lits| Lit::Str(lits.iter().map(|l| l.raw()).collect()))
            }
        }
    }

    pub fn get_holes(&self) -> BTreeMap<String, Hole> {
        let mut out = BTreeMap::new();
        self.collect_holes_into(&mut out);
        out
    }

    fn collect_holes_into(&self, out: &mut BTreeMap<String, Hole>) {
        match self {
            CompositeValue::Hole { name, optional, val } if val.is_none() => {
                out.entry(name.clone()).or_insert_with(|| Hole {
                    name: name.clone(),
                    optional: *optional,
                    param_paths: Vec::new(),
                });
            }
            CompositeValue::List(items) | CompositeValue::Concat(items) => {
                for item in items {
                    item.collect_holes_into(out);
                }
            }
            _ => {}
        }
    }

    /// Fills matching holes in place and returns the names actually filled.
    /// A literal fill resolves the hole; any other fill kind replaces the
    /// slot with the fill's own composite form.
    pub fn process_holes(&mut self, fills: &HashMap<String, Node>) -> Vec<String> {
        match self {
            CompositeValue::Hole { name, val, .. } => {
                if val.is_some() {
                    return Vec::new();
                }
                let fill = match fills.get(name.as_str()) {
                    Some(f) => f.clone(),
                    None => return Vec::new(),
                };
                let filled = name.clone();
                if let Node::Interface(l) = fill {
                    *val = Some(l);
                } else {
                    *self = CompositeValue::from_node(&fill);
                }
                vec![filled]
            }
            CompositeValue::List(items) | CompositeValue::Concat(items) => {
                let mut out = Vec::new();
                for item in items {
                    out.extend(item.process_holes(fills));
                }
                out
            }
            _ => Vec::new(),
        }
    }

    pub fn get_refs(&self) -> Vec<String> {
        match self {
            CompositeValue::Ref { name, .. } => vec![name.clone()],
            CompositeValue::List(items) | CompositeValue::Concat(items) => {
                items.iter().flat_map(|i| i.get_refs()).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn process_refs(&mut self, values: &HashMap<String, Lit>) {
        match self {
            CompositeValue::Ref { name, val } => {
                if let Some(v) = values.get(name.as_str()) {
                    *val = Some(v.clone());
                }
            }
            CompositeValue::List(items) | CompositeValue::Concat(items) => {
                for item in items {
                    item.process_refs(values);
                }
            }
            _ => {}
        }
    }

    pub fn is_ref(&self, key: &str) -> bool {
        matches!(self, CompositeValue::Ref { name, .. } if name == key)
    }

    /// Replaces any element of a list or concatenation that is the named
    /// reference. Wholesale replacement of a directly ref-valued parameter is
    /// the command's job, which checks `is_ref` first.
    pub fn replace_ref(&mut self, key: &str, value: &CompositeValue) {
        if let CompositeValue::List(items) | CompositeValue::Concat(items) = self {
            for item in items {
                if item.is_ref(key) {
                    *item = value.clone();
                } else {
                    item.replace_ref(key, value);
                }
            }
        }
    }

    pub(crate) fn resolve_alias(&mut self, name: &str, resolved: &str) {
        match self {
            CompositeValue::Alias { name: n, val } if n == name => {
                *val = Some(resolved.to_string());
            }
            CompositeValue::List(items) | CompositeValue::Concat(items) => {
                for item in items {
                    item.resolve_alias(name, resolved);
                }
            }
            _ => {}
        }
    }
}

impl fmt::Display for CompositeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompositeValue::Interface(l) => write!(f, "{}", l),
            CompositeValue::Ref { name, val } => match val {
                Some(v) => write!(f, "{}", v),
                None => write!(f, "${}", name),
            },
            CompositeValue::Hole { name, val, .. } => match val {
                Some(v) => write!(f, "{}", v),
                None => write!(f, "{{{}}}", name),
            },
            CompositeValue::Alias { name, val } => match val {
                Some(s) => write!(f, "{}", quote_if_needed(s)),
                None => write!(f, "@{}", name),
            },
            CompositeValue::List(items) => {
                let all: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "[{}]", all.join(","))
            }
            CompositeValue::Concat(items) => {
                let all: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "{}", all.join("+"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hole(name: &str) -> CompositeValue {
        CompositeValue::Hole { name: name.into(), optional: false, val: None }
    }

    #[test]
    fn unresolved_values_are_none() {
        assert_eq!(hole("t").value(), None);
        assert_eq!(CompositeValue::Ref { name: "vpc".into(), val: None }.value(), None);
        assert_eq!(CompositeValue::Interface(Lit::Int(3)).value(), Some(Lit::Int(3)));
    }

    #[test]
    fn list_materializes_only_when_every_item_does() {
        let mut list = CompositeValue::List(vec![CompositeValue::Interface(Lit::Int(1)), hole("x")]);
        assert_eq!(list.value(), None);
        let fills: HashMap<String, Node> =
            [("x".to_string(), Node::Interface(Lit::Int(2)))].into_iter().collect();
        assert_eq!(list.process_holes(&fills), vec!["x".to_string()]);
        assert_eq!(list.value(), Some(Lit::List(vec![Lit::Int(1), Lit::Int(2)])));
    }

    #[test]
    fn concat_folds_to_string() {
        let mut concat = CompositeValue::Concat(vec![
            CompositeValue::Interface(Lit::Str("db-".into())),
            hole("env"),
        ]);
        assert_eq!(concat.value(), None);
        let fills: HashMap<String, Node> =
            [("env".to_string(), Node::Interface(Lit::Str("prod".into())))].into_iter().collect();
        concat.process_holes(&fills);
        assert_eq!(concat.value(), Some(Lit::Str("db-prod".into())));
    }

    #[test]
    fn filled_holes_stop_being_reported() {
        let mut v = hole("t");
        assert_eq!(v.get_holes().len(), 1);
        let fills: HashMap<String, Node> =
            [("t".to_string(), Node::Interface(Lit::Str("m1.small".into())))].into_iter().collect();
        v.process_holes(&fills);
        assert!(v.get_holes().is_empty());
        // filling again is a no-op
        assert!(v.process_holes(&fills).is_empty());
    }

    #[test]
    fn non_literal_fill_replaces_the_slot() {
        let mut v = hole("t");
        let fills: HashMap<String, Node> =
            [("t".to_string(), Node::Ref("other".into()))].into_iter().collect();
        assert_eq!(v.process_holes(&fills), vec!["t".to_string()]);
        assert_eq!(v, CompositeValue::Ref { name: "other".into(), val: None });
        assert_eq!(v.get_refs(), vec!["other".to_string()]);
    }

    #[test]
    fn refs_resolve_in_place() {
        let mut v = CompositeValue::Ref { name: "vpc".into(), val: None };
        let values: HashMap<String, Lit> =
            [("vpc".to_string(), Lit::Str("vpc-1234".into()))].into_iter().collect();
        v.process_refs(&values);
        assert_eq!(v.value(), Some(Lit::Str("vpc-1234".into())));
        assert!(v.is_ref("vpc"));
        assert!(!v.is_ref("subnet"));
    }

    #[test]
    fn replace_ref_swaps_list_elements() {
        let mut list = CompositeValue::List(vec![
            CompositeValue::Ref { name: "a".into(), val: None },
            CompositeValue::Interface(Lit::Int(1)),
        ]);
        list.replace_ref("a", &CompositeValue::Interface(Lit::Str("id-9".into())));
        assert_eq!(list.value(), Some(Lit::List(vec![Lit::Str("id-9".into()), Lit::Int(1)])));
    }

    #[test]
    fn clone_is_independent() {
        let original = CompositeValue::List(vec![hole("x")]);
        let mut copy = original.clone();
        let fills: HashMap<String, Node> =
            [("x".to_string(), Node::Interface(Lit::Int(7)))].into_iter().collect();
        copy.process_holes(&fills);
        assert_eq!(original.value(), None);
        assert_eq!(copy.value(), Some(Lit::List(vec![Lit::Int(7)])));
    }
}
