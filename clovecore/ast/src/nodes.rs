//! Parameter-value nodes: the syntactic form of everything right of a '='.
use std::fmt;

/// A fully resolved literal payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Lit {
    Int(i64),
    Float(f64),
    Str(String),
    StrList(Vec<String>),
    List(Vec<Lit>),
}

impl Lit {
    /// Raw textual form, without the quoting applied by `Display`.
    /// Concatenation folding joins these.
    pub fn raw(&self) -> String {
        match self {
            Lit::Str(s) => s.clone(),
            Lit::Int(i) => i.to_string(),
            Lit::Float(f) => f.to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lit::Int(i) => write!(f, "{}", i),
            Lit::Float(x) => write!(f, "{}", x),
            Lit::Str(s) => write!(f, "{}", quote_if_needed(s)),
            Lit::StrList(items) => {
                let all: Vec<String> = items.iter().map(|s| quote_if_needed(s)).collect();
                write!(f, "[{}]", all.join(","))
            }
            Lit::List(items) => {
                let all: Vec<String> = items.iter().map(|l| l.to_string()).collect();
                write!(f, "[{}]", all.join(","))
            }
        }
    }
}

/// The closed set of parameter-value node kinds. Lists and concatenations are
/// flat: neither ever contains another list or concatenation.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Interface(Lit),
    Ref(String),
    Hole { name: String, optional: bool },
    Alias(String),
    List(Vec<Node>),
    Concat(Vec<Node>),
}

impl Node {
    pub fn new_hole(name: &str) -> Node {
        Node::Hole { name: name.to_string(), optional: false }
    }

    pub fn new_optional_hole(name: &str) -> Node {
        Node::Hole { name: name.to_string(), optional: true }
    }

    pub fn is_optional_hole(&self) -> bool {
        matches!(self, Node::Hole { optional: true, .. })
    }

    /// Materialized literal when the node (and everything under it) is
    /// resolved; `None` while a ref, hole or alias remains.
    pub fn lit(&self) -> Option<Lit> {
        match self {
            Node::Interface(l) => Some(l.clone()),
            Node::List(items) => {
                let all: Option<Vec<Lit>> = items.iter().map(|n| n.lit()).collect();
                all.map(Lit::List)
            }
            Node::Concat(items) => {
                let all: Option<Vec<Lit>> = items.iter().map(|n| n.lit()).collect();
                all.map(|lits| Lit::Str(lits.iter().map(|l| l.raw()).collect()))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Interface(l) => write!(f, "{}", l),
            Node::Ref(name) => write!(f, "${}", name),
            Node::Alias(name) => write!(f, "@{}", name),
            Node::Hole { name, .. } => write!(f, "{{{}}}", name),
            Node::List(items) => {
                let all: Vec<String> = items.iter().map(|n| n.to_string()).collect();
                write!(f, "[{}]", all.join(","))
            }
            Node::Concat(items) => {
                let all: Vec<String> = items.iter().map(|n| n.to_string()).collect();
                write!(f, "{}", all.join("+"))
            }
        }
    }
}

// A string stays bare only when every char could appear in an unquoted word.
fn needs_quoting(s: &str) -> bool {
    s.is_empty() || !s.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':' | '/'))
}

pub fn quote_if_needed(s: &str) -> String {
    if !needs_quoting(s) {
        return s.to_string();
    }
    if s.contains('\'') {
        format!("\"{}\"", s)
    } else {
        format!("'{}'", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_print_naturally() {
        assert_eq!(Node::Interface(Lit::Int(3)).to_string(), "3");
        assert_eq!(Node::Interface(Lit::Float(2.5)).to_string(), "2.5");
        assert_eq!(Node::Interface(Lit::Str("web".into())).to_string(), "web");
    }

    #[test]
    fn strings_quote_only_when_ambiguous() {
        assert_eq!(quote_if_needed("m1.small"), "m1.small");
        assert_eq!(quote_if_needed("10.0.0.0/16"), "10.0.0.0/16");
        assert_eq!(quote_if_needed("my instance"), "'my instance'");
        assert_eq!(quote_if_needed("a,b"), "'a,b'");
        assert_eq!(quote_if_needed("has[bracket"), "'has[bracket'");
        assert_eq!(quote_if_needed("it's"), "\"it's\"");
        assert_eq!(quote_if_needed(""), "''");
    }

    #[test]
    fn sigil_forms() {
        assert_eq!(Node::Ref("vpc".into()).to_string(), "$vpc");
        assert_eq!(Node::Alias("admin".into()).to_string(), "@admin");
        assert_eq!(Node::new_hole("t").to_string(), "{t}");
        assert_eq!(Node::new_optional_hole("tag").to_string(), "{tag}");
    }

    #[test]
    fn string_list_payloads_print_like_lists() {
        let lit = Lit::StrList(vec!["a".into(), "my b".into()]);
        assert_eq!(lit.to_string(), "[a,'my b']");
        assert_eq!(Node::Interface(lit).lit(), Some(Lit::StrList(vec!["a".into(), "my b".into()])));
    }

    #[test]
    fn composite_forms() {
        let list = Node::List(vec![Node::Interface(Lit::Str("a".into())), Node::Ref("b".into())]);
        assert_eq!(list.to_string(), "[a,$b]");
        let concat = Node::Concat(vec![Node::Interface(Lit::Str("pre-".into())), Node::new_hole("suffix")]);
        assert_eq!(concat.to_string(), "pre-+{suffix}");
    }

    #[test]
    fn materialization() {
        assert_eq!(Node::Interface(Lit::Int(1)).lit(), Some(Lit::Int(1)));
        assert_eq!(Node::new_hole("x").lit(), None);
        let list = Node::List(vec![Node::Interface(Lit::Int(1)), Node::Interface(Lit::Int(2))]);
        assert_eq!(list.lit(), Some(Lit::List(vec![Lit::Int(1), Lit::Int(2)])));
        let holey = Node::List(vec![Node::Interface(Lit::Int(1)), Node::new_hole("x")]);
        assert_eq!(holey.lit(), None);
        let concat = Node::Concat(vec![
            Node::Interface(Lit::Str("db-".into())),
            Node::Interface(Lit::Int(1)),
        ]);
        assert_eq!(concat.lit(), Some(Lit::Str("db-1".into())));
    }
}
