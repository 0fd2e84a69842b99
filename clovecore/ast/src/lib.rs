/*

 ▄▄▄▄    ██▓    ▄▄▄       ▄████▄   ██ ▄█▀ ██▀███   █    ██   ██████  ██░ ██
▓█████▄ ▓██▒   ▒████▄    ▒██▀ ▀█   ██▄█▒ ▓██ ▒ ██▒ ██  ▓██▒▒██    ▒ ▓██░ ██▒
▒██▒ ▄██▒██░   ▒██  ▀█▄  ▒▓█    ▄ ▓███▄░ ▓██ ░▄█ ▒▓██  ▒██░░ ▓██▄   ▒██▀▀██░
▒██░█▀  ▒██░   ░██▄▄▄▄██ ▒▓▓▄ ▄██▒▓██ █▄ ▒██▀▀█▄  ▓▓█  ░██░  ▒   ██▒░▓█ ░██
░▓█  ▀█▓░██████▒▓█   ▓██▒▒ ▓███▀ ░▒██▒ █▄░██▓ ▒██▒▒▒█████▓ ▒██████▒▒░▓█▒░██▓
░▒▓███▀▒░ ▒░▓  ░▒▒   ▓▒█░░ ░▒ ▒  ░▒ ▒▒ ▓▒░ ▒▓ ░▒▓░░▒▓▒ ▒ ▒ ▒ ▒▓▒ ▒ ░ ▒ ░░▒░▒
▒░▒   ░ ░ ░ ▒  ░ ▒   ▒▒ ░  ░  ▒   ░ ░▒ ▒░  ░▒ ░ ▒░░░▒░ ░ ░ ░ ░▒  ░ ░ ▒ ░▒░ ░
 ░    ░   ░ ░    ░   ▒   ░        ░ ░░ ░   ░░   ░  ░░░ ░ ░ ░  ░  ░   ░  ░░ ░
 ░          ░  ░     ░  ░░ ░      ░  ░      ░        ░           ░   ░  ░  ░
      ░                  ░
Copyright (C) 2026, Blackrush LLC
Created by Erik Olson, Tarpon Springs, Florida
For more information, visit BlackrushDrive.com

MIT License

Copyright (c) 2026 Erik Lee Olson for Blackrush, LLC

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.

*/
//! AST for Clove templates — statements, declarations, commands, substitution passes

pub mod build;
pub mod catalog;
pub mod nodes;
pub mod values;
pub mod visit;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use clove_common::{CloveError, Result};

pub use nodes::{Lit, Node};
pub use values::{CompositeValue, Hole};
pub use visit::{
    collect_aliases, collect_holes, process_aliases, process_holes, process_refs,
    remove_optional_holes, verify_refs,
};

/// An ordered template: statements plus the scratch builder the parser drives.
#[derive(Debug, Default)]
pub struct Ast {
    pub statements: Vec<Statement>,
    pub(crate) stmt_builder: Option<build::StatementBuilder>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub node: StmtNode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtNode {
    Command(CommandNode),
    Declaration(DeclarationNode),
    Expr(RightExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclarationNode {
    pub ident: String,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Command(CommandNode),
    Right(RightExpr),
}

/// The value side of `ident = <value>` when the right side is not a command.
/// `node` is the substitution site; `val` the semantic mirror. Both are
/// `None` once an optional hole payload has been removed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RightExpr {
    pub node: Option<Node>,
    pub val: Option<CompositeValue>,
}

/// One command invocation. `params` and `param_nodes` always share a key set:
/// the former carries resolution state, the latter the substitution sites and
/// printed form.
pub struct CommandNode {
    pub action: String,
    pub entity: String,
    pub params: BTreeMap<String, CompositeValue>,
    pub param_nodes: BTreeMap<String, Node>,
    pub command: Option<Rc<dyn Command>>,
    pub cmd_result: Option<Lit>,
    pub cmd_err: Option<CloveError>,
}

/// Capability attached to a command node. The tree stores it and the last run
/// outcome; invoking it is the evaluator's business.
pub trait Command {
    fn params_spec(&self) -> ParamsSpec;
    fn run(&self, env: &mut RunEnv, params: &HashMap<String, Lit>) -> Result<Lit>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamsSpec {
    pub required: Vec<String>,
    pub optional: Vec<String>,
}

impl ParamsSpec {
    pub fn validate(&self, keys: &[String]) -> Result<()> {
        let missing: Vec<&str> = self
            .required
            .iter()
            .filter(|r| !keys.contains(r))
            .map(|s| s.as_str())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CloveError(format!("missing required params: {}", missing.join(", "))))
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunEnv {
    pub vars: HashMap<String, Lit>,
    pub dry_run: bool,
}

/// A command reduced to what a driver needs: resolved params, plus the params
/// still naming a reference to an earlier statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledCommand {
    pub params: BTreeMap<String, Lit>,
    pub refs: BTreeMap<String, String>,
}

/// One slot of the filler view of a command's params. List slots stay
/// positional: an element the filler has nothing to offer for is `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum FillerParam {
    Value(Node),
    List(Vec<Option<Node>>),
}

impl CommandNode {
    pub fn new(action: &str, entity: &str) -> CommandNode {
        CommandNode {
            action: action.to_string(),
            entity: entity.to_string(),
            params: BTreeMap::new(),
            param_nodes: BTreeMap::new(),
            command: None,
            cmd_result: None,
            cmd_err: None,
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.params.keys().cloned().collect()
    }

    pub fn result(&self) -> Option<&Lit> {
        self.cmd_result.as_ref()
    }

    pub fn err(&self) -> Option<&CloveError> {
        self.cmd_err.as_ref()
    }

    /// Unfilled holes under this command, keyed by hole name, each carrying
    /// every `action.entity.key` path it occurs at.
    pub fn get_holes(&self) -> BTreeMap<String, Hole> {
        let mut holes: BTreeMap<String, Hole> = BTreeMap::new();
        for (key, param) in &self.params {
            for (name, h) in param.get_holes() {
                let entry = holes.entry(name).or_insert(h);
                entry.param_paths.push(format!("{}.{}.{}", self.action, self.entity, key));
            }
        }
        holes
    }

    /// Fills holes in both maps; returns the names actually substituted.
    pub fn process_holes(&mut self, fills: &HashMap<String, Node>) -> Vec<String> {
        let mut done: Vec<String> = Vec::new();
        for param in self.params.values_mut() {
            done.extend(param.process_holes(fills));
        }
        for node in self.param_nodes.values_mut() {
            match node {
                Node::Hole { name, .. } => {
                    if let Some(fill) = fills.get(name.as_str()) {
                        done.push(name.clone());
                        *node = fill.clone();
                    }
                }
                Node::List(items) | Node::Concat(items) => {
                    for item in items {
                        if let Node::Hole { name, .. } = item {
                            if let Some(fill) = fills.get(name.as_str()) {
                                done.push(name.clone());
                                *item = fill.clone();
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        done.sort();
        done.dedup();
        done
    }

    pub fn get_refs(&self) -> Vec<String> {
        self.params.values().flat_map(|v| v.get_refs()).collect()
    }

    pub fn process_refs(&mut self, values: &HashMap<String, Lit>) {
        for param in self.params.values_mut() {
            param.process_refs(values);
        }
        for node in self.param_nodes.values_mut() {
            match node {
                Node::Ref(name) => {
                    if let Some(v) = values.get(name.as_str()) {
                        *node = Node::Interface(v.clone());
                    }
                }
                Node::List(items) | Node::Concat(items) => {
                    for item in items {
                        if let Node::Ref(name) = item {
                            if let Some(v) = values.get(name.as_str()) {
                                *item = Node::Interface(v.clone());
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// Wholesale replacement of a ref-valued parameter; elements inside lists
    /// and concatenations are swapped individually.
    pub fn replace_ref(&mut self, key: &str, value: &CompositeValue) {
        for param in self.params.values_mut() {
            if param.is_ref(key) {
                *param = value.clone();
            } else {
                param.replace_ref(key, value);
            }
        }
    }

    /// Params as a driver sees them: refs, holes and aliases are left out,
    /// everything else keeps its key, lists and concatenations included even
    /// while elements inside them are still unresolved.
    pub fn to_driver_params(&self) -> BTreeMap<String, Node> {
        let mut out = BTreeMap::new();
        for (k, node) in &self.param_nodes {
            match node {
                Node::Ref(_) | Node::Hole { .. } | Node::Alias(_) => {}
                other => {
                    out.insert(k.clone(), other.clone());
                }
            }
        }
        out
    }

    /// Like `to_driver_params`, but from the semantic side and with every
    /// ref-bearing param left out.
    pub fn to_driver_params_excluding_refs(&self) -> BTreeMap<String, Lit> {
        let mut out = BTreeMap::new();
        for (k, v) in &self.params {
            match v {
                CompositeValue::Ref { .. } | CompositeValue::List(_) | CompositeValue::Concat(_) => {}
                other => {
                    if let Some(val) = other.value() {
                        out.insert(k.clone(), val);
                    }
                }
            }
        }
        out
    }

    /// The params an interactive filler may still decide on: literals and
    /// unresolved aliases. A list keeps one slot per element so positions
    /// line up with the original value; elements the filler cannot decide on
    /// are `None`.
    pub fn to_filler_params(&self) -> BTreeMap<String, FillerParam> {
        let keep = |node: &Node| -> Option<Node> {
            match node {
                Node::Interface(_) | Node::Alias(_) => Some(node.clone()),
                _ => None,
            }
        };
        let mut out = BTreeMap::new();
        for (k, node) in &self.param_nodes {
            if let Some(n) = keep(node) {
                out.insert(k.clone(), FillerParam::Value(n));
                continue;
            }
            if let Node::List(items) = node {
                out.insert(k.clone(), FillerParam::List(items.iter().map(|n| keep(n)).collect()));
            }
        }
        out
    }

    pub fn compile(&self) -> CompiledCommand {
        let mut out = CompiledCommand::default();
        for (k, v) in &self.params {
            if let CompositeValue::Ref { name, .. } = v {
                out.refs.insert(k.clone(), name.clone());
            } else if let Some(val) = v.value() {
                out.params.insert(k.clone(), val);
            }
        }
        out
    }
}

impl Clone for CommandNode {
    // Structure travels; the last run outcome does not.
    fn clone(&self) -> CommandNode {
        CommandNode {
            action: self.action.clone(),
            entity: self.entity.clone(),
            params: self.params.clone(),
            param_nodes: self.param_nodes.clone(),
            command: self.command.clone(),
            cmd_result: None,
            cmd_err: None,
        }
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("action", &self.action)
            .field("entity", &self.entity)
            .field("params", &self.params)
            .field("param_nodes", &self.param_nodes)
            .field("cmd_result", &self.cmd_result)
            .field("cmd_err", &self.cmd_err)
            .finish_non_exhaustive()
    }
}

impl PartialEq for CommandNode {
    fn eq(&self, other: &CommandNode) -> bool {
        self.action == other.action
            && self.entity == other.entity
            && self.params == other.params
            && self.param_nodes == other.param_nodes
    }
}

impl RightExpr {
    pub fn result(&self) -> Option<Lit> {
        match &self.node {
            Some(Node::Interface(l)) => Some(l.clone()),
            _ => None,
        }
    }

    pub fn err(&self) -> Option<CloveError> {
        match &self.node {
            Some(Node::Interface(_)) => None,
            _ => Some(CloveError("right expression is not a literal value".into())),
        }
    }

    pub fn is_resolved(&self) -> bool {
        match &self.val {
            Some(v) => v.get_holes().is_empty(),
            None => true,
        }
    }
}

impl Expr {
    pub fn result(&self) -> Option<Lit> {
        match self {
            Expr::Command(c) => c.cmd_result.clone(),
            Expr::Right(r) => r.result(),
        }
    }

    pub fn err(&self) -> Option<CloveError> {
        match self {
            Expr::Command(c) => c.cmd_err.clone(),
            Expr::Right(r) => r.err(),
        }
    }
}

impl Ast {
    pub fn new() -> Ast {
        Ast::default()
    }
}

impl Clone for Ast {
    fn clone(&self) -> Ast {
        Ast { statements: self.statements.clone(), stmt_builder: None }
    }
}

impl PartialEq for Ast {
    fn eq(&self, other: &Ast) -> bool {
        self.statements == other.statements
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let all: Vec<String> = self.statements.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", all.join("\n"))
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.node)
    }
}

impl fmt::Display for StmtNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StmtNode::Command(c) => write!(f, "{}", c),
            StmtNode::Declaration(d) => write!(f, "{}", d),
            StmtNode::Expr(r) => write!(f, "{}", r),
        }
    }
}

impl fmt::Display for DeclarationNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.ident, self.expr)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Command(c) => write!(f, "{}", c),
            Expr::Right(r) => write!(f, "{}", r),
        }
    }
}

impl fmt::Display for RightExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node {
            Some(n) => write!(f, "{}", n),
            None => Ok(()),
        }
    }
}

impl fmt::Display for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.action, self.entity)?;
        for (k, node) in &self.param_nodes {
            write!(f, " {}={}", k, node)?;
        }
        Ok(())
    }
}
