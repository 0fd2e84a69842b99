//! Whole-template passes: gather, substitute and check holes, refs and
//! aliases. Statements are visited in order; list and concatenation elements
//! in positional order; no site twice.
use std::collections::{BTreeMap, BTreeSet, HashMap};

use clove_common::{CloveError, Result};

use crate::nodes::{Lit, Node};
use crate::values::{CompositeValue, Hole};
use crate::{Ast, CommandNode, Expr, RightExpr, StmtNode};

/// Every unfilled hole in the template, deduplicated by name with their
/// `action.entity.key` paths merged, sorted by name.
pub fn collect_holes(ast: &Ast) -> Vec<Hole> {
    let mut holes: BTreeMap<String, Hole> = BTreeMap::new();
    for stmt in &ast.statements {
        match &stmt.node {
            StmtNode::Command(cmd) => merge_holes(&mut holes, cmd.get_holes()),
            StmtNode::Declaration(decl) => match &decl.expr {
                Expr::Command(cmd) => merge_holes(&mut holes, cmd.get_holes()),
                Expr::Right(r) => {
                    if let Some(v) = &r.val {
                        merge_holes(&mut holes, v.get_holes());
                    }
                }
            },
            StmtNode::Expr(r) => {
                if let Some(v) = &r.val {
                    merge_holes(&mut holes, v.get_holes());
                }
            }
        }
    }
    holes.into_values().collect()
}

fn merge_holes(into: &mut BTreeMap<String, Hole>, from: BTreeMap<String, Hole>) {
    for (name, h) in from {
        match into.get_mut(&name) {
            Some(existing) => existing.param_paths.extend(h.param_paths),
            None => {
                into.insert(name, h);
            }
        }
    }
}

/// Every alias name in the template, deduplicated and sorted.
pub fn collect_aliases(ast: &Ast) -> Vec<String> {
    let mut out: BTreeSet<String> = BTreeSet::new();
    for stmt in &ast.statements {
        match &stmt.node {
            StmtNode::Command(cmd) => collect_command_aliases(cmd, &mut out),
            StmtNode::Declaration(decl) => match &decl.expr {
                Expr::Command(cmd) => collect_command_aliases(cmd, &mut out),
                Expr::Right(r) => collect_node_aliases(r.node.as_ref(), &mut out),
            },
            StmtNode::Expr(r) => collect_node_aliases(r.node.as_ref(), &mut out),
        }
    }
    out.into_iter().collect()
}

fn collect_command_aliases(cmd: &CommandNode, out: &mut BTreeSet<String>) {
    for node in cmd.param_nodes.values() {
        collect_node_aliases(Some(node), out);
    }
}

fn collect_node_aliases(node: Option<&Node>, out: &mut BTreeSet<String>) {
    match node {
        Some(Node::Alias(name)) => {
            out.insert(name.clone());
        }
        Some(Node::List(items)) | Some(Node::Concat(items)) => {
            for item in items {
                if let Node::Alias(name) = item {
                    out.insert(name.clone());
                }
            }
        }
        _ => {}
    }
}

/// Fills matching holes in place and reports what was applied. The tree
/// receives each fill verbatim; the returned map flattens non-literal fills
/// to their printed form (element-wise for list fills).
pub fn process_holes(ast: &mut Ast, fills: &HashMap<String, Node>) -> HashMap<String, Lit> {
    let mut processed: HashMap<String, Lit> = HashMap::new();
    for stmt in &mut ast.statements {
        let done = match &mut stmt.node {
            StmtNode::Command(cmd) => cmd.process_holes(fills),
            StmtNode::Declaration(decl) => match &mut decl.expr {
                Expr::Command(cmd) => cmd.process_holes(fills),
                Expr::Right(r) => right_expr_process_holes(r, fills),
            },
            StmtNode::Expr(r) => right_expr_process_holes(r, fills),
        };
        for name in done {
            if let Some(fill) = fills.get(&name) {
                processed.insert(name, processed_lit(fill));
            }
        }
    }
    processed
}

fn right_expr_process_holes(r: &mut RightExpr, fills: &HashMap<String, Node>) -> Vec<String> {
    let mut done: Vec<String> = Vec::new();
    if let Some(node) = r.node.as_mut() {
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
    if let Some(v) = r.val.as_mut() {
        done.extend(v.process_holes(fills));
    }
    done.sort();
    done.dedup();
    done
}

// What the applied-substitutions map records for one fill.
fn processed_lit(fill: &Node) -> Lit {
    match fill {
        Node::Interface(l) => l.clone(),
        Node::List(items) => Lit::List(
            items
                .iter()
                .map(|item| match item {
                    Node::Interface(l) => l.clone(),
                    other => Lit::Str(other.to_string()),
                })
                .collect(),
        ),
        other => Lit::Str(other.to_string()),
    }
}

/// Resolves aliases in place. The resolver is keyed on the enclosing
/// command's action and entity plus a context key: the parameter key for
/// ordinary command params, the alias's own name under a declaration.
pub fn process_aliases<F>(ast: &mut Ast, mut resolver: F)
where
    F: FnMut(&str, &str, &str, &str) -> Option<String>,
{
    for stmt in &mut ast.statements {
        match &mut stmt.node {
            StmtNode::Command(cmd) => resolve_command_aliases(cmd, &mut resolver, false),
            StmtNode::Declaration(decl) => match &mut decl.expr {
                Expr::Command(cmd) => resolve_command_aliases(cmd, &mut resolver, true),
                Expr::Right(r) => resolve_right_expr_aliases(r, &mut resolver),
            },
            StmtNode::Expr(r) => resolve_right_expr_aliases(r, &mut resolver),
        }
    }
}

fn resolve_command_aliases<F>(cmd: &mut CommandNode, resolver: &mut F, in_declaration: bool)
where
    F: FnMut(&str, &str, &str, &str) -> Option<String>,
{
    let action = cmd.action.clone();
    let entity = cmd.entity.clone();
    let CommandNode { params, param_nodes, .. } = cmd;
    for (key, node) in param_nodes.iter_mut() {
        match node {
            Node::Alias(name) => {
                let ctx_key = if in_declaration { name.clone() } else { key.clone() };
                if let Some(resolved) = resolver(&action, &entity, &ctx_key, name.as_str()) {
                    if let Some(p) = params.get_mut(key) {
                        p.resolve_alias(name.as_str(), &resolved);
                    }
                    *node = Node::Interface(Lit::Str(resolved));
                }
            }
            Node::List(items) => {
                for item in items {
                    if let Node::Alias(name) = item {
                        let ctx_key = if in_declaration { name.clone() } else { key.clone() };
                        if let Some(resolved) = resolver(&action, &entity, &ctx_key, name.as_str()) {
                            if let Some(p) = params.get_mut(key) {
                                p.resolve_alias(name.as_str(), &resolved);
                            }
                            *item = Node::Interface(Lit::Str(resolved));
                        }
                    }
                }
            }
            Node::Concat(items) => {
                for item in items {
                    if let Node::Alias(name) = item {
                        // concatenation elements always resolve under the parameter key
                        if let Some(resolved) = resolver(&action, &entity, key.as_str(), name.as_str()) {
                            if let Some(p) = params.get_mut(key) {
                                p.resolve_alias(name.as_str(), &resolved);
                            }
                            *item = Node::Interface(Lit::Str(resolved));
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

fn resolve_right_expr_aliases<F>(r: &mut RightExpr, resolver: &mut F)
where
    F: FnMut(&str, &str, &str, &str) -> Option<String>,
{
    let node = match r.node.as_mut() {
        Some(n) => n,
        None => return,
    };
    match node {
        Node::Alias(name) => {
            let alias = name.clone();
            if let Some(resolved) = resolver("", "", &alias, &alias) {
                if let Some(v) = r.val.as_mut() {
                    v.resolve_alias(&alias, &resolved);
                }
                *node = Node::Interface(Lit::Str(resolved));
            }
        }
        Node::List(items) | Node::Concat(items) => {
            for item in items {
                if let Node::Alias(name) = item {
                    let alias = name.clone();
                    if let Some(resolved) = resolver("", "", &alias, &alias) {
                        if let Some(v) = r.val.as_mut() {
                            v.resolve_alias(&alias, &resolved);
                        }
                        *item = Node::Interface(Lit::Str(resolved));
                    }
                }
            }
        }
        _ => {}
    }
}

/// Substitutes resolved values for references, in place.
pub fn process_refs(ast: &mut Ast, values: &HashMap<String, Lit>) {
    for stmt in &mut ast.statements {
        match &mut stmt.node {
            StmtNode::Command(cmd) => cmd.process_refs(values),
            StmtNode::Declaration(decl) => match &mut decl.expr {
                Expr::Command(cmd) => cmd.process_refs(values),
                Expr::Right(r) => right_expr_process_refs(r, values),
            },
            StmtNode::Expr(r) => right_expr_process_refs(r, values),
        }
    }
}

fn right_expr_process_refs(r: &mut RightExpr, values: &HashMap<String, Lit>) {
    if let Some(node) = r.node.as_mut() {
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
    if let Some(v) = r.val.as_mut() {
        v.process_refs(values);
    }
}

/// Drops every hole flagged optional: command params lose the key from both
/// maps, list elements are spliced out, right-expression payloads are
/// nullified. Concatenation slots keep the hole.
pub fn remove_optional_holes(ast: &mut Ast) {
    for stmt in &mut ast.statements {
        match &mut stmt.node {
            StmtNode::Command(cmd) => remove_command_optional_holes(cmd),
            StmtNode::Declaration(decl) => match &mut decl.expr {
                Expr::Command(cmd) => remove_command_optional_holes(cmd),
                Expr::Right(r) => remove_right_expr_optional_holes(r),
            },
            StmtNode::Expr(r) => remove_right_expr_optional_holes(r),
        }
    }
}

fn remove_command_optional_holes(cmd: &mut CommandNode) {
    let doomed: Vec<String> = cmd
        .param_nodes
        .iter()
        .filter(|(_, node)| node.is_optional_hole())
        .map(|(key, _)| key.clone())
        .collect();
    for key in doomed {
        cmd.param_nodes.remove(&key);
        cmd.params.remove(&key);
    }
    for node in cmd.param_nodes.values_mut() {
        if let Node::List(items) = node {
            items.retain(|n| !n.is_optional_hole());
        }
    }
    for value in cmd.params.values_mut() {
        if let CompositeValue::List(items) = value {
            items.retain(|v| !matches!(v, CompositeValue::Hole { optional: true, val: None, .. }));
        }
    }
}

fn remove_right_expr_optional_holes(r: &mut RightExpr) {
    if matches!(r.node, Some(ref n) if n.is_optional_hole()) {
        r.node = None;
        r.val = None;
        return;
    }
    if let Some(Node::List(items)) = r.node.as_mut() {
        items.retain(|n| !n.is_optional_hole());
    }
    if let Some(CompositeValue::List(items)) = r.val.as_mut() {
        items.retain(|v| !matches!(v, CompositeValue::Hole { optional: true, val: None, .. }));
    }
}

/// Checks that every `$ref` follows a declaration of its identifier and that
/// no identifier is declared twice. All findings come back in one error,
/// joined with `"; "`.
pub fn verify_refs(ast: &Ast) -> Result<()> {
    let mut declared: Vec<String> = Vec::new();
    let mut errs: Vec<String> = Vec::new();
    for stmt in &ast.statements {
        for name in statement_refs(&stmt.node) {
            if !declared.iter().any(|d| d == &name) {
                errs.push(format!(
                    "using reference '${}' but '{}' is undefined in template",
                    name, name
                ));
            }
        }
        if let StmtNode::Declaration(decl) = &stmt.node {
            declared.push(decl.ident.clone());
        }
    }
    let mut seen: Vec<&str> = Vec::new();
    let mut reported: Vec<&str> = Vec::new();
    for ident in &declared {
        if seen.contains(&ident.as_str()) {
            if !reported.contains(&ident.as_str()) {
                errs.push(format!(
                    "using reference '${}' but '{}' has already been assigned in template",
                    ident, ident
                ));
                reported.push(ident);
            }
        } else {
            seen.push(ident);
        }
    }
    if errs.is_empty() {
        Ok(())
    } else {
        Err(CloveError(errs.join("; ")))
    }
}

fn statement_refs(node: &StmtNode) -> Vec<String> {
    match node {
        StmtNode::Command(cmd) => cmd.get_refs(),
        StmtNode::Declaration(decl) => match &decl.expr {
            Expr::Command(cmd) => cmd.get_refs(),
            Expr::Right(r) => r.val.as_ref().map(|v| v.get_refs()).unwrap_or_default(),
        },
        StmtNode::Expr(r) => r.val.as_ref().map(|v| v.get_refs()).unwrap_or_default(),
    }
}
