//! Incremental statement construction, driven one parse callback at a time.
use std::collections::BTreeMap;

use clove_common::{CloveError, Result};

use crate::catalog::{is_invalid_action, is_invalid_entity};
use crate::nodes::{Lit, Node};
use crate::values::CompositeValue;
use crate::{Ast, CommandNode, DeclarationNode, Expr, RightExpr, Statement, StmtNode};

/// Scratch state for the statement currently being built. Lives only between
/// `new_statement` and `statement_done`.
#[derive(Debug, Default)]
pub(crate) struct StatementBuilder {
    action: String,
    entity: String,
    declaration_identifier: String,
    is_value: bool,
    params: Vec<(String, CompositeValue)>,
    param_nodes: BTreeMap<String, Node>,
    current_key: String,
    current_node: Option<Node>,
    current_value: Option<CompositeValue>,
    list_builder: Option<SeqValueBuilder>,
    concat_builder: Option<SeqValueBuilder>,
}

// Accumulates both forms of a bracketed list or of a concatenation.
#[derive(Debug, Default)]
struct SeqValueBuilder {
    vals: Vec<CompositeValue>,
    elements: Vec<Node>,
}

impl SeqValueBuilder {
    fn add(&mut self, val: CompositeValue, node: Node) {
        self.vals.push(val);
        self.elements.push(node);
    }
}

impl StatementBuilder {
    fn build(mut self) -> Option<Statement> {
        if self.action.is_empty()
            && self.entity.is_empty()
            && self.declaration_identifier.is_empty()
            && !self.is_value
        {
            return None;
        }
        let expr = if self.is_value {
            Expr::Right(RightExpr { node: self.current_node.take(), val: self.current_value.take() })
        } else {
            let mut cmd = CommandNode::new(&self.action, &self.entity);
            for (key, value) in self.params {
                cmd.params.insert(key, value);
            }
            cmd.param_nodes = self.param_nodes;
            Expr::Command(cmd)
        };
        let node = if !self.declaration_identifier.is_empty() {
            StmtNode::Declaration(DeclarationNode { ident: self.declaration_identifier, expr })
        } else {
            match expr {
                Expr::Command(c) => StmtNode::Command(c),
                Expr::Right(r) => StmtNode::Expr(r),
            }
        };
        Some(Statement { node })
    }

    // A value lands in the active concatenation, else the active list, else
    // the pending key slot; with no key it stays current for a value statement.
    fn add_param_value(&mut self, val: CompositeValue, node: Node) {
        self.current_value = Some(val);
        self.current_node = Some(node);
        if let Some(concat) = self.concat_builder.as_mut() {
            concat.add(self.current_value.take().unwrap(), self.current_node.take().unwrap());
        } else if let Some(list) = self.list_builder.as_mut() {
            list.add(self.current_value.take().unwrap(), self.current_node.take().unwrap());
        } else if !self.current_key.is_empty() {
            let key = std::mem::take(&mut self.current_key);
            self.params.push((key.clone(), self.current_value.take().unwrap()));
            self.param_nodes.insert(key, self.current_node.take().unwrap());
        }
    }

    fn build_list(&mut self) {
        if let Some(list) = self.list_builder.take() {
            self.add_param_value(CompositeValue::List(list.vals), Node::List(list.elements));
        }
    }

    fn build_concatenation(&mut self) {
        if let Some(concat) = self.concat_builder.take() {
            self.add_param_value(CompositeValue::Concat(concat.vals), Node::Concat(concat.elements));
        }
    }
}

impl Ast {
    pub fn new_statement(&mut self) {
        self.stmt_builder = Some(StatementBuilder::default());
    }

    pub fn statement_done(&mut self) {
        if let Some(builder) = self.stmt_builder.take() {
            if let Some(stmt) = builder.build() {
                self.statements.push(stmt);
            }
        }
    }

    pub fn add_action(&mut self, text: &str) -> Result<()> {
        if is_invalid_action(text) {
            return Err(CloveError(format!("unknown action '{}'", text)));
        }
        if let Some(b) = self.stmt_builder.as_mut() {
            b.action = text.to_string();
        }
        Ok(())
    }

    pub fn add_entity(&mut self, text: &str) -> Result<()> {
        if is_invalid_entity(text) {
            return Err(CloveError(format!("unknown entity '{}'", text)));
        }
        if let Some(b) = self.stmt_builder.as_mut() {
            b.entity = text.to_string();
        }
        Ok(())
    }

    pub fn add_value(&mut self) {
        if let Some(b) = self.stmt_builder.as_mut() {
            b.is_value = true;
        }
    }

    pub fn add_declaration_identifier(&mut self, text: &str) {
        if let Some(b) = self.stmt_builder.as_mut() {
            b.declaration_identifier = text.to_string();
        }
    }

    pub fn add_param_key(&mut self, text: &str) {
        if let Some(b) = self.stmt_builder.as_mut() {
            b.current_key = text.to_string();
        }
    }

    /// Scalar coercion: integer first, then float, else the string verbatim.
    pub fn add_param_value(&mut self, text: &str) {
        let val = if let Ok(i) = text.parse::<i64>() {
            Lit::Int(i)
        } else if let Ok(f) = text.parse::<f64>() {
            Lit::Float(f)
        } else {
            Lit::Str(text.to_string())
        };
        if let Some(b) = self.stmt_builder.as_mut() {
            b.add_param_value(CompositeValue::Interface(val.clone()), Node::Interface(val));
        }
    }

    pub fn add_string_value(&mut self, text: &str) {
        if let Some(b) = self.stmt_builder.as_mut() {
            let val = Lit::Str(text.to_string());
            b.add_param_value(CompositeValue::Interface(val.clone()), Node::Interface(val));
        }
    }

    pub fn add_param_ref_value(&mut self, text: &str) {
        if let Some(b) = self.stmt_builder.as_mut() {
            b.add_param_value(
                CompositeValue::Ref { name: text.to_string(), val: None },
                Node::Ref(text.to_string()),
            );
        }
    }

    pub fn add_param_hole_value(&mut self, text: &str) {
        if let Some(b) = self.stmt_builder.as_mut() {
            b.add_param_value(
                CompositeValue::Hole { name: text.to_string(), optional: false, val: None },
                Node::new_hole(text),
            );
        }
    }

    pub fn add_optional_param_hole_value(&mut self, text: &str) {
        if let Some(b) = self.stmt_builder.as_mut() {
            b.add_param_value(
                CompositeValue::Hole { name: text.to_string(), optional: true, val: None },
                Node::new_optional_hole(text),
            );
        }
    }

    pub fn add_alias_param(&mut self, text: &str) {
        if let Some(b) = self.stmt_builder.as_mut() {
            b.add_param_value(
                CompositeValue::Alias { name: text.to_string(), val: None },
                Node::Alias(text.to_string()),
            );
        }
    }

    pub fn add_first_value_in_list(&mut self) {
        if let Some(b) = self.stmt_builder.as_mut() {
            b.list_builder = Some(SeqValueBuilder::default());
        }
    }

    pub fn last_value_in_list(&mut self) {
        if let Some(b) = self.stmt_builder.as_mut() {
            b.build_list();
        }
    }

    pub fn add_first_value_in_concatenation(&mut self) {
        if let Some(b) = self.stmt_builder.as_mut() {
            b.concat_builder = Some(SeqValueBuilder::default());
        }
    }

    pub fn last_value_in_concatenation(&mut self) {
        if let Some(b) = self.stmt_builder.as_mut() {
            b.build_concatenation();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_coercion_int_float_string() {
        let mut ast = Ast::new();
        ast.new_statement();
        ast.add_action("create").unwrap();
        ast.add_entity("instance").unwrap();
        ast.add_param_key("count");
        ast.add_param_value("3");
        ast.add_param_key("size");
        ast.add_param_value("0.5");
        ast.add_param_key("name");
        ast.add_param_value("web");
        ast.statement_done();

        let cmd = match &ast.statements[0].node {
            StmtNode::Command(c) => c,
            other => panic!("expected command, got {:?}", other),
        };
        assert_eq!(cmd.param_nodes["count"], Node::Interface(Lit::Int(3)));
        assert_eq!(cmd.param_nodes["size"], Node::Interface(Lit::Float(0.5)));
        assert_eq!(cmd.param_nodes["name"], Node::Interface(Lit::Str("web".into())));
        assert_eq!(ast.to_string(), "create instance count=3 name=web size=0.5");
    }

    #[test]
    fn unknown_action_and_entity_are_fatal() {
        let mut ast = Ast::new();
        ast.new_statement();
        assert!(ast.add_action("explode").is_err());
        assert!(ast.add_entity("mainframe").is_err());
        assert!(ast.add_action("create").is_ok());
        assert!(ast.add_entity("vpc").is_ok());
    }

    #[test]
    fn empty_statement_is_discarded() {
        let mut ast = Ast::new();
        ast.new_statement();
        ast.statement_done();
        assert!(ast.statements.is_empty());
    }

    #[test]
    fn list_collects_values_in_order() {
        let mut ast = Ast::new();
        ast.new_statement();
        ast.add_action("create").unwrap();
        ast.add_entity("policy").unwrap();
        ast.add_param_key("subjects");
        ast.add_first_value_in_list();
        ast.add_alias_param("admin");
        ast.add_alias_param("ops");
        ast.last_value_in_list();
        ast.statement_done();

        assert_eq!(ast.to_string(), "create policy subjects=[@admin,@ops]");
        let cmd = match &ast.statements[0].node {
            StmtNode::Command(c) => c,
            other => panic!("expected command, got {:?}", other),
        };
        assert_eq!(cmd.params.keys().collect::<Vec<_>>(), cmd.param_nodes.keys().collect::<Vec<_>>());
    }

    #[test]
    fn concatenation_collects_values_in_order() {
        let mut ast = Ast::new();
        ast.new_statement();
        ast.add_action("create").unwrap();
        ast.add_entity("instance").unwrap();
        ast.add_param_key("name");
        ast.add_first_value_in_concatenation();
        ast.add_param_value("db-");
        ast.add_param_hole_value("env");
        ast.last_value_in_concatenation();
        ast.statement_done();

        assert_eq!(ast.to_string(), "create instance name=db-+{env}");
    }

    #[test]
    fn declaration_of_a_value() {
        let mut ast = Ast::new();
        ast.new_statement();
        ast.add_declaration_identifier("region");
        ast.add_value();
        ast.add_param_value("eu-west-1");
        ast.statement_done();

        assert_eq!(ast.to_string(), "region = eu-west-1");
        let decl = match &ast.statements[0].node {
            StmtNode::Declaration(d) => d,
            other => panic!("expected declaration, got {:?}", other),
        };
        match &decl.expr {
            Expr::Right(r) => {
                assert_eq!(r.result(), Some(Lit::Str("eu-west-1".into())));
                assert!(r.err().is_none());
            }
            other => panic!("expected right expression, got {:?}", other),
        }
    }

    #[test]
    fn declaration_of_a_command() {
        let mut ast = Ast::new();
        ast.new_statement();
        ast.add_declaration_identifier("vpc");
        ast.add_action("create").unwrap();
        ast.add_entity("vpc").unwrap();
        ast.add_param_key("cidr");
        ast.add_param_value("10.0.0.0/16");
        ast.statement_done();

        assert_eq!(ast.to_string(), "vpc = create vpc cidr=10.0.0.0/16");
    }

    #[test]
    fn right_expression_type_mismatch_is_reported() {
        let mut ast = Ast::new();
        ast.new_statement();
        ast.add_declaration_identifier("subject");
        ast.add_value();
        ast.add_alias_param("admin");
        ast.statement_done();

        let decl = match &ast.statements[0].node {
            StmtNode::Declaration(d) => d,
            other => panic!("expected declaration, got {:?}", other),
        };
        assert_eq!(decl.expr.result(), None);
        assert!(decl.expr.err().is_some());
    }
}
