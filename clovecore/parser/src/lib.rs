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
Copyright (C) 2026, Blackrush LLC, All Rights Reserved
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
//! Line parser for Clove templates: one statement per line, driven straight
//! into the AST's builder callbacks
use clove_common::{CloveError, Result};
use clove_lexer::{Lexer, Token, TokenKind};
use clove_ast::Ast;
use clove_ast::catalog::is_invalid_action;

pub mod service;

pub fn parse(src: &str) -> Result<Ast> {
    let tokens = Lexer::new(src).tokenize()?;
    Parser::new(tokens).parse_template()
}

struct Parser { tokens: Vec<Token>, i: usize }

impl Parser {
    fn new(tokens: Vec<Token>) -> Self { Self { tokens, i: 0 } }

    fn parse_template(&mut self) -> Result<Ast> {
        let mut ast = Ast::new();
        loop {
            // every physical line opens a statement; the builder discards
            // lines that end up empty
            ast.new_statement();
            self.parse_statement(&mut ast)?;
            ast.statement_done();
            if self.match_k(TokenKind::Newline) {
                if self.check(TokenKind::Eof) { break; }
                continue;
            }
            if self.check(TokenKind::Eof) { break; }
            return Err(CloveError(format!(
                "parse error at line {}: unexpected '{}'",
                self.peek_line(), self.peek_lexeme()
            )));
        }
        Ok(ast)
    }

    fn parse_statement(&mut self, ast: &mut Ast) -> Result<()> {
        if self.check(TokenKind::Newline) || self.check(TokenKind::Eof) { return Ok(()); }
        // ident '=' opens a declaration
        if self.check(TokenKind::Ident) && self.peek2_kind() == Some(TokenKind::Assign) {
            let ident = self.next().unwrap();
            ast.add_declaration_identifier(&ident.text);
            let _ = self.next(); // '='
            return self.parse_expression(ast);
        }
        self.parse_command(ast)
    }

    // Right of a declaration: a command when the first word is a known
    // action, a plain value otherwise.
    fn parse_expression(&mut self, ast: &mut Ast) -> Result<()> {
        if self.check(TokenKind::Ident) && !is_invalid_action(&self.peek_text()) {
            return self.parse_command(ast);
        }
        ast.add_value();
        self.parse_param_value(ast)
    }

    fn parse_command(&mut self, ast: &mut Ast) -> Result<()> {
        let action = self.expect_word("action")?;
        ast.add_action(&action)?;
        let entity = self.expect_word("entity")?;
        ast.add_entity(&entity)?;
        while self.check(TokenKind::Ident) {
            let key = self.next().unwrap();
            self.expect(TokenKind::Assign)?;
            ast.add_param_key(&key.text);
            self.parse_param_value(ast)?;
        }
        Ok(())
    }

    fn parse_param_value(&mut self, ast: &mut Ast) -> Result<()> {
        if self.match_k(TokenKind::LBracket) {
            ast.add_first_value_in_list();
            if !self.check(TokenKind::RBracket) {
                loop {
                    self.parse_term(ast)?;
                    if !self.match_k(TokenKind::Comma) { break; }
                }
            }
            self.expect(TokenKind::RBracket)?;
            ast.last_value_in_list();
            return Ok(());
        }
        // a '+' after the first term makes the whole value a concatenation
        if self.peek2_kind() == Some(TokenKind::Plus) {
            ast.add_first_value_in_concatenation();
            self.parse_term(ast)?;
            while self.match_k(TokenKind::Plus) {
                self.parse_term(ast)?;
            }
            ast.last_value_in_concatenation();
            return Ok(());
        }
        self.parse_term(ast)
    }

    fn parse_term(&mut self, ast: &mut Ast) -> Result<()> {
        let t = match self.next() {
            Some(t) => t,
            None => return Err(CloveError("parse error: unexpected end of input".into())),
        };
        match t.kind {
            TokenKind::Ident => ast.add_param_value(&t.text),
            TokenKind::Quoted => ast.add_string_value(&t.text),
            TokenKind::Ref => ast.add_param_ref_value(&t.text),
            TokenKind::Alias => ast.add_alias_param(&t.text),
            TokenKind::Hole => ast.add_param_hole_value(&t.text),
            TokenKind::OptionalHole => ast.add_optional_param_hole_value(&t.text),
            other => {
                return Err(CloveError(format!(
                    "parse error at line {}: unexpected {:?} in value", t.line, other
                )))
            }
        }
        Ok(())
    }

    // small helpers
    fn expect(&mut self, k: TokenKind) -> Result<Token> {
        if self.check(k.clone()) { Ok(self.next().unwrap()) } else { Err(CloveError(format!("parse error at line {}: expected {:?}", self.peek_line(), k))) }
    }
    fn expect_word(&mut self, what: &str) -> Result<String> {
        if self.check(TokenKind::Ident) { Ok(self.next().unwrap().text) } else { Err(CloveError(format!("parse error at line {}: expected {}", self.peek_line(), what))) }
    }
    fn check(&self, k: TokenKind) -> bool { self.peek_kind() == Some(k) }
    fn match_k(&mut self, k: TokenKind) -> bool { if self.check(k) { self.next(); true } else { false } }
    fn peek_kind(&self) -> Option<TokenKind> { self.tokens.get(self.i).map(|t| t.kind.clone()) }
    fn peek2_kind(&self) -> Option<TokenKind> { self.tokens.get(self.i + 1).map(|t| t.kind.clone()) }
    fn peek_text(&self) -> String { self.tokens.get(self.i).map(|t| t.text.clone()).unwrap_or_default() }
    fn peek_lexeme(&self) -> String { self.tokens.get(self.i).map(|t| t.lexeme.clone()).unwrap_or_default() }
    fn peek_line(&self) -> u32 { self.tokens.get(self.i).map(|t| t.line).unwrap_or(0) }
    fn next(&mut self) -> Option<Token> { let t = self.tokens.get(self.i).cloned(); if t.is_some() { self.i += 1; } t }
}
