use clove_common::{Result, CloveError, Span};


#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Single-char
    Assign, LBracket, RBracket, Comma, Plus, Newline,
    // Words
    Ident, Quoted,
    // Sigil-prefixed
    Ref,          // $name
    Alias,        // @name
    Hole,         // {name}
    OptionalHole, // {name?}
    Eof,
}


#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    // Payload with sigils/quotes stripped: the name of a ref/alias/hole,
    // the content of a quoted string, the word itself for Ident.
    pub text: String,
    pub span: Span,
    pub line: u32,
}


pub struct Lexer<'a> {
    src: &'a str,
    chars: std::str::Chars<'a>,
    cur: Option<char>,
    pos: usize,
    start: usize,
    line: u32,
}


impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        let mut l = Self { src, chars: src.chars(), cur: None, pos: 0, start: 0, line: 1 };
        l.advance();
        l
    }


    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut out = Vec::new();
        loop {
            let t = self.next_token()?;
            let eof = t.kind == TokenKind::Eof;
            out.push(t);
            if eof { break; }
        }
        Ok(out)
    }


    fn next_token(&mut self) -> Result<Token> {
        self.skip_ws_and_comments();
        self.start = self.pos;
        let ch = match self.cur { Some(c) => c, None => return Ok(self.make(TokenKind::Eof)) };
        match ch {
            '\n' => { self.advance(); let t = self.make(TokenKind::Newline); self.line += 1; Ok(t) }
            '=' => { self.advance(); Ok(self.make(TokenKind::Assign)) }
            '[' => { self.advance(); Ok(self.make(TokenKind::LBracket)) }
            ']' => { self.advance(); Ok(self.make(TokenKind::RBracket)) }
            ',' => { self.advance(); Ok(self.make(TokenKind::Comma)) }
            '+' => { self.advance(); Ok(self.make(TokenKind::Plus)) }
            '$' => { self.advance(); self.sigil_name(TokenKind::Ref) }
            '@' => { self.advance(); self.sigil_name(TokenKind::Alias) }
            '{' => self.hole(),
            '\'' | '"' => self.quoted(ch),
            c if is_word_char(c) => self.word(),
            _ => Err(CloveError(format!("unexpected char '{}' at line {}", ch, self.line)))
        }
    }

    // $name or @name; the sigil is already consumed.
    fn sigil_name(&mut self, kind: TokenKind) -> Result<Token> {
        let name_start = self.pos;
        while self.cur.map_or(false, is_name_char) { self.advance(); }
        if self.pos == name_start {
            return Err(CloveError(format!("empty name after '{}' at line {}", &self.src[self.start..name_start], self.line)));
        }
        let mut tok = self.make(kind);
        tok.text = self.src[name_start..self.pos].to_string();
        Ok(tok)
    }

    fn hole(&mut self) -> Result<Token> {
        self.advance(); // '{'
        let name_start = self.pos;
        while self.cur.map_or(false, is_name_char) { self.advance(); }
        let name_end = self.pos;
        let optional = self.cur == Some('?');
        if optional { self.advance(); }
        if self.cur != Some('}') {
            return Err(CloveError(format!("unterminated hole at line {}", self.line)));
        }
        self.advance(); // '}'
        if name_end == name_start {
            return Err(CloveError(format!("empty hole at line {}", self.line)));
        }
        let mut tok = self.make(if optional { TokenKind::OptionalHole } else { TokenKind::Hole });
        tok.text = self.src[name_start..name_end].to_string();
        Ok(tok)
    }

    fn quoted(&mut self, quote: char) -> Result<Token> {
        self.advance(); // opening quote
        let content_start = self.pos;
        while let Some(c) = self.cur {
            if c == quote { break; }
            if c == '\n' { return Err(CloveError(format!("unterminated string at line {}", self.line))); }
            self.advance();
        }
        if self.cur != Some(quote) {
            return Err(CloveError(format!("unterminated string at line {}", self.line)));
        }
        let content_end = self.pos;
        self.advance(); // closing quote
        let mut tok = self.make(TokenKind::Quoted);
        tok.text = self.src[content_start..content_end].to_string();
        Ok(tok)
    }

    fn word(&mut self) -> Result<Token> {
        while self.cur.map_or(false, is_word_char) { self.advance(); }
        Ok(self.make(TokenKind::Ident))
    }


    fn skip_ws_and_comments(&mut self) {
        loop {
            match self.cur {
                Some(c) if c.is_whitespace() && c != '\n' => { self.advance(); }
                Some('#') => { // comment to EOL
                    while let Some(c) = self.cur { if c == '\n' { break; } self.advance(); }
                }
                _ => break,
            }
        }
    }


    fn make(&self, kind: TokenKind) -> Token {
        let lexeme = self.src[self.start..self.pos].to_string();
        let text = lexeme.clone();
        Token { kind, lexeme, text, span: Span::new(self.start, self.pos), line: self.line }
    }


    // `pos` is always the byte offset of `cur`.
    fn advance(&mut self) {
        if let Some(c) = self.cur { self.pos += c.len_utf8(); }
        self.cur = self.chars.next();
    }
}


// Bare words may carry paths, CIDRs and ports: letters, digits, _ - . : /
fn is_word_char(c: char) -> bool { c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':' | '/') }
// Names behind $ @ { } stay map-key friendly: no ':' or '/'
fn is_name_char(c: char) -> bool { c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') }


#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn command_line_tokens() {
        let toks = Lexer::new("create instance count=3 name=web").tokenize().unwrap();
        let kinds: Vec<_> = toks.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(kinds, vec![
            TokenKind::Ident, TokenKind::Ident,
            TokenKind::Ident, TokenKind::Assign, TokenKind::Ident,
            TokenKind::Ident, TokenKind::Assign, TokenKind::Ident,
            TokenKind::Eof,
        ]);
        assert_eq!(toks[0].text, "create");
        assert_eq!(toks[4].text, "3");
    }

    #[test]
    fn sigils_carry_names() {
        let toks = Lexer::new("vpc=$vpc subjects=[@admin,@ops] type={t} tag={opt?}").tokenize().unwrap();
        let refs: Vec<_> = toks.iter().filter(|t| t.kind == TokenKind::Ref).map(|t| t.text.clone()).collect();
        assert_eq!(refs, vec!["vpc"]);
        let aliases: Vec<_> = toks.iter().filter(|t| t.kind == TokenKind::Alias).map(|t| t.text.clone()).collect();
        assert_eq!(aliases, vec!["admin", "ops"]);
        assert!(toks.iter().any(|t| t.kind == TokenKind::Hole && t.text == "t"));
        assert!(toks.iter().any(|t| t.kind == TokenKind::OptionalHole && t.text == "opt"));
    }

    #[test]
    fn quoted_strings_both_quote_chars() {
        let toks = Lexer::new("name='my instance' note=\"a,b\"").tokenize().unwrap();
        let quoted: Vec<_> = toks.iter().filter(|t| t.kind == TokenKind::Quoted).map(|t| t.text.clone()).collect();
        assert_eq!(quoted, vec!["my instance", "a,b"]);
    }

    #[test]
    fn comments_and_newlines() {
        assert_eq!(kinds("# a comment\ncreate vpc\n"), vec![
            TokenKind::Newline, TokenKind::Ident, TokenKind::Ident, TokenKind::Newline, TokenKind::Eof,
        ]);
    }

    #[test]
    fn cidr_and_path_words_stay_whole() {
        let toks = Lexer::new("cidr=10.0.0.0/16 out=/var/log:ro").tokenize().unwrap();
        let words: Vec<_> = toks.iter().filter(|t| t.kind == TokenKind::Ident).map(|t| t.text.clone()).collect();
        assert_eq!(words, vec!["cidr", "10.0.0.0/16", "out", "/var/log:ro"]);
    }

    #[test]
    fn unterminated_hole_is_an_error() {
        assert!(Lexer::new("type={t").tokenize().is_err());
        assert!(Lexer::new("name='oops").tokenize().is_err());
    }
}
