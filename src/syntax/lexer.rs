//! Britescript Lexer
//!
//! Deterministic, priority-ordered tokenizer. At every position the lexer skips
//! whitespace and `//` comments, then tries in order: atoms, keywords, punctuation,
//! identifiers, numbers and strings. The first pattern that matches wins.
//!
//! Method bodies inside `impl` blocks are host code. The lexer does not tokenize
//! them: everything between a method's braces becomes one [`TokenKind::RawBody`]
//! token, found by scanning for the matching `}` outside strings and comments.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::error::LexError;
use super::Span;

/// Every kind of token the grammar knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // Keywords
    Struct,
    Trait,
    Impl,
    For,
    Let,
    Return,
    Match,
    When,

    // Punctuation
    LCurly,
    RCurly,
    LParen,
    RParen,
    LAngle,
    RAngle,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Dot,
    Semicolon,
    Pipe,
    FatArrow,
    Equals,
    Underscore,

    // Operators
    StrictEq,
    StrictNotEq,
    EqEq,
    NotEq,
    LtEq,
    GtEq,
    AndAnd,
    OrOr,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,

    // Literals and names
    Identifier,
    Number,
    String,
    Atom,
    RawBody,
}

impl TokenKind {
    /// How the kind is named in diagnostics.
    pub fn describe(&self) -> &'static str {
        use TokenKind::*;
        match self {
            Struct => "'struct'",
            Trait => "'trait'",
            Impl => "'impl'",
            For => "'for'",
            Let => "'let'",
            Return => "'return'",
            Match => "'match'",
            When => "'when'",
            LCurly => "'{'",
            RCurly => "'}'",
            LParen => "'('",
            RParen => "')'",
            LAngle => "'<'",
            RAngle => "'>'",
            LBracket => "'['",
            RBracket => "']'",
            Comma => "','",
            Colon => "':'",
            Dot => "'.'",
            Semicolon => "';'",
            Pipe => "'|>'",
            FatArrow => "'=>'",
            Equals => "'='",
            Underscore => "'_'",
            StrictEq => "'==='",
            StrictNotEq => "'!=='",
            EqEq => "'=='",
            NotEq => "'!='",
            LtEq => "'<='",
            GtEq => "'>='",
            AndAnd => "'&&'",
            OrOr => "'||'",
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            Slash => "'/'",
            Percent => "'%'",
            Bang => "'!'",
            Identifier => "identifier",
            Number => "number",
            String => "string",
            Atom => "atom",
            RawBody => "method body",
        }
    }
}

/// A single lexeme with its kind and position in the block text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

// ============================================================================
// PATTERN TABLE
// ============================================================================

static SKIP: Lazy<Regex> =
    Lazy::new(|| compile_pattern(r"^(?:\s+|//[^\n]*|/\*(?s:.*?)\*/)+"));
static KEYWORD: Lazy<Regex> =
    Lazy::new(|| compile_pattern(r"^(?:struct|trait|impl|for|let|return|match|when)\b"));
static ATOM: Lazy<Regex> = Lazy::new(|| compile_pattern(r"^:[A-Za-z_]\w*"));
static UNDERSCORE: Lazy<Regex> = Lazy::new(|| compile_pattern(r"^_\b"));
static IDENTIFIER: Lazy<Regex> = Lazy::new(|| compile_pattern(r"^[A-Za-z_$][\w$]*"));
static NUMBER: Lazy<Regex> = Lazy::new(|| compile_pattern(r"^\d+(?:\.\d+)?"));
static STRING: Lazy<Regex> = Lazy::new(|| {
    compile_pattern(r#"^(?:"(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*'|`(?:[^`\\]|\\.)*`)"#)
});

/// Fixed punctuation, longest lexeme first so `|>`, `=>` and `===` win over their prefixes.
const PUNCTUATION: &[(&str, TokenKind)] = &[
    ("===", TokenKind::StrictEq),
    ("!==", TokenKind::StrictNotEq),
    ("|>", TokenKind::Pipe),
    ("=>", TokenKind::FatArrow),
    ("==", TokenKind::EqEq),
    ("!=", TokenKind::NotEq),
    ("<=", TokenKind::LtEq),
    (">=", TokenKind::GtEq),
    ("&&", TokenKind::AndAnd),
    ("||", TokenKind::OrOr),
    ("{", TokenKind::LCurly),
    ("}", TokenKind::RCurly),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("<", TokenKind::LAngle),
    (">", TokenKind::RAngle),
    ("[", TokenKind::LBracket),
    ("]", TokenKind::RBracket),
    (",", TokenKind::Comma),
    (":", TokenKind::Colon),
    (".", TokenKind::Dot),
    (";", TokenKind::Semicolon),
    ("=", TokenKind::Equals),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    ("!", TokenKind::Bang),
];

// Patterns are crate-internal literals exercised by unit tests.
pub(crate) fn compile_pattern(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(err) => unreachable!("invalid lexer pattern {pattern:?}: {err}"),
    }
}

fn keyword_kind(lexeme: &str) -> Option<TokenKind> {
    Some(match lexeme {
        "struct" => TokenKind::Struct,
        "trait" => TokenKind::Trait,
        "impl" => TokenKind::Impl,
        "for" => TokenKind::For,
        "let" => TokenKind::Let,
        "return" => TokenKind::Return,
        "match" => TokenKind::Match,
        "when" => TokenKind::When,
        _ => return None,
    })
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Tokenize the text of one DSL block.
pub fn tokenize(text: &str) -> Result<Vec<Token>, LexError> {
    let mut cursor = Cursor { text, pos: 0 };
    let mut braces = BraceTracker::default();
    let mut tokens = Vec::new();

    loop {
        cursor.skip_trivia();
        if cursor.at_end() {
            break;
        }
        let token = cursor.next_token().ok_or_else(|| cursor.error())?;
        let opens_body = braces.track(&token);
        tokens.push(token);
        if opens_body {
            tokens.extend(cursor.raw_body());
        }
    }

    Ok(tokens)
}

/// Follows `{`/`}` tokens to spot the brace that opens a method body: one level
/// below the brace that opened an `impl` block.
#[derive(Debug, Default)]
struct BraceTracker {
    depth: usize,
    impl_pending: bool,
    member_depth: Option<usize>,
}

impl BraceTracker {
    fn track(&mut self, token: &Token) -> bool {
        match token.kind {
            TokenKind::Impl => {
                self.impl_pending = true;
                false
            }
            TokenKind::LCurly => {
                let opens_body = !self.impl_pending && self.member_depth == Some(self.depth);
                if self.impl_pending {
                    self.impl_pending = false;
                    self.member_depth = Some(self.depth + 1);
                }
                self.depth += 1;
                opens_body
            }
            TokenKind::RCurly => {
                self.depth = self.depth.saturating_sub(1);
                if self.member_depth.is_some_and(|d| self.depth < d) {
                    self.member_depth = None;
                }
                false
            }
            _ => false,
        }
    }
}

/// Byte index of the `}` closing an already open brace, skipping braces inside
/// strings, template literals and comments.
fn matching_brace(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' if depth == 0 => return Some(i),
            b'}' => depth -= 1,
            quote @ (b'"' | b'\'' | b'`') => i = closing_quote(bytes, i, quote),
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = text[i..].find('\n').map_or(bytes.len(), |n| i + n);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = text[i + 2..].find("*/").map_or(bytes.len(), |n| i + n + 3);
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn closing_quote(bytes: &[u8], open: usize, quote: u8) -> usize {
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b if b == quote => return i,
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn skip_trivia(&mut self) {
        if let Some(m) = SKIP.find(self.rest()) {
            self.pos += m.end();
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        let rest = self.rest();

        if self.atom_allowed() {
            if let Some(m) = ATOM.find(rest) {
                return Some(self.take(TokenKind::Atom, m.end()));
            }
        }

        if let Some(m) = KEYWORD.find(rest) {
            let kind = keyword_kind(m.as_str())?;
            return Some(self.take(kind, m.end()));
        }

        if let Some(m) = UNDERSCORE.find(rest) {
            return Some(self.take(TokenKind::Underscore, m.end()));
        }

        if let Some((lexeme, kind)) = PUNCTUATION.iter().find(|(p, _)| rest.starts_with(*p)) {
            return Some(self.take(*kind, lexeme.len()));
        }

        if let Some(m) = IDENTIFIER.find(rest) {
            return Some(self.take(TokenKind::Identifier, m.end()));
        }

        if let Some(m) = NUMBER.find(rest) {
            return Some(self.take(TokenKind::Number, m.end()));
        }

        if let Some(m) = STRING.find(rest) {
            return Some(self.take(TokenKind::String, m.end()));
        }

        None
    }

    /// `:name` is an atom unless the colon is glued to what it annotates, as in
    /// `age:number` or `greet():string`.
    fn atom_allowed(&self) -> bool {
        match self.text[..self.pos].chars().next_back() {
            Some(prev) => !(prev.is_alphanumeric() || matches!(prev, '_' | ')' | ']' | '>')),
            None => true,
        }
    }

    /// Consume host text up to, not including, the `}` that closes the current
    /// method body. An unclosed body runs to the end of the block.
    fn raw_body(&mut self) -> Option<Token> {
        let rest = self.rest();
        let len = matching_brace(rest).unwrap_or(rest.len());
        if rest[..len].trim().is_empty() {
            self.pos += len;
            return None;
        }
        Some(self.take(TokenKind::RawBody, len))
    }

    fn take(&mut self, kind: TokenKind, len: usize) -> Token {
        let start = self.pos;
        self.pos += len;
        Token {
            kind,
            lexeme: self.text[start..self.pos].to_string(),
            span: Span::new(start, self.pos),
        }
    }

    fn error(&self) -> LexError {
        let snippet: String = self
            .rest()
            .chars()
            .take_while(|c| !c.is_whitespace())
            .take(16)
            .collect();
        let len = snippet.len().max(1);
        LexError {
            span: Span::new(self.pos, self.pos + len),
            snippet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn keywords_win_over_identifiers() {
        use TokenKind::*;
        assert_eq!(
            kinds("struct trait impl for let return match when"),
            vec![Struct, Trait, Impl, For, Let, Return, Match, When]
        );
    }

    #[test]
    fn keyword_prefix_is_an_identifier() {
        let tokens = tokenize("structure letter").unwrap();
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Identifier));
        assert_eq!(tokens[0].lexeme, "structure");
    }

    #[test]
    fn pipe_and_arrow_are_single_tokens() {
        use TokenKind::*;
        assert_eq!(
            kinds("a |> b => c = d == e === f"),
            vec![
                Identifier, Pipe, Identifier, FatArrow, Identifier, Equals, Identifier, EqEq,
                Identifier, StrictEq, Identifier
            ]
        );
    }

    #[test]
    fn atoms_versus_type_colons() {
        use TokenKind::*;
        assert_eq!(kinds("age:number"), vec![Identifier, Colon, Identifier]);
        assert_eq!(kinds("age: number"), vec![Identifier, Colon, Identifier]);
        assert_eq!(
            kinds("greet():string"),
            vec![Identifier, LParen, RParen, Colon, Identifier]
        );
        assert_eq!(kinds(":ok => 1"), vec![Atom, FatArrow, Number]);
        assert_eq!(
            kinds("{ status: :active }"),
            vec![LCurly, Identifier, Colon, Atom, RCurly]
        );
    }

    #[test]
    fn underscore_alone_is_wildcard() {
        use TokenKind::*;
        assert_eq!(kinds("_ _name"), vec![Underscore, Identifier]);
    }

    #[test]
    fn strings_keep_quotes_and_escapes() {
        let tokens = tokenize(r#""say \"hi\"" 42 3.5"#).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].lexeme, r#""say \"hi\"""#);
        assert_eq!(tokens[1].lexeme, "42");
        assert_eq!(tokens[2].lexeme, "3.5");
    }

    #[test]
    fn single_quoted_and_template_strings() {
        let tokens = tokenize("'a' `x ${y}\nz`").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[1].lexeme, "`x ${y}\nz`");
    }

    #[test]
    fn method_bodies_are_one_raw_token() {
        use TokenKind::*;
        let text = r#"impl User { f() { let x: string | null = s.replace(/\s+/g, "}"); return $el & x; } g() {} }"#;
        let tokens = tokenize(text).unwrap();
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![
                Impl, Identifier, LCurly, Identifier, LParen, RParen, LCurly, RawBody, RCurly,
                Identifier, LParen, RParen, LCurly, RCurly, RCurly
            ]
        );
        assert_eq!(
            tokens[7].lexeme,
            r#" let x: string | null = s.replace(/\s+/g, "}"); return $el & x; "#
        );
    }

    #[test]
    fn raw_body_skips_comments_and_nested_braces() {
        let text = "impl A {\n  run() {\n    /* it's } */\n    if (x) { y(); } // }\n  }\n}";
        let tokens = tokenize(text).unwrap();
        let body = tokens.iter().find(|t| t.kind == TokenKind::RawBody).unwrap();
        assert!(body.lexeme.ends_with("// }\n  "));
        assert_eq!(tokens.last().unwrap().kind, TokenKind::RCurly);
    }

    #[test]
    fn trait_signatures_are_still_tokenized() {
        use TokenKind::*;
        assert_eq!(
            kinds("trait T { f(): string }"),
            vec![Trait, Identifier, LCurly, Identifier, LParen, RParen, Colon, Identifier, RCurly]
        );
    }

    #[test]
    fn block_comments_and_dollar_identifiers() {
        use TokenKind::*;
        assert_eq!(kinds("let /* note */ $el = $"), vec![Let, Identifier, Equals, Identifier]);
    }

    #[test]
    fn comments_are_skipped() {
        use TokenKind::*;
        assert_eq!(kinds("let // trailing\n x"), vec![Let, Identifier]);
    }

    #[test]
    fn spans_point_into_text() {
        let tokens = tokenize("let  x").unwrap();
        assert_eq!(tokens[1].span, Span::new(5, 6));
    }

    #[test]
    fn unknown_character_is_a_lex_error() {
        let err = tokenize("let x = @home").unwrap_err();
        assert_eq!(err.span.start, 8);
        assert_eq!(err.snippet, "@home");
    }

    #[test]
    fn number_then_identifier() {
        use TokenKind::*;
        assert_eq!(kinds("123Bad"), vec![Number, Identifier]);
    }
}
