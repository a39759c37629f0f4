//! Britescript Parser
//!
//! Ordered-choice recursive descent over the token stream. Each alternative runs
//! inside [`Parser::attempt`], which rewinds on failure. Every time the parser looks
//! for a token and does not find it, the expectation is recorded against the current
//! position; when the whole parse fails, the error reports everything that was
//! expected at the furthest position reached.
//!
//! This parser is purely syntactic. Method bodies arrive from the lexer as a single
//! raw token and are kept without being interpreted.

use std::collections::BTreeSet;

use super::cst::{CstNode, Rule};
use super::error::ParseError;
use super::lexer::{Token, TokenKind};
use super::Span;

use TokenKind::*;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parse a block's token stream into a `Program` CST node.
pub fn parse(tokens: &[Token]) -> Result<CstNode, ParseError> {
    let mut parser = Parser::new(tokens);
    match parser.program() {
        Ok(program) => Ok(program),
        Err(Backtrack) => Err(parser.error()),
    }
}

/// An alternative failed; what was expected is accumulated on the parser.
#[derive(Debug)]
struct Backtrack;

type PResult<T> = Result<T, Backtrack>;

type RuleFn<'t> = fn(&mut Parser<'t>) -> PResult<CstNode>;

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    furthest: usize,
    expected: BTreeSet<&'static str>,
}

// ============================================================================
// TOKEN CURSOR
// ============================================================================

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            furthest: 0,
            expected: BTreeSet::new(),
        }
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    fn peek_nth_kind(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Record that `what` would have been accepted at the current position.
    fn expected(&mut self, what: &'static str) {
        if self.pos > self.furthest {
            self.furthest = self.pos;
            self.expected.clear();
        }
        if self.pos == self.furthest {
            self.expected.insert(what);
        }
    }

    /// Consume the current token. Callers check `peek_kind` first.
    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        token
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            Some(self.bump())
        } else {
            self.expected(kind.describe());
            None
        }
    }

    fn expect(&mut self, kind: TokenKind) -> PResult<Token> {
        self.eat(kind).ok_or(Backtrack)
    }

    /// Run an alternative, rewinding the cursor if it fails.
    fn attempt<T>(&mut self, alternative: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        let start = self.pos;
        let result = alternative(self);
        if result.is_err() {
            self.pos = start;
        }
        result
    }

    fn error(&self) -> ParseError {
        let (span, found) = match self.tokens.get(self.furthest) {
            Some(token) => (token.span, format!("'{}'", token.lexeme)),
            None => {
                let end = self.tokens.last().map_or(0, |t| t.span.end);
                (Span::new(end, end), "end of input".to_string())
            }
        };
        ParseError {
            span,
            expected: self.expected.iter().map(|s| s.to_string()).collect(),
            found,
        }
    }
}

// ============================================================================
// DECLARATIONS
// ============================================================================

impl<'t> Parser<'t> {
    fn program(&mut self) -> PResult<CstNode> {
        let mut program = CstNode::new(Rule::Program, Span::default());
        while !self.at_end() {
            let statement = self.statement()?;
            program.push_node("statement", statement);
        }
        Ok(program)
    }

    fn statement(&mut self) -> PResult<CstNode> {
        let alternatives: [RuleFn<'t>; 6] = [
            Self::struct_decl,
            Self::trait_decl,
            Self::impl_block,
            Self::let_decl,
            Self::pipe_statement,
            Self::match_statement,
        ];
        for alternative in alternatives {
            if let Ok(node) = self.attempt(alternative) {
                return Ok(node);
            }
        }
        Err(Backtrack)
    }

    /// `struct Name<G,...>? ( ';' | '{' (field ':' type ';'?)* '}' ';'? )`
    fn struct_decl(&mut self) -> PResult<CstNode> {
        let keyword = self.expect(Struct)?;
        let mut node = CstNode::new(Rule::StructDecl, keyword.span);
        node.push_token("name", self.expect(Identifier)?);
        self.generics(&mut node)?;

        if let Some(semi) = self.eat(Semicolon) {
            node.push_token("end", semi);
            return Ok(node);
        }

        self.expect(LCurly)?;
        loop {
            if let Some(close) = self.eat(RCurly) {
                node.push_token("end", close);
                break;
            }
            node.push_node("field", self.field()?);
        }
        self.eat(Semicolon);
        Ok(node)
    }

    fn field(&mut self) -> PResult<CstNode> {
        let name = self.expect(Identifier)?;
        let mut node = CstNode::new(Rule::Field, name.span);
        node.push_token("name", name);
        self.expect(Colon)?;
        node.push_node("type", self.type_ref()?);
        if self.eat(Semicolon).is_none() {
            self.eat(Comma);
        }
        Ok(node)
    }

    /// `<A, B>` after a declaration name.
    fn generics(&mut self, node: &mut CstNode) -> PResult<()> {
        if self.eat(LAngle).is_none() {
            return Ok(());
        }
        node.push_token("generic", self.expect(Identifier)?);
        while self.eat(Comma).is_some() {
            node.push_token("generic", self.expect(Identifier)?);
        }
        self.expect(RAngle)?;
        Ok(())
    }

    /// `Name ('<' type (',' type)* '>')? ('[' ']')*`
    fn type_ref(&mut self) -> PResult<CstNode> {
        let name = self.expect(Identifier)?;
        let mut node = CstNode::new(Rule::TypeRef, name.span);
        node.push_token("name", name);

        if self.eat(LAngle).is_some() {
            node.push_node("arg", self.type_ref()?);
            while self.eat(Comma).is_some() {
                node.push_node("arg", self.type_ref()?);
            }
            node.push_token("end", self.expect(RAngle)?);
        }

        while self.at(LBracket) && self.peek_nth_kind(1) == Some(RBracket) {
            node.push_token("array", self.bump());
            node.push_token("end", self.bump());
        }
        Ok(node)
    }

    /// `trait Name<...>? '{' traitMethod* '}'`
    fn trait_decl(&mut self) -> PResult<CstNode> {
        let keyword = self.expect(Trait)?;
        let mut node = CstNode::new(Rule::TraitDecl, keyword.span);
        node.push_token("name", self.expect(Identifier)?);
        self.generics(&mut node)?;

        self.expect(LCurly)?;
        loop {
            if let Some(close) = self.eat(RCurly) {
                node.push_token("end", close);
                break;
            }
            node.push_node("method", self.trait_method()?);
        }
        self.eat(Semicolon);
        Ok(node)
    }

    /// `name '(' params? ')' (':' type)? ';'?`
    fn trait_method(&mut self) -> PResult<CstNode> {
        let name = self.expect(Identifier)?;
        let mut node = CstNode::new(Rule::TraitMethod, name.span);
        node.push_token("name", name);
        self.expect(LParen)?;
        let close = self.params(&mut node)?;
        node.push_token("end", close);
        if self.eat(Colon).is_some() {
            node.push_node("return_type", self.type_ref()?);
        }
        if let Some(semi) = self.eat(Semicolon) {
            node.push_token("end", semi);
        }
        Ok(node)
    }

    /// Parameters after an opening `(`; returns the closing `)`.
    fn params(&mut self, node: &mut CstNode) -> PResult<Token> {
        if let Some(close) = self.eat(RParen) {
            return Ok(close);
        }
        loop {
            node.push_node("param", self.param()?);
            if self.eat(Comma).is_none() {
                break;
            }
        }
        self.expect(RParen)
    }

    fn param(&mut self) -> PResult<CstNode> {
        let name = self.expect(Identifier)?;
        let mut node = CstNode::new(Rule::Param, name.span);
        node.push_token("name", name);
        self.expect(Colon)?;
        node.push_node("type", self.type_ref()?);
        Ok(node)
    }

    /// `impl <...>? Name ('for' Type)? '{' methodDecl* '}'`
    ///
    /// With `for`, the first name is the trait and the node becomes a `TraitImpl`.
    fn impl_block(&mut self) -> PResult<CstNode> {
        let keyword = self.expect(Impl)?;
        let mut node = CstNode::new(Rule::ImplBlock, keyword.span);
        self.generics(&mut node)?;

        let first = self.expect(Identifier)?;
        if self.eat(For).is_some() {
            node.rule = Rule::TraitImpl;
            node.push_token("trait", first);
            node.push_token("type", self.expect(Identifier)?);
        } else {
            node.push_token("type", first);
        }

        self.expect(LCurly)?;
        loop {
            if let Some(close) = self.eat(RCurly) {
                node.push_token("end", close);
                break;
            }
            node.push_node("method", self.method_decl()?);
        }
        self.eat(Semicolon);
        Ok(node)
    }

    /// `name '(' params? ')' (':' type)? '{' rawBody? '}'`
    fn method_decl(&mut self) -> PResult<CstNode> {
        let name = self.expect(Identifier)?;
        let mut node = CstNode::new(Rule::MethodDecl, name.span);
        node.push_token("name", name);
        self.expect(LParen)?;
        let close = self.params(&mut node)?;
        node.push_token("end", close);
        if self.eat(Colon).is_some() {
            node.push_node("return_type", self.type_ref()?);
        }

        node.push_token("open", self.expect(LCurly)?);
        if self.at(RawBody) {
            node.push_token("body", self.bump());
        }
        node.push_token("close", self.expect(RCurly)?);
        Ok(node)
    }

    /// `let name = expression ';'?`
    fn let_decl(&mut self) -> PResult<CstNode> {
        let keyword = self.expect(Let)?;
        let mut node = CstNode::new(Rule::LetDecl, keyword.span);
        node.push_token("name", self.expect(Identifier)?);
        self.expect(Equals)?;
        node.push_node("value", self.expression()?);
        if let Some(semi) = self.eat(Semicolon) {
            node.push_token("end", semi);
        }
        Ok(node)
    }

    /// An expression statement must contain at least one `|>`.
    fn pipe_statement(&mut self) -> PResult<CstNode> {
        let expr = self.expression()?;
        if expr.rule != Rule::PipeExpr {
            self.expected(Pipe.describe());
            return Err(Backtrack);
        }
        self.eat(Semicolon);
        Ok(expr)
    }

    fn match_statement(&mut self) -> PResult<CstNode> {
        let expr = self.match_expr()?;
        self.eat(Semicolon);
        Ok(expr)
    }
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

impl<'t> Parser<'t> {
    fn expression(&mut self) -> PResult<CstNode> {
        self.pipeline()
    }

    /// `expression ('|>' dottedMemberPath args?)*`, the loosest-binding operator.
    fn pipeline(&mut self) -> PResult<CstNode> {
        let base = self.logical_or()?;
        if !self.at(Pipe) {
            return Ok(base);
        }
        let mut node = CstNode::new(Rule::PipeExpr, base.span);
        node.push_node("base", base);
        while self.eat(Pipe).is_some() {
            node.push_node("stage", self.pipe_stage()?);
        }
        Ok(node)
    }

    fn pipe_stage(&mut self) -> PResult<CstNode> {
        let first = self.expect(Identifier)?;
        let mut node = CstNode::new(Rule::PipeStage, first.span);
        node.push_token("segment", first);
        while self.at(Dot) {
            self.bump();
            node.push_token("segment", self.expect(Identifier)?);
        }
        if self.at(LParen) {
            self.bump();
            let close = self.arguments(&mut node)?;
            node.push_token("end", close);
        }
        Ok(node)
    }

    /// Call arguments after an opening `(`; returns the closing `)`.
    fn arguments(&mut self, node: &mut CstNode) -> PResult<Token> {
        if let Some(close) = self.eat(RParen) {
            return Ok(close);
        }
        loop {
            node.push_node("arg", self.expression()?);
            if self.eat(Comma).is_none() {
                break;
            }
        }
        self.expect(RParen)
    }

    /// One left-associative precedence level.
    fn binary(&mut self, ops: &[TokenKind], next: RuleFn<'t>) -> PResult<CstNode> {
        let mut left = next(self)?;
        while self.peek_kind().is_some_and(|k| ops.contains(&k)) {
            let op = self.bump();
            let right = next(self)?;
            let mut node = CstNode::new(Rule::Binary, left.span);
            node.push_node("left", left);
            node.push_token("op", op);
            node.push_node("right", right);
            left = node;
        }
        Ok(left)
    }

    fn logical_or(&mut self) -> PResult<CstNode> {
        self.binary(&[OrOr], Self::logical_and)
    }

    fn logical_and(&mut self) -> PResult<CstNode> {
        self.binary(&[AndAnd], Self::equality)
    }

    fn equality(&mut self) -> PResult<CstNode> {
        self.binary(&[EqEq, NotEq, StrictEq, StrictNotEq], Self::comparison)
    }

    fn comparison(&mut self) -> PResult<CstNode> {
        self.binary(&[LAngle, RAngle, LtEq, GtEq], Self::additive)
    }

    fn additive(&mut self) -> PResult<CstNode> {
        self.binary(&[Plus, Minus], Self::multiplicative)
    }

    fn multiplicative(&mut self) -> PResult<CstNode> {
        self.binary(&[Star, Slash, Percent], Self::unary)
    }

    fn unary(&mut self) -> PResult<CstNode> {
        if !matches!(self.peek_kind(), Some(Bang | Minus)) {
            return self.postfix();
        }
        let op = self.bump();
        let mut node = CstNode::new(Rule::Unary, op.span);
        node.push_token("op", op);
        node.push_node("operand", self.unary()?);
        Ok(node)
    }

    fn postfix(&mut self) -> PResult<CstNode> {
        let mut expr = self.primary()?;
        loop {
            expr = match self.peek_kind() {
                Some(Dot) => {
                    self.bump();
                    let mut node = CstNode::new(Rule::Member, expr.span);
                    node.push_node("object", expr);
                    node.push_token("property", self.expect(Identifier)?);
                    node
                }
                Some(LParen) => {
                    self.bump();
                    let mut node = CstNode::new(Rule::Call, expr.span);
                    node.push_node("callee", expr);
                    let close = self.arguments(&mut node)?;
                    node.push_token("end", close);
                    node
                }
                Some(LBracket) => {
                    self.bump();
                    let mut node = CstNode::new(Rule::Index, expr.span);
                    node.push_node("object", expr);
                    node.push_node("index", self.expression()?);
                    node.push_token("end", self.expect(RBracket)?);
                    node
                }
                _ => return Ok(expr),
            };
        }
    }

    fn primary(&mut self) -> PResult<CstNode> {
        match self.peek_kind() {
            Some(String | Number | Atom | Identifier) => {
                let token = self.bump();
                let mut node = CstNode::new(Rule::Primary, token.span);
                node.push_token("value", token);
                Ok(node)
            }
            Some(LParen) => {
                let open = self.bump();
                let mut node = CstNode::new(Rule::Group, open.span);
                node.push_node("inner", self.expression()?);
                node.push_token("end", self.expect(RParen)?);
                Ok(node)
            }
            Some(LBracket) => self.array_literal(),
            Some(LCurly) => self.object_literal(),
            Some(Match) => self.match_expr(),
            _ => {
                self.expected("expression");
                Err(Backtrack)
            }
        }
    }

    fn array_literal(&mut self) -> PResult<CstNode> {
        let open = self.expect(LBracket)?;
        let mut node = CstNode::new(Rule::ArrayLiteral, open.span);
        loop {
            if let Some(close) = self.eat(RBracket) {
                node.push_token("end", close);
                return Ok(node);
            }
            node.push_node("element", self.expression()?);
            if self.eat(Comma).is_none() {
                node.push_token("end", self.expect(RBracket)?);
                return Ok(node);
            }
        }
    }

    /// `{ key: value, shorthand }`
    fn object_literal(&mut self) -> PResult<CstNode> {
        let open = self.expect(LCurly)?;
        let mut node = CstNode::new(Rule::ObjectLiteral, open.span);
        loop {
            if let Some(close) = self.eat(RCurly) {
                node.push_token("end", close);
                return Ok(node);
            }
            let key = match self.peek_kind() {
                Some(Identifier | String) => self.bump(),
                _ => {
                    self.expected(Identifier.describe());
                    return Err(Backtrack);
                }
            };
            let mut entry = CstNode::new(Rule::ObjectEntry, key.span);
            entry.push_token("key", key);
            if self.eat(Colon).is_some() {
                entry.push_node("value", self.expression()?);
            }
            node.push_node("entry", entry);
            if self.eat(Comma).is_none() {
                node.push_token("end", self.expect(RCurly)?);
                return Ok(node);
            }
        }
    }
}

// ============================================================================
// MATCH & PATTERNS
// ============================================================================

impl<'t> Parser<'t> {
    /// `match expression '{' (pattern ('when' expression)? '=>' expression ','?)+ '}'`
    fn match_expr(&mut self) -> PResult<CstNode> {
        let keyword = self.expect(Match)?;
        let mut node = CstNode::new(Rule::MatchExpr, keyword.span);
        node.push_node("scrutinee", self.expression()?);
        self.expect(LCurly)?;
        loop {
            if node.has("arm") {
                if let Some(close) = self.eat(RCurly) {
                    node.push_token("end", close);
                    return Ok(node);
                }
            }
            node.push_node("arm", self.match_arm()?);
            self.eat(Comma);
        }
    }

    fn match_arm(&mut self) -> PResult<CstNode> {
        let pattern = self.pattern()?;
        let mut node = CstNode::new(Rule::MatchArm, pattern.span);
        node.push_node("pattern", pattern);
        if self.eat(When).is_some() {
            node.push_node("guard", self.expression()?);
        }
        self.expect(FatArrow)?;
        node.push_node("body", self.expression()?);
        Ok(node)
    }

    /// `_` | `:atom` | string | number | identifier | object pattern
    fn pattern(&mut self) -> PResult<CstNode> {
        match self.peek_kind() {
            Some(Underscore | Atom | String | Number | Identifier) => {
                let token = self.bump();
                let mut node = CstNode::new(Rule::Pattern, token.span);
                node.push_token("value", token);
                Ok(node)
            }
            Some(LCurly) => self.object_pattern(),
            _ => {
                self.expected("pattern");
                Err(Backtrack)
            }
        }
    }

    /// `'{' (field (':' pattern)?) (',' ...)* '}'`
    fn object_pattern(&mut self) -> PResult<CstNode> {
        let open = self.expect(LCurly)?;
        let mut node = CstNode::new(Rule::ObjectPattern, open.span);
        loop {
            if let Some(close) = self.eat(RCurly) {
                node.push_token("end", close);
                return Ok(node);
            }
            let key = self.expect(Identifier)?;
            let mut field = CstNode::new(Rule::ObjectPatternField, key.span);
            field.push_token("key", key);
            if self.eat(Colon).is_some() {
                field.push_node("pattern", self.pattern()?);
            }
            node.push_node("field", field);
            if self.eat(Comma).is_none() {
                node.push_token("end", self.expect(RCurly)?);
                return Ok(node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lexer::tokenize;

    fn parse_text(text: &str) -> Result<CstNode, ParseError> {
        parse(&tokenize(text).unwrap())
    }

    fn statements(text: &str) -> Vec<CstNode> {
        parse_text(text)
            .unwrap()
            .nodes("statement")
            .cloned()
            .collect()
    }

    #[test]
    fn empty_input_is_an_empty_program() {
        let program = parse_text("").unwrap();
        assert_eq!(program.rule, Rule::Program);
        assert!(!program.has("statement"));
    }

    #[test]
    fn struct_fields_are_labeled_pairs() {
        let stmts = statements("struct User { name: string age: number }");
        assert_eq!(stmts[0].rule, Rule::StructDecl);
        let fields: Vec<_> = stmts[0].nodes("field").collect();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].token("name").unwrap().lexeme, "name");
        let ty = fields[1].node("type").unwrap();
        assert_eq!(ty.token("name").unwrap().lexeme, "number");
    }

    #[test]
    fn forward_struct_declaration() {
        let stmts = statements("struct Marker;");
        assert_eq!(stmts[0].rule, Rule::StructDecl);
        assert!(!stmts[0].has("field"));
    }

    #[test]
    fn generic_struct_and_nested_types() {
        let stmts = statements("struct Box<T, U> { items: Array<T>[]; other: U }");
        let generics: Vec<_> = stmts[0].tokens("generic").map(|t| &t.lexeme).collect();
        assert_eq!(generics, ["T", "U"]);
        let items = stmts[0].node("field").unwrap().node("type").unwrap();
        assert_eq!(items.nodes("arg").count(), 1);
        assert_eq!(items.tokens("array").count(), 1);
    }

    #[test]
    fn impl_with_for_is_trait_impl() {
        let stmts = statements(
            r#"impl Greet for User { greet() { return "hi"; } }
               impl User { id(): number { return 1; } }"#,
        );
        assert_eq!(stmts[0].rule, Rule::TraitImpl);
        assert_eq!(stmts[0].token("trait").unwrap().lexeme, "Greet");
        assert_eq!(stmts[0].token("type").unwrap().lexeme, "User");
        assert_eq!(stmts[1].rule, Rule::ImplBlock);
        assert!(stmts[1].token("trait").is_none());
        let method = stmts[1].node("method").unwrap();
        assert!(method.has("return_type"));
    }

    #[test]
    fn method_body_keeps_nested_braces() {
        let stmts = statements("impl A { run() { if (x) { y(); } } }");
        let method = stmts[0].node("method").unwrap();
        assert_eq!(method.token("body").unwrap().lexeme, " if (x) { y(); } ");
        assert!(method.has("close"));
    }

    #[test]
    fn unclosed_method_body_expects_brace() {
        let err = parse_text("impl A { run() { return 1;").unwrap_err();
        assert_eq!(err.found, "end of input");
        assert!(err.expected.contains("'}'"));
    }

    #[test]
    fn trait_method_return_type_is_optional() {
        let stmts = statements("trait Shape { area(): number; reset() }");
        let methods: Vec<_> = stmts[0].nodes("method").collect();
        assert!(methods[0].has("return_type"));
        assert!(!methods[1].has("return_type"));
    }

    #[test]
    fn pipe_statement_with_stages() {
        let stmts = statements(r#""hi" |> trim |> console.log"#);
        assert_eq!(stmts[0].rule, Rule::PipeExpr);
        let stages: Vec<_> = stmts[0].nodes("stage").collect();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[1].tokens("segment").count(), 2);
    }

    #[test]
    fn let_accepts_pipes() {
        let stmts = statements(r#"let x = "hi" |> trim |> console.log"#);
        assert_eq!(stmts[0].rule, Rule::LetDecl);
        assert_eq!(stmts[0].node("value").unwrap().rule, Rule::PipeExpr);
    }

    #[test]
    fn bare_expression_is_rejected() {
        let err = parse_text("value").unwrap_err();
        assert!(err.expected.contains("'|>'"));
    }

    #[test]
    fn match_with_guard_and_object_pattern() {
        let stmts = statements(
            r#"let r = match user {
                 { name: "root" } => 0,
                 { age } when age > 17 => 1
                 _ => 2
               }"#,
        );
        let matched = stmts[0].node("value").unwrap();
        assert_eq!(matched.rule, Rule::MatchExpr);
        let arms: Vec<_> = matched.nodes("arm").collect();
        assert_eq!(arms.len(), 3);
        assert_eq!(arms[0].node("pattern").unwrap().rule, Rule::ObjectPattern);
        assert!(arms[1].has("guard"));
        assert_eq!(arms[1].node("guard").unwrap().rule, Rule::Binary);
    }

    #[test]
    fn match_requires_an_arm() {
        let err = parse_text("match x { }").unwrap_err();
        assert!(err.expected.contains("pattern"));
    }

    #[test]
    fn binary_precedence() {
        let stmts = statements("let x = 1 + 2 * 3");
        let value = stmts[0].node("value").unwrap();
        assert_eq!(value.token("op").unwrap().lexeme, "+");
        assert_eq!(value.node("right").unwrap().token("op").unwrap().lexeme, "*");
    }

    #[test]
    fn bad_struct_name_reports_identifier() {
        let err = parse_text("struct 123Bad { }").unwrap_err();
        assert_eq!(err.found, "'123'");
        assert!(err.expected.contains("identifier"));
        assert_eq!(err.span, Span::new(7, 10));
    }

    #[test]
    fn alternatives_are_aggregated() {
        let err = parse_text("struct User").unwrap_err();
        assert_eq!(err.found, "end of input");
        for expected in ["';'", "'<'", "'{'"] {
            assert!(err.expected.contains(expected), "missing {expected}");
        }
    }
}
