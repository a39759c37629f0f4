//! # Concrete Syntax Tree
//!
//! One [`CstNode`] per grammar rule invocation. Children are stored under labels,
//! each label holding an ordered sequence of tokens and nodes. Field and parameter
//! declarations are their own nodes with `name` and `type` labels, so consumers never
//! re-pair flat token runs by position.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::lexer::Token;
use super::Span;

/// Grammar rules that produce CST nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Rule {
    Program,
    StructDecl,
    Field,
    TypeRef,
    TraitDecl,
    TraitMethod,
    ImplBlock,
    TraitImpl,
    MethodDecl,
    Param,
    LetDecl,
    PipeExpr,
    PipeStage,
    MatchExpr,
    MatchArm,
    Pattern,
    ObjectPattern,
    ObjectPatternField,
    Binary,
    Unary,
    Call,
    Member,
    Index,
    Primary,
    Group,
    ArrayLiteral,
    ObjectLiteral,
    ObjectEntry,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A labeled child: either a raw token or a nested rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CstElement {
    Token(Token),
    Node(CstNode),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CstNode {
    pub rule: Rule,
    pub span: Span,
    pub children: BTreeMap<&'static str, Vec<CstElement>>,
}

impl CstNode {
    pub fn new(rule: Rule, span: Span) -> Self {
        Self {
            rule,
            span,
            children: BTreeMap::new(),
        }
    }

    pub fn push_token(&mut self, label: &'static str, token: Token) {
        self.span = self.span.join(token.span);
        self.children
            .entry(label)
            .or_default()
            .push(CstElement::Token(token));
    }

    pub fn push_node(&mut self, label: &'static str, node: CstNode) {
        self.span = self.span.join(node.span);
        self.children
            .entry(label)
            .or_default()
            .push(CstElement::Node(node));
    }

    fn elements(&self, label: &str) -> &[CstElement] {
        self.children.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All tokens stored under `label`, in order.
    pub fn tokens<'a>(&'a self, label: &str) -> impl Iterator<Item = &'a Token> + 'a {
        self.elements(label).iter().filter_map(|e| match e {
            CstElement::Token(t) => Some(t),
            CstElement::Node(_) => None,
        })
    }

    /// All nodes stored under `label`, in order.
    pub fn nodes<'a>(&'a self, label: &str) -> impl Iterator<Item = &'a CstNode> + 'a {
        self.elements(label).iter().filter_map(|e| match e {
            CstElement::Node(n) => Some(n),
            CstElement::Token(_) => None,
        })
    }

    pub fn token(&self, label: &str) -> Option<&Token> {
        self.tokens(label).next()
    }

    pub fn node(&self, label: &str) -> Option<&CstNode> {
        self.nodes(label).next()
    }

    pub fn has(&self, label: &str) -> bool {
        !self.elements(label).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::TokenKind;

    fn ident(text: &str, start: usize) -> Token {
        Token {
            kind: TokenKind::Identifier,
            lexeme: text.to_string(),
            span: Span::new(start, start + text.len()),
        }
    }

    #[test]
    fn children_keep_insertion_order_per_label() {
        let mut node = CstNode::new(Rule::StructDecl, Span::new(0, 6));
        node.push_token("generic", ident("T", 12));
        node.push_token("generic", ident("U", 15));
        let names: Vec<_> = node.tokens("generic").map(|t| t.lexeme.as_str()).collect();
        assert_eq!(names, ["T", "U"]);
        assert_eq!(node.span, Span::new(0, 16));
    }

    #[test]
    fn missing_labels_are_empty() {
        let node = CstNode::new(Rule::Program, Span::default());
        assert!(node.token("name").is_none());
        assert_eq!(node.nodes("statement").count(), 0);
        assert!(!node.has("statement"));
    }
}
