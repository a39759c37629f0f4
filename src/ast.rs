//! Canonical AST produced by the transformer and consumed by the emitter.
//!
//! Each variant carries only the attributes meaningful to it. Literal values keep
//! their source lexeme (quotes and escapes included) so emission reproduces them
//! byte for byte.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AstNode {
    Program(Program),
    StructDecl(StructDecl),
    TraitDecl(TraitDecl),
    ImplBlock(ImplBlock),
    TraitImpl(TraitImpl),
    LetDecl(LetDecl),
    PipeExpr(PipeExpr),
    PipeCall(PipeCall),
    MatchExpr(MatchExpr),
    MatchArm(MatchArm),
    Field(Field),
    Method(Method),
    TraitMethod(TraitMethod),
    Parameter(Parameter),
    Expression(Expression),
    AtomExpression(AtomExpression),
    Pattern(Pattern),
    ObjectField(ObjectField),
}

impl AstNode {
    /// Variant name, used in placeholders and logs.
    pub fn node_type(&self) -> &'static str {
        match self {
            AstNode::Program(_) => "Program",
            AstNode::StructDecl(_) => "StructDecl",
            AstNode::TraitDecl(_) => "TraitDecl",
            AstNode::ImplBlock(_) => "ImplBlock",
            AstNode::TraitImpl(_) => "TraitImpl",
            AstNode::LetDecl(_) => "LetDecl",
            AstNode::PipeExpr(_) => "PipeExpr",
            AstNode::PipeCall(_) => "PipeCall",
            AstNode::MatchExpr(_) => "MatchExpr",
            AstNode::MatchArm(_) => "MatchArm",
            AstNode::Field(_) => "Field",
            AstNode::Method(_) => "Method",
            AstNode::TraitMethod(_) => "TraitMethod",
            AstNode::Parameter(_) => "Parameter",
            AstNode::Expression(_) => "Expression",
            AstNode::AtomExpression(_) => "AtomExpression",
            AstNode::Pattern(_) => "Pattern",
            AstNode::ObjectField(_) => "ObjectField",
        }
    }
}

/// Top-level items in declaration order, which is also emission order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Program {
    pub items: Vec<AstNode>,
}

impl Program {
    pub fn trait_decls(&self) -> impl Iterator<Item = &TraitDecl> + '_ {
        self.items.iter().filter_map(|item| match item {
            AstNode::TraitDecl(decl) => Some(decl),
            _ => None,
        })
    }
}

// ============================================================================
// DECLARATIONS
// ============================================================================

/// `Name<Args>[]...`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeRef {
    pub name: String,
    pub args: Vec<TypeRef>,
    pub array_depth: usize,
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            array_depth: 0,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            let args: Vec<String> = self.args.iter().map(ToString::to_string).collect();
            write!(f, "<{}>", args.join(", "))?;
        }
        for _ in 0..self.array_depth {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructDecl {
    pub name: String,
    pub generics: Vec<String>,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraitMethod {
    pub name: String,
    pub params: Vec<Parameter>,
    pub return_type: Option<TypeRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraitDecl {
    pub name: String,
    pub generics: Vec<String>,
    pub methods: Vec<TraitMethod>,
}

impl TraitDecl {
    pub fn method(&self, name: &str) -> Option<&TraitMethod> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// A method with its body kept as raw source text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Method {
    pub name: String,
    pub params: Vec<Parameter>,
    pub return_type: Option<TypeRef>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImplBlock {
    pub type_name: String,
    pub generics: Vec<String>,
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraitImpl {
    pub trait_name: String,
    pub type_name: String,
    pub generics: Vec<String>,
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LetDecl {
    pub name: String,
    pub value: Expression,
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    /// Quoted lexeme, escapes untouched.
    String(String),
    Number(String),
    /// `true`, `false`, `null` or `undefined`.
    Keyword(String),
}

impl Literal {
    pub fn lexeme(&self) -> &str {
        match self {
            Literal::String(s) | Literal::Number(s) | Literal::Keyword(s) => s,
        }
    }

    pub fn from_keyword(name: &str) -> Option<Self> {
        matches!(name, "true" | "false" | "null" | "undefined")
            .then(|| Literal::Keyword(name.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtomExpression {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipeExpr {
    pub base: Box<Expression>,
    pub calls: Vec<PipeCall>,
}

/// One `|> a.b.c(args)` stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipeCall {
    pub path: Vec<String>,
    pub args: Vec<Expression>,
}

impl PipeCall {
    pub fn target(&self) -> String {
        self.path.join(".")
    }

    pub fn is_qualified(&self) -> bool {
        self.path.len() > 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchExpr {
    pub scrutinee: Box<Expression>,
    pub arms: Vec<MatchArm>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub guard: Option<Expression>,
    pub body: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectEntry {
    /// Identifier or quoted string, as written.
    pub key: String,
    /// `None` for shorthand `{ key }`.
    pub value: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expression {
    Literal(Literal),
    Identifier(String),
    Atom(AtomExpression),
    Pipe(PipeExpr),
    Match(MatchExpr),
    Binary {
        op: String,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Unary {
        op: String,
        operand: Box<Expression>,
    },
    Call {
        callee: Box<Expression>,
        args: Vec<Expression>,
    },
    Member {
        object: Box<Expression>,
        property: String,
    },
    Index {
        object: Box<Expression>,
        index: Box<Expression>,
    },
    Group(Box<Expression>),
    Array(Vec<Expression>),
    Object(Vec<ObjectEntry>),
}

impl Expression {
    /// Whether the expression reads any of `names`.
    pub fn mentions(&self, names: &[String]) -> bool {
        match self {
            Expression::Identifier(name) => names.contains(name),
            Expression::Literal(_) | Expression::Atom(_) => false,
            Expression::Pipe(pipe) => {
                pipe.base.mentions(names)
                    || pipe
                        .calls
                        .iter()
                        .any(|c| c.args.iter().any(|a| a.mentions(names)))
            }
            Expression::Match(m) => {
                m.scrutinee.mentions(names)
                    || m.arms.iter().any(|arm| {
                        arm.body.mentions(names)
                            || arm.guard.as_ref().is_some_and(|g| g.mentions(names))
                    })
            }
            Expression::Binary { left, right, .. } => left.mentions(names) || right.mentions(names),
            Expression::Unary { operand, .. } => operand.mentions(names),
            Expression::Call { callee, args } => {
                callee.mentions(names) || args.iter().any(|a| a.mentions(names))
            }
            Expression::Member { object, .. } => object.mentions(names),
            Expression::Index { object, index } => object.mentions(names) || index.mentions(names),
            Expression::Group(inner) => inner.mentions(names),
            Expression::Array(items) => items.iter().any(|i| i.mentions(names)),
            Expression::Object(entries) => entries.iter().any(|e| match &e.value {
                Some(value) => value.mentions(names),
                None => names.contains(&e.key),
            }),
        }
    }
}

// ============================================================================
// PATTERNS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Pattern {
    Wildcard,
    Atom(AtomExpression),
    Literal(Literal),
    Variable(String),
    Object(Vec<ObjectField>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectField {
    pub key: String,
    pub pattern: Pattern,
}

impl Pattern {
    /// Names bound by this pattern, outermost first.
    pub fn bindings(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_bindings(&mut names);
        names
    }

    fn collect_bindings(&self, names: &mut Vec<String>) {
        match self {
            Pattern::Variable(name) => names.push(name.clone()),
            Pattern::Object(fields) => {
                for field in fields {
                    field.pattern.collect_bindings(names);
                }
            }
            Pattern::Wildcard | Pattern::Atom(_) | Pattern::Literal(_) => {}
        }
    }

    /// True when the pattern accepts every value.
    pub fn is_irrefutable(&self) -> bool {
        matches!(self, Pattern::Wildcard | Pattern::Variable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_ref_display() {
        let ty = TypeRef {
            name: "Map".into(),
            args: vec![TypeRef::named("string"), TypeRef::named("number")],
            array_depth: 2,
        };
        assert_eq!(ty.to_string(), "Map<string, number>[][]");
    }

    #[test]
    fn object_pattern_bindings() {
        let pattern = Pattern::Object(vec![
            ObjectField {
                key: "name".into(),
                pattern: Pattern::Variable("name".into()),
            },
            ObjectField {
                key: "role".into(),
                pattern: Pattern::Atom(AtomExpression {
                    name: "admin".into(),
                }),
            },
            ObjectField {
                key: "meta".into(),
                pattern: Pattern::Object(vec![ObjectField {
                    key: "age".into(),
                    pattern: Pattern::Variable("years".into()),
                }]),
            },
        ]);
        assert_eq!(pattern.bindings(), ["name", "years"]);
        assert!(!pattern.is_irrefutable());
    }

    #[test]
    fn mentions_walks_nested_expressions() {
        let expr = Expression::Binary {
            op: ">".into(),
            left: Box::new(Expression::Member {
                object: Box::new(Expression::Identifier("n".into())),
                property: "length".into(),
            }),
            right: Box::new(Expression::Literal(Literal::Number("0".into()))),
        };
        assert!(expr.mentions(&["n".to_string()]));
        assert!(!expr.mentions(&["length".to_string()]));
    }
}
