//! # CST to AST Transformer
//!
//! Pure structural mapping, one function per CST rule. Fields and parameters arrive
//! as labeled `(name, type)` nodes, so nothing here pairs tokens by position.
//!
//! Every lookup of a label the parser always produces is still checked: a missing
//! child means parser and transformer disagree, which surfaces as a
//! [`TransformError`] instead of a panic.

use serde::Serialize;
use thiserror::Error;

use crate::ast::{
    AstNode, AtomExpression, Expression, Field, ImplBlock, LetDecl, Literal, MatchArm, MatchExpr,
    Method, ObjectEntry, ObjectField, Parameter, Pattern, PipeCall, PipeExpr, Program, StructDecl,
    TraitDecl, TraitImpl, TraitMethod, TypeRef,
};
use crate::syntax::{CstNode, Rule, Span, Token, TokenKind};

/// The CST does not have the shape the transformer relies on.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("malformed {rule} node: {detail}")]
pub struct TransformError {
    pub rule: Rule,
    pub detail: String,
    pub span: Span,
}

impl TransformError {
    fn new(node: &CstNode, detail: impl Into<String>) -> Self {
        Self {
            rule: node.rule,
            detail: detail.into(),
            span: node.span,
        }
    }
}

type TResult<T> = Result<T, TransformError>;

/// Transform a `Program` CST. `source` is the block text the token spans point into.
pub fn transform(cst: &CstNode, source: &str) -> TResult<Program> {
    if cst.rule != Rule::Program {
        return Err(TransformError::new(cst, "expected a Program root"));
    }
    let items = cst
        .nodes("statement")
        .map(|node| statement(node, source))
        .collect::<TResult<Vec<_>>>()?;
    Ok(Program { items })
}

// ============================================================================
// HELPERS
// ============================================================================

fn token<'a>(node: &'a CstNode, label: &str) -> TResult<&'a Token> {
    node.token(label)
        .ok_or_else(|| TransformError::new(node, format!("missing '{label}' token")))
}

fn child<'a>(node: &'a CstNode, label: &str) -> TResult<&'a CstNode> {
    node.node(label)
        .ok_or_else(|| TransformError::new(node, format!("missing '{label}' child")))
}

fn lexemes(node: &CstNode, label: &str) -> Vec<String> {
    node.tokens(label).map(|t| t.lexeme.clone()).collect()
}

fn optional_type(node: &CstNode, label: &str) -> TResult<Option<TypeRef>> {
    node.node(label).map(type_ref).transpose()
}

// ============================================================================
// DECLARATIONS
// ============================================================================

fn statement(node: &CstNode, source: &str) -> TResult<AstNode> {
    Ok(match node.rule {
        Rule::StructDecl => AstNode::StructDecl(struct_decl(node)?),
        Rule::TraitDecl => AstNode::TraitDecl(trait_decl(node)?),
        Rule::ImplBlock => AstNode::ImplBlock(impl_block(node, source)?),
        Rule::TraitImpl => AstNode::TraitImpl(trait_impl(node, source)?),
        Rule::LetDecl => AstNode::LetDecl(let_decl(node)?),
        Rule::PipeExpr => AstNode::PipeExpr(pipe_expr(node)?),
        Rule::MatchExpr => AstNode::MatchExpr(match_expr(node)?),
        _ => return Err(TransformError::new(node, "not a statement")),
    })
}

fn struct_decl(node: &CstNode) -> TResult<StructDecl> {
    Ok(StructDecl {
        name: token(node, "name")?.lexeme.clone(),
        generics: lexemes(node, "generic"),
        fields: node
            .nodes("field")
            .map(field)
            .collect::<TResult<Vec<_>>>()?,
    })
}

fn field(node: &CstNode) -> TResult<Field> {
    Ok(Field {
        name: token(node, "name")?.lexeme.clone(),
        ty: type_ref(child(node, "type")?)?,
    })
}

fn type_ref(node: &CstNode) -> TResult<TypeRef> {
    Ok(TypeRef {
        name: token(node, "name")?.lexeme.clone(),
        args: node
            .nodes("arg")
            .map(type_ref)
            .collect::<TResult<Vec<_>>>()?,
        array_depth: node.tokens("array").count(),
    })
}

fn param(node: &CstNode) -> TResult<Parameter> {
    Ok(Parameter {
        name: token(node, "name")?.lexeme.clone(),
        ty: type_ref(child(node, "type")?)?,
    })
}

fn params(node: &CstNode) -> TResult<Vec<Parameter>> {
    node.nodes("param").map(param).collect()
}

fn trait_decl(node: &CstNode) -> TResult<TraitDecl> {
    let methods = node
        .nodes("method")
        .map(|m| {
            Ok(TraitMethod {
                name: token(m, "name")?.lexeme.clone(),
                params: params(m)?,
                return_type: optional_type(m, "return_type")?,
            })
        })
        .collect::<TResult<Vec<_>>>()?;

    Ok(TraitDecl {
        name: token(node, "name")?.lexeme.clone(),
        generics: lexemes(node, "generic"),
        methods,
    })
}

fn impl_block(node: &CstNode, source: &str) -> TResult<ImplBlock> {
    Ok(ImplBlock {
        type_name: token(node, "type")?.lexeme.clone(),
        generics: lexemes(node, "generic"),
        methods: methods(node, source)?,
    })
}

fn trait_impl(node: &CstNode, source: &str) -> TResult<TraitImpl> {
    Ok(TraitImpl {
        trait_name: token(node, "trait")?.lexeme.clone(),
        type_name: token(node, "type")?.lexeme.clone(),
        generics: lexemes(node, "generic"),
        methods: methods(node, source)?,
    })
}

fn methods(node: &CstNode, source: &str) -> TResult<Vec<Method>> {
    node.nodes("method")
        .map(|m| method_decl(m, source))
        .collect()
}

fn method_decl(node: &CstNode, source: &str) -> TResult<Method> {
    let open = token(node, "open")?;
    let close = token(node, "close")?;
    let raw = source
        .get(open.span.end..close.span.start)
        .ok_or_else(|| TransformError::new(node, "method body outside the block text"))?;

    Ok(Method {
        name: token(node, "name")?.lexeme.clone(),
        params: params(node)?,
        return_type: optional_type(node, "return_type")?,
        body: normalize_body(raw),
    })
}

/// Strip surrounding blank lines and the common indentation of a raw method body.
/// Text on the same line as the opening brace does not count toward the indent.
fn normalize_body(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().collect();
    let Some(first) = lines.iter().position(|l| !l.trim().is_empty()) else {
        return String::new();
    };
    let last = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .unwrap_or(first);
    let body = &lines[first..=last];
    let inline_head = first == 0;

    let indent = body
        .iter()
        .skip(usize::from(inline_head))
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    body.iter()
        .enumerate()
        .map(|(i, line)| {
            if line.trim().is_empty() {
                ""
            } else if i == 0 && inline_head {
                line.trim()
            } else {
                line.get(indent..).unwrap_or_else(|| line.trim_start()).trim_end()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn let_decl(node: &CstNode) -> TResult<LetDecl> {
    Ok(LetDecl {
        name: token(node, "name")?.lexeme.clone(),
        value: expression(child(node, "value")?)?,
    })
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

fn boxed(node: &CstNode, label: &str) -> TResult<Box<Expression>> {
    Ok(Box::new(expression(child(node, label)?)?))
}

fn expressions(node: &CstNode, label: &str) -> TResult<Vec<Expression>> {
    node.nodes(label).map(expression).collect()
}

fn expression(node: &CstNode) -> TResult<Expression> {
    Ok(match node.rule {
        Rule::Primary => primary(node)?,
        Rule::Group => Expression::Group(boxed(node, "inner")?),
        Rule::ArrayLiteral => Expression::Array(expressions(node, "element")?),
        Rule::ObjectLiteral => Expression::Object(
            node.nodes("entry")
                .map(|entry| {
                    Ok(ObjectEntry {
                        key: token(entry, "key")?.lexeme.clone(),
                        value: entry.node("value").map(expression).transpose()?,
                    })
                })
                .collect::<TResult<Vec<_>>>()?,
        ),
        Rule::PipeExpr => Expression::Pipe(pipe_expr(node)?),
        Rule::MatchExpr => Expression::Match(match_expr(node)?),
        Rule::Binary => Expression::Binary {
            op: token(node, "op")?.lexeme.clone(),
            left: boxed(node, "left")?,
            right: boxed(node, "right")?,
        },
        Rule::Unary => Expression::Unary {
            op: token(node, "op")?.lexeme.clone(),
            operand: boxed(node, "operand")?,
        },
        Rule::Call => Expression::Call {
            callee: boxed(node, "callee")?,
            args: expressions(node, "arg")?,
        },
        Rule::Member => Expression::Member {
            object: boxed(node, "object")?,
            property: token(node, "property")?.lexeme.clone(),
        },
        Rule::Index => Expression::Index {
            object: boxed(node, "object")?,
            index: boxed(node, "index")?,
        },
        _ => return Err(TransformError::new(node, "not an expression")),
    })
}

fn primary(node: &CstNode) -> TResult<Expression> {
    let value = token(node, "value")?;
    Ok(match value.kind {
        TokenKind::String => Expression::Literal(Literal::String(value.lexeme.clone())),
        TokenKind::Number => Expression::Literal(Literal::Number(value.lexeme.clone())),
        TokenKind::Atom => Expression::Atom(atom(value)),
        TokenKind::Identifier => Expression::Identifier(value.lexeme.clone()),
        other => {
            return Err(TransformError::new(
                node,
                format!("unexpected {} token", other.describe()),
            ))
        }
    })
}

fn atom(token: &Token) -> AtomExpression {
    AtomExpression {
        name: token.lexeme.trim_start_matches(':').to_string(),
    }
}

fn pipe_expr(node: &CstNode) -> TResult<PipeExpr> {
    let calls = node
        .nodes("stage")
        .map(|stage| {
            Ok(PipeCall {
                path: lexemes(stage, "segment"),
                args: expressions(stage, "arg")?,
            })
        })
        .collect::<TResult<Vec<_>>>()?;

    if calls.is_empty() {
        return Err(TransformError::new(node, "pipe without stages"));
    }

    Ok(PipeExpr {
        base: boxed(node, "base")?,
        calls,
    })
}

fn match_expr(node: &CstNode) -> TResult<MatchExpr> {
    let arms = node
        .nodes("arm")
        .map(|arm| {
            Ok(MatchArm {
                pattern: pattern(child(arm, "pattern")?)?,
                guard: arm.node("guard").map(expression).transpose()?,
                body: expression(child(arm, "body")?)?,
            })
        })
        .collect::<TResult<Vec<_>>>()?;

    Ok(MatchExpr {
        scrutinee: boxed(node, "scrutinee")?,
        arms,
    })
}

// ============================================================================
// PATTERNS
// ============================================================================

fn pattern(node: &CstNode) -> TResult<Pattern> {
    match node.rule {
        Rule::Pattern => {
            let value = token(node, "value")?;
            Ok(match value.kind {
                TokenKind::Underscore => Pattern::Wildcard,
                TokenKind::Atom => Pattern::Atom(atom(value)),
                TokenKind::String => Pattern::Literal(Literal::String(value.lexeme.clone())),
                TokenKind::Number => Pattern::Literal(Literal::Number(value.lexeme.clone())),
                TokenKind::Identifier => match Literal::from_keyword(&value.lexeme) {
                    Some(literal) => Pattern::Literal(literal),
                    None => Pattern::Variable(value.lexeme.clone()),
                },
                other => {
                    return Err(TransformError::new(
                        node,
                        format!("unexpected {} token", other.describe()),
                    ))
                }
            })
        }
        Rule::ObjectPattern => {
            let fields = node
                .nodes("field")
                .map(|f| {
                    let key = token(f, "key")?.lexeme.clone();
                    let pattern = match f.node("pattern") {
                        Some(sub) => pattern(sub)?,
                        None => Pattern::Variable(key.clone()),
                    };
                    Ok(ObjectField { key, pattern })
                })
                .collect::<TResult<Vec<_>>>()?;
            Ok(Pattern::Object(fields))
        }
        _ => Err(TransformError::new(node, "not a pattern")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{parse, tokenize};

    fn program(text: &str) -> Program {
        let cst = parse(&tokenize(text).unwrap()).unwrap();
        transform(&cst, text).unwrap()
    }

    #[test]
    fn struct_fields_keep_order() {
        let prog = program("struct User { name: string age: number }");
        let AstNode::StructDecl(decl) = &prog.items[0] else {
            panic!("expected struct, got {:?}", prog.items[0]);
        };
        let fields: Vec<_> = decl
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.ty.to_string()))
            .collect();
        assert_eq!(fields, [("name", "string".to_string()), ("age", "number".to_string())]);
    }

    #[test]
    fn trait_impl_names_trait_and_type() {
        let prog = program("impl Greet for User { greet(loud: boolean): string { return \"hi\"; } }");
        let AstNode::TraitImpl(imp) = &prog.items[0] else {
            panic!("expected trait impl");
        };
        assert_eq!(imp.trait_name, "Greet");
        assert_eq!(imp.type_name, "User");
        assert_eq!(imp.methods[0].params[0].name, "loud");
        assert_eq!(imp.methods[0].body, "return \"hi\";");
    }

    #[test]
    fn method_body_is_dedented() {
        let text = "impl User {\n  describe() {\n      let x = 1;\n      if (x) {\n        return x;\n      }\n  }\n}";
        let prog = program(text);
        let AstNode::ImplBlock(imp) = &prog.items[0] else {
            panic!("expected impl");
        };
        assert_eq!(
            imp.methods[0].body,
            "let x = 1;\nif (x) {\n  return x;\n}"
        );
    }

    #[test]
    fn inline_head_does_not_skew_indent() {
        assert_eq!(normalize_body(" a;\n    b;\n    c; "), "a;\nb;\nc;");
        assert_eq!(normalize_body("   "), "");
    }

    #[test]
    fn pipe_stages_become_calls() {
        let prog = program(r#""a,b" |> split(",") |> console.log"#);
        let AstNode::PipeExpr(pipe) = &prog.items[0] else {
            panic!("expected pipe");
        };
        assert_eq!(pipe.calls[0].path, ["split"]);
        assert_eq!(pipe.calls[0].args.len(), 1);
        assert!(pipe.calls[1].is_qualified());
    }

    #[test]
    fn pattern_shapes() {
        let prog = program(
            r#"let r = match v { _ => 0, :ok => 1, "s" => 2, 3 => 3, true => 4, n => 5, { name, role: :admin } => 6 }"#,
        );
        let AstNode::LetDecl(decl) = &prog.items[0] else {
            panic!("expected let");
        };
        let Expression::Match(m) = &decl.value else {
            panic!("expected match");
        };
        let patterns: Vec<_> = m.arms.iter().map(|a| a.pattern.clone()).collect();
        assert_eq!(patterns[0], Pattern::Wildcard);
        assert_eq!(
            patterns[1],
            Pattern::Atom(AtomExpression { name: "ok".into() })
        );
        assert_eq!(patterns[2], Pattern::Literal(Literal::String("\"s\"".into())));
        assert_eq!(patterns[3], Pattern::Literal(Literal::Number("3".into())));
        assert_eq!(patterns[4], Pattern::Literal(Literal::Keyword("true".into())));
        assert_eq!(patterns[5], Pattern::Variable("n".into()));
        assert_eq!(
            patterns[6],
            Pattern::Object(vec![
                ObjectField {
                    key: "name".into(),
                    pattern: Pattern::Variable("name".into()),
                },
                ObjectField {
                    key: "role".into(),
                    pattern: Pattern::Atom(AtomExpression { name: "admin".into() }),
                },
            ])
        );
    }

    #[test]
    fn malformed_cst_is_an_error_not_a_panic() {
        let mut root = CstNode::new(Rule::Program, Span::default());
        root.push_node("statement", CstNode::new(Rule::Binary, Span::new(0, 3)));
        let err = transform(&root, "a+b").unwrap_err();
        assert_eq!(err.rule, Rule::Binary);
        assert_eq!(err.detail, "not a statement");
    }
}
