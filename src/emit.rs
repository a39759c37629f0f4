//! # TypeScript Emitter
//!
//! Renders AST nodes into TypeScript source text. Emission never fails: a node that
//! has no statement-level rendering becomes a `// Unknown node type: X` placeholder.
//!
//! ## Trait implementations
//! One [`TraitImplStrategy`] applies to a whole compilation:
//! - `FunctionalDispatch`: a record of arrow functions taking the target as `self`.
//! - `CapabilityAdapter`: a wrapper class owning the target and delegating to it.
//!
//! ## Match
//! A match becomes an immediately invoked arrow function that binds the scrutinee to
//! `__match_value` once and tests arms in declaration order.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::ast::{
    AstNode, Expression, ImplBlock, LetDecl, MatchArm, MatchExpr, Method, Parameter, Pattern,
    PipeCall, PipeExpr, Program, StructDecl, TraitDecl, TraitImpl,
};
use crate::atoms;
use crate::syntax::lexer::compile_pattern;

const MATCH_VALUE: &str = "__match_value";

static RETURNS_STRING_LITERAL: Lazy<Regex> =
    Lazy::new(|| compile_pattern(r#"^return\s+"(?:[^"\\\n]|\\.)*"\s*;?$"#));
static HAS_RETURN: Lazy<Regex> = Lazy::new(|| compile_pattern(r"\breturn\b"));

// ============================================================================
// OPTIONS
// ============================================================================

/// How `impl Trait for Type` blocks are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TraitImplStrategy {
    #[default]
    #[serde(rename = "functional", alias = "functional-dispatch")]
    FunctionalDispatch,
    #[serde(rename = "adapter", alias = "capability-adapter")]
    CapabilityAdapter,
}

impl fmt::Display for TraitImplStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TraitImplStrategy::FunctionalDispatch => "functional",
            TraitImplStrategy::CapabilityAdapter => "adapter",
        })
    }
}

impl FromStr for TraitImplStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "functional" | "functional-dispatch" => Ok(TraitImplStrategy::FunctionalDispatch),
            "adapter" | "capability-adapter" => Ok(TraitImplStrategy::CapabilityAdapter),
            other => Err(format!(
                "unknown trait impl strategy '{other}' (expected 'functional' or 'adapter')"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitOptions {
    pub trait_impl: TraitImplStrategy,
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Render a program, one item per line group, in declaration order.
pub fn emit(program: &Program, options: &EmitOptions) -> String {
    let traits: Vec<&TraitDecl> = program.trait_decls().collect();
    emit_with_traits(program, options, &traits)
}

/// Like [`emit`], but trait signatures are resolved against `traits`, which may
/// come from other blocks of the same source.
pub fn emit_with_traits(program: &Program, options: &EmitOptions, traits: &[&TraitDecl]) -> String {
    let emitter = Emitter { traits, options };
    program
        .items
        .iter()
        .map(|item| emitter.item(item))
        .collect::<Vec<_>>()
        .join("\n")
}

struct Emitter<'p> {
    traits: &'p [&'p TraitDecl],
    options: &'p EmitOptions,
}

impl<'p> Emitter<'p> {
    fn declared_trait(&self, name: &str) -> Option<&'p TraitDecl> {
        self.traits.iter().copied().find(|t| t.name == name)
    }
}

// ============================================================================
// DECLARATIONS
// ============================================================================

impl Emitter<'_> {
    fn item(&self, node: &AstNode) -> String {
        trace!(node = node.node_type(), "emitting");
        match node {
            AstNode::StructDecl(decl) => self.struct_decl(decl),
            AstNode::TraitDecl(decl) => self.trait_decl(decl),
            AstNode::ImplBlock(imp) => self.impl_block(imp),
            AstNode::TraitImpl(imp) => match self.options.trait_impl {
                TraitImplStrategy::FunctionalDispatch => self.functional_dispatch(imp),
                TraitImplStrategy::CapabilityAdapter => self.capability_adapter(imp),
            },
            AstNode::LetDecl(decl) => self.let_decl(decl),
            AstNode::PipeExpr(pipe) => format!("{};", self.pipe(pipe)),
            AstNode::MatchExpr(m) => format!("{};", self.match_expr(m)),
            AstNode::Expression(expr) => format!("{};", self.expression(expr)),
            AstNode::AtomExpression(atom) => format!("{};", atom_symbol(&atom.name)),
            other => {
                warn!(node = other.node_type(), "no statement-level rendering");
                format!("// Unknown node type: {}", other.node_type())
            }
        }
    }

    fn struct_decl(&self, decl: &StructDecl) -> String {
        let head = format!("type {}{} =", decl.name, generic_list(&decl.generics));
        if decl.fields.is_empty() {
            return format!("{head} {{}};");
        }
        let mut lines = vec![format!("{head} {{")];
        lines.extend(
            decl.fields
                .iter()
                .map(|f| format!("  {}: {};", f.name, f.ty)),
        );
        lines.push("};".into());
        lines.join("\n")
    }

    fn trait_decl(&self, decl: &TraitDecl) -> String {
        let head = format!("interface {}{}", decl.name, generic_list(&decl.generics));
        if decl.methods.is_empty() {
            return format!("{head} {{}}");
        }
        let mut lines = vec![format!("{head} {{")];
        for method in &decl.methods {
            let ret = method
                .return_type
                .as_ref()
                .map_or_else(|| "void".to_string(), ToString::to_string);
            lines.push(format!(
                "  {}({}): {};",
                method.name,
                param_list(&method.params),
                ret
            ));
        }
        lines.push("}".into());
        lines.join("\n")
    }

    /// `impl Type { ... }` becomes `class TypeImpl` wrapping a `Type` value.
    fn impl_block(&self, imp: &ImplBlock) -> String {
        let generics = generic_list(&imp.generics);
        let mut lines = vec![
            format!("class {}Impl{generics} {{", imp.type_name),
            format!("  constructor(readonly self: {}{generics}) {{}}", imp.type_name),
        ];
        for method in &imp.methods {
            lines.push(String::new());
            lines.extend(self.class_method(method, None));
        }
        lines.push("}".into());
        lines.join("\n")
    }

    fn functional_dispatch(&self, imp: &TraitImpl) -> String {
        let trait_decl = self.declared_trait(&imp.trait_name);
        let generics = generic_list(&imp.generics);
        let self_param = format!("self: {}{generics}", imp.type_name);

        let mut lines = vec![format!("const {}{} = {{", imp.type_name, imp.trait_name)];
        for method in &imp.methods {
            let params = std::iter::once(self_param.clone())
                .chain(method.params.iter().map(param))
                .collect::<Vec<_>>()
                .join(", ");
            let head = format!(
                "  {}: {generics}({params}){} =>",
                method.name,
                return_suffix(method, trait_decl)
            );
            let body = body_lines(&method.body, "    ");
            if body.is_empty() {
                lines.push(format!("{head} {{}},"));
            } else {
                lines.push(format!("{head} {{"));
                lines.extend(body);
                lines.push("  },".into());
            }
        }
        lines.push("};".into());
        lines.join("\n")
    }

    fn capability_adapter(&self, imp: &TraitImpl) -> String {
        let trait_decl = self.declared_trait(&imp.trait_name);
        let generics = generic_list(&imp.generics);
        // Generic traits would need type arguments the impl header does not carry.
        let implements = match trait_decl {
            Some(decl) if decl.generics.is_empty() => format!(" implements {}", decl.name),
            _ => String::new(),
        };

        let mut lines = vec![
            format!(
                "class {}{}{generics}{implements} {{",
                imp.type_name, imp.trait_name
            ),
            format!("  constructor(readonly self: {}{generics}) {{}}", imp.type_name),
        ];
        for method in &imp.methods {
            lines.push(String::new());
            lines.extend(self.class_method(method, trait_decl));
        }
        lines.push("}".into());
        lines.join("\n")
    }

    /// A method of a wrapper class; the body sees the wrapped value as `self`.
    fn class_method(&self, method: &Method, trait_decl: Option<&TraitDecl>) -> Vec<String> {
        let head = format!(
            "  {}({}){}",
            method.name,
            param_list(&method.params),
            return_suffix(method, trait_decl)
        );
        let body = body_lines(&method.body, "    ");
        if body.is_empty() {
            return vec![format!("{head} {{}}")];
        }

        let mut lines = vec![format!("{head} {{"), "    const self = this.self;".to_string()];
        lines.extend(body);
        lines.push("  }".into());
        lines
    }

    fn let_decl(&self, decl: &LetDecl) -> String {
        format!("const {} = {};", decl.name, self.expression(&decl.value))
    }
}

fn generic_list(generics: &[String]) -> String {
    if generics.is_empty() {
        String::new()
    } else {
        format!("<{}>", generics.join(", "))
    }
}

fn param(p: &Parameter) -> String {
    format!("{}: {}", p.name, p.ty)
}

fn param_list(params: &[Parameter]) -> String {
    params.iter().map(param).collect::<Vec<_>>().join(", ")
}

fn body_lines(body: &str, pad: &str) -> Vec<String> {
    body.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect()
}

/// Return type for a method, in order: explicit annotation, the declared trait
/// signature, a lone string-literal return, no `return` at all.
fn inferred_return_type(method: &Method, trait_decl: Option<&TraitDecl>) -> Option<String> {
    if let Some(ty) = &method.return_type {
        return Some(ty.to_string());
    }
    if let Some(signature) = trait_decl.and_then(|t| t.method(&method.name)) {
        return Some(
            signature
                .return_type
                .as_ref()
                .map_or_else(|| "void".to_string(), ToString::to_string),
        );
    }
    if RETURNS_STRING_LITERAL.is_match(method.body.trim()) {
        return Some("string".into());
    }
    if !HAS_RETURN.is_match(&method.body) {
        return Some("void".into());
    }
    None
}

fn return_suffix(method: &Method, trait_decl: Option<&TraitDecl>) -> String {
    inferred_return_type(method, trait_decl)
        .map(|ty| format!(": {ty}"))
        .unwrap_or_default()
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

fn atom_symbol(name: &str) -> String {
    let atom = atoms::intern(name);
    format!("Symbol.for(\"{}\")", atom.name())
}

/// Indent every line after the first, for multi-line expressions embedded at depth.
fn nest(text: &str, pad: &str) -> String {
    let mut lines = text.lines();
    let mut out = lines.next().unwrap_or_default().to_string();
    for line in lines {
        out.push('\n');
        if !line.is_empty() {
            out.push_str(pad);
            out.push_str(line);
        }
    }
    out
}

/// Whether `.member` can follow the rendered expression without parentheses.
fn is_postfix_safe(expr: &Expression) -> bool {
    use crate::ast::Literal;
    matches!(
        expr,
        Expression::Identifier(_)
            | Expression::Atom(_)
            | Expression::Literal(Literal::String(_) | Literal::Keyword(_))
            | Expression::Pipe(_)
            | Expression::Match(_)
            | Expression::Call { .. }
            | Expression::Member { .. }
            | Expression::Index { .. }
            | Expression::Group(_)
            | Expression::Array(_)
    )
}

enum StageTarget {
    Qualified(String),
    ValueMethod(&'static str),
    Function(String),
}

fn value_method(name: &str) -> Option<&'static str> {
    Some(match name {
        "trim" => "trim",
        "split" => "split",
        "slice" => "slice",
        "substring" => "substring",
        "lowercase" | "toLowerCase" => "toLowerCase",
        "uppercase" | "toUpperCase" => "toUpperCase",
        _ => return None,
    })
}

fn builtin(name: &str) -> Option<&'static str> {
    Some(match name {
        "print" => "console.log",
        "debug" => "console.debug",
        "warn" => "console.warn",
        "stringify" => "JSON.stringify",
        _ => return None,
    })
}

fn stage_target(call: &PipeCall) -> StageTarget {
    let target = call.target();
    if call.is_qualified() {
        return StageTarget::Qualified(target);
    }
    if let Some(method) = value_method(&target) {
        return StageTarget::ValueMethod(method);
    }
    match builtin(&target) {
        Some(host) => StageTarget::Function(host.to_string()),
        None => StageTarget::Function(target),
    }
}

impl Emitter<'_> {
    fn expression(&self, expr: &Expression) -> String {
        match expr {
            Expression::Literal(literal) => literal.lexeme().to_string(),
            Expression::Identifier(name) => name.clone(),
            Expression::Atom(atom) => atom_symbol(&atom.name),
            Expression::Pipe(pipe) => self.pipe(pipe),
            Expression::Match(m) => self.match_expr(m),
            Expression::Binary { op, left, right } => {
                let op = match op.as_str() {
                    "==" => "===",
                    "!=" => "!==",
                    other => other,
                };
                format!(
                    "{} {op} {}",
                    self.expression(left),
                    self.expression(right)
                )
            }
            Expression::Unary { op, operand } => {
                let operand = self.expression(operand);
                if operand.starts_with(op.as_str()) {
                    format!("{op} {operand}")
                } else {
                    format!("{op}{operand}")
                }
            }
            Expression::Call { callee, args } => {
                format!("{}({})", self.expression(callee), self.arguments(args))
            }
            Expression::Member { object, property } => {
                format!("{}.{property}", self.receiver(object))
            }
            Expression::Index { object, index } => {
                format!("{}[{}]", self.receiver(object), self.expression(index))
            }
            Expression::Group(inner) => format!("({})", self.expression(inner)),
            Expression::Array(items) => format!("[{}]", self.arguments(items)),
            Expression::Object(entries) if entries.is_empty() => "{}".into(),
            Expression::Object(entries) => {
                let entries: Vec<String> = entries
                    .iter()
                    .map(|entry| match &entry.value {
                        Some(value) => format!("{}: {}", entry.key, self.expression(value)),
                        None => entry.key.clone(),
                    })
                    .collect();
                format!("{{ {} }}", entries.join(", "))
            }
        }
    }

    fn arguments(&self, args: &[Expression]) -> String {
        args.iter()
            .map(|a| self.expression(a))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn receiver(&self, expr: &Expression) -> String {
        let rendered = self.expression(expr);
        if is_postfix_safe(expr) {
            rendered
        } else {
            format!("({rendered})")
        }
    }

    /// `expr |> a |> b` becomes `b(a(expr))`, with stage arguments after the piped value.
    fn pipe(&self, pipe: &PipeExpr) -> String {
        let mut acc = self.receiver(&pipe.base);
        let mut acc_as_arg = self.expression(&pipe.base);

        for call in &pipe.calls {
            let args: Vec<String> = call.args.iter().map(|a| self.expression(a)).collect();
            acc = match stage_target(call) {
                StageTarget::ValueMethod(method) => format!("{acc}.{method}({})", args.join(", ")),
                StageTarget::Qualified(target) | StageTarget::Function(target) => {
                    let all: Vec<String> = std::iter::once(acc_as_arg).chain(args).collect();
                    format!("{target}({})", all.join(", "))
                }
            };
            acc_as_arg = acc.clone();
        }
        acc
    }

    fn match_expr(&self, m: &MatchExpr) -> String {
        let scrutinee = self.expression(&m.scrutinee);
        let mut lines = vec![
            "(() => {".to_string(),
            format!("  const {MATCH_VALUE} = {};", nest(&scrutinee, "  ")),
        ];

        let mut opened = false;
        let mut total = false;
        for (index, arm) in m.arms.iter().enumerate() {
            if total {
                warn!(arm = index, "match arm follows an irrefutable arm and is unreachable");
                continue;
            }
            total = arm.guard.is_none() && arm.pattern.is_irrefutable();
            let head = match (self.arm_condition(arm), opened) {
                (Some(cond), false) => format!("  if ({cond}) {{"),
                (Some(cond), true) => format!("  }} else if ({cond}) {{"),
                (None, false) => "  if (true) {".to_string(),
                (None, true) => "  } else {".to_string(),
            };
            lines.push(head);
            for (name, access) in binding_paths(&arm.pattern, MATCH_VALUE) {
                lines.push(format!("    const {name} = {access};"));
            }
            let body = self.expression(&arm.body);
            lines.push(format!("    return {};", nest(&body, "    ")));
            opened = true;
        }

        if opened {
            lines.push("  }".into());
        }
        if !total {
            lines.push("  throw new Error(\"Non-exhaustive match\");".into());
        }
        lines.push("})()".into());
        lines.join("\n")
    }

    /// Pattern test plus guard; `None` when the arm accepts every value.
    fn arm_condition(&self, arm: &MatchArm) -> Option<String> {
        let test = pattern_condition(&arm.pattern, MATCH_VALUE);
        let guard = arm.guard.as_ref().map(|guard| {
            let names = arm.pattern.bindings();
            let rendered = self.expression(guard);
            if guard.mentions(&names) {
                let paths = binding_paths(&arm.pattern, MATCH_VALUE);
                let values: Vec<&str> = paths.iter().map(|(_, v)| v.as_str()).collect();
                format!("(({}) => {rendered})({})", names.join(", "), values.join(", "))
            } else {
                format!("({rendered})")
            }
        });

        match (test, guard) {
            (Some(test), Some(guard)) => Some(format!("{test} && {guard}")),
            (test, guard) => test.or(guard),
        }
    }
}

// ============================================================================
// PATTERNS
// ============================================================================

/// Structural test for `pattern` against the value at `subject`.
fn pattern_condition(pattern: &Pattern, subject: &str) -> Option<String> {
    match pattern {
        Pattern::Wildcard | Pattern::Variable(_) => None,
        Pattern::Atom(atom) => Some(format!("{subject} === {}", atom_symbol(&atom.name))),
        Pattern::Literal(literal) => Some(format!("{subject} === {}", literal.lexeme())),
        Pattern::Object(fields) => {
            let mut parts = vec![format!(
                "typeof {subject} === \"object\" && {subject} !== null"
            )];
            for field in fields {
                match &field.pattern {
                    Pattern::Wildcard => {}
                    Pattern::Variable(_) => parts.push(format!("\"{}\" in {subject}", field.key)),
                    sub => {
                        let access = format!("{subject}.{}", field.key);
                        parts.extend(pattern_condition(sub, &access));
                    }
                }
            }
            Some(parts.join(" && "))
        }
    }
}

/// `(name, access path)` for every variable the pattern binds.
fn binding_paths(pattern: &Pattern, subject: &str) -> Vec<(String, String)> {
    match pattern {
        Pattern::Variable(name) => vec![(name.clone(), subject.to_string())],
        Pattern::Object(fields) => fields
            .iter()
            .flat_map(|f| binding_paths(&f.pattern, &format!("{subject}.{}", f.key)))
            .collect(),
        Pattern::Wildcard | Pattern::Atom(_) | Pattern::Literal(_) => Vec::new(),
    }
}
