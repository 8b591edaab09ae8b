// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Pre-pass: which methods compile and which fall back.
//!
//! Runs over the whole class before any method is emitted and produces an
//! immutable [`SkipSet`]. Emission only reads it: a self-send needs to know
//! whether its target is compiled (direct call) or skipped (interpreter
//! call), and whether the target can fail.
//!
//! Per method, first match wins:
//!
//! 1. `pragma: interpreterOnly` falls back
//! 2. a primitive registry entry for (class, side, selector) compiles to
//!    the registered template; a wrong arity or a missing `path` variable
//!    falls back with a warning
//! 3. a raw method without `compileOnly`, `nativeBody` or `primitive`
//!    falls back
//! 4. `pragma: primitive` without a registry entry falls back with a
//!    warning
//! 5. a body mentioning an interpreter-only identifier falls back, naming it
//! 6. a body the parser rejects falls back with the parser's reason
//! 7. a body referencing an unknown identifier, or using a block literal as
//!    a value, falls back
//!
//! Advice is then attached to compiled targets. Finally the `has_return`
//! and `has_error` flags are computed, the latter as a fixpoint over
//! self-sends.

use std::collections::{HashMap, HashSet};

use ecow::{EcoString, eco_format};
use tracing::{debug, instrument, warn};

use super::SkipReason;
use super::primitive_bindings::{PrimitiveBinding, PrimitiveBindingTable};
use super::reserved::{is_interpreter_only, local_name};
use super::selector_mangler::{field_name, method_name};
use crate::ast::{
    AdviceKind, ClassDecl, Expression, MethodDecl, MethodKind, Pragma, Statement, StorageKind,
    VarDefault,
};
use crate::source_analysis::{Token, TokenKind, parse_method_body};

// ============================================================================
// Class layout
// ============================================================================

/// A struct field backing an instance or class-instance variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Field {
    pub name: EcoString,
    pub go_name: String,
    pub storage: StorageKind,
    pub default: Option<VarDefault>,
    /// False for a variable that would shadow the `class` marker in JSON.
    pub persisted: bool,
}

/// Field layout of both structs.
#[derive(Debug, Clone, Default)]
pub(super) struct ClassLayout {
    pub instance: Vec<Field>,
    pub class_side: Vec<Field>,
}

impl ClassLayout {
    fn new(class: &ClassDecl, warnings: &mut Vec<EcoString>) -> Self {
        Self {
            instance: Self::fields_for(&class.instance_vars, warnings),
            class_side: Self::fields_for(&class.class_instance_vars, warnings),
        }
    }

    fn fields_for(vars: &[crate::ast::VarSpec], warnings: &mut Vec<EcoString>) -> Vec<Field> {
        let mut fields: Vec<Field> = Vec::with_capacity(vars.len());
        for var in vars {
            if fields.iter().any(|f| f.name == var.name) {
                warnings.push(eco_format!(
                    "variable `{}` is declared twice; the first declaration is used",
                    var.name
                ));
                continue;
            }
            let persisted = var.name != "class";
            if !persisted {
                warnings.push(EcoString::from(
                    "variable `class` conflicts with the class marker and is not persisted",
                ));
            }
            let base = field_name(&var.name);
            let mut go_name = base.clone();
            let mut n = 2;
            while fields.iter().any(|f| f.go_name == go_name) {
                go_name = format!("{base}_{n}");
                n += 1;
            }
            fields.push(Field {
                name: var.name.clone(),
                go_name,
                storage: var.storage(),
                default: var.default.clone(),
                persisted,
            });
        }
        fields
    }

    pub fn fields(&self, kind: MethodKind) -> &[Field] {
        match kind {
            MethodKind::Instance => &self.instance,
            MethodKind::Class => &self.class_side,
        }
    }

    pub fn field(&self, kind: MethodKind, name: &str) -> Option<&Field> {
        self.fields(kind).iter().find(|f| f.name == name)
    }
}

// ============================================================================
// Plans
// ============================================================================

/// What a compiled method's body is made of.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum PlanBody {
    Statements(Vec<Statement>),
    Primitive(PrimitiveBinding),
}

/// A method that will be compiled.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct MethodPlan {
    pub selector: EcoString,
    pub kind: MethodKind,
    pub go_name: String,
    /// Source parameter names paired with their Go names.
    pub params: Vec<(EcoString, String)>,
    /// Method-level locals, declared and implicit, with their Go names.
    pub locals: Vec<(EcoString, String)>,
    pub body: PlanBody,
    pub before: Vec<Statement>,
    pub after: Vec<Statement>,
    pub has_return: bool,
    pub has_error: bool,
}

impl MethodPlan {
    pub fn is_primitive(&self) -> bool {
        matches!(self.body, PlanBody::Primitive(_))
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// The Go result list of the method.
    pub fn go_results(&self) -> &'static str {
        if self.has_error {
            " (string, error)"
        } else if self.has_return {
            " string"
        } else {
            ""
        }
    }

    fn method_names(&self) -> HashSet<EcoString> {
        self.params
            .iter()
            .chain(&self.locals)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// An alias that gets its own dispatch case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct AliasPlan {
    pub kind: MethodKind,
    pub new_name: EcoString,
    pub existing: EcoString,
}

/// Read-only result of the pre-pass.
#[derive(Debug, Clone, Default)]
pub(super) struct SkipSet {
    pub layout: ClassLayout,
    pub methods: Vec<MethodPlan>,
    pub skipped: Vec<SkipReason>,
    pub aliases: Vec<AliasPlan>,
    pub warnings: Vec<EcoString>,
}

impl SkipSet {
    /// Finds the compiled method a send on `kind` side resolves to,
    /// following aliases.
    pub fn resolve(&self, kind: MethodKind, selector: &str) -> Option<&MethodPlan> {
        self.index_of(kind, selector).map(|i| &self.methods[i])
    }

    fn index_of(&self, kind: MethodKind, selector: &str) -> Option<usize> {
        let direct = |sel: &str| {
            self.methods
                .iter()
                .position(|m| m.kind == kind && m.selector == sel)
        };
        direct(selector).or_else(|| {
            self.aliases
                .iter()
                .find(|a| a.kind == kind && a.new_name == selector)
                .and_then(|a| direct(&a.existing))
        })
    }

    /// Compiled methods on one side, in declaration order.
    pub fn methods_for(&self, kind: MethodKind) -> impl Iterator<Item = &MethodPlan> {
        self.methods.iter().filter(move |m| m.kind == kind)
    }

    /// Aliases on one side.
    pub fn aliases_for(&self, kind: MethodKind) -> impl Iterator<Item = &AliasPlan> {
        self.aliases.iter().filter(move |a| a.kind == kind)
    }
}

// ============================================================================
// Analysis
// ============================================================================

/// A fallback decision.
struct Skip {
    reason: EcoString,
    /// Also surface the reason as a warning.
    warn: bool,
}

impl Skip {
    fn new(reason: impl Into<EcoString>) -> Self {
        Self {
            reason: reason.into(),
            warn: false,
        }
    }

    fn warning(reason: impl Into<EcoString>) -> Self {
        Self {
            reason: reason.into(),
            warn: true,
        }
    }
}

/// Runs the pre-pass over a class.
#[instrument(skip_all, fields(class = %class.name))]
pub(super) fn analyse(class: &ClassDecl, registry: &PrimitiveBindingTable) -> SkipSet {
    let mut warnings = Vec::new();
    let layout = ClassLayout::new(class, &mut warnings);
    let mut set = SkipSet {
        layout,
        warnings,
        ..SkipSet::default()
    };

    let mut seen: HashSet<(MethodKind, EcoString)> = HashSet::new();
    for method in &class.methods {
        if !seen.insert((method.kind, method.selector.clone())) {
            set.warnings.push(eco_format!(
                "method `{}` is defined twice; the first definition is used",
                method.selector
            ));
            continue;
        }
        match classify(class, &set.layout, registry, method) {
            Ok(plan) => {
                debug!(selector = %method.selector, primitive = plan.is_primitive(), "compiling method");
                set.methods.push(plan);
            }
            Err(skip) => {
                debug!(selector = %method.selector, reason = %skip.reason, "method falls back");
                if skip.warn {
                    warn!(selector = %method.selector, reason = %skip.reason, "method falls back");
                    set.warnings
                        .push(eco_format!("{}: {}", method.selector, skip.reason));
                }
                set.skipped.push(SkipReason {
                    selector: method.selector.clone(),
                    reason: skip.reason,
                });
            }
        }
    }

    attach_advice(class, &mut set);
    plan_aliases(class, &mut set);
    compute_flags(&mut set);
    assign_go_names(&mut set);

    debug!(
        compiled = set.methods.len(),
        skipped = set.skipped.len(),
        "pre-pass complete"
    );
    set
}

fn classify(
    class: &ClassDecl,
    layout: &ClassLayout,
    registry: &PrimitiveBindingTable,
    method: &MethodDecl,
) -> Result<MethodPlan, Skip> {
    if method.has_pragma(Pragma::InterpreterOnly) {
        return Err(Skip::new("marked interpreterOnly"));
    }

    let params = method
        .args
        .iter()
        .map(|arg| (arg.clone(), local_name(arg)))
        .collect();

    if let Some(binding) = registry.lookup(&class.name, method.kind, &method.selector) {
        if binding.arity != method.arity() {
            return Err(Skip::warning(format!(
                "primitive `{}` takes {} argument(s) but the method declares {}",
                binding.selector,
                binding.arity,
                method.arity()
            )));
        }
        if let Some(ivar) = binding.requires_ivar {
            if layout.field(method.kind, ivar).is_none() {
                return Err(Skip::warning(format!(
                    "primitive `{}` needs the instance variable `{ivar}`",
                    binding.selector
                )));
            }
        }
        return Ok(MethodPlan {
            selector: method.selector.clone(),
            kind: method.kind,
            go_name: String::new(),
            params,
            locals: Vec::new(),
            body: PlanBody::Primitive(binding.clone()),
            before: Vec::new(),
            after: Vec::new(),
            has_return: true,
            has_error: true,
        });
    }

    if method.raw
        && !method.has_pragma(Pragma::CompileOnly)
        && !method.has_pragma(Pragma::NativeBody)
        && !method.has_pragma(Pragma::Primitive)
    {
        return Err(Skip::new("raw method"));
    }

    if method.has_pragma(Pragma::Primitive) {
        return Err(Skip::warning(format!(
            "no primitive is registered for {}>>{}",
            class.name, method.selector
        )));
    }

    if let Some(name) = interpreter_only_identifier(&method.body) {
        return Err(Skip::new(format!("uses interpreter-only identifier `{name}`")));
    }

    let statements = parse_method_body(&method.body).map_err(|e| Skip::new(e.to_string()))?;

    let mut plan = MethodPlan {
        selector: method.selector.clone(),
        kind: method.kind,
        go_name: String::new(),
        params,
        locals: Vec::new(),
        body: PlanBody::Statements(Vec::new()),
        before: Vec::new(),
        after: Vec::new(),
        has_return: false,
        has_error: false,
    };
    add_locals(&mut plan, layout, &statements);
    NameResolver::new(layout, method.kind, plan.method_names())
        .check_statements(&statements)
        .map_err(Skip::new)?;
    plan.body = PlanBody::Statements(statements);
    Ok(plan)
}

/// Returns the first interpreter-only identifier in a token span.
fn interpreter_only_identifier(tokens: &[Token]) -> Option<EcoString> {
    tokens.iter().find_map(|token| {
        let name = match token.kind() {
            TokenKind::Identifier => token.text(),
            TokenKind::Keyword => token.keyword_parts()?.0.trim_end_matches(':'),
            _ => return None,
        };
        is_interpreter_only(name).then(|| EcoString::from(name))
    })
}

/// Adds declared locals and implicitly declared (assigned) names.
fn add_locals(plan: &mut MethodPlan, layout: &ClassLayout, statements: &[Statement]) {
    let mut collector = LocalCollector::default();
    walk_statements(statements, &mut collector);

    let candidates = collector.declared.into_iter().chain(
        collector
            .assigned
            .into_iter()
            .filter(|name| layout.field(plan.kind, name).is_none()),
    );
    for name in candidates {
        if is_pseudo_variable(&name) || starts_uppercase(&name) {
            continue;
        }
        let known = plan
            .params
            .iter()
            .chain(&plan.locals)
            .any(|(existing, _)| *existing == name);
        if !known {
            let go_name = local_name(&name);
            plan.locals.push((name, go_name));
        }
    }
}

fn is_pseudo_variable(name: &str) -> bool {
    matches!(name, "self" | "true" | "false" | "nil")
}

fn starts_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

// ============================================================================
// Advice and aliases
// ============================================================================

fn attach_advice(class: &ClassDecl, set: &mut SkipSet) {
    let mut failed: Vec<(usize, EcoString)> = Vec::new();

    for advice in &class.advice {
        let label = match advice.kind {
            AdviceKind::Before => "before",
            AdviceKind::After => "after",
        };
        let target = set
            .methods
            .iter()
            .position(|m| m.kind == MethodKind::Instance && m.selector == advice.selector)
            .or_else(|| set.methods.iter().position(|m| m.selector == advice.selector));

        let Some(index) = target else {
            let why = if class.methods.iter().any(|m| m.selector == advice.selector) {
                "its target falls back"
            } else {
                "its target is not defined in this class"
            };
            set.warnings.push(eco_format!(
                "{label} advice on `{}` is not compiled: {why}",
                advice.selector
            ));
            continue;
        };
        if failed.iter().any(|(i, _)| *i == index) {
            continue;
        }

        match compile_advice(&set.layout, &mut set.methods[index], &advice.body) {
            Ok(statements) => {
                let plan = &mut set.methods[index];
                match advice.kind {
                    AdviceKind::Before => plan.before.extend(statements),
                    AdviceKind::After => plan.after.extend(statements),
                }
            }
            Err(reason) => {
                set.warnings.push(eco_format!(
                    "{label} advice on `{}` is not compiled: {reason}",
                    advice.selector
                ));
                failed.push((index, eco_format!("{label} advice: {reason}")));
            }
        }
    }

    // Remove failed targets back to front so indices stay valid.
    failed.sort_by(|a, b| b.0.cmp(&a.0));
    for (index, reason) in failed {
        let plan = set.methods.remove(index);
        debug!(selector = %plan.selector, %reason, "advice forces fallback");
        set.skipped.push(SkipReason {
            selector: plan.selector,
            reason,
        });
    }
}

fn compile_advice(
    layout: &ClassLayout,
    target: &mut MethodPlan,
    body: &[Token],
) -> Result<Vec<Statement>, EcoString> {
    if let Some(name) = interpreter_only_identifier(body) {
        return Err(eco_format!("uses interpreter-only identifier `{name}`"));
    }
    let statements = parse_method_body(body).map_err(|e| EcoString::from(e.to_string()))?;
    let locals_before = target.locals.len();
    add_locals(target, layout, &statements);
    let result = NameResolver::new(layout, target.kind, target.method_names())
        .check_statements(&statements);
    if let Err(reason) = result {
        target.locals.truncate(locals_before);
        return Err(reason);
    }
    Ok(statements)
}

fn plan_aliases(class: &ClassDecl, set: &mut SkipSet) {
    for alias in &class.aliases {
        let Some(existing) = set
            .methods
            .iter()
            .find(|m| m.kind == MethodKind::Instance && m.selector == alias.existing_name)
            .or_else(|| set.methods.iter().find(|m| m.selector == alias.existing_name))
        else {
            debug!(alias = %alias.new_name, "alias target is not compiled");
            continue;
        };
        let kind = existing.kind;
        let taken = class
            .methods
            .iter()
            .any(|m| m.kind == kind && m.selector == alias.new_name)
            || set
                .aliases
                .iter()
                .any(|a| a.kind == kind && a.new_name == alias.new_name);
        if taken {
            set.warnings.push(eco_format!(
                "alias `{}` is already a selector; ignored",
                alias.new_name
            ));
            continue;
        }
        set.aliases.push(AliasPlan {
            kind,
            new_name: alias.new_name.clone(),
            existing: alias.existing_name.clone(),
        });
    }
}

// ============================================================================
// Flags and names
// ============================================================================

fn compute_flags(set: &mut SkipSet) {
    let mut scans: Vec<FlagScan> = Vec::with_capacity(set.methods.len());
    for plan in &set.methods {
        let mut scan = FlagScan::default();
        if let PlanBody::Statements(body) = &plan.body {
            walk_statements(body, &mut scan);
        }
        walk_statements(&plan.before, &mut scan);
        walk_statements(&plan.after, &mut scan);
        scans.push(scan);
    }

    for (plan, scan) in set.methods.iter_mut().zip(&scans) {
        if !plan.is_primitive() {
            plan.has_return = scan.has_return;
            plan.has_error = scan.fallible;
        }
    }

    // Self-sends to fallible or fallback targets make the caller fallible.
    loop {
        let mut changed = false;
        for i in 0..set.methods.len() {
            if set.methods[i].has_error {
                continue;
            }
            let kind = set.methods[i].kind;
            // A send whose arity does not match the target goes through the
            // interpreter too.
            let fallible = scans[i].self_sends.iter().any(|(selector, arity)| {
                set.index_of(kind, selector).is_none_or(|target| {
                    let target = &set.methods[target];
                    target.has_error || target.arity() != *arity
                })
            });
            if fallible {
                set.methods[i].has_error = true;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

fn assign_go_names(set: &mut SkipSet) {
    let mut used: HashMap<MethodKind, HashSet<String>> = HashMap::new();
    for plan in &mut set.methods {
        let fields: Vec<String> = set
            .layout
            .fields(plan.kind)
            .iter()
            .map(|f| f.go_name.clone())
            .collect();
        let taken = used.entry(plan.kind).or_default();
        let mut name = method_name(&plan.selector, &fields);
        while taken.contains(&name) || fields.contains(&name) {
            name.push('_');
        }
        taken.insert(name.clone());
        plan.go_name = name;
    }
}

// ============================================================================
// Tree walking
// ============================================================================

/// Callbacks for [`walk_statements`].
pub(super) trait Visitor<'a> {
    fn statement(&mut self, _statement: &'a Statement) {}
    fn expression(&mut self, _expression: &'a Expression) {}
}

/// Visits every statement and expression, including those nested in
/// branches, loops and block literals.
pub(super) fn walk_statements<'a>(statements: &'a [Statement], visitor: &mut impl Visitor<'a>) {
    for statement in statements {
        visitor.statement(statement);
        match statement {
            Statement::Locals(_) => {}
            Statement::Assign { value, .. } | Statement::Return(value) | Statement::Expr(value) => {
                walk_expression(value, visitor);
            }
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                walk_expression(condition, visitor);
                for branch in [then_branch, else_branch].into_iter().flatten() {
                    walk_statements(branch, visitor);
                }
            }
            Statement::While { condition, body } => {
                walk_expression(condition, visitor);
                walk_statements(body, visitor);
            }
            Statement::NilGuard {
                subject,
                if_nil,
                if_not_nil,
                ..
            } => {
                walk_expression(subject, visitor);
                for branch in [if_nil, if_not_nil].into_iter().flatten() {
                    walk_statements(branch, visitor);
                }
            }
        }
    }
}

/// Visits an expression and everything below it.
pub(super) fn walk_expression<'a>(expression: &'a Expression, visitor: &mut impl Visitor<'a>) {
    visitor.expression(expression);
    match expression {
        Expression::Binary { left, right, .. } => {
            walk_expression(left, visitor);
            walk_expression(right, visitor);
        }
        Expression::Block(block) => walk_statements(&block.body, visitor),
        Expression::Iteration {
            receiver, block, ..
        } => {
            walk_expression(receiver, visitor);
            walk_statements(&block.body, visitor);
        }
        Expression::DynamicIteration { receiver, .. } => walk_expression(receiver, visitor),
        Expression::Send { receiver, args, .. } | Expression::Collection { receiver, args, .. } => {
            walk_expression(receiver, visitor);
            for arg in args {
                walk_expression(arg, visitor);
            }
        }
        Expression::ClassPrimitive { args, .. } => {
            for arg in args {
                walk_expression(arg, visitor);
            }
        }
        Expression::Identifier(_)
        | Expression::Qualified { .. }
        | Expression::Number(_)
        | Expression::String(_) => {}
    }
}

#[derive(Default)]
struct LocalCollector {
    declared: Vec<EcoString>,
    assigned: Vec<EcoString>,
}

impl<'a> Visitor<'a> for LocalCollector {
    fn statement(&mut self, statement: &'a Statement) {
        match statement {
            Statement::Locals(names) => {
                for name in names {
                    if !self.declared.contains(name) {
                        self.declared.push(name.clone());
                    }
                }
            }
            Statement::Assign { target, .. } if !self.assigned.contains(target) => {
                self.assigned.push(target.clone());
            }
            _ => {}
        }
    }
}

#[derive(Default)]
struct FlagScan {
    has_return: bool,
    fallible: bool,
    /// Selector and argument count of each self-send.
    self_sends: Vec<(EcoString, usize)>,
}

impl<'a> Visitor<'a> for FlagScan {
    fn statement(&mut self, statement: &'a Statement) {
        if matches!(statement, Statement::Return(_)) {
            self.has_return = true;
        }
    }

    fn expression(&mut self, expression: &'a Expression) {
        match expression {
            Expression::Send {
                is_self: true,
                selector,
                args,
                ..
            } => self.self_sends.push((selector.clone(), args.len())),
            Expression::Send { .. } | Expression::DynamicIteration { .. } => self.fallible = true,
            Expression::ClassPrimitive { op, .. } if op.is_fallible() => self.fallible = true,
            _ => {}
        }
    }
}

// ============================================================================
// Name resolution
// ============================================================================

/// Checks that every identifier a body mentions resolves.
struct NameResolver<'a> {
    layout: &'a ClassLayout,
    kind: MethodKind,
    method_names: HashSet<EcoString>,
    block_scopes: Vec<Vec<EcoString>>,
}

impl<'a> NameResolver<'a> {
    fn new(layout: &'a ClassLayout, kind: MethodKind, method_names: HashSet<EcoString>) -> Self {
        Self {
            layout,
            kind,
            method_names,
            block_scopes: Vec::new(),
        }
    }

    fn is_known(&self, name: &str) -> bool {
        is_pseudo_variable(name)
            || starts_uppercase(name)
            || self.method_names.contains(name)
            || self.block_scopes.iter().flatten().any(|n| n == name)
            || self.layout.field(self.kind, name).is_some()
    }

    fn check_statements(&mut self, statements: &[Statement]) -> Result<(), EcoString> {
        statements.iter().try_for_each(|s| self.check_statement(s))
    }

    fn check_statement(&mut self, statement: &Statement) -> Result<(), EcoString> {
        match statement {
            Statement::Locals(_) => Ok(()),
            Statement::Assign { target, value } => {
                if is_pseudo_variable(target) || starts_uppercase(target) {
                    return Err(eco_format!("cannot assign to `{target}`"));
                }
                if !self.is_known(target) {
                    return Err(eco_format!("unknown identifier `{target}`"));
                }
                self.check_expression(value)
            }
            Statement::Return(value) | Statement::Expr(value) => self.check_expression(value),
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.check_expression(condition)?;
                for branch in [then_branch, else_branch].into_iter().flatten() {
                    self.check_statements(branch)?;
                }
                Ok(())
            }
            Statement::While { condition, body } => {
                self.check_expression(condition)?;
                self.check_statements(body)
            }
            Statement::NilGuard {
                subject,
                if_nil,
                if_not_nil,
                binding,
            } => {
                self.check_expression(subject)?;
                if let Some(branch) = if_nil {
                    self.check_statements(branch)?;
                }
                if let Some(branch) = if_not_nil {
                    self.block_scopes.push(binding.iter().cloned().collect());
                    let result = self.check_statements(branch);
                    self.block_scopes.pop();
                    result?;
                }
                Ok(())
            }
        }
    }

    fn check_expression(&mut self, expression: &Expression) -> Result<(), EcoString> {
        match expression {
            Expression::Identifier(name) => {
                if self.is_known(name) {
                    Ok(())
                } else {
                    Err(eco_format!("unknown identifier `{name}`"))
                }
            }
            Expression::Block(_) => Err(EcoString::from("block literal used as a value")),
            Expression::Binary { left, right, .. } => {
                self.check_expression(left)?;
                self.check_expression(right)
            }
            Expression::Iteration {
                receiver, block, ..
            } => {
                self.check_expression(receiver)?;
                self.block_scopes.push(block.params.clone());
                let result = self.check_statements(&block.body);
                self.block_scopes.pop();
                result
            }
            Expression::DynamicIteration {
                receiver,
                block_var,
                ..
            } => {
                self.check_expression(receiver)?;
                if self.is_known(block_var) && !starts_uppercase(block_var) {
                    Ok(())
                } else {
                    Err(eco_format!("unknown block variable `{block_var}`"))
                }
            }
            Expression::Send { receiver, args, .. } | Expression::Collection { receiver, args, .. } => {
                self.check_expression(receiver)?;
                args.iter().try_for_each(|a| self.check_expression(a))
            }
            Expression::ClassPrimitive { args, .. } => {
                args.iter().try_for_each(|a| self.check_expression(a))
            }
            Expression::Qualified { .. } | Expression::Number(_) | Expression::String(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::parse_source;

    fn analyse_source(source: &str) -> SkipSet {
        let class = parse_source(source);
        assert!(class.errors.is_empty(), "{:?}", class.errors);
        analyse(&class, PrimitiveBindingTable::builtin())
    }

    fn skip_reason<'s>(set: &'s SkipSet, selector: &str) -> &'s str {
        set.skipped
            .iter()
            .find(|s| s.selector == selector)
            .map_or_else(|| panic!("`{selector}` was not skipped: {:?}", set.skipped), |s| s.reason.as_str())
    }

    fn plan<'s>(set: &'s SkipSet, selector: &str) -> &'s MethodPlan {
        set.methods
            .iter()
            .find(|m| m.selector == selector)
            .unwrap_or_else(|| panic!("`{selector}` was not compiled: {:?}", set.skipped))
    }

    #[test]
    fn plain_methods_compile() {
        let set = analyse_source(
            "Counter subclass: Object\n  instanceVars: value:0\n  method: increment [ value := value + 1 ]\n  method: getValue [ ^ value ]\n",
        );
        assert!(set.skipped.is_empty());
        assert!(!plan(&set, "increment").has_return);
        assert!(!plan(&set, "increment").has_error);
        assert!(plan(&set, "getValue").has_return);
    }

    #[test]
    fn interpreter_only_pragma() {
        let set = analyse_source(
            "A subclass: Object\n  method: m [ pragma: interpreterOnly\n ^ 1 ]\n",
        );
        assert_eq!(skip_reason(&set, "m"), "marked interpreterOnly");
    }

    #[test]
    fn raw_methods_fall_back_unless_marked() {
        let set = analyse_source(
            "A subclass: Object\n  rawMethod: shell [ echo hi ]\n  rawMethod: fast [ pragma: compileOnly\n ^ 1 ]\n",
        );
        assert_eq!(skip_reason(&set, "shell"), "raw method");
        assert!(plan(&set, "fast").has_return);
    }

    #[test]
    fn primitive_pragma_without_registry_warns() {
        let set = analyse_source("A subclass: Object\n  method: go [ pragma: primitive ]\n");
        assert!(skip_reason(&set, "go").contains("no primitive is registered for A>>go"));
        assert_eq!(set.warnings.len(), 1);
    }

    #[test]
    fn registry_overrides_body() {
        let set = analyse_source(
            "File subclass: Object\n  instanceVars: path\n  method: read [ ^ mystery ]\n  classMethod: exists: p [ ^ 1 ]\n",
        );
        let read = plan(&set, "read");
        assert!(read.is_primitive());
        assert!(read.has_error && read.has_return);
        assert!(plan(&set, "exists_").is_primitive());
    }

    #[test]
    fn registry_arity_mismatch_warns() {
        let set = analyse_source(
            "Env subclass: Object\n  classMethod: get [ ^ 1 ]\n",
        );
        assert!(set.skipped.is_empty(), "`get` is not a registry selector");

        let set = analyse_source("String subclass: Object\n  classMethod: trim: a with: b [ ^ a ]\n");
        assert!(set.skipped.is_empty());

        let mut class = parse_source("Env subclass: Object\n  classMethod: get: a [ ^ a ]\n");
        class.methods[0].args.push("extra".into());
        let set = analyse(&class, PrimitiveBindingTable::builtin());
        assert!(skip_reason(&set, "get_").contains("takes 1 argument(s) but the method declares 2"));
        assert!(!set.warnings.is_empty());
    }

    #[test]
    fn file_primitive_needs_path() {
        let set = analyse_source("File subclass: Object\n  method: read [ ^ 1 ]\n");
        assert!(skip_reason(&set, "read").contains("`path`"));
    }

    #[test]
    fn interpreter_only_identifier_is_named() {
        let set = analyse_source(
            "Counter subclass: Object\n  instanceVars: value:0\n  method: increment [ _throw value ]\n",
        );
        assert!(skip_reason(&set, "increment").contains("`_throw`"));
    }

    #[test]
    fn reserved_identifier_wins_over_parse_failure() {
        let set = analyse_source("A subclass: Object\n  method: m [ echo $HOME _ensure ]\n");
        assert!(skip_reason(&set, "m").contains("`_ensure`"));
    }

    #[test]
    fn parse_failure_reason_is_kept() {
        let set = analyse_source("A subclass: Object\n  method: m [ x := $HOME ]\n");
        assert!(skip_reason(&set, "m").contains("$HOME"));
    }

    #[test]
    fn unknown_identifier_falls_back() {
        let set = analyse_source("A subclass: Object\n  method: m [ ^ mystery ]\n");
        assert_eq!(skip_reason(&set, "m"), "unknown identifier `mystery`");
    }

    #[test]
    fn block_literal_value_falls_back() {
        let set = analyse_source("A subclass: Object\n  method: m [ ^ [ 1 ] ]\n");
        assert_eq!(skip_reason(&set, "m"), "block literal used as a value");
    }

    #[test]
    fn assignment_declares_implicit_local() {
        let set = analyse_source("A subclass: Object\n  method: m [ total := 1\n ^ total ]\n");
        let m = plan(&set, "m");
        assert_eq!(m.locals, vec![("total".into(), "total".to_string())]);
    }

    #[test]
    fn reserved_local_names_get_suffix() {
        let set = analyse_source(
            "A subclass: Object\n  method: at: type put: err [ | range |\n range := type ]\n",
        );
        let m = plan(&set, "at_put_");
        assert_eq!(m.params[0].1, "type_");
        assert_eq!(m.params[1].1, "err_");
        assert_eq!(m.locals[0].1, "range_");
    }

    #[test]
    fn block_params_are_scoped() {
        let set = analyse_source(
            "A subclass: Object\n  instanceVars: items:'[]'\n  method: ok [ items do: [ :x | ^ x ] ]\n  method: bad [ items do: [ :x | ^ x ]\n ^ x ]\n",
        );
        assert!(plan(&set, "ok").has_return);
        assert_eq!(skip_reason(&set, "bad"), "unknown identifier `x`");
    }

    #[test]
    fn class_side_sees_class_instance_vars_only() {
        let set = analyse_source(
            "A subclass: Object\n  instanceVars: a\n  classInstanceVars: b\n  classMethod: good [ ^ b ]\n  classMethod: bad [ ^ a ]\n",
        );
        assert!(plan(&set, "good").has_return);
        assert_eq!(skip_reason(&set, "bad"), "unknown identifier `a`");
    }

    #[test]
    fn has_error_propagates_through_self_sends() {
        let set = analyse_source(
            "A subclass: Object\n  method: remote [ ^ @ other ping ]\n  method: viaRemote [ ^ @ self remote ]\n  method: viaFallback [ ^ @ self inherited ]\n  method: local [ ^ 1 ]\n  method: viaLocal [ ^ @ self local ]\n  method: other [ ^ 2 ]\n",
        );
        assert!(plan(&set, "remote").has_error);
        assert!(plan(&set, "viaRemote").has_error);
        assert!(plan(&set, "viaFallback").has_error);
        assert!(!plan(&set, "local").has_error);
        assert!(!plan(&set, "viaLocal").has_error);
    }

    #[test]
    fn self_send_with_wrong_arity_is_fallible() {
        let mut class =
            parse_source("A subclass: Object\n  method: one [ ^ 1 ]\n  method: caller [ ^ @ self one ]\n");
        class.methods[0].args.push("x".into());
        let set = analyse(&class, PrimitiveBindingTable::builtin());
        assert!(!plan(&set, "one").has_error);
        assert!(plan(&set, "caller").has_error);
    }

    #[test]
    fn has_error_fixpoint_handles_chains() {
        let set = analyse_source(
            "A subclass: Object\n  method: a [ ^ @ self b ]\n  method: b [ ^ @ self c ]\n  method: c [ ^ @ File read: 'x' ]\n",
        );
        assert!(plan(&set, "a").has_error);
        assert!(plan(&set, "b").has_error);
        assert!(plan(&set, "c").has_error);
    }

    #[test]
    fn duplicate_selector_keeps_first() {
        let set = analyse_source(
            "A subclass: Object\n  method: m [ ^ 1 ]\n  method: m [ ^ mystery ]\n",
        );
        assert_eq!(set.methods.len(), 1);
        assert!(set.skipped.is_empty());
        assert!(set.warnings[0].contains("defined twice"));
    }

    #[test]
    fn advice_attaches_to_compiled_target() {
        let set = analyse_source(
            "A subclass: Object\n  instanceVars: log\n  method: run [ ^ 1 ]\n  before: run do: [ log := 'start' ]\n  after: run do: [ log := log , ' done' ]\n",
        );
        let run = plan(&set, "run");
        assert_eq!(run.before.len(), 1);
        assert_eq!(run.after.len(), 1);
    }

    #[test]
    fn failing_advice_forces_target_fallback() {
        let set = analyse_source(
            "A subclass: Object\n  method: run [ ^ 1 ]\n  method: other [ ^ @ self run ]\n  before: run do: [ echo $HOME ]\n",
        );
        assert!(skip_reason(&set, "run").starts_with("before advice:"));
        assert!(set.warnings.iter().any(|w| w.contains("before advice on `run`")));
        assert!(plan(&set, "other").has_error, "`run` now falls back");
    }

    #[test]
    fn advice_on_skipped_target_is_reported() {
        let set = analyse_source(
            "A subclass: Object\n  rawMethod: run [ echo ]\n  after: run do: [ ^ 1 ]\n",
        );
        assert!(set.warnings.iter().any(|w| w.contains("its target falls back")));
    }

    #[test]
    fn aliases_resolve_to_compiled_methods() {
        let set = analyse_source(
            "A subclass: Object\n  method: count [ ^ 1 ]\n  rawMethod: raw [ x ]\n  alias: size for: count\n  alias: r for: raw\n  alias: count for: count\n",
        );
        assert_eq!(set.aliases.len(), 1);
        assert_eq!(set.aliases[0].new_name, "size");
        assert_eq!(set.resolve(MethodKind::Instance, "size").unwrap().selector, "count");
        assert!(set.resolve(MethodKind::Instance, "r").is_none());
        assert!(set.warnings.iter().any(|w| w.contains("alias `count`")));
    }

    #[test]
    fn method_names_avoid_fields() {
        let set = analyse_source(
            "A subclass: Object\n  instanceVars: value\n  method: value [ ^ value ]\n  method: at: k put: v [ ^ v ]\n",
        );
        assert_eq!(plan(&set, "value").go_name, "MethodValue");
        assert_eq!(plan(&set, "at_put_").go_name, "At_put_");
    }

    #[test]
    fn json_storage_follows_default() {
        let set = analyse_source(
            "A subclass: Object\n  instanceVars: count:'0' items:'[]' data:'{}' plain\n",
        );
        let storage: Vec<_> = set.layout.instance.iter().map(|f| f.storage).collect();
        assert_eq!(
            storage,
            vec![
                StorageKind::Text,
                StorageKind::Json,
                StorageKind::Json,
                StorageKind::Text
            ]
        );
    }

    #[test]
    fn colliding_field_names_get_a_suffix() {
        let set = analyse_source("A subclass: Object\n  instanceVars: value Value _x X_x\n");
        let names: Vec<&str> = set
            .layout
            .instance
            .iter()
            .map(|f| f.go_name.as_str())
            .collect();
        assert_eq!(names, vec!["Value", "Value_2", "X_x", "X_x_2"]);
    }

    #[test]
    fn class_variable_is_not_persisted() {
        let set = analyse_source("A subclass: Object\n  instanceVars: class\n");
        assert!(!set.layout.instance[0].persisted);
        assert_eq!(set.layout.instance[0].go_name, "VarClass");
        assert_eq!(set.warnings.len(), 1);
    }
}
