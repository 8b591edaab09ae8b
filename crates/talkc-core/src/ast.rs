// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Syntax trees for talk classes and method bodies.
//!
//! There are two layers:
//!
//! - The **declaration tree** ([`ClassDecl`] and friends) produced by the
//!   declaration parser. Method and advice bodies stay as raw token spans.
//!   This layer has a serde JSON wire format so a companion front end can
//!   hand a class to the compiler.
//! - The **statement tree** ([`Statement`], [`Expression`]) produced per
//!   method by the body parser. It is a closed set of node kinds; anything
//!   outside it makes the method fall back to the interpreter.
//!
//! # Selectors
//!
//! A unary method's selector is its bare name. A keyword method's selector
//! is every keyword with its colon stripped, joined with `_`, plus one
//! trailing `_`:
//!
//! ```
//! use talkc_core::ast::keyword_selector;
//!
//! assert_eq!(keyword_selector(["at:", "put:"]), "at_put_");
//! assert_eq!(keyword_selector(["increment:"]), "increment_");
//! ```
//!
//! The same string keys dispatch tables, self-send resolution and the
//! primitive registry.

use ecow::EcoString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::source_analysis::{Position, Token};

/// Builds a keyword selector from keyword parts (with or without colons).
#[must_use]
pub fn keyword_selector<'a>(keywords: impl IntoIterator<Item = &'a str>) -> EcoString {
    let mut selector = EcoString::new();
    for keyword in keywords {
        selector.push_str(keyword.strip_suffix(':').unwrap_or(keyword));
        selector.push('_');
    }
    selector
}

// ---------------------------------------------------------------------------
// Declaration tree
// ---------------------------------------------------------------------------

/// A parsed class (or trait) declaration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassDecl {
    /// The class name, empty when the header was missing.
    pub name: EcoString,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<EcoString>,
    pub imports: Vec<EcoString>,
    /// Parent class, possibly qualified (`Pkg::Base`). Traits have none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<EcoString>,
    pub is_trait: bool,
    pub instance_vars: Vec<VarSpec>,
    pub class_instance_vars: Vec<VarSpec>,
    /// Included traits.
    pub traits: Vec<EcoString>,
    /// File dependencies (`requires: 'lib/x.sh'`).
    pub requires: Vec<EcoString>,
    /// Abstract method requirements (`requires: describe`).
    pub method_requirements: Vec<EcoString>,
    pub methods: Vec<MethodDecl>,
    pub aliases: Vec<Alias>,
    pub advice: Vec<Advice>,
    pub warnings: Vec<ParseWarning>,
    pub errors: Vec<ParseError>,
}

impl ClassDecl {
    /// Returns true when no fatal parse errors were recorded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Looks up an instance variable by name.
    #[must_use]
    pub fn instance_var(&self, name: &str) -> Option<&VarSpec> {
        self.instance_vars.iter().find(|v| v.name == name)
    }

    /// Looks up a class-instance variable by name.
    #[must_use]
    pub fn class_instance_var(&self, name: &str) -> Option<&VarSpec> {
        self.class_instance_vars.iter().find(|v| v.name == name)
    }

    /// The variables visible on one side of the class.
    #[must_use]
    pub fn vars_for(&self, kind: MethodKind) -> &[VarSpec] {
        match kind {
            MethodKind::Instance => &self.instance_vars,
            MethodKind::Class => &self.class_instance_vars,
        }
    }

    /// Decodes a declaration tree from its JSON wire format.
    ///
    /// # Errors
    ///
    /// Returns [`DeclarationError::Json`] for malformed JSON and
    /// [`DeclarationError::MissingName`] when the tree names no class.
    pub fn from_json(json: &str) -> Result<Self, DeclarationError> {
        let class: Self = serde_json::from_str(json)?;
        if class.name.is_empty() {
            return Err(DeclarationError::MissingName);
        }
        Ok(class)
    }

    /// Encodes the declaration tree as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DeclarationError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, DeclarationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A declaration tree that could not be decoded.
#[derive(Debug, Error)]
pub enum DeclarationError {
    #[error("invalid declaration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("the declaration has no class name")]
    MissingName,
}

/// An instance or class-instance variable with its optional default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarSpec {
    pub name: EcoString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<VarDefault>,
}

impl VarSpec {
    /// Creates a variable without a default.
    #[must_use]
    pub fn new(name: impl Into<EcoString>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    /// Creates a variable with a default.
    #[must_use]
    pub fn with_default(name: impl Into<EcoString>, kind: DefaultKind, value: impl Into<EcoString>) -> Self {
        Self {
            name: name.into(),
            default: Some(VarDefault {
                kind,
                value: value.into(),
            }),
        }
    }

    /// How generated code stores this variable.
    ///
    /// A default whose literal starts with `{` or `[` makes the variable
    /// structured; everything else, including no default, is text.
    #[must_use]
    pub fn storage(&self) -> StorageKind {
        match &self.default {
            Some(default) if default.value.trim_start().starts_with(['{', '[']) => {
                StorageKind::Json
            }
            _ => StorageKind::Text,
        }
    }
}

/// A variable default literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarDefault {
    pub kind: DefaultKind,
    /// Literal content without quotes.
    pub value: EcoString,
}

/// The literal kind of a variable default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultKind {
    Number,
    String,
    TripleString,
}

/// Storage representation of a variable in generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// Opaque text (`string`).
    Text,
    /// A JSON-shaped array or object (`interface{}`).
    Json,
}

/// Which side of the class a method belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    #[default]
    Instance,
    Class,
}

/// A method declaration with its uninterpreted body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub kind: MethodKind,
    #[serde(default)]
    pub raw: bool,
    pub selector: EcoString,
    /// Keyword parts with colons, empty for unary methods.
    #[serde(default)]
    pub keywords: Vec<EcoString>,
    #[serde(default)]
    pub args: Vec<EcoString>,
    #[serde(default)]
    pub pragmas: Vec<EcoString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<EcoString>,
    /// Body tokens between the outer brackets, pragmas removed.
    #[serde(default)]
    pub body: Vec<Token>,
    #[serde(default)]
    pub line: u32,
}

impl MethodDecl {
    /// Returns the number of arguments.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Returns true if the body carries the given pragma.
    #[must_use]
    pub fn has_pragma(&self, pragma: Pragma) -> bool {
        self.pragmas.iter().any(|p| p == pragma.as_str())
    }

    /// Returns true for class-side methods.
    #[must_use]
    pub fn is_class_side(&self) -> bool {
        self.kind == MethodKind::Class
    }
}

/// Pragmas recognized by the code generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pragma {
    /// Always fall back to the interpreter.
    InterpreterOnly,
    /// Compile a raw method anyway.
    CompileOnly,
    /// Compile a raw method with its native body.
    NativeBody,
    /// Use the primitive registry entry.
    Primitive,
}

impl Pragma {
    /// The pragma name as written in source.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InterpreterOnly => "interpreterOnly",
            Self::CompileOnly => "compileOnly",
            Self::NativeBody => "nativeBody",
            Self::Primitive => "primitive",
        }
    }
}

/// `alias: newName for: existingName`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub new_name: EcoString,
    pub existing_name: EcoString,
}

/// Whether advice runs before or after its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceKind {
    Before,
    After,
}

/// `before: selector do: [ ... ]` / `after: selector do: [ ... ]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advice {
    pub kind: AdviceKind,
    pub selector: EcoString,
    #[serde(default)]
    pub body: Vec<Token>,
    #[serde(default)]
    pub line: u32,
}

/// Kinds of non-fatal declaration warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParseWarningKind {
    /// `instanceVars: count: total` probably meant `count:total` or two vars.
    AmbiguousVarSpacing,
    /// A non-trait class declares a method requirement.
    MethodRequirementOnClass,
}

/// A non-fatal declaration warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    pub kind: ParseWarningKind,
    pub message: EcoString,
    #[serde(flatten)]
    pub position: Position,
}

/// Kinds of fatal declaration errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParseErrorKind {
    UnexpectedToken,
    MissingClassHeader,
    MalformedDeclaration,
    UnterminatedBlock,
}

/// A declaration-level parse error. Parsing continues after recording it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: EcoString,
    /// The offending token, absent at end of input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<Token>,
    /// What the parser was doing (`class header`, `method increment`, ...).
    pub context: EcoString,
    #[serde(flatten)]
    pub position: Position,
}

// ---------------------------------------------------------------------------
// Statement tree
// ---------------------------------------------------------------------------

/// A statement in a method body.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `| a b |`
    Locals(Vec<EcoString>),
    /// `name := value`
    Assign { target: EcoString, value: Expression },
    /// `^ value`
    Return(Expression),
    /// A bare expression evaluated for its effect.
    Expr(Expression),
    /// `cond ifTrue: [..] ifFalse: [..]`; either branch may be absent.
    If {
        condition: Expression,
        then_branch: Option<Vec<Statement>>,
        else_branch: Option<Vec<Statement>>,
    },
    /// `[cond] whileTrue: [..]`. The condition is evaluated on every pass.
    While {
        condition: Expression,
        body: Vec<Statement>,
    },
    /// `x ifNil: [..] ifNotNil: [:v | ..]`
    NilGuard {
        subject: Expression,
        if_nil: Option<Vec<Statement>>,
        if_not_nil: Option<Vec<Statement>>,
        binding: Option<EcoString>,
    },
}

/// Binary operators, in precedence groups from loosest to tightest:
/// comparison, concatenation, additive, multiplicative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
    Concat,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    /// Returns true for the six comparison operators.
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Gt | Self::Lt | Self::Ge | Self::Le | Self::Eq | Self::Ne
        )
    }

    /// The operator as spelled in generated Go.
    #[must_use]
    pub const fn go_operator(self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Concat | Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }
}

/// The three iteration forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IterationKind {
    Do,
    Collect,
    Select,
}

impl IterationKind {
    /// Recognizes `do:`, `collect:` and `select:`.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "do:" => Some(Self::Do),
            "collect:" => Some(Self::Collect),
            "select:" => Some(Self::Select),
            _ => None,
        }
    }

    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Do => "do:",
            Self::Collect => "collect:",
            Self::Select => "select:",
        }
    }
}

/// A block literal `[ :a :b | statements ]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub params: Vec<EcoString>,
    pub body: Vec<Statement>,
}

/// Array and object operations that attach as suffixes to a primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionOp {
    ArrayLength,
    ArrayFirst,
    ArrayLast,
    ArrayIsEmpty,
    ArrayNotEmpty,
    ObjectKeys,
    ObjectValues,
    ObjectLength,
    ObjectIsEmpty,
    ArrayPush,
    ArrayAt,
    /// `arrayAt: i put: v`, fused at parse time.
    ArrayAtPut,
    ArrayRemoveAt,
    ObjectAt,
    /// `objectAt: k put: v`, fused at parse time.
    ObjectAtPut,
    ObjectRemoveKey,
    ObjectHasKey,
}

impl CollectionOp {
    /// Recognizes a unary suffix name.
    #[must_use]
    pub fn from_unary(name: &str) -> Option<Self> {
        Some(match name {
            "arrayLength" => Self::ArrayLength,
            "arrayFirst" => Self::ArrayFirst,
            "arrayLast" => Self::ArrayLast,
            "arrayIsEmpty" => Self::ArrayIsEmpty,
            "arrayNotEmpty" => Self::ArrayNotEmpty,
            "objectKeys" => Self::ObjectKeys,
            "objectValues" => Self::ObjectValues,
            "objectLength" => Self::ObjectLength,
            "objectIsEmpty" => Self::ObjectIsEmpty,
            _ => return None,
        })
    }

    /// Recognizes a keyword suffix (colon included). The fused `put:` forms
    /// are produced by the parser, never looked up here.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "arrayPush:" => Self::ArrayPush,
            "arrayAt:" => Self::ArrayAt,
            "arrayRemoveAt:" => Self::ArrayRemoveAt,
            "objectAt:" => Self::ObjectAt,
            "objectRemoveKey:" => Self::ObjectRemoveKey,
            "objectHasKey:" => Self::ObjectHasKey,
            _ => return None,
        })
    }

    /// The `put:` fusion of an `at:` operation.
    #[must_use]
    pub const fn with_put(self) -> Option<Self> {
        match self {
            Self::ArrayAt => Some(Self::ArrayAtPut),
            Self::ObjectAt => Some(Self::ObjectAtPut),
            _ => None,
        }
    }

    /// Number of arguments the operation takes.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::ArrayLength
            | Self::ArrayFirst
            | Self::ArrayLast
            | Self::ArrayIsEmpty
            | Self::ArrayNotEmpty
            | Self::ObjectKeys
            | Self::ObjectValues
            | Self::ObjectLength
            | Self::ObjectIsEmpty => 0,
            Self::ArrayPush
            | Self::ArrayAt
            | Self::ArrayRemoveAt
            | Self::ObjectAt
            | Self::ObjectRemoveKey
            | Self::ObjectHasKey => 1,
            Self::ArrayAtPut | Self::ObjectAtPut => 2,
        }
    }
}

/// Compile-time rewrites of `@ String ...` and `@ File ...` sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassPrimitiveOp {
    StringIsEmpty,
    StringNotEmpty,
    StringLength,
    StringTrim,
    StringToUpper,
    StringToLower,
    StringContains,
    StringStartsWith,
    StringEndsWith,
    StringReplace,
    FileExists,
    FileIsFile,
    FileIsDirectory,
    FileRead,
    FileWrite,
    FileAppend,
    FileDelete,
    FileBasename,
    FileDirname,
}

impl ClassPrimitiveOp {
    /// Recognizes a `(class, selector)` pair.
    #[must_use]
    pub fn lookup(class: &str, selector: &str) -> Option<Self> {
        Some(match (class, selector) {
            ("String", "isEmpty_") => Self::StringIsEmpty,
            ("String", "notEmpty_") => Self::StringNotEmpty,
            ("String", "length_") => Self::StringLength,
            ("String", "trim_") => Self::StringTrim,
            ("String", "toUpper_") => Self::StringToUpper,
            ("String", "toLower_") => Self::StringToLower,
            ("String", "contains_substring_") => Self::StringContains,
            ("String", "startsWith_prefix_") => Self::StringStartsWith,
            ("String", "endsWith_suffix_") => Self::StringEndsWith,
            ("String", "replace_with_in_") => Self::StringReplace,
            ("File", "exists_") => Self::FileExists,
            ("File", "isFile_") => Self::FileIsFile,
            ("File", "isDirectory_") => Self::FileIsDirectory,
            ("File", "read_") => Self::FileRead,
            ("File", "write_to_") => Self::FileWrite,
            ("File", "append_to_") => Self::FileAppend,
            ("File", "delete_") => Self::FileDelete,
            ("File", "basename_") => Self::FileBasename,
            ("File", "dirname_") => Self::FileDirname,
            _ => return None,
        })
    }

    /// The receiver class name.
    #[must_use]
    pub const fn class_name(self) -> &'static str {
        match self {
            Self::StringIsEmpty
            | Self::StringNotEmpty
            | Self::StringLength
            | Self::StringTrim
            | Self::StringToUpper
            | Self::StringToLower
            | Self::StringContains
            | Self::StringStartsWith
            | Self::StringEndsWith
            | Self::StringReplace => "String",
            _ => "File",
        }
    }

    /// Returns true for operations that touch the filesystem and can fail.
    #[must_use]
    pub const fn is_fallible(self) -> bool {
        matches!(
            self,
            Self::FileRead | Self::FileWrite | Self::FileAppend | Self::FileDelete
        )
    }
}

/// An expression in a method body.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Identifier(EcoString),
    /// `Pkg::Name`
    Qualified {
        package: EcoString,
        name: EcoString,
    },
    /// Literal text of a number, possibly negative.
    Number(EcoString),
    /// String content without delimiters.
    String(EcoString),
    Block(Block),
    /// `receiver do: [:x | ..]` with a literal one-parameter block.
    Iteration {
        kind: IterationKind,
        receiver: Box<Expression>,
        block: Block,
    },
    /// `receiver do: aBlock` with the block held in a variable.
    DynamicIteration {
        kind: IterationKind,
        receiver: Box<Expression>,
        block_var: EcoString,
    },
    /// `@ receiver selector args`
    Send {
        receiver: Box<Expression>,
        selector: EcoString,
        args: Vec<Expression>,
        is_self: bool,
    },
    Collection {
        receiver: Box<Expression>,
        op: CollectionOp,
        args: Vec<Expression>,
    },
    ClassPrimitive {
        op: ClassPrimitiveOp,
        args: Vec<Expression>,
    },
}

impl Expression {
    /// Convenience constructor for identifiers.
    #[must_use]
    pub fn identifier(name: impl Into<EcoString>) -> Self {
        Self::Identifier(name.into())
    }

    /// Returns true for the `self` pseudo-variable.
    #[must_use]
    pub fn is_self(&self) -> bool {
        matches!(self, Self::Identifier(name) if name == "self")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_rule() {
        assert_eq!(keyword_selector(["at:", "put:"]), "at_put_");
        assert_eq!(keyword_selector(["with"]), "with_");
    }

    #[test]
    fn storage_follows_default_literal() {
        assert_eq!(VarSpec::new("x").storage(), StorageKind::Text);
        assert_eq!(
            VarSpec::with_default("x", DefaultKind::String, "0").storage(),
            StorageKind::Text
        );
        assert_eq!(
            VarSpec::with_default("x", DefaultKind::String, "[]").storage(),
            StorageKind::Json
        );
        assert_eq!(
            VarSpec::with_default("x", DefaultKind::TripleString, "\n{\"a\": 1}").storage(),
            StorageKind::Json
        );
        assert_eq!(
            VarSpec::with_default("x", DefaultKind::Number, "42").storage(),
            StorageKind::Text
        );
    }

    #[test]
    fn class_decl_json_defaults_missing_fields() {
        let decl: ClassDecl = serde_json::from_str(r#"{"name": "Counter"}"#).unwrap();
        assert_eq!(decl.name, "Counter");
        assert!(decl.methods.is_empty());
        assert!(decl.is_valid());
    }

    #[test]
    fn from_json_requires_a_name() {
        assert!(matches!(
            ClassDecl::from_json(r#"{"parent": "Object"}"#),
            Err(DeclarationError::MissingName)
        ));
        assert!(matches!(
            ClassDecl::from_json("{not json"),
            Err(DeclarationError::Json(_))
        ));
        let decl = ClassDecl::from_json(r#"{"name": "Counter", "parent": "Object"}"#).unwrap();
        assert_eq!(decl.parent.as_deref(), Some("Object"));
    }

    #[test]
    fn to_json_is_readable_by_from_json() {
        let decl = ClassDecl {
            name: "Counter".into(),
            instance_vars: vec![VarSpec::with_default("value", DefaultKind::Number, "0")],
            ..ClassDecl::default()
        };
        let back = ClassDecl::from_json(&decl.to_json().unwrap()).unwrap();
        assert_eq!(back, decl);
    }

    #[test]
    fn method_json_round_trip() {
        let json = r#"{
            "kind": "instance",
            "selector": "at_put_",
            "keywords": ["at:", "put:"],
            "args": ["k", "v"],
            "pragmas": ["primitive"],
            "body": [{"type": "IDENTIFIER", "value": "k", "line": 3, "col": 5}]
        }"#;
        let method: MethodDecl = serde_json::from_str(json).unwrap();
        assert_eq!(method.arity(), 2);
        assert!(method.has_pragma(Pragma::Primitive));
        assert!(!method.has_pragma(Pragma::NativeBody));
        assert_eq!(method.body[0].line(), 3);
    }

    #[test]
    fn put_fusion_only_for_at_operations() {
        assert_eq!(CollectionOp::ArrayAt.with_put(), Some(CollectionOp::ArrayAtPut));
        assert_eq!(CollectionOp::ObjectAt.with_put(), Some(CollectionOp::ObjectAtPut));
        assert_eq!(CollectionOp::ArrayPush.with_put(), None);
    }

    #[test]
    fn class_primitive_table() {
        assert_eq!(
            ClassPrimitiveOp::lookup("String", "replace_with_in_"),
            Some(ClassPrimitiveOp::StringReplace)
        );
        assert_eq!(ClassPrimitiveOp::lookup("File", "length_"), None);
        assert_eq!(ClassPrimitiveOp::FileRead.class_name(), "File");
        assert!(ClassPrimitiveOp::FileWrite.is_fallible());
        assert!(!ClassPrimitiveOp::FileExists.is_fallible());
    }
}
