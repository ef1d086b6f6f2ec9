//! Type descriptions consumed by the cast classifier.
//!
//! The classifier never talks to a parser directly. It walks types through the
//! [`TypeModel`] trait, which exposes the few primitives it needs: canonical
//! resolution, the shape of a level, its constness and one step of
//! pointer/reference stripping. [`CType`] together with [`CTypeModel`] is the
//! concrete model used by the tree-sitter host and by tests.

use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;

/// Maximum number of alias hops followed while canonicalizing a named type.
const MAX_ALIAS_DEPTH: usize = 32;

/// Shape of one level of a type, as far as the classifier cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeShape {
    /// `T *`
    Pointer,
    /// `T &` or `T &&`
    Reference,
    /// Anything else (scalars, records, arrays, functions, unknown).
    Other,
}

/// Primitives the classifier needs from a type system.
pub trait TypeModel {
    /// The type representation handled by this model.
    type Type: Clone;

    /// Resolves aliases and drops the top-level qualifiers.
    fn canonical(&self, ty: &Self::Type) -> Self::Type;

    /// Shape of the outermost level of `ty`.
    fn shape(&self, ty: &Self::Type) -> TypeShape;

    /// Whether the outermost level of `ty` is `const`-qualified.
    fn is_const(&self, ty: &Self::Type) -> bool;

    /// Pointee of a pointer or referent of a reference, `None` otherwise.
    fn strip_indirection(&self, ty: &Self::Type) -> Option<Self::Type>;
}

/// Structural description of a C++ type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CType {
    /// `const` applies to this level.
    pub is_const: bool,
    /// `volatile` applies to this level.
    pub is_volatile: bool,
    /// What this level is.
    pub kind: CTypeKind,
}

/// The level-specific part of a [`CType`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CTypeKind {
    /// A named type: builtin, record, enum, alias or template instance.
    Named(String),
    /// Pointer to the inner type.
    Pointer(Box<CType>),
    /// Lvalue or rvalue reference to the inner type.
    Reference(Box<CType>),
    /// Array of the inner type.
    Array(Box<CType>),
    /// Function returning the inner type.
    Function(Box<CType>),
    /// The host could not resolve the type.
    Unknown,
}

impl CType {
    /// Unqualified named type.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::from_kind(CTypeKind::Named(name.into()))
    }

    /// Unqualified pointer to `pointee`.
    #[must_use]
    pub fn pointer_to(pointee: CType) -> Self {
        Self::from_kind(CTypeKind::Pointer(Box::new(pointee)))
    }

    /// Reference to `referent`.
    #[must_use]
    pub fn reference_to(referent: CType) -> Self {
        Self::from_kind(CTypeKind::Reference(Box::new(referent)))
    }

    /// Array of `element`.
    #[must_use]
    pub fn array_of(element: CType) -> Self {
        Self::from_kind(CTypeKind::Array(Box::new(element)))
    }

    /// Function returning `ret`.
    #[must_use]
    pub fn function_returning(ret: CType) -> Self {
        Self::from_kind(CTypeKind::Function(Box::new(ret)))
    }

    /// A type the host could not resolve.
    #[must_use]
    pub fn unknown() -> Self {
        Self::from_kind(CTypeKind::Unknown)
    }

    fn from_kind(kind: CTypeKind) -> Self {
        Self {
            is_const: false,
            is_volatile: false,
            kind,
        }
    }

    /// Returns the same type with `const` added at this level.
    #[must_use]
    pub fn with_const(mut self) -> Self {
        self.is_const = true;
        self
    }

    /// Returns the same type with `volatile` added at this level.
    #[must_use]
    pub fn with_volatile(mut self) -> Self {
        self.is_volatile = true;
        self
    }

    /// Returns the same type without top-level qualifiers.
    #[must_use]
    pub fn unqualified(mut self) -> Self {
        self.is_const = false;
        self.is_volatile = false;
        self
    }

    /// Whether this is the `void` type (qualifiers ignored).
    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(&self.kind, CTypeKind::Named(name) if name == "void")
    }

    /// Whether the host failed to resolve this type.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self.kind, CTypeKind::Unknown)
    }

    /// Pointee, referent, element or return type.
    #[must_use]
    pub fn inner(&self) -> Option<&CType> {
        match &self.kind {
            CTypeKind::Pointer(inner)
            | CTypeKind::Reference(inner)
            | CTypeKind::Array(inner)
            | CTypeKind::Function(inner) => Some(inner),
            CTypeKind::Named(_) | CTypeKind::Unknown => None,
        }
    }

    fn qualifier_prefix(&self) -> String {
        let mut out = String::new();
        if self.is_const {
            out.push_str("const ");
        }
        if self.is_volatile {
            out.push_str("volatile ");
        }
        out
    }

    fn qualifier_suffix(&self) -> String {
        let mut out = String::new();
        if self.is_const {
            out.push_str(" const");
        }
        if self.is_volatile {
            out.push_str(" volatile");
        }
        out
    }
}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            CTypeKind::Named(name) => write!(f, "{}{name}", self.qualifier_prefix()),
            CTypeKind::Unknown => write!(f, "{}<unknown>", self.qualifier_prefix()),
            CTypeKind::Pointer(inner) => write!(f, "{inner} *{}", self.qualifier_suffix()),
            CTypeKind::Reference(inner) => write!(f, "{inner} &"),
            CTypeKind::Array(inner) => write!(f, "{inner} []"),
            CTypeKind::Function(inner) => write!(f, "{inner} ()"),
        }
    }
}

impl Serialize for CType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Table of `typedef` and `using` aliases visible in a translation unit.
#[derive(Debug, Default, Clone)]
pub struct TypeAliases {
    aliases: FxHashMap<String, CType>,
}

impl TypeAliases {
    /// Creates an empty alias table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` as an alias of `target`, replacing any earlier
    /// definition. Aliases are file-global: block-scoped typedefs are not
    /// told apart.
    pub fn insert(&mut self, name: impl Into<String>, target: CType) {
        self.aliases.insert(name.into(), target);
    }

    /// Looks up the direct target of an alias.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CType> {
        self.aliases.get(name)
    }

    /// Number of registered aliases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Whether no alias is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Expands every alias in `ty`, keeping qualifiers of both the use site and
    /// the alias target.
    #[must_use]
    pub fn resolve(&self, ty: &CType) -> CType {
        self.resolve_with_depth(ty, 0)
    }

    fn resolve_with_depth(&self, ty: &CType, depth: usize) -> CType {
        let kind = match &ty.kind {
            CTypeKind::Named(name) => {
                if depth < MAX_ALIAS_DEPTH {
                    if let Some(target) = self.aliases.get(name) {
                        let mut resolved = self.resolve_with_depth(target, depth + 1);
                        resolved.is_const |= ty.is_const;
                        resolved.is_volatile |= ty.is_volatile;
                        return resolved;
                    }
                }
                CTypeKind::Named(name.clone())
            }
            CTypeKind::Pointer(inner) => {
                CTypeKind::Pointer(Box::new(self.resolve_with_depth(inner, depth)))
            }
            CTypeKind::Reference(inner) => {
                CTypeKind::Reference(Box::new(self.resolve_with_depth(inner, depth)))
            }
            CTypeKind::Array(inner) => {
                CTypeKind::Array(Box::new(self.resolve_with_depth(inner, depth)))
            }
            CTypeKind::Function(inner) => {
                CTypeKind::Function(Box::new(self.resolve_with_depth(inner, depth)))
            }
            CTypeKind::Unknown => CTypeKind::Unknown,
        };
        CType {
            is_const: ty.is_const,
            is_volatile: ty.is_volatile,
            kind,
        }
    }
}

/// [`TypeModel`] over [`CType`], expanding aliases from a [`TypeAliases`] table.
#[derive(Debug, Default, Clone)]
pub struct CTypeModel {
    aliases: TypeAliases,
}

impl CTypeModel {
    /// Model with the given alias table.
    #[must_use]
    pub fn new(aliases: TypeAliases) -> Self {
        Self { aliases }
    }

    /// The alias table backing this model.
    #[must_use]
    pub fn aliases(&self) -> &TypeAliases {
        &self.aliases
    }
}

impl TypeModel for CTypeModel {
    type Type = CType;

    fn canonical(&self, ty: &CType) -> CType {
        self.aliases.resolve(ty).unqualified()
    }

    fn shape(&self, ty: &CType) -> TypeShape {
        match ty.kind {
            CTypeKind::Pointer(_) => TypeShape::Pointer,
            CTypeKind::Reference(_) => TypeShape::Reference,
            _ => TypeShape::Other,
        }
    }

    fn is_const(&self, ty: &CType) -> bool {
        ty.is_const
    }

    fn strip_indirection(&self, ty: &CType) -> Option<CType> {
        match &ty.kind {
            CTypeKind::Pointer(inner) | CTypeKind::Reference(inner) => Some((**inner).clone()),
            _ => None,
        }
    }
}
