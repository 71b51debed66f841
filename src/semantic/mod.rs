//! Symbol information the analysis asks of its host.
//!
//! The analysis never resolves names on its own: it hands a [`CallSite`] to a
//! [`SemanticModel`] and works from the [`CalleeSymbol`] it gets back.
//! [`DeclarationIndex`] is the model used by the CLI and MCP server.

pub mod index;

pub use index::DeclarationIndex;

use crate::syntax::tree::{CallExpr, MethodDecl, ParamModifier, TypeRef};

/// Spellings of the universal object type.
const OBJECT_TYPE_NAMES: &[&str] = &[
    "object",
    "Object",
    "System.Object",
    "global::System.Object",
];

/// An invocation together with the type whose body contains it.
#[derive(Debug, Clone, Copy)]
pub struct CallSite<'a> {
    pub call: &'a CallExpr,
    pub containing_type: &'a str,
    /// Member whose body holds the call. Receiver names are looked up among
    /// its locals and parameters.
    pub method: Option<&'a MethodDecl>,
}

/// One formal parameter of a resolved method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    pub name: String,
    pub ty: TypeRef,
    pub ordinal: usize,
    /// Declared `params`; only ever true for the last parameter.
    pub is_variadic: bool,
    /// Optional parameter with a default value.
    pub has_default: bool,
}

impl ParameterDescriptor {
    /// Type an argument bound to this parameter is converted to.
    ///
    /// For a `params` parameter that is the element type: the array element,
    /// or the single type argument of a `params` collection such as
    /// `ReadOnlySpan<object>`.
    pub fn effective_type(&self) -> Option<TypeRef> {
        if !self.is_variadic {
            return Some(self.ty.clone());
        }
        if let Some(element) = self.ty.element_type() {
            return Some(element);
        }
        match self.ty.type_args.as_slice() {
            [element] => Some(element.clone()),
            _ => None,
        }
    }
}

/// A resolved method: what the analysis needs to bind arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalleeSymbol {
    pub name: String,
    pub containing_type: String,
    parameters: Vec<ParameterDescriptor>,
}

impl CalleeSymbol {
    /// Build a symbol, rejecting a variadic parameter anywhere but last.
    pub fn new(
        name: impl Into<String>,
        containing_type: impl Into<String>,
        parameters: Vec<ParameterDescriptor>,
    ) -> Option<Self> {
        let misplaced = parameters
            .iter()
            .rev()
            .skip(1)
            .any(|param| param.is_variadic);
        if misplaced {
            return None;
        }
        Some(Self {
            name: name.into(),
            containing_type: containing_type.into(),
            parameters,
        })
    }

    /// Symbol for a declared method. Ordinals follow declaration order.
    pub fn from_decl(method: &MethodDecl, containing_type: &str) -> Option<Self> {
        let parameters = method
            .parameters
            .iter()
            .enumerate()
            .map(|(ordinal, param)| ParameterDescriptor {
                name: param.name.value().to_string(),
                ty: param.ty.clone(),
                ordinal,
                is_variadic: param.is_params(),
                has_default: param.default.is_some(),
            })
            .collect();
        Self::new(method.name.value(), containing_type, parameters)
    }

    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    /// The trailing `params` parameter, if the method has one.
    pub fn variadic(&self) -> Option<&ParameterDescriptor> {
        self.parameters.last().filter(|param| param.is_variadic)
    }

    /// First parameter is declared `this`.
    pub(crate) fn is_extension(method: &MethodDecl) -> bool {
        method.is_static
            && method
                .parameters
                .first()
                .is_some_and(|param| param.modifier == Some(ParamModifier::This))
    }

    /// The same method seen through an instance call: the receiver parameter
    /// is gone and the rest are renumbered from zero.
    pub fn reduced(&self) -> Self {
        let parameters = self
            .parameters
            .iter()
            .skip(1)
            .enumerate()
            .map(|(ordinal, param)| ParameterDescriptor {
                ordinal,
                ..param.clone()
            })
            .collect();
        Self {
            name: self.name.clone(),
            containing_type: self.containing_type.clone(),
            parameters,
        }
    }
}

/// Resolves the method an invocation calls.
pub trait SemanticModel: Send + Sync {
    /// `None` when the callee cannot be resolved to a single method.
    fn resolve_callee(&self, site: &CallSite<'_>) -> Option<&CalleeSymbol>;
}

/// Whether `ty` is the universal object type. A nullable annotation does not
/// change the type; arrays and generic instantiations never match.
pub fn is_object_type(ty: &TypeRef) -> bool {
    ty.array_rank == 0 && ty.type_args.is_empty() && OBJECT_TYPE_NAMES.contains(&ty.name.as_str())
}
