//! Extracted contracts, ready for synthesis.

use serde::{Deserialize, Serialize};

use crate::package::{LifetimeParam, MethodSig, Receiver};
use crate::types::{ItemRef, TypeDescriptor};

/// A trait the generated holder must implement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitImpl {
    pub item: ItemRef,
    pub is_unsafe: bool,
}

/// A method parameter. Only the last parameter may be variadic: a trailing
/// `&[T]` whose call record keeps the full expanded list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDescriptor {
    pub ty: TypeDescriptor,
    pub variadic: bool,
}

/// A flattened method of a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    /// The trait declaring the method.
    pub owner: ItemRef,
    pub receiver: Receiver,
    pub lifetimes: Vec<LifetimeParam>,
    pub params: Vec<ParamDescriptor>,
    /// Results in order. Tuples of two or more elements are split; any other
    /// non-unit output is a single result.
    pub results: Vec<TypeDescriptor>,
    pub is_unsafe: bool,
}

impl MethodDescriptor {
    pub fn from_sig(owner: ItemRef, sig: &MethodSig) -> Self {
        let last = sig.params.len().saturating_sub(1);
        let params = sig
            .params
            .iter()
            .enumerate()
            .map(|(i, p)| ParamDescriptor {
                ty: p.ty.clone(),
                variadic: i == last && is_slice_ref(&p.ty),
            })
            .collect();

        let results = match &sig.output {
            TypeDescriptor::Tuple(elems) if elems.len() != 1 => elems.clone(),
            other => vec![other.clone()],
        };

        MethodDescriptor {
            name: sig.name.clone(),
            owner,
            receiver: sig.receiver.clone(),
            lifetimes: sig.lifetimes.clone(),
            params,
            results,
            is_unsafe: sig.is_unsafe,
        }
    }

    /// The declared return type, reassembled from the result list.
    pub fn output(&self) -> TypeDescriptor {
        match self.results.as_slice() {
            [single] => single.clone(),
            many => TypeDescriptor::Tuple(many.to_vec()),
        }
    }

    pub fn is_variadic(&self) -> bool {
        self.params.last().is_some_and(|p| p.variadic)
    }
}

fn is_slice_ref(ty: &TypeDescriptor) -> bool {
    matches!(
        ty,
        TypeDescriptor::Reference { mutable: false, inner, .. }
            if matches!(**inner, TypeDescriptor::Slice(_))
    )
}

/// A requested contract with its flattened method set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDescriptor {
    /// The trait's declared name.
    pub name: String,
    /// Import path of the declaring package.
    pub package: String,
    pub trait_ref: ItemRef,
    /// Overrides the mock name prefix.
    pub prefix: Option<String>,
    pub methods: Vec<MethodDescriptor>,
    /// The requested trait and every flattened supertrait, supertraits first.
    pub implements: Vec<TraitImpl>,
}

impl InterfaceDescriptor {
    /// Whether any method takes `&mut self`.
    pub fn has_mut_receiver(&self) -> bool {
        self.methods.iter().any(|m| m.receiver.is_mut())
    }

    pub fn methods_of<'a>(&'a self, owner: &'a ItemRef) -> impl Iterator<Item = &'a MethodDescriptor> {
        self.methods.iter().filter(move |m| &m.owner == owner)
    }
}
