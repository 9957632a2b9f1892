//! Resolved type descriptors.
//!
//! A [`TypeDescriptor`] is the canonical, resolved form of a type written in
//! a trait signature. Every named type carries an [`ItemRef`] naming the
//! package that declares it, so the synthesizer can qualify it relative to
//! whichever package the generated code is compiled into.
//!
//! Descriptors are canonical: `use` renames, type aliases and re-exports are
//! resolved before a descriptor is built, and prelude types are recorded
//! under their `std` paths. Structural equality therefore coincides with
//! "denotes the same resolved type".

use std::fmt;

use serde::{Deserialize, Serialize};

/// Import path under which canonical prelude and std items are recorded.
pub const STD_PACKAGE: &str = "std";

/// A reference to a named item: the declaring package plus the item's path
/// inside that package (`sync::Arc`, `store::Widget`, `Widget` at the root).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemRef {
    pub package: String,
    pub path: String,
}

impl ItemRef {
    pub fn new(package: impl Into<String>, path: impl Into<String>) -> Self {
        ItemRef {
            package: package.into(),
            path: path.into(),
        }
    }

    /// Shorthand for an item of the `std` package.
    pub fn std(path: impl Into<String>) -> Self {
        ItemRef::new(STD_PACKAGE, path)
    }

    /// The final path segment (the item's own name).
    pub fn name(&self) -> &str {
        self.path.rsplit("::").next().unwrap_or(&self.path)
    }

    /// Path segments inside the declaring package.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split("::").filter(|s| !s.is_empty())
    }

    /// Whether the item is one of `paths` inside std, core or alloc.
    pub fn is_std_item(&self, paths: &[&str]) -> bool {
        matches!(self.package.as_str(), "std" | "core" | "alloc")
            && paths.contains(&self.path.as_str())
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.package, self.path)
    }
}

/// Primitive types built into the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    Bool,
    Char,
    Str,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
}

impl Primitive {
    const ALL: [Primitive; 17] = [
        Primitive::Bool,
        Primitive::Char,
        Primitive::Str,
        Primitive::I8,
        Primitive::I16,
        Primitive::I32,
        Primitive::I64,
        Primitive::I128,
        Primitive::Isize,
        Primitive::U8,
        Primitive::U16,
        Primitive::U32,
        Primitive::U64,
        Primitive::U128,
        Primitive::Usize,
        Primitive::F32,
        Primitive::F64,
    ];

    pub fn from_name(name: &str) -> Option<Primitive> {
        Self::ALL.into_iter().find(|p| p.as_str() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::Str => "str",
            Primitive::I8 => "i8",
            Primitive::I16 => "i16",
            Primitive::I32 => "i32",
            Primitive::I64 => "i64",
            Primitive::I128 => "i128",
            Primitive::Isize => "isize",
            Primitive::U8 => "u8",
            Primitive::U16 => "u16",
            Primitive::U32 => "u32",
            Primitive::U64 => "u64",
            Primitive::U128 => "u128",
            Primitive::Usize => "usize",
            Primitive::F32 => "f32",
            Primitive::F64 => "f64",
        }
    }
}

/// A generic argument of a named type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenericArg {
    Type(TypeDescriptor),
    /// A lifetime argument, stored without the leading `'`.
    Lifetime(String),
    /// An associated type binding, `Item = T`.
    Binding { name: String, ty: TypeDescriptor },
    /// A const argument, kept as source text.
    Const(String),
}

impl GenericArg {
    /// The type carried by the argument, if any.
    pub fn ty(&self) -> Option<&TypeDescriptor> {
        match self {
            GenericArg::Type(ty) | GenericArg::Binding { ty, .. } => Some(ty),
            GenericArg::Lifetime(_) | GenericArg::Const(_) => None,
        }
    }

    fn ty_mut(&mut self) -> Option<&mut TypeDescriptor> {
        match self {
            GenericArg::Type(ty) | GenericArg::Binding { ty, .. } => Some(ty),
            GenericArg::Lifetime(_) | GenericArg::Const(_) => None,
        }
    }

    fn substitute(&self, params: &[String], args: &[TypeDescriptor]) -> GenericArg {
        match self {
            GenericArg::Type(ty) => GenericArg::Type(ty.substitute(params, args)),
            GenericArg::Binding { name, ty } => GenericArg::Binding {
                name: name.clone(),
                ty: ty.substitute(params, args),
            },
            other => other.clone(),
        }
    }
}

/// `Fn(A, B) -> C` sugar on a trait bound.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FnSugar {
    pub inputs: Vec<TypeDescriptor>,
    pub output: Box<TypeDescriptor>,
}

/// One bound of a trait object (`dyn Trait + Send + 'static`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bound {
    Trait {
        item: ItemRef,
        args: Vec<GenericArg>,
        sugar: Option<FnSugar>,
    },
    Lifetime(String),
}

/// A resolved type as written in a trait method signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeDescriptor {
    Primitive(Primitive),

    /// A nominal type declared by some package.
    Named {
        item: ItemRef,
        args: Vec<GenericArg>,
    },

    /// `&'a T` / `&mut T`. The lifetime is stored without its `'`.
    Reference {
        lifetime: Option<String>,
        mutable: bool,
        inner: Box<TypeDescriptor>,
    },

    /// `*const T` / `*mut T`.
    RawPointer {
        mutable: bool,
        inner: Box<TypeDescriptor>,
    },

    Slice(Box<TypeDescriptor>),

    /// `[T; N]`, with the length expression kept as source text.
    Array {
        elem: Box<TypeDescriptor>,
        len: String,
    },

    /// A tuple; the empty tuple is the unit type.
    Tuple(Vec<TypeDescriptor>),

    FnPointer {
        is_unsafe: bool,
        params: Vec<TypeDescriptor>,
        output: Box<TypeDescriptor>,
    },

    TraitObject(Vec<Bound>),

    /// `Self` inside a trait.
    SelfType,

    /// The never type `!`.
    Never,

    /// A generic parameter of a type alias template. Never appears in a
    /// resolved method signature.
    Param(String),
}

impl TypeDescriptor {
    pub fn unit() -> Self {
        TypeDescriptor::Tuple(Vec::new())
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, TypeDescriptor::Tuple(elems) if elems.is_empty())
    }

    /// A named type without generic arguments.
    pub fn named(item: ItemRef) -> Self {
        TypeDescriptor::Named {
            item,
            args: Vec::new(),
        }
    }

    /// Whether the type contains a reference anywhere inside it.
    pub fn contains_reference(&self) -> bool {
        match self {
            TypeDescriptor::Reference { .. } => true,
            TypeDescriptor::Named { args, .. } => args
                .iter()
                .filter_map(GenericArg::ty)
                .any(TypeDescriptor::contains_reference),
            TypeDescriptor::RawPointer { inner, .. } | TypeDescriptor::Slice(inner) => {
                inner.contains_reference()
            }
            TypeDescriptor::Array { elem, .. } => elem.contains_reference(),
            TypeDescriptor::Tuple(elems) => elems.iter().any(TypeDescriptor::contains_reference),
            TypeDescriptor::FnPointer { .. }
            | TypeDescriptor::TraitObject(_)
            | TypeDescriptor::Primitive(_)
            | TypeDescriptor::SelfType
            | TypeDescriptor::Never
            | TypeDescriptor::Param(_) => false,
        }
    }

    /// Calls `f` for every item referenced by the type, in source order.
    pub fn visit_items<'a>(&'a self, f: &mut impl FnMut(&'a ItemRef)) {
        match self {
            TypeDescriptor::Named { item, args } => {
                f(item);
                visit_args(args, f);
            }
            TypeDescriptor::Reference { inner, .. }
            | TypeDescriptor::RawPointer { inner, .. }
            | TypeDescriptor::Slice(inner) => inner.visit_items(f),
            TypeDescriptor::Array { elem, .. } => elem.visit_items(f),
            TypeDescriptor::Tuple(elems) => elems.iter().for_each(|e| e.visit_items(f)),
            TypeDescriptor::FnPointer { params, output, .. } => {
                params.iter().for_each(|p| p.visit_items(f));
                output.visit_items(f);
            }
            TypeDescriptor::TraitObject(bounds) => {
                for bound in bounds {
                    if let Bound::Trait { item, args, sugar } = bound {
                        f(item);
                        visit_args(args, f);
                        if let Some(sugar) = sugar {
                            sugar.inputs.iter().for_each(|i| i.visit_items(f));
                            sugar.output.visit_items(f);
                        }
                    }
                }
            }
            TypeDescriptor::Primitive(_)
            | TypeDescriptor::SelfType
            | TypeDescriptor::Never
            | TypeDescriptor::Param(_) => {}
        }
    }

    /// Rewrites every package reference in place.
    pub fn map_packages(&mut self, f: &mut impl FnMut(&mut String)) {
        match self {
            TypeDescriptor::Named { item, args } => {
                f(&mut item.package);
                map_args(args, f);
            }
            TypeDescriptor::Reference { inner, .. }
            | TypeDescriptor::RawPointer { inner, .. }
            | TypeDescriptor::Slice(inner) => inner.map_packages(f),
            TypeDescriptor::Array { elem, .. } => elem.map_packages(f),
            TypeDescriptor::Tuple(elems) => elems.iter_mut().for_each(|e| e.map_packages(f)),
            TypeDescriptor::FnPointer { params, output, .. } => {
                params.iter_mut().for_each(|p| p.map_packages(f));
                output.map_packages(f);
            }
            TypeDescriptor::TraitObject(bounds) => {
                for bound in bounds {
                    if let Bound::Trait { item, args, sugar } = bound {
                        f(&mut item.package);
                        map_args(args, f);
                        if let Some(sugar) = sugar {
                            sugar.inputs.iter_mut().for_each(|i| i.map_packages(f));
                            sugar.output.map_packages(f);
                        }
                    }
                }
            }
            TypeDescriptor::Primitive(_)
            | TypeDescriptor::SelfType
            | TypeDescriptor::Never
            | TypeDescriptor::Param(_) => {}
        }
    }

    /// Replaces alias template parameters with concrete arguments.
    ///
    /// Parameters without a matching argument are left in place.
    pub fn substitute(&self, params: &[String], args: &[TypeDescriptor]) -> TypeDescriptor {
        match self {
            TypeDescriptor::Param(name) => params
                .iter()
                .position(|p| p == name)
                .and_then(|i| args.get(i))
                .cloned()
                .unwrap_or_else(|| self.clone()),
            TypeDescriptor::Named { item, args: own } => TypeDescriptor::Named {
                item: item.clone(),
                args: own.iter().map(|arg| arg.substitute(params, args)).collect(),
            },
            TypeDescriptor::Reference {
                lifetime,
                mutable,
                inner,
            } => TypeDescriptor::Reference {
                lifetime: lifetime.clone(),
                mutable: *mutable,
                inner: Box::new(inner.substitute(params, args)),
            },
            TypeDescriptor::RawPointer { mutable, inner } => TypeDescriptor::RawPointer {
                mutable: *mutable,
                inner: Box::new(inner.substitute(params, args)),
            },
            TypeDescriptor::Slice(inner) => {
                TypeDescriptor::Slice(Box::new(inner.substitute(params, args)))
            }
            TypeDescriptor::Array { elem, len } => TypeDescriptor::Array {
                elem: Box::new(elem.substitute(params, args)),
                len: len.clone(),
            },
            TypeDescriptor::Tuple(elems) => {
                TypeDescriptor::Tuple(elems.iter().map(|e| e.substitute(params, args)).collect())
            }
            TypeDescriptor::FnPointer {
                is_unsafe,
                params: fn_params,
                output,
            } => TypeDescriptor::FnPointer {
                is_unsafe: *is_unsafe,
                params: fn_params.iter().map(|p| p.substitute(params, args)).collect(),
                output: Box::new(output.substitute(params, args)),
            },
            TypeDescriptor::TraitObject(bounds) => TypeDescriptor::TraitObject(
                bounds
                    .iter()
                    .map(|bound| match bound {
                        Bound::Trait {
                            item,
                            args: bound_args,
                            sugar,
                        } => Bound::Trait {
                            item: item.clone(),
                            args: bound_args
                                .iter()
                                .map(|arg| arg.substitute(params, args))
                                .collect(),
                            sugar: sugar.as_ref().map(|s| FnSugar {
                                inputs: s.inputs.iter().map(|i| i.substitute(params, args)).collect(),
                                output: Box::new(s.output.substitute(params, args)),
                            }),
                        },
                        Bound::Lifetime(l) => Bound::Lifetime(l.clone()),
                    })
                    .collect(),
            ),
            TypeDescriptor::Primitive(_) | TypeDescriptor::SelfType | TypeDescriptor::Never => {
                self.clone()
            }
        }
    }

    /// The `Ok` and `Err` types when this is `std::result::Result<T, E>`.
    pub fn as_result(&self) -> Option<(&TypeDescriptor, &TypeDescriptor)> {
        match self {
            TypeDescriptor::Named { item, args } if item.is_std_item(&["result::Result"]) => {
                match args.as_slice() {
                    [GenericArg::Type(ok), GenericArg::Type(err)] => Some((ok, err)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// The single type argument when this is the std item at `path`
    /// (`option::Option`, `vec::Vec`, ...).
    pub fn as_std_wrapper(&self, path: &str) -> Option<&TypeDescriptor> {
        match self {
            TypeDescriptor::Named { item, args } if item.is_std_item(&[path]) => {
                match args.as_slice() {
                    [GenericArg::Type(inner)] => Some(inner),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

fn visit_args<'a>(args: &'a [GenericArg], f: &mut impl FnMut(&'a ItemRef)) {
    for ty in args.iter().filter_map(GenericArg::ty) {
        ty.visit_items(f);
    }
}

fn map_args(args: &mut [GenericArg], f: &mut impl FnMut(&mut String)) {
    for ty in args.iter_mut().filter_map(GenericArg::ty_mut) {
        ty.map_packages(f);
    }
}

impl fmt::Display for GenericArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenericArg::Type(ty) => write!(f, "{ty}"),
            GenericArg::Lifetime(l) => write!(f, "'{l}"),
            GenericArg::Binding { name, ty } => write!(f, "{name} = {ty}"),
            GenericArg::Const(value) => f.write_str(value),
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Diagnostic rendering: fully qualified by import path, not valid source.
impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Primitive(p) => f.write_str(p.as_str()),
            TypeDescriptor::Named { item, args } => {
                write!(f, "{item}")?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    write_list(f, args)?;
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeDescriptor::Reference {
                lifetime,
                mutable,
                inner,
            } => {
                f.write_str("&")?;
                if let Some(l) = lifetime {
                    write!(f, "'{l} ")?;
                }
                if *mutable {
                    f.write_str("mut ")?;
                }
                write!(f, "{inner}")
            }
            TypeDescriptor::RawPointer { mutable, inner } => {
                let kind = if *mutable { "mut" } else { "const" };
                write!(f, "*{kind} {inner}")
            }
            TypeDescriptor::Slice(inner) => write!(f, "[{inner}]"),
            TypeDescriptor::Array { elem, len } => write!(f, "[{elem}; {len}]"),
            TypeDescriptor::Tuple(elems) => {
                f.write_str("(")?;
                write_list(f, elems)?;
                if elems.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            TypeDescriptor::FnPointer {
                is_unsafe,
                params,
                output,
            } => {
                if *is_unsafe {
                    f.write_str("unsafe ")?;
                }
                f.write_str("fn(")?;
                write_list(f, params)?;
                f.write_str(")")?;
                if !output.is_unit() {
                    write!(f, " -> {output}")?;
                }
                Ok(())
            }
            TypeDescriptor::TraitObject(bounds) => {
                f.write_str("dyn ")?;
                for (i, bound) in bounds.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" + ")?;
                    }
                    match bound {
                        Bound::Trait { item, args, sugar } => {
                            write!(f, "{item}")?;
                            if let Some(sugar) = sugar {
                                f.write_str("(")?;
                                write_list(f, &sugar.inputs)?;
                                f.write_str(")")?;
                                if !sugar.output.is_unit() {
                                    write!(f, " -> {}", sugar.output)?;
                                }
                            } else if !args.is_empty() {
                                f.write_str("<")?;
                                write_list(f, args)?;
                                f.write_str(">")?;
                            }
                        }
                        Bound::Lifetime(l) => write!(f, "'{l}")?,
                    }
                }
                Ok(())
            }
            TypeDescriptor::SelfType => f.write_str("Self"),
            TypeDescriptor::Never => f.write_str("!"),
            TypeDescriptor::Param(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string() -> TypeDescriptor {
        TypeDescriptor::named(ItemRef::std("string::String"))
    }

    #[test]
    fn primitive_names_roundtrip() {
        for name in ["bool", "str", "u8", "usize", "f64", "i128"] {
            assert_eq!(Primitive::from_name(name).unwrap().as_str(), name);
        }
        assert!(Primitive::from_name("String").is_none());
    }

    #[test]
    fn item_ref_name_is_last_segment() {
        let item = ItemRef::new("github.com/acme/widgets", "store::Widget");
        assert_eq!(item.name(), "Widget");
        assert_eq!(item.segments().collect::<Vec<_>>(), vec!["store", "Widget"]);
    }

    #[test]
    fn contains_reference_looks_through_wrappers() {
        let option_ref = TypeDescriptor::Named {
            item: ItemRef::std("option::Option"),
            args: vec![GenericArg::Type(TypeDescriptor::Reference {
                lifetime: None,
                mutable: false,
                inner: Box::new(TypeDescriptor::Primitive(Primitive::Str)),
            })],
        };
        assert!(option_ref.contains_reference());
        assert!(!string().contains_reference());
        assert!(!TypeDescriptor::unit().contains_reference());
    }

    #[test]
    fn substitute_replaces_alias_params() {
        let template = TypeDescriptor::Named {
            item: ItemRef::std("result::Result"),
            args: vec![
                GenericArg::Type(TypeDescriptor::Param("T".into())),
                GenericArg::Type(TypeDescriptor::named(ItemRef::std("io::Error"))),
            ],
        };
        let expanded = template.substitute(&["T".to_string()], &[string()]);
        let (ok, err) = expanded.as_result().unwrap();
        assert_eq!(ok, &string());
        assert_eq!(err, &TypeDescriptor::named(ItemRef::std("io::Error")));
    }

    #[test]
    fn map_packages_rewrites_nested_items() {
        let mut ty = TypeDescriptor::Slice(Box::new(TypeDescriptor::named(ItemRef::new(
            "old/path", "Widget",
        ))));
        ty.map_packages(&mut |package| {
            if package == "old/path" {
                *package = "new/path".to_string();
            }
        });
        let mut seen = Vec::new();
        ty.visit_items(&mut |item| seen.push(item.package.clone()));
        assert_eq!(seen, vec!["new/path"]);
    }

    #[test]
    fn display_is_qualified() {
        let ty = TypeDescriptor::Reference {
            lifetime: Some("a".into()),
            mutable: false,
            inner: Box::new(TypeDescriptor::Slice(Box::new(TypeDescriptor::Primitive(
                Primitive::U8,
            )))),
        };
        assert_eq!(ty.to_string(), "&'a [u8]");
        assert_eq!(string().to_string(), "std::string::String");
    }

    #[test]
    fn serde_roundtrip_descriptor() {
        let ty = TypeDescriptor::TraitObject(vec![
            Bound::Trait {
                item: ItemRef::std("ops::Fn"),
                args: vec![],
                sugar: Some(FnSugar {
                    inputs: vec![TypeDescriptor::Primitive(Primitive::U32)],
                    output: Box::new(TypeDescriptor::Primitive(Primitive::Bool)),
                }),
            },
            Bound::Lifetime("static".into()),
        ]);
        let json = serde_json::to_string(&ty).unwrap();
        let back: TypeDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ty);
    }
}
