//! Lowering of trait declarations and signature types into descriptors.

use quote::ToTokens;
use syn::spanned::Spanned;

use mockgen_core::{
    Bound, FnSugar, GenericArg, LifetimeParam, MethodSig, ParamSig, Receiver, TraitDef,
    TypeDescriptor,
};

use super::resolve::{settle, ResolveError, Resolver, Target};

/// Where a type is written: the enclosing module, plus the parameters of
/// the alias template being lowered (empty outside aliases).
pub(crate) struct TyCtx<'c> {
    pub module: &'c str,
    pub params: &'c [String],
}

impl Resolver<'_, '_> {
    /// Lowers a trait. Unsupported shapes are recorded on the returned
    /// definition; only unresolved names and import failures are errors.
    pub fn lower_trait(&mut self, module: &str, item: &syn::ItemTrait) -> Result<TraitDef, ResolveError> {
        let mut def = TraitDef {
            name: item.ident.to_string(),
            is_unsafe: item.unsafety.is_some(),
            supertraits: Vec::new(),
            methods: Vec::new(),
            unsupported: None,
        };
        match self.lower_trait_body(module, item, &mut def) {
            Ok(()) => Ok(def),
            Err(ResolveError::Unsupported(reason)) => {
                tracing::debug!(trait_name = %def.name, %reason, "trait is not mockable");
                def.unsupported = Some(reason);
                Ok(def)
            }
            Err(err) => Err(err),
        }
    }

    fn lower_trait_body(
        &mut self,
        module: &str,
        item: &syn::ItemTrait,
        def: &mut TraitDef,
    ) -> Result<(), ResolveError> {
        if item.auto_token.is_some() {
            return Err(ResolveError::Unsupported("auto traits".into()));
        }
        if !item.generics.params.is_empty() {
            return Err(ResolveError::Unsupported("traits with generic parameters".into()));
        }
        if item.generics.where_clause.is_some() {
            return Err(ResolveError::Unsupported("traits with where clauses".into()));
        }

        for bound in &item.supertraits {
            match bound {
                syn::TypeParamBound::Trait(tb) => {
                    if matches!(tb.modifier, syn::TraitBoundModifier::Maybe(_)) {
                        continue;
                    }
                    if tb.path.segments.iter().any(|s| !s.arguments.is_empty()) {
                        return Err(ResolveError::Unsupported("generic supertraits".into()));
                    }
                    let target = settle(self.resolve_path(module, &tb.path)?);
                    match target {
                        Target::Item(sup) | Target::Opaque(sup) => def.supertraits.push(sup),
                        _ => {
                            return Err(ResolveError::unresolved(
                                format!("expected trait, found `{}`", path_text(&tb.path)),
                                tb.path.span(),
                            ))
                        }
                    }
                }
                syn::TypeParamBound::Lifetime(_) => {}
                _ => return Err(ResolveError::Unsupported("supertrait bound syntax".into())),
            }
        }

        for trait_item in &item.items {
            match trait_item {
                syn::TraitItem::Fn(f) => {
                    let method = self.lower_method(module, &f.sig).map_err(|err| match err {
                        ResolveError::Unsupported(reason) => ResolveError::Unsupported(format!(
                            "method `{}`: {reason}",
                            f.sig.ident
                        )),
                        other => other,
                    })?;
                    def.methods.push(method);
                }
                syn::TraitItem::Type(_) => {
                    return Err(ResolveError::Unsupported("associated types".into()))
                }
                syn::TraitItem::Const(_) => {
                    return Err(ResolveError::Unsupported("associated constants".into()))
                }
                syn::TraitItem::Macro(_) => {
                    return Err(ResolveError::Unsupported("macro invocations in trait bodies".into()))
                }
                _ => return Err(ResolveError::Unsupported("trait item syntax".into())),
            }
        }
        Ok(())
    }

    fn lower_method(&mut self, module: &str, sig: &syn::Signature) -> Result<MethodSig, ResolveError> {
        if sig.asyncness.is_some() {
            return Err(ResolveError::Unsupported("`async fn`".into()));
        }
        if sig.constness.is_some() {
            return Err(ResolveError::Unsupported("`const fn`".into()));
        }
        if sig.abi.is_some() {
            return Err(ResolveError::Unsupported("explicit ABIs".into()));
        }
        if sig.variadic.is_some() {
            return Err(ResolveError::Unsupported("C variadics".into()));
        }

        let mut lifetimes = Vec::new();
        for param in &sig.generics.params {
            match param {
                syn::GenericParam::Lifetime(lt) => lifetimes.push(LifetimeParam {
                    name: lt.lifetime.ident.to_string(),
                    bounds: lt.bounds.iter().map(|b| b.ident.to_string()).collect(),
                }),
                syn::GenericParam::Type(_) => {
                    return Err(ResolveError::Unsupported("generic type parameters".into()))
                }
                syn::GenericParam::Const(_) => {
                    return Err(ResolveError::Unsupported("const generic parameters".into()))
                }
            }
        }
        if let Some(where_clause) = &sig.generics.where_clause {
            if !where_clause.predicates.iter().all(is_self_sized) {
                return Err(ResolveError::Unsupported("where clauses".into()));
            }
        }

        let mut inputs = sig.inputs.iter();
        let receiver = match inputs.next() {
            Some(syn::FnArg::Receiver(r)) => lower_receiver(r)?,
            _ => {
                return Err(ResolveError::Unsupported(
                    "associated functions without a `self` receiver".into(),
                ))
            }
        };

        let cx = TyCtx { module, params: &[] };
        let mut params = Vec::new();
        for input in inputs {
            let syn::FnArg::Typed(pt) = input else {
                return Err(ResolveError::Unsupported("multiple receivers".into()));
            };
            let name = match &*pt.pat {
                syn::Pat::Ident(ident) => Some(ident.ident.to_string()),
                _ => None,
            };
            params.push(ParamSig {
                name,
                ty: self.lower_type(&cx, &pt.ty)?,
            });
        }

        let output = self.lower_return(&cx, &sig.output)?;
        if matches!(output, TypeDescriptor::Never) {
            return Err(ResolveError::Unsupported("diverging methods".into()));
        }

        Ok(MethodSig {
            name: sig.ident.to_string(),
            receiver,
            lifetimes,
            params,
            output,
            is_unsafe: sig.unsafety.is_some(),
        })
    }

    pub fn lower_return(&mut self, cx: &TyCtx<'_>, output: &syn::ReturnType) -> Result<TypeDescriptor, ResolveError> {
        match output {
            syn::ReturnType::Default => Ok(TypeDescriptor::unit()),
            syn::ReturnType::Type(_, ty) => self.lower_type(cx, ty),
        }
    }

    pub fn lower_type(&mut self, cx: &TyCtx<'_>, ty: &syn::Type) -> Result<TypeDescriptor, ResolveError> {
        Ok(match ty {
            syn::Type::Path(tp) => {
                if tp.qself.is_some() {
                    return Err(ResolveError::Unsupported("qualified path types".into()));
                }
                return self.lower_type_path(cx, &tp.path);
            }
            syn::Type::Reference(r) => TypeDescriptor::Reference {
                lifetime: r.lifetime.as_ref().map(|l| l.ident.to_string()),
                mutable: r.mutability.is_some(),
                inner: Box::new(self.lower_type(cx, &r.elem)?),
            },
            syn::Type::Ptr(p) => TypeDescriptor::RawPointer {
                mutable: p.mutability.is_some(),
                inner: Box::new(self.lower_type(cx, &p.elem)?),
            },
            syn::Type::Slice(s) => TypeDescriptor::Slice(Box::new(self.lower_type(cx, &s.elem)?)),
            syn::Type::Array(a) => TypeDescriptor::Array {
                elem: Box::new(self.lower_type(cx, &a.elem)?),
                len: a.len.to_token_stream().to_string(),
            },
            syn::Type::Tuple(t) => TypeDescriptor::Tuple(
                t.elems
                    .iter()
                    .map(|e| self.lower_type(cx, e))
                    .collect::<Result<_, _>>()?,
            ),
            syn::Type::Paren(p) => self.lower_type(cx, &p.elem)?,
            syn::Type::Group(g) => self.lower_type(cx, &g.elem)?,
            syn::Type::Never(_) => TypeDescriptor::Never,
            syn::Type::BareFn(f) => {
                if f.variadic.is_some() || f.abi.is_some() {
                    return Err(ResolveError::Unsupported("foreign function pointers".into()));
                }
                if f.lifetimes.is_some() {
                    return Err(ResolveError::Unsupported("higher-ranked function pointers".into()));
                }
                TypeDescriptor::FnPointer {
                    is_unsafe: f.unsafety.is_some(),
                    params: f
                        .inputs
                        .iter()
                        .map(|arg| self.lower_type(cx, &arg.ty))
                        .collect::<Result<_, _>>()?,
                    output: Box::new(self.lower_return(cx, &f.output)?),
                }
            }
            syn::Type::TraitObject(t) => {
                let mut bounds = Vec::new();
                for bound in &t.bounds {
                    bounds.push(self.lower_bound(cx, bound)?);
                }
                TypeDescriptor::TraitObject(bounds)
            }
            syn::Type::ImplTrait(_) => {
                return Err(ResolveError::Unsupported("`impl Trait` in signatures".into()))
            }
            syn::Type::Infer(i) => {
                return Err(ResolveError::unresolved(
                    "the placeholder `_` is not allowed in signatures",
                    i.span(),
                ))
            }
            syn::Type::Macro(_) => return Err(ResolveError::Unsupported("macro types".into())),
            _ => return Err(ResolveError::Unsupported("type syntax".into())),
        })
    }

    fn lower_type_path(&mut self, cx: &TyCtx<'_>, path: &syn::Path) -> Result<TypeDescriptor, ResolveError> {
        let Some(last) = path.segments.last() else {
            return Err(ResolveError::unresolved("empty path", path.span()));
        };
        if path.leading_colon.is_none() && path.segments.len() == 1 && last.arguments.is_empty() {
            let name = last.ident.to_string();
            if cx.params.contains(&name) {
                return Ok(TypeDescriptor::Param(name));
            }
            if name == "Self" {
                return Ok(TypeDescriptor::SelfType);
            }
        }
        if path.segments.first().is_some_and(|s| s.ident == "Self") {
            return Err(ResolveError::Unsupported(format!(
                "associated type `{}`",
                path_text(path)
            )));
        }

        let args = self.lower_generic_args(cx, &last.arguments)?;
        match settle(self.resolve_path(cx.module, path)?) {
            Target::Primitive(p) => Ok(TypeDescriptor::Primitive(p)),
            // Paths into opaque packages are taken to name types.
            Target::Item(item) | Target::Opaque(item) => Ok(TypeDescriptor::Named { item, args }),
            Target::Alias(alias) => {
                let type_args: Vec<TypeDescriptor> = args
                    .into_iter()
                    .filter_map(|arg| match arg {
                        GenericArg::Type(ty) => Some(ty),
                        _ => None,
                    })
                    .collect();
                Ok(alias.target.substitute(&alias.params, &type_args))
            }
            Target::Module(_) => Err(ResolveError::unresolved(
                format!("expected type, found module `{}`", path_text(path)),
                path.span(),
            )),
        }
    }

    fn lower_generic_args(
        &mut self,
        cx: &TyCtx<'_>,
        arguments: &syn::PathArguments,
    ) -> Result<Vec<GenericArg>, ResolveError> {
        let syn::PathArguments::AngleBracketed(ab) = arguments else {
            if arguments.is_empty() {
                return Ok(Vec::new());
            }
            return Err(ResolveError::Unsupported(
                "parenthesized arguments on a type".into(),
            ));
        };
        let mut out = Vec::new();
        for arg in &ab.args {
            out.push(match arg {
                syn::GenericArgument::Type(ty) => GenericArg::Type(self.lower_type(cx, ty)?),
                syn::GenericArgument::Lifetime(l) => GenericArg::Lifetime(l.ident.to_string()),
                syn::GenericArgument::AssocType(assoc) => {
                    if assoc.generics.is_some() {
                        return Err(ResolveError::Unsupported("generic associated types".into()));
                    }
                    GenericArg::Binding {
                        name: assoc.ident.to_string(),
                        ty: self.lower_type(cx, &assoc.ty)?,
                    }
                }
                syn::GenericArgument::Const(expr) => {
                    GenericArg::Const(expr.to_token_stream().to_string())
                }
                _ => {
                    return Err(ResolveError::Unsupported(
                        "associated constraints in generic arguments".into(),
                    ))
                }
            });
        }
        Ok(out)
    }

    fn lower_bound(&mut self, cx: &TyCtx<'_>, bound: &syn::TypeParamBound) -> Result<Bound, ResolveError> {
        match bound {
            syn::TypeParamBound::Trait(tb) => {
                if tb.lifetimes.is_some() {
                    return Err(ResolveError::Unsupported("higher-ranked trait bounds".into()));
                }
                if !matches!(tb.modifier, syn::TraitBoundModifier::None) {
                    return Err(ResolveError::Unsupported("`?Trait` bounds".into()));
                }
                let Some(last) = tb.path.segments.last() else {
                    return Err(ResolveError::unresolved("empty path", tb.path.span()));
                };
                let item = match settle(self.resolve_path(cx.module, &tb.path)?) {
                    Target::Item(item) | Target::Opaque(item) => item,
                    _ => {
                        return Err(ResolveError::unresolved(
                            format!("expected trait, found `{}`", path_text(&tb.path)),
                            tb.path.span(),
                        ))
                    }
                };
                let (args, sugar) = match &last.arguments {
                    syn::PathArguments::Parenthesized(p) => {
                        let inputs = p
                            .inputs
                            .iter()
                            .map(|i| self.lower_type(cx, i))
                            .collect::<Result<_, _>>()?;
                        let output = Box::new(self.lower_return(cx, &p.output)?);
                        (Vec::new(), Some(FnSugar { inputs, output }))
                    }
                    other => (self.lower_generic_args(cx, other)?, None),
                };
                Ok(Bound::Trait { item, args, sugar })
            }
            syn::TypeParamBound::Lifetime(l) => Ok(Bound::Lifetime(l.ident.to_string())),
            _ => Err(ResolveError::Unsupported("trait object bound syntax".into())),
        }
    }
}

fn lower_receiver(r: &syn::Receiver) -> Result<Receiver, ResolveError> {
    let Some((_, lifetime)) = &r.reference else {
        return Err(ResolveError::Unsupported("by-value `self` receivers".into()));
    };
    if r.colon_token.is_some() {
        return Err(ResolveError::Unsupported("typed `self` receivers".into()));
    }
    let lifetime = lifetime.as_ref().map(|l| l.ident.to_string());
    Ok(if r.mutability.is_some() {
        Receiver::RefMut { lifetime }
    } else {
        Receiver::Ref { lifetime }
    })
}

/// `Self: Sized`, the only where-predicate accepted on methods.
fn is_self_sized(predicate: &syn::WherePredicate) -> bool {
    let syn::WherePredicate::Type(pt) = predicate else {
        return false;
    };
    let is_self = matches!(&pt.bounded_ty, syn::Type::Path(tp) if tp.qself.is_none() && tp.path.is_ident("Self"));
    is_self
        && pt.bounds.iter().all(|b| {
            matches!(b, syn::TypeParamBound::Trait(tb) if tb.path.is_ident("Sized"))
        })
}

fn path_text(path: &syn::Path) -> String {
    let segments: Vec<String> = path.segments.iter().map(|s| s.ident.to_string()).collect();
    let prefix = if path.leading_colon.is_some() { "::" } else { "" };
    format!("{prefix}{}", segments.join("::"))
}
