//! The universe scope: primitives, the standard prelude and the handful of
//! std paths that need canonicalization.
//!
//! The standard library is never loaded. Its items are recorded under their
//! canonical `std` paths, with `core` and `alloc` folded into `std`, so that
//! `Option`, `std::option::Option` and `core::option::Option` produce equal
//! descriptors.

use mockgen_core::types::STD_PACKAGE;
use mockgen_core::{AliasDef, GenericArg, ItemRef, Primitive, TypeDescriptor};

/// Prelude names and their canonical std paths.
const PRELUDE: &[(&str, &str)] = &[
    // types
    ("Option", "option::Option"),
    ("Result", "result::Result"),
    ("String", "string::String"),
    ("Vec", "vec::Vec"),
    ("Box", "boxed::Box"),
    // traits
    ("Send", "marker::Send"),
    ("Sync", "marker::Sync"),
    ("Sized", "marker::Sized"),
    ("Unpin", "marker::Unpin"),
    ("Copy", "marker::Copy"),
    ("Clone", "clone::Clone"),
    ("Default", "default::Default"),
    ("Drop", "ops::Drop"),
    ("Fn", "ops::Fn"),
    ("FnMut", "ops::FnMut"),
    ("FnOnce", "ops::FnOnce"),
    ("PartialEq", "cmp::PartialEq"),
    ("Eq", "cmp::Eq"),
    ("PartialOrd", "cmp::PartialOrd"),
    ("Ord", "cmp::Ord"),
    ("AsRef", "convert::AsRef"),
    ("AsMut", "convert::AsMut"),
    ("Into", "convert::Into"),
    ("From", "convert::From"),
    ("TryFrom", "convert::TryFrom"),
    ("TryInto", "convert::TryInto"),
    ("Iterator", "iter::Iterator"),
    ("IntoIterator", "iter::IntoIterator"),
    ("DoubleEndedIterator", "iter::DoubleEndedIterator"),
    ("ExactSizeIterator", "iter::ExactSizeIterator"),
    ("Extend", "iter::Extend"),
    ("FromIterator", "iter::FromIterator"),
    ("ToOwned", "borrow::ToOwned"),
    ("ToString", "string::ToString"),
];

/// Std items reachable under more than one path, mapped to the path the
/// canonical descriptor uses.
const STD_REEXPORTS: &[(&str, &str)] = &[
    ("collections::hash_map::HashMap", "collections::HashMap"),
    ("collections::hash_set::HashSet", "collections::HashSet"),
    ("collections::btree_map::BTreeMap", "collections::BTreeMap"),
    ("collections::btree_set::BTreeSet", "collections::BTreeSet"),
    ("collections::vec_deque::VecDeque", "collections::VecDeque"),
    ("collections::binary_heap::BinaryHeap", "collections::BinaryHeap"),
    ("collections::linked_list::LinkedList", "collections::LinkedList"),
    ("prelude::v1::Option", "option::Option"),
    ("prelude::v1::Result", "result::Result"),
    ("prelude::v1::String", "string::String"),
    ("prelude::v1::Vec", "vec::Vec"),
    ("prelude::v1::Box", "boxed::Box"),
    ("ffi::c_str::CStr", "ffi::CStr"),
    ("ffi::c_str::CString", "ffi::CString"),
    ("ffi::os_str::OsStr", "ffi::OsStr"),
    ("ffi::os_str::OsString", "ffi::OsString"),
];

/// Whether `name` is a crate name of the standard library.
pub(crate) fn is_std_crate(name: &str) -> bool {
    mockgen_core::import_path::STD_CRATES.contains(&name)
}

/// What a bare name means in the universe scope.
#[derive(Debug, Clone)]
pub(crate) enum UniverseItem {
    Primitive(Primitive),
    Std(ItemRef),
}

pub(crate) fn lookup(name: &str) -> Option<UniverseItem> {
    if let Some(p) = Primitive::from_name(name) {
        return Some(UniverseItem::Primitive(p));
    }
    PRELUDE
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, path)| UniverseItem::Std(ItemRef::std(*path)))
}

/// Canonical form of a path inside std.
pub(crate) fn canonical_std_path(path: &str) -> &str {
    STD_REEXPORTS
        .iter()
        .find(|(alias, _)| *alias == path)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(path)
}

/// Std type aliases that must be expanded for canonical comparison.
pub(crate) fn std_alias(path: &str) -> Option<AliasDef> {
    let result = |ok: TypeDescriptor, err: &str| TypeDescriptor::Named {
        item: ItemRef::std("result::Result"),
        args: vec![
            GenericArg::Type(ok),
            GenericArg::Type(TypeDescriptor::named(ItemRef::std(err))),
        ],
    };
    match path {
        "io::Result" => Some(AliasDef {
            params: vec!["T".into()],
            target: result(TypeDescriptor::Param("T".into()), "io::Error"),
        }),
        "fmt::Result" => Some(AliasDef {
            params: Vec::new(),
            target: result(TypeDescriptor::unit(), "fmt::Error"),
        }),
        _ => None,
    }
}

/// Builds the canonical reference for a std path.
pub(crate) fn std_item(path: &str) -> ItemRef {
    ItemRef::new(STD_PACKAGE, canonical_std_path(path))
}
