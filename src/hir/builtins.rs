//! The builtin registry: names Nix provides without a declaration.
//!
//! Two tables are compiled in: the members of the `builtins` attribute set,
//! and the subset of them that is also bound globally. Any member is also
//! reachable globally through its `__name` alias (`__add` is `builtins.add`).

use std::sync::LazyLock;

use rustc_hash::FxHashMap;

/// Presentation category of a builtin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
    Function,
    Constant,
    /// An attribute set whose members are builtins themselves.
    Namespace,
}

/// A single builtin name.
///
/// Descriptors are `'static`; equality is by name, since every name appears
/// in the tables once.
#[derive(Debug)]
pub struct BuiltinDescriptor {
    name: &'static str,
    kind: BuiltinKind,
    namespace: Option<fn(&str) -> Option<&'static BuiltinDescriptor>>,
}

impl BuiltinDescriptor {
    const fn function(name: &'static str) -> Self {
        Self {
            name,
            kind: BuiltinKind::Function,
            namespace: None,
        }
    }

    const fn constant(name: &'static str) -> Self {
        Self {
            name,
            kind: BuiltinKind::Constant,
            namespace: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> BuiltinKind {
        self.kind
    }

    pub fn has_namespace(&self) -> bool {
        self.namespace.is_some()
    }

    /// Looks up a member of this builtin's namespace.
    pub fn member(&self, name: &str) -> Option<&'static BuiltinDescriptor> {
        self.namespace.and_then(|lookup| lookup(name))
    }

    /// Whether this is the root `builtins` attribute set.
    pub fn is_root(&self) -> bool {
        std::ptr::eq(self, &ROOT)
    }
}

impl PartialEq for BuiltinDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for BuiltinDescriptor {}

impl std::hash::Hash for BuiltinDescriptor {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

// ============================================================================
// TABLES
// ============================================================================

/// The `builtins` attribute set itself.
pub static ROOT: BuiltinDescriptor = BuiltinDescriptor {
    name: "builtins",
    kind: BuiltinKind::Namespace,
    namespace: Some(resolve_builtin),
};

use BuiltinDescriptor as B;

static MEMBERS: &[BuiltinDescriptor] = &[
    B::function("abort"),
    B::function("add"),
    B::function("addDrvOutputDependencies"),
    B::function("addErrorContext"),
    B::function("all"),
    B::function("any"),
    B::function("appendContext"),
    B::function("attrNames"),
    B::function("attrValues"),
    B::function("baseNameOf"),
    B::function("bitAnd"),
    B::function("bitOr"),
    B::function("bitXor"),
    B::function("break"),
    B::function("catAttrs"),
    B::function("ceil"),
    B::function("compareVersions"),
    B::function("concatLists"),
    B::function("concatMap"),
    B::function("concatStringsSep"),
    B::function("convertHash"),
    B::constant("currentSystem"),
    B::constant("currentTime"),
    B::function("deepSeq"),
    B::function("derivation"),
    B::function("derivationStrict"),
    B::function("dirOf"),
    B::function("div"),
    B::function("elem"),
    B::function("elemAt"),
    B::constant("false"),
    B::function("fetchClosure"),
    B::function("fetchGit"),
    B::function("fetchMercurial"),
    B::function("fetchTarball"),
    B::function("fetchTree"),
    B::function("fetchurl"),
    B::function("filter"),
    B::function("filterSource"),
    B::function("findFile"),
    B::function("flakeRefToString"),
    B::function("floor"),
    B::function("foldl'"),
    B::function("fromJSON"),
    B::function("fromTOML"),
    B::function("functionArgs"),
    B::function("genList"),
    B::function("genericClosure"),
    B::function("getAttr"),
    B::function("getContext"),
    B::function("getEnv"),
    B::function("getFlake"),
    B::function("groupBy"),
    B::function("hasAttr"),
    B::function("hasContext"),
    B::function("hashFile"),
    B::function("hashString"),
    B::function("head"),
    B::function("import"),
    B::function("intersectAttrs"),
    B::function("isAttrs"),
    B::function("isBool"),
    B::function("isFloat"),
    B::function("isFunction"),
    B::function("isInt"),
    B::function("isList"),
    B::function("isNull"),
    B::function("isPath"),
    B::function("isString"),
    B::constant("langVersion"),
    B::function("length"),
    B::function("lessThan"),
    B::function("listToAttrs"),
    B::function("map"),
    B::function("mapAttrs"),
    B::function("match"),
    B::function("mul"),
    B::constant("nixPath"),
    B::constant("nixVersion"),
    B::constant("null"),
    B::function("outputOf"),
    B::function("parseDrvName"),
    B::function("parseFlakeRef"),
    B::function("partition"),
    B::function("path"),
    B::function("pathExists"),
    B::function("placeholder"),
    B::function("readDir"),
    B::function("readFile"),
    B::function("readFileType"),
    B::function("removeAttrs"),
    B::function("replaceStrings"),
    B::function("scopedImport"),
    B::function("seq"),
    B::function("sort"),
    B::function("split"),
    B::function("splitVersion"),
    B::constant("storeDir"),
    B::function("storePath"),
    B::function("stringLength"),
    B::function("sub"),
    B::function("substring"),
    B::function("tail"),
    B::function("throw"),
    B::function("toFile"),
    B::function("toJSON"),
    B::function("toPath"),
    B::function("toString"),
    B::function("toXML"),
    B::function("trace"),
    B::function("traceVerbose"),
    B::constant("true"),
    B::function("tryEval"),
    B::function("typeOf"),
    B::function("unsafeDiscardOutputDependency"),
    B::function("unsafeDiscardStringContext"),
    B::function("unsafeGetAttrPos"),
    B::function("warn"),
    B::function("zipAttrsWith"),
];

/// Members of `builtins` that are also bound without the `builtins.` prefix.
static GLOBALS: &[&str] = &[
    "abort",
    "baseNameOf",
    "break",
    "derivation",
    "derivationStrict",
    "dirOf",
    "false",
    "fetchGit",
    "fetchMercurial",
    "fetchTarball",
    "fetchTree",
    "fromTOML",
    "import",
    "isNull",
    "map",
    "null",
    "placeholder",
    "removeAttrs",
    "scopedImport",
    "throw",
    "toString",
    "true",
];

static MEMBER_INDEX: LazyLock<FxHashMap<&'static str, &'static BuiltinDescriptor>> =
    LazyLock::new(|| MEMBERS.iter().map(|builtin| (builtin.name, builtin)).collect());

// ============================================================================
// LOOKUP
// ============================================================================

/// Resolves a name in the global scope.
pub fn resolve_global(name: &str) -> Option<&'static BuiltinDescriptor> {
    if name == ROOT.name {
        return Some(&ROOT);
    }
    if GLOBALS.contains(&name) {
        return resolve_builtin(name);
    }
    name.strip_prefix("__").and_then(resolve_builtin)
}

/// Resolves a member of the `builtins` attribute set.
pub fn resolve_builtin(name: &str) -> Option<&'static BuiltinDescriptor> {
    MEMBER_INDEX.get(name).copied()
}

/// Every member of `builtins`.
pub fn members() -> impl Iterator<Item = &'static BuiltinDescriptor> {
    MEMBERS.iter()
}
