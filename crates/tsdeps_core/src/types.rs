#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    pub request: String,
    pub kind: SpecKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecKind {
    /// `import x from '...'`, `import '...'`
    Static,
    /// `import type { X } from '...'` or a declaration whose specifiers are all type-only
    TypeOnly,
    /// `export { x } from '...'`, `export * from '...'`
    ReExport,
    /// `import('...')`
    Dynamic,
    /// `require('...')`
    Require,
}

/// Which kinds of specifiers count as dependency edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportFilter {
    pub type_imports: bool,
    pub reexports: bool,
    pub dynamic_imports: bool,
}

impl Default for ImportFilter {
    fn default() -> Self {
        Self { type_imports: true, reexports: false, dynamic_imports: false }
    }
}

impl ImportFilter {
    pub fn accepts(&self, kind: SpecKind) -> bool {
        match kind {
            SpecKind::Static => true,
            SpecKind::TypeOnly => self.type_imports,
            SpecKind::ReExport => self.reexports,
            SpecKind::Dynamic | SpecKind::Require => self.dynamic_imports,
        }
    }
}
