//! Typed generation of self-healing Playwright test files.
//!
//! Source is never assembled by string concatenation. A [`TestScript`] is
//! lowered to a typed HIR ([`JsModule`]), and [`generate`] emits it
//! deterministically with every string and template literal escaped.
//!
//! ```text
//! TestScript ──► render_test_file ──► JsModule ──► generate ──► login.spec.ts
//!                                                       │
//!                                                       └─► login.spec.ts.manifest.json
//! ```

/// Chained constructors for modules, functions and expressions
pub mod builder;

/// Deterministic emitter
pub mod codegen;

mod error;

/// Typed intermediate representation
pub mod hir;

/// Hash manifests for generated files
pub mod manifest;

/// Test scripts and the Playwright renderer
pub mod script;

pub use builder::{JsFunctionBuilder, JsModuleBuilder};
pub use codegen::{generate, generate_expr};
pub use error::{GenError, GenResult};
pub use hir::{
    BinOp, Expr, GenerationMetadata, Identifier, JsFunction, JsModule, Param, Stmt, TemplatePart,
    UnaryOp,
};
pub use manifest::{content_hash, verify, write_with_manifest, FileManifest};
pub use script::{render_test_file, write_test_file, RenderOptions, StepDescriptor, TestScript};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::builder::{JsFunctionBuilder, JsModuleBuilder};
    pub use super::codegen::{generate, generate_expr};
    pub use super::error::{GenError, GenResult};
    pub use super::hir::*;
    pub use super::manifest::{verify, write_with_manifest, FileManifest};
    pub use super::script::{render_test_file, write_test_file, RenderOptions, StepDescriptor, TestScript};
}
