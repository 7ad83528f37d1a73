//! A generator that indexes the types declared in a compilation.

use eyre::Result;
use spindle_core::Diagnostic;
use spindle_driver::{ExecutionContext, Generator, RegistrationContext};

use crate::{CodeBuilder, string_literal};

/// Diagnostic codes reported by the sample generators.
pub mod codes {
    /// The compilation declares no types, so no index was generated.
    pub const NO_TYPES: &str = "SPG0001";
}

/// Emits `Generated.TypeIndex` listing every type declared in the input
/// compilation, grouped by the tree that declares it.
///
/// Only trees that declare at least one type are inspected. When there are
/// none the generator reports a warning and emits nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeIndexGenerator;

impl TypeIndexGenerator {
    pub const HINT_NAME: &'static str = "TypeIndex.g.cs";
}

impl Generator for TypeIndexGenerator {
    fn name(&self) -> &str {
        "type_index"
    }

    fn description(&self) -> &str {
        "Generated.TypeIndex listing every declared type"
    }

    fn version(&self) -> &str {
        "1"
    }

    fn initialize(&self, ctx: &mut RegistrationContext) -> Result<()> {
        ctx.register_syntax_filter(|tree| tree.types().next().is_some());
        Ok(())
    }

    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        let trees: Vec<_> = ctx.candidate_trees().collect();
        if trees.is_empty() {
            ctx.report_diagnostic(
                Diagnostic::warning("the compilation declares no types; no type index was generated")
                    .with_code(codes::NO_TYPES),
            );
            return Ok(());
        }

        let source = CodeBuilder::default()
            .braced("namespace Generated", |b| {
                b.braced("public static class TypeIndex", |b| {
                    b.braced("public static string[] Names()", |b| {
                        b.line("return new string[]")
                            .line("{")
                            .indent()
                            .each(&trees, |b, tree| {
                                b.comment(tree.path()).each(tree.types(), |b, decl| {
                                    b.line(&format!("{},", string_literal(&decl.name)))
                                })
                            })
                            .dedent()
                            .line("};")
                    })
                })
            })
            .build();

        ctx.add_source(Self::HINT_NAME, source);
        Ok(())
    }
}
