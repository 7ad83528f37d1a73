//! Merging generator outputs into the compilation.

use spindle_core::{
    CompilationService, CompilationUnit, Diagnostic, GeneratedSource, Location, SyntaxTree,
    codes, generated_tree_path, generator_dirs,
};
use tracing::debug;

use crate::GeneratorRunResult;

/// Outcome of merging one run's results.
#[derive(Debug)]
pub struct Aggregation {
    /// The input compilation with every parsed generated tree appended.
    pub compilation: CompilationUnit,
    /// The appended trees, in merge order.
    pub generated_trees: Vec<SyntaxTree>,
    /// Diagnostics raised while merging, one list per generator result.
    pub diagnostics: Vec<Vec<Diagnostic>>,
}

/// Parses generated sources and appends them to a compilation.
///
/// Sources are merged in generator order, and in emission order within a
/// generator. Each generator's trees live under its own directory (see
/// [`generator_dirs`]), so sources from different generators never share a
/// path. A source that fails to parse is dropped with a diagnostic; other
/// sources are unaffected.
pub struct ResultAggregator<'a> {
    service: &'a dyn CompilationService,
}

impl<'a> ResultAggregator<'a> {
    pub fn new(service: &'a dyn CompilationService) -> Self {
        Self { service }
    }

    /// Every generated source of `results`, in merge order.
    pub fn merged_sources(
        results: &[GeneratorRunResult],
    ) -> impl Iterator<Item = &GeneratedSource> {
        results.iter().flat_map(|r| r.generated_sources.iter())
    }

    /// `results` holds one entry per registered generator, in registry order.
    pub fn aggregate(
        &self,
        input: &CompilationUnit,
        results: &[GeneratorRunResult],
    ) -> Aggregation {
        let dirs = generator_dirs(results.iter().map(|r| &r.generator));
        let mut generated_trees = Vec::new();
        let mut diagnostics = Vec::with_capacity(results.len());

        for (result, dir) in results.iter().zip(&dirs) {
            let mut merge_diagnostics = Vec::new();
            for source in &result.generated_sources {
                let path = generated_tree_path(dir, &source.hint_name);
                match self
                    .service
                    .parse_text(&path, &source.text, input.options())
                {
                    Ok(tree) => generated_trees.push(tree),
                    Err(error) => {
                        debug!(path = %path, %error, "generated source failed to parse");
                        let location = match error.span {
                            Some(span) => Location::span(path, span),
                            None => Location::file(path),
                        };
                        merge_diagnostics.push(
                            Diagnostic::error(format!(
                                "generated source '{}' could not be parsed: {}",
                                source.hint_name, error.message
                            ))
                            .with_code(codes::GENERATED_SOURCE_PARSE_FAILURE)
                            .from_generator(result.generator.clone())
                            .at(location),
                        );
                    }
                }
            }
            diagnostics.push(merge_diagnostics);
        }

        Aggregation {
            compilation: input.with_trees(generated_trees.iter().cloned()),
            generated_trees,
            diagnostics,
        }
    }
}
