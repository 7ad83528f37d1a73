//! Registration context handed to [`Generator::initialize`](crate::Generator::initialize).

use std::sync::Arc;

use spindle_core::SyntaxTree;

/// Predicate selecting which syntax trees a generator is interested in.
pub type SyntaxFilter = Arc<dyn Fn(&SyntaxTree) -> bool + Send + Sync>;

/// Collects what a generator registers while it initializes.
#[derive(Default)]
pub struct RegistrationContext {
    filters: Vec<SyntaxFilter>,
    post_initialization_sources: Vec<(String, String)>,
}

impl RegistrationContext {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a predicate over syntax trees.
    ///
    /// [`ExecutionContext::candidate_trees`](crate::ExecutionContext::candidate_trees)
    /// yields the trees accepted by at least one registered filter.
    pub fn register_syntax_filter(
        &mut self,
        filter: impl Fn(&SyntaxTree) -> bool + Send + Sync + 'static,
    ) {
        self.filters.push(Arc::new(filter));
    }

    /// Add a source that does not depend on the compilation.
    ///
    /// It is produced once and added ahead of the generator's own sources in
    /// every run, under the same hint-name rules.
    pub fn add_post_initialization_source(
        &mut self,
        hint_name: impl Into<String>,
        text: impl Into<String>,
    ) {
        self.post_initialization_sources
            .push((hint_name.into(), text.into()));
    }

    pub(crate) fn finish(self) -> Registration {
        Registration {
            filters: self.filters.into(),
            post_initialization_sources: self.post_initialization_sources.into(),
        }
    }
}

/// What a generator registered during initialization.
#[derive(Clone, Default)]
pub(crate) struct Registration {
    filters: Arc<[SyntaxFilter]>,
    post_initialization_sources: Arc<[(String, String)]>,
}

impl Registration {
    /// Whether `tree` is a candidate for this generator.
    pub fn accepts(&self, tree: &SyntaxTree) -> bool {
        self.filters.is_empty() || self.filters.iter().any(|filter| filter(tree))
    }

    pub fn post_initialization_sources(&self) -> &[(String, String)] {
        &self.post_initialization_sources
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("filters", &self.filters.len())
            .field(
                "post_initialization_sources",
                &self.post_initialization_sources,
            )
            .finish()
    }
}
