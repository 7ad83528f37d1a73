//! A generator that greets from generated code.

use eyre::Result;
use spindle_driver::{ExecutionContext, Generator};

use crate::{CodeBuilder, string_literal};

/// Emits `Generated.HelloWorld` with a `SayHello` function that prints the
/// path of every syntax tree in the compilation it was generated from.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelloWorldGenerator;

impl HelloWorldGenerator {
    pub const HINT_NAME: &'static str = "HelloWorld.g.cs";
}

impl Generator for HelloWorldGenerator {
    fn name(&self) -> &str {
        "hello_world"
    }

    fn description(&self) -> &str {
        "Generated.HelloWorld.SayHello listing the compilation's syntax trees"
    }

    fn version(&self) -> &str {
        "1"
    }

    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        let paths: Vec<&str> = ctx.syntax_trees().iter().map(|tree| tree.path()).collect();

        let source = CodeBuilder::default()
            .braced("namespace Generated", |b| {
                b.braced("public static class HelloWorld", |b| {
                    b.braced("public static void SayHello()", |b| {
                        b.line("Console.WriteLine(\"Hello from generated code!\");")
                            .line(
                                "Console.WriteLine(\"The following syntax trees existed in the compilation that created this program:\");",
                            )
                            .each(&paths, |b, path| {
                                let line = string_literal(&format!(" - {}", path));
                                b.line(&format!("Console.WriteLine({});", line))
                            })
                    })
                })
            })
            .build();

        ctx.add_source(Self::HINT_NAME, source);
        Ok(())
    }
}
