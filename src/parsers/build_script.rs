//! Parser for Gradle build and settings scripts (`*.gradle`, `*.gradle.kts`)

use std::path::Path;

use hashbrown::HashMap;
use tracing::warn;

use super::handlers::HandlerContext;
use super::matcher::match_first;
use super::tokenizer::significant_tokens;
use super::{BUILTIN_REGISTRY_ALIASES, Extraction, ParseError, Parser, Variables};

/// Parser for Groovy and Kotlin DSL build scripts
#[derive(Debug, Clone)]
pub struct BuildScriptParser {
    registry_aliases: HashMap<String, String>,
}

impl Default for BuildScriptParser {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildScriptParser {
    pub fn new() -> Self {
        Self {
            registry_aliases: BUILTIN_REGISTRY_ALIASES
                .iter()
                .map(|(name, url)| (name.to_string(), url.to_string()))
                .collect(),
        }
    }

    /// Add repository shorthands on top of the built-in ones
    pub fn with_registry_aliases(
        mut self,
        aliases: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.registry_aliases.extend(aliases);
        self
    }

    /// Run the pattern table over the script.
    ///
    /// Variables assigned by the script become visible to every later match,
    /// shadowing `variables` inherited from parent directories.
    pub fn extract(&self, content: &str, variables: &Variables, source_file: &Path) -> Extraction {
        let tokens = significant_tokens(content);
        let mut visible = variables.clone();
        let mut extraction = Extraction::default();

        let mut rest = tokens.as_slice();
        while !rest.is_empty() {
            let remaining = rest.len();
            let ctx = HandlerContext {
                variables: &visible,
                source_file,
                registry_aliases: &self.registry_aliases,
            };

            match match_first(rest) {
                Some((pattern, captures)) => {
                    let output = (pattern.handler)(&captures, &ctx);
                    rest = &rest[captures.len()..];

                    extraction.dependencies.extend(output.dependencies);
                    extraction.registry_urls.extend(output.registry_urls);
                    for variable in output.variables {
                        visible.insert(variable.key.clone(), variable.clone());
                        extraction.variables.push(variable);
                    }
                }
                None => rest = &rest[1..],
            }

            if rest.len() >= remaining {
                warn!(
                    "Stopped parsing {} with {} tokens left: no progress",
                    source_file.display(),
                    rest.len()
                );
                break;
            }
        }

        extraction
    }
}

impl Parser for BuildScriptParser {
    fn parse(
        &self,
        content: &str,
        variables: &Variables,
        source_file: &Path,
    ) -> Result<Extraction, ParseError> {
        Ok(self.extract(content, variables, source_file))
    }
}

/// Extract dependencies, variables and repositories from a build script
pub fn extract_build_script(
    content: &str,
    initial_variables: &Variables,
    source_file: &Path,
) -> Extraction {
    BuildScriptParser::new().extract(content, initial_variables, source_file)
}
