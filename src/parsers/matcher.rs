//! Ordered token-sequence patterns for the Gradle idioms we understand
//!
//! Patterns are tried in table order against the head of the significant
//! token stream; the first one whose steps all match wins. Trailing lookahead
//! steps must match (or hit the end of the stream) but are not consumed.

use super::handlers::{self, HandlerContext, HandlerOutput};
use super::tokenizer::{Token, TokenKind};

/// Roles a matched token can play for a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capture {
    Key,
    Value,
    MethodName,
    PluginName,
    PluginVersion,
    GroupId,
    ArtifactId,
    Version,
    RegistryUrl,
}

/// One position in a pattern
#[derive(Debug, Clone, Copy)]
pub struct Step {
    pub kinds: &'static [TokenKind],
    /// Accepted token values, any value when `None`
    pub values: Option<&'static [&'static str]>,
    pub lookahead: bool,
    pub capture: Option<Capture>,
}

impl Step {
    pub const fn kind(kinds: &'static [TokenKind]) -> Self {
        Self {
            kinds,
            values: None,
            lookahead: false,
            capture: None,
        }
    }

    /// A `Word` token with one of the given values
    pub const fn word(values: &'static [&'static str]) -> Self {
        Self {
            values: Some(values),
            ..Self::kind(WORD)
        }
    }

    pub const fn capture(self, capture: Capture) -> Self {
        Self {
            capture: Some(capture),
            ..self
        }
    }

    pub const fn lookahead(self) -> Self {
        Self {
            lookahead: true,
            ..self
        }
    }

    fn matches(&self, token: &Token) -> bool {
        self.kinds.contains(&token.kind)
            && self
                .values
                .is_none_or(|values| values.contains(&token.value.as_str()))
    }
}

/// Tokens captured by a successful match
#[derive(Debug)]
pub struct Captures<'t> {
    tokens: &'t [Token],
    named: Vec<(Capture, &'t Token)>,
}

impl<'t> Captures<'t> {
    pub fn get(&self, capture: Capture) -> Option<&'t Token> {
        self.named
            .iter()
            .find(|(name, _)| *name == capture)
            .map(|(_, token)| *token)
    }

    /// All consumed tokens, in order
    pub fn tokens(&self) -> &'t [Token] {
        self.tokens
    }

    /// Number of tokens the match consumes
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

pub type Handler = fn(&Captures<'_>, &HandlerContext<'_>) -> HandlerOutput;

pub struct Pattern {
    pub name: &'static str,
    pub steps: &'static [Step],
    pub handler: Handler,
}

impl std::fmt::Debug for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pattern")
            .field("name", &self.name)
            .field("steps", &self.steps.len())
            .finish()
    }
}

impl Pattern {
    /// Match against the head of `tokens`
    pub fn try_match<'t>(&self, tokens: &'t [Token]) -> Option<Captures<'t>> {
        let mut named = Vec::new();
        let mut consumed = 0;
        for (i, step) in self.steps.iter().enumerate() {
            let Some(token) = tokens.get(i) else {
                if step.lookahead {
                    continue;
                }
                return None;
            };
            if !step.matches(token) {
                return None;
            }
            if !step.lookahead {
                consumed = i + 1;
                if let Some(capture) = step.capture {
                    named.push((capture, token));
                }
            }
        }
        Some(Captures {
            tokens: &tokens[..consumed],
            named,
        })
    }
}

/// First pattern of the table matching the head of `tokens`
pub fn match_first<'t>(tokens: &'t [Token]) -> Option<(&'static Pattern, Captures<'t>)> {
    PATTERNS
        .iter()
        .find_map(|pattern| pattern.try_match(tokens).map(|captures| (pattern, captures)))
}

const WORD: &[TokenKind] = &[TokenKind::Word];
const STRING: &[TokenKind] = &[TokenKind::String];
const INTERPOLATION: &[TokenKind] = &[TokenKind::StringInterpolation];
const STRING_LIKE: &[TokenKind] = &[TokenKind::String, TokenKind::StringInterpolation];
/// Literal, interpolated, or variable reference
const VALUE: &[TokenKind] = &[
    TokenKind::String,
    TokenKind::StringInterpolation,
    TokenKind::Word,
];
const END_OF_INSTRUCTION: &[TokenKind] = &[
    TokenKind::Semicolon,
    TokenKind::RightBrace,
    TokenKind::Word,
    TokenKind::String,
    TokenKind::StringInterpolation,
];

const ASSIGN: Step = Step::kind(&[TokenKind::Assignment]);
const COLON: Step = Step::kind(&[TokenKind::Colon]);
const COMMA: Step = Step::kind(&[TokenKind::Comma]);
const DOT: Step = Step::kind(&[TokenKind::Dot]);
const LPAREN: Step = Step::kind(&[TokenKind::LeftParen]);
const RPAREN: Step = Step::kind(&[TokenKind::RightParen]);
const LBRACKET: Step = Step::kind(&[TokenKind::LeftBracket]);
const RBRACKET: Step = Step::kind(&[TokenKind::RightBracket]);
const END: Step = Step::kind(END_OF_INSTRUCTION).lookahead();

// key = 'value'
const ASSIGNMENT: &[Step] = &[
    Step::kind(WORD).capture(Capture::Key),
    ASSIGN,
    Step::kind(STRING).capture(Capture::Value),
    END,
];

// a.b.c = 'value'
const DOTTED_ASSIGNMENT_3: &[Step] = &[
    Step::kind(WORD),
    DOT,
    Step::kind(WORD),
    DOT,
    Step::kind(WORD),
    ASSIGN,
    Step::kind(STRING).capture(Capture::Value),
    END,
];

// ext.key = 'value'
const DOTTED_ASSIGNMENT_2: &[Step] = &[
    Step::kind(WORD),
    DOT,
    Step::kind(WORD),
    ASSIGN,
    Step::kind(STRING).capture(Capture::Value),
    END,
];

// set('key', 'value')
const SET_PROPERTY: &[Step] = &[
    Step::word(&["set"]),
    LPAREN,
    Step::kind(STRING).capture(Capture::Key),
    COMMA,
    Step::kind(STRING).capture(Capture::Value),
    RPAREN,
];

// extra["key"] = "value"
const EXTRA_INDEX_ASSIGNMENT: &[Step] = &[
    Step::word(&["extra", "ext"]),
    LBRACKET,
    Step::kind(STRING).capture(Capture::Key),
    RBRACKET,
    ASSIGN,
    Step::kind(STRING).capture(Capture::Value),
    END,
];

// val key by extra("value")
const DELEGATED_EXTRA: &[Step] = &[
    Step::word(&["val"]),
    Step::kind(WORD).capture(Capture::Key),
    Step::word(&["by"]),
    Step::word(&["extra"]),
    LPAREN,
    Step::kind(STRING).capture(Capture::Value),
    RPAREN,
];

// id 'x' version 'v'
const PLUGIN: &[Step] = &[
    Step::word(&["id"]).capture(Capture::MethodName),
    Step::kind(STRING).capture(Capture::PluginName),
    Step::word(&["version"]),
    Step::kind(VALUE).capture(Capture::PluginVersion),
    END,
];

// id("x") version "v", kotlin("jvm") version "v"
const PLUGIN_CALL: &[Step] = &[
    Step::word(&["id", "kotlin"]).capture(Capture::MethodName),
    LPAREN,
    Step::kind(STRING).capture(Capture::PluginName),
    RPAREN,
    Step::word(&["version"]),
    Step::kind(VALUE).capture(Capture::PluginVersion),
    END,
];

// id("x").version("v")
const PLUGIN_CHAINED: &[Step] = &[
    Step::word(&["id", "kotlin"]).capture(Capture::MethodName),
    LPAREN,
    Step::kind(STRING).capture(Capture::PluginName),
    RPAREN,
    DOT,
    Step::word(&["version"]),
    LPAREN,
    Step::kind(VALUE).capture(Capture::PluginVersion),
    RPAREN,
];

// group: 'g', name: 'a', version: 'v'
const LONG_FORM_MAP: &[Step] = &[
    Step::word(&["group"]),
    COLON,
    Step::kind(STRING_LIKE).capture(Capture::GroupId),
    COMMA,
    Step::word(&["name"]),
    COLON,
    Step::kind(STRING_LIKE).capture(Capture::ArtifactId),
    COMMA,
    Step::word(&["version"]),
    COLON,
    Step::kind(VALUE).capture(Capture::Version),
];

// group = "g", name = "a", version = "v"
const LONG_FORM_NAMED: &[Step] = &[
    Step::word(&["group"]),
    ASSIGN,
    Step::kind(STRING_LIKE).capture(Capture::GroupId),
    COMMA,
    Step::word(&["name"]),
    ASSIGN,
    Step::kind(STRING_LIKE).capture(Capture::ArtifactId),
    COMMA,
    Step::word(&["version"]),
    ASSIGN,
    Step::kind(VALUE).capture(Capture::Version),
];

// implementation("g", "a", "v")
const LONG_FORM_POSITIONAL: &[Step] = &[
    Step::kind(WORD).capture(Capture::MethodName),
    LPAREN,
    Step::kind(STRING_LIKE).capture(Capture::GroupId),
    COMMA,
    Step::kind(STRING_LIKE).capture(Capture::ArtifactId),
    COMMA,
    Step::kind(VALUE).capture(Capture::Version),
    RPAREN,
];

// url 'u'
const URL_ARGUMENT: &[Step] = &[
    Step::word(&["url"]),
    Step::kind(STRING_LIKE).capture(Capture::RegistryUrl),
];

// url('u'), setUrl("u"), maven('u')
const URL_CALL: &[Step] = &[
    Step::word(&["url", "setUrl", "maven"]),
    LPAREN,
    Step::kind(STRING_LIKE).capture(Capture::RegistryUrl),
    RPAREN,
];

// url = uri('u')
const URL_ASSIGN_URI: &[Step] = &[
    Step::word(&["url"]),
    ASSIGN,
    Step::word(&["uri"]),
    LPAREN,
    Step::kind(STRING_LIKE).capture(Capture::RegistryUrl),
    RPAREN,
];

// url = "u" with an interpolated value
const URL_ASSIGN: &[Step] = &[
    Step::word(&["url"]),
    ASSIGN,
    Step::kind(STRING_LIKE).capture(Capture::RegistryUrl),
];

// url(uri('u')), maven(uri('u'))
const URL_CALL_URI: &[Step] = &[
    Step::word(&["url", "setUrl", "maven"]),
    LPAREN,
    Step::word(&["uri"]),
    LPAREN,
    Step::kind(STRING_LIKE).capture(Capture::RegistryUrl),
    RPAREN,
    RPAREN,
];

// maven(url = 'u'), maven(url: 'u')
const MAVEN_NAMED_URL: &[Step] = &[
    Step::word(&["maven"]),
    LPAREN,
    Step::word(&["url"]),
    Step::kind(&[TokenKind::Assignment, TokenKind::Colon]),
    Step::kind(STRING_LIKE).capture(Capture::RegistryUrl),
    RPAREN,
];

// mavenCentral()
const REGISTRY_SHORTHAND_CALL: &[Step] = &[
    Step::kind(WORD).capture(Capture::MethodName),
    LPAREN,
    RPAREN,
];

// google { ... }
const REGISTRY_SHORTHAND_BLOCK: &[Step] = &[
    Step::kind(WORD).capture(Capture::MethodName),
    Step::kind(&[TokenKind::LeftBrace]).lookahead(),
];

// 'g:a:v'
const DEPENDENCY_STRING: &[Step] = &[Step::kind(STRING).capture(Capture::Value)];

// "g:a:$v"
const DEPENDENCY_INTERPOLATION: &[Step] = &[Step::kind(INTERPOLATION).capture(Capture::Value)];

/// Pattern table in priority order
pub static PATTERNS: &[Pattern] = &[
    Pattern {
        name: "assignment",
        steps: ASSIGNMENT,
        handler: handlers::handle_assignment,
    },
    Pattern {
        name: "dotted-assignment",
        steps: DOTTED_ASSIGNMENT_3,
        handler: handlers::handle_dotted_assignment,
    },
    Pattern {
        name: "dotted-assignment",
        steps: DOTTED_ASSIGNMENT_2,
        handler: handlers::handle_dotted_assignment,
    },
    Pattern {
        name: "set-property",
        steps: SET_PROPERTY,
        handler: handlers::handle_assignment,
    },
    Pattern {
        name: "extra-index-assignment",
        steps: EXTRA_INDEX_ASSIGNMENT,
        handler: handlers::handle_assignment,
    },
    Pattern {
        name: "delegated-extra",
        steps: DELEGATED_EXTRA,
        handler: handlers::handle_assignment,
    },
    Pattern {
        name: "plugin",
        steps: PLUGIN,
        handler: handlers::handle_plugin,
    },
    Pattern {
        name: "plugin-call",
        steps: PLUGIN_CALL,
        handler: handlers::handle_plugin,
    },
    Pattern {
        name: "plugin-chained",
        steps: PLUGIN_CHAINED,
        handler: handlers::handle_plugin,
    },
    Pattern {
        name: "long-form-map",
        steps: LONG_FORM_MAP,
        handler: handlers::handle_long_form,
    },
    Pattern {
        name: "long-form-named",
        steps: LONG_FORM_NAMED,
        handler: handlers::handle_long_form,
    },
    Pattern {
        name: "long-form-positional",
        steps: LONG_FORM_POSITIONAL,
        handler: handlers::handle_long_form,
    },
    Pattern {
        name: "url-argument",
        steps: URL_ARGUMENT,
        handler: handlers::handle_custom_registry,
    },
    Pattern {
        name: "url-call",
        steps: URL_CALL,
        handler: handlers::handle_custom_registry,
    },
    Pattern {
        name: "url-assign-uri",
        steps: URL_ASSIGN_URI,
        handler: handlers::handle_custom_registry,
    },
    Pattern {
        name: "url-assign",
        steps: URL_ASSIGN,
        handler: handlers::handle_custom_registry,
    },
    Pattern {
        name: "url-call-uri",
        steps: URL_CALL_URI,
        handler: handlers::handle_custom_registry,
    },
    Pattern {
        name: "maven-named-url",
        steps: MAVEN_NAMED_URL,
        handler: handlers::handle_custom_registry,
    },
    Pattern {
        name: "registry-shorthand",
        steps: REGISTRY_SHORTHAND_CALL,
        handler: handlers::handle_predefined_registry,
    },
    Pattern {
        name: "registry-shorthand-block",
        steps: REGISTRY_SHORTHAND_BLOCK,
        handler: handlers::handle_predefined_registry,
    },
    Pattern {
        name: "dependency-string",
        steps: DEPENDENCY_STRING,
        handler: handlers::handle_dependency_string,
    },
    Pattern {
        name: "dependency-interpolation",
        steps: DEPENDENCY_INTERPOLATION,
        handler: handlers::handle_dependency_interpolation,
    },
];
