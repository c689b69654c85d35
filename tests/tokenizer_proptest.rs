//! Property-based tests for the tokenizer and the build script parser

use std::path::Path;

use dependi_gradle::parsers::Variables;
use dependi_gradle::parsers::build_script::extract_build_script;
use dependi_gradle::parsers::tokenizer::{significant_tokens, tokenize};
use proptest::prelude::*;

fn group_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,8}(\\.[a-z][a-z0-9]{0,8}){0,2}"
}

fn artifact_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,12}"
}

fn version_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{1,3}(\\.[0-9]{1,3}){0,2}",
        "[0-9]{1,2}\\.[0-9]{1,2}-(alpha|beta|rc)[0-9]?",
    ]
}

/// Gradle-flavoured noise: fragments of real syntax in random order
fn script_strategy() -> impl Strategy<Value = String> {
    let fragment = prop_oneof![
        Just("implementation ".to_string()),
        Just("'g:a:1.0'".to_string()),
        Just("\"g:a:$v\"".to_string()),
        Just("\"${".to_string()),
        Just("ext.v = ".to_string()),
        Just("id 'p' version ".to_string()),
        Just("group: ".to_string()),
        Just("{ }\n".to_string()),
        Just("( ,".to_string()),
        Just("// c\n".to_string()),
        Just("/* ".to_string()),
        Just("'''".to_string()),
        "[ -~]{0,6}",
    ];
    prop::collection::vec(fragment, 0..24).prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn tokenization_is_lossless(input in any::<String>()) {
        let tokens = tokenize(&input);
        let mut end = 0;
        for token in &tokens {
            prop_assert_eq!(token.span.start, end);
            end = token.span.end;
        }
        prop_assert_eq!(end, input.len());

        let joined: String = tokens.iter().map(|t| &input[t.span.clone()]).collect();
        prop_assert_eq!(joined, input);
    }

    #[test]
    fn significant_tokens_have_no_trivia(input in script_strategy()) {
        for token in significant_tokens(&input) {
            prop_assert!(!token.kind.is_trivia());
        }
    }

    #[test]
    fn extraction_terminates_with_valid_positions(input in script_strategy()) {
        let extraction = extract_build_script(&input, &Variables::new(), Path::new("build.gradle"));
        for dep in &extraction.dependencies {
            if let Some(position) = dep.file_replace_position {
                prop_assert!(position <= input.len());
                prop_assert!(input.is_char_boundary(position));
            }
        }
    }

    #[test]
    fn literal_coordinate_offset(
        group in group_strategy(),
        artifact in artifact_strategy(),
        version in version_strategy(),
    ) {
        let content = format!("dependencies {{\n    implementation '{group}:{artifact}:{version}'\n}}\n");
        let extraction = extract_build_script(&content, &Variables::new(), Path::new("build.gradle"));

        prop_assert_eq!(extraction.dependencies.len(), 1);
        let dep = &extraction.dependencies[0];
        prop_assert_eq!(&dep.name, &format!("{group}:{artifact}"));
        let position = dep.file_replace_position.unwrap();
        prop_assert_eq!(&content[position..position + version.len()], version.as_str());
    }

    #[test]
    fn variable_version_points_at_assignment(
        suffix in "[A-Z][a-zA-Z0-9]{0,8}",
        group in group_strategy(),
        artifact in artifact_strategy(),
        version in version_strategy(),
    ) {
        let key = format!("v{suffix}");
        let content = format!("{key} = '{version}'\nimplementation \"{group}:{artifact}:${key}\"\n");
        let extraction = extract_build_script(&content, &Variables::new(), Path::new("build.gradle"));

        prop_assert_eq!(extraction.dependencies.len(), 1);
        let dep = &extraction.dependencies[0];
        prop_assert_eq!(dep.current_value.as_deref(), Some(version.as_str()));
        prop_assert_eq!(dep.file_replace_position, Some(key.len() + 4));
    }
}
