//! Regression tests for fuzz crashes

use std::panic::AssertUnwindSafe;
use std::path::Path;

use dependi_gradle::parsers::build_script::extract_build_script;
use dependi_gradle::parsers::catalog::extract_catalog;
use dependi_gradle::parsers::properties::extract_properties_file;
use dependi_gradle::parsers::tokenizer::tokenize;
use dependi_gradle::parsers::{Dependency, Variables};

fn validate_deps(deps: &[Dependency], content: &str, parser_name: &str) {
    for dep in deps {
        let Some(position) = dep.file_replace_position else {
            continue;
        };
        assert!(
            position <= content.len(),
            "{parser_name}: position {position} > len {} for {}",
            content.len(),
            dep.name
        );
        assert!(
            content.is_char_boundary(position),
            "{parser_name}: position {position} splits a character for {}",
            dep.name
        );
    }
}

fn check_build_script(content: &str) {
    let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
        extract_build_script(content, &Variables::new(), Path::new("build.gradle"))
    }));
    match result {
        Ok(extraction) => validate_deps(&extraction.dependencies, content, "build script"),
        Err(_) => panic!("build script parser should not panic on {content:?}"),
    }
}

fn check_tokenizer(content: &str) {
    let result = std::panic::catch_unwind(AssertUnwindSafe(|| tokenize(content)));
    match result {
        Ok(tokens) => {
            let joined: String = tokens.iter().map(|t| &content[t.span.clone()]).collect();
            assert_eq!(joined, content);
        }
        Err(_) => panic!("tokenizer should not panic on {content:?}"),
    }
}

#[test]
fn test_unterminated_interpolation() {
    for content in [
        "implementation \"g:a:${",
        "implementation \"g:a:${v",
        "implementation \"g:a:${v}",
        "\"${\"${\"${",
        "\"\"\"g:a:${x.y(}\"\"\"",
    ] {
        check_tokenizer(content);
        check_build_script(content);
    }
}

#[test]
fn test_multibyte_around_versions() {
    for content in [
        "implementation 'é:ü:1.0'",
        "v = 'ñ'\nimplementation \"g:a:$v\"",
        "id '日本' version '語'",
        "implementation \"g:a:1.0ü\"",
    ] {
        check_tokenizer(content);
        check_build_script(content);
    }
}

#[test]
fn test_truncated_patterns() {
    for content in [
        "id",
        "id 'x' version",
        "group: 'g', name:",
        "implementation('g', 'a',",
        "maven(url =",
        "val v by extra(",
        "ext[",
        "/* never closed",
        "'''open",
    ] {
        check_tokenizer(content);
        check_build_script(content);
    }
}

#[test]
fn test_properties_fuzz_crash() {
    for content in ["=", "=\r\n", "a=g:a:", "\u{feff}k=g:a:1.0\r", "k = é:ü:1"] {
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
            extract_properties_file(content, Path::new("gradle.properties"))
        }));
        match result {
            Ok(extraction) => validate_deps(&extraction.dependencies, content, "properties"),
            Err(_) => panic!("properties parser should not panic on {content:?}"),
        }
    }
}

#[test]
fn test_catalog_fuzz_crash() {
    for content in [
        "[versions]\na = \"é\"\n[libraries]\nx = { module = \"g:a\", version.ref = \"a\" }",
        "[libraries]\nx = \"g:a:\"",
        "[libraries]\nx = { group = \"g\" }",
        "[plugins]\np = \"id:\"",
        "[versions]\nv = { reject = [\"1\"] }\n[libraries]\nx = { module = \"g:a\", version.ref = \"v\" }",
    ] {
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
            extract_catalog(content, Path::new("gradle/libs.versions.toml"))
        }));
        match result {
            Ok(Ok(deps)) => validate_deps(&deps, content, "catalog"),
            Ok(Err(_)) => {}
            Err(_) => panic!("catalog parser should not panic on {content:?}"),
        }
    }
}
