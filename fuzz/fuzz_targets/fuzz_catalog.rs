#![no_main]

use dependi_gradle::parsers::catalog::extract_catalog;
use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        if let Ok(deps) = extract_catalog(content, Path::new("gradle/libs.versions.toml")) {
            for dep in &deps {
                if let (Some(position), Some(value)) = (dep.file_replace_position, &dep.current_value)
                {
                    assert_eq!(
                        content.get(position..position + value.len()),
                        Some(value.as_str()),
                        "position must point at the version"
                    );
                }
            }
        }
    }
});
