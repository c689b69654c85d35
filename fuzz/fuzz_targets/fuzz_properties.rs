#![no_main]

use dependi_gradle::parsers::properties::extract_properties_file;
use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let extraction = extract_properties_file(content, Path::new("gradle.properties"));

        for variable in &extraction.variables {
            let position = variable.file_replace_position;
            assert_eq!(
                content.get(position..position + variable.value.len()),
                Some(variable.value.as_str()),
                "variable position must point at its value"
            );
        }
    }
});
