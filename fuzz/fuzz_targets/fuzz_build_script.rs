#![no_main]

use dependi_gradle::parsers::Variables;
use dependi_gradle::parsers::build_script::extract_build_script;
use libfuzzer_sys::fuzz_target;
use std::panic::AssertUnwindSafe;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
            extract_build_script(content, &Variables::new(), Path::new("build.gradle"))
        }));

        if let Ok(extraction) = result {
            for dep in &extraction.dependencies {
                if let Some(position) = dep.file_replace_position {
                    assert!(position <= content.len(), "position out of range");
                    assert!(
                        content.is_char_boundary(position),
                        "position must be on a char boundary"
                    );
                }
            }
            for variable in &extraction.variables {
                assert!(
                    variable.file_replace_position <= content.len(),
                    "variable position out of range"
                );
            }
        }
    }
});
