#![no_main]

use dependi_gradle::parsers::tokenizer::tokenize;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let tokens = tokenize(content);

        let mut end = 0;
        for token in &tokens {
            assert_eq!(token.span.start, end, "tokens must be contiguous");
            end = token.span.end;
        }
        assert_eq!(end, content.len(), "tokens must cover the input");
    }
});
