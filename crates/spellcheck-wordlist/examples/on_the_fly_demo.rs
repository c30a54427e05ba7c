//! On-the-fly checking demo
//!
//! Wires a `BufferDocument`, the regex eligibility classifier, and a word-list
//! backend into `OnTheFlyEngine`, then plays an editing session against it.

use std::time::Duration;

use spellcheck_core::{
    BufferDocument, CheckContext, CheckEvent, DocRange, EngineConfig, OnTheFlyEngine, Position,
    StaticDictionaryMap, ViewId,
};
use spellcheck_eligibility_simple::RegexClassifier;
use spellcheck_wordlist::{WordList, WordListSession};

fn main() {
    let mut words = WordList::new();
    words
        .add_from_text(
            "en",
            "# tiny demo dictionary\nthe\nquick\nbrown\nfox\njumps\nover\nlazy\ndog\nsee\nat\nnow\n",
        )
        .expect("demo dictionary");

    let mut engine = OnTheFlyEngine::with_config(
        Some(Box::new(WordListSession::new(words))),
        EngineConfig {
            visibility_debounce: Duration::ZERO,
            session_poll_budget: 128,
        },
    );
    engine.subscribe(Box::new(|event| match event {
        CheckEvent::MisspellingFound { range, dictionary } => {
            println!("  found   {range} [{dictionary}]");
        }
        CheckEvent::MisspellingCleared { range } => println!("  cleared {range}"),
        other => println!("  event   {other:?}"),
    }));

    let mut doc = BufferDocument::new("the quik brown fox\nsee `cargo run` now\n");
    let map = StaticDictionaryMap::new("en");
    let classifier = RegexClassifier::markup_default().expect("demo rules");

    println!("document:\n---\nthe quik brown fox\nsee `cargo run` now\n---");
    println!("initial check:");
    {
        let source = classifier.classify(&doc);
        let ctx = CheckContext::new(&doc, &source, &map);
        engine.view_created(&ctx, ViewId::new(1), DocRange::from_coords(0, 0, 2, 0));
        engine.poll(&ctx);
    }
    // "quik" is flagged; "cargo run" sits in an inline code span and is not.

    println!("fixing the typo: quik -> quick");
    let inserted = doc.insert(Position::new(0, 7), "c");
    let source = classifier.classify(&doc);
    let ctx = CheckContext::new(&doc, &source, &map);
    engine.on_text_inserted(&ctx, inserted);
    engine.poll(&ctx);

    println!(
        "remaining misspellings: {}",
        engine.misspellings().len()
    );
}
