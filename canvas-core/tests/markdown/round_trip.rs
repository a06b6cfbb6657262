//! Whole-document trips through the import/export pipeline.

use insta::assert_snapshot;
use proptest::prelude::*;

use crate::common;

const KITCHEN_SINK: &str = r#"# Plan

Ship the **canvas** editor.

- one
- two

> quoted

| Name | Age |
| --- | --- |
| Bob | 30 |

``` rust
let x = 1;
```

See [site](https://example.com) for details.
"#;

#[test]
fn kitchen_sink_export_is_stable() {
    let (doc, rules) = common::import(KITCHEN_SINK);
    let md = common::export(&doc, &rules);

    assert_snapshot!(md, @r###"
    # Plan

    Ship the **canvas** editor.

    - one
    - two

    > quoted

    | Name | Age |
    | --- | --- |
    | Bob | 30 |

    ``` rust
    let x = 1;
    ```

    See [site](https://example.com) for details.
    "###);
}

#[test]
fn export_is_idempotent() {
    let (doc, rules) = common::import(KITCHEN_SINK);
    let first = common::export(&doc, &rules);

    let (reloaded, _) = common::import(&first);
    let second = common::export(&reloaded, &rules);

    assert_eq!(second, first);
}

#[test]
fn block_structure_survives_the_trip() {
    let source = "# Title\n\nintro\n\n1. first\n2. second\n\n---\n\nclosing";
    let (doc, rules) = common::import(source);
    assert_eq!(
        common::block_kinds(&doc),
        vec!["heading", "paragraph", "list", "horizontal-rule", "paragraph"]
    );

    let exported = common::export(&doc, &rules);
    let (reloaded, _) = common::import(&exported);
    assert_eq!(common::block_kinds(&reloaded), common::block_kinds(&doc));
}

#[test]
fn ordered_list_start_is_preserved() {
    let (doc, rules) = common::import("3. third\n4. fourth");
    let exported = common::export(&doc, &rules);
    assert!(exported.starts_with("3."), "got: {exported}");
}

fn paragraph_text() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,8}", 1..6).prop_map(|words| words.join(" "))
}

proptest! {
    /// Plain prose has no markdown syntax in it, so the pipeline must hand
    /// it back byte for byte.
    #[test]
    fn plain_paragraphs_round_trip(paragraphs in prop::collection::vec(paragraph_text(), 1..4)) {
        let source = paragraphs.join("\n\n");
        let (doc, rules) = common::import(&source);
        let exported = common::export(&doc, &rules);
        prop_assert_eq!(exported, source);
    }
}
