use fsmatch::{
    Annotation, AnnotationList, Direction, FeatureStruct, Pattern, PatternBuilder, PatternSyntax,
    Span,
};

fn seg(symbol: &str) -> FeatureStruct {
    FeatureStruct::new().symbol("seg", symbol)
}

/// One annotation per character; upper-case characters are optional.
fn segments(text: &str) -> AnnotationList {
    let mut input = AnnotationList::new();
    for (i, c) in text.chars().enumerate() {
        let annotation = Annotation::new(
            Span::new(i, i + 1),
            seg(&c.to_ascii_lowercase().to_string()),
        );
        input
            .push(if c.is_uppercase() {
                annotation.optional()
            } else {
                annotation
            })
            .unwrap();
    }
    input
}

#[track_caller]
fn span(pattern: PatternBuilder, text: &str) -> Option<(usize, usize)> {
    pattern
        .build()
        .unwrap()
        .frozen()
        .find(&segments(text))
        .unwrap()
        .map(|m| (m.span().start, m.span().end))
}

fn starts_with_a() -> PatternBuilder {
    Pattern::builder().start_anchor().annotation(seg("a"))
}

fn ends_with_a() -> PatternBuilder {
    Pattern::builder().annotation(seg("a")).end_anchor()
}

#[test]
fn test_start_anchor() {
    assert_eq!(span(starts_with_a(), "ab"), Some((0, 1)));
    assert_eq!(span(starts_with_a(), "ba"), None);
    assert_eq!(span(starts_with_a(), ""), None);
}

#[test]
fn test_end_anchor() {
    assert_eq!(span(ends_with_a(), "ba"), Some((1, 2)));
    assert_eq!(span(ends_with_a(), "ab"), None);
    assert_eq!(span(ends_with_a(), "aab"), None);
}

#[test]
fn test_anchors_pass_leading_optional_annotations() {
    assert_eq!(span(starts_with_a(), "Ba"), Some((1, 2)));
    assert_eq!(span(starts_with_a(), "BCab"), Some((2, 3)));
    assert_eq!(span(starts_with_a(), "Bca"), None);
    assert_eq!(span(ends_with_a(), "aBC"), Some((0, 1)));
    assert_eq!(span(ends_with_a(), "abC"), None);
}

#[test]
fn test_fully_anchored_sequences() {
    let whole = || {
        Pattern::builder()
            .start_anchor()
            .zero_or_more(|q| q.annotation(seg("a")))
            .annotation(seg("b"))
            .end_anchor()
    };
    assert_eq!(span(whole(), "aab"), Some((0, 3)));
    assert_eq!(span(whole(), "b"), Some((0, 1)));
    assert_eq!(span(whole(), "cab"), None);
    assert_eq!(span(whole(), "abc"), None);
    assert_eq!(span(whole(), "abC"), Some((0, 2)));
}

#[test]
fn test_anchor_inside_group() {
    let pattern = || {
        Pattern::builder()
            .group("edge", |g| g.start_anchor().annotation(seg("a")))
            .annotation(seg("b"))
    };
    assert_eq!(span(pattern(), "ab"), Some((0, 2)));
    assert_eq!(span(pattern(), "cab"), None);
}

#[test]
fn test_anchors_right_to_left() {
    let start = || starts_with_a().direction(Direction::RightToLeft);
    assert_eq!(span(start(), "ab"), Some((0, 1)));
    assert_eq!(span(start(), "ba"), None);
    assert_eq!(span(start(), "Ba"), Some((1, 2)));

    let end = || ends_with_a().direction(Direction::RightToLeft);
    assert_eq!(span(end(), "ba"), Some((1, 2)));
    assert_eq!(span(end(), "ab"), None);
}

#[test]
fn test_anchor_marks_do_not_touch_the_input() {
    let input = segments("Bab");
    let before = input.clone();
    let pattern = starts_with_a().build().unwrap().frozen();
    assert!(pattern.is_match(&input).unwrap());
    assert_eq!(input, before);
}
