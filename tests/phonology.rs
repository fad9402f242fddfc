//! Rule-style patterns over segment feature bundles.

use fsmatch::{
    Annotation, AnnotationList, FeatureStruct, Pattern, PatternSyntax, Span, SymbolSet,
};

fn segment(symbol: char) -> FeatureStruct {
    let (cons, voice, low) = match symbol {
        'f' | 'k' | 't' | 's' => ("+", "-", "-"),
        'v' | 'z' | 'g' | 'd' => ("+", "+", "-"),
        'a' => ("-", "+", "+"),
        'i' => ("-", "+", "-"),
        _ => panic!("unknown segment {symbol}"),
    };
    FeatureStruct::new()
        .symbol("seg", symbol.to_string())
        .symbol("cons", cons)
        .symbol("voice", voice)
        .symbol("low", low)
}

fn word(text: &str) -> AnnotationList {
    let mut input = AnnotationList::new();
    for (i, c) in text.chars().enumerate() {
        input
            .push(Annotation::new(Span::new(i, i + 1), segment(c)))
            .unwrap();
    }
    input
}

/// A consonant agreeing in voicing with the variable `a`, a low vowel, then a
/// consonant disagreeing with it.
fn voicing_rule() -> Pattern {
    Pattern::builder()
        .group("left", |g| {
            g.annotation(FeatureStruct::new().symbol("cons", "+").variable("voice", "a"))
        })
        .group("target", |g| {
            g.annotation(FeatureStruct::new().symbol("cons", "-").symbol("low", "+"))
        })
        .group("right", |g| {
            g.annotation(
                FeatureStruct::new()
                    .symbol("cons", "+")
                    .not_variable("voice", "a"),
            )
        })
        .build()
        .unwrap()
        .frozen()
}

#[test]
fn variables_bind_consistently_across_groups() {
    let m = voicing_rule().find(&word("fazk")).unwrap().unwrap();
    assert_eq!(m.span(), Span::new(0, 3));
    assert_eq!(m.group("left"), Some(Span::new(0, 1)));
    assert_eq!(m.group("target"), Some(Span::new(1, 2)));
    assert_eq!(m.group("right"), Some(Span::new(2, 3)));
    assert_eq!(m.bindings().get("a"), Some(&SymbolSet::only(["-"])));

    let m = voicing_rule().find(&word("vak")).unwrap().unwrap();
    assert_eq!(m.bindings().get("a"), Some(&SymbolSet::only(["+"])));
}

#[test]
fn conflicting_bindings_do_not_match() {
    assert_eq!(voicing_rule().find(&word("fak")).unwrap(), None);
    assert_eq!(voicing_rule().find(&word("vaz")).unwrap(), None);
    assert_eq!(voicing_rule().find(&word("fas")).unwrap(), None);
}

#[test]
fn later_start_positions_bind_afresh() {
    let m = voicing_rule().find(&word("fakaz")).unwrap().unwrap();
    assert_eq!(m.span(), Span::new(2, 5));
    assert_eq!(m.group("target"), Some(Span::new(3, 4)));
    assert_eq!(m.bindings().get("a"), Some(&SymbolSet::only(["-"])));
}

fn has_pos(input: &AnnotationList, pos: &str) -> bool {
    input
        .features()
        .value("pos")
        .is_some_and(|value| value.symbol_set().contains(pos))
}

fn rules() -> Pattern {
    Pattern::builder()
        .name("rules")
        .expression("rule1", |e| {
            e.annotation(FeatureStruct::new().symbol("cons", "-"))
                .acceptable(|input, _| has_pos(input, "verb"))
        })
        .expression("rule2", |e| e.annotation(FeatureStruct::new().symbol("cons", "-")))
        .build()
        .unwrap()
        .frozen()
}

#[test]
fn rules_apply_in_priority_order() {
    let noun = word("ta").with_features(FeatureStruct::new().symbol("pos", "noun"));
    let m = rules().find(&noun).unwrap().unwrap();
    assert_eq!(m.path(), ["rules", "rule2"]);
    assert_eq!(m.span(), Span::new(1, 2));

    let verb = word("ta").with_features(FeatureStruct::new().symbol("pos", "verb"));
    let m = rules().find(&verb).unwrap().unwrap();
    assert_eq!(m.path(), ["rules", "rule1"]);
}

#[test]
fn earlier_rules_win_over_longer_ones() {
    let pattern = Pattern::builder()
        .expression("short", |e| e.annotation(FeatureStruct::new().symbol("seg", "t")))
        .expression("long", |e| {
            e.annotation(FeatureStruct::new().symbol("seg", "t"))
                .annotation(FeatureStruct::new().symbol("cons", "-"))
        })
        .build()
        .unwrap()
        .frozen();
    let input = word("ta");
    let m = pattern.find(&input).unwrap().unwrap();
    assert_eq!(m.path(), ["short"]);
    assert_eq!(m.span(), Span::new(0, 1));

    let all = pattern.find_all(&input).unwrap();
    let paths: Vec<&[String]> = all.iter().map(|m| m.path()).collect();
    assert_eq!(paths, [["short".to_owned()], ["long".to_owned()]]);
    assert_eq!(all[1].span(), Span::new(0, 2));
}

#[test]
fn acceptance_predicates_see_the_match() {
    let pattern = Pattern::builder()
        .expression("pair", |e| {
            e.group("first", |g| g.annotation(FeatureStruct::new().symbol("cons", "+")))
                .annotation(FeatureStruct::new().symbol("cons", "-"))
                .acceptable(|input, m| {
                    m.group("first")
                        .and_then(|span| input.get(span.start))
                        .is_some_and(|a| a.fs.value("voice") == segment('z').value("voice"))
                })
        })
        .build()
        .unwrap()
        .frozen();
    let m = pattern.find(&word("tazi")).unwrap().unwrap();
    assert_eq!(m.span(), Span::new(2, 4));
}

/// Two rules sharing the variable name `a`: each keeps its own binding.
fn shared_variable_rules() -> Pattern {
    Pattern::builder()
        .expression("rule1", |e| {
            e.annotation(FeatureStruct::new().not_variable("f", "a"))
                .annotation(FeatureStruct::new().symbol("x", "1"))
        })
        .expression("rule2", |e| {
            e.annotation(FeatureStruct::new().variable("g", "a"))
                .annotation(FeatureStruct::new().variable("g", "a"))
        })
        .build()
        .unwrap()
        .frozen()
}

fn bundles(features: &[FeatureStruct]) -> AnnotationList {
    let mut input = AnnotationList::new();
    for (i, fs) in features.iter().enumerate() {
        input
            .push(Annotation::new(Span::new(i, i + 1), fs.clone()))
            .unwrap();
    }
    input
}

#[test]
fn rules_do_not_share_variable_bindings() {
    let input = bundles(&[
        FeatureStruct::new().symbol("f", "+").symbol("g", "-"),
        FeatureStruct::new().symbol("g", "0").symbol("x", "2"),
    ]);
    assert_eq!(shared_variable_rules().find(&input).unwrap(), None);
    assert!(shared_variable_rules().find_all(&input).unwrap().is_empty());

    let input = bundles(&[
        FeatureStruct::new().symbol("f", "+").symbol("g", "-"),
        FeatureStruct::new().symbol("g", "-").symbol("x", "2"),
    ]);
    let m = shared_variable_rules().find(&input).unwrap().unwrap();
    assert_eq!(m.path(), ["rule2"]);
    assert_eq!(m.span(), Span::new(0, 2));
    assert_eq!(m.bindings().get("a"), Some(&SymbolSet::only(["-"])));
}

#[test]
fn each_rule_binds_from_its_own_condition() {
    let input = bundles(&[
        FeatureStruct::new().symbol("f", "+").symbol("g", "-"),
        FeatureStruct::new().symbol("x", "1"),
    ]);
    let m = shared_variable_rules().find(&input).unwrap().unwrap();
    assert_eq!(m.path(), ["rule1"]);
    assert_eq!(m.bindings().get("a"), Some(&SymbolSet::except(["+"])));
}
